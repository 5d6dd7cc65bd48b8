//! The catalog service: search, filtering, and ranked recommendation.
//!
//! Recommendation is deliberately simple keyword containment plus a budget
//! cutoff — it is a secondary query surface, not the streaming hot path, and
//! the heuristic may be replaced without touching the session contract.

use async_trait::async_trait;
use tracing::debug;

use itinera_core::{CatalogError, CatalogGateway, Product, Recommendation};

use crate::dataset::{parse_dataset, EMBEDDED_DATASET};

/// Maximum number of products a recommendation returns.
const MAX_RECOMMENDATIONS: usize = 6;

/// Common travel phrases mapped to dataset tags. A query containing the
/// phrase searches by the tags instead of by raw text.
const KEYWORD_TAGS: &[(&str, &[&str])] = &[
    ("晴空塔", &["SKYTREE", "TOWER_BUILDING"]),
    ("地铁", &["RAILWAY_TICKET", "PASS"]),
    ("交通", &["RAILWAY_TICKET", "TRANSPORTATION"]),
    ("机场", &["AIRPORT_TRANSPORTATION"]),
    ("夜景", &["NIGHT_VIEW", "CRUISES"]),
    ("巡航", &["CRUISES"]),
    ("文化", &["CULTURE", "SHOW"]),
    ("博物馆", &["MUSEUM_GALLERY"]),
    ("表演", &["SHOW"]),
    ("套票", &["BUNDLE"]),
    ("一日券", &["PASS"]),
];

/// In-memory catalog over a flattened product list.
///
/// Constructed once by the composition root and injected wherever catalog
/// access is needed; there is no ambient global instance.
#[derive(Debug, Clone)]
pub struct CatalogService {
    products: Vec<Product>,
}

impl CatalogService {
    /// Build from the dataset embedded in the crate.
    pub fn from_embedded() -> Result<Self, CatalogError> {
        Self::from_dataset(EMBEDDED_DATASET)
    }

    /// Build from a dataset JSON document.
    pub fn from_dataset(json: &str) -> Result<Self, CatalogError> {
        Ok(Self {
            products: parse_dataset(json)?,
        })
    }

    /// Build directly from a product list (tests, custom datasets).
    pub fn from_products(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// The full snapshot, in dataset order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Products whose searchable text contains any of the keywords
    /// (case-insensitive). No keywords returns everything.
    pub fn search_products(&self, keywords: &[String]) -> Vec<Product> {
        if keywords.is_empty() {
            return self.products.clone();
        }

        self.products
            .iter()
            .filter(|p| {
                let haystack = format!(
                    "{} {} {} {}",
                    p.name,
                    p.description,
                    p.tags.join(" "),
                    p.recommendation
                )
                .to_lowercase();
                keywords.iter().any(|k| haystack.contains(&k.to_lowercase()))
            })
            .cloned()
            .collect()
    }

    /// Keep products at or under the budget.
    pub fn filter_by_budget(products: Vec<Product>, budget: u32) -> Vec<Product> {
        products.into_iter().filter(|p| p.price <= budget).collect()
    }

    /// Keep products carrying any of the given tags (substring,
    /// case-insensitive).
    pub fn filter_by_tags(products: Vec<Product>, tags: &[String]) -> Vec<Product> {
        products
            .into_iter()
            .filter(|p| {
                tags.iter().any(|t| {
                    p.tags
                        .iter()
                        .any(|pt| pt.to_lowercase().contains(&t.to_lowercase()))
                })
            })
            .collect()
    }

    /// Map a free-text query onto search keywords via the phrase table,
    /// falling back to the raw query when nothing matches.
    fn extract_keywords(query: &str) -> Vec<String> {
        let mut keywords: Vec<String> = Vec::new();
        for (phrase, tags) in KEYWORD_TAGS {
            if query.contains(phrase) {
                for tag in *tags {
                    if !keywords.iter().any(|k| k == tag) {
                        keywords.push((*tag).to_string());
                    }
                }
            }
        }
        if keywords.is_empty() {
            keywords.push(query.to_string());
        }
        keywords
    }

    /// Ranked recommendation: keyword search, optional budget cutoff,
    /// price-ascending, capped at [`MAX_RECOMMENDATIONS`].
    pub fn recommendations(&self, query: &str, budget: Option<u32>) -> Recommendation {
        let keywords = Self::extract_keywords(query);
        debug!(?keywords, ?budget, "Building recommendation");

        let mut matched = self.search_products(&keywords);
        if let Some(budget) = budget.filter(|b| *b > 0) {
            matched = Self::filter_by_budget(matched, budget);
        }
        matched.sort_by_key(|p| p.price);

        let total_matched = matched.len();
        let products: Vec<Product> = matched.into_iter().take(MAX_RECOMMENDATIONS).collect();

        let message = if products.is_empty() {
            "很抱歉，没有找到符合您需求的旅游产品。您可以尝试调整预算或换个关键词搜索。".to_string()
        } else if budget.is_some() && products.len() < total_matched {
            format!("根据您的预算和需求，为您推荐了 {} 个旅游产品：", products.len())
        } else {
            format!("为您推荐了 {} 个旅游产品：", products.len())
        };

        Recommendation {
            products,
            total_matched,
            message,
        }
    }
}

#[async_trait]
impl CatalogGateway for CatalogService {
    async fn all_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.clone())
    }

    async fn recommend(
        &self,
        query: &str,
        budget: Option<u32>,
    ) -> Result<Recommendation, CatalogError> {
        Ok(self.recommendations(query, budget))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> CatalogService {
        CatalogService::from_embedded().unwrap()
    }

    #[test]
    fn keyword_phrase_maps_to_tags() {
        let kw = CatalogService::extract_keywords("想看东京的夜景");
        assert!(kw.contains(&"NIGHT_VIEW".to_string()));
        assert!(kw.contains(&"CRUISES".to_string()));
    }

    #[test]
    fn unmatched_query_falls_back_to_raw_text() {
        let kw = CatalogService::extract_keywords("teamLab");
        assert_eq!(kw, vec!["teamLab".to_string()]);
    }

    #[test]
    fn search_by_tag_keyword() {
        let svc = service();
        let hits = svc.search_products(&["CRUISES".into()]);
        assert!(hits.iter().any(|p| p.id == "LINKTIVITY-RHT5G"));
        assert!(hits.iter().all(|p| p.tags.iter().any(|t| t == "CRUISES")
            || p.recommendation.to_lowercase().contains("cruises")));
    }

    #[test]
    fn budget_filter_is_inclusive() {
        let svc = service();
        let under = CatalogService::filter_by_budget(svc.products().to_vec(), 3200);
        assert!(under.iter().any(|p| p.price == 3200));
        assert!(under.iter().all(|p| p.price <= 3200));
    }

    #[test]
    fn recommendation_sorted_and_capped() {
        let svc = service();
        let rec = svc.recommendations("东京", None);
        assert!(rec.products.len() >= 2);
        assert!(rec.products.len() <= 6);
        assert!(rec.products.windows(2).all(|w| w[0].price <= w[1].price));
        assert!(rec.message.contains("推荐"));
    }

    #[test]
    fn recommendation_respects_budget() {
        let svc = service();
        let rec = svc.recommendations("交通", Some(1000));
        assert!(rec.products.iter().all(|p| p.price <= 1000));
        assert!(rec.products.iter().any(|p| p.id == "LINKTIVITY-8M24T"));
    }

    #[test]
    fn empty_result_has_apology_message() {
        let svc = service();
        let rec = svc.recommendations("晴空塔", Some(1));
        assert!(rec.products.is_empty());
        assert!(rec.message.contains("很抱歉"));
    }

    #[tokio::test]
    async fn gateway_snapshot_matches_dataset_order() {
        let svc = service();
        let all = svc.all_products().await.unwrap();
        assert_eq!(all.len(), svc.products().len());
        assert_eq!(all[0].id, svc.products()[0].id);
    }
}
