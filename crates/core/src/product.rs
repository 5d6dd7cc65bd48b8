//! Travel product domain types.
//!
//! A `Product` is one bookable catalog item. The model references products in
//! its output by id; the renderer resolves ids back to full products.

use serde::{Deserialize, Serialize};

/// One bookable travel product from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Catalog id, restricted to `[A-Za-z0-9_-]` so it can travel inside a
    /// `[PRODUCT:<id>]` marker.
    pub id: String,

    /// Display name
    pub name: String,

    /// Longer description shown on the card
    pub description: String,

    /// Price in JPY
    pub price: u32,

    /// Booking page URL (may be empty)
    #[serde(default)]
    pub booking_url: String,

    /// Dataset tags used by keyword search
    #[serde(default)]
    pub tags: Vec<String>,

    /// Typical duration, free text ("3小时", "全天")
    #[serde(default)]
    pub duration: String,

    /// One-line recommendation blurb
    #[serde(default)]
    pub recommendation: String,

    /// Thumbnail image URL
    #[serde(default)]
    pub thumbnail_url: String,
}

/// A ranked subset of the catalog with a human-readable summary.
///
/// Returned by `CatalogGateway::recommend` — a secondary query surface that
/// is not on the streaming hot path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// The recommended products, price-ascending, capped.
    pub products: Vec<Product>,

    /// How many products matched before the cap was applied.
    pub total_matched: usize,

    /// Summary message for display.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_deserializes_with_defaults() {
        let p: Product = serde_json::from_str(
            r#"{"id":"LINKTIVITY-3PWVV","name":"晴空塔套票","description":"展望台门票","price":4500}"#,
        )
        .unwrap();
        assert_eq!(p.id, "LINKTIVITY-3PWVV");
        assert!(p.tags.is_empty());
        assert!(p.booking_url.is_empty());
    }

    #[test]
    fn product_roundtrip() {
        let p = Product {
            id: "Ninja-Kabuki-Tokyo".into(),
            name: "忍者&歌舞伎表演".into(),
            description: "传统文化演出".into(),
            price: 8800,
            booking_url: "https://example.com/book".into(),
            tags: vec!["SHOW".into(), "CULTURE".into()],
            duration: "2小时".into(),
            recommendation: "晚间必看".into(),
            thumbnail_url: String::new(),
        };
        let json = serde_json::to_string(&p).unwrap();
        let back: Product = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, p.id);
        assert_eq!(back.tags, p.tags);
    }
}
