//! The fixed grounding-prompt contract.
//!
//! The instruction sent to the completion gateway is not freeform text: it
//! is the only mechanism keeping model output compatible with boundary-safe
//! streaming. It must (a) enumerate every catalog item with its id,
//! (b) demand markers in the exact `[PRODUCT:<id>]` grammar, one per line,
//! surrounded by blank lines, never split, and (c) suppress any visible
//! reasoning trace. Wording may evolve; those three obligations may not.

use std::fmt::Write as _;

use itinera_core::Product;

/// Render the catalog snapshot, budget, and query into the dataset section.
fn render_dataset(products: &[Product], budget: Option<u32>, query: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## Company Tourism Product Dataset\n");
    let _ = writeln!(
        out,
        "Our company provides the following {} Tokyo tourism products:\n",
        products.len()
    );

    for (i, p) in products.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, p.name);
        let _ = writeln!(out, "   - Price: ¥{}", p.price);
        let _ = writeln!(out, "   - Duration: {}", p.duration);
        let _ = writeln!(out, "   - Tags: {}", p.tags.join(", "));
        let _ = writeln!(out, "   - Product ID: {}", p.id);
        let _ = writeln!(out, "   - Recommendation: {}", p.recommendation);
        let _ = writeln!(out, "   - Description: {}\n", p.description);
    }

    let budget_line = match budget {
        Some(b) => format!("¥{b}"),
        None => "Not specified".to_string(),
    };
    let _ = writeln!(out, "User Budget: {budget_line}");
    let _ = writeln!(out, "User Request: {query}");
    out
}

/// Build the single grounding instruction for one turn.
pub fn build_grounding_prompt(products: &[Product], budget: Option<u32>, query: &str) -> String {
    let dataset = render_dataset(products, budget, query);

    format!(
        r#"You are a professional Tokyo tourism recommendation assistant. You can plan comprehensive Tokyo travel itineraries including various attractions, but please reference the dataset below when our company has relevant products:

{dataset}

**IMPORTANT: Please output the final recommendation results directly, without showing any thinking process, analysis process, or reasoning steps.**

【GUIDANCE PRINCIPLES】
1. You can recommend ANY Tokyo attractions, restaurants, activities, and experiences to create a comprehensive travel plan
2. When mentioning attractions/activities that match our company's products in the dataset, you MUST include the corresponding [PRODUCT:ProductID] tag
3. For attractions/activities NOT covered by our products, provide general recommendations WITHOUT product tags
4. Only use [PRODUCT:ProductID] tags for products that actually exist in our dataset
5. Filter recommendations based on user budget - if our products exceed budget, you can still mention the attraction but note the budget constraint
6. Use markdown format with clear structure

【CRITICAL TECHNICAL REQUIREMENTS - STREAMING OUTPUT COMPATIBILITY】
7. When outputting product tags [PRODUCT:ProductID], they must be output as a complete unit and cannot be split
8. Each [PRODUCT:ProductID] must be on its own line, with blank lines before and after
9. Product IDs must be complete and copied exactly from the dataset
10. If outputting multiple products, each product tag must be output completely without interruption

Example format:

## 三日游行程安排：

### 第一天：东京市区观光
- 上午：抵达羽田机场后，建议选择我们的机场接送服务

[PRODUCT:LINKTIVITY-2IV2I]

- 下午：前往东京晴空塔，推荐超值套票

[PRODUCT:LINKTIVITY-3PWVV]

- 晚上：前往涩谷十字路口体验东京夜景，可在附近的餐厅用餐（建议预算：¥3000-5000）

Please analyze the user request "{query}" and design a comprehensive Tokyo travel plan. Include our company's products where relevant, but also provide complete travel guidance for other attractions.

Please start your recommendations:"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_products() -> Vec<Product> {
        vec![Product {
            id: "LINKTIVITY-3PWVV".into(),
            name: "东京晴空塔超值套票".into(),
            description: "展望台门票和地铁通票".into(),
            price: 4500,
            booking_url: String::new(),
            tags: vec!["SKYTREE".into(), "BUNDLE".into()],
            duration: "约3小时".into(),
            recommendation: "一次搞定两样".into(),
            thumbnail_url: String::new(),
        }]
    }

    #[test]
    fn every_product_id_is_enumerated() {
        let prompt = build_grounding_prompt(&sample_products(), None, "东京三日游");
        assert!(prompt.contains("Product ID: LINKTIVITY-3PWVV"));
        assert!(prompt.contains("¥4500"));
    }

    #[test]
    fn marker_atomicity_rules_are_present() {
        let prompt = build_grounding_prompt(&sample_products(), None, "q");
        assert!(prompt.contains("cannot be split"));
        assert!(prompt.contains("own line"));
        assert!(prompt.contains("blank lines"));
    }

    #[test]
    fn reasoning_suppression_is_present() {
        let prompt = build_grounding_prompt(&sample_products(), None, "q");
        assert!(prompt.contains("without showing any thinking process"));
    }

    #[test]
    fn budget_rendering() {
        let with = build_grounding_prompt(&sample_products(), Some(30000), "q");
        assert!(with.contains("User Budget: ¥30000"));
        let without = build_grounding_prompt(&sample_products(), None, "q");
        assert!(without.contains("User Budget: Not specified"));
    }

    #[test]
    fn query_appears_verbatim() {
        let prompt = build_grounding_prompt(&sample_products(), None, "想看夜景，预算3000元");
        assert!(prompt.contains("User Request: 想看夜景，预算3000元"));
    }
}
