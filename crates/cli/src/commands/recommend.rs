//! `itinera recommend` — Query the catalog directly.

use itinera_catalog::CatalogService;

pub async fn run(query: &str, budget: Option<u32>) -> Result<(), Box<dyn std::error::Error>> {
    let catalog =
        CatalogService::from_embedded().map_err(|e| format!("Failed to load catalog: {e}"))?;

    let rec = catalog.recommendations(query, budget);

    println!();
    println!("  {}", rec.message);
    println!();

    for p in &rec.products {
        println!("  {}  —  {}", p.id, p.name);
        println!("      价格: ¥{}    时长: {}", p.price, p.duration);
        if !p.recommendation.is_empty() {
            println!("      {}", p.recommendation);
        }
        println!();
    }

    if rec.total_matched > rec.products.len() {
        println!("  (共匹配 {} 个，仅显示前 {} 个)", rec.total_matched, rec.products.len());
    }

    Ok(())
}
