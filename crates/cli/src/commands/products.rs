//! `itinera products` — List the bundled product catalog.

use itinera_catalog::CatalogService;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let catalog =
        CatalogService::from_embedded().map_err(|e| format!("Failed to load catalog: {e}"))?;

    println!();
    println!("  产品目录 ({} 个产品)", catalog.products().len());
    println!();

    for p in catalog.products() {
        println!("  {}  —  {}", p.id, p.name);
        println!("      价格: ¥{}    时长: {}", p.price, p.duration);
        if !p.tags.is_empty() {
            println!("      标签: {}", p.tags.join(", "));
        }
        println!();
    }

    Ok(())
}
