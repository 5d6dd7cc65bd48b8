//! Dataset loading.
//!
//! The catalog ships as a nested JSON document: destinations, each carrying
//! its attractions. The service flattens it into a plain product list at
//! load time; nothing downstream cares about the nesting.

use serde::Deserialize;

use itinera_core::{CatalogError, Product};

/// The embedded default dataset.
pub const EMBEDDED_DATASET: &str = include_str!("../data/tourism.json");

#[derive(Debug, Deserialize)]
pub struct Dataset {
    pub destinations: Vec<Destination>,
}

#[derive(Debug, Deserialize)]
pub struct Destination {
    pub name: String,
    pub attractions: Vec<Attraction>,
}

/// One attraction record as it appears in the dataset (camelCase keys).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attraction {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: u32,
    #[serde(default)]
    pub booking_url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub recommendation: String,
    #[serde(default)]
    pub thumbnail_url: String,
}

impl From<Attraction> for Product {
    fn from(a: Attraction) -> Self {
        Product {
            id: a.id,
            name: a.name,
            description: a.description,
            price: a.price,
            booking_url: a.booking_url,
            tags: a.tags,
            duration: a.duration,
            recommendation: a.recommendation,
            thumbnail_url: a.thumbnail_url,
        }
    }
}

/// Parse a dataset document and flatten it into a product list.
pub fn parse_dataset(json: &str) -> Result<Vec<Product>, CatalogError> {
    let dataset: Dataset =
        serde_json::from_str(json).map_err(|e| CatalogError::Dataset(e.to_string()))?;

    Ok(dataset
        .destinations
        .into_iter()
        .flat_map(|dest| dest.attractions)
        .map(Product::from)
        .collect())
}
