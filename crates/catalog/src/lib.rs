//! Travel product catalog for Itinera.
//!
//! Loads the nested destination/attraction dataset, flattens it, and offers
//! keyword search, budget filtering, and a ranked `recommend` query. The
//! service implements `itinera_core::CatalogGateway` and is constructed
//! explicitly by the composition root — never a module-level singleton.

pub mod dataset;
pub mod service;

pub use dataset::{parse_dataset, EMBEDDED_DATASET};
pub use service::CatalogService;
