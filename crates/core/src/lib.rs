//! # Itinera Core
//!
//! Domain types, gateway traits, and error definitions for the Itinera
//! travel assistant. This crate has **zero framework dependencies** — it
//! defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (classifier, completion stream, catalog) is
//! defined as a trait here. Implementations live in their respective crates.
//! This enables:
//! - Swapping the real Zhipu gateway for the scripted fallback via config
//! - Testing the session state machine with mock gateways
//! - Clean dependency graph (all crates depend inward on core)

pub mod entry;
pub mod error;
pub mod gateway;
pub mod product;

// Re-export key types at crate root for ergonomics
pub use entry::{ConversationEntry, EntryId, EntryStatus, Role};
pub use error::{CatalogError, ClassificationError, StreamError};
pub use gateway::{CatalogGateway, Classifier, CompletionGateway, FragmentReceiver, Verdict};
pub use product::{Product, Recommendation};
