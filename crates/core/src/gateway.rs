//! Gateway traits — the abstractions over external collaborators.
//!
//! The session state machine talks to three collaborators, each behind a
//! trait so implementations can be swapped (real Zhipu gateway, scripted
//! fallback, test mocks) without the session knowing the difference.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{CatalogError, ClassificationError, StreamError};
use crate::product::{Product, Recommendation};

/// Classifier verdict for one user query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The query is in-domain; proceed to recommendation.
    Accepted,
    /// The query is explicitly out-of-domain.
    Rejected,
}

/// Decides whether a free-text query is in-domain for travel recommendation.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify a raw user query.
    ///
    /// Implementations build their own deterministic instruction prompt; the
    /// caller passes only the user's text.
    async fn classify(&self, query: &str) -> std::result::Result<Verdict, ClassificationError>;
}

/// The receiving half of one completion stream: text fragments in generation
/// order, terminated by channel close (success) or an error item.
pub type FragmentReceiver = mpsc::Receiver<std::result::Result<String, StreamError>>;

/// Streams model output for a single-instruction prompt.
///
/// Fragments are delivered in generation order with no guarantee about size
/// or boundary alignment — a `[PRODUCT:...]` marker may be cut anywhere.
/// Wire framing (SSE records, sentinels) is entirely the implementation's
/// concern and never surfaces here.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn stream_complete(
        &self,
        prompt: &str,
    ) -> std::result::Result<FragmentReceiver, StreamError>;
}

/// Read access to the travel product catalog.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// The full catalog snapshot, in dataset order.
    async fn all_products(&self) -> std::result::Result<Vec<Product>, CatalogError>;

    /// Ranked subset for a query: keyword containment, optional budget
    /// cutoff, price-ascending, capped. Not on the streaming hot path.
    async fn recommend(
        &self,
        query: &str,
        budget: Option<u32>,
    ) -> std::result::Result<Recommendation, CatalogError>;
}
