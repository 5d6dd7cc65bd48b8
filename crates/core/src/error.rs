//! Error types for the Itinera domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; nothing aggregates across
//! contexts — the session resolves every failure where it occurs, so no
//! error here is fatal to the process and each turn leaves the session
//! ready for the next submission.

use thiserror::Error;

/// Failures of the classifier gateway.
///
/// The session resolves each kind to a fixed user-visible entry, except
/// `Unknown`, where it fails open and proceeds as if accepted.
#[derive(Debug, Clone, Error)]
pub enum ClassificationError {
    #[error("Provider busy: {0}")]
    Busy(String),

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Unknown classifier failure: {0}")]
    Unknown(String),
}

/// Failures of the streaming completion gateway.
#[derive(Debug, Clone, Error)]
pub enum StreamError {
    /// The transport dropped mid-stream (connection reset, decode failure).
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// The gateway refused the request before any fragment was delivered.
    #[error("Gateway rejected request: {0}")]
    GatewayRejected(String),
}

/// Failures of the catalog gateway.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}
