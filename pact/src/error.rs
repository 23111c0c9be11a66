//! Contract errors.

use thiserror::Error;

/// Errors writing or verifying contracts.
#[derive(Error, Debug)]
pub enum PactError {
    /// Pact file I/O failed
    #[error("Pact file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Contract could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An interaction was never exercised
    #[error("Interaction not exercised: {0}")]
    MissingInteraction(String),

    /// A request matched no interaction
    #[error("Unexpected request: {method} {path}")]
    UnexpectedRequest {
        /// HTTP method
        method: String,
        /// Path and query
        path: String,
    },
}

/// Result type for contract operations.
pub type PactResult<T> = Result<T, PactError>;
