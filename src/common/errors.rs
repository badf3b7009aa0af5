//! Error types for the engine

use thiserror::Error;

/// Result type alias using our EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for store, remote-call and configuration failures
#[derive(Error, Debug)]
pub enum EngineError {
    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Trade store errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Invalid API response
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// A trade record violates a data invariant (missing field, bad number)
    #[error("Invalid trade record {id}: {reason}")]
    InvalidTrade { id: String, reason: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// The order client refused the order
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Whether this failure came from a remote collaborator and may succeed on a later cycle
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EngineError::HttpRequest(_)
                | EngineError::Database(_)
                | EngineError::InvalidResponse(_)
                | EngineError::Timeout(_)
                | EngineError::OrderRejected(_)
        )
    }
}
