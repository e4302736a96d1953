//! Error types for larder.

use thiserror::Error;

/// Result type alias using larder's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for larder operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Shopping list not found
    #[error("Shopping list not found: {0}")]
    ListNotFound(uuid::Uuid),

    /// Shopping list item not found
    #[error("Item not found: {0}")]
    ItemNotFound(uuid::Uuid),

    /// Assisted quantity combination failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Price lookup failed
    #[error("Pricing error: {0}")]
    Pricing(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Conflicting concurrent operation (retryable)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
