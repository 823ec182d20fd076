//! Error types for cache operations.

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-specific errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Backend unavailable
    #[error("Connection error: {0}")]
    Connection(String),

    /// Value producer failed inside `remember`
    #[error("Cache fill failed: {0}")]
    Fill(String),

    /// Generic error
    #[error("Cache error: {0}")]
    Other(String),
}
