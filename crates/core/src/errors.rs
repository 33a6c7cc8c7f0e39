//! Error types shared across the pocketledger crates.

use thiserror::Error;

/// Result type alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Local store failure.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Remote store failure (network or API rejection).
    #[error("Remote store error: {0}")]
    Remote(String),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Rejected input (amount out of range, unknown category, etc.).
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Local store error detail.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration step failed: {0}")]
    Migration(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a remote store error from any displayable cause.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote(message.into())
    }
}
