//! Error types for the store crate.

use std::time::Duration;

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors raised by a [`VectorIndex`](crate::VectorIndex) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database connection or operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization of stored metadata failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error while opening the store.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid filter or query parameters.
    #[error("Query error: {0}")]
    Query(String),

    /// Vector length does not match the collection's dimensions.
    #[error("Dimension mismatch: collection has {expected} dimensions, got {actual}")]
    DimensionMismatch {
        /// Dimensions the collection was created with.
        expected: usize,
        /// Dimensions supplied.
        actual: usize,
    },

    /// The collection holds vectors from a different embedding provider.
    #[error("Provider mismatch: collection was built with '{expected}', got '{actual}'")]
    ProviderMismatch {
        /// Provider recorded when the collection was created.
        expected: String,
        /// Provider supplied.
        actual: String,
    },

    /// An index call did not finish in time.
    #[error("Index operation '{operation}' timed out after {timeout:?}")]
    Timeout {
        /// Which operation timed out.
        operation: &'static str,
        /// Configured limit.
        timeout: Duration,
    },

    /// The backend is unavailable.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by [`ContextService`](crate::ContextService).
#[derive(Debug, Error)]
pub enum ContextError {
    /// Missing or malformed input.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The embedding provider failed or timed out.
    #[error("Embedding provider error: {0}")]
    Provider(String),

    /// The vector index failed or timed out.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<contextd_embed::EmbedError> for ContextError {
    fn from(err: contextd_embed::EmbedError) -> Self {
        ContextError::Provider(err.to_string())
    }
}

/// Result type alias for service operations.
pub type ContextResult<T> = std::result::Result<T, ContextError>;
