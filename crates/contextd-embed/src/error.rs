//! Error types for the embedding crate.

use thiserror::Error;

/// Result type alias using the embedding error type.
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Errors produced while computing embeddings.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// The provider answered with an error.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Network/connectivity error.
    #[error("Network error: {0}")]
    Network(String),

    /// Configuration error (API key missing, unknown provider, etc.).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Response could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Model loading or inference failed.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EmbedError {
    /// Returns true if retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

impl From<reqwest::Error> for EmbedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EmbedError::Network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            EmbedError::Network(format!("Connection failed: {}", err))
        } else {
            EmbedError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for EmbedError {
    fn from(err: serde_json::Error) -> Self {
        EmbedError::Serialization(err.to_string())
    }
}
