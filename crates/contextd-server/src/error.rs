//! Error types for the server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use contextd_store::{ContextError, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Bad request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The embedding provider failed or timed out.
    #[error("Embedding provider error: {0}")]
    Provider(String),

    /// The context store failed or timed out.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationError> for ServerError {
    fn from(e: ValidationError) -> Self {
        ServerError::BadRequest(e.to_string())
    }
}

impl From<ContextError> for ServerError {
    fn from(e: ContextError) -> Self {
        match e {
            ContextError::Validation(e) => ServerError::BadRequest(e.to_string()),
            ContextError::Provider(msg) => ServerError::Provider(msg),
            ContextError::Store(e) => ServerError::Storage(e.to_string()),
        }
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ServerError {
    /// HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ServerError::Provider(_) => (StatusCode::BAD_GATEWAY, "provider_error"),
            ServerError::Storage(_) => (StatusCode::SERVICE_UNAVAILABLE, "storage_error"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.to_string();

        match &self {
            ServerError::BadRequest(_) => {
                tracing::warn!(status = %status, code, error = %message, "Client error");
            }
            _ => {
                tracing::error!(status = %status, code, error = %message, "Server error");
            }
        }

        let body = ErrorResponse {
            code: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
