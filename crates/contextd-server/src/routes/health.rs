//! Health check and service status endpoints.

use axum::{Json, Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ServerError;
use crate::state::AppState;

/// Service name reported by the root route.
pub const SERVICE_NAME: &str = "Code Agent Context Service";

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Root status response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServiceStatus {
    /// Service name.
    pub service: String,
    /// Always `running` when the service answers.
    pub status: String,
    /// Entries stored across all sessions.
    pub total_contexts: usize,
}

/// Simple liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    ),
    tag = "health"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET / - Service status with the total number of stored contexts.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is running", body = ServiceStatus),
        (status = 503, description = "Store unavailable", body = crate::error::ErrorResponse),
    ),
    tag = "health"
)]
pub async fn root_handler(State(state): State<AppState>) -> Result<Json<ServiceStatus>, ServerError> {
    let total_contexts = state.service.total_count().await?;

    Ok(Json(ServiceStatus {
        service: SERVICE_NAME.to_string(),
        status: "running".to_string(),
        total_contexts,
    }))
}

/// Create health check routes.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use contextd_embed::MockEmbedder;
    use contextd_store::{ContextService, InMemoryVectorIndex, NewMessage, ServiceConfig};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let service = ContextService::new(
            Arc::new(InMemoryVectorIndex::new(16)),
            Arc::new(MockEmbedder::new(16)),
            ServiceConfig::default(),
        );
        AppState::new(service, ServerConfig::new())
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = Router::new().route("/health", get(health));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();

        assert_eq!(health.status, "ok");
        assert!(!health.version.is_empty());
    }

    #[tokio::test]
    async fn test_root_reports_total_contexts() {
        let state = create_test_state();
        state
            .service
            .add("s1", NewMessage::new("user", "hello"))
            .await
            .unwrap();
        state
            .service
            .add("s2", NewMessage::new("assistant", "hi"))
            .await
            .unwrap();

        let app = health_routes().with_state(state);
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let status: ServiceStatus = serde_json::from_slice(&body).unwrap();
        assert_eq!(status.service, SERVICE_NAME);
        assert_eq!(status.status, "running");
        assert_eq!(status.total_contexts, 2);
    }
}
