//! OpenAPI documentation configuration.

use axum::{Json, Router, routing::get};
use utoipa::OpenApi;

use super::{context, health};
use crate::error::ErrorResponse;
use crate::state::AppState;

/// OpenAPI documentation for the contextd API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "contextd API",
        description = "Session-scoped semantic context store for coding agents",
        version = "1.0.0",
        license(name = "MIT"),
    ),
    servers(
        (url = "/", description = "Local server"),
    ),
    paths(
        // Health
        health::health,
        health::root_handler,
        // Context
        context::add_context_handler,
        context::query_context_handler,
        context::recent_context_handler,
        context::clear_context_handler,
        context::session_stats_handler,
        context::purge_all_handler,
    ),
    components(
        schemas(
            ErrorResponse,
            // Health
            health::HealthResponse,
            health::ServiceStatus,
            // Context
            context::MessageInput,
            context::AddContextRequest,
            context::AddContextResponse,
            context::QueryContextRequest,
            context::ContextMatch,
            context::QueryContextResponse,
            context::RecentMessage,
            context::RecentContextResponse,
            context::ClearContextRequest,
            context::ClearContextResponse,
            context::SessionStatsResponse,
            context::PurgeResponse,
        )
    ),
    tags(
        (name = "health", description = "Health and status endpoints"),
        (name = "context", description = "Context storage and retrieval"),
    )
)]
pub struct ApiDoc;

/// GET /openapi.json - The OpenAPI document.
pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Route serving the OpenAPI document.
pub fn openapi_routes() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/",
            "/health",
            "/context/add",
            "/context/query",
            "/context/recent",
            "/context/clear",
            "/context/stats/{session_id}",
            "/context/all",
        ] {
            assert!(paths.contains(&expected), "missing path {}", expected);
        }
    }
}
