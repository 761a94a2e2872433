//! Context storage and retrieval endpoints.

use std::collections::BTreeMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use contextd_store::{ContextMetadata, MessageType, NewMessage, QueryMatch, SessionStats, StoredContext};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::error::{ErrorResponse, ServerError};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// A conversation turn to store.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageInput {
    /// Speaker role (`user`, `assistant`, `system`, ...).
    pub role: String,
    /// Message text, stored verbatim.
    pub content: String,
    /// ISO-8601 timestamp. Defaults to the time of the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Extra metadata keys. Reserved keys are ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Map<String, Value>>,
}

impl From<MessageInput> for NewMessage {
    fn from(input: MessageInput) -> Self {
        NewMessage {
            role: input.role,
            content: input.content,
            timestamp: input.timestamp,
            metadata: input.metadata,
        }
    }
}

/// Request to store a message.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddContextRequest {
    /// Session the message belongs to.
    pub session_id: String,
    /// The message.
    pub message: MessageInput,
}

/// Response after storing a message.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddContextResponse {
    /// Always `success`.
    pub status: String,
    /// Id of the stored entry.
    pub id: String,
    /// Confirmation message.
    pub message: String,
}

/// Semantic search request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueryContextRequest {
    /// Session to search.
    pub session_id: String,
    /// Free-text query.
    pub query: String,
    /// Number of results wanted; capped by the server.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Restrict results to one message type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_by_type: Option<String>,
}

fn default_top_k() -> usize {
    5
}

/// One semantic search hit.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContextMatch {
    /// Entry id.
    pub id: String,
    /// Full original content.
    pub content: String,
    /// Entry metadata.
    #[schema(value_type = Object)]
    pub metadata: ContextMetadata,
    /// Distance from the query (lower = more similar).
    pub distance: f32,
}

impl From<QueryMatch> for ContextMatch {
    fn from(m: QueryMatch) -> Self {
        Self {
            id: m.id,
            content: m.content,
            metadata: m.metadata,
            distance: m.distance,
        }
    }
}

/// Semantic search response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueryContextResponse {
    /// Matches, nearest first.
    pub messages: Vec<ContextMatch>,
    /// Number of matches returned.
    pub total_count: usize,
}

/// Query params for the recency view.
#[derive(Debug, Clone, Deserialize)]
pub struct RecentQuery {
    /// Session to read.
    pub session_id: String,
    /// Page size.
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Entries to skip.
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    10
}

/// One entry of the recency view.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecentMessage {
    /// Entry id.
    pub id: String,
    /// Full original content.
    pub content: String,
    /// Entry metadata.
    #[schema(value_type = Object)]
    pub metadata: ContextMetadata,
    /// The entry's timestamp, hoisted out of the metadata.
    pub timestamp: String,
}

impl From<StoredContext> for RecentMessage {
    fn from(ctx: StoredContext) -> Self {
        Self {
            timestamp: ctx.metadata.timestamp.clone(),
            id: ctx.id,
            content: ctx.content,
            metadata: ctx.metadata,
        }
    }
}

/// Recency view response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecentContextResponse {
    /// One page of entries, newest first.
    pub messages: Vec<RecentMessage>,
    /// Session size before pagination.
    pub total_count: usize,
}

/// Request to clear a session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClearContextRequest {
    /// Session to clear.
    pub session_id: String,
}

/// Response after clearing a session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClearContextResponse {
    /// Always `success`.
    pub status: String,
    /// Entries removed.
    pub deleted_count: usize,
}

/// Aggregate statistics for a session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionStatsResponse {
    /// Session id.
    pub session_id: String,
    /// Entries in the session.
    pub total_messages: usize,
    /// Entry count per message type.
    pub by_type: BTreeMap<String, usize>,
    /// Earliest timestamp; absent for an empty session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oldest_message: Option<String>,
    /// Latest timestamp; absent for an empty session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newest_message: Option<String>,
}

impl From<SessionStats> for SessionStatsResponse {
    fn from(stats: SessionStats) -> Self {
        Self {
            session_id: stats.session_id,
            total_messages: stats.total_messages,
            by_type: stats.by_type,
            oldest_message: stats.oldest_message,
            newest_message: stats.newest_message,
        }
    }
}

/// Response after purging every session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PurgeResponse {
    /// Always `success`.
    pub status: String,
    /// Confirmation message.
    pub message: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// POST /context/add - Store a conversation turn.
#[utoipa::path(
    post,
    path = "/context/add",
    request_body = AddContextRequest,
    responses(
        (status = 200, description = "Message stored", body = AddContextResponse),
        (status = 400, description = "Invalid message", body = ErrorResponse),
        (status = 502, description = "Embedding provider failed", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse),
    ),
    tag = "context"
)]
pub async fn add_context_handler(
    State(state): State<AppState>,
    Json(request): Json<AddContextRequest>,
) -> Result<Json<AddContextResponse>, ServerError> {
    let id = state
        .service
        .add(&request.session_id, request.message.into())
        .await?;

    Ok(Json(AddContextResponse {
        status: "success".to_string(),
        id,
        message: "Context added successfully".to_string(),
    }))
}

/// POST /context/query - Semantic search within a session.
#[utoipa::path(
    post,
    path = "/context/query",
    request_body = QueryContextRequest,
    responses(
        (status = 200, description = "Nearest entries", body = QueryContextResponse),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 502, description = "Embedding provider failed", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse),
    ),
    tag = "context"
)]
pub async fn query_context_handler(
    State(state): State<AppState>,
    Json(request): Json<QueryContextRequest>,
) -> Result<Json<QueryContextResponse>, ServerError> {
    let filter_by_type = request
        .filter_by_type
        .as_deref()
        .map(str::parse::<MessageType>)
        .transpose()?;

    let matches = state
        .service
        .query(
            &request.session_id,
            &request.query,
            request.top_k,
            filter_by_type,
        )
        .await?;

    let messages: Vec<ContextMatch> = matches.into_iter().map(ContextMatch::from).collect();
    let total_count = messages.len();

    Ok(Json(QueryContextResponse {
        messages,
        total_count,
    }))
}

/// POST /context/recent - Page through a session, newest first.
#[utoipa::path(
    post,
    path = "/context/recent",
    params(
        ("session_id" = String, Query, description = "Session to read"),
        ("limit" = Option<usize>, Query, description = "Page size (default 10)"),
        ("offset" = Option<usize>, Query, description = "Entries to skip (default 0)"),
    ),
    responses(
        (status = 200, description = "One page of entries", body = RecentContextResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse),
    ),
    tag = "context"
)]
pub async fn recent_context_handler(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<RecentContextResponse>, ServerError> {
    let page = state
        .service
        .recent(&query.session_id, query.limit, query.offset)
        .await?;

    Ok(Json(RecentContextResponse {
        messages: page.messages.into_iter().map(RecentMessage::from).collect(),
        total_count: page.total_count,
    }))
}

/// POST /context/clear - Delete every entry of a session.
#[utoipa::path(
    post,
    path = "/context/clear",
    request_body = ClearContextRequest,
    responses(
        (status = 200, description = "Session cleared", body = ClearContextResponse),
        (status = 400, description = "Invalid session id", body = ErrorResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse),
    ),
    tag = "context"
)]
pub async fn clear_context_handler(
    State(state): State<AppState>,
    Json(request): Json<ClearContextRequest>,
) -> Result<Json<ClearContextResponse>, ServerError> {
    let deleted_count = state.service.clear(&request.session_id).await?;

    Ok(Json(ClearContextResponse {
        status: "success".to_string(),
        deleted_count,
    }))
}

/// GET /context/stats/{session_id} - Aggregate statistics for a session.
#[utoipa::path(
    get,
    path = "/context/stats/{session_id}",
    params(
        ("session_id" = String, Path, description = "Session id"),
    ),
    responses(
        (status = 200, description = "Session statistics", body = SessionStatsResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse),
    ),
    tag = "context"
)]
pub async fn session_stats_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionStatsResponse>, ServerError> {
    let stats = state.service.stats(&session_id).await?;
    Ok(Json(stats.into()))
}

/// DELETE /context/all - Destroy every entry in every session.
#[utoipa::path(
    delete,
    path = "/context/all",
    responses(
        (status = 200, description = "Everything deleted", body = PurgeResponse),
        (status = 503, description = "Store unavailable", body = ErrorResponse),
    ),
    tag = "context"
)]
pub async fn purge_all_handler(
    State(state): State<AppState>,
) -> Result<Json<PurgeResponse>, ServerError> {
    state.service.purge_all().await?;

    Ok(Json(PurgeResponse {
        status: "success".to_string(),
        message: "All context cleared".to_string(),
    }))
}

/// Create context routes.
pub fn context_routes() -> Router<AppState> {
    Router::new()
        .route("/context/add", post(add_context_handler))
        .route("/context/query", post(query_context_handler))
        .route("/context/recent", post(recent_context_handler))
        .route("/context/clear", post(clear_context_handler))
        .route("/context/stats/{session_id}", get(session_stats_handler))
        .route("/context/all", delete(purge_all_handler))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use contextd_embed::MockEmbedder;
    use contextd_store::{ContextService, InMemoryVectorIndex, ServiceConfig};
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let service = ContextService::new(
            Arc::new(InMemoryVectorIndex::new(32)),
            Arc::new(MockEmbedder::new(32)),
            ServiceConfig::default(),
        );
        AppState::new(service, ServerConfig::new().with_request_logging(false))
    }

    fn create_test_router(state: AppState) -> Router {
        context_routes().with_state(state)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, value)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_context() {
        let app = create_test_router(create_test_state());

        let (status, body) = send(
            &app,
            post_json(
                "/context/add",
                json!({"session_id": "s1", "message": {"role": "user", "content": "hello world"}}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Context added successfully");
        assert_eq!(body["id"].as_str().unwrap().len(), 64);
    }

    #[tokio::test]
    async fn test_add_context_empty_role_is_bad_request() {
        let app = create_test_router(create_test_state());

        let (status, body) = send(
            &app,
            post_json(
                "/context/add",
                json!({"session_id": "s1", "message": {"role": "", "content": "x"}}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "bad_request");
    }

    #[tokio::test]
    async fn test_add_context_missing_field_is_rejected() {
        let app = create_test_router(create_test_state());

        let (status, _) = send(
            &app,
            post_json("/context/add", json!({"session_id": "s1"})),
        )
        .await;

        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_query_context_with_type_filter() {
        let state = create_test_state();
        state
            .service
            .add("s1", NewMessage::new("user", "how do I parse json"))
            .await
            .unwrap();
        state
            .service
            .add("s1", NewMessage::new("assistant", "use serde_json"))
            .await
            .unwrap();
        let app = create_test_router(state);

        let (status, body) = send(
            &app,
            post_json(
                "/context/query",
                json!({"session_id": "s1", "query": "json", "filter_by_type": "agent_response"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_count"], 1);
        assert_eq!(body["messages"][0]["metadata"]["type"], "agent_response");
        assert!(body["messages"][0]["distance"].is_number());
    }

    #[tokio::test]
    async fn test_query_unknown_type_is_bad_request() {
        let app = create_test_router(create_test_state());

        let (status, body) = send(
            &app,
            post_json(
                "/context/query",
                json!({"session_id": "s1", "query": "x", "filter_by_type": "memo"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "bad_request");
    }

    #[tokio::test]
    async fn test_query_default_top_k_is_five() {
        let state = create_test_state();
        for i in 0..8 {
            state
                .service
                .add("s1", NewMessage::new("user", format!("message {}", i)))
                .await
                .unwrap();
        }
        let app = create_test_router(state);

        let (status, body) = send(
            &app,
            post_json("/context/query", json!({"session_id": "s1", "query": "message"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_count"], 5);
    }

    #[tokio::test]
    async fn test_recent_context_uses_query_params() {
        let state = create_test_state();
        for (i, ts) in ["2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z", "2024-01-03T00:00:00Z"]
            .iter()
            .enumerate()
        {
            state
                .service
                .add(
                    "s1",
                    NewMessage::new("user", format!("turn {}", i)).with_timestamp(*ts),
                )
                .await
                .unwrap();
        }
        let app = create_test_router(state);

        let request = Request::builder()
            .method("POST")
            .uri("/context/recent?session_id=s1&limit=2&offset=0")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_count"], 3);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["content"], "turn 2");
        assert_eq!(messages[1]["content"], "turn 1");
        assert_eq!(messages[0]["timestamp"], messages[0]["metadata"]["timestamp"]);
    }

    #[tokio::test]
    async fn test_recent_without_session_is_rejected() {
        let app = create_test_router(create_test_state());

        let request = Request::builder()
            .method("POST")
            .uri("/context/recent")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_clear_and_stats() {
        let state = create_test_state();
        state
            .service
            .add("s1", NewMessage::new("user", "a"))
            .await
            .unwrap();
        state
            .service
            .add("s1", NewMessage::new("assistant", "b"))
            .await
            .unwrap();
        let app = create_test_router(state);

        let stats_request = || {
            Request::builder()
                .uri("/context/stats/s1")
                .body(Body::empty())
                .unwrap()
        };

        let (status, body) = send(&app, stats_request()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_messages"], 2);
        assert_eq!(body["by_type"]["user_query"], 1);
        assert_eq!(body["by_type"]["agent_response"], 1);
        assert!(body["oldest_message"].is_string());

        let (status, body) = send(&app, post_json("/context/clear", json!({"session_id": "s1"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["deleted_count"], 2);

        let (_, body) = send(&app, stats_request()).await;
        assert_eq!(body["total_messages"], 0);
        assert_eq!(body["by_type"], json!({}));
        assert!(body.get("oldest_message").is_none());
    }

    #[tokio::test]
    async fn test_purge_all() {
        let state = create_test_state();
        state
            .service
            .add("s1", NewMessage::new("user", "a"))
            .await
            .unwrap();
        state
            .service
            .add("s2", NewMessage::new("user", "b"))
            .await
            .unwrap();
        let service = state.service.clone();
        let app = create_test_router(state);

        let request = Request::builder()
            .method("DELETE")
            .uri("/context/all")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "All context cleared");
        assert_eq!(service.total_count().await.unwrap(), 0);
    }
}
