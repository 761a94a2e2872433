//! API routes.

pub mod context;
pub mod health;
pub mod openapi;

pub use context::{
    AddContextRequest, AddContextResponse, ClearContextRequest, ClearContextResponse,
    ContextMatch, MessageInput, PurgeResponse, QueryContextRequest, QueryContextResponse,
    RecentContextResponse, RecentMessage, SessionStatsResponse, add_context_handler,
    clear_context_handler, context_routes, purge_all_handler, query_context_handler,
    recent_context_handler, session_stats_handler,
};
pub use health::{HealthResponse, SERVICE_NAME, ServiceStatus, health_routes};
pub use openapi::{ApiDoc, openapi_routes};
