//! HTTP API server for contextd.
//!
//! Exposes a [`ContextService`] over JSON/HTTP so an agent loop can store
//! conversation turns and pull back relevant or recent context.
//!
//! # Routes
//!
//! - `GET /` service status and total entry count
//! - `POST /context/add`, `/context/query`, `/context/recent`, `/context/clear`
//! - `GET /context/stats/{session_id}`
//! - `DELETE /context/all`
//! - `GET /health`, `GET /openapi.json`
//!
//! # Example
//!
//! ```ignore
//! use contextd_server::{Server, ServerConfig};
//!
//! let config = ServerConfig::new().with_bind_address("127.0.0.1:8000".parse()?);
//! let server = Server::new(service, config);
//! server.run().await?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;

pub use config::{DEFAULT_MAX_BODY_SIZE, DEFAULT_PORT, ServerConfig};
pub use error::{ErrorResponse, Result, ServerError};
pub use logging::request_logging_middleware;
pub use routes::ApiDoc;
pub use state::AppState;

use std::net::SocketAddr;

use axum::{Router, extract::DefaultBodyLimit, middleware};
use contextd_store::ContextService;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// The contextd HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a new server around a context service.
    pub fn new(service: ContextService, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(service, config),
        }
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .merge(routes::health_routes())
            .merge(routes::context_routes())
            .merge(routes::openapi_routes())
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                logging::request_logging_middleware,
            ))
            .layer(DefaultBodyLimit::max(self.state.config.max_body_size))
            .layer(RequestBodyLimitLayer::new(self.state.config.max_body_size))
            .layer(TraceLayer::new_for_http());

        if self.state.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        router.with_state(self.state.clone())
    }

    /// Run the server on the configured address.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind: {}", e)))?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let router = self.router();

        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Internal(format!("Failed to read local address: {}", e)))?;
        info!(
            "Starting server on {} (embedder: {}, index: {})",
            local_addr,
            self.state.service.embedder_name(),
            self.state.service.index_name()
        );

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}
