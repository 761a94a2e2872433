//! Application state shared across handlers.

use std::sync::Arc;

use contextd_store::ContextService;

use crate::config::ServerConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The context service backing every route.
    pub service: Arc<ContextService>,

    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(service: ContextService, config: ServerConfig) -> Self {
        Self::from_shared(Arc::new(service), config)
    }

    /// Create application state around an already-shared service.
    pub fn from_shared(service: Arc<ContextService>, config: ServerConfig) -> Self {
        Self {
            service,
            config: Arc::new(config),
        }
    }
}
