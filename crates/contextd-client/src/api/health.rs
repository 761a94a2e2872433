//! Health and status API.

use crate::client::ContextClient;
use crate::error::Result;
use crate::types::{HealthResponse, ServiceStatus};

/// Health API client.
pub struct HealthApi {
    client: ContextClient,
}

impl HealthApi {
    pub(crate) fn new(client: ContextClient) -> Self {
        Self { client }
    }

    /// Check basic health.
    pub async fn check(&self) -> Result<HealthResponse> {
        self.client.get(self.client.url("health")?).await
    }

    /// Simple connectivity check - returns true if server is reachable.
    pub async fn is_healthy(&self) -> bool {
        self.check().await.is_ok()
    }

    /// Service status, including the total number of stored contexts.
    pub async fn status(&self) -> Result<ServiceStatus> {
        self.client.get(self.client.url("")?).await
    }
}
