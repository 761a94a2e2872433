//! Context API.

use crate::client::ContextClient;
use crate::error::Result;
use crate::types::{
    AddContextRequest, AddContextResponse, ClearContextRequest, ClearContextResponse,
    MessageInput, PurgeResponse, QueryContextRequest, QueryContextResponse, RecentContextResponse,
    SessionStats,
};

/// Query parameters for the recency view.
#[derive(Debug, Default, serde::Serialize)]
pub struct RecentQuery {
    /// Session to read.
    pub session_id: String,
    /// Page size; the server defaults to 10.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Entries to skip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

/// Context API client.
pub struct ContextApi {
    client: ContextClient,
}

impl ContextApi {
    pub(crate) fn new(client: ContextClient) -> Self {
        Self { client }
    }

    /// Store a message in a session.
    pub async fn add(&self, session_id: &str, message: MessageInput) -> Result<AddContextResponse> {
        let request = AddContextRequest {
            session_id: session_id.to_string(),
            message,
        };
        self.client.post("context/add", &request).await
    }

    /// Semantic search within a session.
    pub async fn query(&self, request: &QueryContextRequest) -> Result<QueryContextResponse> {
        self.client.post("context/query", request).await
    }

    /// One page of a session, newest first.
    pub async fn recent(&self, query: &RecentQuery) -> Result<RecentContextResponse> {
        self.client.post_with_query("context/recent", query).await
    }

    /// Delete every entry of a session.
    pub async fn clear(&self, session_id: &str) -> Result<ClearContextResponse> {
        let request = ClearContextRequest {
            session_id: session_id.to_string(),
        };
        self.client.post("context/clear", &request).await
    }

    /// Aggregate statistics for a session.
    pub async fn stats(&self, session_id: &str) -> Result<SessionStats> {
        let url = self.client.url_with_segment("context/stats/", session_id)?;
        self.client.get(url).await
    }

    /// Delete everything in every session.
    pub async fn purge_all(&self) -> Result<PurgeResponse> {
        self.client.delete("context/all").await
    }
}
