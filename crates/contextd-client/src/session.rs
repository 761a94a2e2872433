//! Session-bound client helper.

use crate::api::RecentQuery;
use crate::client::ContextClient;
use crate::error::Result;
use crate::types::{
    ContextMatch, MessageInput, QueryContextRequest, RecentContextResponse, SessionStats,
};
use crate::window::ContextWindow;

/// Relevant items fetched for a context window.
pub const DEFAULT_RELEVANT_ITEMS: usize = 5;

/// Recent turns fetched for a context window.
pub const DEFAULT_RECENT_ITEMS: usize = 3;

/// Context operations scoped to one session id.
///
/// Obtained from [`ContextClient::session`].
#[derive(Clone)]
pub struct SessionContext {
    client: ContextClient,
    session_id: String,
}

impl SessionContext {
    pub(crate) fn new(client: ContextClient, session_id: String) -> Self {
        Self { client, session_id }
    }

    /// The bound session id.
    pub fn id(&self) -> &str {
        &self.session_id
    }

    /// Store a turn; returns the entry id.
    pub async fn add(&self, role: &str, content: &str) -> Result<String> {
        self.add_message(MessageInput::new(role, content)).await
    }

    /// Store a fully specified turn; returns the entry id.
    pub async fn add_message(&self, message: MessageInput) -> Result<String> {
        let response = self.client.context().add(&self.session_id, message).await?;
        Ok(response.id)
    }

    /// Entries most similar to `query`, nearest first.
    pub async fn query(&self, query: &str, top_k: usize) -> Result<Vec<ContextMatch>> {
        let request = QueryContextRequest::new(&self.session_id, query).with_top_k(top_k);
        Ok(self.client.context().query(&request).await?.messages)
    }

    /// Like [`query`](Self::query), restricted to one message type.
    pub async fn query_by_type(
        &self,
        query: &str,
        top_k: usize,
        message_type: &str,
    ) -> Result<Vec<ContextMatch>> {
        let request = QueryContextRequest::new(&self.session_id, query)
            .with_top_k(top_k)
            .with_type(message_type);
        Ok(self.client.context().query(&request).await?.messages)
    }

    /// The newest `limit` entries.
    pub async fn recent(&self, limit: usize) -> Result<RecentContextResponse> {
        self.recent_page(limit, 0).await
    }

    /// One page of entries, newest first.
    pub async fn recent_page(&self, limit: usize, offset: usize) -> Result<RecentContextResponse> {
        let query = RecentQuery {
            session_id: self.session_id.clone(),
            limit: Some(limit),
            offset: Some(offset),
        };
        self.client.context().recent(&query).await
    }

    /// Aggregate statistics.
    pub async fn stats(&self) -> Result<SessionStats> {
        self.client.context().stats(&self.session_id).await
    }

    /// Delete every entry; returns how many were removed.
    pub async fn clear(&self) -> Result<usize> {
        Ok(self.client.context().clear(&self.session_id).await?.deleted_count)
    }

    /// Retrieve relevant and recent context for `request` and assemble a window.
    pub async fn context_window(&self, request: &str) -> Result<ContextWindow> {
        self.context_window_with(request, DEFAULT_RELEVANT_ITEMS, DEFAULT_RECENT_ITEMS)
            .await
    }

    /// [`context_window`](Self::context_window) with explicit fetch sizes.
    pub async fn context_window_with(
        &self,
        request: &str,
        relevant_items: usize,
        recent_items: usize,
    ) -> Result<ContextWindow> {
        let relevant = self.query(request, relevant_items).await?;
        let recent = self.recent(recent_items).await?.messages;
        Ok(ContextWindow::build(relevant, recent, request))
    }
}
