//! Request and response types for the contextd API.
//!
//! These types mirror the server's API contract.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ─────────────────────────────────────────────────────────────────────────────
// Health
// ─────────────────────────────────────────────────────────────────────────────

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Root status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    /// Service name.
    pub service: String,
    /// Service status.
    pub status: String,
    /// Entries stored across all sessions.
    pub total_contexts: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Entries
// ─────────────────────────────────────────────────────────────────────────────

/// Metadata attached to every stored entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextMetadata {
    /// Owning session.
    pub session_id: String,
    /// Speaker role.
    pub role: String,
    /// Message type (`user_query`, `tool_call`, `agent_response`, `chat`).
    #[serde(rename = "type")]
    pub message_type: String,
    /// ISO-8601 timestamp.
    pub timestamp: String,
    /// Character count of the original content.
    pub content_length: usize,
    /// Caller-supplied keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A conversation turn to store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageInput {
    /// Speaker role.
    pub role: String,
    /// Message text.
    pub content: String,
    /// ISO-8601 timestamp; the server uses its clock when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Extra metadata keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl MessageInput {
    /// Create a message with the given role and content.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    /// Set an explicit timestamp.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Attach one metadata key.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Request to store a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddContextRequest {
    /// Session the message belongs to.
    pub session_id: String,
    /// The message.
    pub message: MessageInput,
}

/// Response after storing a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddContextResponse {
    /// `success`.
    pub status: String,
    /// Id of the stored entry.
    pub id: String,
    /// Confirmation message.
    pub message: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Retrieval
// ─────────────────────────────────────────────────────────────────────────────

/// Semantic search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryContextRequest {
    /// Session to search.
    pub session_id: String,
    /// Free-text query.
    pub query: String,
    /// Results wanted; the server defaults to 5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
    /// Restrict results to one message type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_by_type: Option<String>,
}

impl QueryContextRequest {
    /// Search `session_id` for `query` with server defaults.
    pub fn new(session_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            query: query.into(),
            top_k: None,
            filter_by_type: None,
        }
    }

    /// Set the number of results wanted.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Restrict results to one message type.
    pub fn with_type(mut self, message_type: impl Into<String>) -> Self {
        self.filter_by_type = Some(message_type.into());
        self
    }
}

/// One semantic search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextMatch {
    /// Entry id.
    pub id: String,
    /// Full original content.
    pub content: String,
    /// Entry metadata.
    pub metadata: ContextMetadata,
    /// Distance from the query (lower = more similar).
    pub distance: f32,
}

/// Semantic search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryContextResponse {
    /// Matches, nearest first.
    pub messages: Vec<ContextMatch>,
    /// Number of matches returned.
    pub total_count: usize,
}

/// One entry of the recency view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentMessage {
    /// Entry id.
    pub id: String,
    /// Full original content.
    pub content: String,
    /// Entry metadata.
    pub metadata: ContextMetadata,
    /// The entry's timestamp.
    pub timestamp: String,
}

/// Recency view response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentContextResponse {
    /// One page of entries, newest first.
    pub messages: Vec<RecentMessage>,
    /// Session size before pagination.
    pub total_count: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Maintenance
// ─────────────────────────────────────────────────────────────────────────────

/// Request to clear a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearContextRequest {
    /// Session to clear.
    pub session_id: String,
}

/// Response after clearing a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearContextResponse {
    /// `success`.
    pub status: String,
    /// Entries removed.
    pub deleted_count: usize,
}

/// Aggregate statistics for a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Session id.
    pub session_id: String,
    /// Entries in the session.
    pub total_messages: usize,
    /// Entry count per message type.
    #[serde(default)]
    pub by_type: BTreeMap<String, usize>,
    /// Earliest timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oldest_message: Option<String>,
    /// Latest timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newest_message: Option<String>,
}

/// Response after purging every session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeResponse {
    /// `success`.
    pub status: String,
    /// Confirmation message.
    pub message: String,
}
