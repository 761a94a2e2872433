//! Context entry and metadata types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::validation::ValidationError;

// ─────────────────────────────────────────────────────────────────────────────
// Message Type
// ─────────────────────────────────────────────────────────────────────────────

/// Classification assigned to every entry at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    UserQuery,
    ToolCall,
    AgentResponse,
    Chat,
}

impl MessageType {
    /// Wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserQuery => "user_query",
            Self::ToolCall => "tool_call",
            Self::AgentResponse => "agent_response",
            Self::Chat => "chat",
        }
    }

    /// All types, in declaration order.
    pub fn all() -> [MessageType; 4] {
        [
            Self::UserQuery,
            Self::ToolCall,
            Self::AgentResponse,
            Self::Chat,
        ]
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownMessageType(s.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Metadata
// ─────────────────────────────────────────────────────────────────────────────

/// Metadata keys owned by the store. Caller-supplied values for these are dropped.
pub const RESERVED_METADATA_KEYS: [&str; 5] =
    ["session_id", "role", "type", "timestamp", "content_length"];

/// Metadata attached to a stored entry.
///
/// Serialized flat: the required fields and the extension keys share one
/// JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextMetadata {
    pub session_id: String,
    pub role: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// Canonical UTC timestamp (`YYYY-MM-DDTHH:MM:SS.ffffffZ`).
    pub timestamp: String,
    /// Length of the original content in characters.
    pub content_length: usize,
    /// Caller-supplied keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContextMetadata {
    /// Build metadata, dropping any reserved keys from `extra`.
    pub fn new(
        session_id: impl Into<String>,
        role: impl Into<String>,
        message_type: MessageType,
        timestamp: impl Into<String>,
        content_length: usize,
        extra: Map<String, Value>,
    ) -> Self {
        let extra = extra
            .into_iter()
            .filter(|(key, _)| {
                let reserved = RESERVED_METADATA_KEYS.contains(&key.as_str());
                if reserved {
                    tracing::debug!("Dropping reserved metadata key '{}'", key);
                }
                !reserved
            })
            .collect();

        Self {
            session_id: session_id.into(),
            role: role.into(),
            message_type,
            timestamp: timestamp.into(),
            content_length,
            extra,
        }
    }

    /// Flat JSON object view, as filters see it.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = self.extra.clone();
        map.insert("session_id".into(), Value::from(self.session_id.clone()));
        map.insert("role".into(), Value::from(self.role.clone()));
        map.insert("type".into(), Value::from(self.message_type.as_str()));
        map.insert("timestamp".into(), Value::from(self.timestamp.clone()));
        map.insert("content_length".into(), Value::from(self.content_length));
        map
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entries
// ─────────────────────────────────────────────────────────────────────────────

/// A fully prepared entry, ready for insertion into an index.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextEntry {
    pub id: String,
    /// The original, uncompressed text.
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: ContextMetadata,
}

impl ContextEntry {
    /// The session this entry belongs to.
    pub fn session_id(&self) -> &str {
        &self.metadata.session_id
    }
}

/// A conversation turn submitted by a caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl NewMessage {
    /// Create a message with the given role and content.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            timestamp: None,
            metadata: None,
        }
    }

    /// Set an explicit timestamp.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Attach one extension metadata key.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }
}

/// An entry as read back from an index (no vector).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredContext {
    pub id: String,
    pub content: String,
    pub metadata: ContextMetadata,
}

impl From<&ContextEntry> for StoredContext {
    fn from(entry: &ContextEntry) -> Self {
        Self {
            id: entry.id.clone(),
            content: entry.content.clone(),
            metadata: entry.metadata.clone(),
        }
    }
}

/// A nearest-neighbor hit.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredContext {
    pub context: StoredContext,
    /// L2 distance from the query vector (lower = more similar).
    pub distance: f32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Service Results
// ─────────────────────────────────────────────────────────────────────────────

/// A semantic search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    pub content: String,
    pub metadata: ContextMetadata,
    pub distance: f32,
}

impl From<ScoredContext> for QueryMatch {
    fn from(scored: ScoredContext) -> Self {
        Self {
            id: scored.context.id,
            content: scored.context.content,
            metadata: scored.context.metadata,
            distance: scored.distance,
        }
    }
}

/// One page of the recency view.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentPage {
    /// Newest first.
    pub messages: Vec<StoredContext>,
    /// Session size before pagination.
    pub total_count: usize,
}

/// Aggregate statistics for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,
    pub total_messages: usize,
    pub by_type: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oldest_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newest_message: Option<String>,
}

impl SessionStats {
    /// Stats for a session with no entries.
    pub fn empty(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            total_messages: 0,
            by_type: BTreeMap::new(),
            oldest_message: None,
            newest_message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_type_round_trip_names() {
        for t in MessageType::all() {
            assert_eq!(t.as_str().parse::<MessageType>().unwrap(), t);
            assert_eq!(serde_json::to_value(t).unwrap(), json!(t.as_str()));
        }
        assert!(matches!(
            "memo".parse::<MessageType>(),
            Err(ValidationError::UnknownMessageType(_))
        ));
    }

    #[test]
    fn test_metadata_serializes_flat() {
        let mut extra = Map::new();
        extra.insert("tool".into(), json!("grep"));
        let meta = ContextMetadata::new(
            "s1",
            "assistant",
            MessageType::ToolCall,
            "2024-01-01T00:00:00.000000Z",
            12,
            extra,
        );

        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(
            value,
            json!({
                "session_id": "s1",
                "role": "assistant",
                "type": "tool_call",
                "timestamp": "2024-01-01T00:00:00.000000Z",
                "content_length": 12,
                "tool": "grep"
            })
        );

        let back: ContextMetadata = serde_json::from_value(value).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn test_reserved_keys_dropped() {
        let mut extra = Map::new();
        extra.insert("session_id".into(), json!("evil"));
        extra.insert("type".into(), json!("chat"));
        extra.insert("content_length".into(), json!(0));
        extra.insert("source".into(), json!("cli"));

        let meta = ContextMetadata::new(
            "s1",
            "user",
            MessageType::UserQuery,
            "2024-01-01T00:00:00.000000Z",
            5,
            extra,
        );

        assert_eq!(meta.session_id, "s1");
        assert_eq!(meta.content_length, 5);
        assert_eq!(meta.extra.len(), 1);
        assert_eq!(meta.extra["source"], json!("cli"));
        assert_eq!(meta.to_map()["type"], json!("user_query"));
    }

    #[test]
    fn test_empty_stats_omits_timestamps() {
        let value = serde_json::to_value(SessionStats::empty("s1")).unwrap();
        assert_eq!(
            value,
            json!({"session_id": "s1", "total_messages": 0, "by_type": {}})
        );
    }
}
