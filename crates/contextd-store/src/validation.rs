//! Input validation for context writes and reads.

use crate::error::StoreError;

// ─────────────────────────────────────────────────────────────────────────────
// Validation Error
// ─────────────────────────────────────────────────────────────────────────────

/// Specific validation failures for caller-supplied data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Session ID is empty.
    #[error("session_id must not be empty")]
    EmptySessionId,

    /// Role is empty.
    #[error("message role must not be empty")]
    EmptyRole,

    /// Timestamp could not be parsed.
    #[error("invalid timestamp '{0}': expected ISO-8601 / RFC 3339")]
    InvalidTimestamp(String),

    /// `filter_by_type` names no known message type.
    #[error("unknown message type '{0}': expected one of user_query, tool_call, agent_response, chat")]
    UnknownMessageType(String),
}

/// A provider returned a vector that cannot be indexed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidEmbedding {
    /// Embedding dimension mismatch.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Embedding contains invalid values (NaN or Inf).
    #[error("embedding contains {count} invalid values (NaN or Inf)")]
    NonFiniteValues {
        /// Number of invalid values found.
        count: usize,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Validators
// ─────────────────────────────────────────────────────────────────────────────

/// Reject empty or whitespace-only session IDs.
pub fn validate_session_id(session_id: &str) -> Result<(), ValidationError> {
    if session_id.trim().is_empty() {
        return Err(ValidationError::EmptySessionId);
    }
    Ok(())
}

/// Reject empty or whitespace-only roles.
pub fn validate_role(role: &str) -> Result<(), ValidationError> {
    if role.trim().is_empty() {
        return Err(ValidationError::EmptyRole);
    }
    Ok(())
}

/// Check an embedding's length and that every component is finite.
pub fn validate_embedding(embedding: &[f32], expected: usize) -> Result<(), InvalidEmbedding> {
    if embedding.len() != expected {
        return Err(InvalidEmbedding::DimensionMismatch {
            expected,
            actual: embedding.len(),
        });
    }

    let count = embedding.iter().filter(|v| !v.is_finite()).count();
    if count > 0 {
        return Err(InvalidEmbedding::NonFiniteValues { count });
    }

    Ok(())
}

/// Metadata keys usable in a filter: `[A-Za-z0-9_]+`.
pub fn validate_filter_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(StoreError::Query(format!(
            "invalid metadata key '{}': only [A-Za-z0-9_] allowed",
            key
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id() {
        assert!(validate_session_id("s1").is_ok());
        assert_eq!(validate_session_id(""), Err(ValidationError::EmptySessionId));
        assert_eq!(validate_session_id("   "), Err(ValidationError::EmptySessionId));
    }

    #[test]
    fn test_role() {
        assert!(validate_role("user").is_ok());
        assert_eq!(validate_role(""), Err(ValidationError::EmptyRole));
    }

    #[test]
    fn test_embedding() {
        assert!(validate_embedding(&[0.1, 0.2], 2).is_ok());
        assert_eq!(
            validate_embedding(&[0.1], 2),
            Err(InvalidEmbedding::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            validate_embedding(&[f32::NAN, f32::INFINITY], 2),
            Err(InvalidEmbedding::NonFiniteValues { count: 2 })
        );
    }

    #[test]
    fn test_filter_key() {
        assert!(validate_filter_key("session_id").is_ok());
        assert!(validate_filter_key("Key9").is_ok());
        assert!(validate_filter_key("").is_err());
        assert!(validate_filter_key("a.b").is_err());
        assert!(validate_filter_key("x') OR 1=1 --").is_err());
    }
}
