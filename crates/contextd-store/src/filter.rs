//! Exact-match metadata filters.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{Result, StoreError};
use crate::types::MessageType;
use crate::validation::validate_filter_key;

/// Conjunction of `key == value` conditions over entry metadata.
///
/// Values must be scalars (string, number, boolean, or null). An empty
/// filter matches every entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    conditions: BTreeMap<String, Value>,
}

impl MetadataFilter {
    /// A filter with no conditions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter to a single session.
    pub fn session(session_id: impl Into<String>) -> Self {
        Self::new().with("session_id", session_id.into())
    }

    /// Add a `type` condition.
    pub fn with_type(self, message_type: MessageType) -> Self {
        self.with("type", message_type.as_str())
    }

    /// Add an arbitrary condition. A later condition on the same key replaces
    /// the earlier one.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.insert(key.into(), value.into());
        self
    }

    /// Iterate conditions in key order.
    pub fn conditions(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.conditions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns true if there are no conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Check keys and reject nested values.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in &self.conditions {
            validate_filter_key(key)?;
            if value.is_array() || value.is_object() {
                return Err(StoreError::Query(format!(
                    "filter value for '{}' must be a scalar",
                    key
                )));
            }
        }
        Ok(())
    }

    /// Evaluate against a flat metadata object.
    ///
    /// Numbers compare by value, so `1` matches `1.0`. A `null` condition
    /// matches a missing key.
    pub fn matches(&self, metadata: &Map<String, Value>) -> bool {
        self.conditions.iter().all(|(key, expected)| {
            match (metadata.get(key), expected) {
                (None, Value::Null) => true,
                (None, _) => false,
                (Some(actual), expected) => scalar_eq(actual, expected),
            }
        })
    }
}

fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}
