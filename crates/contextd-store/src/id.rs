//! Context identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// How entry ids are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    /// Hash of `(session_id, content, timestamp)`; identical adds upsert.
    #[default]
    Deterministic,
    /// Hash plus a random nonce; every add creates a new entry.
    Unique,
}

impl fmt::Display for IdStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deterministic => f.write_str("deterministic"),
            Self::Unique => f.write_str("unique"),
        }
    }
}

impl FromStr for IdStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deterministic" => Ok(Self::Deterministic),
            "unique" => Ok(Self::Unique),
            other => Err(format!(
                "unknown id strategy '{}': expected deterministic or unique",
                other
            )),
        }
    }
}

/// Derive the id for an entry as lowercase SHA-256 hex.
///
/// Each field is prefixed with its byte length so that no two distinct
/// tuples share a hash input.
pub fn context_id(session_id: &str, content: &str, timestamp: &str, strategy: IdStrategy) -> String {
    let mut hasher = Sha256::new();
    for field in [session_id, content, timestamp] {
        update_field(&mut hasher, field.as_bytes());
    }
    if strategy == IdStrategy::Unique {
        update_field(&mut hasher, uuid::Uuid::new_v4().as_bytes());
    }
    hex::encode(hasher.finalize())
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}
