//! Session-scoped semantic context storage.
//!
//! Persists conversation turns with embeddings and serves two retrieval
//! modes over them: nearest-neighbor search and chronological recency,
//! both scoped to a session.
//!
//! # Architecture
//!
//! - [`ContextService`]: validation, classification, compression, ids, and
//!   the async operations the HTTP layer calls
//! - [`VectorIndex`]: the storage contract
//! - [`SqliteVectorIndex`]: durable backend (SQLite + sqlite-vec)
//! - [`InMemoryVectorIndex`]: in-process backend for tests and ephemeral use
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use contextd_embed::MockEmbedder;
//! use contextd_store::{ContextService, NewMessage, ServiceConfig, SqliteVectorIndex};
//!
//! let index = Arc::new(SqliteVectorIndex::open("contexts.db", "mock", 384)?);
//! let service = ContextService::new(index, Arc::new(MockEmbedder::default()), ServiceConfig::default());
//!
//! let id = service.add("session-1", NewMessage::new("user", "hello")).await?;
//! let hits = service.query("session-1", "greeting", 5, None).await?;
//! ```

pub mod classify;
pub mod compress;
pub mod error;
pub mod filter;
pub mod id;
pub mod index;
pub mod memory;
pub mod service;
pub mod sqlite;
pub mod timestamp;
pub mod types;
pub mod validation;
pub mod vector;

pub use classify::classify;
pub use compress::{DEFAULT_COMPRESSION_THRESHOLD, TRUNCATION_MARKER, compress_for_embedding};
pub use error::{ContextError, ContextResult, Result, StoreError};
pub use filter::MetadataFilter;
pub use id::{IdStrategy, context_id};
pub use index::VectorIndex;
pub use memory::InMemoryVectorIndex;
pub use service::{ContextService, DEFAULT_MAX_QUERY_RESULTS, ServiceConfig};
pub use sqlite::SqliteVectorIndex;
pub use timestamp::{canonical_timestamp, format_timestamp, parse_timestamp};
pub use types::{
    ContextEntry, ContextMetadata, MessageType, NewMessage, QueryMatch, RecentPage,
    RESERVED_METADATA_KEYS, ScoredContext, SessionStats, StoredContext,
};
pub use validation::{InvalidEmbedding, ValidationError};
