//! Session-scoped context operations.
//!
//! [`ContextService`] turns conversation turns into indexed entries and
//! answers semantic and chronological queries over them. It owns no
//! storage itself: the vector index and the embedder are injected.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use contextd_embed::SharedEmbedder;
use tracing::{debug, info};

use crate::classify::classify;
use crate::compress::{DEFAULT_COMPRESSION_THRESHOLD, compress_for_embedding};
use crate::error::{ContextError, ContextResult, StoreError};
use crate::filter::MetadataFilter;
use crate::id::{IdStrategy, context_id};
use crate::index::VectorIndex;
use crate::timestamp::{canonical_timestamp, parse_timestamp};
use crate::types::{
    ContextEntry, ContextMetadata, MessageType, NewMessage, QueryMatch, RecentPage,
    SessionStats, StoredContext,
};
use crate::validation::{validate_embedding, validate_role, validate_session_id};

/// Hard cap on neighbors returned by a single query.
pub const DEFAULT_MAX_QUERY_RESULTS: usize = 20;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Tunables for [`ContextService`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Content longer than this many characters is compressed before embedding.
    pub compression_threshold: usize,
    /// Upper bound on `top_k`.
    pub max_query_results: usize,
    /// Limit on a single embedding call.
    pub embed_timeout: Duration,
    /// Limit on a single index call.
    pub store_timeout: Duration,
    /// How entry ids are derived.
    pub id_strategy: IdStrategy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
            max_query_results: DEFAULT_MAX_QUERY_RESULTS,
            embed_timeout: Duration::from_secs(30),
            store_timeout: Duration::from_secs(10),
            id_strategy: IdStrategy::Deterministic,
        }
    }
}

impl ServiceConfig {
    /// Set the compression threshold.
    pub fn with_compression_threshold(mut self, threshold: usize) -> Self {
        self.compression_threshold = threshold;
        self
    }

    /// Set the query result cap. Values above [`DEFAULT_MAX_QUERY_RESULTS`]
    /// are clamped.
    pub fn with_max_query_results(mut self, max: usize) -> Self {
        self.max_query_results = max.min(DEFAULT_MAX_QUERY_RESULTS);
        self
    }

    /// Set the embedding timeout.
    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    /// Set the index timeout.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Set the id strategy.
    pub fn with_id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.id_strategy = strategy;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Context Service
// ─────────────────────────────────────────────────────────────────────────────

/// The context store's operations.
pub struct ContextService {
    index: Arc<dyn VectorIndex>,
    embedder: SharedEmbedder,
    config: ServiceConfig,
}

impl std::fmt::Debug for ContextService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextService")
            .field("index", &self.index.name())
            .field("embedder", &self.embedder.name())
            .field("config", &self.config)
            .finish()
    }
}

impl ContextService {
    /// Create a service over an index and an embedder.
    pub fn new(index: Arc<dyn VectorIndex>, embedder: SharedEmbedder, config: ServiceConfig) -> Self {
        info!(
            "Context service using index '{}' and embedder '{}' ({} dims)",
            index.name(),
            embedder.name(),
            embedder.dimensions()
        );
        Self {
            index,
            embedder,
            config,
        }
    }

    /// Service configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Name of the embedding provider.
    pub fn embedder_name(&self) -> &str {
        self.embedder.name()
    }

    /// Name of the index backend.
    pub fn index_name(&self) -> &str {
        self.index.name()
    }

    /// Store a conversation turn and return its id.
    ///
    /// Adding the same `(session_id, content, timestamp)` twice under the
    /// deterministic strategy overwrites the first entry.
    pub async fn add(&self, session_id: &str, message: NewMessage) -> ContextResult<String> {
        validate_session_id(session_id)?;
        validate_role(&message.role)?;

        let timestamp = canonical_timestamp(message.timestamp.as_deref())?;
        let id = context_id(session_id, &message.content, &timestamp, self.config.id_strategy);
        let message_type = classify(&message.role, &message.content);

        let metadata = ContextMetadata::new(
            session_id,
            message.role,
            message_type,
            timestamp,
            message.content.chars().count(),
            message.metadata.unwrap_or_default(),
        );

        let embedding_input =
            compress_for_embedding(&message.content, self.config.compression_threshold);
        let embedding = self.embed(&embedding_input).await?;

        let entry = ContextEntry {
            id: id.clone(),
            content: message.content,
            embedding,
            metadata,
        };

        self.run_index("insert", move |index| index.insert(&entry))
            .await?;

        debug!("Added {} context {} to session {}", message_type, id, session_id);
        Ok(id)
    }

    /// Entries of a session most similar to `query`, nearest first.
    ///
    /// At most `min(top_k, max_query_results)` results are returned.
    pub async fn query(
        &self,
        session_id: &str,
        query: &str,
        top_k: usize,
        filter_by_type: Option<MessageType>,
    ) -> ContextResult<Vec<QueryMatch>> {
        validate_session_id(session_id)?;

        let k = top_k.min(self.config.max_query_results);
        if k == 0 {
            return Ok(Vec::new());
        }

        let vector = self.embed(query).await?;

        let mut filter = MetadataFilter::session(session_id);
        if let Some(message_type) = filter_by_type {
            filter = filter.with_type(message_type);
        }

        let hits = self
            .run_index("nearest_neighbors", move |index| {
                index.nearest_neighbors(&vector, &filter, k)
            })
            .await?;

        debug!("Query in session {} matched {} contexts", session_id, hits.len());
        Ok(hits.into_iter().map(QueryMatch::from).collect())
    }

    /// A page of the session's entries, newest first.
    pub async fn recent(
        &self,
        session_id: &str,
        limit: usize,
        offset: usize,
    ) -> ContextResult<RecentPage> {
        validate_session_id(session_id)?;

        let filter = MetadataFilter::session(session_id);
        let mut entries = self
            .run_index("get", move |index| index.get(&filter, None))
            .await?;

        let total_count = entries.len();
        sort_newest_first(&mut entries);

        let messages = entries.into_iter().skip(offset).take(limit).collect();
        Ok(RecentPage {
            messages,
            total_count,
        })
    }

    /// Delete every entry of a session. Returns how many were removed.
    pub async fn clear(&self, session_id: &str) -> ContextResult<usize> {
        validate_session_id(session_id)?;

        let filter = MetadataFilter::session(session_id);
        let deleted = self
            .run_index("delete", move |index| index.delete(&filter))
            .await?;

        info!("Cleared {} contexts from session {}", deleted, session_id);
        Ok(deleted)
    }

    /// Per-type counts and the timestamp range of a session.
    pub async fn stats(&self, session_id: &str) -> ContextResult<SessionStats> {
        validate_session_id(session_id)?;

        let filter = MetadataFilter::session(session_id);
        let entries = self
            .run_index("get", move |index| index.get(&filter, None))
            .await?;

        let mut stats = SessionStats::empty(session_id);
        if entries.is_empty() {
            return Ok(stats);
        }

        stats.total_messages = entries.len();
        for entry in &entries {
            *stats
                .by_type
                .entry(entry.metadata.message_type.as_str().to_string())
                .or_insert(0) += 1;
        }

        let mut timed: Vec<_> = entries
            .iter()
            .map(|e| (parsed_time(e), &e.metadata.timestamp))
            .collect();
        timed.sort();
        stats.oldest_message = timed.first().map(|(_, ts)| (*ts).clone());
        stats.newest_message = timed.last().map(|(_, ts)| (*ts).clone());

        Ok(stats)
    }

    /// Destroy every entry in every session.
    pub async fn purge_all(&self) -> ContextResult<()> {
        self.run_index("drop_all", |index| index.drop_all()).await?;
        info!("Purged all contexts");
        Ok(())
    }

    /// Number of entries across all sessions.
    pub async fn total_count(&self) -> ContextResult<usize> {
        self.run_index("count", |index| index.count()).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    async fn embed(&self, text: &str) -> ContextResult<Vec<f32>> {
        let embedding = tokio::time::timeout(self.config.embed_timeout, self.embedder.embed(text))
            .await
            .map_err(|_| {
                ContextError::Provider(format!(
                    "embedding timed out after {:?}",
                    self.config.embed_timeout
                ))
            })??;

        validate_embedding(&embedding, self.embedder.dimensions()).map_err(|err| {
            ContextError::Provider(format!(
                "{} returned an unusable embedding: {}",
                self.embedder.name(),
                err
            ))
        })?;
        Ok(embedding)
    }

    /// Run a blocking index call on the blocking pool, bounded by the store timeout.
    async fn run_index<T, F>(&self, operation: &'static str, f: F) -> ContextResult<T>
    where
        F: FnOnce(&dyn VectorIndex) -> crate::error::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let index = Arc::clone(&self.index);
        let task = tokio::task::spawn_blocking(move || f(index.as_ref()));

        match tokio::time::timeout(self.config.store_timeout, task).await {
            Err(_) => Err(StoreError::Timeout {
                operation,
                timeout: self.config.store_timeout,
            }
            .into()),
            Ok(Err(join_err)) => Err(StoreError::Unavailable(format!(
                "{} task failed: {}",
                operation, join_err
            ))
            .into()),
            Ok(Ok(result)) => result.map_err(ContextError::from),
        }
    }
}

fn parsed_time(entry: &StoredContext) -> DateTime<Utc> {
    parse_timestamp(&entry.metadata.timestamp).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Newest first; equal timestamps ordered by id.
fn sort_newest_first(entries: &mut [StoredContext]) {
    entries.sort_by(|a, b| match parsed_time(b).cmp(&parsed_time(a)) {
        Ordering::Equal => a.id.cmp(&b.id),
        other => other,
    });
}
