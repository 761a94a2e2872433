//! The vector index contract.
//!
//! A [`VectorIndex`] stores entries together with their embeddings and
//! serves exact-match filtering and filtered nearest-neighbor search. The
//! service layer only ever talks to this trait, so the SQLite backend and
//! the in-memory backend are interchangeable.
//!
//! ```ignore
//! use contextd_store::{InMemoryVectorIndex, MetadataFilter, VectorIndex};
//!
//! let index = InMemoryVectorIndex::new(384);
//! let hits = index.nearest_neighbors(&query, &MetadataFilter::session("s1"), 5)?;
//! ```

use crate::error::Result;
use crate::filter::MetadataFilter;
use crate::types::{ContextEntry, ScoredContext, StoredContext};

/// Trait for vector index backends.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`; the service shares one index
/// across concurrent requests and calls it from the blocking thread pool.
pub trait VectorIndex: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Dimensionality of stored vectors.
    fn dimensions(&self) -> usize;

    /// Store an entry. An existing entry with the same id is replaced.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the embedding has the wrong length.
    fn insert(&self, entry: &ContextEntry) -> Result<()>;

    /// Entries matching `filter`, in no particular order.
    fn get(&self, filter: &MetadataFilter, limit: Option<usize>) -> Result<Vec<StoredContext>>;

    /// Up to `k` entries matching `filter`, nearest first.
    ///
    /// Distance is Euclidean; equal distances are ordered by id.
    fn nearest_neighbors(
        &self,
        query: &[f32],
        filter: &MetadataFilter,
        k: usize,
    ) -> Result<Vec<ScoredContext>>;

    /// Delete entries matching `filter`, returning how many were removed.
    fn delete(&self, filter: &MetadataFilter) -> Result<usize>;

    /// Number of entries across all sessions.
    fn count(&self) -> Result<usize>;

    /// Destroy and recreate the collection.
    fn drop_all(&self) -> Result<()>;
}
