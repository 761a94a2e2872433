//! In-process vector index with brute-force search.
//!
//! Used as the test double for the service and server, and for
//! `--ephemeral` serving where nothing should touch disk.

use std::collections::HashMap;

use contextd_embed::euclidean_distance;
use parking_lot::RwLock;

use crate::error::{Result, StoreError};
use crate::filter::MetadataFilter;
use crate::index::VectorIndex;
use crate::types::{ContextEntry, ScoredContext, StoredContext};

/// Vector index held entirely in memory.
#[derive(Debug)]
pub struct InMemoryVectorIndex {
    dims: usize,
    entries: RwLock<HashMap<String, ContextEntry>>,
}

impl InMemoryVectorIndex {
    /// Create an empty index for `dims`-dimensional vectors.
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn check_dims(&self, actual: usize) -> Result<()> {
        if actual != self.dims {
            return Err(StoreError::DimensionMismatch {
                expected: self.dims,
                actual,
            });
        }
        Ok(())
    }
}

impl VectorIndex for InMemoryVectorIndex {
    fn name(&self) -> &str {
        "memory"
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn insert(&self, entry: &ContextEntry) -> Result<()> {
        self.check_dims(entry.embedding.len())?;
        self.entries.write().insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    fn get(&self, filter: &MetadataFilter, limit: Option<usize>) -> Result<Vec<StoredContext>> {
        filter.validate()?;
        let entries = self.entries.read();
        Ok(entries
            .values()
            .filter(|e| filter.matches(&e.metadata.to_map()))
            .take(limit.unwrap_or(usize::MAX))
            .map(StoredContext::from)
            .collect())
    }

    fn nearest_neighbors(
        &self,
        query: &[f32],
        filter: &MetadataFilter,
        k: usize,
    ) -> Result<Vec<ScoredContext>> {
        self.check_dims(query.len())?;
        filter.validate()?;

        let entries = self.entries.read();
        let mut scored: Vec<ScoredContext> = entries
            .values()
            .filter(|e| filter.matches(&e.metadata.to_map()))
            .map(|e| ScoredContext {
                context: StoredContext::from(e),
                distance: euclidean_distance(query, &e.embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.context.id.cmp(&b.context.id))
        });
        scored.truncate(k);
        Ok(scored)
    }

    fn delete(&self, filter: &MetadataFilter) -> Result<usize> {
        filter.validate()?;
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| !filter.matches(&e.metadata.to_map()));
        Ok(before - entries.len())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }

    fn drop_all(&self) -> Result<()> {
        self.entries.write().clear();
        Ok(())
    }
}
