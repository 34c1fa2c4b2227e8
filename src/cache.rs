//! List result cache with per-resource invalidation.
//!
//! Entries are keyed by `(resource, search, pagination)` plus the resource's
//! current generation. [`QueryCache::invalidate`] bumps the generation, so
//! every entry of that resource's family stops matching at once and ages out
//! through moka's TinyLFU eviction. Results are stored and returned whole;
//! nothing patches a cached page in place.

use moka::sync::Cache;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::{PaginationRange, QueryResult, Resource};

/// Cache key for one list fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub resource: Resource,
    pub search: Option<String>,
    pub pagination: Option<PaginationRange>,
    pub generation: u64,
}

/// In-memory list cache shared by the query worker.
pub struct QueryCache {
    inner: Cache<CacheKey, QueryResult>,
    generations: Mutex<HashMap<Resource, u64>>,
}

impl QueryCache {
    /// Create a cache holding at most `capacity` list results.
    #[must_use]
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: Cache::new(capacity),
            generations: Mutex::new(HashMap::new()),
        }
    }

    /// Current generation of a resource family.
    #[must_use]
    pub fn generation(&self, resource: Resource) -> u64 {
        self.generations
            .lock()
            .map(|g| g.get(&resource).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    fn key(&self, resource: Resource, search: Option<&str>, pagination: Option<PaginationRange>) -> CacheKey {
        CacheKey {
            resource,
            search: search.map(str::to_string),
            pagination,
            generation: self.generation(resource),
        }
    }

    /// Fresh cached result for the fetch, if any.
    #[must_use]
    pub fn get(
        &self,
        resource: Resource,
        search: Option<&str>,
        pagination: Option<PaginationRange>,
    ) -> Option<QueryResult> {
        let hit = self.inner.get(&self.key(resource, search, pagination));
        tracing::debug!(%resource, hit = hit.is_some(), "cache lookup");
        hit
    }

    pub fn insert(
        &self,
        resource: Resource,
        search: Option<&str>,
        pagination: Option<PaginationRange>,
        result: QueryResult,
    ) {
        self.inner.insert(self.key(resource, search, pagination), result);
    }

    /// Marks every cached result of `resource` stale.
    pub fn invalidate(&self, resource: Resource) {
        if let Ok(mut generations) = self.generations.lock() {
            let generation = generations.entry(resource).or_insert(0);
            *generation += 1;
            tracing::debug!(%resource, generation = *generation, "cache family invalidated");
        }
    }

    /// Number of entries currently held, stale ones included until evicted.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(256)
    }
}
