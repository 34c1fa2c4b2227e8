//! Resource client abstraction.
//!
//! This module defines the [`ResourceClient`] trait: one method per backend
//! request kind, each translating a logical read or write into exactly one
//! request. The trait is deliberately thin. Pagination, search and fan-out live
//! in [`crate::listing`]; caching lives in [`crate::cache`].

use crate::client::query::{Filter, SelectQuery};
use crate::domain::error::{AdminError, Result};
use crate::domain::{Fields, QueryResult, Record, Resource};

/// Request/response access to the remote store.
///
/// Implementations are shared process-wide behind an `Arc` and called from the
/// query worker thread, hence `Send + Sync`.
///
/// # Implementations
///
/// - [`RestBackend`](crate::client::RestBackend): PostgREST over HTTP (default)
/// - [`MemoryBackend`](crate::client::MemoryBackend): in-process store for tests
///   and fixture-driven runs
///
/// None of the methods retry. A failure is reported once as
/// [`AdminError::Remote`] and the caller decides what to show.
pub trait ResourceClient: Send + Sync {
    /// Runs one `SELECT`.
    ///
    /// `count` in the result is only populated when the query asked for an
    /// exact count.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Remote`] on transport or backend failure.
    fn select(&self, query: &SelectQuery) -> Result<QueryResult>;

    /// Inserts one row. The store assigns `id` and `created_at` when omitted.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Remote`] when the backend rejects the row.
    fn insert(&self, resource: Resource, fields: &Fields) -> Result<()>;

    /// Partially updates the row with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Remote`] when the backend rejects the update.
    fn update(&self, resource: Resource, id: &str, fields: &Fields) -> Result<()>;

    /// Deletes one or more rows by id.
    ///
    /// A batch either succeeds entirely or is rejected entirely by the backend.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Remote`] when any id violates a backend constraint.
    fn delete(&self, resource: Resource, ids: &[String]) -> Result<()>;

    /// Exact row count of a collection.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Remote`] on transport or backend failure.
    fn count(&self, resource: Resource) -> Result<Option<u64>> {
        let query = SelectQuery::new(resource).columns("id,created_at").limit(0).count_exact();
        Ok(self.select(&query)?.count)
    }

    /// Fetches exactly one record.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::NotFound`] when zero rows match, and
    /// [`AdminError::Remote`] on transport or backend failure.
    fn get(&self, resource: Resource, id: &str) -> Result<Record> {
        let query = SelectQuery::new(resource).filter(Filter::eq("id", id)).limit(1);
        self.select(&query)?
            .data
            .into_iter()
            .next()
            .ok_or_else(|| AdminError::not_found(resource.table(), id))
    }
}

/// Id filter for a delete: `eq` for one id, `in` for a batch.
#[must_use]
pub fn id_filter(ids: &[String]) -> Filter {
    match ids {
        [single] => Filter::eq("id", single.clone()),
        _ => Filter::is_in("id", ids.to_vec()),
    }
}
