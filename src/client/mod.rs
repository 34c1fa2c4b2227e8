//! Backend access layer.
//!
//! # Organization
//!
//! - [`backend`]: The [`ResourceClient`] trait
//! - [`query`]: Select description and PostgREST encoding
//! - [`rest`]: HTTP implementation
//! - [`memory`]: In-process implementation for tests and fixtures
//!
//! One client is built at startup and shared as `Arc<dyn ResourceClient>`; no
//! other component constructs its own.

pub mod backend;
pub mod memory;
pub mod query;
pub mod rest;

use std::path::Path;
use std::sync::Arc;

pub use backend::{id_filter, ResourceClient};
pub use memory::{Call, MemoryBackend, Operation};
pub use query::{Filter, Order, SelectQuery};
pub use rest::RestBackend;

use crate::domain::Result;
use crate::Config;

/// Builds the process-wide client.
///
/// With a fixture path the in-memory backend is seeded from that file;
/// otherwise the REST backend is configured from `config`.
///
/// # Errors
///
/// Returns an error if the fixture cannot be loaded or the remote
/// configuration is incomplete.
pub fn connect(config: &Config, fixture: Option<&Path>) -> Result<Arc<dyn ResourceClient>> {
    if let Some(path) = fixture {
        tracing::info!(path = ?path, "using fixture backend");
        return Ok(Arc::new(MemoryBackend::from_json_file(path)?));
    }

    let backend = RestBackend::from_config(config)?;
    tracing::info!(url = %backend.base_url(), "using remote backend");
    Ok(Arc::new(backend))
}
