//! Writes.
//!
//! Every mutation is a single client call returning `()`; callers re-fetch
//! instead of receiving the written row. The query worker invalidates the cache
//! family returned by [`invalidation_family`] after a successful write.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::client::ResourceClient;
use crate::domain::{Fields, Resource, Result};

/// A write intent, carried to the query worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Mutation {
    Insert { fields: Fields },
    Update { id: String, fields: Fields },
    Delete { ids: Vec<String> },
}

impl Mutation {
    /// Executes the mutation against `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Remote`](crate::AdminError::Remote) when the backend rejects it.
    pub fn apply(&self, client: &dyn ResourceClient, resource: Resource) -> Result<()> {
        match self {
            Self::Insert { fields } => add(client, resource, fields),
            Self::Update { id, fields } => update(client, resource, id, fields),
            Self::Delete { ids } => delete(client, resource, ids),
        }
    }

    /// Ids the mutation targets; empty for inserts.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        match self {
            Self::Insert { .. } => Vec::new(),
            Self::Update { id, .. } => vec![id.clone()],
            Self::Delete { ids } => ids.clone(),
        }
    }

    #[must_use]
    pub const fn is_delete(&self) -> bool {
        matches!(self, Self::Delete { .. })
    }
}

/// Cache families a successful write to `resource` makes stale.
///
/// Subcategories are displayed inside category listings, so their writes
/// also invalidate the parent family.
#[must_use]
pub fn invalidation_family(resource: Resource) -> Vec<Resource> {
    std::iter::once(resource).chain(resource.parent()).collect()
}

/// Inserts one row.
///
/// # Errors
///
/// Returns [`AdminError::Remote`](crate::AdminError::Remote) when the backend rejects the row.
pub fn add(client: &dyn ResourceClient, resource: Resource, fields: &Fields) -> Result<()> {
    let _span = tracing::debug_span!("mutation_add", resource = %resource).entered();
    client.insert(resource, fields)
}

/// Partially updates one row. Re-applying the same fields is a no-op.
///
/// # Errors
///
/// Returns [`AdminError::Remote`](crate::AdminError::Remote) when the backend rejects the update.
pub fn update(client: &dyn ResourceClient, resource: Resource, id: &str, fields: &Fields) -> Result<()> {
    let _span = tracing::debug_span!("mutation_update", resource = %resource, id = %id).entered();
    client.update(resource, id, fields)
}

/// Deletes rows by id. Nothing cascades here; referential rules are the backend's.
///
/// # Errors
///
/// Returns [`AdminError::Remote`](crate::AdminError::Remote) when the backend rejects the batch.
pub fn delete(client: &dyn ResourceClient, resource: Resource, ids: &[String]) -> Result<()> {
    let _span = tracing::debug_span!("mutation_delete", resource = %resource, count = ids.len()).entered();
    if ids.is_empty() {
        return Ok(());
    }
    client.delete(resource, ids)
}

fn object(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

#[must_use]
pub fn business_category_fields(name: &str, is_featured: bool) -> Fields {
    object(json!({ "name": name, "is_featured": is_featured }))
}

#[must_use]
pub fn business_sub_category_fields(name: &str, category_id: &str) -> Fields {
    object(json!({ "name": name, "category_id": category_id }))
}

#[must_use]
pub fn post_category_fields(name: &str) -> Fields {
    object(json!({ "name": name }))
}

/// # Errors
///
/// Returns [`AdminError::Remote`](crate::AdminError::Remote) on backend rejection.
pub fn add_business_category(client: &dyn ResourceClient, name: &str, is_featured: bool) -> Result<()> {
    add(client, Resource::BusinessCategories, &business_category_fields(name, is_featured))
}

/// # Errors
///
/// Returns [`AdminError::Remote`](crate::AdminError::Remote) on backend rejection.
pub fn update_business_category(
    client: &dyn ResourceClient,
    id: &str,
    name: &str,
    is_featured: bool,
) -> Result<()> {
    update(client, Resource::BusinessCategories, id, &business_category_fields(name, is_featured))
}

/// # Errors
///
/// Returns [`AdminError::Remote`](crate::AdminError::Remote) on backend rejection.
pub fn add_business_sub_category(client: &dyn ResourceClient, name: &str, category_id: &str) -> Result<()> {
    add(
        client,
        Resource::BusinessSubCategories,
        &business_sub_category_fields(name, category_id),
    )
}

/// # Errors
///
/// Returns [`AdminError::Remote`](crate::AdminError::Remote) on backend rejection.
pub fn update_business_sub_category(
    client: &dyn ResourceClient,
    id: &str,
    name: &str,
    category_id: &str,
) -> Result<()> {
    update(
        client,
        Resource::BusinessSubCategories,
        id,
        &business_sub_category_fields(name, category_id),
    )
}

/// # Errors
///
/// Returns [`AdminError::Remote`](crate::AdminError::Remote) on backend rejection.
pub fn add_post_category(client: &dyn ResourceClient, name: &str) -> Result<()> {
    add(client, Resource::PostCategories, &post_category_fields(name))
}

/// # Errors
///
/// Returns [`AdminError::Remote`](crate::AdminError::Remote) on backend rejection.
pub fn update_post_category(client: &dyn ResourceClient, id: &str, name: &str) -> Result<()> {
    update(client, Resource::PostCategories, id, &post_category_fields(name))
}
