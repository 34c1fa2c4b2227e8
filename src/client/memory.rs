//! In-process resource backend.
//!
//! [`MemoryBackend`] implements the same request semantics as the PostgREST
//! backend (ordering, inclusive windows, exact counts, `eq`/`in`/`ilike`/text
//! filters, server-assigned `id` and `created_at`, atomic batch deletes) against
//! tables held in memory. It backs the integration tests and the CLI's
//! `--fixture` mode.
//!
//! Fixtures are JSON files with the layout below. Saving uses an atomic write
//! (write-to-temp + rename) so a crash never leaves a truncated fixture behind.
//!
//! ```json
//! {
//!   "version": 1,
//!   "tables": {
//!     "business_categories": [
//!       { "id": "c1", "created_at": "2024-05-01T10:00:00Z", "name": "Farriers", "is_featured": false }
//!     ]
//!   }
//! }
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::client::backend::ResourceClient;
use crate::client::query::{split_columns, Filter, SelectQuery};
use crate::domain::error::{AdminError, Result};
use crate::domain::{Fields, QueryResult, Record, Resource};

/// Fixture file container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    /// Fixture format version.
    #[serde(default = "default_version")]
    version: u32,

    /// Rows per table name, in insertion order.
    #[serde(default)]
    tables: BTreeMap<String, Vec<Record>>,
}

const fn default_version() -> u32 {
    1
}

/// Kind of request recorded in the call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
}

/// One request as seen by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub operation: Operation,
    pub resource: Resource,
    pub filters: Vec<Filter>,
}

/// Many-to-one embed: `from.column` references `target.id`, and a projection
/// may ask for it as `embed(cols)`.
#[derive(Debug, Clone)]
struct Relation {
    from: Resource,
    embed: &'static str,
    column: &'static str,
    target: Resource,
}

/// Restricting foreign key: parents referenced by a child row cannot be deleted.
#[derive(Debug, Clone)]
struct ForeignKey {
    child: Resource,
    column: String,
    parent: Resource,
}

/// Thread-safe in-memory store.
pub struct MemoryBackend {
    data: Mutex<StoreData>,
    relations: Vec<Relation>,
    foreign_keys: Vec<ForeignKey>,
    calls: Mutex<Vec<Call>>,
    fail_next: Mutex<Option<String>>,
    last_created_at: Mutex<DateTime<Utc>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Creates an empty store with the dashboard's embed relations registered.
    #[must_use]
    pub fn new() -> Self {
        Self::with_data(StoreData::default())
    }

    fn with_data(data: StoreData) -> Self {
        Self {
            data: Mutex::new(data),
            relations: vec![
                Relation {
                    from: Resource::Businesses,
                    embed: "business_categories",
                    column: "category_id",
                    target: Resource::BusinessCategories,
                },
                Relation {
                    from: Resource::Feedbacks,
                    embed: "profiles",
                    column: "profile_id",
                    target: Resource::Customers,
                },
            ],
            foreign_keys: Vec::new(),
            calls: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
            last_created_at: Mutex::new(DateTime::UNIX_EPOCH),
        }
    }

    /// Loads a store from a JSON fixture file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid fixture.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = ?path, "loading fixture");
        let contents = std::fs::read_to_string(path)?;
        let data: StoreData = serde_json::from_str(&contents)?;

        tracing::debug!(
            version = data.version,
            tables = data.tables.len(),
            "fixture loaded"
        );
        Ok(Self::with_data(data))
    }

    /// Writes the store to a JSON fixture file atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, the temporary write or the rename fails.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = {
            let data = self.lock_data()?;
            serde_json::to_string_pretty(&*data)?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, path)?;

        tracing::debug!(path = ?path, "fixture saved");
        Ok(())
    }

    /// Registers a restricting foreign key `child.column -> parent.id`.
    #[must_use]
    pub fn with_foreign_key(mut self, child: Resource, column: &str, parent: Resource) -> Self {
        self.foreign_keys.push(ForeignKey {
            child,
            column: column.to_string(),
            parent,
        });
        self
    }

    /// Appends rows to a table as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn seed(&self, resource: Resource, records: Vec<Record>) -> Result<()> {
        let mut data = self.lock_data()?;
        data.tables
            .entry(resource.table().to_string())
            .or_default()
            .extend(records);
        Ok(())
    }

    /// Makes the next request of any kind fail with a transport error.
    pub fn fail_next_request(&self, message: &str) {
        if let Ok(mut slot) = self.fail_next.lock() {
            *slot = Some(message.to_string());
        }
    }

    /// Requests seen so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of recorded requests of one kind against one resource.
    #[must_use]
    pub fn call_count(&self, operation: Operation, resource: Resource) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.operation == operation && c.resource == resource)
            .count()
    }

    pub fn reset_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    /// Every stored row of a table, in insertion order. Bypasses the call log.
    #[must_use]
    pub fn rows(&self, resource: Resource) -> Vec<Record> {
        self.lock_data()
            .ok()
            .and_then(|d| d.tables.get(resource.table()).cloned())
            .unwrap_or_default()
    }

    fn lock_data(&self) -> Result<MutexGuard<'_, StoreData>> {
        self.data
            .lock()
            .map_err(|e| AdminError::remote(None, format!("store lock poisoned: {e}")))
    }

    /// Records the call and consumes an injected failure, if any.
    fn begin(&self, operation: Operation, resource: Resource, filters: Vec<Filter>) -> Result<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(Call {
                operation,
                resource,
                filters,
            });
        }

        let injected = self.fail_next.lock().ok().and_then(|mut slot| slot.take());
        if let Some(message) = injected {
            tracing::debug!(?operation, %resource, %message, "injected failure");
            return Err(AdminError::remote(None, message));
        }
        Ok(())
    }

    /// Strictly increasing creation timestamps, so newest-first order is total.
    fn next_created_at(&self) -> DateTime<Utc> {
        let now = Utc::now();
        let Ok(mut last) = self.last_created_at.lock() else {
            return now;
        };
        let next = if now > *last {
            now
        } else {
            *last + Duration::microseconds(1)
        };
        *last = next;
        next
    }

    fn project(&self, data: &StoreData, resource: Resource, record: &Record, columns: &str) -> Record {
        let parts = split_columns(columns);
        if parts.iter().any(|p| p == "*") && parts.len() == 1 {
            let mut full = record.clone();
            full.sub_categories = None;
            return full;
        }

        let mut projected = Record::new(record.id.clone(), record.created_at);
        for part in parts {
            if part == "*" {
                projected.fields.extend(record.fields.clone());
            } else if let Some((embed, inner)) = part.split_once('(') {
                let inner = inner.trim_end_matches(')');
                let embedded = self.embed(data, resource, record, embed.trim(), inner);
                projected.fields.insert(embed.trim().to_string(), embedded);
            } else if let Some(value) = record.fields.get(&part) {
                projected.fields.insert(part, value.clone());
            }
        }
        projected
    }

    fn embed(&self, data: &StoreData, resource: Resource, record: &Record, embed: &str, columns: &str) -> Value {
        let Some(relation) = self
            .relations
            .iter()
            .find(|r| r.from == resource && r.embed == embed)
        else {
            return Value::Null;
        };
        let Some(target_id) = record.str_field(relation.column) else {
            return Value::Null;
        };

        data.tables
            .get(relation.target.table())
            .and_then(|rows| rows.iter().find(|r| r.id == target_id))
            .map_or(Value::Null, |target| {
                let mut object = serde_json::Map::new();
                for column in split_columns(columns) {
                    if let Some(value) = target.get(&column) {
                        object.insert(column, value);
                    }
                }
                Value::Object(object)
            })
    }
}

impl ResourceClient for MemoryBackend {
    fn select(&self, query: &SelectQuery) -> Result<QueryResult> {
        let _span = tracing::debug_span!("memory_select",
            resource = %query.resource,
            range = ?query.range,
            filters = query.filters.len()
        )
        .entered();

        self.begin(Operation::Select, query.resource, query.filters.clone())?;
        let data = self.lock_data()?;

        let mut rows: Vec<&Record> = data
            .tables
            .get(query.resource.table())
            .map(|rows| {
                rows.iter()
                    .filter(|r| query.filters.iter().all(|f| matches_filter(r, f)))
                    .collect()
            })
            .unwrap_or_default();

        let count = query.count_exact.then_some(rows.len() as u64);

        rows.sort_by(|a, b| {
            let ordering = a.compare_by(b, &query.order.column);
            if query.order.ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });

        let windowed: Vec<&Record> = match (query.range, query.limit) {
            (Some(range), _) => rows
                .into_iter()
                .skip(usize::try_from(range.from).unwrap_or(usize::MAX))
                .take(usize::try_from(range.len()).unwrap_or(usize::MAX))
                .collect(),
            (None, Some(limit)) => rows
                .into_iter()
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .collect(),
            (None, None) => rows,
        };

        let data_out: Vec<Record> = windowed
            .into_iter()
            .map(|r| self.project(&data, query.resource, r, &query.columns))
            .collect();

        tracing::debug!(returned = data_out.len(), count = ?count, "select complete");
        Ok(QueryResult::new(count, data_out))
    }

    fn insert(&self, resource: Resource, fields: &Fields) -> Result<()> {
        let _span = tracing::debug_span!("memory_insert", resource = %resource).entered();

        self.begin(Operation::Insert, resource, Vec::new())?;

        let mut fields = fields.clone();
        fields.remove("subCategories");
        let id = match fields.remove("id") {
            Some(Value::String(id)) => id,
            _ => uuid::Uuid::new_v4().to_string(),
        };
        let created_at = match fields.remove("created_at") {
            Some(Value::String(ts)) => ts
                .parse::<DateTime<Utc>>()
                .map_err(|e| AdminError::remote(Some(400), format!("invalid created_at: {e}")))?,
            _ => self.next_created_at(),
        };

        let mut data = self.lock_data()?;
        let table = data.tables.entry(resource.table().to_string()).or_default();
        if table.iter().any(|r| r.id == id) {
            return Err(AdminError::remote(
                Some(409),
                format!("duplicate key value violates unique constraint \"{resource}_pkey\""),
            ));
        }

        table.push(Record {
            id: id.clone(),
            created_at,
            fields,
            sub_categories: None,
        });

        tracing::debug!(id = %id, "row inserted");
        Ok(())
    }

    fn update(&self, resource: Resource, id: &str, fields: &Fields) -> Result<()> {
        let _span = tracing::debug_span!("memory_update", resource = %resource, id = %id).entered();

        self.begin(Operation::Update, resource, vec![Filter::eq("id", id)])?;
        let mut data = self.lock_data()?;

        let Some(row) = data
            .tables
            .get_mut(resource.table())
            .and_then(|rows| rows.iter_mut().find(|r| r.id == id))
        else {
            tracing::debug!("update matched no rows");
            return Ok(());
        };

        for (name, value) in fields {
            match name.as_str() {
                "id" | "subCategories" => {}
                "created_at" => {
                    if let Some(ts) = value.as_str().and_then(|s| s.parse().ok()) {
                        row.created_at = ts;
                    }
                }
                _ => {
                    row.fields.insert(name.clone(), value.clone());
                }
            }
        }

        tracing::debug!("row updated");
        Ok(())
    }

    fn delete(&self, resource: Resource, ids: &[String]) -> Result<()> {
        let _span = tracing::debug_span!("memory_delete", resource = %resource, count = ids.len()).entered();

        self.begin(
            Operation::Delete,
            resource,
            vec![crate::client::backend::id_filter(ids)],
        )?;
        let mut data = self.lock_data()?;

        for fk in self.foreign_keys.iter().filter(|fk| fk.parent == resource) {
            let referenced = data.tables.get(fk.child.table()).is_some_and(|children| {
                children.iter().any(|child| {
                    child
                        .str_field(&fk.column)
                        .is_some_and(|parent_id| ids.iter().any(|id| id == parent_id))
                })
            });
            if referenced {
                return Err(AdminError::remote(
                    Some(409),
                    format!(
                        "update or delete on table \"{resource}\" violates foreign key constraint on table \"{}\"",
                        fk.child
                    ),
                ));
            }
        }

        let removed = data.tables.get_mut(resource.table()).map_or(0, |rows| {
            let before = rows.len();
            rows.retain(|r| !ids.contains(&r.id));
            before - rows.len()
        });

        tracing::debug!(removed = removed, "rows deleted");
        Ok(())
    }
}

/// Text form of a value as PostgREST compares it in `eq`/`in` filters.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn matches_filter(record: &Record, filter: &Filter) -> bool {
    let text = record.get(filter.column()).as_ref().and_then(value_text);
    let Some(text) = text else {
        return false;
    };

    match filter {
        Filter::Eq { value, .. } => &text == value,
        Filter::In { values, .. } => values.contains(&text),
        Filter::ILike { pattern, .. } => like_match(&text.to_lowercase(), &pattern.to_lowercase()),
        Filter::TextSearch { query, .. } => {
            let needle = query.replace('%', "").trim().to_lowercase();
            text.to_lowercase().contains(&needle)
        }
    }
}

/// SQL `LIKE` matching with `%` (any run) and `_` (any single char).
fn like_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    // matches[j]: text[..i] matches pattern[..j]
    let mut matches = vec![false; pattern.len() + 1];
    matches[0] = true;
    for j in 1..=pattern.len() {
        matches[j] = matches[j - 1] && pattern[j - 1] == '%';
    }

    for &c in &text {
        let mut next = vec![false; pattern.len() + 1];
        for j in 1..=pattern.len() {
            next[j] = match pattern[j - 1] {
                '%' => next[j - 1] || matches[j],
                '_' => matches[j - 1],
                p => matches[j - 1] && p == c,
            };
        }
        matches = next;
    }
    matches[pattern.len()]
}
