//! Record, pagination window and query result types.
//!
//! A [`Record`] is an opaque field map plus the two columns every collection has:
//! a stable `id` and a `created_at` timestamp. The remote store owns the
//! authoritative copy; the dashboard only ever holds snapshots inside a
//! [`QueryResult`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::error::{AdminError, Result};

/// Field map used for inserts, updates and record payloads.
pub type Fields = Map<String, Value>;

/// A row of any backend collection.
///
/// `sub_categories` is synthesized by the hierarchical category listing and only
/// exists for the lifetime of one list result. It is never part of the stored
/// schema and is stripped from every write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,

    /// Creation timestamp; a null column reads as the Unix epoch.
    #[serde(deserialize_with = "created_at_or_epoch")]
    pub created_at: DateTime<Utc>,

    #[serde(flatten)]
    pub fields: Fields,

    #[serde(
        default,
        rename = "subCategories",
        skip_serializing_if = "Option::is_none"
    )]
    pub sub_categories: Option<Vec<Record>>,
}

fn created_at_or_epoch<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<DateTime<Utc>> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or(DateTime::UNIX_EPOCH))
}

impl Record {
    /// Creates a record with no extra fields.
    pub fn new(id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            created_at,
            fields: Fields::new(),
            sub_categories: None,
        }
    }

    /// Builder-style field setter, mostly for fixtures and tests.
    #[must_use]
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Returns a field value, treating `id` and `created_at` as fields too.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::String(self.id.clone())),
            "created_at" => Some(Value::String(self.created_at.to_rfc3339())),
            _ => self.fields.get(name).cloned(),
        }
    }

    /// Returns a string field, `None` when absent, null or not a string.
    #[must_use]
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Returns a boolean field, `None` when absent, null or not a boolean.
    #[must_use]
    pub fn bool_field(&self, name: &str) -> Option<bool> {
        self.fields.get(name).and_then(Value::as_bool)
    }

    /// Rendered cell text for a column, as the grid displays it.
    #[must_use]
    pub fn display(&self, column: &str) -> String {
        match self.get(column) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s,
            Some(Value::Bool(b)) => if b { "Yes" } else { "No" }.to_string(),
            Some(other) => other.to_string(),
        }
    }

    /// Orders two records by one column, ascending.
    ///
    /// Nulls and missing fields sort first; numbers compare numerically and
    /// mixed types fall back to their JSON text.
    #[must_use]
    pub fn compare_by(&self, other: &Self, column: &str) -> Ordering {
        match column {
            "created_at" => self.created_at.cmp(&other.created_at),
            "id" => self.id.cmp(&other.id),
            _ => compare_values(self.fields.get(column), other.fields.get(column)),
        }
    }

    /// Children attached by a hierarchical listing, empty when none were fetched.
    #[must_use]
    pub fn children(&self) -> &[Record] {
        self.sub_categories.as_deref().unwrap_or_default()
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

/// Inclusive, zero-based row window `[from, to]` over an ordered collection.
///
/// Built fresh whenever the page index or page size changes and never mutated
/// after it is handed to a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaginationRange {
    pub from: u64,
    pub to: u64,
}

impl PaginationRange {
    /// Creates a range, rejecting `to < from`.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] when the window is inverted.
    pub fn new(from: u64, to: u64) -> Result<Self> {
        if to < from {
            return Err(AdminError::Config(format!(
                "invalid pagination range: to ({to}) < from ({from})"
            )));
        }
        Ok(Self { from, to })
    }

    /// Window for a zero-based page index and a page size.
    ///
    /// A page size of zero is treated as one row.
    ///
    /// ```
    /// use equilink_admin::domain::PaginationRange;
    ///
    /// let range = PaginationRange::for_page(2, 8);
    /// assert_eq!((range.from, range.to), (16, 23));
    /// ```
    #[must_use]
    pub fn for_page(page_index: u64, page_size: u64) -> Self {
        let size = page_size.max(1);
        let from = page_index.saturating_mul(size);
        Self {
            from,
            to: from.saturating_add(size - 1),
        }
    }

    /// Number of rows the window spans.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.to - self.from + 1
    }

    /// A window always spans at least one row.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

/// Result of one list fetch.
///
/// `count` is the total number of matching rows regardless of the window, or
/// `None` when the backend omitted it. Results are replaced wholesale on the
/// next fetch, never patched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryResult {
    pub count: Option<u64>,
    pub data: Vec<Record>,
}

impl QueryResult {
    #[must_use]
    pub const fn new(count: Option<u64>, data: Vec<Record>) -> Self {
        Self { count, data }
    }
}

/// Ids the user has checked in the grid, used to scope a batch delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<String>,
}

impl SelectionSet {
    /// Flips membership of `id`, returning whether it is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn insert(&mut self, id: &str) {
        self.ids.insert(id.to_string());
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in stable order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inverted_range_is_rejected() {
        assert!(PaginationRange::new(5, 4).is_err());
        assert_eq!(PaginationRange::new(4, 4).unwrap().len(), 1);
    }

    #[test]
    fn first_page_starts_at_zero() {
        let range = PaginationRange::for_page(0, 8);
        assert_eq!((range.from, range.to), (0, 7));
        assert_eq!(range.len(), 8);
    }

    #[test]
    fn record_flattens_fields_and_renames_children() {
        let created_at = "2024-05-01T10:00:00Z".parse().unwrap();
        let mut record = Record::new("c1", created_at).with_field("name", "Farriers");
        record.sub_categories = Some(vec![]);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["name"], json!("Farriers"));
        assert_eq!(value["subCategories"], json!([]));

        let plain: Record = serde_json::from_value(json!({
            "id": "c2",
            "created_at": "2024-05-01T10:00:00Z",
            "is_featured": false
        }))
        .unwrap();
        assert_eq!(plain.bool_field("is_featured"), Some(false));
        assert!(plain.sub_categories.is_none());
    }

    #[test]
    fn null_created_at_reads_as_epoch() {
        let record: Record = serde_json::from_value(json!({
            "id": "f1",
            "created_at": null,
            "rating": 5
        }))
        .unwrap();
        assert_eq!(record.created_at, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn display_renders_booleans_as_yes_no() {
        let record = Record::new("x", Utc::now())
            .with_field("is_featured", true)
            .with_field("bio", Value::Null);
        assert_eq!(record.display("is_featured"), "Yes");
        assert_eq!(record.display("bio"), "");
        assert_eq!(record.display("id"), "x");
    }

    #[test]
    fn compare_by_puts_nulls_first() {
        let now = Utc::now();
        let a = Record::new("a", now).with_field("price", 12);
        let b = Record::new("b", now).with_field("price", 9.5);
        let c = Record::new("c", now);
        assert_eq!(a.compare_by(&b, "price"), Ordering::Greater);
        assert_eq!(c.compare_by(&b, "price"), Ordering::Less);
    }

    #[test]
    fn selection_toggle_flips_membership() {
        let mut selection = SelectionSet::default();
        assert!(selection.toggle("a"));
        assert!(selection.contains("a"));
        assert!(!selection.toggle("a"));
        assert!(selection.is_empty());
    }
}
