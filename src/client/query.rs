//! Select query description and its PostgREST wire encoding.
//!
//! A [`SelectQuery`] captures everything one `SELECT` request can carry:
//! projection (including foreign-key embeds such as `business_categories(name)`),
//! filters, ordering, an inclusive row window and the exact-count flag. Backends
//! interpret it directly; the REST backend encodes it with [`SelectQuery::to_query_pairs`].

use crate::domain::{PaginationRange, Resource};

/// Row filter applied server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `column = value`.
    Eq { column: String, value: String },

    /// `column IN (values...)`.
    In { column: String, values: Vec<String> },

    /// Case-insensitive `LIKE` with `%` and `_` wildcards.
    ILike { column: String, pattern: String },

    /// Full-text match. The in-memory backend treats it as a case-insensitive
    /// substring match on the query with `%` wildcards removed.
    TextSearch { column: String, query: String },
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<String>) -> Self {
        Self::Eq {
            column: column.to_string(),
            value: value.into(),
        }
    }

    pub fn is_in(column: &str, values: Vec<String>) -> Self {
        Self::In {
            column: column.to_string(),
            values,
        }
    }

    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Eq { column, .. }
            | Self::In { column, .. }
            | Self::ILike { column, .. }
            | Self::TextSearch { column, .. } => column,
        }
    }

    /// PostgREST operator expression, e.g. `eq.42` or `in.("a","b")`.
    #[must_use]
    pub fn to_operator(&self) -> String {
        match self {
            Self::Eq { value, .. } => format!("eq.{value}"),
            Self::In { values, .. } => {
                let quoted: Vec<String> = values
                    .iter()
                    .map(|v| format!("\"{}\"", v.replace('"', "\\\"")))
                    .collect();
                format!("in.({})", quoted.join(","))
            }
            Self::ILike { pattern, .. } => format!("ilike.{pattern}"),
            Self::TextSearch { query, .. } => format!("fts.{query}"),
        }
    }
}

/// Sort key for a select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    /// Newest first, the ordering every listing uses.
    #[must_use]
    pub fn newest_first() -> Self {
        Self {
            column: "created_at".to_string(),
            ascending: false,
        }
    }
}

impl Default for Order {
    fn default() -> Self {
        Self::newest_first()
    }
}

/// One `SELECT` against a backend collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    pub resource: Resource,
    pub columns: String,
    pub filters: Vec<Filter>,
    pub order: Order,
    pub range: Option<PaginationRange>,
    pub limit: Option<u64>,
    pub count_exact: bool,
}

impl SelectQuery {
    /// All columns, newest first, no window, no count.
    #[must_use]
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            columns: "*".to_string(),
            filters: Vec::new(),
            order: Order::newest_first(),
            range: None,
            limit: None,
            count_exact: false,
        }
    }

    #[must_use]
    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = columns.split_whitespace().collect::<Vec<_>>().join(" ");
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub const fn range(mut self, range: PaginationRange) -> Self {
        self.range = Some(range);
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn count_exact(mut self) -> Self {
        self.count_exact = true;
        self
    }

    /// Query-string pairs for a PostgREST `GET /rest/v1/{table}`.
    ///
    /// The inclusive range is sent as `offset`/`limit`; an explicit limit wins
    /// when no range is set.
    ///
    /// ```
    /// use equilink_admin::client::{Filter, SelectQuery};
    /// use equilink_admin::domain::{PaginationRange, Resource};
    ///
    /// let query = SelectQuery::new(Resource::BusinessSubCategories)
    ///     .filter(Filter::eq("category_id", "c1"))
    ///     .range(PaginationRange::for_page(1, 8));
    /// let pairs = query.to_query_pairs();
    /// assert!(pairs.contains(&("category_id".to_string(), "eq.c1".to_string())));
    /// assert!(pairs.contains(&("offset".to_string(), "8".to_string())));
    /// assert!(pairs.contains(&("limit".to_string(), "8".to_string())));
    /// ```
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.columns.replace(' ', ""))];

        for filter in &self.filters {
            pairs.push((filter.column().to_string(), filter.to_operator()));
        }

        let direction = if self.order.ascending { "asc" } else { "desc" };
        pairs.push(("order".to_string(), format!("{}.{direction}", self.order.column)));

        if let Some(range) = self.range {
            pairs.push(("offset".to_string(), range.from.to_string()));
            pairs.push(("limit".to_string(), range.len().to_string()));
        } else if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }

        pairs
    }
}

/// Splits a projection at top-level commas, keeping embeds like `rel(a, b)` intact.
#[must_use]
pub fn split_columns(columns: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();

    for c in columns.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts.retain(|p| !p.is_empty());
    parts
}

/// Total row count from a `Content-Range` header such as `0-7/42` or `*/0`.
#[must_use]
pub fn parse_content_range(header: &str) -> Option<u64> {
    header
        .rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse().ok())
}
