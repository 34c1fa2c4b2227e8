//! List queries.
//!
//! [`list`] turns a `(search, pagination)` pair into exactly one select.
//! [`list_categories`] is the hierarchical variant: it fetches a page of
//! business categories and then issues one subcategory select per parent row,
//! attaching each result as that parent's `subCategories`. The fan-out is
//! scoped to the parents on the visible page, never a global join.

use crate::client::{Filter, Order, ResourceClient, SelectQuery};
use crate::domain::{PaginationRange, QueryResult, Record, Resource, Result};
use crate::listing::plan::{ListPlan, RangeConvention, SearchMode};

/// Process-wide listing switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Keep the page window on searches that would otherwise return every match.
    pub paginate_search: bool,
}

/// Normalizes a search term: blank terms mean "no search".
fn effective_search(search: Option<&str>) -> Option<&str> {
    search.filter(|s| !s.trim().is_empty())
}

/// Applies a page window to a select under the plan's range convention.
fn apply_window(query: SelectQuery, range: PaginationRange, convention: RangeConvention) -> SelectQuery {
    match convention {
        RangeConvention::Inclusive => query.range(range),
        RangeConvention::ExclusiveEnd => match PaginationRange::new(range.from, range.to.saturating_sub(1)) {
            Ok(shortened) if range.to > range.from => query.range(shortened),
            _ => query.limit(0),
        },
    }
}

/// Builds the select a list call issues. Exposed for request inspection.
#[must_use]
pub fn build_list_query(
    plan: &ListPlan,
    search: Option<&str>,
    pagination: Option<PaginationRange>,
    options: &ListOptions,
) -> SelectQuery {
    let search = effective_search(search).zip(plan.search_column);
    let mut query = SelectQuery::new(plan.resource)
        .columns(plan.columns)
        .order(Order::newest_first())
        .count_exact();

    if let Some((term, column)) = search {
        let pattern = plan.search_pattern(term);
        let column = column.to_string();
        query = query.filter(match plan.search_mode {
            SearchMode::TextSearch => Filter::TextSearch { column, query: pattern },
            SearchMode::ILike => Filter::ILike { column, pattern },
        });
    }

    let windowed = search.is_none() || !plan.search_bypasses_pagination || options.paginate_search;
    match pagination {
        Some(range) if windowed => apply_window(query, range, plan.range_convention),
        _ => query,
    }
}

/// Runs one list fetch for a flat resource.
///
/// # Errors
///
/// Returns [`AdminError::Remote`](crate::AdminError::Remote) when the select fails.
pub fn list(
    client: &dyn ResourceClient,
    plan: &ListPlan,
    search: Option<&str>,
    pagination: Option<PaginationRange>,
    options: &ListOptions,
) -> Result<QueryResult> {
    let _span = tracing::debug_span!("list",
        resource = %plan.resource,
        search = ?search,
        from = pagination.map(|p| p.from),
        to = pagination.map(|p| p.to)
    )
    .entered();

    let query = build_list_query(plan, search, pagination, options);
    let mut result = client.select(&query)?;

    if let Some(enrich) = plan.enrich {
        result.data.iter_mut().for_each(enrich);
    }

    tracing::debug!(rows = result.data.len(), count = ?result.count, "list fetched");
    Ok(result)
}

/// Subcategories of one category, newest first.
///
/// # Errors
///
/// Returns [`AdminError::Remote`](crate::AdminError::Remote) when the select fails.
pub fn list_sub_categories(client: &dyn ResourceClient, category_id: &str) -> Result<Vec<Record>> {
    let query = SelectQuery::new(Resource::BusinessSubCategories)
        .filter(Filter::eq("category_id", category_id))
        .order(Order::newest_first());
    Ok(client.select(&query)?.data)
}

/// Business categories with their subcategories attached.
///
/// Issues one parent select plus exactly one child select per returned
/// parent. A failing child select fails the whole listing.
///
/// # Errors
///
/// Returns [`AdminError::Remote`](crate::AdminError::Remote) when any select fails.
pub fn list_categories(
    client: &dyn ResourceClient,
    search: Option<&str>,
    pagination: Option<PaginationRange>,
    options: &ListOptions,
) -> Result<QueryResult> {
    let _span = tracing::debug_span!("list_categories", search = ?search).entered();

    let plan = ListPlan::for_resource(Resource::BusinessCategories);
    let mut result = list(client, &plan, search, pagination, options)?;

    for parent in &mut result.data {
        let children = list_sub_categories(client, &parent.id)?;
        tracing::debug!(parent = %parent.id, children = children.len(), "subcategories attached");
        parent.sub_categories = Some(children);
    }

    Ok(result)
}

/// Fetches the listing the dashboard shows for `resource`.
///
/// Business categories use the hierarchical fan-out; every other resource is
/// a flat list.
///
/// # Errors
///
/// Returns [`AdminError::Remote`](crate::AdminError::Remote) when any select fails.
pub fn fetch(
    client: &dyn ResourceClient,
    resource: Resource,
    search: Option<&str>,
    pagination: Option<PaginationRange>,
    options: &ListOptions,
) -> Result<QueryResult> {
    match resource {
        Resource::BusinessCategories => list_categories(client, search, pagination, options),
        other => list(client, &ListPlan::for_resource(other), search, pagination, options),
    }
}

/// Name of a business category, `None` when no row has that id.
///
/// The id is trimmed before lookup.
///
/// # Errors
///
/// Returns [`AdminError::Remote`](crate::AdminError::Remote) when the select fails.
pub fn category_name(client: &dyn ResourceClient, category_id: &str) -> Result<Option<String>> {
    let id = category_id.trim();
    let query = SelectQuery::new(Resource::BusinessCategories)
        .columns("id, created_at, name")
        .filter(Filter::eq("id", id));

    let name = client
        .select(&query)?
        .data
        .first()
        .and_then(|r| r.str_field("name"))
        .map(str::to_string);

    if name.is_none() {
        tracing::debug!(id = %id, "no category for id");
    }
    Ok(name)
}

/// One customer profile.
///
/// # Errors
///
/// Returns [`AdminError::NotFound`](crate::AdminError::NotFound) when no
/// profile has that id.
pub fn get_profile(client: &dyn ResourceClient, id: &str) -> Result<Record> {
    client.get(Resource::Customers, id)
}
