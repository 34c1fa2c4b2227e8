//! View model types representing a renderable grid.
//!
//! View models are computed from [`GridState`](crate::app::GridState) via
//! `compute_viewmodel()` and consumed by a renderer (the CLI table dump, or any
//! other front end). They contain no business logic, only display-ready data.

use crate::app::modes::Notification;
use crate::domain::Resource;

/// Complete grid view model for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridViewModel {
    /// Resource title shown above the grid.
    pub title: String,

    /// Column headers, in display order.
    pub columns: Vec<String>,

    /// Rows after facet filtering, sorting and expansion.
    pub rows: Vec<GridRow>,

    pub page: PageInfo,

    /// Number of checked rows.
    pub selected_count: usize,

    /// Search term the displayed rows were fetched with.
    pub search: Option<String>,

    pub loading: bool,

    /// Shown instead of rows when the page is empty.
    pub empty_state: Option<EmptyState>,

    pub notifications: Vec<Notification>,
}

/// One displayed row; children of an expanded parent have depth 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    pub id: String,
    pub depth: usize,
    pub cells: Vec<String>,
    pub is_selected: bool,
    pub is_expanded: bool,
    pub has_children: bool,

    /// Search match highlights as `(column, start, end)` character ranges, end exclusive.
    pub highlight_ranges: Vec<(usize, usize, usize)>,
}

/// Pagination footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    /// Zero-based page index.
    pub index: u64,
    pub page_count: u64,
    pub page_size: u64,
    /// Total rows reported by the backend.
    pub total: Option<u64>,
    /// e.g. `Page 2 of 5`.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyState {
    pub message: String,
    pub subtitle: String,
}

/// Columns the dashboard shows for each resource.
#[must_use]
pub const fn default_columns(resource: Resource) -> &'static [&'static str] {
    match resource {
        Resource::BusinessCategories => &["name", "is_featured", "created_at"],
        Resource::BusinessSubCategories | Resource::PostCategories => &["name", "created_at"],
        Resource::Businesses => &["name", "owner_name", "country", "status", "is_hiring", "created_at"],
        Resource::Posts => &["title", "is_verified", "created_at"],
        Resource::Services => &["title", "price_type", "country", "accepting_bookings", "created_at"],
        Resource::Events => &["title", "type", "start_at", "country", "price"],
        Resource::Opportunities => &["title", "country", "address", "created_at"],
        Resource::Customers => &["name", "email", "country", "hasBusiness", "created_at"],
        Resource::Feedbacks => &["rating", "review", "created_at"],
        Resource::Subscribers => &["user_id", "business_id", "created_at"],
    }
}

/// Human title of a resource.
#[must_use]
pub const fn title(resource: Resource) -> &'static str {
    match resource {
        Resource::Businesses => "Businesses",
        Resource::BusinessCategories => "Business Categories",
        Resource::BusinessSubCategories => "Business Subcategories",
        Resource::PostCategories => "Post Categories",
        Resource::Posts => "Posts",
        Resource::Services => "Services",
        Resource::Events => "Events",
        Resource::Opportunities => "Opportunities",
        Resource::Customers => "Customers",
        Resource::Feedbacks => "Feedbacks",
        Resource::Subscribers => "Subscribers",
    }
}
