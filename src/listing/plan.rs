//! Per-resource list shapes.
//!
//! Every admin listing is the same protocol (ordered, counted, windowed, with an
//! optional substring search) with a handful of per-resource differences: the
//! projection, the searched column, how the term is matched, whether a search
//! keeps the page window, and whether the window end is inclusive. A
//! [`ListPlan`] captures those differences so one generic query covers all of
//! them.

use serde_json::Value;

use crate::domain::{Record, Resource};

/// How the search term is turned into a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Full-text match on `%term%`, term lowercased and trimmed.
    TextSearch,
    /// Case-insensitive `LIKE` on `%term%`, term used verbatim.
    ILike,
}

/// How a [`PaginationRange`](crate::domain::PaginationRange) end is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeConvention {
    /// `to` is the last row returned.
    Inclusive,
    /// `to` is treated as exclusive, so one row fewer than the page size comes back.
    ExclusiveEnd,
}

/// Post-processing applied to every fetched row.
pub type Enrich = fn(&mut Record);

/// List shape of one resource.
#[derive(Debug, Clone, Copy)]
pub struct ListPlan {
    pub resource: Resource,
    /// Projection, possibly with a foreign-key embed.
    pub columns: &'static str,
    /// Column the search box matches; `None` for resources that are only browsed.
    pub search_column: Option<&'static str>,
    pub search_mode: SearchMode,
    /// A search drops the page window and returns every match.
    pub search_bypasses_pagination: bool,
    pub range_convention: RangeConvention,
    pub enrich: Option<Enrich>,
}

impl ListPlan {
    const fn text_search(resource: Resource, columns: &'static str, search_column: &'static str) -> Self {
        Self {
            resource,
            columns,
            search_column: Some(search_column),
            search_mode: SearchMode::TextSearch,
            search_bypasses_pagination: true,
            range_convention: RangeConvention::Inclusive,
            enrich: None,
        }
    }

    const fn ilike(resource: Resource, columns: &'static str, search_column: &'static str) -> Self {
        Self {
            resource,
            columns,
            search_column: Some(search_column),
            search_mode: SearchMode::ILike,
            search_bypasses_pagination: false,
            range_convention: RangeConvention::ExclusiveEnd,
            enrich: None,
        }
    }

    const fn browse_only(resource: Resource, columns: &'static str) -> Self {
        Self {
            resource,
            columns,
            search_column: None,
            search_mode: SearchMode::TextSearch,
            search_bypasses_pagination: false,
            range_convention: RangeConvention::Inclusive,
            enrich: None,
        }
    }

    /// Whether a search term changes what this resource lists.
    #[must_use]
    pub const fn is_searchable(&self) -> bool {
        self.search_column.is_some()
    }

    /// The list shape the dashboard uses for `resource`.
    #[must_use]
    pub const fn for_resource(resource: Resource) -> Self {
        match resource {
            Resource::BusinessCategories
            | Resource::BusinessSubCategories
            | Resource::PostCategories => Self::text_search(resource, "*", "name"),
            Resource::Posts => Self::text_search(resource, "*", "title"),
            Resource::Subscribers => Self::browse_only(resource, "id, user_id, business_id, created_at"),
            Resource::Businesses => Self::text_search(
                resource,
                "id, user_id, name, phone_number, owner_name, years_in_business, bio, address, \
                 country, socials, is_registered, proof_url, status, created_at, is_hiring, \
                 category_id, image_url, stripe_connect_id, business_categories(name)",
                "name",
            ),
            Resource::Opportunities => Self::text_search(
                resource,
                "id, category_id, image_url, title, description, address, country, created_at, business_id",
                "title",
            ),
            Resource::Customers => Self {
                enrich: Some(derive_has_business),
                ..Self::text_search(
                    resource,
                    "id, name, email, image_url, country, address, created_at, stripe_customer_id",
                    "name",
                )
            },
            Resource::Events => Self::ilike(
                resource,
                "id, business_id, category_id, image_url, title, start_at, description, address, \
                 country, created_at, type, price",
                "title",
            ),
            Resource::Services => Self::ilike(
                resource,
                "id, business_id, category_id, sub_category_id, image_url, title, price_type, \
                 fixed_price, min_price_range, max_price_range, price_duration, description, \
                 address, country, created_at, accepting_bookings",
                "title",
            ),
            Resource::Feedbacks => Self {
                range_convention: RangeConvention::Inclusive,
                enrich: Some(flatten_profile),
                ..Self::ilike(
                    resource,
                    "id, profile_id, rating, review, created_at, profiles(id, name, image_url)",
                    "review",
                )
            },
        }
    }

    /// Filter pattern for a search term under this plan's mode.
    #[must_use]
    pub fn search_pattern(&self, term: &str) -> String {
        match self.search_mode {
            SearchMode::TextSearch => format!("%{}%", term.trim().to_lowercase()),
            SearchMode::ILike => format!("%{term}%"),
        }
    }
}

/// Customers get a `hasBusiness` facet derived from their Stripe id.
fn derive_has_business(record: &mut Record) {
    let has_business = record
        .str_field("stripe_customer_id")
        .is_some_and(|id| !id.is_empty());
    record.fields.insert(
        "hasBusiness".to_string(),
        Value::String(if has_business { "Yes" } else { "No" }.to_string()),
    );
}

/// Feedback rows expose their embedded author as `profile`.
fn flatten_profile(record: &mut Record) {
    let profile = match record.fields.remove("profiles") {
        Some(Value::Array(mut items)) if !items.is_empty() => items.swap_remove(0),
        Some(Value::Object(object)) => Value::Object(object),
        _ => return,
    };
    record.fields.insert("profile".to_string(), profile);
}
