//! Overview widgets: aggregate counts and the newest rows of a few resources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::{Order, ResourceClient, SelectQuery};
use crate::domain::{Resource, Result};

/// Row counts shown on the overview cards. A missing count reads as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub feedbacks: u64,
    pub customers: u64,
    pub subscribers: u64,
    pub businesses: u64,
}

/// One row of a "recent" widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentItem {
    pub id: String,
    pub label: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Fetches the four overview counts, one exact-count request each.
///
/// # Errors
///
/// Returns the first [`AdminError::Remote`](crate::AdminError::Remote) encountered.
pub fn fetch_stats(client: &dyn ResourceClient) -> Result<DashboardStats> {
    let _span = tracing::debug_span!("fetch_stats").entered();

    let count = |resource| client.count(resource).map(Option::unwrap_or_default);
    let stats = DashboardStats {
        feedbacks: count(Resource::Feedbacks)?,
        customers: count(Resource::Customers)?,
        subscribers: count(Resource::Subscribers)?,
        businesses: count(Resource::Businesses)?,
    };

    tracing::debug!(?stats, "stats fetched");
    Ok(stats)
}

/// Newest `limit` posts; status is `Verified` or `Pending`.
///
/// # Errors
///
/// Returns [`AdminError::Remote`](crate::AdminError::Remote) when the select fails.
pub fn recent_posts(client: &dyn ResourceClient, limit: u64) -> Result<Vec<RecentItem>> {
    let query = SelectQuery::new(Resource::Posts)
        .columns("id, title, is_verified, created_at")
        .order(Order::newest_first())
        .limit(limit);

    Ok(client
        .select(&query)?
        .data
        .into_iter()
        .map(|post| RecentItem {
            label: post.str_field("title").unwrap_or("Untitled Post").to_string(),
            status: if post.bool_field("is_verified").unwrap_or(false) {
                "Verified"
            } else {
                "Pending"
            }
            .to_string(),
            id: post.id,
            created_at: post.created_at,
        })
        .collect())
}

/// Newest `limit` businesses with their moderation status.
///
/// # Errors
///
/// Returns [`AdminError::Remote`](crate::AdminError::Remote) when the select fails.
pub fn recent_businesses(client: &dyn ResourceClient, limit: u64) -> Result<Vec<RecentItem>> {
    let query = SelectQuery::new(Resource::Businesses)
        .columns("id, name, status, created_at")
        .order(Order::newest_first())
        .limit(limit);

    Ok(client
        .select(&query)?
        .data
        .into_iter()
        .map(|business| RecentItem {
            label: business.display("name"),
            status: business.display("status"),
            id: business.id,
            created_at: business.created_at,
        })
        .collect())
}
