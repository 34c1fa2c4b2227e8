//! Listing protocol shared by every admin resource.
//!
//! # Organization
//!
//! - [`plan`]: Per-resource list shapes
//! - [`query`]: Flat and hierarchical list fetches, single-record lookups
//! - [`mutations`]: Inserts, updates and deletes
//! - [`stats`]: Overview counts and recent-row widgets

pub mod mutations;
pub mod plan;
pub mod query;
pub mod stats;

pub use mutations::{invalidation_family, Mutation};
pub use plan::{ListPlan, RangeConvention, SearchMode};
pub use query::{category_name, fetch, get_profile, list, list_categories, ListOptions};
pub use stats::{fetch_stats, recent_businesses, recent_posts, DashboardStats, RecentItem};
