//! Domain layer for the admin dashboard.
//!
//! Core types shared by every other layer, independent of the backend wire
//! format and of the grid presentation.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`resource`]: Backend collections
//! - [`record`]: Records, pagination windows, query results and row selection
//!
//! # Examples
//!
//! ```
//! use equilink_admin::domain::{PaginationRange, Resource};
//!
//! let range = PaginationRange::for_page(0, 8);
//! assert_eq!(range.len(), 8);
//! assert_eq!(Resource::BusinessCategories.table(), "business_categories");
//! ```

pub mod error;
pub mod record;
pub mod resource;

pub use error::{AdminError, Result};
pub use record::{Fields, PaginationRange, QueryResult, Record, SelectionSet};
pub use resource::Resource;
