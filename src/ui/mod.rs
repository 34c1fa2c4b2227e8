//! Presentation layer: view models and terminal tables.
//!
//! ```text
//! GridState → compute_viewmodel → GridViewModel → grid_table → stdout
//! ```
//!
//! - [`viewmodel`]: Display-ready grid data, free of business logic
//! - [`table`]: `comfy-table` renderers used by the command line front end

pub mod table;
pub mod viewmodel;

pub use viewmodel::{default_columns, title, EmptyState, GridRow, GridViewModel, PageInfo};
