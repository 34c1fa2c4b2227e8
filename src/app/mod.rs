//! Grid state machine for one resource listing.
//!
//! Input and worker replies both arrive as [`Event`]s. [`handle_event`]
//! mutates [`GridState`] and returns the [`Action`]s the runtime must carry
//! out (post a query, arm a debounce deadline, run a mutation).
//!
//! ```text
//! keystrokes, clicks ──► Event ──► handle_event ──► GridState
//!                          ▲                           │
//!                          │                         Action
//!                   WorkerResponse ◄── query worker ◄──┘
//! ```

pub mod actions;
pub mod handler;
pub mod modes;
pub mod state;

pub use actions::Action;
pub use handler::{handle_event, Event};
pub use modes::{Notification, NotificationKind, SortColumn, SortDirection};
pub use state::{GridState, VisibleRow};
