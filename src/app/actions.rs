//! Actions representing side effects to be executed by the dashboard runtime.
//!
//! The event handler returns a `Vec<Action>` after processing each event, so
//! several side effects can be queued atomically. The runtime executes them in
//! order: worker messages are posted to the query worker, debounce requests
//! arm a timer that later feeds [`Event::DebounceElapsed`](crate::app::Event::DebounceElapsed)
//! back into the handler.
//!
//! # Example
//!
//! ```rust
//! use equilink_admin::app::Action;
//! use equilink_admin::domain::Resource;
//! use equilink_admin::worker::WorkerMessage;
//!
//! let actions = vec![Action::PostToWorker(WorkerMessage::list(1, Resource::Posts, None, None))];
//! assert_eq!(actions.len(), 1);
//! ```

use crate::worker::WorkerMessage;
use std::time::Duration;

/// Commands representing side effects to be executed by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Posts a message to the background query worker.
    PostToWorker(WorkerMessage),

    /// Arms the search debounce timer.
    ///
    /// When `delay` elapses the runtime sends `DebounceElapsed(generation)`;
    /// the handler ignores it if newer input has bumped the generation since.
    ScheduleDebounce {
        generation: u64,
        delay: Duration,
    },
}
