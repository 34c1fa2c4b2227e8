//! Background query worker.
//!
//! Every backend request runs on one worker thread fed by a crossbeam channel,
//! so the event loop keeps handling input while a fetch is in flight.
//!
//! # Architecture
//!
//! - `messages`: Request/response protocol types with trace context propagation
//! - `handler`: Worker implementation, cache read-through and the thread handle

pub mod handler;
pub mod messages;

pub use handler::{QueryWorker, WorkerHandle};
pub use messages::{TraceContext, WorkerMessage, WorkerResponse};
