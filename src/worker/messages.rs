//! Messages exchanged with the query worker.
//!
//! This module defines the request and response protocol between the grid
//! (event loop) thread and the background query worker that owns every backend
//! request. It also carries distributed tracing context across the thread
//! boundary so worker spans nest under the interaction that caused them.

use serde::{Deserialize, Serialize};

use crate::domain::{PaginationRange, QueryResult, Resource};
use crate::listing::{DashboardStats, Mutation};

/// Trace and span ids of the posting thread, so worker spans join the same trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceContext {
    /// 32 hex digits.
    pub trace_id: String,

    /// 16 hex digits; the span active when the message was posted.
    pub parent_span_id: String,
}

impl TraceContext {
    /// Snapshot of the active span.
    ///
    /// Returns `None` when no OpenTelemetry layer is installed or the current
    /// span context is invalid.
    #[must_use]
    pub fn from_current() -> Option<Self> {
        use opentelemetry::trace::TraceContextExt;
        use tracing_opentelemetry::OpenTelemetrySpanExt;

        let otel_context = tracing::Span::current().context();
        let span_ref = otel_context.span();
        let span_context = span_ref.span_context();

        if !span_context.is_valid() {
            return None;
        }

        let context = Self {
            trace_id: format!("{:032x}", span_context.trace_id()),
            parent_span_id: format!("{:016x}", span_context.span_id()),
        };
        tracing::trace!(
            trace_id = %context.trace_id,
            parent_span_id = %context.parent_span_id,
            "capturing trace context"
        );
        Some(context)
    }
}

/// Generates constructors for `WorkerMessage` variants that attach the current
/// trace context automatically.
macro_rules! worker_message_builders {
    (
        $(
            $builder_name:ident($variant:ident { $($field:ident: $ty:ty),* $(,)? })
        ),* $(,)?
    ) => {
        impl WorkerMessage {
            $(
                #[doc = concat!("`", stringify!($variant), "` message tagged with the active span.")]
                #[must_use]
                pub fn $builder_name($($field: $ty),*) -> Self {
                    Self::$variant {
                        $($field,)*
                        trace_context: TraceContext::from_current(),
                    }
                }
            )*
        }
    };
}

worker_message_builders! {
    list(List { seq: u64, resource: Resource, search: Option<String>, pagination: Option<PaginationRange> }),
    mutate(Mutate { resource: Resource, mutation: Mutation }),
    stats(Stats {}),
}

/// Requests sent from the event loop to the query worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkerMessage {
    /// Fetch one listing, read-through the query cache.
    List {
        /// Request sequence number; responses echo it back.
        seq: u64,

        resource: Resource,

        /// Search term, `None` for a plain paginated fetch.
        search: Option<String>,

        /// Page window, `None` for the backend's default limit.
        pagination: Option<PaginationRange>,

        /// Span context of the posting thread.
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },

    /// Apply one write and invalidate its cache family on success.
    Mutate {
        resource: Resource,
        mutation: Mutation,

        /// Span context of the posting thread.
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },

    /// Fetch the overview counts.
    Stats {
        /// Span context of the posting thread.
        #[serde(skip_serializing_if = "Option::is_none")]
        trace_context: Option<TraceContext>,
    },
}

impl WorkerMessage {
    #[must_use]
    pub const fn trace_context(&self) -> Option<&TraceContext> {
        match self {
            Self::List { trace_context, .. }
            | Self::Mutate { trace_context, .. }
            | Self::Stats { trace_context } => trace_context.as_ref(),
        }
    }
}

/// Responses sent from the query worker back to the event loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkerResponse {
    /// A listing completed.
    Listed {
        /// Sequence number of the request this answers.
        seq: u64,
        resource: Resource,
        result: QueryResult,
    },

    /// A write succeeded and its cache family was invalidated.
    Mutated {
        resource: Resource,

        /// Ids the write targeted; empty for inserts.
        ids: Vec<String>,

        /// Whether the write was a delete.
        deleted: bool,
    },

    /// Overview counts were fetched.
    Stats(DashboardStats),

    /// A request failed. Cached data is left as it was.
    Failed {
        /// Sequence number for list requests, `None` for writes and stats.
        seq: Option<u64>,
        resource: Option<Resource>,

        /// Human-readable error message.
        message: String,

        /// Whether the failure came from the backend or transport.
        remote: bool,
    },
}
