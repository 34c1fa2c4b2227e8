//! Query worker implementation.
//!
//! The worker owns every backend request so the event loop never blocks on the
//! network. It reads listings through the [`QueryCache`], invalidates cache
//! families after successful writes, and links its spans to the caller's trace
//! context.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::cache::QueryCache;
use crate::client::ResourceClient;
use crate::domain::error::{AdminError, Result};
use crate::domain::{PaginationRange, Resource};
use crate::listing::{self, invalidation_family, ListOptions, Mutation};
use crate::worker::{WorkerMessage, WorkerResponse};

/// Executes worker messages against the shared client and cache.
pub struct QueryWorker {
    client: Arc<dyn ResourceClient>,
    cache: Arc<QueryCache>,
    options: ListOptions,
}

impl QueryWorker {
    pub fn new(client: Arc<dyn ResourceClient>, cache: Arc<QueryCache>, options: ListOptions) -> Self {
        Self {
            client,
            cache,
            options,
        }
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// Standardizes error conversion and logging for every operation.
    fn handle_result<T, F>(
        operation: &str,
        seq: Option<u64>,
        resource: Option<Resource>,
        result: Result<T>,
        on_success: F,
    ) -> WorkerResponse
    where
        F: FnOnce(T) -> WorkerResponse,
    {
        match result {
            Ok(value) => {
                tracing::debug!(operation = operation, "worker operation successful");
                on_success(value)
            }
            Err(e) => {
                tracing::warn!(operation = operation, error = %e, "worker operation failed");
                WorkerResponse::Failed {
                    seq,
                    resource,
                    message: e.to_string(),
                    remote: e.is_remote(),
                }
            }
        }
    }

    fn handle_list(
        &self,
        seq: u64,
        resource: Resource,
        search: Option<&str>,
        pagination: Option<PaginationRange>,
    ) -> WorkerResponse {
        if let Some(result) = self.cache.get(resource, search, pagination) {
            tracing::debug!(seq = seq, "served from cache");
            return WorkerResponse::Listed { seq, resource, result };
        }

        let fetched = listing::fetch(self.client.as_ref(), resource, search, pagination, &self.options);

        Self::handle_result("list", Some(seq), Some(resource), fetched, |result| {
            self.cache.insert(resource, search, pagination, result.clone());
            tracing::debug!(seq = seq, rows = result.data.len(), count = ?result.count, "listing fetched");
            WorkerResponse::Listed { seq, resource, result }
        })
    }

    fn handle_mutate(&self, resource: Resource, mutation: &Mutation) -> WorkerResponse {
        let applied = mutation.apply(self.client.as_ref(), resource);

        Self::handle_result("mutate", None, Some(resource), applied, |()| {
            for family in invalidation_family(resource) {
                self.cache.invalidate(family);
            }
            WorkerResponse::Mutated {
                resource,
                ids: mutation.ids(),
                deleted: mutation.is_delete(),
            }
        })
    }

    fn handle_stats(&self) -> WorkerResponse {
        Self::handle_result(
            "stats",
            None,
            None,
            listing::fetch_stats(self.client.as_ref()),
            WorkerResponse::Stats,
        )
    }

    /// Attaches the parent trace context from a message to the current thread.
    ///
    /// Returns a guard that must be held for the duration of the operation.
    fn attach_parent_trace_context(message: &WorkerMessage) -> Option<opentelemetry::ContextGuard> {
        use opentelemetry::trace::{SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState};

        let trace_context = message.trace_context()?;
        let trace_id = TraceId::from_hex(&trace_context.trace_id).ok()?;
        let span_id = SpanId::from_hex(&trace_context.parent_span_id).ok()?;

        let span_context = SpanContext::new(trace_id, span_id, TraceFlags::SAMPLED, true, TraceState::default());
        let otel_context = opentelemetry::Context::current().with_remote_span_context(span_context);

        Some(otel_context.attach())
    }

    /// Processes one message synchronously and returns its response.
    pub fn handle_message(&self, message: WorkerMessage) -> WorkerResponse {
        let _context_guard = Self::attach_parent_trace_context(&message);

        let span = tracing::debug_span!("worker_handle_message", message_type = ?message);
        let _guard = span.entered();

        match message {
            WorkerMessage::List {
                seq,
                resource,
                search,
                pagination,
                ..
            } => self.handle_list(seq, resource, search.as_deref(), pagination),

            WorkerMessage::Mutate { resource, mutation, .. } => self.handle_mutate(resource, &mutation),

            WorkerMessage::Stats { .. } => self.handle_stats(),
        }
    }
}

/// Background thread running a [`QueryWorker`].
///
/// Messages are processed in the order they are sent. Nothing cancels a
/// request already in flight; stale answers are filtered by sequence number on
/// the receiving side. Dropping the handle closes the request channel and
/// joins the thread.
pub struct WorkerHandle {
    sender: Option<Sender<WorkerMessage>>,
    responses: Receiver<WorkerResponse>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Spawns the worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Worker`] if the thread cannot be spawned.
    pub fn spawn(worker: QueryWorker) -> Result<Self> {
        let (sender, requests) = crossbeam_channel::unbounded::<WorkerMessage>();
        let (replies, responses) = crossbeam_channel::unbounded::<WorkerResponse>();

        let thread = std::thread::Builder::new()
            .name("equilink-query-worker".to_string())
            .spawn(move || {
                tracing::debug!("query worker started");
                for message in requests {
                    let response = worker.handle_message(message);
                    if replies.send(response).is_err() {
                        break;
                    }
                }
                tracing::debug!("query worker stopped");
            })
            .map_err(|e| AdminError::Worker(format!("failed to spawn worker: {e}")))?;

        Ok(Self {
            sender: Some(sender),
            responses,
            thread: Some(thread),
        })
    }

    /// Queues a message for the worker.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Worker`] if the worker thread has exited.
    pub fn post(&self, message: WorkerMessage) -> Result<()> {
        self.sender
            .as_ref()
            .ok_or_else(|| AdminError::Worker("worker is shut down".to_string()))?
            .send(message)
            .map_err(|_| AdminError::Worker("worker channel closed".to_string()))
    }

    /// Next response, waiting at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Worker`] if the worker thread has exited.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<WorkerResponse>> {
        match self.responses.recv_timeout(timeout) {
            Ok(response) => Ok(Some(response)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(AdminError::Worker("worker channel closed".to_string())),
        }
    }

    /// Every response already available, without waiting.
    #[must_use]
    pub fn drain(&self) -> Vec<WorkerResponse> {
        self.responses.try_iter().collect()
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        drop(self.sender.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("query worker panicked");
            }
        }
    }
}
