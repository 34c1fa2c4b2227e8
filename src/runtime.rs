//! Dashboard runtime: runs the event handler and executes its actions.
//!
//! [`Dashboard`] owns the [`GridState`], the query worker handle, and the
//! pending debounce timers. Front ends feed it [`Event`]s with
//! [`Dashboard::dispatch`] and call [`Dashboard::pump`] (or
//! [`Dashboard::settle`]) to route worker responses and elapsed timers back
//! through the handler.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app::{handle_event, Action, Event, GridState};
use crate::cache::QueryCache;
use crate::client::ResourceClient;
use crate::domain::{Resource, Result};
use crate::listing::ListOptions;
use crate::ui::viewmodel::{default_columns, GridViewModel};
use crate::worker::{QueryWorker, WorkerHandle};
use crate::Config;

/// Debounce timer armed by the handler.
#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    deadline: Instant,
    generation: u64,
}

/// One interactive grid wired to a background query worker.
pub struct Dashboard {
    state: GridState,
    worker: WorkerHandle,
    timers: Vec<PendingTimer>,
    in_flight: usize,
}

impl Dashboard {
    /// Builds the grid for `resource` and starts the worker.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Worker`](crate::AdminError::Worker) if the worker
    /// thread cannot be spawned.
    pub fn new(client: Arc<dyn ResourceClient>, config: &Config, resource: Resource) -> Result<Self> {
        let cache = Arc::new(QueryCache::new(config.cache_capacity));
        let options = ListOptions {
            paginate_search: config.paginate_search,
        };
        let worker = WorkerHandle::spawn(QueryWorker::new(client, cache, options))?;

        tracing::info!(%resource, page_size = config.page_size, "dashboard started");
        Ok(Self {
            state: GridState::new(
                resource,
                config.page_size,
                Duration::from_millis(config.search_debounce_ms),
            ),
            worker,
            timers: Vec::new(),
            in_flight: 0,
        })
    }

    #[must_use]
    pub const fn state(&self) -> &GridState {
        &self.state
    }

    /// Renderable grid with the resource's default columns.
    #[must_use]
    pub fn viewmodel(&self) -> GridViewModel {
        self.state.compute_viewmodel(default_columns(self.state.resource))
    }

    /// Runs one event through the handler and executes the resulting actions.
    ///
    /// Returns whether the view needs re-rendering.
    ///
    /// # Errors
    ///
    /// Returns an error if the handler fails or the worker has exited.
    pub fn dispatch(&mut self, event: Event) -> Result<bool> {
        let (render, actions) = handle_event(&mut self.state, &event)?;
        self.execute(actions)?;
        Ok(render)
    }

    fn execute(&mut self, actions: Vec<Action>) -> Result<()> {
        for action in actions {
            match action {
                Action::PostToWorker(message) => {
                    self.worker.post(message)?;
                    self.in_flight += 1;
                }
                Action::ScheduleDebounce { generation, delay } => {
                    self.timers.push(PendingTimer {
                        deadline: Instant::now() + delay,
                        generation,
                    });
                }
            }
        }
        Ok(())
    }

    fn fire_due_timers(&mut self) -> Result<bool> {
        let now = Instant::now();
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.timers)
            .into_iter()
            .partition(|t| t.deadline <= now);
        self.timers = pending;

        let mut render = false;
        for timer in due {
            render |= self.dispatch(Event::DebounceElapsed(timer.generation))?;
        }
        Ok(render)
    }

    /// Processes elapsed timers and at most one worker response, waiting up
    /// to `timeout` for something to happen.
    ///
    /// Returns whether the view needs re-rendering.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker has exited.
    pub fn pump(&mut self, timeout: Duration) -> Result<bool> {
        if self.fire_due_timers()? {
            return Ok(true);
        }

        let wait = self
            .timers
            .iter()
            .map(|t| t.deadline.saturating_duration_since(Instant::now()))
            .min()
            .map_or(timeout, |next| next.min(timeout));

        match self.worker.recv_timeout(wait)? {
            Some(response) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.dispatch(Event::WorkerResponse(response))
            }
            None => self.fire_due_timers(),
        }
    }

    /// Pumps until no request or timer is pending, or `timeout` elapses.
    ///
    /// Returns `true` when the dashboard went idle.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker has exited.
    pub fn settle(&mut self, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        while self.in_flight > 0 || !self.timers.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::warn!(in_flight = self.in_flight, timers = self.timers.len(), "dashboard did not settle");
                return Ok(false);
            }
            self.pump(remaining)?;
        }
        Ok(true)
    }
}
