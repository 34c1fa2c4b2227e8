//! Event handling and state transition logic.
//!
//! This module implements the event handler that processes user input, timer
//! events and worker responses, translating them into [`GridState`] changes
//! and action sequences.
//!
//! # Event Types
//!
//! - **Paging**: `Load`, `SetPage`, `SetPageSize`
//! - **Search**: `SearchInput`, `DebounceElapsed`
//! - **View**: `SetFilter`, `ToggleSort`, `ToggleSortKey`, `ToggleExpand`
//! - **Selection**: `ToggleRowSelected`, `ToggleAllSelected`, `SelectNone`
//! - **Writes**: `Submit`, `DeleteSelected`, `DeleteRow`, `DeleteChild`
//! - **Lifecycle**: `Navigate`, `Reset`, `LoadStats`, `DismissNotifications`
//! - **Worker**: `WorkerResponse`
//!
//! # Example
//!
//! ```rust
//! use equilink_admin::app::{handle_event, Event, GridState};
//! use equilink_admin::domain::Resource;
//! use std::time::Duration;
//!
//! let mut state = GridState::new(Resource::PostCategories, 8, Duration::from_millis(300));
//! let (render, actions) = handle_event(&mut state, &Event::Load)?;
//! assert!(render);
//! assert_eq!(actions.len(), 1);
//! # Ok::<(), equilink_admin::AdminError>(())
//! ```

use std::collections::BTreeSet;

use crate::app::modes::Notification;
use crate::app::{Action, GridState};
use crate::domain::error::Result;
use crate::domain::Resource;
use crate::listing::Mutation;
use crate::worker::{WorkerMessage, WorkerResponse};

/// Events triggered by user input, timers or worker responses.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Fetches the current page.
    Load,
    /// Moves to a zero-based page index and refetches.
    SetPage(u64),
    /// Changes the page size, returns to page 0 and refetches.
    SetPageSize(u64),

    /// New contents of the search box.
    SearchInput(String),
    /// The debounce timer armed for this generation fired.
    DebounceElapsed(u64),

    /// Replaces the accepted values of a facet column; empty clears it.
    SetFilter {
        column: String,
        values: BTreeSet<String>,
    },
    ToggleSort(String),
    /// Multi-column sort: toggles one key and keeps the others.
    ToggleSortKey(String),
    ToggleExpand(String),

    ToggleRowSelected(String),
    ToggleAllSelected,
    SelectNone,

    /// Form submission for the grid's resource or a related one.
    Submit {
        resource: Resource,
        mutation: Mutation,
    },
    /// Batch delete of the selection.
    DeleteSelected,
    DeleteRow(String),
    /// Deletes one subcategory shown under an expanded parent.
    DeleteChild(String),

    /// Switches the grid to another resource with default state.
    Navigate(Resource),
    /// Back to defaults for the current resource.
    Reset,
    LoadStats,
    DismissNotifications,

    /// Wraps a response from the query worker.
    WorkerResponse(WorkerResponse),
}

fn delete_action(resource: Resource, ids: Vec<String>) -> Action {
    Action::PostToWorker(WorkerMessage::mutate(resource, Mutation::Delete { ids }))
}

/// Processes an event, mutates grid state, and returns actions to execute.
///
/// The boolean is `true` when the view needs re-rendering.
///
/// # Errors
///
/// Reserved for transitions that cannot be applied; every current transition
/// succeeds and reports problems as notifications instead.
#[allow(clippy::too_many_lines)]
pub fn handle_event(state: &mut GridState, event: &Event) -> Result<(bool, Vec<Action>)> {
    let _span = tracing::debug_span!("handle_event", event_type = ?event).entered();

    match event {
        Event::Load => Ok((true, vec![Action::PostToWorker(state.request_page())])),

        Event::SetPage(index) => {
            state.page_index = *index;
            Ok((true, vec![Action::PostToWorker(state.request_page())]))
        }

        Event::SetPageSize(size) => {
            state.page_size = (*size).max(1);
            state.page_index = 0;
            Ok((true, vec![Action::PostToWorker(state.request_page())]))
        }

        Event::SearchInput(text) => {
            state.search_query.clone_from(text);
            state.debounce_generation += 1;

            if text.trim().is_empty() {
                tracing::debug!("search cleared, resetting view");
                state.active_search = None;
                state.column_filters.clear();
                state.sort.clear();
                state.page_index = 0;
                return Ok((true, vec![Action::PostToWorker(state.request_page())]));
            }

            Ok((
                true,
                vec![Action::ScheduleDebounce {
                    generation: state.debounce_generation,
                    delay: state.debounce,
                }],
            ))
        }

        Event::DebounceElapsed(generation) => {
            if *generation != state.debounce_generation {
                tracing::debug!(generation = generation, current = state.debounce_generation, "debounce superseded");
                return Ok((false, vec![]));
            }
            state.active_search = Some(state.search_query.trim().to_string());
            state.page_index = 0;
            Ok((true, vec![Action::PostToWorker(state.request_page())]))
        }

        Event::SetFilter { column, values } => {
            state.set_filter(column, values);
            Ok((true, vec![]))
        }

        Event::ToggleSort(column) => {
            state.toggle_sort(column);
            Ok((true, vec![]))
        }

        Event::ToggleSortKey(column) => {
            state.toggle_sort_key(column);
            Ok((true, vec![]))
        }

        Event::ToggleExpand(id) => {
            state.toggle_expand(id);
            Ok((true, vec![]))
        }

        Event::ToggleRowSelected(id) => {
            state.selection.toggle(id);
            Ok((true, vec![]))
        }

        Event::ToggleAllSelected => {
            state.toggle_all_selected();
            Ok((true, vec![]))
        }

        Event::SelectNone => {
            state.selection.clear();
            Ok((true, vec![]))
        }

        Event::Submit { resource, mutation } => Ok((
            false,
            vec![Action::PostToWorker(WorkerMessage::mutate(*resource, mutation.clone()))],
        )),

        Event::DeleteSelected => {
            if state.selection.is_empty() {
                return Ok((false, vec![]));
            }
            Ok((false, vec![delete_action(state.resource, state.selection.ids())]))
        }

        Event::DeleteRow(id) => Ok((false, vec![delete_action(state.resource, vec![id.clone()])])),

        Event::DeleteChild(id) => Ok((
            false,
            vec![delete_action(Resource::BusinessSubCategories, vec![id.clone()])],
        )),

        Event::Navigate(resource) => {
            state.reset(*resource);
            Ok((true, vec![Action::PostToWorker(state.request_page())]))
        }

        Event::Reset => {
            state.reset(state.resource);
            Ok((true, vec![]))
        }

        Event::LoadStats => Ok((false, vec![Action::PostToWorker(WorkerMessage::stats())])),

        Event::DismissNotifications => {
            state.notifications.clear();
            Ok((true, vec![]))
        }

        Event::WorkerResponse(response) => handle_worker_response(state, response),
    }
}

fn handle_worker_response(state: &mut GridState, response: &WorkerResponse) -> Result<(bool, Vec<Action>)> {
    match response {
        WorkerResponse::Listed { seq, resource, result } => {
            let applied = state.apply_listed(*seq, *resource, result.clone());
            Ok((applied, vec![]))
        }

        WorkerResponse::Mutated { resource, ids, deleted } => {
            let message = if *deleted {
                format!("Deleted {} record(s)", ids.len())
            } else {
                "Saved successfully".to_string()
            };
            state.notifications.push(Notification::success(message));

            let affects_grid = *resource == state.resource || resource.parent() == Some(state.resource);
            if !affects_grid {
                return Ok((true, vec![]));
            }

            if *deleted && *resource == state.resource {
                if ids.len() > 1 {
                    state.selection.clear();
                } else {
                    for id in ids {
                        if state.selection.contains(id) {
                            state.selection.toggle(id);
                        }
                    }
                }
            }
            Ok((true, vec![Action::PostToWorker(state.request_page())]))
        }

        WorkerResponse::Stats(stats) => {
            state.stats = Some(*stats);
            Ok((true, vec![]))
        }

        WorkerResponse::Failed { seq, message, .. } => {
            if let Some(seq) = seq {
                if *seq != state.latest_seq {
                    tracing::debug!(seq = seq, "discarding stale failure");
                    return Ok((false, vec![]));
                }
                state.loading = false;
            }
            state.notifications.push(Notification::error(message.clone()));
            Ok((true, vec![]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{QueryResult, Record};
    use chrono::Utc;
    use std::time::Duration;

    fn state() -> GridState {
        GridState::new(Resource::BusinessCategories, 8, Duration::from_millis(300))
    }

    fn posted(actions: &[Action]) -> Vec<&WorkerMessage> {
        actions
            .iter()
            .filter_map(|a| match a {
                Action::PostToWorker(m) => Some(m),
                Action::ScheduleDebounce { .. } => None,
            })
            .collect()
    }

    #[test]
    fn typing_schedules_debounce_without_fetch() {
        let mut state = state();
        let (_, actions) = handle_event(&mut state, &Event::SearchInput("far".into())).unwrap();
        assert_eq!(
            actions,
            vec![Action::ScheduleDebounce {
                generation: 1,
                delay: Duration::from_millis(300)
            }]
        );
        assert!(state.active_search.is_none());
    }

    #[test]
    fn only_newest_debounce_fetches() {
        let mut state = state();
        handle_event(&mut state, &Event::SearchInput("far".into())).unwrap();
        handle_event(&mut state, &Event::SearchInput("farr".into())).unwrap();

        let (render, stale) = handle_event(&mut state, &Event::DebounceElapsed(1)).unwrap();
        assert!(!render);
        assert!(stale.is_empty());

        let (_, actions) = handle_event(&mut state, &Event::DebounceElapsed(2)).unwrap();
        match posted(&actions).as_slice() {
            [WorkerMessage::List { search, .. }] => assert_eq!(search.as_deref(), Some("farr")),
            other => panic!("unexpected actions: {other:?}"),
        }
    }

    #[test]
    fn clearing_search_resets_filters_and_sort() {
        let mut state = state();
        state.toggle_sort("name");
        state.set_filter("is_featured", &BTreeSet::from(["Yes".to_string()]));
        state.active_search = Some("far".into());

        let (_, actions) = handle_event(&mut state, &Event::SearchInput(String::new())).unwrap();
        assert!(state.sort.is_empty());
        assert!(state.column_filters.is_empty());
        assert!(state.active_search.is_none());
        assert_eq!(posted(&actions).len(), 1);
    }

    #[test]
    fn facet_filter_never_refetches() {
        let mut state = state();
        let (_, actions) = handle_event(
            &mut state,
            &Event::SetFilter {
                column: "is_featured".into(),
                values: BTreeSet::from(["No".to_string()]),
            },
        )
        .unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn batch_delete_success_clears_selection_and_refetches() {
        let mut state = state();
        state.selection.insert("a");
        state.selection.insert("b");

        let (_, actions) = handle_event(&mut state, &Event::DeleteSelected).unwrap();
        assert!(matches!(
            posted(&actions).as_slice(),
            [WorkerMessage::Mutate { mutation: Mutation::Delete { ids }, .. }] if ids.len() == 2
        ));

        let response = WorkerResponse::Mutated {
            resource: Resource::BusinessCategories,
            ids: vec!["a".into(), "b".into()],
            deleted: true,
        };
        let (_, actions) = handle_event(&mut state, &Event::WorkerResponse(response)).unwrap();
        assert!(state.selection.is_empty());
        assert_eq!(posted(&actions).len(), 1);
    }

    #[test]
    fn child_delete_refetches_parent_grid() {
        let mut state = state();
        let response = WorkerResponse::Mutated {
            resource: Resource::BusinessSubCategories,
            ids: vec!["s1".into()],
            deleted: true,
        };
        let (_, actions) = handle_event(&mut state, &Event::WorkerResponse(response)).unwrap();
        assert_eq!(posted(&actions).len(), 1);
    }

    #[test]
    fn failure_keeps_loaded_rows() {
        let mut state = state();
        handle_event(&mut state, &Event::Load).unwrap();
        let seq = state.latest_seq;
        state.apply_listed(seq, Resource::BusinessCategories, QueryResult::new(Some(1), vec![Record::new("a", Utc::now())]));

        handle_event(&mut state, &Event::Load).unwrap();
        let failure = WorkerResponse::Failed {
            seq: Some(state.latest_seq),
            resource: Some(Resource::BusinessCategories),
            message: "Remote error: timeout".into(),
            remote: true,
        };
        handle_event(&mut state, &Event::WorkerResponse(failure)).unwrap();

        assert_eq!(state.result.as_ref().map(|r| r.data.len()), Some(1));
        assert_eq!(state.notifications.len(), 1);
        assert!(!state.loading);
    }

    #[test]
    fn navigate_resets_but_keeps_sequence_monotonic() {
        let mut state = state();
        handle_event(&mut state, &Event::Load).unwrap();
        let before = state.latest_seq;
        state.selection.insert("a");

        handle_event(&mut state, &Event::Navigate(Resource::Posts)).unwrap();
        assert_eq!(state.resource, Resource::Posts);
        assert!(state.selection.is_empty());
        assert!(state.latest_seq > before);
    }
}
