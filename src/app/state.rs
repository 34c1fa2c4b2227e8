//! Grid state and view model computation.
//!
//! [`GridState`] is the single source of truth for one resource grid: the page
//! window, client-side sort and facet filters, row selection, expanded parents,
//! the search box, and the last accepted list result. It lives for one page
//! view and resets to defaults on navigation.
//!
//! # Derived rows
//!
//! [`GridState::visible_rows`] derives what is displayed from the loaded page:
//!
//! ```text
//! loaded page → facet filter → client sort → expansion (children at depth 1)
//! ```
//!
//! Facet filters and sorting only ever touch the page already loaded. They
//! never refetch and never change the reported total.
//!
//! # Example
//!
//! ```rust
//! use equilink_admin::app::GridState;
//! use equilink_admin::domain::Resource;
//! use std::time::Duration;
//!
//! let state = GridState::new(Resource::BusinessCategories, 8, Duration::from_millis(300));
//! let range = state.pagination();
//! assert_eq!((range.from, range.to), (0, 7));
//! ```

use fuzzy_matcher::skim::SkimMatcherV2;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use super::modes::{Notification, SortColumn, SortDirection};
use crate::domain::{PaginationRange, QueryResult, Record, Resource, SelectionSet};
use crate::listing::{DashboardStats, ListPlan};
use crate::ui::viewmodel::{self, EmptyState, GridRow, GridViewModel, PageInfo};
use crate::worker::WorkerMessage;

/// One row of the derived view, borrowing from the loaded result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleRow<'a> {
    pub record: &'a Record,
    /// 0 for parents, 1 for revealed children.
    pub depth: usize,
}

/// State of one resource grid.
#[derive(Debug, Clone)]
pub struct GridState {
    pub resource: Resource,

    /// Zero-based page index.
    pub page_index: u64,
    pub page_size: u64,

    /// Ordered client-side sort; the first entry is the primary key.
    pub sort: Vec<SortColumn>,

    /// Accepted display values per column. A column absent from the map is unfiltered.
    pub column_filters: BTreeMap<String, BTreeSet<String>>,

    pub selection: SelectionSet,

    /// Parents whose pre-fetched children are revealed.
    pub expanded: BTreeSet<String>,

    /// Text currently in the search box.
    pub search_query: String,

    /// Search term committed by the debounce and sent with fetches.
    pub active_search: Option<String>,

    /// Last accepted list result, replaced wholesale by each fetch.
    pub result: Option<QueryResult>,

    /// Sequence number of the newest list request; older answers are dropped.
    pub latest_seq: u64,

    /// Bumped on every keystroke; only the newest debounce fires a fetch.
    pub debounce_generation: u64,
    pub debounce: Duration,

    /// A list request is in flight.
    pub loading: bool,

    pub stats: Option<DashboardStats>,

    pub notifications: Vec<Notification>,

    default_page_size: u64,
}

impl GridState {
    /// Creates a grid on page 0 with nothing loaded.
    #[must_use]
    pub fn new(resource: Resource, page_size: u64, debounce: Duration) -> Self {
        let page_size = page_size.max(1);
        Self {
            resource,
            page_index: 0,
            page_size,
            sort: Vec::new(),
            column_filters: BTreeMap::new(),
            selection: SelectionSet::default(),
            expanded: BTreeSet::new(),
            search_query: String::new(),
            active_search: None,
            result: None,
            latest_seq: 0,
            debounce_generation: 0,
            debounce,
            loading: false,
            stats: None,
            notifications: Vec::new(),
            default_page_size: page_size,
        }
    }

    /// Back to defaults for `resource`, as on navigation.
    ///
    /// The sequence counter keeps increasing so answers to requests issued
    /// before the reset are still recognized as stale.
    pub fn reset(&mut self, resource: Resource) {
        let latest_seq = self.latest_seq;
        let debounce_generation = self.debounce_generation + 1;
        *self = Self::new(resource, self.default_page_size, self.debounce);
        self.latest_seq = latest_seq;
        self.debounce_generation = debounce_generation;
    }

    /// Current page window.
    #[must_use]
    pub fn pagination(&self) -> PaginationRange {
        PaginationRange::for_page(self.page_index, self.page_size)
    }

    /// Issues a new list request for the current search and window.
    pub fn request_page(&mut self) -> WorkerMessage {
        self.latest_seq += 1;
        self.loading = true;
        tracing::debug!(
            seq = self.latest_seq,
            resource = %self.resource,
            page = self.page_index,
            search = ?self.active_search,
            "requesting page"
        );
        WorkerMessage::list(
            self.latest_seq,
            self.resource,
            self.active_search.clone(),
            Some(self.pagination()),
        )
    }

    /// Accepts a list result if it answers the newest request.
    ///
    /// Returns `false` (and leaves the state untouched) for stale answers.
    pub fn apply_listed(&mut self, seq: u64, resource: Resource, result: QueryResult) -> bool {
        if seq != self.latest_seq || resource != self.resource {
            tracing::debug!(seq = seq, latest = self.latest_seq, "discarding stale list response");
            return false;
        }
        self.result = Some(result);
        self.loading = false;
        true
    }

    /// Total rows reported by the last accepted result.
    #[must_use]
    pub fn total(&self) -> Option<u64> {
        self.result.as_ref().and_then(|r| r.count)
    }

    /// Number of pages for the reported total, at least one.
    #[must_use]
    pub fn page_count(&self) -> u64 {
        self.total()
            .map_or(1, |total| total.div_ceil(self.page_size).max(1))
    }

    /// Cycles the sort of `column` through ascending, descending and unsorted.
    pub fn toggle_sort(&mut self, column: &str) {
        let current = self
            .sort
            .iter()
            .find(|s| s.column == column)
            .map(|s| s.direction);

        self.sort = match current {
            None => vec![SortColumn {
                column: column.to_string(),
                direction: SortDirection::Ascending,
            }],
            Some(direction) => direction
                .next()
                .map(|next| {
                    vec![SortColumn {
                        column: column.to_string(),
                        direction: next,
                    }]
                })
                .unwrap_or_default(),
        };
    }

    /// Like [`toggle_sort`](Self::toggle_sort), but keeps the other sort keys.
    ///
    /// A new column is appended as the lowest-priority key; an existing one
    /// advances in place and drops out after descending.
    pub fn toggle_sort_key(&mut self, column: &str) {
        let Some(idx) = self.sort.iter().position(|s| s.column == column) else {
            self.sort.push(SortColumn {
                column: column.to_string(),
                direction: SortDirection::Ascending,
            });
            return;
        };
        match self.sort[idx].direction.next() {
            Some(next) => self.sort[idx].direction = next,
            None => {
                self.sort.remove(idx);
            }
        }
    }

    /// Sets the accepted values of a facet; an empty set clears it.
    pub fn set_filter(&mut self, column: &str, values: &BTreeSet<String>) {
        if values.is_empty() {
            self.column_filters.remove(column);
        } else {
            self.column_filters.insert(column.to_string(), values.clone());
        }
    }

    pub fn toggle_expand(&mut self, id: &str) {
        if !self.expanded.remove(id) {
            self.expanded.insert(id.to_string());
        }
    }

    /// Selects every displayed parent row, or clears the selection when all
    /// of them are already selected.
    pub fn toggle_all_selected(&mut self) {
        let ids: Vec<String> = self.filtered_sorted().iter().map(|r| r.id.clone()).collect();
        if !ids.is_empty() && ids.iter().all(|id| self.selection.contains(id)) {
            self.selection.clear();
        } else {
            for id in &ids {
                self.selection.insert(id);
            }
        }
    }

    fn passes_filters(&self, record: &Record) -> bool {
        self.column_filters
            .iter()
            .all(|(column, accepted)| accepted.contains(&record.display(column)))
    }

    /// Loaded parents after facet filtering and client sorting.
    fn filtered_sorted(&self) -> Vec<&Record> {
        let Some(result) = &self.result else {
            return Vec::new();
        };

        let mut rows: Vec<&Record> = result.data.iter().filter(|r| self.passes_filters(r)).collect();

        if !self.sort.is_empty() {
            rows.sort_by(|a, b| {
                self.sort
                    .iter()
                    .map(|key| {
                        let ordering = a.compare_by(b, &key.column);
                        match key.direction {
                            SortDirection::Ascending => ordering,
                            SortDirection::Descending => ordering.reverse(),
                        }
                    })
                    .find(|o| o.is_ne())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        rows
    }

    /// Displayed rows: loaded page, facet filter, client sort, then expansion.
    #[must_use]
    pub fn visible_rows(&self) -> Vec<VisibleRow<'_>> {
        let mut rows = Vec::new();
        for parent in self.filtered_sorted() {
            rows.push(VisibleRow {
                record: parent,
                depth: 0,
            });
            if self.expanded.contains(&parent.id) {
                rows.extend(parent.children().iter().map(|child| VisibleRow {
                    record: child,
                    depth: 1,
                }));
            }
        }
        rows
    }

    /// Builds the renderable grid for `columns`.
    #[must_use]
    pub fn compute_viewmodel(&self, columns: &[&str]) -> GridViewModel {
        let _span = tracing::debug_span!("compute_viewmodel", resource = %self.resource).entered();

        let search_column = ListPlan::for_resource(self.resource).search_column;
        let matcher = self.active_search.as_ref().map(|_| SkimMatcherV2::default());

        let rows: Vec<GridRow> = self
            .visible_rows()
            .into_iter()
            .map(|row| {
                let cells: Vec<String> = columns.iter().map(|c| row.record.display(c)).collect();
                let highlight_ranges = match (&matcher, &self.active_search) {
                    (Some(m), Some(term)) => columns
                        .iter()
                        .position(|c| Some(*c) == search_column)
                        .map(|idx| {
                            compute_highlight_ranges(&cells[idx], term, m)
                                .into_iter()
                                .map(|(start, end)| (idx, start, end))
                                .collect()
                        })
                        .unwrap_or_default(),
                    _ => Vec::new(),
                };

                GridRow {
                    id: row.record.id.clone(),
                    depth: row.depth,
                    cells,
                    is_selected: self.selection.contains(&row.record.id),
                    is_expanded: self.expanded.contains(&row.record.id),
                    has_children: !row.record.children().is_empty(),
                    highlight_ranges,
                }
            })
            .collect();

        let empty_state = rows.is_empty().then(|| self.compute_empty_state());
        let page_count = self.page_count();

        GridViewModel {
            title: viewmodel::title(self.resource).to_string(),
            columns: columns.iter().map(ToString::to_string).collect(),
            rows,
            page: PageInfo {
                index: self.page_index,
                page_count,
                page_size: self.page_size,
                total: self.total(),
                label: format!("Page {} of {page_count}", self.page_index + 1),
            },
            selected_count: self.selection.len(),
            search: self.active_search.clone(),
            loading: self.loading,
            empty_state,
            notifications: self.notifications.clone(),
        }
    }

    fn compute_empty_state(&self) -> EmptyState {
        if self.loading {
            return EmptyState {
                message: "Loading...".to_string(),
                subtitle: String::new(),
            };
        }
        match &self.active_search {
            Some(term) => EmptyState {
                message: "No results".to_string(),
                subtitle: format!("Nothing matches \"{term}\""),
            },
            None => EmptyState {
                message: "No records".to_string(),
                subtitle: format!("{} is empty", viewmodel::title(self.resource)),
            },
        }
    }
}

/// Character ranges of `text` matched by `pattern`, coalesced into runs.
fn compute_highlight_ranges(text: &str, pattern: &str, matcher: &SkimMatcherV2) -> Vec<(usize, usize)> {
    use fuzzy_matcher::FuzzyMatcher;

    let Some((_score, indices)) = matcher.fuzzy_indices(text, pattern.trim()) else {
        return Vec::new();
    };

    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for idx in indices {
        match ranges.last_mut() {
            Some((_, end)) if *end == idx => *end = idx + 1,
            _ => ranges.push((idx, idx + 1)),
        }
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};

    fn loaded(records: Vec<Record>, count: u64) -> GridState {
        let mut state = GridState::new(Resource::BusinessCategories, 8, Duration::from_millis(300));
        let message = state.request_page();
        let WorkerMessage::List { seq, .. } = message else {
            unreachable!()
        };
        assert!(state.apply_listed(seq, Resource::BusinessCategories, QueryResult::new(Some(count), records)));
        state
    }

    fn category(id: &str, name: &str, featured: bool, age_minutes: i64) -> Record {
        Record::new(id, Utc::now() - ChronoDuration::minutes(age_minutes))
            .with_field("name", name)
            .with_field("is_featured", featured)
    }

    #[test]
    fn sort_cycles_through_three_states() {
        let mut state = loaded(vec![], 0);
        state.toggle_sort("name");
        assert_eq!(state.sort[0].direction, SortDirection::Ascending);
        state.toggle_sort("name");
        assert_eq!(state.sort[0].direction, SortDirection::Descending);
        state.toggle_sort("name");
        assert!(state.sort.is_empty());
    }

    #[test]
    fn sort_keys_accumulate_in_priority_order() {
        let mut state = loaded(
            vec![
                category("c1", "Saddlery", true, 1),
                category("c2", "Farriers", false, 2),
                category("c3", "Bedding", true, 3),
            ],
            3,
        );
        state.toggle_sort_key("is_featured");
        state.toggle_sort_key("name");
        state.toggle_sort_key("is_featured");

        let keys: Vec<_> = state.sort.iter().map(|s| (s.column.as_str(), s.direction)).collect();
        assert_eq!(
            keys,
            vec![("is_featured", SortDirection::Descending), ("name", SortDirection::Ascending)]
        );
        let ids: Vec<_> = state.visible_rows().iter().map(|r| r.record.id.as_str()).collect();
        assert_eq!(ids, vec!["c3", "c1", "c2"]);

        state.toggle_sort_key("is_featured");
        assert_eq!(state.sort.len(), 1);
        assert_eq!(state.sort[0].column, "name");
    }

    #[test]
    fn facet_filter_narrows_page_without_touching_total() {
        let mut state = loaded(
            vec![category("a", "Vets", true, 1), category("b", "Farriers", false, 2)],
            20,
        );
        state.set_filter("is_featured", &BTreeSet::from(["Yes".to_string()]));

        let ids: Vec<_> = state.visible_rows().iter().map(|r| r.record.id.clone()).collect();
        assert_eq!(ids, vec!["a"]);
        assert_eq!(state.total(), Some(20));
    }

    #[test]
    fn expansion_interleaves_children() {
        let mut parent = category("a", "Vets", true, 1);
        parent.sub_categories = Some(vec![Record::new("s1", Utc::now()), Record::new("s2", Utc::now())]);
        let mut state = loaded(vec![parent, category("b", "Farriers", false, 2)], 2);

        assert_eq!(state.visible_rows().len(), 2);
        state.toggle_expand("a");
        let depths: Vec<_> = state.visible_rows().iter().map(|r| r.depth).collect();
        assert_eq!(depths, vec![0, 1, 1, 0]);
    }

    #[test]
    fn stale_sequence_is_ignored() {
        let mut state = loaded(vec![category("a", "Vets", true, 1)], 1);
        let first = state.latest_seq;
        state.request_page();

        assert!(!state.apply_listed(first, Resource::BusinessCategories, QueryResult::default()));
        assert_eq!(state.result.as_ref().map(|r| r.data.len()), Some(1));
    }

    #[test]
    fn toggle_all_selects_then_clears() {
        let mut state = loaded(vec![category("a", "Vets", true, 1), category("b", "Farriers", false, 2)], 2);
        state.toggle_all_selected();
        assert_eq!(state.selection.ids(), vec!["a", "b"]);
        state.toggle_all_selected();
        assert!(state.selection.is_empty());
    }

    #[test]
    fn page_count_rounds_up() {
        let state = loaded(vec![], 17);
        assert_eq!(state.page_count(), 3);
        assert_eq!(state.compute_viewmodel(&["name"]).page.label, "Page 1 of 3");
    }

    #[test]
    fn highlight_ranges_coalesce_runs() {
        let matcher = SkimMatcherV2::default();
        assert_eq!(compute_highlight_ranges("Farriers", "farr", &matcher), vec![(0, 4)]);
    }
}
