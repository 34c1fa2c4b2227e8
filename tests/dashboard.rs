mod common;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use common::{customers, subscribers, two_by_two};
use equilink_admin::app::{handle_event, NotificationKind};
use equilink_admin::cli::{run, Cli};
use equilink_admin::client::{MemoryBackend, Operation};
use equilink_admin::domain::{PaginationRange, QueryResult, Record, Resource};
use equilink_admin::worker::WorkerResponse;
use equilink_admin::{Config, Dashboard, Event, GridState};

const SETTLE: Duration = Duration::from_secs(5);

fn config() -> Config {
    Config {
        search_debounce_ms: 20,
        ..Config::default()
    }
}

fn loaded(backend: &Arc<MemoryBackend>, resource: Resource) -> Dashboard {
    let mut dashboard = Dashboard::new(backend.clone(), &config(), resource).unwrap();
    dashboard.dispatch(Event::Load).unwrap();
    assert!(dashboard.settle(SETTLE).unwrap());
    dashboard
}

#[test]
fn load_fills_the_first_page() {
    let backend = Arc::new(customers(12));
    let dashboard = loaded(&backend, Resource::Customers);

    let vm = dashboard.viewmodel();
    assert_eq!(vm.rows.len(), 8);
    assert_eq!(vm.page.total, Some(12));
    assert_eq!(vm.page.label, "Page 1 of 2");
    assert_eq!(vm.rows[0].id, "cus-11");
}

#[test]
fn subscribers_show_user_and_business() {
    let backend = Arc::new(subscribers(3));
    let dashboard = loaded(&backend, Resource::Subscribers);

    let vm = dashboard.viewmodel();
    assert_eq!(vm.columns, vec!["user_id", "business_id", "created_at"]);
    assert_eq!(vm.rows[0].cells[..2], ["user-2".to_string(), "b1".to_string()]);
}

#[test]
fn only_the_last_keystroke_fetches() {
    let backend = Arc::new(customers(12));
    let mut dashboard = loaded(&backend, Resource::Customers);
    backend.reset_calls();

    dashboard.dispatch(Event::SearchInput("ri".into())).unwrap();
    dashboard.dispatch(Event::SearchInput("RIDER 1".into())).unwrap();
    assert!(dashboard.settle(SETTLE).unwrap());

    assert_eq!(backend.call_count(Operation::Select, Resource::Customers), 1);
    let state = dashboard.state();
    assert_eq!(state.active_search.as_deref(), Some("RIDER 1"));
    // Rider 1, Rider 10, Rider 11
    assert_eq!(state.total(), Some(3));
}

#[test]
fn clearing_search_refetches_immediately() {
    let backend = Arc::new(customers(12));
    let mut dashboard = loaded(&backend, Resource::Customers);
    dashboard.dispatch(Event::SearchInput("rider 1".into())).unwrap();
    assert!(dashboard.settle(SETTLE).unwrap());

    dashboard.dispatch(Event::SearchInput(String::new())).unwrap();
    assert!(dashboard.settle(SETTLE).unwrap());

    assert_eq!(dashboard.state().active_search, None);
    assert_eq!(dashboard.state().total(), Some(12));
}

#[test]
fn facet_filter_narrows_the_page_without_refetching() {
    let backend = Arc::new(customers(12));
    let mut dashboard = loaded(&backend, Resource::Customers);
    backend.reset_calls();

    let values: BTreeSet<String> = ["France".to_string()].into();
    dashboard
        .dispatch(Event::SetFilter {
            column: "country".into(),
            values,
        })
        .unwrap();

    assert!(backend.calls().is_empty());
    let vm = dashboard.viewmodel();
    // cus-11, cus-9, cus-7, cus-5 on the newest page
    assert_eq!(vm.rows.len(), 4);
    assert_eq!(vm.page.total, Some(12));
}

#[test]
fn expanding_a_category_reveals_its_children() {
    let backend = Arc::new(two_by_two());
    let mut dashboard = loaded(&backend, Resource::BusinessCategories);
    backend.reset_calls();

    dashboard.dispatch(Event::ToggleExpand("c1".into())).unwrap();

    assert!(backend.calls().is_empty());
    let vm = dashboard.viewmodel();
    assert_eq!(vm.rows.len(), 4);
    assert!(vm.rows.iter().filter(|r| r.depth == 1).all(|r| r.id == "s1" || r.id == "s2"));
}

#[test]
fn batch_delete_clears_selection_and_refetches() {
    let backend = Arc::new(customers(12));
    let mut dashboard = loaded(&backend, Resource::Customers);

    dashboard.dispatch(Event::ToggleRowSelected("cus-11".into())).unwrap();
    dashboard.dispatch(Event::ToggleRowSelected("cus-9".into())).unwrap();
    dashboard.dispatch(Event::DeleteSelected).unwrap();
    assert!(dashboard.settle(SETTLE).unwrap());

    let state = dashboard.state();
    assert!(state.selection.is_empty());
    assert_eq!(state.total(), Some(10));
    assert_eq!(backend.call_count(Operation::Delete, Resource::Customers), 1);
    assert!(state
        .notifications
        .iter()
        .any(|n| n.kind == NotificationKind::Success));
}

#[test]
fn failed_fetch_keeps_previous_rows() {
    let backend = Arc::new(customers(12));
    let mut dashboard = loaded(&backend, Resource::Customers);

    backend.fail_next_request("gateway timeout");
    dashboard.dispatch(Event::SetPage(1)).unwrap();
    assert!(dashboard.settle(SETTLE).unwrap());

    let state = dashboard.state();
    assert!(!state.loading);
    assert_eq!(state.result.as_ref().map(|r| r.data.len()), Some(8));
    assert!(state
        .notifications
        .iter()
        .any(|n| n.kind == NotificationKind::Error && n.message.contains("gateway timeout")));
}

#[test]
fn out_of_order_responses_keep_the_latest_page() {
    let mut state = GridState::new(Resource::Customers, 8, Duration::from_millis(300));
    handle_event(&mut state, &Event::Load).unwrap();
    handle_event(&mut state, &Event::SetPage(1)).unwrap();

    let page = |id: &str| QueryResult::new(Some(12), vec![Record::new(id, common::at(0))]);
    let newest = WorkerResponse::Listed {
        seq: state.latest_seq,
        resource: Resource::Customers,
        result: page("page-2"),
    };
    let stale = WorkerResponse::Listed {
        seq: state.latest_seq - 1,
        resource: Resource::Customers,
        result: page("page-1"),
    };

    handle_event(&mut state, &Event::WorkerResponse(newest)).unwrap();
    let (render, _) = handle_event(&mut state, &Event::WorkerResponse(stale)).unwrap();

    assert!(!render);
    assert_eq!(state.result.as_ref().unwrap().data[0].id, "page-2");
    assert_eq!(state.pagination(), PaginationRange::for_page(1, 8));
}

/// Fixture and config in a scratch dir; traces go to `<dir>/data`.
fn cli_workspace(backend: &MemoryBackend, settings: &str) -> (tempfile::TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let fixture = dir.path().join("fixture.json");
    let config_path = dir.path().join("config.toml");
    backend.save_to_file(&fixture).unwrap();
    let data_dir = dir.path().join("data");
    std::fs::write(&config_path, format!("data_dir = {:?}\n{settings}", data_dir.display().to_string())).unwrap();
    (dir, fixture, config_path)
}

fn cli(config_path: &Path, fixture: &Path, args: &[&str]) -> Cli {
    let mut argv = vec![
        "equilink-admin",
        "--config",
        config_path.to_str().unwrap(),
        "--fixture",
        fixture.to_str().unwrap(),
    ];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

#[test]
fn cli_lists_categories_from_a_fixture() {
    let (dir, fixture, config_path) = cli_workspace(&two_by_two(), "search_debounce_ms = 10\n");

    let cli = cli(&config_path, &fixture, &["--plain", "categories", "--search", "farr"]);
    assert!(run(&cli).unwrap());
    assert!(dir.path().join("data").is_dir());
}

#[test]
fn cli_reports_missing_record() {
    let (_dir, fixture, config_path) = cli_workspace(&two_by_two(), "");

    let err = run(&cli(&config_path, &fixture, &["profile", "ghost"])).unwrap_err();
    assert!(err.to_string().contains("not found"));
}

#[test]
fn cli_refuses_to_search_subscribers() {
    let (_dir, fixture, config_path) = cli_workspace(&subscribers(4), "");

    let err = run(&cli(&config_path, &fixture, &["list", "subscribers", "--search", "rider"])).unwrap_err();
    assert!(err.to_string().contains("cannot be searched"));
}

#[test]
fn cli_sort_keys_accumulate() {
    let (_dir, fixture, config_path) = cli_workspace(&customers(6), "");

    let cli = cli(
        &config_path,
        &fixture,
        &["--plain", "list", "customers", "--sort", "country", "--sort", "name:desc"],
    );
    assert!(run(&cli).unwrap());
}
