mod common;

use common::{at, category, customers, subscribers, two_by_two};
use equilink_admin::client::{MemoryBackend, Operation};
use equilink_admin::domain::{PaginationRange, Record, Resource};
use equilink_admin::listing::{self, ListOptions, ListPlan};
use proptest::prelude::*;

proptest! {
    #[test]
    fn page_never_exceeds_window_and_count_is_total(
        rows in 0usize..40,
        from in 0u64..45,
        len in 1u64..20,
    ) {
        let backend = customers(rows);
        let range = PaginationRange::new(from, from + len - 1).unwrap();
        let plan = ListPlan::for_resource(Resource::Customers);

        let result = listing::list(&backend, &plan, None, Some(range), &ListOptions::default()).unwrap();

        prop_assert!(result.data.len() as u64 <= range.len());
        prop_assert_eq!(result.count, Some(rows as u64));
        let expected = (rows as u64).saturating_sub(from).min(range.len());
        prop_assert_eq!(result.data.len() as u64, expected);
    }

    #[test]
    fn exclusive_end_resources_stay_within_window(rows in 0usize..30, page in 0u64..5) {
        let backend = MemoryBackend::new();
        let events = (0..rows)
            .map(|i| Record::new(format!("e{i}"), at(i as i64)).with_field("title", format!("Clinic {i}")))
            .collect();
        backend.seed(Resource::Events, events).unwrap();

        let range = PaginationRange::for_page(page, 8);
        let plan = ListPlan::for_resource(Resource::Events);
        let result = listing::list(&backend, &plan, None, Some(range), &ListOptions::default()).unwrap();

        prop_assert!(result.data.len() as u64 <= range.len());
        prop_assert_eq!(result.count, Some(rows as u64));
    }
}

#[test]
fn pages_are_newest_first_and_disjoint() {
    let backend = customers(20);
    let plan = ListPlan::for_resource(Resource::Customers);
    let options = ListOptions::default();

    let first = listing::list(&backend, &plan, None, Some(PaginationRange::for_page(0, 8)), &options).unwrap();
    let second = listing::list(&backend, &plan, None, Some(PaginationRange::for_page(1, 8)), &options).unwrap();

    assert_eq!(first.data[0].id, "cus-19");
    assert!(first
        .data
        .iter()
        .all(|r| second.data.iter().all(|s| s.id != r.id)));
}

#[test]
fn subscribers_list_without_a_search_filter() {
    let backend = subscribers(10);
    let plan = ListPlan::for_resource(Resource::Subscribers);

    let result = listing::list(
        &backend,
        &plan,
        Some("user-3"),
        Some(PaginationRange::for_page(0, 8)),
        &ListOptions::default(),
    )
    .unwrap();

    assert_eq!(result.data.len(), 8);
    assert_eq!(result.count, Some(10));
    assert_eq!(result.data[0].str_field("user_id"), Some("user-9"));
}

#[test]
fn category_fan_out_is_one_child_query_per_parent() {
    let backend = two_by_two();
    let result = listing::list_categories(
        &backend,
        None,
        Some(PaginationRange::for_page(0, 8)),
        &ListOptions::default(),
    )
    .unwrap();

    assert_eq!(result.data.len(), 2);
    assert_eq!(backend.call_count(Operation::Select, Resource::BusinessSubCategories), 2);
    for parent in &result.data {
        let children = parent.children();
        assert_eq!(children.len(), 2);
        assert!(children
            .iter()
            .all(|c| c.str_field("category_id") == Some(parent.id.as_str())));
    }
}

#[test]
fn fan_out_is_scoped_to_the_visible_page() {
    let backend = two_by_two();
    backend
        .seed(
            Resource::BusinessCategories,
            (3..12).map(|i| category(&format!("c{i}"), &format!("Trade {i}"), 100 + i)).collect(),
        )
        .unwrap();

    let result = listing::list_categories(
        &backend,
        None,
        Some(PaginationRange::for_page(0, 4)),
        &ListOptions::default(),
    )
    .unwrap();

    assert_eq!(result.data.len(), 4);
    assert_eq!(result.count, Some(11));
    assert_eq!(backend.call_count(Operation::Select, Resource::BusinessSubCategories), 4);
    // The newest page holds only the childless trades.
    assert!(result.data.iter().all(|p| p.children().is_empty()));
}

#[test]
fn category_listing_reports_backend_failure() {
    let backend = two_by_two();
    backend.fail_next_request("connection reset");

    let err = listing::list_categories(&backend, None, None, &ListOptions::default()).unwrap_err();
    assert!(err.is_remote());
    assert_eq!(backend.call_count(Operation::Select, Resource::BusinessSubCategories), 0);
}

#[test]
fn search_is_case_insensitive_and_unpaginated() {
    let backend = MemoryBackend::new();
    let mut rows: Vec<Record> = (0..12)
        .map(|i| category(&format!("f{i}"), &format!("Farrier Co {i}"), i))
        .collect();
    rows.push(category("x1", "FARRIERS UNITED", 50));
    rows.push(category("x2", "Feed store", 51));
    backend.seed(Resource::BusinessCategories, rows).unwrap();

    let result = listing::list_categories(
        &backend,
        Some("farrier"),
        Some(PaginationRange::new(0, 7).unwrap()),
        &ListOptions::default(),
    )
    .unwrap();

    // Thirteen matches despite an eight-row window.
    assert_eq!(result.data.len(), 13);
    assert!(result.data.iter().all(|r| r
        .str_field("name")
        .is_some_and(|n| n.to_lowercase().contains("farrier"))));
}

#[test]
fn paginated_search_option_applies_the_window() {
    let backend = MemoryBackend::new();
    backend
        .seed(
            Resource::Posts,
            (0..12)
                .map(|i| Record::new(format!("p{i}"), at(i)).with_field("title", format!("Show jumping {i}")))
                .collect(),
        )
        .unwrap();
    let plan = ListPlan::for_resource(Resource::Posts);
    let options = ListOptions { paginate_search: true };

    let result = listing::list(&backend, &plan, Some("JUMPING"), Some(PaginationRange::for_page(0, 8)), &options)
        .unwrap();
    assert_eq!(result.data.len(), 8);
    assert_eq!(result.count, Some(12));
}

#[test]
fn ilike_resources_keep_pagination_while_searching() {
    let backend = MemoryBackend::new();
    backend
        .seed(
            Resource::Services,
            (0..10)
                .map(|i| Record::new(format!("sv{i}"), at(i)).with_field("title", format!("Hoof trim {i}")))
                .collect(),
        )
        .unwrap();
    let plan = ListPlan::for_resource(Resource::Services);

    let result = listing::list(
        &backend,
        &plan,
        Some("hoof"),
        Some(PaginationRange::for_page(0, 8)),
        &ListOptions::default(),
    )
    .unwrap();
    assert!(result.data.len() < 10);
    assert_eq!(result.count, Some(10));
}

#[test]
fn businesses_embed_their_category_name() {
    let backend = two_by_two();
    backend
        .seed(
            Resource::Businesses,
            vec![Record::new("b1", at(10))
                .with_field("name", "Smith & Sons")
                .with_field("category_id", "c1")],
        )
        .unwrap();

    let plan = ListPlan::for_resource(Resource::Businesses);
    let result = listing::list(&backend, &plan, None, None, &ListOptions::default()).unwrap();
    let embedded = result.data[0].get("business_categories").unwrap();
    assert_eq!(embedded["name"], "Farriers");
}

#[test]
fn category_name_trims_and_reports_missing() {
    let backend = two_by_two();
    assert_eq!(
        listing::category_name(&backend, "  c2 ").unwrap().as_deref(),
        Some("Saddlery")
    );
    assert_eq!(listing::category_name(&backend, "nope").unwrap(), None);
}
