//! End-to-end tests of the record store: filtering, grouping and their interaction.

use std::sync::Arc;

use horizon_grid::model::FilterOutcome;
use horizon_grid::prelude::*;
use parking_lot::Mutex;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Six records alternating between type "A" (odd ids) and "B" (even ids).
fn records() -> Vec<Record> {
    (1..=6)
        .map(|i: i64| {
            Record::new(
                i,
                [
                    ("type", FieldValue::from(if i % 2 == 0 { "B" } else { "A" })),
                    ("size", FieldValue::Int(i)),
                ],
            )
        })
        .collect()
}

fn six_records() -> Store {
    Store::with_records(StoreConfig::default(), records())
}

fn ids(records: &[Record]) -> Vec<String> {
    records.iter().map(|r| r.id().to_string()).collect()
}

fn header(store: &Store, value: &str) -> Record {
    store
        .get_by_id(format!("group-header-{value}"))
        .expect("group header exists")
}

fn count_events(signal: &Signal<StoreEvent>) -> Arc<Mutex<Vec<StoreAction>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let captured = events.clone();
    signal.connect(move |event| captured.lock().push(event.action));
    events
}

#[test]
fn test_filter_idempotence() {
    init_tracing();
    let mut store = six_records();
    let changes = count_events(&store.signals().change);

    store.filter(CollectionFilter::new("type", "A"));
    assert!(store.is_filtered());
    assert_eq!(changes.lock().len(), 1);

    store.filter(CollectionFilter::new("type", "A"));
    assert!(store.is_filtered());
    assert_eq!(changes.lock().len(), 1);
    assert_eq!(ids(&store.records()), vec!["1", "3", "5"]);
}

#[test]
fn test_disabled_filter_on_unfiltered_store_is_a_noop() {
    let mut store = six_records();
    let changes = count_events(&store.signals().change);
    let outcome = store.filter(CollectionFilter::new("type", "A").disabled(true));
    assert!(matches!(outcome, FilterOutcome::Unchanged));
    assert!(!store.is_filtered());
    assert!(changes.lock().is_empty());
}

#[test]
fn test_tree_filter_keeps_ancestors() {
    init_tracing();
    let mut store = Store::new(StoreConfig::default().tree(true));
    store
        .load_json(
            r#"[
                {"id": 1, "name": "root", "children": [
                    {"id": 2, "name": "child", "children": [
                        {"id": 3, "name": "grandchild"},
                        {"id": 4, "name": "sibling"}
                    ]},
                    {"id": 5, "name": "uncle"}
                ]},
                {"id": 6, "name": "stranger"}
            ]"#,
        )
        .unwrap();

    store.filter_by(|record| record.get("name") == FieldValue::from("grandchild"));
    assert_eq!(ids(&store.records()), vec!["1", "2", "3"]);

    let child = store.get_by_id(2).unwrap();
    assert_eq!(ids(&child.children()), vec!["3"]);

    store.clear_filters(true);
    assert_eq!(ids(&store.records()), vec!["1", "2", "3", "4", "5", "6"]);
}

#[test]
fn test_group_headers_are_stable_across_regrouping() {
    let mut store = six_records();
    store.group("type", GroupOptions::new().ascending(true)).unwrap();
    let a = header(&store, "A");
    let b = header(&store, "B");

    store.group("type", GroupOptions::new().ascending(true)).unwrap();
    assert!(header(&store, "A").ptr_eq(&a));
    assert!(header(&store, "B").ptr_eq(&b));
}

#[test]
fn test_header_visibility_follows_children() {
    let mut store = six_records();
    store.group_by("type").unwrap();

    for limit in 0..=6 {
        store.set_filters([CollectionFilter::new("size", limit).operator(FilterOperator::Le)]);
        for value in ["A", "B"] {
            let group = header(&store, value);
            let passing = group
                .unfiltered_group_children()
                .iter()
                .any(|child| !store.is_filtered_out(child));
            assert_eq!(!store.is_filtered_out(&group), passing, "group {value} at size <= {limit}");
        }
    }
}

#[test]
fn test_collapse_round_trip_restores_order() {
    let mut store = six_records();
    store.group_by("type").unwrap();
    let a = header(&store, "A");
    let members = ids(&a.unfiltered_group_children());
    let visible = ids(&store.records());

    assert!(store.toggle_collapse(&a, Some(true)).unwrap());
    assert_eq!(ids(&store.records()), vec!["group-header-A", "group-header-B", "2", "4", "6"]);

    assert!(store.toggle_collapse(&a, Some(false)).unwrap());
    assert_eq!(ids(&a.unfiltered_group_children()), members);
    assert_eq!(ids(&store.records()), visible);
}

#[test]
fn test_batch_suspension_is_counted() {
    let mut store = six_records();
    let filters = count_events(&store.signals().filter);

    store.suspend_filter_on_update();
    store.suspend_filter_on_update();
    store.suspend_filter_on_update();
    assert!(matches!(store.filter(CollectionFilter::new("type", "B")), FilterOutcome::Deferred));

    assert!(store.resume_filter_on_update(false).unwrap().is_none());
    assert!(store.resume_filter_on_update(false).unwrap().is_none());
    assert!(filters.lock().is_empty());
    assert_eq!(store.count(), 6);

    let outcome = store.resume_filter_on_update(false).unwrap();
    assert!(matches!(outcome, Some(FilterOutcome::Applied(_))));
    assert_eq!(ids(&store.records()), vec!["2", "4", "6"]);
    assert_eq!(filters.lock().len(), 1);

    assert!(matches!(store.resume_filter_on_update(false), Err(Error::UnbalancedResume)));
}

#[test]
fn test_grouped_and_filtered_sequence() {
    init_tracing();
    let mut store = six_records();
    let refreshes = count_events(&store.signals().refresh);

    store.group_by("type").unwrap();
    store.filter(CollectionFilter::new("size", 2).operator(FilterOperator::Le));

    assert_eq!(ids(&store.records()), vec!["group-header-A", "1", "group-header-B", "2"]);
    for value in ["A", "B"] {
        let group = header(&store, value);
        assert_eq!(group.group_children().len(), 1);
        assert_eq!(group.unfiltered_group_children().len(), 3);
    }
    assert_eq!(*refreshes.lock(), vec![StoreAction::Sort, StoreAction::Group, StoreAction::Filter]);
}

#[test]
fn test_store_from_configuration() {
    let config = GridConfig::from_toml_str(
        r#"
        [store]
        use_group_footers = true
        "#,
    )
    .unwrap();
    let mut store = Store::with_records(config.store, records());
    store.group_by("type").unwrap();

    let a = header(&store, "A");
    assert_eq!(a.child_count(), 4);
    assert!(store.records()[4].is_group_footer());
}
