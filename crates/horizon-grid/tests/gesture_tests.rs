//! End-to-end tests of the drag and resize state machines on an in-memory element host.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use horizon_grid::gesture::{DragState, HeadlessDom};
use horizon_grid::prelude::*;
use parking_lot::Mutex;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Drag
// ============================================================================

/// A grid body: a 400x200 outer element holding one 20px high row per record.
struct GridDom {
    dom: Arc<HeadlessDom>,
    body: ElementId,
    rows: Vec<(ElementId, RecordId)>,
}

impl GridDom {
    fn new(store: &Store) -> Self {
        let dom = Arc::new(HeadlessDom::new());
        let body = dom.create_element(None, Rect::new(0.0, 0.0, 400.0, 200.0));
        dom.add_class(body, "b-outer");
        let rows = store
            .records()
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let layout = Rect::new(0.0, index as f32 * 20.0, 400.0, 20.0);
                let row = dom.create_element(Some(body), layout);
                dom.add_class(row, "b-grid-row");
                (row, record.id().clone())
            })
            .collect();
        Self { dom, body, rows }
    }

    fn row(&self, id: impl Into<RecordId>) -> ElementId {
        let id = id.into();
        self.rows
            .iter()
            .find(|(_, record)| *record == id)
            .map(|(row, _)| *row)
            .expect("row rendered")
    }

    fn record_at(&self, element: ElementId) -> Option<RecordId> {
        self.rows
            .iter()
            .find(|(row, _)| *row == element)
            .map(|(_, id)| id.clone())
    }
}

/// Rows of the grid are both the drag source and the drop zone.
struct RowReorder {
    store: Arc<Mutex<Store>>,
    grid: Arc<GridDom>,
    drops: AtomicUsize,
}

impl DragSource for RowReorder {
    fn drag_root_element(&self) -> ElementId {
        self.grid.body
    }

    fn before_drag(&self, drag: &mut DragContext) -> bool {
        let Some(id) = drag.element().and_then(|row| self.grid.record_at(row)) else {
            return false;
        };
        let store = self.store.lock();
        match store.get_by_id(id) {
            Some(record) if !record.is_special_row() => {
                drag.set("records", vec![record]);
                true
            }
            _ => false,
        }
    }
}

impl Droppable for RowReorder {
    fn drop_root_element(&self) -> ElementId {
        self.grid.body
    }

    fn droppable_selector(&self) -> Option<&str> {
        Some(".b-grid-row")
    }

    fn drag_drop(&self, drag: &mut DragContext) {
        self.drops.fetch_add(1, Ordering::SeqCst);
        let Some(before) = drag.target_element().and_then(|row| self.grid.record_at(row)) else {
            return;
        };
        let Ok(Some(records)) = drag.get::<Vec<Record>>("records") else {
            return;
        };
        let mut store = self.store.lock();
        if let Some(before) = store.get_by_id(before) {
            store.move_records(&records, Some(&before)).expect("move within store");
        }
    }
}

fn grouped_store() -> Store {
    let mut store = Store::with_records(
        StoreConfig::default(),
        (1..=4).map(|i: i64| Record::new(i, [("type", if i <= 2 { "A" } else { "B" })])),
    );
    store.group_by("type").unwrap();
    store
}

fn ids(records: &[Record]) -> Vec<String> {
    records.iter().map(|r| r.id().to_string()).collect()
}

#[test]
fn test_drag_threshold_is_inclusive() {
    init_tracing();
    let store = grouped_store();
    let grid = Arc::new(GridDom::new(&store));
    let source = Arc::new(RowReorder {
        store: Arc::new(Mutex::new(store)),
        grid: grid.clone(),
        drops: AtomicUsize::new(0),
    });
    let row = grid.row(1);
    let registry = Arc::new(DroppableRegistry::new());

    let mut drag = DragContext::new(
        source,
        PointerEvent::mouse_down(100.0, 30.0).target(row),
        grid.dom.clone(),
        registry,
    )
    .with_config(DragConfig::default().threshold(5.0));
    assert!(drag.begin());

    drag.pointer_move(PointerEvent::mouse_move(104.0, 30.0).target(row));
    assert_eq!(drag.state(), DragState::Init);
    drag.pointer_move(PointerEvent::mouse_move(100.0, 34.0).target(row));
    assert_eq!(drag.state(), DragState::Init);

    drag.pointer_move(PointerEvent::mouse_move(105.0, 30.0).target(row));
    assert_eq!(drag.state(), DragState::Dragging);
}

#[test]
fn test_drag_abort_cleans_up_once() {
    let store = grouped_store();
    let grid = Arc::new(GridDom::new(&store));
    let source = Arc::new(RowReorder {
        store: Arc::new(Mutex::new(store)),
        grid: grid.clone(),
        drops: AtomicUsize::new(0),
    });
    let row = grid.row(1);
    let cleanups = Arc::new(AtomicUsize::new(0));

    let mut drag = DragContext::new(
        source,
        PointerEvent::mouse_down(100.0, 30.0).target(row),
        grid.dom.clone(),
        Arc::new(DroppableRegistry::new()),
    );
    let counter = cleanups.clone();
    drag.add_cleaner(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    drag.begin();
    drag.pointer_move(PointerEvent::mouse_move(100.0, 60.0).target(row));
    assert!(grid.dom.has_class(grid.body, "b-dragging"));

    drag.abort();
    drag.abort();
    drop(drag);

    assert_eq!(cleanups.load(Ordering::SeqCst), 1);
    assert!(!grid.dom.has_class(grid.body, "b-dragging"));
}

#[test]
fn test_drag_row_into_other_group() {
    init_tracing();
    let store = grouped_store();
    assert_eq!(
        ids(&store.records()),
        vec!["group-header-A", "1", "2", "group-header-B", "3", "4"]
    );
    let grid = Arc::new(GridDom::new(&store));
    let store = Arc::new(Mutex::new(store));
    let reorder = Arc::new(RowReorder {
        store: store.clone(),
        grid: grid.clone(),
        drops: AtomicUsize::new(0),
    });
    let registry = Arc::new(DroppableRegistry::new());
    registry.register(grid.body, reorder.clone());

    let from = grid.row(1);
    let onto = grid.row(4);
    let mut drag = DragContext::new(
        reorder.clone(),
        PointerEvent::mouse_down(100.0, 30.0).target(from),
        grid.dom.clone(),
        registry,
    );
    assert!(drag.begin());
    drag.pointer_move(PointerEvent::mouse_move(100.0, 70.0).target(grid.row("group-header-B")));
    drag.pointer_move(PointerEvent::mouse_move(100.0, 110.0).target(onto));
    assert!(drag.valid());
    assert_eq!(drag.target_element(), Some(onto));

    drag.end(PointerEvent::mouse_up(100.0, 110.0).target(onto));
    assert_eq!(drag.state(), DragState::Dropped);

    // The source is its own drop zone, so dropping is left to it.
    assert_eq!(reorder.drops.load(Ordering::SeqCst), 0);
    reorder.drag_drop(&mut drag);
    assert_eq!(reorder.drops.load(Ordering::SeqCst), 1);

    let store = store.lock();
    assert_eq!(store.get_by_id(1).unwrap().get("type"), FieldValue::from("B"));
    assert_eq!(
        ids(&store.records()),
        vec!["group-header-A", "2", "group-header-B", "3", "1", "4"]
    );
}

#[test]
fn test_drag_of_group_header_is_vetoed() {
    let store = grouped_store();
    let grid = Arc::new(GridDom::new(&store));
    let source = Arc::new(RowReorder {
        store: Arc::new(Mutex::new(store)),
        grid: grid.clone(),
        drops: AtomicUsize::new(0),
    });
    let mut drag = DragContext::new(
        source,
        PointerEvent::mouse_down(100.0, 10.0).target(grid.row("group-header-A")),
        grid.dom.clone(),
        Arc::new(DroppableRegistry::new()),
    );
    assert!(!drag.begin());
}

// ============================================================================
// Resize
// ============================================================================

#[derive(Default)]
struct SizeLog(Mutex<Vec<(Edge, Option<f32>, f32)>>);

impl ResizeListener for SizeLog {
    fn resize(&self, context: &mut ResizeContext, _event: &PointerEvent) {
        self.0.lock().push((context.edge, context.new_width, context.new_x));
    }
}

/// An element of width 100 at x = 50 inside a wide outer element.
fn resizable() -> (Arc<HeadlessDom>, ElementId, ElementId) {
    let dom = Arc::new(HeadlessDom::new());
    let outer = dom.create_element(None, Rect::new(0.0, 0.0, 800.0, 100.0));
    let bar = dom.create_element(Some(outer), Rect::new(0.0, 0.0, 100.0, 20.0));
    dom.set_translate_x(bar, 50.0);
    (dom, outer, bar)
}

#[test]
fn test_resize_right_edge_sign() {
    init_tracing();
    let (dom, outer, bar) = resizable();
    let log = Arc::new(SizeLog::default());
    let input = InputState::new(true);
    let mut helper = ResizeHelper::new(ResizeConfig::default(), dom.clone(), outer, &input);
    helper.add_listener(log.clone());

    assert!(helper.pointer_down(&PointerEvent::mouse_down(149.0, 10.0).target(bar)));
    helper.pointer_move(&PointerEvent::mouse_move(169.0, 10.0).target(bar));
    helper.pointer_up(&PointerEvent::mouse_up(169.0, 10.0).target(bar));

    let bounds = dom.bounds(bar);
    assert_eq!(bounds.width(), 120.0);
    assert_eq!(bounds.left(), 50.0);
    assert_eq!(*log.0.lock(), vec![(Edge::Right, Some(120.0), 50.0)]);
}

#[test]
fn test_resize_left_edge_sign() {
    let (dom, outer, bar) = resizable();
    let log = Arc::new(SizeLog::default());
    let input = InputState::new(true);
    let mut helper = ResizeHelper::new(ResizeConfig::default(), dom.clone(), outer, &input);
    helper.add_listener(log.clone());

    assert!(helper.pointer_down(&PointerEvent::mouse_down(51.0, 10.0).target(bar)));
    helper.pointer_move(&PointerEvent::mouse_move(71.0, 10.0).target(bar));
    helper.pointer_up(&PointerEvent::mouse_up(71.0, 10.0).target(bar));

    let bounds = dom.bounds(bar);
    assert_eq!(bounds.width(), 80.0);
    assert_eq!(bounds.left(), 70.0);
    assert_eq!(bounds.right(), 150.0);
    assert_eq!(*log.0.lock(), vec![(Edge::Left, Some(80.0), 70.0)]);
}

#[test]
fn test_resize_from_configuration() {
    let config = GridConfig::from_json_str(
        r#"{"resize": {"max_width": 110.0, "right_handle": true, "left_handle": false}}"#,
    )
    .unwrap();
    let (dom, outer, bar) = resizable();
    let mut helper = ResizeHelper::new(config.resize, dom.clone(), outer, &InputState::new(true));

    assert!(!helper.pointer_down(&PointerEvent::mouse_down(51.0, 10.0).target(bar)));
    assert!(helper.pointer_down(&PointerEvent::mouse_down(149.0, 10.0).target(bar)));
    helper.pointer_move(&PointerEvent::mouse_move(189.0, 10.0).target(bar));
    helper.pointer_up(&PointerEvent::mouse_up(189.0, 10.0).target(bar));
    assert_eq!(dom.offset_size(bar).width, 110.0);
}
