//! An in-memory element host.
//!
//! [`HeadlessDom`] keeps a flat list of elements with a parent link, a layout
//! rectangle, a translation and a class set. It is enough to drive the
//! gesture state machines without a renderer, e.g. in tests or in a
//! server-side simulation of user input.
//!
//! Selectors are compound class selectors (`.row.selected`), element
//! handles (`#3`) or `*`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use horizon_grid_core::{Point, Rect, Size};
use indexmap::{IndexMap, IndexSet};
use parking_lot::{Mutex, RwLock};

use super::host::{ElementHost, ElementId, ExtremalSize, MonitorId, MonitorRequest, ScrollMonitor};

#[derive(Debug, Clone, Default)]
struct Node {
    parent: Option<ElementId>,
    layout: Rect,
    translate: Point,
    scroll: Point,
    classes: IndexSet<String>,
    extremal: HashMap<ExtremalSize, f32>,
}

#[derive(Debug, Default)]
struct DomState {
    nodes: IndexMap<ElementId, Node>,
    next_id: u64,
    layouts_forced: usize,
    swallowed_clicks: Vec<Duration>,
}

/// In-memory [`ElementHost`].
#[derive(Debug)]
pub struct HeadlessDom {
    state: RwLock<DomState>,
    body: ElementId,
    hoverable: bool,
}

impl Default for HeadlessDom {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDom {
    /// A document with an empty 1000x1000 body.
    pub fn new() -> Self {
        let mut state = DomState::default();
        let body = ElementId::from_raw(0);
        state.nodes.insert(
            body,
            Node {
                layout: Rect::new(0.0, 0.0, 1000.0, 1000.0),
                ..Node::default()
            },
        );
        state.next_id = 1;
        Self {
            state: RwLock::new(state),
            body,
            hoverable: true,
        }
    }

    /// Simulate a device without hover (touch screen).
    pub fn without_hover(mut self) -> Self {
        self.hoverable = false;
        self
    }

    /// Create an element below `parent` (the body for `None`) with `layout`.
    pub fn create_element(&self, parent: Option<ElementId>, layout: Rect) -> ElementId {
        let mut state = self.state.write();
        let id = ElementId::from_raw(state.next_id);
        state.next_id += 1;
        state.nodes.insert(
            id,
            Node {
                parent: Some(parent.unwrap_or(self.body)),
                layout,
                ..Node::default()
            },
        );
        id
    }

    /// Replace the layout rectangle of `element`.
    pub fn set_layout(&self, element: ElementId, layout: Rect) {
        self.with_node(element, |node| node.layout = layout);
    }

    /// Set both translation axes.
    pub fn set_translate(&self, element: ElementId, translate: Point) {
        self.with_node(element, |node| node.translate = translate);
    }

    /// Set the scroll position of `element`.
    pub fn set_scroll(&self, element: ElementId, scroll: Point) {
        self.with_node(element, |node| node.scroll = scroll);
    }

    /// Give `element` a size limit.
    pub fn set_extremal_size(&self, element: ElementId, which: ExtremalSize, value: f32) {
        self.with_node(element, |node| {
            node.extremal.insert(which, value);
        });
    }

    /// Classes of `element` in insertion order.
    pub fn classes(&self, element: ElementId) -> Vec<String> {
        self.state
            .read()
            .nodes
            .get(&element)
            .map(|node| node.classes.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// How often a synchronous layout was forced.
    pub fn layouts_forced(&self) -> usize {
        self.state.read().layouts_forced
    }

    /// Click swallow windows requested so far.
    pub fn swallowed_clicks(&self) -> Vec<Duration> {
        self.state.read().swallowed_clicks.clone()
    }

    fn with_node(&self, element: ElementId, update: impl FnOnce(&mut Node)) {
        if let Some(node) = self.state.write().nodes.get_mut(&element) {
            update(node);
        }
    }

    fn node<T>(&self, element: ElementId, read: impl FnOnce(&Node) -> T) -> Option<T> {
        self.state.read().nodes.get(&element).map(read)
    }
}

impl ElementHost for HeadlessDom {
    fn bounds(&self, element: ElementId) -> Rect {
        self.node(element, |node| node.layout.offset(node.translate.x, node.translate.y))
            .unwrap_or_default()
    }

    fn offset_size(&self, element: ElementId) -> Size {
        self.node(element, |node| node.layout.size).unwrap_or_default()
    }

    fn offset_position(&self, element: ElementId) -> Point {
        self.node(element, |node| node.layout.origin).unwrap_or_default()
    }

    fn translate(&self, element: ElementId) -> Point {
        self.node(element, |node| node.translate).unwrap_or_default()
    }

    fn set_translate_x(&self, element: ElementId, x: f32) {
        self.with_node(element, |node| node.translate.x = x);
    }

    fn set_translate_y(&self, element: ElementId, y: f32) {
        self.with_node(element, |node| node.translate.y = y);
    }

    fn set_width(&self, element: ElementId, width: f32) {
        self.with_node(element, |node| node.layout.size.width = width);
    }

    fn set_height(&self, element: ElementId, height: f32) {
        self.with_node(element, |node| node.layout.size.height = height);
    }

    fn extremal_size(&self, element: ElementId, which: ExtremalSize) -> Option<f32> {
        self.node(element, |node| node.extremal.get(&which).copied()).flatten()
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.node(element, |node| node.parent).flatten()
    }

    fn document_body(&self) -> ElementId {
        self.body
    }

    fn matches(&self, element: ElementId, selector: &str) -> bool {
        let selector = selector.trim();
        if selector == "*" {
            return self.state.read().nodes.contains_key(&element);
        }
        if let Some(raw) = selector.strip_prefix('#') {
            return raw.parse::<u64>().is_ok_and(|raw| element.as_raw() == raw);
        }
        let classes: Vec<&str> = selector.split('.').filter(|c| !c.is_empty()).collect();
        !classes.is_empty()
            && self
                .node(element, |node| classes.iter().all(|c| node.classes.contains(*c)))
                .unwrap_or(false)
    }

    fn element_from_point(&self, point: Point) -> Option<ElementId> {
        self.state
            .read()
            .nodes
            .iter()
            .rev()
            .find(|(_, node)| {
                let bounds = node.layout.offset(node.translate.x, node.translate.y);
                bounds.contains(point)
            })
            .map(|(id, _)| *id)
    }

    fn add_class(&self, element: ElementId, class: &str) {
        self.with_node(element, |node| {
            node.classes.insert(class.to_string());
        });
    }

    fn remove_class(&self, element: ElementId, class: &str) {
        self.with_node(element, |node| {
            node.classes.shift_remove(class);
        });
    }

    fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.node(element, |node| node.classes.contains(class)).unwrap_or(false)
    }

    fn scroll_offset(&self, element: ElementId) -> Point {
        self.node(element, |node| node.scroll).unwrap_or_default()
    }

    fn force_layout(&self, _element: ElementId) {
        self.state.write().layouts_forced += 1;
    }

    fn swallow_click(&self, within: Duration) {
        self.state.write().swallowed_clicks.push(within);
    }

    fn is_hoverable_device(&self) -> bool {
        self.hoverable
    }
}

/// A [`ScrollMonitor`] that only records what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingScrollMonitor {
    next_id: AtomicU64,
    active: Mutex<Vec<(MonitorId, MonitorRequest)>>,
}

impl RecordingScrollMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests currently being monitored.
    pub fn active(&self) -> Vec<MonitorRequest> {
        self.active.lock().iter().map(|(_, request)| *request).collect()
    }
}

impl ScrollMonitor for RecordingScrollMonitor {
    fn start_monitoring(&self, request: MonitorRequest) -> MonitorId {
        let id = MonitorId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.active.lock().push((id, request));
        id
    }

    fn stop_monitoring(&self, id: MonitorId) {
        self.active.lock().retain(|(active, _)| *active != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_queries() {
        let dom = HeadlessDom::new();
        let grid = dom.create_element(None, Rect::new(0.0, 0.0, 500.0, 300.0));
        let row = dom.create_element(Some(grid), Rect::new(0.0, 20.0, 500.0, 20.0));
        dom.add_class(grid, "b-grid");
        dom.add_class(row, "b-row");
        dom.add_class(row, "b-selected");

        assert!(dom.contains(grid, row));
        assert!(!dom.contains(row, grid));
        assert!(dom.matches(row, ".b-row.b-selected"));
        assert!(!dom.matches(row, ".b-row.b-grid"));
        assert!(dom.matches(row, &row.to_string()));
        assert_eq!(dom.closest(row, ".b-grid"), Some(grid));
        assert_eq!(dom.element_from_point(Point::new(10.0, 25.0)), Some(row));
        assert_eq!(dom.element_from_point(Point::new(10.0, 5.0)), Some(grid));
    }

    #[test]
    fn test_handle_selector() {
        let dom = HeadlessDom::new();
        let grid = dom.create_element(None, Rect::new(0.0, 0.0, 500.0, 300.0));
        let row = dom.create_element(Some(grid), Rect::new(0.0, 20.0, 500.0, 20.0));

        assert!(dom.matches(row, &format!("#{}", row.as_raw())));
        assert!(!dom.matches(row, &format!("#{}", grid.as_raw())));
        assert!(!dom.matches(row, "#row"));
        assert!(!dom.matches(row, "#-1"));
        assert_eq!(dom.closest(row, &grid.to_string()), Some(grid));
    }

    #[test]
    fn test_translate_moves_bounds() {
        let dom = HeadlessDom::new();
        let bar = dom.create_element(None, Rect::new(0.0, 0.0, 100.0, 20.0));
        dom.set_translate_x(bar, 50.0);
        assert_eq!(dom.bounds(bar), Rect::new(50.0, 0.0, 100.0, 20.0));
        assert_eq!(dom.offset_position(bar), Point::ZERO);
        dom.set_width(bar, 80.0);
        assert_eq!(dom.offset_size(bar), Size::new(80.0, 20.0));
    }

    #[test]
    fn test_recording_monitor() {
        let dom = HeadlessDom::new();
        let monitor = RecordingScrollMonitor::new();
        let id = monitor.start_monitoring(MonitorRequest {
            element: dom.document_body(),
            direction: Default::default(),
        });
        assert_eq!(monitor.active().len(), 1);
        monitor.stop_monitoring(id);
        assert!(monitor.active().is_empty());
    }
}
