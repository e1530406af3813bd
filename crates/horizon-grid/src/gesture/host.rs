//! The element layer the gesture state machines drive.
//!
//! Gestures never touch a concrete UI toolkit. They query geometry and
//! mutate classes, sizes and translations through an [`ElementHost`], and
//! request auto scrolling through a [`ScrollMonitor`]. A browser binding,
//! a native widget tree and the in-memory [`HeadlessDom`](super::HeadlessDom)
//! all implement the same contract.

use std::fmt;
use std::time::Duration;

use horizon_grid_core::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Opaque handle of an element owned by an [`ElementHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    /// Wrap a host-specific raw handle.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw handle.
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// CSS size limits an element may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtremalSize {
    MinWidth,
    MaxWidth,
    MinHeight,
    MaxHeight,
}

/// Geometry queries and mutations of a rendered element tree.
///
/// All rectangles and points are in client (viewport) coordinates.
pub trait ElementHost: Send + Sync {
    /// Bounding rectangle, translation included.
    fn bounds(&self, element: ElementId) -> Rect;

    /// Layout size (`offsetWidth`/`offsetHeight`).
    fn offset_size(&self, element: ElementId) -> Size {
        self.bounds(element).size
    }

    /// Layout position ignoring translation (`offsetLeft`/`offsetTop`).
    fn offset_position(&self, element: ElementId) -> Point;

    /// Current translation.
    fn translate(&self, element: ElementId) -> Point;

    fn set_translate_x(&self, element: ElementId, x: f32);

    fn set_translate_y(&self, element: ElementId, y: f32);

    fn set_width(&self, element: ElementId, width: f32);

    fn set_height(&self, element: ElementId, height: f32);

    /// A size limit set on the element itself, if any.
    fn extremal_size(&self, _element: ElementId, _which: ExtremalSize) -> Option<f32> {
        None
    }

    fn parent(&self, element: ElementId) -> Option<ElementId>;

    /// The top level element (`document.body`).
    fn document_body(&self) -> ElementId;

    /// Returns `true` if `selector` matches `element`.
    fn matches(&self, element: ElementId, selector: &str) -> bool;

    /// Topmost element at `point`.
    fn element_from_point(&self, point: Point) -> Option<ElementId>;

    fn add_class(&self, element: ElementId, class: &str);

    fn remove_class(&self, element: ElementId, class: &str);

    fn has_class(&self, element: ElementId, class: &str) -> bool;

    /// Add or remove `class`.
    fn toggle_class(&self, element: ElementId, class: &str, on: bool) {
        if on {
            self.add_class(element, class);
        } else {
            self.remove_class(element, class);
        }
    }

    /// Scroll position of a scrollable element.
    fn scroll_offset(&self, _element: ElementId) -> Point {
        Point::ZERO
    }

    /// Flush pending style changes so transitions start from the current state.
    fn force_layout(&self, _element: ElementId) {}

    /// Swallow the next click reaching the document within `within`.
    fn swallow_click(&self, _within: Duration) {}

    /// Whether the primary input device can hover.
    fn is_hoverable_device(&self) -> bool {
        true
    }

    /// Returns `true` if `element` is `ancestor` or below it.
    fn contains(&self, ancestor: ElementId, element: ElementId) -> bool {
        let mut node = Some(element);
        while let Some(current) = node {
            if current == ancestor {
                return true;
            }
            node = self.parent(current);
        }
        false
    }

    /// Nearest element from `element` upwards matching `selector`.
    fn closest(&self, element: ElementId, selector: &str) -> Option<ElementId> {
        let mut node = Some(element);
        while let Some(current) = node {
            if self.matches(current, selector) {
                return Some(current);
            }
            node = self.parent(current);
        }
        None
    }
}

/// Axes an auto scroll may move along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Horizontal,
    Vertical,
    #[default]
    Both,
}

/// Identifies a running scroll monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonitorId(pub u64);

/// What to monitor for auto scrolling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorRequest {
    /// The scrollable element.
    pub element: ElementId,
    pub direction: ScrollDirection,
}

/// One auto scroll step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollerAction {
    pub element: ElementId,
    pub dx: f32,
    pub dy: f32,
}

/// Scrolls containers while a gesture nears their edges.
///
/// The monitor reports each scroll step back to the gesture that requested
/// it (`DragContext::scrolled`, `ResizeHelper::scrolled`) so the gesture can
/// re-evaluate its last pointer position.
pub trait ScrollMonitor: Send + Sync {
    fn start_monitoring(&self, request: MonitorRequest) -> MonitorId;

    fn stop_monitoring(&self, id: MonitorId);
}
