//! Edge resizing of elements.
//!
//! A [`ResizeHelper`] turns pointer gestures on the edges of elements below
//! an outer element into live size and position updates. Edges are either
//! real handle elements (`handle_selector`) or virtual zones along the
//! element border, `handle_size` pixels wide.
//!
//! Dragging the right or bottom edge grows the element with a positive
//! delta. Dragging the left or top edge grows it with a negative delta and
//! translates the element so the opposite edge stays in place.
//!
//! Listeners observe the gesture through [`ResizeListener`]. A listener may
//! flag the [`ResizeContext`] invalid (a soft failure that only toggles a
//! class) or async, in which case the resize is only finalized once
//! [`ResizeHelper::finalize`] is called.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use horizon_grid_core::logging::targets;
use horizon_grid_core::{Point, Rect};
use serde::{Deserialize, Serialize};

use super::event::{Key, KeyEvent, MouseButton, PointerEvent, PointerKind};
use super::host::{
    ElementHost, ElementId, ExtremalSize, MonitorId, MonitorRequest, ScrollDirection, ScrollMonitor,
    ScrollerAction,
};
use super::input::InputState;

const HANDLE_CLASS: &str = "b-resize-handle";
const OVER_HANDLE_CLASS: &str = "b-over-resize-handle";

// ============================================================================
// Configuration
// ============================================================================

/// Axis along which elements are resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Horizontal,
    Vertical,
}

impl From<Direction> for ScrollDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Horizontal => ScrollDirection::Horizontal,
            Direction::Vertical => ScrollDirection::Vertical,
        }
    }
}

/// The element edge being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

/// Resize behavior switches. Sizes are in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    /// Distance the pointer must travel before the resize starts.
    pub drag_threshold: f32,
    pub handle_size: f32,
    /// Handle size used on devices that cannot hover.
    pub touch_handle_size: f32,
    /// Gap kept between two shrunk handles.
    pub reserved_space: f32,
    /// Shrink handles on elements too small to fit them.
    pub dynamic_handle_size: bool,
    pub min_width: f32,
    /// `0` means unlimited.
    pub max_width: f32,
    pub min_height: f32,
    /// `0` means unlimited.
    pub max_height: f32,
    pub left_handle: bool,
    pub right_handle: bool,
    pub top_handle: bool,
    pub bottom_handle: bool,
    /// Selector of real handle elements. Virtual zones are used when unset.
    pub handle_selector: Option<String>,
    /// Selector of the resizable elements.
    pub target_selector: Option<String>,
    /// Elements narrower than this show no virtual handles. Defaults to twice the handle size.
    pub handle_visibility_threshold: Option<f32>,
    pub direction: Direction,
    /// Keep the pointer position within the outer element.
    pub constrain_to_parent: bool,
    #[serde(with = "crate::config::millis")]
    pub click_swallow_duration: Duration,
    /// Flip the dragged edge when the pointer passes the start point.
    pub allow_edge_switch: bool,
    /// Never translate the element.
    pub skip_translate: bool,
    /// Only compute sizes, never touch the element. Implies `skip_translate`.
    pub skip_updating_element: bool,
    pub rtl: bool,
    pub resizing_class: String,
    pub invalid_class: String,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 5.0,
            handle_size: 10.0,
            touch_handle_size: 30.0,
            reserved_space: 10.0,
            dynamic_handle_size: false,
            min_width: 1.0,
            max_width: 0.0,
            min_height: 1.0,
            max_height: 0.0,
            left_handle: true,
            right_handle: true,
            top_handle: true,
            bottom_handle: true,
            handle_selector: None,
            target_selector: None,
            handle_visibility_threshold: None,
            direction: Direction::Horizontal,
            constrain_to_parent: true,
            click_swallow_duration: Duration::from_millis(50),
            allow_edge_switch: false,
            skip_translate: false,
            skip_updating_element: false,
            rtl: false,
            resizing_class: "b-resizing".to_string(),
            invalid_class: "b-resize-invalid".to_string(),
        }
    }
}

impl ResizeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn handle_size(mut self, size: f32) -> Self {
        self.handle_size = size;
        self
    }

    pub fn dynamic_handle_size(mut self, dynamic: bool) -> Self {
        self.dynamic_handle_size = dynamic;
        self
    }

    pub fn width_limits(mut self, min: f32, max: f32) -> Self {
        self.min_width = min;
        self.max_width = max;
        self
    }

    pub fn height_limits(mut self, min: f32, max: f32) -> Self {
        self.min_height = min;
        self.max_height = max;
        self
    }

    /// Enable or disable the virtual handles.
    pub fn handles(mut self, left: bool, right: bool, top: bool, bottom: bool) -> Self {
        self.left_handle = left;
        self.right_handle = right;
        self.top_handle = top;
        self.bottom_handle = bottom;
        self
    }

    pub fn handle_selector(mut self, selector: impl Into<String>) -> Self {
        self.handle_selector = Some(selector.into());
        self
    }

    pub fn target_selector(mut self, selector: impl Into<String>) -> Self {
        self.target_selector = Some(selector.into());
        self
    }

    pub fn constrain_to_parent(mut self, constrain: bool) -> Self {
        self.constrain_to_parent = constrain;
        self
    }

    pub fn allow_edge_switch(mut self, allow: bool) -> Self {
        self.allow_edge_switch = allow;
        self
    }

    pub fn skip_translate(mut self, skip: bool) -> Self {
        self.skip_translate = skip;
        self
    }

    pub fn skip_updating_element(mut self, skip: bool) -> Self {
        self.skip_updating_element = skip;
        self
    }

    pub fn rtl(mut self, rtl: bool) -> Self {
        self.rtl = rtl;
        self
    }
}

// ============================================================================
// Context and listeners
// ============================================================================

/// State of one resize gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeContext {
    pub element: ElementId,
    pub edge: Edge,
    pub is_touch: bool,
    /// Cleared by listeners to flag the new size as unacceptable.
    pub valid: bool,
    /// Set by listeners that finalize the resize later.
    pub is_async: bool,
    pub direction: Direction,
    pub element_start_x: f32,
    pub element_start_y: f32,
    pub new_x: f32,
    pub new_y: f32,
    pub element_width: f32,
    pub element_height: f32,
    pub new_width: Option<f32>,
    pub new_height: Option<f32>,
    /// Offset from the pointer to the dragged edge at grab time.
    pub cursor_offset: Point,
    pub start_x: f32,
    pub start_y: f32,
    pub current_x: f32,
    pub current_y: f32,
    pub started: bool,
}

/// Observer of resize gestures.
pub trait ResizeListener: Send + Sync {
    /// Return `false` to prevent grabbing `element`.
    fn before_resize_start(&self, _element: ElementId, _event: &PointerEvent) -> bool {
        true
    }

    fn resize_start(&self, _context: &mut ResizeContext, _event: &PointerEvent) {}

    /// The size changed during the gesture.
    fn resizing(&self, _context: &mut ResizeContext, _event: &PointerEvent) {}

    /// The gesture finished with a new size.
    fn resize(&self, _context: &mut ResizeContext, _event: &PointerEvent) {}

    /// The gesture finished without a change, or was aborted (`event` is `None` then).
    fn cancel(&self, _context: &mut ResizeContext, _event: Option<&PointerEvent>) {}

    /// The helper is ready for the next gesture.
    fn reset(&self) {}
}

type ElementPredicate = Box<dyn Fn(ElementId, &PointerEvent) -> bool + Send + Sync>;
type StartOverride = Box<dyn Fn(ElementId, Edge) -> Option<(ElementId, Edge)> + Send + Sync>;

// ============================================================================
// ResizeHelper
// ============================================================================

/// Resizes elements below an outer element.
pub struct ResizeHelper {
    config: ResizeConfig,
    host: Arc<dyn ElementHost>,
    outer_element: ElementId,
    hoverable: bool,
    listeners: Vec<Arc<dyn ResizeListener>>,
    allow_resize: Option<ElementPredicate>,
    is_element_resizable: Option<ElementPredicate>,
    internal_before_start: Option<StartOverride>,
    scroll_monitor: Option<Arc<dyn ScrollMonitor>>,
    monitor_id: Option<MonitorId>,
    drag_within: Option<ElementId>,
    scroller: Option<ElementId>,

    context: Option<ResizeContext>,
    start_event: Option<PointerEvent>,
    last_move_event: Option<PointerEvent>,
    current_element: Option<ElementId>,
    listening: bool,
    destroyed: bool,
}

impl ResizeHelper {
    /// Create a helper for elements below `outer_element`.
    ///
    /// Devices without hover get `touch_handle_size` virtual handles.
    pub fn new(
        mut config: ResizeConfig,
        host: Arc<dyn ElementHost>,
        outer_element: ElementId,
        input: &InputState,
    ) -> Self {
        let hoverable = input.is_hoverable_device();
        if config.handle_selector.is_none() && !hoverable {
            config.handle_size = config.touch_handle_size;
        }
        if config.handle_visibility_threshold.is_none_or(|t| t <= 0.0) {
            config.handle_visibility_threshold = Some(2.0 * config.handle_size);
        }
        if config.skip_updating_element {
            config.skip_translate = true;
        }
        Self {
            config,
            host,
            outer_element,
            hoverable,
            listeners: Vec::new(),
            allow_resize: None,
            is_element_resizable: None,
            internal_before_start: None,
            scroll_monitor: None,
            monitor_id: None,
            drag_within: None,
            scroller: None,
            context: None,
            start_event: None,
            last_move_event: None,
            current_element: None,
            listening: false,
            destroyed: false,
        }
    }

    /// Only grab when `predicate` accepts the event target.
    pub fn allow_resize(
        mut self,
        predicate: impl Fn(ElementId, &PointerEvent) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.allow_resize = Some(Box::new(predicate));
        self
    }

    /// Decides which elements are resizable. Overrides `target_selector` matching.
    pub fn is_element_resizable(
        mut self,
        predicate: impl Fn(ElementId, &PointerEvent) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.is_element_resizable = Some(Box::new(predicate));
        self
    }

    /// Redirect a grab to another element or edge.
    pub fn internal_before_start(
        mut self,
        hook: impl Fn(ElementId, Edge) -> Option<(ElementId, Edge)> + Send + Sync + 'static,
    ) -> Self {
        self.internal_before_start = Some(Box::new(hook));
        self
    }

    pub fn with_scroll_monitor(mut self, monitor: Arc<dyn ScrollMonitor>) -> Self {
        self.scroll_monitor = Some(monitor);
        self
    }

    /// The element auto scrolled during the resize. Defaults to the outer element.
    pub fn drag_within(mut self, element: ElementId) -> Self {
        self.drag_within = Some(element);
        self
    }

    /// The element whose scroll offset is compensated. Defaults to the outer element.
    pub fn scroller(mut self, element: ElementId) -> Self {
        self.scroller = Some(element);
        self
    }

    pub fn add_listener(&mut self, listener: Arc<dyn ResizeListener>) {
        self.listeners.push(listener);
    }

    /// Effective configuration after device adjustments.
    pub fn config(&self) -> &ResizeConfig {
        &self.config
    }

    /// The gesture in progress or awaiting finalization.
    pub fn context(&self) -> Option<&ResizeContext> {
        self.context.as_ref()
    }

    pub fn is_resizing(&self) -> bool {
        self.context.as_ref().is_some_and(|ctx| ctx.started)
    }

    /// Element currently showing a highlighted handle.
    pub fn current_element(&self) -> Option<ElementId> {
        self.current_element
    }

    // -------------------------------------------------------------------------
    // Gesture
    // -------------------------------------------------------------------------

    /// Start resizing `element` from `edge` programmatically, as if `event`
    /// had grabbed it.
    pub fn grab(&mut self, element: ElementId, edge: Edge, event: PointerEvent) {
        let context = self.new_context(element, edge, &event);
        self.host.add_class(element, &self.config.resizing_class);
        tracing::debug!(target: targets::RESIZE, element = %element, ?edge, "resize grabbed");
        self.context = Some(context);
        self.start_event = Some(event);
        self.listening = true;
    }

    /// Process a pointer press on the outer element. Returns `true` when a
    /// handle was grabbed.
    pub fn pointer_down(&mut self, event: &PointerEvent) -> bool {
        if self.context.is_some() {
            return false;
        }
        match event.kind {
            PointerKind::Touch if event.touches > 1 => return false,
            PointerKind::Mouse if event.button != MouseButton::Left => return false,
            _ => {}
        }
        self.start_event = Some(event.clone());
        let Some(target) = event.target else {
            return false;
        };
        if self.can_resize(target, event) && self.grab_resize_handle(target, event) {
            self.listening = true;
            return true;
        }
        false
    }

    /// Process a pointer move: drives the active gesture or highlights
    /// virtual handles under a hovering mouse.
    pub fn pointer_move(&mut self, event: &PointerEvent) {
        let threshold = self.config.drag_threshold;
        let active = match (&self.context, &self.start_event) {
            (Some(ctx), Some(start)) => ctx.started || start.distance_to(event) >= threshold,
            (Some(ctx), None) => ctx.started,
            _ => false,
        };

        if active && self.listening {
            if !self.context.as_ref().is_some_and(|ctx| ctx.started) {
                self.start_resize(event);
            }
            self.update(event);
        } else if !event.is_touch() && self.config.handle_selector.is_none() && self.hoverable {
            self.check_resize_handles(event);
        }
    }

    /// Process the pointer release.
    pub fn pointer_up(&mut self, event: &PointerEvent) {
        self.listening = false;
        if self.context.is_none() {
            self.reset();
            return;
        }
        self.stop_monitoring();
        if self.is_resizing() {
            self.host.swallow_click(self.config.click_swallow_duration);
        }
        self.finish_resize(event);
    }

    /// Escape aborts the gesture.
    pub fn key_down(&mut self, event: &KeyEvent) {
        if self.listening && event.key == Key::Escape {
            self.abort(false);
        }
    }

    /// The pointer left a resizable element.
    pub fn mouse_leave_target(&mut self, target: ElementId) {
        self.current_element = Some(target);
        self.unhighlight_handle();
    }

    /// An auto scroll step happened; re-apply the last pointer position.
    pub fn scrolled(&mut self, _action: ScrollerAction) {
        if self.context.is_none() {
            return;
        }
        if let Some(last) = self.last_move_event.clone() {
            self.update(&last);
        }
    }

    /// Complete an async resize.
    pub fn finalize(&mut self) {
        if self.context.is_some() {
            self.reset();
        }
    }

    /// Abort the gesture, restoring the element. `silent` suppresses `cancel`.
    pub fn abort(&mut self, silent: bool) {
        self.stop_monitoring();
        if self.context.is_some() {
            self.abort_resize(None, silent);
        } else if !self.destroyed {
            self.reset();
        }
    }

    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.abort(true);
        self.destroyed = true;
    }

    // -------------------------------------------------------------------------
    // Handles
    // -------------------------------------------------------------------------

    pub fn over_left_handle(&self, event: &PointerEvent, target: ElementId) -> bool {
        let width = self.host.offset_size(target).width;
        if !self.config.left_handle || !self.handles_visible(target, event, width) {
            return false;
        }
        let size = self.dynamic_handle_size(self.config.right_handle, width);
        size > 0.0 && self.host.bounds(target).with_width(size).contains(event.client)
    }

    pub fn over_right_handle(&self, event: &PointerEvent, target: ElementId) -> bool {
        let width = self.host.offset_size(target).width;
        if !self.config.right_handle || !self.handles_visible(target, event, width) {
            return false;
        }
        let size = self.dynamic_handle_size(self.config.left_handle, width);
        let bounds = self.host.bounds(target);
        let zone = Rect::new(bounds.right() - size, bounds.top(), size, bounds.height());
        size > 0.0 && zone.contains(event.client)
    }

    pub fn over_top_handle(&self, event: &PointerEvent, target: ElementId) -> bool {
        let height = self.host.offset_size(target).height;
        if !self.config.top_handle || !self.handles_visible(target, event, height) {
            return false;
        }
        let size = self.dynamic_handle_size(self.config.bottom_handle, height);
        size > 0.0 && self.host.bounds(target).with_height(size).contains(event.client)
    }

    pub fn over_bottom_handle(&self, event: &PointerEvent, target: ElementId) -> bool {
        let height = self.host.offset_size(target).height;
        if !self.config.bottom_handle || !self.handles_visible(target, event, height) {
            return false;
        }
        let size = self.dynamic_handle_size(self.config.top_handle, height);
        let bounds = self.host.bounds(target);
        let zone = Rect::new(bounds.left(), bounds.bottom() - size, bounds.width(), size);
        size > 0.0 && zone.contains(event.client)
    }

    /// Over the left (horizontal) or top (vertical) handle.
    pub fn over_start_handle(&self, event: &PointerEvent, target: ElementId) -> bool {
        match self.config.direction {
            Direction::Horizontal => self.over_left_handle(event, target),
            Direction::Vertical => self.over_top_handle(event, target),
        }
    }

    /// Over the right (horizontal) or bottom (vertical) handle.
    pub fn over_end_handle(&self, event: &PointerEvent, target: ElementId) -> bool {
        match self.config.direction {
            Direction::Horizontal => self.over_right_handle(event, target),
            Direction::Vertical => self.over_bottom_handle(event, target),
        }
    }

    pub fn over_any_handle(&self, event: &PointerEvent, target: ElementId) -> bool {
        self.over_start_handle(event, target) || self.over_end_handle(event, target)
    }

    /// Handle size for an element `extent` pixels long, shrunk when
    /// `dynamic_handle_size` is on and the handles would not fit.
    pub fn dynamic_handle_size(&self, opposite: bool, extent: f32) -> f32 {
        let count = if opposite { 2.0 } else { 1.0 };
        let size = self.config.handle_size;
        let available = extent - self.config.reserved_space;
        if self.config.dynamic_handle_size && size * count > available {
            return (available / count).floor().max(0.0);
        }
        size
    }

    fn handles_visible(&self, target: ElementId, event: &PointerEvent, extent: f32) -> bool {
        let threshold = self
            .config
            .handle_visibility_threshold
            .unwrap_or(2.0 * self.config.handle_size);
        self.can_resize(target, event) && (extent >= threshold || self.config.dynamic_handle_size)
    }

    fn can_resize(&self, element: ElementId, event: &PointerEvent) -> bool {
        if let Some(predicate) = &self.is_element_resizable {
            return predicate(element, event);
        }
        match &self.config.target_selector {
            Some(selector) => self.host.closest(element, selector).is_some(),
            None => true,
        }
    }

    fn resolve_target(&self, element: ElementId) -> Option<ElementId> {
        match &self.config.target_selector {
            Some(selector) => self.host.closest(element, selector),
            None => Some(element),
        }
    }

    fn allowed(&self, target: ElementId, event: &PointerEvent) -> bool {
        self.allow_resize.as_ref().is_none_or(|allow| allow(target, event))
    }

    fn check_resize_handles(&mut self, event: &PointerEvent) {
        let Some(raw) = event.target else {
            return;
        };
        match self.resolve_target(raw) {
            Some(target) if self.allowed(raw, event) => {
                self.current_element = Some(raw);
                let over = match self.config.direction {
                    Direction::Horizontal => {
                        self.over_left_handle(event, target)
                            || self.over_right_handle(event, target)
                    }
                    Direction::Vertical => {
                        self.over_top_handle(event, target)
                            || self.over_bottom_handle(event, target)
                    }
                };
                if over {
                    self.highlight_handle();
                } else {
                    self.unhighlight_handle();
                }
            }
            _ => {
                if self.current_element.is_some() {
                    self.unhighlight_handle();
                }
            }
        }
    }

    fn highlight_handle(&self) {
        let Some(current) = self.current_element else {
            return;
        };
        self.host.add_class(current, HANDLE_CLASS);
        if let Some(target) = self.resolve_target(current) {
            self.host.add_class(target, OVER_HANDLE_CLASS);
        }
    }

    fn unhighlight_handle(&mut self) {
        let Some(current) = self.current_element.take() else {
            return;
        };
        if let Some(target) = self.resolve_target(current) {
            self.host.remove_class(target, OVER_HANDLE_CLASS);
        }
        self.host.remove_class(current, HANDLE_CLASS);
    }

    // -------------------------------------------------------------------------
    // Grab, update, finish
    // -------------------------------------------------------------------------

    fn scroll_offset(&self) -> Point {
        self.host.scroll_offset(self.scroller.unwrap_or(self.outer_element))
    }

    fn cursor_offset(&self, event: &PointerEvent, element: ElementId, edge: Edge) -> Point {
        let rect = self.host.bounds(element);
        let rtl = self.config.rtl;
        let client = event.client;
        match edge {
            Edge::Left => {
                let edge_x = rect.left() - if rtl { rect.width() } else { 0.0 };
                Point::new(edge_x - client.x, 0.0)
            }
            Edge::Right => {
                let edge_x = rect.left() + if rtl { 0.0 } else { rect.width() };
                Point::new(edge_x - client.x, 0.0)
            }
            Edge::Top => Point::new(0.0, rect.top() - client.y),
            Edge::Bottom => Point::new(0.0, rect.bottom() - client.y),
        }
    }

    fn new_context(&self, element: ElementId, edge: Edge, event: &PointerEvent) -> ResizeContext {
        let cursor_offset = self.cursor_offset(event, element, edge);
        let scroll = self.scroll_offset();
        let translate = self.host.translate(element);
        let position = self.host.offset_position(element);
        let size = self.host.offset_size(element);
        let start_x = if translate.x != 0.0 { translate.x } else { position.x };
        let start_y = if translate.y != 0.0 { translate.y } else { position.y };
        let pointer_x = event.client.x + cursor_offset.x + scroll.x;
        let pointer_y = event.client.y + cursor_offset.y + scroll.y;
        ResizeContext {
            element,
            edge,
            is_touch: event.is_touch(),
            valid: true,
            is_async: false,
            direction: self.config.direction,
            element_start_x: start_x,
            element_start_y: start_y,
            new_x: start_x,
            new_y: start_y,
            element_width: size.width,
            element_height: size.height,
            new_width: None,
            new_height: None,
            cursor_offset,
            start_x: pointer_x,
            start_y: pointer_y,
            current_x: pointer_x,
            current_y: pointer_y,
            started: false,
        }
    }

    fn grab_resize_handle(&mut self, raw: ElementId, event: &PointerEvent) -> bool {
        if !self.allowed(raw, event) {
            return false;
        }
        let Some(mut element) = self.resolve_target(raw) else {
            return false;
        };
        let rtl = self.config.rtl;
        let horizontal = self.config.direction == Direction::Horizontal;

        let edge = if let Some(selector) = &self.config.handle_selector {
            if !self.host.matches(raw, selector) {
                return false;
            }
            let bounds = self.host.bounds(element);
            let size = self.host.offset_size(element);
            if horizontal {
                let near_start = event.client.x < bounds.left() + size.width / 2.0;
                if near_start != rtl { Edge::Left } else { Edge::Right }
            } else if event.client.y < bounds.top() + size.height / 2.0 {
                Edge::Top
            } else {
                Edge::Bottom
            }
        } else {
            let edge = if horizontal {
                if self.over_left_handle(event, element) {
                    Some(if rtl { Edge::Right } else { Edge::Left })
                } else if self.over_right_handle(event, element) {
                    Some(if rtl { Edge::Left } else { Edge::Right })
                } else {
                    None
                }
            } else if self.over_top_handle(event, element) {
                Some(Edge::Top)
            } else if self.over_bottom_handle(event, element) {
                Some(Edge::Bottom)
            } else {
                None
            };
            match edge {
                Some(edge) => edge,
                None => {
                    self.context = None;
                    return false;
                }
            }
        };

        let mut edge = edge;
        // The cursor offset is measured on the grabbed element and edge.
        let cursor_offset = self.cursor_offset(event, element, edge);
        let redirect = self.internal_before_start.as_ref().and_then(|hook| hook(element, edge));
        if let Some((redirected, new_edge)) = redirect {
            element = redirected;
            edge = new_edge;
        }

        if !self.listeners.iter().all(|l| l.before_resize_start(element, event)) {
            return false;
        }

        let mut context = self.new_context(element, edge, event);
        let scroll = self.scroll_offset();
        context.cursor_offset = cursor_offset;
        context.start_x = event.client.x + cursor_offset.x + scroll.x;
        context.start_y = event.client.y + cursor_offset.y + scroll.y;
        context.current_x = context.start_x;
        context.current_y = context.start_y;
        self.host.add_class(element, &self.config.resizing_class);
        tracing::debug!(
            target: targets::RESIZE,
            element = %element,
            ?edge,
            "resize handle grabbed"
        );
        self.context = Some(context);
        true
    }

    fn start_resize(&mut self, event: &PointerEvent) {
        if let Some(monitor) = &self.scroll_monitor {
            let id = monitor.start_monitoring(MonitorRequest {
                element: self.drag_within.unwrap_or(self.outer_element),
                direction: self.config.direction.into(),
            });
            self.monitor_id = Some(id);
        }
        let Some(context) = self.context.as_mut() else {
            return;
        };
        for listener in &self.listeners {
            listener.resize_start(context, event);
        }
        context.started = true;
        tracing::debug!(
            target: targets::RESIZE,
            element = %context.element,
            edge = ?context.edge,
            "resize started"
        );
    }

    fn update(&mut self, event: &PointerEvent) {
        let outer = self.host.bounds(self.outer_element);
        let scroll = self.scroll_offset();
        let Some(context) = self.context.as_mut() else {
            return;
        };

        let mut x = event.client.x + context.cursor_offset.x;
        let mut y = event.client.y + context.cursor_offset.y;
        if self.config.constrain_to_parent {
            x = x.min(outer.right()).max(outer.left());
            y = y.min(outer.bottom()).max(outer.top());
        }
        context.current_x = x + scroll.x;
        context.current_y = y + scroll.y;

        self.host.add_class(context.element, &self.config.resizing_class);
        if update_resize(&self.config, self.host.as_ref(), context) {
            for listener in &self.listeners {
                listener.resizing(context, event);
            }
            self.host.toggle_class(context.element, &self.config.invalid_class, !context.valid);
        }
        tracing::trace!(
            target: targets::RESIZE,
            x = context.current_x,
            y = context.current_y,
            width = ?context.new_width,
            height = ?context.new_height,
            "resize updated"
        );
        self.last_move_event = Some(event.clone());
    }

    fn finish_resize(&mut self, event: &PointerEvent) {
        if self.context.is_none() {
            self.reset();
            return;
        }
        let Some(context) = self.context.as_mut() else {
            return;
        };
        self.host.remove_class(context.element, &self.config.resizing_class);
        if !context.started {
            self.reset();
            return;
        }

        let changed = match self.config.direction {
            Direction::Horizontal => context
                .new_width
                .is_some_and(|w| w != 0.0 && w != context.element_width),
            Direction::Vertical => context
                .new_height
                .is_some_and(|h| h != 0.0 && h != context.element_height),
        };
        for listener in &self.listeners {
            if changed {
                listener.resize(context, event);
            } else {
                listener.cancel(context, Some(event));
            }
        }
        tracing::debug!(
            target: targets::RESIZE,
            element = %context.element,
            changed,
            is_async = context.is_async,
            "resize finished"
        );
        if !context.is_async {
            self.reset();
        }
    }

    fn abort_resize(&mut self, event: Option<&PointerEvent>, silent: bool) {
        let config = &self.config;
        let Some(context) = self.context.as_mut() else {
            return;
        };
        let host = self.host.as_ref();
        host.remove_class(context.element, &config.resizing_class);

        let restore_translate = !config.skip_translate;
        match config.direction {
            Direction::Horizontal => {
                if restore_translate && (context.edge == Edge::Left || config.allow_edge_switch) {
                    host.set_translate_x(context.element, context.element_start_x);
                }
                if !config.skip_updating_element {
                    host.set_width(context.element, context.element_width);
                }
            }
            Direction::Vertical => {
                if restore_translate && (context.edge == Edge::Top || config.allow_edge_switch) {
                    host.set_translate_y(context.element, context.element_start_y);
                }
                if !config.skip_updating_element {
                    host.set_height(context.element, context.element_height);
                }
            }
        }
        if !silent {
            for listener in &self.listeners {
                listener.cancel(context, event);
            }
        }
        tracing::debug!(target: targets::RESIZE, element = %context.element, "resize aborted");

        if !self.destroyed {
            self.reset();
        }
    }

    fn reset(&mut self) {
        self.listening = false;
        self.context = None;
        for listener in &self.listeners {
            listener.reset();
        }
    }

    fn stop_monitoring(&mut self) {
        if let (Some(monitor), Some(id)) = (&self.scroll_monitor, self.monitor_id.take()) {
            monitor.stop_monitoring(id);
        }
    }
}

/// Apply the pointer position in `context` to the element. Returns `true`
/// when the size changed.
fn update_resize(
    config: &ResizeConfig,
    host: &dyn ElementHost,
    context: &mut ResizeContext,
) -> bool {
    if config.allow_edge_switch {
        context.edge = match config.direction {
            Direction::Horizontal if context.current_x > context.start_x => Edge::Right,
            Direction::Horizontal => Edge::Left,
            Direction::Vertical if context.current_y > context.start_y => Edge::Bottom,
            Direction::Vertical => Edge::Top,
        };
    }

    let element = context.element;
    let edge = context.edge;
    let delta_x = context.current_x - context.start_x;
    let delta_y = context.current_y - context.start_y;
    let limit = |which, fallback: f32| {
        host.extremal_size(element, which)
            .filter(|v| *v != 0.0)
            .unwrap_or(fallback)
    };
    let min_width = limit(ExtremalSize::MinWidth, config.min_width);
    let max_width = limit(ExtremalSize::MaxWidth, config.max_width);
    let min_height = limit(ExtremalSize::MinHeight, config.min_height);
    let max_height = limit(ExtremalSize::MaxHeight, config.max_height);

    let grows = (edge == Edge::Right && !config.rtl) || edge == Edge::Bottom;
    let sign = if grows { 1.0 } else { -1.0 };
    let mut width = (context.element_width + delta_x * sign).max(min_width);
    let mut height = (context.element_height + delta_y * sign).max(min_height);
    if max_width > 0.0 {
        width = width.min(max_width);
    }
    if max_height > 0.0 {
        height = height.min(max_height);
    }

    match config.direction {
        Direction::Horizontal if width != context.element_width => {
            if !config.skip_updating_element {
                host.set_width(element, width.abs());
            }
            context.new_width = Some(width);
            if edge == Edge::Left {
                let new_x = (context.element_start_x + context.element_width - config.min_width)
                    .min(context.element_start_x + delta_x)
                    .max(0.0);
                if !config.skip_translate {
                    host.set_translate_x(element, new_x.round());
                }
                context.new_x = new_x;
            } else if edge == Edge::Right && config.allow_edge_switch && !config.skip_translate {
                // Back to the initial position after flipping through the start point.
                host.set_translate_x(element, context.element_start_x);
            }
            true
        }
        Direction::Vertical if height != context.element_height => {
            if !config.skip_updating_element {
                host.set_height(element, height.abs());
            }
            context.new_height = Some(height);
            if edge == Edge::Top {
                let new_y = (context.element_start_y + context.element_height - config.min_height)
                    .min(context.element_start_y + delta_y)
                    .max(0.0);
                if !config.skip_translate {
                    host.set_translate_y(element, new_y);
                }
                context.new_y = new_y;
            } else if edge == Edge::Bottom && config.allow_edge_switch && !config.skip_translate {
                host.set_translate_y(element, context.element_start_y);
            }
            true
        }
        _ => false,
    }
}

impl Drop for ResizeHelper {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for ResizeHelper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResizeHelper")
            .field("outer_element", &self.outer_element)
            .field("direction", &self.config.direction)
            .field("context", &self.context)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

static_assertions::assert_impl_all!(ResizeHelper: Send, Sync);

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::gesture::headless::{HeadlessDom, RecordingScrollMonitor};

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
        make_async: bool,
        invalidate: bool,
        veto: bool,
    }

    impl Recorder {
        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.events.lock())
        }
    }

    impl ResizeListener for Recorder {
        fn before_resize_start(&self, _element: ElementId, _event: &PointerEvent) -> bool {
            !self.veto
        }

        fn resize_start(&self, _context: &mut ResizeContext, _event: &PointerEvent) {
            self.events.lock().push("resize_start".into());
        }

        fn resizing(&self, context: &mut ResizeContext, _event: &PointerEvent) {
            if self.invalidate {
                context.valid = false;
            }
            self.events.lock().push("resizing".into());
        }

        fn resize(&self, context: &mut ResizeContext, _event: &PointerEvent) {
            context.is_async = self.make_async;
            self.events.lock().push("resize".into());
        }

        fn cancel(&self, _context: &mut ResizeContext, event: Option<&PointerEvent>) {
            let kind = if event.is_some() { "cancel" } else { "cancel:abort" };
            self.events.lock().push(kind.into());
        }

        fn reset(&self) {
            self.events.lock().push("reset".into());
        }
    }

    struct Fixture {
        dom: Arc<HeadlessDom>,
        outer: ElementId,
        bar: ElementId,
    }

    /// A 100x20 bar at x = 50 inside a 1000 wide outer element.
    fn fixture() -> Fixture {
        let dom = Arc::new(HeadlessDom::new());
        let outer = dom.create_element(None, Rect::new(0.0, 0.0, 1000.0, 200.0));
        let bar = dom.create_element(Some(outer), Rect::new(0.0, 0.0, 100.0, 20.0));
        dom.set_translate_x(bar, 50.0);
        Fixture { dom, outer, bar }
    }

    fn helper(fx: &Fixture, config: ResizeConfig, recorder: &Arc<Recorder>) -> ResizeHelper {
        let input = InputState::new(true);
        let mut helper = ResizeHelper::new(config, fx.dom.clone(), fx.outer, &input);
        helper.add_listener(recorder.clone());
        helper
    }

    #[test]
    fn test_right_edge_grows() {
        let fx = fixture();
        let recorder = Arc::new(Recorder::default());
        let mut helper = helper(&fx, ResizeConfig::default(), &recorder);

        assert!(helper.pointer_down(&PointerEvent::mouse_down(148.0, 10.0).target(fx.bar)));
        assert_eq!(helper.context().map(|c| c.edge), Some(Edge::Right));
        helper.pointer_move(&PointerEvent::mouse_move(168.0, 10.0).target(fx.bar));

        assert_eq!(fx.dom.offset_size(fx.bar).width, 120.0);
        assert_eq!(fx.dom.translate(fx.bar).x, 50.0);
        assert_eq!(fx.dom.bounds(fx.bar).left(), 50.0);

        helper.pointer_up(&PointerEvent::mouse_up(168.0, 10.0).target(fx.bar));
        assert_eq!(recorder.take(), vec!["resize_start", "resizing", "resize", "reset"]);
        assert!(helper.context().is_none());
        assert!(!fx.dom.has_class(fx.bar, "b-resizing"));
    }

    #[test]
    fn test_left_edge_keeps_right_edge() {
        let fx = fixture();
        let recorder = Arc::new(Recorder::default());
        let mut helper = helper(&fx, ResizeConfig::default(), &recorder);

        assert!(helper.pointer_down(&PointerEvent::mouse_down(52.0, 10.0).target(fx.bar)));
        assert_eq!(helper.context().map(|c| c.edge), Some(Edge::Left));
        helper.pointer_move(&PointerEvent::mouse_move(72.0, 10.0).target(fx.bar));

        let bounds = fx.dom.bounds(fx.bar);
        assert_eq!(bounds.width(), 80.0);
        assert_eq!(bounds.left(), 70.0);
        assert_eq!(bounds.right(), 150.0);
        assert_eq!(helper.context().map(|c| c.new_x), Some(70.0));
    }

    #[test]
    fn test_width_limits() {
        let fx = fixture();
        let recorder = Arc::new(Recorder::default());
        let mut helper = helper(&fx, ResizeConfig::default().width_limits(1.0, 110.0), &recorder);
        helper.pointer_down(&PointerEvent::mouse_down(148.0, 10.0).target(fx.bar));
        helper.pointer_move(&PointerEvent::mouse_move(198.0, 10.0).target(fx.bar));
        assert_eq!(fx.dom.offset_size(fx.bar).width, 110.0);

        fx.dom.set_extremal_size(fx.bar, ExtremalSize::MaxWidth, 130.0);
        helper.pointer_move(&PointerEvent::mouse_move(199.0, 10.0).target(fx.bar));
        assert_eq!(fx.dom.offset_size(fx.bar).width, 130.0);
    }

    #[test]
    fn test_below_threshold_does_not_start() {
        let fx = fixture();
        let recorder = Arc::new(Recorder::default());
        let mut helper = helper(&fx, ResizeConfig::default(), &recorder);
        helper.pointer_down(&PointerEvent::mouse_down(148.0, 10.0).target(fx.bar));
        helper.pointer_move(&PointerEvent::mouse_move(152.0, 10.0).target(fx.bar));
        assert!(!helper.is_resizing());
        assert_eq!(fx.dom.offset_size(fx.bar).width, 100.0);

        helper.pointer_up(&PointerEvent::mouse_up(152.0, 10.0).target(fx.bar));
        assert_eq!(recorder.take(), vec!["reset"]);
        assert!(fx.dom.swallowed_clicks().is_empty());
    }

    #[test]
    fn test_unchanged_size_cancels() {
        let fx = fixture();
        let recorder = Arc::new(Recorder::default());
        let mut helper = helper(&fx, ResizeConfig::default(), &recorder);
        helper.pointer_down(&PointerEvent::mouse_down(148.0, 10.0).target(fx.bar));
        helper.pointer_move(&PointerEvent::mouse_move(148.0, 30.0).target(fx.bar));
        assert!(helper.is_resizing());
        helper.pointer_up(&PointerEvent::mouse_up(148.0, 30.0).target(fx.bar));
        assert_eq!(recorder.take(), vec!["resize_start", "cancel", "reset"]);
        assert_eq!(fx.dom.swallowed_clicks(), vec![Duration::from_millis(50)]);
    }

    #[test]
    fn test_async_finalize() {
        let fx = fixture();
        let recorder = Arc::new(Recorder {
            make_async: true,
            ..Recorder::default()
        });
        let mut helper = helper(&fx, ResizeConfig::default(), &recorder);
        helper.pointer_down(&PointerEvent::mouse_down(148.0, 10.0).target(fx.bar));
        helper.pointer_move(&PointerEvent::mouse_move(168.0, 10.0).target(fx.bar));
        helper.pointer_up(&PointerEvent::mouse_up(168.0, 10.0).target(fx.bar));

        assert_eq!(recorder.take(), vec!["resize_start", "resizing", "resize"]);
        assert!(helper.context().is_some_and(|c| c.is_async));
        assert!(!helper.pointer_down(&PointerEvent::mouse_down(148.0, 10.0).target(fx.bar)));

        helper.finalize();
        assert_eq!(recorder.take(), vec!["reset"]);
        assert!(helper.context().is_none());
    }

    #[test]
    fn test_escape_restores_element() {
        let fx = fixture();
        let recorder = Arc::new(Recorder::default());
        let mut helper = helper(&fx, ResizeConfig::default(), &recorder);
        helper.pointer_down(&PointerEvent::mouse_down(52.0, 10.0).target(fx.bar));
        helper.pointer_move(&PointerEvent::mouse_move(72.0, 10.0).target(fx.bar));
        recorder.take();

        helper.key_down(&KeyEvent::down(Key::Escape));
        assert_eq!(fx.dom.bounds(fx.bar), Rect::new(50.0, 0.0, 100.0, 20.0));
        assert_eq!(recorder.take(), vec!["cancel:abort", "reset"]);

        helper.key_down(&KeyEvent::down(Key::Escape));
        assert!(recorder.take().is_empty());
    }

    #[test]
    fn test_invalid_resize_toggles_class() {
        let fx = fixture();
        let recorder = Arc::new(Recorder {
            invalidate: true,
            ..Recorder::default()
        });
        let mut helper = helper(&fx, ResizeConfig::default(), &recorder);
        helper.pointer_down(&PointerEvent::mouse_down(148.0, 10.0).target(fx.bar));
        helper.pointer_move(&PointerEvent::mouse_move(168.0, 10.0).target(fx.bar));
        assert!(fx.dom.has_class(fx.bar, "b-resize-invalid"));
        assert!(fx.dom.has_class(fx.bar, "b-resizing"));
    }

    #[test]
    fn test_middle_of_element_is_not_a_handle() {
        let fx = fixture();
        let recorder = Arc::new(Recorder::default());
        let mut helper = helper(&fx, ResizeConfig::default(), &recorder);
        assert!(!helper.pointer_down(&PointerEvent::mouse_down(100.0, 10.0).target(fx.bar)));
        let right_click = PointerEvent::mouse_down(148.0, 10.0)
            .target(fx.bar)
            .button(MouseButton::Right);
        assert!(!helper.pointer_down(&right_click));
        assert!(helper.context().is_none());
    }

    #[test]
    fn test_veto_prevents_grab() {
        let fx = fixture();
        let recorder = Arc::new(Recorder {
            veto: true,
            ..Recorder::default()
        });
        let mut helper = helper(&fx, ResizeConfig::default(), &recorder);
        assert!(!helper.pointer_down(&PointerEvent::mouse_down(148.0, 10.0).target(fx.bar)));
    }

    #[test]
    fn test_dynamic_handle_size() {
        let fx = fixture();
        let recorder = Arc::new(Recorder::default());
        let helper = helper(&fx, ResizeConfig::default().dynamic_handle_size(true), &recorder);
        assert_eq!(helper.dynamic_handle_size(true, 15.0), 2.0);
        assert_eq!(helper.dynamic_handle_size(false, 15.0), 5.0);
        assert_eq!(helper.dynamic_handle_size(true, 8.0), 0.0);
        assert_eq!(helper.dynamic_handle_size(true, 100.0), 10.0);
    }

    #[test]
    fn test_narrow_element_hides_handles() {
        let fx = fixture();
        let recorder = Arc::new(Recorder::default());
        fx.dom.set_width(fx.bar, 15.0);
        let helper = helper(&fx, ResizeConfig::default(), &recorder);
        assert!(!helper.over_any_handle(&PointerEvent::mouse_move(52.0, 10.0), fx.bar));
    }

    #[test]
    fn test_hover_highlight() {
        let fx = fixture();
        let recorder = Arc::new(Recorder::default());
        let mut helper = helper(&fx, ResizeConfig::default(), &recorder);
        helper.pointer_move(&PointerEvent::mouse_move(148.0, 10.0).target(fx.bar));
        assert!(fx.dom.has_class(fx.bar, "b-resize-handle"));
        assert!(fx.dom.has_class(fx.bar, "b-over-resize-handle"));

        helper.pointer_move(&PointerEvent::mouse_move(100.0, 10.0).target(fx.bar));
        assert!(!fx.dom.has_class(fx.bar, "b-over-resize-handle"));

        helper.pointer_move(&PointerEvent::mouse_move(148.0, 10.0).target(fx.bar));
        helper.mouse_leave_target(fx.bar);
        assert!(!fx.dom.has_class(fx.bar, "b-resize-handle"));
        assert!(helper.current_element().is_none());
    }

    #[test]
    fn test_touch_device_uses_touch_handles() {
        let fx = fixture();
        let input = InputState::new(false);
        let helper = ResizeHelper::new(ResizeConfig::default(), fx.dom.clone(), fx.outer, &input);
        assert_eq!(helper.config().handle_size, 30.0);
        assert_eq!(helper.config().handle_visibility_threshold, Some(60.0));
        assert!(helper.over_right_handle(&PointerEvent::touch_start(125.0, 10.0), fx.bar));
    }

    #[test]
    fn test_edge_switch() {
        let fx = fixture();
        let recorder = Arc::new(Recorder::default());
        let mut helper = helper(&fx, ResizeConfig::default().allow_edge_switch(true), &recorder);
        helper.pointer_down(&PointerEvent::mouse_down(148.0, 10.0).target(fx.bar));
        helper.pointer_move(&PointerEvent::mouse_move(100.0, 10.0).target(fx.bar));
        assert_eq!(helper.context().map(|c| c.edge), Some(Edge::Left));
    }

    #[test]
    fn test_rtl_swaps_edges() {
        let fx = fixture();
        let recorder = Arc::new(Recorder::default());
        let mut helper = helper(&fx, ResizeConfig::default().rtl(true), &recorder);
        assert!(helper.pointer_down(&PointerEvent::mouse_down(52.0, 10.0).target(fx.bar)));
        assert_eq!(helper.context().map(|c| c.edge), Some(Edge::Right));
    }

    #[test]
    fn test_handle_selector() {
        let fx = fixture();
        let handle = fx.dom.create_element(Some(fx.bar), Rect::new(90.0, 0.0, 10.0, 20.0));
        fx.dom.add_class(handle, "handle");
        fx.dom.add_class(fx.bar, "bar");
        let recorder = Arc::new(Recorder::default());
        let config = ResizeConfig::default().handle_selector(".handle").target_selector(".bar");
        let mut helper = helper(&fx, config, &recorder);

        assert!(!helper.pointer_down(&PointerEvent::mouse_down(60.0, 10.0).target(fx.bar)));
        assert!(helper.pointer_down(&PointerEvent::mouse_down(145.0, 10.0).target(handle)));
        let context = helper.context().cloned();
        assert_eq!(context.as_ref().map(|c| c.element), Some(fx.bar));
        assert_eq!(context.map(|c| c.edge), Some(Edge::Right));
    }

    #[test]
    fn test_vertical_bottom_edge() {
        let fx = fixture();
        let recorder = Arc::new(Recorder::default());
        let config = ResizeConfig::default().direction(Direction::Vertical);
        let mut helper = helper(&fx, config, &recorder);
        fx.dom.set_height(fx.bar, 60.0);
        assert!(helper.pointer_down(&PointerEvent::mouse_down(100.0, 58.0).target(fx.bar)));
        assert_eq!(helper.context().map(|c| c.edge), Some(Edge::Bottom));
        helper.pointer_move(&PointerEvent::mouse_move(100.0, 78.0).target(fx.bar));
        assert_eq!(fx.dom.offset_size(fx.bar).height, 80.0);
    }

    #[test]
    fn test_internal_before_start_redirects() {
        let fx = fixture();
        let other = fx.dom.create_element(Some(fx.outer), Rect::new(0.0, 50.0, 200.0, 20.0));
        let recorder = Arc::new(Recorder::default());
        let mut helper = helper(&fx, ResizeConfig::default(), &recorder)
            .internal_before_start(move |_, edge| Some((other, edge)));
        helper.pointer_down(&PointerEvent::mouse_down(148.0, 10.0).target(fx.bar));
        assert_eq!(helper.context().map(|c| c.element), Some(other));
        assert_eq!(helper.context().map(|c| c.element_width), Some(200.0));
    }

    #[test]
    fn test_scroll_monitoring() {
        let fx = fixture();
        let monitor = Arc::new(RecordingScrollMonitor::new());
        let recorder = Arc::new(Recorder::default());
        let mut helper = helper(&fx, ResizeConfig::default(), &recorder)
            .with_scroll_monitor(monitor.clone())
            .drag_within(fx.outer);
        helper.pointer_down(&PointerEvent::mouse_down(148.0, 10.0).target(fx.bar));
        helper.pointer_move(&PointerEvent::mouse_move(168.0, 10.0).target(fx.bar));
        assert_eq!(monitor.active()[0].direction, ScrollDirection::Horizontal);

        fx.dom.set_scroll(fx.outer, Point::new(10.0, 0.0));
        helper.scrolled(ScrollerAction {
            element: fx.outer,
            dx: 10.0,
            dy: 0.0,
        });
        assert_eq!(fx.dom.offset_size(fx.bar).width, 130.0);

        helper.pointer_up(&PointerEvent::mouse_up(168.0, 10.0).target(fx.bar));
        assert!(monitor.active().is_empty());
    }

    #[test]
    fn test_constrained_to_parent() {
        let fx = fixture();
        fx.dom.set_layout(fx.outer, Rect::new(0.0, 0.0, 200.0, 200.0));
        let recorder = Arc::new(Recorder::default());
        let mut helper = helper(&fx, ResizeConfig::default(), &recorder);
        helper.pointer_down(&PointerEvent::mouse_down(148.0, 10.0).target(fx.bar));
        helper.pointer_move(&PointerEvent::mouse_move(400.0, 10.0).target(fx.bar));
        assert_eq!(fx.dom.offset_size(fx.bar).width, 150.0);
    }

    #[test]
    fn test_programmatic_grab() {
        let fx = fixture();
        let recorder = Arc::new(Recorder::default());
        let mut helper = helper(&fx, ResizeConfig::default(), &recorder);
        helper.grab(fx.bar, Edge::Right, PointerEvent::mouse_down(150.0, 10.0));
        assert!(fx.dom.has_class(fx.bar, "b-resizing"));
        helper.pointer_move(&PointerEvent::mouse_move(180.0, 10.0));
        assert_eq!(fx.dom.offset_size(fx.bar).width, 130.0);
    }
}
