//! The drag gesture state machine.
//!
//! A [`DragContext`] coordinates one drag interaction between a
//! [`DragSource`] and the [`Droppable`] zones registered in a
//! [`DroppableRegistry`]:
//!
//! ```text
//!            move >= threshold              end
//!   Init ────────────────────────> Dragging ─────> Dropped
//!     │                               │
//!     └──────────── abort ────────────┴──────────> Aborted
//! ```
//!
//! The embedding layer creates a context on pointer down, calls
//! [`begin`](DragContext::begin), then feeds it pointer moves, the final
//! pointer up and key events. Teardown registered through
//! [`add_cleaner`](DragContext::add_cleaner) runs exactly once, in reverse
//! order, whichever terminal path the gesture takes.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use horizon_grid::gesture::{DragContext, DroppableRegistry, HeadlessDom, PointerEvent};
//!
//! let dom = Arc::new(HeadlessDom::new());
//! let registry = Arc::new(DroppableRegistry::new());
//! let down = PointerEvent::mouse_down(10.0, 10.0).target(row);
//! let mut drag = DragContext::new(source, down, dom, registry);
//!
//! if drag.begin() {
//!     drag.pointer_move(PointerEvent::mouse_move(30.0, 10.0).target(cell));
//!     drag.end(PointerEvent::mouse_up(30.0, 10.0).target(cell));
//! }
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use horizon_grid_core::logging::targets;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::event::{Key, KeyEvent, KeyboardModifiers, PointerEvent, PointerPhase};
use super::host::{
    ElementHost, ElementId, MonitorRequest, ScrollDirection, ScrollMonitor, ScrollerAction,
};
use crate::error::{Error, Result};

/// Selector of the outer widget element that receives the dragging class.
const OUTER_SELECTOR: &str = ".b-outer";

static NEXT_DRAG_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// Configuration
// ============================================================================

/// Axis a drag is locked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragLock {
    X,
    Y,
}

impl From<Option<DragLock>> for ScrollDirection {
    fn from(lock: Option<DragLock>) -> Self {
        match lock {
            Some(DragLock::X) => ScrollDirection::Horizontal,
            Some(DragLock::Y) => ScrollDirection::Vertical,
            None => ScrollDirection::Both,
        }
    }
}

/// Drag behavior switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Distance in pixels the pointer must travel before the drag starts.
    pub threshold: f32,
    /// A touch gesture moving before this delay is a scroll, not a drag.
    #[serde(with = "crate::config::millis")]
    pub touch_start_delay: Duration,
    /// Class put on the outer element while dragging.
    pub dragging_class: String,
    /// Restricts auto scrolling to one axis.
    pub drag_lock: Option<DragLock>,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            threshold: 5.0,
            touch_start_delay: Duration::from_millis(300),
            dragging_class: "b-dragging".to_string(),
            drag_lock: None,
        }
    }
}

impl DragConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn touch_start_delay(mut self, delay: Duration) -> Self {
        self.touch_start_delay = delay;
        self
    }

    pub fn dragging_class(mut self, class: impl Into<String>) -> Self {
        self.dragging_class = class.into();
        self
    }

    pub fn drag_lock(mut self, lock: Option<DragLock>) -> Self {
        self.drag_lock = lock;
        self
    }
}

// ============================================================================
// Participants
// ============================================================================

/// Identifies a drag gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DragId(u64);

impl DragId {
    fn next() -> Self {
        Self(NEXT_DRAG_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// The element being dragged from. Every hook receives the context.
pub trait DragSource: Send + Sync {
    /// Element the drag originates in; the dragging class goes on its outer widget.
    fn drag_root_element(&self) -> ElementId;

    /// Called by [`DragContext::begin`]. Return `false` to veto the drag.
    fn before_drag(&self, _drag: &mut DragContext) -> bool {
        true
    }

    /// Called once the threshold is crossed. Return `false` to abort.
    fn start_drag(&self, _drag: &mut DragContext) -> bool {
        true
    }

    /// Called on every tracked move.
    fn track_drag(&self, _drag: &mut DragContext) {}

    /// A drop target accepted the drag.
    fn drag_enter_target(&self, _drag: &mut DragContext) {}

    /// The drag left `target`.
    fn drag_leave_target(&self, _drag: &mut DragContext, _target: &Arc<dyn Droppable>) {}

    /// The drag was aborted.
    fn end_drag(&self, _drag: &mut DragContext) {}

    /// Swallow the click that follows a drop within this window.
    fn drag_swallow_click_time(&self) -> Option<Duration> {
        None
    }

    /// Remember the active drag (`None` when it was destroyed).
    fn set_active_drag(&self, _drag: Option<DragId>) {}

    /// The active drag, if tracked.
    fn active_drag(&self) -> Option<DragId> {
        None
    }
}

/// A zone that can receive drops.
pub trait Droppable: Send + Sync {
    /// Root element of the zone.
    fn drop_root_element(&self) -> ElementId;

    /// Restricts the zone to elements below its root matching this selector.
    fn droppable_selector(&self) -> Option<&str> {
        None
    }

    /// The drag entered the zone. Return `false` to reject it.
    fn drag_enter(&self, _drag: &mut DragContext) -> bool {
        true
    }

    /// The drag left the zone.
    fn drag_leave(&self, _drag: &mut DragContext) {}

    /// The drag moved within the zone.
    fn drag_move(&self, _drag: &mut DragContext) {}

    /// The drag was dropped on the zone.
    fn drag_drop(&self, _drag: &mut DragContext) {}
}

fn same_zone(a: &Option<Arc<dyn Droppable>>, b: &Option<Arc<dyn Droppable>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
        (None, None) => true,
        _ => false,
    }
}

fn is_source(target: &Arc<dyn Droppable>, source: &Arc<dyn DragSource>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(target), Arc::as_ptr(source))
}

/// Droppable zones keyed by the element they are registered on.
#[derive(Default)]
pub struct DroppableRegistry {
    zones: RwLock<HashMap<ElementId, Vec<Arc<dyn Droppable>>>>,
}

impl DroppableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `droppable` on `element`.
    pub fn register(&self, element: ElementId, droppable: Arc<dyn Droppable>) {
        self.zones.write().entry(element).or_default().push(droppable);
    }

    /// Remove `droppable` from `element`.
    pub fn unregister(&self, element: ElementId, droppable: &Arc<dyn Droppable>) {
        let mut zones = self.zones.write();
        if let Some(list) = zones.get_mut(&element) {
            list.retain(|d| !std::ptr::addr_eq(Arc::as_ptr(d), Arc::as_ptr(droppable)));
            if list.is_empty() {
                zones.remove(&element);
            }
        }
    }

    /// Zones registered on `element`, in registration order.
    pub fn droppables_at(&self, element: ElementId) -> Vec<Arc<dyn Droppable>> {
        self.zones.read().get(&element).cloned().unwrap_or_default()
    }
}

impl fmt::Debug for DroppableRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DroppableRegistry")
            .field("elements", &self.zones.read().len())
            .finish()
    }
}

// ============================================================================
// Drag data
// ============================================================================

type Payload = Arc<dyn Any + Send + Sync>;
type Renderer = Box<dyn FnOnce() -> Payload + Send + Sync>;
type Cleaner = Box<dyn FnOnce() + Send + Sync>;

enum Slot {
    Ready(Payload),
    Deferred(Renderer),
}

/// Result of [`DragContext::peek`].
#[derive(Debug, Clone, PartialEq)]
pub enum Peek<T> {
    Ready(Arc<T>),
    /// A renderer is registered but has not run yet.
    Deferred,
}

// ============================================================================
// DragContext
// ============================================================================

/// Lifecycle state of a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DragState {
    /// Button down, movement below the threshold.
    Init,
    Dragging,
    Dropped,
    Aborted,
}

/// One drag interaction.
pub struct DragContext {
    id: DragId,
    config: DragConfig,
    host: Arc<dyn ElementHost>,
    registry: Arc<DroppableRegistry>,
    source: Arc<dyn DragSource>,
    scroll_monitor: Option<Arc<dyn ScrollMonitor>>,

    state: DragState,
    destroyed: bool,
    ended: bool,
    start_event: PointerEvent,
    event: PointerEvent,
    last_move_event: Option<PointerEvent>,
    end_event: Option<PointerEvent>,
    element: Option<ElementId>,
    item_element: Option<ElementId>,

    target: Option<Arc<dyn Droppable>>,
    previous_target: Option<Arc<dyn Droppable>>,
    target_element: Option<ElementId>,
    valid: bool,

    modifiers: KeyboardModifiers,
    scroller_action: Option<ScrollerAction>,
    data: HashMap<String, Slot>,
    cleaners: Vec<Cleaner>,
}

impl DragContext {
    /// A pending drag started by `event`.
    pub fn new(
        source: Arc<dyn DragSource>,
        event: PointerEvent,
        host: Arc<dyn ElementHost>,
        registry: Arc<DroppableRegistry>,
    ) -> Self {
        Self {
            id: DragId::next(),
            config: DragConfig::default(),
            host,
            registry,
            source,
            scroll_monitor: None,
            state: DragState::Init,
            destroyed: false,
            ended: false,
            element: event.target,
            start_event: event.clone(),
            event,
            last_move_event: None,
            end_event: None,
            item_element: None,
            target: None,
            previous_target: None,
            target_element: None,
            valid: true,
            modifiers: KeyboardModifiers::NONE,
            scroller_action: None,
            data: HashMap::new(),
            cleaners: Vec::new(),
        }
    }

    /// Use `config`.
    pub fn with_config(mut self, config: DragConfig) -> Self {
        self.config = config;
        self
    }

    /// Auto scroll through `monitor` while dragging.
    pub fn with_scroll_monitor(mut self, monitor: Arc<dyn ScrollMonitor>) -> Self {
        self.scroll_monitor = Some(monitor);
        self
    }

    /// The element representing the dragged item.
    pub fn with_item_element(mut self, element: ElementId) -> Self {
        self.item_element = Some(element);
        self
    }

    // -------------------------------------------------------------------------
    // State
    // -------------------------------------------------------------------------

    pub fn id(&self) -> DragId {
        self.id
    }

    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn aborted(&self) -> bool {
        self.state == DragState::Aborted
    }

    /// Dropped, aborted or destroyed.
    pub fn completed(&self) -> bool {
        self.destroyed || self.aborted() || self.end_event.is_some()
    }

    /// Button down but the threshold is not reached yet.
    pub fn pending(&self) -> bool {
        self.state == DragState::Init
    }

    pub fn started(&self) -> bool {
        self.state != DragState::Init && !self.aborted()
    }

    /// Started over an element with an accepting target.
    pub fn valid(&self) -> bool {
        self.started() && self.target_element.is_some() && self.valid
    }

    /// Mark the drag invalid until the next target change.
    pub fn set_valid(&mut self, valid: bool) {
        self.valid = valid;
    }

    pub fn source(&self) -> &Arc<dyn DragSource> {
        &self.source
    }

    pub fn target(&self) -> Option<&Arc<dyn Droppable>> {
        self.target.as_ref()
    }

    pub fn previous_target(&self) -> Option<&Arc<dyn Droppable>> {
        self.previous_target.as_ref()
    }

    /// Element under the pointer at the last tracked move.
    pub fn target_element(&self) -> Option<ElementId> {
        self.target_element
    }

    /// Element the drag started on.
    pub fn element(&self) -> Option<ElementId> {
        self.element
    }

    pub fn item_element(&self) -> Option<ElementId> {
        self.item_element
    }

    pub fn start_event(&self) -> &PointerEvent {
        &self.start_event
    }

    /// The event being processed.
    pub fn event(&self) -> &PointerEvent {
        &self.event
    }

    pub fn last_move_event(&self) -> Option<&PointerEvent> {
        self.last_move_event.as_ref()
    }

    pub fn end_event(&self) -> Option<&PointerEvent> {
        self.end_event.as_ref()
    }

    /// Modifier snapshot; Meta counts as Control.
    pub fn modifiers(&self) -> KeyboardModifiers {
        self.modifiers
    }

    /// The scroll step being replayed, during a scroll-triggered track only.
    pub fn scroller_action(&self) -> Option<&ScrollerAction> {
        self.scroller_action.as_ref()
    }

    /// Distance from the start event to `event`.
    pub fn distance(&self, event: &PointerEvent) -> f32 {
        self.start_event.distance_to(event)
    }

    // -------------------------------------------------------------------------
    // Data
    // -------------------------------------------------------------------------

    /// Store a value.
    pub fn set<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.data.insert(name.into(), Slot::Ready(Arc::new(value)));
    }

    /// Store a renderer producing the value on first [`get`](Self::get).
    pub fn set_with<T, F>(&mut self, name: impl Into<String>, render: F)
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T + Send + Sync + 'static,
    {
        let render: Renderer = Box::new(move || Arc::new(render()) as Payload);
        self.data.insert(name.into(), Slot::Deferred(render));
    }

    pub fn has(&self, name: &str) -> bool {
        self.data.contains_key(name)
    }

    /// Read a value once the drag completed, running and memoizing its renderer.
    ///
    /// `Ok(None)` when nothing of type `T` is stored under `name`.
    pub fn get<T: Any + Send + Sync>(&mut self, name: &str) -> Result<Option<Arc<T>>> {
        if self.aborted() {
            tracing::warn!(target: targets::DRAG, name, "data requested from an aborted drag");
            return Err(Error::DragAborted);
        }
        if !self.completed() {
            tracing::warn!(target: targets::DRAG, name, "data requested before drag completion");
            return Err(Error::DragIncomplete);
        }
        let payload = match self.data.remove(name) {
            None => return Ok(None),
            Some(Slot::Ready(payload)) => payload,
            Some(Slot::Deferred(render)) => render(),
        };
        self.data.insert(name.to_string(), Slot::Ready(payload.clone()));
        Ok(payload.downcast::<T>().ok())
    }

    /// Inspect a value without running its renderer. Usable before completion.
    pub fn peek<T: Any + Send + Sync>(&self, name: &str) -> Result<Option<Peek<T>>> {
        if self.aborted() {
            return Err(Error::DragAborted);
        }
        Ok(match self.data.get(name) {
            None => None,
            Some(Slot::Ready(payload)) => payload.clone().downcast::<T>().ok().map(Peek::Ready),
            Some(Slot::Deferred(_)) => Some(Peek::Deferred),
        })
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// Register teardown to run once when the drag ends.
    pub fn add_cleaner(&mut self, cleaner: impl FnOnce() + Send + Sync + 'static) {
        self.cleaners.push(Box::new(cleaner));
    }

    /// Ask the source whether this drag may proceed.
    pub fn begin(&mut self) -> bool {
        let source = self.source.clone();
        let accepted = source.before_drag(self);
        if accepted {
            source.set_active_drag(Some(self.id));
        }
        accepted
    }

    /// Process a pointer move.
    pub fn pointer_move(&mut self, event: PointerEvent) {
        if self.completed() {
            return;
        }
        let significant = self.distance(&event) >= self.config.threshold;
        self.sync_flags(&event);

        if self.touch_delay_active(&event) {
            if significant {
                tracing::debug!(
                    target: targets::DRAG,
                    "touch moved before the start delay, treating as scroll"
                );
                self.abort();
            }
            return;
        }
        if event.target.is_none() {
            return;
        }

        if significant && !self.started() {
            self.event = event.clone();
            if !self.start() {
                self.abort();
                return;
            }
        }
        if self.started() && !self.completed() {
            self.last_move_event = Some(event.clone());
            self.event = event;
            self.track();
        }
    }

    /// Process the pointer release that ends the gesture.
    pub fn end(&mut self, event: PointerEvent) {
        self.sync_flags(&event);
        let last = self.last_move_event.clone();
        self.event = event.clone();
        self.end_event = Some(event.clone());

        if !self.started() {
            return;
        }
        let moved = last
            .as_ref()
            .is_none_or(|last| last.client != event.client || last.target != event.target);
        if moved {
            self.track();
        }
        if let Some(within) = self.source.drag_swallow_click_time() {
            self.host.swallow_click(within);
        }
        self.state = DragState::Dropped;
        tracing::debug!(target: targets::DRAG, id = ?self.id, valid = self.valid(), "drag dropped");

        if let Some(target) = self.target.clone() {
            if !is_source(&target, &self.source) {
                target.drag_drop(self);
            }
        }
    }

    /// Abort the drag. Teardown and the source notification run once even if
    /// called repeatedly.
    pub fn abort(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        if let Some(element) = self.element {
            self.host.force_layout(element);
        }
        if self.state != DragState::Dropped {
            tracing::debug!(target: targets::DRAG, id = ?self.id, "drag aborted");
            self.state = DragState::Aborted;
            self.cleanup();
        }
        let source = self.source.clone();
        source.end_drag(self);
    }

    /// Escape aborts; Control and Alt replay the last move with the new modifiers.
    pub fn key_down(&mut self, event: &KeyEvent) {
        if self.completed() {
            return;
        }
        match event.key {
            Key::Escape => self.abort(),
            Key::Control | Key::Alt => self.fake_key(&event.key, true),
            _ => {}
        }
    }

    pub fn key_up(&mut self, event: &KeyEvent) {
        if !self.completed() && matches!(event.key, Key::Control | Key::Alt) {
            self.fake_key(&event.key, false);
        }
    }

    /// The window lost focus.
    pub fn window_blur(&mut self) {
        if self.started() && !self.completed() {
            self.abort();
        }
    }

    /// An auto scroll step happened; re-evaluate the last pointer position.
    pub fn scrolled(&mut self, action: ScrollerAction) {
        if self.completed() || self.element.is_none() {
            return;
        }
        let Some(mut last) = self.last_move_event.take() else {
            return;
        };
        last.is_scroll = true;
        self.last_move_event = Some(last.clone());
        self.event = last;
        self.scroller_action = Some(action);
        self.track();
        self.scroller_action = None;
    }

    /// Run teardown and release the target and source bindings.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.cleanup();
        if let Some(target) = self.target.take() {
            target.drag_leave(self);
        }
        let source = self.source.clone();
        if source.active_drag() == Some(self.id) {
            source.set_active_drag(None);
        }
    }

    fn start(&mut self) -> bool {
        self.state = DragState::Dragging;
        let root = self.source.drag_root_element();
        tracing::debug!(target: targets::DRAG, id = ?self.id, root = %root, "drag started");

        if let Some(monitor) = self.scroll_monitor.clone() {
            let id = monitor.start_monitoring(MonitorRequest {
                element: root,
                direction: self.config.drag_lock.into(),
            });
            self.add_cleaner(move || monitor.stop_monitoring(id));
        }

        let outer = self
            .host
            .closest(root, OUTER_SELECTOR)
            .unwrap_or_else(|| self.host.document_body());
        let class = self.config.dragging_class.clone();
        self.host.add_class(outer, &class);
        let host = self.host.clone();
        self.add_cleaner(move || host.remove_class(outer, &class));

        let source = self.source.clone();
        if !source.start_drag(self) {
            self.cleanup();
            return false;
        }
        true
    }

    fn cleanup(&mut self) {
        while let Some(cleaner) = self.cleaners.pop() {
            cleaner();
        }
    }

    fn touch_delay_active(&self, event: &PointerEvent) -> bool {
        let delay = self.config.touch_start_delay;
        self.start_event.is_touch()
            && !delay.is_zero()
            && event.time.saturating_sub(self.start_event.time) < delay
    }

    fn sync_flags(&mut self, event: &PointerEvent) {
        let modifiers = event.modifiers;
        self.modifiers = KeyboardModifiers {
            control: modifiers.control || modifiers.meta,
            ..modifiers
        };
    }

    fn fake_key(&mut self, key: &Key, down: bool) {
        if self.element.is_none() {
            return;
        }
        let Some(mut last) = self.last_move_event.take() else {
            return;
        };
        last.is_key = true;
        self.last_move_event = Some(last.clone());

        let flag = match key {
            Key::Alt => &mut self.modifiers.alt,
            Key::Control => &mut self.modifiers.control,
            _ => return,
        };
        if *flag != down {
            *flag = down;
            self.event = last;
            self.track();
        }
    }

    fn track(&mut self) {
        let mut element = self.event.target;
        // Touch events keep their original target; resolve what is under the finger.
        if self.event.is_touch() && self.event.phase == PointerPhase::Move {
            element = self.host.element_from_point(self.event.client);
        }
        let before = self.target.clone();
        self.update_target_element(element);
        if same_zone(&before, &self.target) {
            if let Some(target) = self.target.clone() {
                target.drag_move(self);
            }
        }
        let source = self.source.clone();
        source.track_drag(self);
        tracing::trace!(
            target: targets::DRAG,
            x = self.event.client.x,
            y = self.event.client.y,
            has_target = self.target.is_some(),
            "drag tracked"
        );
    }

    /// Resolve the drop target for `element`: walk up from it and take the
    /// first registered zone that contains it and accepts the drag.
    fn update_target_element(&mut self, element: Option<ElementId>) {
        if element == self.target_element {
            return;
        }
        self.target_element = element;
        let Some(element) = element else {
            self.set_target(None);
            return;
        };

        let mut node = Some(element);
        while let Some(current) = node {
            for droppable in self.registry.droppables_at(current) {
                let root = droppable.drop_root_element();
                if !self.host.contains(root, element) {
                    continue;
                }
                let selected = droppable.droppable_selector().is_none_or(|selector| {
                    self.host
                        .closest(element, selector)
                        .is_some_and(|hit| self.host.contains(root, hit))
                });
                if selected {
                    let candidate = Some(droppable);
                    self.set_target(candidate.clone());
                    if same_zone(&self.target, &candidate) {
                        return;
                    }
                }
            }
            node = self.host.parent(current);
        }
        self.set_target(None);
    }

    fn set_target(&mut self, target: Option<Arc<dyn Droppable>>) {
        if same_zone(&target, &self.target) {
            return;
        }
        let was = self.target.take();
        self.previous_target = was.clone();
        if let Some(was) = &was {
            was.drag_leave(self);
        }

        let mut accepted = target;
        if let Some(candidate) = accepted.clone() {
            self.target = Some(candidate.clone());
            let welcome = candidate.drag_enter(self);
            self.target = None;
            if !welcome {
                accepted = None;
                self.valid = false;
            }
        }
        if same_zone(&accepted, &was) {
            return;
        }

        self.target = accepted.clone();
        let source = self.source.clone();
        if let Some(was) = &was {
            source.drag_leave_target(self, was);
        }
        if let Some(target) = accepted {
            self.valid = true;
            // Targets always see a move on entry.
            target.drag_move(self);
            source.drag_enter_target(self);
        }
    }
}

impl Drop for DragContext {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for DragContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragContext")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("target_element", &self.target_element)
            .field("has_target", &self.target.is_some())
            .field("valid", &self.valid)
            .finish()
    }
}

static_assertions::assert_impl_all!(DragContext: Send, Sync);
