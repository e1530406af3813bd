//! Pointer gesture state machines.
//!
//! - [`DragContext`]: one drag-and-drop interaction between a [`DragSource`]
//!   and the [`Droppable`] zones of a [`DroppableRegistry`]
//! - [`ResizeHelper`]: edge resizing of elements through real or virtual handles
//! - [`InputState`]: modifier, key and pointer bookkeeping of a UI root
//!
//! Both state machines are toolkit independent. They read geometry from and
//! apply classes, sizes and translations to an [`ElementHost`];
//! [`HeadlessDom`] is an in-memory host for tests and simulations.
//!
//! # Feeding events
//!
//! ```ignore
//! let mut input = InputState::new(host.is_hoverable_device());
//! input.attach();
//!
//! let config = ResizeConfig::default();
//! let mut resizer = ResizeHelper::new(config, host.clone(), grid_element, &input);
//! resizer.add_listener(column_resize_listener);
//!
//! // in the event loop
//! input.handle_pointer(&event);
//! match event.phase {
//!     PointerPhase::Down => { resizer.pointer_down(&event); }
//!     PointerPhase::Move => resizer.pointer_move(&event),
//!     PointerPhase::Up => resizer.pointer_up(&event),
//! }
//! ```

mod drag;
mod event;
mod headless;
mod host;
mod input;
mod resize;

pub use drag::{
    DragConfig, DragContext, DragId, DragLock, DragSource, DragState, Droppable, DroppableRegistry,
    Peek,
};
pub use event::{
    Key, KeyEvent, KeyboardModifiers, MouseButton, PointerEvent, PointerKind, PointerPhase,
};
pub use headless::{HeadlessDom, RecordingScrollMonitor};
pub use host::{
    ElementHost, ElementId, ExtremalSize, MonitorId, MonitorRequest, ScrollDirection, ScrollMonitor,
    ScrollerAction,
};
pub use input::InputState;
pub use resize::{Direction, Edge, ResizeConfig, ResizeContext, ResizeHelper, ResizeListener};
