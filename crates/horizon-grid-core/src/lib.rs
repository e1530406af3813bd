//! Core systems for Horizon Grid.
//!
//! This crate provides the foundational components the grid data layer and
//! gesture helpers are built on:
//!
//! - **Signal/Slot System**: Type-safe change notification
//! - **Collection**: Insertion-ordered, uniquely keyed storage with a filtered view
//!   and a generation counter for cache staleness checks
//! - **Geometry**: Points, sizes and rectangles in CSS pixel space
//! - **Logging**: Tracing targets, performance spans and debug formatting options
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_grid_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//!
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```

pub mod collection;
pub mod geometry;
pub mod logging;
pub mod signal;

pub use collection::{ChangeAction, Collection, CollectionChange, CollectionFilterFn, Keyed};
pub use geometry::{Point, Rect, Size};
pub use logging::{PerfSpan, TreeFormatOptions, TreeStyle};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
