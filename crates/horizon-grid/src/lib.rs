//! Horizon Grid - the data and interaction core of a grid UI.
//!
//! - **Store** ([`model`]): an ordered record store with filtering, sorting,
//!   grouping (headers, footers, collapse, multi-value links) and tree
//!   hierarchies, producing the visible sequence a view renders
//! - **Gestures** ([`gesture`]): the drag-and-drop and edge-resize state
//!   machines, driven through a toolkit-independent element host
//! - **Configuration** ([`config`]): TOML/JSON loading of the store, drag
//!   and resize settings
//!
//! # Example
//!
//! ```
//! use horizon_grid::prelude::*;
//!
//! let mut store = Store::new(StoreConfig::default());
//! store.add(vec![
//!     Record::new(1, [("type", "fruit"), ("name", "apple")]),
//!     Record::new(2, [("type", "veggie"), ("name", "leek")]),
//! ]);
//! store.group_by("type").unwrap();
//!
//! // Two headers, two records.
//! assert_eq!(store.count(), 4);
//! ```

pub mod config;
pub mod error;
pub mod gesture;
pub mod model;
pub mod prelude;

pub use error::{Error, Result};
pub use horizon_grid_core as core;

static_assertions::assert_impl_all!(model::Store: Send, Sync);
static_assertions::assert_impl_all!(model::Record: Send, Sync);
static_assertions::assert_impl_all!(gesture::DragContext: Send, Sync);
static_assertions::assert_impl_all!(gesture::ResizeHelper: Send, Sync);
