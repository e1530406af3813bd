//! Prelude module for Horizon Grid.
//!
//! This module re-exports the most commonly used types for convenient importing:
//!
//! ```ignore
//! use horizon_grid::prelude::*;
//! ```
//!
//! This provides access to:
//! - The record store (`Store`, `Record`, `FieldValue`) and its filter,
//!   sorter and grouper definitions
//! - The gesture state machines (`DragContext`, `ResizeHelper`) and the
//!   element host contract they drive
//! - Configuration (`GridConfig`) and the crate `Error`/`Result`
//! - Signals and geometry from the core crate

// ============================================================================
// Store
// ============================================================================

pub use crate::model::{
    CollectionFilter, FieldValue, FilterOperator, GroupOptions, Grouper, Record, RecordData,
    RecordId, Sorter, Store, StoreAction, StoreConfig, StoreEvent,
};

// ============================================================================
// Gestures
// ============================================================================

pub use crate::gesture::{
    DragConfig, DragContext, DragSource, Droppable, DroppableRegistry, Edge, ElementHost, ElementId,
    InputState, Key, KeyEvent, PointerEvent, ResizeConfig, ResizeContext, ResizeHelper,
    ResizeListener,
};

// ============================================================================
// Configuration and Errors
// ============================================================================

pub use crate::config::GridConfig;
pub use crate::error::{Error, Result};

// ============================================================================
// Core
// ============================================================================

pub use horizon_grid_core::{ConnectionId, Point, Rect, Signal, Size};
