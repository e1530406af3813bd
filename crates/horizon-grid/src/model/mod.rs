//! The record store.
//!
//! This module provides the data layer of Horizon Grid: records, the
//! [`Store`] that holds them, and the filter, sorter and grouper definitions
//! that derive the visible record sequence a view renders.
//!
//! # Core Types
//!
//! - `Record`: a shared, uniquely identified data entity (plain row, group
//!   header, group footer or group link), optionally part of a tree
//! - `FieldValue`: a dynamically typed field value
//! - `Store`: ordered records plus filter/sort/group state and signals
//! - `CollectionFilter`, `Sorter`, `Grouper`: the view definitions
//!
//! # Architecture Overview
//!
//! ```text
//! ┌───────────────┐  filter / sort / group   ┌────────────────────┐
//! │ data records  │─────────────────────────>│ Collection<Record> │
//! │ (flat / tree) │                          │  all  │  visible   │
//! └───────────────┘                          └────────────────────┘
//!         │                                            │
//!         │          ┌──────────────┐                  │
//!         └─────────>│ StoreSignals │<─────────────────┘
//!                    └──────────────┘
//! ```
//!
//! Views render the visible sequence and subscribe to the store's signals
//! to re-render the delta.

mod filter;
mod grouper;
mod record;
mod sorter;
mod store;
mod store_filter;
mod store_group;
mod summary;
mod tree;
mod value;

pub use filter::{
    CollectionFilter, FilterByFn, FilterDelta, FilterOperator, FilterOptions, FilterOutcome,
    FilterRequest, FilterSpec,
};
pub use grouper::{GroupField, GroupSortFn, GroupValueFn, Grouper, NO_VALUE};
pub use record::{
    GroupFooter, GroupHeader, Record, RecordData, RecordId, RecordKind, RecordMeta, StoreId,
};
pub use sorter::{SortFn, Sorter, compare_all};
pub use store::{
    Descendants, IdMapEntry, Store, StoreAction, StoreConfig, StoreEvent, StoreSignals,
    ToggleGroupEvent,
};
pub use store_filter::FiltersFn;
pub use store_group::GroupOptions;
pub use tree::RecordTreeDebug;
pub use value::FieldValue;
