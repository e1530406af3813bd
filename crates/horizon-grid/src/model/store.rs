//! The record store.
//!
//! A [`Store`] owns an ordered [`Collection`] of [`Record`]s plus the
//! filter, sorter and grouper state that derives the *visible* record
//! sequence from it. Flat stores keep their records directly in the
//! collection; tree stores keep a hierarchy below a root node and flatten
//! its expanded, filtered part into the collection.
//!
//! The filter engine lives in `store_filter.rs`, the grouping engine in
//! `store_group.rs` and the aggregate functions in `summary.rs`; all of
//! them are `impl Store` blocks over the state defined here.
//!
//! # Events
//!
//! Observers connect to the signals in [`StoreSignals`]. Slots are invoked
//! synchronously while the store is mutably borrowed, so they must not call
//! back into the store.
//!
//! # Example
//!
//! ```ignore
//! use horizon_grid::model::{Record, Store, StoreConfig, CollectionFilter};
//!
//! let mut store = Store::new(StoreConfig::default());
//! store.add(vec![
//!     Record::new(1, [("type", "A")]),
//!     Record::new(2, [("type", "B")]),
//! ]);
//!
//! store.signals().filter.connect(|event| {
//!     println!("{} records visible", event.records.len());
//! });
//!
//! store.filter(CollectionFilter::new("type", "A"));
//! assert_eq!(store.count(), 1);
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;

use horizon_grid_core::logging::{span_names, targets};
use horizon_grid_core::{ChangeAction, Collection, PerfSpan, Signal};
use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::filter::CollectionFilter;
use super::grouper::Grouper;
use super::record::{Record, RecordId, StoreId};
use super::sorter::{Sorter, compare_all};
use super::store_filter::FiltersFn;
use super::tree;
use super::value::FieldValue;
use crate::error::{Error, Result};

/// Store behavior switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Field holding the record id when loading data.
    pub id_field: String,
    /// Run records added while filtered through the filters.
    pub reapply_filter_on_add: bool,
    /// Re-run the filters after a record update.
    pub reapply_filter_on_update: bool,
    /// Append a footer row to each group.
    pub use_group_footers: bool,
    /// Groups start collapsed on the first grouping pass.
    pub start_groups_collapsed: bool,
    /// Hold records in a hierarchy below a root node.
    pub tree: bool,
    /// Tree filter passes test the top level nodes only. Surviving nodes keep
    /// their whole subtree.
    pub shallow_tree_filter: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            id_field: "id".to_string(),
            reapply_filter_on_add: false,
            reapply_filter_on_update: false,
            use_group_footers: false,
            start_groups_collapsed: false,
            tree: false,
            shallow_tree_filter: false,
        }
    }
}

impl StoreConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the id field.
    pub fn id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    /// Filter records added while filtered.
    pub fn reapply_filter_on_add(mut self, enable: bool) -> Self {
        self.reapply_filter_on_add = enable;
        self
    }

    /// Re-run the filters after record updates.
    pub fn reapply_filter_on_update(mut self, enable: bool) -> Self {
        self.reapply_filter_on_update = enable;
        self
    }

    /// Append footer rows to groups.
    pub fn use_group_footers(mut self, enable: bool) -> Self {
        self.use_group_footers = enable;
        self
    }

    /// Start groups collapsed.
    pub fn start_groups_collapsed(mut self, enable: bool) -> Self {
        self.start_groups_collapsed = enable;
        self
    }

    /// Make this a tree store.
    pub fn tree(mut self, enable: bool) -> Self {
        self.tree = enable;
        self
    }

    /// Filter only the top level of a tree store.
    pub fn shallow_tree_filter(mut self, enable: bool) -> Self {
        self.shallow_tree_filter = enable;
        self
    }
}

/// What caused a store event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAction {
    Add,
    Remove,
    RemoveAll,
    Update,
    Move,
    Sort,
    Filter,
    Group,
    /// A tree node was expanded or collapsed.
    ToggleNode,
    /// The dataset was (re)loaded.
    Dataset,
}

/// Payload of the store's record events.
#[derive(Debug, Clone)]
pub struct StoreEvent {
    pub action: StoreAction,
    /// For filter, sort and group events the visible records after the change;
    /// otherwise the records the action applied to.
    pub records: Vec<Record>,
    pub added: Vec<Record>,
    pub removed: Vec<Record>,
    pub filters: Vec<CollectionFilter>,
    pub groupers: Vec<Grouper>,
    pub is_grouped: bool,
    /// Visible count before a filter pass.
    pub old_count: usize,
    /// Fields changed by an update.
    pub changes: Vec<String>,
}

impl StoreEvent {
    /// An event with empty payload.
    pub fn new(action: StoreAction) -> Self {
        Self {
            action,
            records: Vec::new(),
            added: Vec::new(),
            removed: Vec::new(),
            filters: Vec::new(),
            groupers: Vec::new(),
            is_grouped: false,
            old_count: 0,
            changes: Vec::new(),
        }
    }

    pub(crate) fn with_records(mut self, records: Vec<Record>) -> Self {
        self.records = records;
        self
    }
}

/// Payload of [`StoreSignals::toggle_group`].
#[derive(Debug, Clone)]
pub struct ToggleGroupEvent {
    pub header: Record,
    pub collapse: bool,
}

/// Signals emitted by a [`Store`].
#[derive(Default)]
pub struct StoreSignals {
    /// Emitted before a filter pass with the current filters.
    pub before_filter: Signal<Vec<CollectionFilter>>,
    /// Emitted after a filter pass.
    pub filter: Signal<StoreEvent>,
    /// Emitted whenever the visible sequence was rebuilt.
    pub refresh: Signal<StoreEvent>,
    /// Emitted for every data change, including filter passes.
    pub change: Signal<StoreEvent>,
    /// Emitted after grouping changed.
    pub group: Signal<StoreEvent>,
    /// Emitted after sorting.
    pub sort: Signal<StoreEvent>,
    /// Emitted when a group header is collapsed or expanded.
    pub toggle_group: Signal<ToggleGroupEvent>,
}

/// Cached location of a record.
#[derive(Debug, Clone)]
pub struct IdMapEntry {
    pub record: Record,
    /// Position in the visible sequence.
    pub index: Option<usize>,
    /// Position in the full sequence.
    pub all_index: Option<usize>,
}

/// Flattened descendants of a tree node.
#[derive(Debug, Clone, Default)]
pub struct Descendants {
    /// Descendants reachable through expanded nodes.
    pub visible: Vec<Record>,
    /// Every (filtered-in) descendant.
    pub all: Vec<Record>,
}

/// An ordered, filterable, groupable record store.
pub struct Store {
    pub(crate) id: StoreId,
    pub(crate) config: StoreConfig,
    pub(crate) storage: Collection<Record>,
    /// Every record the store holds, including collapsed group members and group rows.
    pub(crate) registry: HashMap<RecordId, Record>,
    pub(crate) id_map: RwLock<Option<HashMap<RecordId, IdMapEntry>>>,

    pub(crate) filters: Collection<CollectionFilter>,
    pub(crate) filters_fn: RwLock<Option<FiltersFn>>,
    pub(crate) filter_batching: usize,
    pub(crate) needs_filtering: bool,
    pub(crate) last_filter_signature: Option<String>,
    /// Updated records kept visible through regrouping although they no
    /// longer pass the filters. Cleared by the next filter pass.
    pub(crate) group_visible_record_ids: Vec<RecordId>,
    /// Top level tree nodes that survive shallow filter passes.
    pub(crate) force_included: HashSet<RecordId>,

    pub(crate) sorters: Vec<Sorter>,

    pub(crate) groupers: Option<Vec<Grouper>>,
    pub(crate) group_info: Option<Grouper>,
    pub(crate) group_records: Collection<Record>,
    pub(crate) collapsed_groups: IndexSet<RecordId>,
    pub(crate) unfiltered_group_records: RwLock<Option<(u64, Vec<Record>)>>,

    pub(crate) root: Option<Record>,

    batch_depth: usize,
    batch_records: IndexMap<RecordId, Record>,
    batch_changes: IndexSet<String>,

    signals: StoreSignals,
}

impl Store {
    /// Create an empty store. Tree stores get a root node.
    pub fn new(config: StoreConfig) -> Self {
        let mut storage = Collection::new();
        storage.set_auto_filter(config.reapply_filter_on_add);
        let root = config
            .tree
            .then(|| Record::new_tree_root(RecordId::Str("__root__".to_string())));
        Self {
            id: StoreId::next(),
            config,
            storage,
            registry: HashMap::new(),
            id_map: RwLock::new(None),
            filters: Collection::new(),
            filters_fn: RwLock::new(None),
            filter_batching: 0,
            needs_filtering: false,
            last_filter_signature: None,
            group_visible_record_ids: Vec::new(),
            force_included: HashSet::new(),
            sorters: Vec::new(),
            groupers: None,
            group_info: None,
            group_records: Collection::new(),
            collapsed_groups: IndexSet::new(),
            unfiltered_group_records: RwLock::new(None),
            root,
            batch_depth: 0,
            batch_records: IndexMap::new(),
            batch_changes: IndexSet::new(),
            signals: StoreSignals::default(),
        }
    }

    /// Create a store holding `records`.
    pub fn with_records(config: StoreConfig, records: impl IntoIterator<Item = Record>) -> Self {
        let mut store = Self::new(config);
        store.add(records);
        store
    }

    /// The store's identity; records remember which stores they joined.
    pub fn id(&self) -> StoreId {
        self.id
    }

    /// The store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Configure whether records added while filtered are filtered.
    pub fn set_reapply_filter_on_add(&mut self, enable: bool) {
        self.config.reapply_filter_on_add = enable;
        self.storage.set_auto_filter(enable);
    }

    /// Configure whether updates re-run the filters.
    pub fn set_reapply_filter_on_update(&mut self, enable: bool) {
        self.config.reapply_filter_on_update = enable;
    }

    /// The store's signals.
    pub fn signals(&self) -> &StoreSignals {
        &self.signals
    }

    /// The underlying ordered collection.
    pub fn storage(&self) -> &Collection<Record> {
        &self.storage
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Number of visible records (group rows included).
    pub fn count(&self) -> usize {
        self.storage.len()
    }

    /// Number of records in the full sequence, filtered or not.
    pub fn all_count(&self) -> usize {
        self.storage.total_len()
    }

    /// Returns `true` if no record is visible.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// The visible records in order.
    pub fn records(&self) -> Vec<Record> {
        self.storage.to_vec()
    }

    /// All records of the full sequence in order.
    pub fn all_records(&self) -> Vec<Record> {
        self.storage.all_to_vec()
    }

    /// The visible record at `index`.
    pub fn get_at(&self, index: usize) -> Option<Record> {
        self.storage.get_index(index).cloned()
    }

    /// First visible record.
    pub fn first(&self) -> Option<Record> {
        self.storage.first().cloned()
    }

    /// Last visible record.
    pub fn last(&self) -> Option<Record> {
        self.storage.last().cloned()
    }

    /// Returns `true` for tree stores.
    pub fn is_tree(&self) -> bool {
        self.root.is_some()
    }

    /// The root node of a tree store.
    pub fn root(&self) -> Option<&Record> {
        self.root.as_ref()
    }

    /// Returns `true` if `record` (this exact row) belongs to the store.
    pub fn contains(&self, record: &Record) -> bool {
        self.registry.get(record.id()).is_some_and(|r| r.ptr_eq(record))
    }

    /// Look a record up by id, whether visible, filtered out or in a collapsed group.
    pub fn get_by_id(&self, id: impl Into<RecordId>) -> Option<Record> {
        self.id_map_entry(&id.into()).map(|entry| entry.record)
    }

    /// Cached location of a record.
    pub fn id_map_entry(&self, id: &RecordId) -> Option<IdMapEntry> {
        if let Some(map) = self.id_map.read().as_ref() {
            return map.get(id).cloned();
        }
        let map = self.build_id_map();
        let entry = map.get(id).cloned();
        *self.id_map.write() = Some(map);
        entry
    }

    /// Position of a record in the visible sequence.
    pub fn index_of(&self, id: impl Into<RecordId>) -> Option<usize> {
        self.id_map_entry(&id.into()).and_then(|entry| entry.index)
    }

    /// Position of a record in the full sequence.
    pub fn all_index_of(&self, id: impl Into<RecordId>) -> Option<usize> {
        self.id_map_entry(&id.into()).and_then(|entry| entry.all_index)
    }

    /// The visible record before `record`.
    ///
    /// With `wrap` the search continues from the end; with `skip_special_rows`
    /// group headers and footers are passed over.
    pub fn get_prev(&self, record: &Record, wrap: bool, skip_special_rows: bool) -> Option<Record> {
        self.step(record, wrap, skip_special_rows, false)
    }

    /// The visible record after `record`.
    pub fn get_next(&self, record: &Record, wrap: bool, skip_special_rows: bool) -> Option<Record> {
        self.step(record, wrap, skip_special_rows, true)
    }

    fn step(
        &self,
        record: &Record,
        wrap: bool,
        skip_special_rows: bool,
        forward: bool,
    ) -> Option<Record> {
        let start = self.storage.index_of(record.id())?;
        let count = self.storage.len();
        let mut index = start;
        for _ in 1..count.max(1) {
            index = match (forward, index) {
                (true, i) if i + 1 < count => i + 1,
                (true, _) if wrap => 0,
                (false, 0) if wrap => count - 1,
                (false, i) if i > 0 => i - 1,
                _ => return None,
            };
            let candidate = self.storage.get_index(index)?;
            if !(skip_special_rows && candidate.is_special_row()) {
                return Some(candidate.clone());
            }
        }
        None
    }

    /// Data records (no group rows or links) including those in collapsed groups,
    /// in store order. Tree stores return every node below the root.
    pub fn data_records(&self) -> Vec<Record> {
        if let Some(root) = &self.root {
            return tree::collect_all_nodes(root);
        }
        let mut records = Vec::new();
        for record in self.storage.all_values() {
            if record.is_group_header() {
                if record.is_collapsed() {
                    records.extend(
                        record
                            .unfiltered_group_children()
                            .into_iter()
                            .filter(|r| !r.is_special_row() && !r.is_linked()),
                    );
                }
            } else if !record.is_special_row() && !record.is_linked() {
                records.push(record.clone());
            }
        }
        records
    }

    /// Distinct values of `field` over the data records, in first-seen order.
    pub fn distinct_values(&self, field: &str) -> Vec<FieldValue> {
        let mut values: Vec<FieldValue> = Vec::new();
        for record in self.data_records() {
            let value = record.get(field);
            if !values.contains(&value) {
                values.push(value);
            }
        }
        values
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Append records. Records whose id is already present are skipped.
    ///
    /// Tree stores append to the root. Returns the records actually added.
    pub fn add(&mut self, records: impl IntoIterator<Item = Record>) -> Vec<Record> {
        let records: Vec<Record> = records.into_iter().collect();
        if records.is_empty() {
            return records;
        }
        if let Some(root) = self.root.clone() {
            return self.insert_child_nodes(&root, None, records);
        }
        let index = self.storage.total_len();
        self.insert_records(index, records)
    }

    /// Insert records before the visible record at `index`.
    pub fn insert(
        &mut self,
        index: usize,
        records: impl IntoIterator<Item = Record>,
    ) -> Vec<Record> {
        let records: Vec<Record> = records.into_iter().collect();
        if records.is_empty() {
            return records;
        }
        if let Some(root) = self.root.clone() {
            return self.insert_child_nodes(&root, Some(index), records);
        }
        let all_index = self
            .storage
            .get_index(index)
            .and_then(|r| self.storage.all_index_of(r.id()))
            .unwrap_or(self.storage.total_len());
        self.insert_records(all_index, records)
    }

    fn insert_records(&mut self, index: usize, records: Vec<Record>) -> Vec<Record> {
        let records: Vec<Record> = records
            .into_iter()
            .filter(|r| !self.registry.contains_key(r.id()))
            .collect();
        let added = self.storage.insert(index, records);
        if added.is_empty() {
            return added;
        }
        for record in &added {
            self.register(record);
        }
        tracing::debug!(target: targets::STORE, count = added.len(), "records added");

        self.signals
            .change
            .emit(StoreEvent::new(StoreAction::Add).with_records(added.clone()));
        self.on_data_changed(StoreAction::Add, None);
        added
    }

    /// Remove records. Group rows cannot be removed directly.
    pub fn remove<'a>(&mut self, records: impl IntoIterator<Item = &'a Record>) -> Vec<Record> {
        let ids: Vec<RecordId> = records.into_iter().map(|r| r.id().clone()).collect();
        self.remove_by_id(&ids)
    }

    /// Remove records by id. Unknown ids are ignored.
    pub fn remove_by_id(&mut self, ids: &[RecordId]) -> Vec<Record> {
        let doomed: Vec<Record> = ids
            .iter()
            .filter_map(|id| self.registry.get(id).cloned())
            .filter(|r| !r.is_special_row() && !r.is_root())
            .collect();
        if doomed.is_empty() {
            return doomed;
        }

        if self.root.is_some() {
            for node in &doomed {
                if let Some(parent) = node.parent() {
                    parent.remove_child(node);
                    tree::update_child_indices(&parent);
                }
                node.set_parent(None);
                for descendant in tree::collect_all_nodes(node) {
                    self.unregister(&descendant);
                }
                self.unregister(node);
            }
            self.refresh_tree_view();
        } else {
            let mut keys: Vec<RecordId> = Vec::new();
            for record in &doomed {
                if let Some(header) = record.group_parent(self.id) {
                    header.remove_group_member(record);
                }
                keys.push(record.id().clone());
                let links: Vec<Record> = self
                    .registry
                    .values()
                    .filter(|r| r.is_linked() && r.original_id() == record.id())
                    .cloned()
                    .collect();
                for link in links {
                    if let Some(header) = link.group_parent(self.id) {
                        header.remove_group_member(&link);
                    }
                    keys.push(link.id().clone());
                    self.unregister(&link);
                }
                self.unregister(record);
            }
            self.storage.remove(keys.iter());
            self.invalidate_id_map();
            self.on_data_change(ChangeAction::Splice, &doomed);
        }

        tracing::debug!(target: targets::STORE, count = doomed.len(), "records removed");
        self.signals
            .change
            .emit(StoreEvent::new(StoreAction::Remove).with_records(doomed.clone()));
        self.on_data_changed(StoreAction::Remove, None);
        doomed
    }

    /// Remove every record. Filters, sorters and groupers stay configured.
    pub fn remove_all(&mut self) -> Vec<Record> {
        let removed = self.data_records();
        if let Some(root) = &self.root {
            root.set_children(Vec::new());
            root.set_ordered_children(Vec::new());
            root.set_unfiltered_children(None);
        }
        self.storage.clear();
        for record in self.registry.values() {
            record.leave_store(self.id);
            record.clear_group_parent(self.id);
        }
        self.registry.clear();
        self.group_records = Collection::new();
        self.collapsed_groups.clear();
        self.invalidate_id_map();
        tracing::debug!(target: targets::STORE, count = removed.len(), "store cleared");
        self.signals
            .change
            .emit(StoreEvent::new(StoreAction::RemoveAll).with_records(removed.clone()));
        removed
    }

    /// Change fields of `record`. Returns the names of the fields that actually changed.
    ///
    /// Between [`begin_batch`](Self::begin_batch) and [`end_batch`](Self::end_batch)
    /// the store reacts once, when the batch ends.
    pub fn update<K, V>(
        &mut self,
        record: &Record,
        changes: impl IntoIterator<Item = (K, V)>,
    ) -> Vec<String>
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let mut changed = Vec::new();
        for (field, value) in changes {
            let field = field.into();
            if record.set(&field, value) {
                changed.push(field);
            }
        }
        if changed.is_empty() {
            return changed;
        }
        if self.batch_depth > 0 {
            self.batch_records.insert(record.id().clone(), record.clone());
            self.batch_changes.extend(changed.iter().cloned());
            return changed;
        }
        self.after_update(vec![record.clone()], changed.clone());
        changed
    }

    /// Start collecting updates.
    pub fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    /// Finish a batch; the outermost call reacts to all collected updates at once.
    pub fn end_batch(&mut self) {
        self.batch_depth = self.batch_depth.saturating_sub(1);
        if self.batch_depth > 0 || self.batch_records.is_empty() {
            return;
        }
        let records: Vec<Record> = std::mem::take(&mut self.batch_records).into_values().collect();
        let changes: Vec<String> = std::mem::take(&mut self.batch_changes).into_iter().collect();
        self.after_update(records, changes);
    }

    fn after_update(&mut self, records: Vec<Record>, changes: Vec<String>) {
        tracing::trace!(target: targets::STORE, count = records.len(), ?changes, "records updated");
        if self.config.reapply_filter_on_update && self.is_filtered() {
            self.filter(super::filter::FilterRequest::Reapply);
        } else if self.is_grouped() && self.is_filtered() {
            for record in &records {
                let id = record.id().clone();
                let was_visible = self.index_of(id.clone()).is_some();
                if was_visible && !self.group_visible_record_ids.contains(&id) {
                    self.group_visible_record_ids.push(id);
                }
            }
        }
        let mut event = StoreEvent::new(StoreAction::Update).with_records(records);
        event.changes = changes.clone();
        self.signals.change.emit(event);
        self.on_data_changed(StoreAction::Update, Some(&changes));
    }

    /// Move records so they sit directly before `before` (at the end for `None`).
    pub(crate) fn move_in_storage(&mut self, records: &[Record], before: Option<&Record>) {
        let keys: Vec<RecordId> = records.iter().map(|r| r.id().clone()).collect();
        self.storage.move_before(&keys, before.map(Record::id));
        self.invalidate_id_map();
        self.on_data_change(ChangeAction::Move, &[]);
        self.signals
            .change
            .emit(StoreEvent::new(StoreAction::Move).with_records(records.to_vec()));
    }

    /// Replace the data with records parsed from a JSON array of objects.
    ///
    /// Tree stores read nested `children` arrays.
    pub fn load_json(&mut self, json: &str) -> Result<Vec<Record>> {
        let values: Vec<FieldValue> = serde_json::from_str(json)?;
        self.remove_all();
        let mut loaded = Vec::new();
        match self.root.clone() {
            Some(root) => {
                for value in values {
                    self.load_node(&root, value, &mut loaded)?;
                }
                if self.is_filtered() {
                    self.filter(super::filter::FilterRequest::Reapply);
                } else {
                    self.refresh_tree_view();
                }
            }
            None => {
                let records = values
                    .into_iter()
                    .map(|value| Record::from_value(value, &self.config.id_field))
                    .collect::<Result<Vec<_>>>()?;
                loaded = self.add(records);
            }
        }
        tracing::debug!(target: targets::STORE, count = loaded.len(), "dataset loaded");
        self.signals
            .refresh
            .emit(StoreEvent::new(StoreAction::Dataset).with_records(self.storage.to_vec()));
        Ok(loaded)
    }

    fn load_node(
        &mut self,
        parent: &Record,
        value: FieldValue,
        loaded: &mut Vec<Record>,
    ) -> Result<()> {
        let FieldValue::Map(mut data) = value else {
            return Err(Error::invalid_data("tree nodes must be objects"));
        };
        let children = match data.remove("children") {
            Some(FieldValue::List(children)) => children,
            Some(FieldValue::None) | None => Vec::new(),
            Some(other) => {
                let message = format!("'children' must be a list, found '{other}'");
                return Err(Error::invalid_data(message));
            }
        };
        let node = Record::from_value(FieldValue::Map(data), &self.config.id_field)?;
        node.set_parent(Some(parent));
        parent.insert_child(&node, None);
        tree::update_child_indices(parent);
        self.register(&node);
        loaded.push(node.clone());
        for child in children {
            self.load_node(&node, child, loaded)?;
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Sorting
    // -------------------------------------------------------------------------

    /// The configured sorters.
    pub fn sorters(&self) -> &[Sorter] {
        &self.sorters
    }

    /// Returns `true` if sorters are configured.
    pub fn is_sorted(&self) -> bool {
        !self.sorters.is_empty()
    }

    /// Replace the sorters and sort.
    pub fn set_sorters(&mut self, sorters: Vec<Sorter>) {
        self.sorters = sorters;
        self.sort();
    }

    /// Add a sorter and sort.
    pub fn add_sorter(&mut self, sorter: Sorter) {
        self.sorters.push(sorter);
        self.sort();
    }

    /// Remove all sorters. Records keep their current order.
    pub fn clear_sorters(&mut self) {
        self.sorters.clear();
        self.sort();
    }

    /// Re-apply sorters and grouping to the data.
    pub fn sort(&mut self) {
        let _perf = PerfSpan::new(span_names::SORT);
        if let Some(root) = self.root.clone() {
            tree::sort_tree(&root, &self.sorters);
            self.refresh_tree_view();
        } else if self.is_grouped() {
            let (values, filtered) = self.prepare_group_records();
            self.storage.replace_values(values, filtered, true);
        } else if !self.sorters.is_empty() {
            let sorters = self.sorters.clone();
            self.storage.sort_by(|a, b| compare_all(&sorters, a, b));
        }
        self.invalidate_id_map();
        tracing::debug!(target: targets::STORE, sorters = self.sorters.len(), "store sorted");

        let event = StoreEvent::new(StoreAction::Sort).with_records(self.storage.to_vec());
        self.signals.sort.emit(event.clone());
        self.signals.refresh.emit(event);
    }

    // -------------------------------------------------------------------------
    // Tree
    // -------------------------------------------------------------------------

    /// Append `records` as children of `parent`.
    pub fn append_child(
        &mut self,
        parent: &Record,
        records: impl IntoIterator<Item = Record>,
    ) -> Result<Vec<Record>> {
        self.insert_child(parent, None, records)
    }

    /// Insert `records` as children of `parent` at `index` (append for `None`).
    ///
    /// Records already in the tree are moved from their current parent.
    pub fn insert_child(
        &mut self,
        parent: &Record,
        index: Option<usize>,
        records: impl IntoIterator<Item = Record>,
    ) -> Result<Vec<Record>> {
        let root = self.root.clone().ok_or(Error::NotATree)?;
        if !parent.ptr_eq(&root) && !self.contains(parent) {
            tracing::warn!(
                target: targets::STORE,
                id = %parent.id(),
                "parent is not part of the store"
            );
            return Err(Error::unknown_record(parent.id()));
        }
        let records: Vec<Record> = records.into_iter().collect();
        if let Some(node) = records.iter().find(|r| r.ptr_eq(parent) || r.is_ancestor_of(parent)) {
            tracing::warn!(
                target: targets::STORE,
                id = %node.id(),
                "refusing to move a node below itself"
            );
            let message = format!("node '{}' cannot become its own descendant", node.id());
            return Err(Error::invalid_data(message));
        }
        Ok(self.insert_child_nodes(parent, index, records))
    }

    fn insert_child_nodes(
        &mut self,
        parent: &Record,
        index: Option<usize>,
        records: Vec<Record>,
    ) -> Vec<Record> {
        let mut added = Vec::new();
        for (offset, node) in records.into_iter().enumerate() {
            if let Some(previous) = node.parent() {
                previous.remove_child(&node);
                tree::update_child_indices(&previous);
            } else if self.registry.contains_key(node.id()) {
                continue;
            }
            node.set_parent(Some(parent));
            parent.insert_child(&node, index.map(|i| i + offset));
            self.register(&node);
            for descendant in tree::collect_all_nodes(&node) {
                self.register(&descendant);
            }
            added.push(node);
        }
        if added.is_empty() {
            return added;
        }
        tree::update_child_indices(parent);
        if self.is_filtered() {
            self.filter(super::filter::FilterRequest::Reapply);
        } else {
            self.refresh_tree_view();
        }
        tracing::debug!(
            target: targets::STORE,
            parent = %parent.id(),
            count = added.len(),
            "nodes inserted"
        );
        self.signals
            .change
            .emit(StoreEvent::new(StoreAction::Add).with_records(added.clone()));
        added
    }

    /// Expand or collapse a tree node. Returns `true` if the state changed.
    pub fn set_node_expanded(&mut self, node: &Record, expanded: bool) -> Result<bool> {
        if self.root.is_none() {
            return Err(Error::NotATree);
        }
        if !self.contains(node) {
            return Err(Error::unknown_record(node.id()));
        }
        if node.is_expanded() == expanded {
            return Ok(false);
        }
        node.set_expanded_flag(expanded);
        self.refresh_tree_view();
        self.signals
            .refresh
            .emit(StoreEvent::new(StoreAction::ToggleNode).with_records(vec![node.clone()]));
        Ok(true)
    }

    /// Flatten the descendants of `node`.
    pub fn collect_descendants(&self, node: &Record) -> Descendants {
        tree::collect_descendants(node)
    }

    /// Rebuild the flat visible sequence from the tree.
    pub(crate) fn refresh_tree_view(&mut self) {
        if let Some(root) = &self.root {
            let visible = tree::collect_descendants(root).visible;
            self.storage.replace_values(visible, None, true);
            self.invalidate_id_map();
        }
    }

    // -------------------------------------------------------------------------
    // Bookkeeping
    // -------------------------------------------------------------------------

    pub(crate) fn register(&mut self, record: &Record) {
        record.join_store(self.id);
        self.registry.insert(record.id().clone(), record.clone());
        self.invalidate_id_map();
    }

    pub(crate) fn unregister(&mut self, record: &Record) {
        record.leave_store(self.id);
        record.clear_group_parent(self.id);
        if self.registry.get(record.id()).is_some_and(|r| r.ptr_eq(record)) {
            self.registry.remove(record.id());
        }
        self.invalidate_id_map();
    }

    pub(crate) fn invalidate_id_map(&self) {
        *self.id_map.write() = None;
    }

    fn build_id_map(&self) -> HashMap<RecordId, IdMapEntry> {
        self.registry
            .iter()
            .map(|(id, record)| {
                let entry = IdMapEntry {
                    record: record.clone(),
                    index: self.storage.index_of(id),
                    all_index: self.storage.all_index_of(id),
                };
                (id.clone(), entry)
            })
            .collect()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.id)
            .field("count", &self.count())
            .field("all_count", &self.all_count())
            .field("filters", &self.filters.len())
            .field("sorters", &self.sorters)
            .field("groupers", &self.groupers)
            .field("tree", &self.is_tree())
            .finish()
    }
}

static_assertions::assert_impl_all!(Store: Send, Sync);

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    fn sample() -> Store {
        Store::with_records(
            StoreConfig::default(),
            vec![
                Record::new(1, [("name", "c"), ("type", "A")]),
                Record::new(2, [("name", "a"), ("type", "B")]),
                Record::new(3, [("name", "b"), ("type", "A")]),
            ],
        )
    }

    fn ids(records: &[Record]) -> Vec<RecordId> {
        records.iter().map(|r| r.id().clone()).collect()
    }

    #[test]
    fn test_add_skips_duplicate_ids() {
        let mut store = sample();
        let added = store.add(vec![
            Record::new(1, [("name", "dup")]),
            Record::new(4, [("name", "d")]),
        ]);
        assert_eq!(ids(&added), vec![RecordId::Int(4)]);
        assert_eq!(store.count(), 4);
        assert!(store.add(Vec::new()).is_empty());
    }

    #[test]
    fn test_get_by_id_and_index() {
        let store = sample();
        let record = store.get_by_id(2).unwrap();
        assert_eq!(record.get("name"), FieldValue::from("a"));
        assert_eq!(store.index_of(2), Some(1));
        assert_eq!(store.all_index_of(3), Some(2));
        assert!(store.get_by_id(9).is_none());
        assert!(record.stores().contains(&store.id()));
    }

    #[test]
    fn test_insert_at_visible_index() {
        let mut store = sample();
        store.insert(1, vec![Record::new(4, [("name", "x")])]);
        assert_eq!(store.index_of(4), Some(1));
        assert_eq!(store.index_of(2), Some(2));
    }

    #[test]
    fn test_remove() {
        let mut store = sample();
        let removed = store.remove_by_id(&[RecordId::Int(2), RecordId::Int(9)]);
        assert_eq!(ids(&removed), vec![RecordId::Int(2)]);
        assert_eq!(store.count(), 2);
        assert!(store.get_by_id(2).is_none());
        assert!(removed[0].stores().is_empty());
    }

    #[test]
    fn test_update_emits_change() {
        let mut store = sample();
        let events = Arc::new(Mutex::new(Vec::new()));
        let captured = events.clone();
        store.signals().change.connect(move |event| {
            captured.lock().push((event.action, event.changes.clone()));
        });

        let record = store.get_by_id(1).unwrap();
        assert!(store.update(&record, [("name", "c")]).is_empty());
        assert_eq!(store.update(&record, [("name", "z")]), vec!["name".to_string()]);
        assert_eq!(*events.lock(), vec![(StoreAction::Update, vec!["name".to_string()])]);
    }

    #[test]
    fn test_batch_coalesces_updates() {
        let mut store = sample();
        let events = Arc::new(Mutex::new(0));
        let captured = events.clone();
        store.signals().change.connect(move |_| *captured.lock() += 1);

        store.begin_batch();
        for record in store.records() {
            store.update(&record, [("type", "C")]);
        }
        assert_eq!(*events.lock(), 0);
        store.end_batch();
        assert_eq!(*events.lock(), 1);
    }

    #[test]
    fn test_sort_and_get_prev() {
        let mut store = sample();
        store.add_sorter(Sorter::new("name"));
        assert_eq!(
            ids(&store.records()),
            vec![RecordId::Int(2), RecordId::Int(3), RecordId::Int(1)]
        );

        let first = store.first().unwrap();
        let last = store.last().unwrap();
        assert!(store.get_prev(&first, false, true).is_none());
        assert_eq!(store.get_prev(&first, true, true), Some(last.clone()));
        assert_eq!(store.get_next(&last, true, true), Some(first));
    }

    #[test]
    fn test_distinct_values() {
        let store = sample();
        assert_eq!(
            store.distinct_values("type"),
            vec![FieldValue::from("A"), FieldValue::from("B")]
        );
    }

    #[test]
    fn test_load_json() {
        let mut store = Store::new(StoreConfig::default().id_field("key"));
        let loaded = store
            .load_json(r#"[{"key": "a", "n": 1}, {"key": "b", "n": 2}]"#)
            .unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(store.get_by_id("b").unwrap().get("n"), FieldValue::Int(2));
        assert!(matches!(store.load_json("{"), Err(Error::Json(_))));
        assert!(matches!(store.load_json("[1]"), Err(Error::InvalidData { .. })));
    }

    #[test]
    fn test_tree_store_flattening() {
        let mut store = Store::new(StoreConfig::default().tree(true));
        store
            .load_json(
                r#"[
                    {"id": 1, "children": [{"id": 2}, {"id": 3, "children": [{"id": 4}]}]},
                    {"id": 5}
                ]"#,
            )
            .unwrap();
        let order = |store: &Store| ids(&store.records());
        assert_eq!(
            order(&store),
            (1..=5).map(RecordId::Int).collect::<Vec<_>>()
        );

        let node = store.get_by_id(3).unwrap();
        assert!(store.set_node_expanded(&node, false).unwrap());
        assert!(!store.set_node_expanded(&node, false).unwrap());
        assert_eq!(
            order(&store),
            vec![RecordId::Int(1), RecordId::Int(2), RecordId::Int(3), RecordId::Int(5)]
        );
        assert_eq!(store.get_by_id(4).unwrap().depth(), 2);
    }

    #[test]
    fn test_tree_rejects_cycles() {
        let mut store = Store::new(StoreConfig::default().tree(true));
        let parent = Record::new(1, Vec::<(&str, FieldValue)>::new());
        let child = Record::new(2, Vec::<(&str, FieldValue)>::new());
        store.add(vec![parent.clone()]);
        store.append_child(&parent, vec![child.clone()]).unwrap();

        assert!(matches!(
            store.append_child(&child, vec![parent.clone()]),
            Err(Error::InvalidData { .. })
        ));
        assert!(matches!(
            sample().append_child(&parent, Vec::new()),
            Err(Error::NotATree)
        ));
    }

    #[test]
    fn test_tree_reparent() {
        let mut store = Store::new(StoreConfig::default().tree(true));
        store
            .load_json(r#"[{"id": 1, "children": [{"id": 2}]}, {"id": 3}]"#)
            .unwrap();
        let node = store.get_by_id(2).unwrap();
        let target = store.get_by_id(3).unwrap();
        store.append_child(&target, vec![node.clone()]).unwrap();
        assert_eq!(node.parent(), Some(target));
        assert!(store.get_by_id(1).unwrap().is_leaf());
        assert_eq!(
            ids(&store.records()),
            vec![RecordId::Int(1), RecordId::Int(3), RecordId::Int(2)]
        );
    }
}
