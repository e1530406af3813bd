//! Ordered, uniquely keyed item storage.
//!
//! [`Collection`] keeps its items in insertion order and indexes them by key,
//! giving O(1) membership tests and stable ordinal positions. On top of the
//! full item sequence it can hold a *visible* subsequence produced by named
//! filter functions. Every structural mutation bumps a monotonically
//! increasing [`generation`](Collection::generation), which owners use to
//! detect stale caches.
//!
//! # Example
//!
//! ```
//! use horizon_grid_core::{Collection, Keyed};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Task { id: u32, done: bool }
//!
//! impl Keyed for Task {
//!     type Key = u32;
//!     fn key(&self) -> u32 { self.id }
//! }
//!
//! let mut tasks = Collection::from_values(vec![
//!     Task { id: 1, done: false },
//!     Task { id: 2, done: true },
//! ]);
//!
//! let delta = tasks.add_filter("open", |t: &Task| !t.done);
//! assert_eq!(delta.removed.len(), 1);
//! assert_eq!(tasks.len(), 1);
//! assert_eq!(tasks.total_len(), 2);
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::logging::targets;
use crate::signal::Signal;

/// Items stored in a [`Collection`] expose a unique key.
pub trait Keyed {
    /// The key type. Two items with equal keys are the same item.
    type Key: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    /// Returns the item's key.
    fn key(&self) -> Self::Key;
}

/// A named predicate deciding whether an item is visible.
pub type CollectionFilterFn<V> = Arc<dyn Fn(&V) -> bool + Send + Sync>;

/// The kind of mutation reported by [`CollectionChange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    /// Items were added, inserted or removed.
    Splice,
    /// Items changed position.
    Move,
    /// The sequence was reordered by a comparator.
    Sort,
    /// The visible subsequence was recomputed by the filters.
    Filter,
    /// The whole backing sequence was swapped.
    ReplaceValues,
    /// All items were removed.
    Clear,
}

/// Describes one mutation of a [`Collection`].
#[derive(Debug, Clone)]
pub struct CollectionChange<V> {
    pub action: ChangeAction,
    /// Items that became part of the (visible) sequence.
    pub added: Vec<V>,
    /// Items that left the (visible) sequence.
    pub removed: Vec<V>,
    /// The generation after the mutation.
    pub generation: u64,
}

impl<V> CollectionChange<V> {
    /// Returns `true` when nothing was added or removed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// An insertion-ordered, uniquely keyed container with an optional filtered view.
pub struct Collection<V: Keyed> {
    values: IndexMap<V::Key, V>,
    filtered: Option<IndexMap<V::Key, V>>,
    filters: IndexMap<String, CollectionFilterFn<V>>,
    auto_filter: bool,
    generation: u64,
    changed: Signal<CollectionChange<V>>,
}

impl<V: Keyed + Clone + 'static> Default for Collection<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Keyed + Clone + 'static> fmt::Debug for Collection<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .field("visible", &self.len())
            .field("filters", &self.filters.keys().collect::<Vec<_>>())
            .field("generation", &self.generation)
            .finish()
    }
}

impl<V: Keyed + Clone + 'static> Collection<V> {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self {
            values: IndexMap::new(),
            filtered: None,
            filters: IndexMap::new(),
            auto_filter: false,
            generation: 0,
            changed: Signal::new(),
        }
    }

    /// Create a collection holding `values` in order. Later duplicates replace earlier ones.
    pub fn from_values(values: impl IntoIterator<Item = V>) -> Self {
        let mut collection = Self::new();
        collection.values = values.into_iter().map(|v| (v.key(), v)).collect();
        collection
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Monotonic mutation counter.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Signal emitted after every non-silent mutation.
    pub fn changed(&self) -> &Signal<CollectionChange<V>> {
        &self.changed
    }

    /// Returns `true` while filter functions restrict the visible sequence.
    pub fn is_filtered(&self) -> bool {
        self.filtered.is_some()
    }

    /// Number of visible items.
    pub fn len(&self) -> usize {
        self.filtered.as_ref().map_or(self.values.len(), IndexMap::len)
    }

    /// Returns `true` if no item is visible.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of items regardless of filtering.
    pub fn total_len(&self) -> usize {
        self.values.len()
    }

    /// Iterate the visible items in order.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.visible_map().values()
    }

    /// Iterate all items in order, filtered or not.
    pub fn all_values(&self) -> impl Iterator<Item = &V> + '_ {
        self.values.values()
    }

    /// Clone the visible items into a vector.
    pub fn to_vec(&self) -> Vec<V> {
        self.values().cloned().collect()
    }

    /// Clone all items into a vector.
    pub fn all_to_vec(&self) -> Vec<V> {
        self.all_values().cloned().collect()
    }

    /// Look up an item by key, whether visible or not.
    pub fn get(&self, key: &V::Key) -> Option<&V> {
        self.values.get(key)
    }

    /// Returns `true` if an item with `key` is held (visible or not).
    pub fn contains_key(&self, key: &V::Key) -> bool {
        self.values.contains_key(key)
    }

    /// Returns `true` if an item with `key` is part of the visible sequence.
    pub fn is_visible(&self, key: &V::Key) -> bool {
        self.visible_map().contains_key(key)
    }

    /// Position of `key` within the visible sequence.
    pub fn index_of(&self, key: &V::Key) -> Option<usize> {
        self.visible_map().get_index_of(key)
    }

    /// Position of `key` within the full sequence.
    pub fn all_index_of(&self, key: &V::Key) -> Option<usize> {
        self.values.get_index_of(key)
    }

    /// Visible item at `index`.
    pub fn get_index(&self, index: usize) -> Option<&V> {
        self.visible_map().get_index(index).map(|(_, v)| v)
    }

    /// Item at `index` of the full sequence.
    pub fn get_all_index(&self, index: usize) -> Option<&V> {
        self.values.get_index(index).map(|(_, v)| v)
    }

    /// First visible item.
    pub fn first(&self) -> Option<&V> {
        self.get_index(0)
    }

    /// Last visible item.
    pub fn last(&self) -> Option<&V> {
        self.visible_map().last().map(|(_, v)| v)
    }

    /// Ids of the installed filter functions, in installation order.
    pub fn filter_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.filters.keys().map(String::as_str)
    }

    /// Whether newly added items are run through the filters.
    pub fn auto_filter(&self) -> bool {
        self.auto_filter
    }

    /// Configure whether newly added items are run through the filters.
    ///
    /// When disabled, items added while filtered are made visible unconditionally.
    pub fn set_auto_filter(&mut self, auto_filter: bool) {
        self.auto_filter = auto_filter;
    }

    fn visible_map(&self) -> &IndexMap<V::Key, V> {
        self.filtered.as_ref().unwrap_or(&self.values)
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Append items whose keys are not yet present. Present keys are left untouched.
    ///
    /// Returns the items actually added.
    pub fn add(&mut self, items: impl IntoIterator<Item = V>) -> Vec<V> {
        let index = self.values.len();
        self.insert(index, items)
    }

    /// Insert items at `index` of the full sequence, skipping keys already present.
    ///
    /// Returns the items actually inserted.
    pub fn insert(&mut self, index: usize, items: impl IntoIterator<Item = V>) -> Vec<V> {
        let mut seen = IndexSet::new();
        let added: Vec<V> = items
            .into_iter()
            .filter(|v| {
                let key = v.key();
                !self.values.contains_key(&key) && seen.insert(key)
            })
            .collect();

        if added.is_empty() {
            return added;
        }

        splice_map(&mut self.values, index, 0, added.iter().cloned());
        if self.filtered.is_some() {
            let admitted: Vec<V::Key> = added
                .iter()
                .filter(|v| !self.auto_filter || self.passes(v))
                .map(Keyed::key)
                .collect();
            self.rebuild_visible_order(&admitted);
        }

        self.bump(ChangeAction::Splice, added.clone(), Vec::new(), false);
        added
    }

    /// Add items, replacing any item with the same key in place (same ordinal position).
    ///
    /// Returns the change describing added and replaced (as removed) items.
    pub fn upsert(&mut self, items: impl IntoIterator<Item = V>) -> CollectionChange<V> {
        let mut added = Vec::new();
        let mut replaced = Vec::new();
        for item in items {
            let key = item.key();
            match self.values.get_mut(&key) {
                Some(slot) => {
                    replaced.push(std::mem::replace(slot, item.clone()));
                    if let Some(visible) = self.filtered.as_mut().and_then(|f| f.get_mut(&key)) {
                        *visible = item.clone();
                    }
                }
                None => {
                    self.values.insert(key.clone(), item.clone());
                    if self.filtered.is_some() && (!self.auto_filter || self.passes(&item)) {
                        if let Some(filtered) = self.filtered.as_mut() {
                            filtered.insert(key, item.clone());
                        }
                    }
                }
            }
            added.push(item);
        }
        self.bump(ChangeAction::Splice, added, replaced, false)
    }

    /// Remove items by key. Unknown keys are ignored.
    ///
    /// Returns the removed items in the order their keys were given.
    pub fn remove<'k>(&mut self, keys: impl IntoIterator<Item = &'k V::Key>) -> Vec<V> {
        let mut removed = Vec::new();
        for key in keys {
            if let Some(value) = self.values.shift_remove(key) {
                if let Some(filtered) = self.filtered.as_mut() {
                    filtered.shift_remove(key);
                }
                removed.push(value);
            }
        }
        if !removed.is_empty() {
            self.bump(ChangeAction::Splice, Vec::new(), removed.clone(), false);
        }
        removed
    }

    /// Remove every item. Filters stay installed.
    pub fn clear(&mut self) -> Vec<V> {
        let removed: Vec<V> = self.values.drain(..).map(|(_, v)| v).collect();
        if let Some(filtered) = self.filtered.as_mut() {
            filtered.clear();
        }
        self.bump(ChangeAction::Clear, Vec::new(), removed.clone(), false);
        removed
    }

    /// Move the items with `keys` so they sit directly before `before`
    /// (or at the end when `before` is `None` or one of the moved items).
    pub fn move_before(&mut self, keys: &[V::Key], before: Option<&V::Key>) {
        let moving: Vec<V> = keys
            .iter()
            .filter_map(|key| self.values.shift_remove(key))
            .collect();
        if moving.is_empty() {
            return;
        }
        let index = before
            .and_then(|key| self.values.get_index_of(key))
            .unwrap_or(self.values.len());
        splice_map(&mut self.values, index, 0, moving.iter().cloned());
        if self.filtered.is_some() {
            self.rebuild_visible_order(&[]);
        }
        self.bump(ChangeAction::Move, Vec::new(), Vec::new(), false);
    }

    /// Atomically swap the backing sequences.
    ///
    /// When `filtered` is `None` but filters are installed, the visible
    /// sequence is recomputed from `values`. With `silent` no change is
    /// signalled, which lets owners perform multi-step rebuilds without
    /// exposing intermediate states.
    pub fn replace_values(&mut self, values: Vec<V>, filtered: Option<Vec<V>>, silent: bool) {
        self.values = values.into_iter().map(|v| (v.key(), v)).collect();
        self.filtered = match filtered {
            Some(filtered) => Some(filtered.into_iter().map(|v| (v.key(), v)).collect()),
            None if !self.filters.is_empty() => Some(self.compute_filtered()),
            None => None,
        };
        self.bump(ChangeAction::ReplaceValues, Vec::new(), Vec::new(), silent);
    }

    /// Remove `remove` items at `index` of the full sequence and insert `insert` there.
    ///
    /// Items of `insert` whose keys are already present stay where they are.
    /// The visible sequence is not touched; use [`splice_visible`](Self::splice_visible).
    pub fn splice(&mut self, index: usize, remove: usize, insert: Vec<V>) -> Vec<V> {
        let removed = splice_map(&mut self.values, index, remove, insert);
        self.generation += 1;
        removed
    }

    /// Splice the visible sequence. Returns `None` when the collection is not filtered.
    pub fn splice_visible(
        &mut self,
        index: usize,
        remove: usize,
        insert: Vec<V>,
    ) -> Option<Vec<V>> {
        let filtered = self.filtered.as_mut()?;
        let removed = splice_map(filtered, index, remove, insert);
        self.generation += 1;
        Some(removed)
    }

    /// Sort all items (and the visible subsequence) with a comparator.
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&V, &V) -> std::cmp::Ordering,
    {
        self.values.sort_by(|_, a, _, b| compare(a, b));
        if let Some(filtered) = self.filtered.as_mut() {
            filtered.sort_by(|_, a, _, b| compare(a, b));
        }
        self.bump(ChangeAction::Sort, Vec::new(), Vec::new(), false);
    }

    // -------------------------------------------------------------------------
    // Filtering
    // -------------------------------------------------------------------------

    /// Install (or replace) the filter `id` and recompute the visible sequence.
    ///
    /// Returns which items entered and left the visible sequence.
    pub fn add_filter<F>(&mut self, id: impl Into<String>, filter: F) -> CollectionChange<V>
    where
        F: Fn(&V) -> bool + Send + Sync + 'static,
    {
        self.add_filter_fn(id, Arc::new(filter))
    }

    /// Like [`add_filter`](Self::add_filter) for an already shared filter function.
    pub fn add_filter_fn(
        &mut self,
        id: impl Into<String>,
        filter: CollectionFilterFn<V>,
    ) -> CollectionChange<V> {
        self.filters.insert(id.into(), filter);
        self.refilter()
    }

    /// Remove the filter `id`. Returns `None` if no such filter was installed.
    pub fn remove_filter(&mut self, id: &str) -> Option<CollectionChange<V>> {
        self.filters.shift_remove(id)?;
        Some(self.refilter())
    }

    /// Remove every filter, making all items visible.
    pub fn clear_filters(&mut self) -> CollectionChange<V> {
        self.filters.clear();
        self.refilter()
    }

    /// Recompute the visible sequence from the installed filters.
    pub fn refilter(&mut self) -> CollectionChange<V> {
        let previous: IndexSet<V::Key> = self.visible_map().keys().cloned().collect();
        self.filtered = if self.filters.is_empty() {
            None
        } else {
            Some(self.compute_filtered())
        };

        let current = self.visible_map();
        let added: Vec<V> = current
            .iter()
            .filter(|(k, _)| !previous.contains(*k))
            .map(|(_, v)| v.clone())
            .collect();
        let removed: Vec<V> = previous
            .iter()
            .filter(|k| !current.contains_key(*k))
            .filter_map(|k| self.values.get(k).cloned())
            .collect();

        tracing::trace!(
            target: targets::COLLECTION,
            added = added.len(),
            removed = removed.len(),
            visible = self.len(),
            "collection refiltered"
        );
        self.bump(ChangeAction::Filter, added, removed, false)
    }

    fn passes(&self, value: &V) -> bool {
        self.filters.values().all(|f| f(value))
    }

    fn compute_filtered(&self) -> IndexMap<V::Key, V> {
        self.values
            .iter()
            .filter(|(_, v)| self.passes(v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Re-derive the visible order from the full order, keeping currently visible
    /// keys plus `admitted`.
    fn rebuild_visible_order(&mut self, admitted: &[V::Key]) {
        let Some(filtered) = self.filtered.as_ref() else {
            return;
        };
        let rebuilt: IndexMap<V::Key, V> = self
            .values
            .iter()
            .filter(|(k, _)| filtered.contains_key(*k) || admitted.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        self.filtered = Some(rebuilt);
    }

    fn bump(
        &mut self,
        action: ChangeAction,
        added: Vec<V>,
        removed: Vec<V>,
        silent: bool,
    ) -> CollectionChange<V> {
        self.generation += 1;
        let change = CollectionChange {
            action,
            added,
            removed,
            generation: self.generation,
        };
        if !silent {
            self.changed.emit(change.clone());
        }
        change
    }
}

/// Replace `remove` entries at `index` with `insert`, returning the removed values.
fn splice_map<K, V>(
    map: &mut IndexMap<K, V>,
    index: usize,
    remove: usize,
    insert: impl IntoIterator<Item = V>,
) -> Vec<V>
where
    K: Eq + Hash,
    V: Keyed<Key = K>,
{
    let index = index.min(map.len());
    let mut tail = map.split_off(index);
    let remove = remove.min(tail.len());
    let removed = tail.drain(..remove).map(|(_, v)| v).collect();
    for value in insert {
        let key = value.key();
        if !tail.contains_key(&key) {
            map.entry(key).or_insert(value);
        }
    }
    map.extend(tail);
    removed
}
