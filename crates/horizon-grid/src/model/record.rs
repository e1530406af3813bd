//! Records: the rows a [`Store`](super::Store) holds.
//!
//! A [`Record`] is a cheap, clonable handle. Cloning shares the underlying
//! row; identity is pointer identity ([`Record::ptr_eq`], also used by
//! `PartialEq`). Besides plain data rows there are synthesized rows created
//! by grouping:
//!
//! - **group headers**, one per distinct group value, owning the list of
//!   their visible and unfiltered members,
//! - **group footers**, optional trailing rows of a group,
//! - **links**, proxies of a record that belongs to several groups at once
//!   (array-valued group fields). A link shares its original's field data.
//!
//! Records also carry tree links (parent, ordered children, filtered
//! children) used by tree stores.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use horizon_grid_core::Keyed;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::value::FieldValue;
use crate::error::{Error, Result};

/// Field storage of a record.
pub type RecordData = BTreeMap<String, FieldValue>;

static NEXT_GENERATED_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of a record within a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Numeric id.
    Int(i64),
    /// String id.
    Str(String),
}

impl RecordId {
    /// Interpret a field value as an id. Floats with no fractional part become integers.
    pub fn from_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Int(n) => Some(RecordId::Int(*n)),
            FieldValue::Float(n) if n.fract() == 0.0 => Some(RecordId::Int(*n as i64)),
            FieldValue::String(s) => Some(RecordId::Str(s.clone())),
            _ => None,
        }
    }

    /// Generate a fresh id for data that carries none.
    pub fn generate() -> Self {
        RecordId::Str(format!("_generated{}", NEXT_GENERATED_ID.fetch_add(1, Ordering::Relaxed)))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{n}"),
            RecordId::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Int(n)
    }
}

impl From<i32> for RecordId {
    fn from(n: i32) -> Self {
        RecordId::Int(n as i64)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Str(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::Str(s)
    }
}

impl From<&RecordId> for RecordId {
    fn from(id: &RecordId) -> Self {
        id.clone()
    }
}

impl From<RecordId> for FieldValue {
    fn from(id: RecordId) -> Self {
        match id {
            RecordId::Int(n) => FieldValue::Int(n),
            RecordId::Str(s) => FieldValue::String(s),
        }
    }
}

/// Identifies a store a record has joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(u64);

impl StoreId {
    pub(crate) fn next() -> Self {
        Self(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Per-record bookkeeping used by the grouping engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordMeta {
    /// Group header is collapsed.
    pub collapsed: bool,
    /// Number of currently visible members of a group header.
    pub child_count: usize,
    /// Record is hidden because its group is collapsed.
    pub hidden_by_collapse: bool,
}

/// What a record represents.
pub enum RecordKind {
    /// A data row.
    Plain,
    /// Synthesized header row of a group.
    GroupHeader(GroupHeader),
    /// Synthesized footer row of a group.
    GroupFooter(GroupFooter),
    /// Proxy of a record that is a member of an additional group.
    Link {
        /// Id of the record this link stands in for.
        original: RecordId,
    },
}

impl RecordKind {
    fn name(&self) -> &'static str {
        match self {
            RecordKind::Plain => "plain",
            RecordKind::GroupHeader(_) => "group-header",
            RecordKind::GroupFooter(_) => "group-footer",
            RecordKind::Link { .. } => "link",
        }
    }
}

impl fmt::Debug for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Link { original } => write!(f, "Link({original})"),
            RecordKind::GroupHeader(header) => write!(f, "GroupHeader({})", header.value),
            RecordKind::GroupFooter(footer) => write!(f, "GroupFooter({})", footer.value),
            RecordKind::Plain => f.write_str("Plain"),
        }
    }
}

/// State of a group header row.
pub struct GroupHeader {
    value: FieldValue,
    field: String,
    empty_array: bool,
    members: RwLock<GroupMembers>,
}

#[derive(Default)]
struct GroupMembers {
    /// Members passing the current filter, in display order.
    children: Vec<Record>,
    /// Every member regardless of filtering.
    unfiltered: Vec<Record>,
}

/// State of a group footer row.
pub struct GroupFooter {
    value: FieldValue,
    header: Weak<RecordInner>,
}

#[derive(Default)]
struct TreeLinks {
    parent: Option<Weak<RecordInner>>,
    /// Visible (filtered) children.
    children: Vec<Record>,
    /// Snapshot of all children taken when a filter first hid some of them.
    unfiltered_children: Option<Vec<Record>>,
    /// Canonical child order, unaffected by filtering.
    ordered_children: Vec<Record>,
    parent_index: usize,
    unfiltered_index: usize,
    expanded: bool,
    is_root: bool,
}

struct RecordInner {
    id: RecordId,
    kind: RecordKind,
    data: Arc<RwLock<RecordData>>,
    meta: RwLock<RecordMeta>,
    tree: RwLock<TreeLinks>,
    group_parents: RwLock<HashMap<StoreId, Weak<RecordInner>>>,
    group_links: RwLock<IndexMap<String, Record>>,
    stores: RwLock<Vec<StoreId>>,
}

/// A shared handle to a row.
#[derive(Clone)]
pub struct Record(Arc<RecordInner>);

impl Record {
    /// Create a plain record from `(field, value)` pairs.
    pub fn new<K, V>(id: impl Into<RecordId>, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let data = fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self::from_data(id, data)
    }

    /// Create a plain record from a field map.
    pub fn from_data(id: impl Into<RecordId>, data: RecordData) -> Self {
        Self::with_kind(id.into(), RecordKind::Plain, Arc::new(RwLock::new(data)))
    }

    /// Create a plain record from a JSON object value.
    ///
    /// The id is read from `id_field`; objects without one get a generated id.
    pub fn from_value(value: FieldValue, id_field: &str) -> Result<Self> {
        let FieldValue::Map(data) = value else {
            return Err(Error::invalid_data(format!("expected an object, found '{value}'")));
        };
        let id = match data.get(id_field) {
            None | Some(FieldValue::None) => RecordId::generate(),
            Some(value) => RecordId::from_value(value)
                .ok_or_else(|| Error::invalid_data(format!("'{value}' is not a valid id")))?,
        };
        Ok(Self::from_data(id, data))
    }

    fn with_kind(id: RecordId, kind: RecordKind, data: Arc<RwLock<RecordData>>) -> Self {
        Self(Arc::new(RecordInner {
            id,
            kind,
            data,
            meta: RwLock::new(RecordMeta::default()),
            tree: RwLock::new(TreeLinks {
                expanded: true,
                ..TreeLinks::default()
            }),
            group_parents: RwLock::new(HashMap::new()),
            group_links: RwLock::new(IndexMap::new()),
            stores: RwLock::new(Vec::new()),
        }))
    }

    pub(crate) fn new_group_header(
        id: RecordId,
        value: FieldValue,
        field: &str,
        empty_array: bool,
        collapsed: bool,
    ) -> Self {
        let mut data = RecordData::new();
        if !field.is_empty() {
            data.insert(field.to_string(), value.clone());
        }
        let header = GroupHeader {
            value,
            field: field.to_string(),
            empty_array,
            members: RwLock::new(GroupMembers::default()),
        };
        let data = Arc::new(RwLock::new(data));
        let record = Self::with_kind(id, RecordKind::GroupHeader(header), data);
        record.0.meta.write().collapsed = collapsed;
        record
    }

    pub(crate) fn new_group_footer(id: RecordId, header: &Record) -> Self {
        let value = header.group_row_for().unwrap_or_default();
        let footer = GroupFooter {
            value,
            header: Arc::downgrade(&header.0),
        };
        let data = Arc::new(RwLock::new(RecordData::new()));
        Self::with_kind(id, RecordKind::GroupFooter(footer), data)
    }

    pub(crate) fn new_tree_root(id: RecordId) -> Self {
        let root = Self::with_kind(id, RecordKind::Plain, Arc::new(RwLock::new(RecordData::new())));
        root.0.tree.write().is_root = true;
        root
    }

    /// Create a link standing in for this record. The link shares this record's data.
    pub fn link(&self, suffix: &str) -> Record {
        let id = RecordId::Str(format!("{}_link_{}", self.original_id(), suffix));
        Self::with_kind(
            id,
            RecordKind::Link {
                original: self.original_id().clone(),
            },
            self.0.data.clone(),
        )
    }

    // -------------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------------

    /// The record id.
    pub fn id(&self) -> &RecordId {
        &self.0.id
    }

    /// What this record represents.
    pub fn kind(&self) -> &RecordKind {
        &self.0.kind
    }

    /// Returns `true` if both handles refer to the same row.
    pub fn ptr_eq(&self, other: &Record) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Returns `true` for group header rows.
    pub fn is_group_header(&self) -> bool {
        matches!(self.0.kind, RecordKind::GroupHeader(_))
    }

    /// Returns `true` for group footer rows.
    pub fn is_group_footer(&self) -> bool {
        matches!(self.0.kind, RecordKind::GroupFooter(_))
    }

    /// Group headers and footers are special rows.
    pub fn is_special_row(&self) -> bool {
        self.is_group_header() || self.is_group_footer()
    }

    /// Returns `true` for links.
    pub fn is_linked(&self) -> bool {
        matches!(self.0.kind, RecordKind::Link { .. })
    }

    /// For links the id of the original record, otherwise the own id.
    pub fn original_id(&self) -> &RecordId {
        match &self.0.kind {
            RecordKind::Link { original } => original,
            _ => &self.0.id,
        }
    }

    // -------------------------------------------------------------------------
    // Data
    // -------------------------------------------------------------------------

    /// Read a field. Dotted names (`"resource.city"`) resolve into nested maps.
    ///
    /// Missing fields read as [`FieldValue::None`].
    pub fn get(&self, field: &str) -> FieldValue {
        let data = self.0.data.read();
        if let Some(value) = data.get(field) {
            return value.clone();
        }
        match field.split_once('.') {
            Some((head, rest)) => data
                .get(head)
                .and_then(|value| value.path(rest))
                .cloned()
                .unwrap_or_default(),
            None => FieldValue::None,
        }
    }

    /// Write a field without notifying any store. Returns `true` if the value changed.
    ///
    /// Use [`Store::update`](super::Store::update) to have stores react to the change.
    pub fn set(&self, field: &str, value: impl Into<FieldValue>) -> bool {
        let value = value.into();
        let mut data = self.0.data.write();
        if data.get(field) == Some(&value) {
            return false;
        }
        data.insert(field.to_string(), value);
        true
    }

    /// A copy of all fields.
    pub fn data(&self) -> RecordData {
        self.0.data.read().clone()
    }

    /// Serialize the fields as a JSON object.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&*self.0.data.read())?)
    }

    // -------------------------------------------------------------------------
    // Meta
    // -------------------------------------------------------------------------

    /// A copy of the grouping bookkeeping.
    pub fn meta(&self) -> RecordMeta {
        self.0.meta.read().clone()
    }

    /// Returns `true` for collapsed group headers.
    pub fn is_collapsed(&self) -> bool {
        self.0.meta.read().collapsed
    }

    pub(crate) fn set_collapsed(&self, collapsed: bool) {
        self.0.meta.write().collapsed = collapsed;
    }

    pub(crate) fn set_hidden_by_collapse(&self, hidden: bool) {
        self.0.meta.write().hidden_by_collapse = hidden;
    }

    /// Number of visible members of a group header.
    pub fn child_count(&self) -> usize {
        self.0.meta.read().child_count
    }

    // -------------------------------------------------------------------------
    // Group rows
    // -------------------------------------------------------------------------

    /// The group value of a header or footer row.
    pub fn group_row_for(&self) -> Option<FieldValue> {
        match &self.0.kind {
            RecordKind::GroupHeader(header) => Some(header.value.clone()),
            RecordKind::GroupFooter(footer) => Some(footer.value.clone()),
            _ => None,
        }
    }

    /// The field a header groups by.
    pub fn group_field(&self) -> Option<&str> {
        match &self.0.kind {
            RecordKind::GroupHeader(header) => Some(header.field.as_str()),
            _ => None,
        }
    }

    /// Returns `true` for the header of records whose group field is an empty list.
    pub fn is_empty_array_group(&self) -> bool {
        matches!(&self.0.kind, RecordKind::GroupHeader(header) if header.empty_array)
    }

    /// Visible members of a group (header or footer row), footer included.
    pub fn group_children(&self) -> Vec<Record> {
        match &self.0.kind {
            RecordKind::GroupHeader(header) => header.members.read().children.clone(),
            RecordKind::GroupFooter(_) => {
                self.group_header().map(|h| h.group_children()).unwrap_or_default()
            }
            _ => Vec::new(),
        }
    }

    /// Every member of a group regardless of filtering, footer included.
    pub fn unfiltered_group_children(&self) -> Vec<Record> {
        match &self.0.kind {
            RecordKind::GroupHeader(header) => header.members.read().unfiltered.clone(),
            RecordKind::GroupFooter(_) => self
                .group_header()
                .map(|h| h.unfiltered_group_children())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// The header a footer row belongs to.
    pub fn group_header(&self) -> Option<Record> {
        match &self.0.kind {
            RecordKind::GroupFooter(footer) => footer.header.upgrade().map(Record),
            _ => None,
        }
    }

    pub(crate) fn clear_group_members(&self) {
        if let RecordKind::GroupHeader(header) = &self.0.kind {
            let mut members = header.members.write();
            members.children.clear();
            members.unfiltered.clear();
            self.0.meta.write().child_count = 0;
        }
    }

    pub(crate) fn push_group_member(&self, member: Record, visible: bool) {
        if let RecordKind::GroupHeader(header) = &self.0.kind {
            let mut members = header.members.write();
            if visible {
                members.children.push(member.clone());
                self.0.meta.write().child_count = members.children.len();
            }
            members.unfiltered.push(member);
        }
    }

    pub(crate) fn set_group_children(&self, children: Vec<Record>) {
        if let RecordKind::GroupHeader(header) = &self.0.kind {
            let count = children.len();
            header.members.write().children = children;
            self.0.meta.write().child_count = count;
        }
    }

    pub(crate) fn remove_group_member(&self, member: &Record) {
        if let RecordKind::GroupHeader(header) = &self.0.kind {
            let mut members = header.members.write();
            members.children.retain(|r| !r.ptr_eq(member));
            members.unfiltered.retain(|r| !r.ptr_eq(member));
            self.0.meta.write().child_count = members.children.len();
        }
    }

    /// The group header this record sits under in `store`.
    pub fn group_parent(&self, store: StoreId) -> Option<Record> {
        self.0.group_parents.read().get(&store).and_then(Weak::upgrade).map(Record)
    }

    pub(crate) fn set_group_parent(&self, store: StoreId, header: &Record) {
        self.0.group_parents.write().insert(store, Arc::downgrade(&header.0));
    }

    pub(crate) fn clear_group_parent(&self, store: StoreId) {
        self.0.group_parents.write().remove(&store);
    }

    pub(crate) fn group_link(&self, key: &str) -> Option<Record> {
        self.0.group_links.read().get(key).cloned()
    }

    pub(crate) fn insert_group_link(&self, key: &str, link: Record) {
        self.0.group_links.write().insert(key.to_string(), link);
    }

    // -------------------------------------------------------------------------
    // Store membership
    // -------------------------------------------------------------------------

    /// Stores this record has joined.
    pub fn stores(&self) -> Vec<StoreId> {
        self.0.stores.read().clone()
    }

    pub(crate) fn join_store(&self, store: StoreId) {
        let mut stores = self.0.stores.write();
        if !stores.contains(&store) {
            stores.push(store);
        }
    }

    pub(crate) fn leave_store(&self, store: StoreId) {
        self.0.stores.write().retain(|s| *s != store);
    }

    // -------------------------------------------------------------------------
    // Tree links
    // -------------------------------------------------------------------------

    /// Parent node, `None` for roots and flat records.
    pub fn parent(&self) -> Option<Record> {
        self.0.tree.read().parent.as_ref().and_then(Weak::upgrade).map(Record)
    }

    /// Visible (filtered) children.
    pub fn children(&self) -> Vec<Record> {
        self.0.tree.read().children.clone()
    }

    /// Snapshot of all children while a filter hides some, `None` otherwise.
    pub fn unfiltered_children(&self) -> Option<Vec<Record>> {
        self.0.tree.read().unfiltered_children.clone()
    }

    /// Children in canonical order, unaffected by filtering.
    pub fn ordered_children(&self) -> Vec<Record> {
        self.0.tree.read().ordered_children.clone()
    }

    /// Returns `true` for the root node of a tree store.
    pub fn is_root(&self) -> bool {
        self.0.tree.read().is_root
    }

    /// Returns `true` if the node has no children at all.
    pub fn is_leaf(&self) -> bool {
        let tree = self.0.tree.read();
        tree.ordered_children.is_empty()
            && tree.unfiltered_children.as_ref().is_none_or(Vec::is_empty)
    }

    /// Whether the node shows its children.
    pub fn is_expanded(&self) -> bool {
        self.0.tree.read().expanded
    }

    /// Position within the parent's visible children.
    pub fn parent_index(&self) -> usize {
        self.0.tree.read().parent_index
    }

    /// Position within the parent's unfiltered children.
    pub fn unfiltered_index(&self) -> usize {
        self.0.tree.read().unfiltered_index
    }

    /// Number of ancestors below the root.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent();
        while let Some(node) = current {
            if node.is_root() {
                break;
            }
            depth += 1;
            current = node.parent();
        }
        depth
    }

    /// Returns `true` if `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &Record) -> bool {
        let mut current = other.parent();
        while let Some(node) = current {
            if node.ptr_eq(self) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    pub(crate) fn set_expanded_flag(&self, expanded: bool) {
        self.0.tree.write().expanded = expanded;
    }

    pub(crate) fn set_parent(&self, parent: Option<&Record>) {
        self.0.tree.write().parent = parent.map(|p| Arc::downgrade(&p.0));
    }

    pub(crate) fn set_children(&self, children: Vec<Record>) {
        self.0.tree.write().children = children;
    }

    pub(crate) fn set_unfiltered_children(&self, children: Option<Vec<Record>>) {
        self.0.tree.write().unfiltered_children = children;
    }

    pub(crate) fn set_ordered_children(&self, children: Vec<Record>) {
        self.0.tree.write().ordered_children = children;
    }

    pub(crate) fn set_parent_index(&self, index: usize) {
        self.0.tree.write().parent_index = index;
    }

    pub(crate) fn set_unfiltered_index(&self, index: usize) {
        self.0.tree.write().unfiltered_index = index;
    }

    /// Insert `child` at `index` of every child list (append when `None`).
    pub(crate) fn insert_child(&self, child: &Record, index: Option<usize>) {
        let mut tree = self.0.tree.write();
        let at = index.unwrap_or(tree.ordered_children.len()).min(tree.ordered_children.len());
        tree.ordered_children.insert(at, child.clone());
        let at = index.unwrap_or(tree.children.len()).min(tree.children.len());
        tree.children.insert(at, child.clone());
        if let Some(unfiltered) = tree.unfiltered_children.as_mut() {
            let at = index.unwrap_or(unfiltered.len()).min(unfiltered.len());
            unfiltered.insert(at, child.clone());
        }
    }

    /// Remove `child` from every child list. Returns `true` if it was a child.
    pub(crate) fn remove_child(&self, child: &Record) -> bool {
        let mut tree = self.0.tree.write();
        let before = tree.ordered_children.len();
        tree.ordered_children.retain(|c| !c.ptr_eq(child));
        tree.children.retain(|c| !c.ptr_eq(child));
        if let Some(unfiltered) = tree.unfiltered_children.as_mut() {
            unfiltered.retain(|c| !c.ptr_eq(child));
        }
        tree.ordered_children.len() != before
    }
}

impl Keyed for Record {
    type Key = RecordId;

    fn key(&self) -> RecordId {
        self.0.id.clone()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Record {}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.0.id)
            .field("kind", &self.0.kind)
            .finish()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0.id, self.0.kind.name())
    }
}

static_assertions::assert_impl_all!(Record: Send, Sync);
