//! The store's grouping engine.
//!
//! Grouping is a sort with an extra materialization step: after the data is
//! ordered, [`Store::prepare_group_records`] partitions it by the first
//! grouper and interleaves a synthetic header row (and optionally a footer
//! row) per group. Header ids derive from the group value, so a group keeps
//! its header record, and with it its collapsed state, across regroups.
//!
//! Collapsing a group splices its members out of the backing collection
//! instead of rebuilding the whole sequence; expanding splices them back
//! at the same position.
//!
//! Only single-level grouping is materialized. Further groupers are kept
//! in [`Store::groupers`] but do not produce nested groups.

use std::collections::HashSet;

use horizon_grid_core::logging::{span_names, targets};
use horizon_grid_core::{ChangeAction, Collection, PerfSpan};
use indexmap::IndexMap;

use super::grouper::{Grouper, NO_VALUE, group_id_fragment};
use super::record::{Record, RecordId};
use super::sorter::compare_all;
use super::store::{Store, StoreAction, StoreEvent, ToggleGroupEvent};
use super::value::FieldValue;
use crate::error::{Error, Result};

/// How [`Store::group`] applies a grouper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupOptions {
    /// Direction to apply; `None` toggles when regrouping by the same criterion.
    pub ascending: Option<bool>,
    /// Append to the grouper chain instead of replacing it.
    pub add: bool,
    /// Re-sort (and so rematerialize groups) immediately.
    pub perform_sort: bool,
    /// Suppress the `group` and `refresh` events.
    pub silent: bool,
}

impl Default for GroupOptions {
    fn default() -> Self {
        Self {
            ascending: None,
            add: false,
            perform_sort: true,
            silent: false,
        }
    }
}

impl GroupOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the direction.
    pub fn ascending(mut self, ascending: bool) -> Self {
        self.ascending = Some(ascending);
        self
    }

    /// Append the grouper.
    pub fn add(mut self, add: bool) -> Self {
        self.add = add;
        self
    }

    /// Whether to sort immediately.
    pub fn perform_sort(mut self, perform_sort: bool) -> Self {
        self.perform_sort = perform_sort;
        self
    }

    /// Suppress events.
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }
}

impl Store {
    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Returns `true` when at least one grouper is active.
    pub fn is_grouped(&self) -> bool {
        self.groupers.as_ref().is_some_and(|groupers| !groupers.is_empty())
    }

    /// The grouper chain.
    pub fn groupers(&self) -> &[Grouper] {
        self.groupers.as_deref().unwrap_or_default()
    }

    /// The grouper of the most recent [`group`](Self::group) call.
    pub fn group_info(&self) -> Option<&Grouper> {
        self.group_info.as_ref()
    }

    /// Current group header and footer rows, in group order.
    pub fn group_records(&self) -> Vec<Record> {
        self.group_records.to_vec()
    }

    /// Group rows of the full sequence (filtered out ones included).
    ///
    /// Cached until the backing collection changes.
    pub fn unfiltered_group_records(&self) -> Vec<Record> {
        if !self.is_grouped() {
            return Vec::new();
        }
        let generation = self.storage.generation();
        if let Some((cached_at, rows)) = self.unfiltered_group_records.read().as_ref() {
            if *cached_at == generation {
                return rows.clone();
            }
        }
        let rows: Vec<Record> = self
            .storage
            .all_values()
            .filter(|r| r.is_special_row())
            .cloned()
            .collect();
        *self.unfiltered_group_records.write() = Some((generation, rows.clone()));
        rows
    }

    /// The header of the group `record` belongs to.
    ///
    /// Headers map to themselves and footers to their header. Without a
    /// record the last group header is returned. `None` when not grouped.
    pub fn group_header_for_record(&self, record: Option<&Record>) -> Option<Record> {
        if !self.is_grouped() {
            return None;
        }
        match record {
            Some(r) if r.is_group_header() => Some(r.clone()),
            Some(r) if r.is_group_footer() => r.group_header(),
            Some(r) => r.group_parent(self.id),
            None => self.group_records.values().filter(|r| r.is_group_header()).last().cloned(),
        }
    }

    /// Whether `record` is a data row of the group with `value`. `None` when not grouped.
    pub fn is_record_in_group(&self, record: &Record, value: &FieldValue) -> Option<bool> {
        let grouper = self.groupers.as_ref()?.first()?;
        if record.is_special_row() {
            return Some(false);
        }
        Some(match grouper.group_value(record) {
            FieldValue::List(items) => items.iter().any(|item| item.loosely_equals(value)),
            FieldValue::None => value.as_str() == Some(NO_VALUE),
            other => other.loosely_equals(value),
        })
    }

    /// Returns `true` if `record` sits in a collapsed group.
    pub fn is_in_collapsed_group(&self, record: &Record) -> bool {
        record.group_parent(self.id).is_some_and(|header| header.is_collapsed())
    }

    /// Visible data rows of the group with `value`. `None` when not grouped.
    pub fn get_group_records(&self, value: &FieldValue) -> Option<Vec<Record>> {
        if !self.is_grouped() {
            return None;
        }
        Some(
            self.storage
                .values()
                .filter(|r| self.is_record_in_group(r, value) == Some(true))
                .cloned()
                .collect(),
        )
    }

    /// Distinct group values of the data. `None` when not grouped.
    pub fn get_group_titles(&self) -> Option<Vec<FieldValue>> {
        let grouper = self.groupers.as_ref()?.first()?;
        let mut titles: Vec<FieldValue> = Vec::new();
        for record in self.data_records() {
            let value = grouper.group_value(&record);
            if !titles.contains(&value) {
                titles.push(value);
            }
        }
        Some(titles)
    }

    /// Data rows of every group, optionally preceded by their headers.
    ///
    /// With `all` filtered out members are included.
    pub fn collect_group_records(&self, all: bool, include_headers: bool) -> Vec<Record> {
        let mut records = Vec::new();
        for header in self.unfiltered_group_records().into_iter().filter(Record::is_group_header) {
            let members = if all {
                header.unfiltered_group_children()
            } else {
                header.group_children()
            };
            if include_headers {
                records.push(header);
            }
            records.extend(members.into_iter().filter(|r| !r.is_special_row()));
        }
        records
    }

    // -------------------------------------------------------------------------
    // Grouping
    // -------------------------------------------------------------------------

    /// Replace the grouper chain and regroup. `None` (or an empty chain) ungroups.
    pub fn set_groupers(&mut self, groupers: Option<Vec<Grouper>>, silent: bool) -> Result<()> {
        match groupers.filter(|g| !g.is_empty()) {
            Some(groupers) => {
                if self.is_tree() {
                    return Err(Error::NotATree);
                }
                self.group_info = groupers.first().cloned();
                self.groupers = Some(groupers);
                self.invalidate_filters_fn();
                self.sort();
                self.after_grouping(silent);
            }
            None if self.groupers.is_some() => {
                self.ungroup();
                self.after_grouping(silent);
            }
            None => {}
        }
        Ok(())
    }

    /// Group by `grouper`.
    ///
    /// Without an explicit direction, grouping again by the current criterion
    /// reverses the direction. With [`GroupOptions::add`] the grouper is
    /// appended to the chain.
    pub fn group(&mut self, grouper: impl Into<Grouper>, options: GroupOptions) -> Result<()> {
        if self.is_tree() {
            return Err(Error::NotATree);
        }
        let mut grouper = grouper.into();
        if options.add {
            if let Some(ascending) = options.ascending {
                grouper.set_ascending(ascending);
            }
            if self.group_info.is_none() {
                self.group_info = Some(grouper.clone());
            }
            self.groupers.get_or_insert_with(Vec::new).push(grouper);
        } else {
            match options.ascending {
                Some(ascending) => grouper.set_ascending(ascending),
                None if grouper.direction().is_none() => {
                    let ascending = match &self.group_info {
                        Some(info) if info.same_criterion(&grouper) => !info.is_ascending(),
                        _ => true,
                    };
                    grouper.set_ascending(ascending);
                }
                None => {}
            }
            self.group_info = Some(grouper.clone());
            self.groupers = Some(vec![grouper]);
        }
        self.invalidate_filters_fn();
        tracing::debug!(target: targets::GROUP, groupers = ?self.groupers, "grouping changed");

        if options.perform_sort {
            self.sort();
        }
        self.after_grouping(options.silent);
        Ok(())
    }

    /// Group by `field`, toggling the direction when already grouped by it.
    pub fn group_by(&mut self, field: &str) -> Result<()> {
        self.group(field, GroupOptions::default())
    }

    /// Append a grouper for `field`.
    pub fn add_grouper(&mut self, field: &str, ascending: bool) -> Result<()> {
        self.group(field, GroupOptions::default().add(true).ascending(ascending))
    }

    /// Remove the groupers on `field`. Removing the last one ungroups.
    pub fn remove_grouper(&mut self, field: &str) -> Result<bool> {
        let Some(groupers) = self.groupers.as_mut() else {
            return Ok(false);
        };
        let before = groupers.len();
        groupers.retain(|g| g.field_name() != Some(field));
        if groupers.len() == before {
            return Ok(false);
        }
        if groupers.is_empty() {
            self.clear_groupers(false)?;
        } else {
            self.group_info = groupers.first().cloned();
            self.invalidate_filters_fn();
            self.sort();
            self.after_grouping(false);
        }
        Ok(true)
    }

    /// Ungroup.
    pub fn clear_groupers(&mut self, silent: bool) -> Result<()> {
        self.set_groupers(None, silent)
    }

    fn ungroup(&mut self) {
        self.include_collapsed();
        self.groupers = None;
        self.group_info = None;

        let values = self.remove_headers_and_footers(self.storage.all_to_vec());
        let filtered = self
            .storage
            .is_filtered()
            .then(|| {
                self.storage
                    .values()
                    .filter(|r| !r.is_special_row() && !r.is_linked())
                    .cloned()
                    .collect()
            });
        for record in &values {
            record.clear_group_parent(self.id);
            record.set_hidden_by_collapse(false);
        }
        for row in std::mem::take(&mut self.group_records).all_to_vec() {
            row.clear_group_members();
            self.unregister(&row);
        }
        self.collapsed_groups.clear();
        self.invalidate_filters_fn();
        self.storage.replace_values(values, filtered, true);
        self.invalidate_id_map();
        tracing::debug!(target: targets::GROUP, "store ungrouped");
    }

    fn after_grouping(&self, silent: bool) {
        if silent {
            return;
        }
        let mut event = StoreEvent::new(StoreAction::Group).with_records(self.storage.to_vec());
        event.groupers = self.groupers().to_vec();
        event.is_grouped = self.is_grouped();
        let signals = self.signals();
        signals.group.emit(event.clone());
        signals.refresh.emit(event);
    }

    // -------------------------------------------------------------------------
    // Collapse / expand
    // -------------------------------------------------------------------------

    /// Collapse or expand a group. `None` flips the current state.
    ///
    /// Returns `true` if the state changed.
    pub fn toggle_collapse(&mut self, header: &Record, collapse: Option<bool>) -> Result<bool> {
        if !self.is_grouped() {
            return Err(Error::NotGrouped);
        }
        if !header.is_group_header() || !self.contains(header) {
            return Err(Error::unknown_record(header.id()));
        }
        let collapse = collapse.unwrap_or(!header.is_collapsed());
        Ok(if collapse {
            self.collapse(header, true)
        } else {
            self.expand(header, true)
        })
    }

    /// Hide the members of `header`. With `notify` the collapsed state is
    /// announced through `toggle_group`.
    pub(crate) fn collapse(&mut self, header: &Record, notify: bool) -> bool {
        if header.is_collapsed() {
            return false;
        }
        self.exclude_group_records(header);
        header.set_collapsed(true);
        self.collapsed_groups.insert(header.id().clone());
        if notify {
            tracing::debug!(target: targets::GROUP, id = %header.id(), "group collapsed");
            self.signals().toggle_group.emit(ToggleGroupEvent {
                header: header.clone(),
                collapse: true,
            });
        }
        true
    }

    /// Show the members of `header` again. Without `update_map` the group is
    /// only expanded temporarily and stays tracked as collapsed.
    pub(crate) fn expand(&mut self, header: &Record, update_map: bool) -> bool {
        if !header.is_collapsed() {
            return false;
        }
        self.include_group_records(header);
        header.set_collapsed(false);
        if update_map {
            self.collapsed_groups.shift_remove(header.id());
            tracing::debug!(target: targets::GROUP, id = %header.id(), "group expanded");
            self.signals().toggle_group.emit(ToggleGroupEvent {
                header: header.clone(),
                collapse: false,
            });
        }
        true
    }

    /// Temporarily put the members of collapsed groups back, e.g. before filtering.
    pub(crate) fn include_collapsed(&mut self) {
        for id in self.collapsed_groups.clone() {
            if let Some(header) = self.registry.get(&id).cloned() {
                self.expand(&header, false);
            }
        }
    }

    /// Undo [`include_collapsed`](Self::include_collapsed).
    pub(crate) fn exclude_collapsed(&mut self) {
        for id in self.collapsed_groups.clone() {
            if let Some(header) = self.registry.get(&id).cloned() {
                self.collapse(&header, false);
            }
        }
    }

    fn include_group_records(&mut self, header: &Record) {
        self.include_exclude_group_records(header, true);
    }

    fn exclude_group_records(&mut self, header: &Record) {
        self.include_exclude_group_records(header, false);
    }

    /// Splice the members of `header` into (`include`) or out of the backing collection.
    fn include_exclude_group_records(&mut self, header: &Record, include: bool) {
        let Some(all_index) = self.storage.all_index_of(header.id()) else {
            return;
        };
        // Only include collapsed groups and exclude expanded ones.
        if header.is_collapsed() != include {
            return;
        }
        let unfiltered = header.unfiltered_group_children();
        for member in &unfiltered {
            member.set_hidden_by_collapse(!include);
        }
        let index = self.storage.index_of(header.id());

        if include {
            if let Some(index) = index {
                let missing: Vec<Record> = header
                    .group_children()
                    .into_iter()
                    .filter(|r| !self.storage.is_visible(r.id()))
                    .collect();
                self.storage.splice_visible(index + 1, 0, missing);
            }
            let missing: Vec<Record> = unfiltered
                .into_iter()
                .filter(|r| !self.storage.contains_key(r.id()))
                .collect();
            self.storage.splice(all_index + 1, 0, missing);
        } else {
            if let Some(index) = index {
                self.storage.splice_visible(index + 1, header.group_children().len(), Vec::new());
            }
            self.storage.splice(all_index + 1, unfiltered.len(), Vec::new());
        }
        self.invalidate_id_map();
    }

    // -------------------------------------------------------------------------
    // Materialization
    // -------------------------------------------------------------------------

    /// Strip group rows and group links from `records`, unregistering them.
    /// Headers are emptied so they can be reused.
    pub(crate) fn remove_headers_and_footers(&mut self, records: Vec<Record>) -> Vec<Record> {
        let mut kept = Vec::with_capacity(records.len());
        for record in records {
            if record.is_group_header() {
                record.clear_group_members();
            }
            let grouped_link = record.is_linked() && record.group_parent(self.id).is_some();
            if record.is_special_row() || grouped_link {
                self.unregister(&record);
            } else {
                kept.push(record);
            }
        }
        kept
    }

    /// Rebuild the grouped sequence from the data in the backing collection.
    ///
    /// Returns the full sequence and, when filtered, the visible one, ready
    /// for a silent `replace_values`.
    pub(crate) fn prepare_group_records(&mut self) -> (Vec<Record>, Option<Vec<Record>>) {
        let _perf = PerfSpan::new(span_names::GROUP_PASS);
        let Some(grouper) = self.groupers.as_ref().and_then(|g| g.first()).cloned() else {
            return (self.storage.all_to_vec(), None);
        };
        let filtered = self.is_filtered();
        let collapse_all = self.config.start_groups_collapsed && self.group_records.is_empty();
        let previous = self.group_records.to_vec();

        for header in previous.iter().filter(|r| r.is_group_header() && r.is_collapsed()) {
            self.include_group_records(header);
        }

        let mut records = self.remove_headers_and_footers(self.storage.all_to_vec());
        if !self.sorters.is_empty() {
            let sorters = self.sorters.clone();
            records.sort_by(|a, b| compare_all(&sorters, a, b));
        }

        if filtered {
            self.invalidate_filters_fn();
        }
        let test = self.filters_function();
        let allowance: HashSet<RecordId> = if self.config.reapply_filter_on_update {
            HashSet::new()
        } else {
            self.group_visible_record_ids.iter().cloned().collect()
        };
        let is_visible =
            |record: &Record| !filtered || test(record) || allowance.contains(record.id());

        let grouping_by_id = grouper.field_name() == Some(self.config.id_field.as_str());
        let data_field = if grouping_by_id { "" } else { grouper.leaf_field_name() };

        let mut groups: IndexMap<RecordId, Record> = IndexMap::new();
        for record in records {
            let (values, empty_array) = match grouper.group_value(&record) {
                FieldValue::None => (vec![FieldValue::from(NO_VALUE)], false),
                FieldValue::List(items) if items.is_empty() => {
                    (vec![FieldValue::List(Vec::new())], true)
                }
                FieldValue::List(items) => (items, false),
                other => (vec![other], false),
            };
            for (position, value) in values.into_iter().enumerate() {
                let fragment = group_id_fragment(&value);
                let id = RecordId::Str(format!("group-header-{fragment}"));
                let header = match groups.get(&id) {
                    Some(header) => header.clone(),
                    None => {
                        let header = previous
                            .iter()
                            .find(|r| r.is_group_header() && r.id() == &id)
                            .cloned()
                            .unwrap_or_else(|| {
                                Record::new_group_header(
                                    id.clone(),
                                    value.clone(),
                                    data_field,
                                    empty_array,
                                    collapse_all,
                                )
                            });
                        header.clear_group_members();
                        if header.is_collapsed() {
                            self.collapsed_groups.insert(id.clone());
                        }
                        self.register(&header);
                        groups.insert(id, header.clone());
                        header
                    }
                };

                let member = if position == 0 {
                    record.clone()
                } else {
                    let link = record.group_link(&fragment).unwrap_or_else(|| {
                        let link = record.link(&fragment);
                        record.insert_group_link(&fragment, link.clone());
                        link
                    });
                    self.register(&link);
                    link
                };
                member.set_group_parent(self.id, &header);
                let visible = is_visible(&member);
                header.push_group_member(member, visible);
            }
        }

        let ascending = grouper.is_ascending();
        let mut headers: Vec<Record> = groups.into_values().collect();
        headers.sort_by(|a, b| {
            let ord = grouper.compare_values(
                &a.group_row_for().unwrap_or_default(),
                &b.group_row_for().unwrap_or_default(),
            );
            if ascending { ord } else { ord.reverse() }
        });

        let mut group_rows = Vec::with_capacity(headers.len() * 2);
        for header in &headers {
            group_rows.push(header.clone());
            if self.config.use_group_footers {
                let fragment = group_id_fragment(&header.group_row_for().unwrap_or_default());
                let id = RecordId::Str(format!("group-footer-{fragment}"));
                let footer = previous
                    .iter()
                    .find(|r| r.id() == &id && r.group_header().is_some_and(|h| h.ptr_eq(header)))
                    .cloned()
                    .unwrap_or_else(|| Record::new_group_footer(id, header));
                self.register(&footer);
                header.push_group_member(footer.clone(), true);
                group_rows.push(footer);
            }
        }

        let mut values = Vec::new();
        for header in &headers {
            values.push(header.clone());
            let members = header.unfiltered_group_children();
            for member in &members {
                member.set_hidden_by_collapse(header.is_collapsed());
            }
            if !header.is_collapsed() {
                values.extend(members);
            }
        }

        let visible = filtered.then(|| {
            values
                .iter()
                .filter(|r| {
                    if r.is_special_row() {
                        r.group_children().iter().any(|c| !c.is_group_footer())
                    } else {
                        is_visible(r)
                    }
                })
                .cloned()
                .collect()
        });

        for old in &previous {
            if !group_rows.iter().any(|r| r.ptr_eq(old)) {
                old.clear_group_members();
                self.collapsed_groups.shift_remove(old.id());
                self.unregister(old);
            }
        }
        self.group_records = Collection::from_values(group_rows);
        self.invalidate_id_map();
        tracing::debug!(
            target: targets::GROUP,
            groups = headers.len(),
            records = values.len(),
            "groups materialized"
        );
        (values, visible)
    }

    // -------------------------------------------------------------------------
    // Reactions to data changes
    // -------------------------------------------------------------------------

    /// Keep group rows in step with structural changes of the data.
    pub(crate) fn on_data_change(&mut self, action: ChangeAction, removed: &[Record]) {
        if !self.is_grouped() {
            return;
        }
        if (action == ChangeAction::Splice && !removed.is_empty()) || action == ChangeAction::Move {
            let (values, filtered) = self.prepare_group_records();
            self.storage.replace_values(values, filtered, true);
            self.invalidate_id_map();
        }
    }

    /// Regroup after additions, or after updates touching a grouped field.
    pub(crate) fn on_data_changed(&mut self, action: StoreAction, changes: Option<&[String]>) {
        if !self.is_grouped() {
            return;
        }
        let regroup = match changes {
            None => matches!(action, StoreAction::Add | StoreAction::Dataset),
            Some(changes) => self
                .groupers()
                .iter()
                .any(|g| changes.iter().any(|c| c == g.root_field_name())),
        };
        if regroup {
            self.sort();
        }
    }

    // -------------------------------------------------------------------------
    // Moving
    // -------------------------------------------------------------------------

    /// Move `records` so they sit directly before `before` (at the end for `None`).
    ///
    /// In a grouped store the records join the group they are dropped into: their
    /// group field takes the target group's value. Dropping before a group header
    /// targets the group above it. Tree stores move the nodes below the parent of
    /// `before` (or the root).
    pub fn move_records(&mut self, records: &[Record], before: Option<&Record>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        if let Some(root) = self.root.clone() {
            let parent = before.and_then(Record::parent).unwrap_or(root);
            let index = before.and_then(|b| {
                parent
                    .ordered_children()
                    .iter()
                    .filter(|c| !records.contains(c))
                    .position(|c| c.ptr_eq(b))
            });
            self.insert_child(&parent, index, records.to_vec())?;
            return Ok(());
        }

        let mut before = before.cloned();
        if self.is_grouped() {
            let anchor = match &before {
                Some(b) if b.is_special_row() => match self.get_prev(b, false, false) {
                    Some(prev) => Some(prev),
                    None => return Ok(()),
                },
                other => other.clone(),
            };
            if let Some(header) = self.group_header_for_record(anchor.as_ref()) {
                self.assign_group(records, &header);
                if self.is_filtered() && before.as_ref().is_some_and(Record::is_special_row) {
                    let rows = self.unfiltered_group_records();
                    before = rows
                        .iter()
                        .position(|r| r.ptr_eq(&header))
                        .and_then(|index| {
                            rows[index + 1..].iter().find(|r| r.is_group_header()).cloned()
                        });
                }
            }
        }
        self.move_in_storage(records, before.as_ref());
        Ok(())
    }

    fn assign_group(&mut self, records: &[Record], header: &Record) {
        let field = self.groupers().first().and_then(|g| g.field_name()).map(str::to_string);
        let Some(field) = field else {
            return;
        };
        let value = match header.group_row_for() {
            Some(FieldValue::String(s)) if s == NO_VALUE => FieldValue::None,
            Some(value) => value,
            None => return,
        };
        let reapply = self.config.reapply_filter_on_update;
        self.config.reapply_filter_on_update = false;
        self.begin_batch();
        for record in records {
            self.update(record, [(field.as_str(), value.clone())]);
        }
        self.end_batch();
        self.config.reapply_filter_on_update = reapply;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::model::filter::CollectionFilter;
    use crate::model::filter::FilterOperator;
    use crate::model::store::StoreConfig;

    fn sample(config: StoreConfig) -> Store {
        Store::with_records(
            config,
            (1..=6).map(|i| {
                Record::new(
                    i,
                    [
                        ("type", FieldValue::from(if i % 2 == 0 { "B" } else { "A" })),
                        ("size", FieldValue::Int(i)),
                    ],
                )
            }),
        )
    }

    fn ids(records: &[Record]) -> Vec<String> {
        records.iter().map(|r| r.id().to_string()).collect()
    }

    fn header(store: &Store, value: &str) -> Record {
        store.get_by_id(format!("group-header-{value}")).unwrap()
    }

    #[test]
    fn test_group_materializes_headers() {
        let mut store = sample(StoreConfig::default());
        store.group_by("type").unwrap();
        assert!(store.is_grouped());
        assert_eq!(
            ids(&store.records()),
            vec!["group-header-A", "1", "3", "5", "group-header-B", "2", "4", "6"]
        );
        let a = header(&store, "A");
        assert_eq!(a.child_count(), 3);
        assert_eq!(a.get("type"), FieldValue::from("A"));
        assert_eq!(store.get_by_id(3).unwrap().group_parent(store.id()), Some(a));
    }

    #[test]
    fn test_group_direction_toggles() {
        let mut store = sample(StoreConfig::default());
        store.group_by("type").unwrap();
        store.group_by("type").unwrap();
        assert_eq!(store.records()[0].id().to_string(), "group-header-B");
        assert_eq!(store.group_info().map(Grouper::is_ascending), Some(false));

        store.group("type", GroupOptions::new().ascending(false)).unwrap();
        assert_eq!(store.records()[0].id().to_string(), "group-header-B");
    }

    #[test]
    fn test_regroup_reuses_headers() {
        let mut store = sample(StoreConfig::default());
        store.group_by("type").unwrap();
        let before = header(&store, "A");
        store.sort();
        assert!(header(&store, "A").ptr_eq(&before));
    }

    #[test]
    fn test_grouped_filter_scenario() {
        let mut store = sample(StoreConfig::default());
        store.group_by("type").unwrap();
        store.filter(CollectionFilter::new("size", 2).operator(FilterOperator::Le));

        assert_eq!(ids(&store.records()), vec!["group-header-A", "1", "group-header-B", "2"]);
        for value in ["A", "B"] {
            let h = header(&store, value);
            assert_eq!(h.group_children().len(), 1);
            assert_eq!(h.unfiltered_group_children().len(), 3);
        }
    }

    #[test]
    fn test_header_follows_members_through_filters() {
        let mut store = sample(StoreConfig::default());
        store.group_by("type").unwrap();
        store.filter(CollectionFilter::new("type", "A"));
        let a = header(&store, "A");
        let b = header(&store, "B");
        assert!(!store.is_filtered_out(&a));
        assert!(store.is_filtered_out(&b));
        assert_eq!(ids(&store.records()), vec!["group-header-A", "1", "3", "5"]);

        store.clear_filters(true);
        assert_eq!(store.count(), 8);
    }

    #[test]
    fn test_collapse_round_trip() {
        let mut store = sample(StoreConfig::default());
        store.group_by("type").unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));
        let captured = events.clone();
        store.signals().toggle_group.connect(move |event| {
            captured.lock().push((event.header.id().to_string(), event.collapse));
        });

        let a = header(&store, "A");
        let members = ids(&a.unfiltered_group_children());
        assert!(store.toggle_collapse(&a, None).unwrap());
        assert!(!store.toggle_collapse(&a, Some(true)).unwrap());
        assert_eq!(ids(&store.records()), vec!["group-header-A", "group-header-B", "2", "4", "6"]);
        assert!(store.is_in_collapsed_group(&store.get_by_id(1).unwrap()));
        assert!(store.get_by_id(1).unwrap().meta().hidden_by_collapse);

        assert!(store.toggle_collapse(&a, None).unwrap());
        assert_eq!(
            ids(&store.records()),
            vec!["group-header-A", "1", "3", "5", "group-header-B", "2", "4", "6"]
        );
        assert_eq!(ids(&a.unfiltered_group_children()), members);
        assert_eq!(
            *events.lock(),
            vec![("group-header-A".to_string(), true), ("group-header-A".to_string(), false)]
        );
    }

    #[test]
    fn test_filter_keeps_groups_collapsed() {
        let mut store = sample(StoreConfig::default());
        store.group_by("type").unwrap();
        let a = header(&store, "A");
        store.toggle_collapse(&a, Some(true)).unwrap();
        store.filter(CollectionFilter::new("size", 3).operator(FilterOperator::Ge));

        assert_eq!(ids(&store.records()), vec!["group-header-A", "group-header-B", "4", "6"]);
        assert_eq!(ids(&a.group_children()), vec!["3", "5"]);
        assert!(a.is_collapsed());

        store.toggle_collapse(&a, Some(false)).unwrap();
        assert_eq!(
            ids(&store.records()),
            vec!["group-header-A", "3", "5", "group-header-B", "4", "6"]
        );
    }

    #[test]
    fn test_footers() {
        let mut store = sample(StoreConfig::default().use_group_footers(true));
        store.group_by("type").unwrap();
        assert_eq!(
            ids(&store.records()),
            vec![
                "group-header-A", "1", "3", "5", "group-footer-A",
                "group-header-B", "2", "4", "6", "group-footer-B"
            ]
        );
        let a = header(&store, "A");
        assert_eq!(a.child_count(), 4);
        let footer = store.get_by_id("group-footer-A").unwrap();
        assert_eq!(footer.group_header(), Some(a.clone()));
        assert_eq!(store.group_header_for_record(Some(&footer)), Some(a));

        store.sort();
        assert!(store.get_by_id("group-footer-A").unwrap().ptr_eq(&footer));
    }

    #[test]
    fn test_start_groups_collapsed() {
        let mut store = sample(StoreConfig::default().start_groups_collapsed(true));
        store.group_by("type").unwrap();
        assert_eq!(ids(&store.records()), vec!["group-header-A", "group-header-B"]);
        assert_eq!(store.data_records().len(), 6);

        let b = header(&store, "B");
        store.toggle_collapse(&b, Some(false)).unwrap();
        store.add(vec![Record::new(7, [("type", "B")])]);
        assert_eq!(
            ids(&store.records()),
            vec!["group-header-A", "group-header-B", "2", "4", "6", "7"]
        );
    }

    #[test]
    fn test_multi_value_groups_use_links() {
        let mut store = Store::with_records(
            StoreConfig::default(),
            vec![
                Record::new(1, [("tags", FieldValue::List(vec!["x".into(), "y".into()]))]),
                Record::new(2, [("tags", FieldValue::List(vec!["y".into()]))]),
                Record::new(3, [("tags", FieldValue::List(Vec::new()))]),
                Record::new(4, Vec::<(&str, FieldValue)>::new()),
            ],
        );
        store.group_by("tags").unwrap();
        assert_eq!(
            ids(&store.records()),
            vec![
                "group-header---novalue--", "4",
                "group-header-x", "1",
                "group-header-y", "1_link_y", "2",
                "group-header---", "3",
            ]
        );
        let link = store.get_by_id("1_link_y").unwrap();
        assert!(link.is_linked());
        assert_eq!(link.original_id(), &RecordId::Int(1));
        assert!(store.get_by_id("group-header---").unwrap().is_empty_array_group());
    }

    #[test]
    fn test_remove_updates_groups() {
        let mut store = sample(StoreConfig::default());
        store.group_by("type").unwrap();
        store.remove_by_id(&[RecordId::Int(2), RecordId::Int(4), RecordId::Int(6)]);
        assert_eq!(ids(&store.records()), vec!["group-header-A", "1", "3", "5"]);
        assert!(store.get_by_id("group-header-B").is_none());
    }

    #[test]
    fn test_update_of_group_field_regroups() {
        let mut store = sample(StoreConfig::default());
        store.group_by("type").unwrap();
        let record = store.get_by_id(1).unwrap();
        store.update(&record, [("type", "B")]);
        assert_eq!(ids(&header(&store, "B").group_children()), vec!["1", "2", "4", "6"]);
    }

    #[test]
    fn test_move_between_groups() {
        let mut store = sample(StoreConfig::default());
        store.group_by("type").unwrap();
        let moving = store.get_by_id(2).unwrap();
        let before = store.get_by_id(3).unwrap();
        store.move_records(&[moving.clone()], Some(&before)).unwrap();

        assert_eq!(moving.get("type"), FieldValue::from("A"));
        assert_eq!(
            ids(&store.records()),
            vec!["group-header-A", "1", "2", "3", "5", "group-header-B", "4", "6"]
        );
    }

    #[test]
    fn test_move_before_header_targets_group_above() {
        let mut store = sample(StoreConfig::default());
        store.group_by("type").unwrap();
        let moving = store.get_by_id(6).unwrap();
        let b = header(&store, "B");
        store.move_records(&[moving.clone()], Some(&b)).unwrap();
        assert_eq!(moving.get("type"), FieldValue::from("A"));
        assert_eq!(
            ids(&store.records()),
            vec!["group-header-A", "1", "3", "5", "6", "group-header-B", "2", "4"]
        );

        let a = header(&store, "A");
        let first = store.get_by_id(1).unwrap();
        store.move_records(&[first.clone()], Some(&a)).unwrap();
        assert_eq!(first.get("type"), FieldValue::from("A"));
    }

    #[test]
    fn test_filtered_move_before_header_skips_hidden_groups() {
        let mut store = Store::with_records(
            StoreConfig::default(),
            (1..=6).map(|i: i64| {
                let kind = match i {
                    1 | 2 => "A",
                    3 | 4 => "B",
                    _ => "C",
                };
                Record::new(i, [("type", kind)])
            }),
        );
        store.group_by("type").unwrap();
        store.filter(CollectionFilter::new("type", "B").operator(FilterOperator::Ne));
        assert_eq!(
            ids(&store.records()),
            vec!["group-header-A", "1", "2", "group-header-C", "5", "6"]
        );

        let moving = store.get_by_id(5).unwrap();
        let c = header(&store, "C");
        store.move_records(&[moving.clone()], Some(&c)).unwrap();

        assert_eq!(moving.get("type"), FieldValue::from("A"));
        assert_eq!(
            ids(&store.all_records()),
            vec!["group-header-A", "1", "2", "5", "group-header-B", "3", "4", "group-header-C", "6"]
        );
        assert_eq!(
            ids(&store.records()),
            vec!["group-header-A", "1", "2", "5", "group-header-C", "6"]
        );
        assert_eq!(ids(&header(&store, "B").unfiltered_group_children()), vec!["3", "4"]);
    }

    #[test]
    fn test_move_tree_nodes() {
        let mut store = Store::new(StoreConfig::default().tree(true));
        let root = store.root().cloned().unwrap();
        store.append_child(&root, (1..=3).map(|i| Record::new(i, [("name", i)]))).unwrap();
        let first = store.get_by_id(1).unwrap();
        let third = store.get_by_id(3).unwrap();
        store.move_records(&[third], Some(&first)).unwrap();
        assert_eq!(ids(&store.records()), vec!["3", "1", "2"]);
    }

    #[test]
    fn test_group_queries() {
        let mut store = sample(StoreConfig::default());
        assert!(store.get_group_titles().is_none());
        assert!(store.is_record_in_group(&store.get_by_id(1).unwrap(), &"A".into()).is_none());

        store.group_by("type").unwrap();
        assert_eq!(
            store.get_group_titles(),
            Some(vec![FieldValue::from("A"), FieldValue::from("B")])
        );
        assert_eq!(store.is_record_in_group(&store.get_by_id(1).unwrap(), &"A".into()), Some(true));
        assert_eq!(ids(&store.get_group_records(&"B".into()).unwrap()), vec!["2", "4", "6"]);
        assert_eq!(store.unfiltered_group_records().len(), 2);
        assert_eq!(store.collect_group_records(true, false).len(), 6);
        assert_eq!(store.collect_group_records(true, true).len(), 8);
        assert_eq!(store.group_header_for_record(None), Some(header(&store, "B")));
    }

    #[test]
    fn test_ungroup() {
        let mut store = sample(StoreConfig::default());
        let events = Arc::new(Mutex::new(Vec::new()));
        let captured = events.clone();
        store.signals().group.connect(move |event| captured.lock().push(event.is_grouped));

        store.group_by("type").unwrap();
        store.toggle_collapse(&header(&store, "A"), Some(true)).unwrap();
        store.clear_groupers(false).unwrap();

        assert!(!store.is_grouped());
        assert_eq!(ids(&store.records()), vec!["1", "3", "5", "2", "4", "6"]);
        assert!(store.get_by_id("group-header-A").is_none());
        assert!(store.group_records().is_empty());
        assert_eq!(*events.lock(), vec![true, false]);
        assert!(matches!(
            store.toggle_collapse(&Record::new(9, [("a", 1)]), None),
            Err(Error::NotGrouped)
        ));
    }

    #[test]
    fn test_add_and_remove_groupers() {
        let mut store = sample(StoreConfig::default());
        store.add_grouper("type", false).unwrap();
        store.add_grouper("size", true).unwrap();
        assert_eq!(store.groupers().len(), 2);
        assert_eq!(store.records()[0].id().to_string(), "group-header-B");

        assert!(store.remove_grouper("type").unwrap());
        assert_eq!(store.groupers().len(), 1);
        assert_eq!(store.records()[0].id().to_string(), "group-header-1");
        assert!(!store.remove_grouper("missing").unwrap());

        assert!(store.remove_grouper("size").unwrap());
        assert!(!store.is_grouped());
    }

    #[test]
    fn test_custom_group_order() {
        let mut store = sample(StoreConfig::default());
        let grouper = Grouper::new("size")
            .ascending(true)
            .sort_with(|a, b| b.compare(a));
        store.group(grouper, GroupOptions::default()).unwrap();
        assert_eq!(store.records()[0].id().to_string(), "group-header-6");
    }

    #[test]
    fn test_tree_stores_cannot_group() {
        let mut store = Store::new(StoreConfig::default().tree(true));
        assert!(matches!(store.group_by("type"), Err(Error::NotATree)));
    }
}
