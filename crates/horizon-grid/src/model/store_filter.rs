//! The store's filter engine.
//!
//! Filters live in a keyed [`Collection`] of [`CollectionFilter`]s. The
//! enabled ones are compiled lazily into a single predicate
//! ([`Store::filters_function`]) which is dropped whenever the filter set
//! changes and rebuilt on the next read.
//!
//! A pass ([`Store::filter`]) works differently for the two store shapes:
//!
//! - Tree stores filter the hierarchy in place, keeping every ancestor of a
//!   matching node, then flatten the surviving expanded part.
//! - Flat stores install the predicate as the `primary-filter` of the
//!   backing collection. Members of collapsed groups are put back for the
//!   duration of the pass so they are tested too.
//!
//! Group header and footer rows are never tested directly: a header passes
//! when at least one of its members passes.
//!
//! Passes can be deferred with [`Store::suspend_filter_on_update`]; the
//! matching [`Store::resume_filter_on_update`] runs the pending pass.

use std::collections::HashSet;
use std::sync::Arc;

use horizon_grid_core::logging::{span_names, targets};
use horizon_grid_core::{Collection, CollectionFilterFn, PerfSpan};

use super::filter::{CollectionFilter, FilterDelta, FilterOutcome, FilterRequest, FilterSpec};
use super::record::{Record, RecordId};
use super::store::{Store, StoreAction, StoreEvent};
use super::tree;
use crate::error::{Error, Result};

/// The compiled predicate of all enabled filters.
pub type FiltersFn = CollectionFilterFn<Record>;

/// Id of the filter the store installs on its backing collection.
pub(crate) const PRIMARY_FILTER: &str = "primary-filter";

impl Store {
    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// The configured filters, enabled or not.
    pub fn filters(&self) -> &Collection<CollectionFilter> {
        &self.filters
    }

    /// The filter with `id`.
    pub fn get_filter(&self, id: &str) -> Option<&CollectionFilter> {
        self.filters.get(&id.to_string())
    }

    /// Returns `true` if at least one filter is enabled.
    pub fn is_filtered(&self) -> bool {
        self.filters.values().any(|filter| !filter.is_disabled())
    }

    /// The compiled predicate. Passes everything when no filter is enabled.
    pub fn filters_function(&self) -> FiltersFn {
        if let Some(compiled) = self.filters_fn.read().as_ref() {
            return compiled.clone();
        }
        let compiled = self.compile_filters_function();
        *self.filters_fn.write() = Some(compiled.clone());
        compiled
    }

    /// Returns `true` if the store is filtered and `record` does not pass.
    pub fn is_filtered_out(&self, record: &Record) -> bool {
        self.is_filtered() && !(self.filters_function())(record)
    }

    /// Property of the most recently added filter.
    pub fn latest_filter_field(&self) -> Option<String> {
        self.filters.last().and_then(|f| f.property().map(str::to_string))
    }

    /// Human readable form (`property operator value`) of the property filter on
    /// `field`. Empty when there is none or the filter is a predicate.
    pub fn convert_filter_to_string(&self, field: &str) -> String {
        self.filters
            .values()
            .find(|f| f.property() == Some(field))
            .filter(|f| !f.is_function())
            .map(|f| f.to_string())
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Add (or replace by id) a filter.
    ///
    /// Unless `silent`, the filters are applied and the outcome returned.
    pub fn add_filter(
        &mut self,
        filter: impl Into<CollectionFilter>,
        silent: bool,
    ) -> Option<FilterOutcome> {
        let filter = filter.into();
        tracing::debug!(target: targets::FILTER, id = filter.id(), "filter added");
        self.filters.upsert([filter]);
        self.invalidate_filters_fn();
        (!silent).then(|| self.filter(FilterRequest::Reapply))
    }

    /// Filter the store.
    ///
    /// [`FilterRequest::Reapply`] re-runs the current filters. Other requests add
    /// filters first and return [`FilterOutcome::Unchanged`] when the store was
    /// not filtered before and is not filtered after (for example after adding a
    /// disabled filter). While filtering is suspended the pass is deferred.
    pub fn filter(&mut self, request: impl Into<FilterRequest>) -> FilterOutcome {
        let mut silent = false;
        match request.into() {
            FilterRequest::Reapply => {}
            FilterRequest::Add(spec) => {
                if !self.add_filters(spec.into_filters()) {
                    return FilterOutcome::Unchanged;
                }
            }
            FilterRequest::Options(options) => {
                silent = options.silent;
                let was_filtered = self.is_filtered();
                if options.replace {
                    self.clear_filters(false);
                }
                let mut filters = FilterSpec::Many(options.filters).into_filters();
                if options.internal {
                    for filter in &mut filters {
                        filter.set_internal(true);
                    }
                }
                if !self.add_filters(filters) && !was_filtered {
                    return FilterOutcome::Unchanged;
                }
            }
        }
        self.invalidate_filters_fn();
        let outcome = self.perform_filter(silent);
        self.invalidate_id_map();
        outcome
    }

    /// Filter with a predicate.
    pub fn filter_by<F>(&mut self, filter: F) -> FilterOutcome
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        self.filter(FilterSpec::function(filter))
    }

    /// Replace every filter, internal ones included, and apply.
    pub fn set_filters(
        &mut self,
        filters: impl IntoIterator<Item = CollectionFilter>,
    ) -> FilterOutcome {
        let was_filtered = self.is_filtered();
        self.filters.clear();
        self.filters.add(filters);
        self.invalidate_filters_fn();
        if !was_filtered && !self.is_filtered() {
            return FilterOutcome::Unchanged;
        }
        let outcome = self.perform_filter(false);
        self.invalidate_id_map();
        outcome
    }

    /// Remove the filter `id`. Unless `silent`, the remaining filters are applied.
    pub fn remove_filter(&mut self, id: &str, silent: bool) -> Option<CollectionFilter> {
        let key = id.to_string();
        let removed = self.filters.remove([&key]).pop()?;
        tracing::debug!(target: targets::FILTER, id, "filter removed");
        self.invalidate_filters_fn();
        if !silent {
            self.filter(FilterRequest::Reapply);
        }
        Some(removed)
    }

    /// Remove every non-internal filter; internal filters must be removed by id.
    ///
    /// With `apply` the remaining filters are applied and the outcome returned.
    pub fn clear_filters(&mut self, apply: bool) -> Option<FilterOutcome> {
        let doomed: Vec<String> = self
            .filters
            .values()
            .filter(|f| !f.is_internal())
            .map(|f| f.id().to_string())
            .collect();
        self.filters.remove(doomed.iter());
        self.invalidate_filters_fn();
        apply.then(|| self.filter(FilterRequest::Reapply))
    }

    /// Defer filter passes until the matching
    /// [`resume_filter_on_update`](Self::resume_filter_on_update).
    pub fn suspend_filter_on_update(&mut self) {
        self.filter_batching += 1;
    }

    /// Undo one [`suspend_filter_on_update`](Self::suspend_filter_on_update).
    ///
    /// When the last suspension is lifted and a pass was requested meanwhile, it
    /// runs now and its outcome is returned.
    pub fn resume_filter_on_update(&mut self, silent: bool) -> Result<Option<FilterOutcome>> {
        if self.filter_batching == 0 {
            tracing::warn!(
                target: targets::FILTER,
                "resume_filter_on_update called without a matching suspend"
            );
            return Err(Error::UnbalancedResume);
        }
        self.filter_batching -= 1;
        if self.filter_batching > 0 || !self.needs_filtering {
            return Ok(None);
        }
        self.needs_filtering = false;
        self.invalidate_filters_fn();
        let outcome = self.perform_filter(silent);
        self.invalidate_id_map();
        Ok(Some(outcome))
    }

    /// Returns `true` while filter passes are suspended.
    pub fn is_filter_suspended(&self) -> bool {
        self.filter_batching > 0
    }

    /// Top level nodes a shallow tree filter keeps whether or not they pass.
    ///
    /// Takes effect on the next filter pass.
    pub fn set_force_included(&mut self, ids: impl IntoIterator<Item = RecordId>) {
        self.force_included = ids.into_iter().collect();
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Add filters silently. Returns `false` when filtering state stays "unfiltered".
    fn add_filters(&mut self, filters: Vec<CollectionFilter>) -> bool {
        let was_filtered = self.is_filtered();
        if !filters.is_empty() {
            self.filters.upsert(filters);
            self.invalidate_filters_fn();
        }
        was_filtered || self.is_filtered()
    }

    pub(crate) fn invalidate_filters_fn(&self) {
        *self.filters_fn.write() = None;
    }

    /// The conjunction of the enabled filters, without group row handling.
    pub(crate) fn record_filter(&self) -> FiltersFn {
        let active: Vec<CollectionFilter> = self
            .filters
            .values()
            .filter(|f| !f.is_disabled())
            .cloned()
            .collect();
        if active.is_empty() {
            return Arc::new(|_: &Record| true);
        }
        Arc::new(move |record: &Record| active.iter().all(|f| f.test(record)))
    }

    fn compile_filters_function(&self) -> FiltersFn {
        let test = self.record_filter();
        if !self.is_grouped() || !self.is_filtered() {
            return test;
        }
        Arc::new(move |candidate: &Record| {
            if candidate.is_special_row() {
                candidate
                    .group_children()
                    .iter()
                    .any(|child| !child.is_group_footer() && test(child))
            } else {
                test(candidate)
            }
        })
    }

    /// Run a filter pass now, or mark it pending while suspended.
    pub(crate) fn perform_filter(&mut self, silent: bool) -> FilterOutcome {
        if self.filter_batching > 0 {
            self.needs_filtering = true;
            tracing::trace!(target: targets::FILTER, "filter pass deferred");
            return FilterOutcome::Deferred;
        }
        let _perf = PerfSpan::new(span_names::FILTER_PASS);
        self.signals().before_filter.emit(self.filters.to_vec());

        let old_visible = self.storage.to_vec();
        let filtered = self.is_filtered();
        self.group_visible_record_ids.clear();

        if let Some(root) = self.root.clone() {
            if filtered {
                let deep = !self.config.shallow_tree_filter;
                let predicate = self.filters_function();
                tree::filter_tree(&root, &predicate, deep, &self.force_included, &self.sorters);
            } else {
                tree::traverse_clear_filter(&root, &self.sorters);
            }
            self.refresh_tree_view();
        } else if filtered {
            self.include_collapsed();
            self.refresh_group_children();
            let predicate = self.filters_function();
            self.storage.add_filter_fn(PRIMARY_FILTER, predicate);
            self.exclude_collapsed();
        } else {
            self.reset_group_children();
            self.storage.clear_filters();
        }
        self.invalidate_id_map();

        let delta = visible_delta(old_visible, self.storage.to_vec());
        tracing::debug!(
            target: targets::FILTER,
            old_count = delta.old_count,
            count = delta.count,
            added = delta.added.len(),
            removed = delta.removed.len(),
            "filter pass"
        );
        self.after_perform_filter(silent, &delta);
        FilterOutcome::Applied(delta)
    }

    fn after_perform_filter(&mut self, silent: bool, delta: &FilterDelta) {
        let signature = self.filter_signature();
        let repeated = delta.added.is_empty()
            && delta.removed.is_empty()
            && self.last_filter_signature.as_deref() == Some(signature.as_str());
        self.last_filter_signature = Some(signature);
        if silent || repeated {
            return;
        }

        let mut event = StoreEvent::new(StoreAction::Filter).with_records(self.storage.to_vec());
        event.added = delta.added.clone();
        event.removed = delta.removed.clone();
        event.old_count = delta.old_count;
        event.filters = self.filters.to_vec();
        let signals = self.signals();
        signals.filter.emit(event.clone());
        signals.refresh.emit(event.clone());
        signals.change.emit(event);
    }

    fn filter_signature(&self) -> String {
        self.filters
            .values()
            .filter(|f| !f.is_disabled())
            .map(CollectionFilter::signature)
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Recompute which members of each group pass the filters. Footers always stay.
    pub(crate) fn refresh_group_children(&self) {
        let test = self.record_filter();
        for header in self.group_records.values().filter(|r| r.is_group_header()) {
            let children: Vec<Record> = header
                .unfiltered_group_children()
                .into_iter()
                .filter(|member| member.is_group_footer() || test(member))
                .collect();
            header.set_group_children(children);
        }
    }

    /// Make every group member count as passing again.
    pub(crate) fn reset_group_children(&self) {
        for header in self.group_records.values().filter(|r| r.is_group_header()) {
            header.set_group_children(header.unfiltered_group_children());
        }
    }
}

/// Order-preserving difference between two visible sequences.
fn visible_delta(old: Vec<Record>, new: Vec<Record>) -> FilterDelta {
    let old_ids: HashSet<RecordId> = old.iter().map(|r| r.id().clone()).collect();
    let new_ids: HashSet<RecordId> = new.iter().map(|r| r.id().clone()).collect();
    FilterDelta {
        added: new.iter().filter(|r| !old_ids.contains(r.id())).cloned().collect(),
        removed: old.iter().filter(|r| !new_ids.contains(r.id())).cloned().collect(),
        old_count: old.len(),
        count: new.len(),
    }
}
