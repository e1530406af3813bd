//! Tree traversal helpers for tree stores.
//!
//! A tree node keeps three child lists: `ordered_children` (canonical,
//! sorted, never filtered), `children` (what is currently visible) and
//! `unfiltered_children` (the superset snapshot taken the first time a
//! filter pass touched the node). The functions here maintain those lists;
//! the store decides when to call them.

use std::collections::HashSet;
use std::fmt::{self, Write};

use horizon_grid_core::logging::{span_names, targets};
use horizon_grid_core::{PerfSpan, TreeFormatOptions};

use super::record::{Record, RecordId};
use super::sorter::{Sorter, compare_all};
use super::store::Descendants;
use super::store_filter::FiltersFn;

// -----------------------------------------------------------------------------
// Filtering
// -----------------------------------------------------------------------------

/// Filter the subtree below `node`, keeping ancestors of matching descendants.
///
/// In deep mode a child survives if it or any of its descendants matches.
/// In shallow mode a child survives if it matches directly or its id is in
/// `force_include`. Returns whether `node` itself survives.
pub(crate) fn traverse_filter(
    node: &Record,
    filter: &FiltersFn,
    deep: bool,
    force_include: Option<&HashSet<RecordId>>,
    sorters: &[Sorter],
) -> bool {
    let hits_current = !node.is_root() && filter(node);
    let candidates = node.unfiltered_children().unwrap_or_else(|| node.children());
    if candidates.is_empty() {
        return hits_current;
    }
    if node.unfiltered_children().is_none() {
        node.set_unfiltered_children(Some(candidates.clone()));
    }

    let mut kept: Vec<Record> = candidates
        .iter()
        .filter(|child| {
            if deep {
                traverse_filter(child, filter, deep, None, sorters)
            } else {
                filter(child) || force_include.is_some_and(|ids| ids.contains(child.id()))
            }
        })
        .cloned()
        .collect();
    if !sorters.is_empty() {
        kept.sort_by(|a, b| compare_all(sorters, a, b));
    }

    for (index, child) in candidates.iter().enumerate() {
        child.set_unfiltered_index(index);
    }
    for (index, child) in kept.iter().enumerate() {
        child.set_parent_index(index);
    }
    let survives = hits_current || !kept.is_empty();
    node.set_children(kept);
    survives
}

/// Filter a whole tree from its root.
pub(crate) fn filter_tree(
    root: &Record,
    filter: &FiltersFn,
    deep: bool,
    force_include: &HashSet<RecordId>,
    sorters: &[Sorter],
) {
    let _perf = PerfSpan::new(span_names::TREE_FILTER);
    traverse_filter(root, filter, deep, Some(force_include), sorters);
    tracing::trace!(target: targets::FILTER, root = %root.id(), deep, "tree filtered");
}

/// Undo filtering below `node`: visible children are restored from the
/// canonical order and the unfiltered snapshot is discarded.
pub(crate) fn traverse_clear_filter(node: &Record, sorters: &[Sorter]) {
    if node.unfiltered_children().is_some() {
        node.set_children(node.ordered_children());
        node.set_unfiltered_children(None);
    }
    let mut children = node.children();
    if children.is_empty() {
        return;
    }
    if !sorters.is_empty() {
        children.sort_by(|a, b| compare_all(sorters, a, b));
        node.set_children(children.clone());
    }
    for (index, child) in children.iter().enumerate() {
        traverse_clear_filter(child, sorters);
        child.set_parent_index(index);
    }
}

// -----------------------------------------------------------------------------
// Flattening
// -----------------------------------------------------------------------------

/// Flatten the (filtered) descendants of `node` in display order.
///
/// `visible` stops descending at collapsed nodes; `all` does not.
pub(crate) fn collect_descendants(node: &Record) -> Descendants {
    let mut descendants = Descendants::default();
    collect_into(node, false, &mut descendants);
    descendants
}

fn collect_into(node: &Record, in_collapsed_branch: bool, out: &mut Descendants) {
    for child in node.children() {
        if !in_collapsed_branch {
            out.visible.push(child.clone());
        }
        out.all.push(child.clone());
        collect_into(&child, in_collapsed_branch || !child.is_expanded(), out);
    }
}

/// Every node below `node` regardless of filtering or expansion.
pub(crate) fn collect_all_nodes(node: &Record) -> Vec<Record> {
    let mut nodes = Vec::new();
    let mut stack: Vec<Record> = node.ordered_children().into_iter().rev().collect();
    while let Some(current) = stack.pop() {
        stack.extend(current.ordered_children().into_iter().rev());
        nodes.push(current);
    }
    nodes
}

/// Refresh `parent_index` and `unfiltered_index` of the children of `parent`.
pub(crate) fn update_child_indices(parent: &Record) {
    for (index, child) in parent.children().iter().enumerate() {
        child.set_parent_index(index);
    }
    let unfiltered = parent.unfiltered_children().unwrap_or_else(|| parent.ordered_children());
    for (index, child) in unfiltered.iter().enumerate() {
        child.set_unfiltered_index(index);
    }
}

/// Sort every child list below `node` with `sorters`.
pub(crate) fn sort_tree(node: &Record, sorters: &[Sorter]) {
    if sorters.is_empty() {
        return;
    }
    let sort = |mut list: Vec<Record>| {
        list.sort_by(|a, b| compare_all(sorters, a, b));
        list
    };
    let ordered = sort(node.ordered_children());
    if ordered.is_empty() {
        return;
    }
    node.set_children(sort(node.children()));
    node.set_unfiltered_children(node.unfiltered_children().map(sort));
    for child in &ordered {
        sort_tree(child, sorters);
    }
    node.set_ordered_children(ordered);
    update_child_indices(node);
}

// -----------------------------------------------------------------------------
// Debug output
// -----------------------------------------------------------------------------

/// Renders a record hierarchy for debugging.
///
/// ```ignore
/// let debug = RecordTreeDebug::with_options(TreeFormatOptions::minimal());
/// println!("{}", debug.format_subtree(store.root().unwrap()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordTreeDebug {
    options: TreeFormatOptions,
}

impl RecordTreeDebug {
    /// A printer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// A printer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format `node` and its visible descendants.
    pub fn format_subtree(&self, node: &Record) -> String {
        let mut output = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_subtree(&mut output, node, 0, true);
        output
    }

    fn write_subtree(
        &self,
        out: &mut String,
        node: &Record,
        depth: usize,
        is_last: bool,
    ) -> fmt::Result {
        if self.options.exceeds_depth(depth) {
            return Ok(());
        }
        out.push_str(&self.options.prefix(depth, is_last));
        match node.get("name").as_str() {
            Some(name) if !name.is_empty() => out.push_str(name),
            _ if node.is_root() => out.push_str("(root)"),
            _ => out.push_str("(unnamed)"),
        }
        if self.options.show_ids {
            write!(out, " [{}]", node.id())?;
        }
        if self.options.show_kinds {
            let kind = if node.is_root() {
                "root"
            } else if node.is_leaf() {
                "leaf"
            } else {
                "parent"
            };
            write!(out, " ({kind})")?;
        }
        if self.options.show_state && !node.is_leaf() {
            let total = node
                .unfiltered_children()
                .map_or_else(|| node.ordered_children().len(), |c| c.len());
            write!(
                out,
                " {{visible: {}/{}, expanded: {}}}",
                node.children().len(),
                total,
                node.is_expanded()
            )?;
        }
        out.push('\n');

        let children = node.children();
        let count = children.len();
        for (index, child) in children.iter().enumerate() {
            self.write_subtree(out, child, depth + 1, index + 1 == count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use horizon_grid_core::TreeStyle;

    use super::*;

    fn node(id: i64, name: &str) -> Record {
        Record::new(id, [("name", name)])
    }

    fn attach(parent: &Record, child: &Record) {
        child.set_parent(Some(parent));
        parent.insert_child(child, None);
    }

    /// root -> a(1) -> b(2) -> c(3); root -> d(4)
    fn sample() -> (Record, Vec<Record>) {
        let root = Record::new_tree_root(RecordId::from("root"));
        let a = node(1, "a");
        let b = node(2, "b");
        let c = node(3, "c");
        let d = node(4, "d");
        attach(&root, &a);
        attach(&a, &b);
        attach(&b, &c);
        attach(&root, &d);
        (root, vec![a, b, c, d])
    }

    fn names(records: &[Record]) -> Vec<String> {
        records.iter().map(|r| r.get("name").to_string()).collect()
    }

    #[test]
    fn test_filter_keeps_ancestors_of_matches() {
        let (root, nodes) = sample();
        let filter: FiltersFn = Arc::new(|r: &Record| r.get("name").as_str() == Some("c"));
        filter_tree(&root, &filter, true, &HashSet::new(), &[]);

        assert_eq!(names(&collect_descendants(&root).visible), vec!["a", "b", "c"]);
        assert_eq!(nodes[0].unfiltered_children().map(|c| c.len()), Some(1));
        assert_eq!(root.unfiltered_children().map(|c| c.len()), Some(2));
        assert_eq!(nodes[3].unfiltered_index(), 1);
    }

    #[test]
    fn test_unfiltered_snapshot_is_kept_across_passes() {
        let (root, _) = sample();
        let only_d: FiltersFn = Arc::new(|r: &Record| r.get("name").as_str() == Some("d"));
        let only_a: FiltersFn = Arc::new(|r: &Record| r.get("name").as_str() == Some("a"));
        filter_tree(&root, &only_d, true, &HashSet::new(), &[]);
        filter_tree(&root, &only_a, true, &HashSet::new(), &[]);
        assert_eq!(names(&root.children()), vec!["a"]);
        assert_eq!(root.unfiltered_children().map(|c| c.len()), Some(2));
    }

    #[test]
    fn test_shallow_filter_with_forced_ids() {
        let (root, _) = sample();
        let none: FiltersFn = Arc::new(|_: &Record| false);
        let forced: HashSet<RecordId> = [RecordId::Int(4)].into_iter().collect();
        assert!(traverse_filter(&root, &none, false, Some(&forced), &[]));
        assert_eq!(names(&root.children()), vec!["d"]);
    }

    #[test]
    fn test_clear_filter_restores_order() {
        let (root, _) = sample();
        let none: FiltersFn = Arc::new(|_: &Record| false);
        filter_tree(&root, &none, true, &HashSet::new(), &[]);
        assert!(collect_descendants(&root).visible.is_empty());

        traverse_clear_filter(&root, &[]);
        assert!(root.unfiltered_children().is_none());
        assert_eq!(names(&collect_descendants(&root).visible), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_collapsed_nodes_hide_descendants() {
        let (root, nodes) = sample();
        nodes[1].set_expanded_flag(false);
        let descendants = collect_descendants(&root);
        assert_eq!(names(&descendants.visible), vec!["a", "b", "d"]);
        assert_eq!(names(&descendants.all), vec!["a", "b", "c", "d"]);
        assert_eq!(names(&collect_all_nodes(&root)), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_sort_tree() {
        let (root, _) = sample();
        sort_tree(&root, &[Sorter::new("name").descending()]);
        assert_eq!(names(&root.children()), vec!["d", "a"]);
        assert_eq!(names(&root.ordered_children()), vec!["d", "a"]);
        assert_eq!(root.children()[1].parent_index(), 1);
    }

    #[test]
    fn test_debug_output() {
        let (root, _) = sample();
        let debug = RecordTreeDebug::with_options(TreeFormatOptions {
            style: TreeStyle::Ascii,
            show_kinds: false,
            ..TreeFormatOptions::default()
        });
        let output = debug.format_subtree(&root);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "(root) [root]");
        assert_eq!(lines[1], "+-- a [1]");
        assert_eq!(lines.last().copied(), Some("`-- d [4]"));

        let shallow = RecordTreeDebug::with_options(TreeFormatOptions {
            max_depth: Some(1),
            ..TreeFormatOptions::minimal()
        });
        assert_eq!(shallow.format_subtree(&root).lines().count(), 3);
    }
}
