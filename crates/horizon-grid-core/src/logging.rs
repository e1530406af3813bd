//! Logging and debugging facilities for Horizon Grid.
//!
//! This module provides:
//! - Fixed `tracing` targets for every subsystem
//! - Formatting options shared by the hierarchy debug printers
//! - Performance tracing hooks for profiling filter and group passes
//!
//! # Tracing Integration
//!
//! Horizon Grid uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_grid::store=debug,horizon_grid::drag=trace")
//!     .init();
//! ```

/// Span names used throughout Horizon Grid for tracing.
pub mod span_names {
    /// A store filter pass.
    pub const FILTER_PASS: &str = "horizon_grid::filter_pass";
    /// A group materialization pass.
    pub const GROUP_PASS: &str = "horizon_grid::group_pass";
    /// A store sort.
    pub const SORT: &str = "horizon_grid::sort";
    /// Tree filter traversal.
    pub const TREE_FILTER: &str = "horizon_grid::tree_filter";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "horizon_grid_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_grid_core::signal";
    /// Ordered collection target.
    pub const COLLECTION: &str = "horizon_grid_core::collection";
    /// Store plumbing (CRUD, sorting, id map).
    pub const STORE: &str = "horizon_grid::store";
    /// Store filter engine.
    pub const FILTER: &str = "horizon_grid::store::filter";
    /// Store grouping engine.
    pub const GROUP: &str = "horizon_grid::store::group";
    /// Drag context state machine.
    pub const DRAG: &str = "horizon_grid::drag";
    /// Resize helper.
    pub const RESIZE: &str = "horizon_grid::resize";
    /// Input state bookkeeping.
    pub const INPUT: &str = "horizon_grid::input";
    /// Performance spans.
    pub const PERF: &str = "horizon_grid::perf";
}

/// Branch drawing for [`TreeFormatOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// `+--` and `` `-- ``.
    Ascii,
    /// Box-drawing characters.
    #[default]
    Unicode,
}

impl TreeStyle {
    /// (continuation, branch, last branch)
    fn glyphs(self) -> (&'static str, &'static str, &'static str) {
        match self {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => (
                "\u{2502}",
                "\u{251c}\u{2500}\u{2500}",
                "\u{2514}\u{2500}\u{2500}",
            ),
        }
    }
}

/// What the record hierarchy printer writes for each node.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    pub style: TreeStyle,
    /// Append `[id]`.
    pub show_ids: bool,
    /// Append `(root)`, `(parent)` or `(leaf)`.
    pub show_kinds: bool,
    /// Append visible/total child counts and the expanded flag of parents.
    pub show_state: bool,
    /// Deepest level printed; the root is level 0.
    pub max_depth: Option<usize>,
    /// Spaces after each continuation line.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_kinds: true,
            show_state: false,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Everything the printer knows.
    pub fn verbose() -> Self {
        Self {
            show_state: true,
            ..Self::default()
        }
    }

    /// Names only.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_kinds: false,
            ..Self::default()
        }
    }

    /// The line prefix for a node at `depth`.
    pub fn prefix(&self, depth: usize, is_last: bool) -> String {
        let Some(parents) = depth.checked_sub(1) else {
            return String::new();
        };
        let (continuation, branch, last) = self.style.glyphs();
        let indent = " ".repeat(self.indent_size);
        let mut prefix = format!("{continuation}{indent}").repeat(parents);
        prefix.push_str(if is_last { last } else { branch });
        prefix.push(' ');
        prefix
    }

    pub fn exceeds_depth(&self, depth: usize) -> bool {
        self.max_depth.is_some_and(|max| depth > max)
    }
}

/// Keeps a `perf` span on [`targets::PERF`] entered until dropped, so a
/// subscriber with span timing reports the duration of the pass.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}
