//! Logging facilities for Horizon DataGrid.
//!
//! The engine is instrumented with the `tracing` crate. Nothing is printed
//! unless the host installs a subscriber:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_datagrid::selection=debug")
//!     .init();
//! ```
//!
//! Each subsystem logs under its own target (see [`targets`]) so hosts can
//! filter selection noise separately from edit-session transitions.

/// Span names used for tracing bulk operations.
pub mod span_names {
    /// Grouping rebuild span.
    pub const GROUPING: &str = "horizon_datagrid::grouping";
    /// Fill-handle propagation span.
    pub const FILL: &str = "horizon_datagrid::fill";
    /// Drop execution span.
    pub const REORDER: &str = "horizon_datagrid::reorder";
}

/// Target names for log filtering.
pub mod targets {
    /// Signal emission target.
    pub const SIGNAL: &str = "horizon_datagrid_core::signal";
    /// Grid facade target.
    pub const GRID: &str = "horizon_datagrid";
    /// Slot space and collapsed ranges.
    pub const SLOTS: &str = "horizon_datagrid::slots";
    /// Hierarchical adapter.
    pub const HIERARCHY: &str = "horizon_datagrid::hierarchy";
    /// Selection engine.
    pub const SELECTION: &str = "horizon_datagrid::selection";
    /// Edit session.
    pub const EDIT: &str = "horizon_datagrid::edit";
    /// Fill handle.
    pub const FILL: &str = "horizon_datagrid::fill";
    /// Row drag reorder.
    pub const REORDER: &str = "horizon_datagrid::reorder";
    /// Key binding resolution.
    pub const INPUT: &str = "horizon_datagrid::input";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Used around bulk operations to measure their duration.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create and enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "horizon_datagrid::perf", "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}

/// Debug-level log under the grid facade target.
#[macro_export]
macro_rules! datagrid_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "horizon_datagrid", $($arg)*)
    };
}

/// Warn-level log under the grid facade target.
#[macro_export]
macro_rules! datagrid_warn {
    ($($arg:tt)*) => {
        tracing::warn!(target: "horizon_datagrid", $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perf_span() {
        let _span = PerfSpan::new("test_operation");
    }

    #[test]
    fn test_targets_share_prefix() {
        for target in [
            targets::SLOTS,
            targets::HIERARCHY,
            targets::SELECTION,
            targets::EDIT,
            targets::FILL,
            targets::REORDER,
            targets::INPUT,
        ] {
            assert!(target.starts_with(targets::GRID));
        }
    }
}
