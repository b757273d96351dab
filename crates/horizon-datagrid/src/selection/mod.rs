//! Current cell, anchor and selection state.
//!
//! The [`SelectionEngine`] turns pointer and keyboard input into changes of
//! a [`SelectionSet`]. Rows and cells are addressed by slot on the way in and
//! stored by row index, so collapsing a group never loses selection state.
//!
//! # Modifier protocol
//!
//! | input          | effect                                          |
//! |----------------|-------------------------------------------------|
//! | click          | select the target only, anchor moves there      |
//! | Shift+click    | select anchor..target                           |
//! | Ctrl+click     | toggle the target, anchor moves there           |
//! | Ctrl+Shift     | add anchor..target to the selection             |
//! | drag           | like Shift+click at every pointer position      |
//!
//! Single mode keeps at most one item selected; Shift and Ctrl+Shift degrade
//! to a plain click there.

mod engine;
mod range;
mod set;

pub use engine::SelectionEngine;
pub use range::{CellCoordinate, CellRange};
pub use set::SelectionSet;

use serde::{Deserialize, Serialize};

/// How many items can be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// At most one row or cell.
    Single,
    /// Ranges and toggles with Shift and Ctrl (default).
    #[default]
    Extended,
}

/// What a click selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionUnit {
    /// Whole rows (default).
    #[default]
    FullRow,
    /// Cells; both row and column headers select their cells.
    Cell,
    /// Cells; row headers select their row's cells.
    CellOrRowHeader,
    /// Cells; column headers select their column's cells.
    CellOrColumnHeader,
}

impl SelectionUnit {
    /// Returns true for the cell-addressed units.
    pub fn is_cell(self) -> bool {
        self != SelectionUnit::FullRow
    }
}

/// Result of a selection operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Selection or current cell changed.
    Changed,
    /// Handled, nothing changed (hidden or out-of-range target, header
    /// anchor on a cell range, repeated click).
    Unchanged,
    /// Not applicable (no anchor to extend from, header kind not allowed
    /// by the selection unit); input handling may fall through.
    Rejected,
}

impl SelectionOutcome {
    /// Returns true unless the operation was rejected.
    pub fn is_handled(self) -> bool {
        self != SelectionOutcome::Rejected
    }

    /// Returns true if state changed.
    pub fn is_changed(self) -> bool {
        self == SelectionOutcome::Changed
    }
}
