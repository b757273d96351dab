//! The selection state machine.

use horizon_datagrid_core::logging::targets;
use horizon_datagrid_core::{DragThreshold, Point, Signal};

use super::range::{CellCoordinate, CellRange};
use super::set::SelectionSet;
use super::{SelectionMode, SelectionOutcome, SelectionUnit};
use crate::input::KeyboardModifiers;
use crate::slots::SlotSpace;

/// What a slot resolves to for selection purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Row(usize),
    Header,
}

/// A pending or captured selection drag.
#[derive(Debug, Clone, Copy)]
struct SelectionDrag {
    threshold: DragThreshold,
    captured: bool,
    additive: bool,
}

/// Current cell, anchor and selection, driven by pointer and keyboard input.
///
/// Every operation takes the [`SlotSpace`] it addresses. Slots that are out
/// of range or hidden by a collapsed group are ignored and the operation
/// reports [`SelectionOutcome::Unchanged`].
///
/// # Extended selection
///
/// The engine keeps a *base* selection next to the live one. A Ctrl action
/// (toggle) captures the result as the base; a plain click clears it. A Shift
/// extension replaces the selection with `range(anchor, target)`, and a
/// Ctrl+Shift extension with `base ∪ range(anchor, target)`. Because every
/// extension is recomputed from the anchor, reversing a drag shrinks the
/// selection back toward the anchor.
///
/// # Example
///
/// ```
/// use horizon_datagrid::input::KeyboardModifiers;
/// use horizon_datagrid::selection::{SelectionEngine, SelectionMode, SelectionUnit};
/// use horizon_datagrid::slots::SlotSpace;
///
/// let space = SlotSpace::new(10);
/// let mut engine = SelectionEngine::new(SelectionMode::Extended, SelectionUnit::FullRow);
///
/// engine.select(&space, None, 2, KeyboardModifiers::NONE);
/// engine.select(&space, None, 5, KeyboardModifiers::SHIFT);
/// assert_eq!(engine.selected_rows(), vec![2, 3, 4, 5]);
///
/// engine.select(&space, None, 3, KeyboardModifiers::CTRL);
/// assert_eq!(engine.selected_rows(), vec![2, 4, 5]);
/// ```
#[derive(Debug)]
pub struct SelectionEngine {
    mode: SelectionMode,
    unit: SelectionUnit,
    column_count: usize,
    current: Option<CellCoordinate>,
    anchor: Option<CellCoordinate>,
    /// Anchor for column-header extension.
    column_anchor: Option<usize>,
    set: SelectionSet,
    base: SelectionSet,
    drag: Option<SelectionDrag>,
    drag_threshold: f32,

    /// Emitted after the selection changes.
    pub selection_changed: Signal<()>,

    /// Emitted when the current cell moves. Args: (new, old)
    pub current_changed: Signal<(Option<CellCoordinate>, Option<CellCoordinate>)>,

    /// Emitted when a selection drag takes (`true`) or releases (`false`)
    /// pointer capture.
    pub capture_changed: Signal<bool>,
}

impl Default for SelectionEngine {
    fn default() -> Self {
        Self::new(SelectionMode::default(), SelectionUnit::default())
    }
}

impl SelectionEngine {
    /// Create an engine with nothing selected.
    pub fn new(mode: SelectionMode, unit: SelectionUnit) -> Self {
        Self {
            mode,
            unit,
            column_count: 0,
            current: None,
            anchor: None,
            column_anchor: None,
            set: SelectionSet::new(),
            base: SelectionSet::new(),
            drag: None,
            drag_threshold: DragThreshold::DEFAULT,
            selection_changed: Signal::new(),
            current_changed: Signal::new(),
            capture_changed: Signal::new(),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// The selection mode.
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Change the selection mode. Switching to single mode drops a
    /// multi-item selection.
    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.mode = mode;
        if mode == SelectionMode::Single && self.set.row_count() + self.set.ranges().len() > 1 {
            self.clear_selection();
        }
    }

    /// The selection unit.
    pub fn unit(&self) -> SelectionUnit {
        self.unit
    }

    /// Change the selection unit. Clears the selection.
    pub fn set_unit(&mut self, unit: SelectionUnit) {
        if self.unit != unit {
            self.unit = unit;
            self.clear_selection();
        }
    }

    /// Number of columns cells are addressed in.
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Set the column count, dropping cells past it.
    pub fn set_column_count(&mut self, column_count: usize) {
        self.column_count = column_count;
        let clamp = |coordinate: CellCoordinate| CellCoordinate {
            column: coordinate
                .column
                .and_then(|c| if c < column_count { Some(c) } else { column_count.checked_sub(1) }),
            ..coordinate
        };
        self.anchor = self.anchor.map(clamp);
        let current = self.current.map(clamp);
        self.move_current(current);
        self.column_anchor = self.column_anchor.filter(|&c| c < column_count);

        let before = self.set.clone();
        self.set.truncate_columns(column_count);
        self.base.truncate_columns(column_count);
        if self.set != before {
            self.selection_changed.emit(());
        }
    }

    /// Distance the pointer must move before a drag captures it.
    pub fn drag_threshold(&self) -> f32 {
        self.drag_threshold
    }

    /// Set the drag threshold in logical pixels.
    pub fn set_drag_threshold(&mut self, threshold: f32) {
        self.drag_threshold = threshold.max(0.0);
    }

    // =========================================================================
    // State
    // =========================================================================

    /// The current cell.
    pub fn current(&self) -> Option<CellCoordinate> {
        self.current
    }

    /// The anchor of range extensions.
    pub fn anchor(&self) -> Option<CellCoordinate> {
        self.anchor
    }

    /// Place the anchor directly.
    pub fn set_anchor(&mut self, anchor: Option<CellCoordinate>) {
        self.anchor = anchor;
    }

    /// The live selection.
    pub fn selection(&self) -> &SelectionSet {
        &self.set
    }

    /// Returns true if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Selected rows, ascending.
    ///
    /// In cell units, every row with at least one selected cell.
    pub fn selected_rows(&self) -> Vec<usize> {
        match self.unit {
            SelectionUnit::FullRow => self.set.rows().to_vec(),
            _ => self.set.rows_with_cells(),
        }
    }

    /// Selected cells as `(row, column)`, sorted row-major.
    ///
    /// A selected full row contributes one cell per column.
    pub fn selected_cells(&self) -> Vec<(usize, usize)> {
        match self.unit {
            SelectionUnit::FullRow => self
                .set
                .rows()
                .iter()
                .flat_map(|&row| (0..self.column_count).map(move |column| (row, column)))
                .collect(),
            _ => self.set.cells(),
        }
    }

    /// Returns true if `row` is selected (in cell units: fully covered).
    pub fn is_row_selected(&self, row: usize) -> bool {
        match self.unit {
            SelectionUnit::FullRow => self.set.contains_row(row),
            _ => self
                .full_row(row)
                .is_some_and(|range| self.set.contains_range(&range)),
        }
    }

    /// Returns true if the cell is selected.
    pub fn is_cell_selected(&self, row: usize, column: usize) -> bool {
        match self.unit {
            SelectionUnit::FullRow => self.set.contains_row(row),
            _ => self.set.contains_cell(row, column),
        }
    }

    // =========================================================================
    // Pointer and keyboard selection
    // =========================================================================

    /// Move the current cell without touching the selection.
    ///
    /// In full-row units the anchor follows and the selection becomes the
    /// base of later Ctrl+Shift extensions. In cell units the anchor is only
    /// placed when there is none.
    pub fn set_current(&mut self, space: &SlotSpace, column: Option<usize>, slot: usize) -> SelectionOutcome {
        if self.resolve(space, column, slot).is_none() {
            return self.ignored(slot);
        }
        let coordinate = CellCoordinate { column, slot };
        match self.unit {
            SelectionUnit::FullRow => {
                self.anchor = Some(coordinate);
                self.base = self.set.clone();
            }
            _ => {
                if self.anchor.is_none() {
                    self.anchor = Some(coordinate);
                }
            }
        }
        if self.move_current(Some(coordinate)) {
            SelectionOutcome::Changed
        } else {
            SelectionOutcome::Unchanged
        }
    }

    /// Replace the selection with exactly the target; the anchor moves there.
    ///
    /// Clicking a group header clears the selection and focuses the header.
    pub fn select_single(&mut self, space: &SlotSpace, column: Option<usize>, slot: usize) -> SelectionOutcome {
        let Some(target) = self.resolve(space, column, slot) else {
            return self.ignored(slot);
        };
        let coordinate = CellCoordinate { column, slot };
        let mut set = SelectionSet::new();
        if let Target::Row(row) = target {
            self.add_target(&mut set, row, column);
        }
        self.anchor = Some(coordinate);
        self.column_anchor = column;
        self.base = SelectionSet::new();
        self.apply(set, Some(coordinate))
    }

    /// Select the range between the anchor and the target.
    ///
    /// With `additive` the range is added to the base selection instead of
    /// replacing it. Single mode falls back to [`select_single`](Self::select_single).
    pub fn extend_from_anchor(
        &mut self,
        space: &SlotSpace,
        column: Option<usize>,
        slot: usize,
        additive: bool,
    ) -> SelectionOutcome {
        if self.mode == SelectionMode::Single {
            return self.select_single(space, column, slot);
        }
        let Some(target) = self.resolve(space, column, slot) else {
            return self.ignored(slot);
        };
        let Some(anchor) = self.anchor else {
            tracing::debug!(target: targets::SELECTION, slot, "extend rejected: no anchor");
            return SelectionOutcome::Rejected;
        };
        if anchor.slot >= space.slot_count() {
            tracing::debug!(target: targets::SELECTION, anchor = %anchor, "extend rejected: stale anchor");
            return SelectionOutcome::Rejected;
        }

        let rows = match self.unit {
            SelectionUnit::FullRow => nearest_row(space, anchor.slot).zip(nearest_row(space, slot)),
            _ => match (space.row_index_from_slot(anchor.slot), target) {
                (Some(anchor_row), Target::Row(target_row)) => Some((anchor_row, target_row)),
                _ => None,
            },
        };
        let Some((anchor_row, target_row)) = rows else {
            tracing::trace!(target: targets::SELECTION, slot, "extend suppressed at group header");
            return SelectionOutcome::Unchanged;
        };

        let mut set = if additive {
            self.base.clone()
        } else {
            SelectionSet::new()
        };
        match self.unit {
            SelectionUnit::FullRow => {
                for row in rows_between(anchor_row, target_row) {
                    set.add_row(row);
                }
            }
            _ => {
                let columns = match (anchor.column, column) {
                    (Some(from), Some(to)) => Some((from, to)),
                    _ => self.column_count.checked_sub(1).map(|last| (0, last)),
                };
                if let Some((from, to)) = columns {
                    set.add_range(CellRange::new(anchor_row, target_row, from, to));
                }
            }
        }
        self.apply(set, Some(CellCoordinate { column, slot }))
    }

    /// Add the target if it is not selected, remove it if it is.
    ///
    /// The anchor moves to the target and the result becomes the base of
    /// later Ctrl+Shift extensions. In single mode adding replaces.
    pub fn toggle_at(&mut self, space: &SlotSpace, column: Option<usize>, slot: usize) -> SelectionOutcome {
        let Some(target) = self.resolve(space, column, slot) else {
            return self.ignored(slot);
        };
        let Target::Row(row) = target else {
            return SelectionOutcome::Unchanged;
        };
        let coordinate = CellCoordinate { column, slot };
        let selected = self.is_target_selected(row, column);
        let mut set = match self.mode {
            SelectionMode::Single => SelectionSet::new(),
            SelectionMode::Extended => self.set.clone(),
        };
        match (selected, self.mode) {
            (true, SelectionMode::Extended) => self.remove_target(&mut set, row, column),
            (true, SelectionMode::Single) => {}
            (false, _) => self.add_target(&mut set, row, column),
        }
        self.anchor = Some(coordinate);
        self.column_anchor = column;
        let outcome = self.apply(set, Some(coordinate));
        self.base = self.set.clone();
        outcome
    }

    /// Dispatch a pointer press by modifier state.
    ///
    /// | modifiers  | operation                         |
    /// |------------|-----------------------------------|
    /// | none       | [`select_single`](Self::select_single) |
    /// | Shift      | extend, replacing                 |
    /// | Ctrl       | [`toggle_at`](Self::toggle_at)    |
    /// | Ctrl+Shift | extend, adding to the base        |
    pub fn select(
        &mut self,
        space: &SlotSpace,
        column: Option<usize>,
        slot: usize,
        modifiers: KeyboardModifiers,
    ) -> SelectionOutcome {
        match (modifiers.control, modifiers.shift) {
            (false, false) => self.select_single(space, column, slot),
            (false, true) => self.extend_from_anchor(space, column, slot, false),
            (true, false) => self.toggle_at(space, column, slot),
            (true, true) => self.extend_from_anchor(space, column, slot, true),
        }
    }

    /// Dispatch a keyboard move by modifier state.
    ///
    /// Like [`select`](Self::select), except Ctrl alone moves the current
    /// cell without selecting.
    pub fn navigate(
        &mut self,
        space: &SlotSpace,
        column: Option<usize>,
        slot: usize,
        modifiers: KeyboardModifiers,
    ) -> SelectionOutcome {
        if modifiers.control && !modifiers.shift {
            return self.set_current(space, column, slot);
        }
        self.select(space, column, slot, modifiers)
    }

    /// Select every row (full-row units) or every cell.
    pub fn select_all(&mut self, space: &SlotSpace) -> SelectionOutcome {
        if self.mode == SelectionMode::Single {
            return SelectionOutcome::Rejected;
        }
        let mut set = SelectionSet::new();
        let Some(last_row) = space.row_count().checked_sub(1) else {
            return SelectionOutcome::Unchanged;
        };
        match self.unit {
            SelectionUnit::FullRow => {
                for row in 0..=last_row {
                    set.add_row(row);
                }
            }
            _ => {
                if let Some(last_column) = self.column_count.checked_sub(1) {
                    set.add_range(CellRange::new(0, last_row, 0, last_column));
                }
            }
        }
        self.base = set.clone();
        let current = self.current;
        self.apply(set, current)
    }

    /// Deselect everything. The current cell and anchor stay.
    pub fn clear_selection(&mut self) -> SelectionOutcome {
        self.base.clear();
        if self.set.is_empty() {
            return SelectionOutcome::Unchanged;
        }
        self.set.clear();
        self.selection_changed.emit(());
        SelectionOutcome::Changed
    }

    /// Replace the selection with whole rows, keeping current and anchor.
    ///
    /// Used to re-apply a selection by item identity after the rows moved.
    pub fn set_selected_rows<I>(&mut self, rows: I) -> SelectionOutcome
    where
        I: IntoIterator<Item = usize>,
    {
        let mut set = SelectionSet::new();
        for row in rows {
            if self.mode == SelectionMode::Single && !set.is_empty() {
                break;
            }
            match self.unit {
                SelectionUnit::FullRow => {
                    set.add_row(row);
                }
                _ => {
                    if let Some(range) = self.full_row(row) {
                        set.add_range(range);
                    }
                }
            }
        }
        self.base = SelectionSet::new();
        let current = self.current;
        self.apply(set, current)
    }

    // =========================================================================
    // Headers
    // =========================================================================

    /// Select a row through its row header.
    ///
    /// In full-row units this is a plain row click. In cell units the row's
    /// cells are selected and the header is recorded; Ctrl toggles the row
    /// and keeps cells that belong to a selected column header.
    pub fn select_row_header(
        &mut self,
        space: &SlotSpace,
        slot: usize,
        modifiers: KeyboardModifiers,
    ) -> SelectionOutcome {
        if self.unit == SelectionUnit::CellOrColumnHeader {
            tracing::debug!(target: targets::SELECTION, slot, "row header selection rejected by unit");
            return SelectionOutcome::Rejected;
        }
        if self.unit == SelectionUnit::FullRow {
            return self.select(space, None, slot, modifiers);
        }
        let Some(Target::Row(row)) = self.resolve(space, None, slot) else {
            return self.ignored(slot);
        };
        let Some(span) = self.full_row(row) else {
            return SelectionOutcome::Unchanged;
        };
        let coordinate = CellCoordinate::row(slot);
        let extended = self.mode == SelectionMode::Extended;

        if modifiers.shift && extended {
            let Some(anchor) = self.anchor else {
                return SelectionOutcome::Rejected;
            };
            let Some(anchor_row) = nearest_row(space, anchor.slot) else {
                return SelectionOutcome::Unchanged;
            };
            let mut set = if modifiers.control {
                self.base.clone()
            } else {
                SelectionSet::new()
            };
            for r in rows_between(anchor_row, row) {
                if let Some(range) = self.full_row(r) {
                    set.add_range(range);
                    set.set_row_header(r, true);
                }
            }
            return self.apply(set, Some(coordinate));
        }

        let mut set = if modifiers.control && extended {
            self.set.clone()
        } else {
            SelectionSet::new()
        };
        if modifiers.control && extended && set.is_row_header_selected(row) {
            set.set_row_header(row, false);
            set.remove_range(span);
            let columns: Vec<usize> = set.header_columns().collect();
            for column in columns {
                set.add_range(CellRange::cell(row, column));
            }
        } else {
            set.set_row_header(row, true);
            set.add_range(span);
        }
        self.anchor = Some(coordinate);
        let outcome = self.apply(set, Some(coordinate));
        self.base = if modifiers.control {
            self.set.clone()
        } else {
            SelectionSet::new()
        };
        outcome
    }

    /// Select a column through its column header.
    ///
    /// Only cell units that allow column headers accept this, and only in
    /// extended mode. Ctrl toggles the column and keeps cells that belong to
    /// a selected row header.
    pub fn select_column_header(
        &mut self,
        space: &SlotSpace,
        column: usize,
        modifiers: KeyboardModifiers,
    ) -> SelectionOutcome {
        let allowed = matches!(self.unit, SelectionUnit::Cell | SelectionUnit::CellOrColumnHeader);
        if !allowed || self.mode == SelectionMode::Single {
            tracing::debug!(target: targets::SELECTION, column, "column header selection rejected");
            return SelectionOutcome::Rejected;
        }
        if column >= self.column_count {
            return SelectionOutcome::Unchanged;
        }
        let Some(last_row) = space.row_count().checked_sub(1) else {
            return SelectionOutcome::Unchanged;
        };
        let span = |c: usize| CellRange::new(0, last_row, c, c);
        let slot = self
            .current
            .map(|c| c.slot)
            .or_else(|| space.first_visible_slot())
            .unwrap_or(0);
        let coordinate = CellCoordinate::new(column, slot);

        if modifiers.shift {
            let Some(from) = self.column_anchor.or_else(|| self.anchor.and_then(|a| a.column)) else {
                return SelectionOutcome::Rejected;
            };
            let mut set = if modifiers.control {
                self.base.clone()
            } else {
                SelectionSet::new()
            };
            for c in from.min(column)..=from.max(column) {
                set.add_range(span(c));
                set.set_column_header(c, true);
            }
            return self.apply(set, Some(coordinate));
        }

        let mut set = if modifiers.control {
            self.set.clone()
        } else {
            SelectionSet::new()
        };
        if modifiers.control && set.is_column_header_selected(column) {
            set.set_column_header(column, false);
            set.remove_range(span(column));
            let rows: Vec<usize> = set.header_rows().collect();
            for row in rows {
                set.add_range(CellRange::cell(row, column));
            }
        } else {
            set.set_column_header(column, true);
            set.add_range(span(column));
        }
        self.column_anchor = Some(column);
        self.anchor = Some(coordinate);
        let outcome = self.apply(set, Some(coordinate));
        self.base = if modifiers.control {
            self.set.clone()
        } else {
            SelectionSet::new()
        };
        outcome
    }

    // =========================================================================
    // Drag
    // =========================================================================

    /// Press: select by modifiers and arm a pending drag.
    ///
    /// The pointer is not captured until it moves past the drag threshold,
    /// so a plain click never starts a range.
    pub fn begin_drag(
        &mut self,
        space: &SlotSpace,
        column: Option<usize>,
        slot: usize,
        modifiers: KeyboardModifiers,
        position: Point,
    ) -> SelectionOutcome {
        self.abort_drag();
        let outcome = self.select(space, column, slot, modifiers);
        let on_row = matches!(self.resolve(space, column, slot), Some(Target::Row(_)));
        if outcome != SelectionOutcome::Rejected && on_row {
            self.drag = Some(SelectionDrag {
                threshold: DragThreshold::new(position, self.drag_threshold),
                captured: false,
                additive: modifiers.control,
            });
        }
        outcome
    }

    /// Move: once past the threshold, capture and extend to the target.
    pub fn drag_to(
        &mut self,
        space: &SlotSpace,
        column: Option<usize>,
        slot: usize,
        position: Point,
    ) -> SelectionOutcome {
        let Some(drag) = self.drag.as_mut() else {
            return SelectionOutcome::Rejected;
        };
        if !drag.captured {
            if !drag.threshold.is_exceeded(position) {
                return SelectionOutcome::Unchanged;
            }
            drag.captured = true;
            tracing::trace!(target: targets::SELECTION, slot, "selection drag captured pointer");
            self.capture_changed.emit(true);
        }
        let additive = drag.additive;
        self.extend_from_anchor(space, column, slot, additive)
    }

    /// Release: end the drag and release capture. Returns true if a drag
    /// was active.
    pub fn end_drag(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        if drag.captured {
            self.capture_changed.emit(false);
        }
        true
    }

    /// Abandon the drag (pointer lost, gesture cancelled). The selection
    /// made so far stays.
    pub fn abort_drag(&mut self) -> bool {
        self.end_drag()
    }

    /// Returns true while a drag is pending or captured.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Returns true while a drag holds pointer capture.
    pub fn has_capture(&self) -> bool {
        self.drag.is_some_and(|drag| drag.captured)
    }

    // =========================================================================
    // Structural changes
    // =========================================================================

    /// Adjust for `count` data rows inserted before `row`.
    pub fn rows_inserted(&mut self, row: usize, count: usize) {
        self.set.rows_inserted(row, count);
        self.base.rows_inserted(row, count);
    }

    /// Adjust for data rows `row..row + count` removed.
    pub fn rows_removed(&mut self, row: usize, count: usize) {
        let before = self.set.clone();
        self.set.rows_removed(row, count);
        self.base.rows_removed(row, count);
        if self.set != before {
            self.selection_changed.emit(());
        }
    }

    /// Move the current cell and anchor through a slot mapping; slots that
    /// map to `None` are dropped.
    pub fn remap_slots<F>(&mut self, mut map: F)
    where
        F: FnMut(usize) -> Option<usize>,
    {
        let mut remap = |coordinate: CellCoordinate| {
            map(coordinate.slot).map(|slot| CellCoordinate { slot, ..coordinate })
        };
        self.anchor = self.anchor.and_then(&mut remap);
        let current = self.current.and_then(&mut remap);
        self.move_current(current);
    }

    /// Forget everything: selection, current cell, anchor and drag.
    pub fn reset(&mut self) {
        self.abort_drag();
        self.anchor = None;
        self.column_anchor = None;
        self.move_current(None);
        self.clear_selection();
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn resolve(&self, space: &SlotSpace, column: Option<usize>, slot: usize) -> Option<Target> {
        if !space.is_slot_visible(slot) {
            return None;
        }
        if let Some(column) = column
            && column >= self.column_count
        {
            return None;
        }
        if space.is_group_header(slot) {
            return Some(Target::Header);
        }
        space.row_index_from_slot(slot).map(Target::Row)
    }

    fn ignored(&self, slot: usize) -> SelectionOutcome {
        tracing::trace!(target: targets::SELECTION, slot, "slot hidden or out of range");
        SelectionOutcome::Unchanged
    }

    fn full_row(&self, row: usize) -> Option<CellRange> {
        self.column_count
            .checked_sub(1)
            .map(|last| CellRange::new(row, row, 0, last))
    }

    fn cell_span(&self, row: usize, column: Option<usize>) -> Option<CellRange> {
        match column {
            Some(column) => Some(CellRange::cell(row, column)),
            None => self.full_row(row),
        }
    }

    fn is_target_selected(&self, row: usize, column: Option<usize>) -> bool {
        match self.unit {
            SelectionUnit::FullRow => self.set.contains_row(row),
            _ => self
                .cell_span(row, column)
                .is_some_and(|range| self.set.contains_range(&range)),
        }
    }

    fn add_target(&self, set: &mut SelectionSet, row: usize, column: Option<usize>) {
        match self.unit {
            SelectionUnit::FullRow => {
                set.add_row(row);
            }
            _ => {
                if let Some(range) = self.cell_span(row, column) {
                    set.add_range(range);
                }
            }
        }
    }

    fn remove_target(&self, set: &mut SelectionSet, row: usize, column: Option<usize>) {
        match self.unit {
            SelectionUnit::FullRow => {
                set.remove_row(row);
            }
            _ => {
                if let Some(range) = self.cell_span(row, column) {
                    set.remove_range(range);
                    set.set_row_header(row, false);
                    if let Some(column) = column {
                        set.set_column_header(column, false);
                    }
                }
            }
        }
    }

    /// Install `set` and move the current cell, emitting what changed.
    fn apply(&mut self, set: SelectionSet, current: Option<CellCoordinate>) -> SelectionOutcome {
        let selection_changed = set != self.set;
        if selection_changed {
            self.set = set;
        }
        let current_changed = self.move_current(current);
        if selection_changed {
            tracing::debug!(
                target: targets::SELECTION,
                rows = self.set.row_count(),
                cells = self.set.cell_count(),
                "selection changed"
            );
            self.selection_changed.emit(());
        }
        if selection_changed || current_changed {
            SelectionOutcome::Changed
        } else {
            SelectionOutcome::Unchanged
        }
    }

    fn move_current(&mut self, current: Option<CellCoordinate>) -> bool {
        if self.current == current {
            return false;
        }
        let old = std::mem::replace(&mut self.current, current);
        self.current_changed.emit((current, old));
        true
    }
}

/// Rows from `from` to `to` inclusive, walking away from `from`.
fn rows_between(from: usize, to: usize) -> Box<dyn Iterator<Item = usize>> {
    if from <= to {
        Box::new(from..=to)
    } else {
        Box::new((to..=from).rev())
    }
}

/// The data row at `slot`, or for a header the first row after it (the
/// last row before it when none follows).
fn nearest_row(space: &SlotSpace, slot: usize) -> Option<usize> {
    space
        .row_index_from_slot(slot)
        .or_else(|| (slot + 1..space.slot_count()).find_map(|s| space.row_index_from_slot(s)))
        .or_else(|| (0..slot).rev().find_map(|s| space.row_index_from_slot(s)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::model::CellValue;
    use crate::slots::RowGroupInfo;

    fn rows_engine(mode: SelectionMode) -> (SlotSpace, SelectionEngine) {
        let mut engine = SelectionEngine::new(mode, SelectionUnit::FullRow);
        engine.set_column_count(3);
        (SlotSpace::new(10), engine)
    }

    fn cell_engine(unit: SelectionUnit) -> (SlotSpace, SelectionEngine) {
        let mut engine = SelectionEngine::new(SelectionMode::Extended, unit);
        engine.set_column_count(4);
        (SlotSpace::new(6), engine)
    }

    #[test]
    fn test_select_single_moves_anchor() {
        let (space, mut engine) = rows_engine(SelectionMode::Extended);
        assert_eq!(engine.select_single(&space, None, 4), SelectionOutcome::Changed);
        assert_eq!(engine.selected_rows(), vec![4]);
        assert_eq!(engine.anchor(), Some(CellCoordinate::row(4)));
        assert_eq!(engine.current(), Some(CellCoordinate::row(4)));
        assert_eq!(engine.select_single(&space, None, 4), SelectionOutcome::Unchanged);
    }

    #[test]
    fn test_out_of_range_is_unchanged() {
        let (space, mut engine) = rows_engine(SelectionMode::Extended);
        engine.select_single(&space, None, 1);
        assert_eq!(engine.select_single(&space, None, 99), SelectionOutcome::Unchanged);
        assert_eq!(engine.toggle_at(&space, Some(9), 2), SelectionOutcome::Unchanged);
        assert_eq!(engine.selected_rows(), vec![1]);
    }

    #[test]
    fn test_collapsed_slot_is_unchanged() {
        let mut space = SlotSpace::new(4);
        space.insert_group_header(RowGroupInfo::new(CellValue::from("g"), 0, 0, 2));
        space.collapse_group(0);
        let mut engine = SelectionEngine::new(SelectionMode::Extended, SelectionUnit::FullRow);
        assert_eq!(engine.select_single(&space, None, 1), SelectionOutcome::Unchanged);
        assert!(engine.is_empty());
        assert_eq!(engine.current(), None);
    }

    #[test]
    fn test_extend_without_anchor_is_rejected() {
        let (space, mut engine) = rows_engine(SelectionMode::Extended);
        assert_eq!(
            engine.extend_from_anchor(&space, None, 3, false),
            SelectionOutcome::Rejected
        );
    }

    #[test]
    fn test_shift_extend_replaces_and_reverses() {
        let (space, mut engine) = rows_engine(SelectionMode::Extended);
        engine.select(&space, None, 5, KeyboardModifiers::NONE);
        engine.select(&space, None, 8, KeyboardModifiers::SHIFT);
        assert_eq!(engine.selected_rows(), vec![5, 6, 7, 8]);
        engine.select(&space, None, 3, KeyboardModifiers::SHIFT);
        assert_eq!(engine.selected_rows(), vec![3, 4, 5]);
        assert_eq!(engine.anchor(), Some(CellCoordinate::row(5)));
        assert_eq!(engine.current(), Some(CellCoordinate::row(3)));
    }

    #[test]
    fn test_ctrl_shift_adds_to_base() {
        let (space, mut engine) = rows_engine(SelectionMode::Extended);
        engine.select(&space, None, 0, KeyboardModifiers::NONE);
        engine.select(&space, None, 5, KeyboardModifiers::CTRL);
        engine.select(&space, None, 7, KeyboardModifiers::CTRL_SHIFT);
        assert_eq!(engine.selected_rows(), vec![0, 5, 6, 7]);
        // Reversing past the anchor keeps the base.
        engine.select(&space, None, 4, KeyboardModifiers::CTRL_SHIFT);
        assert_eq!(engine.selected_rows(), vec![0, 4, 5]);
    }

    #[test]
    fn test_cell_extend_is_rectangular() {
        let (space, mut engine) = cell_engine(SelectionUnit::Cell);
        engine.select(&space, Some(1), 1, KeyboardModifiers::NONE);
        engine.select(&space, Some(3), 2, KeyboardModifiers::SHIFT);
        assert_eq!(
            engine.selected_cells(),
            vec![(1, 1), (1, 2), (1, 3), (2, 1), (2, 2), (2, 3)]
        );
    }

    #[test]
    fn test_cell_extend_from_group_header_anchor_is_suppressed() {
        let mut space = SlotSpace::new(4);
        space.insert_group_header(RowGroupInfo::new(CellValue::from("g"), 0, 0, 4));
        let mut engine = SelectionEngine::new(SelectionMode::Extended, SelectionUnit::Cell);
        engine.set_column_count(2);
        engine.select(&space, Some(0), 2, KeyboardModifiers::NONE);
        engine.set_anchor(Some(CellCoordinate::new(0, 0)));
        let before = engine.selected_cells();
        assert_eq!(
            engine.extend_from_anchor(&space, Some(1), 3, false),
            SelectionOutcome::Unchanged
        );
        assert_eq!(engine.selected_cells(), before);
    }

    #[test]
    fn test_full_row_extend_from_header_uses_adjacent_row() {
        let mut space = SlotSpace::new(4);
        space.insert_group_header(RowGroupInfo::new(CellValue::from("g"), 0, 0, 4));
        let mut engine = SelectionEngine::new(SelectionMode::Extended, SelectionUnit::FullRow);
        engine.select(&space, None, 0, KeyboardModifiers::NONE);
        assert!(engine.is_empty());
        engine.select(&space, None, 3, KeyboardModifiers::SHIFT);
        assert_eq!(engine.selected_rows(), vec![0, 1, 2]);
    }

    #[test]
    fn test_toggle_twice_restores() {
        let (space, mut engine) = cell_engine(SelectionUnit::Cell);
        engine.select(&space, Some(0), 0, KeyboardModifiers::NONE);
        engine.select(&space, Some(2), 2, KeyboardModifiers::SHIFT);
        let prior = engine.selection().clone();

        engine.toggle_at(&space, Some(1), 1);
        assert!(!engine.is_cell_selected(1, 1));
        engine.toggle_at(&space, Some(1), 1);
        assert_eq!(engine.selection(), &prior);

        engine.toggle_at(&space, Some(3), 4);
        engine.toggle_at(&space, Some(3), 4);
        assert_eq!(engine.selection(), &prior);
    }

    #[test]
    fn test_toggle_last_row_empties_selection() {
        let (space, mut engine) = rows_engine(SelectionMode::Extended);
        engine.select(&space, None, 2, KeyboardModifiers::NONE);
        assert_eq!(engine.toggle_at(&space, None, 2), SelectionOutcome::Changed);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_single_mode_cardinality() {
        let (space, mut engine) = rows_engine(SelectionMode::Single);
        let presses = [
            (1, KeyboardModifiers::NONE),
            (4, KeyboardModifiers::SHIFT),
            (6, KeyboardModifiers::CTRL),
            (8, KeyboardModifiers::CTRL_SHIFT),
            (8, KeyboardModifiers::CTRL),
            (2, KeyboardModifiers::CTRL_SHIFT),
        ];
        for (slot, modifiers) in presses {
            engine.select(&space, None, slot, modifiers);
            assert!(engine.selected_rows().len() <= 1);
        }
        assert_eq!(engine.selected_rows(), vec![2]);
        assert_eq!(engine.select_all(&space), SelectionOutcome::Rejected);
    }

    #[test]
    fn test_drag_defers_capture_and_shrinks() {
        let (space, mut engine) = rows_engine(SelectionMode::Extended);
        let captures = Arc::new(AtomicUsize::new(0));
        let captures_clone = captures.clone();
        engine.capture_changed.connect(move |taken| {
            if *taken {
                captures_clone.fetch_add(1, Ordering::SeqCst);
            }
        });

        engine.begin_drag(&space, None, 2, KeyboardModifiers::NONE, Point::new(5.0, 45.0));
        assert_eq!(
            engine.drag_to(&space, None, 2, Point::new(6.0, 46.0)),
            SelectionOutcome::Unchanged
        );
        assert!(!engine.has_capture());

        engine.drag_to(&space, None, 6, Point::new(5.0, 125.0));
        assert!(engine.has_capture());
        assert_eq!(engine.selected_rows(), vec![2, 3, 4, 5, 6]);

        engine.drag_to(&space, None, 4, Point::new(5.0, 85.0));
        assert_eq!(engine.selected_rows(), vec![2, 3, 4]);
        assert_eq!(engine.current(), Some(CellCoordinate::row(4)));

        assert!(engine.end_drag());
        assert!(!engine.is_dragging());
        assert_eq!(captures.load(Ordering::SeqCst), 1);
        assert_eq!(
            engine.drag_to(&space, None, 5, Point::new(5.0, 105.0)),
            SelectionOutcome::Rejected
        );
    }

    #[test]
    fn test_click_release_never_captures() {
        let (space, mut engine) = rows_engine(SelectionMode::Extended);
        let released = Arc::new(AtomicUsize::new(0));
        let released_clone = released.clone();
        engine.capture_changed.connect(move |_| {
            released_clone.fetch_add(1, Ordering::SeqCst);
        });
        engine.begin_drag(&space, None, 3, KeyboardModifiers::NONE, Point::new(0.0, 0.0));
        assert!(engine.end_drag());
        assert_eq!(released.load(Ordering::SeqCst), 0);
        assert_eq!(engine.selected_rows(), vec![3]);
    }

    #[test]
    fn test_row_header_selects_row_cells() {
        let (space, mut engine) = cell_engine(SelectionUnit::CellOrRowHeader);
        engine.select_row_header(&space, 2, KeyboardModifiers::NONE);
        assert!(engine.is_row_selected(2));
        assert_eq!(engine.selected_cells().len(), 4);
        engine.select_row_header(&space, 4, KeyboardModifiers::SHIFT);
        assert_eq!(engine.selected_rows(), vec![2, 3, 4]);
        assert_eq!(
            engine.select_column_header(&space, 0, KeyboardModifiers::NONE),
            SelectionOutcome::Rejected
        );
    }

    #[test]
    fn test_column_deselect_keeps_selected_row() {
        let (space, mut engine) = cell_engine(SelectionUnit::Cell);
        engine.select_column_header(&space, 1, KeyboardModifiers::NONE);
        engine.select_row_header(&space, 3, KeyboardModifiers::CTRL);
        assert!(engine.is_cell_selected(0, 1));
        assert!(engine.is_cell_selected(3, 0));

        engine.select_column_header(&space, 1, KeyboardModifiers::CTRL);
        assert!(!engine.is_cell_selected(0, 1));
        assert!(engine.is_cell_selected(3, 1), "cell owned by the selected row");
        assert!(engine.is_row_selected(3));

        engine.select_row_header(&space, 3, KeyboardModifiers::CTRL);
        assert!(engine.is_empty());
    }

    #[test]
    fn test_column_header_rejected_in_full_row_and_single() {
        let (space, mut engine) = rows_engine(SelectionMode::Extended);
        assert_eq!(
            engine.select_column_header(&space, 0, KeyboardModifiers::NONE),
            SelectionOutcome::Rejected
        );
        let (space, mut engine) = cell_engine(SelectionUnit::Cell);
        engine.set_mode(SelectionMode::Single);
        assert_eq!(
            engine.select_column_header(&space, 0, KeyboardModifiers::NONE),
            SelectionOutcome::Rejected
        );
    }

    #[test]
    fn test_column_header_shift_extends() {
        let (space, mut engine) = cell_engine(SelectionUnit::CellOrColumnHeader);
        engine.select_column_header(&space, 3, KeyboardModifiers::NONE);
        engine.select_column_header(&space, 1, KeyboardModifiers::SHIFT);
        assert_eq!(engine.selected_cells().len(), 3 * 6);
        assert!(engine.selection().is_column_header_selected(2));
        assert_eq!(
            engine.select_row_header(&space, 0, KeyboardModifiers::NONE),
            SelectionOutcome::Rejected
        );
    }

    #[test]
    fn test_set_current_anchor_rules() {
        let (space, mut engine) = rows_engine(SelectionMode::Extended);
        engine.select(&space, None, 1, KeyboardModifiers::NONE);
        engine.set_current(&space, None, 4);
        assert_eq!(engine.anchor(), Some(CellCoordinate::row(4)));

        let (space, mut engine) = cell_engine(SelectionUnit::Cell);
        engine.select(&space, Some(0), 1, KeyboardModifiers::NONE);
        engine.set_current(&space, Some(2), 3);
        assert_eq!(engine.anchor(), Some(CellCoordinate::new(0, 1)));
        assert_eq!(engine.current(), Some(CellCoordinate::new(2, 3)));
    }

    #[test]
    fn test_signals() {
        let (space, mut engine) = rows_engine(SelectionMode::Extended);
        let changes = Arc::new(AtomicUsize::new(0));
        let moves = Arc::new(AtomicUsize::new(0));
        let changes_clone = changes.clone();
        let moves_clone = moves.clone();
        engine.selection_changed.connect(move |_| {
            changes_clone.fetch_add(1, Ordering::SeqCst);
        });
        engine.current_changed.connect(move |_| {
            moves_clone.fetch_add(1, Ordering::SeqCst);
        });

        engine.select(&space, None, 1, KeyboardModifiers::NONE);
        engine.select(&space, None, 1, KeyboardModifiers::NONE);
        engine.navigate(&space, None, 2, KeyboardModifiers::CTRL);
        assert_eq!(changes.load(Ordering::SeqCst), 1);
        assert_eq!(moves.load(Ordering::SeqCst), 2);
        assert_eq!(engine.selected_rows(), vec![1]);
    }

    #[test]
    fn test_rows_removed_and_remap() {
        let (space, mut engine) = rows_engine(SelectionMode::Extended);
        engine.select(&space, None, 2, KeyboardModifiers::NONE);
        engine.select(&space, None, 6, KeyboardModifiers::CTRL);
        engine.rows_removed(3, 2);
        assert_eq!(engine.selected_rows(), vec![2, 4]);
        engine.remap_slots(|slot| slot.checked_sub(2));
        assert_eq!(engine.current(), Some(CellCoordinate::row(4)));
        engine.remap_slots(|_| None);
        assert_eq!(engine.current(), None);
        assert_eq!(engine.anchor(), None);
    }

    #[test]
    fn test_select_all_and_clear() {
        let (space, mut engine) = cell_engine(SelectionUnit::Cell);
        assert_eq!(engine.select_all(&space), SelectionOutcome::Changed);
        assert_eq!(engine.selected_cells().len(), 24);
        assert_eq!(engine.clear_selection(), SelectionOutcome::Changed);
        assert_eq!(engine.clear_selection(), SelectionOutcome::Unchanged);
    }
}
