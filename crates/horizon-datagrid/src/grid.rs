//! The grid facade.
//!
//! [`DataGrid`] owns the item source and every piece of engine state: the
//! slot space, the selection, the edit session, the reorder controller and
//! the key bindings. Hosts forward pointer and keyboard input to it and read
//! the resulting state back when they paint.
//!
//! Input routing follows one rule: anything that moves the selection while
//! an edit is open first closes the edit. When the editor widget holds
//! focus, that transition is queued and runs once the editor reports it
//! lost focus, in the order the input arrived.
//!
//! # Example
//!
//! ```
//! use horizon_datagrid::input::{Key, KeyboardModifiers};
//! use horizon_datagrid::model::{CellValue, Column, VecItemSource};
//! use horizon_datagrid::{DataGrid, Point};
//!
//! let source = VecItemSource::new(vec![1_i64, 2, 3]);
//! let columns = vec![Column::new("Value", |v: &i64| CellValue::Integer(*v))];
//! let mut grid = DataGrid::new(source, columns);
//!
//! grid.cell_pressed(Some(0), 0, KeyboardModifiers::NONE, Point::ZERO);
//! grid.pointer_released();
//! grid.key_down(Key::ArrowDown, KeyboardModifiers::SHIFT);
//! assert_eq!(grid.selection().selected_rows(), vec![0, 1]);
//! ```

use std::fmt;

use horizon_datagrid_core::logging::{span_names, targets};
use horizon_datagrid_core::{PerfSpan, Point, Signal, datagrid_debug, datagrid_warn};

use crate::edit::{CommitOutcome, EditContext, EditSession, EditUnit, PendingAction};
use crate::error::{GridError, Result};
use crate::fill::{compute_target_range, fill_values};
use crate::input::{GridAction, GridKeyBindings, Key, KeyboardModifiers};
use crate::model::{
    CellValue, CollectionChange, Column, EditableAccessor, HierarchicalAdapter, ItemId, ItemSource,
};
use crate::options::GridOptions;
use crate::reorder::{
    DropOutcome, DropTarget, ListReorderHandler, PressPart, ReorderHandler, RowHit,
    RowReorderController,
};
use crate::selection::{CellCoordinate, CellRange, SelectionEngine, SelectionOutcome};
use crate::slots::{GroupDescription, SlotSpace, build_groups};

/// Rows per page until the presenter reports its viewport.
const DEFAULT_VIEWPORT_ROWS: usize = 10;

/// What the pointer is over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridHit {
    /// Column under the pointer, `None` over the row header.
    pub column: Option<usize>,
    pub slot: usize,
    /// Vertical position inside the row, 0.0 at the top edge.
    pub fraction: f32,
}

impl GridHit {
    /// The middle of a cell.
    pub fn cell(column: usize, slot: usize) -> Self {
        Self {
            column: Some(column),
            slot,
            fraction: 0.5,
        }
    }

    /// A point in a row at `fraction` of its height.
    pub fn row(slot: usize, fraction: f32) -> Self {
        Self {
            column: None,
            slot,
            fraction,
        }
    }
}

/// What a pointer move did.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerFeedback {
    /// No gesture is active.
    None,
    /// A selection drag extended (or waited for the threshold).
    Selection(SelectionOutcome),
    /// A row drag is waiting for the threshold or hovering a drop target.
    Reorder(Option<DropTarget>),
    /// A fill drag now covers this range.
    Fill(CellRange),
}

/// What a pointer release finished.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerRelease {
    /// No gesture was active.
    None,
    /// A selection drag ended.
    Selection,
    /// A row drag dropped.
    Reorder(DropOutcome),
    /// A fill drag wrote this many cells.
    Fill(usize),
}

#[derive(Debug, Clone, Copy)]
struct FillGesture {
    source: CellRange,
    target: CellRange,
}

/// A virtualized, editable data grid over an [`ItemSource`].
pub struct DataGrid<S: ItemSource> {
    source: S,
    columns: Vec<Column<S::Item>>,
    editable: Option<EditableAccessor<S::Item>>,
    grouping: Vec<GroupDescription<S::Item>>,
    options: GridOptions,
    bindings: GridKeyBindings,
    space: SlotSpace,
    selection: SelectionEngine,
    edit: EditSession,
    reorder: RowReorderController,
    handler: Box<dyn ReorderHandler<S>>,
    fill: Option<FillGesture>,
    /// A plain press on an already selected row, applied on release if the
    /// press never became a row drag.
    press_on_selected: Option<CellCoordinate>,
    viewport_rows: usize,
    update_depth: usize,
    needs_sync: bool,

    /// Emitted after slots were added, removed, regrouped, collapsed or
    /// expanded.
    pub layout_changed: Signal<()>,

    /// Emitted after a fill wrote cell values, with the filled range.
    pub values_changed: Signal<CellRange>,
}

impl<S: ItemSource> DataGrid<S> {
    /// Create a grid with default options.
    pub fn new(source: S, columns: Vec<Column<S::Item>>) -> Self {
        Self::assemble(source, columns, GridOptions::default(), GridKeyBindings::default())
    }

    /// Create a grid configured by `options`.
    ///
    /// # Errors
    ///
    /// Returns an error if a key binding override does not parse.
    pub fn from_options(source: S, columns: Vec<Column<S::Item>>, options: GridOptions) -> Result<Self> {
        let bindings = options.key_bindings()?;
        Ok(Self::assemble(source, columns, options, bindings))
    }

    fn assemble(
        mut source: S,
        columns: Vec<Column<S::Item>>,
        options: GridOptions,
        bindings: GridKeyBindings,
    ) -> Self {
        // The slot space starts from the current count.
        source.take_changes();

        let mut selection = SelectionEngine::new(options.selection_mode, options.selection_unit);
        selection.set_column_count(columns.len());
        selection.set_drag_threshold(options.drag_threshold);

        let mut reorder = RowReorderController::new(options.reorder_handle);
        reorder.set_inside_band(options.inside_band);
        reorder.set_drag_threshold(options.drag_threshold);

        let space = SlotSpace::new(source.count());
        datagrid_debug!(
            rows = space.row_count(),
            columns = columns.len(),
            "grid created"
        );

        Self {
            source,
            columns,
            editable: None,
            grouping: Vec::new(),
            options,
            bindings,
            space,
            selection,
            edit: EditSession::new(),
            reorder,
            handler: Box::new(ListReorderHandler),
            fill: None,
            press_on_selected: None,
            viewport_rows: DEFAULT_VIEWPORT_ROWS,
            update_depth: 0,
            needs_sync: false,
            layout_changed: Signal::new(),
            values_changed: Signal::new(),
        }
    }

    /// Let items manage their own edit transactions.
    pub fn with_editable(mut self, accessor: EditableAccessor<S::Item>) -> Self {
        self.editable = Some(accessor);
        self
    }

    /// Replace the handler that performs row drops.
    pub fn set_reorder_handler<H>(&mut self, handler: H)
    where
        H: ReorderHandler<S> + 'static,
    {
        self.reorder.cancel();
        self.handler = Box::new(handler);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The item source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutate the item source, then bring the slot space in line with the
    /// changes it recorded.
    pub fn update_source<R>(&mut self, f: impl FnOnce(&mut S) -> R) -> R {
        let result = f(&mut self.source);
        self.sync_with_source();
        result
    }

    /// The columns, by index.
    pub fn columns(&self) -> &[Column<S::Item>] {
        &self.columns
    }

    /// The slot space the presenter reads.
    pub fn slots(&self) -> &SlotSpace {
        &self.space
    }

    /// The selection state.
    pub fn selection(&self) -> &SelectionEngine {
        &self.selection
    }

    /// Direct access to the selection engine, for hosts that drive it
    /// themselves (restoring a saved anchor, for example).
    pub fn selection_mut(&mut self) -> (&mut SelectionEngine, &SlotSpace) {
        (&mut self.selection, &self.space)
    }

    /// The edit session.
    pub fn edit_session(&self) -> &EditSession {
        &self.edit
    }

    /// The row drag controller.
    pub fn reorder(&self) -> &RowReorderController {
        &self.reorder
    }

    /// The options the grid was built with.
    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    /// The active key bindings.
    pub fn key_bindings(&self) -> &GridKeyBindings {
        &self.bindings
    }

    /// Replace the key bindings.
    pub fn set_key_bindings(&mut self, bindings: GridKeyBindings) {
        self.bindings = bindings;
    }

    /// The current cell.
    pub fn current(&self) -> Option<CellCoordinate> {
        self.selection.current()
    }

    /// The data row of the current cell.
    pub fn current_row(&self) -> Option<usize> {
        self.current()
            .and_then(|c| self.space.row_index_from_slot(c.slot))
    }

    /// Rows the viewport shows, used for Page Up / Page Down.
    pub fn viewport_rows(&self) -> usize {
        self.viewport_rows
    }

    /// Called by the presenter when its height changes.
    pub fn set_viewport_rows(&mut self, rows: usize) {
        self.viewport_rows = rows.max(1);
    }

    /// The slots shown for visible ordinals `first..first + count`.
    pub fn visible_slots(&self, first: usize, count: usize) -> Vec<usize> {
        self.space.visible_slots(first, count)
    }

    /// The value shown at `(row, column)`.
    pub fn cell_value(&self, row: usize, column: usize) -> Option<CellValue> {
        let item = self.source.item(row)?;
        self.columns.get(column).map(|c| c.value(item))
    }

    /// Returns true inside a `begin_update` / `end_update` batch.
    pub fn is_updating(&self) -> bool {
        self.update_depth > 0
    }

    // =========================================================================
    // Editing
    // =========================================================================

    fn edit_parts(&mut self) -> (&mut EditSession, &mut S, EditContext<'_, S::Item>) {
        let context = EditContext {
            columns: &self.columns,
            editable: self.editable,
            read_only: self.options.is_read_only,
        };
        (&mut self.edit, &mut self.source, context)
    }

    /// Open an editor on the current cell.
    ///
    /// With row selection and no current column, edits the first writable
    /// column. Returns false if the edit is refused.
    pub fn begin_edit(&mut self) -> bool {
        let current = self.selection.current();
        let row = current.and_then(|c| self.space.row_index_from_slot(c.slot));
        let column = match current.and_then(|c| c.column) {
            Some(column) => Some(column),
            None => self.columns.iter().position(|c| !c.is_read_only()),
        };
        let Some(column) = column else {
            tracing::debug!(target: targets::EDIT, "begin_edit refused: no writable column");
            return false;
        };
        let (edit, source, context) = self.edit_parts();
        edit.begin_edit(source, context, row, column)
    }

    /// Replace the open editor's value.
    pub fn set_edit_value(&mut self, value: impl Into<CellValue>) -> bool {
        self.edit.set_value(value)
    }

    /// Commit the open cell, and with [`EditUnit::Row`] the row.
    ///
    /// # Errors
    ///
    /// [`GridError::NoEditSession`] if nothing is being edited.
    pub fn commit_edit(&mut self, unit: EditUnit) -> Result<CommitOutcome> {
        let (edit, source, context) = self.edit_parts();
        edit.commit_edit(source, context, unit)
    }

    /// Restore the edited row and close the session.
    ///
    /// # Errors
    ///
    /// [`GridError::NoEditSession`] if nothing is being edited.
    pub fn cancel_edit(&mut self) -> Result<()> {
        let (edit, source, context) = self.edit_parts();
        edit.cancel_edit(source, context)
    }

    /// Record whether the editor widget holds keyboard focus.
    pub fn set_editor_focused(&mut self, focused: bool) {
        self.edit.set_editor_focused(focused);
    }

    /// The editor released focus: run every queued transition, oldest
    /// first. Returns how many ran.
    pub fn editor_lost_focus(&mut self) -> usize {
        let actions = self.edit.editor_lost_focus();
        let count = actions.len();
        for action in actions {
            let handled = self.run_pending(action);
            tracing::trace!(target: targets::EDIT, ?action, handled, "deferred transition ran");
        }
        count
    }

    /// Run `action` now, or queue it while the editor holds focus.
    fn request(&mut self, action: PendingAction) -> bool {
        match self.edit.schedule(action) {
            Some(action) => self.run_pending(action),
            None => true,
        }
    }

    fn run_pending(&mut self, action: PendingAction) -> bool {
        match action {
            PendingAction::Commit(unit) => {
                self.edit.is_editing()
                    && self.commit_edit(unit).is_ok_and(|outcome| outcome.is_success())
            }
            PendingAction::Cancel => self.edit.is_editing() && self.cancel_edit().is_ok(),
            PendingAction::Select {
                column,
                slot,
                modifiers,
            } => {
                self.close_edit_for(slot)
                    && self
                        .selection
                        .select(&self.space, column, slot, modifiers)
                        .is_handled()
            }
            PendingAction::SelectRowHeader { slot, modifiers } => {
                self.close_edit_for(slot)
                    && self
                        .selection
                        .select_row_header(&self.space, slot, modifiers)
                        .is_handled()
            }
            PendingAction::SelectColumnHeader { column, modifiers } => {
                self.close_edit(EditUnit::Row)
                    && self
                        .selection
                        .select_column_header(&self.space, column, modifiers)
                        .is_handled()
            }
            PendingAction::Key { action, modifiers } => self.perform(action, modifiers),
        }
    }

    /// Close whatever part of the edit a move to `slot` leaves behind: the
    /// cell on the same row, the whole row otherwise. Returns false if the
    /// commit was refused.
    fn close_edit_for(&mut self, slot: usize) -> bool {
        let Some(editing) = self.edit.editing_row() else {
            return true;
        };
        if self.space.row_index_from_slot(slot) == Some(editing) {
            if self.edit.editing_column().is_none() {
                return true;
            }
            self.close_edit(EditUnit::Cell)
        } else {
            self.close_edit(EditUnit::Row)
        }
    }

    fn close_edit(&mut self, unit: EditUnit) -> bool {
        if !self.edit.is_editing() {
            return true;
        }
        match self.commit_edit(unit) {
            Ok(outcome) => outcome.is_success(),
            Err(_) => true,
        }
    }

    // =========================================================================
    // Pointer input
    // =========================================================================

    /// Pointer pressed on a cell (`column == None` for a row without
    /// columns, such as a group header).
    pub fn cell_pressed(
        &mut self,
        column: Option<usize>,
        slot: usize,
        modifiers: KeyboardModifiers,
        position: Point,
    ) -> SelectionOutcome {
        self.cancel_gestures();
        if !self.close_edit_before_press(PendingAction::Select {
            column,
            slot,
            modifiers,
        }) {
            return SelectionOutcome::Unchanged;
        }
        if let Some(outcome) = self.press_for_reorder(PressPart::Cell, column, slot, modifiers, position) {
            return outcome;
        }
        self.selection
            .begin_drag(&self.space, column, slot, modifiers, position)
    }

    /// Pointer pressed on a row header.
    pub fn row_header_pressed(
        &mut self,
        slot: usize,
        modifiers: KeyboardModifiers,
        position: Point,
    ) -> SelectionOutcome {
        self.cancel_gestures();
        if !self.close_edit_before_press(PendingAction::SelectRowHeader { slot, modifiers }) {
            return SelectionOutcome::Unchanged;
        }
        if let Some(outcome) = self.press_for_reorder(PressPart::RowHeader, None, slot, modifiers, position) {
            return outcome;
        }
        self.selection.select_row_header(&self.space, slot, modifiers)
    }

    /// Pointer pressed on a column header.
    ///
    /// An open edit is committed first; while the editor holds focus the
    /// click waits with the commit and runs when focus is released.
    pub fn column_header_pressed(&mut self, column: usize, modifiers: KeyboardModifiers) -> SelectionOutcome {
        self.cancel_gestures();
        if !self.close_edit_before_press(PendingAction::SelectColumnHeader { column, modifiers }) {
            return SelectionOutcome::Unchanged;
        }
        self.selection
            .select_column_header(&self.space, column, modifiers)
    }

    /// Pointer pressed on a row's drag handle. Leaves the selection alone.
    pub fn drag_handle_pressed(&mut self, slot: usize, position: Point) -> bool {
        self.cancel_gestures();
        if !self.options.can_user_reorder_rows {
            return false;
        }
        let Some(row) = self.space.row_index_from_slot(slot) else {
            return false;
        };
        self.reorder
            .press(&self.source, PressPart::DragHandle, row, position)
    }

    /// Pointer pressed on the fill handle of the selection.
    ///
    /// Returns false when the grid is read-only, an edit is open, or the
    /// selection is not a single rectangle.
    pub fn fill_handle_pressed(&mut self) -> bool {
        self.cancel_gestures();
        if self.options.is_read_only || self.edit.is_editing() {
            return false;
        }
        let Some(range) = self.selection_range() else {
            tracing::debug!(target: targets::FILL, "fill refused: selection is not one rectangle");
            return false;
        };
        self.fill = Some(FillGesture {
            source: range,
            target: range,
        });
        true
    }

    /// Pointer moved to `hit` (or off the rows).
    pub fn pointer_moved(&mut self, hit: Option<GridHit>, position: Point) -> PointerFeedback {
        if let Some(fill) = self.fill.as_mut() {
            if let Some(hit) = hit
                && let Some(column) = hit.column
                && column < self.columns.len()
                && let Some(row) = self.space.row_index_from_slot(hit.slot)
                && self.source.item(row).is_some()
            {
                fill.target = compute_target_range(fill.source, row, column);
            }
            return PointerFeedback::Fill(fill.target);
        }

        if self.reorder.is_pending() {
            let rows = self.selection.selected_rows();
            if !self.reorder.pointer_moved(&self.source, &rows, position) {
                return PointerFeedback::Reorder(None);
            }
            self.press_on_selected = None;
        }
        if self.reorder.is_dragging() {
            let row_hit = hit.and_then(|hit| {
                self.space
                    .row_index_from_slot(hit.slot)
                    .map(|row| RowHit::new(row, hit.fraction))
            });
            return PointerFeedback::Reorder(self.reorder.drag_over(&self.source, row_hit));
        }

        if self.selection.is_dragging() {
            let Some(hit) = hit else {
                return PointerFeedback::Selection(SelectionOutcome::Unchanged);
            };
            return PointerFeedback::Selection(self.selection.drag_to(
                &self.space,
                hit.column,
                hit.slot,
                position,
            ));
        }
        PointerFeedback::None
    }

    /// Pointer released. Finishes whichever gesture is active and releases
    /// pointer capture.
    pub fn pointer_released(&mut self) -> PointerRelease {
        if let Some(fill) = self.fill.take() {
            return PointerRelease::Fill(self.fill_to(fill.source, fill.target));
        }

        if self.reorder.is_dragging() {
            let selected: Vec<ItemId> = self
                .selection
                .selected_rows()
                .into_iter()
                .filter_map(|row| self.source.item_id(row))
                .collect();
            let current = self.current().and_then(|c| {
                let row = self.space.row_index_from_slot(c.slot)?;
                self.source.item_id(row).map(|id| (id, c.column))
            });
            let outcome = self.reorder.drop(&mut self.source, self.handler.as_mut());
            if outcome.is_moved() {
                self.sync_with_source();
                self.restore_selection(&selected, current);
            }
            return PointerRelease::Reorder(outcome);
        }

        if self.reorder.is_pending() {
            self.reorder.cancel();
            if let Some(press) = self.press_on_selected.take() {
                self.selection
                    .select_single(&self.space, press.column, press.slot);
            }
            return PointerRelease::Selection;
        }

        if self.selection.end_drag() {
            return PointerRelease::Selection;
        }
        PointerRelease::None
    }

    /// Abandon every pointer gesture and release capture.
    pub fn cancel_gestures(&mut self) -> bool {
        let active = self.fill.is_some() || self.reorder.is_pending() || self.reorder.is_dragging();
        self.fill = None;
        self.press_on_selected = None;
        self.reorder.cancel();
        self.selection.abort_drag() || active
    }

    /// Close the edit ahead of a press, queueing `action` instead when the
    /// editor holds focus. Returns true if the press may go ahead now.
    fn close_edit_before_press(&mut self, action: PendingAction) -> bool {
        if !self.edit.is_editing() {
            return true;
        }
        let slot = match action {
            PendingAction::Select { slot, .. } | PendingAction::SelectRowHeader { slot, .. } => Some(slot),
            PendingAction::SelectColumnHeader { .. } => None,
            _ => return false,
        };
        match self.edit.schedule(action) {
            None => false,
            Some(_) => match slot {
                Some(slot) => self.close_edit_for(slot),
                None => self.close_edit(EditUnit::Row),
            },
        }
    }

    /// Select for a press on a reorder affordance and arm the row drag.
    /// Returns `None` when the press is not a reorder press.
    fn press_for_reorder(
        &mut self,
        part: PressPart,
        column: Option<usize>,
        slot: usize,
        modifiers: KeyboardModifiers,
        position: Point,
    ) -> Option<SelectionOutcome> {
        if !self.options.can_user_reorder_rows {
            return None;
        }
        let accepted = self.reorder.handle().accepts(part);
        let row = self.space.row_index_from_slot(slot)?;
        if !accepted || self.source.item_id(row).is_none() || !self.space.is_slot_visible(slot) {
            return None;
        }

        // Keep a multi-row selection so it can be dragged as a whole.
        let outcome = if modifiers.none() && self.selection.is_row_selected(row) {
            self.press_on_selected = Some(CellCoordinate { column, slot });
            self.selection.set_current(&self.space, column, slot)
        } else if part == PressPart::RowHeader {
            self.selection.select_row_header(&self.space, slot, modifiers)
        } else {
            self.selection.select(&self.space, column, slot, modifiers)
        };
        self.reorder.press(&self.source, part, row, position);
        Some(outcome)
    }

    /// Put the selection back on the same items after rows moved.
    fn restore_selection(&mut self, selected: &[ItemId], current: Option<(ItemId, Option<usize>)>) {
        if let Some((id, column)) = current
            && let Some(row) = self.source.index_of(id)
            && let Some(slot) = self.space.slot_from_row_index(row)
        {
            self.selection.set_current(&self.space, column, slot);
        }
        let mut rows: Vec<usize> = selected
            .iter()
            .filter_map(|&id| self.source.index_of(id))
            .collect();
        rows.sort_unstable();
        self.selection.set_selected_rows(rows);
    }

    /// The selection as one rectangle of cells, if it is one.
    fn selection_range(&self) -> Option<CellRange> {
        let last_column = self.columns.len().checked_sub(1)?;
        if self.selection.unit().is_cell() {
            match self.selection.selection().ranges() {
                [range] => Some(*range),
                _ => None,
            }
        } else {
            let rows = self.selection.selected_rows();
            let (&first, &last) = (rows.first()?, rows.last()?);
            (last - first + 1 == rows.len()).then(|| CellRange::new(first, last, 0, last_column))
        }
    }

    // =========================================================================
    // Keyboard input
    // =========================================================================

    /// A key was pressed while the grid has focus. Returns true if it was
    /// handled.
    pub fn key_down(&mut self, key: Key, modifiers: KeyboardModifiers) -> bool {
        let Some(action) = self.bindings.resolve(key, modifiers) else {
            return false;
        };
        // Shift or Ctrl pressed beyond the binding's own modifiers carry into
        // the selection.
        let carried = match self.bindings.gesture(action) {
            Some(gesture) => KeyboardModifiers {
                shift: modifiers.shift && !gesture.modifiers.shift,
                control: modifiers.control && !gesture.modifiers.control,
                ..KeyboardModifiers::NONE
            },
            None => KeyboardModifiers::NONE,
        };
        tracing::trace!(target: targets::INPUT, ?key, ?action, "key resolved");

        let editing = self.edit.is_editing();
        match action {
            GridAction::BeginEdit if !editing => self.begin_edit(),
            GridAction::CancelEdit if !editing => self.cancel_gestures(),
            _ if editing => self.request(PendingAction::Key {
                action,
                modifiers: carried,
            }),
            _ => self.perform(action, carried),
        }
    }

    /// Run a resolved action.
    fn perform(&mut self, action: GridAction, modifiers: KeyboardModifiers) -> bool {
        match action {
            GridAction::BeginEdit => self.begin_edit(),
            GridAction::CommitEdit => {
                self.close_edit(EditUnit::Row)
                    && self.navigate_to(GridAction::MoveDown, KeyboardModifiers::NONE)
            }
            GridAction::CancelEdit => self.edit.is_editing() && self.cancel_edit().is_ok(),
            GridAction::SelectAll => {
                self.close_edit(EditUnit::Row) && self.selection.select_all(&self.space).is_handled()
            }
            GridAction::ToggleSelection => {
                let Some(current) = self.selection.current() else {
                    return false;
                };
                self.close_edit_for(current.slot)
                    && self
                        .selection
                        .toggle_at(&self.space, current.column, current.slot)
                        .is_handled()
            }
            GridAction::ExpandCurrent => self.expand_current(),
            GridAction::MoveLeft | GridAction::MoveRight => {
                match self.tree_step(action == GridAction::MoveRight) {
                    Some(handled) => handled,
                    None => self.navigate_to(action, modifiers),
                }
            }
            _ => self.navigate_to(action, modifiers),
        }
    }

    fn navigate_to(&mut self, action: GridAction, modifiers: KeyboardModifiers) -> bool {
        let Some(target) = self.navigation_target(action) else {
            return false;
        };
        if !self.close_edit_for(target.slot) {
            return false;
        }
        self.selection
            .navigate(&self.space, target.column, target.slot, modifiers)
            .is_handled()
    }

    /// Where a navigation action moves the current cell.
    fn navigation_target(&self, action: GridAction) -> Option<CellCoordinate> {
        let column_count = self.columns.len();
        let Some(current) = self.selection.current() else {
            let column = (self.selection.unit().is_cell() && column_count > 0).then_some(0);
            return self
                .space
                .first_visible_slot()
                .map(|slot| CellCoordinate { column, slot });
        };
        let at_slot = |slot: usize| CellCoordinate { slot, ..current };
        let at_column = |column: usize| CellCoordinate::new(column, current.slot);
        let page = self.viewport_rows.max(1) as isize;

        match action {
            GridAction::MoveUp => self.space.previous_visible_slot(current.slot).map(at_slot),
            GridAction::MoveDown => self.space.next_visible_slot(current.slot).map(at_slot),
            GridAction::MoveLeft => current
                .column
                .and_then(|c| c.checked_sub(1))
                .map(at_column),
            GridAction::MoveRight => current
                .column
                .map(|c| c + 1)
                .filter(|&c| c < column_count)
                .map(at_column),
            GridAction::MoveFirstRow => self.space.first_visible_slot().map(at_slot),
            GridAction::MoveLastRow => self.space.last_visible_slot().map(at_slot),
            GridAction::MoveRowStart => current.column.and((column_count > 0).then_some(0)).map(at_column),
            GridAction::MoveRowEnd => current.column.and(column_count.checked_sub(1)).map(at_column),
            GridAction::PageUp => self.space.step_visible(current.slot, -page).map(at_slot),
            GridAction::PageDown => self.space.step_visible(current.slot, page).map(at_slot),
            GridAction::NextCell => match current.column {
                Some(c) if c + 1 < column_count => Some(at_column(c + 1)),
                Some(_) => self
                    .space
                    .next_visible_slot(current.slot)
                    .map(|slot| CellCoordinate::new(0, slot)),
                None => self.space.next_visible_slot(current.slot).map(at_slot),
            },
            GridAction::PreviousCell => match current.column {
                Some(c) if c > 0 => Some(at_column(c - 1)),
                Some(_) => self
                    .space
                    .previous_visible_slot(current.slot)
                    .map(|slot| CellCoordinate::new(column_count.saturating_sub(1), slot)),
                None => self.space.previous_visible_slot(current.slot).map(at_slot),
            },
            _ => None,
        }
    }

    /// Left/Right on a group header or tree row. `None` means the key is a
    /// plain column move.
    fn tree_step(&mut self, expand: bool) -> Option<bool> {
        let current = self.selection.current()?;
        let slot = current.slot;

        if self.options.treat_groups_as_nodes
            && let Some(group) = self.space.group_info(slot)
        {
            let is_expanded = group.is_expanded;
            let contains_next = |space: &SlotSpace| {
                space
                    .next_visible_slot(slot)
                    .filter(|&next| space.group_info(slot).is_some_and(|g| g.contains(next)))
            };
            return Some(match (expand, is_expanded) {
                (true, false) => self.expand_group(slot),
                (true, true) => contains_next(&self.space).is_some_and(|child| self.move_current_to(child)),
                (false, true) => self.collapse_group(slot),
                (false, false) => self
                    .space
                    .enclosing_group(slot)
                    .map(|g| g.slot)
                    .is_some_and(|parent| self.move_current_to(parent)),
            });
        }

        // Data rows only follow the tree protocol with row selection; in
        // cell units Left/Right move between columns.
        if self.selection.unit().is_cell() {
            return None;
        }
        let row = self.space.row_index_from_slot(slot)?;
        if let Some(tree) = self.source.as_tree_mut() {
            enum Step {
                Changed(bool),
                Move(usize),
            }
            let step = match (expand, tree.is_expanded(row)) {
                (true, false) if tree.is_expandable(row) => Step::Changed(tree.expand(row)),
                (true, _) => match tree.first_child_index(row) {
                    Some(child) => Step::Move(child),
                    None => Step::Changed(false),
                },
                (false, true) => Step::Changed(tree.collapse(row)),
                (false, false) => match tree.parent_index(row) {
                    Some(parent) => Step::Move(parent),
                    None => Step::Changed(false),
                },
            };
            return Some(match step {
                Step::Changed(changed) => {
                    if changed {
                        self.sync_with_source();
                    }
                    changed
                }
                Step::Move(row) => self
                    .space
                    .slot_from_row_index(row)
                    .is_some_and(|slot| self.move_current_to(slot)),
            });
        }

        if !expand
            && self.options.treat_groups_as_nodes
            && let Some(header) = self.space.enclosing_group(slot).map(|g| g.slot)
        {
            return Some(self.move_current_to(header));
        }
        None
    }

    fn move_current_to(&mut self, slot: usize) -> bool {
        let column = self.selection.current().and_then(|c| c.column);
        let column = if self.space.is_group_header(slot) { None } else { column };
        self.close_edit_for(slot)
            && self
                .selection
                .navigate(&self.space, column, slot, KeyboardModifiers::NONE)
                .is_handled()
    }

    /// Expand the current group header or tree node if it is collapsed.
    fn expand_current(&mut self) -> bool {
        let Some(current) = self.selection.current() else {
            return false;
        };
        if self.options.treat_groups_as_nodes
            && let Some(is_expanded) = self.space.group_info(current.slot).map(|g| g.is_expanded)
        {
            return !is_expanded && self.expand_group(current.slot);
        }
        let Some(row) = self.space.row_index_from_slot(current.slot) else {
            return false;
        };
        let Some(tree) = self.source.as_tree_mut() else {
            return false;
        };
        if !tree.is_expandable(row) || tree.is_expanded(row) {
            return false;
        }
        let expanded = tree.expand(row);
        if expanded {
            self.sync_with_source();
        }
        expanded
    }

    // =========================================================================
    // Fill
    // =========================================================================

    /// Fill `target` from `source` and select the result. Writes go through
    /// the column accessors and validators; read-only columns and the
    /// placeholder row are skipped. Both ranges are clamped to the grid.
    /// Returns the number of cells written.
    pub fn fill_to(&mut self, source: CellRange, target: CellRange) -> usize {
        let (Some(source), Some(target)) = (self.clamp_range(source), self.clamp_range(target)) else {
            return 0;
        };
        if self.options.is_read_only || source == target {
            return 0;
        }
        self.begin_update();

        let cells = {
            let items = &self.source;
            let columns = &self.columns;
            fill_values(source, target, |row, column| {
                items
                    .item(row)
                    .zip(columns.get(column))
                    .map(|(item, c)| c.value(item))
                    .unwrap_or_default()
            })
        };

        let mut written = 0;
        for cell in cells {
            if self.source.is_placeholder(cell.row) {
                continue;
            }
            let Some(column) = self.columns.get(cell.column) else {
                continue;
            };
            if column.is_read_only() {
                continue;
            }
            let value = match column.validate(cell.column, cell.value) {
                Ok(value) => value,
                Err(errors) => {
                    tracing::trace!(target: targets::FILL, row = cell.row, column = cell.column, errors = errors.len(), "fill value refused");
                    continue;
                }
            };
            if let Some(item) = self.source.item_mut(cell.row)
                && column.set_value(item, value)
            {
                written += 1;
            }
        }

        tracing::debug!(target: targets::FILL, %target, written, "fill applied");
        if written > 0 {
            self.values_changed.emit(target);
        }
        self.select_range(target);
        self.finish_update();
        written
    }

    fn clamp_range(&self, range: CellRange) -> Option<CellRange> {
        let last_row = self.source.count().checked_sub(1)?;
        let last_column = self.columns.len().checked_sub(1)?;
        Some(CellRange::new(
            range.start_row.min(last_row),
            range.end_row.min(last_row),
            range.start_column.min(last_column),
            range.end_column.min(last_column),
        ))
    }

    fn select_range(&mut self, range: CellRange) {
        let (Some(start), Some(end)) = (
            self.space.slot_from_row_index(range.start_row),
            self.space.slot_from_row_index(range.end_row),
        ) else {
            return;
        };
        if self.selection.unit().is_cell() {
            self.selection
                .select_single(&self.space, Some(range.start_column), start);
            self.selection
                .extend_from_anchor(&self.space, Some(range.end_column), end, false);
        } else {
            self.selection.select_single(&self.space, None, start);
            self.selection.extend_from_anchor(&self.space, None, end, false);
        }
    }

    // =========================================================================
    // Source synchronization
    // =========================================================================

    /// Start a batch: source changes are not applied until the matching
    /// [`end_update`](Self::end_update).
    pub fn begin_update(&mut self) {
        self.update_depth += 1;
    }

    /// End a batch and apply deferred source changes.
    ///
    /// # Errors
    ///
    /// [`GridError::UnbalancedUpdate`] without a matching `begin_update`.
    pub fn end_update(&mut self) -> Result<()> {
        if self.update_depth == 0 {
            datagrid_warn!("end_update without begin_update");
            return Err(GridError::UnbalancedUpdate);
        }
        self.finish_update();
        Ok(())
    }

    fn finish_update(&mut self) {
        self.update_depth = self.update_depth.saturating_sub(1);
        if self.update_depth == 0 && self.needs_sync {
            self.sync_with_source();
        }
    }

    /// Apply the changes the item source recorded since the last sync.
    ///
    /// Selection follows moved rows, the current cell and anchor follow
    /// their rows, and an edit on a removed item is discarded. A reset
    /// clears the selection.
    pub fn sync_with_source(&mut self) {
        if self.update_depth > 0 {
            self.needs_sync = true;
            return;
        }
        self.needs_sync = false;

        let changes = self.source.take_changes();
        let count = self.source.count();
        if changes.is_empty() && count == self.space.row_count() {
            return;
        }
        let reset = changes.iter().any(|c| matches!(c, CollectionChange::Reset))
            || (changes.is_empty() && count != self.space.row_count());
        let before = self.space.clone();

        if reset {
            self.cancel_gestures();
            self.selection.reset();
        } else {
            for change in &changes {
                match *change {
                    CollectionChange::Inserted { index, count } => self.selection.rows_inserted(index, count),
                    CollectionChange::Removed { index, count } => self.selection.rows_removed(index, count),
                    CollectionChange::Reset => {}
                }
            }
        }

        if !reset && self.grouping.is_empty() {
            for change in &changes {
                match *change {
                    CollectionChange::Inserted { index, count } => {
                        self.space.insert_rows(index, count);
                    }
                    CollectionChange::Removed { index, count } => {
                        self.space.remove_slots(index, count);
                    }
                    CollectionChange::Reset => {}
                }
            }
            if self.space.row_count() != count {
                datagrid_warn!(
                    expected = count,
                    actual = self.space.row_count(),
                    "change log out of step with source; rebuilding slots"
                );
                self.space.reset(count);
            }
        } else {
            self.regroup();
        }

        if !reset {
            self.remap_selection_slots(&before, |row| map_row(row, &changes));
        }
        self.edit.relocate(&self.source);

        datagrid_debug!(
            changes = changes.len(),
            rows = count,
            slots = self.space.slot_count(),
            "synced with source"
        );
        self.layout_changed.emit(());
    }

    // =========================================================================
    // Grouping
    // =========================================================================

    /// The grouping levels, outermost first.
    pub fn grouping(&self) -> &[GroupDescription<S::Item>] {
        &self.grouping
    }

    /// Group rows by `levels`, outermost first. An empty list ungroups.
    pub fn apply_grouping(&mut self, levels: Vec<GroupDescription<S::Item>>) {
        let before = self.space.clone();
        self.grouping = levels;
        self.regroup();
        self.remap_selection_slots(&before, Some);
        self.layout_changed.emit(());
    }

    /// Expand the group whose header is at `slot`.
    pub fn expand_group(&mut self, slot: usize) -> bool {
        if !self.space.expand_group(slot) {
            return false;
        }
        self.layout_changed.emit(());
        true
    }

    /// Collapse the group whose header is at `slot`.
    ///
    /// An edit on a row about to be hidden is committed first; the collapse
    /// is refused if that commit fails. A current cell inside the group
    /// moves to the header.
    pub fn collapse_group(&mut self, slot: usize) -> bool {
        let Some(group) = self.space.group_info(slot) else {
            return false;
        };
        if !group.is_expanded {
            return false;
        }
        let hidden = group.slot + 1..=group.last_sub_item_slot;

        let editing_hidden = self
            .edit
            .editing_row()
            .and_then(|row| self.space.slot_from_row_index(row))
            .is_some_and(|s| hidden.contains(&s));
        if editing_hidden && !self.close_edit(EditUnit::Row) {
            return false;
        }

        self.space.collapse_group(slot);
        if self
            .selection
            .current()
            .is_some_and(|c| hidden.contains(&c.slot))
        {
            self.selection.set_current(&self.space, None, slot);
        }
        self.layout_changed.emit(());
        true
    }

    /// Move the current cell and anchor from `before` to the current slot
    /// space. Data rows follow `map_row`; group headers follow their key path.
    fn remap_selection_slots<F>(&mut self, before: &SlotSpace, map_row: F)
    where
        F: Fn(usize) -> Option<usize>,
    {
        let old_headers = key_paths(before);
        let new_headers = key_paths(&self.space);
        let space = &self.space;
        self.selection.remap_slots(|slot| match before.row_index_from_slot(slot) {
            Some(row) => map_row(row).and_then(|row| space.slot_from_row_index(row)),
            None => old_headers
                .iter()
                .find(|(header, _)| *header == slot)
                .and_then(|(_, path)| new_headers.iter().find(|(_, p)| same_path(p, path)))
                .map(|(header, _)| *header),
        });
    }

    /// Rebuild the slot space from the source and the grouping levels,
    /// keeping collapsed groups collapsed.
    fn regroup(&mut self) {
        let _span = PerfSpan::new(span_names::GROUPING);
        let collapsed: Vec<Vec<CellValue>> = key_paths(&self.space)
            .into_iter()
            .filter(|(slot, _)| self.space.group_info(*slot).is_some_and(|g| !g.is_expanded))
            .map(|(_, path)| path)
            .collect();

        let count = self.source.count();
        self.space.reset(count);
        if self.grouping.is_empty() {
            return;
        }

        let items = &self.source;
        let levels = &self.grouping;
        let groups = build_groups(count, levels.len(), |row| {
            items
                .item(row)
                .map(|item| levels.iter().map(|level| level.key(item)).collect())
        });
        self.space.set_groups(groups);

        for (slot, path) in key_paths(&self.space) {
            if collapsed.iter().any(|c| same_path(c, &path)) {
                self.space.collapse_group(slot);
            }
        }
        datagrid_debug!(
            groups = self.space.groups().len(),
            collapsed = collapsed.len(),
            "rows regrouped"
        );
    }
}

impl<T> DataGrid<HierarchicalAdapter<T>> {
    /// Create a grid over a tree, applying the options' child
    /// virtualization to the adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if a key binding override does not parse.
    pub fn from_tree(
        mut adapter: HierarchicalAdapter<T>,
        columns: Vec<Column<T>>,
        options: GridOptions,
    ) -> Result<Self> {
        adapter.set_virtualize_children(options.virtualize_children);
        Self::from_options(adapter, columns, options)
    }
}

impl<S> fmt::Debug for DataGrid<S>
where
    S: ItemSource + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataGrid")
            .field("source", &self.source)
            .field("columns", &self.columns.len())
            .field("grouping", &self.grouping)
            .field("options", &self.options)
            .field("space", &self.space)
            .field("selection", &self.selection)
            .field("edit", &self.edit)
            .field("reorder", &self.reorder)
            .field("update_depth", &self.update_depth)
            .finish_non_exhaustive()
    }
}

/// Follow a row index through a change log. `None` if the row was removed.
fn map_row(row: usize, changes: &[CollectionChange]) -> Option<usize> {
    changes.iter().try_fold(row, |row, change| match *change {
        CollectionChange::Inserted { index, count } if row >= index => Some(row + count),
        CollectionChange::Inserted { .. } => Some(row),
        CollectionChange::Removed { index, .. } if row < index => Some(row),
        CollectionChange::Removed { index, count } if row < index + count => None,
        CollectionChange::Removed { count, .. } => Some(row - count),
        CollectionChange::Reset => None,
    })
}

/// Every group header with the keys of its enclosing groups, itself last.
fn key_paths(space: &SlotSpace) -> Vec<(usize, Vec<CellValue>)> {
    let mut path: Vec<CellValue> = Vec::new();
    space
        .groups()
        .iter()
        .map(|group| {
            path.truncate(group.level);
            path.push(group.key.clone());
            (group.slot, path.clone())
        })
        .collect()
}

fn same_path(a: &[CellValue], b: &[CellValue]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_bits(y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VecItemSource;

    fn grid(values: &[i64]) -> DataGrid<VecItemSource<i64>> {
        let columns = vec![
            Column::new("Value", |v: &i64| CellValue::Integer(*v)).with_setter(|v: &mut i64, value| {
                match value.as_i64() {
                    Some(n) => {
                        *v = n;
                        true
                    }
                    None => false,
                }
            }),
        ];
        DataGrid::new(VecItemSource::new(values.to_vec()), columns)
    }

    #[test]
    fn test_map_row_through_changes() {
        let changes = [
            CollectionChange::Inserted { index: 0, count: 2 },
            CollectionChange::Removed { index: 4, count: 1 },
        ];
        assert_eq!(map_row(0, &changes), Some(2));
        assert_eq!(map_row(2, &changes), None);
        assert_eq!(map_row(3, &changes), Some(4));
        assert_eq!(map_row(1, &[CollectionChange::Reset]), None);
    }

    #[test]
    fn test_end_update_without_begin() {
        let mut grid = grid(&[1, 2]);
        assert!(matches!(grid.end_update(), Err(GridError::UnbalancedUpdate)));
        grid.begin_update();
        assert!(grid.is_updating());
        assert!(grid.end_update().is_ok());
        assert!(!grid.is_updating());
    }

    #[test]
    fn test_sync_deferred_inside_batch() {
        let mut grid = grid(&[1, 2]);
        grid.begin_update();
        grid.update_source(|s| s.push(3));
        assert_eq!(grid.slots().row_count(), 2);
        grid.end_update().unwrap();
        assert_eq!(grid.slots().row_count(), 3);
    }

    #[test]
    fn test_current_follows_insert() {
        let mut grid = grid(&[1, 2, 3]);
        grid.cell_pressed(Some(0), 1, KeyboardModifiers::NONE, Point::ZERO);
        grid.pointer_released();
        grid.update_source(|s| {
            s.insert(0, 9);
        });
        assert_eq!(grid.current_row(), Some(2));
        assert_eq!(grid.selection().selected_rows(), vec![2]);
    }

    #[test]
    fn test_navigation_clamps_at_edges() {
        let mut grid = grid(&[1, 2, 3]);
        assert!(grid.key_down(Key::ArrowDown, KeyboardModifiers::NONE));
        assert_eq!(grid.current_row(), Some(0));
        assert!(!grid.key_down(Key::ArrowUp, KeyboardModifiers::NONE));
        grid.set_viewport_rows(10);
        assert!(grid.key_down(Key::PageDown, KeyboardModifiers::NONE));
        assert_eq!(grid.current_row(), Some(2));
    }

    #[test]
    fn test_key_paths_nest() {
        let mut space = SlotSpace::new(2);
        space.set_groups(build_groups(2, 2, |row| {
            Some(vec![CellValue::from("a"), CellValue::Integer(row as i64)])
        }));
        let paths = key_paths(&space);
        assert_eq!(paths.len(), 3);
        assert_eq!(paths[2].1, vec![CellValue::from("a"), CellValue::Integer(1)]);
    }
}
