//! The edit session: begin, commit and cancel with snapshot and restore.
//!
//! ```text
//!            begin_edit                 commit_edit(Row)
//!   Idle ───────────────► Editing ─────────────────────► Idle
//!                           │  ▲
//!         commit_edit(Cell) │  │ begin_edit (same row)
//!                           ▼  │
//!                       row open, no cell ── cancel_edit ──► Idle
//! ```
//!
//! A session edits one row. When it begins, the session either hands the
//! transaction to the item's [`EditableItem`](crate::model::EditableItem)
//! capability or snapshots every restorable column. Cell edits go to a
//! buffer; committing a cell validates the buffer and writes it, committing
//! the row also ends the item's transaction. Cancelling restores the row as
//! it was when the session began, cell commits included.
//!
//! # Deferred transitions
//!
//! While the editor widget holds keyboard focus, a transition requested by
//! the same input event (Tab, Enter, Escape, a click elsewhere) must not tear
//! the editor down. [`EditSession::schedule`] posts such transitions to a
//! FIFO queue instead, and [`EditSession::editor_lost_focus`] hands them back
//! in order once the host reports that focus left the editor.

use horizon_datagrid_core::logging::targets;
use horizon_datagrid_core::{DeferredQueue, Signal};

use crate::error::{GridError, Result};
use crate::input::{GridAction, KeyboardModifiers};
use crate::model::{
    CellValue, Column, EditableAccessor, ItemId, ItemSource, ValidationError, ValidationState,
};

/// How much of an edit a commit finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditUnit {
    /// Write the cell and keep the row transaction open.
    Cell,
    /// Write the cell and end the row transaction.
    #[default]
    Row,
}

/// Result of a commit.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// Values were written.
    Committed,
    /// A validator refused the buffer. The session is still editing and the
    /// buffer is kept for correction.
    Invalid(Vec<ValidationError>),
    /// The edited item no longer exists; the session was dropped.
    Discarded,
}

impl CommitOutcome {
    /// Returns true if the session moved on (committed or discarded).
    pub fn is_success(&self) -> bool {
        !matches!(self, CommitOutcome::Invalid(_))
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditEnding {
    /// The row was committed.
    Committed,
    /// The row was restored.
    Cancelled,
    /// The item disappeared mid-edit.
    Discarded,
}

/// A transition waiting for the editor to release focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    /// Commit the edit.
    Commit(EditUnit),
    /// Cancel the edit.
    Cancel,
    /// Apply a pointer selection once the edit is out of the way.
    Select {
        column: Option<usize>,
        slot: usize,
        modifiers: KeyboardModifiers,
    },
    /// Apply a row header click once the edit is out of the way.
    SelectRowHeader {
        slot: usize,
        modifiers: KeyboardModifiers,
    },
    /// Apply a column header click once the edit is out of the way.
    SelectColumnHeader {
        column: usize,
        modifiers: KeyboardModifiers,
    },
    /// Run a keyboard action once the edit is out of the way.
    Key {
        action: GridAction,
        modifiers: KeyboardModifiers,
    },
}

/// What the session needs to know about the grid's columns.
#[derive(Debug)]
pub struct EditContext<'a, T> {
    /// The column accessors, by column index.
    pub columns: &'a [Column<T>],
    /// Accessor to the items' edit-transaction capability.
    pub editable: Option<EditableAccessor<T>>,
    /// Whether the grid refuses every edit.
    pub read_only: bool,
}

impl<T> Clone for EditContext<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EditContext<'_, T> {}

#[derive(Debug, Clone)]
enum Backup {
    /// One value per column; `None` for columns that cannot be written back.
    Fields(Vec<Option<CellValue>>),
    /// The item restores itself.
    Delegated,
}

#[derive(Debug, Clone)]
struct CellEdit {
    column: usize,
    buffer: CellValue,
    is_dirty: bool,
}

#[derive(Debug, Clone)]
struct ActiveEdit {
    row: usize,
    item: ItemId,
    backup: Backup,
    cell: Option<CellEdit>,
}

/// The grid's single edit session.
#[derive(Debug, Default)]
pub struct EditSession {
    active: Option<ActiveEdit>,
    deferred: DeferredQueue<PendingAction>,
    editor_focused: bool,

    /// Emitted when a cell editor opens. Args: (row, column)
    pub edit_started: Signal<(usize, usize)>,

    /// Emitted when the row transaction ends. Args: (row, how)
    pub edit_ended: Signal<(usize, EditEnding)>,

    /// Emitted when a commit is refused.
    pub validation_failed: Signal<Vec<ValidationError>>,
}

impl EditSession {
    /// Create an idle session.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Returns true while a row transaction is open.
    pub fn is_editing(&self) -> bool {
        self.active.is_some()
    }

    /// The row being edited.
    pub fn editing_row(&self) -> Option<usize> {
        self.active.as_ref().map(|a| a.row)
    }

    /// The column whose editor is open.
    pub fn editing_column(&self) -> Option<usize> {
        self.active
            .as_ref()
            .and_then(|a| a.cell.as_ref())
            .map(|c| c.column)
    }

    /// Identity of the item being edited.
    pub fn editing_item(&self) -> Option<ItemId> {
        self.active.as_ref().map(|a| a.item)
    }

    /// The cell editor's current value.
    pub fn buffer(&self) -> Option<&CellValue> {
        self.active
            .as_ref()
            .and_then(|a| a.cell.as_ref())
            .map(|c| &c.buffer)
    }

    /// Returns true if the cell editor holds an uncommitted change.
    pub fn is_dirty(&self) -> bool {
        self.active
            .as_ref()
            .and_then(|a| a.cell.as_ref())
            .is_some_and(|c| c.is_dirty)
    }

    /// Returns true if the item manages its own transaction.
    pub fn is_delegated(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| matches!(a.backup, Backup::Delegated))
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Open an editor on `(row, column)`.
    ///
    /// Returns false, changing nothing, when the grid or the column is
    /// read-only, when there is no current row, when the row is the
    /// placeholder or has no item, or when another row is being edited.
    /// On the row already being edited, switches the editor to `column` if
    /// the open cell has no pending change.
    pub fn begin_edit<S>(
        &mut self,
        source: &mut S,
        context: EditContext<'_, S::Item>,
        row: Option<usize>,
        column: usize,
    ) -> bool
    where
        S: ItemSource,
    {
        if context.read_only {
            tracing::debug!(target: targets::EDIT, "begin_edit refused: grid is read-only");
            return false;
        }
        let Some(row) = row else {
            tracing::debug!(target: targets::EDIT, "begin_edit refused: no current cell");
            return false;
        };
        if source.is_placeholder(row) {
            tracing::debug!(target: targets::EDIT, row, "begin_edit refused: placeholder row");
            return false;
        }
        let Some(accessor) = context.columns.get(column) else {
            return false;
        };
        if accessor.is_read_only() {
            tracing::debug!(target: targets::EDIT, row, column, "begin_edit refused: read-only column");
            return false;
        }

        if let Some(active) = self.active.as_mut() {
            if active.row != row {
                tracing::debug!(target: targets::EDIT, row, editing = active.row, "begin_edit refused: another row is open");
                return false;
            }
            if let Some(cell) = &active.cell
                && (cell.column == column || cell.is_dirty)
            {
                return false;
            }
            let Some(item) = source.item(row) else {
                return false;
            };
            active.cell = Some(CellEdit {
                column,
                buffer: accessor.value(item),
                is_dirty: false,
            });
            self.edit_started.emit((row, column));
            return true;
        }

        let Some(item_id) = source.item_id(row) else {
            return false;
        };
        let Some(item) = source.item_mut(row) else {
            tracing::debug!(target: targets::EDIT, row, "begin_edit refused: row not materialized");
            return false;
        };
        let delegated = match context.editable {
            Some(editable) => editable(&mut *item).is_some_and(|e| e.try_begin_edit()),
            None => false,
        };
        let backup = if delegated {
            Backup::Delegated
        } else {
            Backup::Fields(
                context
                    .columns
                    .iter()
                    .map(|c| c.can_restore().then(|| c.value(item)))
                    .collect(),
            )
        };
        self.active = Some(ActiveEdit {
            row,
            item: item_id,
            backup,
            cell: Some(CellEdit {
                column,
                buffer: accessor.value(item),
                is_dirty: false,
            }),
        });
        tracing::debug!(target: targets::EDIT, row, column, delegated, "edit began");
        self.edit_started.emit((row, column));
        true
    }

    /// Replace the editor's value. Returns false if no cell editor is open.
    pub fn set_value(&mut self, value: impl Into<CellValue>) -> bool {
        let Some(cell) = self.active.as_mut().and_then(|a| a.cell.as_mut()) else {
            return false;
        };
        cell.buffer = value.into();
        cell.is_dirty = true;
        true
    }

    /// Validate and write the open cell, and with [`EditUnit::Row`] end the
    /// row transaction.
    ///
    /// # Errors
    ///
    /// [`GridError::NoEditSession`] if nothing is being edited.
    pub fn commit_edit<S>(
        &mut self,
        source: &mut S,
        context: EditContext<'_, S::Item>,
        unit: EditUnit,
    ) -> Result<CommitOutcome>
    where
        S: ItemSource,
    {
        let Some(active) = self.active.as_mut() else {
            tracing::warn!(target: targets::EDIT, "commit_edit without an edit session");
            return Err(GridError::NoEditSession);
        };
        let Some(row) = source.index_of(active.item) else {
            return Ok(self.discard());
        };
        active.row = row;

        if let Some(cell) = active.cell.as_mut()
            && cell.is_dirty
        {
            let Some(column) = context.columns.get(cell.column) else {
                return Ok(self.discard());
            };
            let errors = match column.validate(cell.column, cell.buffer.clone()) {
                Ok(value) => {
                    let Some(item) = source.item_mut(row) else {
                        return Ok(self.discard());
                    };
                    if column.set_value(item, value.clone()) {
                        cell.buffer = value;
                        cell.is_dirty = false;
                        Vec::new()
                    } else {
                        vec![ValidationError {
                            column: cell.column,
                            message: format!("column '{}' refused the value", column.name()),
                            value,
                            state: ValidationState::Invalid,
                        }]
                    }
                }
                Err(errors) => errors,
            };
            if !errors.is_empty() {
                tracing::debug!(target: targets::EDIT, row, errors = errors.len(), "commit refused by validation");
                self.validation_failed.emit(errors.clone());
                return Ok(CommitOutcome::Invalid(errors));
            }
        }

        match unit {
            EditUnit::Cell => {
                active.cell = None;
                tracing::trace!(target: targets::EDIT, row, "cell committed");
            }
            EditUnit::Row => {
                let delegated = matches!(active.backup, Backup::Delegated);
                self.active = None;
                if delegated
                    && let Some(editable) = context.editable
                    && let Some(item) = source.item_mut(row)
                    && let Some(item) = editable(item)
                {
                    item.try_end_edit();
                }
                tracing::debug!(target: targets::EDIT, row, "edit committed");
                self.edit_ended.emit((row, EditEnding::Committed));
            }
        }
        Ok(CommitOutcome::Committed)
    }

    /// Restore the row as it was when the session began and return to idle.
    ///
    /// # Errors
    ///
    /// [`GridError::NoEditSession`] if nothing is being edited.
    pub fn cancel_edit<S>(&mut self, source: &mut S, context: EditContext<'_, S::Item>) -> Result<()>
    where
        S: ItemSource,
    {
        let Some(active) = self.active.take() else {
            tracing::warn!(target: targets::EDIT, "cancel_edit without an edit session");
            return Err(GridError::NoEditSession);
        };
        let row = source.index_of(active.item);
        let item = row.and_then(|row| source.item_mut(row));
        match (item, active.backup) {
            (Some(item), Backup::Delegated) => {
                if let Some(editable) = context.editable
                    && let Some(item) = editable(item)
                {
                    item.try_cancel_edit();
                }
            }
            (Some(item), Backup::Fields(values)) => {
                for (column, value) in context.columns.iter().zip(values) {
                    if let Some(value) = value {
                        column.restore_value(item, value);
                    }
                }
            }
            (None, _) => {}
        }
        let row = row.unwrap_or(active.row);
        tracing::debug!(target: targets::EDIT, row, "edit cancelled");
        self.edit_ended.emit((row, EditEnding::Cancelled));
        Ok(())
    }

    /// Drop the session without touching the item (the item is gone or the
    /// source was reset). Pending transitions are dropped too.
    pub fn abandon(&mut self) {
        self.deferred.clear();
        if self.active.is_some() {
            self.discard();
        }
    }

    /// Follow the edited item after the source changed. Drops the session
    /// if the item is gone; returns true if the session survives.
    pub fn relocate<S>(&mut self, source: &S) -> bool
    where
        S: ItemSource + ?Sized,
    {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        match source.index_of(active.item) {
            Some(row) => {
                active.row = row;
                true
            }
            None => {
                self.deferred.clear();
                self.discard();
                false
            }
        }
    }

    fn discard(&mut self) -> CommitOutcome {
        if let Some(active) = self.active.take() {
            tracing::debug!(target: targets::EDIT, row = active.row, "edit discarded: item removed");
            self.edit_ended.emit((active.row, EditEnding::Discarded));
        }
        CommitOutcome::Discarded
    }

    // =========================================================================
    // Deferred transitions
    // =========================================================================

    /// Record whether the editor widget holds keyboard focus.
    pub fn set_editor_focused(&mut self, focused: bool) {
        self.editor_focused = focused;
    }

    /// Returns true if the editor widget holds keyboard focus.
    pub fn is_editor_focused(&self) -> bool {
        self.editor_focused
    }

    /// Route a transition: posted to the queue while an editor holds focus
    /// or a transition is already pending, returned for immediate execution
    /// otherwise.
    pub fn schedule(&mut self, action: PendingAction) -> Option<PendingAction> {
        let defer = (self.editor_focused && self.is_editing()) || self.deferred.has_pending();
        if defer {
            tracing::trace!(target: targets::EDIT, ?action, pending = self.deferred.pending_count(), "transition deferred");
            self.deferred.post(action);
            None
        } else {
            Some(action)
        }
    }

    /// The editor released focus: hand back every pending transition,
    /// oldest first.
    pub fn editor_lost_focus(&mut self) -> Vec<PendingAction> {
        self.editor_focused = false;
        self.deferred.drain()
    }

    /// Returns true if a transition is waiting for focus release.
    pub fn has_pending(&self) -> bool {
        self.deferred.has_pending()
    }

    /// Pending transitions in execution order.
    pub fn pending_actions(&self) -> impl Iterator<Item = &PendingAction> + '_ {
        self.deferred.pending()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::model::{EditableItem, RangeValidator, VecItemSource, editable_item};

    #[derive(Debug, Clone, PartialEq)]
    struct Sample {
        flag: bool,
        count: i64,
        ratio: f64,
        label: String,
        note: Option<String>,
    }

    fn sample() -> Sample {
        Sample {
            flag: true,
            count: 7,
            ratio: -0.0,
            label: "seven".into(),
            note: None,
        }
    }

    fn columns() -> Vec<Column<Sample>> {
        vec![
            Column::new("Flag", |s: &Sample| CellValue::Bool(s.flag)).with_setter(|s: &mut Sample, v| {
                v.as_bool().map(|b| s.flag = b).is_some()
            }),
            Column::new("Count", |s: &Sample| CellValue::Integer(s.count))
                .with_setter(|s: &mut Sample, v| v.as_i64().map(|n| s.count = n).is_some())
                .with_validator(RangeValidator::non_negative()),
            Column::new("Ratio", |s: &Sample| CellValue::Number(s.ratio))
                .with_setter(|s: &mut Sample, v| v.as_f64().map(|n| s.ratio = n).is_some()),
            Column::new("Label", |s: &Sample| CellValue::from(s.label.as_str())).with_setter(
                |s: &mut Sample, v| match v {
                    CellValue::Text(t) => {
                        s.label = t;
                        true
                    }
                    _ => false,
                },
            ),
            Column::new("Note", |s: &Sample| CellValue::from(s.note.clone())).with_setter(
                |s: &mut Sample, v| match v {
                    CellValue::Text(t) => {
                        s.note = Some(t);
                        true
                    }
                    CellValue::Empty => {
                        s.note = None;
                        true
                    }
                    _ => false,
                },
            ),
            Column::new("Id", |s: &Sample| CellValue::Integer(s.count * 100)),
        ]
    }

    fn context(columns: &[Column<Sample>]) -> EditContext<'_, Sample> {
        EditContext {
            columns,
            editable: None,
            read_only: false,
        }
    }

    #[test]
    fn test_begin_refusals() {
        let columns = columns();
        let mut source = VecItemSource::new(vec![sample()]).with_placeholder();
        let mut session = EditSession::new();

        assert!(!session.begin_edit(&mut source, context(&columns), None, 1));
        assert!(!session.begin_edit(&mut source, context(&columns), Some(1), 1));
        assert!(!session.begin_edit(&mut source, context(&columns), Some(0), 5));
        assert_eq!(session.editing_column(), None);
        let read_only = EditContext {
            read_only: true,
            ..context(&columns)
        };
        assert!(!session.begin_edit(&mut source, read_only, Some(0), 1));
        assert!(!session.is_editing());

        assert!(session.begin_edit(&mut source, context(&columns), Some(0), 1));
        assert_eq!(session.editing_row(), Some(0));
        assert_eq!(session.editing_column(), Some(1));
    }

    #[test]
    fn test_cancel_restores_every_column_type() {
        let columns = columns();
        let mut source = VecItemSource::new(vec![sample()]);
        let before = sample();
        let mut session = EditSession::new();

        for column in 0..5 {
            assert!(session.begin_edit(&mut source, context(&columns), Some(0), column));
            let replacement = match column {
                0 => CellValue::Bool(false),
                1 => CellValue::Integer(99),
                2 => CellValue::Number(f64::NAN),
                3 => CellValue::from("changed"),
                _ => CellValue::from("note"),
            };
            session.set_value(replacement);
            let outcome = session.commit_edit(&mut source, context(&columns), EditUnit::Cell).unwrap();
            assert_eq!(outcome, CommitOutcome::Committed);
        }
        assert_ne!(source.item(0), Some(&before));

        session.cancel_edit(&mut source, context(&columns)).unwrap();
        let after = source.item(0).unwrap();
        assert_eq!(after, &before);
        assert_eq!(after.ratio.to_bits(), before.ratio.to_bits());
        assert!(!session.is_editing());
    }

    #[test]
    fn test_begin_then_cancel_is_identity() {
        let columns = columns();
        let mut source = VecItemSource::new(vec![sample()]);
        let mut session = EditSession::new();
        assert!(session.begin_edit(&mut source, context(&columns), Some(0), 3));
        session.cancel_edit(&mut source, context(&columns)).unwrap();
        assert_eq!(source.item(0), Some(&sample()));
    }

    #[test]
    fn test_invalid_commit_keeps_editing() {
        let columns = columns();
        let mut source = VecItemSource::new(vec![sample()]);
        let mut session = EditSession::new();
        let failures = Arc::new(AtomicUsize::new(0));
        let failures_clone = failures.clone();
        session.validation_failed.connect(move |errors| {
            failures_clone.fetch_add(errors.len(), Ordering::SeqCst);
        });

        session.begin_edit(&mut source, context(&columns), Some(0), 1);
        session.set_value(CellValue::Integer(-3));
        let outcome = session.commit_edit(&mut source, context(&columns), EditUnit::Row).unwrap();
        let CommitOutcome::Invalid(errors) = outcome else {
            panic!("expected validation failure");
        };
        assert_eq!(errors[0].column, 1);
        assert!(session.is_editing());
        assert_eq!(session.buffer(), Some(&CellValue::Integer(-3)));
        assert_eq!(source.item(0).unwrap().count, 7);
        assert_eq!(failures.load(Ordering::SeqCst), 1);

        session.set_value("12");
        let outcome = session.commit_edit(&mut source, context(&columns), EditUnit::Row).unwrap();
        assert_eq!(outcome, CommitOutcome::Committed);
        assert_eq!(source.item(0).unwrap().count, 12);
        assert!(!session.is_editing());
    }

    #[test]
    fn test_setter_refusal_is_invalid() {
        let columns = columns();
        let mut source = VecItemSource::new(vec![sample()]);
        let mut session = EditSession::new();
        session.begin_edit(&mut source, context(&columns), Some(0), 0);
        session.set_value("not a bool");
        let outcome = session.commit_edit(&mut source, context(&columns), EditUnit::Row).unwrap();
        assert!(!outcome.is_success());
        assert!(session.is_dirty());
    }

    #[test]
    fn test_no_session_errors() {
        let columns = columns();
        let mut source = VecItemSource::new(vec![sample()]);
        let mut session = EditSession::new();
        assert!(matches!(
            session.commit_edit(&mut source, context(&columns), EditUnit::Row),
            Err(GridError::NoEditSession)
        ));
        assert!(matches!(
            session.cancel_edit(&mut source, context(&columns)),
            Err(GridError::NoEditSession)
        ));
    }

    #[test]
    fn test_other_row_refused_while_editing() {
        let columns = columns();
        let mut source = VecItemSource::new(vec![sample(), sample()]);
        let mut session = EditSession::new();
        assert!(session.begin_edit(&mut source, context(&columns), Some(0), 1));
        assert!(!session.begin_edit(&mut source, context(&columns), Some(1), 1));
        session.set_value(3);
        assert!(!session.begin_edit(&mut source, context(&columns), Some(0), 2));
        session.commit_edit(&mut source, context(&columns), EditUnit::Cell).unwrap();
        assert!(session.begin_edit(&mut source, context(&columns), Some(0), 2));
        assert_eq!(session.editing_column(), Some(2));
    }

    #[test]
    fn test_removed_item_discards() {
        let columns = columns();
        let mut source = VecItemSource::new(vec![sample()]);
        let mut session = EditSession::new();
        session.begin_edit(&mut source, context(&columns), Some(0), 1);
        session.set_value(1);
        source.remove(0);
        let outcome = session.commit_edit(&mut source, context(&columns), EditUnit::Row).unwrap();
        assert_eq!(outcome, CommitOutcome::Discarded);
        assert!(!session.is_editing());
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Transactional {
        value: i64,
        saved: Option<i64>,
        ended: usize,
    }

    impl EditableItem for Transactional {
        fn try_begin_edit(&mut self) -> bool {
            self.saved = Some(self.value);
            true
        }

        fn try_cancel_edit(&mut self) -> bool {
            match self.saved.take() {
                Some(value) => {
                    self.value = value;
                    true
                }
                None => false,
            }
        }

        fn try_end_edit(&mut self) -> bool {
            self.saved = None;
            self.ended += 1;
            true
        }
    }

    #[test]
    fn test_delegates_to_editable_item() {
        let columns = vec![
            Column::new("Value", |t: &Transactional| CellValue::Integer(t.value))
                .with_setter(|t: &mut Transactional, v| v.as_i64().map(|n| t.value = n).is_some()),
        ];
        let context = EditContext {
            columns: &columns,
            editable: Some(editable_item::<Transactional> as EditableAccessor<Transactional>),
            read_only: false,
        };
        let mut source = VecItemSource::new(vec![Transactional {
            value: 5,
            ..Default::default()
        }]);
        let mut session = EditSession::new();

        assert!(session.begin_edit(&mut source, context, Some(0), 0));
        assert!(session.is_delegated());
        session.set_value(8);
        session.commit_edit(&mut source, context, EditUnit::Cell).unwrap();
        assert_eq!(source.item(0).unwrap().value, 8);
        session.cancel_edit(&mut source, context).unwrap();
        assert_eq!(source.item(0).unwrap().value, 5);

        assert!(session.begin_edit(&mut source, context, Some(0), 0));
        session.set_value(9);
        session.commit_edit(&mut source, context, EditUnit::Row).unwrap();
        let item = source.item(0).unwrap();
        assert_eq!((item.value, item.ended, item.saved), (9, 1, None));
    }

    #[test]
    fn test_deferred_transitions_run_fifo() {
        let columns = columns();
        let mut source = VecItemSource::new(vec![sample()]);
        let mut session = EditSession::new();

        // Nothing focused: runs immediately.
        assert_eq!(session.schedule(PendingAction::Cancel), Some(PendingAction::Cancel));

        session.begin_edit(&mut source, context(&columns), Some(0), 1);
        session.set_editor_focused(true);
        assert_eq!(session.schedule(PendingAction::Commit(EditUnit::Cell)), None);
        assert_eq!(session.schedule(PendingAction::Cancel), None);
        assert_eq!(
            session.pending_actions().copied().collect::<Vec<_>>(),
            vec![PendingAction::Commit(EditUnit::Cell), PendingAction::Cancel]
        );

        let drained = session.editor_lost_focus();
        assert_eq!(drained, vec![PendingAction::Commit(EditUnit::Cell), PendingAction::Cancel]);
        assert!(!session.has_pending());
        assert!(!session.is_editor_focused());
    }
}
