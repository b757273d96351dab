//! Tests for row drag-reorder through the grid facade.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use horizon_datagrid::input::KeyboardModifiers;
use horizon_datagrid::model::{CellValue, Column, VecItemSource};
use horizon_datagrid::reorder::{DropArgs, DropOutcome, DropPosition, ReorderHandle, ReorderHandler};
use horizon_datagrid::{DataGrid, GridHit, GridOptions, Point, PointerFeedback, PointerRelease};
use parking_lot::Mutex;

type Letters = VecItemSource<String>;

fn letters(source: Letters, options: GridOptions) -> DataGrid<Letters> {
    let columns = vec![Column::new("Letter", |s: &String| CellValue::from(s.as_str()))];
    DataGrid::from_options(source, columns, options).unwrap()
}

fn abcde() -> Letters {
    VecItemSource::new(["a", "b", "c", "d", "e"].map(String::from).to_vec())
}

fn reorderable() -> GridOptions {
    GridOptions {
        can_user_reorder_rows: true,
        ..Default::default()
    }
}

fn order(grid: &DataGrid<Letters>) -> String {
    grid.source().iter().map(String::as_str).collect()
}

/// Press on `slot`, drag past the threshold onto `hit`, release.
fn drag_row(grid: &mut DataGrid<Letters>, slot: usize, hit: GridHit) -> PointerRelease {
    grid.cell_pressed(Some(0), slot, KeyboardModifiers::NONE, Point::ZERO);
    grid.pointer_moved(Some(hit), Point::new(0.0, 60.0));
    grid.pointer_released()
}

#[test]
fn test_drag_single_row_below_target() {
    let mut grid = letters(abcde(), reorderable());
    grid.cell_pressed(Some(0), 0, KeyboardModifiers::NONE, Point::ZERO);

    let feedback = grid.pointer_moved(Some(GridHit::row(3, 0.8)), Point::new(0.0, 60.0));
    let PointerFeedback::Reorder(Some(target)) = feedback else {
        panic!("expected a drop target, got {feedback:?}");
    };
    assert_eq!(target.position, DropPosition::After);
    assert_eq!(target.insert_index, 4);

    let release = grid.pointer_released();
    assert!(matches!(release, PointerRelease::Reorder(DropOutcome::Moved { .. })));
    assert_eq!(order(&grid), "bcdae");
    assert_eq!(grid.selection().selected_rows(), vec![3]);
    assert_eq!(grid.current_row(), Some(3));
}

#[test]
fn test_drag_selection_moves_as_block() {
    let mut grid = letters(abcde(), reorderable());
    grid.cell_pressed(Some(0), 0, KeyboardModifiers::NONE, Point::ZERO);
    grid.pointer_released();
    grid.cell_pressed(Some(0), 1, KeyboardModifiers::SHIFT, Point::ZERO);
    grid.pointer_released();
    assert_eq!(grid.selection().selected_rows(), vec![0, 1]);

    let release = drag_row(&mut grid, 0, GridHit::row(4, 0.9));
    let PointerRelease::Reorder(DropOutcome::Moved { drag, .. }) = release else {
        panic!("expected a move, got {release:?}");
    };
    assert!(drag.is_selection);
    assert_eq!(drag.source_indices, vec![0, 1]);
    assert_eq!(order(&grid), "cdeab");
    assert_eq!(grid.selection().selected_rows(), vec![3, 4]);
}

#[test]
fn test_click_on_selected_row_collapses_selection_on_release() {
    let mut grid = letters(abcde(), reorderable());
    grid.cell_pressed(Some(0), 0, KeyboardModifiers::NONE, Point::ZERO);
    grid.pointer_released();
    grid.cell_pressed(Some(0), 2, KeyboardModifiers::SHIFT, Point::ZERO);
    grid.pointer_released();

    grid.cell_pressed(Some(0), 1, KeyboardModifiers::NONE, Point::ZERO);
    assert_eq!(grid.selection().selected_rows(), vec![0, 1, 2]);
    assert_eq!(grid.current_row(), Some(1));

    assert_eq!(grid.pointer_released(), PointerRelease::Selection);
    assert_eq!(grid.selection().selected_rows(), vec![1]);
    assert_eq!(order(&grid), "abcde");
}

struct CountingHandler {
    calls: Arc<AtomicUsize>,
}

impl ReorderHandler<Letters> for CountingHandler {
    fn validate(&self, _source: &Letters, _args: &DropArgs<'_>) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn execute(&mut self, _source: &mut Letters, _args: &DropArgs<'_>) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        false
    }
}

#[test]
fn test_drop_on_placeholder_never_reaches_handler() {
    let mut grid = letters(abcde().with_placeholder(), reorderable());
    let calls = Arc::new(AtomicUsize::new(0));
    grid.set_reorder_handler(CountingHandler { calls: calls.clone() });

    let release = drag_row(&mut grid, 1, GridHit::row(5, 0.2));
    assert_eq!(release, PointerRelease::Reorder(DropOutcome::Rejected));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(order(&grid), "abcde");
}

#[test]
fn test_failed_execute_is_rejected() {
    let mut grid = letters(abcde(), reorderable());
    let calls = Arc::new(AtomicUsize::new(0));
    grid.set_reorder_handler(CountingHandler { calls: calls.clone() });

    let release = drag_row(&mut grid, 0, GridHit::row(3, 0.8));
    assert_eq!(release, PointerRelease::Reorder(DropOutcome::Rejected));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(order(&grid), "abcde");
}

#[test]
fn test_drop_onto_own_position_is_rejected() {
    let mut grid = letters(abcde(), reorderable());
    let release = drag_row(&mut grid, 2, GridHit::row(2, 0.8));
    assert_eq!(release, PointerRelease::Reorder(DropOutcome::Rejected));

    let release = drag_row(&mut grid, 2, GridHit::row(3, 0.1));
    assert_eq!(release, PointerRelease::Reorder(DropOutcome::Rejected));
    assert_eq!(order(&grid), "abcde");
}

#[test]
fn test_short_press_does_not_drag() {
    let mut grid = letters(abcde(), reorderable());
    let captures = Arc::new(Mutex::new(Vec::new()));
    let log = captures.clone();
    grid.reorder()
        .capture_changed
        .connect(move |captured| log.lock().push(*captured));

    grid.cell_pressed(Some(0), 1, KeyboardModifiers::NONE, Point::ZERO);
    let feedback = grid.pointer_moved(Some(GridHit::row(3, 0.5)), Point::new(1.0, 1.0));
    assert_eq!(feedback, PointerFeedback::Reorder(None));
    assert_eq!(grid.pointer_released(), PointerRelease::Selection);

    assert!(captures.lock().is_empty());
    assert_eq!(grid.selection().selected_rows(), vec![1]);
    assert_eq!(order(&grid), "abcde");
}

#[test]
fn test_reorder_is_off_by_default() {
    let mut grid = letters(abcde(), GridOptions::default());
    grid.cell_pressed(Some(0), 0, KeyboardModifiers::NONE, Point::ZERO);
    grid.pointer_moved(Some(GridHit::cell(0, 3)), Point::new(0.0, 60.0));

    assert_eq!(grid.pointer_released(), PointerRelease::Selection);
    assert_eq!(grid.selection().selected_rows(), vec![0, 1, 2, 3]);
    assert!(!grid.drag_handle_pressed(0, Point::ZERO));
    assert_eq!(order(&grid), "abcde");
}

#[test]
fn test_drag_handle_leaves_selection_alone() {
    let options = GridOptions {
        reorder_handle: ReorderHandle::DragHandle,
        ..reorderable()
    };
    let mut grid = letters(abcde(), options);
    grid.cell_pressed(Some(0), 4, KeyboardModifiers::NONE, Point::ZERO);
    grid.pointer_released();

    assert!(grid.drag_handle_pressed(2, Point::ZERO));
    grid.pointer_moved(Some(GridHit::row(0, 0.1)), Point::new(0.0, -50.0));
    let release = grid.pointer_released();

    assert!(matches!(release, PointerRelease::Reorder(DropOutcome::Moved { .. })));
    assert_eq!(order(&grid), "cabde");
    assert_eq!(grid.selection().selected_rows(), vec![4]);
}
