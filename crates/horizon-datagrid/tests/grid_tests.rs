//! Tests for pointer, keyboard and edit routing through the grid facade.

use std::sync::Arc;

use horizon_datagrid::edit::{EditEnding, EditUnit};
use horizon_datagrid::input::{Key, KeyboardModifiers};
use horizon_datagrid::model::{CellValue, Column, ItemSource, RangeValidator, VecItemSource};
use horizon_datagrid::selection::{CellRange, SelectionMode, SelectionOutcome, SelectionUnit};
use horizon_datagrid::{DataGrid, GridError, GridHit, GridOptions, Point, PointerFeedback, PointerRelease};
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq)]
struct Product {
    name: String,
    price: i64,
    stock: i64,
}

fn product(name: &str, price: i64, stock: i64) -> Product {
    Product {
        name: name.to_string(),
        price,
        stock,
    }
}

fn int_setter(field: fn(&mut Product) -> &mut i64) -> impl Fn(&mut Product, CellValue) -> bool + Send + Sync {
    move |p: &mut Product, value: CellValue| match value.as_i64() {
        Some(v) => {
            *field(p) = v;
            true
        }
        None => false,
    }
}

fn columns() -> Vec<Column<Product>> {
    vec![
        Column::new("Name", |p: &Product| CellValue::from(p.name.as_str())),
        Column::new("Price", |p: &Product| CellValue::Integer(p.price))
            .with_setter(int_setter(|p| &mut p.price))
            .with_validator(RangeValidator::non_negative()),
        Column::new("Stock", |p: &Product| CellValue::Integer(p.stock))
            .with_setter(int_setter(|p| &mut p.stock)),
    ]
}

fn products(count: usize) -> VecItemSource<Product> {
    VecItemSource::new(
        (0..count)
            .map(|i| product(&format!("item-{i}"), 10 * (i as i64 + 1), i as i64))
            .collect(),
    )
}

fn grid_with(options: GridOptions, rows: usize) -> DataGrid<VecItemSource<Product>> {
    DataGrid::from_options(products(rows), columns(), options).unwrap()
}

fn grid(rows: usize) -> DataGrid<VecItemSource<Product>> {
    grid_with(GridOptions::default(), rows)
}

fn click(grid: &mut DataGrid<VecItemSource<Product>>, column: usize, slot: usize, modifiers: KeyboardModifiers) -> SelectionOutcome {
    let outcome = grid.cell_pressed(Some(column), slot, modifiers, Point::ZERO);
    grid.pointer_released();
    outcome
}

fn price(grid: &DataGrid<VecItemSource<Product>>, row: usize) -> i64 {
    grid.source().item(row).map(|p| p.price).unwrap()
}

// =============================================================================
// Selection
// =============================================================================

#[test]
fn test_shift_click_selects_range() {
    let mut grid = grid(10);
    click(&mut grid, 0, 2, KeyboardModifiers::NONE);
    click(&mut grid, 0, 5, KeyboardModifiers::SHIFT);
    assert_eq!(grid.selection().selected_rows(), vec![2, 3, 4, 5]);

    click(&mut grid, 0, 0, KeyboardModifiers::SHIFT);
    assert_eq!(grid.selection().selected_rows(), vec![0, 1, 2]);
}

#[test]
fn test_ctrl_click_toggles_back() {
    let mut grid = grid(5);
    click(&mut grid, 0, 1, KeyboardModifiers::NONE);
    click(&mut grid, 0, 3, KeyboardModifiers::CTRL);
    assert_eq!(grid.selection().selected_rows(), vec![1, 3]);

    click(&mut grid, 0, 3, KeyboardModifiers::CTRL);
    assert_eq!(grid.selection().selected_rows(), vec![1]);
}

#[test]
fn test_single_mode_never_selects_more_than_one() {
    let options = GridOptions {
        selection_mode: SelectionMode::Single,
        ..Default::default()
    };
    let mut grid = grid_with(options, 6);
    click(&mut grid, 0, 1, KeyboardModifiers::NONE);
    click(&mut grid, 0, 4, KeyboardModifiers::SHIFT);
    assert_eq!(grid.selection().selected_rows(), vec![4]);
    click(&mut grid, 0, 2, KeyboardModifiers::CTRL_SHIFT);
    assert_eq!(grid.selection().selected_rows(), vec![2]);
    assert!(!grid.key_down(Key::A, KeyboardModifiers::CTRL));
    assert_eq!(grid.selection().selected_rows().len(), 1);
}

#[test]
fn test_drag_reversal_shrinks_selection() {
    let mut grid = grid(10);
    grid.cell_pressed(Some(0), 2, KeyboardModifiers::NONE, Point::ZERO);

    let feedback = grid.pointer_moved(Some(GridHit::cell(0, 6)), Point::new(0.0, 80.0));
    assert_eq!(feedback, PointerFeedback::Selection(SelectionOutcome::Changed));
    assert_eq!(grid.selection().selected_rows(), vec![2, 3, 4, 5, 6]);

    grid.pointer_moved(Some(GridHit::cell(0, 4)), Point::new(0.0, 40.0));
    assert_eq!(grid.selection().selected_rows(), vec![2, 3, 4]);

    grid.pointer_moved(Some(GridHit::cell(0, 0)), Point::new(0.0, -40.0));
    assert_eq!(grid.selection().selected_rows(), vec![0, 1, 2]);

    assert_eq!(grid.pointer_released(), PointerRelease::Selection);
    assert!(!grid.selection().has_capture());
}

#[test]
fn test_drag_waits_for_threshold() {
    let mut grid = grid(10);
    let captures = Arc::new(Mutex::new(Vec::new()));
    let log = captures.clone();
    grid.selection().capture_changed.connect(move |captured| log.lock().push(*captured));

    grid.cell_pressed(Some(0), 2, KeyboardModifiers::NONE, Point::ZERO);
    let feedback = grid.pointer_moved(Some(GridHit::cell(0, 5)), Point::new(1.0, 1.0));
    assert_eq!(feedback, PointerFeedback::Selection(SelectionOutcome::Unchanged));
    assert_eq!(grid.selection().selected_rows(), vec![2]);
    assert!(captures.lock().is_empty());

    grid.pointer_moved(Some(GridHit::cell(0, 5)), Point::new(0.0, 30.0));
    grid.pointer_released();
    assert_eq!(*captures.lock(), vec![true, false]);
}

#[test]
fn test_cell_unit_shift_click_spans_columns() {
    let options = GridOptions {
        selection_unit: SelectionUnit::Cell,
        ..Default::default()
    };
    let mut grid = grid_with(options, 4);
    click(&mut grid, 0, 1, KeyboardModifiers::NONE);
    click(&mut grid, 2, 2, KeyboardModifiers::SHIFT);
    assert_eq!(grid.selection().selection().ranges(), &[CellRange::new(1, 2, 0, 2)]);
    assert_eq!(grid.selection().selected_cells().len(), 6);
}

// =============================================================================
// Keyboard
// =============================================================================

#[test]
fn test_arrow_navigation_with_shift_extends() {
    let mut grid = grid(6);
    click(&mut grid, 0, 1, KeyboardModifiers::NONE);
    assert!(grid.key_down(Key::ArrowDown, KeyboardModifiers::SHIFT));
    assert!(grid.key_down(Key::ArrowDown, KeyboardModifiers::SHIFT));
    assert_eq!(grid.selection().selected_rows(), vec![1, 2, 3]);

    assert!(grid.key_down(Key::ArrowDown, KeyboardModifiers::NONE));
    assert_eq!(grid.selection().selected_rows(), vec![4]);
}

#[test]
fn test_ctrl_arrow_moves_current_only() {
    let mut grid = grid(6);
    click(&mut grid, 0, 1, KeyboardModifiers::NONE);
    assert!(grid.key_down(Key::ArrowDown, KeyboardModifiers::CTRL));
    assert_eq!(grid.current_row(), Some(2));
    assert_eq!(grid.selection().selected_rows(), vec![1]);
}

#[test]
fn test_home_end_and_paging() {
    let mut grid = grid(30);
    grid.set_viewport_rows(10);
    click(&mut grid, 1, 0, KeyboardModifiers::NONE);

    assert!(grid.key_down(Key::PageDown, KeyboardModifiers::NONE));
    assert_eq!(grid.current_row(), Some(10));
    assert!(grid.key_down(Key::End, KeyboardModifiers::CTRL));
    assert_eq!(grid.current_row(), Some(29));
    assert!(grid.key_down(Key::PageDown, KeyboardModifiers::NONE));
    assert_eq!(grid.current_row(), Some(29));
    assert!(grid.key_down(Key::Home, KeyboardModifiers::CTRL_SHIFT));
    assert_eq!(grid.current_row(), Some(0));
    assert_eq!(grid.selection().selected_rows().len(), 30);
}

#[test]
fn test_tab_wraps_to_next_row() {
    let options = GridOptions {
        selection_unit: SelectionUnit::Cell,
        ..Default::default()
    };
    let mut grid = grid_with(options, 3);
    click(&mut grid, 1, 0, KeyboardModifiers::NONE);
    assert!(grid.key_down(Key::Tab, KeyboardModifiers::NONE));
    assert_eq!(grid.current().and_then(|c| c.column), Some(2));
    assert!(grid.key_down(Key::Tab, KeyboardModifiers::NONE));
    assert_eq!(grid.current().map(|c| (c.column, c.slot)), Some((Some(0), 1)));
    assert!(grid.key_down(Key::Tab, KeyboardModifiers::SHIFT));
    assert_eq!(grid.current().map(|c| (c.column, c.slot)), Some((Some(2), 0)));
}

#[test]
fn test_disabled_binding_is_ignored() {
    let options = GridOptions::from_toml_str(
        r#"
        [key_bindings]
        select_all = "none"
        begin_edit = "Enter"
        commit_edit = "Ctrl+Enter"
        "#,
    )
    .unwrap();
    let mut grid = grid_with(options, 3);
    click(&mut grid, 1, 0, KeyboardModifiers::NONE);

    assert!(!grid.key_down(Key::A, KeyboardModifiers::CTRL));
    assert_eq!(grid.selection().selected_rows(), vec![0]);
    assert!(grid.key_down(Key::Enter, KeyboardModifiers::NONE));
    assert!(grid.edit_session().is_editing());
}

#[test]
fn test_invalid_binding_fails_construction() {
    let mut options = GridOptions::default();
    options
        .key_bindings
        .insert("select_all".into(), "Ctrl+Nope".into());
    let result = DataGrid::from_options(products(1), columns(), options);
    assert!(matches!(result, Err(GridError::InvalidKeyGesture { .. })));
}

// =============================================================================
// Editing
// =============================================================================

#[test]
fn test_read_only_column_refuses_edit() {
    let mut grid = grid(3);
    click(&mut grid, 0, 1, KeyboardModifiers::NONE);
    assert!(!grid.begin_edit());
    assert!(!grid.key_down(Key::F2, KeyboardModifiers::NONE));
    assert!(!grid.edit_session().is_editing());
}

#[test]
fn test_read_only_grid_refuses_edit() {
    let options = GridOptions {
        is_read_only: true,
        ..Default::default()
    };
    let mut grid = grid_with(options, 3);
    click(&mut grid, 1, 1, KeyboardModifiers::NONE);
    assert!(!grid.begin_edit());
    assert!(!grid.fill_handle_pressed());
}

#[test]
fn test_enter_commits_and_moves_down() {
    let mut grid = grid(3);
    click(&mut grid, 1, 0, KeyboardModifiers::NONE);
    assert!(grid.key_down(Key::F2, KeyboardModifiers::NONE));
    assert!(grid.set_edit_value(99_i64));
    assert!(grid.key_down(Key::Enter, KeyboardModifiers::NONE));

    assert!(!grid.edit_session().is_editing());
    assert_eq!(price(&grid, 0), 99);
    assert_eq!(grid.current_row(), Some(1));
}

#[test]
fn test_escape_restores_committed_cells() {
    let mut grid = grid(3);
    let before = grid.source().item(1).cloned().unwrap();
    click(&mut grid, 1, 1, KeyboardModifiers::NONE);

    assert!(grid.begin_edit());
    grid.set_edit_value(500_i64);
    assert!(grid.commit_edit(EditUnit::Cell).unwrap().is_success());
    assert_eq!(price(&grid, 1), 500);

    assert!(grid.key_down(Key::Escape, KeyboardModifiers::NONE));
    assert!(!grid.edit_session().is_editing());
    assert_eq!(grid.source().item(1), Some(&before));
}

#[test]
fn test_click_on_other_row_commits_edit() {
    let mut grid = grid(4);
    click(&mut grid, 1, 0, KeyboardModifiers::NONE);
    assert!(grid.begin_edit());
    grid.set_edit_value(42_i64);

    let outcome = click(&mut grid, 1, 2, KeyboardModifiers::NONE);
    assert_eq!(outcome, SelectionOutcome::Changed);
    assert!(!grid.edit_session().is_editing());
    assert_eq!(price(&grid, 0), 42);
    assert_eq!(grid.selection().selected_rows(), vec![2]);
}

#[test]
fn test_invalid_value_keeps_editing_and_selection() {
    let mut grid = grid(4);
    let failures = Arc::new(Mutex::new(0));
    let count = failures.clone();
    grid.edit_session()
        .validation_failed
        .connect(move |_| *count.lock() += 1);

    click(&mut grid, 1, 0, KeyboardModifiers::NONE);
    assert!(grid.begin_edit());
    grid.set_edit_value(-5_i64);

    let outcome = click(&mut grid, 1, 2, KeyboardModifiers::NONE);
    assert_eq!(outcome, SelectionOutcome::Unchanged);
    assert_eq!(grid.edit_session().editing_row(), Some(0));
    assert_eq!(grid.selection().selected_rows(), vec![0]);
    assert_eq!(price(&grid, 0), 10);
    assert_eq!(*failures.lock(), 1);
}

#[test]
fn test_deferred_transitions_run_in_order_on_lost_focus() {
    let mut grid = grid(6);
    click(&mut grid, 1, 0, KeyboardModifiers::NONE);
    assert!(grid.begin_edit());
    grid.set_editor_focused(true);
    grid.set_edit_value(42_i64);

    assert_eq!(
        grid.cell_pressed(Some(1), 3, KeyboardModifiers::NONE, Point::ZERO),
        SelectionOutcome::Unchanged
    );
    assert!(grid.key_down(Key::ArrowDown, KeyboardModifiers::NONE));
    assert_eq!(grid.edit_session().pending_actions().count(), 2);
    assert!(grid.edit_session().is_editing());
    assert_eq!(price(&grid, 0), 10);

    assert_eq!(grid.editor_lost_focus(), 2);
    assert!(!grid.edit_session().has_pending());
    assert!(!grid.edit_session().is_editing());
    assert_eq!(price(&grid, 0), 42);
    assert_eq!(grid.current_row(), Some(4));
    assert_eq!(grid.selection().selected_rows(), vec![4]);
}

#[test]
fn test_column_header_click_waits_for_lost_focus() {
    let mut grid = cell_grid(4);
    click(&mut grid, 1, 1, KeyboardModifiers::NONE);
    assert!(grid.begin_edit());
    grid.set_editor_focused(true);
    grid.set_edit_value(55_i64);

    assert_eq!(grid.column_header_pressed(2, KeyboardModifiers::NONE), SelectionOutcome::Unchanged);
    assert_eq!(grid.edit_session().pending_actions().count(), 1);
    assert!(!grid.selection().is_cell_selected(0, 2));

    assert_eq!(grid.editor_lost_focus(), 1);
    assert!(!grid.edit_session().is_editing());
    assert_eq!(price(&grid, 1), 55);
    assert!((0..4).all(|row| grid.selection().is_cell_selected(row, 2)));
    assert!(!grid.selection().is_cell_selected(1, 1));
}

#[test]
fn test_removing_edited_row_discards_session() {
    let mut grid = grid(4);
    let endings = Arc::new(Mutex::new(Vec::new()));
    let log = endings.clone();
    grid.edit_session()
        .edit_ended
        .connect(move |ending| log.lock().push(*ending));

    click(&mut grid, 1, 1, KeyboardModifiers::NONE);
    assert!(grid.begin_edit());
    grid.update_source(|source| {
        source.remove(1);
    });

    assert!(!grid.edit_session().is_editing());
    assert_eq!(*endings.lock(), vec![(1, EditEnding::Discarded)]);
    assert!(matches!(grid.commit_edit(EditUnit::Row), Err(GridError::NoEditSession)));
}

#[test]
fn test_edit_follows_row_when_rows_inserted_above() {
    let mut grid = grid(3);
    click(&mut grid, 1, 1, KeyboardModifiers::NONE);
    assert!(grid.begin_edit());
    grid.set_edit_value(7_i64);
    grid.update_source(|source| {
        source.insert(0, product("new", 1, 1));
    });

    assert_eq!(grid.edit_session().editing_row(), Some(2));
    assert!(grid.commit_edit(EditUnit::Row).unwrap().is_success());
    assert_eq!(price(&grid, 2), 7);
}

// =============================================================================
// Fill
// =============================================================================

fn cell_grid(rows: usize) -> DataGrid<VecItemSource<Product>> {
    let options = GridOptions {
        selection_unit: SelectionUnit::Cell,
        ..Default::default()
    };
    grid_with(options, rows)
}

#[test]
fn test_fill_extends_numeric_series() {
    let mut grid = cell_grid(5);
    click(&mut grid, 1, 0, KeyboardModifiers::NONE);
    click(&mut grid, 1, 1, KeyboardModifiers::SHIFT);
    assert!(grid.fill_handle_pressed());

    let feedback = grid.pointer_moved(Some(GridHit::cell(1, 3)), Point::new(0.0, 60.0));
    assert_eq!(feedback, PointerFeedback::Fill(CellRange::new(0, 3, 1, 1)));
    assert_eq!(grid.pointer_released(), PointerRelease::Fill(2));

    let prices: Vec<i64> = (0..5).map(|row| price(&grid, row)).collect();
    assert_eq!(prices, vec![10, 20, 30, 40, 50]);
    assert_eq!(grid.selection().selection().ranges(), &[CellRange::new(0, 3, 1, 1)]);
}

#[test]
fn test_fill_skips_read_only_columns() {
    let mut grid = cell_grid(3);
    let filled = Arc::new(Mutex::new(Vec::new()));
    let log = filled.clone();
    grid.values_changed.connect(move |range| log.lock().push(*range));

    let source = CellRange::new(0, 0, 0, 1);
    let written = grid.fill_to(source, CellRange::new(0, 2, 0, 1));

    assert_eq!(written, 2);
    assert_eq!(grid.source().item(2).map(|p| p.name.as_str()), Some("item-2"));
    assert_eq!(price(&grid, 2), 10);
    assert_eq!(*filled.lock(), vec![CellRange::new(0, 2, 0, 1)]);
}

#[test]
fn test_fill_refuses_non_rectangular_selection() {
    let mut grid = cell_grid(4);
    click(&mut grid, 1, 0, KeyboardModifiers::NONE);
    click(&mut grid, 2, 2, KeyboardModifiers::CTRL);
    assert!(!grid.fill_handle_pressed());
}

#[test]
fn test_fill_shrink_writes_nothing() {
    let mut grid = cell_grid(4);
    click(&mut grid, 1, 0, KeyboardModifiers::NONE);
    click(&mut grid, 2, 3, KeyboardModifiers::SHIFT);
    assert!(grid.fill_handle_pressed());
    let feedback = grid.pointer_moved(Some(GridHit::cell(2, 2)), Point::new(0.0, 20.0));
    assert_eq!(feedback, PointerFeedback::Fill(CellRange::new(2, 3, 2, 2)));
}

#[test]
fn test_fill_target_is_clamped_to_grid() {
    let mut grid = cell_grid(3);
    click(&mut grid, 1, 0, KeyboardModifiers::NONE);
    assert!(grid.fill_handle_pressed());
    let feedback = grid.pointer_moved(Some(GridHit::cell(50, 2)), Point::new(60.0, 40.0));
    assert_eq!(feedback, PointerFeedback::Fill(CellRange::new(0, 0, 1, 1)));
    assert_eq!(grid.pointer_released(), PointerRelease::Fill(0));

    let written = grid.fill_to(CellRange::new(0, 0, 1, 1), CellRange::new(0, usize::MAX, 1, 1));
    assert_eq!(written, 2);
    assert_eq!((0..3).map(|row| price(&grid, row)).collect::<Vec<_>>(), vec![10, 10, 10]);
    assert_eq!(grid.selection().selection().ranges(), &[CellRange::new(0, 2, 1, 1)]);
}

// =============================================================================
// Batching
// =============================================================================

#[test]
fn test_unbalanced_end_update_is_an_error() {
    let mut grid = grid(2);
    assert!(matches!(grid.end_update(), Err(GridError::UnbalancedUpdate)));
}

#[test]
fn test_batched_changes_apply_once() {
    let mut grid = grid(2);
    let layouts = Arc::new(Mutex::new(0));
    let count = layouts.clone();
    grid.layout_changed.connect(move |_| *count.lock() += 1);

    grid.begin_update();
    grid.update_source(|source| source.push(product("a", 1, 1)));
    grid.update_source(|source| source.push(product("b", 2, 2)));
    assert_eq!(grid.slots().row_count(), 2);
    grid.end_update().unwrap();

    assert_eq!(grid.slots().row_count(), 4);
    assert_eq!(*layouts.lock(), 1);
}

#[test]
fn test_removed_rows_leave_selection() {
    let mut grid = grid(5);
    click(&mut grid, 0, 1, KeyboardModifiers::NONE);
    click(&mut grid, 0, 3, KeyboardModifiers::SHIFT);
    grid.update_source(|source| {
        source.remove(2);
    });
    assert_eq!(grid.selection().selected_rows(), vec![1, 2]);
    assert_eq!(grid.slots().slot_count(), 4);
}
