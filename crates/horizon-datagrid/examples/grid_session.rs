//! Horizon DataGrid Session Example
//!
//! Drives a grid the way a presenter would, without any rendering:
//! - Loads options from TOML
//! - Groups rows and collapses a group
//! - Selects with pointer and keyboard
//! - Edits a cell, then drags the fill handle
//! - Reorders rows by dragging
//!
//! Run with: RUST_LOG=horizon_datagrid=debug cargo run -p horizon-datagrid --example grid_session

use horizon_datagrid::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Task {
    project: &'static str,
    title: String,
    estimate: i64,
}

fn task(project: &'static str, title: &str, estimate: i64) -> Task {
    Task {
        project,
        title: title.to_string(),
        estimate,
    }
}

const OPTIONS: &str = r#"
selection_unit = "cell"
can_user_reorder_rows = true
reorder_handle = "row_header"
treat_groups_as_nodes = true

[key_bindings]
begin_edit = "Enter"
commit_edit = "Ctrl+Enter"
"#;

fn columns() -> Vec<Column<Task>> {
    vec![
        Column::new("Project", |t: &Task| CellValue::from(t.project)),
        Column::new("Title", |t: &Task| CellValue::from(t.title.as_str()))
            .with_setter(|t: &mut Task, v: CellValue| match v {
                CellValue::Text(text) => {
                    t.title = text;
                    true
                }
                _ => false,
            })
            .with_validator(RequiredValidator),
        Column::new("Estimate", |t: &Task| CellValue::Integer(t.estimate))
            .with_setter(|t: &mut Task, v: CellValue| v.as_i64().map(|e| t.estimate = e).is_some())
            .with_validator(RangeValidator::non_negative()),
    ]
}

fn print_grid(grid: &DataGrid<VecItemSource<Task>>) {
    let slots = grid.slots();
    for slot in grid.visible_slots(0, slots.visible_count()) {
        if let Some(group) = slots.group_info(slot) {
            let marker = if group.is_expanded { "-" } else { "+" };
            println!("{:indent$}[{marker}] {}", "", group.key, indent = group.level * 2);
            continue;
        }
        let Some(row) = slots.row_index_from_slot(slot) else {
            continue;
        };
        let cells: Vec<String> = (0..grid.columns().len())
            .map(|column| {
                let value = grid.cell_value(row, column).unwrap_or_default();
                if grid.selection().is_cell_selected(row, column) {
                    format!("*{value}*")
                } else {
                    value.to_string()
                }
            })
            .collect();
        println!("      {}", cells.join(" | "));
    }
    println!();
}

fn main() -> horizon_datagrid::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let source = VecItemSource::new(vec![
        task("atlas", "schema", 3),
        task("atlas", "migrations", 5),
        task("atlas", "rollout", 2),
        task("beacon", "design", 8),
        task("beacon", "review", 1),
    ]);
    let options = GridOptions::from_toml_str(OPTIONS)?;
    let mut grid = DataGrid::from_options(source, columns(), options)?;
    grid.apply_grouping(vec![GroupDescription::new("Project", |t: &Task| {
        CellValue::from(t.project)
    })]);

    grid.layout_changed
        .connect(|_| tracing::info!("layout changed"));
    grid.values_changed
        .connect(|range| tracing::info!(%range, "values filled"));

    println!("Grouped:");
    print_grid(&grid);

    // Select the two estimates of the first rows, then extend with the keyboard.
    grid.cell_pressed(Some(2), 1, KeyboardModifiers::NONE, Point::ZERO);
    grid.pointer_released();
    grid.key_down(Key::ArrowDown, KeyboardModifiers::SHIFT);
    println!("Selected estimates of rows {:?}:", grid.selection().selected_rows());
    print_grid(&grid);

    // Edit the current cell and commit with the rebound gesture.
    grid.key_down(Key::Enter, KeyboardModifiers::NONE);
    grid.set_edit_value(4_i64);
    grid.key_down(Key::Enter, KeyboardModifiers::CTRL);

    // Drag the fill handle from the first two estimates down one row.
    grid.cell_pressed(Some(2), 1, KeyboardModifiers::NONE, Point::ZERO);
    grid.pointer_released();
    grid.cell_pressed(Some(2), 2, KeyboardModifiers::SHIFT, Point::ZERO);
    grid.pointer_released();
    if grid.fill_handle_pressed() {
        grid.pointer_moved(Some(GridHit::cell(2, 3)), Point::new(0.0, 24.0));
        if let PointerRelease::Fill(written) = grid.pointer_released() {
            println!("Fill wrote {written} cell(s):");
        }
    }
    print_grid(&grid);

    // Move "review" above "design" by dragging its row header.
    grid.row_header_pressed(6, KeyboardModifiers::NONE, Point::ZERO);
    grid.pointer_moved(Some(GridHit::row(5, 0.1)), Point::new(0.0, -24.0));
    if let PointerRelease::Reorder(outcome) = grid.pointer_released() {
        println!("Reorder moved rows: {}", outcome.is_moved());
    }

    // Collapse the first project from its header.
    grid.cell_pressed(None, 0, KeyboardModifiers::NONE, Point::ZERO);
    grid.pointer_released();
    grid.key_down(Key::ArrowLeft, KeyboardModifiers::NONE);
    println!("Final:");
    print_grid(&grid);

    Ok(())
}
