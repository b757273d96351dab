//! Fill handle: target range and per-cell values.
//!
//! Dragging the fill handle of a selected range either grows the range
//! outward, with each axis growing on its own, or shrinks it back toward
//! the bottom-right corner when the pointer re-enters the source.
//!
//! ```text
//!   source (2..3, 2..3), pointer at (1, 1)      result (1..3, 1..3)
//!
//!        0 1 2 3                                   0 1 2 3
//!     0  . . . .                                0  . . . .
//!     1  . * . .                                1  . # # #
//!     2  . . S S                                2  . # S S
//!     3  . . S S                                3  . # S S
//! ```
//!
//! Values then propagate along the axis each cell was reached by. A run of
//! at least two numbers with a constant step extrapolates; anything else
//! repeats the source cyclically.

use horizon_datagrid_core::PerfSpan;
use horizon_datagrid_core::logging::{span_names, targets};

use crate::model::CellValue;
use crate::selection::CellRange;

/// One cell written by a fill.
#[derive(Debug, Clone, PartialEq)]
pub struct FillCell {
    pub row: usize,
    pub column: usize,
    pub value: CellValue,
}

/// The range a fill drag covers when the pointer is over
/// `(target_row, target_column)`.
///
/// The result always contains the source unless the target is strictly
/// inside it, in which case the result runs from the target to the
/// source's end corner.
///
/// # Example
///
/// ```
/// use horizon_datagrid::fill::compute_target_range;
/// use horizon_datagrid::selection::CellRange;
///
/// let source = CellRange::new(0, 1, 2, 3);
/// assert_eq!(compute_target_range(source, 2, 0), CellRange::new(0, 2, 0, 3));
/// ```
pub fn compute_target_range(source: CellRange, target_row: usize, target_column: usize) -> CellRange {
    if source.contains(target_row, target_column) {
        return CellRange::new(target_row, source.end_row, target_column, source.end_column);
    }
    let (start_row, end_row) = grow(source.start_row, source.end_row, target_row);
    let (start_column, end_column) = grow(source.start_column, source.end_column, target_column);
    CellRange::new(start_row, end_row, start_column, end_column)
}

fn grow(start: usize, end: usize, target: usize) -> (usize, usize) {
    (start.min(target), end.max(target))
}

/// Values for every cell of `target` outside `source`.
///
/// `read(row, column)` returns the value of a source cell. Cells reached by
/// growing rows take their column's run; cells reached by growing columns
/// take their row's run; corner cells (outside on both axes) wrap-copy on
/// both offsets. Cells are returned row-major.
pub fn fill_values<F>(source: CellRange, target: CellRange, mut read: F) -> Vec<FillCell>
where
    F: FnMut(usize, usize) -> CellValue,
{
    let _span = PerfSpan::new(span_names::FILL);

    let height = source.row_count();
    let width = source.column_count();

    let mut column_runs: Vec<Option<Run>> = vec![None; width];
    let mut row_runs: Vec<Option<Run>> = vec![None; height];
    let mut cells = Vec::new();

    for (row, column) in target.cells() {
        let in_rows = (source.start_row..=source.end_row).contains(&row);
        let in_columns = (source.start_column..=source.end_column).contains(&column);
        let value = match (in_rows, in_columns) {
            (true, true) => continue,
            (false, true) => {
                let run = column_runs[column - source.start_column].get_or_insert_with(|| {
                    Run::collect((source.start_row..=source.end_row).map(|r| read(r, column)))
                });
                run.value_at(offset(row, source.start_row))
            }
            (true, false) => {
                let run = row_runs[row - source.start_row].get_or_insert_with(|| {
                    Run::collect((source.start_column..=source.end_column).map(|c| read(row, c)))
                });
                run.value_at(offset(column, source.start_column))
            }
            (false, false) => read(
                source.start_row + wrap(offset(row, source.start_row), height),
                source.start_column + wrap(offset(column, source.start_column), width),
            ),
        };
        cells.push(FillCell { row, column, value });
    }

    tracing::debug!(
        target: targets::FILL,
        %source,
        %target,
        cells = cells.len(),
        "fill values computed"
    );
    cells
}

fn offset(position: usize, start: usize) -> i64 {
    position as i64 - start as i64
}

fn wrap(offset: i64, len: usize) -> usize {
    offset.rem_euclid(len as i64) as usize
}

// =============================================================================
// Series detection
// =============================================================================

/// An arithmetic progression anchored at the first source cell.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Series {
    Integer { first: i64, step: i64 },
    Number { first: f64, step: f64 },
}

impl Series {
    /// Detect a constant-step run of at least two numbers.
    ///
    /// All-integer runs stay integers; a mix with floats becomes a float
    /// series.
    fn detect(values: &[CellValue]) -> Option<Self> {
        if values.len() < 2 || !values.iter().all(CellValue::is_numeric) {
            return None;
        }

        let integers: Option<Vec<i64>> = values.iter().map(CellValue::as_i64).collect();
        if let Some(integers) = integers {
            let step = integers[1].checked_sub(integers[0])?;
            let constant = integers
                .windows(2)
                .all(|pair| pair[1].checked_sub(pair[0]) == Some(step));
            return constant.then_some(Series::Integer {
                first: integers[0],
                step,
            });
        }

        let numbers: Vec<f64> = values.iter().filter_map(CellValue::as_f64).collect();
        let step = numbers[1] - numbers[0];
        if !step.is_finite() {
            return None;
        }
        let tolerance = 1e-9 * numbers.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
        let constant = numbers
            .windows(2)
            .all(|pair| ((pair[1] - pair[0]) - step).abs() <= tolerance);
        constant.then_some(Series::Number {
            first: numbers[0],
            step,
        })
    }

    /// The `index`-th term, counting the first source cell as zero.
    fn at(self, index: i64) -> CellValue {
        match self {
            Series::Integer { first, step } => step
                .checked_mul(index)
                .and_then(|delta| first.checked_add(delta))
                .map_or_else(
                    || CellValue::Number(first as f64 + step as f64 * index as f64),
                    CellValue::Integer,
                ),
            Series::Number { first, step } => CellValue::Number(first + step * index as f64),
        }
    }
}

/// The source values along one axis, with their series if they form one.
#[derive(Debug, Clone)]
struct Run {
    values: Vec<CellValue>,
    series: Option<Series>,
}

impl Run {
    fn collect(values: impl Iterator<Item = CellValue>) -> Self {
        let values: Vec<CellValue> = values.collect();
        let series = Series::detect(&values);
        Self { values, series }
    }

    fn value_at(&self, index: i64) -> CellValue {
        match self.series {
            Some(series) => series.at(index),
            None => self.values[wrap(index, self.values.len())].clone(),
        }
    }
}
