//! The selected rows and cell ranges.

use std::collections::{BTreeSet, HashSet};

use super::range::CellRange;

/// Selected rows plus selected cell ranges.
///
/// Rows are kept in ascending order (the order the grid shows them) with a
/// hash set beside them for constant-time containment. Cell ranges are kept
/// pairwise disjoint: adding a range only adds the part not already covered,
/// and removing one splits whatever it overlaps.
///
/// Header selections are recorded separately so a column deselect can leave
/// the cells of an independently selected row header in place.
///
/// Equality compares what is selected, not how the ranges happen to be cut.
#[derive(Debug, Clone, Default)]
pub struct SelectionSet {
    rows: Vec<usize>,
    row_lookup: HashSet<usize>,
    ranges: Vec<CellRange>,
    header_rows: BTreeSet<usize>,
    header_columns: BTreeSet<usize>,
}

impl SelectionSet {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.ranges.is_empty()
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.row_lookup.clear();
        self.ranges.clear();
        self.header_rows.clear();
        self.header_columns.clear();
    }

    // =========================================================================
    // Rows
    // =========================================================================

    /// Selected rows in ascending order.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// Number of selected rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if `row` is selected.
    pub fn contains_row(&self, row: usize) -> bool {
        self.row_lookup.contains(&row)
    }

    /// Select `row`. Returns false if it already was.
    pub fn add_row(&mut self, row: usize) -> bool {
        if !self.row_lookup.insert(row) {
            return false;
        }
        let position = self.rows.partition_point(|&r| r < row);
        self.rows.insert(position, row);
        true
    }

    /// Deselect `row`. Returns false if it was not selected.
    pub fn remove_row(&mut self, row: usize) -> bool {
        if !self.row_lookup.remove(&row) {
            return false;
        }
        if let Ok(position) = self.rows.binary_search(&row) {
            self.rows.remove(position);
        }
        true
    }

    // =========================================================================
    // Cell ranges
    // =========================================================================

    /// The disjoint cell ranges.
    pub fn ranges(&self) -> &[CellRange] {
        &self.ranges
    }

    /// Returns true if the cell is covered by a range.
    pub fn contains_cell(&self, row: usize, column: usize) -> bool {
        self.ranges.iter().any(|range| range.contains(row, column))
    }

    /// Returns true if every cell of `range` is covered.
    pub fn contains_range(&self, range: &CellRange) -> bool {
        let mut rest = vec![*range];
        for existing in &self.ranges {
            rest = rest.iter().flat_map(|piece| piece.subtract(existing)).collect();
            if rest.is_empty() {
                return true;
            }
        }
        rest.is_empty()
    }

    /// Cover `range`, adding only the cells not yet covered.
    pub fn add_range(&mut self, range: CellRange) {
        let mut pieces = vec![range];
        for existing in &self.ranges {
            pieces = pieces.iter().flat_map(|piece| piece.subtract(existing)).collect();
            if pieces.is_empty() {
                return;
            }
        }
        self.ranges.extend(pieces);
    }

    /// Uncover `range`. Returns true if any cell was removed.
    pub fn remove_range(&mut self, range: CellRange) -> bool {
        if !self.ranges.iter().any(|existing| existing.intersects(&range)) {
            return false;
        }
        self.ranges = self
            .ranges
            .iter()
            .flat_map(|existing| existing.subtract(&range))
            .collect();
        true
    }

    /// Every covered cell as `(row, column)`, sorted row-major.
    pub fn cells(&self) -> Vec<(usize, usize)> {
        let mut cells: Vec<_> = self.ranges.iter().flat_map(CellRange::cells).collect();
        cells.sort_unstable();
        cells
    }

    /// Number of covered cells.
    pub fn cell_count(&self) -> usize {
        self.ranges.iter().map(CellRange::cell_count).sum()
    }

    /// Rows touched by at least one range, ascending.
    pub fn rows_with_cells(&self) -> Vec<usize> {
        let rows: BTreeSet<usize> = self
            .ranges
            .iter()
            .flat_map(|range| range.start_row..=range.end_row)
            .collect();
        rows.into_iter().collect()
    }

    // =========================================================================
    // Headers
    // =========================================================================

    /// Returns true if the row header of `row` is selected.
    pub fn is_row_header_selected(&self, row: usize) -> bool {
        self.header_rows.contains(&row)
    }

    /// Returns true if the column header of `column` is selected.
    pub fn is_column_header_selected(&self, column: usize) -> bool {
        self.header_columns.contains(&column)
    }

    /// Rows whose header is selected, ascending.
    pub fn header_rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.header_rows.iter().copied()
    }

    /// Columns whose header is selected, ascending.
    pub fn header_columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.header_columns.iter().copied()
    }

    pub(crate) fn set_row_header(&mut self, row: usize, selected: bool) {
        if selected {
            self.header_rows.insert(row);
        } else {
            self.header_rows.remove(&row);
        }
    }

    pub(crate) fn set_column_header(&mut self, column: usize, selected: bool) {
        if selected {
            self.header_columns.insert(column);
        } else {
            self.header_columns.remove(&column);
        }
    }

    // =========================================================================
    // Structural adjustments
    // =========================================================================

    /// Shift for `count` rows inserted before `row`. Ranges spanning the
    /// insertion point are split around the new rows.
    pub(crate) fn rows_inserted(&mut self, row: usize, count: usize) {
        if count == 0 {
            return;
        }
        let shift = |r: usize| if r >= row { r + count } else { r };
        self.rebuild_rows(|r| Some(shift(r)));
        self.header_rows = self.header_rows.iter().map(|&r| shift(r)).collect();

        let mut ranges = Vec::with_capacity(self.ranges.len() + 1);
        for range in self.ranges.drain(..) {
            if range.start_row >= row {
                ranges.push(CellRange {
                    start_row: range.start_row + count,
                    end_row: range.end_row + count,
                    ..range
                });
            } else if range.end_row >= row {
                ranges.push(CellRange {
                    end_row: row - 1,
                    ..range
                });
                ranges.push(CellRange {
                    start_row: row + count,
                    end_row: range.end_row + count,
                    ..range
                });
            } else {
                ranges.push(range);
            }
        }
        self.ranges = ranges;
    }

    /// Drop rows `row..row + count` and close the gap.
    pub(crate) fn rows_removed(&mut self, row: usize, count: usize) {
        if count == 0 {
            return;
        }
        let end = row + count;
        let map = |r: usize| match r {
            r if r < row => Some(r),
            r if r >= end => Some(r - count),
            _ => None,
        };
        self.rebuild_rows(map);
        self.header_rows = self.header_rows.iter().filter_map(|&r| map(r)).collect();

        let mut ranges = Vec::with_capacity(self.ranges.len() + 1);
        for range in self.ranges.drain(..) {
            if range.start_row < row {
                ranges.push(CellRange {
                    end_row: range.end_row.min(row - 1),
                    ..range
                });
            }
            if range.end_row >= end {
                ranges.push(CellRange {
                    start_row: range.start_row.max(end) - count,
                    end_row: range.end_row - count,
                    ..range
                });
            }
        }
        self.ranges = ranges;
    }

    /// Drop columns at or past `column_count`.
    pub(crate) fn truncate_columns(&mut self, column_count: usize) {
        self.header_columns.retain(|&c| c < column_count);
        let Some(last) = column_count.checked_sub(1) else {
            self.ranges.clear();
            return;
        };
        self.ranges.retain(|range| range.start_column <= last);
        for range in &mut self.ranges {
            range.end_column = range.end_column.min(last);
        }
    }

    fn rebuild_rows<F: Fn(usize) -> Option<usize>>(&mut self, map: F) {
        let rows: Vec<usize> = self.rows.iter().filter_map(|&r| map(r)).collect();
        self.row_lookup = rows.iter().copied().collect();
        self.rows = rows;
    }
}

impl PartialEq for SelectionSet {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows
            && self.header_rows == other.header_rows
            && self.header_columns == other.header_columns
            && self.cell_count() == other.cell_count()
            && self.cells() == other.cells()
    }
}

impl Eq for SelectionSet {}
