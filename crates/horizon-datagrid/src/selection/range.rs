//! Cell coordinates and rectangular cell ranges.

use std::fmt;

/// A cell address: a column and a slot.
///
/// `column == None` addresses the row as a whole (no column selected).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoordinate {
    /// Column index, or `None` for row-only addressing.
    pub column: Option<usize>,
    /// Slot in the slot space.
    pub slot: usize,
}

impl CellCoordinate {
    /// Address a cell.
    pub const fn new(column: usize, slot: usize) -> Self {
        Self {
            column: Some(column),
            slot,
        }
    }

    /// Address a whole row.
    pub const fn row(slot: usize) -> Self {
        Self { column: None, slot }
    }

    /// Same slot, different column.
    pub fn with_column(self, column: Option<usize>) -> Self {
        Self { column, ..self }
    }
}

impl fmt::Display for CellCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column {
            Some(column) => write!(f, "({column}, {})", self.slot),
            None => write!(f, "(-, {})", self.slot),
        }
    }
}

/// An inclusive rectangle of cells, in row indices and column indices.
///
/// Constructors normalize so that `start <= end` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    /// First row (inclusive).
    pub start_row: usize,
    /// Last row (inclusive).
    pub end_row: usize,
    /// First column (inclusive).
    pub start_column: usize,
    /// Last column (inclusive).
    pub end_column: usize,
}

impl CellRange {
    /// Create a range spanning both corners, in any order.
    pub fn new(row_a: usize, row_b: usize, column_a: usize, column_b: usize) -> Self {
        Self {
            start_row: row_a.min(row_b),
            end_row: row_a.max(row_b),
            start_column: column_a.min(column_b),
            end_column: column_a.max(column_b),
        }
    }

    /// A single cell.
    pub fn cell(row: usize, column: usize) -> Self {
        Self::new(row, row, column, column)
    }

    /// Returns true if the cell lies in the range.
    pub fn contains(&self, row: usize, column: usize) -> bool {
        row >= self.start_row
            && row <= self.end_row
            && column >= self.start_column
            && column <= self.end_column
    }

    /// Returns true if `other` lies entirely in this range.
    pub fn contains_range(&self, other: &CellRange) -> bool {
        self.contains(other.start_row, other.start_column)
            && self.contains(other.end_row, other.end_column)
    }

    /// Returns true if the ranges share at least one cell.
    pub fn intersects(&self, other: &CellRange) -> bool {
        self.start_row <= other.end_row
            && other.start_row <= self.end_row
            && self.start_column <= other.end_column
            && other.start_column <= self.end_column
    }

    /// The shared cells, if any.
    pub fn intersection(&self, other: &CellRange) -> Option<CellRange> {
        self.intersects(other).then(|| CellRange {
            start_row: self.start_row.max(other.start_row),
            end_row: self.end_row.min(other.end_row),
            start_column: self.start_column.max(other.start_column),
            end_column: self.end_column.min(other.end_column),
        })
    }

    /// This range minus `other`, as at most four disjoint pieces.
    ///
    /// Pieces are the full-width bands above and below the overlap, then the
    /// parts left and right of it.
    pub fn subtract(&self, other: &CellRange) -> Vec<CellRange> {
        let Some(cut) = self.intersection(other) else {
            return vec![*self];
        };
        let mut pieces = Vec::with_capacity(4);
        if cut.start_row > self.start_row {
            pieces.push(CellRange {
                end_row: cut.start_row - 1,
                ..*self
            });
        }
        if cut.end_row < self.end_row {
            pieces.push(CellRange {
                start_row: cut.end_row + 1,
                ..*self
            });
        }
        if cut.start_column > self.start_column {
            pieces.push(CellRange {
                start_row: cut.start_row,
                end_row: cut.end_row,
                start_column: self.start_column,
                end_column: cut.start_column - 1,
            });
        }
        if cut.end_column < self.end_column {
            pieces.push(CellRange {
                start_row: cut.start_row,
                end_row: cut.end_row,
                start_column: cut.end_column + 1,
                end_column: self.end_column,
            });
        }
        pieces
    }

    /// The smallest range containing both.
    pub fn union_bounds(&self, other: &CellRange) -> CellRange {
        CellRange {
            start_row: self.start_row.min(other.start_row),
            end_row: self.end_row.max(other.end_row),
            start_column: self.start_column.min(other.start_column),
            end_column: self.end_column.max(other.end_column),
        }
    }

    /// Number of rows spanned.
    pub fn row_count(&self) -> usize {
        self.end_row - self.start_row + 1
    }

    /// Number of columns spanned.
    pub fn column_count(&self) -> usize {
        self.end_column - self.start_column + 1
    }

    /// Number of cells.
    pub fn cell_count(&self) -> usize {
        self.row_count() * self.column_count()
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.start_row..=self.end_row)
            .flat_map(move |row| (self.start_column..=self.end_column).map(move |column| (row, column)))
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows {}..={}, columns {}..={}",
            self.start_row, self.end_row, self.start_column, self.end_column
        )
    }
}
