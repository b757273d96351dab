//! Prelude module for Horizon DataGrid.
//!
//! This module re-exports the most commonly used types for convenient importing:
//!
//! ```ignore
//! use horizon_datagrid::prelude::*;
//! ```
//!
//! This provides access to:
//! - The grid facade (`DataGrid`, `GridOptions`, `GridHit`)
//! - Item sources and columns (`VecItemSource`, `HierarchicalAdapter`, `Column`)
//! - Selection state (`SelectionMode`, `SelectionUnit`, `CellRange`)
//! - Editing (`EditUnit`, `CommitOutcome`)
//! - Input (`Key`, `KeyboardModifiers`, `GridAction`)

// ============================================================================
// Grid Facade
// ============================================================================

pub use crate::grid::{DataGrid, GridHit, PointerFeedback, PointerRelease};
pub use crate::options::GridOptions;
pub use crate::{GridError, Point, Signal};

// ============================================================================
// Items and Columns
// ============================================================================

pub use crate::model::{
    CellValue, Column, EditableItem, HierarchicalAdapter, ItemId, ItemSource, RangeValidator,
    RegexValidator, RequiredValidator, TreeNavigation, ValidationError, VecItemSource,
    editable_item,
};

// ============================================================================
// Slots and Grouping
// ============================================================================

pub use crate::slots::{GroupDescription, RowGroupInfo, SlotSpace};

// ============================================================================
// Selection
// ============================================================================

pub use crate::selection::{
    CellCoordinate, CellRange, SelectionMode, SelectionOutcome, SelectionUnit,
};

// ============================================================================
// Editing, Fill and Reorder
// ============================================================================

pub use crate::edit::{CommitOutcome, EditEnding, EditUnit};
pub use crate::reorder::{DropOutcome, DropPosition, ReorderHandle, ReorderHandler};

// ============================================================================
// Input
// ============================================================================

pub use crate::input::{GridAction, GridKeyBindings, Key, KeyGesture, KeyboardModifiers};
