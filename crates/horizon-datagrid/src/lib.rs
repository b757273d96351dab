//! Horizon DataGrid - the addressing, selection and edit engine behind a
//! virtualized, editable data grid.
//!
//! The crate holds no rendering code. A presenter asks the [`DataGrid`]
//! which slots are visible, forwards pointer and keyboard input to it, and
//! reads back selection and edit state when it paints.
//!
//! # Modules
//!
//! - [`slots`] - slot space: data rows, group headers and collapsed ranges
//! - [`model`] - item sources, tree flattening, columns and validators
//! - [`selection`] - current cell, anchor and selection algebra
//! - [`edit`] - begin / commit / cancel with snapshot and restore
//! - [`fill`] - fill-handle ranges and values
//! - [`reorder`] - row drag-reorder
//! - [`input`] - key gestures and bindings
//! - [`options`] - configuration from TOML or JSON
//!
//! # Example
//!
//! ```
//! use horizon_datagrid::prelude::*;
//!
//! #[derive(Debug, Clone)]
//! struct Order {
//!     customer: String,
//!     quantity: i64,
//! }
//!
//! let source = VecItemSource::new(vec![
//!     Order { customer: "Acme".into(), quantity: 3 },
//!     Order { customer: "Globex".into(), quantity: 5 },
//! ]);
//! let columns = vec![
//!     Column::new("Customer", |o: &Order| CellValue::from(o.customer.as_str())),
//!     Column::new("Quantity", |o: &Order| CellValue::Integer(o.quantity))
//!         .with_setter(|o: &mut Order, v| v.as_i64().map(|q| o.quantity = q).is_some()),
//! ];
//!
//! let mut grid = DataGrid::new(source, columns);
//! grid.cell_pressed(Some(1), 0, KeyboardModifiers::NONE, Point::ZERO);
//! grid.pointer_released();
//!
//! assert!(grid.begin_edit());
//! grid.set_edit_value(7_i64);
//! assert!(grid.commit_edit(EditUnit::Row)?.is_success());
//! assert_eq!(grid.source().iter().next().map(|o| o.quantity), Some(7));
//! # Ok::<(), horizon_datagrid::GridError>(())
//! ```

pub mod edit;
pub mod error;
pub mod fill;
pub mod grid;
pub mod input;
pub mod model;
pub mod options;
pub mod prelude;
pub mod reorder;
pub mod selection;
pub mod slots;

pub use error::{GridError, Result};
pub use grid::{DataGrid, GridHit, PointerFeedback, PointerRelease};
pub use options::GridOptions;

pub use horizon_datagrid_core::{DragThreshold, Point, Signal};
