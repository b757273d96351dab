//! Data side of the grid: item sources, columns, values and validation.
//!
//! The engine never owns domain types directly. It reaches them through:
//!
//! - [`ItemSource`]: an ordered, index-addressable collection with stable
//!   [`ItemId`]s and a change log ([`VecItemSource`] and
//!   [`HierarchicalAdapter`] implement it)
//! - [`Column`]: typed get/set of one field as a [`CellValue`], with a
//!   read-only flag and [`Validator`]s
//! - [`EditableItem`]: an optional capability of items that manage their own
//!   edit transactions
//!
//! # Architecture Overview
//!
//! ```text
//! ┌──────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  ItemSource  │────>│ take_changes│────>│  DataGrid   │
//! │ (Vec / tree) │     │             │     │ (slots etc.)│
//! └──────────────┘     └─────────────┘     └─────────────┘
//!        │                                       │
//!        │          ┌─────────────┐              │
//!        └─────────>│  Column<T>  │<─────────────┘
//!                   │  CellValue  │
//!                   └─────────────┘
//! ```

mod column;
mod hierarchy;
mod source;
mod validator;
mod value;

pub use column::Column;
pub use hierarchy::{FlatChange, HierarchicalAdapter, HierarchicalNode, NodeId, TreeNavigation};
pub use source::{
    CollectionChange, EditableAccessor, EditableItem, ItemId, ItemSource, VecItemSource,
    editable_item,
};
pub use validator::{
    CustomValidator, RangeValidator, RegexValidator, RequiredValidator, ValidationError,
    ValidationState, Validator,
};
pub use value::CellValue;
