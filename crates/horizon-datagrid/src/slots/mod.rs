//! The virtualized row address space.
//!
//! Every row-like unit a grid can show occupies one *slot*: data rows and
//! group headers alike. Rows under a collapsed group keep their slots; the
//! [`CollapsedRangeTable`] records which slots are hidden so the presenter
//! can skip them.
//!
//! # Key Types
//!
//! - [`SlotSpace`] - slot ↔ row index and slot ↔ visible ordinal mapping
//! - [`CollapsedRangeTable`] - coalesced hidden intervals with prefix counts
//! - [`RowGroupInfo`] - one group header and the extent of its rows
//! - [`GroupDescription`] - one grouping level, used by [`build_groups`]

mod collapsed;
mod group;
mod space;

pub use collapsed::{CollapsedRangeTable, SlotRange};
pub use group::{GroupDescription, RowGroupInfo, build_groups};
pub use space::SlotSpace;
