//! Core systems for Horizon DataGrid.
//!
//! This crate provides the foundational pieces the grid engine is built on:
//!
//! - **Signal/Slot System**: Type-safe change notification
//! - **Deferred Queue**: FIFO of actions waiting for a focus release
//! - **Geometry**: Pointer positions and drag thresholds
//! - **Logging**: `tracing` targets and helper macros
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_datagrid_core::Signal;
//!
//! let selection_changed = Signal::<Vec<usize>>::new();
//!
//! let conn_id = selection_changed.connect(|rows| {
//!     println!("{} rows selected", rows.len());
//! });
//!
//! selection_changed.emit(vec![1, 2, 3]);
//! selection_changed.disconnect(conn_id);
//! ```
//!
//! # Deferred Queue Example
//!
//! ```
//! use horizon_datagrid_core::DeferredQueue;
//!
//! let mut queue = DeferredQueue::new();
//! queue.post("commit");
//! queue.post("cancel");
//!
//! // Later, when the focused editor reports it lost focus:
//! for action in queue.drain() {
//!     println!("running {action}");
//! }
//! ```

pub mod geometry;
pub mod logging;
pub mod signal;
mod task;

pub use geometry::{DragThreshold, Point};
pub use logging::PerfSpan;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
pub use task::{DeferredId, DeferredQueue};
