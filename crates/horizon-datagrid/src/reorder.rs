//! Drag-to-reorder for rows.
//!
//! A press on the configured drag affordance arms a *pending* drag. Pointer
//! capture is taken only once the pointer travels past the drag threshold,
//! so a plain click on a row still selects it. When the drag starts, the
//! controller snapshots the dragged rows into a [`DragInfo`] that is reused
//! for the whole gesture.
//!
//! While dragging, the row under the pointer and the pointer's vertical
//! position inside it decide the [`DropPosition`]:
//!
//! ```text
//!   ┌───────────────────┐  0.0
//!   │      Before       │
//!   ├ ─ ─ ─ ─ ─ ─ ─ ─ ─ ┤  (1 - band) / 2     only when the source
//!   │      Inside       │                     supports nesting
//!   ├ ─ ─ ─ ─ ─ ─ ─ ─ ─ ┤  (1 + band) / 2
//!   │      After        │
//!   └───────────────────┘  1.0
//! ```
//!
//! The collection mutation itself belongs to a [`ReorderHandler`]. A drop
//! onto the new-item placeholder is refused before the handler is asked.

use horizon_datagrid_core::logging::{span_names, targets};
use horizon_datagrid_core::{DragThreshold, PerfSpan, Point, Signal};
use serde::{Deserialize, Serialize};

use crate::model::{ItemId, ItemSource};

/// Where a press must land to start a row drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReorderHandle {
    /// Anywhere on the row's cells (default).
    #[default]
    Row,
    /// The row header.
    RowHeader,
    /// A dedicated drag handle inside the row.
    DragHandle,
}

/// The part of a row a press landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressPart {
    /// A data cell.
    Cell,
    /// The row header.
    RowHeader,
    /// The drag handle.
    DragHandle,
}

impl ReorderHandle {
    pub(crate) fn accepts(self, part: PressPart) -> bool {
        matches!(
            (self, part),
            (ReorderHandle::Row, PressPart::Cell)
                | (ReorderHandle::RowHeader, PressPart::RowHeader)
                | (ReorderHandle::DragHandle, PressPart::DragHandle)
        )
    }
}

/// Where dragged rows go relative to the target row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPosition {
    Before,
    After,
    /// As children of the target (nesting sources only).
    Inside,
}

/// The rows being dragged, captured once when the drag starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragInfo {
    /// Identities of the dragged items, in row order.
    pub items: Vec<ItemId>,
    /// Row indices of the dragged items when the drag started.
    pub source_indices: Vec<usize>,
    /// Whether the dragged rows are the grid's whole selection.
    pub is_selection: bool,
}

/// A row under the pointer during a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowHit {
    /// Row index under the pointer.
    pub row: usize,
    /// Vertical pointer position inside the row, 0.0 at the top edge and
    /// 1.0 at the bottom.
    pub fraction: f32,
}

impl RowHit {
    /// Create a hit.
    pub fn new(row: usize, fraction: f32) -> Self {
        Self { row, fraction }
    }
}

/// The resolved drop location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTarget {
    /// Row under the pointer.
    pub index: usize,
    /// Item under the pointer; `None` for the placeholder row.
    pub item: Option<ItemId>,
    /// Index the dragged rows are inserted before (for `Inside`, the row
    /// after the target).
    pub insert_index: usize,
    pub position: DropPosition,
}

/// What a reorder handler is asked to validate and execute.
#[derive(Debug, Clone, Copy)]
pub struct DropArgs<'a> {
    pub drag: &'a DragInfo,
    pub target: DropTarget,
}

/// Performs the collection mutation for a drop.
pub trait ReorderHandler<S: ItemSource + ?Sized> {
    /// Returns true if the drop is allowed.
    fn validate(&self, source: &S, args: &DropArgs<'_>) -> bool;

    /// Mutate `source`. Returns true on success.
    fn execute(&mut self, source: &mut S, args: &DropArgs<'_>) -> bool;
}

/// Reorders flat sources through [`ItemSource::move_items`].
///
/// Refuses `Inside` drops and drops that would leave every row in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListReorderHandler;

impl<S: ItemSource + ?Sized> ReorderHandler<S> for ListReorderHandler {
    fn validate(&self, source: &S, args: &DropArgs<'_>) -> bool {
        if args.target.position == DropPosition::Inside || args.drag.source_indices.is_empty() {
            return false;
        }
        if args.target.insert_index > source.count() {
            return false;
        }
        // A contiguous block dropped onto its own edges does not move.
        let mut indices = args.drag.source_indices.clone();
        indices.sort_unstable();
        let contiguous = indices.windows(2).all(|pair| pair[1] == pair[0] + 1);
        let first = indices[0];
        let last = indices[indices.len() - 1];
        !(contiguous && (first..=last + 1).contains(&args.target.insert_index))
    }

    fn execute(&mut self, source: &mut S, args: &DropArgs<'_>) -> bool {
        source.move_items(&args.drag.source_indices, args.target.insert_index)
    }
}

/// Result of a drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// The handler moved the rows.
    Moved { drag: DragInfo, target: DropTarget },
    /// The drop was refused: placeholder target, handler validation or
    /// execution failure.
    Rejected,
    /// No drag was in progress (plain click) or no row was under the
    /// pointer.
    Cancelled,
}

impl DropOutcome {
    /// Returns true if rows moved.
    pub fn is_moved(&self) -> bool {
        matches!(self, DropOutcome::Moved { .. })
    }
}

#[derive(Debug, Clone)]
enum ReorderState {
    Idle,
    Pending {
        threshold: DragThreshold,
        row: usize,
    },
    Dragging {
        drag: DragInfo,
        target: Option<DropTarget>,
    },
}

/// Pointer state machine for row drag-reorder.
#[derive(Debug)]
pub struct RowReorderController {
    handle: ReorderHandle,
    inside_band: f32,
    drag_threshold: f32,
    state: ReorderState,

    /// Emitted when pointer capture is taken (true) or released (false).
    pub capture_changed: Signal<bool>,

    /// Emitted when a drag starts, with the number of dragged rows.
    pub drag_started: Signal<usize>,
}

impl Default for RowReorderController {
    fn default() -> Self {
        Self::new(ReorderHandle::default())
    }
}

impl RowReorderController {
    /// Default share of the row height that counts as `Inside`.
    pub const DEFAULT_INSIDE_BAND: f32 = 0.5;

    /// Create an idle controller.
    pub fn new(handle: ReorderHandle) -> Self {
        Self {
            handle,
            inside_band: Self::DEFAULT_INSIDE_BAND,
            drag_threshold: DragThreshold::DEFAULT,
            state: ReorderState::Idle,
            capture_changed: Signal::new(),
            drag_started: Signal::new(),
        }
    }

    /// The configured drag affordance.
    pub fn handle(&self) -> ReorderHandle {
        self.handle
    }

    /// Change the drag affordance. Any gesture in progress is abandoned.
    pub fn set_handle(&mut self, handle: ReorderHandle) {
        self.cancel();
        self.handle = handle;
    }

    /// Share of the row height, centered, that counts as `Inside`.
    pub fn inside_band(&self) -> f32 {
        self.inside_band
    }

    /// Set the `Inside` band, clamped to `0.0..=1.0`.
    pub fn set_inside_band(&mut self, band: f32) {
        self.inside_band = band.clamp(0.0, 1.0);
    }

    /// Distance the pointer must travel before capture.
    pub fn set_drag_threshold(&mut self, threshold: f32) {
        self.drag_threshold = threshold.max(0.0);
    }

    /// Returns true while a press waits for the threshold.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, ReorderState::Pending { .. })
    }

    /// Returns true while a drag holds capture.
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, ReorderState::Dragging { .. })
    }

    /// The dragged rows of the current gesture.
    pub fn drag_info(&self) -> Option<&DragInfo> {
        match &self.state {
            ReorderState::Dragging { drag, .. } => Some(drag),
            _ => None,
        }
    }

    /// The last computed drop target.
    pub fn drop_target(&self) -> Option<DropTarget> {
        match &self.state {
            ReorderState::Dragging { target, .. } => *target,
            _ => None,
        }
    }

    // =========================================================================
    // Gesture
    // =========================================================================

    /// Pointer pressed on `part` of `row`. Arms a pending drag and returns
    /// true if the press is on the drag affordance of a real item.
    pub fn press<S>(&mut self, source: &S, part: PressPart, row: usize, position: Point) -> bool
    where
        S: ItemSource + ?Sized,
    {
        self.cancel();
        if !self.handle.accepts(part) || source.item_id(row).is_none() {
            return false;
        }
        self.state = ReorderState::Pending {
            threshold: DragThreshold::new(position, self.drag_threshold),
            row,
        };
        true
    }

    /// Pointer moved. Starts the drag once past the threshold and returns
    /// true at that moment.
    ///
    /// If the pressed row is part of `selected_rows`, the whole selection is
    /// dragged; otherwise just the pressed row.
    pub fn pointer_moved<S>(&mut self, source: &S, selected_rows: &[usize], position: Point) -> bool
    where
        S: ItemSource + ?Sized,
    {
        let ReorderState::Pending { threshold, row } = self.state else {
            return false;
        };
        if !threshold.is_exceeded(position) {
            return false;
        }

        let is_selection = selected_rows.contains(&row);
        let rows: Vec<usize> = if is_selection {
            selected_rows.to_vec()
        } else {
            vec![row]
        };
        let (items, source_indices): (Vec<ItemId>, Vec<usize>) = rows
            .into_iter()
            .filter_map(|row| source.item_id(row).map(|id| (id, row)))
            .unzip();
        if items.is_empty() {
            self.state = ReorderState::Idle;
            return false;
        }

        tracing::debug!(
            target: targets::REORDER,
            rows = items.len(),
            is_selection,
            "row drag started"
        );
        let count = items.len();
        self.state = ReorderState::Dragging {
            drag: DragInfo {
                items,
                source_indices,
                is_selection,
            },
            target: None,
        };
        self.capture_changed.emit(true);
        self.drag_started.emit(count);
        true
    }

    /// Pointer over `hit` during a drag. Returns the drop target, or `None`
    /// when no drag is active or no row is under the pointer.
    pub fn drag_over<S>(&mut self, source: &S, hit: Option<RowHit>) -> Option<DropTarget>
    where
        S: ItemSource + ?Sized,
    {
        let band = self.inside_band;
        let ReorderState::Dragging { target, .. } = &mut self.state else {
            return None;
        };
        *target = hit
            .filter(|hit| hit.row < source.count())
            .map(|hit| resolve_target(source, hit, band));
        *target
    }

    /// Pointer released. Runs the drop through `handler` if a drag is
    /// active and releases capture either way.
    pub fn drop<S, H>(&mut self, source: &mut S, handler: &mut H) -> DropOutcome
    where
        S: ItemSource + ?Sized,
        H: ReorderHandler<S> + ?Sized,
    {
        let state = std::mem::replace(&mut self.state, ReorderState::Idle);
        let ReorderState::Dragging { drag, target } = state else {
            return DropOutcome::Cancelled;
        };
        self.capture_changed.emit(false);

        let Some(target) = target else {
            return DropOutcome::Cancelled;
        };
        if target.item.is_none() || source.is_placeholder(target.index) {
            tracing::debug!(target: targets::REORDER, row = target.index, "drop onto placeholder refused");
            return DropOutcome::Rejected;
        }

        let args = DropArgs {
            drag: &drag,
            target,
        };
        if !handler.validate(source, &args) {
            tracing::debug!(target: targets::REORDER, ?target, "drop refused by handler");
            return DropOutcome::Rejected;
        }
        let _span = PerfSpan::new(span_names::REORDER);
        if !handler.execute(source, &args) {
            tracing::warn!(target: targets::REORDER, ?target, "reorder handler failed to execute drop");
            return DropOutcome::Rejected;
        }
        tracing::debug!(
            target: targets::REORDER,
            rows = drag.items.len(),
            insert_index = target.insert_index,
            "rows moved"
        );
        DropOutcome::Moved { drag, target }
    }

    /// Abandon any pending or active gesture, releasing capture.
    pub fn cancel(&mut self) {
        let state = std::mem::replace(&mut self.state, ReorderState::Idle);
        if matches!(state, ReorderState::Dragging { .. }) {
            tracing::trace!(target: targets::REORDER, "row drag cancelled");
            self.capture_changed.emit(false);
        }
    }
}

fn resolve_target<S>(source: &S, hit: RowHit, band: f32) -> DropTarget
where
    S: ItemSource + ?Sized,
{
    let fraction = hit.fraction.clamp(0.0, 1.0);
    let item = source.item_id(hit.row);
    let inside_top = (1.0 - band) / 2.0;
    let inside_bottom = (1.0 + band) / 2.0;
    let position = if source.supports_nesting()
        && item.is_some()
        && band > 0.0
        && (inside_top..=inside_bottom).contains(&fraction)
    {
        DropPosition::Inside
    } else if fraction < 0.5 {
        DropPosition::Before
    } else {
        DropPosition::After
    };
    let insert_index = match position {
        DropPosition::Before => hit.row,
        DropPosition::After | DropPosition::Inside => hit.row + 1,
    };
    DropTarget {
        index: hit.row,
        item,
        insert_index,
        position,
    }
}
