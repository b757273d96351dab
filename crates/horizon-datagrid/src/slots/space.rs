//! The slot space: data rows and group headers in one dense address range.

use horizon_datagrid_core::logging::targets;

use super::collapsed::CollapsedRangeTable;
use super::group::RowGroupInfo;

/// Maps slots to row indices and tracks which slots are hidden.
///
/// A slot is either a group header or a data row. Headers are kept as a
/// sorted list of slots, so `slot ↔ row index` is a binary search over
/// "how many headers precede this point". Collapsing never renumbers rows:
/// a hidden row keeps its slot and row index, and only the visible ordinal
/// of later slots moves.
///
/// # Example
///
/// ```
/// use horizon_datagrid::slots::{RowGroupInfo, SlotSpace};
/// use horizon_datagrid::model::CellValue;
///
/// let mut space = SlotSpace::new(4);
/// // Header at slot 0 covering rows 0 and 1 (slots 1 and 2).
/// space.insert_group_header(RowGroupInfo::new(CellValue::from("a"), 0, 0, 2));
///
/// assert_eq!(space.slot_count(), 5);
/// assert_eq!(space.slot_from_row_index(0), Some(1));
/// assert_eq!(space.row_index_from_slot(3), Some(2));
///
/// space.collapse_group(0);
/// assert_eq!(space.row_index_from_slot(1), Some(0));
/// assert_eq!(space.first_visible_slot(), Some(0));
/// assert_eq!(space.next_visible_slot(0), Some(3));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SlotSpace {
    row_count: usize,
    /// Header slots in ascending order.
    headers: Vec<usize>,
    /// Group records, parallel to `headers`.
    groups: Vec<RowGroupInfo>,
    collapsed: CollapsedRangeTable,
}

impl SlotSpace {
    /// Create a slot space of `row_count` ungrouped rows.
    pub fn new(row_count: usize) -> Self {
        Self {
            row_count,
            headers: Vec::new(),
            groups: Vec::new(),
            collapsed: CollapsedRangeTable::new(),
        }
    }

    /// Drop every header and collapsed range and set the row count.
    pub fn reset(&mut self, row_count: usize) {
        self.row_count = row_count;
        self.headers.clear();
        self.groups.clear();
        self.collapsed.clear();
        tracing::debug!(target: targets::SLOTS, row_count, "slot space reset");
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of slots (rows plus headers).
    pub fn slot_count(&self) -> usize {
        self.row_count + self.headers.len()
    }

    /// Number of slots not hidden by a collapsed range.
    pub fn visible_count(&self) -> usize {
        self.slot_count().saturating_sub(self.collapsed.hidden_count())
    }

    /// The collapsed ranges.
    pub fn collapsed(&self) -> &CollapsedRangeTable {
        &self.collapsed
    }

    // =========================================================================
    // Addressing
    // =========================================================================

    /// Slot of data row `row`.
    pub fn slot_from_row_index(&self, row: usize) -> Option<usize> {
        if row >= self.row_count {
            return None;
        }
        // Header i has `headers[i] - i` data rows before it; count the
        // headers whose preceding rows do not exceed `row`.
        let (mut lo, mut hi) = (0, self.headers.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.headers[mid] - mid <= row {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Some(row + lo)
    }

    /// Data row at `slot`, or `None` for headers and out-of-range slots.
    ///
    /// Hidden slots still resolve to the row they hold.
    pub fn row_index_from_slot(&self, slot: usize) -> Option<usize> {
        if slot >= self.slot_count() || self.is_group_header(slot) {
            return None;
        }
        Some(slot - self.headers.partition_point(|&h| h < slot))
    }

    /// Returns true if `slot` holds a group header.
    pub fn is_group_header(&self, slot: usize) -> bool {
        self.headers.binary_search(&slot).is_ok()
    }

    /// Returns true if `slot` is in range and not hidden.
    pub fn is_slot_visible(&self, slot: usize) -> bool {
        slot < self.slot_count() && !self.collapsed.is_collapsed(slot)
    }

    /// Returns true if `slot` is inside a collapsed range.
    pub fn is_collapsed(&self, slot: usize) -> bool {
        self.collapsed.is_collapsed(slot)
    }

    /// Visible ordinal of `slot`.
    pub fn visible_index_from_slot(&self, slot: usize) -> Option<usize> {
        if slot >= self.slot_count() {
            return None;
        }
        self.collapsed.visible_index(slot)
    }

    /// Slot shown at visible ordinal `visible`.
    pub fn slot_from_visible_index(&self, visible: usize) -> Option<usize> {
        if visible >= self.visible_count() {
            return None;
        }
        Some(self.collapsed.slot_from_visible_index(visible))
    }

    /// First slot that is not hidden.
    pub fn first_visible_slot(&self) -> Option<usize> {
        self.slot_from_visible_index(0)
    }

    /// Last slot that is not hidden.
    pub fn last_visible_slot(&self) -> Option<usize> {
        self.visible_count()
            .checked_sub(1)
            .and_then(|v| self.slot_from_visible_index(v))
    }

    /// Next visible slot after `slot`.
    pub fn next_visible_slot(&self, slot: usize) -> Option<usize> {
        let next = self.collapsed.next_visible(slot.checked_add(1)?);
        (next < self.slot_count()).then_some(next)
    }

    /// Previous visible slot before `slot`.
    pub fn previous_visible_slot(&self, slot: usize) -> Option<usize> {
        let candidate = slot.min(self.slot_count()).checked_sub(1)?;
        self.collapsed.previous_visible(candidate)
    }

    /// Visible slot `rows` visible positions away from `slot`, clamped to the
    /// first/last visible slot.
    pub fn step_visible(&self, slot: usize, rows: isize) -> Option<usize> {
        let last = self.visible_count().checked_sub(1)?;
        let origin = match self.visible_index_from_slot(slot) {
            Some(v) => v,
            None => self
                .next_visible_slot(slot)
                .and_then(|s| self.visible_index_from_slot(s))
                .unwrap_or(last),
        };
        let target = origin.saturating_add_signed(rows).min(last);
        self.slot_from_visible_index(target)
    }

    /// The slots shown for visible ordinals `first..first + count`.
    pub fn visible_slots(&self, first: usize, count: usize) -> Vec<usize> {
        let end = first.saturating_add(count).min(self.visible_count());
        (first..end)
            .map(|v| self.collapsed.slot_from_visible_index(v))
            .collect()
    }

    // =========================================================================
    // Collapsed ranges
    // =========================================================================

    /// Hide `start..=end` (clamped to the slot range).
    pub fn collapse_slots(&mut self, start: usize, end: usize) -> bool {
        let Some(last) = self.slot_count().checked_sub(1) else {
            return false;
        };
        if start.min(end) > last {
            return false;
        }
        self.collapsed.collapse(start.min(last), end.min(last));
        self.refresh_group_visibility();
        true
    }

    /// Show `start..=end`. Collapsed groups overlapping it stay hidden.
    pub fn expand_slots(&mut self, start: usize, end: usize) -> bool {
        if start.min(end) >= self.slot_count() {
            return false;
        }
        self.collapsed.expand(start, end);
        self.reapply_collapsed_groups();
        true
    }

    // =========================================================================
    // Groups
    // =========================================================================

    /// The group headers in slot order.
    pub fn groups(&self) -> &[RowGroupInfo] {
        &self.groups
    }

    /// The group whose header is at `slot`.
    pub fn group_info(&self, slot: usize) -> Option<&RowGroupInfo> {
        self.headers
            .binary_search(&slot)
            .ok()
            .map(|index| &self.groups[index])
    }

    /// The innermost group containing `slot` (its header excluded).
    pub fn enclosing_group(&self, slot: usize) -> Option<&RowGroupInfo> {
        let before = self.headers.partition_point(|&h| h < slot);
        self.groups[..before]
            .iter()
            .rev()
            .find(|group| group.contains(slot))
    }

    /// Insert a header slot at `info.slot`.
    ///
    /// Later slots shift down by one and enclosing groups grow. The header
    /// covers `info.slot + 1..=info.last_sub_item_slot` in the shifted space.
    pub fn insert_group_header(&mut self, info: RowGroupInfo) -> bool {
        if info.slot > self.slot_count() {
            return false;
        }
        let slot = info.slot;
        self.shift_for_insert(slot, 1);
        let index = self.headers.partition_point(|&h| h < slot);
        self.headers.insert(index, slot);
        let mut info = info;
        info.last_sub_item_slot = info.last_sub_item_slot.clamp(slot, self.slot_count() - 1);
        self.groups.insert(index, info);
        self.reapply_collapsed_groups();
        true
    }

    /// Replace every header with `groups` (slots already assigned).
    pub fn set_groups(&mut self, groups: Vec<RowGroupInfo>) {
        self.collapsed.clear();
        let mut groups = groups;
        groups.sort_by_key(|g| g.slot);
        groups.dedup_by_key(|g| g.slot);
        self.headers = groups.iter().map(|g| g.slot).collect();
        self.groups = groups;
        self.reapply_collapsed_groups();
        tracing::debug!(target: targets::SLOTS, groups = self.groups.len(), "groups replaced");
    }

    /// Collapse the group whose header is at `slot`.
    pub fn collapse_group(&mut self, slot: usize) -> bool {
        let Ok(index) = self.headers.binary_search(&slot) else {
            return false;
        };
        let group = &mut self.groups[index];
        if !group.is_expanded {
            return false;
        }
        group.is_expanded = false;
        tracing::debug!(target: targets::SLOTS, slot, "group collapsed");
        self.reapply_collapsed_groups();
        true
    }

    /// Expand the group whose header is at `slot`.
    ///
    /// Nested groups that are still collapsed stay hidden, and so does
    /// everything under a collapsed ancestor.
    pub fn expand_group(&mut self, slot: usize) -> bool {
        let Ok(index) = self.headers.binary_search(&slot) else {
            return false;
        };
        let group = &mut self.groups[index];
        if group.is_expanded {
            return false;
        }
        group.is_expanded = true;
        let (start, end) = (group.slot + 1, group.last_sub_item_slot);
        if start <= end {
            self.collapsed.expand(start, end);
        }
        tracing::debug!(target: targets::SLOTS, slot, "group expanded");
        self.reapply_collapsed_groups();
        true
    }

    /// Collapse or expand the group at `slot`.
    pub fn toggle_group(&mut self, slot: usize) -> bool {
        match self.group_info(slot).map(|g| g.is_expanded) {
            Some(true) => self.collapse_group(slot),
            Some(false) => self.expand_group(slot),
            None => false,
        }
    }

    // =========================================================================
    // Structural changes
    // =========================================================================

    /// Insert `count` data rows at `slot`.
    ///
    /// Rows inserted strictly inside a group's extent join it; inserting at
    /// the slot right after a group leaves it unchanged.
    pub fn insert_rows(&mut self, slot: usize, count: usize) -> bool {
        if slot > self.slot_count() || count == 0 {
            return false;
        }
        self.shift_for_insert(slot, count);
        self.row_count += count;
        self.reapply_collapsed_groups();
        tracing::trace!(target: targets::SLOTS, slot, count, "rows inserted");
        true
    }

    /// Remove `count` slots (rows or headers) starting at `slot`.
    pub fn remove_slots(&mut self, slot: usize, count: usize) -> bool {
        let count = count.min(self.slot_count().saturating_sub(slot));
        if count == 0 {
            return false;
        }
        let end = slot + count;
        let first_header = self.headers.partition_point(|&h| h < slot);
        let last_header = self.headers.partition_point(|&h| h < end);
        let removed_headers = last_header - first_header;
        self.headers.drain(first_header..last_header);
        self.groups.drain(first_header..last_header);
        self.row_count -= count - removed_headers;

        let shift = |s: usize| if s >= end { s - count } else { s };
        for header in &mut self.headers {
            *header = shift(*header);
        }
        for group in &mut self.groups {
            group.last_sub_item_slot = if group.last_sub_item_slot >= end {
                group.last_sub_item_slot - count
            } else if group.last_sub_item_slot >= slot {
                slot.saturating_sub(1)
            } else {
                group.last_sub_item_slot
            };
            group.slot = shift(group.slot);
            group.last_sub_item_slot = group.last_sub_item_slot.max(group.slot);
        }
        self.collapsed.remove_slots(slot, count);
        self.reapply_collapsed_groups();
        tracing::trace!(target: targets::SLOTS, slot, count, "slots removed");
        true
    }

    fn shift_for_insert(&mut self, slot: usize, count: usize) {
        for header in &mut self.headers {
            if *header >= slot {
                *header += count;
            }
        }
        for group in &mut self.groups {
            if group.slot >= slot {
                group.slot += count;
                group.last_sub_item_slot += count;
            } else if slot <= group.last_sub_item_slot {
                group.last_sub_item_slot += count;
            }
        }
        self.collapsed.insert_slots(slot, count);
    }

    fn reapply_collapsed_groups(&mut self) {
        for group in &self.groups {
            if !group.is_expanded && group.last_sub_item_slot > group.slot {
                self.collapsed.collapse(group.slot + 1, group.last_sub_item_slot);
            }
        }
        self.collapsed.truncate(self.slot_count());
        self.refresh_group_visibility();
    }

    fn refresh_group_visibility(&mut self) {
        for group in &mut self.groups {
            group.is_visible = !self.collapsed.is_collapsed(group.slot);
        }
    }
}
