//! Sparse table of hidden slot intervals.

/// An inclusive interval of slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRange {
    /// First slot in the range.
    pub start: usize,
    /// Last slot in the range (inclusive).
    pub end: usize,
}

impl SlotRange {
    /// Create a range, swapping the bounds if needed.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    /// Number of slots in the range.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Always false; a range holds at least one slot.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns true if `slot` lies in the range.
    pub fn contains(&self, slot: usize) -> bool {
        slot >= self.start && slot <= self.end
    }
}

/// Hidden slot intervals, kept sorted and coalesced.
///
/// A prefix count of hidden slots sits alongside the intervals, so the
/// slot ↔ visible-ordinal conversions are binary searches. Mutations rebuild
/// the prefix in O(ranges).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapsedRangeTable {
    ranges: Vec<SlotRange>,
    /// `hidden_before[i]` is the number of hidden slots in `ranges[..i]`.
    hidden_before: Vec<usize>,
}

impl CollapsedRangeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            ranges: Vec::new(),
            hidden_before: vec![0],
        }
    }

    /// The hidden intervals in slot order.
    pub fn ranges(&self) -> &[SlotRange] {
        &self.ranges
    }

    /// Returns true if nothing is hidden.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Total number of hidden slots.
    pub fn hidden_count(&self) -> usize {
        self.hidden_before.last().copied().unwrap_or(0)
    }

    /// Remove every interval.
    pub fn clear(&mut self) {
        self.ranges.clear();
        self.rebuild_prefix();
    }

    /// Hide `start..=end`, merging with overlapping or adjacent intervals.
    pub fn collapse(&mut self, start: usize, end: usize) {
        let range = SlotRange::new(start, end);
        let lo = self
            .ranges
            .partition_point(|r| r.end.saturating_add(1) < range.start);
        let hi = self
            .ranges
            .partition_point(|r| r.start <= range.end.saturating_add(1));
        let merged = if lo < hi {
            SlotRange {
                start: range.start.min(self.ranges[lo].start),
                end: range.end.max(self.ranges[hi - 1].end),
            }
        } else {
            range
        };
        self.ranges.splice(lo..hi, [merged]);
        self.rebuild_prefix();
    }

    /// Show `start..=end`, splitting intervals that straddle its bounds.
    pub fn expand(&mut self, start: usize, end: usize) {
        let range = SlotRange::new(start, end);
        let lo = self.ranges.partition_point(|r| r.end < range.start);
        let hi = self.ranges.partition_point(|r| r.start <= range.end);
        if lo >= hi {
            return;
        }
        let mut keep = Vec::with_capacity(2);
        let first = self.ranges[lo];
        if first.start < range.start {
            keep.push(SlotRange::new(first.start, range.start - 1));
        }
        let last = self.ranges[hi - 1];
        if last.end > range.end {
            keep.push(SlotRange::new(range.end + 1, last.end));
        }
        self.ranges.splice(lo..hi, keep);
        self.rebuild_prefix();
    }

    fn index_containing(&self, slot: usize) -> Option<usize> {
        let index = self.ranges.partition_point(|r| r.end < slot);
        self.ranges
            .get(index)
            .filter(|r| r.start <= slot)
            .map(|_| index)
    }

    /// Returns true if `slot` is hidden.
    pub fn is_collapsed(&self, slot: usize) -> bool {
        self.index_containing(slot).is_some()
    }

    /// The interval hiding `slot`.
    pub fn range_containing(&self, slot: usize) -> Option<SlotRange> {
        self.index_containing(slot).map(|index| self.ranges[index])
    }

    /// Number of hidden slots strictly before `slot`.
    pub fn hidden_before(&self, slot: usize) -> usize {
        let index = self.ranges.partition_point(|r| r.end < slot);
        let partial = match self.ranges.get(index) {
            Some(r) if r.start < slot => slot - r.start,
            _ => 0,
        };
        self.hidden_before[index] + partial
    }

    /// Visible ordinal of `slot`, or `None` if it is hidden.
    pub fn visible_index(&self, slot: usize) -> Option<usize> {
        if self.is_collapsed(slot) {
            return None;
        }
        Some(slot - self.hidden_before(slot))
    }

    /// Slot holding the given visible ordinal (unbounded above).
    pub fn slot_from_visible_index(&self, visible: usize) -> usize {
        let (mut lo, mut hi) = (0, self.ranges.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.ranges[mid].start - self.hidden_before[mid] <= visible {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        visible + self.hidden_before[lo]
    }

    /// First visible slot at or after `slot` (unbounded above).
    pub fn next_visible(&self, slot: usize) -> usize {
        match self.range_containing(slot) {
            Some(r) => r.end + 1,
            None => slot,
        }
    }

    /// Last visible slot at or before `slot`.
    pub fn previous_visible(&self, slot: usize) -> Option<usize> {
        match self.range_containing(slot) {
            Some(r) => r.start.checked_sub(1),
            None => Some(slot),
        }
    }

    /// Shift intervals for `count` slots inserted at `at`.
    ///
    /// Insertion strictly inside an interval widens it; insertion at an
    /// interval's start lands before it.
    pub fn insert_slots(&mut self, at: usize, count: usize) {
        if count == 0 {
            return;
        }
        for range in &mut self.ranges {
            if range.start >= at {
                range.start += count;
                range.end += count;
            } else if range.end >= at {
                range.end += count;
            }
        }
        self.rebuild_prefix();
    }

    /// Drop `count` slots starting at `at` and close the gap.
    pub fn remove_slots(&mut self, at: usize, count: usize) {
        if count == 0 {
            return;
        }
        let removed_end = at + count;
        let shift = |slot: usize| if slot >= removed_end { slot - count } else { slot };
        let mut ranges = Vec::with_capacity(self.ranges.len());
        for range in self.ranges.drain(..) {
            let before = range.start < at;
            let after = range.end >= removed_end;
            let kept = match (before, after) {
                (true, true) => Some(SlotRange::new(range.start, range.end - count)),
                (true, false) => Some(SlotRange::new(range.start, range.end.min(at - 1))),
                (false, true) => Some(SlotRange::new(shift(range.start.max(removed_end)), shift(range.end))),
                (false, false) => None,
            };
            ranges.extend(kept);
        }
        self.ranges = coalesce(ranges);
        self.rebuild_prefix();
    }

    /// Clip intervals to the first `slot_count` slots.
    pub fn truncate(&mut self, slot_count: usize) {
        self.ranges.retain(|r| r.start < slot_count);
        if let Some(last) = self.ranges.last_mut() {
            last.end = last.end.min(slot_count.saturating_sub(1));
        }
        self.rebuild_prefix();
    }

    fn rebuild_prefix(&mut self) {
        self.hidden_before.clear();
        self.hidden_before.reserve(self.ranges.len() + 1);
        let mut total = 0;
        self.hidden_before.push(0);
        for range in &self.ranges {
            total += range.len();
            self.hidden_before.push(total);
        }
    }
}

fn coalesce(ranges: Vec<SlotRange>) -> Vec<SlotRange> {
    let mut out: Vec<SlotRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match out.last_mut() {
            Some(last) if last.end + 1 >= range.start => last.end = last.end.max(range.end),
            _ => out.push(range),
        }
    }
    out
}
