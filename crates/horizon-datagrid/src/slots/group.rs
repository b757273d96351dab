//! Row groups: header records and the builder that derives them from keys.

use std::fmt;
use std::sync::Arc;

use crate::model::CellValue;

/// A group header occupying one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct RowGroupInfo {
    /// The value shared by every row in the group.
    pub key: CellValue,
    /// Whether the header itself is shown (no collapsed ancestor).
    pub is_visible: bool,
    /// Nesting depth, 0 for outermost groups.
    pub level: usize,
    /// Slot of the header.
    pub slot: usize,
    /// Last slot belonging to the group, header included.
    pub last_sub_item_slot: usize,
    /// Whether the group's rows are shown.
    pub is_expanded: bool,
}

impl RowGroupInfo {
    /// Create an expanded, visible header.
    pub fn new(key: CellValue, level: usize, slot: usize, last_sub_item_slot: usize) -> Self {
        Self {
            key,
            is_visible: true,
            level,
            slot,
            last_sub_item_slot: last_sub_item_slot.max(slot),
            is_expanded: true,
        }
    }

    /// Returns true if `slot` lies under this header (the header excluded).
    pub fn contains(&self, slot: usize) -> bool {
        slot > self.slot && slot <= self.last_sub_item_slot
    }

    /// Number of slots under the header.
    pub fn sub_item_count(&self) -> usize {
        self.last_sub_item_slot - self.slot
    }
}

/// One grouping level: a name and a key extractor.
pub struct GroupDescription<T> {
    name: String,
    key: Arc<dyn Fn(&T) -> CellValue + Send + Sync>,
}

impl<T> Clone for GroupDescription<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            key: self.key.clone(),
        }
    }
}

impl<T> GroupDescription<T> {
    /// Create a grouping level.
    pub fn new<F>(name: impl Into<String>, key: F) -> Self
    where
        F: Fn(&T) -> CellValue + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            key: Arc::new(key),
        }
    }

    /// The level's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The group key of `item`.
    pub fn key(&self, item: &T) -> CellValue {
        (self.key)(item)
    }
}

impl<T> fmt::Debug for GroupDescription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupDescription")
            .field("name", &self.name)
            .finish()
    }
}

/// Derive group headers from contiguous runs of equal keys.
///
/// `keys(row)` returns one key per level, or `None` for rows that stay
/// outside every group (the placeholder). A change at one level closes that
/// level and every deeper one. Headers are returned in slot order; slots
/// count headers and rows together.
pub fn build_groups<F>(row_count: usize, levels: usize, mut keys: F) -> Vec<RowGroupInfo>
where
    F: FnMut(usize) -> Option<Vec<CellValue>>,
{
    let mut groups: Vec<RowGroupInfo> = Vec::new();
    // Indices into `groups` of the open header at each level.
    let mut open: Vec<usize> = Vec::with_capacity(levels);
    let mut previous: Option<Vec<CellValue>> = None;
    let mut next_slot = 0;

    for row in 0..row_count {
        let row_keys = keys(row).map(|mut k| {
            k.resize(levels, CellValue::Empty);
            k
        });
        let Some(row_keys) = row_keys else {
            close_from(&mut groups, &mut open, 0, next_slot);
            previous = None;
            next_slot += 1;
            continue;
        };

        let first_change = match &previous {
            Some(prev) => prev
                .iter()
                .zip(&row_keys)
                .position(|(a, b)| !a.same_bits(b))
                .unwrap_or(levels),
            None => 0,
        };
        if first_change < levels {
            close_from(&mut groups, &mut open, first_change, next_slot);
            for (level, key) in row_keys.iter().enumerate().skip(first_change) {
                open.push(groups.len());
                groups.push(RowGroupInfo::new(key.clone(), level, next_slot, next_slot));
                next_slot += 1;
            }
        }
        previous = Some(row_keys);
        next_slot += 1;
    }
    close_from(&mut groups, &mut open, 0, next_slot);
    groups
}

/// Close open headers at `level` and deeper; `next_slot` is the first slot
/// past their content.
fn close_from(groups: &mut [RowGroupInfo], open: &mut Vec<usize>, level: usize, next_slot: usize) {
    while open.len() > level {
        if let Some(index) = open.pop() {
            let group = &mut groups[index];
            group.last_sub_item_slot = next_slot.saturating_sub(1).max(group.slot);
        }
    }
}
