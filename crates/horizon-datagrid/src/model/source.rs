//! Item sources: the ordered collections a grid displays.
//!
//! An [`ItemSource`] is index-addressable, hands out stable [`ItemId`]s and
//! records structural changes in a change log that the grid drains when it
//! synchronizes. [`VecItemSource`] is the stock implementation backed by a
//! `Vec`, optionally followed by a new-item placeholder row.

use std::fmt;

use horizon_datagrid_core::Signal;

use super::hierarchy::TreeNavigation;

/// Stable identity of an item within its source.
///
/// Identities survive moves, so selection can be re-applied to the same
/// items after a reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u64);

impl ItemId {
    /// Create an identity from a raw value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw u64 value of this ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A structural change recorded by an item source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionChange {
    /// `count` rows were inserted starting at `index`.
    Inserted { index: usize, count: usize },
    /// `count` rows starting at `index` were removed.
    Removed { index: usize, count: usize },
    /// Rows were rearranged or replaced wholesale.
    Reset,
}

/// An ordered, index-addressable, mutation-observable collection.
///
/// Indices cover every row the grid shows, including the placeholder row if
/// the source has one. The placeholder has an index but no item.
pub trait ItemSource {
    /// The domain item type.
    type Item;

    /// Number of rows, including the placeholder.
    fn count(&self) -> usize;

    /// The item at `index`, or `None` for the placeholder or out of range.
    fn item(&self, index: usize) -> Option<&Self::Item>;

    /// Mutable access to the item at `index`.
    fn item_mut(&mut self, index: usize) -> Option<&mut Self::Item>;

    /// The identity of the item at `index`.
    fn item_id(&self, index: usize) -> Option<ItemId>;

    /// The current index of the item with identity `id`.
    fn index_of(&self, id: ItemId) -> Option<usize>;

    /// Index of the new-item placeholder row, if there is one.
    fn placeholder_index(&self) -> Option<usize> {
        None
    }

    /// Returns true if `index` is the placeholder row.
    fn is_placeholder(&self, index: usize) -> bool {
        self.placeholder_index() == Some(index)
    }

    /// Drain the structural changes recorded since the last call.
    fn take_changes(&mut self) -> Vec<CollectionChange>;

    /// Move the rows at `indices` so they end up before the row currently at
    /// `insert_index`, preserving their relative order.
    ///
    /// Returns false if the source cannot be rearranged.
    fn move_items(&mut self, _indices: &[usize], _insert_index: usize) -> bool {
        false
    }

    /// Returns true if rows can be dropped inside other rows.
    fn supports_nesting(&self) -> bool {
        false
    }

    /// Tree navigation, when the rows are a flattened hierarchy.
    fn as_tree(&self) -> Option<&dyn TreeNavigation> {
        None
    }

    /// Mutable tree navigation, when the rows are a flattened hierarchy.
    fn as_tree_mut(&mut self) -> Option<&mut dyn TreeNavigation> {
        None
    }
}

/// A `Vec`-backed item source.
///
/// # Example
///
/// ```
/// use horizon_datagrid::model::{ItemSource, VecItemSource};
///
/// let mut source = VecItemSource::new(vec!["a", "b"]).with_placeholder();
/// assert_eq!(source.count(), 3);
/// assert!(source.is_placeholder(2));
///
/// source.push("c");
/// assert_eq!(source.item(2), Some(&"c"));
/// assert_eq!(source.placeholder_index(), Some(3));
/// ```
pub struct VecItemSource<T> {
    items: Vec<(ItemId, T)>,
    next_id: u64,
    has_placeholder: bool,
    changes: Vec<CollectionChange>,
    /// Emitted after every structural change.
    pub collection_changed: Signal<CollectionChange>,
}

impl<T> VecItemSource<T> {
    /// Create a source holding `items`.
    pub fn new(items: Vec<T>) -> Self {
        let mut source = Self {
            items: Vec::with_capacity(items.len()),
            next_id: 1,
            has_placeholder: false,
            changes: Vec::new(),
            collection_changed: Signal::new(),
        };
        for item in items {
            let id = source.allocate_id();
            source.items.push((id, item));
        }
        source
    }

    /// Create an empty source.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Append a new-item placeholder row after the items.
    pub fn with_placeholder(mut self) -> Self {
        self.has_placeholder = true;
        self
    }

    fn allocate_id(&mut self) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        id
    }

    fn record(&mut self, change: CollectionChange) {
        self.changes.push(change.clone());
        self.collection_changed.emit(change);
    }

    /// Number of items, excluding the placeholder.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over the items in order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter().map(|(_, item)| item)
    }

    /// Append an item and return its identity.
    pub fn push(&mut self, item: T) -> ItemId {
        let index = self.items.len();
        self.insert(index, item)
    }

    /// Insert an item at `index` (clamped to the item count).
    pub fn insert(&mut self, index: usize, item: T) -> ItemId {
        let index = index.min(self.items.len());
        let id = self.allocate_id();
        self.items.insert(index, (id, item));
        self.record(CollectionChange::Inserted { index, count: 1 });
        id
    }

    /// Remove the item at `index`.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index >= self.items.len() {
            return None;
        }
        let (_, item) = self.items.remove(index);
        self.record(CollectionChange::Removed { index, count: 1 });
        Some(item)
    }

    /// Replace all items.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items.clear();
        for item in items {
            let id = self.allocate_id();
            self.items.push((id, item));
        }
        self.record(CollectionChange::Reset);
    }

    /// Remove all items.
    pub fn clear(&mut self) {
        self.set_items(Vec::new());
    }

    /// Items in order, with their identities.
    pub fn entries(&self) -> impl Iterator<Item = (ItemId, &T)> + '_ {
        self.items.iter().map(|(id, item)| (*id, item))
    }
}

impl<T> ItemSource for VecItemSource<T> {
    type Item = T;

    fn count(&self) -> usize {
        self.items.len() + usize::from(self.has_placeholder)
    }

    fn item(&self, index: usize) -> Option<&T> {
        self.items.get(index).map(|(_, item)| item)
    }

    fn item_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index).map(|(_, item)| item)
    }

    fn item_id(&self, index: usize) -> Option<ItemId> {
        self.items.get(index).map(|(id, _)| *id)
    }

    fn index_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|(item_id, _)| *item_id == id)
    }

    fn placeholder_index(&self) -> Option<usize> {
        self.has_placeholder.then_some(self.items.len())
    }

    fn take_changes(&mut self) -> Vec<CollectionChange> {
        std::mem::take(&mut self.changes)
    }

    fn move_items(&mut self, indices: &[usize], insert_index: usize) -> bool {
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.is_empty() || sorted.iter().any(|&i| i >= self.items.len()) {
            return false;
        }
        let insert_index = insert_index.min(self.items.len());
        let before_insert = sorted.iter().filter(|&&i| i < insert_index).count();

        let mut moved = Vec::with_capacity(sorted.len());
        for &index in sorted.iter().rev() {
            moved.push(self.items.remove(index));
        }
        moved.reverse();

        let at = insert_index - before_insert;
        self.items.splice(at..at, moved);
        self.record(CollectionChange::Reset);
        true
    }
}

impl<T: fmt::Debug> fmt::Debug for VecItemSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VecItemSource")
            .field("items", &self.items)
            .field("has_placeholder", &self.has_placeholder)
            .field("pending_changes", &self.changes.len())
            .finish()
    }
}

/// Optional capability of items that manage their own edit transactions.
///
/// When an item accepts [`try_begin_edit`](Self::try_begin_edit), the edit
/// session skips its field snapshot and relies on the item to restore itself
/// on cancel. Every method defaults to declining.
pub trait EditableItem {
    /// Start an edit transaction. Returns true if the item handles it.
    fn try_begin_edit(&mut self) -> bool {
        false
    }

    /// Roll back to the state captured by `try_begin_edit`.
    fn try_cancel_edit(&mut self) -> bool {
        false
    }

    /// Finish the edit transaction, keeping the changes.
    fn try_end_edit(&mut self) -> bool {
        false
    }
}

/// Accessor exposing the [`EditableItem`] capability of an item, if any.
pub type EditableAccessor<T> = fn(&mut T) -> Option<&mut dyn EditableItem>;

/// [`EditableAccessor`] for item types that implement [`EditableItem`].
pub fn editable_item<T: EditableItem>(item: &mut T) -> Option<&mut dyn EditableItem> {
    Some(item as &mut dyn EditableItem)
}
