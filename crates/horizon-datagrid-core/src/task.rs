//! FIFO queue of deferred actions.
//!
//! Some transitions cannot run while the input event that requested them is
//! still being processed by a focused widget. Such transitions are posted to
//! a [`DeferredQueue`] and drained when the host reports that focus was
//! released. Items are plain values; the owner decides how to execute them.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// A unique identifier for a deferred action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeferredId(u64);

impl DeferredId {
    /// Get the raw u64 value of this ID.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Global counter for generating unique IDs.
static NEXT_DEFERRED_ID: AtomicU64 = AtomicU64::new(1);

fn next_deferred_id() -> DeferredId {
    DeferredId(NEXT_DEFERRED_ID.fetch_add(1, Ordering::Relaxed))
}

#[derive(Debug, Clone)]
struct Entry<A> {
    id: DeferredId,
    action: A,
}

/// A first-in, first-out queue of pending actions.
///
/// There is no cancel-in-place: a pending action is superseded only by
/// posting another one after it, and both are handed out in order by
/// [`drain`](Self::drain).
#[derive(Debug, Clone)]
pub struct DeferredQueue<A> {
    entries: VecDeque<Entry<A>>,
}

impl<A> Default for DeferredQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> DeferredQueue<A> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Post an action to run when the queue is next drained.
    pub fn post(&mut self, action: A) -> DeferredId {
        let id = next_deferred_id();
        self.entries.push_back(Entry { id, action });
        id
    }

    /// Check if there are any pending actions.
    pub fn has_pending(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Get the number of pending actions.
    pub fn pending_count(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over pending actions in execution order.
    pub fn pending(&self) -> impl Iterator<Item = &A> + '_ {
        self.entries.iter().map(|entry| &entry.action)
    }

    /// Identifiers of the pending actions in execution order.
    pub fn pending_ids(&self) -> Vec<DeferredId> {
        self.entries.iter().map(|entry| entry.id).collect()
    }

    /// Remove and return the oldest pending action.
    pub fn pop(&mut self) -> Option<A> {
        self.entries.pop_front().map(|entry| entry.action)
    }

    /// Remove all pending actions, oldest first.
    pub fn drain(&mut self) -> Vec<A> {
        self.entries.drain(..).map(|entry| entry.action).collect()
    }

    /// Drop all pending actions without running them.
    ///
    /// Used when the owner is torn down (grid reset, item source replaced).
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = DeferredQueue::new();
        queue.post("tab");
        queue.post("escape");

        assert!(queue.has_pending());
        assert_eq!(queue.pending_count(), 2);
        assert_eq!(queue.drain(), vec!["tab", "escape"]);
        assert!(!queue.has_pending());
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut queue = DeferredQueue::new();
        let first = queue.post(1);
        let second = queue.post(2);
        assert!(second > first);
        assert_eq!(queue.pending_ids(), vec![first, second]);
    }

    #[test]
    fn test_pop_and_clear() {
        let mut queue = DeferredQueue::new();
        queue.post(1);
        queue.post(2);
        queue.post(3);

        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pending().copied().collect::<Vec<_>>(), vec![2, 3]);
        queue.clear();
        assert_eq!(queue.pop(), None);
    }
}
