//! Signal/slot notifications for Horizon DataGrid.
//!
//! Engine components announce state changes (selection, current cell, edit
//! lifecycle, flattened tree changes) through [`Signal`]s. The grid engine is
//! single-threaded and cooperative with the host's UI loop, so every slot is
//! invoked directly on the emitting thread, in connection order.
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The signal type for emitting notifications
//! - [`ConnectionId`] - Identifier returned when connecting a slot
//! - [`ConnectionGuard`] - RAII guard that disconnects when dropped
//!
//! # Example
//!
//! ```
//! use horizon_datagrid_core::Signal;
//!
//! let current_changed = Signal::<(usize, usize)>::new();
//!
//! let conn_id = current_changed.connect(|(new, old)| {
//!     println!("Current slot moved from {old} to {new}");
//! });
//!
//! current_changed.emit((4, 2));
//! current_changed.disconnect(conn_id);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    pub struct ConnectionId;
}

type SlotFn<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A type-safe signal that can have multiple connected slots.
///
/// When a signal is emitted, all connected slots are invoked with the
/// provided arguments. Slots are snapshotted before invocation, so a slot may
/// connect or disconnect on the same signal without deadlocking.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for signals
///   with no arguments, or a tuple for multiple arguments.
pub struct Signal<Args> {
    /// All active connections.
    connections: Mutex<SlotMap<ConnectionId, SlotFn<Args>>>,
    /// Whether signal emission is temporarily blocked.
    blocked: AtomicBool,
}

impl<Args: Clone + Send + 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> std::fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connections.lock().len())
            .field("blocked", &self.blocked.load(Ordering::Relaxed))
            .finish()
    }
}

impl<Args: Clone + Send + 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connections.lock().insert(Arc::new(slot))
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false` otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Block signal emission temporarily.
    ///
    /// While blocked, calls to `emit()` do nothing.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking all connected slots in connection order.
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return;
        }

        let slots: Vec<SlotFn<Args>> = self.connections.lock().values().cloned().collect();
        tracing::trace!(target: targets::SIGNAL, connection_count = slots.len(), "emitting signal");

        for slot in slots {
            slot(&args);
        }
    }

    /// Connect a slot that is disconnected when the returned guard is dropped.
    ///
    /// The guard holds a weak reference, so dropping it after the signal is
    /// gone is harmless.
    pub fn connect_scoped<F>(self: &Arc<Self>, slot: F) -> ConnectionGuard<Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(slot);
        ConnectionGuard {
            signal: Arc::downgrade(self),
            id,
        }
    }
}

/// RAII guard returned by [`Signal::connect_scoped`].
pub struct ConnectionGuard<Args: Clone + Send + 'static> {
    signal: Weak<Signal<Args>>,
    id: ConnectionId,
}

impl<Args: Clone + Send + 'static> ConnectionGuard<Args> {
    /// The connection this guard owns.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl<Args: Clone + Send + 'static> Drop for ConnectionGuard<Args> {
    fn drop(&mut self) {
        if let Some(signal) = self.signal.upgrade() {
            signal.disconnect(self.id);
        }
    }
}

static_assertions::assert_impl_all!(Signal<()>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder<T: Clone + Send + 'static>(signal: &Signal<T>) -> Arc<Mutex<Vec<T>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        signal.connect(move |value: &T| sink.lock().push(value.clone()));
        log
    }

    #[test]
    fn test_emit_reaches_every_slot() {
        let selection_changed = Signal::<Vec<usize>>::new();
        let first = recorder(&selection_changed);
        let second = recorder(&selection_changed);

        selection_changed.emit(vec![2, 3]);
        assert_eq!(*first.lock(), vec![vec![2, 3]]);
        assert_eq!(*second.lock(), vec![vec![2, 3]]);
        assert_eq!(selection_changed.connection_count(), 2);
    }

    #[test]
    fn test_blocked_emits_are_dropped_not_queued() {
        let layout_changed = Signal::<u32>::new();
        let log = recorder(&layout_changed);

        layout_changed.set_blocked(true);
        layout_changed.emit(1);
        layout_changed.emit(2);
        layout_changed.set_blocked(false);
        layout_changed.emit(3);

        assert_eq!(*log.lock(), vec![3]);
    }

    #[test]
    fn test_slot_can_disconnect_itself() {
        let signal = Arc::new(Signal::<()>::new());
        let id_cell: Arc<Mutex<Option<ConnectionId>>> = Arc::new(Mutex::new(None));

        let inner = signal.clone();
        let own_id = id_cell.clone();
        let id = signal.connect(move |_| {
            if let Some(id) = *own_id.lock() {
                inner.disconnect(id);
            }
        });
        *id_cell.lock() = Some(id);

        signal.emit(());
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn test_guard_outliving_signal() {
        let signal = Arc::new(Signal::<usize>::new());
        let guard = signal.connect_scoped(|_| {});
        assert!(signal.disconnect(guard.id()));
        drop(signal);
        drop(guard);
    }

    #[test]
    fn test_disconnect_all() {
        let signal = Signal::<()>::new();
        recorder(&signal);
        recorder(&signal);
        signal.disconnect_all();
        assert_eq!(signal.connection_count(), 0);
    }
}
