//! Change notification.
//!
//! Collections and stores publish their mutations through a [`Signal`]. Views
//! connect closures to the signals they care about and re-render the delta
//! carried by each emitted event.
//!
//! Slots are snapshotted before an emission runs, so a slot may connect or
//! disconnect slots (or emit another signal) without deadlocking. A slot
//! connected during an emission first runs on the next one.
//!
//! ```
//! use horizon_grid_core::Signal;
//!
//! let count_changed = Signal::<usize>::new();
//! let id = count_changed.connect(|count| println!("{count} visible records"));
//!
//! count_changed.emit(42);
//! assert!(count_changed.disconnect(id));
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// Handle of a connected slot, for [`Signal::disconnect`].
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A list of listeners for events of type `Args`, invoked in connection order.
pub struct Signal<Args> {
    slots: Mutex<SlotMap<ConnectionId, Slot<Args>>>,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal").field("slots", &self.connection_count()).finish()
    }
}

impl<Args: 'static> Signal<Args> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(SlotMap::with_key()),
        }
    }

    /// Listen for emissions until [`disconnect`](Self::disconnect)ed.
    pub fn connect(&self, slot: impl Fn(&Args) + Send + Sync + 'static) -> ConnectionId {
        self.slots.lock().insert(Arc::new(slot))
    }

    /// Listen for emissions while the returned guard is alive.
    pub fn connect_scoped(
        &self,
        slot: impl Fn(&Args) + Send + Sync + 'static,
    ) -> ConnectionGuard<'_, Args> {
        ConnectionGuard {
            id: self.connect(slot),
            signal: self,
        }
    }

    /// Returns `false` when `id` was not connected.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.slots.lock().remove(id).is_some()
    }

    pub fn connection_count(&self) -> usize {
        self.slots.lock().len()
    }

    /// Invoke every slot connected when the emission starts.
    pub fn emit(&self, args: Args) {
        let slots: Vec<Slot<Args>> = self.slots.lock().values().cloned().collect();
        if slots.is_empty() {
            return;
        }
        tracing::trace!(target: targets::SIGNAL, slots = slots.len(), "emit");
        for slot in slots {
            slot(&args);
        }
    }
}

/// Disconnects its slot on drop. Created by [`Signal::connect_scoped`].
pub struct ConnectionGuard<'a, Args: 'static> {
    signal: &'a Signal<Args>,
    id: ConnectionId,
}

impl<Args: 'static> ConnectionGuard<'_, Args> {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl<Args: 'static> Drop for ConnectionGuard<'_, Args> {
    fn drop(&mut self) {
        self.signal.disconnect(self.id);
    }
}

static_assertions::assert_impl_all!(Signal<()>: Send, Sync);

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_emit_in_connection_order() {
        let signal = Signal::<&'static str>::new();
        let received = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second"] {
            let sink = received.clone();
            signal.connect(move |event| sink.lock().push(format!("{tag}:{event}")));
        }

        signal.emit("add");
        assert_eq!(*received.lock(), vec!["first:add", "second:add"]);
    }

    #[test]
    fn test_disconnect() {
        let signal = Signal::<i32>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let id = signal.connect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        signal.emit(1);
        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        signal.emit(2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_scoped_connection() {
        let signal = Signal::<()>::new();
        {
            let guard = signal.connect_scoped(|_| {});
            assert_eq!(signal.connection_count(), 1);
            assert!(signal.disconnect(guard.id()));
            signal.connect(|_| {});
        }
        assert_eq!(signal.connection_count(), 1);
    }

    #[test]
    fn test_connect_while_emitting() {
        let signal = Arc::new(Signal::<u32>::new());
        let inner = signal.clone();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        signal.connect(move |_| {
            let counter = counter.clone();
            inner.connect(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        });

        signal.emit(1);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(signal.connection_count(), 2);

        signal.emit(2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
