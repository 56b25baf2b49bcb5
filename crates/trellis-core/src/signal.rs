//! Signal/slot system for Trellis.
//!
//! Signals are emitted when state changes and invoke every connected slot.
//! Slots may be bound to a [`Dispatcher`] so that emissions from worker
//! threads are delivered on the dispatcher's owning (UI) thread.
//!
//! # Connection Types
//!
//! - **Direct**: Slot is called immediately in the emitting thread
//! - **Queued**: Slot is always posted to the dispatcher
//! - **Auto**: Direct on the dispatcher's thread, queued otherwise (default
//!   for [`Signal::connect_on`])
//!
//! Queued slots run in emission order: the dispatcher drains its queue FIFO.
//!
//! # Example
//!
//! ```
//! use trellis_core::{Dispatcher, Signal};
//! use std::sync::Arc;
//!
//! let dispatcher = Dispatcher::new();
//! let added = Arc::new(Signal::<u32>::new());
//!
//! added.connect_on(&dispatcher, |value| {
//!     println!("added {value} on the UI thread");
//! });
//!
//! let remote = added.clone();
//! std::thread::spawn(move || remote.emit(1)).join().unwrap();
//!
//! // The slot runs once the UI thread drains its queue.
//! dispatcher.process_pending();
//! ```

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::dispatcher::Dispatcher;
use crate::error::SignalError;
use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    pub struct ConnectionId;
}

/// Specifies how a connected slot is invoked when the signal is emitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionType {
    /// Invoke the slot immediately in the emitting thread.
    Direct,

    /// Post the slot invocation to the dispatcher, even from its own thread.
    Queued,

    /// Direct on the dispatcher's owning thread, queued from any other thread.
    #[default]
    Auto,
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

struct Connection<Args> {
    slot: Slot<Args>,
    connection_type: ConnectionType,
    dispatcher: Option<Dispatcher>,
}

impl<Args> Clone for Connection<Args> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
            connection_type: self.connection_type,
            dispatcher: self.dispatcher.clone(),
        }
    }
}

/// A type-safe signal that can have multiple connected slots.
///
/// `Signal<Args>` is `Send + Sync` when `Args` is `Send`.
pub struct Signal<Args> {
    connections: Mutex<SlotMap<ConnectionId, Connection<Args>>>,
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
            .finish()
    }
}

impl<Args: Clone + Send + 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
        }
    }

    /// Connect a slot invoked directly on whichever thread emits.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.insert(Connection {
            slot: Arc::new(slot),
            connection_type: ConnectionType::Direct,
            dispatcher: None,
        })
    }

    /// Connect a slot that always runs on `dispatcher`'s owning thread.
    ///
    /// Uses [`ConnectionType::Auto`].
    pub fn connect_on<F>(&self, dispatcher: &Dispatcher, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connect_with_type(dispatcher, slot, ConnectionType::Auto)
    }

    /// Connect a slot bound to `dispatcher` with an explicit connection type.
    pub fn connect_with_type<F>(
        &self,
        dispatcher: &Dispatcher,
        slot: F,
        connection_type: ConnectionType,
    ) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.insert(Connection {
            slot: Arc::new(slot),
            connection_type,
            dispatcher: Some(dispatcher.clone()),
        })
    }

    fn insert(&self, connection: Connection<Args>) -> ConnectionId {
        let id = self.connections.lock().insert(connection);
        tracing::trace!(target: targets::SIGNAL, ?id, "slot connected");
        id
    }

    /// Disconnect a slot. Returns `true` if the connection existed.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnect a slot, reporting an unknown ID as an error.
    pub fn try_disconnect(&self, id: ConnectionId) -> Result<(), SignalError> {
        if self.disconnect(id) {
            Ok(())
        } else {
            Err(SignalError::InvalidConnection)
        }
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Emit the signal, invoking all connected slots.
    ///
    /// The connection list is snapshotted first, so slots may connect or
    /// disconnect on this signal without deadlocking.
    pub fn emit(&self, args: Args) {
        let snapshot: Vec<Connection<Args>> =
            self.connections.lock().values().cloned().collect();
        tracing::trace!(target: targets::SIGNAL, connection_count = snapshot.len(), "emitting signal");

        for conn in snapshot {
            let Some(dispatcher) = conn.dispatcher else {
                (conn.slot)(&args);
                continue;
            };

            match conn.connection_type {
                ConnectionType::Direct => (conn.slot)(&args),
                ConnectionType::Auto if dispatcher.is_owner_thread() => (conn.slot)(&args),
                ConnectionType::Auto | ConnectionType::Queued => {
                    let slot = conn.slot;
                    let args = args.clone();
                    if let Err(err) = dispatcher.post(move || slot(&args)) {
                        tracing::warn!(
                            target: targets::SIGNAL,
                            dispatcher = dispatcher.name(),
                            %err,
                            "dropping queued slot invocation"
                        );
                    }
                }
            }
        }
    }
}

impl<Args: Clone + Send + 'static> Signal<Args> {
    /// Connect a slot on `dispatcher` that is disconnected when the returned
    /// guard is dropped.
    pub fn connect_scoped<F>(
        self: &Arc<Self>,
        dispatcher: &Dispatcher,
        slot: F,
        connection_type: ConnectionType,
    ) -> ConnectionGuard<Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect_with_type(dispatcher, slot, connection_type);
        ConnectionGuard {
            signal: Arc::downgrade(self),
            id: Some(id),
        }
    }
}

/// A connection that disconnects itself when dropped.
///
/// Holds only a weak reference, so it never keeps the signal alive.
pub struct ConnectionGuard<Args: Clone + Send + 'static> {
    signal: Weak<Signal<Args>>,
    id: Option<ConnectionId>,
}

impl<Args: Clone + Send + 'static> ConnectionGuard<Args> {
    /// The guarded connection, if still connected.
    pub fn id(&self) -> Option<ConnectionId> {
        self.id
    }

    /// Whether the guard still refers to a live connection.
    pub fn is_connected(&self) -> bool {
        self.id.is_some() && self.signal.strong_count() > 0
    }

    /// Disconnect now instead of on drop.
    pub fn disconnect(&mut self) -> Result<(), SignalError> {
        let id = self.id.take().ok_or(SignalError::InvalidConnection)?;
        let signal = self.signal.upgrade().ok_or(SignalError::SignalDropped)?;
        signal.try_disconnect(id)
    }
}

impl<Args: Clone + Send + 'static> Drop for ConnectionGuard<Args> {
    fn drop(&mut self) {
        if self.id.is_some() {
            let _ = self.disconnect();
        }
    }
}

impl<Args: Clone + Send + 'static> std::fmt::Debug for ConnectionGuard<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionGuard")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}
