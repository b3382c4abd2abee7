use serde_json::Value;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

use super::state::ConnectionState;
use crate::event::{wait_for_open, Event, EventEmitter, Readiness};
use crate::frame::{encode, ROOT};
use crate::room::{PeerId, RoomHandle, RoomRegistry};
use crate::shared::ClientError;
use crate::transport::{Driver, Transport};

/// Traffic handed to the transport driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// An encoded frame
    Frame(String),
    /// Close the transport
    Close,
}

#[derive(Debug)]
pub(super) struct Core {
    pub(super) state: ConnectionState,
    pub(super) self_id: Option<PeerId>,
    /// Set once teardown starts; no new traffic or rooms after that
    pub(super) closing: bool,
}

pub(super) struct Inner {
    pub(super) core: Mutex<Core>,
    pub(super) rooms: RoomRegistry,
    pub(super) emitter: EventEmitter,
    pub(super) outbound: mpsc::UnboundedSender<Outbound>,
}

/// One multiplexed connection: the root room plus its named sub-rooms
///
/// Cheap to clone; clones share state. Dereferences to the root
/// [`EventEmitter`], where `open`, `close`, `error` and root-addressed
/// application events are fired.
///
/// The transport driver only holds a weak reference: once every
/// `Connection` and [`RoomHandle`] is dropped the transport is closed.
/// Listeners that capture a `Connection` keep it alive until `close()`.
#[derive(Clone)]
pub struct Connection {
    pub(super) inner: Arc<Inner>,
}

/// Non-owning reference to a [`Connection`], held by the transport driver
#[derive(Clone)]
pub(crate) struct WeakConnection {
    inner: Weak<Inner>,
}

impl WeakConnection {
    pub(crate) fn upgrade(&self) -> Option<Connection> {
        self.inner.upgrade().map(|inner| Connection { inner })
    }
}

impl Connection {
    /// Create a connection in `connecting` state. Outbound traffic is
    /// delivered on the returned receiver.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (outbound, receiver) = mpsc::unbounded_channel();
        let connection = Self {
            inner: Arc::new(Inner {
                core: Mutex::new(Core {
                    state: ConnectionState::Connecting,
                    self_id: None,
                    closing: false,
                }),
                rooms: RoomRegistry::new(),
                emitter: EventEmitter::new(),
                outbound,
            }),
        };
        (connection, receiver)
    }

    /// Create a connection and drive it over `transport` on a background task
    pub fn spawn(transport: Box<dyn Transport>) -> (Self, JoinHandle<()>) {
        let (connection, outbound) = Self::new();
        let driver = Driver::new(&connection, transport, outbound);
        let task = tokio::spawn(driver.run());
        (connection, task)
    }

    pub(crate) fn downgrade(&self) -> WeakConnection {
        WeakConnection {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub(super) fn lock_core(&self) -> MutexGuard<'_, Core> {
        self.inner.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> ConnectionState {
        self.lock_core().state
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Identifier the peer assigned to us in the root handshake
    pub fn self_id(&self) -> Option<PeerId> {
        self.lock_core().self_id.clone()
    }

    pub fn emitter(&self) -> &EventEmitter {
        &self.inner.emitter
    }

    /// Handle to a registered room (open or join-requested)
    pub fn room(&self, name: &str) -> Option<RoomHandle> {
        self.inner
            .rooms
            .get(name)
            .map(|room| RoomHandle::new(room, self.clone()))
    }

    /// Names of all registered rooms, sorted
    pub fn room_names(&self) -> Vec<String> {
        self.inner.rooms.names()
    }

    /// Send an application event to the root room
    pub fn send(&self, event: impl Into<Event>, payload: Value) -> bool {
        self.send_to(ROOT, event, payload)
    }

    /// Send an application event to `room`
    ///
    /// Silently ignored (returns false) unless the connection is open and
    /// `room` is the root or an open room. Handshake event names are
    /// reserved for `join`/`leave` and are refused here, which is stricter
    /// than the wire protocol: a peer would accept them as ordinary frames.
    pub fn send_to(&self, room: &str, event: impl Into<Event>, payload: Value) -> bool {
        let event = event.into();
        if event.is_reserved() {
            debug!(room = %room, event = %event, "Ignoring send of a handshake event");
            return false;
        }
        if room != ROOT && !self.inner.rooms.get(room).is_some_and(|r| r.is_open()) {
            debug!(room = %room, event = %event, "Ignoring send to a room that is not open");
            return false;
        }
        self.transmit(room, &event, &payload)
    }

    /// Request to join `name`. Returns None if the connection is not open,
    /// the name is empty or reserved, or the room is already registered.
    #[instrument(skip(self))]
    pub fn join(&self, name: &str) -> Option<RoomHandle> {
        if !self.accepts_traffic() {
            debug!("Ignoring join while connection is not open");
            return None;
        }
        if name.is_empty() || name == ROOT {
            debug!("Ignoring join with an invalid room name");
            return None;
        }
        let Some(room) = self.inner.rooms.register(name) else {
            debug!("Ignoring join of an already registered room");
            return None;
        };
        // Teardown may have started on the reader side since the check above
        if !self.accepts_traffic() {
            self.inner.rooms.remove(&room);
            return None;
        }

        self.transmit(name, &Event::Join, &Value::Null);
        info!("Join requested");
        Some(RoomHandle::new(room, self.clone()))
    }

    /// Ask the peer to remove us from `room`
    #[instrument(skip(self))]
    pub fn leave(&self, room: &str) -> bool {
        if room == ROOT || !self.inner.rooms.contains(room) {
            debug!("Ignoring leave of an unregistered room");
            return false;
        }
        self.transmit(room, &Event::Leave, &Value::Null)
    }

    /// Close the transport and tear down every room
    #[instrument(skip(self))]
    pub fn close(&self) {
        if self.inner.outbound.send(Outbound::Close).is_err() {
            debug!("Transport already gone");
        }
        self.handle_close();
    }

    /// Wait for the root handshake, giving up after `wait`
    pub async fn wait_open(&self, wait: Duration) -> Result<(), ClientError> {
        wait_for_open(&self.inner.emitter, || self.readiness(), wait).await
    }

    fn readiness(&self) -> Readiness {
        match self.state() {
            ConnectionState::Connecting => Readiness::Pending,
            ConnectionState::Open => Readiness::Open,
            ConnectionState::Closed => Readiness::Closed,
        }
    }

    pub(super) fn accepts_traffic(&self) -> bool {
        let core = self.lock_core();
        core.state == ConnectionState::Open && !core.closing
    }

    /// Queue a frame for the transport; only checks that the connection is open
    pub(super) fn transmit(&self, room: &str, event: &Event, payload: &Value) -> bool {
        if !self.accepts_traffic() {
            debug!(room = %room, event = %event, "Ignoring send while connection is not open");
            return false;
        }
        let text = match encode(room, event, payload) {
            Ok(text) => text,
            Err(e) => {
                warn!(room = %room, event = %event, error = %e, "Failed to encode frame");
                return false;
            }
        };

        trace!(room = %room, event = %event, "Queueing frame");
        if self.inner.outbound.send(Outbound::Frame(text)).is_err() {
            debug!(room = %room, event = %event, "Transport is gone, dropping frame");
            return false;
        }
        true
    }
}

impl Deref for Connection {
    type Target = EventEmitter;

    fn deref(&self) -> &Self::Target {
        &self.inner.emitter
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.lock_core();
        f.debug_struct("Connection")
            .field("state", &core.state)
            .field("self_id", &core.self_id)
            .field("rooms", &self.inner.rooms.names())
            .finish()
    }
}
