use serde_json::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::event::{EventEmitter, Readiness};

/// Opaque peer identifier assigned by the remote side
pub type PeerId = Value;

#[derive(Debug, Default)]
struct RoomState {
    id: Option<PeerId>,
    open: bool,
    closed: bool,
    members: Vec<PeerId>,
}

/// A named logical channel multiplexed over the connection
#[derive(Debug)]
pub struct Room {
    name: String,
    state: Mutex<RoomState>,
    emitter: EventEmitter,
}

impl Room {
    /// Creates a room in join-requested state
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(RoomState::default()),
            emitter: EventEmitter::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RoomState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier assigned by the peer's join acknowledgment
    pub fn id(&self) -> Option<PeerId> {
        self.lock().id.clone()
    }

    pub fn is_open(&self) -> bool {
        self.lock().open
    }

    /// Peers currently known to be in the room, in join order
    pub fn members(&self) -> Vec<PeerId> {
        self.lock().members.clone()
    }

    pub fn emitter(&self) -> &EventEmitter {
        &self.emitter
    }

    pub(crate) fn readiness(&self) -> Readiness {
        let state = self.lock();
        if state.open {
            Readiness::Open
        } else if state.closed {
            Readiness::Closed
        } else {
            Readiness::Pending
        }
    }

    /// Promote to open. Returns false if the room was already open or closed.
    pub(crate) fn mark_open(&self, id: PeerId) -> bool {
        let mut state = self.lock();
        if state.open || state.closed {
            return false;
        }
        state.id = Some(id);
        state.open = true;
        true
    }

    /// Returns false if the room was already closed
    pub(crate) fn mark_closed(&self) -> bool {
        let mut state = self.lock();
        if state.closed {
            return false;
        }
        state.open = false;
        state.closed = true;
        true
    }

    /// Record a member. Returns false if it was already known.
    pub(crate) fn add_member(&self, peer: PeerId) -> bool {
        let mut state = self.lock();
        if state.members.contains(&peer) {
            return false;
        }
        state.members.push(peer);
        true
    }

    /// Forget a member. Returns false if it was not known.
    pub(crate) fn remove_member(&self, peer: &PeerId) -> bool {
        let mut state = self.lock();
        let before = state.members.len();
        state.members.retain(|p| p != peer);
        state.members.len() != before
    }
}
