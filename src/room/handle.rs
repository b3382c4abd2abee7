use serde_json::Value;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use super::models::{PeerId, Room};
use crate::connection::Connection;
use crate::event::{wait_for_open, Event, EventEmitter};
use crate::shared::ClientError;

/// Application-facing view of a joined room
///
/// Dereferences to the room's own [`EventEmitter`], so `on`/`once`/`off`/`emit`
/// act on the same listeners the dispatcher fires. Identity and membership
/// are read from the backing room, never copied.
#[derive(Clone)]
pub struct RoomHandle {
    room: Arc<Room>,
    connection: Connection,
}

impl RoomHandle {
    pub(crate) fn new(room: Arc<Room>, connection: Connection) -> Self {
        Self { room, connection }
    }

    pub fn name(&self) -> &str {
        self.room.name()
    }

    pub fn id(&self) -> Option<PeerId> {
        self.room.id()
    }

    pub fn is_open(&self) -> bool {
        self.room.is_open()
    }

    pub fn members(&self) -> Vec<PeerId> {
        self.room.members()
    }

    pub fn emitter(&self) -> &EventEmitter {
        self.room.emitter()
    }

    /// Send an application event to this room
    pub fn send(&self, event: impl Into<Event>, payload: Value) -> bool {
        self.connection.send_to(self.room.name(), event, payload)
    }

    /// Ask the peer to remove us from this room
    pub fn leave(&self) -> bool {
        self.connection.leave(self.room.name())
    }

    /// Alias of [`RoomHandle::leave`]
    pub fn close(&self) -> bool {
        self.leave()
    }

    /// Wait for the join acknowledgment, giving up after `wait`
    pub async fn wait_open(&self, wait: Duration) -> Result<(), ClientError> {
        wait_for_open(self.room.emitter(), || self.room.readiness(), wait).await
    }
}

impl Deref for RoomHandle {
    type Target = EventEmitter;

    fn deref(&self) -> &Self::Target {
        self.room.emitter()
    }
}

impl std::fmt::Debug for RoomHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomHandle")
            .field("name", &self.room.name())
            .field("id", &self.room.id())
            .field("open", &self.room.is_open())
            .finish()
    }
}
