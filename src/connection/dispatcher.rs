use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use super::handle::Connection;
use super::state::ConnectionState;
use crate::event::{Event, EventEmitter, CLOSE, ERROR, JOINED, LEFT, OPEN};
use crate::frame::{decode, Frame, ROOT};
use crate::room::Room;
use crate::transport::TransportError;

/// Incoming side of the protocol. Frames are handled one at a time, in
/// delivery order, and listeners run synchronously before this returns.
impl Connection {
    /// Decode and dispatch one transport message. Malformed input is logged
    /// and dropped; it never changes state.
    pub fn handle_message(&self, text: &str) {
        match decode(text) {
            Ok(frame) => self.handle_frame(frame),
            Err(e) => warn!(error = %e, "Dropping malformed frame"),
        }
    }

    pub fn handle_frame(&self, frame: Frame) {
        if self.state() == ConnectionState::Closed {
            debug!(room = %frame.room, event = %frame.event, "Dropping frame received after close");
            return;
        }

        if frame.is_root() {
            self.dispatch_root(frame.event, frame.payload);
            return;
        }

        let Frame {
            room,
            event,
            payload,
        } = frame;

        match self.inner.rooms.get(&room) {
            Some(room) => self.dispatch_room(&room, event, payload),
            // A room left locally can still receive a few late frames
            None => debug!(room = %room, event = %event, "Dropping frame for unknown room"),
        }
    }

    fn dispatch_root(&self, event: Event, payload: Value) {
        match event {
            Event::Join => {
                {
                    let mut core = self.lock_core();
                    if core.state != ConnectionState::Connecting {
                        debug!(self_id = %payload, "Ignoring repeated root join acknowledgment");
                        return;
                    }
                    core.self_id = Some(payload.clone());
                    core.state = ConnectionState::Open;
                }
                info!(self_id = %payload, "Connection open");
                self.inner.emitter.emit(OPEN, &Value::Null);
                self.transmit(ROOT, &Event::Joined, &payload);
            }
            Event::Leave => {
                info!("Peer asked to close the connection");
                self.close();
            }
            event => self.passthrough(&self.inner.emitter, ROOT, &event, &payload),
        }
    }

    fn dispatch_room(&self, room: &Arc<Room>, event: Event, payload: Value) {
        let name = room.name();
        match event {
            Event::Join => {
                if !room.mark_open(payload.clone()) {
                    debug!(room = %name, "Ignoring repeated room join acknowledgment");
                    return;
                }
                info!(room = %name, room_id = %payload, "Room open");
                room.emitter().emit(OPEN, &Value::Null);
                self.transmit(name, &Event::Joined, &self.self_id().unwrap_or_default());
            }
            Event::Joined => {
                if self.is_self(&payload) || !room.add_member(payload.clone()) {
                    trace!(room = %name, peer = %payload, "Member already known");
                    return;
                }
                debug!(room = %name, peer = %payload, "Member joined");
                room.emitter().emit(JOINED, &payload);
            }
            Event::Leave => self.close_room(room),
            Event::Left => {
                if self.is_self(&payload) || !room.remove_member(&payload) {
                    trace!(room = %name, peer = %payload, "Member not known");
                    return;
                }
                debug!(room = %name, peer = %payload, "Member left");
                room.emitter().emit(LEFT, &payload);
            }
            event => self.passthrough(room.emitter(), name, &event, &payload),
        }
    }

    /// Peer-initiated leave: close, unregister, then announce our departure
    fn close_room(&self, room: &Arc<Room>) {
        if !room.mark_closed() {
            return;
        }
        info!(room = %room.name(), "Room closed");
        room.emitter().emit(CLOSE, &Value::Null);
        self.inner.rooms.remove(room);
        self.transmit(room.name(), &Event::Left, &self.self_id().unwrap_or_default());
    }

    fn passthrough(&self, emitter: &EventEmitter, room: &str, event: &Event, payload: &Value) {
        if !emitter.emit(event.as_str(), payload) {
            trace!(room = %room, event = %event, "No listeners for event");
        }
    }

    fn is_self(&self, peer: &Value) -> bool {
        self.lock_core().self_id.as_ref() == Some(peer)
    }

    /// Transport closed, locally or remotely. Every registered room observes
    /// exactly one `close`, then the connection does. Idempotent.
    pub fn handle_close(&self) {
        {
            let mut core = self.lock_core();
            if core.closing {
                return;
            }
            core.closing = true;
        }

        for room in self.inner.rooms.snapshot() {
            if room.mark_closed() {
                room.emitter().emit(CLOSE, &Value::Null);
            }
            self.inner.rooms.remove(&room);
        }

        self.lock_core().state = ConnectionState::Closed;
        info!("Connection closed");
        self.inner.emitter.emit(CLOSE, &Value::Null);
    }

    /// Surface a transport error. Closing is left to the transport.
    pub fn handle_error(&self, error: &TransportError) {
        warn!(error = %error, "Transport error");
        self.inner
            .emitter
            .emit(ERROR, &Value::String(error.to_string()));
    }
}
