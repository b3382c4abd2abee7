use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle event fired on a connection or room once its handshake completes
pub const OPEN: &str = "open";
/// Terminal lifecycle event fired exactly once per connection and per room
pub const CLOSE: &str = "close";
/// Transport error, fired on the connection only
pub const ERROR: &str = "error";
/// A peer joined a room
pub const JOINED: &str = "joined";
/// A peer left a room
pub const LEFT: &str = "left";

/// Meta event fired when a listener is added
pub const NEW_LISTENER: &str = "newListener";
/// Meta event fired when a listener is removed
pub const REMOVE_LISTENER: &str = "removeListener";

/// Event name carried by a frame
///
/// The four handshake events are reserved; every other name is an
/// application event delivered verbatim to listeners.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Event {
    /// Join request (client -> peer) or join acknowledgment (peer -> client)
    Join,
    /// A member announces itself in a room
    Joined,
    /// Leave request, or the peer closing a room / the whole connection
    Leave,
    /// A member announces it left a room
    Left,
    /// Application-chosen event name
    Custom(String),
}

impl Event {
    /// Wire names of the handshake events
    pub const RESERVED: [&'static str; 4] = ["join", "joined", "leave", "left"];

    pub fn as_str(&self) -> &str {
        match self {
            Event::Join => "join",
            Event::Joined => "joined",
            Event::Leave => "leave",
            Event::Left => "left",
            Event::Custom(name) => name,
        }
    }

    /// Whether this is one of the handshake events
    pub fn is_reserved(&self) -> bool {
        !matches!(self, Event::Custom(_))
    }
}

impl From<&str> for Event {
    fn from(name: &str) -> Self {
        match name {
            "join" => Event::Join,
            "joined" => Event::Joined,
            "leave" => Event::Leave,
            "left" => Event::Left,
            other => Event::Custom(other.to_string()),
        }
    }
}

impl From<String> for Event {
    fn from(name: String) -> Self {
        match name.as_str() {
            "join" | "joined" | "leave" | "left" => Event::from(name.as_str()),
            _ => Event::Custom(name),
        }
    }
}

impl From<Event> for String {
    fn from(event: Event) -> Self {
        match event {
            Event::Custom(name) => name,
            reserved => reserved.as_str().to_string(),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
