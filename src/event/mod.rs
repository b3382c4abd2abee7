// Named-event primitives shared by connections and rooms
//
// Every connection and every room embeds its own emitter; frames are
// turned into emitter firings by the connection dispatcher.

// Public API - what other modules can use
pub use emitter::{EventEmitter, Listener, ListenerId};
pub use events::{Event, CLOSE, ERROR, JOINED, LEFT, NEW_LISTENER, OPEN, REMOVE_LISTENER};
pub(crate) use readiness::{wait_for_open, Readiness};

// Internal modules
mod emitter;
mod events;
mod readiness;
