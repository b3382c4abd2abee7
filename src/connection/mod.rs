// Connection: owns the transport channel, the root emitter and the room
// registry, and runs the join/leave handshake over incoming frames.

// Public API
pub use handle::{Connection, Outbound};
pub(crate) use handle::WeakConnection;
pub use state::ConnectionState;

// Internal modules
mod dispatcher;
mod handle;
mod state;
