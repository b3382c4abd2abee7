// Room multiplexing over a single WebSocket connection
//
// Many named rooms share one transport; each room carries its own
// membership, lifecycle and event listeners.

pub mod connection;
pub mod event;
pub mod frame;
pub mod room;
pub mod shared;
pub mod transport;

// Re-export commonly used types for easier access
pub use connection::{Connection, ConnectionState, Outbound};
pub use event::{Event, EventEmitter, Listener, ListenerId};
pub use frame::{Frame, FrameError, ROOT};
pub use room::{PeerId, RoomHandle};
pub use shared::{ClientConfig, ClientError};
pub use transport::{connect, connect_with, Transport, TransportError};
