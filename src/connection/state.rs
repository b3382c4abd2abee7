use strum_macros::{Display, EnumIter};

/// Lifecycle of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    /// Transport opened, waiting for the peer's root join acknowledgment
    Connecting,
    /// Root handshake done; application traffic allowed
    Open,
    /// Transport closed and every room torn down
    Closed,
}
