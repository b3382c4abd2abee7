// Public API - what other modules can use
pub use handle::RoomHandle;
pub use models::{PeerId, Room};
pub use registry::RoomRegistry;

// Internal modules
mod handle;
mod models;
mod registry;
