// Public API
pub use codec::{decode, encode, Frame, FrameError, ROOT};

// Internal modules
mod codec;
