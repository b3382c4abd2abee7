pub mod actions;
pub mod mocks;
pub mod peer;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use assertions::SentFrames;
#[allow(unused_imports)]
pub use mocks::{mock_transport, EventRecorder, MockPeer, MockTransport};
#[allow(unused_imports)]
pub use peer::{start_peer, TestPeer};
#[allow(unused_imports)]
pub use setup::{TestSetup, TestSetupBuilder};
