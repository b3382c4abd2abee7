use serde_json::Value;

use wsrooms::frame::{encode, Frame};
use wsrooms::{Event, Outbound};

use super::assertions::SentFrames;
use super::setup::TestSetup;

// ============================================================================
// Action Helpers
// ============================================================================

impl TestSetup {
    /// Deliver one frame from the peer
    pub fn deliver(&self, room: &str, event: &str, payload: Value) {
        let text = encode(room, &Event::from(event), &payload).unwrap();
        self.connection.handle_message(&text);
    }

    /// Deliver raw transport bytes from the peer
    pub fn deliver_raw(&self, text: &str) {
        self.connection.handle_message(text);
    }

    /// Simulate the transport closing
    pub fn close_transport(&self) {
        self.connection.handle_close();
    }

    /// Drain everything the connection queued for the transport
    pub fn sent(&mut self) -> SentFrames {
        let mut frames = vec![];
        let mut close_requested = false;
        while let Ok(outbound) = self.outbound.try_recv() {
            match outbound {
                Outbound::Frame(text) => {
                    frames.push(Frame::decode(&text).expect("connection sent a malformed frame"))
                }
                Outbound::Close => close_requested = true,
            }
        }
        SentFrames::new(frames, close_requested)
    }

    /// Forget everything queued so far
    pub fn clear_sent(&mut self) {
        while self.outbound.try_recv().is_ok() {}
    }
}
