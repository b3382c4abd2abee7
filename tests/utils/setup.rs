use serde_json::{json, Value};
use tokio::sync::mpsc;

use wsrooms::{Connection, Outbound};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// A connection with no transport attached; the test plays the peer by
/// calling the dispatcher directly and reading the outbound channel
pub struct TestSetup {
    pub connection: Connection,
    pub outbound: mpsc::UnboundedReceiver<Outbound>,
}

pub struct TestSetupBuilder {
    self_id: Option<Value>,
    rooms: Vec<(String, Value)>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            self_id: None,
            rooms: vec![],
        }
    }

    /// Complete the root handshake with this id
    pub fn open_as(mut self, self_id: &str) -> Self {
        self.self_id = Some(json!(self_id));
        self
    }

    /// Join and acknowledge a room (requires `open_as`)
    pub fn with_room(mut self, name: &str, room_id: &str) -> Self {
        self.rooms.push((name.to_string(), json!(room_id)));
        self
    }

    pub fn build(self) -> TestSetup {
        let (connection, outbound) = Connection::new();
        let mut setup = TestSetup {
            connection,
            outbound,
        };

        if let Some(self_id) = self.self_id {
            setup.deliver("root", "join", self_id);
        }
        for (name, room_id) in self.rooms {
            setup
                .connection
                .join(&name)
                .expect("room join should be accepted");
            setup.deliver(&name, "join", room_id);
        }

        setup.clear_sent();
        setup
    }
}

impl Default for TestSetupBuilder {
    fn default() -> Self {
        Self::new()
    }
}
