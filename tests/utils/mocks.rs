#![allow(dead_code)] // Test utilities may not all be used in every test

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout, Instant};

use wsrooms::frame::{encode, Frame};
use wsrooms::{Event, EventEmitter, Transport, TransportError};

// ============================================================================
// Event Recorder
// ============================================================================

/// Records every firing of the given events on an emitter
#[derive(Clone, Default)]
pub struct EventRecorder {
    fired: Arc<Mutex<Vec<(String, Value)>>>,
}

impl EventRecorder {
    pub fn attach(emitter: &EventEmitter, events: &[&str]) -> Self {
        let recorder = Self::default();
        for event in events {
            let fired = recorder.fired.clone();
            let name = event.to_string();
            emitter.on(event, move |payload| {
                fired.lock().unwrap().push((name.clone(), payload.clone()));
            });
        }
        recorder
    }

    pub fn all(&self) -> Vec<(String, Value)> {
        self.fired.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.all().into_iter().map(|(name, _)| name).collect()
    }

    pub fn count(&self, event: &str) -> usize {
        self.all().iter().filter(|(name, _)| name == event).count()
    }

    pub fn payloads(&self, event: &str) -> Vec<Value> {
        self.all()
            .into_iter()
            .filter(|(name, _)| name == event)
            .map(|(_, payload)| payload)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fired.lock().unwrap().is_empty()
    }

    /// Poll until `event` has fired `times` times
    pub async fn wait_for(&self, event: &str, times: usize) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while self.count(event) < times {
            assert!(
                Instant::now() < deadline,
                "timed out waiting for {times} x `{event}`, saw {:?}",
                self.names()
            );
            sleep(Duration::from_millis(5)).await;
        }
    }
}

// ============================================================================
// Mock Transport
// ============================================================================

pub enum MockInbound {
    Text(String),
    Error(String),
    HangUp,
}

/// Channel-backed transport handed to the connection under test
pub struct MockTransport {
    inbound: mpsc::UnboundedReceiver<MockInbound>,
    sent: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
}

/// The test's side of a [`MockTransport`]
pub struct MockPeer {
    inbound: mpsc::UnboundedSender<MockInbound>,
    sent: mpsc::UnboundedReceiver<String>,
    closed: Arc<AtomicBool>,
}

pub fn mock_transport() -> (MockTransport, MockPeer) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (sent_tx, sent_rx) = mpsc::unbounded_channel();
    let closed = Arc::new(AtomicBool::new(false));
    (
        MockTransport {
            inbound: inbound_rx,
            sent: sent_tx,
            closed: closed.clone(),
        },
        MockPeer {
            inbound: inbound_tx,
            sent: sent_rx,
            closed,
        },
    )
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_message(&mut self, message: String) -> Result<(), TransportError> {
        self.sent
            .send(message)
            .map_err(|_| TransportError::ConnectionClosed)
    }

    async fn receive_message(&mut self) -> Result<Option<String>, TransportError> {
        match self.inbound.recv().await {
            Some(MockInbound::Text(text)) => Ok(Some(text)),
            Some(MockInbound::Error(e)) => Err(TransportError::ReceiveFailed(e)),
            Some(MockInbound::HangUp) | None => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl MockPeer {
    pub fn send_frame(&self, room: &str, event: &str, payload: Value) {
        let text = encode(room, &Event::from(event), &payload).unwrap();
        self.send_raw(&text);
    }

    pub fn send_raw(&self, text: &str) {
        let _ = self.inbound.send(MockInbound::Text(text.to_string()));
    }

    pub fn fail(&self, message: &str) {
        let _ = self.inbound.send(MockInbound::Error(message.to_string()));
    }

    pub fn hang_up(&self) {
        let _ = self.inbound.send(MockInbound::HangUp);
    }

    /// Next frame the connection wrote to the transport
    pub async fn next_frame(&mut self) -> Frame {
        let text = timeout(Duration::from_secs(2), self.sent.recv())
            .await
            .expect("timed out waiting for an outbound frame")
            .expect("transport dropped");
        Frame::decode(&text).expect("connection sent a malformed frame")
    }

    pub fn transport_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
