use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::trace;

use crate::event::Event;

/// Name of the implicit room that stands for the whole connection
pub const ROOT: &str = "root";

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Malformed frame: {0}")]
    Malformed(String),

    #[error("Failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One unit of wire traffic
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub room: String,
    pub event: Event,
    pub payload: Value,
}

/// Outbound envelope; the payload is always a string on the wire
#[derive(Serialize)]
struct Envelope<'a> {
    room: &'a str,
    event: &'a str,
    payload: String,
}

/// Inbound envelope, lenient about payload shape
#[derive(Deserialize)]
struct InboundEnvelope {
    room: Option<Value>,
    event: Option<Value>,
    #[serde(default)]
    payload: Option<Value>,
}

impl Frame {
    pub fn new(room: impl Into<String>, event: impl Into<Event>, payload: Value) -> Self {
        Self {
            room: room.into(),
            event: event.into(),
            payload,
        }
    }

    pub fn is_root(&self) -> bool {
        self.room == ROOT
    }

    pub fn decode(text: &str) -> Result<Self, FrameError> {
        decode(text)
    }
}

/// Serialize a frame. The payload is serialized on its own first so that any
/// structured value survives a string-only envelope.
pub fn encode(room: &str, event: &Event, payload: &Value) -> Result<String, FrameError> {
    let envelope = Envelope {
        room,
        event: event.as_str(),
        payload: encode_payload(payload)?,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Parse a frame received from the transport
pub fn decode(text: &str) -> Result<Frame, FrameError> {
    let envelope: InboundEnvelope = match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Object(_)) => serde_json::from_value(value)
            .map_err(|e| FrameError::Malformed(e.to_string()))?,
        Ok(_) => return Err(FrameError::Malformed("envelope is not an object".into())),
        Err(e) => return Err(FrameError::Malformed(format!("not JSON: {e}"))),
    };

    let room = required_field(envelope.room, "room")?;
    let event = required_field(envelope.event, "event")?;
    let payload = match envelope.payload {
        Some(Value::String(raw)) => decode_payload(raw),
        Some(structured) => structured,
        None => Value::Null,
    };

    Ok(Frame {
        room,
        event: Event::from(event),
        payload,
    })
}

fn required_field(value: Option<Value>, field: &str) -> Result<String, FrameError> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        Some(Value::String(_)) => Err(FrameError::Malformed(format!("empty `{field}`"))),
        Some(_) => Err(FrameError::Malformed(format!("`{field}` is not a string"))),
        None => Err(FrameError::Malformed(format!("missing `{field}`"))),
    }
}

/// Strings go on the wire verbatim unless they would read back as JSON
fn encode_payload(payload: &Value) -> Result<String, serde_json::Error> {
    match payload {
        Value::String(s) if serde_json::from_str::<Value>(s).is_err() => Ok(s.clone()),
        other => serde_json::to_string(other),
    }
}

fn decode_payload(raw: String) -> Value {
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(_) => {
            trace!(payload = %raw, "Payload is not JSON, delivering raw string");
            Value::String(raw)
        }
    }
}
