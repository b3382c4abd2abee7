//! Minimal room hub served over axum WebSockets, used as the remote peer
#![allow(dead_code)]

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

type Outbox = mpsc::UnboundedSender<String>;

#[derive(Clone, Default)]
struct HubState {
    next_id: Arc<AtomicUsize>,
    /// room name -> (member id, outbox)
    rooms: Arc<Mutex<HashMap<String, Vec<(String, Outbox)>>>>,
}

pub struct TestPeer {
    pub url: String,
    _server: JoinHandle<()>,
}

/// Serve the hub on an ephemeral port
pub async fn start_peer() -> TestPeer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(HubState::default());

    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestPeer {
        url: format!("ws://{addr}/ws"),
        _server: server,
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<HubState>) -> Response {
    ws.on_upgrade(move |socket| peer_session(socket, state))
}

fn frame(room: &str, event: &str, payload: &str) -> String {
    json!({"room": room, "event": event, "payload": payload}).to_string()
}

async fn peer_session(socket: WebSocket, state: HubState) {
    let id = format!("P{}", state.next_id.fetch_add(1, Ordering::SeqCst) + 1);
    let (mut sink, mut stream) = socket.split();
    let (outbox, mut outbox_rx) = mpsc::unbounded_channel::<String>();

    let writer = tokio::spawn(async move {
        while let Some(text) = outbox_rx.recv().await {
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    // Root handshake: assign the id
    let _ = outbox.send(frame("root", "join", &id));

    while let Some(Ok(message)) = stream.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        let Ok(envelope) = serde_json::from_str::<Value>(&text) else {
            continue;
        };
        let room = envelope["room"].as_str().unwrap_or_default().to_string();
        let event = envelope["event"].as_str().unwrap_or_default().to_string();
        let payload = envelope["payload"].as_str().unwrap_or_default().to_string();

        match (room.as_str(), event.as_str()) {
            ("root", _) => {}
            (_, "join") => {
                let mut rooms = state.rooms.lock().unwrap();
                let members = rooms.entry(room.clone()).or_default();
                let _ = outbox.send(frame(&room, "join", &id));
                // Tell the newcomer who is already here
                for (member, _) in members.iter() {
                    let _ = outbox.send(frame(&room, "joined", member));
                }
                members.push((id.clone(), outbox.clone()));
            }
            (_, "leave") => {
                let mut rooms = state.rooms.lock().unwrap();
                if let Some(members) = rooms.get_mut(&room) {
                    members.retain(|(member, _)| member != &id);
                }
                let _ = outbox.send(frame(&room, "leave", ""));
            }
            (_, "ping") => {
                let _ = outbox.send(frame(&room, "pong", &payload));
            }
            // joined, left and application events fan out to the other members
            _ => {
                let rooms = state.rooms.lock().unwrap();
                for (member, member_outbox) in rooms.get(&room).into_iter().flatten() {
                    if member != &id {
                        let _ = member_outbox.send(text.clone());
                    }
                }
            }
        }
    }

    // Disconnect: announce departure from every room
    {
        let mut rooms = state.rooms.lock().unwrap();
        for (room, members) in rooms.iter_mut() {
            members.retain(|(member, _)| member != &id);
            for (_, member_outbox) in members.iter() {
                let _ = member_outbox.send(frame(room, "left", &id));
            }
        }
    }
    drop(outbox);
    let _ = writer.await;
}
