use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::socket::Transport;
use crate::connection::{Connection, Outbound, WeakConnection};

/// Pumps frames between a [`Connection`] and its transport
///
/// Outbound frames come from the connection's channel; each inbound message
/// is dispatched synchronously before the next one is read. The driver does
/// not keep the connection alive: when its last handle is dropped the
/// outbound channel closes and so does the transport.
pub struct Driver {
    connection: WeakConnection,
    transport: Box<dyn Transport>,
    outbound: mpsc::UnboundedReceiver<Outbound>,
}

impl Driver {
    pub fn new(
        connection: &Connection,
        transport: Box<dyn Transport>,
        outbound: mpsc::UnboundedReceiver<Outbound>,
    ) -> Self {
        Self {
            connection: connection.downgrade(),
            transport,
            outbound,
        }
    }

    /// Run until either side closes, then tear the connection down
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                // Frames queued by the application or the dispatcher
                msg = self.outbound.recv() => {
                    match msg {
                        Some(Outbound::Frame(text)) => {
                            if let Err(e) = self.transport.send_message(text).await {
                                if let Some(connection) = self.connection.upgrade() {
                                    connection.handle_error(&e);
                                }
                                break;
                            }
                        }
                        Some(Outbound::Close) => {
                            debug!("Local close requested");
                            break;
                        }
                        None => {
                            debug!("Every connection handle dropped");
                            break;
                        }
                    }
                }

                // Frames from the peer
                msg = self.transport.receive_message() => {
                    match msg {
                        Ok(Some(text)) => match self.connection.upgrade() {
                            Some(connection) => connection.handle_message(&text),
                            None => break,
                        },
                        Ok(None) => {
                            info!("Peer closed the transport");
                            break;
                        }
                        Err(e) => {
                            if let Some(connection) = self.connection.upgrade() {
                                connection.handle_error(&e);
                            }
                            break;
                        }
                    }
                }
            }
        }

        if let Err(e) = self.transport.close().await {
            debug!(error = %e, "Transport close after shutdown failed");
        }
        if !self.outbound.is_empty() {
            warn!(pending = self.outbound.len(), "Discarding frames queued after close");
        }
        if let Some(connection) = self.connection.upgrade() {
            connection.handle_close();
        }
    }
}
