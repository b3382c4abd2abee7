use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),
}

/// Duplex, message-oriented channel - all we care about is send/receive
#[async_trait]
pub trait Transport: Send {
    /// Send one text message to the peer
    async fn send_message(&mut self, message: String) -> Result<(), TransportError>;

    /// Receive the next message from the peer (None if the connection closed)
    async fn receive_message(&mut self) -> Result<Option<String>, TransportError>;

    /// Close the connection
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Direct implementation on a tungstenite WebSocket stream
#[async_trait]
impl<S> Transport for WebSocketStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_message(&mut self, message: String) -> Result<(), TransportError> {
        self.send(Message::text(message))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn receive_message(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            match self.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_str().to_owned())),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Ok(Some(text)),
                    Err(_) => debug!(len = bytes.len(), "Skipping non UTF-8 binary message"),
                },
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // Ping/pong are answered by tungstenite itself
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(TransportError::ReceiveFailed(e.to_string())),
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        WebSocketStream::close(self, None)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }
}
