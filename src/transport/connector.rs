use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Error as WsError;
use tracing::{info, instrument, warn};

use crate::connection::Connection;
use crate::shared::{ClientConfig, ClientError};

/// Open a WebSocket to `url` and return a connection in `connecting` state
///
/// The connection becomes usable once the peer acknowledges the root join;
/// see [`Connection::wait_open`].
pub async fn connect(url: &str) -> Result<Connection, ClientError> {
    connect_with(&ClientConfig::new(url)).await
}

#[instrument(skip(config), fields(url = %config.url))]
pub async fn connect_with(config: &ClientConfig) -> Result<Connection, ClientError> {
    let (stream, response) = connect_async(config.url.as_str())
        .await
        .map_err(|e| match e {
            WsError::Url(e) => ClientError::InvalidUrl(e.to_string()),
            WsError::HttpFormat(e) => ClientError::InvalidUrl(e.to_string()),
            other => {
                warn!(error = %other, "WebSocket handshake failed");
                ClientError::Connect(other.to_string())
            }
        })?;

    info!(status = %response.status(), "WebSocket connected");
    let (connection, _driver) = Connection::spawn(Box::new(stream));
    Ok(connection)
}
