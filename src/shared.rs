use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the peer URL
pub const URL_ENV: &str = "WSROOMS_URL";
/// Environment variable holding the open timeout in milliseconds
pub const OPEN_TIMEOUT_ENV: &str = "WSROOMS_OPEN_TIMEOUT_MS";

const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(5);

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket URL of the peer (`ws://` or `wss://`)
    pub url: String,
    /// How long callers wait for the root handshake before giving up
    pub open_timeout: Duration,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            open_timeout: DEFAULT_OPEN_TIMEOUT,
        }
    }

    pub fn with_open_timeout(mut self, open_timeout: Duration) -> Self {
        self.open_timeout = open_timeout;
        self
    }

    /// Load configuration from `WSROOMS_URL` and `WSROOMS_OPEN_TIMEOUT_MS`
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let url =
            lookup(URL_ENV).ok_or_else(|| ClientError::Config(format!("{URL_ENV} must be set")))?;
        let mut config = Self::new(url);

        if let Some(raw) = lookup(OPEN_TIMEOUT_ENV) {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                ClientError::Config(format!("{OPEN_TIMEOUT_ENV} is not a number: {raw}"))
            })?;
            config.open_timeout = Duration::from_millis(millis);
        }

        Ok(config)
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Closed before opening")]
    Closed,

    #[error("Configuration error: {0}")]
    Config(String),
}
