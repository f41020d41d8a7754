use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::client::error::ClientError;

/// Default server URL
const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3001";

/// Directory under the platform data dir used for the local store
const APP_DIR: &str = "kanban-sync";

/// Timers driving the sync coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTimings {
    /// Quiet period after the last edit before pushing
    pub push_debounce: Duration,
    /// Push interval that runs regardless of edits
    pub fallback_interval: Duration,
    /// Wait before reconnecting a dropped realtime link
    pub reconnect_delay: Duration,
    /// Interval between `ping` messages on the realtime link
    pub heartbeat_interval: Duration,
    /// Delay before the full push that follows a `taskMove` delta
    pub move_reconcile_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for SyncTimings {
    fn default() -> Self {
        Self {
            push_debounce: Duration::from_millis(500),
            fallback_interval: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(3),
            heartbeat_interval: Duration::from_secs(25),
            move_reconcile_delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    /// Session token from a completed magic-link login
    pub token: Option<String>,
    /// E-mail the token belongs to, for display
    pub identity: Option<String>,
    /// Hold a WebSocket to the hub; polling-only when false
    pub realtime: bool,
    pub timings: SyncTimings,
    /// Where `board.json` lives; `None` uses the platform data dir
    pub data_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            token: None,
            identity: None,
            realtime: true,
            timings: SyncTimings::default(),
            data_dir: None,
        }
    }
}

impl ClientConfig {
    /// Defaults with `CLIENT_API_URL` applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("CLIENT_API_URL") {
            if !url.trim().is_empty() {
                config.server_url = url.trim().to_string();
            }
        }
        config
    }

    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.server_url.trim_end_matches('/'), path)
    }

    /// WebSocket endpoint carrying `token` in the query string
    pub fn ws_url(&self, token: &str) -> Result<String, ClientError> {
        let mut url = Url::parse(&self.api_url("/api/ws"))
            .map_err(|e| ClientError::Config(format!("bad server url '{}': {}", self.server_url, e)))?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(ClientError::Config(format!("unsupported scheme '{}'", other)));
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| ClientError::Config(format!("cannot switch {} to {}", url, scheme)))?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(url.to_string())
    }

    /// Directory for the local store, if one can be determined
    pub fn store_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join(APP_DIR)))
    }
}
