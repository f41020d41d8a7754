//! Observable coordinator state.

use chrono::{DateTime, Utc};

/// Connection lifecycle as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No credential, or stopped after an auth failure or logout
    #[default]
    Disconnected,
    Connecting,
    /// Last pull/push succeeded and, with realtime on, the link is up
    Synced,
    /// Link dropped or the server is unreachable; retrying
    Reconnecting,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStatus {
    pub state: ConnectionState,
    pub last_synced: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    /// Set when the server rejected the token; cleared by a new login
    pub needs_login: bool,
}
