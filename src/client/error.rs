//! Client-side error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server rejected the session token
    #[error("not authenticated")]
    Unauthorized,

    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("invalid response: {0}")]
    Decode(String),

    #[error("local store error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("sync coordinator stopped")]
    Stopped,
}
