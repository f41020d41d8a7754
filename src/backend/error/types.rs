/**
 * Backend Error Types
 *
 * Errors raised while serving HTTP requests and WebSocket upgrades.
 * Every variant maps to a status code so handlers can return
 * `Result<_, BackendError>` directly.
 *
 * # Error Categories
 *
 * - `HandlerError` - request-level failures with an explicit status
 * - `Unauthorized` - missing, invalid or expired credential (401)
 * - `MergeUnavailable` - storage failed during load or save (503, retryable)
 * - `ProtocolError` - malformed request body or wire message (400)
 * - `StateError` - internal state failures such as a stopped hub (500)
 */

use thiserror::Error;
use axum::http::StatusCode;
use crate::backend::auth::AuthError;
use crate::backend::storage::StorageError;
use crate::shared::SharedError;

/// Backend-specific error types
///
/// ```rust
/// use kanban_sync::backend::error::BackendError;
/// use axum::http::StatusCode;
///
/// let err = BackendError::handler(StatusCode::BAD_REQUEST, "Invalid email address");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error with an explicit status code
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// Credential rejected
    #[error(transparent)]
    Unauthorized(#[from] AuthError),

    /// Storage failed while loading or saving a board.
    ///
    /// Nothing was committed or broadcast; the client may retry.
    #[error("Merge unavailable: {0}")]
    MergeUnavailable(#[from] StorageError),

    /// State management error
    #[error("State error: {message}")]
    StateError {
        /// Human-readable error message
        message: String,
    },

    /// Malformed request or message
    #[error("Protocol error: {message}")]
    ProtocolError {
        /// Human-readable error message
        message: String,
    },

    /// Shared error (from shared module)
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Create a new state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::StateError {
            message: message.into(),
        }
    }

    /// Create a new protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolError {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `HandlerError` - Uses the status code from the error
    /// - `Unauthorized` - 401 Unauthorized
    /// - `MergeUnavailable` - 503 Service Unavailable
    /// - `StateError` - 500 Internal Server Error
    /// - `ProtocolError` - 400 Bad Request
    /// - `SharedError` - Depends on the shared error type
    /// - `SerializationError` - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::MergeUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::StateError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ProtocolError { .. } => StatusCode::BAD_REQUEST,
            Self::SharedError(err) => match err {
                SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::ProtocolError { .. } => StatusCode::BAD_REQUEST,
            },
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::StateError { message } => message.clone(),
            Self::ProtocolError { message } => message.clone(),
            Self::MergeUnavailable(_) => "Storage temporarily unavailable, retry later".to_string(),
            Self::Unauthorized(err) => err.to_string(),
            Self::SharedError(err) => err.to_string(),
            Self::SerializationError(err) => err.to_string(),
        }
    }

    /// Whether the client should retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::MergeUnavailable(_))
    }
}
