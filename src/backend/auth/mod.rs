//! Authentication Module
//!
//! Passwordless login for board owners.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - AuthError and the IdentityProvider seam
//! ├── sessions.rs     - JWT session tokens
//! ├── magic_link.rs   - One-time login tokens
//! ├── mailer.rs       - SMTP delivery of login links
//! └── handlers/       - HTTP handlers
//!     ├── mod.rs
//!     ├── types.rs    - Request/response types
//!     ├── login.rs    - POST /api/auth/login
//!     ├── magic_link.rs - GET /api/auth/magic-link
//!     └── verify.rs   - GET /api/auth/verify
//! ```
//!
//! # Authentication Flow
//!
//! 1. **Login**: the client posts an e-mail, the server issues a one-time
//!    token and mails (and, for development, returns) the link
//! 2. **Magic link**: following the link redeems the token and redirects to
//!    `/?token=<jwt>&email=<email>`
//! 3. **Requests**: the JWT travels as `Authorization: Bearer` on data
//!    endpoints and as `?token=` on the WebSocket upgrade

use thiserror::Error;

/// JWT session tokens
pub mod sessions;

/// One-time login tokens
pub mod magic_link;

/// Magic link delivery
pub mod mailer;

/// HTTP handlers for authentication endpoints
pub mod handlers;

pub use handlers::{login, redeem_magic_link, verify};
pub use magic_link::MagicLinkStore;
pub use mailer::Mailer;
pub use sessions::TokenService;

/// Credential rejected
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing authorization credential")]
    MissingCredential,

    #[error("Invalid authorization format")]
    MalformedHeader,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    Expired,
}

/// Resolves a presented credential to an identity.
///
/// Called once per HTTP request or WebSocket upgrade.
pub trait IdentityProvider: Send + Sync {
    fn authenticate(&self, credential: &str) -> Result<String, AuthError>;
}
