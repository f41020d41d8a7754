//! Authentication Handlers Module
//!
//! HTTP handlers for the passwordless login flow.
//!
//! # Module Structure
//!
//! ```text
//! handlers/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Request and response types
//! ├── login.rs      - Magic link request handler
//! ├── magic_link.rs - Magic link redemption handler
//! └── verify.rs     - Token check handler
//! ```
//!
//! # Handlers
//!
//! - **`login`** - POST /api/auth/login - Issue a magic link
//! - **`redeem_magic_link`** - GET /api/auth/magic-link - Exchange it for a JWT
//! - **`verify`** - GET /api/auth/verify - Confirm a JWT is still valid

/// Request and response types
pub mod types;

/// Login handler
pub mod login;

/// Magic link redemption handler
pub mod magic_link;

/// Token verification handler
pub mod verify;

pub use types::{LoginRequest, LoginResponse, MagicLinkQuery, VerifyResponse};

pub use login::login;
pub use magic_link::redeem_magic_link;
pub use verify::verify;
