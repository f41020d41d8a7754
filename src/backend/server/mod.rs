//! Server Module
//!
//! Initialization and configuration of the Axum server.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs     - Module exports and documentation
//! ├── state.rs   - AppState and FromRef implementations
//! ├── config.rs  - Layered configuration (defaults, TOML, environment)
//! └── init.rs    - Store, hub and router assembly
//! ```

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

pub use config::{ConfigError, ServerConfig, SessionConfig, SmtpConfig};
pub use init::{create_app, create_app_with, InitError};
pub use state::AppState;
