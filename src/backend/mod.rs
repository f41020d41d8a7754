//! Backend Module
//!
//! Server side of kanban sync: an Axum server that stores one board per
//! account, merges pushed boards into it and fans the result out to every
//! live WebSocket connection.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - configuration, application state, initialization
//! - **`routes`** - router assembly
//! - **`auth`** - magic-link login and JWT session tokens
//! - **`middleware`** - bearer token check
//! - **`sync`** - pull/push handlers and per-identity serialization
//! - **`realtime`** - hub, sessions and the WebSocket endpoint
//! - **`storage`** - SQLite and in-memory board stores
//! - **`error`** - `BackendError` and its HTTP mapping
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs
//! ├── main.rs         - Server binary
//! ├── server/
//! ├── routes/
//! ├── auth/
//! ├── middleware/
//! ├── sync/
//! ├── realtime/
//! ├── storage/
//! └── error/
//! ```
//!
//! # Concurrency
//!
//! - The hub's live set is owned by one task and reached through `HubHandle`
//! - Each session runs a read pump and a write pump as separate tasks
//! - Pushes for one identity are serialized by `sync::IdentityLocks`;
//!   different identities merge in parallel

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Real-time hub and sessions
pub mod realtime;

/// Backend error types
pub mod error;

/// Authentication
pub mod auth;

/// Middleware for request processing
pub mod middleware;

/// Board pull/push
pub mod sync;

/// Board persistence
pub mod storage;

pub use error::BackendError;
pub use realtime::{spawn_hub, BroadcastScope, HubHandle, Recipients};
pub use server::{create_app, create_app_with, AppState, ServerConfig};
pub use storage::{BoardStore, MemoryStore, SqliteStore, StorageError};
pub use sync::SyncService;
