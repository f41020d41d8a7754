//! Kanban Sync - Main Library
//!
//! Keeps one account's kanban board consistent across browser tabs,
//! devices and offline periods.
//!
//! # Module Structure
//!
//! - **`shared`** - Types used on both sides
//!   - Board snapshot model, the merge function, the wire envelope
//!   - `SharedError`
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Axum server with magic-link auth and JWT sessions
//!   - Pull/push endpoints serialized per account
//!   - WebSocket hub fanning merged boards out to live sessions
//!   - SQLite persistence through sqlx
//!
//! - **`client`** - Native sync client
//!   - Debounced and periodic pushes, realtime link with reconnect
//!   - Offline-first local board file
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - builds the backend and the server binary
//!
//! # Usage
//!
//! ```rust,no_run
//! use kanban_sync::backend::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = create_app(ServerConfig::load()?).await?;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Consistency Model
//!
//! The server never trusts a client's view of deletions: removed items
//! travel as tombstones, and a task the client does not mention is kept
//! from the server copy. Every successful push is broadcast as a complete
//! board, which clients adopt outright.

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;

/// Sync client
pub mod client;
