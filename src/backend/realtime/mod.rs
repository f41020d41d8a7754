//! Real-time Module
//!
//! Fan-out of board updates to live WebSocket connections.
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── hub.rs          - Single-task registry of live sessions
//! ├── scope.rs        - Who receives syncs and relays
//! ├── session.rs      - Read/write pumps for one connection
//! └── subscription.rs - GET /api/ws upgrade handler
//! ```
//!
//! # Flow
//!
//! A client upgrades through `/api/ws`, becomes a session and registers with
//! the hub. Every `POST /api/data/sync` ends with a `sync` broadcast through
//! the same hub, and messages a session sends (other than `ping`) are relayed
//! to the recipients the [`BroadcastScope`] selects.

/// Session registry and broadcaster
pub mod hub;

/// Broadcast partitioning
pub mod scope;

/// Per-connection pumps
pub mod session;

/// WebSocket upgrade handler
pub mod subscription;

pub use hub::{spawn_hub, HubError, HubHandle, Recipients, SessionId, SessionInfo};
pub use scope::BroadcastScope;
pub use subscription::handle_ws_subscription;
