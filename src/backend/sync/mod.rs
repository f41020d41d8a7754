//! Board Sync
//!
//! The server half of the sync protocol: pull a board, or push a board and
//! get the merged result back.
//!
//! # Module Structure
//!
//! ```text
//! sync/
//! ├── mod.rs      - Module exports and documentation
//! ├── locks.rs    - Per-identity async mutexes
//! ├── service.rs  - load → reconcile → save → broadcast
//! └── handlers.rs - GET /api/data/get, POST /api/data/sync
//! ```
//!
//! # Consistency
//!
//! A push for one identity holds that identity's lock from load to
//! broadcast. A second push that arrives meanwhile merges against the
//! first one's saved board, and broadcasts leave in merge order.

/// Per-identity locks
pub mod locks;

/// Merge service
pub mod service;

/// HTTP handlers
pub mod handlers;

pub use handlers::{get_board, sync_board, BoardResponse};
pub use locks::IdentityLocks;
pub use service::SyncService;
