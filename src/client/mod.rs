//! Sync Client
//!
//! Native client for the board sync protocol. It keeps a local copy of the
//! board, pushes edits to the server, and applies what the hub broadcasts.
//!
//! # Module Structure
//!
//! ```text
//! client/
//! ├── mod.rs          - Module exports and documentation
//! ├── config.rs       - Server URL, token and timers
//! ├── error.rs        - ClientError
//! ├── api.rs          - GET /api/data/get, POST /api/data/sync
//! ├── local_store.rs  - board.json on disk
//! ├── edit.rs         - Local board edits
//! ├── state.rs        - ConnectionState and SyncStatus
//! ├── connection.rs   - WebSocket link to the hub
//! └── coordinator.rs  - The sync actor
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use kanban_sync::client::{coordinator, ClientConfig, Edit};
//!
//! # async fn example() -> Result<(), kanban_sync::client::ClientError> {
//! let config = ClientConfig::from_env().with_token("jwt");
//! let (handle, _task) = coordinator::start(config).await?;
//! handle.edit(Edit::AddColumn { id: "todo".into(), title: "Todo".into() })?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod connection;
pub mod coordinator;
pub mod edit;
pub mod error;
pub mod local_store;
pub mod state;

pub use api::BoardApi;
pub use config::{ClientConfig, SyncTimings};
pub use coordinator::{start, CoordinatorHandle};
pub use edit::{new_id, Edit};
pub use error::ClientError;
pub use local_store::LocalStore;
pub use state::{ConnectionState, SyncStatus};
