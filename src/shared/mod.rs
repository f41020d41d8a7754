//! Shared Module
//!
//! Types used by both the server and the sync client: the board snapshot,
//! the merge function, the wire envelope and the shared error type. Nothing
//! in here performs I/O, so everything compiles with or without `ssr`.

/// Board, column and task snapshot model
pub mod board;

/// Snapshot reconciliation
pub mod merge;

/// Realtime wire messages
pub mod message;

/// Shared error types
pub mod error;

pub use board::{Board, Column, Priority, Task};
pub use error::SharedError;
pub use merge::{normalize, reconcile};
pub use message::{SyncMessage, TaskMove, WireMessage};
