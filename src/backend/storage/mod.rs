//! Board Storage
//!
//! Durable home for one board per identity. Handlers only ever see
//! [`BoardStore`], which dispatches to a concrete backend:
//!
//! - **`sqlite`** - `users` + `user_data` tables through an sqlx pool
//! - **`memory`** - a map behind a lock, used in tests and with `DATABASE_URL=memory`
//!
//! # Contract
//!
//! - `load(identity)` returns [`Board::initial`] when nothing is stored, never an error
//! - `save(identity, board)` either commits the whole board or fails; partial
//!   writes are not observable
//!
//! Serializing read-modify-write cycles per identity is the caller's job
//! (see `backend::sync::locks`).

/// Storage error types
pub mod error;

/// SQLite backend
pub mod sqlite;

/// In-memory backend
pub mod memory;

pub use error::StorageError;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::shared::Board;

/// Board storage backend
#[derive(Clone, Debug)]
pub enum BoardStore {
    Sqlite(SqliteStore),
    Memory(MemoryStore),
}

impl BoardStore {
    /// Open the store named by a database URL.
    ///
    /// `memory` selects the in-memory backend; anything else is handed to sqlx.
    pub async fn open(database_url: &str) -> Result<Self, StorageError> {
        if database_url == "memory" {
            tracing::warn!("[Storage] using in-memory store, boards will not survive restart");
            return Ok(Self::Memory(MemoryStore::new()));
        }
        Ok(Self::Sqlite(SqliteStore::connect(database_url).await?))
    }

    pub async fn load(&self, identity: &str) -> Result<Board, StorageError> {
        match self {
            Self::Sqlite(store) => store.load(identity).await,
            Self::Memory(store) => store.load(identity).await,
        }
    }

    pub async fn save(&self, identity: &str, board: &Board) -> Result<(), StorageError> {
        match self {
            Self::Sqlite(store) => store.save(identity, board).await,
            Self::Memory(store) => store.save(identity, board).await,
        }
    }
}

impl From<MemoryStore> for BoardStore {
    fn from(store: MemoryStore) -> Self {
        Self::Memory(store)
    }
}

impl From<SqliteStore> for BoardStore {
    fn from(store: SqliteStore) -> Self {
        Self::Sqlite(store)
    }
}
