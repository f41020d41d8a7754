//! In-memory board store.
//!
//! Same contract as the SQLite store. Also supports fault injection so the
//! sync path's failure handling can be exercised: [`MemoryStore::set_unavailable`]
//! makes every call fail and [`MemoryStore::set_load_delay`] widens the window
//! between a load and the following save.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::backend::storage::StorageError;
use crate::shared::Board;

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    boards: Arc<RwLock<HashMap<String, Board>>>,
    unavailable: Arc<AtomicBool>,
    load_delay_ms: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn set_load_delay(&self, delay: Duration) {
        self.load_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory store switched off".into()));
        }
        Ok(())
    }

    pub async fn load(&self, identity: &str) -> Result<Board, StorageError> {
        self.check_available()?;
        let delay = self.load_delay_ms.load(Ordering::SeqCst);
        let board = self
            .boards
            .read()
            .await
            .get(identity)
            .cloned()
            .unwrap_or_else(Board::initial);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Ok(board)
    }

    pub async fn save(&self, identity: &str, board: &Board) -> Result<(), StorageError> {
        self.check_available()?;
        self.boards
            .write()
            .await
            .insert(identity.to_string(), board.clone());
        Ok(())
    }

    /// Stored board without going through fault injection
    pub async fn peek(&self, identity: &str) -> Option<Board> {
        self.boards.read().await.get(identity).cloned()
    }
}
