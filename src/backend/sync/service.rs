/**
 * Sync Service
 *
 * Owns the push path: under the identity's lock, load the stored board,
 * reconcile the pushed one against it, save, and only then broadcast. A
 * storage failure at any step returns before anything is broadcast.
 */

use crate::backend::error::BackendError;
use crate::backend::realtime::{BroadcastScope, HubHandle};
use crate::backend::storage::{BoardStore, StorageError};
use crate::backend::sync::locks::IdentityLocks;
use crate::shared::{reconcile, Board, SyncMessage, WireMessage};

#[derive(Clone, Debug)]
pub struct SyncService {
    store: BoardStore,
    hub: HubHandle,
    locks: IdentityLocks,
    scope: BroadcastScope,
}

impl SyncService {
    pub fn new(store: BoardStore, hub: HubHandle, scope: BroadcastScope) -> Self {
        Self {
            store,
            hub,
            locks: IdentityLocks::new(),
            scope,
        }
    }

    pub fn store(&self) -> &BoardStore {
        &self.store
    }

    pub fn locks(&self) -> &IdentityLocks {
        &self.locks
    }

    /// Current stored board for `identity`
    pub async fn fetch(&self, identity: &str) -> Result<Board, BackendError> {
        let board = self.store.load(identity).await.map_err(|e| log_storage(identity, e))?;
        tracing::debug!(
            "[Sync] served board for {}: {} columns, {} tasks",
            identity,
            board.columns.len(),
            board.tasks.len()
        );
        Ok(board)
    }

    /// Merge a pushed board into the stored one and broadcast the result
    pub async fn push(&self, identity: &str, client: Board) -> Result<Board, BackendError> {
        let _guard = self.locks.acquire(identity).await;

        let server = self.store.load(identity).await.map_err(|e| log_storage(identity, e))?;
        let merged = reconcile(&server, &client);
        self.store
            .save(identity, &merged)
            .await
            .map_err(|e| log_storage(identity, e))?;

        tracing::info!(
            "[Sync] merged board for {}: {} columns, {} tasks",
            identity,
            merged.columns.len(),
            merged.tasks.len()
        );

        let message = WireMessage::new(SyncMessage::Sync(merged.clone()));
        if let Err(e) = self.hub.deliver(&message, self.scope.sync_recipients(identity)) {
            // The merge is committed; clients catch up on their next push
            tracing::warn!("[Sync] broadcast for {} failed: {}", identity, e);
        }
        Ok(merged)
    }
}

fn log_storage(identity: &str, e: StorageError) -> BackendError {
    tracing::error!("[Sync] storage failure for {}: {}", identity, e);
    BackendError::MergeUnavailable(e)
}
