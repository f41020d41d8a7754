//! One async mutex per identity, created on first use.
//!
//! The table itself sits behind a plain mutex that is never held across an
//! await; only the per-identity mutexes are.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Clone, Default, Debug)]
pub struct IdentityLocks {
    table: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl IdentityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `identity`
    pub async fn acquire(&self, identity: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            table.entry(identity.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Drop entries nobody holds or waits on, returning how many were removed
    pub fn prune_idle(&self) -> usize {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        let before = table.len();
        // A held guard or a pending acquire keeps its own clone of the Arc
        table.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - table.len()
    }

    pub fn len(&self) -> usize {
        self.table.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
