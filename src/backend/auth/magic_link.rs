//! One-time login links.
//!
//! A login request stores a random token for the e-mail address. Following
//! the link redeems the token exactly once; expired tokens are treated as
//! unknown and pruned periodically.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

struct PendingLink {
    email: String,
    expires_at: Instant,
}

#[derive(Clone)]
pub struct MagicLinkStore {
    pending: Arc<Mutex<HashMap<String, PendingLink>>>,
    ttl: Duration,
}

impl MagicLinkStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Store a fresh token for `email` and return it
    pub fn issue(&self, email: &str) -> String {
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.insert(
            token.clone(),
            PendingLink {
                email: email.to_string(),
                expires_at: Instant::now() + self.ttl,
            },
        );
        token
    }

    /// Consume a token, returning its e-mail if it was valid
    pub fn redeem(&self, token: &str) -> Option<String> {
        let link = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)?;
        (link.expires_at > Instant::now()).then_some(link.email)
    }

    /// Drop expired tokens, returning how many were removed
    pub fn prune_expired(&self) -> usize {
        let now = Instant::now();
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let before = pending.len();
        pending.retain(|_, link| link.expires_at > now);
        before - pending.len()
    }
}
