//! Broadcast scope: who hears about a board change.
//!
//! - `Account` keeps every account in its own broadcast domain. Merged
//!   boards go to the owner's sessions only, and relayed client messages go
//!   to the sender's other sessions.
//! - `Shared` is one domain for everybody. Merged boards go to every
//!   session, and relays go to every session of a different identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::backend::realtime::hub::{Recipients, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastScope {
    #[default]
    Account,
    Shared,
}

impl BroadcastScope {
    /// Recipients of the merged board after `owner` pushed
    pub fn sync_recipients(&self, owner: &str) -> Recipients {
        match self {
            BroadcastScope::Account => Recipients::Account(owner.to_string()),
            BroadcastScope::Shared => Recipients::Everyone,
        }
    }

    /// Recipients of a client message relayed from `sender`'s session
    pub fn relay_recipients(&self, sender: &str, session: SessionId) -> Recipients {
        match self {
            BroadcastScope::Account => Recipients::AccountExcept {
                identity: sender.to_string(),
                session,
            },
            BroadcastScope::Shared => Recipients::excluding(sender),
        }
    }
}

impl FromStr for BroadcastScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "account" => Ok(BroadcastScope::Account),
            "shared" => Ok(BroadcastScope::Shared),
            other => Err(format!("unknown broadcast scope '{}', expected account or shared", other)),
        }
    }
}

impl fmt::Display for BroadcastScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BroadcastScope::Account => f.write_str("account"),
            BroadcastScope::Shared => f.write_str("shared"),
        }
    }
}
