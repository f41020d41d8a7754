/**
 * Connection Hub
 *
 * Registry of live sessions plus fan-out. The live set is owned by a single
 * task; every operation is a command on one unbounded channel, so the map is
 * never touched by two pumps at once and callers never block.
 *
 * # Delivery Policy
 *
 * Each session has a bounded outbound queue. A message is offered with
 * `try_send`; a session whose queue is full (or whose receiver is gone) is
 * removed on the spot. Removing it drops the only sender, which closes the
 * queue, and the session's write pump takes it from there. One slow
 * consumer therefore costs its own connection, never the hub's progress.
 *
 * # Ordering
 *
 * Commands issued from one task are processed in issue order, so a
 * `register` followed by a `broadcast` from the same task always reaches the
 * new session, and `live_sessions` reflects every earlier command.
 */

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::sync::mpsc::error::TrySendError;

use crate::shared::{SharedError, WireMessage};

/// Serialized message shared between every queue it is offered to
pub type Payload = Arc<str>;

/// Hub-assigned id of one live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which live sessions a delivery targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipients {
    Everyone,
    /// Everyone whose identity differs from this one
    EveryoneExcept(String),
    /// Every session of one identity
    Account(String),
    /// Every session of one identity except the given one
    AccountExcept { identity: String, session: SessionId },
}

impl Recipients {
    /// `exclude_identity` of `""` excludes no one
    pub fn excluding(exclude_identity: &str) -> Self {
        if exclude_identity.is_empty() {
            Recipients::Everyone
        } else {
            Recipients::EveryoneExcept(exclude_identity.to_string())
        }
    }

    fn includes(&self, id: SessionId, identity: &str) -> bool {
        match self {
            Recipients::Everyone => true,
            Recipients::EveryoneExcept(excluded) => identity != excluded,
            Recipients::Account(owner) => identity == owner,
            Recipients::AccountExcept { identity: owner, session } => {
                identity == owner && id != *session
            }
        }
    }
}

/// A live session as seen by the hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: SessionId,
    pub identity: String,
}

/// Hub-side half of a registration, handed to the session's pumps
#[derive(Debug)]
pub struct SessionLink {
    pub id: SessionId,
    pub identity: String,
    /// Closed by the hub on unregister or overflow
    pub outbound: mpsc::Receiver<Payload>,
}

#[derive(Debug, Error)]
pub enum HubError {
    #[error("hub is not running")]
    Stopped,

    #[error(transparent)]
    Encode(#[from] SharedError),
}

enum Command {
    Register {
        id: SessionId,
        identity: String,
        outbound: mpsc::Sender<Payload>,
    },
    Unregister {
        id: SessionId,
    },
    Deliver {
        payload: Payload,
        kind: String,
        recipients: Recipients,
    },
    LiveSessions {
        reply: oneshot::Sender<Vec<SessionInfo>>,
    },
}

struct LiveSession {
    identity: String,
    outbound: mpsc::Sender<Payload>,
}

/// Cloneable handle to the hub task.
///
/// The task exits once every handle is dropped.
#[derive(Clone, Debug)]
pub struct HubHandle {
    commands: mpsc::UnboundedSender<Command>,
    next_id: Arc<AtomicU64>,
    queue_capacity: usize,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Register { id, identity, .. } => write!(f, "Register({}, {})", id, identity),
            Command::Unregister { id } => write!(f, "Unregister({})", id),
            Command::Deliver { kind, recipients, .. } => write!(f, "Deliver({}, {:?})", kind, recipients),
            Command::LiveSessions { .. } => write!(f, "LiveSessions"),
        }
    }
}

/// Start the hub task and return a handle to it
pub fn spawn_hub(queue_capacity: usize) -> HubHandle {
    let (commands, rx) = mpsc::unbounded_channel();
    tokio::spawn(run(rx));
    tracing::info!("[Hub] started (queue capacity {})", queue_capacity);
    HubHandle {
        commands,
        next_id: Arc::new(AtomicU64::new(1)),
        queue_capacity: queue_capacity.max(1),
    }
}

impl HubHandle {
    /// Add a session for `identity` and return its outbound queue.
    ///
    /// Takes effect for every command issued after this call.
    pub fn register(&self, identity: impl Into<String>) -> Result<SessionLink, HubError> {
        let identity = identity.into();
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        self.send(Command::Register {
            id,
            identity: identity.clone(),
            outbound: tx,
        })?;
        Ok(SessionLink {
            id,
            identity,
            outbound: rx,
        })
    }

    /// Remove a session and close its queue. No-op if already gone.
    pub fn unregister(&self, id: SessionId) {
        // A stopped hub has already dropped every queue
        let _ = self.send(Command::Unregister { id });
    }

    /// Serialize once and offer to every session except those of `exclude_identity`
    pub fn broadcast(&self, message: &WireMessage, exclude_identity: &str) -> Result<(), HubError> {
        self.deliver(message, Recipients::excluding(exclude_identity))
    }

    /// Serialize once and offer to the selected sessions
    pub fn deliver(&self, message: &WireMessage, recipients: Recipients) -> Result<(), HubError> {
        let payload: Payload = message.encode()?.into();
        self.send(Command::Deliver {
            payload,
            kind: message.kind().to_string(),
            recipients,
        })
    }

    /// Snapshot of the live set, ordered by session id
    pub async fn live_sessions(&self) -> Result<Vec<SessionInfo>, HubError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::LiveSessions { reply })?;
        rx.await.map_err(|_| HubError::Stopped)
    }

    fn send(&self, command: Command) -> Result<(), HubError> {
        self.commands.send(command).map_err(|_| HubError::Stopped)
    }
}

async fn run(mut commands: mpsc::UnboundedReceiver<Command>) {
    let mut sessions: HashMap<SessionId, LiveSession> = HashMap::new();

    while let Some(command) = commands.recv().await {
        match command {
            Command::Register {
                id,
                identity,
                outbound,
            } => {
                tracing::info!("[Hub] session {} registered for {}", id, identity);
                sessions.insert(id, LiveSession { identity, outbound });
            }
            Command::Unregister { id } => {
                if let Some(session) = sessions.remove(&id) {
                    tracing::info!("[Hub] session {} unregistered ({})", id, session.identity);
                }
            }
            Command::Deliver {
                payload,
                kind,
                recipients,
            } => deliver(&mut sessions, &payload, &kind, &recipients),
            Command::LiveSessions { reply } => {
                let mut live: Vec<SessionInfo> = sessions
                    .iter()
                    .map(|(id, s)| SessionInfo {
                        id: *id,
                        identity: s.identity.clone(),
                    })
                    .collect();
                live.sort_by_key(|s| s.id);
                let _ = reply.send(live);
            }
        }
    }

    tracing::info!("[Hub] all handles dropped, closing {} sessions", sessions.len());
}

fn deliver(
    sessions: &mut HashMap<SessionId, LiveSession>,
    payload: &Payload,
    kind: &str,
    recipients: &Recipients,
) {
    let mut delivered = 0usize;
    sessions.retain(|id, session| {
        if !recipients.includes(*id, &session.identity) {
            return true;
        }
        match session.outbound.try_send(payload.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(
                    "[Hub] queue full for session {} ({}), dropping it",
                    id,
                    session.identity
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!("[Hub] session {} already gone, removing", id);
                false
            }
        }
    });
    tracing::debug!("[Hub] '{}' delivered to {} sessions ({:?})", kind, delivered, recipients);
}
