//! Wire Messages
//!
//! Every frame on the realtime connection is a JSON envelope:
//!
//! ```json
//! { "type": "sync", "data": { ... }, "user": "alice@example.com" }
//! ```
//!
//! The envelope decodes into a closed [`SyncMessage`] enum. Unknown `type`
//! values keep their raw payload in [`SyncMessage::Other`] so newer clients
//! can relay kinds this build does not understand.
//!
//! `user` is stamped by the server with the sender's identity when a client
//! message is relayed. Server-originated broadcasts leave it empty.

use chrono::{SecondsFormat, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::shared::board::Board;
use crate::shared::error::SharedError;

pub const KIND_SYNC: &str = "sync";
pub const KIND_TASK_MOVE: &str = "taskMove";
pub const KIND_PING: &str = "ping";
pub const KIND_PONG: &str = "pong";

/// Low-latency single-task move delta
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMove {
    pub task_id: String,
    /// `None` moves the task to the unassigned lane
    #[serde(default)]
    pub column_id: Option<String>,
}

/// The payload of a wire message, keyed by its `type`
#[derive(Debug, Clone, PartialEq)]
pub enum SyncMessage {
    /// Complete merged board
    Sync(Board),
    TaskMove(TaskMove),
    Ping,
    Pong { timestamp: String },
    /// Any other kind, relayed opaquely
    Other { kind: String, data: Value },
}

impl SyncMessage {
    pub fn kind(&self) -> &str {
        match self {
            SyncMessage::Sync(_) => KIND_SYNC,
            SyncMessage::TaskMove(_) => KIND_TASK_MOVE,
            SyncMessage::Ping => KIND_PING,
            SyncMessage::Pong { .. } => KIND_PONG,
            SyncMessage::Other { kind, .. } => kind,
        }
    }

    /// A pong stamped with the current time
    pub fn pong_now() -> Self {
        SyncMessage::Pong {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// A decoded envelope: payload plus the optional sender stamp
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Envelope")]
pub struct WireMessage {
    pub payload: SyncMessage,
    pub user: Option<String>,
}

impl WireMessage {
    pub fn new(payload: SyncMessage) -> Self {
        Self { payload, user: None }
    }

    /// Stamp the message with the identity of the session that sent it
    pub fn from_user(mut self, identity: impl Into<String>) -> Self {
        let identity = identity.into();
        self.user = if identity.is_empty() { None } else { Some(identity) };
        self
    }

    pub fn kind(&self) -> &str {
        self.payload.kind()
    }

    pub fn decode(text: &str) -> Result<Self, SharedError> {
        serde_json::from_str(text).map_err(|e| SharedError::protocol(e.to_string()))
    }

    pub fn encode(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<SyncMessage> for WireMessage {
    fn from(payload: SyncMessage) -> Self {
        Self::new(payload)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    user: Option<String>,
}

#[derive(Serialize)]
struct PongData<'a> {
    timestamp: &'a str,
}

impl TryFrom<Envelope> for WireMessage {
    type Error = SharedError;

    fn try_from(env: Envelope) -> Result<Self, Self::Error> {
        let payload = match env.kind.as_str() {
            "" => return Err(SharedError::protocol("message type is empty")),
            KIND_SYNC => SyncMessage::Sync(
                serde_json::from_value(env.data)
                    .map_err(|e| SharedError::protocol(format!("bad sync payload: {}", e)))?,
            ),
            KIND_TASK_MOVE => SyncMessage::TaskMove(
                serde_json::from_value(env.data)
                    .map_err(|e| SharedError::protocol(format!("bad taskMove payload: {}", e)))?,
            ),
            KIND_PING => SyncMessage::Ping,
            KIND_PONG => {
                let timestamp = env
                    .data
                    .get("timestamp")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                SyncMessage::Pong { timestamp }
            }
            _ => SyncMessage::Other {
                kind: env.kind,
                data: env.data,
            },
        };
        Ok(WireMessage {
            payload,
            user: env.user.filter(|u| !u.is_empty()),
        })
    }
}

impl Serialize for WireMessage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = if self.user.is_some() { 3 } else { 2 };
        let mut state = serializer.serialize_struct("WireMessage", len)?;
        state.serialize_field("type", self.payload.kind())?;
        match &self.payload {
            SyncMessage::Sync(board) => state.serialize_field("data", board)?,
            SyncMessage::TaskMove(delta) => state.serialize_field("data", delta)?,
            SyncMessage::Ping => state.serialize_field("data", &Value::Null)?,
            SyncMessage::Pong { timestamp } => state.serialize_field(
                "data",
                &PongData {
                    timestamp: timestamp.as_str(),
                },
            )?,
            SyncMessage::Other { data, .. } => state.serialize_field("data", data)?,
        }
        if let Some(user) = &self.user {
            state.serialize_field("user", user)?;
        }
        state.end()
    }
}
