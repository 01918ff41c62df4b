use crate::types::{Blob, User};
use serde::{Deserialize, Serialize};

/// Events received from a client, tagged by event name on the wire:
/// `{"event":"join","data":{"roomId":"…","user":{…}}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    Join(JoinPayload),
    SendChanges(ChangePayload),
}

/// The `join` payload. Older clients send a bare room id string instead of
/// the object form, so both shapes deserialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JoinPayload {
    Room {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(default)]
        user: Option<User>,
    },
    Legacy(String),
}

impl JoinPayload {
    pub fn room_id(&self) -> &str {
        match self {
            JoinPayload::Room { room_id, .. } => room_id,
            JoinPayload::Legacy(room_id) => room_id,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            JoinPayload::Room { user, .. } => user.as_ref(),
            JoinPayload::Legacy(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePayload {
    #[serde(rename = "roomId")]
    pub room_id: String,
    pub content: Blob,
}

/// Events fanned out to clients, same tagging scheme as [`ClientMessage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Seeds a late joiner with the last known document content.
    LoadDocument { content: Blob },
    /// A peer joined the room. The user may be null when the joiner supplied
    /// no identity; it is relayed as stored.
    UserJoined { user: Option<User> },
    /// Full roster of the room, one entry per connection with an identity.
    UsersInRoom { users: Vec<User> },
    /// A peer edited the document.
    ReceiveChanges { content: Blob },
    /// A peer's connection went away.
    UserLeft { user: Option<User> },
}
