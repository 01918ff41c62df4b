use serde::{Deserialize, Serialize};

pub type ConnectionId = u64;

/// A room is keyed by the id of the document being edited.
pub type RoomId = String;

/// Opaque document content payload. Overwritten wholesale on every edit
/// (last-writer-wins), never inspected by this layer.
pub type Blob = String;

/// Identity attached to a connection. Supplied by the auth collaborator and
/// relayed as-is; this layer never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub avatar: Option<String>,
}
