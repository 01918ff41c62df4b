use crate::types::{ConnectionId, RoomId};
use thiserror::Error;

/// Everything that can go wrong while handling a real-time event.
///
/// `InvalidJoinPayload` and `NotAMember` are expected client misbehavior: the
/// event is logged and discarded, the connection stays up. The other two are
/// invariant violations that should not occur in correct operation; the server
/// loop tolerates them as no-ops but tests treat them as failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RealtimeError {
    #[error("connection {0} is already registered")]
    DuplicateConnection(ConnectionId),
    #[error("connection {0} is not registered")]
    UnknownConnection(ConnectionId),
    #[error("join payload carries no usable room id")]
    InvalidJoinPayload,
    #[error("connection {0} is not a member of room {1}")]
    NotAMember(ConnectionId, RoomId),
}
