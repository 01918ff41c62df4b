use crate::error::RealtimeError;
use crate::types::{ConnectionId, RoomId, User};
use std::collections::{HashMap, HashSet};

/// Per-connection state. Owned exclusively by the registry; created on
/// transport connect, destroyed on disconnect.
#[derive(Debug, Default)]
pub struct ConnectionEntry {
    pub user: Option<User>,
    pub rooms: HashSet<RoomId>,
}

/// Tracks every live connection, its attached identity and its joined rooms.
/// Pure state, never emits anything.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionEntry>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
        }
    }

    pub fn register(&mut self, connection_id: ConnectionId) -> Result<(), RealtimeError> {
        if self.connections.contains_key(&connection_id) {
            return Err(RealtimeError::DuplicateConnection(connection_id));
        }
        self.connections
            .insert(connection_id, ConnectionEntry::default());
        Ok(())
    }

    /// Last value wins; the wire may deliver no identity at all, which is
    /// stored as-is.
    pub fn attach_user(
        &mut self,
        connection_id: ConnectionId,
        user: Option<User>,
    ) -> Result<(), RealtimeError> {
        self.entry_mut(connection_id)?.user = user;
        Ok(())
    }

    pub fn add_room(
        &mut self,
        connection_id: ConnectionId,
        room_id: &str,
    ) -> Result<(), RealtimeError> {
        self.entry_mut(connection_id)?.rooms.insert(room_id.to_owned());
        Ok(())
    }

    pub fn remove_room(
        &mut self,
        connection_id: ConnectionId,
        room_id: &str,
    ) -> Result<(), RealtimeError> {
        self.entry_mut(connection_id)?.rooms.remove(room_id);
        Ok(())
    }

    /// Deletes the entry and hands back its final room set so the caller can
    /// drive leave notifications. `None` when the connection is already gone
    /// (repeated disconnects are a no-op).
    pub fn remove(&mut self, connection_id: ConnectionId) -> Option<HashSet<RoomId>> {
        self.connections
            .remove(&connection_id)
            .map(|entry| entry.rooms)
    }

    pub fn get(&self, connection_id: ConnectionId) -> Result<&ConnectionEntry, RealtimeError> {
        self.connections
            .get(&connection_id)
            .ok_or(RealtimeError::UnknownConnection(connection_id))
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    fn entry_mut(
        &mut self,
        connection_id: ConnectionId,
    ) -> Result<&mut ConnectionEntry, RealtimeError> {
        self.connections
            .get_mut(&connection_id)
            .ok_or(RealtimeError::UnknownConnection(connection_id))
    }
}
