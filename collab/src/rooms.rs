use crate::types::{ConnectionId, RoomId};
use std::collections::HashMap;

/// Maps a document id to the connections currently joined to it.
///
/// Rooms are never created explicitly: an entry materializes on first join
/// and is pruned once its last member leaves. Any document snapshot cached
/// for the room outlives the entry.
#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: HashMap<RoomId, Vec<ConnectionId>>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
        }
    }

    /// No-op if the connection is already a member.
    pub fn join(&mut self, room_id: &str, connection_id: ConnectionId) {
        let members = self.rooms.entry(room_id.to_owned()).or_default();
        if !members.contains(&connection_id) {
            members.push(connection_id);
        }
    }

    pub fn leave(&mut self, room_id: &str, connection_id: ConnectionId) {
        if let Some(members) = self.rooms.get_mut(room_id) {
            members.retain(|member| *member != connection_id);
            if members.is_empty() {
                self.rooms.remove(room_id);
            }
        }
    }

    /// Members in join order; empty for unknown rooms.
    pub fn members_of(&self, room_id: &str) -> &[ConnectionId] {
        self.rooms
            .get(room_id)
            .map(|members| members.as_slice())
            .unwrap_or(&[])
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_materializes_rooms_on_first_join() {
        let mut directory = RoomDirectory::new();
        assert!(directory.members_of("doc1").is_empty());

        directory.join("doc1", 1);
        directory.join("doc1", 2);
        directory.join("doc1", 1); // already a member
        assert_eq!(directory.members_of("doc1"), &[1, 2]);
    }

    #[test]
    fn it_prunes_rooms_when_last_member_leaves() {
        let mut directory = RoomDirectory::new();
        directory.join("doc1", 1);
        directory.join("doc1", 2);

        directory.leave("doc1", 1);
        assert_eq!(directory.members_of("doc1"), &[2]);
        assert_eq!(directory.room_count(), 1);

        directory.leave("doc1", 2);
        assert_eq!(directory.room_count(), 0);

        // leaving an unknown room is a no-op
        directory.leave("doc1", 2);
    }
}
