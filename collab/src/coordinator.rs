use crate::error::RealtimeError;
use crate::messages::ServerMessage;
use crate::presence;
use crate::registry::ConnectionRegistry;
use crate::rooms::RoomDirectory;
use crate::snapshot::SnapshotCache;
use crate::types::{Blob, ConnectionId, User};

/// A message routed to one connection. Handlers return these in emission
/// order; the transport must deliver them in that order per connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub to: ConnectionId,
    pub message: ServerMessage,
}

/// Orchestrates registry, room directory and snapshot cache in response to
/// connection lifecycle events, and computes the resulting fan-out.
///
/// The coordinator is synchronous and transport-free: every handler is a
/// short in-memory mutation that returns the messages it produced. Callers
/// are expected to process events for a given room one at a time (a single
/// event loop is enough), which keeps the registry's per-connection room
/// sets and the directory's member sets in lockstep.
#[derive(Debug, Default)]
pub struct SessionCoordinator {
    pub registry: ConnectionRegistry,
    pub rooms: RoomDirectory,
    pub snapshots: SnapshotCache,
}

impl SessionCoordinator {
    pub fn new() -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            rooms: RoomDirectory::new(),
            snapshots: SnapshotCache::new(),
        }
    }

    /// A transport session came up. Emits nothing; the connection stays
    /// invisible to every room until it joins one.
    pub fn connect(&mut self, connection_id: ConnectionId) -> Result<(), RealtimeError> {
        self.registry.register(connection_id)
    }

    /// A connection joined a document room.
    ///
    /// Membership is applied before anything is broadcast, so the roster a
    /// joiner triggers always includes the joiner itself. Emission order:
    /// `user-joined` to prior members, `users-in-room` to the whole room,
    /// then `load-document` to the joiner alone when a snapshot exists.
    pub fn join(
        &mut self,
        from: ConnectionId,
        room_id: &str,
        user: Option<User>,
    ) -> Result<Vec<Outbound>, RealtimeError> {
        if room_id.is_empty() {
            return Err(RealtimeError::InvalidJoinPayload);
        }
        self.registry.attach_user(from, user.clone())?;
        self.rooms.join(room_id, from);
        self.registry.add_room(from, room_id)?;

        let mut out = Vec::new();
        for &peer in self.rooms.members_of(room_id) {
            if peer != from {
                out.push(Outbound {
                    to: peer,
                    message: ServerMessage::UserJoined { user: user.clone() },
                });
            }
        }

        let users = presence::users_in(&self.rooms, &self.registry, room_id);
        for &member in self.rooms.members_of(room_id) {
            out.push(Outbound {
                to: member,
                message: ServerMessage::UsersInRoom {
                    users: users.clone(),
                },
            });
        }

        if let Some(content) = self.snapshots.get(room_id) {
            out.push(Outbound {
                to: from,
                message: ServerMessage::LoadDocument {
                    content: content.clone(),
                },
            });
        }
        Ok(out)
    }

    /// A member replaced the document content. The snapshot is overwritten
    /// and the blob relayed to every other member. Changes for rooms the
    /// sender never joined are rejected without touching the cache, so an
    /// unauthorized room can't be seeded.
    pub fn content_change(
        &mut self,
        from: ConnectionId,
        room_id: &str,
        content: Blob,
    ) -> Result<Vec<Outbound>, RealtimeError> {
        let entry = self.registry.get(from)?;
        if !entry.rooms.contains(room_id) {
            return Err(RealtimeError::NotAMember(from, room_id.to_owned()));
        }
        self.snapshots.put(room_id, content.clone());

        Ok(self
            .rooms
            .members_of(room_id)
            .iter()
            .filter(|&&peer| peer != from)
            .map(|&peer| Outbound {
                to: peer,
                message: ServerMessage::ReceiveChanges {
                    content: content.clone(),
                },
            })
            .collect())
    }

    /// A transport session went away. Notifies the remaining peers of every
    /// room the connection held, then tears its state down. Idempotent:
    /// repeated disconnects return no fan-out.
    pub fn disconnect(&mut self, from: ConnectionId) -> Vec<Outbound> {
        let user = match self.registry.get(from) {
            Ok(entry) => entry.user.clone(),
            Err(_) => return Vec::new(),
        };

        let mut out = Vec::new();
        if let Some(rooms) = self.registry.remove(from) {
            for room_id in rooms {
                self.rooms.leave(&room_id, from);
                for &peer in self.rooms.members_of(&room_id) {
                    out.push(Outbound {
                        to: peer,
                        message: ServerMessage::UserLeft { user: user.clone() },
                    });
                }
            }
        }
        out
    }
}
