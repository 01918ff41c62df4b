use crate::registry::ConnectionRegistry;
use crate::rooms::RoomDirectory;
use crate::types::User;

/// Roster of a room: the attached user of every member connection, in member
/// enumeration order. Connections without an identity are skipped. A user
/// joined through two connections appears twice; the roster counts
/// connections, not identities.
pub fn users_in(
    directory: &RoomDirectory,
    registry: &ConnectionRegistry,
    room_id: &str,
) -> Vec<User> {
    directory
        .members_of(room_id)
        .iter()
        .filter_map(|&connection_id| {
            registry
                .get(connection_id)
                .ok()
                .and_then(|entry| entry.user.clone())
        })
        .collect()
}
