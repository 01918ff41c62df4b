use collab::{
    ConnectionId, Outbound, RealtimeError, ServerMessage, SessionCoordinator, User,
};
use std::collections::HashSet;

fn user(id: &str) -> User {
    User {
        id: id.into(),
        full_name: format!("User {}", id),
        avatar: None,
    }
}

fn connect_and_join(
    coordinator: &mut SessionCoordinator,
    connection_id: ConnectionId,
    room_id: &str,
) -> Vec<Outbound> {
    coordinator.connect(connection_id).expect("fresh connection id");
    coordinator
        .join(connection_id, room_id, Some(user(&connection_id.to_string())))
        .expect("join must succeed")
}

fn messages_to(out: &[Outbound], to: ConnectionId) -> Vec<&ServerMessage> {
    out.iter()
        .filter(|o| o.to == to)
        .map(|o| &o.message)
        .collect()
}

/// The registry's per-connection room sets and the directory's member sets
/// must agree at every quiescent point.
fn assert_membership_invariant(
    coordinator: &SessionCoordinator,
    connections: &[ConnectionId],
    rooms: &[&str],
) {
    for &connection_id in connections {
        let joined: HashSet<String> = match coordinator.registry.get(connection_id) {
            Ok(entry) => entry.rooms.iter().cloned().collect(),
            Err(_) => HashSet::new(),
        };
        for room_id in &joined {
            assert!(
                coordinator.rooms.members_of(room_id).contains(&connection_id),
                "registry says {} is in {} but the directory disagrees",
                connection_id,
                room_id
            );
        }
        for room_id in rooms {
            if coordinator.rooms.members_of(room_id).contains(&connection_id) {
                assert!(
                    joined.contains(*room_id),
                    "directory lists {} in {} but the registry disagrees",
                    connection_id,
                    room_id
                );
            }
        }
    }
}

#[test]
fn it_keeps_registry_and_directory_in_lockstep() {
    let mut coordinator = SessionCoordinator::new();
    let rooms = ["doc1", "doc2"];
    connect_and_join(&mut coordinator, 1, "doc1");
    assert_membership_invariant(&coordinator, &[1], &rooms);

    connect_and_join(&mut coordinator, 2, "doc1");
    coordinator.join(2, "doc2", Some(user("2"))).unwrap();
    assert_membership_invariant(&coordinator, &[1, 2], &rooms);

    coordinator.disconnect(1);
    assert_membership_invariant(&coordinator, &[1, 2], &rooms);
    assert!(coordinator.rooms.members_of("doc1").contains(&2));

    coordinator.disconnect(2);
    assert_membership_invariant(&coordinator, &[1, 2], &rooms);
    assert_eq!(coordinator.rooms.room_count(), 0);
    assert!(coordinator.registry.is_empty());
}

#[test]
fn it_reports_presence_regardless_of_join_order() {
    let mut first = SessionCoordinator::new();
    connect_and_join(&mut first, 1, "doc1");
    connect_and_join(&mut first, 2, "doc1");

    let mut second = SessionCoordinator::new();
    connect_and_join(&mut second, 2, "doc1");
    connect_and_join(&mut second, 1, "doc1");

    let roster = |coordinator: &SessionCoordinator| -> HashSet<String> {
        collab::presence::users_in(&coordinator.rooms, &coordinator.registry, "doc1")
            .into_iter()
            .map(|u| u.id)
            .collect()
    };
    assert_eq!(roster(&first), roster(&second));
    assert_eq!(roster(&first).len(), 2);
}

#[test]
fn it_excludes_identityless_connections_from_presence() {
    let mut coordinator = SessionCoordinator::new();
    connect_and_join(&mut coordinator, 1, "doc1");
    coordinator.connect(2).unwrap();
    coordinator.join(2, "doc1", None).unwrap();

    let roster = collab::presence::users_in(&coordinator.rooms, &coordinator.registry, "doc1");
    assert_eq!(roster, vec![user("1")]);
    // the identityless connection still counts as a member
    assert_eq!(coordinator.rooms.members_of("doc1").len(), 2);
}

#[test]
fn it_relays_replayed_changes_without_deduplication() {
    let mut coordinator = SessionCoordinator::new();
    connect_and_join(&mut coordinator, 1, "doc1");
    connect_and_join(&mut coordinator, 2, "doc1");

    let first = coordinator.content_change(1, "doc1", "Hello".into()).unwrap();
    let second = coordinator.content_change(1, "doc1", "Hello".into()).unwrap();

    // same observable cache state, but two broadcasts
    assert_eq!(coordinator.snapshots.get("doc1"), Some(&"Hello".to_string()));
    for out in [&first, &second] {
        assert_eq!(
            out,
            &vec![Outbound {
                to: 2,
                message: ServerMessage::ReceiveChanges {
                    content: "Hello".into()
                },
            }]
        );
    }
}

#[test]
fn it_seeds_late_joiners_from_the_snapshot_cache() {
    let mut coordinator = SessionCoordinator::new();
    connect_and_join(&mut coordinator, 1, "doc1");
    coordinator.content_change(1, "doc1", "Hello".into()).unwrap();

    coordinator.connect(2).unwrap();
    let out = coordinator.join(2, "doc1", Some(user("2"))).unwrap();

    let loads: Vec<_> = out
        .iter()
        .filter(|o| matches!(o.message, ServerMessage::LoadDocument { .. }))
        .collect();
    assert_eq!(loads.len(), 1);
    assert_eq!(loads[0].to, 2);
    assert_eq!(
        loads[0].message,
        ServerMessage::LoadDocument {
            content: "Hello".into()
        }
    );
}

#[test]
fn it_does_not_seed_joiners_of_unedited_documents() {
    let mut coordinator = SessionCoordinator::new();
    let out = connect_and_join(&mut coordinator, 1, "doc1");
    assert!(out
        .iter()
        .all(|o| !matches!(o.message, ServerMessage::LoadDocument { .. })));
}

#[test]
fn it_announces_joins_to_peers_and_roster_to_the_whole_room() {
    let mut coordinator = SessionCoordinator::new();
    connect_and_join(&mut coordinator, 1, "doc1");

    coordinator.connect(2).unwrap();
    let out = coordinator.join(2, "doc1", Some(user("2"))).unwrap();

    let roster_ids = |message: &ServerMessage| -> HashSet<String> {
        match message {
            ServerMessage::UsersInRoom { users } => users.iter().map(|u| u.id.clone()).collect(),
            other => panic!("expected users-in-room, got {:?}", other),
        }
    };
    let expected_roster: HashSet<String> = ["1", "2"].iter().map(|s| s.to_string()).collect();

    // prior member: user-joined then the refreshed roster
    let to_prior = messages_to(&out, 1);
    assert_eq!(to_prior.len(), 2);
    assert_eq!(
        to_prior[0],
        &ServerMessage::UserJoined {
            user: Some(user("2"))
        }
    );
    assert_eq!(roster_ids(to_prior[1]), expected_roster);

    // joiner: roster only (no user-joined about itself)
    let to_joiner = messages_to(&out, 2);
    assert_eq!(to_joiner.len(), 1);
    assert_eq!(roster_ids(to_joiner[0]), expected_roster);
}

#[test]
fn it_notifies_each_room_exactly_once_on_disconnect() {
    let mut coordinator = SessionCoordinator::new();
    connect_and_join(&mut coordinator, 1, "doc1");
    coordinator.join(1, "doc2", Some(user("1"))).unwrap();
    connect_and_join(&mut coordinator, 2, "doc1");
    connect_and_join(&mut coordinator, 3, "doc2");
    connect_and_join(&mut coordinator, 4, "doc3");

    let out = coordinator.disconnect(1);

    let expected = ServerMessage::UserLeft {
        user: Some(user("1")),
    };
    assert_eq!(messages_to(&out, 2), vec![&expected]);
    assert_eq!(messages_to(&out, 3), vec![&expected]);
    // rooms the connection never joined hear nothing
    assert!(messages_to(&out, 4).is_empty());
    assert_eq!(out.len(), 2);

    // repeated disconnect is a silent no-op
    assert!(coordinator.disconnect(1).is_empty());
}

#[test]
fn it_relays_changes_to_peers_only_and_keeps_presence_intact() {
    let mut coordinator = SessionCoordinator::new();
    connect_and_join(&mut coordinator, 1, "doc1"); // A
    connect_and_join(&mut coordinator, 2, "doc1"); // B

    let out = coordinator.content_change(1, "doc1", "X".into()).unwrap();
    assert!(messages_to(&out, 1).is_empty());
    assert_eq!(
        messages_to(&out, 2),
        vec![&ServerMessage::ReceiveChanges { content: "X".into() }]
    );

    let roster: HashSet<String> =
        collab::presence::users_in(&coordinator.rooms, &coordinator.registry, "doc1")
            .into_iter()
            .map(|u| u.id)
            .collect();
    let expected: HashSet<String> = ["1", "2"].iter().map(|s| s.to_string()).collect();
    assert_eq!(roster, expected);
}

#[test]
fn it_discards_changes_for_unjoined_rooms_without_seeding_the_cache() {
    let mut coordinator = SessionCoordinator::new();
    connect_and_join(&mut coordinator, 1, "doc1");

    let result = coordinator.content_change(1, "doc2", "X".into());
    assert_eq!(result, Err(RealtimeError::NotAMember(1, "doc2".into())));
    assert_eq!(coordinator.snapshots.get("doc2"), None);

    let result = coordinator.content_change(9, "doc1", "X".into());
    assert_eq!(result, Err(RealtimeError::UnknownConnection(9)));
    assert_eq!(coordinator.snapshots.get("doc1"), None);
}

#[test]
fn it_rejects_malformed_joins_without_mutating_state() {
    let mut coordinator = SessionCoordinator::new();
    connect_and_join(&mut coordinator, 1, "doc1");
    coordinator.connect(2).unwrap();

    let result = coordinator.join(2, "", Some(user("2")));
    assert_eq!(result, Err(RealtimeError::InvalidJoinPayload));
    assert_eq!(coordinator.rooms.room_count(), 1);
    assert!(coordinator.registry.get(2).unwrap().rooms.is_empty());

    let result = coordinator.join(9, "doc1", Some(user("9")));
    assert_eq!(result, Err(RealtimeError::UnknownConnection(9)));
    assert_eq!(coordinator.rooms.members_of("doc1"), &[1]);
}
