use std::num::Wrapping;

use tokio::sync::mpsc::{channel, Sender};

use collab::{ClientMessage, ConnectionId, Outbound, SessionCoordinator};

use crate::connection::ConnectionEvent;
use crate::connection_tx_storage::{ConnectionTx, ConnectionTxStorage};

pub type ServerTx = Sender<ServerCommand>;

/// Ingress from connection actors into the server loop.
#[derive(Debug)]
pub enum ServerCommand {
    Connect {
        tx: ConnectionTx,
    },
    ClientMessage {
        from: ConnectionId,
        message: ClientMessage,
    },
    Disconnect {
        from: ConnectionId,
    },
}

/// Single owner of all real-time state. Commands from every connection are
/// drained by one task, which serializes room mutations and makes per-room
/// broadcast order match processing order. No handler blocks: fan-out goes
/// through non-blocking per-connection channels.
struct Server {
    connection_id_source: Wrapping<ConnectionId>,
    coordinator: SessionCoordinator,
    connections: ConnectionTxStorage,
}

impl Server {
    fn new() -> Self {
        Self {
            connection_id_source: Wrapping(0),
            coordinator: SessionCoordinator::new(),
            connections: ConnectionTxStorage::new(),
        }
    }

    fn handle_command(&mut self, command: ServerCommand) {
        match command {
            ServerCommand::Connect { tx } => {
                let connection_id = self.new_connection_id();
                if let Err(err) = self.coordinator.connect(connection_id) {
                    // can't happen while ids come from the counter above
                    log::error!("refusing connection: {}", err);
                    return;
                }
                self.connections.insert(connection_id, tx);
                self.connections
                    .send(connection_id, ConnectionEvent::Connected { connection_id });
                log::info!("connection {} established", connection_id);
            }
            ServerCommand::ClientMessage { from, message } => match message {
                ClientMessage::Join(payload) => {
                    let user = payload.user().cloned();
                    match self.coordinator.join(from, payload.room_id(), user) {
                        Ok(out) => {
                            log::info!("connection {} joined room {}", from, payload.room_id());
                            self.dispatch(out);
                        }
                        Err(err) => log::warn!("discarding join from {}: {}", from, err),
                    }
                }
                ClientMessage::SendChanges(payload) => {
                    match self
                        .coordinator
                        .content_change(from, &payload.room_id, payload.content)
                    {
                        Ok(out) => self.dispatch(out),
                        Err(err) => {
                            log::warn!("discarding content change from {}: {}", from, err)
                        }
                    }
                }
            },
            ServerCommand::Disconnect { from } => {
                let out = self.coordinator.disconnect(from);
                self.dispatch(out);
                if self.connections.remove(from).is_some() {
                    log::info!("connection {} closed", from);
                }
            }
        }
    }

    fn dispatch(&mut self, outbounds: Vec<Outbound>) {
        for outbound in outbounds {
            self.connections
                .send(outbound.to, ConnectionEvent::Outbound(outbound.message));
        }
    }

    fn new_connection_id(&mut self) -> ConnectionId {
        self.connection_id_source += Wrapping(1);
        self.connection_id_source.0
    }
}

pub fn spawn_server() -> ServerTx {
    let (srv_tx, mut srv_rx) = channel::<ServerCommand>(64);

    tokio::spawn(async move {
        let mut server = Server::new();

        while let Some(command) = srv_rx.recv().await {
            server.handle_command(command);
        }
    });

    srv_tx
}
