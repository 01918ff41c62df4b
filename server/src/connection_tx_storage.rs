use crate::connection::ConnectionEvent;
use collab::ConnectionId;
use std::collections::HashMap;
use tokio::sync::mpsc::error::TrySendError;

pub type ConnectionTx = tokio::sync::mpsc::Sender<ConnectionEvent>;

/// Egress channels, one per live connection. Sends never block the server
/// loop: a connection whose buffer is full loses the event (logged) instead
/// of stalling every other connection.
pub struct ConnectionTxStorage {
    connection_txs: HashMap<ConnectionId, ConnectionTx>,
}

impl ConnectionTxStorage {
    pub fn new() -> Self {
        Self {
            connection_txs: HashMap::new(),
        }
    }

    pub fn insert(&mut self, connection_id: ConnectionId, tx: ConnectionTx) {
        self.connection_txs.insert(connection_id, tx);
    }

    pub fn send(&mut self, to: ConnectionId, event: ConnectionEvent) {
        if let Some(tx) = self.connection_txs.get_mut(&to) {
            match tx.try_send(event) {
                Ok(()) => {}
                Err(TrySendError::Full(event)) => {
                    log::warn!(
                        "connection {} can't keep up, dropping event: {:?}",
                        to,
                        event
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    // disconnect already in flight
                    log::debug!("connection {} egress channel closed", to);
                }
            }
        } else {
            log::warn!("no egress channel for connection {}", to);
        }
    }

    pub fn remove(&mut self, connection_id: ConnectionId) -> Option<ConnectionTx> {
        self.connection_txs.remove(&connection_id)
    }
}
