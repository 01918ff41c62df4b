use actix::{Actor, ActorContext, AsyncContext, Handler, Message, Running, StreamHandler};
use actix_web::{error, web, Error, HttpMessage, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::Deserialize;
use tokio::sync::mpsc::error::TrySendError;

use collab::{ClientMessage, ConnectionId, ServerMessage};

use crate::auth;
use crate::config::Config;
use crate::server::{ServerCommand, ServerTx};

/// Egress from the server loop to one connection actor.
#[derive(Debug)]
pub enum ConnectionEvent {
    Connected { connection_id: ConnectionId },
    Outbound(ServerMessage),
}

#[derive(Message)]
#[rtype(result = "()")]
struct ConnectionActorMessage(ConnectionEvent);

/// Teardown must reach the server loop even when the command channel is
/// momentarily full, or the registry entry leaks and the rooms keep a ghost
/// member. Unlike client messages, a backlogged disconnect is handed to a
/// task that waits for channel capacity instead of being dropped.
fn notify_disconnect(srv_tx: &ServerTx, from: ConnectionId) {
    let mut tx = srv_tx.clone();
    match tx.try_send(ServerCommand::Disconnect { from }) {
        Ok(()) => {}
        Err(TrySendError::Full(command)) => {
            tokio::spawn(async move {
                if tx.send(command).await.is_err() {
                    log::error!("server loop gone, disconnect for {} undeliverable", from);
                }
            });
        }
        Err(TrySendError::Closed(_)) => {
            log::debug!("server loop already stopped, disconnect for {} is moot", from);
        }
    }
}

enum ConnectionState {
    Idle,
    Connected(ConnectionId),
}

struct ConnectionActor {
    state: ConnectionState,
    srv_tx: ServerTx,
}

impl Actor for ConnectionActor {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<ConnectionEvent>(32);

        if self
            .srv_tx
            .try_send(ServerCommand::Connect { tx })
            .is_err()
        {
            log::error!("server loop unavailable, closing connection");
            ctx.stop();
            return;
        }

        let addr = ctx.address().recipient();

        tokio::spawn(async move {
            let addr = addr;
            log::debug!("connection egress pump - started");
            while let Some(event) = rx.recv().await {
                if addr.try_send(ConnectionActorMessage(event)).is_err() {
                    break;
                }
            }
            log::debug!("connection egress pump - terminated");
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        if let ConnectionState::Connected(id) = self.state {
            notify_disconnect(&self.srv_tx, id);
        }

        Running::Stop
    }
}

/// Ingress
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ConnectionActor {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Text(text)) => match self.state {
                ConnectionState::Connected(from) => {
                    match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(message) => {
                            log::debug!("ingress {:?}", message);
                            if let Err(err) = self
                                .srv_tx
                                .try_send(ServerCommand::ClientMessage { from, message })
                            {
                                log::warn!("server loop backlogged, dropping event: {}", err);
                            }
                        }
                        // invalid events are dropped, the connection stays up
                        Err(err) => log::warn!("discarding unparsable event: {}", err),
                    }
                }
                ConnectionState::Idle => {
                    log::warn!("dropping event received before the connection was acknowledged");
                }
            },
            Ok(ws::Message::Close(_)) => {
                if let ConnectionState::Connected(id) = self.state {
                    notify_disconnect(&self.srv_tx, id);
                }
                ctx.stop();
            }
            _ => (),
        }
    }
}

/// Egress
impl Handler<ConnectionActorMessage> for ConnectionActor {
    type Result = ();

    fn handle(
        &mut self,
        msg: ConnectionActorMessage,
        ctx: &mut ws::WebsocketContext<Self>,
    ) -> Self::Result {
        match msg.0 {
            ConnectionEvent::Connected { connection_id } => {
                self.state = ConnectionState::Connected(connection_id);
            }
            ConnectionEvent::Outbound(message) => {
                log::debug!("egress {:?}", message);
                let serialized = serde_json::to_string(&message).expect("must succeed");
                ctx.text(serialized);
            }
        }
    }
}

#[derive(Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    query: web::Query<WsQuery>,
    srv_tx: web::Data<ServerTx>,
    config: web::Data<Config>,
) -> Result<HttpResponse, Error> {
    if let Some(secret) = &config.jwt_secret {
        let cookie_token = req.cookie("token").map(|c| c.value().to_owned());
        let token = query.token.as_deref().or_else(|| cookie_token.as_deref());
        if let Err(err) = auth::verify(token, secret) {
            log::info!("rejecting connection: {}", err);
            return Err(error::ErrorUnauthorized("Unauthorized"));
        }
    }

    ws::start(
        ConnectionActor {
            state: ConnectionState::Idle,
            srv_tx: srv_tx.get_ref().clone(),
        },
        &req,
        stream,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::channel;

    #[tokio::test]
    async fn it_delivers_disconnect_even_when_the_loop_is_backlogged() {
        let (srv_tx, mut srv_rx) = channel::<ServerCommand>(1);
        let (conn_tx, _conn_rx) = channel::<ConnectionEvent>(1);

        // fill the command channel so the immediate send can't succeed
        srv_tx
            .clone()
            .try_send(ServerCommand::Connect { tx: conn_tx })
            .unwrap();

        notify_disconnect(&srv_tx, 7);

        assert!(matches!(
            srv_rx.recv().await,
            Some(ServerCommand::Connect { .. })
        ));
        match srv_rx.recv().await {
            Some(ServerCommand::Disconnect { from }) => assert_eq!(from, 7),
            other => panic!("expected the queued disconnect, got {:?}", other),
        }
    }
}
