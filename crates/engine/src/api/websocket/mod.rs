//! WebSocket handling for presence clients.
//!
//! Each upgraded socket becomes one registry member. Inbound text frames are
//! decoded into presence events and broadcast; anything that fails to decode is
//! logged and dropped without closing the channel.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use poiquest_protocol::{decode, PresenceEvent};
use tokio::sync::mpsc;

use super::broadcast::PresenceBroadcaster;
use super::connections::{Connection, ConnectionId, ConnectionRegistry};

#[cfg(test)]
mod test_support;

/// Combined state for WebSocket handlers.
pub struct WsState {
    pub connections: Arc<ConnectionRegistry>,
    pub broadcaster: PresenceBroadcaster,
}

impl WsState {
    pub fn new(connections: Arc<ConnectionRegistry>) -> Self {
        let broadcaster = PresenceBroadcaster::new(connections.clone());
        Self {
            connections,
            broadcaster,
        }
    }
}

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<WsState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<WsState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<Utf8Bytes>();
    let connection = Arc::new(Connection::new(tx));
    let connection_id = connection.id();

    connection.mark_open();
    state.connections.register(connection.clone()).await;

    tracing::info!(connection_id = %connection_id, "WebSocket connection established");

    // Forward queued frames to the socket. A write error ends the task, which the
    // select below treats as a disconnect.
    let writer = connection.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if let Err(e) = ws_sender.send(Message::Text(text)).await {
                writer.mark_closing();
                tracing::warn!(
                    connection_id = %writer.id(),
                    error = %e,
                    "Failed to write to WebSocket"
                );
                break;
            }
        }
    });

    let receive = async {
        while let Some(result) = ws_receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    handle_text(&state, connection_id, text.as_str()).await;
                }
                Ok(Message::Close(_)) => {
                    tracing::info!(connection_id = %connection_id, "WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::error!(connection_id = %connection_id, error = %e, "WebSocket error");
                    break;
                }
                // Ping/pong are answered by the transport; binary frames are not part of the protocol.
                _ => {}
            }
        }
    };

    tokio::select! {
        _ = receive => {}
        _ = &mut send_task => {}
    }

    // Clean up
    connection.mark_closed();
    state.connections.unregister(connection_id).await;
    send_task.abort();

    tracing::info!(connection_id = %connection_id, "WebSocket connection terminated");
}

/// Decode one inbound frame and relay it. Decode failures never reach other clients.
async fn handle_text(state: &WsState, connection_id: ConnectionId, text: &str) {
    let event = match decode(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(
                connection_id = %connection_id,
                error = %e,
                "Dropping undecodable presence message"
            );
            return;
        }
    };

    match &event {
        PresenceEvent::Join(p) => tracing::info!(
            connection_id = %connection_id,
            player_id = %p.player_id,
            player_name = %p.player_name,
            team_id = %p.team_id,
            "Player joined team"
        ),
        PresenceEvent::Leave(p) => tracing::info!(
            connection_id = %connection_id,
            player_id = %p.player_id,
            player_name = %p.player_name,
            team_id = %p.team_id,
            "Player left team"
        ),
    }

    state.broadcaster.broadcast(&event).await;
}
