use super::*;

use std::{net::SocketAddr, time::Duration};

use axum::routing::get;
use futures_util::{SinkExt, StreamExt};
use poiquest_protocol::encode;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    connect_async, tungstenite::Message as WsMessage, MaybeTlsStream, WebSocketStream,
};

pub(crate) type TestWs = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub(crate) fn new_ws_state() -> Arc<WsState> {
    Arc::new(WsState::new(Arc::new(ConnectionRegistry::new())))
}

pub(crate) async fn spawn_ws_server(
    state: Arc<WsState>,
) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let router = axum::Router::new().route("/ws", get(ws_handler).with_state(state));

    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (addr, handle)
}

pub(crate) async fn ws_connect(addr: SocketAddr) -> TestWs {
    let url = format!("ws://{}/ws", addr);
    let (ws, _resp) = connect_async(url).await.unwrap();
    ws
}

/// Wait until the server has registered exactly `expected` connections.
///
/// The upgrade callback runs after the client handshake completes, so a freshly
/// connected client is not necessarily registered yet.
pub(crate) async fn wait_for_connections(registry: &ConnectionRegistry, expected: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while registry.len().await != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("registry never reached {expected} connections"));
}

pub(crate) async fn ws_send_text(ws: &mut TestWs, text: &str) {
    ws.send(WsMessage::Text(text.to_string().into())).await.unwrap();
}

pub(crate) async fn ws_send_event(ws: &mut TestWs, event: &PresenceEvent) {
    ws_send_text(ws, &encode(event)).await;
}

pub(crate) async fn ws_recv_text(ws: &mut TestWs) -> String {
    loop {
        let msg = ws.next().await.unwrap().unwrap();
        if let WsMessage::Text(text) = msg {
            return text.to_string();
        }
    }
}

pub(crate) async fn ws_expect_text(ws: &mut TestWs, timeout: Duration) -> String {
    tokio::time::timeout(timeout, ws_recv_text(ws))
        .await
        .expect("timed out waiting for a text frame")
}

pub(crate) async fn ws_expect_event(ws: &mut TestWs, timeout: Duration) -> PresenceEvent {
    let text = ws_expect_text(ws, timeout).await;
    decode(&text).unwrap()
}

pub(crate) async fn ws_expect_no_message(ws: &mut TestWs, timeout: Duration) {
    let result = tokio::time::timeout(timeout, ws_recv_text(ws)).await;

    // We only succeed if we timed out without seeing a text frame.
    if let Ok(text) = result {
        panic!("unexpected message: {text}");
    }
}
