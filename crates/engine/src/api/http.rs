//! HTTP routes sharing the listener with the WebSocket endpoint.

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

use super::websocket::WsState;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<WsState>> {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
}

async fn banner() -> &'static str {
    "PoiQuest Engine"
}

async fn health(State(state): State<Arc<WsState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "connections": state.connections.len().await,
    }))
}
