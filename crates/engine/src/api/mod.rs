//! API layer - HTTP and WebSocket entry points.

pub mod broadcast;
pub mod connections;
pub mod http;
pub mod websocket;

pub use broadcast::{BroadcastReport, PresenceBroadcaster};
pub use connections::{Connection, ConnectionId, ConnectionRegistry, ConnectionState};
pub use websocket::WsState;
