//! Connection registry for WebSocket clients.
//!
//! Tracks every channel between accept and close. Membership is keyed by a
//! per-connection UUID, so a reconnecting client is always a fresh member.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use axum::extract::ws::Utf8Bytes;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Identity of one live channel. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Readiness of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Open,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

/// Handle to one live channel: its identity, readiness, and outbound queue.
///
/// The queue is drained by the connection's writer task; once that task is gone
/// every send fails.
pub struct Connection {
    id: ConnectionId,
    state: AtomicU8,
    sender: mpsc::UnboundedSender<Utf8Bytes>,
}

impl Connection {
    /// Create a handle in the `Connecting` state.
    pub fn new(sender: mpsc::UnboundedSender<Utf8Bytes>) -> Self {
        Self {
            id: ConnectionId::new(),
            state: AtomicU8::new(ConnectionState::Connecting as u8),
            sender,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    pub fn mark_open(&self) {
        // Only a connecting channel may open; a closing one never comes back.
        let _ = self.state.compare_exchange(
            ConnectionState::Connecting as u8,
            ConnectionState::Open as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    pub fn mark_closing(&self) {
        let _ = self.state.compare_exchange(
            ConnectionState::Open as u8,
            ConnectionState::Closing as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    pub fn mark_closed(&self) {
        self.state.store(ConnectionState::Closed as u8, Ordering::Release);
    }

    /// Queue a text frame for this channel.
    pub fn send(&self, text: Utf8Bytes) -> Result<(), ConnectionError> {
        self.sender
            .send(text)
            .map_err(|_| ConnectionError::WriterGone(self.id))
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}

/// Live set of connected channels.
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, Arc<Connection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection. Registering an already present connection is a no-op.
    ///
    /// Returns `true` if the connection was newly added.
    pub async fn register(&self, connection: Arc<Connection>) -> bool {
        let connection_id = connection.id();
        let mut connections = self.connections.write().await;
        if connections.contains_key(&connection_id) {
            return false;
        }
        connections.insert(connection_id, connection);
        tracing::debug!(
            connection_id = %connection_id,
            total = connections.len(),
            "Connection registered"
        );
        true
    }

    /// Unregister a connection. Absent connections are ignored.
    ///
    /// Returns `true` if the connection was present.
    pub async fn unregister(&self, connection_id: ConnectionId) -> bool {
        let mut connections = self.connections.write().await;
        let removed = connections.remove(&connection_id).is_some();
        if removed {
            tracing::debug!(
                connection_id = %connection_id,
                total = connections.len(),
                "Connection unregistered"
            );
        }
        removed
    }

    /// Copy of the current membership.
    ///
    /// The lock is released before this returns, so callers may iterate while other
    /// tasks register or unregister.
    pub async fn snapshot(&self) -> Vec<Arc<Connection>> {
        let connections = self.connections.read().await;
        connections.values().cloned().collect()
    }

    pub async fn get(&self, connection_id: ConnectionId) -> Option<Arc<Connection>> {
        let connections = self.connections.read().await;
        connections.get(&connection_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during connection operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConnectionError {
    #[error("Writer for connection {0} has stopped")]
    WriterGone(ConnectionId),
}
