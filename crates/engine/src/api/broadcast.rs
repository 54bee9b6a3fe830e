//! Presence event fan-out to connected WebSocket clients.

use std::sync::Arc;

use axum::extract::ws::Utf8Bytes;
use poiquest_protocol::{encode, PresenceEvent};

use super::connections::ConnectionRegistry;

/// Outcome counts of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Recipients whose outbound queue accepted the frame
    pub delivered: usize,
    /// Members that were not open (connecting, closing or closed)
    pub skipped: usize,
    /// Open members whose writer had already stopped
    pub failed: usize,
}

/// Delivers presence events to every open member of a registry.
///
/// The sender of an event is a member like any other and receives its own event back.
#[derive(Clone)]
pub struct PresenceBroadcaster {
    connections: Arc<ConnectionRegistry>,
}

impl PresenceBroadcaster {
    pub fn new(connections: Arc<ConnectionRegistry>) -> Self {
        Self { connections }
    }

    /// Encode `event` once and queue the same frame for every open member.
    ///
    /// A failed recipient is marked closing and left for its own close handler to
    /// unregister; delivery to the remaining members continues.
    pub async fn broadcast(&self, event: &PresenceEvent) -> BroadcastReport {
        let frame = Utf8Bytes::from(encode(event));
        let mut report = BroadcastReport::default();

        for connection in self.connections.snapshot().await {
            if !connection.is_open() {
                report.skipped += 1;
                continue;
            }
            match connection.send(frame.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    connection.mark_closing();
                    report.failed += 1;
                    tracing::warn!(
                        connection_id = %connection.id(),
                        error = %e,
                        "Failed to broadcast presence event"
                    );
                }
            }
        }

        tracing::debug!(
            event_type = %event.kind(),
            delivered = report.delivered,
            skipped = report.skipped,
            failed = report.failed,
            "Broadcast presence event"
        );
        report
    }
}
