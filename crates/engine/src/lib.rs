//! PoiQuest Engine library.
//!
//! Realtime presence server for PoiQuest: clients announce joining or leaving a
//! team over a WebSocket and every open channel receives the event.
//!
//! ## Structure
//!
//! - `api/` - Connection registry, broadcast, HTTP and WebSocket entry points
//! - `infrastructure/` - Configuration
//! - `run/` - Listener lifecycle and shutdown handling

pub mod api;
pub mod infrastructure;
pub mod run;

pub use infrastructure::config::ServerConfig;
pub use run::{PresenceServer, ServerError, ServerState};
