//! Process-level server lifecycle.

pub mod server;

pub use server::{setup_shutdown_signal, PresenceServer, ServerError, ServerState};
