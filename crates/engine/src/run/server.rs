//! Listener lifecycle: bind with retry, serve, drain on shutdown.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::api::{http, websocket, ConnectionRegistry, WsState};
use crate::infrastructure::config::ServerConfig;

/// Lifecycle of the listening side of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Constructed, not yet bound
    Starting,
    /// Bound and accepting connections
    Listening,
    /// Waiting to retry a bind that hit "address in use"
    Retrying,
    /// No longer accepting; finishing in-flight work
    Draining,
    /// Listener released
    Stopped,
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("Server error: {0}")]
    Serve(#[source] io::Error),
}

/// Owns the registry and the listener for one server process.
pub struct PresenceServer {
    config: ServerConfig,
    ws_state: Arc<WsState>,
    state_tx: Arc<watch::Sender<ServerState>>,
}

impl PresenceServer {
    pub fn new(config: ServerConfig) -> Self {
        let connections = Arc::new(ConnectionRegistry::new());
        let (state_tx, _) = watch::channel(ServerState::Starting);
        Self {
            config,
            ws_state: Arc::new(WsState::new(connections)),
            state_tx: Arc::new(state_tx),
        }
    }

    pub fn connections(&self) -> Arc<ConnectionRegistry> {
        self.ws_state.connections.clone()
    }

    pub fn state(&self) -> ServerState {
        *self.state_tx.borrow()
    }

    /// Watch lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.state_tx.subscribe()
    }

    /// HTTP routes plus the `/ws` upgrade endpoint on one router.
    pub fn router(&self) -> Router {
        let mut router = http::routes()
            .route("/ws", get(websocket::ws_handler))
            .with_state(self.ws_state.clone())
            .layer(TraceLayer::new_for_http());

        if let Some(cors) = self.cors_layer() {
            router = router.layer(cors);
        }
        router
    }

    /// Bind the configured address, retrying for as long as it is in use.
    ///
    /// Returns `Ok(None)` if `cancel` fires while waiting to retry. Any bind error
    /// other than "address in use" is returned immediately.
    pub async fn bind(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<TcpListener>, ServerError> {
        let addr = self.config.socket_addr();
        let mut attempt: u64 = 0;

        loop {
            attempt += 1;
            match TcpListener::bind(addr).await {
                Ok(listener) => {
                    self.set_state(ServerState::Listening);
                    tracing::info!(%addr, attempt, "Listening");
                    return Ok(Some(listener));
                }
                Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                    // The failed socket is dropped here, so each attempt starts from a fresh one.
                    self.set_state(ServerState::Retrying);
                    tracing::warn!(
                        %addr,
                        attempt,
                        retry_in_ms = self.config.bind_retry_interval.as_millis() as u64,
                        "Address in use, retrying"
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            self.set_state(ServerState::Stopped);
                            tracing::info!(%addr, "Shutdown requested while waiting to bind");
                            return Ok(None);
                        }
                        _ = tokio::time::sleep(self.config.bind_retry_interval) => {}
                    }
                }
                Err(source) => {
                    tracing::error!(%addr, error = %source, "Failed to bind");
                    return Err(ServerError::Bind { addr, source });
                }
            }
        }
    }

    /// Serve on `listener` until `cancel` fires, then drain and release the listener.
    ///
    /// Draining stops accepting new connections; channels that are already open are
    /// left running.
    pub async fn serve(
        &self,
        listener: TcpListener,
        cancel: CancellationToken,
    ) -> Result<(), ServerError> {
        let state_tx = self.state_tx.clone();
        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
                state_tx.send_replace(ServerState::Draining);
                tracing::info!("HTTP server received shutdown signal");
            })
            .await;

        self.set_state(ServerState::Stopped);
        tracing::info!("Listener released");
        result.map_err(ServerError::Serve)
    }

    /// Bind (with retry) and serve until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), ServerError> {
        match self.bind(&cancel).await? {
            Some(listener) => self.serve(listener, cancel).await,
            None => Ok(()),
        }
    }

    fn set_state(&self, state: ServerState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            tracing::debug!(from = ?previous, to = ?state, "Server state changed");
        }
    }

    fn cors_layer(&self) -> Option<CorsLayer> {
        let origins = self.config.cors_allowed_origins.as_ref()?;

        if origins.len() == 1 && origins[0] == "*" {
            tracing::warn!("CORS configured to allow ANY origin - this is insecure for production!");
            return Some(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        let origins: Vec<_> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        if origins.is_empty() {
            return None;
        }
        Some(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any),
        )
    }
}

/// Spawns a task that cancels `cancel_token` on SIGTERM/SIGINT
pub fn setup_shutdown_signal(cancel_token: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown...");
            }
        }

        cancel_token.cancel();
    });
}
