//! PoiQuest Engine - Main entry point.

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use poiquest_engine::{run::setup_shutdown_signal, PresenceServer, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "poiquest_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting PoiQuest Engine");

    // Create cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();
    setup_shutdown_signal(cancel_token.clone());

    let config = ServerConfig::from_env();
    tracing::info!(
        addr = %config.socket_addr(),
        bind_retry_ms = config.bind_retry_interval.as_millis() as u64,
        "Configuration loaded"
    );

    let server = PresenceServer::new(config);
    server.run(cancel_token).await?;

    tracing::info!("PoiQuest Engine shutdown complete");
    Ok(())
}
