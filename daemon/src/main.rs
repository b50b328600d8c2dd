use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;
use voxrouted::config::load_config;
use voxrouted::rate_limit::CommandRateLimiter;
use voxrouted::server::DaemonServer;
use voxrouted::state::DaemonState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::INFO)
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env().add_directive(LevelFilter::INFO.into()))
        .init();

    info!("voxroute daemon (voxrouted) starting...");

    let config = load_config()?;
    let socket_path = config.server.resolve_socket_path();
    let limiter = CommandRateLimiter::from_config(&config.rate_limit)?;

    let state = Arc::new(Mutex::new(DaemonState::new(config)?));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                error!("Failed to listen for Ctrl-C: {}", e);
                // Keep the sender alive so the server is not told to stop.
                std::future::pending::<()>().await;
                drop(shutdown_tx);
            }
        }
    });

    let server = DaemonServer::new(socket_path, state, limiter);
    server.run(shutdown_rx).await?;

    info!("voxrouted stopped");
    Ok(())
}
