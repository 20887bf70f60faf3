//! Save Backup Server - Main entry point

use save_backup_server::{routes, utils, AppConfig, AppState};
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    utils::logger::init(&config.log_level)?;

    tracing::info!(
        "Starting save-backup-server v{} on port {}",
        env!("CARGO_PKG_VERSION"),
        config.port
    );

    std::fs::create_dir_all(&config.temp_dir)?;

    let state = Arc::new(AppState::new(config.clone()));

    // Creates the registry document if missing or corrupt
    let registry = state.store.load()?;
    tracing::info!(
        path = %state.store.path().display(),
        games = registry.games.len(),
        "Registry loaded"
    );

    let app = routes::create_router(state);

    let addr = format!("{}:{}", config.bind_addr, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
