//! # Encore API Server
//!
//! Serves the marketplace REST API under `/api` (auth, users, events,
//! bookings, contracts) plus `GET /health`.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) cargo run -p encore-api
//! ```

use encore_api::{
    app::{build_router, AppState},
    config::Config,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "encore_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Encore API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let address = config.bind_address();

    let state = AppState::new(config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
