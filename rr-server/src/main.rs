//! Race Replay Server
//!
//! Serves session catalogues, track geometry and frames over a REST API,
//! plus an optional server-side replay streamed as SSE.

use anyhow::Result;
use rr_server::{api, config::ServerConfig, state};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Race Replay Server");

    let config = ServerConfig::from_env()?;
    let replay_config = config.load_replay_config()?;

    // Create application state
    let state = state::AppState::new(config.build_provider(), replay_config);

    // Build the router
    let app = api::create_router(state);

    // Start server
    info!("Server listening on http://{}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
