use std::time::Duration;

use anyhow::Result;
use scently_core::config::{AppConfig, LoadOptions};
use scently_server::{
    bootstrap_with_config, init_logging, perfumist_router, shutdown_signal, CorsPolicy,
    PerfumistState,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

async fn run() -> Result<()> {
    // logging first so bootstrap events are visible
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config.logging);

    let app = bootstrap_with_config(config).await?;
    let requests = CancellationToken::new();
    let state = PerfumistState { recommender: app.recommender, shutdown: requests.clone() };
    let router = perfumist_router(
        state,
        app.cache,
        CorsPolicy::new(&app.config.server.cors_allowed_origins),
    );

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "scently-perfumist listening"
    );

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal(requests, grace)).await?;

    tracing::info!(
        event_name = "system.server.stopped",
        correlation_id = "shutdown",
        "scently-perfumist stopped"
    );
    Ok(())
}
