use std::time::Duration;

use anyhow::Result;
use scently_core::config::{AppConfig, LoadOptions};
use scently_hub::build_http_client;
use scently_server::{gateway_router, init_logging, shutdown_signal, CorsPolicy, GatewayState};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config.logging);

    let client = build_http_client(&config.http)?;
    let router = gateway_router(
        GatewayState::new(client, &config.gateway),
        CorsPolicy::new(&config.server.cors_allowed_origins),
    );

    let address = format!("{}:{}", config.server.bind_address, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        upstream = %config.gateway.perfumist_suggest_url,
        "scently-gateway listening"
    );

    let grace = Duration::from_secs(config.server.graceful_shutdown_secs);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(CancellationToken::new(), grace))
        .await?;

    tracing::info!(
        event_name = "system.server.stopped",
        correlation_id = "shutdown",
        "scently-gateway stopped"
    );
    Ok(())
}
