use std::sync::Arc;

use scently_cache::{apply_remote_overlay, build_response_cache, RemoteOverlay};
use scently_core::config::{AppConfig, ConfigError, LoadOptions};
use scently_core::{CacheError, CatalogSource, Recommender, ResponseCache};
use scently_hub::{build_http_client, HttpAdvisor, HttpCatalog, HubError};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub recommender: Arc<Recommender>,
    pub cache: Arc<dyn ResponseCache>,
    pub remote: RemoteOverlay,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    HttpClient(#[from] HubError),
    #[error("cache backend could not be configured: {0}")]
    Cache(#[from] CacheError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

/// Applies the remote overlay, then wires the HTTP clients and the cache
/// into a recommender.
pub async fn bootstrap_with_config(mut config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let remote = apply_remote_overlay(&mut config).await;

    let client = build_http_client(&config.http)?;
    let catalog: Arc<dyn CatalogSource> =
        Arc::new(HttpCatalog::new(client.clone(), &config.catalog));
    let cache = build_response_cache(&config.cache)?;

    let mut recommender = build_recommender(&config, catalog, Arc::clone(&cache));
    if config.advisor.enabled {
        recommender = recommender.with_advisor(Arc::new(HttpAdvisor::new(client, &config.advisor)));
    }
    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        cache_backend = cache.backend_name(),
        advisor_enabled = config.advisor.enabled,
        workers = config.scoring.workers,
        "application bootstrap complete"
    );

    Ok(Application { config, recommender: Arc::new(recommender), cache, remote })
}

pub fn build_recommender(
    config: &AppConfig,
    catalog: Arc<dyn CatalogSource>,
    cache: Arc<dyn ResponseCache>,
) -> Recommender {
    Recommender::new(catalog, cache, config.scoring.calculator(), config.recommender_settings())
}
