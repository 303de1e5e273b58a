use std::time::Duration;

use reqwest::Client;
use scently_core::config::HttpConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("could not build http client: {0}")]
    ClientBuild(#[from] reqwest::Error),
}

/// Process-wide HTTP client. Cloning is cheap and shares the pool.
///
/// reqwest only caps idle connections per host, so there is no global idle
/// limit to configure.
pub fn build_http_client(config: &HttpConfig) -> Result<Client, HubError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .build()?;
    Ok(client)
}
