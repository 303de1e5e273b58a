//! Response cache backends and the remote settings overlay.

pub mod memory;
pub mod redis_backend;
pub mod remote;

use std::sync::Arc;

use scently_core::config::{CacheBackend, CacheConfig};
use scently_core::{CacheError, ResponseCache};

pub use memory::{InMemoryResponseCache, NoopResponseCache};
pub use redis_backend::{RedisConnector, RedisResponseCache};
pub use remote::{apply_remote_overlay, fetch_remote_values, RemoteOverlay};

/// Builds the configured backend. Redis connects lazily, so this only fails
/// on a malformed URL.
pub fn build_response_cache(config: &CacheConfig) -> Result<Arc<dyn ResponseCache>, CacheError> {
    let cache: Arc<dyn ResponseCache> = match config.backend {
        CacheBackend::Redis => {
            let connector =
                RedisConnector::open(&config.url, config.password.clone(), config.op_timeout())?;
            Arc::new(RedisResponseCache::new(connector))
        }
        CacheBackend::Memory => Arc::new(InMemoryResponseCache::new()),
        CacheBackend::Disabled => Arc::new(NoopResponseCache),
    };
    Ok(cache)
}
