//! Startup overlay of tunables kept in a shared Redis hash.

use std::collections::HashMap;
use std::time::Duration;

use scently_core::config::{AppConfig, RemoteConfig};
use scently_core::CacheError;
use tracing::{info, warn};

use crate::redis_backend::RedisConnector;

const REMOTE_OP_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteOverlay {
    /// No remote host configured.
    Skipped,
    Applied(Vec<String>),
    /// Store unreachable or values rejected; local configuration kept.
    Failed(String),
}

pub async fn fetch_remote_values(
    remote: &RemoteConfig,
) -> Result<HashMap<String, String>, CacheError> {
    let Some(host) = remote.host.as_deref().filter(|host| !host.trim().is_empty()) else {
        return Ok(HashMap::new());
    };
    let url = format!("redis://{}:{}", host.trim(), remote.port);
    let connector = RedisConnector::open(&url, remote.password.clone(), REMOTE_OP_TIMEOUT)?;
    let namespace = remote.namespace.clone();
    connector
        .run("hgetall", || {
            let mut cmd = redis::cmd("HGETALL");
            cmd.arg(&namespace);
            cmd
        })
        .await
}

/// Reads the remote hash once and applies it to `config`. Never fails the
/// caller: problems are logged and the local values stay in effect.
pub async fn apply_remote_overlay(config: &mut AppConfig) -> RemoteOverlay {
    if config.remote.host.as_deref().map_or(true, |host| host.trim().is_empty()) {
        return RemoteOverlay::Skipped;
    }

    let values = match fetch_remote_values(&config.remote).await {
        Ok(values) => values,
        Err(error) => {
            warn!(
                event_name = "config.remote.unavailable",
                namespace = %config.remote.namespace,
                error = %error,
                "remote settings unavailable; keeping local configuration"
            );
            return RemoteOverlay::Failed(error.to_string());
        }
    };

    match config.apply_remote_values(&values) {
        Ok(applied) => {
            info!(
                event_name = "config.remote.applied",
                namespace = %config.remote.namespace,
                keys = ?applied,
                "remote settings applied"
            );
            RemoteOverlay::Applied(applied)
        }
        Err(error) => {
            warn!(
                event_name = "config.remote.rejected",
                namespace = %config.remote.namespace,
                error = %error,
                "remote settings rejected; keeping local configuration"
            );
            RemoteOverlay::Failed(error.to_string())
        }
    }
}
