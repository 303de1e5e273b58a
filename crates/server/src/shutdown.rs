use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Resolves on Ctrl-C. In-flight requests get `grace` to finish before
/// `requests` is cancelled and they abort.
pub async fn shutdown_signal(requests: CancellationToken, grace: Duration) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(
            event_name = "system.server.signal_error",
            correlation_id = "shutdown",
            error = %err,
            "could not listen for shutdown signal; stopping"
        );
    }
    info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        grace_secs = grace.as_secs(),
        "shutdown requested; draining in-flight requests"
    );
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        requests.cancel();
    });
}
