use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use scently_core::ResponseCache;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    cache: Arc<dyn ResponseCache>,
}

impl HealthState {
    pub fn new(cache: Arc<dyn ResponseCache>) -> Self {
        Self { cache }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<HealthCheck>,
    pub checked_at: String,
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let cache = cache_check(state.cache.as_ref()).await;
    let ready = cache.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "perfumist runtime initialized".to_string(),
        },
        cache: Some(cache),
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

pub async fn gateway_health() -> (StatusCode, Json<HealthResponse>) {
    let payload = HealthResponse {
        status: "ready",
        service: HealthCheck { status: "ready", detail: "gateway runtime initialized".to_string() },
        cache: None,
        checked_at: Utc::now().to_rfc3339(),
    };
    (StatusCode::OK, Json(payload))
}

async fn cache_check(cache: &dyn ResponseCache) -> HealthCheck {
    match cache.ping().await {
        Ok(()) => HealthCheck {
            status: "ready",
            detail: format!("{} cache reachable", cache.backend_name()),
        },
        Err(error) => HealthCheck {
            status: "degraded",
            detail: format!("{} cache unavailable: {error}", cache.backend_name()),
        },
    }
}
