use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::api::envelope;

/// Exact-match origin allow-list.
#[derive(Clone, Debug, Default)]
pub struct CorsPolicy {
    allowed: Arc<HashSet<String>>,
}

impl CorsPolicy {
    pub fn new(origins: &[String]) -> Self {
        Self { allowed: Arc::new(origins.iter().cloned().collect()) }
    }

    pub fn allows(&self, origin: &str) -> bool {
        self.allowed.contains(origin)
    }
}

/// Rejects browser requests from unknown origins. Requests without an
/// `Origin` header come from other services and pass untouched.
pub async fn cors_guard(
    State(policy): State<CorsPolicy>,
    request: Request,
    next: Next,
) -> Response {
    let Some(origin) = request.headers().get(header::ORIGIN).cloned() else {
        return next.run(request).await;
    };

    let allowed = origin.to_str().map(|value| policy.allows(value)).unwrap_or(false);
    if !allowed {
        warn!(
            event_name = "http.cors.rejected",
            origin = ?origin,
            path = %request.uri().path(),
            "origin not in allow-list"
        );
        return envelope(StatusCode::FORBIDDEN, "forbidden", "CORS not allowed");
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
    response
}
