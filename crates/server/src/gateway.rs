//! Edge gateway: validates `GET /perfume/suggest` and
//! `GET /perfume/suggest-by-tags` and forwards them to the perfumist.

use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use reqwest::{Client, RequestBuilder};
use scently_core::config::GatewayConfig;
use scently_core::{ErrorKind, Fingerprint, Sex};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::api::{
    correlation_id, envelope, error_response, validation_error, with_correlation,
    CORRELATION_HEADER,
};
use crate::cors::{cors_guard, CorsPolicy};
use crate::health::gateway_health;
use crate::suggest::{SuggestQuery, TagsQuery};

pub const GATEWAY_SUGGEST_PATH: &str = "/perfume/suggest";
pub const GATEWAY_TAGS_PATH: &str = "/perfume/suggest-by-tags";

#[derive(Clone)]
pub struct GatewayState {
    client: Client,
    upstream_url: String,
    tags_url: String,
    timeout: Duration,
    ai_timeout: Duration,
}

impl GatewayState {
    pub fn new(client: Client, config: &GatewayConfig) -> Self {
        Self {
            client,
            upstream_url: config.perfumist_suggest_url.clone(),
            tags_url: config.perfumist_tags_url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            ai_timeout: Duration::from_secs(config.ai_timeout_secs),
        }
    }
}

pub fn gateway_router(state: GatewayState, cors: CorsPolicy) -> Router {
    Router::new()
        .route(GATEWAY_SUGGEST_PATH, get(forward_suggest))
        .route(GATEWAY_TAGS_PATH, get(forward_tags))
        .with_state(state)
        .route("/health", get(gateway_health))
        .layer(from_fn_with_state(cors, cors_guard))
        .layer(TraceLayer::new_for_http())
}

pub async fn forward_suggest(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Query(query): Query<SuggestQuery>,
) -> Response {
    let correlation_id = correlation_id(&headers);
    let request = match query.into_request() {
        Ok(request) => request,
        Err(message) => return with_correlation(validation_error(message), &correlation_id),
    };
    if let Err(error) = Fingerprint::new(&request.brand, &request.name, request.use_ai) {
        return with_correlation(error_response(&error), &correlation_id);
    }

    let timeout = if request.use_ai { state.ai_timeout } else { state.timeout };
    let upstream = state
        .client
        .get(&state.upstream_url)
        .query(&[("brand", request.brand.as_str()), ("name", request.name.as_str())])
        .query(&[("use_ai", request.use_ai)])
        .timeout(timeout);
    forward(upstream, &correlation_id).await
}

pub async fn forward_tags(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Query(query): Query<TagsQuery>,
) -> Response {
    let correlation_id = correlation_id(&headers);
    let request = match query.into_request() {
        Ok(request) => request,
        Err(message) => return with_correlation(validation_error(message), &correlation_id),
    };
    if let Err(error) = request.weighted_tags() {
        return with_correlation(error_response(&error), &correlation_id);
    }

    let mut upstream = state
        .client
        .get(&state.tags_url)
        .query(&[("tags", request.tags.join(","))])
        .timeout(state.timeout);
    if let Some(sex) = request.sex {
        upstream = upstream.query(&[("sex", Sex::as_str(sex))]);
    }
    forward(upstream, &correlation_id).await
}

async fn forward(upstream: RequestBuilder, correlation_id: &str) -> Response {
    let outcome = upstream.header(CORRELATION_HEADER, correlation_id).send().await;
    let response = match outcome {
        Ok(upstream) => relay(upstream, correlation_id).await,
        Err(error) => {
            warn!(
                event_name = "gateway.upstream.failed",
                correlation_id = %correlation_id,
                timed_out = error.is_timeout(),
                error = %error,
                "perfumist request failed"
            );
            unavailable()
        }
    };
    with_correlation(response, correlation_id)
}

/// 200, 400 and 404 pass through verbatim; any other status is the
/// perfumist's problem and becomes a 502.
async fn relay(upstream: reqwest::Response, correlation_id: &str) -> Response {
    let status = upstream.status().as_u16();
    if !matches!(status, 200 | 400 | 404) {
        warn!(
            event_name = "gateway.upstream.status",
            correlation_id = %correlation_id,
            status,
            "perfumist answered with unexpected status"
        );
        return unavailable();
    }

    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| HeaderValue::from_bytes(value.as_bytes()).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));

    match upstream.bytes().await {
        Ok(body) => {
            debug!(
                event_name = "gateway.upstream.relayed",
                correlation_id = %correlation_id,
                status,
                bytes = body.len(),
                "relayed perfumist response"
            );
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, [(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Err(error) => {
            warn!(
                event_name = "gateway.upstream.body_failed",
                correlation_id = %correlation_id,
                error = %error,
                "could not read perfumist response body"
            );
            unavailable()
        }
    }
}

fn unavailable() -> Response {
    let kind = ErrorKind::UpstreamUnavailable;
    envelope(StatusCode::BAD_GATEWAY, kind.as_str(), kind.user_message())
}
