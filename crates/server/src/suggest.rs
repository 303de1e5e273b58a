//! Perfumist HTTP surface: `GET /v1/suggest/perfume`, `GET /v1/suggest/tags`
//! and `/health`.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use scently_core::{
    ErrorKind, Recommender, ResponseCache, Sex, SuggestError, SuggestRequest, TagRequest,
};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info_span, warn, Instrument};

use crate::api::{correlation_id, error_response, parse_flag, validation_error, with_correlation};
use crate::cors::{cors_guard, CorsPolicy};
use crate::health::{health, HealthState};

pub const SUGGEST_PATH: &str = "/v1/suggest/perfume";
pub const TAGS_PATH: &str = "/v1/suggest/tags";

#[derive(Clone)]
pub struct PerfumistState {
    pub recommender: Arc<Recommender>,
    /// Cancelled when the server's shutdown grace period runs out.
    pub shutdown: CancellationToken,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SuggestQuery {
    pub brand: Option<String>,
    pub name: Option<String>,
    pub use_ai: Option<String>,
}

impl SuggestQuery {
    /// Presence checks only; emptiness after canonicalization is judged by
    /// the fingerprint.
    pub fn into_request(self) -> Result<SuggestRequest, String> {
        let brand = self.brand.ok_or_else(|| "brand is required".to_string())?;
        let name = self.name.ok_or_else(|| "name is required".to_string())?;
        let use_ai = parse_flag(self.use_ai.as_deref())
            .ok_or_else(|| "use_ai must be a boolean".to_string())?;
        Ok(SuggestRequest { brand, name, use_ai })
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TagsQuery {
    pub tags: Option<String>,
    pub sex: Option<String>,
}

impl TagsQuery {
    /// Presence check only; tags that canonicalize to nothing are judged by
    /// the recommender.
    pub fn into_request(self) -> Result<TagRequest, String> {
        let tags = self.tags.ok_or_else(|| "tags are required".to_string())?;
        let sex = self.sex.filter(|sex| !sex.trim().is_empty()).map(|sex| Sex::from_label(&sex));
        Ok(TagRequest::from_csv(&tags).with_sex(sex))
    }
}

pub fn perfumist_router(
    state: PerfumistState,
    cache: Arc<dyn ResponseCache>,
    cors: CorsPolicy,
) -> Router {
    let suggest_routes = Router::new()
        .route(SUGGEST_PATH, get(suggest))
        .route(TAGS_PATH, get(suggest_by_tags))
        .with_state(state);
    let health_routes =
        Router::new().route("/health", get(health)).with_state(HealthState::new(cache));

    suggest_routes
        .merge(health_routes)
        .layer(from_fn_with_state(cors, cors_guard))
        .layer(TraceLayer::new_for_http())
}

pub async fn suggest(
    State(state): State<PerfumistState>,
    headers: HeaderMap,
    Query(query): Query<SuggestQuery>,
) -> Response {
    let correlation_id = correlation_id(&headers);
    let request = match query.into_request() {
        Ok(request) => request,
        Err(message) => return with_correlation(validation_error(message), &correlation_id),
    };

    // dropping the handler (client went away) cancels the computation
    let cancel = state.shutdown.child_token();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let span = info_span!(
        "suggest",
        correlation_id = %correlation_id,
        brand = %request.brand,
        name = %request.name,
        use_ai = request.use_ai,
    );
    let result = state.recommender.suggest(&request, &cancel).instrument(span).await;

    let response = match result {
        Ok(ranked) => (StatusCode::OK, Json(ranked)).into_response(),
        Err(error) => failure_response(&error, &correlation_id),
    };
    with_correlation(response, &correlation_id)
}

pub async fn suggest_by_tags(
    State(state): State<PerfumistState>,
    headers: HeaderMap,
    Query(query): Query<TagsQuery>,
) -> Response {
    let correlation_id = correlation_id(&headers);
    let request = match query.into_request() {
        Ok(request) => request,
        Err(message) => return with_correlation(validation_error(message), &correlation_id),
    };

    let cancel = state.shutdown.child_token();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let span = info_span!(
        "suggest_tags",
        correlation_id = %correlation_id,
        tags = request.tags.len(),
        sex = request.sex.map(Sex::as_str).unwrap_or("any"),
    );
    let result = state.recommender.suggest_by_tags(&request, &cancel).instrument(span).await;

    let response = match result {
        Ok(ranked) => (StatusCode::OK, Json(ranked)).into_response(),
        Err(error) => failure_response(&error, &correlation_id),
    };
    with_correlation(response, &correlation_id)
}

fn failure_response(error: &SuggestError, correlation_id: &str) -> Response {
    let kind = error.kind();
    if matches!(kind, ErrorKind::Internal | ErrorKind::Auth | ErrorKind::UpstreamUnavailable) {
        warn!(
            event_name = "suggest.request.failed",
            correlation_id = %correlation_id,
            kind = kind.as_str(),
            error = %error,
            "suggest request failed"
        );
    }
    error_response(error)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use scently_cache::InMemoryResponseCache;
    use scently_core::{
        EnrichedNote, Perfume, Properties, Ranked, Recommender, RecommenderSettings,
        ScoreCalculator, Sex,
    };
    use scently_hub::InMemoryCatalog;
    use serde_json::Value;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use super::{perfumist_router, PerfumistState, SuggestQuery, TagsQuery};
    use crate::api::{ErrorBody, CORRELATION_HEADER};
    use crate::cors::CorsPolicy;

    fn perfume(brand: &str, name: &str, sex: Sex, family: &[&str]) -> Perfume {
        Perfume {
            brand: brand.into(),
            name: name.into(),
            sex,
            properties: Properties {
                perfume_type: "edp".into(),
                family: family.iter().map(|value| value.to_string()).collect(),
                ..Properties::default()
            },
            ..Perfume::default()
        }
    }

    fn app(catalog: Vec<Perfume>) -> Router {
        let cache = Arc::new(InMemoryResponseCache::new());
        let recommender = Recommender::new(
            Arc::new(InMemoryCatalog::new(catalog)),
            cache.clone(),
            ScoreCalculator::new(),
            RecommenderSettings::default(),
        );
        let state = PerfumistState {
            recommender: Arc::new(recommender),
            shutdown: CancellationToken::new(),
        };
        perfumist_router(state, cache, CorsPolicy::new(&["http://frontend:3000".to_string()]))
    }

    async fn get(app: Router, uri: &str, origin: Option<&str>) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().uri(uri).header(CORRELATION_HEADER, "test-1");
        if let Some(origin) = origin {
            builder = builder.header(header::ORIGIN, origin);
        }
        let response =
            app.oneshot(builder.body(Body::empty()).expect("request")).await.expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, body.to_vec())
    }

    fn chanel_and_dior() -> Vec<Perfume> {
        vec![
            perfume("Chanel", "N°5", Sex::Female, &["floral"]),
            perfume("Dior", "Sauvage", Sex::Male, &["woody"]),
        ]
    }

    fn tagged(brand: &str, name: &str, sex: Sex, base_tags: &[&str]) -> Perfume {
        let mut perfume = perfume(brand, name, sex, &[]);
        perfume.properties.enriched_base_notes = vec![EnrichedNote {
            name: "Accord".into(),
            tags: base_tags.iter().map(|tag| tag.to_string()).collect(),
        }];
        perfume
    }

    fn tagged_catalog() -> Vec<Perfume> {
        vec![
            tagged("Maison", "Amber Night", Sex::Female, &["warm", "amber"]),
            tagged("Maison", "Warm Wood", Sex::Male, &["warm", "woody"]),
            tagged("Maison", "Green Leaf", Sex::Unisex, &["green"]),
        ]
    }

    #[tokio::test]
    async fn exact_match_is_excluded_from_suggestions() {
        let (status, body) =
            get(app(chanel_and_dior()), "/v1/suggest/perfume?brand=Chanel&name=N%C2%B05", None)
                .await;

        assert_eq!(status, StatusCode::OK);
        let ranked: Vec<Ranked> = serde_json::from_slice(&body).expect("ranked list");
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].perfume.brand, "Dior");
        assert_eq!(ranked[0].rank, 1);

        let raw: Value = serde_json::from_slice(&body).expect("json");
        assert!(raw[0].get("similarity_score").is_some());
    }

    #[tokio::test]
    async fn empty_brand_is_a_validation_error() {
        let (status, body) =
            get(app(chanel_and_dior()), "/v1/suggest/perfume?brand=&name=x", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ErrorBody = serde_json::from_slice(&body).expect("envelope");
        assert_eq!(error, ErrorBody::new("validation", "brand is empty"));
    }

    #[tokio::test]
    async fn missing_brand_is_required() {
        let (status, body) = get(app(chanel_and_dior()), "/v1/suggest/perfume?name=x", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ErrorBody = serde_json::from_slice(&body).expect("envelope");
        assert_eq!(error.message, "brand is required");
    }

    #[tokio::test]
    async fn unknown_reference_is_not_found() {
        let (status, body) =
            get(app(chanel_and_dior()), "/v1/suggest/perfume?brand=Guerlain&name=Shalimar", None)
                .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        let error: ErrorBody = serde_json::from_slice(&body).expect("envelope");
        assert_eq!(error.error, "not_found");
    }

    #[tokio::test]
    async fn foreign_origin_is_rejected_before_the_pipeline() {
        let (status, body) = get(
            app(chanel_and_dior()),
            "/v1/suggest/perfume?brand=Chanel&name=N5",
            Some("http://elsewhere:3000"),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        let error: ErrorBody = serde_json::from_slice(&body).expect("envelope");
        assert_eq!(error.message, "CORS not allowed");
    }

    #[tokio::test]
    async fn health_is_served_alongside() {
        let (status, body) = get(app(Vec::new()), "/health", Some("http://frontend:3000")).await;

        assert_eq!(status, StatusCode::OK);
        let payload: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload["status"], "ready");
    }

    #[tokio::test]
    async fn tags_rank_matching_perfumes_only() {
        let (status, body) = get(app(tagged_catalog()), "/v1/suggest/tags?tags=warm", None).await;

        assert_eq!(status, StatusCode::OK);
        let ranked: Vec<Ranked> = serde_json::from_slice(&body).expect("ranked list");
        let names: Vec<&str> = ranked.iter().map(|entry| entry.perfume.name.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(!names.contains(&"Green Leaf"));
        assert_eq!(ranked[0].rank, 1);
    }

    #[tokio::test]
    async fn tags_narrow_to_the_requested_sex() {
        let (status, body) =
            get(app(tagged_catalog()), "/v1/suggest/tags?tags=warm,woody&sex=male", None).await;

        assert_eq!(status, StatusCode::OK);
        let ranked: Vec<Ranked> = serde_json::from_slice(&body).expect("ranked list");
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].perfume.name, "Warm Wood");
    }

    #[tokio::test]
    async fn missing_tags_are_required() {
        let (status, body) = get(app(tagged_catalog()), "/v1/suggest/tags?sex=male", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ErrorBody = serde_json::from_slice(&body).expect("envelope");
        assert_eq!(error, ErrorBody::new("validation", "tags are required"));
    }

    #[tokio::test]
    async fn blank_tags_are_empty() {
        let (status, body) = get(app(tagged_catalog()), "/v1/suggest/tags?tags=%2C%20", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ErrorBody = serde_json::from_slice(&body).expect("envelope");
        assert_eq!(error, ErrorBody::new("validation", "tags are empty"));
    }

    #[test]
    fn blank_sex_is_treated_as_absent() {
        let query = TagsQuery { tags: Some("warm".into()), sex: Some("  ".into()) };
        let request = query.into_request().expect("tags present");
        assert_eq!(request.sex, None);
        assert_eq!(request.tags, vec!["warm".to_string()]);
    }

    #[test]
    fn query_flags_are_validated() {
        let query = SuggestQuery {
            brand: Some("a".into()),
            name: Some("b".into()),
            use_ai: Some("perhaps".into()),
        };
        assert_eq!(query.into_request().expect_err("bad flag"), "use_ai must be a boolean");

        let query = SuggestQuery { brand: Some("a".into()), name: None, use_ai: None };
        assert_eq!(query.into_request().expect_err("no name"), "name is required");
    }
}
