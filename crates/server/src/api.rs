//! Pieces shared by every HTTP surface: the error envelope and request
//! correlation.

use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use scently_core::{ErrorKind, SuggestError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self { error: error.into(), message: message.into() }
    }
}

pub fn envelope(status: StatusCode, error: &str, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody::new(error, message))).into_response()
}

pub fn validation_error(message: impl Into<String>) -> Response {
    envelope(StatusCode::BAD_REQUEST, ErrorKind::Validation.as_str(), message)
}

/// Renders a suggest failure. Validation and not-found messages are safe to
/// show; everything else gets the generic text for its kind.
pub fn error_response(error: &SuggestError) -> Response {
    let kind = error.kind();
    let status =
        StatusCode::from_u16(kind.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = match kind {
        ErrorKind::Validation | ErrorKind::NotFound => error.to_string(),
        _ => kind.user_message().to_string(),
    };
    envelope(status, kind.as_str(), message)
}

/// Echoes the caller's correlation id, or mints a new one.
pub fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty() && value.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

pub fn with_correlation(mut response: Response, correlation_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(correlation_id) {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}

/// Lenient boolean query flag. Absent or empty means false.
pub fn parse_flag(raw: Option<&str>) -> Option<bool> {
    match raw.map(str::trim) {
        None | Some("") => Some(false),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
    }
}
