use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Maximum number of characters of an upstream response body kept in error messages.
pub const SNIPPET_MAX_CHARS: usize = 500;

/// Status used when an upstream failure carries no HTTP status of its own.
pub const FALLBACK_STATUS: u16 = 502;

/// Failure talking to the Talana API.
///
/// The message of HTTP failures always has the shape
/// `HTTP <code> calling <url> response=<snippet>`; the status can be recovered from
/// it with [`parse_status`], which is how callers that only keep the text (the cache
/// stale-serve log) map it back to a response code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct UpstreamError {
    /// HTTP status returned by the upstream, or 502 when none could be determined.
    pub status: u16,
    /// Diagnostic message.
    pub message: String,
}

impl UpstreamError {
    /// Builds the error for a non-success upstream response.
    pub fn http(status: u16, url: &str, body: &str) -> Self {
        Self {
            status,
            message: format!("HTTP {} calling {} response={}", status, url, snippet(body)),
        }
    }

    /// Builds the error for a network level failure (connect, timeout, body read).
    pub fn transport(url: &str, err: impl std::fmt::Display) -> Self {
        Self {
            status: FALLBACK_STATUS,
            message: format!("I/O error calling {}: {}", url, err),
        }
    }

    /// Builds the error for a body that is not valid JSON.
    pub fn invalid_payload(err: impl std::fmt::Display) -> Self {
        Self {
            status: FALLBACK_STATUS,
            message: format!("Invalid JSON from Talana: {}", err),
        }
    }

    pub fn is_status(&self, status: u16) -> bool {
        self.status == status
    }
}

/// Extracts `<code>` from a message starting with `HTTP <code> `.
pub fn parse_status(message: &str) -> Option<u16> {
    let rest = message.strip_prefix("HTTP ")?;
    let end = rest.find(' ').unwrap_or(rest.len());
    rest[..end].trim().parse().ok()
}

/// Truncates a response body to [`SNIPPET_MAX_CHARS`] characters.
pub fn snippet(body: &str) -> String {
    if body.chars().count() > SNIPPET_MAX_CHARS {
        let mut cut: String = body.chars().take(SNIPPET_MAX_CHARS).collect();
        cut.push_str("...");
        cut
    } else {
        body.to_string()
    }
}

/// Application-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The requested employee, contract or record could not be resolved.
    #[error("Not found: {0}")]
    NotFound(String),
    /// Bad request error (invalid input).
    #[error("Bad request: {0}")]
    BadRequest(String),
    /// Talana failed and no cached value could stand in for it.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    /// Internal server error.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    /// True when this is an upstream failure with the given HTTP status.
    pub fn is_upstream_status(&self, status: u16) -> bool {
        matches!(self, AppError::Upstream(e) if e.is_status(status))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Upstream(UpstreamError::invalid_payload(err))
    }
}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Upstream failures keep the upstream status (502 when it is not a valid HTTP
    /// status) and are rendered as a structured `talana_upstream_error` body.
    fn into_response(self) -> Response {
        match self {
            AppError::Upstream(err) => {
                let status =
                    StatusCode::from_u16(err.status).unwrap_or(StatusCode::BAD_GATEWAY);
                tracing::error!("Talana upstream error ({}): {}", status.as_u16(), err.message);
                let body = Json(json!({
                    "error": "talana_upstream_error",
                    "status": status.as_u16(),
                    "message": err.message,
                }));
                (status, body).into_response()
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": msg }))).into_response()
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_message_format() {
        let err = UpstreamError::http(404, "https://talana.test/es/api/persona/1/", "nope");
        assert_eq!(
            err.message,
            "HTTP 404 calling https://talana.test/es/api/persona/1/ response=nope"
        );
        assert_eq!(err.status, 404);
    }

    #[test]
    fn test_status_round_trips_through_message() {
        let err = UpstreamError::http(429, "https://talana.test/x", "slow down");
        assert_eq!(parse_status(&err.message), Some(err.status));
        assert_eq!(parse_status(&AppError::Upstream(err).to_string()), Some(429));
    }

    #[test]
    fn test_unparseable_message_has_no_status() {
        assert_eq!(parse_status("connection reset"), None);
        assert_eq!(parse_status("HTTP abc calling x"), None);
        assert_eq!(parse_status("Not found: No contract found for employee 4"), None);
        assert_eq!(parse_status("HTTP 401"), Some(401));
    }

    #[test]
    fn test_snippet_truncates_long_bodies() {
        let body = "x".repeat(800);
        let cut = snippet(&body);
        assert_eq!(cut.len(), SNIPPET_MAX_CHARS + 3);
        assert!(cut.ends_with("..."));
        assert_eq!(snippet("short"), "short");
    }

    #[test]
    fn test_snippet_respects_char_boundaries() {
        let body = "ñ".repeat(600);
        let cut = snippet(&body);
        assert_eq!(cut.chars().count(), SNIPPET_MAX_CHARS + 3);
    }

    #[test]
    fn test_upstream_response_keeps_status() {
        let response =
            AppError::Upstream(UpstreamError::http(401, "https://talana.test", "")).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AppError::Upstream(UpstreamError {
            status: 42,
            message: "weird".into(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_not_found_response() {
        let response = AppError::NotFound("employee 9".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
