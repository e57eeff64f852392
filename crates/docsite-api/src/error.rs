//! API error types and response formatting.
//!
//! Every error becomes a JSON `{"error": "..."}` body with a fixed public
//! message. Details stay in the logs so clients cannot tell which check
//! rejected their URL.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// API error type that converts to appropriate HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No `url` query parameter, or an empty one.
    #[error("missing url parameter")]
    MissingUrl,

    /// The URL failed static validation or the DNS-resolution check.
    #[error("invalid or blocked url")]
    InvalidUrl,

    /// The URL is not a `github.com/{account}` or `github.com/{owner}/{repo}` link.
    #[error("not a github.com url")]
    NotGithub,

    /// GitHub answered with a non-success status.
    #[error("GitHub API returned {0}")]
    GithubStatus(reqwest::StatusCode),

    /// GitHub answered 2xx with a body we could not understand.
    #[error("unexpected GitHub API payload: {0}")]
    GithubPayload(#[from] serde_json::Error),

    /// The outbound request itself failed (connect, TLS, timeout, body read).
    #[error("upstream fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Internal server error (bad configuration, serialization).
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body.
#[derive(Debug, Clone, Serialize)]
struct ErrorResponse {
    error: &'static str,
}

impl ApiError {
    /// Status code and client-facing message.
    pub fn public_parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::MissingUrl => (StatusCode::BAD_REQUEST, "Missing url"),
            Self::InvalidUrl => (StatusCode::BAD_REQUEST, "Invalid or blocked url"),
            Self::NotGithub => (StatusCode::BAD_REQUEST, "Not a github.com url"),
            Self::GithubStatus(_) | Self::GithubPayload(_) => {
                (StatusCode::BAD_GATEWAY, "GitHub API error")
            }
            Self::Fetch(_) => (StatusCode::BAD_GATEWAY, "Fetch failed"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::GithubStatus(_) | Self::GithubPayload(_) | Self::Fetch(_) => {
                tracing::warn!(error = %self, "upstream request failed");
            }
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
            }
            _ => {}
        }

        let (status, error) = self.public_parts();
        (status, Json(ErrorResponse { error })).into_response()
    }
}
