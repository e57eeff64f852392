//! Route definitions for the embed API.
//!
//! ## Routes
//!
//! - `GET /health` - Health check (JSON)
//! - `GET /api/github?url=` - GitHub repository/account summary
//! - `GET /api/link-preview?url=` - Open Graph link preview

mod github;
mod health;
mod link_preview;

use axum::Router;
use axum::http::Request;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Level;

use docsite_core::{ResolvedUrl, parse_public_http_url};

use crate::error::ApiError;
use crate::state::AppState;

/// Build the complete embed API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/github", get(github::github_handler))
        .route("/api/link-preview", get(link_preview::link_preview_handler))
        .with_state(state)
}

/// [`router`] wrapped in request tracing and a permissive CORS layer.
pub fn app(state: AppState) -> Router {
    router(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::span!(
                    Level::INFO,
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Take the `url` query parameter through both safety checks.
///
/// Static and resolution failures share one error so callers cannot probe
/// which check fired.
async fn validated_target(state: &AppState, query: Option<&str>) -> Result<ResolvedUrl, ApiError> {
    let raw = url_param(query).ok_or(ApiError::MissingUrl)?;
    let candidate = parse_public_http_url(&raw).ok_or(ApiError::InvalidUrl)?;
    let resolved = candidate
        .verify_resolution(state.resolver.as_ref())
        .await
        .ok_or(ApiError::InvalidUrl)?;

    tracing::debug!(url = %resolved.as_str(), addrs = ?resolved.addrs(), "url passed safety checks");
    Ok(resolved)
}

/// First `url` value in the query string; blank counts as missing.
fn url_param(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
