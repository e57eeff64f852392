//! `GET /api/github` handler.

use axum::extract::{RawQuery, State};
use axum::response::Response;

use crate::error::ApiError;
use crate::github::{GithubTarget, fetch_summary};
use crate::http::{CACHE_SHORT, json_response};
use crate::state::AppState;

/// Summarize the GitHub repository or account behind `?url=`.
///
/// Validation order: missing parameter, static and DNS safety checks, then
/// the `github.com` shape check.
pub async fn github_handler(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let target_url = super::validated_target(&state, query.as_deref()).await?;
    let target = GithubTarget::from_url(target_url.as_url()).ok_or(ApiError::NotGithub)?;

    let summary = fetch_summary(&state, &target, target_url.as_str()).await?;
    json_response(&summary, CACHE_SHORT)
}
