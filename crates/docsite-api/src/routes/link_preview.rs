//! `GET /api/link-preview` handler.

use axum::extract::{RawQuery, State};
use axum::response::Response;

use crate::error::ApiError;
use crate::http::json_response;
use crate::preview::fetch_preview;
use crate::state::AppState;

/// Preview the page behind `?url=`.
///
/// Only validation failures are errors; fetch problems produce an empty
/// preview with a short cache lifetime.
pub async fn link_preview_handler(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let target = super::validated_target(&state, query.as_deref()).await?;

    let outcome = fetch_preview(&state, &target).await;
    let cache_control = outcome.cache_control();
    json_response(&outcome.into_preview(), cache_control)
}
