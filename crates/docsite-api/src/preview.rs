//! Link preview fetching.
//!
//! A preview fetch never fails from the caller's point of view: anything that
//! goes wrong after validation (transport error, deadline, non-HTML body)
//! degrades to an empty preview that only carries the URL.

use reqwest::header::{CONTENT_TYPE, HeaderMap};
use serde::Serialize;
use tokio::time::{Instant, timeout_at};
use url::Url;

use docsite_core::{ResolvedUrl, extract_html_metadata};

use crate::http::{CACHE_LONG, CACHE_SHORT, get_public};
use crate::state::AppState;

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml";

/// Response body of `GET /api/link-preview`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPreview {
    /// Final URL after redirects, or the requested URL if none was reached.
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Absolute image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
}

/// Result of a preview fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewOutcome {
    /// An HTML page was fetched and parsed.
    Parsed(LinkPreview),
    /// Nothing to show: non-2xx, non-HTML, transport error or deadline.
    Empty { url: String },
}

impl PreviewOutcome {
    /// Parsed previews are cached for a day, empty ones for an hour.
    pub fn cache_control(&self) -> &'static str {
        match self {
            Self::Parsed(_) => CACHE_LONG,
            Self::Empty { .. } => CACHE_SHORT,
        }
    }

    pub fn into_preview(self) -> LinkPreview {
        match self {
            Self::Parsed(preview) => preview,
            Self::Empty { url } => LinkPreview {
                url,
                ..LinkPreview::default()
            },
        }
    }
}

/// Fetch `target` and extract its preview metadata.
///
/// One deadline covers the request, every redirect hop and the body read.
pub async fn fetch_preview(state: &AppState, target: &ResolvedUrl) -> PreviewOutcome {
    let deadline = Instant::now() + state.config.preview_timeout;
    let requested = target.as_str().to_string();

    let send = get_public(&state.http, state.resolver.as_ref(), target, HTML_ACCEPT);

    let response = match timeout_at(deadline, send).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            tracing::warn!(url = %requested, error = %e, "link preview fetch failed");
            return PreviewOutcome::Empty {
                url: e.url().to_string(),
            };
        }
        Err(_) => {
            tracing::warn!(url = %requested, "link preview deadline exceeded");
            return PreviewOutcome::Empty { url: requested };
        }
    };

    let final_url = response.url().clone();
    let status = response.status();
    if !status.is_success() || !is_html(response.headers()) {
        tracing::debug!(url = %final_url, %status, "nothing to preview");
        return PreviewOutcome::Empty {
            url: final_url.to_string(),
        };
    }

    let body = match timeout_at(deadline, read_capped(response, state.config.preview_max_bytes))
        .await
    {
        Ok(Ok(body)) => body,
        Ok(Err(e)) => {
            tracing::warn!(url = %final_url, error = %e, "link preview body read failed");
            return PreviewOutcome::Empty {
                url: final_url.to_string(),
            };
        }
        Err(_) => {
            tracing::warn!(url = %final_url, "link preview deadline exceeded reading body");
            return PreviewOutcome::Empty {
                url: final_url.to_string(),
            };
        }
    };

    let html = String::from_utf8_lossy(&body);
    let meta = extract_html_metadata(&html);
    let image = meta
        .image
        .as_deref()
        .and_then(|src| absolute_image(&final_url, src));

    tracing::debug!(
        url = %final_url,
        bytes = body.len(),
        has_title = meta.title.is_some(),
        "link preview parsed"
    );

    PreviewOutcome::Parsed(LinkPreview {
        url: final_url.to_string(),
        title: meta.title,
        description: meta.description,
        image,
        site_name: meta.site_name,
    })
}

fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"))
}

/// Read at most `max_bytes` of the body; the rest is never pulled.
async fn read_capped(mut response: reqwest::Response, max_bytes: usize) -> reqwest::Result<Vec<u8>> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = max_bytes - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Resolve an image reference against the page URL. Only http(s) results
/// are kept.
fn absolute_image(base: &Url, src: &str) -> Option<String> {
    let resolved = base.join(src).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}
