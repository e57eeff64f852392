//! Outbound HTTP clients and JSON response helpers.
//!
//! Previewed pages are untrusted, so their client never follows redirects on
//! its own: [`get_public`] walks the chain and runs every `Location` through
//! the same static and resolution checks as the original URL. The page
//! client also resolves hostnames through [`PublicOnlyResolver`], so the
//! address it connects to is checked too, not just the one seen during
//! validation.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::header::{ACCEPT, LOCATION};
use reqwest::redirect::Policy;
use serde::Serialize;
use url::Url;

use docsite_core::{HostResolver, ResolvedUrl, parse_public_http_url, resolve_public};

use crate::config::Config;
use crate::error::ApiError;

/// Maximum number of redirects followed for one request.
pub const MAX_REDIRECTS: usize = 10;

/// Cache policy for GitHub summaries and "nothing to preview" outcomes: 1h CDN.
pub const CACHE_SHORT: &str = "public, s-maxage=3600, stale-while-revalidate=86400";

/// Cache policy for parsed link previews: 24h CDN, 7d stale-while-revalidate.
pub const CACHE_LONG: &str = "public, s-maxage=86400, stale-while-revalidate=604800";

/// Client builder for previewed pages.
///
/// Redirects are left to [`get_public`]. Callers may add further settings
/// (e.g. DNS overrides) before building.
pub fn page_client_builder(
    config: &Config,
    resolver: Arc<dyn HostResolver>,
) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .redirect(Policy::none())
        .dns_resolver(Arc::new(PublicOnlyResolver::new(resolver)))
}

/// Client builder for the GitHub REST API.
///
/// The API base comes from configuration, so its redirects (renamed
/// repositories) are followed up to [`MAX_REDIRECTS`].
pub fn github_client_builder(config: &Config) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .redirect(Policy::limited(MAX_REDIRECTS))
}

/// Connect-time resolver that refuses any answer containing a blocked address.
pub struct PublicOnlyResolver {
    inner: Arc<dyn HostResolver>,
}

impl PublicOnlyResolver {
    pub fn new(inner: Arc<dyn HostResolver>) -> Self {
        Self { inner }
    }
}

impl Resolve for PublicOnlyResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let ips = resolve_public(inner.as_ref(), name.as_str()).await?;
            // Port is replaced with the one from the request URL.
            let addrs: Addrs = Box::new(ips.into_iter().map(|ip| SocketAddr::new(ip, 0)));
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(addrs)
        })
    }
}

/// Why [`get_public`] produced no response.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("too many redirects, last request to {url}")]
    TooManyRedirects { url: Url },
}

impl FetchError {
    /// The last URL requested before fetching stopped.
    pub fn url(&self) -> &Url {
        match self {
            Self::Request { url, .. } | Self::TooManyRedirects { url } => url,
        }
    }
}

/// GET `target`, following redirects by hand.
///
/// A `Location` that fails the static or the resolution check is not
/// requested; its 3xx response is returned as the final one.
pub async fn get_public(
    client: &reqwest::Client,
    resolver: &dyn HostResolver,
    target: &ResolvedUrl,
    accept: &'static str,
) -> Result<reqwest::Response, FetchError> {
    let mut current = target.as_url().clone();
    let mut hops = 0;

    loop {
        let response = client
            .get(current.clone())
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: current.clone(),
                source,
            })?;

        if !response.status().is_redirection() {
            return Ok(response);
        }
        let Some(location) = redirect_location(&response) else {
            return Ok(response);
        };
        if hops == MAX_REDIRECTS {
            return Err(FetchError::TooManyRedirects { url: current });
        }
        let Some(next) = verified_hop(resolver, &location).await else {
            tracing::debug!(from = %current, to = %location, "redirect to blocked url not followed");
            return Ok(response);
        };

        current = next;
        hops += 1;
    }
}

fn redirect_location(response: &reqwest::Response) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    response.url().join(location).ok()
}

async fn verified_hop(resolver: &dyn HostResolver, location: &Url) -> Option<Url> {
    let hop = parse_public_http_url(location.as_str())?;
    let resolved = hop.verify_resolution(resolver).await?;
    tracing::debug!(url = %resolved.as_str(), addrs = ?resolved.addrs(), "following redirect");
    Some(resolved.as_url().clone())
}

/// Serialize `body` as a 200 JSON response with cache and ETag headers.
pub fn json_response<T: Serialize>(
    body: &T,
    cache_control: &'static str,
) -> Result<Response, ApiError> {
    let json = serde_json::to_vec(body).map_err(|e| ApiError::Internal(e.into()))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache_control));

    // ETag (xxHash of content)
    let hash = xxhash_rust::xxh3::xxh3_64(&json);
    let etag = format!("\"{}\"", hex_fmt::HexFmt(&hash.to_be_bytes()));
    if let Ok(val) = HeaderValue::from_str(&etag) {
        headers.insert(header::ETAG, val);
    }

    Ok((StatusCode::OK, headers, json).into_response())
}
