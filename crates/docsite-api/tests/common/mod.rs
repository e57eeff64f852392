//! Shared helpers for route tests.
//!
//! Routes run in-process through `tower::ServiceExt::oneshot`. Hostnames
//! pass the safety checks through a [`StaticResolver`] answering with public
//! addresses, while the HTTP client is pinned to the local mock server.

#![allow(dead_code)]

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use tower::ServiceExt;

use docsite_api::http::{github_client_builder, page_client_builder};
use docsite_api::{AppState, Config, router};
use docsite_core::{HostResolver, StaticResolver};

/// Hostname previewed in tests; resolves publicly, connects to the mock.
pub const PREVIEW_HOST: &str = "preview.test";

/// Hostname whose answer mixes a public and a private address.
pub const INTERNAL_HOST: &str = "intranet.test";

/// Hostname that resolves only to a private address.
pub const PRIVATE_HOST: &str = "private.test";

pub fn resolver() -> StaticResolver {
    StaticResolver::new()
        .with_host("github.com", ["140.82.112.3".parse::<IpAddr>().unwrap()])
        .with_host(PREVIEW_HOST, ["93.184.216.34".parse::<IpAddr>().unwrap()])
        .with_host(
            INTERNAL_HOST,
            [
                "93.184.216.34".parse::<IpAddr>().unwrap(),
                "10.0.0.5".parse::<IpAddr>().unwrap(),
            ],
        )
        .with_host(PRIVATE_HOST, ["10.0.0.5".parse::<IpAddr>().unwrap()])
}

pub fn test_config() -> Config {
    Config {
        preview_timeout: Duration::from_millis(500),
        github_timeout: Duration::from_secs(2),
        ..Config::default()
    }
}

/// Build state whose page client sends traffic for every test hostname to
/// `upstream`, bypassing the connect-time address check. Only the
/// validation in front of each request decides what gets fetched.
pub fn state_with(config: Config, upstream: SocketAddr) -> AppState {
    let resolver: Arc<dyn HostResolver> = Arc::new(resolver());
    let http = page_client_builder(&config, Arc::clone(&resolver))
        .no_proxy()
        .resolve(PREVIEW_HOST, upstream)
        .resolve(INTERNAL_HOST, upstream)
        .resolve(PRIVATE_HOST, upstream)
        .build()
        .unwrap();
    let github = github_client_builder(&config).no_proxy().build().unwrap();
    AppState::with_parts(config, http, github, resolver)
}

/// A local port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Percent-encode a value for use in a query string.
pub fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn header(&self, name: &str) -> &str {
        self.headers[name].to_str().unwrap()
    }
}

pub async fn get(state: AppState, uri: &str) -> TestResponse {
    let response = router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();

    TestResponse {
        status,
        headers,
        body,
    }
}
