//! Application state shared across all request handlers.

use std::sync::Arc;

use docsite_core::{HostResolver, SystemResolver};

use crate::config::Config;
use crate::http;

/// Shared application state available to all request handlers.
///
/// Everything here is immutable after start-up; clones share one connection
/// pool and one resolver.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,

    /// Client for previewed pages; see [`http::get_public`].
    pub http: reqwest::Client,

    /// Client for the GitHub REST API.
    pub github: reqwest::Client,

    /// Resolver used for the DNS-resolution safety check.
    pub resolver: Arc<dyn HostResolver>,
}

impl AppState {
    /// Create application state backed by the system resolver.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let resolver: Arc<dyn HostResolver> = Arc::new(SystemResolver::new()?);
        let http = http::page_client_builder(&config, Arc::clone(&resolver)).build()?;
        let github = http::github_client_builder(&config).build()?;

        tracing::info!(
            max_redirects = http::MAX_REDIRECTS,
            "application state initialized"
        );

        Ok(Self::with_parts(config, http, github, resolver))
    }

    /// Assemble state from pre-built parts.
    pub fn with_parts(
        config: Config,
        http: reqwest::Client,
        github: reqwest::Client,
        resolver: Arc<dyn HostResolver>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            http,
            github,
            resolver,
        }
    }
}
