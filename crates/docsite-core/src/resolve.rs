//! Hostname resolution with fail-closed address validation.

use std::collections::HashMap;
use std::net::IpAddr;

use async_trait::async_trait;
use hickory_resolver::TokioResolver;
use hickory_resolver::config::LookupIpStrategy;

use crate::blocklist::BlockedRanges;
use crate::error::{Error, Result};

/// Source of hostname → address answers.
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Return every address the host resolves to, across both families.
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>>;
}

/// Resolver backed by the system DNS configuration.
pub struct SystemResolver {
    inner: TokioResolver,
}

impl SystemResolver {
    /// Build a resolver from the system configuration.
    ///
    /// Queries A and AAAA records together and makes a single attempt per
    /// lookup; a failed lookup is reported, never retried.
    pub fn new() -> Result<Self> {
        let mut builder =
            TokioResolver::builder_tokio().map_err(|e| Error::dns("<system>", e.to_string()))?;
        let opts = builder.options_mut();
        opts.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
        opts.attempts = 1;

        Ok(Self {
            inner: builder.build(),
        })
    }
}

#[async_trait]
impl HostResolver for SystemResolver {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>> {
        let response = self
            .inner
            .lookup_ip(host)
            .await
            .map_err(|e| Error::dns(host, e.to_string()))?;
        Ok(response.iter().collect())
    }
}

/// Resolver answering from a fixed host table.
///
/// Hosts missing from the table fail to resolve. Useful for hermetic
/// deployments and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    hosts: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the answer for `host`.
    pub fn with_host(
        mut self,
        host: impl Into<String>,
        addrs: impl IntoIterator<Item = IpAddr>,
    ) -> Self {
        let host = normalize(&host.into());
        self.hosts.insert(host, addrs.into_iter().collect());
        self
    }
}

#[async_trait]
impl HostResolver for StaticResolver {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>> {
        self.hosts
            .get(&normalize(host))
            .cloned()
            .ok_or_else(|| Error::dns(host, "no such host"))
    }
}

fn normalize(host: &str) -> String {
    host.trim_end_matches('.').to_ascii_lowercase()
}

/// Resolve `hostname` and return its addresses only if all of them are public.
///
/// IP literals (optionally bracketed) are checked directly without a lookup.
///
/// # Errors
///
/// [`Error::Dns`] when the lookup fails or returns nothing,
/// [`Error::BlockedAddress`] when any address is inside a blocked range.
pub async fn resolve_public(
    resolver: &dyn HostResolver,
    hostname: &str,
) -> Result<Vec<IpAddr>> {
    let host = hostname.trim_start_matches('[').trim_end_matches(']');
    let ranges = BlockedRanges::global();

    if let Ok(ip) = host.parse::<IpAddr>() {
        ranges.check(ip)?;
        return Ok(vec![ip]);
    }

    let addrs = resolver.lookup(host).await?;
    if addrs.is_empty() {
        return Err(Error::dns(host, "no addresses returned"));
    }

    for ip in &addrs {
        ranges.check(*ip)?;
    }

    Ok(addrs)
}

/// Whether `hostname` resolves, right now, exclusively to public addresses.
///
/// Fail-closed: lookup errors, empty answers and any blocked address all
/// yield `false`.
pub async fn has_public_dns_resolution(resolver: &dyn HostResolver, hostname: &str) -> bool {
    match resolve_public(resolver, hostname).await {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!(host = %hostname, error = %e, "resolution check failed");
            false
        }
    }
}
