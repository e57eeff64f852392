//! Static URL validation.
//!
//! Validation happens in two phases that must both pass, in order, before a
//! URL may be fetched:
//!
//! 1. [`PublicUrl::parse`]: scheme, credentials, hostname literal and IP
//!    literal checks. Cheap, synchronous, no network.
//! 2. [`PublicUrl::verify_resolution`]: DNS lookup of the hostname with every
//!    resolved address checked against the blocked ranges.
//!
//! Only a [`ResolvedUrl`] is meant to be handed to an HTTP client. Run the
//! second phase right before the request so the window for DNS rebinding
//! stays small.

use std::net::IpAddr;

use url::{Host, Url};

use crate::blocklist::{BlockedRanges, blocked_hostname};
use crate::error::{Error, Result};
use crate::resolve::{HostResolver, resolve_public};

/// A URL that passed the static checks but has not been resolved yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicUrl {
    inner: Url,
}

impl PublicUrl {
    /// Parse and statically validate an untrusted URL string.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] for unparsable input, a scheme other than
    ///   `http`/`https`, or embedded `user:pass@` credentials.
    /// - [`Error::BlockedHost`] for `localhost`, loopback literals and `*.local`.
    /// - [`Error::BlockedAddress`] for IP literals inside a blocked range.
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input).map_err(|e| Error::invalid_url(e.to_string()))?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(Error::invalid_url(format!(
                    "scheme '{scheme}' not allowed, only http/https"
                )));
            }
        }

        if !url.username().is_empty() || url.password().is_some() {
            return Err(Error::invalid_url("userinfo (user:pass@) not allowed"));
        }

        let host = url
            .host_str()
            .ok_or_else(|| Error::invalid_url("URL must have a host"))?;

        if let Some(reason) = blocked_hostname(host) {
            return Err(Error::BlockedHost {
                host: host.to_ascii_lowercase(),
                reason,
            });
        }

        let ranges = BlockedRanges::global();
        match url.host() {
            Some(Host::Ipv4(ip)) => ranges.check(IpAddr::V4(ip))?,
            Some(Host::Ipv6(ip)) => ranges.check(IpAddr::V6(ip))?,
            _ => {}
        }

        Ok(Self { inner: url })
    }

    /// Hostname as it appears in the URL (IPv6 literals keep their brackets).
    pub fn host(&self) -> &str {
        self.inner.host_str().unwrap_or_default()
    }

    /// Path component.
    pub fn path(&self) -> &str {
        self.inner.path()
    }

    /// The normalised URL string.
    pub fn as_str(&self) -> &str {
        self.inner.as_str()
    }

    /// Borrow the parsed URL.
    pub fn as_url(&self) -> &Url {
        &self.inner
    }

    /// Resolve the hostname and promote the URL if every address is public.
    ///
    /// Returns `None` on any lookup failure, an empty answer, or a single
    /// blocked address. Transient DNS errors are not distinguished from
    /// hostile hosts.
    pub async fn verify_resolution(self, resolver: &dyn HostResolver) -> Option<ResolvedUrl> {
        let outcome = resolve_public(resolver, self.host()).await;
        match outcome {
            Ok(addrs) => Some(ResolvedUrl {
                inner: self.inner,
                addrs,
            }),
            Err(e) => {
                tracing::debug!(host = %self.host(), error = %e, "url rejected by resolution check");
                None
            }
        }
    }
}

/// A URL whose hostname resolved exclusively to public addresses.
#[derive(Debug, Clone)]
pub struct ResolvedUrl {
    inner: Url,
    addrs: Vec<IpAddr>,
}

impl ResolvedUrl {
    /// Addresses the hostname resolved to during validation.
    pub fn addrs(&self) -> &[IpAddr] {
        &self.addrs
    }

    /// Hostname as it appears in the URL.
    pub fn host(&self) -> &str {
        self.inner.host_str().unwrap_or_default()
    }

    /// The normalised URL string.
    pub fn as_str(&self) -> &str {
        self.inner.as_str()
    }

    /// Borrow the parsed URL.
    pub fn as_url(&self) -> &Url {
        &self.inner
    }
}

/// Statically validate an untrusted URL; `None` if it must not be fetched.
///
/// This does not touch DNS. Callers must still run
/// [`has_public_dns_resolution`](crate::has_public_dns_resolution) or
/// [`PublicUrl::verify_resolution`] before any network use.
pub fn parse_public_http_url(input: &str) -> Option<PublicUrl> {
    match PublicUrl::parse(input) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::debug!(error = %e, "url rejected by static check");
            None
        }
    }
}
