//! Error types for URL validation.
//!
//! These carry the precise rejection reason for logging. Callers that face
//! untrusted clients should collapse them into a single generic message.

use std::net::IpAddr;

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a candidate URL or hostname was rejected.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed URL, forbidden scheme, or embedded credentials.
    #[error("invalid url: {reason}")]
    InvalidUrl {
        /// What was wrong with the input.
        reason: String,
    },

    /// Hostname is a known-private literal such as `localhost` or `*.local`.
    #[error("blocked host {host}: {reason}")]
    BlockedHost {
        /// The offending hostname (lowercased).
        host: String,
        /// Which rule matched.
        reason: &'static str,
    },

    /// An address (literal or resolved) falls inside a blocked range.
    #[error("blocked address {ip} (in {range})")]
    BlockedAddress {
        /// The blocked address as seen before IPv4 unwrapping.
        ip: IpAddr,
        /// The CIDR range that matched.
        range: String,
    },

    /// DNS resolution failed or returned nothing.
    #[error("DNS error for {host}: {message}")]
    Dns {
        /// The hostname being resolved.
        host: String,
        /// Resolver error text.
        message: String,
    },
}

impl Error {
    pub(crate) fn invalid_url(reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            reason: reason.into(),
        }
    }

    pub(crate) fn dns(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Dns {
            host: host.into(),
            message: message.into(),
        }
    }
}
