//! Blocklists for hostnames and IP address ranges.
//!
//! The range table is built once per process and shared read-only by both the
//! static URL check and the DNS-resolution check.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use ipnet::{Ipv4Net, Ipv6Net};

use crate::error::{Error, Result};

/// IPv4 ranges that outbound requests must never reach.
const BLOCKED_V4: &[&str] = &[
    "0.0.0.0/8",       // "this" network
    "10.0.0.0/8",      // private
    "100.64.0.0/10",   // shared address space (CGNAT)
    "127.0.0.0/8",     // loopback
    "169.254.0.0/16",  // link-local, cloud metadata
    "172.16.0.0/12",   // private
    "192.0.0.0/24",    // IETF protocol assignments
    "192.0.2.0/24",    // TEST-NET-1
    "192.168.0.0/16",  // private
    "198.18.0.0/15",   // benchmarking
    "198.51.100.0/24", // TEST-NET-2
    "203.0.113.0/24",  // TEST-NET-3
    "224.0.0.0/4",     // multicast
    "240.0.0.0/4",     // reserved, broadcast
];

/// IPv6 ranges that outbound requests must never reach.
const BLOCKED_V6: &[&str] = &[
    "::/128",        // unspecified
    "::1/128",       // loopback
    "fc00::/7",      // unique local
    "fe80::/10",     // link-local
    "ff00::/8",      // multicast
    "2001:db8::/32", // documentation
];

/// Hostnames rejected before any parsing of the address itself.
const BLOCKED_HOSTNAMES: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0", "::1"];

/// mDNS suffix; anything under it lives on the local network.
const BLOCKED_SUFFIX: &str = ".local";

static BLOCKED_RANGES: LazyLock<BlockedRanges> = LazyLock::new(BlockedRanges::standard);

/// Immutable table of blocked CIDR ranges.
#[derive(Debug, Clone)]
pub struct BlockedRanges {
    v4: Vec<Ipv4Net>,
    v6: Vec<Ipv6Net>,
}

impl BlockedRanges {
    /// The process-wide table.
    pub fn global() -> &'static Self {
        &BLOCKED_RANGES
    }

    fn standard() -> Self {
        let v4 = BLOCKED_V4
            .iter()
            .map(|cidr| cidr.parse().expect("blocked IPv4 range should parse"))
            .collect();
        let v6 = BLOCKED_V6
            .iter()
            .map(|cidr| cidr.parse().expect("blocked IPv6 range should parse"))
            .collect();
        Self { v4, v6 }
    }

    /// Return the blocked range containing `ip`, if any.
    ///
    /// IPv6 addresses that embed an IPv4 address (`::ffff:a.b.c.d` and the
    /// deprecated `::a.b.c.d`) are unwrapped and checked against the IPv4
    /// table.
    pub fn matching_range(&self, ip: IpAddr) -> Option<String> {
        match ip {
            IpAddr::V4(v4) => self.match_v4(v4),
            IpAddr::V6(v6) => self.match_v6(v6),
        }
    }

    /// Whether `ip` falls inside any blocked range.
    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        self.matching_range(ip).is_some()
    }

    /// Like [`is_blocked`](Self::is_blocked), but reports the matching range.
    pub fn check(&self, ip: IpAddr) -> Result<()> {
        match self.matching_range(ip) {
            Some(range) => Err(Error::BlockedAddress { ip, range }),
            None => Ok(()),
        }
    }

    fn match_v4(&self, ip: Ipv4Addr) -> Option<String> {
        self.v4
            .iter()
            .find(|net| net.contains(&ip))
            .map(ToString::to_string)
    }

    fn match_v6(&self, ip: Ipv6Addr) -> Option<String> {
        // ::/128 and ::1/128 must match here, before the IPv4-compatible
        // unwrap below would read them as 0.0.0.0 / 0.0.0.1.
        if let Some(net) = self.v6.iter().find(|net| net.contains(&ip)) {
            return Some(net.to_string());
        }

        if let Some(v4) = ip.to_ipv4_mapped() {
            return self.match_v4(v4);
        }

        embedded_compat_v4(ip).and_then(|v4| self.match_v4(v4))
    }
}

/// Extract the IPv4 address from a deprecated IPv4-compatible IPv6 address.
fn embedded_compat_v4(ip: Ipv6Addr) -> Option<Ipv4Addr> {
    let segments = ip.segments();
    if segments[..6] != [0, 0, 0, 0, 0, 0] {
        return None;
    }
    if segments[6] == 0 && segments[7] <= 1 {
        return None;
    }
    let [.., a, b, c, d] = ip.octets();
    Some(Ipv4Addr::new(a, b, c, d))
}

/// Check a hostname against the literal blocklist.
///
/// Comparison is case-insensitive and ignores a trailing FQDN dot and IPv6
/// brackets. Returns the matching rule.
pub fn blocked_hostname(host: &str) -> Option<&'static str> {
    let host = host
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim_end_matches('.')
        .to_ascii_lowercase();

    if let Some(&literal) = BLOCKED_HOSTNAMES.iter().find(|&&b| b == host) {
        return Some(literal);
    }
    if host.ends_with(BLOCKED_SUFFIX) {
        return Some(BLOCKED_SUFFIX);
    }
    None
}
