//! Docsite Core - outbound request safety and HTML metadata parsing.
//!
//! Shared by the embed API routes that fetch third-party metadata on behalf
//! of documentation pages.
//!
//! # Architecture
//!
//! - **Blocklist**: fixed table of private/reserved CIDR ranges and hostname literals
//! - **Safe URL**: static URL validation (`PublicUrl`) and its resolved form (`ResolvedUrl`)
//! - **Resolve**: pluggable hostname resolution with fail-closed address checks
//! - **HTML metadata**: regex-based Open Graph / Twitter card extraction
//!
//! # Example
//!
//! ```rust,no_run
//! use docsite_core::{SystemResolver, parse_public_http_url};
//!
//! # async fn example() -> Result<(), docsite_core::Error> {
//! let resolver = SystemResolver::new()?;
//! if let Some(url) = parse_public_http_url("https://example.com/") {
//!     if let Some(resolved) = url.verify_resolution(&resolver).await {
//!         println!("safe to fetch {}", resolved.as_str());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod blocklist;
pub mod error;
pub mod html_metadata;
pub mod resolve;
pub mod safe_url;

pub use blocklist::BlockedRanges;
pub use error::{Error, Result};
pub use html_metadata::{HtmlMetadata, decode_html_entities, extract_html_metadata};
pub use resolve::{
    HostResolver, StaticResolver, SystemResolver, has_public_dns_resolution, resolve_public,
};
pub use safe_url::{PublicUrl, ResolvedUrl, parse_public_http_url};
