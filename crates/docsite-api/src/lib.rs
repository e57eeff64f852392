//! Docsite API - embed metadata routes for a documentation site.
//!
//! Two stateless JSON routes that the site's rendering layer calls to build
//! rich link cards. Both take an untrusted `url` query parameter and only
//! fetch it after it passed the SSRF checks in [`docsite_core`].
//!
//! # Routes
//!
//! ```text
//! GET /api/github?url=https://github.com/{owner}/{repo}
//! GET /api/github?url=https://github.com/{login}
//! GET /api/link-preview?url=https://example.com/post
//! GET /health
//! ```
//!
//! # Security
//!
//! - Only `http`/`https` URLs without credentials are accepted
//! - Every address the hostname resolves to must be public
//! - Every redirect hop gets the same static and DNS checks before it is followed
//! - Connect-time lookups for previewed pages refuse blocked addresses
//! - Preview fetches are bounded by a deadline and a body size cap
//! - Error bodies are generic; rejection reasons only go to the logs
//!
//! # Caching
//!
//! Responses carry `Cache-Control` with `s-maxage` for CDN caching and a
//! content-hash `ETag`.

pub mod config;
pub mod error;
pub mod github;
pub mod http;
pub mod preview;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::ApiError;
pub use routes::{app, router};
pub use state::AppState;
