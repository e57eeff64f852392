//! Application configuration loaded from environment variables.

use std::fmt;
use std::time::Duration;

use anyhow::Context;

/// Outbound User-Agent used when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!(
    "docsite-embed/",
    env!("CARGO_PKG_VERSION"),
    " (+link preview fetcher)"
);

/// Application configuration.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8787").
    pub bind_addr: String,

    /// Optional GitHub token sent as a bearer token to the REST API.
    pub github_token: Option<String>,

    /// GitHub REST API base URL, without trailing slash.
    pub github_api_base: String,

    /// Per-request timeout for GitHub API calls.
    pub github_timeout: Duration,

    /// Hard deadline for a link preview fetch, covering connect, headers and body.
    pub preview_timeout: Duration,

    /// Maximum number of body bytes read from a previewed page.
    pub preview_max_bytes: usize,

    /// User-Agent for all outbound requests.
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8787".to_string(),
            github_token: None,
            github_api_base: "https://api.github.com".to_string(),
            github_timeout: Duration::from_secs(10),
            preview_timeout: Duration::from_secs(8),
            preview_max_bytes: 5_000_000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

// Hand-written so the token never ends up in logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("github_token", &self.github_token.as_ref().map(|_| "<redacted>"))
            .field("github_api_base", &self.github_api_base)
            .field("github_timeout", &self.github_timeout)
            .field("preview_timeout", &self.preview_timeout)
            .field("preview_max_bytes", &self.preview_max_bytes)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// All variables are optional:
    /// - `DOCSITE_BIND_ADDR`: Server bind address (default: "0.0.0.0:8787")
    /// - `GITHUB_TOKEN`: Bearer token for api.github.com (default: unset)
    /// - `GITHUB_API_BASE`: GitHub REST API base URL (default: "https://api.github.com")
    /// - `GITHUB_TIMEOUT_MS`: GitHub request timeout (default: 10000)
    /// - `LINK_PREVIEW_TIMEOUT_MS`: Link preview deadline (default: 8000)
    /// - `LINK_PREVIEW_MAX_BYTES`: Link preview body cap (default: 5000000)
    /// - `DOCSITE_USER_AGENT`: Outbound User-Agent
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = std::env::var("DOCSITE_BIND_ADDR").unwrap_or(defaults.bind_addr);

        let github_token = std::env::var("GITHUB_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let github_api_base = std::env::var("GITHUB_API_BASE")
            .unwrap_or(defaults.github_api_base)
            .trim_end_matches('/')
            .to_string();
        url::Url::parse(&github_api_base)
            .with_context(|| format!("GITHUB_API_BASE is not a valid URL: {github_api_base}"))?;

        let github_timeout = env_millis("GITHUB_TIMEOUT_MS")?.unwrap_or(defaults.github_timeout);
        let preview_timeout =
            env_millis("LINK_PREVIEW_TIMEOUT_MS")?.unwrap_or(defaults.preview_timeout);

        let preview_max_bytes = match std::env::var("LINK_PREVIEW_MAX_BYTES") {
            Ok(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("LINK_PREVIEW_MAX_BYTES must be a byte count: {raw}"))?,
            Err(_) => defaults.preview_max_bytes,
        };

        let user_agent = std::env::var("DOCSITE_USER_AGENT")
            .ok()
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or(defaults.user_agent);

        tracing::info!(
            bind_addr = %bind_addr,
            github_api_base = %github_api_base,
            github_token = github_token.is_some(),
            preview_timeout_ms = preview_timeout.as_millis() as u64,
            preview_max_bytes,
            "embed api configuration loaded"
        );

        Ok(Self {
            bind_addr,
            github_token,
            github_api_base,
            github_timeout,
            preview_timeout,
            preview_max_bytes,
            user_agent,
        })
    }
}

fn env_millis(key: &str) -> anyhow::Result<Option<Duration>> {
    match std::env::var(key) {
        Ok(raw) => {
            let ms: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{key} must be a number of milliseconds: {raw}"))?;
            Ok(Some(Duration::from_millis(ms)))
        }
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize config tests that manipulate env vars.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "DOCSITE_BIND_ADDR",
        "GITHUB_TOKEN",
        "GITHUB_API_BASE",
        "GITHUB_TIMEOUT_MS",
        "LINK_PREVIEW_TIMEOUT_MS",
        "LINK_PREVIEW_MAX_BYTES",
        "DOCSITE_USER_AGENT",
    ];

    /// Helper to run config tests with isolated env vars.
    fn with_env_vars<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());

        let saved: Vec<_> = ENV_KEYS
            .iter()
            .map(|k| (*k, std::env::var(k).ok()))
            .collect();

        // SAFETY: Serialized by mutex; only test code touches these vars.
        unsafe {
            for k in ENV_KEYS {
                std::env::remove_var(k);
            }
            for (k, v) in vars {
                std::env::set_var(k, v);
            }
        }

        f();

        // SAFETY: Restoring original env state.
        unsafe {
            for (k, v) in &saved {
                match v {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    #[test]
    fn config_defaults() {
        with_env_vars(&[], || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.bind_addr, "0.0.0.0:8787");
            assert_eq!(config.github_token, None);
            assert_eq!(config.github_api_base, "https://api.github.com");
            assert_eq!(config.github_timeout, Duration::from_secs(10));
            assert_eq!(config.preview_timeout, Duration::from_secs(8));
            assert_eq!(config.preview_max_bytes, 5_000_000);
            assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        });
    }

    #[test]
    fn config_custom_values() {
        with_env_vars(
            &[
                ("DOCSITE_BIND_ADDR", "127.0.0.1:9090"),
                ("GITHUB_TOKEN", "ghp_test"),
                ("GITHUB_API_BASE", "https://ghe.example.com/api/v3/"),
                ("GITHUB_TIMEOUT_MS", "2500"),
                ("LINK_PREVIEW_TIMEOUT_MS", "1500"),
                ("LINK_PREVIEW_MAX_BYTES", "1024"),
                ("DOCSITE_USER_AGENT", "custom-agent/1.0"),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.bind_addr, "127.0.0.1:9090");
                assert_eq!(config.github_token.as_deref(), Some("ghp_test"));
                assert_eq!(config.github_api_base, "https://ghe.example.com/api/v3");
                assert_eq!(config.github_timeout, Duration::from_millis(2500));
                assert_eq!(config.preview_timeout, Duration::from_millis(1500));
                assert_eq!(config.preview_max_bytes, 1024);
                assert_eq!(config.user_agent, "custom-agent/1.0");
            },
        );
    }

    #[test]
    fn config_empty_token_is_unset() {
        with_env_vars(&[("GITHUB_TOKEN", "  ")], || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.github_token, None);
        });
    }

    #[test]
    fn config_rejects_bad_numbers() {
        with_env_vars(&[("LINK_PREVIEW_TIMEOUT_MS", "eight seconds")], || {
            assert!(Config::from_env().is_err());
        });
        with_env_vars(&[("LINK_PREVIEW_MAX_BYTES", "-1")], || {
            assert!(Config::from_env().is_err());
        });
    }

    #[test]
    fn config_rejects_bad_api_base() {
        with_env_vars(&[("GITHUB_API_BASE", "not a url")], || {
            assert!(Config::from_env().is_err());
        });
    }

    #[test]
    fn config_debug_redacts_token() {
        let config = Config {
            github_token: Some("ghp_secret".to_string()),
            ..Config::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("<redacted>"));
    }
}
