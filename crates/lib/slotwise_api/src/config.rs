//! API server configuration.

use chrono_tz::Tz;
use url::Url;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3200").
    pub bind_addr: String,
    /// The service's home IANA zone; all window defaults resolve in it.
    pub service_tz: Tz,
    /// Bookable slot length in minutes.
    pub slot_duration_min: u32,
    /// Rate-limit window length in seconds.
    pub rate_window_secs: i64,
    /// Maximum subscribe requests per key per window.
    pub rate_max_per_window: u32,
    /// Confirmation-token lifetime in hours.
    pub token_ttl_hours: i64,
    /// External busy-feed URLs. Empty means unconfigured (availability
    /// responds 503, never an empty slot list).
    pub feed_urls: Vec<Url>,
    /// Feed cache TTL in seconds; 0 disables caching.
    pub feed_cache_ttl_secs: i64,
    /// Base URL of the CRM contact API.
    pub contact_api_url: Url,
    /// Bearer token for the CRM contact API.
    pub contact_api_key: String,
    /// Redirect destination after a successful confirm.
    pub confirm_ok_url: String,
    /// Redirect destination for an invalid/expired confirm link.
    pub confirm_invalid_url: String,
    /// When false, MX verification is skipped (local development).
    pub verify_mx: bool,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable               | Default                               |
    /// |------------------------|---------------------------------------|
    /// | `BIND_ADDR`            | `127.0.0.1:3200`                      |
    /// | `SERVICE_TZ`           | `Europe/Berlin`                       |
    /// | `SLOT_DURATION_MIN`    | `30`                                  |
    /// | `RATE_WINDOW_SECS`     | `60`                                  |
    /// | `RATE_MAX_PER_WINDOW`  | `5`                                   |
    /// | `TOKEN_TTL_HOURS`      | `48`                                  |
    /// | `BUSY_FEED_URLS`       | empty (comma-separated list)          |
    /// | `FEED_CACHE_TTL_SECS`  | `120`                                 |
    /// | `CONTACT_API_URL`      | `http://127.0.0.1:4010/`              |
    /// | `CONTACT_API_KEY`      | empty                                 |
    /// | `CONFIRM_OK_URL`       | `/subscribe/confirmed`                |
    /// | `CONFIRM_INVALID_URL`  | `/subscribe/invalid`                  |
    /// | `VERIFY_MX`            | `true`                                |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3200".into()),
            service_tz: env_parsed("SERVICE_TZ", chrono_tz::Europe::Berlin),
            slot_duration_min: env_parsed("SLOT_DURATION_MIN", 30),
            rate_window_secs: env_parsed("RATE_WINDOW_SECS", 60),
            rate_max_per_window: env_parsed("RATE_MAX_PER_WINDOW", 5),
            token_ttl_hours: env_parsed("TOKEN_TTL_HOURS", 48),
            feed_urls: env_url_list("BUSY_FEED_URLS"),
            feed_cache_ttl_secs: env_parsed("FEED_CACHE_TTL_SECS", 120),
            contact_api_url: env_parsed(
                "CONTACT_API_URL",
                Url::parse("http://127.0.0.1:4010/").expect("static URL"),
            ),
            contact_api_key: std::env::var("CONTACT_API_KEY").unwrap_or_default(),
            confirm_ok_url: std::env::var("CONFIRM_OK_URL")
                .unwrap_or_else(|_| "/subscribe/confirmed".into()),
            confirm_invalid_url: std::env::var("CONFIRM_INVALID_URL")
                .unwrap_or_else(|_| "/subscribe/invalid".into()),
            verify_mx: env_parsed("VERIFY_MX", true),
        }
        .sanitized()
    }

    /// Floors for values that must stay positive: a zero slot length cannot
    /// tile a window and a non-positive window length resets the rate
    /// limiter on every request.
    fn sanitized(mut self) -> Self {
        if self.slot_duration_min == 0 {
            tracing::warn!("SLOT_DURATION_MIN must be at least 1; using 30");
            self.slot_duration_min = 30;
        }
        if self.rate_window_secs <= 0 {
            tracing::warn!("RATE_WINDOW_SECS must be positive; using 60");
            self.rate_window_secs = 60;
        }
        self
    }
}

/// Read and parse an env var, falling back to `default` when unset or
/// unparseable.
fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Comma-separated URL list; entries that fail to parse are skipped with a
/// warning rather than taking the service down.
fn env_url_list(name: &str) -> Vec<Url> {
    let Ok(raw) = std::env::var(name) else {
        return Vec::new();
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match Url::parse(s) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(entry = s, error = %e, "skipping malformed feed URL");
                None
            }
        })
        .collect()
}
