//! Client configuration.
//!
//! Everything can be set from environment variables; unset variables fall
//! back to the defaults below.

use std::env;
use std::time::Duration;

use crate::error::ContentError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Settings shared by the transport, the repository and the query cache.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Root of the content API, e.g. `http://localhost:8000/api`
    pub base_url: String,
    /// Whole-request timeout applied by the HTTP client
    pub timeout: Duration,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Page size sent with every list request
    pub page_size: u32,
    /// How long public query results are served without refetching
    pub public_stale_time: Duration,
    /// How long a cached query result is kept after its last update
    pub cache_gc_time: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            page_size: DEFAULT_PAGE_SIZE,
            public_stale_time: Duration::from_secs(60),
            cache_gc_time: Duration::from_secs(5 * 60),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from `BLOG_*` environment variables.
    pub fn from_env() -> Result<Self, ContentError> {
        let defaults = Self::default();

        let base_url = env::var("BLOG_API_URL").unwrap_or(defaults.base_url);
        let timeout = secs_var("BLOG_API_TIMEOUT_SECS")?.unwrap_or(defaults.timeout);
        let connect_timeout =
            secs_var("BLOG_API_CONNECT_TIMEOUT_SECS")?.unwrap_or(defaults.connect_timeout);
        let public_stale_time =
            secs_var("BLOG_PUBLIC_STALE_SECS")?.unwrap_or(defaults.public_stale_time);
        let cache_gc_time = secs_var("BLOG_CACHE_GC_SECS")?.unwrap_or(defaults.cache_gc_time);

        let page_size = match env::var("BLOG_PAGE_SIZE") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or_else(|| {
                    ContentError::Config(format!("BLOG_PAGE_SIZE must be a positive integer, got {:?}", raw))
                })?,
            Err(_) => defaults.page_size,
        };

        let config = Self {
            base_url,
            timeout,
            connect_timeout,
            page_size,
            public_stale_time,
            cache_gc_time,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ContentError> {
        reqwest::Url::parse(&self.base_url)
            .map_err(|e| ContentError::Config(format!("invalid base URL {:?}: {}", self.base_url, e)))?;
        if self.cache_gc_time < self.public_stale_time {
            return Err(ContentError::Config(
                "cache GC time must not be shorter than the public stale time".to_string(),
            ));
        }
        Ok(())
    }
}

fn secs_var(name: &str) -> Result<Option<Duration>, ContentError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| ContentError::Config(format!("{} must be a number of seconds, got {:?}", name, raw))),
        Err(_) => Ok(None),
    }
}
