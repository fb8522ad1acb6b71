//! Runtime configuration.
//!
//! Every struct has sensible defaults and a `from_env()` constructor that
//! overrides individual fields from `SISTEMAV_*` environment variables.

use crate::error::{Error, Result};
use std::str::FromStr;
use std::time::Duration;

/// Default TTL for cached HTTP responses (middleware instances).
pub const DEFAULT_RESPONSE_TTL: Duration = Duration::from_secs(5 * 60);

/// Default capacity for cached HTTP responses.
pub const DEFAULT_RESPONSE_MAX_ENTRIES: usize = 1000;

/// Default TTL for the general-purpose utility cache.
pub const DEFAULT_UTILITY_TTL: Duration = Duration::from_secs(60);

/// Default capacity for the general-purpose utility cache.
pub const DEFAULT_UTILITY_MAX_ENTRIES: usize = 100;

/// Largest response body the cache middleware will buffer and store.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Memory cache settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    pub default_ttl: Duration,
    pub max_entries: usize,
    pub max_body_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            default_ttl: DEFAULT_RESPONSE_TTL,
            max_entries: DEFAULT_RESPONSE_MAX_ENTRIES,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl CacheConfig {
    /// Settings for the short-lived utility cache (60 s, 100 entries).
    pub fn utility() -> Self {
        CacheConfig {
            default_ttl: DEFAULT_UTILITY_TTL,
            max_entries: DEFAULT_UTILITY_MAX_ENTRIES,
            ..Self::default()
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Defaults overridden by `SISTEMAV_CACHE_TTL_SECS`,
    /// `SISTEMAV_CACHE_MAX_ENTRIES` and `SISTEMAV_CACHE_MAX_BODY_BYTES`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` when a variable is set but unparsable, or
    /// when the resulting capacity is zero.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(secs) = env_var::<u64>("SISTEMAV_CACHE_TTL_SECS")? {
            config.default_ttl = Duration::from_secs(secs);
        }
        if let Some(max) = env_var::<usize>("SISTEMAV_CACHE_MAX_ENTRIES")? {
            config.max_entries = max;
        }
        if let Some(bytes) = env_var::<usize>("SISTEMAV_CACHE_MAX_BODY_BYTES")? {
            config.max_body_bytes = bytes;
        }
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `Error::ConfigError` for a zero capacity.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(Error::ConfigError(
                "cache max_entries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fixed-window rate limiter settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u32,
    /// Upper bound on tracked `(client, path)` windows.
    pub max_tracked: usize,
}

/// Default for [`RateLimitConfig::max_tracked`].
pub const DEFAULT_MAX_TRACKED: usize = 10_000;

impl Default for RateLimitConfig {
    fn default() -> Self {
        RateLimitConfig {
            window: Duration::from_secs(15 * 60),
            max_requests: 100,
            max_tracked: DEFAULT_MAX_TRACKED,
        }
    }
}

impl RateLimitConfig {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        RateLimitConfig {
            window,
            max_requests,
            max_tracked: DEFAULT_MAX_TRACKED,
        }
    }

    pub fn with_max_tracked(mut self, max_tracked: usize) -> Self {
        self.max_tracked = max_tracked;
        self
    }

    /// Defaults overridden by `SISTEMAV_RATE_LIMIT_WINDOW_SECS`,
    /// `SISTEMAV_RATE_LIMIT_MAX_REQUESTS` and `SISTEMAV_RATE_LIMIT_MAX_TRACKED`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` for unparsable values or a zero window.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(secs) = env_var::<u64>("SISTEMAV_RATE_LIMIT_WINDOW_SECS")? {
            config.window = Duration::from_secs(secs);
        }
        if let Some(max) = env_var::<u32>("SISTEMAV_RATE_LIMIT_MAX_REQUESTS")? {
            config.max_requests = max;
        }
        if let Some(tracked) = env_var::<usize>("SISTEMAV_RATE_LIMIT_MAX_TRACKED")? {
            config.max_tracked = tracked;
        }
        if config.window.is_zero() {
            return Err(Error::ConfigError(
                "rate limit window must be positive".to_string(),
            ));
        }
        Ok(config)
    }
}

/// Everything the HTTP layer needs at startup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SistemaConfig {
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
}

impl SistemaConfig {
    /// # Errors
    ///
    /// Propagates `Error::ConfigError` from the individual sections.
    pub fn from_env() -> Result<Self> {
        Ok(SistemaConfig {
            cache: CacheConfig::from_env()?,
            rate_limit: RateLimitConfig::from_env()?,
        })
    }
}

fn env_var<T: FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::ConfigError(format!("{} has an invalid value: {:?}", name, raw))),
        Err(_) => Ok(None),
    }
}
