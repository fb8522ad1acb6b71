//! Per-request cache strategies.
//!
//! The response cache middleware picks a strategy for every GET from the
//! request's `Cache-Control` header:
//!
//! | Header | Strategy | Cache hit | Cache miss |
//! |--------|----------|-----------|------------|
//! | (none) | `Refresh` | Replay | Compute, store |
//! | `no-cache` | `Invalidate` | Drop, compute, store | Compute, store |
//! | `no-store` | `Bypass` | Ignore | Compute, don't store |

/// Strategy enum controlling cache read/write behavior for one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CacheStrategy {
    /// **Refresh**: serve from cache, compute and store on miss.
    #[default]
    Refresh,

    /// **Invalidate**: drop the cached entry, compute, store the new response.
    ///
    /// Typical use: a client that knows it just changed something.
    Invalidate,

    /// **Bypass**: leave the cache untouched in both directions.
    Bypass,
}

impl CacheStrategy {
    /// Strategy for a raw `Cache-Control` header value.
    ///
    /// `no-store` wins over `no-cache` when both are present.
    pub fn from_cache_control(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return CacheStrategy::Refresh;
        };

        let directives: Vec<String> = value
            .split(',')
            .map(|d| d.trim().to_ascii_lowercase())
            .collect();

        if directives.iter().any(|d| d == "no-store") {
            CacheStrategy::Bypass
        } else if directives.iter().any(|d| d == "no-cache" || d == "max-age=0") {
            CacheStrategy::Invalidate
        } else {
            CacheStrategy::Refresh
        }
    }

    /// Strategy for a request's headers.
    #[cfg(feature = "http")]
    pub fn from_headers(headers: &axum::http::HeaderMap) -> Self {
        let value = headers
            .get(axum::http::header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok());
        Self::from_cache_control(value)
    }

    /// Whether a cached response may be replayed.
    pub fn reads_cache(&self) -> bool {
        matches!(self, CacheStrategy::Refresh)
    }

    /// Whether a freshly computed response should be stored.
    pub fn writes_cache(&self) -> bool {
        !matches!(self, CacheStrategy::Bypass)
    }
}

impl std::fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheStrategy::Refresh => write!(f, "Refresh"),
            CacheStrategy::Invalidate => write!(f, "Invalidate"),
            CacheStrategy::Bypass => write!(f, "Bypass"),
        }
    }
}
