//! Observability hooks and TTL policies for the response cache.
//!
//! # Metrics
//!
//! Implement [`CacheMetrics`] to forward cache events to a monitoring system.
//! The default methods log through the `log` crate; [`NoOpMetrics`] drops
//! everything and is what a fresh [`MemoryCache`](crate::cache::MemoryCache)
//! uses.
//!
//! ```
//! use sistemav::observability::CacheMetrics;
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! #[derive(Default)]
//! struct HitCounter(AtomicU64);
//!
//! impl CacheMetrics for HitCounter {
//!     fn record_hit(&self, _key: &str) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//! ```
//!
//! # TTL Policies
//!
//! | Policy | Use Case |
//! |--------|----------|
//! | `Default` | Every response lives for the cache's configured TTL |
//! | `Fixed` | One TTL for every response behind a middleware instance |
//! | `PerPath` | Ranking refreshes quickly, rule listings live longer |

use std::time::Duration;

/// Trait for cache metrics collection.
pub trait CacheMetrics: Send + Sync {
    fn record_hit(&self, key: &str) {
        debug!("Cache HIT: {}", key);
    }

    fn record_miss(&self, key: &str) {
        debug!("Cache MISS: {}", key);
    }

    fn record_set(&self, key: &str, bytes: usize) {
        debug!("Cache SET: {} ({} bytes)", key, bytes);
    }

    fn record_delete(&self, key: &str) {
        debug!("Cache DELETE: {}", key);
    }

    /// An entry was dropped to make room for `incoming`.
    fn record_evict(&self, evicted: &str, incoming: &str) {
        debug!("Cache EVICT: {} (making room for {})", evicted, incoming);
    }

    fn record_error(&self, key: &str, error: &str) {
        warn!("Cache ERROR for {}: {}", key, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str) {}
    fn record_miss(&self, _key: &str) {}
    fn record_set(&self, _key: &str, _bytes: usize) {}
    fn record_delete(&self, _key: &str) {}
    fn record_evict(&self, _evicted: &str, _incoming: &str) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}

/// Metrics implementation that logs every event.
#[derive(Clone, Default)]
pub struct LogMetrics;

impl CacheMetrics for LogMetrics {}

/// TTL policy applied by the response cache middleware.
#[derive(Clone, Debug, Default)]
pub enum TtlPolicy {
    /// Use the cache's configured default TTL
    #[default]
    Default,

    /// Fixed duration for all entries
    Fixed(Duration),

    /// Duration chosen from the request path
    PerPath(fn(&str) -> Duration),
}

impl TtlPolicy {
    /// TTL for a request path; `None` means "use the cache default".
    pub fn ttl_for(&self, path: &str) -> Option<Duration> {
        match self {
            TtlPolicy::Default => None,
            TtlPolicy::Fixed(d) => Some(*d),
            TtlPolicy::PerPath(f) => Some(f(path)),
        }
    }
}

/// Snapshot of the memory cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub total_bytes: usize,
    pub max_entries: usize,
}
