//! Bounded in-memory cache with TTL expiry and insertion-order eviction.
//!
//! Entries live in a `DashMap` so reads only take a shard lock. Expiry is
//! lazy: a stale entry is removed by the `get` that finds it (or by an
//! explicit [`MemoryCache::purge_expired`]). When a new key arrives and the
//! cache is full, the entry inserted first is evicted. Reads never promote an
//! entry and overwriting a key keeps its original position, so this is
//! oldest-first eviction rather than LRU.

use super::envelope;
use super::key::is_under_path;
use crate::config::CacheConfig;
use crate::observability::{CacheMetrics, CacheStats, NoOpMetrics};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

struct CacheEntry {
    data: Vec<u8>,
    stored_at: Instant,
    ttl: Duration,
    /// Insertion sequence; the smallest live value is evicted first.
    seq: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) > self.ttl
    }
}

struct Shared {
    store: DashMap<String, CacheEntry>,
    /// Serializes inserts so the capacity check and the insert are atomic.
    insert_lock: Mutex<()>,
    next_seq: AtomicU64,
    config: CacheConfig,
    metrics: Box<dyn CacheMetrics>,
}

/// Process-local response cache.
///
/// Cloning is cheap and every clone shares the same entries. Build one at
/// startup and hand it to whatever needs it (axum state, services, tests).
///
/// # Example
///
/// ```
/// use sistemav::cache::MemoryCache;
/// use sistemav::config::CacheConfig;
///
/// let cache = MemoryCache::new(CacheConfig::utility());
/// cache.set("GET:/api/attendants", b"[]".to_vec());
/// assert_eq!(cache.get("GET:/api/attendants"), Some(b"[]".to_vec()));
/// ```
#[derive(Clone)]
pub struct MemoryCache {
    shared: Arc<Shared>,
}

impl MemoryCache {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_metrics(config, Box::new(NoOpMetrics))
    }

    /// Create a cache that reports events to `metrics`.
    pub fn with_metrics(mut config: CacheConfig, metrics: Box<dyn CacheMetrics>) -> Self {
        if config.max_entries == 0 {
            warn!("⚠ Cache configured with max_entries = 0, using 1");
            config.max_entries = 1;
        }

        MemoryCache {
            shared: Arc::new(Shared {
                store: DashMap::new(),
                insert_lock: Mutex::new(()),
                next_seq: AtomicU64::new(0),
                config,
                metrics,
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.shared.config
    }

    pub fn default_ttl(&self) -> Duration {
        self.shared.config.default_ttl
    }

    /// Return the stored bytes if present and not expired.
    ///
    /// An expired entry is removed as a side effect.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        let expired = match self.shared.store.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                self.shared.metrics.record_hit(key);
                return Some(entry.data.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.shared
                .store
                .remove_if(key, |_, entry| entry.is_expired(now));
            debug!("✓ Cache entry {} expired and was removed", key);
        }

        self.shared.metrics.record_miss(key);
        None
    }

    /// Store bytes under `key` with the default TTL.
    pub fn set(&self, key: &str, data: Vec<u8>) {
        self.set_with_ttl(key, data, self.shared.config.default_ttl);
    }

    /// Store bytes under `key`, evicting the oldest entry when a new key
    /// would push the cache past its capacity.
    pub fn set_with_ttl(&self, key: &str, data: Vec<u8>, ttl: Duration) {
        let _guard = self
            .shared
            .insert_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let size = data.len();

        if let Some(mut entry) = self.shared.store.get_mut(key) {
            entry.data = data;
            entry.stored_at = now;
            entry.ttl = ttl;
            self.shared.metrics.record_set(key, size);
            return;
        }

        if self.shared.store.len() >= self.shared.config.max_entries {
            self.evict_oldest(key);
        }

        let seq = self.shared.next_seq.fetch_add(1, Ordering::Relaxed);
        self.shared.store.insert(
            key.to_string(),
            CacheEntry {
                data,
                stored_at: now,
                ttl,
                seq,
            },
        );
        self.shared.metrics.record_set(key, size);
    }

    fn evict_oldest(&self, incoming: &str) {
        let oldest = self
            .shared
            .store
            .iter()
            .min_by_key(|entry| entry.seq)
            .map(|entry| entry.key().clone());

        if let Some(oldest) = oldest {
            self.shared.store.remove(&oldest);
            self.shared.metrics.record_evict(&oldest, incoming);
        }
    }

    /// Remove one entry. Returns whether it existed.
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.shared.store.remove(key).is_some();
        if removed {
            self.shared.metrics.record_delete(key);
        }
        removed
    }

    /// Remove every entry whose key starts with `prefix`.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut removed = 0;
        self.shared.store.retain(|key, _| {
            let matches = key.starts_with(prefix);
            if matches {
                removed += 1;
            }
            !matches
        });

        if removed > 0 {
            debug!("✓ Cache invalidated {} entries under {}", removed, prefix);
        }
        removed
    }

    /// Remove the entries for `path_key`, its query variants and its
    /// sub-paths (see [`super::key::is_under_path`]).
    pub fn invalidate_path(&self, path_key: &str) -> usize {
        let mut removed = 0;
        self.shared.store.retain(|key, _| {
            let matches = is_under_path(key, path_key);
            if matches {
                removed += 1;
            }
            !matches
        });

        if removed > 0 {
            debug!("✓ Cache invalidated {} entries for {}", removed, path_key);
        }
        removed
    }

    /// Drop every expired entry now instead of waiting for a `get`.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.shared.store.retain(|_, entry| {
            let expired = entry.is_expired(now);
            if expired {
                removed += 1;
            }
            !expired
        });
        removed
    }

    pub fn clear(&self) {
        self.shared.store.clear();
        warn!("⚠ Cache CLEAR executed - all entries removed");
    }

    pub fn len(&self) -> usize {
        self.shared.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.store.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        self.shared
            .store
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let mut total_bytes = 0;
        let mut expired_entries = 0;
        for entry in self.shared.store.iter() {
            total_bytes += entry.data.len();
            if entry.is_expired(now) {
                expired_entries += 1;
            }
        }

        CacheStats {
            total_entries: self.shared.store.len(),
            expired_entries,
            total_bytes,
            max_entries: self.shared.config.max_entries,
        }
    }

    /// Store a serde value with the default TTL.
    ///
    /// Encoding failures are logged and the value is simply not cached.
    pub fn set_value<T: Serialize>(&self, key: &str, value: &T) {
        self.set_value_with_ttl(key, value, self.shared.config.default_ttl);
    }

    pub fn set_value_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match envelope::encode(value) {
            Ok(bytes) => self.set_with_ttl(key, bytes, ttl),
            Err(e) => self.shared.metrics.record_error(key, &e.to_string()),
        }
    }

    /// Fetch a serde value stored with [`set_value`](Self::set_value).
    ///
    /// Entries that fail to decode are dropped and reported as a miss.
    pub fn get_value<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.get(key)?;
        match envelope::decode::<T>(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("⚠ Dropping undecodable cache entry {}: {}", key, e);
                self.shared.metrics.record_error(key, &e.to_string());
                self.shared.store.remove(key);
                None
            }
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.len())
            .field("config", &self.shared.config)
            .finish()
    }
}
