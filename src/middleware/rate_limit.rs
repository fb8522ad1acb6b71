//! Fixed-window request rate limiting.
//!
//! Each `(client, path)` pair gets a window of `config.window` starting at its
//! first request. Up to `config.max_requests` requests pass per window; the
//! rest get `429 Too Many Requests` until the window rolls over.
//!
//! At most `config.max_tracked` windows are kept. A new key arriving at the
//! cap first sweeps elapsed windows; if every window is still live, the
//! oldest-started ones are dropped.

use crate::config::RateLimitConfig;
use crate::middleware::error_response;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";

#[derive(Clone, Copy, Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of [`RateLimiter::check`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

/// Shared fixed-window counters.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    windows: Arc<DashMap<String, Window>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(mut config: RateLimitConfig) -> Self {
        if config.max_tracked == 0 {
            warn!("⚠ Rate limiter configured with max_tracked = 0, using 1");
            config.max_tracked = 1;
        }

        RateLimiter {
            windows: Arc::new(DashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count one request against `key`.
    pub fn check(&self, key: &str) -> Decision {
        let now = Instant::now();
        if self.windows.len() >= self.config.max_tracked && !self.windows.contains_key(key) {
            self.make_room(now);
        }

        let mut window = self.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(window.started) >= self.config.window {
            window.started = now;
            window.count = 0;
        }

        if window.count >= self.config.max_requests {
            let retry_after = self
                .config
                .window
                .saturating_sub(now.duration_since(window.started));
            return Decision::Limited { retry_after };
        }

        window.count += 1;
        Decision::Allowed {
            remaining: self.config.max_requests - window.count,
        }
    }

    /// Drop windows that have fully elapsed. Returns how many were removed.
    pub fn purge_stale(&self) -> usize {
        self.purge_stale_at(Instant::now())
    }

    fn purge_stale_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.duration_since(w.started) < self.config.window);
        before.saturating_sub(self.windows.len())
    }

    pub fn tracked(&self) -> usize {
        self.windows.len()
    }

    fn make_room(&self, now: Instant) {
        let purged = self.purge_stale_at(now);
        let live = self.windows.len();
        if live < self.config.max_tracked {
            debug!("✓ Rate limiter swept {} elapsed windows", purged);
            return;
        }

        // A tenth of the cap at a time.
        let batch = (self.config.max_tracked / 10).max(1).min(live);
        let mut by_age: Vec<(Instant, String)> = self
            .windows
            .iter()
            .map(|entry| (entry.started, entry.key().clone()))
            .collect();
        by_age.sort_unstable_by_key(|(started, _)| *started);

        for (_, key) in by_age.into_iter().take(batch) {
            self.windows.remove(&key);
        }
        warn!(
            "⚠ Rate limiter holds {} live windows, dropped the {} oldest",
            live, batch
        );
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

/// First hop of `x-forwarded-for`, or `"unknown"`.
fn client_id(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Rate limiting middleware.
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let key = format!("{}:{}", client_id(request.headers()), request.uri().path());
    let limit = HeaderValue::from(limiter.config.max_requests);

    match limiter.check(&key) {
        Decision::Allowed { remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(LIMIT_HEADER, limit);
            headers.insert(REMAINING_HEADER, HeaderValue::from(remaining));
            response
        }
        Decision::Limited { retry_after } => {
            warn!("⚠ Rate limit exceeded for {}", key);
            let mut response = error_response(
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests, please try again later",
                None,
            );
            let headers = response.headers_mut();
            // Round up so clients never retry inside the window.
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            headers.insert(header::RETRY_AFTER, HeaderValue::from(secs));
            headers.insert(LIMIT_HEADER, limit);
            headers.insert(REMAINING_HEADER, HeaderValue::from(0u32));
            response
        }
    }
}
