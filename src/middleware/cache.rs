//! Cache-or-compute middleware for GET responses.
//!
//! Successful (2xx) GET responses are buffered and stored in a
//! [`MemoryCache`] under [`request_key`]. Other methods are never cached; a
//! successful POST/PUT/PATCH/DELETE drops the cached GETs of the collection
//! it touched. The cache is best-effort: when anything about it goes wrong
//! the request is simply served by the handler.

use crate::cache::key::{path_key, request_key};
use crate::cache::MemoryCache;
use crate::observability::TtlPolicy;
use crate::strategy::CacheStrategy;
use axum::body::{Body, HttpBody};
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// Response header reporting `HIT` or `MISS`.
pub const CACHE_STATUS_HEADER: &str = "x-cache";

/// What a successful mutation invalidates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Invalidation {
    /// Cached GETs of the touched collection (`/api/sales/7` → `/api/sales`).
    #[default]
    Collection,
    /// Every cached response.
    All,
    /// Nothing; entries only expire by TTL.
    None,
}

/// State for [`cache_response`].
#[derive(Clone, Debug)]
pub struct ResponseCache {
    cache: MemoryCache,
    ttl_policy: TtlPolicy,
    invalidation: Invalidation,
}

impl ResponseCache {
    pub fn new(cache: MemoryCache) -> Self {
        ResponseCache {
            cache,
            ttl_policy: TtlPolicy::default(),
            invalidation: Invalidation::default(),
        }
    }

    pub fn with_ttl_policy(mut self, policy: TtlPolicy) -> Self {
        self.ttl_policy = policy;
        self
    }

    pub fn with_invalidation(mut self, invalidation: Invalidation) -> Self {
        self.invalidation = invalidation;
        self
    }

    pub fn cache(&self) -> &MemoryCache {
        &self.cache
    }

    fn invalidate_after_write(&self, path: &str) {
        match self.invalidation {
            Invalidation::Collection => {
                let removed = self.cache.invalidate_path(&path_key(collection_root(path)));
                debug!("Write to {} invalidated {} cached responses", path, removed);
            }
            Invalidation::All => self.cache.clear(),
            Invalidation::None => {}
        }
    }
}

/// A stored response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct CachedResponse {
    status: u16,
    content_type: Option<String>,
    body: Vec<u8>,
}

impl CachedResponse {
    fn into_response(self) -> Option<Response> {
        let status = StatusCode::from_u16(self.status).ok()?;
        let mut response = (status, Body::from(self.body)).into_response();
        if let Some(content_type) = self.content_type {
            let value = HeaderValue::from_str(&content_type).ok()?;
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
        response
            .headers_mut()
            .insert(CACHE_STATUS_HEADER, HeaderValue::from_static("HIT"));
        Some(response)
    }
}

/// `/api/sales/7/items` → `/api/sales`; `/health` → `/health`.
fn collection_root(path: &str) -> &str {
    let depth = if path.starts_with("/api/") { 2 } else { 1 };
    let mut end = path.len();
    let mut seen = 0;
    for (index, ch) in path.char_indices().skip(1) {
        if ch == '/' {
            seen += 1;
            if seen == depth {
                end = index;
                break;
            }
        }
    }
    &path[..end]
}

fn is_write(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Response cache middleware.
///
/// ```ignore
/// let state = ResponseCache::new(MemoryCache::new(CacheConfig::default()));
/// let app = Router::new()
///     .route("/api/sales", get(list_sales))
///     .layer(axum::middleware::from_fn_with_state(state, cache_response));
/// ```
pub async fn cache_response(
    State(state): State<ResponseCache>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();

    if method != Method::GET {
        let path = request.uri().path().to_string();
        let response = next.run(request).await;
        if is_write(&method) && response.status().is_success() {
            state.invalidate_after_write(&path);
        }
        return response;
    }

    let strategy = CacheStrategy::from_headers(request.headers());
    if !strategy.reads_cache() && !strategy.writes_cache() {
        return next.run(request).await;
    }

    let key = request_key(&request);
    if strategy == CacheStrategy::Invalidate {
        state.cache.delete(&key);
    }

    if strategy.reads_cache() {
        if let Some(cached) = state.cache.get_value::<CachedResponse>(&key) {
            if let Some(response) = cached.into_response() {
                return response;
            }
            warn!("⚠ Cached response for {} could not be rebuilt", key);
            state.cache.delete(&key);
        }
    }

    let ttl = state
        .ttl_policy
        .ttl_for(request.uri().path())
        .unwrap_or_else(|| state.cache.default_ttl());

    let response = next.run(request).await;
    if !strategy.writes_cache() || !response.status().is_success() {
        return response;
    }

    let max_body = state.cache.config().max_body_bytes;
    let (mut parts, body) = response.into_parts();
    let fits = body
        .size_hint()
        .upper()
        .is_some_and(|upper| upper <= max_body as u64);
    if !fits {
        debug!("Response for {} too large or unsized, not cached", key);
        return Response::from_parts(parts, body);
    }

    let bytes = match axum::body::to_bytes(body, max_body).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("⚠ Failed to buffer response for {}: {}", key, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let cached = CachedResponse {
        status: parts.status.as_u16(),
        content_type: parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: bytes.to_vec(),
    };
    state.cache.set_value_with_ttl(&key, &cached, ttl);

    parts
        .headers
        .insert(CACHE_STATUS_HEADER, HeaderValue::from_static("MISS"));
    Response::from_parts(parts, Body::from(bytes))
}
