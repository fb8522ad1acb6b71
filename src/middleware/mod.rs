//! Axum middleware: response cache, rate limiting, JSON validation and
//! sanitization, pagination.
//!
//! Each piece is a plain `async fn` for `axum::middleware::from_fn` (or
//! `from_fn_with_state`). [`apply`] stacks them in the order the service
//! expects.

pub mod cache;
pub mod rate_limit;
pub mod sanitize;
pub mod validate;

pub use crate::pagination::pagination;
pub use cache::{cache_response, ResponseCache};
pub use rate_limit::{rate_limit, RateLimiter};
pub use sanitize::sanitize_json;
pub use validate::validate_json;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Largest JSON request body the validation and sanitization middleware read.
pub const MAX_JSON_BODY_BYTES: usize = 1024 * 1024;

/// Wrap a router with the shared middleware stack.
///
/// Requests pass through, outermost first: rate limiting, sanitization,
/// pagination, response cache. Payload validation is route-specific and is
/// attached by the caller with `from_fn(validate_json::<T>)`.
pub fn apply<S>(
    router: axum::Router<S>,
    cache: ResponseCache,
    limiter: RateLimiter,
) -> axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    use axum::middleware::{from_fn, from_fn_with_state};
    use tower::ServiceBuilder;

    router.layer(
        ServiceBuilder::new()
            .layer(from_fn_with_state(limiter, rate_limit))
            .layer(from_fn(sanitize_json))
            .layer(from_fn(pagination))
            .layer(from_fn_with_state(cache, cache_response)),
    )
}

/// JSON error body used by every middleware rejection.
pub(crate) fn error_response(status: StatusCode, error: &str, details: Option<String>) -> Response {
    let body = match details {
        Some(details) => json!({ "error": error, "details": details }),
        None => json!({ "error": error }),
    };
    (status, Json(body)).into_response()
}

pub(crate) fn is_json(headers: &axum::http::HeaderMap) -> bool {
    headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| {
            let mime = ct.split(';').next().unwrap_or_default().trim();
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
}
