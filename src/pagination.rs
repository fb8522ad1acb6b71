//! Page/limit normalization and paginated result envelopes.
//!
//! Raw `page` and `limit` query values are never rejected: anything missing,
//! non-numeric or out of range is defaulted or clamped.
//!
//! ```
//! use sistemav::pagination::{create_paginated_response, PageParams};
//!
//! let params = PageParams::from_raw(Some("0"), Some("500"));
//! assert_eq!((params.page, params.limit), (1, 100));
//!
//! let page = create_paginated_response(vec![1, 2, 3, 4, 5], 47, 2, 20);
//! assert_eq!(page.pagination.total_pages, 3);
//! assert!(page.pagination.has_next && page.pagination.has_prev);
//! ```

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

/// Normalized paging parameters for one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PageParams {
    pub page: u32,
    pub limit: u32,
    pub offset: u64,
}

impl PageParams {
    /// Clamp `page` to at least 1 and `limit` to `1..=100`.
    pub fn new(page: u32, limit: u32) -> Self {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_LIMIT);
        PageParams {
            page,
            limit,
            offset: u64::from(page - 1) * u64::from(limit),
        }
    }

    /// Normalize raw query-string values.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = parse_int(page).map_or(DEFAULT_PAGE, |p| clamp_to_u32(p.max(1)));
        let limit = parse_int(limit).map_or(DEFAULT_LIMIT, |l| {
            clamp_to_u32(l.clamp(1, i64::from(MAX_LIMIT)))
        });
        Self::new(page, limit)
    }

    /// Read `page` and `limit` from a raw query string (first occurrence wins).
    pub fn from_query(query: Option<&str>) -> Self {
        let mut page = None;
        let mut limit = None;

        for (name, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match name.as_ref() {
                "page" if page.is_none() => page = Some(value.into_owned()),
                "limit" if limit.is_none() => limit = Some(value.into_owned()),
                _ => {}
            }
        }

        Self::from_raw(page.as_deref(), limit.as_deref())
    }

    /// The window of `items` this page covers.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = usize::try_from(self.offset).unwrap_or(usize::MAX).min(items.len());
        let end = start.saturating_add(self.limit as usize).min(items.len());
        &items[start..end]
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_LIMIT)
    }
}

fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
}

fn clamp_to_u32(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Pagination metadata embedded in list responses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub offset: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(total: u64, params: PageParams) -> Self {
        let total_pages = total.div_ceil(u64::from(params.limit));
        Pagination {
            page: params.page,
            limit: params.limit,
            offset: params.offset,
            total,
            total_pages,
            has_next: u64::from(params.page) < total_pages,
            has_prev: params.page > 1,
        }
    }
}

/// `{ data, pagination }` envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: u64, params: PageParams) -> Self {
        PaginatedResponse {
            data,
            pagination: Pagination::new(total, params),
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> PaginatedResponse<U> {
        PaginatedResponse {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Wrap one page of rows with its pagination metadata.
pub fn create_paginated_response<T>(
    data: Vec<T>,
    total: u64,
    page: u32,
    limit: u32,
) -> PaginatedResponse<T> {
    PaginatedResponse::new(data, total, PageParams::new(page, limit))
}

#[cfg(feature = "http")]
mod http {
    use super::{PageParams, PaginatedResponse};
    use axum::extract::{FromRequestParts, Request};
    use axum::http::request::Parts;
    use axum::middleware::Next;
    use axum::response::{IntoResponse, Response};
    use axum::Json;
    use serde::Serialize;
    use std::convert::Infallible;

    /// Middleware that normalizes paging parameters once per request and
    /// stores them in the request extensions.
    pub async fn pagination(mut request: Request, next: Next) -> Response {
        let params = PageParams::from_query(request.uri().query());
        request.extensions_mut().insert(params);
        next.run(request).await
    }

    impl<S: Send + Sync> FromRequestParts<S> for PageParams {
        type Rejection = Infallible;

        async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
            Ok(parts
                .extensions
                .get::<PageParams>()
                .copied()
                .unwrap_or_else(|| PageParams::from_query(parts.uri.query())))
        }
    }

    impl<T: Serialize> IntoResponse for PaginatedResponse<T> {
        fn into_response(self) -> Response {
            Json(self).into_response()
        }
    }
}

#[cfg(feature = "http")]
pub use http::pagination;
