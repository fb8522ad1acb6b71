//! Deterministic cache keys for HTTP requests.
//!
//! Format: `"<METHOD>:<path>"`, followed by `"?<query>"` when the request has
//! query parameters. Parameters are sorted by name and then value, so two
//! requests that differ only in parameter order share a key:
//!
//! ```
//! use sistemav::cache::generate_key;
//!
//! let a = generate_key("GET", "/api/sales", Some("page=2&limit=20"));
//! let b = generate_key("get", "/api/sales", Some("limit=20&page=2"));
//! assert_eq!(a, "GET:/api/sales?limit=20&page=2");
//! assert_eq!(a, b);
//! ```

use url::form_urlencoded;

/// Build the cache key for a method, path and raw query string.
pub fn generate_key(method: &str, path: &str, query: Option<&str>) -> String {
    let mut key = format!("{}:{}", method.to_ascii_uppercase(), path);

    let sorted = query.map(sorted_query).unwrap_or_default();
    if !sorted.is_empty() {
        key.push('?');
        key.push_str(&sorted);
    }

    key
}

/// Key of a query-less GET of `path`.
pub fn path_key(path: &str) -> String {
    format!("GET:{}", path)
}

/// Whether `key` is `path_key` itself, a query of it or a sub-path of it.
///
/// `GET:/api/sales?page=2` and `GET:/api/sales/7` are under
/// `GET:/api/sales`; `GET:/api/sales-report` is not.
pub fn is_under_path(key: &str, path_key: &str) -> bool {
    match key.strip_prefix(path_key) {
        Some(rest) => rest.is_empty() || rest.starts_with('?') || rest.starts_with('/'),
        None => false,
    }
}

/// Cache key for an HTTP request.
#[cfg(feature = "http")]
pub fn request_key<B>(request: &axum::http::Request<B>) -> String {
    let uri = request.uri();
    generate_key(request.method().as_str(), uri.path(), uri.query())
}

fn sorted_query(query: &str) -> String {
    let mut pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    pairs.sort();

    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_without_query() {
        assert_eq!(generate_key("GET", "/api/sales", None), "GET:/api/sales");
        assert_eq!(generate_key("GET", "/api/sales", Some("")), "GET:/api/sales");
    }

    #[test]
    fn test_query_order_does_not_matter() {
        let a = generate_key("GET", "/api/sales", Some("page=2&limit=20&attendantId=3"));
        let b = generate_key("GET", "/api/sales", Some("attendantId=3&limit=20&page=2"));
        assert_eq!(a, b);
        assert_eq!(a, "GET:/api/sales?attendantId=3&limit=20&page=2");
    }

    #[test]
    fn test_repeated_params_sorted_by_value() {
        let key = generate_key("GET", "/api/sales", Some("tag=b&tag=a"));
        assert_eq!(key, "GET:/api/sales?tag=a&tag=b");
    }

    #[test]
    fn test_encoding_is_normalized() {
        let a = generate_key("GET", "/api/attendants", Some("name=Jo%C3%A3o+Silva"));
        let b = generate_key("GET", "/api/attendants", Some("name=Jo%C3%A3o%20Silva"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_method_distinguishes_keys() {
        assert_ne!(
            generate_key("GET", "/api/sales", None),
            generate_key("HEAD", "/api/sales", None)
        );
    }

    #[test]
    fn test_is_under_path() {
        let sales = path_key("/api/sales");
        assert!(is_under_path("GET:/api/sales", &sales));
        assert!(is_under_path("GET:/api/sales?limit=20&page=2", &sales));
        assert!(is_under_path("GET:/api/sales/7/commission", &sales));

        assert!(!is_under_path("GET:/api/sales-report", &sales));
        assert!(!is_under_path("GET:/api/salesforce?page=1", &sales));
        assert!(!is_under_path("GET:/api", &sales));
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_request_key() {
        let request = axum::http::Request::builder()
            .uri("/api/sales?page=2&limit=20")
            .body(())
            .unwrap();
        assert_eq!(request_key(&request), "GET:/api/sales?limit=20&page=2");
    }
}
