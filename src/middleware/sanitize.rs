//! Input sanitization for JSON request bodies.
//!
//! Every string in a POST/PUT/PATCH JSON body is trimmed and stripped of HTML
//! tags before handlers see it. Bodies that aren't valid JSON are passed
//! through untouched; rejecting them is `validate_json`'s job.

use crate::middleware::{error_response, is_json, MAX_JSON_BODY_BYTES};
use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use serde_json::Value;

/// Remove `<...>` tags and surrounding whitespace.
///
/// An unterminated `<` is kept as text.
pub fn sanitize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    out.trim().to_string()
}

/// Sanitize every string in `value`, object keys excluded.
pub fn sanitize_value(value: &mut Value) {
    match value {
        Value::String(s) => *s = sanitize_text(s),
        Value::Array(items) => items.iter_mut().for_each(sanitize_value),
        Value::Object(map) => map.values_mut().for_each(sanitize_value),
        _ => {}
    }
}

/// Sanitization middleware.
pub async fn sanitize_json(request: Request, next: Next) -> Response {
    let mutating = matches!(*request.method(), Method::POST | Method::PUT | Method::PATCH);
    if !mutating || !is_json(request.headers()) {
        return next.run(request).await;
    }

    let (mut parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_JSON_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body could not be read",
                Some(e.to_string()),
            )
        }
    };

    let body = match serde_json::from_slice::<Value>(&bytes) {
        Ok(mut value) => {
            sanitize_value(&mut value);
            match serde_json::to_vec(&value) {
                Ok(clean) => {
                    parts.headers.remove(header::CONTENT_LENGTH);
                    Body::from(clean)
                }
                Err(_) => Body::from(bytes),
            }
        }
        Err(_) => Body::from(bytes),
    };

    next.run(Request::from_parts(parts, body)).await
}
