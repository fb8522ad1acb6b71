//! Request payload validation.

use crate::middleware::{error_response, MAX_JSON_BODY_BYTES};
use crate::model::Validate;
use axum::body::Body;
use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use serde::de::DeserializeOwned;

/// Reject POST/PUT/PATCH bodies that don't deserialize into a valid `T`.
///
/// The body is buffered, checked and handed to the next service unchanged.
///
/// ```ignore
/// Router::new()
///     .route("/api/sales", post(create_sale))
///     .route_layer(axum::middleware::from_fn(validate_json::<SaleInput>));
/// ```
pub async fn validate_json<T>(request: Request, next: Next) -> Response
where
    T: DeserializeOwned + Validate + Send + 'static,
{
    if !matches!(*request.method(), Method::POST | Method::PUT | Method::PATCH) {
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();
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

    if bytes.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Validation failed",
            Some("request body is empty".to_string()),
        );
    }

    let payload: T = match serde_json::from_slice(&bytes) {
        Ok(payload) => payload,
        Err(e) => {
            debug!("Rejected {} {}: {}", parts.method, parts.uri.path(), e);
            return error_response(StatusCode::BAD_REQUEST, "Invalid JSON payload", Some(e.to_string()));
        }
    };

    if let Err(e) = payload.validate() {
        debug!("Rejected {} {}: {}", parts.method, parts.uri.path(), e);
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", Some(e.to_string()));
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
