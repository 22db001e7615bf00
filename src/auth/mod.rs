//! PSK-based authentication for the `/api` routes.
//!
//! Keys are compared in constant time.

use axum::{
    extract::{Request as HttpRequest, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::errors::AppError;
use crate::AppState;

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Middleware rejecting requests without the configured key.
///
/// With no key configured every request passes.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: HttpRequest,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config.api_psk.as_deref() else {
        return Ok(next.run(request).await);
    };

    let authorized = match provided_key(request.headers()) {
        Some(key) => constant_time_compare(key, expected),
        None => {
            return Err(AppError::Unauthorized(
                "Missing or invalid API key".to_string(),
            ))
        }
    };

    if !authorized {
        return Err(AppError::Unauthorized("Invalid API key".to_string()));
    }
    Ok(next.run(request).await)
}

/// The key from `x-api-key`, falling back to a bearer token.
fn provided_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
