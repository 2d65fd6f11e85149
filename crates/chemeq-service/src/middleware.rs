//! API key authentication middleware.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::config::SecurityConfig;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Reject requests without a valid `X-API-Key` header.
///
/// `/api/health` is always reachable so monitoring works without a key.
/// Returns 401 Unauthorized if the key is missing or wrong.
pub async fn api_key_auth(
    headers: HeaderMap,
    State(config): State<Arc<SecurityConfig>>,
    request: Request,
    next: Next,
) -> Response {
    if !config.api_key_enabled || request.uri().path() == "/api/health" {
        return next.run(request).await;
    }

    let provided = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    let valid = match (&config.api_key, provided) {
        (Some(expected), Some(provided)) => keys_match(expected, provided),
        _ => false,
    };

    if valid {
        next.run(request).await
    } else {
        warn!("API key authentication failed for {}", request.uri().path());
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "Invalid or missing API key",
                "kind": "unauthorized",
            })),
        )
            .into_response()
    }
}

/// Constant-time key comparison.
fn keys_match(expected: &str, provided: &str) -> bool {
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_match() {
        assert!(keys_match("0123456789abcdef", "0123456789abcdef"));
        assert!(!keys_match("0123456789abcdef", "0123456789abcdeF"));
        assert!(!keys_match("0123456789abcdef", "0123"));
        assert!(!keys_match("0123456789abcdef", ""));
    }
}
