//! Authentication middleware.
//!
//! Checks the shared secret in `X-API-Key` before a request reaches the
//! bridge handler.

use axum::{
    body::Body,
    extract::State,
    http::{header::HeaderName, Request},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::config::ApiKey;
use crate::errors::AppError;

/// Header carrying the caller's API key.
pub static API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// API key middleware handler.
///
/// Use with `axum::middleware::from_fn_with_state(api_key, api_key_middleware)`.
///
/// # Errors
/// Returns `AppError::InvalidApiKey` (HTTP 401) when the header is absent,
/// not valid text, or does not match the configured key.
pub async fn api_key_middleware(
    State(api_key): State<ApiKey>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let authorized = match extract_api_key(&req) {
        Some(presented) if verify_api_key(&api_key, presented) => true,
        Some(presented) => {
            tracing::warn!(key_prefix = %mask_key(presented), "API 密钥无效");
            false
        }
        None => {
            tracing::warn!("缺少 X-API-Key 请求头");
            false
        }
    };

    if !authorized {
        return Err(AppError::InvalidApiKey);
    }
    Ok(next.run(req).await)
}

/// Extract the API key from the `X-API-Key` header.
pub fn extract_api_key(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(&API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
}

fn verify_api_key(expected: &ApiKey, presented: &str) -> bool {
    let presented = presented.as_bytes();
    let expected = expected.as_bytes();
    if presented.len() != expected.len() {
        return false;
    }
    presented.ct_eq(expected).into()
}

fn mask_key(key: &str) -> String {
    match key.char_indices().nth(3) {
        Some((idx, _)) => format!("{}***", &key[..idx]),
        None => "***".to_string(),
    }
}
