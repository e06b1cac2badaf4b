//! Bridge response headers.
//!
//! Every response carries a JSON content type and permissive CORS headers.
//! `OPTIONS` requests are answered here with an empty body and never reach
//! authentication or the handler.

use axum::{
    body::Body,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
        },
        HeaderValue, Method, Request, StatusCode,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

const ALLOW_ORIGIN: &str = "*";
const ALLOW_METHODS: &str = "POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, X-API-Key";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Wraps `router` so every response, preflight included, carries the bridge headers.
pub fn with_bridge_headers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let headers = [
        (CONTENT_TYPE, JSON_CONTENT_TYPE),
        (ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ORIGIN),
        (ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS),
        (ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS),
    ];

    headers.into_iter().fold(
        router.layer(middleware::from_fn(preflight_middleware)),
        |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::overriding(
                name,
                HeaderValue::from_static(value),
            ))
        },
    )
}

/// Answers `OPTIONS` with an empty 200.
pub async fn preflight_middleware(req: Request<Body>, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        tracing::debug!(uri = %req.uri(), "CORS 预检请求");
        return StatusCode::OK.into_response();
    }
    next.run(req).await
}
