//! 路由模块

use axum::{
    middleware,
    routing::{any, get},
    Router,
};
use common::config::ApiKey;
use common::middleware::api_key_middleware;

use crate::handlers;
use crate::state::AppState;

/// Bridge routes. Only the bridge endpoints require `X-API-Key`.
pub fn router(api_key: ApiKey) -> Router<AppState> {
    let bridge = Router::new()
        .route("/", any(handlers::bridge))
        .route("/api/bridge", any(handlers::bridge))
        .route_layer(middleware::from_fn_with_state(api_key, api_key_middleware));

    Router::new()
        .merge(bridge)
        .route("/api/health", get(handlers::health_check))
}
