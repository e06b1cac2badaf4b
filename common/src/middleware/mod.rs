//! Middleware components for the bridge.

pub mod auth;
pub mod cors;
pub mod request_id;

// Re-export commonly used types
pub use auth::{api_key_middleware, API_KEY_HEADER};
pub use cors::{preflight_middleware, with_bridge_headers};
pub use request_id::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
