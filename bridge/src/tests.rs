//! Router-level tests.
//!
//! Everything here runs without a database except the `#[ignore]`d tests at
//! the bottom, which read a JSON target from `BRIDGE_TEST_MYSQL` or
//! `BRIDGE_TEST_POSTGRES`, e.g.
//! `{"system_type":"mysql","db_host":"127.0.0.1","db_username":"root","db_password":"pw","db_name":"app"}`.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use common::config::AppConfig;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::create_router;
use crate::state::AppState;

const KEY: &str = "test-bridge-key";

fn app() -> Router {
    let config = AppConfig::from_lookup("db-bridge", |name| match name {
        "BRIDGE_API_KEY" => Some(KEY.to_string()),
        _ => None,
    })
    .unwrap();
    create_router(AppState::new(config))
}

struct Reply {
    status: StatusCode,
    headers: axum::http::HeaderMap,
    body: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

async fn send(method: Method, uri: &str, key: Option<&str>, body: Value) -> Reply {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(key) = key {
        builder = builder.header("X-API-Key", key);
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();

    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    Reply {
        status,
        headers,
        body,
    }
}

async fn post(uri: &str, body: Value) -> Reply {
    send(Method::POST, uri, Some(KEY), body).await
}

/// Host that refuses connections, so any request reaching the database fails fast.
fn unreachable(system_type: &str) -> Value {
    json!({"system_type": system_type, "db_host": "127.0.0.1", "db_port": 1})
}

#[tokio::test]
async fn test_bad_api_key_is_401_regardless_of_action() {
    for key in [None, Some("wrong"), Some("")] {
        for uri in ["/?action=test", "/api/bridge?action=execute", "/?action=nope"] {
            let reply = send(Method::POST, uri, key, json!({"query": "SELECT 1"})).await;
            assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
            assert_eq!(reply.json(), json!({"success": false, "error": "Invalid API key"}));
        }
    }
}

#[tokio::test]
async fn test_options_is_empty_with_cors_headers() {
    let reply = send(Method::OPTIONS, "/api/bridge?action=execute", None, json!({})).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.is_empty());
    assert_eq!(reply.headers["access-control-allow-origin"], "*");
    assert_eq!(reply.headers["access-control-allow-methods"], "POST, OPTIONS");
    assert_eq!(reply.headers["access-control-allow-headers"], "Content-Type, X-API-Key");
}

#[tokio::test]
async fn test_error_responses_carry_bridge_headers() {
    let reply = send(Method::POST, "/", Some("wrong"), json!({})).await;
    assert_eq!(reply.headers["content-type"], "application/json");
    assert_eq!(reply.headers["access-control-allow-origin"], "*");
    assert!(reply.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_non_select_never_reaches_database() {
    // The target is unreachable: a 500 here would mean a connection was attempted.
    for query in ["DELETE FROM x", "DROP TABLE users", "  update t set a=1"] {
        let mut body = unreachable("mysql");
        body["query"] = json!(query);
        let reply = post("/?action=execute", body).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(
            reply.json(),
            json!({"success": false, "error": "Only SELECT queries are allowed"})
        );
    }
}

#[tokio::test]
async fn test_missing_query() {
    for body in [unreachable("postgres"), json!({"query": ""}), json!({"query": "   "})] {
        let reply = post("/?action=execute", body).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.json(), json!({"success": false, "error": "No query provided"}));
    }
}

#[tokio::test]
async fn test_invalid_action() {
    for uri in ["/?action=drop", "/?action=", "/?action=Execute"] {
        let reply = post(uri, unreachable("mysql")).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.json(), json!({"success": false, "error": "Invalid action"}));
    }
}

#[tokio::test]
async fn test_malformed_body_is_empty_request() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/?action=execute")
        .header("X-API-Key", KEY)
        .body(Body::from("{this is not json"))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["error"], "No query provided");
}

#[tokio::test]
async fn test_database_failure_is_500_with_driver_message() {
    for system_type in ["mysql", "postgres", "postgresql"] {
        let reply = post("/?action=test", unreachable(system_type)).await;
        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
        let value = reply.json();
        assert_eq!(value["success"], false);
        assert!(!value["error"].as_str().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_action_defaults_to_test() {
    // No action means `test`, which must try to connect.
    let reply = post("/", unreachable("mysql")).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_health_needs_no_api_key() {
    let reply = send(Method::GET, "/api/health", None, json!({})).await;
    assert_eq!(reply.status, StatusCode::OK);
    let value = reply.json();
    assert_eq!(value["status"], "healthy");
    assert_eq!(value["service"], "db-bridge");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let reply = send(Method::GET, "/api-docs/openapi.json", None, json!({})).await;
    assert_eq!(reply.status, StatusCode::OK);
    let value = reply.json();
    assert!(value["paths"].get("/api/bridge").is_some());
}

fn live_target(var: &str) -> Value {
    let raw = std::env::var(var).unwrap_or_else(|_| panic!("{var} is not set"));
    serde_json::from_str(&raw).unwrap()
}

async fn assert_live_bridge(var: &str, expected_type: &str) {
    let target = live_target(var);

    let reply = post("/?action=test", target.clone()).await;
    assert_eq!(reply.status, StatusCode::OK, "{}", String::from_utf8_lossy(&reply.body));
    let value = reply.json();
    assert_eq!(value["success"], true);
    assert_eq!(value["message"], "Bridge connected successfully");
    assert_eq!(value["data"]["connection_type"], expected_type);
    assert_eq!(value["data"]["connection_test"], 1);
    assert!(value["data"]["table_count"].as_i64().unwrap() >= 0);

    let mut execute = target.clone();
    execute["query"] = json!("SELECT 1");
    let value = post("/?action=execute", execute).await.json();
    assert_eq!(value["success"], true);
    assert_eq!(value["row_count"], 1);
    assert_eq!(value["data"].as_array().unwrap().len(), 1);

    let first = post("/?action=schema", target.clone()).await.json();
    let second = post("/?action=schema", target).await.json();
    assert_eq!(first["success"], true);
    assert_eq!(
        first["table_count"].as_u64().unwrap() as usize,
        first["schema"].as_object().unwrap().len()
    );
    assert_eq!(first, second);
}

#[tokio::test]
#[ignore = "needs a MySQL server, see BRIDGE_TEST_MYSQL"]
async fn test_live_mysql() {
    assert_live_bridge("BRIDGE_TEST_MYSQL", "mysql").await;
}

#[tokio::test]
#[ignore = "needs a PostgreSQL server, see BRIDGE_TEST_POSTGRES"]
async fn test_live_postgres() {
    assert_live_bridge("BRIDGE_TEST_POSTGRES", "pgsql").await;
}
