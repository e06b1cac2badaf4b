//! 数据库桥接服务
//!
//! 单一 HTTP 端点，按请求连接调用方指定的 MySQL / PostgreSQL 数据库：
//! - 连接测试（test）
//! - 表结构读取（schema）
//! - 只读查询执行（execute）

mod dialect;
mod handlers;
mod routes;
mod rows;
mod service;
mod state;
#[cfg(test)]
mod tests;

use anyhow::Context;
use axum::{middleware, routing::get, Json, Router};
use common::config::{load_dotenv, AppConfig};
use common::middleware::{request_id_middleware, with_bridge_headers};
use state::AppState;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

const SERVICE_NAME: &str = "db-bridge";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "数据库桥接服务 API",
        version = "0.1.0",
        description = "MySQL / PostgreSQL HTTP 桥接服务"
    ),
    paths(
        handlers::bridge,
        handlers::health_check,
    ),
    components(schemas(
        common::models::BridgeRequest,
        common::response::ActionOutcome,
        common::response::TestPayload,
        common::response::ConnectionReport,
        common::response::SchemaPayload,
        common::response::TableColumns,
        common::response::ExecutePayload,
        common::response::ErrorBody,
        handlers::HealthResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "bridge", description = "桥接端点"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (if present) before anything else
    load_dotenv();

    // 加载配置（未设置 BRIDGE_API_KEY 时拒绝启动）
    let config = AppConfig::load_with_service(SERVICE_NAME).context("加载配置失败")?;

    // 初始化日志追踪
    init_tracing(config.json_logs);

    let addr = config.bind_address();
    let state = AppState::new(config);
    let app = create_router(state);

    info!(service = SERVICE_NAME, address = %addr, "启动服务");

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("绑定地址失败: {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_signal())
        .await
        .context("服务启动失败")?;

    info!("服务已停止");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,sqlx=warn".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

pub(crate) fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .merge(routes::router(state.config.api_key.clone()))
        .route("/api-docs/openapi.json", get(openapi_json));

    with_bridge_headers(router)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "无法监听 SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "无法监听 SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("收到 SIGINT"),
        _ = terminate => info!("收到 SIGTERM"),
    }
}
