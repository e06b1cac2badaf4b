//! Handler模块

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::Uri,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use common::errors::AppError;
use common::models::{ActionParams, BridgeRequest, ConnectionTarget, Operation};
use common::response::{ActionOutcome, BridgeResponse};
use crate::service::BridgeService;
use crate::state::AppState;

/// 桥接端点：连接测试、表结构读取或只读查询
#[utoipa::path(
    post,
    path = "/api/bridge",
    tag = "bridge",
    params(ActionParams),
    request_body = BridgeRequest,
    responses(
        (status = 200, description = "操作结果（业务失败时 success 为 false）", body = BridgeResponse<ActionOutcome>),
        (status = 401, description = "API 密钥无效", body = BridgeResponse<common::response::ErrorBody>),
        (status = 500, description = "数据库错误", body = BridgeResponse<common::response::ErrorBody>)
    ),
    security(("api_key" = []))
)]
pub async fn bridge(
    uri: Uri,
    body: Bytes,
) -> Result<Json<BridgeResponse<ActionOutcome>>, AppError> {
    // A malformed query string counts as no action at all.
    let params = Query::<ActionParams>::try_from_uri(&uri)
        .map(|Query(params)| params)
        .unwrap_or_default();
    let request = BridgeRequest::from_body(&body);

    let operation = Operation::resolve(params.action.as_deref(), &request)?;
    let target = ConnectionTarget::from_request(&request);

    tracing::info!(
        action = operation.action().as_str(),
        dialect = %target.dialect,
        host = %target.host,
        port = target.port,
        database = %target.database,
        "处理桥接请求"
    );

    let outcome = BridgeService::run(&target, &operation).await?;
    Ok(Json(BridgeResponse::ok(outcome)))
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.config.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}
