//! Application error type.
//!
//! Every failure the bridge can report is a variant of [`AppError`]. The
//! `IntoResponse` impl renders it as the `{success: false, error}` envelope
//! with the status code that belongs to its tier.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::BridgeResponse;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or wrong `X-API-Key`.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// `execute` without a query (or only whitespace).
    #[error("No query provided")]
    NoQuery,

    /// `execute` with something other than a SELECT.
    #[error("Only SELECT queries are allowed")]
    SelectOnly,

    #[error("Invalid action")]
    InvalidAction,

    /// Connection, syntax, permission or decode failure reported by the driver.
    #[error("{0}")]
    Database(String),

    /// Startup configuration problem.
    #[error("configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// HTTP status for this error.
    ///
    /// Application-level rejections are reported in the body with a 200.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            AppError::NoQuery | AppError::SelectOnly | AppError::InvalidAction => StatusCode::OK,
            AppError::Database(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable code for log fields.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidApiKey => "INVALID_API_KEY",
            AppError::NoQuery => "NO_QUERY",
            AppError::SelectOnly => "SELECT_ONLY",
            AppError::InvalidAction => "INVALID_ACTION",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            // The server's own message, without sqlx's "error returned from database" prefix.
            sqlx::Error::Database(db_err) => AppError::Database(db_err.message().to_string()),
            _ => AppError::Database(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "请求失败");
        } else {
            tracing::debug!(code = self.error_code(), error = %self, "请求被拒绝");
        }
        (status, Json(BridgeResponse::failure(self.to_string()))).into_response()
    }
}
