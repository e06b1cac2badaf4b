//! 数据库方言会话
//!
//! Each request opens exactly one [`DialectSession`]. The two implementations
//! hold a single unpooled driver connection and carry the dialect's catalog
//! SQL, so callers never branch on the dialect themselves.

mod mysql;
mod postgres;

use async_trait::async_trait;
use common::errors::AppResult;
use common::models::{ConnectionTarget, Dialect};
use common::response::{JsonRow, TableColumns};

pub use mysql::MySqlSession;
pub use postgres::PgSession;

/// Connectivity probe run by `action=test`.
pub const PROBE_SQL: &str = "SELECT 1 AS connection_test, NOW() AS server_time";

/// One open connection to a target database.
#[async_trait]
pub trait DialectSession: Send {
    /// `"mysql"` or `"pgsql"`.
    fn connection_type(&self) -> &'static str;

    /// Runs [`PROBE_SQL`] and returns its single row.
    async fn probe(&mut self) -> AppResult<JsonRow>;

    /// Number of base tables in the current database.
    async fn count_tables(&mut self) -> AppResult<i64>;

    /// Base table names, sorted.
    async fn list_tables(&mut self) -> AppResult<Vec<String>>;

    /// Column layout of one table, in column order.
    async fn describe_columns(&mut self, table: &str) -> AppResult<TableColumns>;

    /// Runs one statement verbatim and returns every row.
    async fn fetch_rows(&mut self, sql: &str) -> AppResult<Vec<JsonRow>>;

    /// Closes the connection gracefully.
    async fn close(self: Box<Self>) -> AppResult<()>;
}

/// Opens a session for the target's dialect.
pub async fn connect(target: &ConnectionTarget) -> AppResult<Box<dyn DialectSession>> {
    let session: Box<dyn DialectSession> = match target.dialect {
        Dialect::MySql => Box::new(MySqlSession::connect(target).await?),
        Dialect::Postgres => Box::new(PgSession::connect(target).await?),
    };
    tracing::debug!(
        dialect = %target.dialect,
        host = %target.host,
        port = target.port,
        database = %target.database,
        "数据库连接已建立"
    );
    Ok(session)
}
