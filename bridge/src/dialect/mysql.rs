//! MySQL session.

use async_trait::async_trait;
use common::errors::AppResult;
use common::models::{ConnectionTarget, Dialect};
use common::response::{JsonRow, TableColumns};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, Executor};

use super::{DialectSession, PROBE_SQL};
use crate::rows::RowToJson;

const COUNT_TABLES_SQL: &str = "SELECT COUNT(*) AS table_count FROM information_schema.TABLES \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE'";

const LIST_TABLES_SQL: &str = "SELECT CAST(TABLE_NAME AS CHAR) AS table_name FROM information_schema.TABLES \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE' ORDER BY TABLE_NAME";

/// `DESCRIBE` output column holding the column name.
const FIELD_KEY: &str = "Field";

/// Single MySQL connection, `utf8mb4` charset.
pub struct MySqlSession {
    conn: MySqlConnection,
}

impl MySqlSession {
    pub async fn connect(target: &ConnectionTarget) -> AppResult<Self> {
        let mut options = MySqlConnectOptions::new()
            .host(&target.host)
            .port(target.port)
            .username(&target.username)
            .password(&target.password)
            .charset("utf8mb4");
        if !target.database.is_empty() {
            options = options.database(&target.database);
        }

        let conn = MySqlConnection::connect_with(&options).await?;
        Ok(Self { conn })
    }
}

/// Backtick-quotes an identifier, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

#[async_trait]
impl DialectSession for MySqlSession {
    fn connection_type(&self) -> &'static str {
        Dialect::MySql.connection_type()
    }

    async fn probe(&mut self) -> AppResult<JsonRow> {
        let row = sqlx::query(PROBE_SQL).fetch_one(&mut self.conn).await?;
        Ok(row.to_json_map())
    }

    async fn count_tables(&mut self) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(COUNT_TABLES_SQL)
            .fetch_one(&mut self.conn)
            .await?;
        Ok(count)
    }

    async fn list_tables(&mut self) -> AppResult<Vec<String>> {
        let tables = sqlx::query_scalar::<_, String>(LIST_TABLES_SQL)
            .fetch_all(&mut self.conn)
            .await?;
        Ok(tables)
    }

    async fn describe_columns(&mut self, table: &str) -> AppResult<TableColumns> {
        // DESCRIBE cannot be prepared; a bare &str carries no arguments and
        // goes over the text protocol.
        let sql = format!("DESCRIBE {}", quote_identifier(table));
        let rows = self.conn.fetch_all(sql.as_str()).await?;
        let details = rows.iter().map(RowToJson::to_json_map).collect();
        Ok(TableColumns::from_rows(details, FIELD_KEY))
    }

    async fn fetch_rows(&mut self, sql: &str) -> AppResult<Vec<JsonRow>> {
        let rows = sqlx::query(sql).fetch_all(&mut self.conn).await?;
        Ok(rows.iter().map(RowToJson::to_json_map).collect())
    }

    async fn close(self: Box<Self>) -> AppResult<()> {
        self.conn.close().await?;
        Ok(())
    }
}
