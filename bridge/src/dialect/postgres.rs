//! PostgreSQL session.

use async_trait::async_trait;
use common::errors::AppResult;
use common::models::{ConnectionTarget, Dialect};
use common::response::{JsonRow, TableColumns};
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;

use super::{DialectSession, PROBE_SQL};
use crate::rows::RowToJson;

// information_schema columns are domain types (sql_identifier, yes_or_no), hence the casts.
const COUNT_TABLES_SQL: &str = "SELECT COUNT(*) AS table_count FROM information_schema.tables \
     WHERE table_schema = 'public' AND table_type = 'BASE TABLE'";

const LIST_TABLES_SQL: &str = "SELECT table_name::text AS table_name FROM information_schema.tables \
     WHERE table_schema = 'public' AND table_type = 'BASE TABLE' ORDER BY table_name";

const DESCRIBE_COLUMNS_SQL: &str = "SELECT column_name::text AS column_name, \
     data_type::text AS data_type, is_nullable::text AS is_nullable \
     FROM information_schema.columns \
     WHERE table_schema = 'public' AND table_name = $1 ORDER BY ordinal_position";

const COLUMN_NAME_KEY: &str = "column_name";

/// Single PostgreSQL connection.
pub struct PgSession {
    conn: PgConnection,
}

impl PgSession {
    pub async fn connect(target: &ConnectionTarget) -> AppResult<Self> {
        let mut options = PgConnectOptions::new()
            .host(&target.host)
            .port(target.port)
            .password(&target.password);
        // Empty values keep the driver's own defaults, as libpq does.
        if !target.username.is_empty() {
            options = options.username(&target.username);
        }
        if !target.database.is_empty() {
            options = options.database(&target.database);
        }

        let conn = PgConnection::connect_with(&options).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl DialectSession for PgSession {
    fn connection_type(&self) -> &'static str {
        Dialect::Postgres.connection_type()
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
        let rows = sqlx::query(DESCRIBE_COLUMNS_SQL)
            .bind(table)
            .fetch_all(&mut self.conn)
            .await?;
        let details = rows.iter().map(RowToJson::to_json_map).collect();
        Ok(TableColumns::from_rows(details, COLUMN_NAME_KEY))
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

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::BridgeRequest;
    use sqlx::Executor;

    async fn live_session() -> PgSession {
        let raw = std::env::var("BRIDGE_TEST_POSTGRES").expect("BRIDGE_TEST_POSTGRES is not set");
        let target = ConnectionTarget::from_request(&BridgeRequest::from_body(raw.as_bytes()));
        PgSession::connect(&target).await.unwrap()
    }

    #[tokio::test]
    #[ignore = "needs a PostgreSQL server, see BRIDGE_TEST_POSTGRES"]
    async fn test_live_enum_array_inet_interval_columns() {
        let mut session = live_session().await;
        session
            .conn
            .execute("CREATE TYPE pg_temp.mood AS ENUM ('happy', 'sad')")
            .await
            .unwrap();

        let rows = session
            .fetch_rows(
                "SELECT 'ann' AS name, 'happy'::pg_temp.mood AS feeling, \
                 ARRAY['a', 'b'] AS tags, '10.0.0.1'::inet AS ip, \
                 interval '1 day 2 hours' AS span, B'101' AS bits, 2 AS z, 1 AS a",
            )
            .await
            .unwrap();
        let row = &rows[0];
        assert_eq!(row["name"], "ann");
        assert_eq!(row["feeling"], "happy");
        assert_eq!(row["tags"], serde_json::json!(["a", "b"]));
        assert_eq!(row["ip"], "10.0.0.1");
        assert_eq!(row["span"], "1 day 02:00:00");
        assert_eq!(row["bits"], "101");

        let keys: Vec<&str> = row.keys().map(String::as_str).collect();
        assert_eq!(keys, ["name", "feeling", "tags", "ip", "span", "bits", "z", "a"]);
    }
}
