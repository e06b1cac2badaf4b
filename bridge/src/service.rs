//! 桥接服务模块

use std::collections::BTreeMap;

use common::errors::AppResult;
use common::models::{ConnectionTarget, Operation};
use common::response::{
    ActionOutcome, ConnectionReport, ExecutePayload, SchemaPayload, TestPayload,
};
use serde_json::Value;

use crate::dialect::{self, DialectSession};

const CONNECTED_MESSAGE: &str = "Bridge connected successfully";

/// Runs one validated operation against one target database.
pub struct BridgeService;

impl BridgeService {
    /// Opens a connection, runs the operation and closes the connection.
    ///
    /// A failure to close is logged and does not change the outcome.
    pub async fn run(target: &ConnectionTarget, operation: &Operation) -> AppResult<ActionOutcome> {
        let mut session = dialect::connect(target).await?;
        let outcome = Self::dispatch(session.as_mut(), operation).await;

        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "关闭数据库连接失败");
        }
        outcome
    }

    /// Runs an operation on an already open session.
    pub async fn dispatch(
        session: &mut dyn DialectSession,
        operation: &Operation,
    ) -> AppResult<ActionOutcome> {
        match operation {
            Operation::Test => Self::test(session).await.map(ActionOutcome::Test),
            Operation::Schema => Self::schema(session).await.map(ActionOutcome::Schema),
            Operation::Execute(sql) => Self::execute(session, sql).await.map(ActionOutcome::Execute),
        }
    }

    async fn test(session: &mut dyn DialectSession) -> AppResult<TestPayload> {
        let mut row = session.probe().await?;
        let table_count = session.count_tables().await?;

        Ok(TestPayload {
            message: CONNECTED_MESSAGE.to_string(),
            data: ConnectionReport {
                connection_test: row.remove("connection_test").unwrap_or(Value::Null),
                server_time: row.remove("server_time").unwrap_or(Value::Null),
                table_count,
                connection_type: session.connection_type().to_string(),
            },
        })
    }

    async fn schema(session: &mut dyn DialectSession) -> AppResult<SchemaPayload> {
        let tables = session.list_tables().await?;
        let mut schema = BTreeMap::new();
        for table in tables {
            let columns = session.describe_columns(&table).await?;
            schema.insert(table, columns);
        }

        tracing::info!(table_count = schema.len(), "表结构读取完成");
        Ok(SchemaPayload {
            table_count: schema.len(),
            schema,
        })
    }

    async fn execute(session: &mut dyn DialectSession, sql: &str) -> AppResult<ExecutePayload> {
        let rows = session.fetch_rows(sql).await?;
        tracing::info!(row_count = rows.len(), "查询执行完成");
        Ok(ExecutePayload::new(rows))
    }
}
