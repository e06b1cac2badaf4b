//! Bridge response envelope.
//!
//! Every body the bridge returns is a flat JSON object with a `success` flag.
//! Success payloads are flattened next to the flag; failures carry a single
//! `error` string.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// A decoded result row: column name to JSON value.
pub type JsonRow = Map<String, Value>;

/// Standard bridge response wrapper.
#[derive(Debug, Serialize, ToSchema)]
pub struct BridgeResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,

    /// Action-specific payload, flattened into the envelope.
    #[serde(flatten)]
    pub body: T,
}

/// Failure payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
}

impl<T: Serialize> BridgeResponse<T> {
    /// Creates a successful response.
    pub fn ok(body: T) -> Self {
        Self {
            success: true,
            body,
        }
    }
}

impl BridgeResponse<ErrorBody> {
    /// Creates an error response.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            body: ErrorBody {
                error: error.into(),
            },
        }
    }
}

/// Result of `action=test`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TestPayload {
    pub message: String,
    pub data: ConnectionReport,
}

/// Connectivity details returned by `action=test`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConnectionReport {
    /// Value of `SELECT 1`, or null if the column was missing.
    #[schema(value_type = Object)]
    pub connection_test: Value,
    /// Server clock at the time of the probe.
    #[schema(value_type = Object)]
    pub server_time: Value,
    /// Number of base tables in the target database.
    pub table_count: i64,
    /// `"mysql"` or `"pgsql"`.
    pub connection_type: String,
}

/// Result of `action=schema`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SchemaPayload {
    /// Table name to its columns, ordered by table name.
    pub schema: BTreeMap<String, TableColumns>,
    pub table_count: usize,
}

/// Column layout of one table.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TableColumns {
    /// Column names in table order.
    pub columns: Vec<String>,
    /// Raw metadata rows as returned by the dialect's describe operation.
    #[schema(value_type = Vec<Object>)]
    pub column_details: Vec<JsonRow>,
}

impl TableColumns {
    /// Builds the layout from describe rows, taking names from `name_key`.
    ///
    /// Rows without a string under `name_key` are kept in `column_details`
    /// but contribute no name.
    pub fn from_rows(column_details: Vec<JsonRow>, name_key: &str) -> Self {
        let columns = column_details
            .iter()
            .filter_map(|row| row.get(name_key).and_then(Value::as_str))
            .map(str::to_string)
            .collect();
        Self {
            columns,
            column_details,
        }
    }
}

/// Result of `action=execute`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExecutePayload {
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<JsonRow>,
    pub row_count: usize,
}

impl ExecutePayload {
    pub fn new(data: Vec<JsonRow>) -> Self {
        let row_count = data.len();
        Self { data, row_count }
    }
}

/// Any successful bridge payload.
#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum ActionOutcome {
    Test(TestPayload),
    Schema(SchemaPayload),
    Execute(ExecutePayload),
}
