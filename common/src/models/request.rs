//! Bridge request models.
//!
//! Contains the JSON body, the query-string action and the validated
//! operation derived from both.

use serde::{Deserialize, Deserializer};
use utoipa::{IntoParams, ToSchema};

use crate::errors::{AppError, AppResult};
use crate::utils::SqlValidator;

/// JSON body of a bridge request. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct BridgeRequest {
    /// `mysql` (default), `postgres` or `postgresql`.
    pub system_type: Option<String>,
    /// Database host.
    pub db_host: Option<String>,
    /// Database port, as a number or a numeric string.
    #[serde(deserialize_with = "lenient_port")]
    #[schema(value_type = Option<u16>)]
    pub db_port: Option<u16>,
    /// Database name.
    pub db_name: Option<String>,
    /// Database username.
    pub db_username: Option<String>,
    /// Database password.
    pub db_password: Option<String>,
    /// SELECT statement for `action=execute`.
    pub query: Option<String>,
}

impl BridgeRequest {
    /// Parses a request body, falling back to an empty request.
    ///
    /// Empty bodies, malformed JSON and non-object JSON all yield
    /// `BridgeRequest::default()`.
    pub fn from_body(body: &[u8]) -> Self {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::default();
        }
        match serde_json::from_slice(body) {
            Ok(req) => req,
            Err(e) => {
                tracing::debug!(error = %e, "请求体无法解析，按空请求处理");
                Self::default()
            }
        }
    }
}

fn lenient_port<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

/// Query-string parameters of the bridge endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActionParams {
    /// `test` (default), `schema` or `execute`.
    pub action: Option<String>,
}

/// Bridge action selected by the `action` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Test,
    Schema,
    Execute,
}

impl Action {
    /// Parses the action name; absence means `test`.
    ///
    /// Names are case-sensitive.
    pub fn parse(action: Option<&str>) -> AppResult<Self> {
        match action.unwrap_or("test") {
            "test" => Ok(Action::Test),
            "schema" => Ok(Action::Schema),
            "execute" => Ok(Action::Execute),
            _ => Err(AppError::InvalidAction),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Test => "test",
            Action::Schema => "schema",
            Action::Execute => "execute",
        }
    }
}

/// A fully validated unit of work, ready to run against a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Test,
    Schema,
    /// Trimmed SELECT statement, otherwise passed through untouched.
    Execute(String),
}

impl Operation {
    /// Validates action and query before any connection is opened.
    pub fn resolve(action: Option<&str>, request: &BridgeRequest) -> AppResult<Self> {
        match Action::parse(action)? {
            Action::Test => Ok(Operation::Test),
            Action::Schema => Ok(Operation::Schema),
            Action::Execute => {
                let query = SqlValidator::validate_select(request.query.as_deref())?;
                Ok(Operation::Execute(query.to_string()))
            }
        }
    }

    pub fn action(&self) -> Action {
        match self {
            Operation::Test => Action::Test,
            Operation::Schema => Action::Schema,
            Operation::Execute(_) => Action::Execute,
        }
    }
}
