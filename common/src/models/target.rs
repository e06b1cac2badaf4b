//! Connection target models.
//!
//! Normalizes the loosely-typed request body into a closed dialect and a
//! complete set of connection parameters.

use std::fmt;

use super::request::BridgeRequest;

/// Supported database dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// MySQL-compatible server.
    MySql,
    /// PostgreSQL-compatible server.
    Postgres,
}

impl Dialect {
    /// Maps `system_type` to a dialect.
    ///
    /// `postgres` and `postgresql` (any case) select Postgres; everything
    /// else, including absence, selects MySQL.
    pub fn from_system_type(system_type: Option<&str>) -> Self {
        match system_type.map(str::to_lowercase).as_deref() {
            Some("postgres") | Some("postgresql") => Dialect::Postgres,
            _ => Dialect::MySql,
        }
    }

    /// Returns the default host for this dialect.
    pub fn default_host(&self) -> &'static str {
        match self {
            Dialect::MySql => "localhost",
            Dialect::Postgres => "127.0.0.1",
        }
    }

    /// Returns the default port for this dialect.
    pub fn default_port(&self) -> u16 {
        match self {
            Dialect::MySql => 3306,
            Dialect::Postgres => 5432,
        }
    }

    /// Value reported as `connection_type` by `action=test`.
    pub fn connection_type(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "pgsql",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::MySql => write!(f, "mysql"),
            Dialect::Postgres => write!(f, "postgres"),
        }
    }
}

/// Everything needed to open one connection. Built per request.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub dialect: Dialect,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl ConnectionTarget {
    /// Applies dialect defaults to whatever the caller supplied.
    pub fn from_request(req: &BridgeRequest) -> Self {
        let dialect = Dialect::from_system_type(req.system_type.as_deref());
        let host = req
            .db_host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| dialect.default_host())
            .to_string();

        Self {
            dialect,
            host,
            port: req.db_port.unwrap_or_else(|| dialect.default_port()),
            database: req.db_name.clone().unwrap_or_default(),
            username: req.db_username.clone().unwrap_or_default(),
            password: req.db_password.clone().unwrap_or_default(),
        }
    }
}

impl fmt::Debug for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionTarget")
            .field("dialect", &self.dialect)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
