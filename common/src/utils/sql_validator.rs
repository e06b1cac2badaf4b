//! SQL statement validator.
//!
//! Gatekeeper for `action=execute`: the bridge only forwards read queries.

use crate::errors::{AppError, AppResult};

/// Validates SQL statements before they reach a database.
pub struct SqlValidator;

impl SqlValidator {
    /// Validates that a caller-supplied query is a SELECT.
    ///
    /// # Arguments
    /// * `query` - The raw `query` field, if any
    ///
    /// # Returns
    /// The trimmed query text, otherwise unchanged.
    ///
    /// # Errors
    /// Returns `AppError::NoQuery` if the query is absent or blank, and
    /// `AppError::SelectOnly` if it does not start with `SELECT`.
    pub fn validate_select(query: Option<&str>) -> AppResult<&str> {
        let sql = query.map(str::trim).unwrap_or_default();
        if sql.is_empty() {
            return Err(AppError::NoQuery);
        }
        if !Self::is_select(sql) {
            return Err(AppError::SelectOnly);
        }
        Ok(sql)
    }

    /// Checks if the SQL is a SELECT query.
    pub fn is_select(sql: &str) -> bool {
        sql.trim_start()
            .get(..6)
            .is_some_and(|head| head.eq_ignore_ascii_case("SELECT"))
    }
}
