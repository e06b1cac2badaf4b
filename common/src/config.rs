//! Application configuration.
//!
//! Loaded once at startup from the process environment and passed into the
//! router as state. Request handlers never read the environment themselves.

use std::fmt;

use crate::errors::{AppError, AppResult};

/// Environment variable holding the shared bridge secret.
pub const API_KEY_ENV: &str = "BRIDGE_API_KEY";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// The secret callers must present in `X-API-Key`.
///
/// `Debug` prints a masked form so the key never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a secret, rejecting empty or whitespace-only values.
    pub fn new(secret: impl Into<String>) -> AppResult<Self> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(AppError::Config(format!("{} must not be empty", API_KEY_ENV)));
        }
        Ok(Self(secret))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey(***)")
    }
}

/// Process-wide, read-only configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Service name, used in logs and the health endpoint.
    pub service_name: String,
    /// Listen address.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Secret for the `X-API-Key` header.
    pub api_key: ApiKey,
    /// Emit JSON log lines instead of human-readable text.
    pub json_logs: bool,
}

impl AppConfig {
    /// Loads configuration for the named service from the environment.
    ///
    /// # Errors
    /// Returns `AppError::Config` if `BRIDGE_API_KEY` is missing or blank,
    /// or if `SERVER_PORT` is set but not a valid port.
    pub fn load_with_service(service_name: &str) -> AppResult<Self> {
        Self::from_lookup(service_name, |key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(service_name: &str, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_ENV)
            .ok_or_else(|| AppError::Config(format!("{} is not set", API_KEY_ENV)))
            .and_then(ApiKey::new)?;

        let host = lookup("SERVER_HOST")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("SERVER_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| AppError::Config(format!("SERVER_PORT is not a valid port: {}", raw)))?,
            None => DEFAULT_PORT,
        };

        let json_logs = lookup("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            service_name: service_name.to_string(),
            host,
            port,
            api_key,
            json_logs,
        })
    }

    /// Socket address string for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Load .env file from the working directory (best-effort, no error if missing).
///
/// Variables already present in the environment are left untouched.
pub fn load_dotenv() {
    let env_path = std::path::Path::new(".env");
    if !env_path.exists() {
        return;
    }
    if let Ok(content) = std::fs::read_to_string(env_path) {
        for (key, value) in parse_dotenv(&content) {
            if std::env::var(&key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }
}

fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}
