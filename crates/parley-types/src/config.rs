//! Process configuration types for Parley.
//!
//! `AppConfig` represents the `config.toml` read at startup. Every field has a
//! default so an empty (or missing) file yields a runnable server. The config
//! is passed explicitly to constructors; nothing reads it from global state.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub paging: PagingConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Listener and lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on graceful shutdown before in-flight requests are dropped.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
    /// Per-request deadline; a request exceeding it is aborted mid round trip.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    50055
}

fn default_shutdown_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Database connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite URL. `None` resolves to `{data_dir}/parley.db`.
    #[serde(default)]
    pub url: Option<String>,
    /// Size of the read-only connection pool.
    #[serde(default = "default_max_read_connections")]
    pub max_read_connections: u32,
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

fn default_max_read_connections() -> u32 {
    8
}

fn default_busy_timeout_secs() -> u64 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_read_connections: default_max_read_connections(),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("invalid log format: '{other}'")),
        }
    }
}

/// Logging settings. `RUST_LOG`, when set, takes precedence over `level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Message history page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingConfig {
    /// Used when the caller passes no limit or a non-positive one.
    #[serde(default = "default_page_limit")]
    pub default_limit: u32,
    #[serde(default = "default_max_page_limit")]
    pub max_limit: u32,
}

fn default_page_limit() -> u32 {
    50
}

fn default_max_page_limit() -> u32 {
    100
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_limit: default_page_limit(),
            max_limit: default_max_page_limit(),
        }
    }
}

impl PagingConfig {
    /// Clamp a caller-supplied limit into `[1, max_limit]`.
    ///
    /// Missing and non-positive limits fall back to `default_limit`.
    pub fn clamp(&self, requested: Option<i64>) -> u32 {
        let max = self.max_limit.max(1);
        match requested {
            Some(n) if n > 0 => n.min(i64::from(max)) as u32,
            _ => self.default_limit.clamp(1, max),
        }
    }
}

/// HTTP adapter settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Reject message history requests that do not name a participant viewer.
    #[serde(default)]
    pub require_viewer: bool,
}
