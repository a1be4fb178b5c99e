//! Configuration loading and constants.
//!
//! All runtime settings are read once from the process environment into an
//! immutable [`AppConfig`]. Most of them only steer the listener, the store and
//! logging; the rest are reflected back verbatim by `GET /api/config` so the
//! effect of ConfigMaps and Secrets can be observed from outside the pod.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use envconfig::Envconfig;
use serde::Serialize;

use crate::lifecycle::WorkMode;

// =============================================================================
// Lifecycle Constants
// =============================================================================

/// Delay between answering `POST /api/crash` and terminating the process
pub const CRASH_DELAY_MS: u64 = 1000;

/// Exit status used by the crash endpoint
pub const CRASH_EXIT_CODE: i32 = 1;

/// Maximum time to wait for in-flight requests after SIGTERM
pub const SHUTDOWN_GRACE_SECS: u64 = 30;

/// Busy-wait duration when `ms` is absent from the query string
pub const DEFAULT_WORK_MS: u64 = 200;

/// Upper bound for a single busy-wait (one day), keeps deadline arithmetic finite
pub const MAX_WORK_MS: u64 = 86_400_000;

// =============================================================================
// Default Paths and Strings
// =============================================================================

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "workshop_api=debug,tower_http=debug";

/// Placeholder reported for unset string settings
pub const NOT_SET: &str = "not-set";

/// Placeholder reported for unset environment name and pod name
pub const UNKNOWN: &str = "unknown";

#[derive(Envconfig, Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP listener binds to
    #[envconfig(from = "HOST", default = "0.0.0.0")]
    pub host: String,
    #[envconfig(from = "PORT", default = "8080")]
    pub port: u16,
    /// Allowed CORS origin, `*` for any
    #[envconfig(from = "CORS_ORIGIN", default = "*")]
    pub cors_origin: String,

    /// Directory holding the SQLite database, created on startup
    #[envconfig(from = "DATA_DIR", default = "data")]
    pub data_dir: String,
    #[envconfig(from = "DB_FILE", default = "app.db")]
    pub db_file: String,

    /// Version reported by `/api/status`. Defaults to the crate version.
    #[envconfig(from = "APP_VERSION")]
    pub app_version: Option<String>,
    /// Pod name reported by the crash endpoint
    #[envconfig(from = "HOSTNAME")]
    pub hostname: Option<String>,

    #[envconfig(from = "WORK_MODE", default = "blocking")]
    pub work_mode: WorkMode,
    #[envconfig(from = "LOG_FORMAT", default = "text")]
    pub log_format: LogFormat,

    // Reflected by /api/config only, never acted upon
    #[envconfig(from = "APP_ENV")]
    pub app_env: Option<String>,
    #[envconfig(from = "FEATURE_NEW_UI")]
    pub feature_new_ui: Option<String>,
    #[envconfig(from = "EXTERNAL_API_URL")]
    pub external_api_url: Option<String>,
    #[envconfig(from = "MAX_ITEMS", default = "100")]
    pub max_items: String,
    #[envconfig(from = "DB_PATH")]
    pub db_path: Option<String>,
    #[envconfig(from = "API_KEY")]
    pub api_key: Option<String>,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self::init_from_env()?)
    }

    /// Load configuration from an explicit variable map instead of the environment.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Ok(Self::init_from_hashmap(vars)?)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Validation(format!("Invalid HOST or PORT: {}", e)))
    }

    /// Full path of the database file inside the data directory.
    pub fn database_file(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.db_file)
    }

    pub fn version(&self) -> String {
        self.app_version
            .clone()
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string())
    }

    pub fn pod_name(&self) -> String {
        self.hostname.clone().unwrap_or_else(|| UNKNOWN.to_string())
    }

    /// Build the read-only view served by `GET /api/config`.
    ///
    /// The API key is redacted to its presence and length; its value never
    /// leaves the process.
    pub fn reflection(&self) -> ConfigReflection {
        let api_key = self.api_key.as_deref().filter(|key| !key.is_empty());

        ConfigReflection {
            environment: self.app_env.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            feature_new_ui: self.feature_new_ui.as_deref() == Some("true"),
            external_api_url: self
                .external_api_url
                .clone()
                .unwrap_or_else(|| NOT_SET.to_string()),
            max_items: parse_leading_int(&self.max_items),
            database_path: self.db_path.clone().unwrap_or_else(|| NOT_SET.to_string()),
            has_api_key: api_key.is_some(),
            // Length in UTF-16 code units, as a browser would count it
            api_key_length: api_key.map(|key| key.encode_utf16().count()).unwrap_or(0),
        }
    }
}

/// Environment settings as exposed over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigReflection {
    pub environment: String,
    pub feature_new_ui: bool,
    pub external_api_url: String,
    /// `None` (serialized as `null`) when `MAX_ITEMS` has no leading integer
    pub max_items: Option<i64>,
    pub database_path: String,
    pub has_api_key: bool,
    pub api_key_length: usize,
}

/// Parse the integer prefix of a string, ignoring leading whitespace and any
/// trailing garbage ("42abc" -> 42). Returns `None` when there are no digits.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok().map(|n| sign * n)
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read environment: {0}")]
    Env(#[from] envconfig::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(vars: &[(&str, &str)]) -> AppConfig {
        let map = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_map(&map).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = config_with(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origin, "*");
        assert_eq!(config.database_file(), PathBuf::from("data").join("app.db"));
        assert_eq!(config.version(), env!("CARGO_PKG_VERSION"));
        assert_eq!(config.pod_name(), "unknown");
        assert_eq!(config.work_mode, WorkMode::Blocking);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_listen_addr() {
        let config = config_with(&[("HOST", "127.0.0.1"), ("PORT", "9090")]);
        assert_eq!(config.listen_addr().unwrap().to_string(), "127.0.0.1:9090");
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let mut map = HashMap::new();
        map.insert("PORT".to_string(), "eighty".to_string());
        assert!(AppConfig::from_map(&map).is_err());
    }

    #[test]
    fn test_reflection_defaults() {
        let reflection = config_with(&[]).reflection();
        assert_eq!(
            reflection,
            ConfigReflection {
                environment: "unknown".to_string(),
                feature_new_ui: false,
                external_api_url: "not-set".to_string(),
                max_items: Some(100),
                database_path: "not-set".to_string(),
                has_api_key: false,
                api_key_length: 0,
            }
        );
    }

    #[test]
    fn test_reflection_redacts_api_key() {
        let reflection = config_with(&[("API_KEY", "s3cr3t-value")]).reflection();
        assert!(reflection.has_api_key);
        assert_eq!(reflection.api_key_length, 12);

        let json = serde_json::to_string(&reflection).unwrap();
        assert!(!json.contains("s3cr3t"));
    }

    #[test]
    fn test_reflection_empty_api_key_is_absent() {
        let reflection = config_with(&[("API_KEY", "")]).reflection();
        assert!(!reflection.has_api_key);
        assert_eq!(reflection.api_key_length, 0);
    }

    #[test]
    fn test_feature_flag_requires_exact_true() {
        assert!(config_with(&[("FEATURE_NEW_UI", "true")]).reflection().feature_new_ui);
        assert!(!config_with(&[("FEATURE_NEW_UI", "TRUE")]).reflection().feature_new_ui);
        assert!(!config_with(&[("FEATURE_NEW_UI", "1")]).reflection().feature_new_ui);
    }

    #[test]
    fn test_reflection_passes_through_strings() {
        let reflection = config_with(&[
            ("APP_ENV", "staging"),
            ("EXTERNAL_API_URL", "https://api.example.com"),
            ("DB_PATH", "/var/lib/app/app.db"),
        ])
        .reflection();
        assert_eq!(reflection.environment, "staging");
        assert_eq!(reflection.external_api_url, "https://api.example.com");
        assert_eq!(reflection.database_path, "/var/lib/app/app.db");
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("250"), Some(250));
        assert_eq!(parse_leading_int("  42abc"), Some(42));
        assert_eq!(parse_leading_int("-7"), Some(-7));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
    }

    #[test]
    fn test_max_items_without_digits_is_null() {
        let reflection = config_with(&[("MAX_ITEMS", "lots")]).reflection();
        assert_eq!(reflection.max_items, None);
        let json = serde_json::to_value(&reflection).unwrap();
        assert!(json["max_items"].is_null());
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!(" Text ".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
