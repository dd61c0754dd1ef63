//! Configuration loading for the Toast gateway.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `TOAST_GATEWAY_`, producing a typed [`AppConfig`].

use std::{collections::BTreeMap, env, net::SocketAddr, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const ENV_PREFIX: &str = "TOAST_GATEWAY_";

/// Toast sandbox API host.
pub const TOAST_SANDBOX_API_BASE: &str = "https://ws-sandbox-api.eng.toasttab.com";
/// Toast production API host.
pub const TOAST_PRODUCTION_API_BASE: &str = "https://ws-api.toasttab.com";

/// Vendor environment the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastEnvironment {
    Sandbox,
    Production,
}

impl ToastEnvironment {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Some(ToastEnvironment::Sandbox),
            "production" | "prod" => Some(ToastEnvironment::Production),
            _ => None,
        }
    }

    pub fn default_api_base(&self) -> &'static str {
        match self {
            ToastEnvironment::Sandbox => TOAST_SANDBOX_API_BASE,
            ToastEnvironment::Production => TOAST_PRODUCTION_API_BASE,
        }
    }
}

/// Application configuration derived from `TOAST_GATEWAY_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_api_bind_addr")]
    pub api_bind_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_acquire_timeout_ms")]
    pub db_acquire_timeout_ms: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operator_tokens: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crypto_key: Option<Vec<u8>>,
    #[serde(default)]
    pub toast: ToastConfig,
    #[serde(default)]
    pub menu_sync: MenuSyncConfig,
}

/// Vendor API settings injected into the client at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ToastConfig {
    #[serde(default = "default_toast_environment")]
    pub environment: ToastEnvironment,
    /// Explicit base URL; wins over the environment switch when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default = "default_toast_http_timeout_seconds")]
    pub http_timeout_seconds: u64,
    #[serde(default = "default_toast_user_access_type")]
    pub user_access_type: String,
    /// Source tag stamped on pushed orders.
    #[serde(default = "default_order_source")]
    pub order_source: String,
    /// Fulfillment offset used when an order has no requested pickup time.
    #[serde(default = "default_order_fulfillment_minutes")]
    pub default_fulfillment_minutes: u32,
}

impl ToastConfig {
    /// Resolved vendor base URL without a trailing slash.
    pub fn api_base(&self) -> String {
        self.api_base
            .as_deref()
            .filter(|base| !base.trim().is_empty())
            .unwrap_or_else(|| self.environment.default_api_base())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=120).contains(&self.http_timeout_seconds) {
            return Err(ConfigError::InvalidToastTimeout {
                value: self.http_timeout_seconds,
            });
        }

        if self.default_fulfillment_minutes == 0 {
            return Err(ConfigError::InvalidFulfillmentMinutes);
        }

        if let Some(base) = self.api_base.as_deref() {
            url::Url::parse(base).map_err(|e| ConfigError::InvalidToastApiBase {
                value: base.to_string(),
                error: e.to_string(),
            })?;
        }

        Ok(())
    }
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            environment: default_toast_environment(),
            api_base: None,
            http_timeout_seconds: default_toast_http_timeout_seconds(),
            user_access_type: default_toast_user_access_type(),
            order_source: default_order_source(),
            default_fulfillment_minutes: default_order_fulfillment_minutes(),
        }
    }
}

/// Background menu sync scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct MenuSyncConfig {
    #[serde(default = "default_menu_sync_enabled")]
    pub enabled: bool,
    #[serde(default = "default_menu_sync_interval_seconds")]
    pub interval_seconds: u64,
}

impl MenuSyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_seconds < 300 {
            return Err(ConfigError::InvalidMenuSyncInterval {
                value: self.interval_seconds,
            });
        }
        Ok(())
    }
}

impl Default for MenuSyncConfig {
    fn default() -> Self {
        Self {
            enabled: default_menu_sync_enabled(),
            interval_seconds: default_menu_sync_interval_seconds(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            api_bind_addr: default_api_bind_addr(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            database_url: default_database_url(),
            db_max_connections: default_db_max_connections(),
            db_acquire_timeout_ms: default_db_acquire_timeout_ms(),
            operator_tokens: Vec::new(),
            crypto_key: None,
            toast: ToastConfig::default(),
            menu_sync: MenuSyncConfig::default(),
        }
    }
}

impl AppConfig {
    /// Returns the configured bind address as a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.api_bind_addr.parse()
    }

    /// Returns a redacted JSON representation (secrets are redacted).
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut config = self.clone();

        if !config.operator_tokens.is_empty() {
            config.operator_tokens = vec!["[REDACTED]".to_string()];
        }

        if config.crypto_key.is_some() {
            config.crypto_key = Some(b"[REDACTED]".to_vec());
        }

        // Credentials may be embedded in the connection string.
        if config.database_url.contains('@') {
            config.database_url = "[REDACTED]".to_string();
        }

        serde_json::to_string_pretty(&config)
    }

    /// Validates the configuration, returning an error if required settings are missing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.crypto_key {
            Some(ref key) if key.len() != 32 => {
                return Err(ConfigError::InvalidCryptoKeyLength { length: key.len() });
            }
            Some(_) => {}
            None => return Err(ConfigError::MissingCryptoKey),
        }

        if self.operator_tokens.is_empty() {
            return Err(ConfigError::MissingOperatorTokens);
        }

        self.toast.validate()?;
        self.menu_sync.validate()?;

        Ok(())
    }
}

fn default_profile() -> String {
    "local".to_string()
}

fn default_api_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_database_url() -> String {
    "postgresql://localhost:5432/toast_gateway".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_acquire_timeout_ms() -> u64 {
    5000
}

fn default_toast_environment() -> ToastEnvironment {
    ToastEnvironment::Sandbox
}

fn default_toast_http_timeout_seconds() -> u64 {
    30
}

fn default_toast_user_access_type() -> String {
    "TOAST_MACHINE_CLIENT".to_string()
}

fn default_order_source() -> String {
    "VoiceAgent".to_string()
}

fn default_order_fulfillment_minutes() -> u32 {
    30
}

fn default_menu_sync_enabled() -> bool {
    true
}

fn default_menu_sync_interval_seconds() -> u64 {
    3600 // hourly
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid api bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error(
        "no operator tokens configured; set TOAST_GATEWAY_OPERATOR_TOKEN or TOAST_GATEWAY_OPERATOR_TOKENS"
    )]
    MissingOperatorTokens,
    #[error("crypto key is missing; set TOAST_GATEWAY_CRYPTO_KEY environment variable")]
    MissingCryptoKey,
    #[error("crypto key is invalid base64: {error}")]
    InvalidCryptoKeyBase64 { error: String },
    #[error("crypto key must decode to exactly 32 bytes, got {length} bytes")]
    InvalidCryptoKeyLength { length: usize },
    #[error("unknown Toast environment '{value}'; expected sandbox or production")]
    InvalidToastEnvironment { value: String },
    #[error("invalid Toast API base '{value}': {error}")]
    InvalidToastApiBase { value: String, error: String },
    #[error("Toast HTTP timeout must be between 1 and 120 seconds, got {value}")]
    InvalidToastTimeout { value: u64 },
    #[error("default fulfillment minutes must be positive")]
    InvalidFulfillmentMinutes,
    #[error("menu sync interval must be at least 300 seconds, got {value}")]
    InvalidMenuSyncInterval { value: u64 },
}

/// Loads configuration using layered `.env` files and `TOAST_GATEWAY_*` env vars.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads, validates and returns the configuration.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        // Overlay process environment last so it wins.
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layered.insert(stripped.to_string(), value);
            }
        }

        let profile = layered
            .remove("PROFILE")
            .filter(|v| !v.is_empty())
            .unwrap_or(profile_hint);

        let api_bind_addr = layered
            .remove("API_BIND_ADDR")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_api_bind_addr);

        let log_level = layered
            .remove("LOG_LEVEL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_level);

        let log_format = layered
            .remove("LOG_FORMAT")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_format);

        let database_url = layered
            .remove("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_database_url);

        let db_max_connections = layered
            .remove("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_db_max_connections);

        let db_acquire_timeout_ms = layered
            .remove("DB_ACQUIRE_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_db_acquire_timeout_ms);

        // Single token or comma-separated list
        let operator_tokens = if let Some(tokens) = layered.remove("OPERATOR_TOKENS") {
            split_list(&tokens)
        } else if let Some(token) = layered.remove("OPERATOR_TOKEN") {
            split_list(&token)
        } else {
            Vec::new()
        };

        let crypto_key = match layered.remove("CRYPTO_KEY").filter(|v| !v.is_empty()) {
            Some(key_str) => {
                use base64::{Engine as _, engine::general_purpose};
                Some(general_purpose::STANDARD.decode(key_str.trim()).map_err(|e| {
                    ConfigError::InvalidCryptoKeyBase64 {
                        error: e.to_string(),
                    }
                })?)
            }
            None => None,
        };

        let environment = match layered.remove("TOAST_ENVIRONMENT").filter(|v| !v.is_empty()) {
            Some(value) => ToastEnvironment::parse(&value)
                .ok_or(ConfigError::InvalidToastEnvironment { value })?,
            None => default_toast_environment(),
        };

        let api_base = layered
            .remove("TOAST_API_BASE")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let http_timeout_seconds = layered
            .remove("TOAST_HTTP_TIMEOUT_SECONDS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_toast_http_timeout_seconds);

        let user_access_type = layered
            .remove("TOAST_USER_ACCESS_TYPE")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_toast_user_access_type);

        let order_source = layered
            .remove("ORDER_SOURCE")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_order_source);

        let default_fulfillment_minutes = layered
            .remove("ORDER_DEFAULT_FULFILLMENT_MINUTES")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_order_fulfillment_minutes);

        let menu_sync_enabled = layered
            .remove("MENU_SYNC_ENABLED")
            .and_then(|v| parse_bool(&v))
            .unwrap_or_else(default_menu_sync_enabled);

        let menu_sync_interval_seconds = layered
            .remove("MENU_SYNC_INTERVAL_SECONDS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_menu_sync_interval_seconds);

        let config = AppConfig {
            profile,
            api_bind_addr,
            log_level,
            log_format,
            database_url,
            db_max_connections,
            db_acquire_timeout_ms,
            operator_tokens,
            crypto_key,
            toast: ToastConfig {
                environment,
                api_base,
                http_timeout_seconds,
                user_access_type,
                order_source,
                default_fulfillment_minutes,
            },
            menu_sync: MenuSyncConfig {
                enabled: menu_sync_enabled,
                interval_seconds: menu_sync_interval_seconds,
            },
        };

        config.validate()?;

        match config.bind_addr() {
            Ok(_) => Ok(config),
            Err(source) => Err(ConfigError::InvalidBindAddr {
                value: config.api_bind_addr.clone(),
                source,
            }),
        }
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var(format!("{ENV_PREFIX}PROFILE"))
            .ok()
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(source) => Err(ConfigError::EnvFile { path, source }),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            operator_tokens: vec!["operator".to_string()],
            crypto_key: Some(vec![0u8; 32]),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_default_config_requires_secrets() {
        assert!(matches!(
            AppConfig::default().validate(),
            Err(ConfigError::MissingCryptoKey)
        ));

        let config = AppConfig {
            crypto_key: Some(vec![0u8; 32]),
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingOperatorTokens)
        ));

        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_toast_timeout_bounds() {
        let mut config = valid_config();
        config.toast.http_timeout_seconds = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidToastTimeout { value: 0 })
        ));

        config.toast.http_timeout_seconds = 121;
        assert!(config.validate().is_err());

        config.toast.http_timeout_seconds = 120;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_menu_sync_interval_floor() {
        let mut config = valid_config();
        config.menu_sync.interval_seconds = 60;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMenuSyncInterval { value: 60 })
        ));
    }

    #[test]
    fn test_api_base_resolution() {
        let mut toast = ToastConfig::default();
        assert_eq!(toast.api_base(), TOAST_SANDBOX_API_BASE);

        toast.environment = ToastEnvironment::Production;
        assert_eq!(toast.api_base(), TOAST_PRODUCTION_API_BASE);

        toast.api_base = Some("http://127.0.0.1:9999/".to_string());
        assert_eq!(toast.api_base(), "http://127.0.0.1:9999");
    }

    #[test]
    fn test_redacted_json_hides_secrets() {
        let mut config = valid_config();
        config.database_url = "postgresql://user:pw@db:5432/toast".to_string();
        let json = config.redacted_json().unwrap();

        assert!(!json.contains("operator\""));
        assert!(!json.contains("user:pw"));
        assert!(json.contains("[REDACTED]"));
    }

    #[test]
    fn test_parse_bool_variants() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
