//! Configuration loading for the balance client.
//!
//! Every field is required except the credentials, the refresh interval and
//! the feature-flag payloads. Missing credentials are legal: the controller
//! simply stays unbound.

use crate::controller::ControllerConfig;
use ninja_core::CredentialKey;
use ninja_storage::CacheScope;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "NINJA_CONFIG";
/// Overrides `api_base_url` from the file.
pub const API_BASE_URL_ENV: &str = "NINJA_API_BASE_URL";
/// Overrides `api_key` from the file.
pub const API_KEY_ENV: &str = "NINJA_API_KEY";

const PRODUCTION_API_HOST: &str = "api.prod.myninja.ai";
const PUBLIC_API_HOST: &str = "api.myninja.ai";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
    pub freshness_window_ms: u64,
    pub cache_scope: CacheScope,
    pub refresh_interval_ms: Option<u64>,
    pub log_filter: String,
    #[serde(default)]
    pub feature_payloads: HashMap<String, serde_json::Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or NINJA_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ClientConfig {
    /// Load from `--config` or `NINJA_CONFIG`, apply environment overrides
    /// and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let mut config = Self::from_path(&path)?;
        config.apply_overrides(
            std::env::var(API_BASE_URL_ENV).ok(),
            std::env::var(API_KEY_ENV).ok(),
        );
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut config: ClientConfig = toml::from_str(contents)?;
        config.api_base_url = config.api_base_url.map(|url| normalize_api_base_url(&url));
        Ok(config)
    }

    /// Non-empty override values replace the file's credentials.
    pub fn apply_overrides(&mut self, api_base_url: Option<String>, api_key: Option<String>) {
        if let Some(url) = api_base_url.filter(|v| !v.trim().is_empty()) {
            self.api_base_url = Some(normalize_api_base_url(&url));
        }
        if let Some(key) = api_key.filter(|v| !v.trim().is_empty()) {
            self.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.freshness_window_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "freshness_window_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.refresh_interval_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "refresh_interval_ms",
                reason: "must be > 0 when set".to_string(),
            });
        }
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "log_filter",
                reason: "must not be empty".to_string(),
            });
        }
        if let Some(url) = self.api_base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            let parsed = reqwest::Url::parse(url).map_err(|e| ConfigError::InvalidValue {
                field: "api_base_url",
                reason: e.to_string(),
            })?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(ConfigError::InvalidValue {
                    field: "api_base_url",
                    reason: "scheme must be http or https".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Credentials to bind, if both parts are present.
    pub fn credentials(&self) -> Option<CredentialKey> {
        CredentialKey::from_parts(self.api_base_url.as_deref(), self.api_key.as_deref())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval_ms.map(Duration::from_millis)
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig::new()
            .with_freshness_window(Duration::from_millis(self.freshness_window_ms))
            .with_cache_scope(self.cache_scope)
    }
}

/// Point production API hosts at the public domain.
pub fn normalize_api_base_url(url: &str) -> String {
    url.trim().replace(PRODUCTION_API_HOST, PUBLIC_API_HOST)
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}
