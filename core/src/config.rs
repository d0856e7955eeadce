use crate::errors::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "edutrack";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8081";

pub const ENV_API_URL: &str = "EDUTRACK_API_URL";
pub const ENV_SESSION_FILE: &str = "EDUTRACK_SESSION_FILE";
pub const ENV_LOG_LEVEL: &str = "EDUTRACK_LOG_LEVEL";

/// Back-end API settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    /// Per-request timeout. Requests are unbounded when unset or zero.
    pub timeout_secs: Option<u64>,
}

/// Where the session record lives
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct SessionConfig {
    pub path: Option<PathBuf>,
}

/// Configuration for the EDU Track client
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EduTrackConfig {
    pub log_level: Option<String>,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl Default for EduTrackConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: Some(DEFAULT_BASE_URL.to_string()),
                timeout_secs: None,
            },
            session: SessionConfig { path: None },
            log_level: Some("info".to_string()),
        }
    }
}

impl EduTrackConfig {
    /// Loads configuration from a file if it exists, otherwise returns the default config
    pub fn load_from_file(path: &Path) -> ApiResult<Self> {
        if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                ApiError::ConfigError(format!("Failed to read config file: {}", e))
            })?;

            let config: Self = toml::from_str(&content).map_err(|e| {
                ApiError::ConfigError(format!("Failed to parse config file: {}", e))
            })?;

            Ok(Self::default().merge(&config))
        } else {
            Ok(Self::default())
        }
    }

    /// Saves configuration to a file
    pub fn save_to_file(&self, path: &Path) -> ApiResult<()> {
        let content = toml::to_string(self).map_err(|e| {
            ApiError::ConfigError(format!("Failed to serialize config: {}", e))
        })?;

        // Ensure the directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ApiError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        fs::write(path, content).map_err(|e| {
            ApiError::ConfigError(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Merges this config with another config, preferring values from the other config if present
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            api: ApiConfig {
                base_url: other
                    .api
                    .base_url
                    .clone()
                    .or_else(|| self.api.base_url.clone()),
                timeout_secs: other.api.timeout_secs.or(self.api.timeout_secs),
            },
            session: SessionConfig {
                path: other
                    .session
                    .path
                    .clone()
                    .or_else(|| self.session.path.clone()),
            },
            log_level: other.log_level.clone().or_else(|| self.log_level.clone()),
        }
    }

    /// Applies `EDUTRACK_*` overrides read through `lookup`.
    ///
    /// Takes the lookup as a function so callers can pass `std::env::var`
    /// and tests can pass a fixed map.
    pub fn apply_env<F>(&self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_env = Self {
            api: ApiConfig {
                base_url: lookup(ENV_API_URL),
                timeout_secs: None,
            },
            session: SessionConfig {
                path: lookup(ENV_SESSION_FILE).map(PathBuf::from),
            },
            log_level: lookup(ENV_LOG_LEVEL),
        };
        self.merge(&from_env)
    }

    pub fn base_url(&self) -> &str {
        self.api.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Request timeout; unset or `0` means requests are unbounded
    pub fn timeout(&self) -> Option<Duration> {
        self.api
            .timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Session file path, falling back to `<config dir>/session.json`
    pub fn session_path(&self) -> ApiResult<PathBuf> {
        match &self.session.path {
            Some(path) => Ok(path.clone()),
            None => Ok(get_default_config_dir(APP_NAME)?.join("session.json")),
        }
    }
}

/// Helper function to get default config directory
pub fn get_default_config_dir(app_name: &str) -> ApiResult<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| {
        ApiError::ConfigError("Could not determine home directory".to_string())
    })?;

    let config_dir = home_dir.join(".config").join(app_name);

    Ok(config_dir)
}

/// Helper function to get default config file path
pub fn get_default_config_file(app_name: &str) -> ApiResult<PathBuf> {
    let config_dir = get_default_config_dir(app_name)?;
    Ok(config_dir.join("config.toml"))
}
