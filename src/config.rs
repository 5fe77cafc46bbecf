//! Configuration Management Module
//!
//! This module handles loading the CLI settings: the management API location,
//! request timeout and the retry policy for authentication failures.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{KeyCliError, Result};
use crate::retry::RetryPolicy;
use crate::store::ConfigStore;

/// Environment variable naming an explicit settings file.
pub const CONFIG_PATH_ENV: &str = "APIKEY_CLI_CONFIG";
/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "APIKEY_CLI_API_URL";

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// CLI settings.
///
/// ```toml
/// [service]
/// api_url = "https://api.example.com/management/v1"
/// timeout_secs = 30
///
/// [retry]
/// max_attempts = 3
/// initial_backoff_ms = 500
/// max_backoff_ms = 5000
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Management API connection settings
    #[serde(default)]
    pub service: ServiceConfig,
    /// Retry settings for requests rejected with an expired token
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Management API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the management API
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Retry settings for recoverable authentication failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total submissions allowed, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Upper bound for the doubled delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.example.com/management/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    5000
}

impl CliConfig {
    /// Loads settings from a TOML file.
    ///
    /// Path priority: `path` argument, then `APIKEY_CLI_CONFIG`, then
    /// `config.toml` in the store directory. An explicitly named file must
    /// exist; a missing default file yields built-in defaults. `APIKEY_CLI_API_URL`
    /// overrides the URL in every case.
    ///
    /// # Arguments
    ///
    /// * `path` - Optional explicit settings file
    /// * `store` - Session store whose directory holds the default file
    ///
    /// # Returns
    ///
    /// * `Ok(CliConfig)` - Loaded and validated settings
    /// * `Err(KeyCliError::Config)` - File missing, unparsable or invalid
    pub fn load_from_path(path: Option<&str>, store: &ConfigStore) -> Result<Self> {
        let explicit = path
            .map(PathBuf::from)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(KeyCliError::Config(format!(
                        "Configuration file '{}' not found",
                        path.display()
                    )));
                }
                Self::from_file(&path)?
            }
            None => {
                let default_path = store.dir().join("config.toml");
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.is_empty() {
                config.service.api_url = url;
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            KeyCliError::Config(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            KeyCliError::Config(format!("Failed to parse '{}': {}", path.display(), e))
        })
    }

    /// Validates the settings.
    ///
    /// Checks:
    /// - The API URL is http(s)
    /// - The timeout is non-zero
    /// - At least one attempt is allowed
    /// - The initial backoff does not exceed the maximum
    pub fn validate(&self) -> Result<()> {
        let url = &self.service.api_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(KeyCliError::Config(format!(
                "api_url must start with http:// or https://, got '{}'",
                url
            )));
        }

        if self.service.timeout_secs == 0 {
            return Err(KeyCliError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(KeyCliError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(KeyCliError::Config(format!(
                "initial_backoff_ms ({}) must not exceed max_backoff_ms ({})",
                self.retry.initial_backoff_ms, self.retry.max_backoff_ms
            )));
        }

        Ok(())
    }

    /// Retry policy described by the `[retry]` section.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.initial_backoff_ms),
            Duration::from_millis(self.retry.max_backoff_ms),
        )
    }
}
