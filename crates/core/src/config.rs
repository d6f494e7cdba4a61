//! Configuration management
//!
//! Configuration is an explicit value handed to the service and signer at
//! construction; nothing is stored process-wide. `ConfigManager` loads and
//! saves it as TOML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tempurl::{DEFAULT_API_VERSION, TempUrlDigest};

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "OSTORE_CONFIG_DIR";

const CONFIG_FILE: &str = "config.toml";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API version segment, e.g. `v1`
    pub api_version: String,
    pub temp_url: TempUrlConfig,
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
            temp_url: TempUrlConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Temporary URL settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempUrlConfig {
    /// Account temp URL key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub digest: TempUrlDigest,
}

/// Backoff settings for `RetryTransport`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
        }
    }
}

impl Config {
    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        validate_api_version(&self.api_version)?;
        if self.retry.max_attempts == 0 {
            return Err(Error::Config("retry.max_attempts must be at least 1".into()));
        }
        Ok(())
    }
}

/// Check that `version` is a single path segment such as `v1`
pub fn validate_api_version(version: &str) -> Result<()> {
    let segment = version.trim_matches('/');
    if segment.is_empty() || segment.contains('/') {
        return Err(Error::Config(format!(
            "api_version must be a single path segment, got '{version}'"
        )));
    }
    Ok(())
}

/// Loads and saves the configuration file
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Use `$OSTORE_CONFIG_DIR/config.toml`, falling back to the platform
    /// config directory
    pub fn new() -> Result<Self> {
        let dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("Could not determine config directory".into()))?
                .join("ostore"),
        };
        Ok(Self::with_path(dir.join(CONFIG_FILE)))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the configuration; a missing file yields defaults
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}
