#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for arcdl
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/arcdl/config.toml)
//! - Environment variables (`ARCDL_*`)
//! - CLI flags (applied by the binary)

use arcdl_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub extract: ExtractConfig,

    #[serde(default)]
    pub launcher: LauncherConfig,

    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub serve: ServeConfig,
}

/// When to colorize terminal output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    Always,
    #[default]
    Auto,
    Never,
}

impl clap::ValueEnum for ColorChoice {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Always, Self::Auto, Self::Never]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Always => clap::builder::PossibleValue::new("always"),
            Self::Auto => clap::builder::PossibleValue::new("auto"),
            Self::Never => clap::builder::PossibleValue::new("never"),
        })
    }
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralConfig {
    #[serde(default)]
    pub color: ColorChoice,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64, // seconds
    #[serde(default = "default_read_timeout")]
    pub read_timeout: u64, // seconds, per chunk
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_max_secs")]
    pub backoff_max_secs: u64,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExtractConfig {
    #[serde(default)]
    pub overwrite: bool,
}

/// Desktop launcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LauncherConfig {
    #[serde(default = "default_launcher_enabled")]
    pub enabled: bool,
    pub desktop_dir: Option<PathBuf>,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub download_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
}

/// File-serving configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServeConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

// Default implementations

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            read_timeout: default_read_timeout(),
            retry_attempts: default_retry_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_secs: default_backoff_max_secs(),
            chunk_size: default_chunk_size(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            enabled: default_launcher_enabled(),
            desktop_dir: None,
        }
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

// Default value functions for serde
fn default_connect_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    30
}

fn default_retry_attempts() -> u32 {
    4 // first try plus three retries
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_backoff_max_secs() -> u64 {
    30
}

fn default_chunk_size() -> usize {
    256 * 1024
}

fn default_user_agent() -> String {
    format!("arcdl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_launcher_enabled() -> bool {
    true
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

impl NetworkConfig {
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout)
    }

    #[must_use]
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    #[must_use]
    pub fn backoff_max(&self) -> Duration {
        Duration::from_secs(self.backoff_max_secs)
    }
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("arcdl").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            tracing::debug!(path = %config_path.display(), "loading configuration");
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// If path is provided, loads from that file.
    /// If path is None, uses the default loading behavior.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Reject values that would make transfers impossible
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending field.
    pub fn validate(&self) -> Result<(), Error> {
        if self.network.retry_attempts == 0 {
            return Err(invalid("network.retry_attempts", "0"));
        }
        if self.network.chunk_size == 0 {
            return Err(invalid("network.chunk_size", "0"));
        }
        if self.network.read_timeout == 0 {
            return Err(invalid("network.read_timeout", "0"));
        }
        Ok(())
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // ARCDL_COLOR
        if let Ok(color) = std::env::var("ARCDL_COLOR") {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => return Err(invalid("ARCDL_COLOR", &color)),
            };
        }

        if let Some(v) = env_parse("ARCDL_CONNECT_TIMEOUT")? {
            self.network.connect_timeout = v;
        }
        if let Some(v) = env_parse("ARCDL_READ_TIMEOUT")? {
            self.network.read_timeout = v;
        }
        if let Some(v) = env_parse("ARCDL_RETRY_ATTEMPTS")? {
            self.network.retry_attempts = v;
        }
        if let Some(v) = env_parse("ARCDL_CHUNK_SIZE")? {
            self.network.chunk_size = v;
        }
        if let Ok(agent) = std::env::var("ARCDL_USER_AGENT") {
            self.network.user_agent = agent;
        }

        // ARCDL_OVERWRITE
        if let Ok(overwrite) = std::env::var("ARCDL_OVERWRITE") {
            self.extract.overwrite = parse_bool("ARCDL_OVERWRITE", &overwrite)?;
        }

        // ARCDL_LAUNCHER
        if let Ok(enabled) = std::env::var("ARCDL_LAUNCHER") {
            self.launcher.enabled = parse_bool("ARCDL_LAUNCHER", &enabled)?;
        }
        if let Ok(dir) = std::env::var("ARCDL_DESKTOP_DIR") {
            self.launcher.desktop_dir = Some(PathBuf::from(dir));
        }

        if let Ok(dir) = std::env::var("ARCDL_DOWNLOAD_DIR") {
            self.paths.download_dir = Some(PathBuf::from(dir));
        }
        if let Ok(dir) = std::env::var("ARCDL_LOG_DIR") {
            self.paths.log_dir = Some(PathBuf::from(dir));
        }

        if let Ok(bind) = std::env::var("ARCDL_BIND") {
            self.serve.bind = bind;
        }

        self.validate()
    }

    /// Directory downloads land in when no destination is given
    #[must_use]
    pub fn download_dir(&self) -> PathBuf {
        self.paths
            .download_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("downloads"))
    }

    /// Directory for debug log files
    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.paths.log_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("arcdl")
                .join("logs")
        })
    }
}

fn invalid(field: &str, value: &str) -> Error {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>, Error> {
    match std::env::var(name) {
        Ok(raw) => raw.parse().map(Some).map_err(|_| invalid(name, &raw)),
        Err(_) => Ok(None),
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, Error> {
    match value {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(invalid(field, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.network.retry_attempts, 4);
        assert_eq!(config.network.chunk_size, 256 * 1024);
        assert_eq!(config.network.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.network.read_timeout(), Duration::from_secs(30));
        assert!(!config.extract.overwrite);
        assert!(config.launcher.enabled);
        assert_eq!(config.serve.bind, "127.0.0.1:5000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.network.backoff_base(), Duration::from_millis(500));
        assert_eq!(config.general.color, ColorChoice::Auto);
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = Config::default();
        config.network.retry_attempts = 0;
        assert!(matches!(
            config.validate(),
            Err(Error::Config(ConfigError::InvalidValue { .. }))
        ));
    }
}
