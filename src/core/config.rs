//! Configuration for the impact stories service
//!
//! Values come from, in increasing precedence: built-in defaults, a TOML
//! file, `STORIES_*` environment variables and command line flags.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::core::error::{Error, Result};
use crate::storage::StoreOptions;

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "stories.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP server bind address
    pub http_addr: SocketAddr,

    /// Origins allowed by CORS; `"*"` allows any origin
    pub cors_origins: Vec<String>,

    /// Include internal error details (file paths, I/O messages) in 500 responses.
    /// Development only.
    pub expose_error_details: bool,
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON document holding all stories
    pub data_file: PathBuf,

    /// Fail on malformed documents instead of treating them as empty
    pub strict: bool,

    /// Milliseconds to wait for exclusive access (0 = wait forever)
    pub lock_timeout_ms: u64,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directives, e.g. `info` or `impact_stories=debug`
    pub level: String,

    /// Log format (pretty, json)
    pub format: LogFormat,
}

/// Metrics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Collect store metrics and serve them at `/metrics`
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            cors_origins: vec!["*".to_string()],
            expose_error_details: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("./data/stories.json"),
            strict: false,
            lock_timeout_ms: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl StorageConfig {
    /// Store options derived from this configuration
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            strict: self.strict,
            lock_timeout: (self.lock_timeout_ms > 0)
                .then(|| Duration::from_millis(self.lock_timeout_ms)),
        }
    }
}

impl Config {
    /// Load configuration: the given file (which must exist), otherwise
    /// `stories.toml` when present, otherwise defaults. Environment overrides
    /// are applied and the result validated.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE)?,
            None => Self::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        debug!("Read configuration from {}", path.display());
        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))
    }

    /// Apply `STORIES_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup. `lookup` receives the environment
    /// variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("STORIES_HTTP_ADDR") {
            self.server.http_addr = addr
                .parse()
                .map_err(|e| Error::config(format!("Invalid HTTP address: {}", e)))?;
        }

        if let Some(origins) = lookup("STORIES_CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(expose) = lookup("STORIES_EXPOSE_ERRORS") {
            self.server.expose_error_details = parse_flag("STORIES_EXPOSE_ERRORS", &expose)?;
        }

        if let Some(data_file) = lookup("STORIES_DATA_FILE") {
            self.storage.data_file = PathBuf::from(data_file);
        }

        if let Some(strict) = lookup("STORIES_STRICT") {
            self.storage.strict = parse_flag("STORIES_STRICT", &strict)?;
        }

        if let Some(timeout) = lookup("STORIES_LOCK_TIMEOUT_MS") {
            self.storage.lock_timeout_ms = timeout
                .parse()
                .map_err(|e| Error::config(format!("Invalid lock timeout: {}", e)))?;
        }

        if let Some(level) = lookup("STORIES_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(format) = lookup("STORIES_LOG_FORMAT") {
            self.logging.format = match format.to_ascii_lowercase().as_str() {
                "pretty" => LogFormat::Pretty,
                "json" => LogFormat::Json,
                other => return Err(Error::config(format!("Invalid log format: {}", other))),
            };
        }

        if let Some(enabled) = lookup("STORIES_METRICS") {
            self.metrics.enabled = parse_flag("STORIES_METRICS", &enabled)?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.storage.data_file.to_string_lossy().trim().is_empty() {
            return Err(Error::config("storage.data_file must not be empty"));
        }

        if self.server.cors_origins.is_empty() {
            return Err(Error::config("server.cors_origins must list at least one origin"));
        }

        if self.logging.level.trim().is_empty() {
            return Err(Error::config("logging.level must not be empty"));
        }
        EnvFilter::try_new(&self.logging.level).map_err(|e| {
            Error::config(format!("Invalid log level {}: {}", self.logging.level, e))
        })?;

        Ok(())
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &str) -> Result<Config> {
    Config::from_file(path)
}

/// Load configuration from a file, falling back to defaults if the file
/// cannot be read or parsed. Environment overrides are applied either way.
pub fn load_config_or_default(path: Option<&str>) -> Config {
    let mut config = match path {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load config from {}: {}. Using defaults.", path, e);
                Config::default()
            }
        },
        None => Config::default(),
    };

    if let Err(e) = config.apply_env_overrides() {
        warn!("Ignoring environment overrides: {}", e);
    }
    config
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::config(format!("Invalid boolean for {}: {}", key, value))),
    }
}
