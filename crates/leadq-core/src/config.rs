//! Configuration module for LeadQ.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ports::WireShape;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for LeadQ.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: EndpointConfig,
    pub queue: QueueConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Remote endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// URL the lead payloads are POSTed to.
    pub url: String,
    /// Body shape: `array` (single-element array) or `object`.
    pub wire_shape: WireShape,
    /// Upper bound for one delivery attempt, in seconds.
    pub timeout_secs: u64,
}

/// Local queue settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Failed drain attempts before a record is marked `Failed`.
    pub retry_budget: u32,
    /// Pause between two records of one drain pass, in milliseconds.
    pub drain_delay_ms: u64,
    /// Path of the SQLite database holding the queue.
    pub database: PathBuf,
}

/// Background drain settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between periodic drains.
    pub drain_interval_secs: u64,
    /// Seconds to wait after startup before the first drain.
    pub startup_delay_secs: u64,
    /// Seconds between connectivity probes. `0` disables probing.
    pub probe_interval_secs: u64,
    /// URL used by the connectivity probe. Falls back to `endpoint.url`.
    pub probe_url: Option<String>,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Output format: `pretty` or `json`.
    pub format: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/leadq/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("leadq")
            .join("config.yaml")
    }

    /// URL the connectivity probe should hit.
    pub fn probe_url(&self) -> &str {
        self.sync
            .probe_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(&self.endpoint.url)
    }

    /// True when periodic connectivity probing is enabled.
    pub fn probing_enabled(&self) -> bool {
        self.sync.probe_interval_secs > 0
    }
}

impl EndpointConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl QueueConfig {
    pub fn drain_delay(&self) -> Duration {
        Duration::from_millis(self.drain_delay_ms)
    }
}

impl SyncConfig {
    pub fn drain_interval(&self) -> Duration {
        Duration::from_secs(self.drain_interval_secs)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            wire_shape: WireShape::Array,
            timeout_secs: 15,
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("leadq");
        Self {
            retry_budget: 3,
            drain_delay_ms: 1000,
            database: data_dir.join("leadq.db"),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            drain_interval_secs: 60,
            startup_delay_secs: 3,
            probe_interval_secs: 30,
            probe_url: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"queue.retry_budget"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `logging.format`.
const VALID_LOG_FORMATS: &[&str] = &["pretty", "json"];

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- endpoint ---
        if self.endpoint.url.trim().is_empty() {
            errors.push(ValidationError {
                field: "endpoint.url".into(),
                message: "must be set".into(),
            });
        } else if !is_http_url(&self.endpoint.url) {
            errors.push(ValidationError {
                field: "endpoint.url".into(),
                message: format!("not an http(s) URL: {}", self.endpoint.url),
            });
        }
        if self.endpoint.timeout_secs == 0 {
            errors.push(ValidationError {
                field: "endpoint.timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- queue ---
        if self.queue.retry_budget == 0 {
            errors.push(ValidationError {
                field: "queue.retry_budget".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.queue.database.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "queue.database".into(),
                message: "must be set".into(),
            });
        }

        // --- sync ---
        if self.sync.drain_interval_secs == 0 {
            errors.push(ValidationError {
                field: "sync.drain_interval_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if let Some(url) = self.sync.probe_url.as_deref() {
            if !url.is_empty() && !is_http_url(url) {
                errors.push(ValidationError {
                    field: "sync.probe_url".into(),
                    message: format!("not an http(s) URL: {}", url),
                });
            }
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }
        if !VALID_LOG_FORMATS.contains(&self.logging.format.as_str()) {
            errors.push(ValidationError {
                field: "logging.format".into(),
                message: format!(
                    "invalid format '{}'; valid options: {}",
                    self.logging.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use leadq_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .endpoint_url("https://sheets.example.com/api/leads")
///     .queue_retry_budget(5)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- endpoint ---

    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint.url = url.into();
        self
    }

    pub fn endpoint_wire_shape(mut self, shape: WireShape) -> Self {
        self.config.endpoint.wire_shape = shape;
        self
    }

    pub fn endpoint_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.endpoint.timeout_secs = seconds;
        self
    }

    // --- queue ---

    pub fn queue_retry_budget(mut self, budget: u32) -> Self {
        self.config.queue.retry_budget = budget;
        self
    }

    pub fn queue_drain_delay_ms(mut self, millis: u64) -> Self {
        self.config.queue.drain_delay_ms = millis;
        self
    }

    pub fn queue_database(mut self, path: PathBuf) -> Self {
        self.config.queue.database = path;
        self
    }

    // --- sync ---

    pub fn sync_drain_interval_secs(mut self, seconds: u64) -> Self {
        self.config.sync.drain_interval_secs = seconds;
        self
    }

    pub fn sync_startup_delay_secs(mut self, seconds: u64) -> Self {
        self.config.sync.startup_delay_secs = seconds;
        self
    }

    pub fn sync_probe_interval_secs(mut self, seconds: u64) -> Self {
        self.config.sync.probe_interval_secs = seconds;
        self
    }

    pub fn sync_probe_url(mut self, url: impl Into<String>) -> Self {
        self.config.sync.probe_url = Some(url.into());
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
