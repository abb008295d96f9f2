//! Config command - View and manage LeadQ configuration
//!
//! Provides the `leadq config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Sets individual configuration values via dot-notation keys
//! 3. Validates the configuration file and reports errors

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use leadq_core::config::Config;
use leadq_core::ports::WireShape;
use tracing::info;

use super::load_config;
use crate::output::{get_formatter, plural, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "endpoint.url")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
}

impl ConfigCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(format, config_path),
            ConfigCommand::Set { key, value } => self.execute_set(key, value, format, config_path),
            ConfigCommand::Validate => self.execute_validate(format, config_path),
        }
    }

    fn execute_show(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let formatter = get_formatter(format);
        let config = load_config(config_path)?;

        if format.is_json() {
            let json = serde_json::to_value(&config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            formatter.success(&format!("Configuration ({})", config_path.display()));
            formatter.info("");

            let yaml = serde_yaml::to_string(&config)
                .context("Failed to serialize configuration to YAML")?;
            for line in yaml.lines() {
                formatter.info(line);
            }
        }

        Ok(())
    }

    fn execute_set(
        &self,
        key: &str,
        value: &str,
        format: OutputFormat,
        config_path: &Path,
    ) -> Result<()> {
        let formatter = get_formatter(format);
        let mut config = load_config(config_path)?;

        info!(key = %key, value = %value, "Setting configuration value");

        if let Err(e) = apply_config_value(&mut config, key, value) {
            if format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "success": false,
                    "key": key,
                    "error": e.to_string(),
                }));
            } else {
                formatter.error(&format!("Failed to set '{}': {}", key, e));
                formatter.info("");
                formatter.info("Supported keys:");
                for (name, description) in SUPPORTED_KEYS {
                    formatter.info(&format!("  {:<28} - {}", name, description));
                }
            }
            anyhow::bail!("configuration not changed");
        }

        // Only reject errors on the key being set; an unset endpoint.url
        // must not block setting other values first.
        let errors: Vec<String> = config
            .validate()
            .into_iter()
            .filter(|e| e.field == key)
            .map(|e| e.message)
            .collect();
        if !errors.is_empty() {
            formatter.error(&format!("Invalid value for '{}': {}", key, errors.join("; ")));
            anyhow::bail!("configuration not changed");
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create configuration directory")?;
        }
        let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
        std::fs::write(config_path, yaml).context("Failed to write configuration file")?;

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "key": key,
                "value": value,
                "config_path": config_path.display().to_string(),
            }));
        } else {
            formatter.success(&format!("Set {} = {}", key, value));
            formatter.info(&format!("Saved to {}", config_path.display()));
        }

        Ok(())
    }

    fn execute_validate(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let formatter = get_formatter(format);

        if !config_path.exists() {
            if format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "valid": false,
                    "config_path": config_path.display().to_string(),
                    "errors": ["Configuration file not found"],
                }));
            } else {
                formatter.error(&format!(
                    "Configuration file not found at {}",
                    config_path.display()
                ));
                formatter.info("Run 'leadq config set endpoint.url <URL>' to create one.");
            }
            anyhow::bail!("invalid configuration");
        }

        let config = match Config::load(config_path) {
            Ok(config) => config,
            Err(e) => {
                if format.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "valid": false,
                        "config_path": config_path.display().to_string(),
                        "errors": [format!("Failed to parse configuration: {}", e)],
                    }));
                } else {
                    formatter.error(&format!("Failed to parse configuration: {}", e));
                    formatter.info(&format!("File: {}", config_path.display()));
                }
                anyhow::bail!("invalid configuration");
            }
        };

        let errors = config.validate();

        if format.is_json() {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": config_path.display().to_string(),
                "errors": error_strings,
            }));
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", config_path.display()));
        } else {
            formatter.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                plural(errors.len())
            ));
            formatter.info(&format!("File: {}", config_path.display()));
            formatter.info("");
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!("invalid configuration")
        }
    }
}

const SUPPORTED_KEYS: &[(&str, &str)] = &[
    ("endpoint.url", "Lead endpoint URL"),
    ("endpoint.wire_shape", "array|object"),
    ("endpoint.timeout_secs", "Seconds per delivery attempt"),
    ("queue.retry_budget", "Drain attempts before a lead fails"),
    ("queue.drain_delay_ms", "Pause between leads while draining"),
    ("queue.database", "Queue database path"),
    ("sync.drain_interval_secs", "Seconds between background drains"),
    ("sync.startup_delay_secs", "Delay before the first drain"),
    ("sync.probe_interval_secs", "Seconds between probes (0 = off)"),
    ("sync.probe_url", "Probe URL (empty = endpoint.url)"),
    ("logging.level", "trace|debug|info|warn|error"),
    ("logging.format", "pretty|json"),
];

/// Apply a dot-notation key/value pair to a Config struct
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        // --- endpoint ---
        "endpoint.url" => config.endpoint.url = value.to_string(),
        "endpoint.wire_shape" => {
            config.endpoint.wire_shape = value
                .parse::<WireShape>()
                .map_err(|e| anyhow::anyhow!(e))?;
        }
        "endpoint.timeout_secs" => {
            config.endpoint.timeout_secs = parse_number(key, value)?;
        }

        // --- queue ---
        "queue.retry_budget" => config.queue.retry_budget = parse_number(key, value)?,
        "queue.drain_delay_ms" => config.queue.drain_delay_ms = parse_number(key, value)?,
        "queue.database" => config.queue.database = PathBuf::from(value),

        // --- sync ---
        "sync.drain_interval_secs" => config.sync.drain_interval_secs = parse_number(key, value)?,
        "sync.startup_delay_secs" => config.sync.startup_delay_secs = parse_number(key, value)?,
        "sync.probe_interval_secs" => config.sync.probe_interval_secs = parse_number(key, value)?,
        "sync.probe_url" => {
            config.sync.probe_url = if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            };
        }

        // --- logging ---
        "logging.level" => config.logging.level = value.to_string(),
        "logging.format" => config.logging.format = value.to_string(),

        _ => anyhow::bail!("Unknown configuration key: '{}'", key),
    }

    Ok(())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| anyhow::anyhow!("Expected a non-negative integer for {}", key))
}
