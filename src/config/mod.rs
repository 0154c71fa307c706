//! Configuration management for CEC TV GW
//!
//! Handles loading, parsing, and hot-reloading of YAML configuration files.
//! Timing values are forgiving: anything that is not a usable number of
//! milliseconds falls back to the documented default instead of failing.

pub mod watcher;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::warn;

use crate::poll::DEFAULT_POLL_INTERVAL;
use crate::session::SessionTiming;
use crate::state::DEFAULT_DEBOUNCE_WINDOW;

pub use watcher::ConfigWatcher;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    /// Display name of the TV
    #[serde(default = "default_name")]
    pub name: String,

    /// Delay between power status queries, in milliseconds
    #[serde(default, alias = "pollInterval", skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<Millis>,

    /// Quiet window after an accepted power transition, in milliseconds
    #[serde(default, alias = "eventWaitTimeout", skip_serializing_if = "Option::is_none")]
    pub debounce_window_ms: Option<Millis>,

    #[serde(default)]
    pub adapter: AdapterConfig,
}

/// Adapter subprocess configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AdapterConfig {
    #[serde(default = "default_adapter_program")]
    pub program: String,
    #[serde(default = "default_adapter_args")]
    pub args: Vec<String>,
}

/// Millisecond value as written by the user
///
/// Numbers and numeric strings are accepted; anything else is kept so it
/// can be reported before falling back to the default.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Millis {
    Number(u64),
    Text(String),
    Other(serde_yaml::Value),
}

impl Millis {
    fn as_millis(&self) -> Option<u64> {
        match self {
            Millis::Number(n) => Some(*n),
            Millis::Text(s) => s.trim().parse().ok(),
            Millis::Other(_) => None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            poll_interval_ms: None,
            debounce_window_ms: None,
            adapter: AdapterConfig::default(),
        }
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            program: default_adapter_program(),
            args: default_adapter_args(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to load config file: {}", path.display()))
    }

    /// Parse and validate YAML configuration text
    pub fn parse(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: AppConfig =
            serde_yaml::from_str(contents).context("Failed to parse YAML config")?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration for correctness
    pub fn validate(&self) -> Result<()> {
        if self.adapter.program.trim().is_empty() {
            anyhow::bail!("adapter.program cannot be empty");
        }
        if self.name.trim().is_empty() {
            anyhow::bail!("name cannot be empty");
        }
        Ok(())
    }

    /// Poll interval, falling back to the default for unusable values
    pub fn poll_interval(&self) -> Duration {
        resolve_ms(
            "poll_interval_ms",
            self.poll_interval_ms.as_ref(),
            DEFAULT_POLL_INTERVAL,
            false,
        )
    }

    /// Debounce window, falling back to the default for unusable values
    ///
    /// Zero is allowed and disables debouncing.
    pub fn debounce_window(&self) -> Duration {
        resolve_ms(
            "debounce_window_ms",
            self.debounce_window_ms.as_ref(),
            DEFAULT_DEBOUNCE_WINDOW,
            true,
        )
    }

    pub fn timing(&self) -> SessionTiming {
        SessionTiming {
            poll_interval: self.poll_interval(),
            debounce_window: self.debounce_window(),
        }
    }
}

fn resolve_ms(field: &str, value: Option<&Millis>, default: Duration, allow_zero: bool) -> Duration {
    let Some(value) = value else {
        return default;
    };

    match value.as_millis() {
        Some(ms) if ms > 0 || allow_zero => Duration::from_millis(ms),
        _ => {
            warn!(
                field,
                value = ?value,
                default_ms = default.as_millis() as u64,
                "Invalid timing value in config, using default"
            );
            default
        }
    }
}

// Default value functions
fn default_name() -> String { "CEC TV".to_string() }
fn default_adapter_program() -> String { "cec-client".to_string() }
fn default_adapter_args() -> Vec<String> { vec!["-d".to_string(), "8".to_string()] }

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::parse("").unwrap();

        assert_eq!(config.name, "CEC TV");
        assert_eq!(config.adapter.program, "cec-client");
        assert_eq!(config.adapter.args, vec!["-d", "8"]);
        assert_eq!(config.poll_interval(), Duration::from_millis(2500));
        assert_eq!(config.debounce_window(), Duration::from_millis(5000));
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
name: "Living Room TV"
poll_interval_ms: 1000
debounce_window_ms: 3000
adapter:
  program: /usr/bin/cec-client
  args: ["-d", "1", "RPI"]
"#;
        let config = AppConfig::parse(yaml).unwrap();

        assert_eq!(config.name, "Living Room TV");
        assert_eq!(
            config.timing(),
            SessionTiming {
                poll_interval: Duration::from_millis(1000),
                debounce_window: Duration::from_millis(3000),
            }
        );
        assert_eq!(config.adapter.program, "/usr/bin/cec-client");
        assert_eq!(config.adapter.args.len(), 3);
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let config = AppConfig::parse("poll_interval_ms: \"1200\"\n").unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(1200));
    }

    #[test]
    fn test_malformed_timing_falls_back() {
        let yaml = r#"
poll_interval_ms: "soon"
debounce_window_ms: [1, 2]
"#;
        let config = AppConfig::parse(yaml).unwrap();

        assert_eq!(config.poll_interval(), DEFAULT_POLL_INTERVAL);
        assert_eq!(config.debounce_window(), DEFAULT_DEBOUNCE_WINDOW);
    }

    #[test]
    fn test_negative_and_zero_values() {
        let config = AppConfig::parse("poll_interval_ms: 0\ndebounce_window_ms: -5\n").unwrap();

        assert_eq!(config.poll_interval(), DEFAULT_POLL_INTERVAL);
        assert_eq!(config.debounce_window(), DEFAULT_DEBOUNCE_WINDOW);

        let config = AppConfig::parse("debounce_window_ms: 0\n").unwrap();
        assert_eq!(config.debounce_window(), Duration::ZERO);
    }

    #[test]
    fn test_homebridge_style_keys() {
        let config = AppConfig::parse("pollInterval: 4000\n").unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(4000));
    }

    #[test]
    fn test_empty_program_rejected() {
        let result = AppConfig::parse("adapter:\n  program: \"\"\n");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_save_and_load() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.yaml");

        let mut config = AppConfig::default();
        config.name = "Bedroom".to_string();
        config.poll_interval_ms = Some(Millis::Number(750));
        config.save(&path).await?;

        let loaded = AppConfig::load(&path).await?;
        assert_eq!(loaded, config);
        assert_eq!(loaded.poll_interval(), Duration::from_millis(750));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        assert!(AppConfig::load(dir.path().join("nope.yaml")).await.is_err());
    }
}
