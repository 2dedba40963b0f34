//! User configuration for scanning and presentation.
//!
//! Stores configuration in JSON format at `~/.portpilot/config.json`.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::{Categorizer, PortFilter, DEFAULT_EPHEMERAL_THRESHOLD};
use crate::error::{Error, Result};

/// How scan results are grouped for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    /// Development servers / applications / system buckets.
    #[default]
    Category,
    /// One group per runtime tag.
    Runtime,
    /// A single list sorted by port.
    None,
}

impl GroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Category => "category",
            GroupBy::Runtime => "runtime",
            GroupBy::None => "none",
        }
    }
}

impl std::fmt::Display for GroupBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "category" => Ok(GroupBy::Category),
            "runtime" => Ok(GroupBy::Runtime),
            "none" => Ok(GroupBy::None),
            other => Err(Error::Config(format!(
                "Unknown grouping '{}' (expected category, runtime or none)",
                other
            ))),
        }
    }
}

/// Configuration data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Watch-loop period in seconds.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,

    /// Ports never reported.
    #[serde(default)]
    pub ignore_ports: Vec<u16>,

    /// Drop ports below 1024.
    #[serde(default)]
    pub ignore_system_ports: bool,

    #[serde(default)]
    pub group_by: GroupBy,

    /// Report appeared/disappeared ports.
    #[serde(default = "default_true")]
    pub show_notifications: bool,

    /// Overrides the per-platform tool timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_timeout_secs: Option<u64>,

    /// Ports at or above this always land in the system bucket.
    #[serde(default = "default_ephemeral_threshold")]
    pub ephemeral_threshold: u16,
}

fn default_refresh_interval() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

fn default_ephemeral_threshold() -> u16 {
    DEFAULT_EPHEMERAL_THRESHOLD
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            ignore_ports: Vec::new(),
            ignore_system_ports: false,
            group_by: GroupBy::default(),
            show_notifications: true,
            scan_timeout_secs: None,
            ephemeral_threshold: default_ephemeral_threshold(),
        }
    }
}

impl Config {
    /// Watch-loop period, at least one second.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval.max(1))
    }

    pub fn scan_timeout(&self) -> Option<Duration> {
        self.scan_timeout_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }

    /// Filter built from the ignore options.
    pub fn filter(&self) -> PortFilter {
        PortFilter::new()
            .with_ignored_ports(self.ignore_ports.iter().copied())
            .with_ignore_system_ports(self.ignore_system_ports)
    }

    pub fn categorizer(&self) -> Categorizer {
        Categorizer::new(self.ephemeral_threshold)
    }
}

/// Configuration store.
///
/// Handles reading and writing configuration to `~/.portpilot/config.json`.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    ///
    /// Default path: `~/.portpilot/config.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        let config_path = home.join(".portpilot").join("config.json");

        Ok(Self { config_path })
    }

    /// Create a config store with a custom path (for testing).
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Load configuration from disk.
    ///
    /// Returns default config if the file doesn't exist.
    pub async fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub async fn save(&self, config: &Config) -> Result<()> {
        if let Some(config_dir) = self.config_path.parent() {
            if !config_dir.as_os_str().is_empty() && !config_dir.exists() {
                fs::create_dir_all(config_dir).await.map_err(|e| {
                    Error::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        // Write atomically by writing to temp file then renaming
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to create temp config file: {}", e)))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        file.sync_all()
            .await
            .map_err(|e| Error::Config(format!("Failed to sync config: {}", e)))?;

        fs::rename(&temp_path, &self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to rename config file: {}", e)))?;

        Ok(())
    }
}
