//! Subcommand implementations.

pub mod config;
pub mod list;
pub mod watch;

use std::path::PathBuf;

use anyhow::Result;
use portpilot_core::{Config, ConfigStore, PortScanner};

/// Load the configuration from `path`, or from the default location.
pub async fn load_config(path: Option<PathBuf>) -> Result<(ConfigStore, Config)> {
    let store = match path {
        Some(path) => ConfigStore::with_path(path),
        None => ConfigStore::new()?,
    };
    let config = store.load().await?;
    Ok((store, config))
}

/// Scanner for the current platform, honoring a configured timeout.
pub fn scanner_for(config: &Config) -> PortScanner {
    let scanner = PortScanner::new();
    match config.scan_timeout() {
        Some(timeout) => scanner.with_timeout(timeout),
        None => scanner,
    }
}

/// Shorten `s` to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
