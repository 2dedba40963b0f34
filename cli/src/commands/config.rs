//! Config command - show the effective configuration.

use anyhow::Result;
use portpilot_core::{Config, ConfigStore};
use serde_json::json;

pub fn show(store: &ConfigStore, config: &Config, json: bool) -> Result<()> {
    if json {
        let output = json!({
            "path": store.path().display().to_string(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let ignored = if config.ignore_ports.is_empty() {
        "-".to_string()
    } else {
        config
            .ignore_ports
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    let timeout = config
        .scan_timeout()
        .map(|t| format!("{}s", t.as_secs()))
        .unwrap_or_else(|| "platform default".to_string());

    println!("Config file:          {}", store.path().display());
    if !store.path().exists() {
        println!("                      (not found, using defaults)");
    }
    println!("Refresh interval:     {}s", config.refresh_interval().as_secs());
    println!("Group by:             {}", config.group_by);
    println!("Ignored ports:        {}", ignored);
    println!("Ignore system ports:  {}", config.ignore_system_ports);
    println!("Show notifications:   {}", config.show_notifications);
    println!("Scan timeout:         {}", timeout);
    println!("Ephemeral threshold:  {}", config.ephemeral_threshold);

    Ok(())
}
