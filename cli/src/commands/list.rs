//! List command - show all listening ports.

use std::collections::BTreeMap;

use anyhow::Result;
use portpilot_core::{group_by_runtime, Config, GroupBy, PortFilter, PortRecord, RuntimeTag};
use serde::Serialize;

use super::{scanner_for, truncate};

/// Options of the `list` subcommand.
#[derive(Debug, Default)]
pub struct ListOptions {
    pub group_by: Option<GroupBy>,
    pub port: Option<u16>,
    pub search: Option<String>,
    pub runtimes: Vec<RuntimeTag>,
    pub ignore_ports: Vec<u16>,
    pub ignore_system: bool,
    pub json: bool,
}

impl ListOptions {
    /// Plain listing with configured grouping.
    pub fn new(json: bool) -> Self {
        Self {
            json,
            ..Self::default()
        }
    }
}

/// A record as shown to the user, with its runtime.
#[derive(Serialize)]
struct PortRow<'a> {
    #[serde(flatten)]
    record: &'a PortRecord,
    runtime: RuntimeTag,
    icon: &'static str,
    url: String,
}

impl<'a> From<&'a PortRecord> for PortRow<'a> {
    fn from(record: &'a PortRecord) -> Self {
        let runtime = record.runtime();
        Self {
            record,
            runtime,
            icon: runtime.icon(),
            url: record.url(),
        }
    }
}

pub async fn run(options: ListOptions, config: &Config) -> Result<()> {
    let filter = build_filter(&options, config);
    let ports = filter.apply(&scanner_for(config).scan().await);

    let group_by = options.group_by.unwrap_or(config.group_by);
    let groups = build_groups(&ports, group_by, config);

    if options.json {
        print_json(&ports, &groups, group_by)?;
        return Ok(());
    }

    if ports.is_empty() {
        println!("No listening ports found.");
        return Ok(());
    }

    for (index, (title, members)) in groups.iter().enumerate() {
        if index > 0 {
            println!();
        }
        if let Some(title) = title {
            println!("{} ({})", title, members.len());
        }
        print_table(members);
    }

    println!("\nTotal: {} ports", ports.len());
    Ok(())
}

/// Configured ignore options plus the command-line filters.
fn build_filter(options: &ListOptions, config: &Config) -> PortFilter {
    let mut filter = config
        .filter()
        .with_ports(options.port)
        .with_runtimes(options.runtimes.iter().copied());
    filter.ignore_ports.extend(options.ignore_ports.iter().copied());
    filter.ignore_system_ports |= options.ignore_system;

    match &options.search {
        Some(text) => filter.with_search(text.as_str()),
        None => filter,
    }
}

/// Titled groups in display order. `None` means a single untitled list.
fn build_groups(
    ports: &[PortRecord],
    group_by: GroupBy,
    config: &Config,
) -> Vec<(Option<String>, Vec<PortRecord>)> {
    match group_by {
        GroupBy::Category => config
            .categorizer()
            .categorize(ports)
            .iter()
            .map(|(bucket, members)| (Some(bucket.label().to_string()), members.to_vec()))
            .collect(),
        GroupBy::Runtime => group_by_runtime(ports)
            .into_iter()
            .map(|(tag, members)| (Some(tag.display_name().to_string()), members))
            .collect(),
        GroupBy::None => vec![(None, ports.to_vec())],
    }
}

fn print_json(
    ports: &[PortRecord],
    groups: &[(Option<String>, Vec<PortRecord>)],
    group_by: GroupBy,
) -> Result<()> {
    let output = match group_by {
        GroupBy::None => serde_json::to_string_pretty(&rows(ports))?,
        GroupBy::Category | GroupBy::Runtime => {
            let grouped: BTreeMap<&str, Vec<PortRow<'_>>> = groups
                .iter()
                .map(|(title, members)| (title.as_deref().unwrap_or_default(), rows(members)))
                .collect();
            serde_json::to_string_pretty(&grouped)?
        }
    };
    println!("{}", output);
    Ok(())
}

fn rows(ports: &[PortRecord]) -> Vec<PortRow<'_>> {
    ports.iter().map(PortRow::from).collect()
}

fn print_table(ports: &[PortRecord]) {
    // Table header
    println!(
        "{:<6} {:<8} {:<20} {:<12} COMMAND",
        "PORT", "PID", "PROCESS", "RUNTIME"
    );
    println!("{}", "-".repeat(80));

    for port in ports {
        let pid = if port.pid == 0 {
            "-".to_string()
        } else {
            port.pid.to_string()
        };
        let process_name = truncate(&port.name, 20);
        let command = truncate(&port.command, 36);

        println!(
            "{:<6} {:<8} {:<20} {:<12} {}",
            port.display_port(),
            pid,
            process_name,
            port.runtime().display_name(),
            command
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<PortRecord> {
        vec![
            PortRecord::new(3000, 1, "node", "node server.js"),
            PortRecord::new(5432, 2, "postgres", ""),
            PortRecord::new(5000, 3, "ControlCenter", ""),
        ]
    }

    #[test]
    fn test_build_groups_by_category() {
        let groups = build_groups(&sample(), GroupBy::Category, &Config::default());
        let titles: Vec<_> = groups.iter().map(|(t, m)| (t.clone(), m.len())).collect();
        assert_eq!(
            titles,
            vec![
                (Some("Development Servers".to_string()), 2),
                (Some("System & IDE".to_string()), 1),
            ]
        );
    }

    #[test]
    fn test_build_groups_none() {
        let groups = build_groups(&sample(), GroupBy::None, &Config::default());
        assert_eq!(groups.len(), 1);
        assert!(groups[0].0.is_none());
        assert_eq!(groups[0].1.len(), 3);
    }

    #[test]
    fn test_row_serialization() {
        let record = PortRecord::new(3000, 1, "node", "node server.js");
        let value = serde_json::to_value(PortRow::from(&record)).unwrap();
        assert_eq!(value["port"], 3000);
        assert_eq!(value["runtime"], "node");
        assert_eq!(value["icon"], "symbol-event");
        assert_eq!(value["url"], "http://localhost:3000");
    }

    #[test]
    fn test_build_filter_combines_options() {
        let config = Config {
            ignore_ports: vec![5000],
            ..Config::default()
        };
        let options = ListOptions {
            search: Some("server".to_string()),
            runtimes: vec![RuntimeTag::Node, RuntimeTag::Database],
            ignore_ports: vec![3001],
            ..ListOptions::default()
        };
        let records = vec![
            PortRecord::new(3000, 1, "node", "node server.js"),
            PortRecord::new(3001, 2, "node", "node server.js"),
            PortRecord::new(5000, 3, "node", "node server.js"),
            PortRecord::new(5432, 4, "postgres", "postgres -D /data"),
            PortRecord::new(8000, 5, "python3", "python3 server.py"),
        ];

        let kept: Vec<u16> = build_filter(&options, &config)
            .apply(&records)
            .iter()
            .map(|r| r.port)
            .collect();
        assert_eq!(kept, vec![3000]);

        let options = ListOptions {
            port: Some(5432),
            ..ListOptions::default()
        };
        let kept = build_filter(&options, &config).apply(&records);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "postgres");
    }
}
