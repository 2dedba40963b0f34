//! Change detection between consecutive scans.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::PortRecord;

/// Ports that appeared or disappeared between two scans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Present now, absent before.
    pub appeared: BTreeSet<u16>,
    /// Present before, absent now.
    pub disappeared: BTreeSet<u16>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.appeared.is_empty() && self.disappeared.is_empty()
    }

    /// Turn the change set into user-facing notifications.
    ///
    /// `current` is the scan the `appeared` ports came from; it supplies the
    /// process names.
    pub fn notifications(&self, current: &[PortRecord]) -> Vec<Notification> {
        let started = self.appeared.iter().map(|&port| {
            let process_name = current
                .iter()
                .find(|r| r.port == port)
                .map(|r| r.name.clone())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "unknown".to_string());
            Notification::PortStarted { port, process_name }
        });
        let stopped = self
            .disappeared
            .iter()
            .map(|&port| Notification::PortStopped { port });

        started.chain(stopped).collect()
    }
}

/// Result of comparing a scan with the previous snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeOutcome {
    /// Snapshot to hand back on the next call.
    pub next: BTreeSet<u16>,
    pub changes: ChangeSet,
}

/// Notification types for port state changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Notification {
    /// Port became active (process started listening)
    PortStarted { port: u16, process_name: String },
    /// Port became inactive (process stopped listening)
    PortStopped { port: u16 },
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notification::PortStarted { port, process_name } => {
                write!(f, "Port {} listening ({})", port, process_name)
            }
            Notification::PortStopped { port } => write!(f, "Port {} stopped", port),
        }
    }
}

/// Compare the previous snapshot with the current port set.
///
/// An empty `previous` means there is nothing to compare against (first scan),
/// so no changes are reported. The returned `next` snapshot always reflects
/// `current`.
pub fn detect_changes(previous: &BTreeSet<u16>, current: BTreeSet<u16>) -> ChangeOutcome {
    let changes = if previous.is_empty() {
        ChangeSet::default()
    } else {
        ChangeSet {
            appeared: current.difference(previous).copied().collect(),
            disappeared: previous.difference(&current).copied().collect(),
        }
    };

    ChangeOutcome {
        next: current,
        changes,
    }
}

/// Port set of a scan result.
pub fn port_set(records: &[PortRecord]) -> BTreeSet<u16> {
    records.iter().map(|r| r.port).collect()
}
