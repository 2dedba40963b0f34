//! Port record and filtering domain models.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::RuntimeTag;

/// Ports below this value are reserved for system services.
pub const SYSTEM_PORT_LIMIT: u16 = 1024;

// ============================================================================
// PortRecord
// ============================================================================

/// One listening TCP socket bound to one process.
///
/// Records are created fresh on every scan and replaced wholesale by the next
/// one. A `pid` of 0 means the owning process could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRecord {
    /// The bound local TCP port.
    pub port: u16,
    /// Process ID of the owning process, 0 when unknown.
    pub pid: u32,
    /// Short process name (may be empty or "unknown").
    pub name: String,
    /// Best-effort executable path or command line (may be empty).
    pub command: String,
}

impl PortRecord {
    /// Create a record from scan results.
    pub fn new(port: u16, pid: u32, name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            port,
            pid,
            name: name.into(),
            command: command.into(),
        }
    }

    /// Get the formatted port number for display (e.g., ":3000").
    pub fn display_port(&self) -> String {
        format!(":{}", self.port)
    }

    /// Classify the owning process.
    pub fn runtime(&self) -> RuntimeTag {
        super::classify(self)
    }

    /// Local URL a browser would open for this port.
    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }

    /// Whether the owning process is known.
    pub fn has_owner(&self) -> bool {
        self.pid != 0
    }

    /// Check if this record matches a search query.
    ///
    /// Searches across port number, PID, process name, and command.
    pub fn matches_search(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let query_lower = query.to_lowercase();
        self.name.to_lowercase().contains(&query_lower)
            || self.port.to_string().contains(&query_lower)
            || self.pid.to_string().contains(&query_lower)
            || self.command.to_lowercase().contains(&query_lower)
    }
}

impl std::fmt::Display for PortRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, ":{} {} (PID {})", self.port, self.name, self.pid)
    }
}

// ============================================================================
// PortFilter
// ============================================================================

/// Filter criteria applied by the caller before grouping.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortFilter {
    /// Text to search across record fields.
    #[serde(default)]
    pub search_text: String,
    /// Ports that are never reported.
    #[serde(default)]
    pub ignore_ports: HashSet<u16>,
    /// Drop ports below 1024.
    #[serde(default)]
    pub ignore_system_ports: bool,
    /// Runtime tags to include. If empty, includes all tags.
    #[serde(default)]
    pub runtimes: HashSet<RuntimeTag>,
    /// Ports to include. If empty, includes all ports.
    #[serde(default)]
    pub ports: HashSet<u16>,
}

impl PortFilter {
    /// Create a new filter that lets everything through.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a record passes all filter criteria.
    pub fn matches(&self, record: &PortRecord) -> bool {
        if !self.ports.is_empty() && !self.ports.contains(&record.port) {
            return false;
        }
        if self.ignore_ports.contains(&record.port) {
            return false;
        }
        if self.ignore_system_ports && record.port < SYSTEM_PORT_LIMIT {
            return false;
        }
        if !self.search_text.is_empty() && !record.matches_search(&self.search_text) {
            return false;
        }
        if !self.runtimes.is_empty() && !self.runtimes.contains(&record.runtime()) {
            return false;
        }
        true
    }

    /// Set the search text.
    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    /// Set the ignored ports.
    pub fn with_ignored_ports(mut self, ports: impl IntoIterator<Item = u16>) -> Self {
        self.ignore_ports = ports.into_iter().collect();
        self
    }

    /// Enable/disable dropping of ports below 1024.
    pub fn with_ignore_system_ports(mut self, enabled: bool) -> Self {
        self.ignore_system_ports = enabled;
        self
    }

    /// Set the allowed runtime tags.
    pub fn with_runtimes(mut self, tags: impl IntoIterator<Item = RuntimeTag>) -> Self {
        self.runtimes = tags.into_iter().collect();
        self
    }

    /// Set the ports to include.
    pub fn with_ports(mut self, ports: impl IntoIterator<Item = u16>) -> Self {
        self.ports = ports.into_iter().collect();
        self
    }

    /// Apply the filter, keeping the input order.
    pub fn apply(&self, records: &[PortRecord]) -> Vec<PortRecord> {
        records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
