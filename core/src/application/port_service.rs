//! Port scanning application service.

use std::collections::BTreeSet;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::domain::{
    detect_changes, port_set, CategorizedPorts, Categorizer, ChangeSet, Notification, PortFilter,
    PortRecord,
};
use crate::ports::PortScannerPort;

/// Outcome of one refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Filtered records, sorted by port.
    pub records: Vec<PortRecord>,
    pub categories: CategorizedPorts,
    /// Difference to the previous refresh. Empty on the first one.
    pub changes: ChangeSet,
    /// User-facing form of `changes`, empty when notifications are disabled.
    pub notifications: Vec<Notification>,
}

/// Application service for port scanning operations.
///
/// This service runs scan, filter, change detection and categorization in
/// that order, and keeps the previous port set between refreshes. It uses the
/// `PortScannerPort` trait for the actual scanning, allowing different
/// implementations to be injected.
pub struct PortService<S: PortScannerPort> {
    scanner: S,
    filter: PortFilter,
    categorizer: Categorizer,
    show_notifications: bool,
    previous: RwLock<BTreeSet<u16>>,
    ports_cache: RwLock<Vec<PortRecord>>,
}

impl<S: PortScannerPort> PortService<S> {
    /// Create a new port service with the given scanner and default options.
    pub fn new(scanner: S) -> Self {
        Self {
            scanner,
            filter: PortFilter::new(),
            categorizer: Categorizer::default(),
            show_notifications: true,
            previous: RwLock::new(BTreeSet::new()),
            ports_cache: RwLock::new(Vec::new()),
        }
    }

    /// Create a port service honoring the user's configuration.
    pub fn from_config(scanner: S, config: &Config) -> Self {
        Self::new(scanner)
            .with_filter(config.filter())
            .with_categorizer(config.categorizer())
            .with_notifications(config.show_notifications)
    }

    pub fn with_filter(mut self, filter: PortFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_categorizer(mut self, categorizer: Categorizer) -> Self {
        self.categorizer = categorizer;
        self
    }

    pub fn with_notifications(mut self, enabled: bool) -> Self {
        self.show_notifications = enabled;
        self
    }

    pub fn filter(&self) -> &PortFilter {
        &self.filter
    }

    /// Scan, then update the cache and the change-detection snapshot.
    pub async fn refresh(&self) -> ScanReport {
        let scanned = self.scanner.scan().await;
        let records = self.filter.apply(&scanned);

        let changes = {
            let mut previous = self.previous.write();
            let outcome = detect_changes(&previous, port_set(&records));
            *previous = outcome.next;
            outcome.changes
        };

        if !changes.is_empty() {
            debug!(
                appeared = changes.appeared.len(),
                disappeared = changes.disappeared.len(),
                "Listening ports changed"
            );
        }

        let notifications = if self.show_notifications {
            changes.notifications(&records)
        } else {
            Vec::new()
        };
        let categories = self.categorizer.categorize(&records);

        *self.ports_cache.write() = records.clone();

        ScanReport {
            records,
            categories,
            changes,
            notifications,
        }
    }

    /// Get all cached ports from the last refresh.
    pub fn get_ports(&self) -> Vec<PortRecord> {
        self.ports_cache.read().clone()
    }

    /// Find a port by port number.
    pub fn find_by_port(&self, port: u16) -> Option<PortRecord> {
        self.ports_cache
            .read()
            .iter()
            .find(|p| p.port == port)
            .cloned()
    }

    /// Find ports by PID.
    pub fn find_by_pid(&self, pid: u32) -> Vec<PortRecord> {
        self.ports_cache
            .read()
            .iter()
            .filter(|p| p.pid == pid)
            .cloned()
            .collect()
    }

    /// Forget the previous snapshot; the next refresh reports no changes.
    pub fn reset(&self) {
        self.previous.write().clear();
        self.ports_cache.write().clear();
    }
}
