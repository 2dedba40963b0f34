//! Presentation buckets for classified port records.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::runtime::normalize;
use super::{PortRecord, RuntimeTag};

/// Ports at or above this value are treated as OS-assigned dynamic ports.
pub const DEFAULT_EPHEMERAL_THRESHOLD: u16 = 49000;

/// OS services that listen on well-known or loopback ports.
static SYSTEM_PROCESS_NAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Windows
        "system",
        "svchost",
        "lsass",
        "services",
        "wininit",
        "winlogon",
        "spoolsv",
        "csrss",
        "smss",
        "searchindexer",
        "mdnsresponder",
        // macOS
        "launchd",
        "rapportd",
        "sharingd",
        "controlcenter",
        "identityservicesd",
        "remoted",
        "airplayxpchelper",
        // Linux
        "systemd",
        "systemd-resolved",
        "systemd-resolve",
        "sshd",
        "cupsd",
        "avahi-daemon",
        "dnsmasq",
        "chronyd",
        "rpcbind",
        "containerd",
        "dockerd",
    ]
    .into_iter()
    .collect()
});

/// Editors and IDEs that open language-server and debug ports.
static IDE_PROCESS_NAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "code",
        "code helper",
        "code helper (plugin)",
        "code - insiders",
        "cursor",
        "windsurf",
        "zed",
        "idea",
        "idea64",
        "pycharm",
        "pycharm64",
        "webstorm",
        "webstorm64",
        "goland",
        "goland64",
        "rustrover",
        "rustrover64",
        "clion",
        "rider",
        "rider64",
        "phpstorm",
        "datagrip",
        "fleet",
        "studio64",
        "devenv",
        "sublime_text",
    ]
    .into_iter()
    .collect()
});

/// Desktop applications that keep background listeners open.
static APP_PROCESS_NAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "spotify",
        "discord",
        "slack",
        "teams",
        "ms-teams",
        "zoom",
        "zoom.us",
        "dropbox",
        "onedrive",
        "googledrivefs",
        "steam",
        "figma_agent",
        "1password",
        "adobe desktop service",
        "creative cloud",
        "com.docker.backend",
        "docker desktop",
        "ollama",
        "raycast",
    ]
    .into_iter()
    .collect()
});

/// One of the three presentation groupings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryBucket {
    /// Development servers: recognized runtimes, databases and web servers.
    Dev,
    /// Background applications and unrecognized processes.
    Apps,
    /// OS services, IDEs and ephemeral ports.
    System,
}

impl CategoryBucket {
    /// All buckets in presentation order.
    pub const ALL: [CategoryBucket; 3] = [
        CategoryBucket::Dev,
        CategoryBucket::Apps,
        CategoryBucket::System,
    ];

    /// Get the heading for this bucket.
    pub fn label(&self) -> &'static str {
        match self {
            CategoryBucket::Dev => "Development Servers",
            CategoryBucket::Apps => "Applications",
            CategoryBucket::System => "System & IDE",
        }
    }
}

impl std::fmt::Display for CategoryBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Records partitioned into buckets, each sorted ascending by port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedPorts {
    pub dev: Vec<PortRecord>,
    pub apps: Vec<PortRecord>,
    pub system: Vec<PortRecord>,
}

impl CategorizedPorts {
    /// Records held in `bucket`.
    pub fn bucket(&self, bucket: CategoryBucket) -> &[PortRecord] {
        match bucket {
            CategoryBucket::Dev => &self.dev,
            CategoryBucket::Apps => &self.apps,
            CategoryBucket::System => &self.system,
        }
    }

    fn bucket_mut(&mut self, bucket: CategoryBucket) -> &mut Vec<PortRecord> {
        match bucket {
            CategoryBucket::Dev => &mut self.dev,
            CategoryBucket::Apps => &mut self.apps,
            CategoryBucket::System => &mut self.system,
        }
    }

    /// Total number of records across all buckets.
    pub fn len(&self) -> usize {
        self.dev.len() + self.apps.len() + self.system.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over non-empty buckets in presentation order.
    pub fn iter(&self) -> impl Iterator<Item = (CategoryBucket, &[PortRecord])> {
        CategoryBucket::ALL
            .into_iter()
            .map(move |b| (b, self.bucket(b)))
            .filter(|(_, records)| !records.is_empty())
    }
}

/// Partitions records into presentation buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Categorizer {
    ephemeral_threshold: u16,
}

impl Categorizer {
    pub fn new(ephemeral_threshold: u16) -> Self {
        Self {
            ephemeral_threshold,
        }
    }

    /// Pick the bucket for one record. First matching rule wins:
    /// 1. port at or above the ephemeral threshold → system
    /// 2. system process name → system
    /// 3. IDE process name → system
    /// 4. known background application → apps
    /// 5. any recognized runtime → dev
    /// 6. otherwise → apps
    pub fn bucket_for(&self, record: &PortRecord) -> CategoryBucket {
        if record.port >= self.ephemeral_threshold {
            return CategoryBucket::System;
        }

        let name = normalize(&record.name);
        if SYSTEM_PROCESS_NAMES.contains(name.as_str()) || IDE_PROCESS_NAMES.contains(name.as_str())
        {
            return CategoryBucket::System;
        }
        if APP_PROCESS_NAMES.contains(name.as_str()) {
            return CategoryBucket::Apps;
        }

        if record.runtime() != RuntimeTag::Other {
            CategoryBucket::Dev
        } else {
            CategoryBucket::Apps
        }
    }

    /// Partition `records`; every record lands in exactly one bucket.
    pub fn categorize(&self, records: &[PortRecord]) -> CategorizedPorts {
        let mut grouped = records
            .iter()
            .fold(CategorizedPorts::default(), |mut acc, record| {
                acc.bucket_mut(self.bucket_for(record)).push(record.clone());
                acc
            });

        for bucket in CategoryBucket::ALL {
            grouped.bucket_mut(bucket).sort_by_key(|r| r.port);
        }
        grouped
    }
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::new(DEFAULT_EPHEMERAL_THRESHOLD)
    }
}

/// Partition records with the default ephemeral threshold.
pub fn categorize(records: &[PortRecord]) -> CategorizedPorts {
    Categorizer::default().categorize(records)
}

/// Group records by runtime tag; groups ordered by tag name, each sorted by port.
pub fn group_by_runtime(records: &[PortRecord]) -> Vec<(RuntimeTag, Vec<PortRecord>)> {
    let mut groups: Vec<(RuntimeTag, Vec<PortRecord>)> = Vec::new();

    for record in records {
        let tag = record.runtime();
        match groups.iter_mut().find(|(t, _)| *t == tag) {
            Some((_, members)) => members.push(record.clone()),
            None => groups.push((tag, vec![record.clone()])),
        }
    }

    groups.sort_by_key(|(tag, _)| tag.as_str());
    for (_, members) in &mut groups {
        members.sort_by_key(|r| r.port);
    }
    groups
}
