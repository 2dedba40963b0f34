//! PortPilot Core Library
//!
//! Cross-platform library for discovering listening TCP ports.
//! Provides functionality to:
//! - Scan listening TCP ports with the platform's own tools
//! - Classify the owning process by runtime (node, python, databases, ...)
//! - Group ports into development servers, applications and system services
//! - Detect ports that appeared or disappeared between scans
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure business logic and data models
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External system implementations
//! - `application`: Use case services
//!
//! # Platform Support
//! - macOS: Uses `lsof` and `ps` commands
//! - Linux: Uses `ss` or `netstat` commands, and `ps`
//! - Windows: Uses PowerShell `Get-NetTCPConnection`
//!
//! # Example
//! ```no_run
//! use portpilot_core::{categorize, PortScanner};
//!
//! # async fn run() {
//! let records = PortScanner::new().scan().await;
//! for (bucket, ports) in categorize(&records).iter() {
//!     println!("{}: {} ports", bucket.label(), ports.len());
//! }
//! # }
//! ```

// Hexagonal architecture layers
pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod config;
pub mod error;

// Re-export domain types (primary API)
pub use domain::{
    categorize, classify, detect_changes, group_by_runtime, port_set, CategorizedPorts,
    CategoryBucket, Categorizer, ChangeOutcome, ChangeSet, Notification, PortFilter, PortRecord,
    RuntimeTag,
};

// Re-export other commonly used types
pub use adapters::{OutputParser, ParserKind, Platform, PortScanner, ToolSpec};
pub use application::{PortService, ScanReport};
pub use config::{Config, ConfigStore, GroupBy};
pub use error::{Error, Result};
pub use ports::PortScannerPort;
