//! Port scanner port (interface).

use crate::domain::PortRecord;

/// Port for discovering listening TCP ports.
///
/// Implementations handle platform-specific details (lsof, ss, PowerShell)
/// and degrade to an empty list instead of failing.
pub trait PortScannerPort: Send + Sync {
    /// Scan for all listening TCP ports, deduplicated and sorted by port.
    fn scan(&self) -> impl std::future::Future<Output = Vec<PortRecord>> + Send;
}
