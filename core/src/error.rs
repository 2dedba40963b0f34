//! Error types for the portpilot-core library.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for portpilot operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while discovering listening ports.
///
/// The tool variants never escape [`PortScanner::scan`](crate::PortScanner::scan);
/// they are surfaced only through `try_scan` and the logs.
#[derive(Error, Debug)]
pub enum Error {
    /// The OS command could not be started.
    #[error("Failed to start {tool}: {source}")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The OS command did not finish within the allowed time.
    #[error("{tool} timed out after {timeout:?}")]
    ToolTimeout { tool: String, timeout: Duration },

    /// The OS command exited non-zero or wrote only to stderr.
    #[error("{tool} failed ({status}): {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the scanner should move on to its next candidate tool.
    pub fn allows_fallback(&self) -> bool {
        matches!(self, Error::ToolUnavailable { .. } | Error::ToolFailed { .. })
    }
}
