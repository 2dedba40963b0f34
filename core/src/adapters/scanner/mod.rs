//! Port scanner adapters.
//!
//! Each OS family lists listening sockets with its own tool and output
//! format. The parsers are pure functions of the captured output and are
//! compiled on every platform; only the choice of tools depends on the target.

mod darwin;
mod linux;
mod process;
mod utils;
mod windows;

use std::ffi::OsStr;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::domain::PortRecord;
use crate::error::{Error, Result};
use crate::ports::PortScannerPort;

pub use darwin::LsofParser;
pub use linux::SocketStatsParser;
pub use process::parse_ps_output;
pub use windows::JsonParser;

use process::{PS_ARGS, PS_PROGRAM};
use utils::dedup_by_port;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Turns the raw output of one listing tool into port records.
///
/// Implementations skip lines or entries they cannot interpret instead of
/// failing, and keep only the first record seen for each port.
pub trait OutputParser: Send + Sync {
    fn parse(&self, raw: &str) -> Vec<PortRecord>;
}

/// Output format of a listing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    /// PowerShell JSON (Windows).
    Json,
    /// lsof field output (macOS).
    Lsof,
    /// ss / netstat listing (Linux).
    SocketStats,
}

impl ParserKind {
    pub fn parser(&self) -> &'static dyn OutputParser {
        match self {
            ParserKind::Json => &JsonParser,
            ParserKind::Lsof => &LsofParser,
            ParserKind::SocketStats => &SocketStatsParser,
        }
    }
}

/// An OS command that lists listening sockets, and how to read its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub program: String,
    pub args: Vec<String>,
    pub parser: ParserKind,
}

impl ToolSpec {
    pub fn new(
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
        parser: ParserKind,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            parser,
        }
    }
}

/// Operating system family, which decides the listing tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// The family this binary was built for. Other Unixes use the Linux tools.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// Listing tools in order of preference.
    pub fn tools(&self) -> Vec<ToolSpec> {
        match self {
            Platform::Windows => vec![windows::powershell_tool()],
            Platform::MacOs => vec![darwin::lsof_tool()],
            Platform::Linux => vec![linux::ss_tool(), linux::netstat_tool()],
        }
    }

    /// PowerShell startup alone can take several seconds.
    pub fn default_timeout(&self) -> Duration {
        match self {
            Platform::Windows => Duration::from_secs(15),
            Platform::MacOs | Platform::Linux => Duration::from_secs(10),
        }
    }

    /// Whether owning command lines must be looked up separately.
    pub fn needs_command_lookup(&self) -> bool {
        !matches!(self, Platform::Windows)
    }
}

/// Discovers listening TCP ports on the current host.
///
/// Runs the platform's listing tool under a timeout, falls back to the next
/// tool when one cannot be started or exits non-zero, and returns records
/// deduplicated by port and sorted ascending.
#[derive(Debug, Clone)]
pub struct PortScanner {
    tools: Vec<ToolSpec>,
    timeout: Duration,
    command_lookup: bool,
}

impl PortScanner {
    /// Create a new port scanner for the current platform.
    pub fn new() -> Self {
        Self::for_platform(Platform::current())
    }

    pub fn for_platform(platform: Platform) -> Self {
        Self {
            tools: platform.tools(),
            timeout: platform.default_timeout(),
            command_lookup: platform.needs_command_lookup(),
        }
    }

    /// Create a scanner with an explicit tool chain and no command lookup.
    pub fn with_tools(tools: Vec<ToolSpec>, timeout: Duration) -> Self {
        Self {
            tools,
            timeout,
            command_lookup: false,
        }
    }

    /// Override the per-command timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[cfg(test)]
    fn with_command_lookup(mut self, enabled: bool) -> Self {
        self.command_lookup = enabled;
        self
    }

    /// Scan all listening TCP ports.
    ///
    /// Never fails: a missing, failing or slow tool yields an empty list.
    pub async fn scan(&self) -> Vec<PortRecord> {
        match self.try_scan().await {
            Ok(records) => records,
            Err(e @ Error::ToolFailed { .. }) => {
                debug!(error = %e, "Port scan failed");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Port scan failed");
                Vec::new()
            }
        }
    }

    /// Scan all listening TCP ports, reporting why a scan produced nothing.
    pub async fn try_scan(&self) -> Result<Vec<PortRecord>> {
        let mut last_error = None;

        for tool in &self.tools {
            match run_command(&tool.program, tool.args.as_slice(), self.timeout).await {
                Ok(stdout) => {
                    let mut records = finalize(tool.parser.parser().parse(&stdout));
                    debug!(tool = %tool.program, count = records.len(), "Parsed listening sockets");

                    if self.command_lookup {
                        self.fill_commands(&mut records).await;
                    }
                    return Ok(records);
                }
                Err(e) if e.allows_fallback() => {
                    debug!(tool = %tool.program, error = %e, "Tool failed, trying next");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Config("No scan tools configured".to_string())))
    }

    /// Fill empty commands of records with a known owner from one `ps` call.
    async fn fill_commands(&self, records: &mut [PortRecord]) {
        if !records.iter().any(needs_command) {
            return;
        }

        let output = match run_command(PS_PROGRAM, PS_ARGS, self.timeout).await {
            Ok(output) => output,
            Err(e) => {
                debug!(error = %e, "Command lookup failed");
                return;
            }
        };

        let commands = parse_ps_output(&output);
        for record in records.iter_mut().filter(|r| needs_command(r)) {
            if let Some(command) = commands.get(&record.pid) {
                record.command = command.clone();
            }
        }
    }
}

impl Default for PortScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl PortScannerPort for PortScanner {
    async fn scan(&self) -> Vec<PortRecord> {
        self.scan().await
    }
}

fn needs_command(record: &PortRecord) -> bool {
    record.has_owner() && record.command.is_empty()
}

/// First record per port wins, then ascending by port.
fn finalize(records: Vec<PortRecord>) -> Vec<PortRecord> {
    let mut records = dedup_by_port(records);
    records.sort_by_key(|r| r.port);
    records
}

/// Run one OS command under `limit` and return its stdout.
async fn run_command<S: AsRef<OsStr>>(program: &str, args: &[S], limit: Duration) -> Result<String> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(windows)]
    command.creation_flags(CREATE_NO_WINDOW);

    let output = match timeout(limit, command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            return Err(Error::ToolUnavailable {
                tool: program.to_string(),
                source,
            })
        }
        Err(_) => {
            return Err(Error::ToolTimeout {
                tool: program.to_string(),
                timeout: limit,
            })
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() || (stdout.trim().is_empty() && !stderr.trim().is_empty()) {
        return Err(Error::ToolFailed {
            tool: program.to_string(),
            status: output.status.to_string(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POSTGRES_ROW: &str =
        r#"LISTEN 0 128 0.0.0.0:5432 0.0.0.0:* users:(("postgres",pid=222,fd=6))"#;

    #[test]
    fn test_platform_tools() {
        let linux = Platform::Linux.tools();
        assert_eq!(linux.len(), 2);
        assert_eq!(linux[0].program, "ss");
        assert_eq!(linux[1].program, "netstat");
        assert_eq!(Platform::MacOs.tools()[0].parser, ParserKind::Lsof);
        assert_eq!(Platform::Windows.tools()[0].parser, ParserKind::Json);
        assert_eq!(Platform::Windows.default_timeout(), Duration::from_secs(15));
        assert!(!Platform::Windows.needs_command_lookup());
    }

    #[test]
    fn test_finalize_sorts_and_dedups() {
        let records = vec![
            PortRecord::new(8080, 1, "a", ""),
            PortRecord::new(22, 2, "b", ""),
            PortRecord::new(8080, 3, "c", ""),
            PortRecord::new(443, 4, "d", ""),
        ];
        let ports: Vec<(u16, u32)> = finalize(records).iter().map(|r| (r.port, r.pid)).collect();
        assert_eq!(ports, vec![(22, 2), (443, 4), (8080, 1)]);
    }

    #[tokio::test]
    async fn test_no_tools_is_empty() {
        let scanner = PortScanner::with_tools(Vec::new(), Duration::from_secs(1));
        assert!(scanner.scan().await.is_empty());
        assert!(scanner.try_scan().await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_yields_empty() {
        let scanner = PortScanner::with_tools(
            vec![ToolSpec::new("sleep", ["5"], ParserKind::SocketStats)],
            Duration::from_millis(100),
        );

        assert!(matches!(
            scanner.try_scan().await,
            Err(Error::ToolTimeout { .. })
        ));
        assert!(scanner.scan().await.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_falls_back_when_tool_missing() {
        let scanner = PortScanner::with_tools(
            vec![
                ToolSpec::new("portpilot-no-such-tool", ["-tlnp"], ParserKind::SocketStats),
                ToolSpec::new("echo", [POSTGRES_ROW], ParserKind::SocketStats),
            ],
            Duration::from_secs(5),
        );

        let records = scanner.scan().await;
        assert_eq!(records, vec![PortRecord::new(5432, 222, "postgres", "")]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_falls_back_on_nonzero_exit() {
        let scanner = PortScanner::with_tools(
            vec![
                ToolSpec::new("false", Vec::<String>::new(), ParserKind::SocketStats),
                ToolSpec::new("echo", [POSTGRES_ROW], ParserKind::SocketStats),
            ],
            Duration::from_secs(5),
        );

        assert_eq!(scanner.scan().await.len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_empty_result_does_not_fall_back() {
        let scanner = PortScanner::with_tools(
            vec![
                ToolSpec::new("true", Vec::<String>::new(), ParserKind::SocketStats),
                ToolSpec::new("echo", [POSTGRES_ROW], ParserKind::SocketStats),
            ],
            Duration::from_secs(5),
        );

        assert!(scanner.scan().await.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_fills_commands_for_known_owners() {
        let own = format!(
            r#"LISTEN 0 128 127.0.0.1:4100 0.0.0.0:* users:(("tests",pid={},fd=3))"#,
            std::process::id()
        );
        let orphan = r#"LISTEN 0 128 127.0.0.1:4101 0.0.0.0:* users:(("ghost",pid=0,fd=3))"#;
        let scanner = PortScanner::with_tools(
            vec![ToolSpec::new(
                "printf",
                ["%s\n%s\n".to_string(), own, orphan.to_string()],
                ParserKind::SocketStats,
            )],
            Duration::from_secs(5),
        )
        .with_command_lookup(true);

        let records = scanner.scan().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].port, 4100);
        assert!(!records[0].command.is_empty());
        assert_eq!(records[1].pid, 0);
        assert_eq!(records[1].command, "");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_lookup_off_leaves_commands_empty() {
        let scanner = PortScanner::with_tools(
            vec![ToolSpec::new("echo", [POSTGRES_ROW], ParserKind::SocketStats)],
            Duration::from_secs(5),
        );
        assert_eq!(scanner.scan().await[0].command, "");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_all_tools_fail() {
        let scanner = PortScanner::with_tools(
            vec![
                ToolSpec::new("portpilot-no-such-tool", ["-tlnp"], ParserKind::SocketStats),
                ToolSpec::new("false", Vec::<String>::new(), ParserKind::SocketStats),
            ],
            Duration::from_secs(5),
        );

        assert!(matches!(
            scanner.try_scan().await,
            Err(Error::ToolFailed { .. })
        ));
        assert!(scanner.scan().await.is_empty());
    }
}
