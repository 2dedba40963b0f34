//! Linux listing: `ss` (preferred) or `netstat` (fallback).

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::domain::PortRecord;

use super::utils::{dedup_by_port, parse_port};
use super::{OutputParser, ParserKind, ToolSpec};

/// ss row: `LISTEN 0 128 0.0.0.0:5432 0.0.0.0:* users:(("postgres",pid=222,fd=6))`
static SS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"LISTEN\s+\d+\s+\d+\s+\S+:(\d+)\s+.*users:\(\("([^"]+)",pid=(\d+)"#).unwrap()
});

/// netstat row tail: `LISTEN      1234/node`
static NETSTAT_OWNER: Lazy<Regex> = Lazy::new(|| Regex::new(r"LISTEN\s+(\d+)/(\S+)\s*$").unwrap());

/// First `:<port>` followed by whitespace, i.e. the local address column.
static NETSTAT_PORT: Lazy<Regex> = Lazy::new(|| Regex::new(r":(\d+)\s").unwrap());

/// The ss tool invocation.
///
/// Flags explained:
/// -t, --tcp           display only TCP sockets
/// -l, --listening     display listening sockets
/// -n, --numeric       don't resolve service names
/// -p, --processes     show process using socket
pub fn ss_tool() -> ToolSpec {
    ToolSpec::new("ss", ["-tlnp"], ParserKind::SocketStats)
}

/// The legacy netstat tool invocation, same flags as ss.
pub fn netstat_tool() -> ToolSpec {
    ToolSpec::new("netstat", ["-tlnp"], ParserKind::SocketStats)
}

/// Parser for ss and netstat listings.
///
/// Expected output formats:
/// ```text
/// State  Recv-Q Send-Q Local Address:Port  Peer Address:Port Process
/// LISTEN 0      4096   127.0.0.1:3000      0.0.0.0:*         users:(("node",pid=1234,fd=17))
///
/// Proto Recv-Q Send-Q Local Address    Foreign Address  State   PID/Program name
/// tcp        0      0 0.0.0.0:3000     0.0.0.0:*        LISTEN  1234/node
/// ```
///
/// Both shapes are tried on every line, ss first. Headers and rows without an
/// owning process match neither and are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct SocketStatsParser;

impl SocketStatsParser {
    fn parse_ss_line(line: &str) -> Option<PortRecord> {
        let caps = SS_LINE.captures(line)?;
        let port = parse_port(&caps[1])?;
        let pid = caps[3].parse().ok()?;
        Some(PortRecord::new(port, pid, &caps[2], ""))
    }

    fn parse_netstat_line(line: &str) -> Option<PortRecord> {
        let owner = NETSTAT_OWNER.captures(line)?;
        let port_caps = NETSTAT_PORT.captures(line)?;
        let port = parse_port(&port_caps[1])?;
        let pid = owner[1].parse().ok()?;
        Some(PortRecord::new(port, pid, &owner[2], ""))
    }
}

impl OutputParser for SocketStatsParser {
    fn parse(&self, raw: &str) -> Vec<PortRecord> {
        dedup_by_port(raw.lines().filter_map(|line| {
            let record = Self::parse_ss_line(line).or_else(|| Self::parse_netstat_line(line));
            if record.is_none() && !line.trim().is_empty() {
                trace!(line = %line, "Skipping unmatched line");
            }
            record
        }))
    }
}
