//! macOS listing: `lsof` in field-output mode.

use tracing::trace;

use crate::domain::PortRecord;

use super::utils::{dedup_by_port, port_suffix, unescape_lsof};
use super::{OutputParser, ParserKind, ToolSpec};

/// The lsof tool invocation.
///
/// Flags explained:
/// - -iTCP -sTCP:LISTEN: only listening TCP sockets
/// - -n -P: numeric hosts and ports
/// - -Fpcn: emit pid, command name and network address fields
pub fn lsof_tool() -> ToolSpec {
    ToolSpec::new(
        "/usr/sbin/lsof",
        ["-iTCP", "-sTCP:LISTEN", "-n", "-P", "-Fpcn"],
        ParserKind::Lsof,
    )
}

/// Process context carried from one line to the next.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct BlockState {
    current_pid: u32,
    current_name: String,
}

/// Parser for lsof field output.
///
/// Expected lsof output format (one field per line, prefixed by its tag):
/// ```text
/// p34805
/// cnode
/// f19
/// n*:3000
/// f20
/// n[::1]:3000
/// ```
///
/// A `p` line opens a new process block and clears the name, a `c` line sets
/// the name, and every `n` line ending in `:<port>` yields a record owned by
/// the current block.
#[derive(Debug, Default, Clone, Copy)]
pub struct LsofParser;

impl OutputParser for LsofParser {
    fn parse(&self, raw: &str) -> Vec<PortRecord> {
        let (_, records) = raw.lines().fold(
            (BlockState::default(), Vec::new()),
            |(mut state, mut records), line| {
                let line = line.trim_end_matches('\r');
                let (tag, value) = match line.char_indices().nth(1) {
                    Some((idx, _)) => line.split_at(idx),
                    None => (line, ""),
                };

                match tag {
                    "p" => {
                        state = BlockState {
                            current_pid: value.trim().parse().unwrap_or(0),
                            current_name: String::new(),
                        };
                    }
                    "c" => state.current_name = unescape_lsof(value),
                    "n" => match port_suffix(value) {
                        Some(port) => records.push(PortRecord::new(
                            port,
                            state.current_pid,
                            state.current_name.clone(),
                            "",
                        )),
                        None => trace!(line = %line, "Skipping address without port"),
                    },
                    _ => {}
                }

                (state, records)
            },
        );

        dedup_by_port(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lsof_fields() {
        let output = "p34805\ncnode\nf19\nn*:3000\np1\ncnginx\nf6\nn*:80\n";

        let ports = LsofParser.parse(output);
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0], PortRecord::new(3000, 34805, "node", ""));
        assert_eq!(ports[1], PortRecord::new(80, 1, "nginx", ""));
    }

    #[test]
    fn test_pid_carries_over_addresses() {
        let output = "p500\ncpostgres\nf7\nn127.0.0.1:5432\nf8\nn[::1]:5433\n";
        let ports = LsofParser.parse(output);
        assert_eq!(ports.len(), 2);
        assert!(ports.iter().all(|p| p.pid == 500 && p.name == "postgres"));
    }

    #[test]
    fn test_name_reset_by_new_process() {
        // Second block has no command line.
        let output = "p10\ncruby\nn*:4567\np11\nn*:9000\n";
        let ports = LsofParser.parse(output);
        assert_eq!(ports[1], PortRecord::new(9000, 11, "", ""));
    }

    #[test]
    fn test_address_before_any_process() {
        let ports = LsofParser.parse("n*:7000\n");
        assert_eq!(ports, vec![PortRecord::new(7000, 0, "", "")]);
    }

    #[test]
    fn test_unescape_process_name() {
        let output = "p1234\ncCode\\x20Helper\nf10\nn*:3000\n";
        let ports = LsofParser.parse(output);
        assert_eq!(ports[0].name, "Code Helper");
    }

    #[test]
    fn test_deduplication() {
        // IPv4 and IPv6 views of the same socket
        let output = "p1234\ncnode\nf19\nn127.0.0.1:3000\nf20\nn[::1]:3000\np99\ncother\nn*:3000\n";
        let ports = LsofParser.parse(output);
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].pid, 1234);
    }

    #[test]
    fn test_skips_malformed_lines() {
        let output = "pabc\ncnode\nn*:*\nnlocalhost\n\nx\nn*:8080\r\n";
        let ports = LsofParser.parse(output);
        assert_eq!(ports, vec![PortRecord::new(8080, 0, "node", "")]);
    }
}
