use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::PortRecord;

/// Trailing `:<digits>` of an address such as `*:3000` or `[::1]:8080`.
static PORT_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r":(\d+)$").unwrap());

/// Commands longer than this are truncated.
pub const MAX_COMMAND_LEN: usize = 200;

/// Extract the port from an address ending in `:<digits>`.
///
/// Returns `None` when there is no numeric suffix or it is not a valid
/// non-zero TCP port.
pub fn port_suffix(address: &str) -> Option<u16> {
    let caps = PORT_SUFFIX.captures(address.trim_end())?;
    parse_port(&caps[1])
}

/// Parse a decimal port in the range 1..=65535.
pub fn parse_port(digits: &str) -> Option<u16> {
    match digits.parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(port) => Some(port),
    }
}

/// Keep the first record for each port, preserving output order.
pub fn dedup_by_port(records: impl IntoIterator<Item = PortRecord>) -> Vec<PortRecord> {
    let mut seen: HashSet<u16> = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.port))
        .collect()
}

/// Decode lsof's `\xNN` escapes (e.g. `Code\x20Helper`).
pub fn unescape_lsof(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut rest = name;

    while let Some(idx) = rest.find("\\x") {
        out.push_str(&rest[..idx]);
        let decoded = rest
            .get(idx + 2..idx + 4)
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            .filter(u8::is_ascii);
        match decoded {
            Some(byte) => {
                out.push(byte as char);
                rest = &rest[idx + 4..];
            }
            None => {
                out.push_str("\\x");
                rest = &rest[idx + 2..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Truncate a command line to `MAX_COMMAND_LEN` characters.
pub fn truncate_command(command: &str) -> String {
    match command.char_indices().nth(MAX_COMMAND_LEN) {
        Some((idx, _)) => format!("{}...", &command[..idx]),
        None => command.to_string(),
    }
}
