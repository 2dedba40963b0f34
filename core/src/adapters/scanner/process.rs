//! Command-line lookup for owning processes via `ps`.

use std::collections::HashMap;

use super::utils::truncate_command;

/// `ps` listing every process as `<pid> <command>` without a header.
pub const PS_PROGRAM: &str = "ps";
pub const PS_ARGS: &[&str] = &["-axo", "pid=,command="];

/// Parse `ps -axo pid=,command=` output into a PID -> command map.
///
/// Expected output format:
/// ```text
///   1 /sbin/launchd
/// 501 /usr/local/bin/node server.js
/// ```
///
/// Commands longer than 200 characters are truncated.
pub fn parse_ps_output(output: &str) -> HashMap<u32, String> {
    let mut commands = HashMap::new();

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        // Split into PID and command (only first split)
        let mut parts = trimmed.splitn(2, char::is_whitespace);
        let pid: u32 = match parts.next().map(str::parse) {
            Some(Ok(p)) => p,
            _ => continue,
        };
        let command = match parts.next().map(str::trim) {
            Some(c) if !c.is_empty() => c,
            _ => continue,
        };

        commands.insert(pid, truncate_command(command));
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ps_output() {
        let output = "    1 /sbin/launchd\n  501 /usr/local/bin/node   server.js --port 3000\nPID COMMAND\n  777\n";
        let commands = parse_ps_output(output);

        assert_eq!(commands.len(), 2);
        assert_eq!(commands.get(&1).map(String::as_str), Some("/sbin/launchd"));
        assert_eq!(
            commands.get(&501).map(String::as_str),
            Some("/usr/local/bin/node   server.js --port 3000")
        );
    }

    #[test]
    fn test_truncates_long_commands() {
        let output = format!("42 {}", "a".repeat(300));
        let commands = parse_ps_output(&output);
        assert!(commands[&42].ends_with("..."));
    }
}
