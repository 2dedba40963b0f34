//! Windows listing: PowerShell `Get-NetTCPConnection` joined with `Get-Process`,
//! emitted as JSON.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::domain::PortRecord;

use super::utils::dedup_by_port;
use super::{OutputParser, ParserKind, ToolSpec};

/// PowerShell pipeline producing one JSON object per listening socket.
///
/// Name and path are null when the owning process cannot be resolved.
const POWERSHELL_SCRIPT: &str = "Get-NetTCPConnection -State Listen -ErrorAction SilentlyContinue | \
ForEach-Object { $proc = Get-Process -Id $_.OwningProcess -ErrorAction SilentlyContinue; \
[PSCustomObject]@{LocalPort=$_.LocalPort; OwningProcessId=$_.OwningProcess; \
ProcessName=$(if($proc){$proc.ProcessName}else{$null}); \
ProcessPath=$(if($proc){$proc.Path}else{$null})} } | ConvertTo-Json -Compress";

/// The PowerShell tool invocation.
pub fn powershell_tool() -> ToolSpec {
    ToolSpec::new(
        "powershell",
        ["-NoProfile", "-NonInteractive", "-Command", POWERSHELL_SCRIPT],
        ParserKind::Json,
    )
}

/// One socket entry. Older scripts emitted `Port`/`PID`/`Name`/`Path`.
#[derive(Debug, Deserialize)]
struct SocketEntry {
    #[serde(rename = "LocalPort", alias = "Port", default)]
    local_port: Option<u64>,
    #[serde(rename = "OwningProcessId", alias = "PID", default)]
    owning_process_id: Option<u64>,
    #[serde(rename = "ProcessName", alias = "Name", default)]
    process_name: Option<String>,
    #[serde(rename = "ProcessPath", alias = "Path", default)]
    process_path: Option<String>,
}

impl SocketEntry {
    fn into_record(self) -> Option<PortRecord> {
        let port = self
            .local_port
            .and_then(|p| u16::try_from(p).ok())
            .filter(|&p| p != 0)?;
        let pid = self
            .owning_process_id
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(0);
        let name = self
            .process_name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "unknown".to_string());
        let command = self.process_path.unwrap_or_default();

        Some(PortRecord::new(port, pid, name, command))
    }
}

/// Parser for the structured JSON listing.
///
/// Accepts an array or a single object (PowerShell collapses one-element
/// arrays). Entries without a usable port are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonParser;

impl OutputParser for JsonParser {
    fn parse(&self, raw: &str) -> Vec<PortRecord> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Vec::new();
        }

        let entries = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(items)) => items,
            Ok(obj @ Value::Object(_)) => vec![obj],
            Ok(other) => {
                debug!(kind = ?other, "Unexpected JSON document, ignoring");
                return Vec::new();
            }
            Err(e) => {
                debug!(error = %e, "Invalid JSON in socket listing");
                return Vec::new();
            }
        };

        dedup_by_port(entries.into_iter().filter_map(|value| {
            match serde_json::from_value::<SocketEntry>(value) {
                Ok(entry) => entry.into_record(),
                Err(e) => {
                    trace!(error = %e, "Skipping malformed socket entry");
                    None
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_array() {
        let output = r#"[{"LocalPort":3000,"OwningProcessId":111,"ProcessName":"node","ProcessPath":"C:\\Program Files\\nodejs\\node.exe"},{"LocalPort":135,"OwningProcessId":1020,"ProcessName":"svchost","ProcessPath":null}]"#;

        let ports = JsonParser.parse(output);
        assert_eq!(ports.len(), 2);
        assert_eq!(
            ports[0],
            PortRecord::new(3000, 111, "node", r"C:\Program Files\nodejs\node.exe")
        );
        assert_eq!(ports[1], PortRecord::new(135, 1020, "svchost", ""));
    }

    #[test]
    fn test_single_object_and_legacy_names() {
        let output = r#"{"LocalPort":3000,"OwningProcessId":111,"ProcessName":"node","Path":"/usr/bin/node"}"#;
        let ports = JsonParser.parse(output);
        assert_eq!(ports, vec![PortRecord::new(3000, 111, "node", "/usr/bin/node")]);

        let legacy = r#"[{"Port":8080,"PID":42,"Name":"java","Path":""}]"#;
        let ports = JsonParser.parse(legacy);
        assert_eq!(ports, vec![PortRecord::new(8080, 42, "java", "")]);
    }

    #[test]
    fn test_defaults_for_unresolved_process() {
        let output = r#"[{"LocalPort":445,"OwningProcessId":4,"ProcessName":null,"ProcessPath":null}]"#;
        let ports = JsonParser.parse(output);
        assert_eq!(ports, vec![PortRecord::new(445, 4, "unknown", "")]);
    }

    #[test]
    fn test_skips_bad_entries() {
        let output = r#"[
            {"OwningProcessId":1,"ProcessName":"noport"},
            {"LocalPort":0,"OwningProcessId":2},
            {"LocalPort":"oops","OwningProcessId":3},
            null,
            {"LocalPort":5000,"OwningProcessId":5,"ProcessName":"python"}
        ]"#;
        let ports = JsonParser.parse(output);
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].port, 5000);
    }

    #[test]
    fn test_duplicate_ports_keep_first() {
        let output = r#"[{"LocalPort":3000,"OwningProcessId":1,"ProcessName":"node"},{"LocalPort":3000,"OwningProcessId":2,"ProcessName":"other"}]"#;
        let ports = JsonParser.parse(output);
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].pid, 1);
    }

    #[test]
    fn test_empty_and_invalid() {
        assert!(JsonParser.parse("").is_empty());
        assert!(JsonParser.parse("   \r\n").is_empty());
        assert!(JsonParser.parse("not json").is_empty());
        assert!(JsonParser.parse("42").is_empty());
    }
}
