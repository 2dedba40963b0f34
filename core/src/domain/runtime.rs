//! Runtime classification based on process names and command lines.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::PortRecord;
use crate::error::Error;

/// Coarse classification of the platform a listening process belongs to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeTag {
    Node,
    Python,
    Java,
    Ruby,
    Go,
    Dotnet,
    Database,
    #[serde(rename = "webserver")]
    WebServer,
    #[default]
    Other,
}

/// Language runtimes in matching order, with the token each one is matched by.
const RUNTIME_TOKENS: &[(&str, RuntimeTag)] = &[
    ("node", RuntimeTag::Node),
    ("python", RuntimeTag::Python),
    ("java", RuntimeTag::Java),
    ("ruby", RuntimeTag::Ruby),
    ("go", RuntimeTag::Go),
    ("dotnet", RuntimeTag::Dotnet),
    // Launchers whose names extend a runtime token
    ("nodemon", RuntimeTag::Node),
    ("ts-node", RuntimeTag::Node),
    ("gopls", RuntimeTag::Go),
];

/// Tokens that match any suffix (`python3`, `pythonw`).
const PREFIX_TOKENS: &[&str] = &["python"];

const DATABASE_NAMES: &[&str] = &[
    "postgres",
    "mysqld",
    "mongod",
    "redis-server",
    "mariadbd",
    "memcached",
];

const WEBSERVER_NAMES: &[&str] = &["nginx", "apache", "apache2", "httpd", "caddy", "lighttpd"];

impl RuntimeTag {
    /// All available runtime tags.
    pub const ALL: [RuntimeTag; 9] = [
        RuntimeTag::Node,
        RuntimeTag::Python,
        RuntimeTag::Java,
        RuntimeTag::Ruby,
        RuntimeTag::Go,
        RuntimeTag::Dotnet,
        RuntimeTag::Database,
        RuntimeTag::WebServer,
        RuntimeTag::Other,
    ];

    /// Classify a process from its short name and command line.
    ///
    /// Matching is case-insensitive and evaluated in a fixed order, first
    /// match wins:
    /// 1. runtime tokens against `name`,
    /// 2. runtime tokens against the components of `command`,
    /// 3. well-known database process names,
    /// 4. well-known web server process names.
    ///
    /// # Examples
    /// ```
    /// use portpilot_core::RuntimeTag;
    ///
    /// assert_eq!(RuntimeTag::detect("node", ""), RuntimeTag::Node);
    /// assert_eq!(RuntimeTag::detect("Python3.12", ""), RuntimeTag::Python);
    /// assert_eq!(RuntimeTag::detect("postgres", ""), RuntimeTag::Database);
    /// assert_eq!(RuntimeTag::detect("launchd", ""), RuntimeTag::Other);
    /// ```
    pub fn detect(name: &str, command: &str) -> Self {
        let name = normalize(name);

        if let Some(tag) = match_runtime(&[name.as_str()]) {
            return tag;
        }

        let command = command.to_lowercase();
        let components: Vec<&str> = command
            .split(|c: char| c.is_whitespace() || c == '/' || c == '\\')
            .filter(|c| !c.is_empty())
            .map(|c| c.strip_suffix(".exe").unwrap_or(c))
            .collect();
        if let Some(tag) = match_runtime(&components) {
            return tag;
        }

        if DATABASE_NAMES.contains(&name.as_str()) {
            return RuntimeTag::Database;
        }
        if WEBSERVER_NAMES.contains(&name.as_str()) {
            return RuntimeTag::WebServer;
        }

        RuntimeTag::Other
    }

    /// Lowercase identifier (e.g., "node", "webserver").
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeTag::Node => "node",
            RuntimeTag::Python => "python",
            RuntimeTag::Java => "java",
            RuntimeTag::Ruby => "ruby",
            RuntimeTag::Go => "go",
            RuntimeTag::Dotnet => "dotnet",
            RuntimeTag::Database => "database",
            RuntimeTag::WebServer => "webserver",
            RuntimeTag::Other => "other",
        }
    }

    /// Get the display name for this runtime tag.
    pub fn display_name(&self) -> &'static str {
        match self {
            RuntimeTag::Node => "Node.js",
            RuntimeTag::Python => "Python",
            RuntimeTag::Java => "Java",
            RuntimeTag::Ruby => "Ruby",
            RuntimeTag::Go => "Go",
            RuntimeTag::Dotnet => ".NET",
            RuntimeTag::Database => "Database",
            RuntimeTag::WebServer => "Web Server",
            RuntimeTag::Other => "Other",
        }
    }

    /// Get an icon identifier for this runtime tag.
    pub fn icon(&self) -> &'static str {
        match self {
            RuntimeTag::Database => "database",
            RuntimeTag::WebServer => "globe",
            RuntimeTag::Other => "plug",
            _ => "symbol-event",
        }
    }
}

impl std::fmt::Display for RuntimeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuntimeTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        RuntimeTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == wanted)
            .ok_or_else(|| Error::Config(format!("Unknown runtime '{}'", s.trim())))
    }
}

/// Classify a port record by its owning process.
pub fn classify(record: &PortRecord) -> RuntimeTag {
    RuntimeTag::detect(&record.name, &record.command)
}

/// Lowercase a process name and drop a Windows `.exe` suffix.
pub(crate) fn normalize(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    match lower.strip_suffix(".exe") {
        Some(stem) => stem.to_string(),
        None => lower,
    }
}

fn match_runtime(components: &[&str]) -> Option<RuntimeTag> {
    RUNTIME_TOKENS.iter().find_map(|&(token, tag)| {
        components
            .iter()
            .any(|c| matches_token(c, token))
            .then_some(tag)
    })
}

/// `component` is `token`, or `token` followed by a non-letter
/// (`node_modules`, `go1.22`, `java-17`).
fn matches_token(component: &str, token: &str) -> bool {
    let Some(rest) = component.strip_prefix(token) else {
        return false;
    };
    if PREFIX_TOKENS.contains(&token) {
        return true;
    }
    rest.chars().next().map_or(true, |c| !c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_runtimes_by_name() {
        assert_eq!(RuntimeTag::detect("node", ""), RuntimeTag::Node);
        assert_eq!(RuntimeTag::detect("node.exe", ""), RuntimeTag::Node);
        assert_eq!(RuntimeTag::detect("python3", ""), RuntimeTag::Python);
        assert_eq!(RuntimeTag::detect("pythonw", ""), RuntimeTag::Python);
        assert_eq!(RuntimeTag::detect("java", ""), RuntimeTag::Java);
        assert_eq!(RuntimeTag::detect("ruby", ""), RuntimeTag::Ruby);
        assert_eq!(RuntimeTag::detect("go", ""), RuntimeTag::Go);
        assert_eq!(RuntimeTag::detect("dotnet", ""), RuntimeTag::Dotnet);
    }

    #[test]
    fn test_detect_runtimes_by_command() {
        assert_eq!(
            RuntimeTag::detect("vite", "/app/node_modules/.bin/vite --port 5173"),
            RuntimeTag::Node
        );
        assert_eq!(
            RuntimeTag::detect("uvicorn", "/usr/bin/python3.12 -m uvicorn main:app"),
            RuntimeTag::Python
        );
        assert_eq!(
            RuntimeTag::detect("main", "/tmp/go-build123/b001/exe/main"),
            RuntimeTag::Go
        );
        assert_eq!(
            RuntimeTag::detect("MyApi", r"C:\Program Files\dotnet\dotnet.exe MyApi.dll"),
            RuntimeTag::Dotnet
        );
    }

    #[test]
    fn test_name_checked_before_command() {
        assert_eq!(
            RuntimeTag::detect("ruby", "/opt/node/shims/ruby"),
            RuntimeTag::Ruby
        );
    }

    #[test]
    fn test_token_boundaries() {
        assert_eq!(RuntimeTag::detect("mongod", "/usr/bin/mongod"), RuntimeTag::Database);
        assert_eq!(RuntimeTag::detect("chrome", "/opt/google/chrome/chrome"), RuntimeTag::Other);
        assert_eq!(RuntimeTag::detect("goland", ""), RuntimeTag::Other);
    }

    #[test]
    fn test_detect_databases_and_webservers() {
        assert_eq!(RuntimeTag::detect("postgres", ""), RuntimeTag::Database);
        assert_eq!(RuntimeTag::detect("mysqld", ""), RuntimeTag::Database);
        assert_eq!(RuntimeTag::detect("redis-server", ""), RuntimeTag::Database);
        assert_eq!(RuntimeTag::detect("nginx", ""), RuntimeTag::WebServer);
        assert_eq!(RuntimeTag::detect("httpd", ""), RuntimeTag::WebServer);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(RuntimeTag::detect("NODE", ""), RuntimeTag::detect("node", ""));
        assert_eq!(RuntimeTag::detect("NGINX", ""), RuntimeTag::WebServer);
        assert_eq!(RuntimeTag::detect("Postgres", ""), RuntimeTag::Database);
    }

    #[test]
    fn test_detect_other() {
        assert_eq!(RuntimeTag::detect("", ""), RuntimeTag::Other);
        assert_eq!(RuntimeTag::detect("unknown", ""), RuntimeTag::Other);
        assert_eq!(RuntimeTag::detect("svchost", r"C:\Windows\System32\svchost.exe"), RuntimeTag::Other);
    }

    #[test]
    fn test_detect_launchers() {
        assert_eq!(
            RuntimeTag::detect("", "/usr/local/bin/nodemon app.js"),
            RuntimeTag::Node
        );
        assert_eq!(
            RuntimeTag::detect("nodemon", "/usr/local/bin/nodemon app.js"),
            RuntimeTag::Node
        );
        assert_eq!(RuntimeTag::detect("ts-node", ""), RuntimeTag::Node);
        assert_eq!(RuntimeTag::detect("gopls", "gopls serve -listen :37374"), RuntimeTag::Go);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Node".parse::<RuntimeTag>().unwrap(), RuntimeTag::Node);
        assert_eq!(" webserver ".parse::<RuntimeTag>().unwrap(), RuntimeTag::WebServer);
        assert!("cobol".parse::<RuntimeTag>().is_err());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&RuntimeTag::WebServer).unwrap(), "\"webserver\"");
        assert_eq!(serde_json::to_string(&RuntimeTag::Dotnet).unwrap(), "\"dotnet\"");
    }
}
