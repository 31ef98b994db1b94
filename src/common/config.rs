//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::{config_path, default_snapshot_path};
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Durable snapshot settings
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Upstream HTTP settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Run log settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Snapshot file settings
#[derive(Debug, Deserialize)]
pub struct SnapshotConfig {
    /// Path of the snapshot file shared between runs
    #[serde(default = "default_snapshot_path")]
    pub path: PathBuf,

    /// Whether suites restore the snapshot unless their plan says otherwise
    #[serde(default = "default_restore")]
    pub restore_by_default: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: default_snapshot_path(),
            restore_by_default: default_restore(),
        }
    }
}

fn default_restore() -> bool {
    true
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize)]
pub struct Timeouts {
    /// Upper bound for one whole suite, session setup and teardown included
    #[serde(default = "default_suite")]
    pub suite_secs: u64,

    /// Upper bound for a single upstream request
    #[serde(default = "default_request")]
    pub request_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            suite_secs: default_suite(),
            request_secs: default_request(),
        }
    }
}

fn default_suite() -> u64 {
    300
}
fn default_request() -> u64 {
    30
}

/// Upstream HTTP configuration
#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    /// Base URL that relative step URLs are resolved against
    pub base_url: Option<String>,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    concat!("scenario-harness/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Run log configuration
#[derive(Debug, Deserialize, Default)]
pub struct LoggingConfig {
    /// Also write a detailed log file under the data directory
    #[serde(default)]
    pub file: bool,
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.timeouts.suite_secs, 300);
        assert_eq!(config.timeouts.request_secs, 30);
        assert!(config.snapshot.restore_by_default);
        assert_eq!(config.snapshot.path, default_snapshot_path());
        assert!(config.http.base_url.is_none());
        assert!(!config.logging.file);
    }

    #[test]
    fn test_partial_config_overrides() {
        let config = Config::parse(
            r#"
            [snapshot]
            path = "/tmp/state.json"

            [timeouts]
            suite_secs = 60

            [http]
            base_url = "http://localhost:8080"
            "#,
        )
        .unwrap();
        assert_eq!(config.snapshot.path, PathBuf::from("/tmp/state.json"));
        assert!(config.snapshot.restore_by_default);
        assert_eq!(config.timeouts.suite_secs, 60);
        assert_eq!(config.timeouts.request_secs, 30);
        assert_eq!(config.http.base_url.as_deref(), Some("http://localhost:8080"));
    }

    #[test]
    fn test_invalid_config_is_parse_error() {
        let err = Config::parse("[timeouts]\nsuite_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, crate::common::Error::ConfigParse(_)));
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = Config::load_from(Path::new("/nonexistent/harness.toml")).unwrap_err();
        assert!(matches!(err, crate::common::Error::FileRead { .. }));
    }
}
