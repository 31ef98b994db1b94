//! Configuration, log and snapshot paths
//!
//! Config and logs live in platform directories; the snapshot defaults to a
//! path relative to the working directory so it travels with the project
//! whose suites produced it.

use std::path::PathBuf;

/// Name used for platform directories
const APP_NAME: &str = "scenario-harness";

/// Directory holding the default snapshot, relative to the working directory
const STATE_DIR: &str = ".harness";

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/scenario-harness/`
/// - macOS: `~/Library/Application Support/scenario-harness/`
/// - Windows: `%APPDATA%\scenario-harness\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the path to the log directory
pub fn log_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.data_dir().join("logs"))
}

/// Default location of the durable snapshot file
pub fn default_snapshot_path() -> PathBuf {
    PathBuf::from(STATE_DIR).join("storage-state.json")
}
