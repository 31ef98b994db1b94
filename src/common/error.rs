//! Error types for the scenario harness
//!
//! Messages are meant to point at the suite, key or rule involved so that a
//! failing run can be traced back to a specific parameter combination.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Plan Errors ===
    #[error("Failed to parse plan '{path}': {reason}")]
    PlanParse { path: String, reason: String },

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    // === Matrix Errors ===
    #[error("Suite '{0}' declares an empty scenario matrix")]
    EmptyMatrix(String),

    #[error("Scenario {index} of suite '{suite}' has keys [{found}], expected [{expected}]")]
    MatrixShape {
        suite: String,
        index: usize,
        expected: String,
        found: String,
    },

    // === Interception Errors ===
    #[error("Invalid URL pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid structural path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Upstream request to {url} failed: {reason}")]
    Upstream { url: String, reason: String },

    // === State Errors ===
    #[error("State '{0}' is absent. The suite producing it has not run or its snapshot was not restored")]
    MissingState(String),

    #[error("State key '{0}' is not declared in the plan's key schema")]
    UndeclaredKey(String),

    #[error("Failed to write snapshot '{path}': {error}")]
    SnapshotWrite { path: String, error: String },

    // === Session Errors ===
    #[error("Browser session is closed")]
    SessionClosed,

    // === Scheduling Errors ===
    #[error("Key '{key}' is produced by both '{first}' and '{second}'")]
    DuplicateProducer {
        key: String,
        first: String,
        second: String,
    },

    #[error("Suite '{suite}' consumes '{key}' but no suite in the plan produces it")]
    UnmetDependency { suite: String, key: String },

    #[error("Dependency cycle between suites: {0}")]
    DependencyCycle(String),

    // === Timeout Errors ===
    #[error("Suite '{label}' timed out after {secs} seconds")]
    SuiteTimeout { label: String, secs: f64 },

    #[error("{failed} of {total} suite(s) failed")]
    RunFailed { failed: usize, total: usize },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Test Errors ===
    #[error("Assertion failed: {0}")]
    TestAssertion(String),
}

impl Error {
    /// Create a plan parse error for a file
    pub fn plan_parse(path: &std::path::Path, reason: impl ToString) -> Self {
        Self::PlanParse {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern(pattern: &str, reason: impl ToString) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid structural path error
    pub fn invalid_path(path: &str, reason: impl ToString) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an upstream failure error
    pub fn upstream(url: &str, reason: impl ToString) -> Self {
        Self::Upstream {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error is an assertion-level failure inside a workflow
    /// rather than an infrastructure problem
    pub fn is_assertion(&self) -> bool {
        matches!(
            self,
            Self::TestAssertion(_) | Self::MissingState(_) | Self::UndeclaredKey(_)
        )
    }
}
