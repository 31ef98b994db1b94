//! Scenario harness - orchestration core for stateful browser acceptance suites
//!
//! Fans suites out over scenario matrices, rewrites backend responses in
//! flight to force feature-flag branches, and hands entity identifiers from
//! one suite to later ones through a durable storage snapshot.

pub mod cli;
pub mod commands;
pub mod common;
pub mod driver;
pub mod intercept;
pub mod scenario;
pub mod state;
pub mod suite;
pub mod upstream;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use scenario::{ScenarioMatrix, ScenarioParameterSet};
