//! Common utilities shared by the runner, the CLI and the store

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};
