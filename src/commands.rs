//! CLI command definitions
//!
//! Defines the clap commands for the harness CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the suites of a plan file
    Run {
        /// Path to the YAML plan
        plan: PathBuf,

        /// Only run suites whose id contains this text
        #[arg(long, short)]
        filter: Option<String>,

        /// Snapshot file (overrides plan and configuration)
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Base URL for relative request URLs (overrides plan and configuration)
        #[arg(long)]
        base_url: Option<String>,

        /// Per-suite timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Verbose output
        #[arg(long, short)]
        verbose: bool,

        /// Print the run report as JSON instead of progress output
        #[arg(long)]
        json: bool,
    },

    /// Show the execution order of a plan without running it
    Plan {
        /// Path to the YAML plan
        plan: PathBuf,

        /// Only show suites whose id contains this text
        #[arg(long, short)]
        filter: Option<String>,
    },

    /// Inspect or reset the durable snapshot
    #[command(subcommand)]
    State(StateCommands),

    /// View the run log
    Logs {
        /// Number of lines to show
        #[arg(long, short = 'n', default_value = "50")]
        lines: usize,

        /// Clear the log file
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Subcommand)]
pub enum StateCommands {
    /// List all entries and credential names in the snapshot
    Show {
        /// Snapshot file (default from configuration)
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Use the snapshot named by this plan file
        #[arg(long, conflicts_with = "snapshot")]
        plan: Option<PathBuf>,

        /// Print the raw snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print one entry's value
    Get {
        /// Entry name
        name: String,

        /// Snapshot file (default from configuration)
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Use the snapshot named by this plan file
        #[arg(long, conflicts_with = "snapshot")]
        plan: Option<PathBuf>,
    },

    /// Delete the snapshot file
    Clear {
        /// Snapshot file (default from configuration)
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Use the snapshot named by this plan file
        #[arg(long, conflicts_with = "snapshot")]
        plan: Option<PathBuf>,
    },
}
