//! Scenario harness CLI
//!
//! Runs YAML suite plans: scenario fan-out, response mutation and snapshot
//! handoff between suites.

use clap::Parser;
use harness::{cli, commands::Commands, common::config::Config, common::logging};

#[derive(Parser)]
#[command(name = "harness", about = "Scenario matrix runner for browser acceptance suites")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let verbose = matches!(cli.command, Commands::Run { verbose: true, .. });
    let guard = if config.logging.file {
        logging::init_with_run_log(verbose).map(|(_, guard)| guard)
    } else {
        logging::init_cli(verbose);
        None
    };

    let result = cli::dispatch(cli.command, &config).await;
    drop(guard);

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
