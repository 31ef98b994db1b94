//! CLI command handling
//!
//! Dispatches CLI commands to the runner and the snapshot store and formats
//! output.

use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::commands::{Commands, StateCommands};
use crate::common::{config::Config, logging, Error, Result};
use crate::driver::HeadlessDriver;
use crate::state::{RestoreOutcome, SnapshotFile};
use crate::suite::{schedule, MatrixRunner, Plan, RunOptions, SuiteUnit};
use crate::upstream::HttpUpstream;

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Run {
            plan,
            filter,
            snapshot,
            base_url,
            timeout,
            verbose: _,
            json,
        } => {
            let plan_file = Plan::load(&plan)?;
            let units = plan_file.compile(config.snapshot.restore_by_default)?;
            let schedule = schedule(&units, filter.as_deref())?;

            let snapshot = SnapshotFile::new(
                snapshot
                    .or_else(|| plan_file.snapshot.clone())
                    .unwrap_or_else(|| config.snapshot.path.clone()),
            );
            let base_url = base_url
                .or_else(|| plan_file.base_url.clone())
                .or_else(|| config.http.base_url.clone());

            let upstream = HttpUpstream::new(&config.http, config.timeouts.request_secs)?;
            let driver = HeadlessDriver::new(Arc::new(upstream));
            let options = RunOptions {
                suite_timeout: Duration::from_secs(timeout.unwrap_or(config.timeouts.suite_secs)),
                base_url,
                schema: plan_file.schema()?,
                echo: !json,
            };

            tracing::info!(
                plan = %plan_file.name,
                suites = schedule.order.len(),
                snapshot = %snapshot.path().display(),
                "starting run"
            );

            let runner = MatrixRunner::new(&driver, snapshot, options);
            let report = runner.run_plan(&plan_file.name, &units, &schedule).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                report.print_summary();
            }

            if report.all_passed() {
                Ok(())
            } else {
                Err(Error::RunFailed {
                    failed: report.failed(),
                    total: report.results.len(),
                })
            }
        }

        Commands::Plan { plan, filter } => {
            let plan_file = Plan::load(&plan)?;
            let units = plan_file.compile(config.snapshot.restore_by_default)?;
            let schedule = schedule(&units, filter.as_deref())?;
            let schema = plan_file.schema()?;

            println!("{} {}", "Plan:".blue().bold(), plan_file.name.white().bold());
            if let Some(desc) = &plan_file.description {
                println!("  {}", desc.dimmed());
            }

            println!("\n{}", "Order:".cyan());
            for (position, &idx) in schedule.order.iter().enumerate() {
                print_unit(position + 1, &units[idx]);
            }

            if !schedule.external.is_empty() {
                println!("\n{}", "From earlier snapshot:".cyan());
                for dep in &schedule.external {
                    println!(
                        "  {} needs '{}' from {}",
                        dep.suite,
                        dep.key,
                        dep.producer.dimmed()
                    );
                }
            }

            if let Some(schema) = schema {
                println!("\n{}", "Keys:".cyan());
                for spec in &plan_file.keys {
                    match schema.description(&spec.name) {
                        Some(desc) => println!("  {} {}", spec.name, desc.dimmed()),
                        None => println!("  {}", spec.name),
                    }
                }
            }
            Ok(())
        }

        Commands::State(state_cmd) => match state_cmd {
            StateCommands::Show {
                snapshot,
                plan,
                json,
            } => {
                let file = snapshot_file(snapshot, plan, config)?;
                let (state, outcome) = file.load();
                if json {
                    println!("{}", serde_json::to_string_pretty(&state)?);
                    return Ok(());
                }

                println!("Snapshot: {}", file.path().display());
                match outcome {
                    RestoreOutcome::Missing => println!("  {}", "no snapshot yet".dimmed()),
                    RestoreOutcome::Corrupt(reason) => {
                        println!("  {} {}", "unreadable:".red(), reason)
                    }
                    RestoreOutcome::Restored { .. } => {
                        if state.local_storage.is_empty() {
                            println!("  {}", "no entries".dimmed());
                        }
                        for (name, value) in &state.local_storage {
                            println!("  {} = {}", name, value);
                        }
                        if !state.cookies.is_empty() {
                            let names: Vec<&str> =
                                state.cookies.iter().map(|c| c.name.as_str()).collect();
                            println!("  {} {}", "credentials:".dimmed(), names.join(", "));
                        }
                    }
                }
                Ok(())
            }

            StateCommands::Get {
                name,
                snapshot,
                plan,
            } => {
                let (state, _) = snapshot_file(snapshot, plan, config)?.load();
                let value = state
                    .local_storage
                    .get(&name)
                    .ok_or_else(|| Error::MissingState(name.clone()))?;
                println!("{}", value);
                Ok(())
            }

            StateCommands::Clear { snapshot, plan } => {
                let file = snapshot_file(snapshot, plan, config)?;
                if file.clear()? {
                    println!("Removed {}", file.path().display());
                } else {
                    println!("No snapshot at {}", file.path().display());
                }
                Ok(())
            }
        },

        Commands::Logs { lines, clear } => {
            if clear {
                logging::truncate_run_log()?;
                println!("Run log cleared");
                return Ok(());
            }

            let path = logging::run_log_path()
                .ok_or_else(|| Error::Config("No log directory on this platform".to_string()))?;
            if !path.exists() {
                println!("No run log yet. Set [logging] file = true in the configuration.");
                return Ok(());
            }

            let content = std::fs::read_to_string(&path).map_err(|e| Error::FileRead {
                path: path.display().to_string(),
                error: e.to_string(),
            })?;
            let all: Vec<&str> = content.lines().collect();
            let start = all.len().saturating_sub(lines);
            for line in &all[start..] {
                println!("{}", line);
            }
            Ok(())
        }
    }
}

/// Snapshot file for the state commands, with the same precedence as `run`:
/// explicit path, then the plan's `snapshot`, then the configuration
fn snapshot_file(
    explicit: Option<PathBuf>,
    plan: Option<PathBuf>,
    config: &Config,
) -> Result<SnapshotFile> {
    if let Some(path) = explicit {
        return Ok(SnapshotFile::new(path));
    }
    let from_plan = match plan {
        Some(plan) => Plan::load(&plan)?.snapshot,
        None => None,
    };
    Ok(SnapshotFile::new(
        from_plan.unwrap_or_else(|| config.snapshot.path.clone()),
    ))
}

fn print_unit(position: usize, unit: &SuiteUnit) {
    let restore = if unit.restore { "restore" } else { "fresh" };
    println!(
        "  {}. {} {}",
        position,
        unit.id.white().bold(),
        format!("({}, {} scenario(s))", restore, unit.matrix.len()).dimmed()
    );
    if !unit.consumes.is_empty() {
        println!("       reads:  {}", unit.consumes.join(", "));
    }
    if !unit.produces.is_empty() {
        println!("       writes: {}", unit.produces.join(", "));
    }
    for rule in &unit.rules {
        println!("       intercept: {} at '{}'", rule.name, rule.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_state_commands_follow_plan_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let plan = dir.path().join("plan.yaml");
        std::fs::write(&plan, "name: p\nsnapshot: state/accounts.json\nsuites: []\n").unwrap();
        let config = Config::default();

        let file = snapshot_file(None, Some(plan.clone()), &config).unwrap();
        assert_eq!(file.path(), dir.path().join("state/accounts.json"));

        let explicit = snapshot_file(Some(PathBuf::from("x.json")), Some(plan), &config).unwrap();
        assert_eq!(explicit.path(), Path::new("x.json"));

        let fallback = snapshot_file(None, None, &config).unwrap();
        assert_eq!(fallback.path(), config.snapshot.path.as_path());
    }

    #[test]
    fn test_state_commands_report_unreadable_plan() {
        let config = Config::default();
        let missing = snapshot_file(None, Some(PathBuf::from("/nonexistent/plan.yaml")), &config);
        assert!(matches!(missing, Err(Error::FileRead { .. })));
    }
}
