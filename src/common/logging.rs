//! Logging and tracing configuration
//!
//! The CLI logs compactly to stderr. When the run log is enabled, a second
//! layer writes full detail (targets, files, line numbers) to a file under
//! the data directory so mutation decisions can be reviewed after a run.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::paths;

const RUN_LOG: &str = "run.log";

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialize tracing for the CLI (stderr logging)
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate (DEBUG with `verbose`), WARN for dependencies.
pub fn init_cli(verbose: bool) {
    let default = if verbose {
        "harness=debug,warn"
    } else {
        "harness=info,warn"
    };

    tracing_subscriber::registry()
        .with(filter(default))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// Initialize tracing with both stderr and a run log file
///
/// The returned guard flushes the non-blocking file writer when dropped, so
/// callers must keep it alive for the duration of the run. Falls back to
/// stderr-only logging when the log directory cannot be created.
pub fn init_with_run_log(verbose: bool) -> Option<(PathBuf, WorkerGuard)> {
    let Some(log_dir) = paths::log_dir() else {
        init_cli(verbose);
        return None;
    };

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Could not create log directory: {}", e);
        init_cli(verbose);
        return None;
    }

    let appender = tracing_appender::rolling::never(&log_dir, RUN_LOG);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(filter("harness=debug,info"))
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Some((log_dir.join(RUN_LOG), guard))
}

/// Get the path to the run log file
pub fn run_log_path() -> Option<PathBuf> {
    paths::log_dir().map(|d| d.join(RUN_LOG))
}

/// Truncate the run log file
pub fn truncate_run_log() -> std::io::Result<()> {
    if let Some(path) = run_log_path() {
        if path.exists() {
            std::fs::write(&path, "")?;
        }
    }
    Ok(())
}
