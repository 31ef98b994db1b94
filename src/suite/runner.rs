//! Scenario matrix runner
//!
//! Expands each suite over its scenario matrix and runs every instance in
//! its own session, serially, in schedule order. An instance that fails,
//! panics or times out is recorded and the run moves on.

use colored::Colorize;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tracing::Instrument;

use crate::common::{Error, Result};
use crate::driver::BrowserDriver;
use crate::intercept::Mutator;
use crate::scenario::{ScenarioMatrix, ScenarioParameterSet};
use crate::state::{KeySchema, SnapshotFile};

use super::report::{RunReport, SuiteResult};
use super::schedule::Schedule;
use super::workflow::SuiteContext;
use super::SuiteUnit;

/// Settings shared by every suite instance of a run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub suite_timeout: Duration,
    pub base_url: Option<String>,
    pub schema: Option<KeySchema>,
    /// Print progress to stdout
    pub echo: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            suite_timeout: Duration::from_secs(300),
            base_url: None,
            schema: None,
            echo: false,
        }
    }
}

/// Runs suite units against sessions from one driver
pub struct MatrixRunner<'a> {
    driver: &'a dyn BrowserDriver,
    snapshot: SnapshotFile,
    options: RunOptions,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl<'a> MatrixRunner<'a> {
    pub fn new(driver: &'a dyn BrowserDriver, snapshot: SnapshotFile, options: RunOptions) -> Self {
        Self {
            driver,
            snapshot,
            options,
        }
    }

    pub fn snapshot(&self) -> &SnapshotFile {
        &self.snapshot
    }

    /// Run the scheduled units in order
    pub async fn run_plan(&self, name: &str, units: &[SuiteUnit], schedule: &Schedule) -> RunReport {
        for dep in &schedule.external {
            tracing::warn!(
                suite = %dep.suite,
                key = %dep.key,
                producer = %dep.producer,
                "producer not selected; value must come from an earlier snapshot"
            );
        }

        let mut report = RunReport::new(name);
        for &idx in &schedule.order {
            report.results.extend(self.run_unit(&units[idx]).await);
        }
        report
    }

    /// Run one suite once per scenario in its matrix
    pub async fn run_unit(&self, unit: &SuiteUnit) -> Vec<SuiteResult> {
        let mut results = Vec::with_capacity(unit.matrix.len());
        for scenario in unit.matrix.iter() {
            let label = ScenarioMatrix::suite_label(&unit.id, scenario);
            let span = tracing::info_span!("suite", label = %label);
            let result = self
                .run_instance(unit, scenario, label)
                .instrument(span)
                .await;
            results.push(result);
        }
        results
    }

    async fn run_instance(
        &self,
        unit: &SuiteUnit,
        scenario: &ScenarioParameterSet,
        label: String,
    ) -> SuiteResult {
        let started = Instant::now();
        let steps_total = unit.workflow.steps_total();

        if self.options.echo {
            println!(
                "\n{} {}",
                "Running Suite:".blue().bold(),
                label.white().bold()
            );
            if let Some(desc) = &unit.description {
                println!("  {}", desc.dimmed());
            }
        }

        let session = match self.driver.open_session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(error = %e, "failed to open session");
                return SuiteResult {
                    suite: unit.id.clone(),
                    label,
                    passed: false,
                    steps_run: 0,
                    steps_total,
                    mutated: 0,
                    skipped: 0,
                    duration_ms: started.elapsed().as_millis(),
                    error: Some(e.to_string()),
                };
            }
        };

        let mut ctx = SuiteContext::new(
            label.clone(),
            session,
            scenario,
            self.options.schema.as_ref(),
            self.options.base_url.as_deref(),
        )
        .with_echo(self.options.echo);

        let outcome = tokio::time::timeout(
            self.options.suite_timeout,
            AssertUnwindSafe(self.drive(unit, scenario, &mut ctx)).catch_unwind(),
        )
        .await;

        let error = match outcome {
            Ok(Ok(Ok(()))) => None,
            Ok(Ok(Err(e))) => Some(e),
            Ok(Err(payload)) => Some(Error::TestAssertion(format!(
                "workflow panicked: {}",
                panic_message(&*payload)
            ))),
            Err(_) => Some(Error::SuiteTimeout {
                label: label.clone(),
                secs: self.options.suite_timeout.as_secs_f64(),
            }),
        };

        let steps_run = ctx.steps_run();
        let mutated = ctx.mutations().mutated();
        let skipped = ctx.mutations().skipped();

        let mut session = ctx.into_session();
        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "session teardown failed");
        }

        match &error {
            None => {
                tracing::info!(mutated, skipped, "suite passed");
                if self.options.echo {
                    println!("  {} {}", "✓".green().bold(), "Suite Passed".green().bold());
                }
            }
            Some(e) => {
                tracing::error!(error = %e, steps_run, steps_total, "suite failed");
                if self.options.echo {
                    println!("  {} {}: {}", "✗".red().bold(), "Suite Failed".red().bold(), e);
                }
            }
        }

        SuiteResult {
            suite: unit.id.clone(),
            label,
            passed: error.is_none(),
            steps_run,
            steps_total,
            mutated,
            skipped,
            duration_ms: started.elapsed().as_millis(),
            error: error.map(|e| e.to_string()),
        }
    }

    /// Session setup, workflow and snapshot for one instance
    ///
    /// The snapshot is only written when the workflow succeeds. A suite that
    /// restored owns the whole storage and replaces the file; a fresh suite
    /// overlays its entries onto it.
    async fn drive(
        &self,
        unit: &SuiteUnit,
        scenario: &ScenarioParameterSet,
        ctx: &mut SuiteContext<'_>,
    ) -> Result<()> {
        if !unit.rules.is_empty() {
            let mutator = Mutator::new(unit.rules.clone(), scenario.clone());
            ctx.set_mutations(mutator.log());
            ctx.session().install_interceptor(mutator).await?;
        }

        if unit.restore {
            ctx.store().restore(&self.snapshot).await?;
        }

        unit.workflow.run(ctx).await?;

        if unit.restore {
            ctx.store().snapshot(&self.snapshot).await?;
        } else {
            ctx.store().snapshot_merged(&self.snapshot).await?;
        }
        Ok(())
    }
}
