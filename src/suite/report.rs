//! Run results

use colored::Colorize;
use serde::Serialize;

/// Result of one suite instance (one scenario of one suite)
#[derive(Debug, Clone, Serialize)]
pub struct SuiteResult {
    pub suite: String,
    pub label: String,
    pub passed: bool,
    pub steps_run: usize,
    pub steps_total: usize,
    /// Responses rewritten by the mutator
    pub mutated: usize,
    /// Responses a rule matched but left unchanged
    pub skipped: usize,
    pub duration_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Results of a whole run, in execution order
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub plan: String,
    pub results: Vec<SuiteResult>,
}

impl RunReport {
    pub fn new(plan: impl Into<String>) -> Self {
        Self {
            plan: plan.into(),
            results: Vec::new(),
        }
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn print_summary(&self) {
        println!("\n{}", "Summary:".cyan());
        for result in &self.results {
            if result.passed {
                println!("  {} {}", "✓".green(), result.label);
            } else {
                println!(
                    "  {} {} ({})",
                    "✗".red(),
                    result.label,
                    result.error.as_deref().unwrap_or("failed").dimmed()
                );
            }
        }

        let line = format!(
            "{} passed, {} failed, {} total",
            self.passed(),
            self.failed(),
            self.results.len()
        );
        if self.all_passed() {
            println!("\n{}\n", line.green().bold());
        } else {
            println!("\n{}\n", line.red().bold());
        }
    }
}
