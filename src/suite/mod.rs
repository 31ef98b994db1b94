//! Suite plans, scheduling and the scenario matrix runner

pub mod plan;
mod report;
mod runner;
mod schedule;
mod scripted;
mod template;
mod workflow;

pub use plan::{Plan, ResponseExpectation, Step, SuiteSpec};
pub use report::{RunReport, SuiteResult};
pub use runner::{MatrixRunner, RunOptions};
pub use schedule::{schedule, ExternalDependency, Schedule};
pub use scripted::ScriptedWorkflow;
pub use workflow::{SuiteContext, Workflow};

use std::fmt;
use std::sync::Arc;

use crate::intercept::InterceptionRule;
use crate::scenario::ScenarioMatrix;

/// A suite family ready to run: its matrix, rules, declared keys and steps
#[derive(Clone)]
pub struct SuiteUnit {
    pub id: String,
    pub description: Option<String>,
    pub produces: Vec<String>,
    pub consumes: Vec<String>,
    /// Restore the snapshot before the workflow runs
    pub restore: bool,
    pub matrix: ScenarioMatrix,
    pub rules: Vec<InterceptionRule>,
    pub workflow: Arc<dyn Workflow>,
}

impl fmt::Debug for SuiteUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteUnit")
            .field("id", &self.id)
            .field("produces", &self.produces)
            .field("consumes", &self.consumes)
            .field("restore", &self.restore)
            .field("scenarios", &self.matrix.len())
            .field("rules", &self.rules.len())
            .field("steps", &self.workflow.steps_total())
            .finish()
    }
}
