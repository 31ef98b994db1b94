//! Plan file configuration types
//!
//! Defines the data structures for deserializing YAML suite plans and
//! compiling them into runnable [`SuiteUnit`]s.

use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::common::{Error, Result};
use crate::intercept::{InterceptionRule, RuleSpec, StructuralPath};
use crate::scenario::{ScenarioMatrix, ScenarioParameterSet};
use crate::state::{KeySchema, KeySpec};

use super::template::{placeholders, Placeholder};
use super::{ScriptedWorkflow, SuiteUnit};

/// A complete plan loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct Plan {
    /// Name of the plan
    pub name: String,
    /// Optional description of what the plan covers
    pub description: Option<String>,
    /// Base URL for relative request URLs; overrides the configuration
    pub base_url: Option<String>,
    /// Snapshot file, relative to the plan file; overrides the configuration
    pub snapshot: Option<PathBuf>,
    /// Declared state keys; when non-empty, only these may be used
    #[serde(default)]
    pub keys: Vec<KeySpec>,
    /// Suites, in any order
    pub suites: Vec<SuiteSpec>,
}

/// One suite family
#[derive(Deserialize, Debug)]
pub struct SuiteSpec {
    /// Unique identifier, also the ordering tie-break
    pub id: String,
    pub description: Option<String>,
    /// State keys this suite writes
    #[serde(default)]
    pub produces: Vec<String>,
    /// State keys this suite reads
    #[serde(default)]
    pub consumes: Vec<String>,
    /// Restore the snapshot before the first step (configuration default if unset)
    pub restore: Option<bool>,
    /// Parameter sets to fan out over; a single unparameterized run if unset
    pub matrix: Option<Vec<ScenarioParameterSet>>,
    /// Interception rules bound to each scenario
    #[serde(default)]
    pub intercept: Vec<RuleSpec>,
    /// The sequence of steps to execute
    pub steps: Vec<Step>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// A single step in a suite
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Issue a request from the page
    Request {
        #[serde(default = "default_method")]
        method: String,
        url: String,
        body: Option<Value>,
        expect: Option<ResponseExpectation>,
        /// State keys to write from fields of the response body
        #[serde(default)]
        capture: BTreeMap<String, StructuralPath>,
    },
    /// Write a state value
    WriteState { name: String, value: String },
    /// Read a state value, failing if absent
    ReadState { name: String, equals: Option<String> },
    /// Set a session cookie
    SetCredential { name: String, value: String },
    /// Check how many responses the mutator has rewritten so far
    ExpectMutations { min: Option<usize>, max: Option<usize> },
}

impl Step {
    /// Short description for progress output
    pub fn describe(&self) -> String {
        match self {
            Step::Request { method, url, .. } => format!("{} {}", method, url),
            Step::WriteState { name, .. } => format!("write {}", name),
            Step::ReadState { name, .. } => format!("read {}", name),
            Step::SetCredential { name, .. } => format!("credential {}", name),
            Step::ExpectMutations { min, max } => match (min, max) {
                (Some(min), Some(max)) => format!("mutations {}..={}", min, max),
                (Some(min), None) => format!("mutations >= {}", min),
                (None, Some(max)) => format!("mutations <= {}", max),
                (None, None) => "mutations".to_string(),
            },
        }
    }

    /// State keys written by this step
    fn writes(&self) -> Vec<&str> {
        match self {
            Step::Request { capture, .. } => capture.keys().map(String::as_str).collect(),
            Step::WriteState { name, .. } => vec![name.as_str()],
            _ => Vec::new(),
        }
    }

    /// State keys read by this step, explicit or through `${state.*}`
    fn reads(&self) -> Vec<String> {
        let mut texts: Vec<&str> = Vec::new();
        let mut reads = Vec::new();
        match self {
            Step::Request {
                url, body, expect, ..
            } => {
                texts.push(url);
                if let Some(body) = body {
                    collect_strings(body, &mut texts);
                }
                if let Some(Value::String(s)) = expect.as_ref().and_then(|e| e.equals.as_ref()) {
                    texts.push(s);
                }
            }
            Step::WriteState { value, .. } => texts.push(value),
            Step::ReadState { name, equals } => {
                reads.push(name.clone());
                if let Some(equals) = equals {
                    texts.push(equals);
                }
            }
            Step::SetCredential { value, .. } => texts.push(value),
            Step::ExpectMutations { .. } => {}
        }
        for text in texts {
            for placeholder in placeholders(text) {
                if let Placeholder::State(name) = placeholder {
                    reads.push(name);
                }
            }
        }
        reads
    }
}

/// Collect every string inside a JSON value
pub(crate) fn collect_strings<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}

/// Expectations for a response
#[derive(Deserialize, Debug, Clone)]
pub struct ResponseExpectation {
    /// Expected status code
    pub status: Option<u16>,
    /// Path inside the JSON body that `equals`/`present` apply to
    pub path: Option<StructuralPath>,
    /// Expected value at `path` (strings may use placeholders)
    pub equals: Option<Value>,
    /// Whether `path` must resolve (true) or must not (false)
    pub present: Option<bool>,
}

impl Plan {
    /// Load and parse a plan file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        let mut plan: Plan =
            serde_yaml::from_str(&content).map_err(|e| Error::plan_parse(path, e))?;

        if let Some(snapshot) = &plan.snapshot {
            if snapshot.is_relative() {
                let plan_dir = path.parent().unwrap_or(Path::new("."));
                plan.snapshot = Some(plan_dir.join(snapshot));
            }
        }
        Ok(plan)
    }

    /// Parse a plan from YAML text
    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::plan_parse(Path::new("<inline>"), e))
    }

    /// Key schema, if the plan declares one
    pub fn schema(&self) -> Result<Option<KeySchema>> {
        if self.keys.is_empty() {
            Ok(None)
        } else {
            KeySchema::from_specs(&self.keys).map(Some)
        }
    }

    /// Validate the plan and build runnable suite units
    pub fn compile(&self, restore_by_default: bool) -> Result<Vec<SuiteUnit>> {
        let schema = self.schema()?;
        let mut seen = BTreeSet::new();
        let mut units = Vec::with_capacity(self.suites.len());

        for spec in &self.suites {
            if !seen.insert(spec.id.as_str()) {
                return Err(Error::InvalidPlan(format!("suite id '{}' is used twice", spec.id)));
            }
            units.push(spec.compile(schema.as_ref(), restore_by_default)?);
        }
        Ok(units)
    }
}

impl SuiteSpec {
    fn compile(&self, schema: Option<&KeySchema>, restore_by_default: bool) -> Result<SuiteUnit> {
        if let Some(schema) = schema {
            for key in self.produces.iter().chain(&self.consumes) {
                schema.check(key)?;
            }
        }

        for step in &self.steps {
            for key in step.writes() {
                if !self.produces.iter().any(|p| p == key) {
                    return Err(Error::InvalidPlan(format!(
                        "suite '{}' writes '{}' without listing it in 'produces'",
                        self.id, key
                    )));
                }
            }
            for key in step.reads() {
                if !self.consumes.contains(&key) && !self.produces.contains(&key) {
                    return Err(Error::InvalidPlan(format!(
                        "suite '{}' reads '{}' without listing it in 'consumes'",
                        self.id, key
                    )));
                }
            }
        }

        let matrix = match &self.matrix {
            Some(scenarios) => ScenarioMatrix::new(&self.id, scenarios.clone())?,
            None => ScenarioMatrix::unparameterized(),
        };

        let rules = self
            .intercept
            .iter()
            .map(InterceptionRule::from_spec)
            .collect::<Result<Vec<_>>>()?;

        Ok(SuiteUnit {
            id: self.id.clone(),
            description: self.description.clone(),
            produces: self.produces.clone(),
            consumes: self.consumes.clone(),
            restore: self.restore.unwrap_or(restore_by_default),
            matrix,
            rules,
            workflow: Arc::new(ScriptedWorkflow::new(self.steps.clone())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"
name: accounts
base_url: http://localhost:8080
keys:
  - name: personId
    description: customer created by the registration suite
suites:
  - id: 020-account
    consumes: [personId]
    matrix:
      - { FLAG: N }
      - { FLAG: S }
      - { FLAG: "" }
    intercept:
      - url: "**/api/parameters*"
        path: data[code=FLAGS]
    steps:
      - action: request
        url: /api/accounts?owner=${state.personId}
        expect: { status: 200 }
      - action: expect_mutations
        min: 1
  - id: 010-person
    produces: [personId]
    restore: false
    steps:
      - action: request
        method: POST
        url: /api/people
        body: { name: "Ana" }
        capture: { personId: id }
"#;

    #[test]
    fn test_parse_and_compile() {
        let plan = Plan::parse(PLAN).unwrap();
        assert_eq!(plan.name, "accounts");
        let units = plan.compile(true).unwrap();
        assert_eq!(units.len(), 2);

        let account = &units[0];
        assert_eq!(account.matrix.len(), 3);
        assert_eq!(account.rules.len(), 1);
        assert!(account.restore);

        let person = &units[1];
        assert_eq!(person.matrix.len(), 1);
        assert!(!person.restore);
        assert_eq!(person.workflow.steps_total(), 1);
    }

    #[test]
    fn test_undeclared_write_rejected() {
        let plan = Plan::parse(
            r#"
name: p
suites:
  - id: a
    steps:
      - action: write_state
        name: personId
        value: P-1
"#,
        )
        .unwrap();
        let err = plan.compile(true).unwrap_err();
        assert!(err.to_string().contains("produces"));
    }

    #[test]
    fn test_template_read_must_be_consumed() {
        let plan = Plan::parse(
            r#"
name: p
suites:
  - id: a
    steps:
      - action: request
        url: /api/people/${state.personId}
"#,
        )
        .unwrap();
        let err = plan.compile(true).unwrap_err();
        assert!(err.to_string().contains("consumes"));
    }

    #[test]
    fn test_key_outside_schema_rejected() {
        let plan = Plan::parse(
            r#"
name: p
keys: [{ name: personId }]
suites:
  - id: a
    produces: [companyId]
    steps: []
"#,
        )
        .unwrap();
        assert!(matches!(plan.compile(true), Err(Error::UndeclaredKey(_))));
    }

    #[test]
    fn test_duplicate_suite_id_rejected() {
        let plan = Plan::parse(
            r#"
name: p
suites:
  - { id: a, steps: [] }
  - { id: a, steps: [] }
"#,
        )
        .unwrap();
        assert!(matches!(plan.compile(true), Err(Error::InvalidPlan(_))));
    }

    #[test]
    fn test_ragged_matrix_rejected_at_compile() {
        let plan = Plan::parse(
            r#"
name: p
suites:
  - id: a
    matrix: [{ FLAG: N }, { OTHER: S }]
    steps: []
"#,
        )
        .unwrap();
        assert!(matches!(plan.compile(true), Err(Error::MatrixShape { .. })));
    }

    #[test]
    fn test_load_resolves_snapshot_relative_to_plan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.yaml");
        std::fs::write(&path, "name: p\nsnapshot: state/run.json\nsuites: []\n").unwrap();
        let plan = Plan::load(&path).unwrap();
        assert_eq!(plan.snapshot, Some(dir.path().join("state/run.json")));
    }

    #[test]
    fn test_step_descriptions() {
        let step = Step::ExpectMutations {
            min: Some(1),
            max: None,
        };
        assert_eq!(step.describe(), "mutations >= 1");
    }
}
