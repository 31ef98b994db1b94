//! Declarative interception rules

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::common::{Error, Result};
use crate::scenario::ScenarioParameterSet;

use super::{StructuralPath, UrlPattern};

/// How scenario values are combined with the located object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeOp {
    /// Overwrite (or insert) each scenario key, leave every other field alone
    #[default]
    Shallow,
}

impl MergeOp {
    /// Apply the merge, returning how many keys were written
    pub fn apply(self, target: &mut Map<String, Value>, scenario: &ScenarioParameterSet) -> usize {
        match self {
            MergeOp::Shallow => {
                for (key, value) in scenario.iter() {
                    target.insert(key.to_string(), value.clone());
                }
                scenario.len()
            }
        }
    }
}

/// Rule as written in a plan file
///
/// Exactly one of `url` (glob) and `url_regex` must be given.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSpec {
    /// Name shown in logs and reports; defaults to the URL pattern
    pub name: Option<String>,
    pub url: Option<String>,
    pub url_regex: Option<String>,
    /// Where the mutable object lives in the response body
    #[serde(default)]
    pub path: StructuralPath,
    #[serde(default)]
    pub merge: MergeOp,
}

/// Compiled interception rule
#[derive(Debug, Clone)]
pub struct InterceptionRule {
    pub name: String,
    pub pattern: UrlPattern,
    pub path: StructuralPath,
    pub merge: MergeOp,
}

impl InterceptionRule {
    /// Rule matching a glob with a shallow merge
    pub fn new(url_glob: &str, path: &str) -> Result<Self> {
        Ok(Self {
            name: url_glob.to_string(),
            pattern: UrlPattern::glob(url_glob)?,
            path: StructuralPath::parse(path)?,
            merge: MergeOp::Shallow,
        })
    }

    /// Compile a rule from its plan form
    pub fn from_spec(spec: &RuleSpec) -> Result<Self> {
        let pattern = match (&spec.url, &spec.url_regex) {
            (Some(glob), None) => UrlPattern::glob(glob)?,
            (None, Some(regex)) => UrlPattern::regex(regex)?,
            (Some(glob), Some(_)) => {
                return Err(Error::invalid_pattern(
                    glob,
                    "give either 'url' or 'url_regex', not both",
                ))
            }
            (None, None) => {
                return Err(Error::InvalidPlan(
                    "interception rule needs 'url' or 'url_regex'".to_string(),
                ))
            }
        };

        if spec.path.is_positional() {
            tracing::debug!(
                path = %spec.path,
                "rule addresses array elements by position; prefer a [field=value] selector"
            );
        }

        Ok(Self {
            name: spec.name.clone().unwrap_or_else(|| pattern.to_string()),
            pattern,
            path: spec.path.clone(),
            merge: spec.merge,
        })
    }

    pub fn matches(&self, url: &str) -> bool {
        self.pattern.matches(url)
    }
}
