//! A single scenario: flag name to injected value

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Ordered, immutable set of flag values for one scenario
///
/// Values are JSON scalars. The empty string is a real value that gets
/// injected like any other, standing for "the server sent nothing".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioParameterSet(Map<String, Value>);

impl ScenarioParameterSet {
    /// Build a set from `(flag, value)` pairs, keeping their order
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Whether this set carries no flags at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of flags
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Value of one flag
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Flag names in declaration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Flag/value pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Flag names sorted, used to compare key schemas
    pub fn schema(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        keys
    }

    /// Render one value as it appears in labels and templates
    pub fn render_value(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Human-readable label, e.g. `FLAG=S, MODE=""`
    ///
    /// Null and the empty string stay distinguishable (`FLAG=null` vs `FLAG=""`).
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ScenarioParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match value {
                Value::Null => write!(f, "{key}=null")?,
                Value::String(s) if s.is_empty() => write!(f, "{key}=\"\"")?,
                other => write!(f, "{key}={}", Self::render_value(other))?,
            }
        }
        Ok(())
    }
}
