//! Declared state keys
//!
//! A plan may list the keys its suites exchange. When it does, the store
//! rejects reads and writes of anything else, turning a typo in a key name
//! into an immediate error instead of a silently absent value.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::common::{Error, Result};

/// Key entry as written in a plan file
#[derive(Debug, Clone, Deserialize)]
pub struct KeySpec {
    pub name: String,
    pub description: Option<String>,
}

/// Set of declared state keys
#[derive(Debug, Clone, Default)]
pub struct KeySchema {
    keys: BTreeMap<String, Option<String>>,
}

impl KeySchema {
    pub fn from_specs(specs: &[KeySpec]) -> Result<Self> {
        let mut keys = BTreeMap::new();
        for spec in specs {
            if keys
                .insert(spec.name.clone(), spec.description.clone())
                .is_some()
            {
                return Err(Error::InvalidPlan(format!(
                    "state key '{}' is declared twice",
                    spec.name
                )));
            }
        }
        Ok(Self { keys })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.keys.contains_key(name)
    }

    pub fn check(&self, name: &str) -> Result<()> {
        if self.contains(name) {
            Ok(())
        } else {
            Err(Error::UndeclaredKey(name.to_string()))
        }
    }

    pub fn description(&self, name: &str) -> Option<&str> {
        self.keys.get(name).and_then(|d| d.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> KeySpec {
        KeySpec {
            name: name.to_string(),
            description: None,
        }
    }

    #[test]
    fn test_check_declared_keys() {
        let schema = KeySchema::from_specs(&[spec("personId"), spec("companyId")]).unwrap();
        assert!(schema.check("personId").is_ok());
        assert!(matches!(
            schema.check("personID"),
            Err(Error::UndeclaredKey(ref k)) if k == "personID"
        ));
    }

    #[test]
    fn test_duplicate_declaration_rejected() {
        assert!(KeySchema::from_specs(&[spec("a"), spec("a")]).is_err());
    }
}
