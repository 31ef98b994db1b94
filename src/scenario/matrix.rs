//! Rectangular scenario matrices

use crate::common::{Error, Result};

use super::ScenarioParameterSet;

/// Validated, non-empty list of scenarios sharing one key schema
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioMatrix {
    scenarios: Vec<ScenarioParameterSet>,
}

impl ScenarioMatrix {
    /// Validate a declared matrix for the suite `suite`
    ///
    /// Rejects empty lists and scenarios whose key set differs from the first.
    pub fn new(suite: &str, scenarios: Vec<ScenarioParameterSet>) -> Result<Self> {
        let first = scenarios
            .first()
            .ok_or_else(|| Error::EmptyMatrix(suite.to_string()))?;
        let expected = first.schema();

        for (index, scenario) in scenarios.iter().enumerate().skip(1) {
            let found = scenario.schema();
            if found != expected {
                return Err(Error::MatrixShape {
                    suite: suite.to_string(),
                    index,
                    expected: expected.join(", "),
                    found: found.join(", "),
                });
            }
        }

        Ok(Self { scenarios })
    }

    /// Matrix with a single flagless scenario, for suites outside any matrix
    pub fn unparameterized() -> Self {
        Self {
            scenarios: vec![ScenarioParameterSet::default()],
        }
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScenarioParameterSet> {
        self.scenarios.iter()
    }

    /// Label of the suite instance generated for one scenario
    pub fn suite_label(suite: &str, scenario: &ScenarioParameterSet) -> String {
        if scenario.is_empty() {
            suite.to_string()
        } else {
            format!("{suite} [{scenario}]")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(&str, &str)]) -> ScenarioParameterSet {
        ScenarioParameterSet::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_rectangular_matrix_accepted() {
        let matrix = ScenarioMatrix::new(
            "accounts",
            vec![set(&[("FLAG", "N")]), set(&[("FLAG", "S")]), set(&[("FLAG", "")])],
        )
        .unwrap();
        assert_eq!(matrix.len(), 3);
    }

    #[test]
    fn test_key_order_does_not_matter_for_shape() {
        let matrix = ScenarioMatrix::new(
            "loans",
            vec![set(&[("A", "1"), ("B", "2")]), set(&[("B", "3"), ("A", "4")])],
        );
        assert!(matrix.is_ok());
    }

    #[test]
    fn test_empty_matrix_rejected() {
        let err = ScenarioMatrix::new("accounts", Vec::new()).unwrap_err();
        assert!(matches!(err, Error::EmptyMatrix(ref s) if s == "accounts"));
    }

    #[test]
    fn test_ragged_matrix_rejected() {
        let err = ScenarioMatrix::new(
            "accounts",
            vec![set(&[("FLAG", "N")]), set(&[("FLAG", "S"), ("EXTRA", "X")])],
        )
        .unwrap_err();
        match err {
            Error::MatrixShape { index, expected, found, .. } => {
                assert_eq!(index, 1);
                assert_eq!(expected, "FLAG");
                assert_eq!(found, "EXTRA, FLAG");
            }
            other => panic!("Expected MatrixShape, got {other:?}"),
        }
    }

    #[test]
    fn test_suite_labels() {
        assert_eq!(
            ScenarioMatrix::suite_label("020-accounts", &set(&[("FLAG", "S")])),
            "020-accounts [FLAG=S]"
        );
        assert_eq!(
            ScenarioMatrix::suite_label("010-person", &ScenarioParameterSet::default()),
            "010-person"
        );
    }
}
