//! Suite ordering
//!
//! Suites declare the state keys they produce and consume. The schedule is a
//! topological order of the producer-to-consumer graph, ties broken by
//! ascending suite id, so plans that already follow the lexicographic naming
//! convention run in the order their names suggest.

use std::collections::{BTreeMap, BTreeSet};

use crate::common::{Error, Result};

use super::SuiteUnit;

/// Consumer whose producer exists in the plan but is not selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalDependency {
    pub suite: String,
    pub key: String,
    pub producer: String,
}

/// Run order over a plan's suites
#[derive(Debug, Clone)]
pub struct Schedule {
    /// Indices into the unit list, in execution order
    pub order: Vec<usize>,
    /// Dependencies that must be satisfied by an earlier run's snapshot
    pub external: Vec<ExternalDependency>,
}

/// Order `units`, keeping only those whose id contains `filter`
pub fn schedule(units: &[SuiteUnit], filter: Option<&str>) -> Result<Schedule> {
    let mut producers: BTreeMap<&str, usize> = BTreeMap::new();
    for (idx, unit) in units.iter().enumerate() {
        for key in &unit.produces {
            if let Some(&first) = producers.get(key.as_str()) {
                return Err(Error::DuplicateProducer {
                    key: key.clone(),
                    first: units[first].id.clone(),
                    second: unit.id.clone(),
                });
            }
            producers.insert(key, idx);
        }
    }

    let selected: BTreeSet<usize> = units
        .iter()
        .enumerate()
        .filter(|(_, unit)| filter.map_or(true, |f| unit.id.contains(f)))
        .map(|(idx, _)| idx)
        .collect();

    let mut incoming: BTreeMap<usize, BTreeSet<usize>> =
        selected.iter().map(|&idx| (idx, BTreeSet::new())).collect();
    let mut external = Vec::new();

    for &idx in &selected {
        let unit = &units[idx];
        for key in &unit.consumes {
            let producer = *producers
                .get(key.as_str())
                .ok_or_else(|| Error::UnmetDependency {
                    suite: unit.id.clone(),
                    key: key.clone(),
                })?;
            if producer == idx {
                continue;
            }
            if selected.contains(&producer) {
                incoming.entry(idx).or_default().insert(producer);
            } else {
                external.push(ExternalDependency {
                    suite: unit.id.clone(),
                    key: key.clone(),
                    producer: units[producer].id.clone(),
                });
            }
        }
    }

    // Kahn's algorithm; the ready set is ordered by suite id
    let mut ready: BTreeSet<(&str, usize)> = incoming
        .iter()
        .filter(|(_, deps)| deps.is_empty())
        .map(|(&idx, _)| (units[idx].id.as_str(), idx))
        .collect();
    let mut order = Vec::with_capacity(selected.len());

    while let Some(next) = ready.pop_first() {
        let (_, done) = next;
        order.push(done);
        incoming.remove(&done);
        for (&idx, deps) in incoming.iter_mut() {
            if deps.remove(&done) && deps.is_empty() {
                ready.insert((units[idx].id.as_str(), idx));
            }
        }
    }

    if !incoming.is_empty() {
        let stuck: Vec<&str> = incoming.keys().map(|&idx| units[idx].id.as_str()).collect();
        return Err(Error::DependencyCycle(stuck.join(", ")));
    }

    Ok(Schedule { order, external })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioMatrix;
    use crate::suite::ScriptedWorkflow;
    use std::sync::Arc;

    fn unit(id: &str, produces: &[&str], consumes: &[&str]) -> SuiteUnit {
        SuiteUnit {
            id: id.to_string(),
            description: None,
            produces: produces.iter().map(|s| s.to_string()).collect(),
            consumes: consumes.iter().map(|s| s.to_string()).collect(),
            restore: true,
            matrix: ScenarioMatrix::unparameterized(),
            rules: Vec::new(),
            workflow: Arc::new(ScriptedWorkflow::new(Vec::new())),
        }
    }

    fn ids(units: &[SuiteUnit], schedule: &Schedule) -> Vec<String> {
        schedule.order.iter().map(|&i| units[i].id.clone()).collect()
    }

    #[test]
    fn test_independent_suites_run_lexicographically() {
        let units = vec![unit("030-c", &[], &[]), unit("010-a", &[], &[]), unit("020-b", &[], &[])];
        let schedule = schedule(&units, None).unwrap();
        assert_eq!(ids(&units, &schedule), vec!["010-a", "020-b", "030-c"]);
    }

    #[test]
    fn test_dependencies_override_names() {
        let units = vec![
            unit("010-account", &["accountId"], &["personId"]),
            unit("020-person", &["personId"], &[]),
            unit("005-misc", &[], &[]),
        ];
        let schedule = schedule(&units, None).unwrap();
        assert_eq!(ids(&units, &schedule), vec!["005-misc", "020-person", "010-account"]);
    }

    #[test]
    fn test_unmet_dependency() {
        let units = vec![unit("010-account", &[], &["personId"])];
        assert!(matches!(
            schedule(&units, None),
            Err(Error::UnmetDependency { ref suite, ref key }) if suite == "010-account" && key == "personId"
        ));
    }

    #[test]
    fn test_duplicate_producer() {
        let units = vec![unit("a", &["personId"], &[]), unit("b", &["personId"], &[])];
        assert!(matches!(schedule(&units, None), Err(Error::DuplicateProducer { .. })));
    }

    #[test]
    fn test_cycle_detected() {
        let units = vec![unit("a", &["x"], &["y"]), unit("b", &["y"], &["x"]), unit("c", &[], &[])];
        match schedule(&units, None) {
            Err(Error::DependencyCycle(stuck)) => assert_eq!(stuck, "a, b"),
            other => panic!("Expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_filter_turns_dependencies_external() {
        let units = vec![unit("010-person", &["personId"], &[]), unit("020-account", &[], &["personId"])];
        let schedule = schedule(&units, Some("account")).unwrap();
        assert_eq!(ids(&units, &schedule), vec!["020-account"]);
        assert_eq!(
            schedule.external,
            vec![ExternalDependency {
                suite: "020-account".into(),
                key: "personId".into(),
                producer: "010-person".into(),
            }]
        );
    }

    #[test]
    fn test_self_consumption_is_not_a_cycle() {
        let units = vec![unit("a", &["x"], &["x"])];
        assert_eq!(schedule(&units, None).unwrap().order, vec![0]);
    }
}
