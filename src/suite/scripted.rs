//! Workflow driven by plan file steps

use async_trait::async_trait;
use colored::Colorize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::common::{Error, Result};
use crate::intercept::StructuralPath;
use crate::scenario::ScenarioParameterSet;
use crate::state::Cookie;
use crate::upstream::{PageRequest, PageResponse};

use super::plan::{collect_strings, ResponseExpectation, Step};
use super::template::{placeholders, substitute, Placeholder};
use super::workflow::{SuiteContext, Workflow};

/// Runs a fixed list of [`Step`]s
#[derive(Debug, Clone)]
pub struct ScriptedWorkflow {
    steps: Vec<Step>,
}

impl ScriptedWorkflow {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }
}

#[async_trait]
impl Workflow for ScriptedWorkflow {
    fn steps_total(&self) -> usize {
        self.steps.len()
    }

    async fn run(&self, ctx: &mut SuiteContext<'_>) -> Result<()> {
        for (i, step) in self.steps.iter().enumerate() {
            let step_num = i + 1;
            if let Err(e) = execute_step(ctx, step).await {
                tracing::debug!(suite = ctx.label(), step = step_num, error = %e, "step failed");
                if ctx.echo() {
                    println!("  {} Step {}: {}", "✗".red(), step_num, e);
                }
                return Err(e);
            }
            ctx.complete_step();
            if ctx.echo() {
                println!(
                    "  {} Step {}: {}",
                    "✓".green(),
                    step_num,
                    step.describe().dimmed()
                );
            }
        }
        Ok(())
    }
}

/// Resolve every placeholder found in `texts`
///
/// State placeholders must be present; scenario placeholders without a
/// matching flag stay literal.
async fn resolve_placeholders(
    ctx: &mut SuiteContext<'_>,
    texts: &[&str],
) -> Result<HashMap<Placeholder, String>> {
    let mut values = HashMap::new();
    for text in texts {
        for placeholder in placeholders(text) {
            if values.contains_key(&placeholder) {
                continue;
            }
            let value = match &placeholder {
                Placeholder::State(name) => Some(ctx.store().require(name).await?),
                Placeholder::Scenario(flag) => ctx
                    .scenario()
                    .get(flag)
                    .map(ScenarioParameterSet::render_value),
            };
            if let Some(value) = value {
                values.insert(placeholder, value);
            }
        }
    }
    Ok(values)
}

fn substitute_json(value: &Value, values: &HashMap<Placeholder, String>) -> Value {
    match value {
        Value::String(s) => Value::String(substitute(s, values)),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute_json(v, values)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute_json(v, values)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Whether `actual` satisfies `expected`
///
/// A string expectation also matches a scalar that renders the same way, so
/// `"3"` matches `3` and `"true"` matches `true`.
fn values_match(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    match (actual, expected) {
        // numbers keep their source text, so `1.10` and `1.1` differ as values
        (Value::Number(a), Value::Number(b)) => a.as_f64().is_some() && a.as_f64() == b.as_f64(),
        (Value::Number(_) | Value::Bool(_), Value::String(s)) => actual.to_string() == *s,
        _ => false,
    }
}

async fn execute_step(ctx: &mut SuiteContext<'_>, step: &Step) -> Result<()> {
    match step {
        Step::Request {
            method,
            url,
            body,
            expect,
            capture,
        } => execute_request_step(ctx, method, url, body.as_ref(), expect.as_ref(), capture).await,

        Step::WriteState { name, value } => {
            let values = resolve_placeholders(ctx, &[value.as_str()]).await?;
            let value = substitute(value, &values);
            ctx.store().write(name, &value).await
        }

        Step::ReadState { name, equals } => {
            let actual = ctx.store().require(name).await?;
            if let Some(expected) = equals {
                let values = resolve_placeholders(ctx, &[expected.as_str()]).await?;
                let expected = substitute(expected, &values);
                if actual != expected {
                    return Err(Error::TestAssertion(format!(
                        "State '{}' is '{}', expected '{}'",
                        name, actual, expected
                    )));
                }
            }
            Ok(())
        }

        Step::SetCredential { name, value } => {
            let values = resolve_placeholders(ctx, &[value.as_str()]).await?;
            let value = substitute(value, &values);
            ctx.session().set_cookie(Cookie::new(name, value)).await
        }

        Step::ExpectMutations { min, max } => {
            let mutated = ctx.mutations().mutated();
            if let Some(min) = min {
                if mutated < *min {
                    return Err(Error::TestAssertion(format!(
                        "Expected at least {} mutated responses, got {}",
                        min, mutated
                    )));
                }
            }
            if let Some(max) = max {
                if mutated > *max {
                    return Err(Error::TestAssertion(format!(
                        "Expected at most {} mutated responses, got {}",
                        max, mutated
                    )));
                }
            }
            Ok(())
        }
    }
}

async fn execute_request_step(
    ctx: &mut SuiteContext<'_>,
    method: &str,
    url: &str,
    body: Option<&Value>,
    expect: Option<&ResponseExpectation>,
    capture: &BTreeMap<String, StructuralPath>,
) -> Result<()> {
    let mut texts = vec![url];
    if let Some(body) = body {
        collect_strings(body, &mut texts);
    }
    if let Some(Value::String(s)) = expect.and_then(|e| e.equals.as_ref()) {
        texts.push(s);
    }
    let values = resolve_placeholders(ctx, &texts).await?;

    let url = substitute(url, &values);
    let request = match body {
        Some(body) => PageRequest::json(method, url, &substitute_json(body, &values))?,
        None => PageRequest {
            method: method.to_string(),
            url,
            headers: Vec::new(),
            body: None,
        },
    };

    let response = ctx.request(request).await?;

    if let Some(expect) = expect {
        check_response(&response, expect, &values)?;
    }

    if !capture.is_empty() {
        let document = response_json(&response)?;
        for (name, path) in capture {
            let value = match path.resolve(&document) {
                Some(Value::Object(_) | Value::Array(_)) => {
                    return Err(Error::TestAssertion(format!(
                        "Cannot capture '{}': '{}' is not a scalar",
                        name, path
                    )))
                }
                Some(value) => ScenarioParameterSet::render_value(value),
                None => {
                    return Err(Error::TestAssertion(format!(
                        "Cannot capture '{}': '{}' not found in response",
                        name, path
                    )))
                }
            };
            ctx.store().write(name, &value).await?;
        }
    }

    Ok(())
}

fn response_json(response: &PageResponse) -> Result<Value> {
    response
        .body_json()
        .map_err(|e| Error::TestAssertion(format!("Response body is not JSON: {}", e)))
}

fn check_response(
    response: &PageResponse,
    expect: &ResponseExpectation,
    values: &HashMap<Placeholder, String>,
) -> Result<()> {
    if let Some(status) = expect.status {
        if response.status != status {
            return Err(Error::TestAssertion(format!(
                "Expected status {}, got {}",
                status, response.status
            )));
        }
    }

    if expect.equals.is_none() && expect.present.is_none() {
        return Ok(());
    }

    let document = response_json(response)?;
    let path = expect.path.clone().unwrap_or_default();
    let actual = path.resolve(&document);

    if let Some(present) = expect.present {
        if actual.is_some() != present {
            return Err(Error::TestAssertion(format!(
                "Expected '{}' to be {}",
                path,
                if present { "present" } else { "absent" }
            )));
        }
    }

    if let Some(expected) = &expect.equals {
        let expected = substitute_json(expected, values);
        match actual {
            Some(actual) if values_match(actual, &expected) => {}
            Some(actual) => {
                return Err(Error::TestAssertion(format!(
                    "Expected '{}' to equal {}, got {}",
                    path, expected, actual
                )))
            }
            None => {
                return Err(Error::TestAssertion(format!(
                    "Expected '{}' to equal {}, but it is absent",
                    path, expected
                )))
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_values_match_renders_scalars() {
        assert!(values_match(&json!("S"), &json!("S")));
        assert!(values_match(&json!(3), &json!("3")));
        assert!(values_match(&json!(true), &json!("true")));
        assert!(!values_match(&json!("3"), &json!(3)));
        assert!(!values_match(&json!(null), &json!("")));
        let written: Value = serde_json::from_str("1.10").unwrap();
        assert!(values_match(&written, &json!(1.1)));
        assert!(!values_match(&written, &json!(1.2)));
    }

    #[test]
    fn test_substitute_json_reaches_nested_strings() {
        let mut values = HashMap::new();
        values.insert(Placeholder::State("personId".into()), "P-1".to_string());
        let body = json!({"owner": {"id": "${state.personId}"}, "tags": ["${state.personId}", 1]});
        assert_eq!(
            substitute_json(&body, &values),
            json!({"owner": {"id": "P-1"}, "tags": ["P-1", 1]})
        );
    }

    #[test]
    fn test_check_response_status_and_path() {
        let response = PageResponse::json(&json!({"data": [{"code": "FLAGS", "FLAG": "S"}]}));
        let expect = ResponseExpectation {
            status: Some(200),
            path: Some(StructuralPath::parse("data[code=FLAGS].FLAG").unwrap()),
            equals: Some(json!("${FLAG}")),
            present: Some(true),
        };
        let mut values = HashMap::new();
        values.insert(Placeholder::Scenario("FLAG".into()), "S".to_string());
        assert!(check_response(&response, &expect, &values).is_ok());

        values.insert(Placeholder::Scenario("FLAG".into()), "N".to_string());
        let err = check_response(&response, &expect, &values).unwrap_err();
        assert!(err.is_assertion());
    }

    #[test]
    fn test_check_response_absent_path() {
        let response = PageResponse::json(&json!({"data": []}));
        let expect = ResponseExpectation {
            status: None,
            path: Some(StructuralPath::parse("data[0]").unwrap()),
            equals: None,
            present: Some(false),
        };
        assert!(check_response(&response, &expect, &HashMap::new()).is_ok());
    }
}
