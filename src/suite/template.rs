//! `${...}` placeholders in step strings
//!
//! `${FLAG}` is replaced by the active scenario's value for `FLAG`;
//! `${state.personId}` by the state value `personId`. An unterminated `${`
//! is left as literal text.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Placeholder {
    Scenario(String),
    State(String),
}

impl Placeholder {
    fn parse(inner: &str) -> Self {
        let inner = inner.trim();
        match inner.strip_prefix("state.") {
            Some(name) => Placeholder::State(name.to_string()),
            None => Placeholder::Scenario(inner.to_string()),
        }
    }
}

/// Iterate `(start, end, inner)` for each `${inner}` in `input`
fn spans(input: &str) -> impl Iterator<Item = (usize, usize, &str)> {
    let mut offset = 0;
    std::iter::from_fn(move || {
        let start = offset + input[offset..].find("${")?;
        let close = start + 2 + input[start + 2..].find('}')?;
        offset = close + 1;
        Some((start, close + 1, &input[start + 2..close]))
    })
}

/// All placeholders in `input`, in order of appearance
pub fn placeholders(input: &str) -> Vec<Placeholder> {
    spans(input).map(|(_, _, inner)| Placeholder::parse(inner)).collect()
}

/// Replace each placeholder with its resolved value
///
/// Placeholders missing from `values` are left untouched.
pub fn substitute(input: &str, values: &HashMap<Placeholder, String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for (start, end, inner) in spans(input) {
        out.push_str(&input[last..start]);
        match values.get(&Placeholder::parse(inner)) {
            Some(value) => out.push_str(value),
            None => out.push_str(&input[start..end]),
        }
        last = end;
    }
    out.push_str(&input[last..]);
    out
}
