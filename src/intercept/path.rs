//! Structural paths into JSON response bodies
//!
//! Syntax: dot-separated object keys, each optionally followed by bracketed
//! selectors. `[33]` picks an array element by position, `[code=FLAGS]`
//! picks the first element whose `code` field equals `FLAGS`. The empty
//! path names the document root.
//!
//! ```text
//! data[33]
//! data[code=FLAGS].values
//! [0]
//! ```

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::fmt;

use crate::common::{Error, Result};

/// One step of a structural path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object member
    Key(String),
    /// Array element by position
    Index(usize),
    /// First array element whose `field` renders as `value`
    Select { field: String, value: String },
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "{key}"),
            Segment::Index(index) => write!(f, "[{index}]"),
            Segment::Select { field, value } => write!(f, "[{field}={value}]"),
        }
    }
}

/// Why a path did not resolve to a mutable object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Miss {
    MissingKey(String),
    IndexOutOfRange { index: usize, len: usize },
    NoMatch { field: String, value: String },
    /// A segment was applied to a value of the wrong kind
    WrongKind { segment: String, found: &'static str },
    /// The path resolved, but not to an object
    NotAnObject(&'static str),
    /// The path resolved to an object with this many fields (at most one)
    TooFewFields(usize),
}

impl fmt::Display for Miss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Miss::MissingKey(key) => write!(f, "key '{key}' is missing"),
            Miss::IndexOutOfRange { index, len } => {
                write!(f, "index {index} is out of range for an array of {len}")
            }
            Miss::NoMatch { field, value } => write!(f, "no element has {field}={value}"),
            Miss::WrongKind { segment, found } => write!(f, "cannot apply '{segment}' to {found}"),
            Miss::NotAnObject(found) => write!(f, "path resolves to {found}, not an object"),
            Miss::TooFewFields(n) => write!(f, "object has {n} field(s), not yet populated"),
        }
    }
}

/// Result of locating a path for mutation
#[derive(Debug)]
pub enum Located<'a> {
    Found(&'a mut Map<String, Value>),
    NotFound(Miss),
}

/// Parsed structural path
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructuralPath {
    segments: Vec<Segment>,
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn selector_matches(candidate: &Value, expected: &str) -> bool {
    match candidate {
        Value::String(s) => s == expected,
        Value::Null => false,
        other => other.to_string() == expected,
    }
}

fn is_key_end(c: char) -> bool {
    c == '.' || c == '['
}

impl StructuralPath {
    /// Parse a path expression
    pub fn parse(input: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = input.trim();

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('[') {
                let end = after
                    .find(']')
                    .ok_or_else(|| Error::invalid_path(input, "unclosed '['"))?;
                segments.push(Self::parse_bracket(input, &after[..end])?);
                rest = &after[end + 1..];
                continue;
            }

            let key_start = match rest.strip_prefix('.') {
                Some(after) if !segments.is_empty() => after,
                Some(_) => return Err(Error::invalid_path(input, "path cannot start with '.'")),
                None if segments.is_empty() => rest,
                None => return Err(Error::invalid_path(input, "expected '.' or '['")),
            };

            let end = key_start.find(is_key_end).unwrap_or(key_start.len());
            if end == 0 {
                return Err(Error::invalid_path(input, "empty key"));
            }
            segments.push(Segment::Key(key_start[..end].to_string()));
            rest = &key_start[end..];
        }

        Ok(Self { segments })
    }

    fn parse_bracket(input: &str, inner: &str) -> Result<Segment> {
        let inner = inner.trim();
        if !inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit()) {
            let index = inner
                .parse()
                .map_err(|e| Error::invalid_path(input, format!("bad index: {e}")))?;
            return Ok(Segment::Index(index));
        }

        match inner.split_once('=') {
            Some((field, value)) if !field.trim().is_empty() => {
                let value = value.trim();
                let value = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .unwrap_or(value);
                Ok(Segment::Select {
                    field: field.trim().to_string(),
                    value: value.to_string(),
                })
            }
            _ => Err(Error::invalid_path(
                input,
                format!("'[{inner}]' is neither an index nor a field=value selector"),
            )),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether the path addresses array elements by position
    pub fn is_positional(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Index(_)))
    }

    /// Locate the object to mutate
    ///
    /// Only an object with more than one field counts as found; anything else
    /// is reported as a [`Miss`] so callers can forward the payload unchanged.
    pub fn locate<'a>(&self, document: &'a mut Value) -> Located<'a> {
        let mut current = document;

        for segment in &self.segments {
            current = match (segment, current) {
                (Segment::Key(key), Value::Object(map)) => match map.get_mut(key) {
                    Some(next) => next,
                    None => return Located::NotFound(Miss::MissingKey(key.clone())),
                },
                (Segment::Index(index), Value::Array(items)) => {
                    let len = items.len();
                    match items.get_mut(*index) {
                        Some(next) => next,
                        None => {
                            return Located::NotFound(Miss::IndexOutOfRange {
                                index: *index,
                                len,
                            })
                        }
                    }
                }
                (Segment::Select { field, value }, Value::Array(items)) => {
                    let found = items.iter_mut().find(|item| {
                        item.get(field.as_str())
                            .map(|candidate| selector_matches(candidate, value))
                            .unwrap_or(false)
                    });
                    match found {
                        Some(next) => next,
                        None => {
                            return Located::NotFound(Miss::NoMatch {
                                field: field.clone(),
                                value: value.clone(),
                            })
                        }
                    }
                }
                (segment, other) => {
                    return Located::NotFound(Miss::WrongKind {
                        segment: segment.to_string(),
                        found: kind(other),
                    })
                }
            };
        }

        match current {
            Value::Object(map) => {
                let fields = map.len();
                if fields > 1 {
                    Located::Found(map)
                } else {
                    Located::NotFound(Miss::TooFewFields(fields))
                }
            }
            other => Located::NotFound(Miss::NotAnObject(kind(other))),
        }
    }

    /// Read the value at this path, whatever its kind
    pub fn resolve<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(document, |current, segment| match segment {
                Segment::Key(key) => current.get(key.as_str()),
                Segment::Index(index) => current.get(*index),
                Segment::Select { field, value } => current.as_array()?.iter().find(|item| {
                    item.get(field.as_str())
                        .map(|candidate| selector_matches(candidate, value))
                        .unwrap_or(false)
                }),
            })
    }
}

impl fmt::Display for StructuralPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 && matches!(segment, Segment::Key(_)) {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for StructuralPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for StructuralPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(s: &str) -> StructuralPath {
        StructuralPath::parse(s).unwrap()
    }

    #[test]
    fn test_parse_segments() {
        assert!(path("").is_root());
        assert_eq!(
            path("data[33]").segments(),
            &[Segment::Key("data".into()), Segment::Index(33)]
        );
        assert_eq!(
            path("data[code=\"FLAGS\"].values").segments(),
            &[
                Segment::Key("data".into()),
                Segment::Select {
                    field: "code".into(),
                    value: "FLAGS".into()
                },
                Segment::Key("values".into()),
            ]
        );
        assert_eq!(path("[0][1]").segments(), &[Segment::Index(0), Segment::Index(1)]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(StructuralPath::parse("data[33").is_err());
        assert!(StructuralPath::parse(".data").is_err());
        assert!(StructuralPath::parse("data..x").is_err());
        assert!(StructuralPath::parse("data[abc]").is_err());
        assert!(StructuralPath::parse("data[0]x").is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for s in ["data[33]", "data[code=FLAGS].values", "[0].a.b", ""] {
            assert_eq!(path(s).to_string(), s);
        }
    }

    #[test]
    fn test_locate_positional_element() {
        let mut doc = json!({"data": [{"a": 1}, {"FLAG": "N", "other": 2}]});
        match path("data[1]").locate(&mut doc) {
            Located::Found(map) => assert_eq!(map["FLAG"], "N"),
            Located::NotFound(miss) => panic!("unexpected miss: {miss}"),
        }
    }

    #[test]
    fn test_locate_named_element() {
        let mut doc = json!({"data": [
            {"code": "OTHER", "x": 1},
            {"code": "FLAGS", "FLAG": "N"}
        ]});
        match path("data[code=FLAGS]").locate(&mut doc) {
            Located::Found(map) => assert_eq!(map["FLAG"], "N"),
            Located::NotFound(miss) => panic!("unexpected miss: {miss}"),
        }
    }

    #[test]
    fn test_locate_misses() {
        let mut doc = json!({"data": [{"only": 1}], "scalar": 5});
        assert!(matches!(
            path("data[0]").locate(&mut doc),
            Located::NotFound(Miss::TooFewFields(1))
        ));
        assert!(matches!(
            path("data[3]").locate(&mut doc),
            Located::NotFound(Miss::IndexOutOfRange { index: 3, len: 1 })
        ));
        assert!(matches!(
            path("missing").locate(&mut doc),
            Located::NotFound(Miss::MissingKey(_))
        ));
        assert!(matches!(
            path("scalar").locate(&mut doc),
            Located::NotFound(Miss::NotAnObject("a number"))
        ));
        assert!(matches!(
            path("scalar[0]").locate(&mut doc),
            Located::NotFound(Miss::WrongKind { .. })
        ));
    }

    #[test]
    fn test_locate_root_needs_two_fields() {
        let mut empty = json!({});
        assert!(matches!(
            path("").locate(&mut empty),
            Located::NotFound(Miss::TooFewFields(0))
        ));
        let mut full = json!({"a": 1, "b": 2});
        assert!(matches!(path("").locate(&mut full), Located::Found(_)));
    }

    #[test]
    fn test_resolve_scalar() {
        let doc = json!({"data": [{"code": 7, "FLAG": "S"}]});
        assert_eq!(path("data[code=7].FLAG").resolve(&doc), Some(&json!("S")));
        assert_eq!(path("data[0].missing").resolve(&doc), None);
        assert_eq!(path("").resolve(&doc), Some(&doc));
    }
}
