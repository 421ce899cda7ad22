//! Shapes a raw claim value can arrive in.
//!
//! Identity providers disagree on how a field is encoded: the same claim may
//! be a bare string, an array, or a nested object. Each normalizer step first
//! classifies the raw value into a [`FieldShape`] and then decides which
//! shapes it accepts.

use serde_json::{Map, Value};

/// Classification of a single raw field.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FieldShape<'a> {
    Absent,
    Scalar(&'a str),
    Sequence(&'a [Value]),
    Mapping(&'a Map<String, Value>),
    Invalid,
}

impl<'a> FieldShape<'a> {
    /// Classify `key` in `map`. A JSON `null` is present but invalid.
    pub(crate) fn of(map: &'a Map<String, Value>, key: &str) -> Self {
        match map.get(key) {
            None => FieldShape::Absent,
            Some(value) => FieldShape::classify(value),
        }
    }

    pub(crate) fn classify(value: &'a Value) -> Self {
        match value {
            Value::String(s) => FieldShape::Scalar(s),
            Value::Array(items) => FieldShape::Sequence(items),
            Value::Object(map) => FieldShape::Mapping(map),
            _ => FieldShape::Invalid,
        }
    }
}

/// Collect a generic sequence as strings, failing on the first non-string
/// element.
pub(crate) fn string_elements(items: &[Value]) -> Result<Vec<String>, &Value> {
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or(item))
        .collect()
}

/// Collect the string elements of a sequence, dropping everything else.
/// Returns the kept strings and the number of discarded elements.
pub(crate) fn lenient_string_elements(items: &[Value]) -> (Vec<String>, usize) {
    let mut kept = Vec::with_capacity(items.len());
    let mut discarded = 0;
    for item in items {
        match item.as_str() {
            Some(s) => kept.push(s.to_string()),
            None => discarded += 1,
        }
    }
    (kept, discarded)
}

/// A batch of string entries supplied to a list-accepting operation
/// (checkpoint directives, frontend links).
#[derive(Debug, Clone, PartialEq)]
pub enum Entries {
    /// A single string.
    Text(String),
    /// An already typed list of strings.
    Strings(Vec<String>),
    /// A list of generic values; every element must be a string.
    Values(Vec<Value>),
    /// Any other shape. Always rejected.
    Unsupported(Value),
}

impl Entries {
    /// Flatten into strings. On failure returns the value to report.
    pub(crate) fn into_strings(self) -> Result<Vec<String>, Value> {
        match self {
            Entries::Text(s) => Ok(vec![s]),
            Entries::Strings(v) => Ok(v),
            Entries::Values(values) if values.iter().all(Value::is_string) => Ok(values
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect()),
            Entries::Values(values) => Err(Value::Array(values)),
            Entries::Unsupported(value) => Err(value),
        }
    }
}

impl From<&str> for Entries {
    fn from(s: &str) -> Self {
        Entries::Text(s.to_string())
    }
}

impl From<String> for Entries {
    fn from(s: String) -> Self {
        Entries::Text(s)
    }
}

impl From<Vec<String>> for Entries {
    fn from(v: Vec<String>) -> Self {
        Entries::Strings(v)
    }
}

impl From<Vec<&str>> for Entries {
    fn from(v: Vec<&str>) -> Self {
        Entries::Strings(v.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Entries {
    fn from(v: [&str; N]) -> Self {
        Entries::Strings(v.iter().map(|s| s.to_string()).collect())
    }
}

impl From<Vec<Value>> for Entries {
    fn from(v: Vec<Value>) -> Self {
        Entries::Values(v)
    }
}

impl From<Value> for Entries {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Entries::Text(s),
            Value::Array(items) => Entries::Values(items),
            other => Entries::Unsupported(other),
        }
    }
}
