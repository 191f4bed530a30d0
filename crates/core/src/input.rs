//! Helpers for raw tool arguments.

use serde_json::{Map, Value};

/// Replace blank string arguments with `null`.
///
/// Agents routinely send `""` for parameters they mean to omit.
pub fn sanitize_inputs(inputs: Map<String, Value>) -> Map<String, Value> {
    inputs
        .into_iter()
        .map(|(key, value)| match value {
            Value::String(s) if s.trim().is_empty() => (key, Value::Null),
            other => (key, other),
        })
        .collect()
}

/// Same as [`sanitize_inputs`] for an arbitrary argument value.
pub fn sanitize_value(arguments: Value) -> Value {
    match arguments {
        Value::Object(map) => Value::Object(sanitize_inputs(map)),
        Value::Null => Value::Object(Map::new()),
        other => other,
    }
}

/// Split a comma separated list into trimmed, non-empty items.
pub fn safe_split_to_list(value: Option<&str>) -> Option<Vec<String>> {
    let items: Vec<String> = value?
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect();
    (!items.is_empty()).then_some(items)
}

pub fn format_validation_error(field: &str, value: &str, expected: &str, example: &str) -> String {
    format!("Invalid {field} format: '{value}'. {expected} Example: '{example}'")
}

pub fn bool_to_lowercase_str(value: Option<bool>) -> Option<&'static str> {
    value.map(|v| if v { "true" } else { "false" })
}
