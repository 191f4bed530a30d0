//! Transient records mirroring Pipedrive resources.
//!
//! A record is built from tool arguments, validated, turned into an API
//! payload and dropped. Parsing goes the other way for responses.

pub mod activity;
pub mod activity_type;
pub mod deal;
pub mod deal_product;
pub mod lead;
pub mod lead_label;
pub mod organization;
pub mod person;
pub mod search_result;

pub use activity::Activity;
pub use activity_type::ActivityType;
pub use deal::Deal;
pub use deal_product::DealProduct;
pub use lead::Lead;
pub use lead_label::LeadLabel;
pub use organization::{Organization, OrganizationFollower};
pub use person::{ContactInfo, Person};
pub use search_result::{FieldSearchResult, FieldSearchResults, ItemSearchResults, SearchResult};

use crate::conversion::{is_hyphenated_uuid, is_iso_date};
use crate::error::{ValidationError, ValidationResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Conversion between a validated record and its API JSON shape.
pub trait ApiRecord: Serialize + DeserializeOwned + Sized {
    /// Keys never sent to the API.
    const EXCLUDED: &'static [&'static str] = &["id"];

    /// Check every field rule, returning the normalized record.
    fn validate(self) -> ValidationResult<Self>;

    /// Payload for create/update calls: no nulls, no excluded keys.
    fn to_api_value(&self) -> Value {
        let mut map = to_object(self);
        for key in Self::EXCLUDED {
            map.remove(*key);
        }
        Value::Object(map)
    }

    /// Parse and validate an API response object. Unknown keys are ignored.
    fn from_api_value(value: &Value) -> ValidationResult<Self> {
        let record: Self = serde_json::from_value(value.clone())
            .map_err(|e| ValidationError::new("payload", e.to_string()))?;
        record.validate()
    }
}

/// Serialize into a JSON object with null entries removed.
pub(crate) fn to_object<T: Serialize>(record: &T) -> Map<String, Value> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map.into_iter().filter(|(_, v)| !v.is_null()).collect(),
        _ => Map::new(),
    }
}

pub(crate) fn non_empty(field: &str, value: &str, message: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, message));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn positive_id(field: &str, value: Option<i64>) -> ValidationResult<()> {
    match value {
        Some(id) if id <= 0 => Err(ValidationError::new(
            field,
            format!("{field} must be a positive integer if provided"),
        )),
        _ => Ok(()),
    }
}

pub(crate) fn one_of<T>(field: &str, value: &T, allowed: &[T]) -> ValidationResult<()>
where
    T: PartialEq + std::fmt::Display,
{
    if allowed.contains(value) {
        return Ok(());
    }
    let choices = allowed
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Err(ValidationError::new(
        field,
        format!("Invalid {field} value: {value}. Must be one of: {choices}"),
    ))
}

pub(crate) fn date(field: &str, value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(v) if !is_iso_date(v) => Err(ValidationError::new(
            field,
            format!("Invalid date format for {field}: '{v}'. Use YYYY-MM-DD"),
        )),
        _ => Ok(()),
    }
}

pub(crate) fn uuid(field: &str, value: &str) -> ValidationResult<String> {
    let lowered = value.trim().to_ascii_lowercase();
    if is_hyphenated_uuid(&lowered) {
        Ok(lowered)
    } else {
        Err(ValidationError::new(
            field,
            format!("Invalid UUID format for {field}: '{value}'"),
        ))
    }
}

/// Three-letter currency code, uppercased. Blank falls back to USD.
pub(crate) fn currency(value: &str) -> ValidationResult<String> {
    let code = value.trim().to_ascii_uppercase();
    if code.is_empty() {
        return Ok(default_currency());
    }
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::new(
            "currency",
            format!("Invalid currency code format: {code}. Must be a 3-letter code (e.g., USD, EUR)."),
        ));
    }
    Ok(code)
}

pub(crate) fn default_currency() -> String {
    "USD".to_string()
}

pub(crate) fn default_true() -> bool {
    true
}

/// Wrap a bare string as `{"value": ...}`, the shape Pipedrive uses for
/// addresses and locations.
pub(crate) fn wrap_value_object(value: Option<Value>) -> Option<Value> {
    match value {
        Some(Value::String(s)) => {
            let mut map = Map::new();
            map.insert("value".into(), Value::String(s));
            Some(Value::Object(map))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_normalization() {
        assert_eq!(currency("eur").unwrap(), "EUR");
        assert_eq!(currency("").unwrap(), "USD");
        assert!(currency("EURO").is_err());
        assert!(currency("U5D").is_err());
    }

    #[test]
    fn test_one_of_lists_choices() {
        let err = one_of("status", &"done", &["open", "won", "lost"]).unwrap_err();
        assert_eq!(
            err.message,
            "Invalid status value: done. Must be one of: open, won, lost"
        );
    }
}
