// Argument access and the error-to-envelope mapping shared by every tool

use crate::protocol::CallToolResult;
use pipedrive_core::conversion::{
    convert_id_string, parse_bool_str, parse_limit, require_id_string, validate_date_string,
    validate_uuid_string,
};
use pipedrive_core::envelope::ToolResponse;
use pipedrive_core::input::{format_validation_error, safe_split_to_list};
use pipedrive_core::{ConversionError, ValidationError};
use pipedrive_sdk::PipedriveError;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, warn};

/// Why a tool call failed, in the order the envelope reports them.
#[derive(Debug)]
pub enum ToolError {
    /// Bad argument, caught before any request.
    Input(String),
    /// A record rule rejected the input.
    Validation(ValidationError),
    Api(PipedriveError),
    Unexpected(anyhow::Error),
}

impl ToolError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    pub fn into_response(self) -> ToolResponse {
        match self {
            Self::Input(message) => ToolResponse::error(message),
            Self::Validation(e) => ToolResponse::error(format!("Validation error: {e}")),
            Self::Api(e) => ToolResponse::error_with_data(
                format!("Pipedrive API error: {e}"),
                e.response_data().cloned(),
            ),
            Self::Unexpected(e) => {
                ToolResponse::error(format!("An unexpected error occurred: {e:#}"))
            }
        }
    }
}

impl From<ConversionError> for ToolError {
    fn from(e: ConversionError) -> Self {
        Self::Input(e.to_string())
    }
}

impl From<ValidationError> for ToolError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<PipedriveError> for ToolError {
    fn from(e: PipedriveError) -> Self {
        match e {
            PipedriveError::InvalidInput(message) => Self::Input(message),
            other => Self::Api(other),
        }
    }
}

impl From<anyhow::Error> for ToolError {
    fn from(e: anyhow::Error) -> Self {
        Self::Unexpected(e)
    }
}

pub type ToolOutcome = Result<Value, ToolError>;

/// Wrap a success payload for [`respond`].
pub fn ok(data: impl Serialize) -> ToolOutcome {
    serde_json::to_value(data).map_err(|e| ToolError::Unexpected(e.into()))
}

/// Turn a tool outcome into the MCP result carrying the JSON envelope.
pub fn respond(tool: &str, outcome: ToolOutcome) -> CallToolResult {
    match outcome {
        Ok(data) => CallToolResult::text(ToolResponse::ok(data).to_json()),
        Err(e) => {
            match &e {
                ToolError::Input(message) => warn!(tool, "{message}"),
                ToolError::Validation(v) => warn!(tool, field = %v.field, "Validation error: {v}"),
                ToolError::Api(api) => error!(tool, status = ?api.status(), "Pipedrive API error: {api}"),
                ToolError::Unexpected(u) => error!(tool, "Unexpected error: {u:#}"),
            }
            CallToolResult::error_text(e.into_response().to_json())
        }
    }
}

/// Sanitized tool arguments.
///
/// Agents send most values as strings, but numbers and booleans are
/// accepted wherever a string is expected.
#[derive(Debug, Clone, Default)]
pub struct Args(Map<String, Value>);

impl Args {
    pub fn new(arguments: Value) -> Self {
        match arguments {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Trimmed string form of a scalar argument.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.value(key)? {
            Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn required_text(&self, key: &str) -> Result<String, ToolError> {
        self.text(key).ok_or_else(|| {
            ToolError::input(format!("The '{key}' field is required and cannot be empty."))
        })
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.value(key)? {
            Value::Bool(b) => Some(*b),
            _ => parse_bool_str(self.text(key).as_deref()),
        }
    }

    pub fn id(&self, key: &str) -> Result<Option<i64>, ToolError> {
        Ok(convert_id_string(self.text(key).as_deref(), key)?)
    }

    pub fn required_id(&self, key: &str) -> Result<i64, ToolError> {
        Ok(require_id_string(self.text(key).as_deref(), key)?)
    }

    pub fn uuid(&self, key: &str) -> Result<Option<String>, ToolError> {
        Ok(validate_uuid_string(self.text(key).as_deref(), key)?)
    }

    pub fn date(&self, key: &str) -> Result<Option<String>, ToolError> {
        Ok(validate_date_string(self.text(key).as_deref(), key)?)
    }

    /// A decimal number, e.g. a deal value.
    pub fn number(&self, key: &str) -> Result<Option<f64>, ToolError> {
        let Some(raw) = self.text(key) else {
            return Ok(None);
        };
        raw.parse::<f64>().map(Some).map_err(|_| {
            ToolError::input(format_validation_error(
                key,
                &raw,
                "Must be a valid number.",
                "1500.50",
            ))
        })
    }

    /// A whole number that is not an id, e.g. a priority.
    pub fn integer(&self, key: &str) -> Result<Option<i64>, ToolError> {
        let Some(raw) = self.text(key) else {
            return Ok(None);
        };
        raw.parse::<i64>().map(Some).map_err(|_| {
            ToolError::input(format!("{key} must be a numeric string. Example: '1'"))
        })
    }

    /// Comma separated list, or a JSON array of strings.
    pub fn list(&self, key: &str) -> Option<Vec<String>> {
        match self.value(key)? {
            Value::Array(items) => {
                let items: Vec<String> = items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s.trim().to_string()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .filter(|s| !s.is_empty())
                    .collect();
                (!items.is_empty()).then_some(items)
            }
            _ => safe_split_to_list(self.text(key).as_deref()),
        }
    }

    /// Comma separated list of positive integer ids.
    pub fn id_list(&self, key: &str) -> Result<Option<Vec<i64>>, ToolError> {
        let Some(items) = self.list(key) else {
            return Ok(None);
        };
        items
            .iter()
            .map(|item| {
                convert_id_string(Some(item.as_str()), key)?
                    .ok_or_else(|| ToolError::input(format!("{key} contains an empty id")))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    pub fn limit(&self) -> u32 {
        parse_limit(self.text("limit").as_deref())
    }

    /// A JSON object argument, also accepted as a JSON encoded string.
    pub fn object(&self, key: &str) -> Result<Option<Map<String, Value>>, ToolError> {
        match self.value(key) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map.clone())),
            Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
                Ok(Value::Object(map)) => Ok(Some(map)),
                _ => Err(ToolError::input(format!(
                    "{key} must be a JSON object. Example: '{{\"field_key\": \"value\"}}'"
                ))),
            },
            Some(_) => Err(ToolError::input(format!("{key} must be a JSON object"))),
        }
    }
}

/// Reject a value outside a fixed set of choices.
pub fn check_choice<T>(field: &str, value: Option<T>, allowed: &[T]) -> Result<(), ToolError>
where
    T: PartialEq + std::fmt::Display,
{
    match value {
        Some(v) if !allowed.contains(&v) => {
            let choices = allowed
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            Err(ToolError::input(format!(
                "Invalid {field}: {v}. Must be one of: {choices}"
            )))
        }
        _ => Ok(()),
    }
}

/// Uppercased three-letter currency code.
pub fn currency_code(value: Option<String>) -> Result<Option<String>, ToolError> {
    let Some(code) = value.map(|c| c.to_ascii_uppercase()) else {
        return Ok(None);
    };
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ToolError::input(format_validation_error(
            "currency",
            &code,
            "Must be a 3-letter ISO currency code.",
            "USD",
        )));
    }
    Ok(Some(code))
}

/// Builder for the API-shaped field map sent by update tools.
#[derive(Debug, Default)]
pub struct Fields(Map<String, Value>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: Option<impl Into<Value>>) -> &mut Self {
        if let Some(value) = value {
            self.0.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_accepts_numbers_and_trims() {
        let args = Args::new(json!({"a": " x ", "b": 5, "c": null, "d": true}));
        assert_eq!(args.text("a").as_deref(), Some("x"));
        assert_eq!(args.text("b").as_deref(), Some("5"));
        assert_eq!(args.text("c"), None);
        assert_eq!(args.flag("d"), Some(true));
    }

    #[test]
    fn test_id_errors_are_input_errors() {
        let args = Args::new(json!({"deal_id": "abc", "org_id": "-1"}));
        let ToolError::Input(message) = args.id("deal_id").unwrap_err() else {
            panic!("expected input error");
        };
        assert_eq!(message, "deal_id must be a numeric string. Example: '123'");
        assert!(args.id("org_id").is_err());
        assert_eq!(args.id("missing").unwrap(), None);
    }

    #[test]
    fn test_lists() {
        let args = Args::new(json!({"a": "x, y", "b": ["p", " ", "q"], "ids": "1,2"}));
        assert_eq!(args.list("a"), Some(vec!["x".to_string(), "y".to_string()]));
        assert_eq!(args.list("b"), Some(vec!["p".to_string(), "q".to_string()]));
        assert_eq!(args.id_list("ids").unwrap(), Some(vec![1, 2]));
    }

    #[test]
    fn test_number_error_message() {
        let args = Args::new(json!({"value": "lots"}));
        let ToolError::Input(message) = args.number("value").unwrap_err() else {
            panic!("expected input error");
        };
        assert_eq!(
            message,
            "Invalid value format: 'lots'. Must be a valid number. Example: '1500.50'"
        );
    }

    #[test]
    fn test_api_error_envelope_carries_response_data() {
        let err = PipedriveError::from_response(404, r#"{"success": false, "error": "Not found"}"#);
        let response = ToolError::from(err).into_response();
        assert!(!response.success);
        assert!(response
            .error
            .as_deref()
            .unwrap()
            .starts_with("Pipedrive API error: PipedriveAPIError: HTTP error 404: Not found"));
        assert_eq!(response.data.unwrap()["error"], "Not found");
    }

    #[test]
    fn test_invalid_input_from_sdk_stays_inline() {
        let err = PipedriveError::InvalidInput("Invalid limit: 0. Must be between 1 and 500.".into());
        let response = ToolError::from(err).into_response();
        assert_eq!(
            response.error.as_deref(),
            Some("Invalid limit: 0. Must be between 1 and 500.")
        );
    }

    #[test]
    fn test_respond_wraps_success() {
        let result = respond("t", ok(json!({"id": 1})));
        let envelope: Value = serde_json::from_str(&result.joined_text()).unwrap();
        assert_eq!(envelope, json!({"success": true, "data": {"id": 1}, "error": null}));
        assert_eq!(result.is_error, None);
    }
}
