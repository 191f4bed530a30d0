//! The uniform `{success, data, error}` envelope every tool returns.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
}

impl ToolResponse {
    pub fn ok(data: impl Serialize) -> Self {
        Self {
            success: true,
            data: Some(to_value_or_null(data)),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Failure that still carries the remote response body.
    pub fn error_with_data(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success: false,
            data,
            error: Some(message.into()),
        }
    }

    /// Pretty-printed JSON, the form handed back to agents.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            format!(
                "{{\"success\": false, \"data\": null, \"error\": \"failed to encode response: {e}\"}}"
            )
        })
    }
}

fn to_value_or_null(data: impl Serialize) -> Value {
    serde_json::to_value(data).unwrap_or(Value::Null)
}

pub fn format_tool_response(success: bool, data: Option<Value>, error: Option<String>) -> String {
    ToolResponse {
        success,
        data,
        error,
    }
    .to_json()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_success_envelope_keeps_all_keys() {
        let text = ToolResponse::ok(json!({"id": 123})).to_json();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!({"success": true, "data": {"id": 123}, "error": null}));
        assert!(text.contains('\n'));
    }

    #[test]
    fn test_error_envelope() {
        let parsed: Value =
            serde_json::from_str(&format_tool_response(false, None, Some("boom".into()))).unwrap();
        assert_eq!(parsed, json!({"success": false, "data": null, "error": "boom"}));
    }

    #[test]
    fn test_timestamps_are_iso() {
        let at = Utc.with_ymd_and_hms(2025, 1, 15, 14, 30, 0).unwrap();
        let response = ToolResponse::ok(json!({ "at": at }));
        assert_eq!(response.data.unwrap()["at"], json!("2025-01-15T14:30:00Z"));
    }
}
