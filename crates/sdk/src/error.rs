//! Error types for the Pipedrive SDK.

use serde_json::Value;

/// Result type for SDK operations.
pub type PipedriveResult<T> = Result<T, PipedriveError>;

/// Error types that can occur when talking to Pipedrive or the cloud agent.
#[derive(Debug, thiserror::Error)]
pub enum PipedriveError {
    /// The API answered with an error status or `success: false`.
    #[error("PipedriveAPIError: {message}{}", api_details(*.status, .error_info.as_deref(), .response_data.as_ref()))]
    Api {
        message: String,
        status: Option<u16>,
        error_info: Option<String>,
        response_data: Option<Value>,
    },

    /// Network failure or timeout before a response arrived.
    #[error("PipedriveAPIError: Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Arguments rejected before any request was sent.
    #[error("{0}")]
    InvalidInput(String),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Event stream failure.
    #[error("Stream error: {0}")]
    Stream(String),
}

fn api_details(status: Option<u16>, info: Option<&str>, data: Option<&Value>) -> String {
    let mut details = Vec::new();
    if let Some(status) = status {
        details.push(format!("Status: {status}"));
    }
    if let Some(info) = info.filter(|i| !i.is_empty()) {
        details.push(format!("Info: {info}"));
    }
    match data {
        Some(Value::Object(map)) if !map.is_empty() => {
            let keys = map.keys().map(String::as_str).collect::<Vec<_>>().join(", ");
            details.push(format!("Response Data Keys: [{keys}]"));
        }
        Some(Value::Null) | None => {}
        Some(Value::Object(_)) => {}
        Some(_) => details.push("Response Data Keys: Present".to_string()),
    }
    if details.is_empty() {
        String::new()
    } else {
        format!(" ({})", details.join(", "))
    }
}

impl PipedriveError {
    pub fn api(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Api {
            message: message.into(),
            status,
            error_info: None,
            response_data: None,
        }
    }

    /// HTTP status of an API error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Body of the failed response, surfaced to callers as `data`.
    pub fn response_data(&self) -> Option<&Value> {
        match self {
            Self::Api { response_data, .. } => response_data.as_ref(),
            _ => None,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(e) => e.is_timeout() || e.is_connect(),
            Self::Api {
                status: Some(status),
                ..
            } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Build the error for a non-2xx response.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(data)) => {
                let error = data
                    .get("error")
                    .and_then(Value::as_str)
                    .map(String::from)
                    .unwrap_or_else(|| format!("HTTP status {status}"));
                let error_info = data
                    .get("error_info")
                    .and_then(Value::as_str)
                    .map(String::from);
                Self::Api {
                    message: format!("HTTP error {status}: {error}"),
                    status: Some(status),
                    error_info,
                    response_data: Some(Value::Object(data)),
                }
            }
            _ => Self::Api {
                message: format!("HTTP error {status}: HTTP status {status}"),
                status: Some(status),
                error_info: Some("Response body was not valid JSON.".to_string()),
                response_data: Some(serde_json::json!({ "raw_error": body })),
            },
        }
    }

    /// Build the error for a 2xx response whose body says `success: false`.
    pub fn from_unsuccessful_body(status: u16, body: Value) -> Self {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("Unknown Pipedrive API error")
            .to_string();
        let error_info = body
            .get("error_info")
            .and_then(Value::as_str)
            .map(String::from);
        Self::Api {
            message,
            status: Some(status),
            error_info,
            response_data: Some(body),
        }
    }
}
