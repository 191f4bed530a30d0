//! Conversions from the string-typed arguments agents send to the typed
//! values the Pipedrive API expects.
//!
//! Every helper treats `None` and blank input as "not provided" and returns
//! `Ok(None)`. Errors render as messages that can be handed straight back to
//! the caller.

use crate::error::ConversionError;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use uuid::Uuid;

pub const ID_EXAMPLE: &str = "123";
pub const UUID_EXAMPLE: &str = "123e4567-e89b-12d3-a456-426614174000";
pub const DATE_EXAMPLE: &str = "2025-01-15";
pub const TIME_EXAMPLE: &str = "14:30:00";

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 500;

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Convert a numeric ID string into a positive integer.
pub fn convert_id_string(
    value: Option<&str>,
    field: &str,
) -> Result<Option<i64>, ConversionError> {
    convert_id_string_with_example(value, field, ID_EXAMPLE)
}

pub fn convert_id_string_with_example(
    value: Option<&str>,
    field: &str,
    example: &str,
) -> Result<Option<i64>, ConversionError> {
    let Some(raw) = non_blank(value) else {
        return Ok(None);
    };

    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(Some(id)),
        Ok(_) => Err(ConversionError::NotPositive {
            field: field.to_string(),
            example: example.to_string(),
        }),
        Err(_) => Err(ConversionError::NotNumeric {
            field: field.to_string(),
            example: example.to_string(),
        }),
    }
}

/// Same as [`convert_id_string`] but the value is mandatory.
pub fn require_id_string(value: Option<&str>, field: &str) -> Result<i64, ConversionError> {
    convert_id_string(value, field)?.ok_or_else(|| ConversionError::NotNumeric {
        field: field.to_string(),
        example: ID_EXAMPLE.to_string(),
    })
}

/// Validate a UUID string and return it in canonical lowercase form.
pub fn validate_uuid_string(
    value: Option<&str>,
    field: &str,
) -> Result<Option<String>, ConversionError> {
    let Some(raw) = non_blank(value) else {
        return Ok(None);
    };

    let invalid = || ConversionError::InvalidUuid {
        field: field.to_string(),
        example: UUID_EXAMPLE.to_string(),
    };

    let lowered = raw.to_ascii_lowercase();
    if !is_hyphenated_uuid(&lowered) {
        return Err(invalid());
    }

    Uuid::parse_str(&lowered)
        .map(|uuid| Some(uuid.hyphenated().to_string()))
        .map_err(|_| invalid())
}

/// Checks the 8-4-4-4-12 lowercase hex layout.
pub fn is_hyphenated_uuid(value: &str) -> bool {
    let groups: Vec<&str> = value.split('-').collect();
    let lengths = [8, 4, 4, 4, 12];
    groups.len() == lengths.len()
        && groups.iter().zip(lengths).all(|(group, len)| {
            group.len() == len
                && group
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        })
}

/// Validate a YYYY-MM-DD date string.
pub fn validate_date_string(
    value: Option<&str>,
    field: &str,
) -> Result<Option<String>, ConversionError> {
    let Some(raw) = non_blank(value) else {
        return Ok(None);
    };

    if is_iso_date(raw) {
        Ok(Some(raw.to_string()))
    } else {
        Err(ConversionError::BadFormat {
            field: field.to_string(),
            expected: "YYYY-MM-DD".to_string(),
            example: DATE_EXAMPLE.to_string(),
        })
    }
}

pub fn is_iso_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// Validate an HH:MM:SS time string including range checks.
pub fn validate_time_string(
    value: Option<&str>,
    field: &str,
) -> Result<Option<String>, ConversionError> {
    let Some(raw) = non_blank(value) else {
        return Ok(None);
    };

    let parts = split_two_digit_groups(raw).filter(|parts| parts.len() == 3);
    let Some(parts) = parts else {
        return Err(ConversionError::BadFormat {
            field: field.to_string(),
            expected: "HH:MM:SS".to_string(),
            example: TIME_EXAMPLE.to_string(),
        });
    };

    if parts[0] > 23 || parts[1] > 59 || parts[2] > 59 {
        return Err(ConversionError::TimeOutOfRange {
            field: field.to_string(),
            example: TIME_EXAMPLE.to_string(),
        });
    }

    Ok(Some(raw.to_string()))
}

/// Convert HH:MM, HH:MM:SS or an ISO datetime to the HH:MM form the API
/// expects for activity times.
pub fn convert_to_api_time_format(
    value: Option<&str>,
    field: &str,
) -> Result<Option<String>, ConversionError> {
    let Some(raw) = non_blank(value) else {
        return Ok(None);
    };

    if let Some(hh_mm) = clock_prefix(raw) {
        return Ok(Some(hh_mm));
    }

    if let Some((date, time)) = raw.split_once('T') {
        if is_iso_date(date) && is_iso_time_with_offset(time) {
            return Ok(Some(time[..5].to_string()));
        }
    }

    Err(ConversionError::InvalidTime {
        field: field.to_string(),
    })
}

/// Convert HH:MM, HH:MM:SS or a number of seconds to an HH:MM duration.
pub fn convert_duration_to_api_format(
    value: Option<&str>,
    field: &str,
) -> Result<Option<String>, ConversionError> {
    let Some(raw) = non_blank(value) else {
        return Ok(None);
    };

    if let Some(hh_mm) = clock_prefix(raw) {
        return Ok(Some(hh_mm));
    }

    if raw.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(seconds) = raw.parse::<u64>() {
            let hours = seconds / 3600;
            let minutes = (seconds % 3600) / 60;
            return Ok(Some(format!("{hours:02}:{minutes:02}")));
        }
    }

    Err(ConversionError::InvalidDuration {
        field: field.to_string(),
    })
}

/// Accepts a bare address string or a location object.
pub fn parse_location_data(
    value: Option<&Value>,
    field: &str,
) -> Result<Option<Value>, ConversionError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(Value::Object(map.clone()))),
        Some(Value::String(s)) if !s.trim().is_empty() => {
            let mut location = Map::new();
            location.insert("value".into(), Value::String(s.trim().to_string()));
            Ok(Some(Value::Object(location)))
        }
        Some(_) => Err(ConversionError::InvalidLocation {
            field: field.to_string(),
        }),
    }
}

/// Normalize a participants list so that every `person_id` is a positive
/// integer.
pub fn format_participants_data(
    value: Option<&Value>,
    field: &str,
) -> Result<Option<Vec<Value>>, ConversionError> {
    let items = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ConversionError::ParticipantsNotList {
                field: field.to_string(),
            })
        }
    };

    let mut formatted = Vec::with_capacity(items.len());
    for (index, participant) in items.iter().enumerate() {
        let Value::Object(map) = participant else {
            return Err(ConversionError::ParticipantNotObject { index });
        };
        let person_id = match map.get("person_id") {
            None => return Err(ConversionError::ParticipantMissingPersonId { index }),
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| ConversionError::ParticipantNotNumeric { index })?,
            Some(Value::Number(n)) => n
                .as_i64()
                .ok_or(ConversionError::ParticipantNotPositive { index })?,
            Some(_) => return Err(ConversionError::ParticipantNotPositive { index }),
        };
        if person_id <= 0 {
            return Err(ConversionError::ParticipantNotPositive { index });
        }

        let mut normalized = map.clone();
        normalized.insert("person_id".into(), Value::from(person_id));
        formatted.push(Value::Object(normalized));
    }

    Ok(Some(formatted))
}

/// Parse a page size, clamping it into `1..=500`.
///
/// Unparseable values fall back to the default page size.
pub fn parse_limit(value: Option<&str>) -> u32 {
    let Some(raw) = non_blank(value) else {
        return DEFAULT_LIMIT;
    };

    match raw.parse::<i64>() {
        Ok(limit) if limit < 1 => DEFAULT_LIMIT,
        Ok(limit) if limit > MAX_LIMIT as i64 => MAX_LIMIT,
        Ok(limit) => limit as u32,
        Err(_) => {
            tracing::warn!(limit = raw, "Invalid limit format, using default of 100");
            DEFAULT_LIMIT
        }
    }
}

/// Parse a decimal number argument.
pub fn parse_number(value: Option<&str>) -> Option<Result<f64, String>> {
    non_blank(value).map(|raw| raw.parse::<f64>().map_err(|_| raw.to_string()))
}

/// Parse "true"/"false" style flags, leaving anything else as `None`.
pub fn parse_bool_str(value: Option<&str>) -> Option<bool> {
    match non_blank(value)?.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" => Some(true),
        "false" | "0" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Returns HH:MM for strict `HH:MM` or `HH:MM:SS` input within clock ranges.
fn clock_prefix(value: &str) -> Option<String> {
    let parts = split_two_digit_groups(value)?;
    let in_range = match parts.as_slice() {
        [h, m] => *h <= 23 && *m <= 59,
        [h, m, s] => *h <= 23 && *m <= 59 && *s <= 59,
        _ => false,
    };
    in_range.then(|| value[..5].to_string())
}

/// Splits `NN:NN[:NN]` into its numeric groups; every group must be two digits.
fn split_two_digit_groups(value: &str) -> Option<Vec<u32>> {
    value
        .split(':')
        .map(|group| {
            if group.len() == 2 && group.chars().all(|c| c.is_ascii_digit()) {
                group.parse::<u32>().ok()
            } else {
                None
            }
        })
        .collect()
}

/// `HH:MM:SS` optionally followed by `Z` or a `+HH:MM`/`-HH:MM` offset.
fn is_iso_time_with_offset(value: &str) -> bool {
    if value.len() < 8 || !value.is_char_boundary(8) {
        return false;
    }
    let (clock, offset) = value.split_at(8);
    let clock_ok = split_two_digit_groups(clock).is_some_and(|parts| parts.len() == 3);
    let offset_ok = match offset {
        "" | "Z" => true,
        _ => {
            (offset.starts_with('+') || offset.starts_with('-'))
                && split_two_digit_groups(&offset[1..]).is_some_and(|parts| parts.len() == 2)
        }
    };
    clock_ok && offset_ok
}
