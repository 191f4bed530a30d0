use super::{default_true, non_empty, one_of, ApiRecord};
use crate::error::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};

/// Icons Pipedrive accepts for activity types.
pub const ICON_KEYS: &[&str] = &[
    "task",
    "email",
    "meeting",
    "deadline",
    "call",
    "lunch",
    "calendar",
    "downarrow",
    "document",
    "smartphone",
    "camera",
    "scissors",
    "cogs",
    "bubble",
    "uparrow",
    "checkbox",
    "signpost",
    "shuffle",
    "addressbook",
    "linegraph",
    "picture",
    "car",
    "world",
    "search",
    "clip",
    "sound",
    "brush",
    "key",
    "padlock",
    "pricetag",
    "suitcase",
    "finish",
    "plane",
    "loop",
    "wifi",
    "truck",
    "cart",
    "bulb",
    "bell",
    "presentation",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub icon_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_nr: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_string: Option<String>,
    #[serde(default = "default_true")]
    pub active_flag: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_custom_flag: Option<bool>,
}

impl ActivityType {
    pub fn new(name: impl Into<String>, icon_key: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            icon_key: icon_key.into(),
            color: None,
            order_nr: None,
            key_string: None,
            active_flag: true,
            is_custom_flag: None,
        }
    }
}

impl ApiRecord for ActivityType {
    const EXCLUDED: &'static [&'static str] = &["id", "key_string", "is_custom_flag"];

    fn validate(mut self) -> ValidationResult<Self> {
        self.name = non_empty("name", &self.name, "Activity type name cannot be empty")?;
        self.icon_key = self.icon_key.trim().to_string();
        one_of("icon_key", &self.icon_key.as_str(), ICON_KEYS)?;

        if let Some(color) = self.color.take() {
            let color = color.trim().trim_start_matches('#').to_ascii_uppercase();
            if color.len() != 6 || !color.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ValidationError::new(
                    "color",
                    format!("Invalid color format: {color}. Must be a 6-character HEX code without '#' (e.g., FFFFFF)"),
                ));
            }
            self.color = Some(color);
        }

        if matches!(self.order_nr, Some(n) if n < 0) {
            return Err(ValidationError::new(
                "order_nr",
                "order_nr must be a non-negative integer",
            ));
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_color_is_uppercased() {
        let activity_type = ActivityType {
            color: Some("ff00aa".to_string()),
            ..ActivityType::new("Demo", "presentation")
        }
        .validate()
        .unwrap();
        assert_eq!(activity_type.color.as_deref(), Some("FF00AA"));
    }

    #[test]
    fn test_rejects_unknown_icon_and_bad_color() {
        assert!(ActivityType::new("Demo", "rocket").validate().is_err());
        let bad_color = ActivityType {
            color: Some("FFF".to_string()),
            ..ActivityType::new("Demo", "task")
        };
        assert_eq!(bad_color.validate().unwrap_err().field, "color");
        let bad_order = ActivityType {
            order_nr: Some(-1),
            ..ActivityType::new("Demo", "task")
        };
        assert!(bad_order.validate().is_err());
    }

    #[test]
    fn test_api_value_excludes_read_only_fields() {
        let activity_type = ActivityType {
            id: Some(1),
            key_string: Some("demo".to_string()),
            is_custom_flag: Some(true),
            order_nr: Some(2),
            ..ActivityType::new("Demo", "task")
        };
        assert_eq!(
            activity_type.to_api_value(),
            json!({"name": "Demo", "icon_key": "task", "order_nr": 2, "active_flag": true})
        );
    }

    #[test]
    fn test_from_api_defaults_active_flag() {
        let parsed =
            ActivityType::from_api_value(&json!({"id": 3, "name": "Call", "icon_key": "call"}))
                .unwrap();
        assert!(parsed.active_flag);
        assert_eq!(parsed.id, Some(3));
    }
}
