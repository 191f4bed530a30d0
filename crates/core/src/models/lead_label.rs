use super::{non_empty, one_of, uuid, ApiRecord};
use crate::error::ValidationResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const LEAD_LABEL_COLORS: &[&str] = &[
    "blue",
    "brown",
    "dark-gray",
    "gray",
    "green",
    "orange",
    "pink",
    "purple",
    "red",
    "yellow",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadLabel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

impl ApiRecord for LeadLabel {
    const EXCLUDED: &'static [&'static str] = &["id", "add_time", "update_time"];

    fn validate(mut self) -> ValidationResult<Self> {
        self.name = non_empty("name", &self.name, "Lead label name cannot be empty")?;
        self.color = self.color.trim().to_ascii_lowercase();
        one_of("color", &self.color.as_str(), LEAD_LABEL_COLORS)?;
        if let Some(id) = self.id.take() {
            self.id = Some(uuid("id", &id)?);
        }
        Ok(self)
    }
}
