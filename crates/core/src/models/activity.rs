use super::{date, non_empty, positive_id, uuid, wrap_value_object, ApiRecord};
use crate::conversion::{
    convert_duration_to_api_format, convert_to_api_time_format, format_participants_data,
};
use crate::error::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A calendar activity (call, meeting, task, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub subject: String,
    #[serde(rename = "type", default)]
    pub activity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub busy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<Value>>,
}

impl Activity {
    pub fn new(subject: impl Into<String>, activity_type: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            activity_type: activity_type.into(),
            ..Default::default()
        }
    }
}

/// `9:30` is accepted and padded to `09:30` before the usual time rules.
fn pad_single_digit_hour(value: &str) -> String {
    match value.split_once(':') {
        Some((hour, rest)) if hour.len() == 1 && hour.chars().all(|c| c.is_ascii_digit()) => {
            format!("0{hour}:{rest}")
        }
        _ => value.to_string(),
    }
}

impl ApiRecord for Activity {
    fn validate(mut self) -> ValidationResult<Self> {
        self.subject = non_empty("subject", &self.subject, "Activity subject cannot be empty")?;
        self.activity_type =
            non_empty("type", &self.activity_type, "Activity type cannot be empty")?;

        positive_id("owner_id", self.owner_id)?;
        positive_id("deal_id", self.deal_id)?;
        positive_id("person_id", self.person_id)?;
        positive_id("org_id", self.org_id)?;

        if let Some(lead_id) = self.lead_id.take() {
            self.lead_id = Some(uuid("lead_id", &lead_id)?);
        }

        date("due_date", self.due_date.as_deref())?;

        if let Some(due_time) = self.due_time.take() {
            let padded = pad_single_digit_hour(due_time.trim());
            self.due_time = convert_to_api_time_format(Some(&padded), "due_time")
                .map_err(|e| ValidationError::new("due_time", e.to_string()))?;
        }

        if let Some(duration) = self.duration.take() {
            self.duration = convert_duration_to_api_format(Some(&duration), "duration")
                .map_err(|e| ValidationError::new("duration", e.to_string()))?;
        }

        if let Some(priority) = self.priority {
            if !(0..=999).contains(&priority) {
                return Err(ValidationError::new(
                    "priority",
                    "Priority must be between 0 and 999",
                ));
            }
        }

        self.location = wrap_value_object(self.location.take());

        if let Some(participants) = self.participants.take() {
            let list = Value::Array(participants);
            self.participants = format_participants_data(Some(&list), "participants")
                .map_err(|e| ValidationError::new("participants", e.to_string()))?;
        }

        Ok(self)
    }
}
