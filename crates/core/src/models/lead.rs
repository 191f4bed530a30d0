use super::{currency, date, default_currency, non_empty, one_of, positive_id, to_object, uuid, ApiRecord};
use crate::error::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const LEAD_VISIBILITY: &[i64] = &[1, 3, 5, 7];

/// A lead. Amount and currency travel as a nested `value` object on the
/// wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_close_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_to: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub was_seen: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

impl Lead {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            amount: None,
            currency: default_currency(),
            person_id: None,
            organization_id: None,
            owner_id: None,
            label_ids: None,
            expected_close_date: None,
            visible_to: None,
            source_name: None,
            is_archived: None,
            was_seen: None,
            channel: None,
            channel_id: None,
        }
    }

    /// Validate only the field rules, without the person/organization link
    /// requirement. Used for partial updates.
    pub fn validate_fields(mut self) -> ValidationResult<Self> {
        self.title = non_empty("title", &self.title, "Lead title cannot be empty")?;

        if matches!(self.amount, Some(a) if a < 0.0) {
            return Err(ValidationError::new(
                "amount",
                "Lead amount must be non-negative if provided",
            ));
        }
        self.currency = currency(&self.currency)?;

        positive_id("person_id", self.person_id)?;
        positive_id("organization_id", self.organization_id)?;
        positive_id("owner_id", self.owner_id)?;
        positive_id("channel", self.channel)?;

        if let Some(id) = self.id.take() {
            self.id = Some(uuid("id", &id)?);
        }
        if let Some(label_ids) = self.label_ids.take() {
            self.label_ids = Some(
                label_ids
                    .iter()
                    .map(|label| uuid("label_ids", label))
                    .collect::<ValidationResult<Vec<_>>>()?,
            );
        }

        date("expected_close_date", self.expected_close_date.as_deref())?;

        if let Some(visible_to) = self.visible_to {
            one_of("visible_to", &visible_to, LEAD_VISIBILITY)?;
        }

        Ok(self)
    }
}

impl ApiRecord for Lead {
    fn validate(self) -> ValidationResult<Self> {
        let lead = self.validate_fields()?;
        if lead.person_id.is_none() && lead.organization_id.is_none() {
            return Err(ValidationError::new(
                "person_id",
                "A lead must be linked to a person or an organization",
            ));
        }
        Ok(lead)
    }

    fn to_api_value(&self) -> Value {
        let mut map = to_object(self);
        map.remove("id");
        // Currency only travels inside `value`, together with an amount
        if let Some(amount) = self.amount {
            map.remove("amount");
            map.remove("currency");
            map.insert(
                "value".into(),
                json!({"amount": amount, "currency": self.currency}),
            );
        }
        Value::Object(map)
    }

    fn from_api_value(value: &Value) -> ValidationResult<Self> {
        let mut data = value.clone();
        if let Value::Object(map) = &mut data {
            match map.remove("value") {
                Some(Value::Object(money)) => {
                    if let Some(amount) = money.get("amount") {
                        map.insert("amount".into(), amount.clone());
                    }
                    if let Some(currency) = money.get("currency") {
                        map.insert("currency".into(), currency.clone());
                    }
                }
                Some(amount @ Value::Number(_)) => {
                    map.insert("amount".into(), amount);
                }
                _ => {}
            }
            if let Some(label) = map.get("label_ids").filter(|v| v.is_string()).cloned() {
                map.insert("label_ids".into(), Value::Array(vec![label]));
            }
            if map.get("currency").is_some_and(Value::is_null) {
                map.remove("currency");
            }
        }

        let lead: Self = serde_json::from_value(data)
            .map_err(|e| ValidationError::new("payload", e.to_string()))?;
        lead.validate_fields()
    }
}
