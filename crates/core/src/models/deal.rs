use super::{currency, date, default_currency, non_empty, one_of, positive_id, ApiRecord};
use crate::error::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};

pub const DEAL_STATUSES: &[&str] = &["open", "won", "lost"];

/// Deal visibility: owner only, owner's visibility group, sub-groups, whole company.
pub const VISIBILITY_PRIVATE: i64 = 0;
pub const VISIBILITY_SHARED: i64 = 1;
pub const VISIBILITY_TEAM: i64 = 3;
pub const VISIBILITY_ENTIRE_COMPANY: i64 = 7;
pub const DEAL_VISIBILITY: &[i64] = &[
    VISIBILITY_PRIVATE,
    VISIBILITY_SHARED,
    VISIBILITY_TEAM,
    VISIBILITY_ENTIRE_COMPANY,
];

fn default_status() -> String {
    "open".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<i64>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_close_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_to: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lost_reason: Option<String>,
}

impl Deal {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            value: None,
            currency: default_currency(),
            person_id: None,
            org_id: None,
            status: default_status(),
            owner_id: None,
            stage_id: None,
            pipeline_id: None,
            expected_close_date: None,
            visible_to: None,
            probability: None,
            lost_reason: None,
        }
    }
}

impl ApiRecord for Deal {
    fn validate(mut self) -> ValidationResult<Self> {
        self.title = non_empty("title", &self.title, "Deal title cannot be empty")?;

        if matches!(self.value, Some(v) if v < 0.0) {
            return Err(ValidationError::new(
                "value",
                "Deal value must be non-negative",
            ));
        }

        self.currency = currency(&self.currency)?;

        self.status = self.status.trim().to_ascii_lowercase();
        if self.status.is_empty() {
            self.status = default_status();
        }
        one_of("status", &self.status.as_str(), DEAL_STATUSES)?;

        positive_id("person_id", self.person_id)?;
        positive_id("org_id", self.org_id)?;
        positive_id("owner_id", self.owner_id)?;
        positive_id("stage_id", self.stage_id)?;
        positive_id("pipeline_id", self.pipeline_id)?;

        date("expected_close_date", self.expected_close_date.as_deref())?;

        if let Some(visible_to) = self.visible_to {
            one_of("visible_to", &visible_to, DEAL_VISIBILITY)?;
        }

        if matches!(self.probability, Some(p) if !(0..=100).contains(&p)) {
            return Err(ValidationError::new(
                "probability",
                "Probability must be between 0 and 100",
            ));
        }

        if self.lost_reason.is_some() && self.status != "lost" {
            return Err(ValidationError::new(
                "lost_reason",
                "Lost reason can only be provided when status is 'lost'",
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
    fn test_validate_normalizes_currency_and_status() {
        let deal = Deal {
            currency: "eur".to_string(),
            status: "WON".to_string(),
            value: Some(1500.5),
            ..Deal::new(" License ")
        }
        .validate()
        .unwrap();
        assert_eq!(deal.title, "License");
        assert_eq!(deal.currency, "EUR");
        assert_eq!(deal.status, "won");
    }

    #[test]
    fn test_private_visibility_is_allowed() {
        let deal = Deal {
            visible_to: Some(0),
            ..Deal::new("Deal")
        };
        assert!(deal.validate().is_ok());

        let deal = Deal {
            visible_to: Some(2),
            ..Deal::new("Deal")
        };
        assert_eq!(deal.validate().unwrap_err().field, "visible_to");
    }

    #[test]
    fn test_lost_reason_requires_lost_status() {
        let deal = Deal {
            lost_reason: Some("Budget".to_string()),
            ..Deal::new("Deal")
        };
        assert_eq!(deal.validate().unwrap_err().field, "lost_reason");

        let deal = Deal {
            status: "lost".to_string(),
            lost_reason: Some("Budget".to_string()),
            ..Deal::new("Deal")
        };
        assert!(deal.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let negative = Deal {
            value: Some(-1.0),
            ..Deal::new("Deal")
        };
        assert!(negative.validate().is_err());

        let probability = Deal {
            probability: Some(101),
            ..Deal::new("Deal")
        };
        assert!(probability.validate().is_err());
    }

    #[test]
    fn test_api_value_and_round_trip() {
        let deal = Deal {
            id: Some(12),
            value: Some(5000.0),
            person_id: Some(123),
            expected_close_date: Some("2025-06-30".to_string()),
            ..Deal::new("New software license")
        }
        .validate()
        .unwrap();

        let payload = deal.to_api_value();
        assert_eq!(
            payload,
            json!({
                "title": "New software license",
                "value": 5000.0,
                "currency": "USD",
                "person_id": 123,
                "status": "open",
                "expected_close_date": "2025-06-30"
            })
        );

        let parsed = Deal::from_api_value(&payload).unwrap();
        assert_eq!(parsed, Deal { id: None, ..deal });
    }
}
