use super::{non_empty, one_of, positive_id, wrap_value_object, ApiRecord};
use crate::error::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Owner only, owner's visibility group, entire company, specified users.
pub const ORGANIZATION_VISIBILITY: &[i64] = &[1, 2, 3, 4];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_to: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label_ids: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    /// Custom field values keyed by field hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<Map<String, Value>>,
}

impl Organization {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Normalize a user supplied address into `{"value": ...}`.
    ///
    /// Blank strings and objects without a usable `value` yield `None`.
    pub fn format_address(address: Option<&Value>) -> Option<Value> {
        match address? {
            Value::String(s) if !s.trim().is_empty() => {
                wrap_value_object(Some(Value::String(s.trim().to_string())))
            }
            Value::Object(map)
                if map
                    .get("value")
                    .and_then(Value::as_str)
                    .is_some_and(|v| !v.trim().is_empty()) =>
            {
                Some(Value::Object(map.clone()))
            }
            _ => None,
        }
    }
}

impl ApiRecord for Organization {
    fn validate(mut self) -> ValidationResult<Self> {
        self.name = non_empty("name", &self.name, "Organization name cannot be empty")?;
        positive_id("owner_id", self.owner_id)?;

        if let Some(visible_to) = self.visible_to {
            one_of("visible_to", &visible_to, ORGANIZATION_VISIBILITY)?;
        }

        self.address = wrap_value_object(self.address.take());
        if let Some(address) = &self.address {
            let has_value = address
                .get("value")
                .and_then(Value::as_str)
                .is_some_and(|v| !v.trim().is_empty());
            if !has_value {
                return Err(ValidationError::new(
                    "address",
                    "Address must be an object with a non-empty 'value'. Example: {\"value\": \"123 Main St, City, Country\"}",
                ));
            }
        }

        Ok(self)
    }
}

/// A user following an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationFollower {
    pub user_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_time: Option<String>,
}

impl ApiRecord for OrganizationFollower {
    const EXCLUDED: &'static [&'static str] = &[];

    fn validate(self) -> ValidationResult<Self> {
        if self.user_id <= 0 {
            return Err(ValidationError::new(
                "user_id",
                "user_id must be a positive integer",
            ));
        }
        Ok(self)
    }
}
