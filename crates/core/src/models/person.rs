use super::{non_empty, one_of, positive_id, ApiRecord};
use crate::error::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Owner only, owner's visibility group, entire company.
pub const PERSON_VISIBILITY: &[i64] = &[1, 2, 3];

fn default_label() -> String {
    "work".to_string()
}

/// One email address or phone number of a person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub value: String,
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default)]
    pub primary: bool,
}

impl ContactInfo {
    /// An email entry, primary unless told otherwise.
    pub fn email(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            primary: true,
        }
    }

    pub fn phone(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            primary: true,
        }
    }

    fn validate(mut self, field: &str) -> ValidationResult<Self> {
        self.value = non_empty(field, &self.value, "Contact value cannot be empty")?;
        self.label = self.label.trim().to_string();
        if self.label.is_empty() {
            self.label = default_label();
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<ContactInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phones: Vec<ContactInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_to: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<Map<String, Value>>,
}

impl Person {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

fn at_most_one_primary(field: &str, entries: &[ContactInfo]) -> ValidationResult<()> {
    if entries.iter().filter(|entry| entry.primary).count() > 1 {
        return Err(ValidationError::new(
            field,
            format!("Only one {field} entry can be marked as primary"),
        ));
    }
    Ok(())
}

impl ApiRecord for Person {
    fn validate(mut self) -> ValidationResult<Self> {
        self.name = non_empty("name", &self.name, "Person name cannot be empty")?;
        positive_id("owner_id", self.owner_id)?;
        positive_id("org_id", self.org_id)?;

        self.emails = std::mem::take(&mut self.emails)
            .into_iter()
            .map(|email| email.validate("emails"))
            .collect::<ValidationResult<Vec<_>>>()?;
        if let Some(bad) = self.emails.iter().find(|email| !email.value.contains('@')) {
            return Err(ValidationError::new(
                "emails",
                format!("Invalid email format: {}", bad.value),
            ));
        }
        self.phones = std::mem::take(&mut self.phones)
            .into_iter()
            .map(|phone| phone.validate("phones"))
            .collect::<ValidationResult<Vec<_>>>()?;

        at_most_one_primary("emails", &self.emails)?;
        at_most_one_primary("phones", &self.phones)?;

        if let Some(visible_to) = self.visible_to {
            one_of("visible_to", &visible_to, PERSON_VISIBILITY)?;
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_contact_defaults() {
        let email = ContactInfo::email("a@example.com", "work");
        assert!(email.primary);
        let parsed: ContactInfo = serde_json::from_value(json!({"value": "+1"})).unwrap();
        assert_eq!(parsed.label, "work");
        assert!(!parsed.primary);
    }

    #[test]
    fn test_rejects_invalid_email_and_two_primaries() {
        let person = Person {
            emails: vec![ContactInfo::email("nope", "work")],
            ..Person::new("Ann")
        };
        assert_eq!(person.validate().unwrap_err().field, "emails");

        let person = Person {
            phones: vec![
                ContactInfo::phone("+1", "work"),
                ContactInfo::phone("+2", "home"),
            ],
            ..Person::new("Ann")
        };
        assert_eq!(person.validate().unwrap_err().field, "phones");
    }

    #[test]
    fn test_rejects_visibility_outside_set() {
        let person = Person {
            visible_to: Some(4),
            ..Person::new("Ann")
        };
        assert!(person.validate().is_err());
    }

    #[test]
    fn test_round_trip() {
        let person = Person {
            id: Some(1),
            org_id: Some(2),
            emails: vec![ContactInfo::email("ann@example.com", "work")],
            phones: vec![ContactInfo::phone("+49 30 123", "mobile")],
            visible_to: Some(3),
            ..Person::new("Ann")
        }
        .validate()
        .unwrap();

        let payload = person.to_api_value();
        assert_eq!(
            payload["emails"],
            json!([{"value": "ann@example.com", "label": "work", "primary": true}])
        );
        let parsed = Person::from_api_value(&payload).unwrap();
        assert_eq!(parsed, Person { id: None, ..person });
    }
}
