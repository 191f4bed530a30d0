use super::{currency, date, default_currency, default_true, one_of, positive_id, ApiRecord};
use crate::error::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};

pub const DISCOUNT_TYPES: &[&str] = &["percentage", "amount"];
pub const TAX_METHODS: &[&str] = &["inclusive", "exclusive", "none"];
pub const BILLING_FREQUENCIES: &[&str] = &[
    "one-time",
    "annually",
    "semi-annually",
    "quarterly",
    "monthly",
    "weekly",
];
pub const MAX_BILLING_CYCLES: i64 = 208;

fn default_discount_type() -> String {
    "percentage".to_string()
}

fn default_tax_method() -> String {
    "inclusive".to_string()
}

fn default_billing_frequency() -> String {
    "one-time".to_string()
}

/// A product attached to a deal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealProduct {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<i64>,
    pub product_id: i64,
    pub item_price: f64,
    pub quantity: i64,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub tax: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_discount_type")]
    pub discount_type: String,
    #[serde(default = "default_tax_method")]
    pub tax_method: String,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_variation_id: Option<i64>,
    #[serde(default = "default_billing_frequency")]
    pub billing_frequency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_frequency_cycles: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_start_date: Option<String>,
}

impl DealProduct {
    pub fn new(product_id: i64, item_price: f64, quantity: i64) -> Self {
        Self {
            id: None,
            deal_id: None,
            product_id,
            item_price,
            quantity,
            discount: 0.0,
            tax: 0.0,
            comments: None,
            currency: default_currency(),
            discount_type: default_discount_type(),
            tax_method: default_tax_method(),
            is_enabled: true,
            product_variation_id: None,
            billing_frequency: default_billing_frequency(),
            billing_frequency_cycles: None,
            billing_start_date: None,
        }
    }
}

/// Rules for `billing_frequency` / `billing_frequency_cycles`, shared with
/// partial updates where only some fields are present.
pub fn check_billing_cycles(frequency: &str, cycles: Option<i64>) -> ValidationResult<()> {
    if let Some(cycles) = cycles {
        if !(1..=MAX_BILLING_CYCLES).contains(&cycles) {
            return Err(ValidationError::new(
                "billing_frequency_cycles",
                "Billing frequency cycles must be a positive integer less than or equal to 208.",
            ));
        }
    }
    match (frequency, cycles) {
        ("one-time", Some(_)) => Err(ValidationError::new(
            "billing_frequency_cycles",
            "When billing_frequency is 'one-time', billing_frequency_cycles must be null.",
        )),
        ("weekly", None) => Err(ValidationError::new(
            "billing_frequency_cycles",
            "When billing_frequency is 'weekly', billing_frequency_cycles must be specified.",
        )),
        _ => Ok(()),
    }
}

impl ApiRecord for DealProduct {
    const EXCLUDED: &'static [&'static str] = &["id", "deal_id"];

    fn validate(mut self) -> ValidationResult<Self> {
        if self.product_id <= 0 {
            return Err(ValidationError::new(
                "product_id",
                "Product ID must be a positive integer",
            ));
        }
        if self.item_price <= 0.0 {
            return Err(ValidationError::new(
                "item_price",
                "Item price must be greater than zero.",
            ));
        }
        if self.quantity <= 0 {
            return Err(ValidationError::new(
                "quantity",
                "Quantity must be greater than zero.",
            ));
        }
        if self.discount < 0.0 {
            return Err(ValidationError::new(
                "discount",
                "Discount must be non-negative",
            ));
        }
        if self.tax < 0.0 {
            return Err(ValidationError::new("tax", "Tax must be non-negative"));
        }

        self.currency = currency(&self.currency)?;
        positive_id("product_variation_id", self.product_variation_id)?;

        self.discount_type = self.discount_type.trim().to_ascii_lowercase();
        one_of("discount_type", &self.discount_type.as_str(), DISCOUNT_TYPES)?;
        self.tax_method = self.tax_method.trim().to_ascii_lowercase();
        one_of("tax_method", &self.tax_method.as_str(), TAX_METHODS)?;
        self.billing_frequency = self.billing_frequency.trim().to_ascii_lowercase();
        one_of(
            "billing_frequency",
            &self.billing_frequency.as_str(),
            BILLING_FREQUENCIES,
        )?;
        check_billing_cycles(&self.billing_frequency, self.billing_frequency_cycles)?;

        date("billing_start_date", self.billing_start_date.as_deref())?;

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let product = DealProduct::new(1, 10.0, 2).validate().unwrap();
        assert_eq!(product.discount_type, "percentage");
        assert_eq!(product.tax_method, "inclusive");
        assert_eq!(product.billing_frequency, "one-time");
        assert!(product.is_enabled);
    }

    #[test]
    fn test_billing_cycle_rules() {
        let one_time = DealProduct {
            billing_frequency_cycles: Some(3),
            ..DealProduct::new(1, 10.0, 1)
        };
        assert!(one_time.validate().is_err());

        let weekly = DealProduct {
            billing_frequency: "weekly".to_string(),
            ..DealProduct::new(1, 10.0, 1)
        };
        assert!(weekly.validate().is_err());

        let monthly = DealProduct {
            billing_frequency: "monthly".to_string(),
            billing_frequency_cycles: Some(209),
            ..DealProduct::new(1, 10.0, 1)
        };
        assert!(monthly.validate().is_err());

        let weekly_ok = DealProduct {
            billing_frequency: "Weekly".to_string(),
            billing_frequency_cycles: Some(52),
            ..DealProduct::new(1, 10.0, 1)
        };
        assert!(weekly_ok.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_amounts() {
        assert!(DealProduct::new(0, 10.0, 1).validate().is_err());
        assert!(DealProduct::new(1, 0.0, 1).validate().is_err());
        assert!(DealProduct::new(1, 10.0, 0).validate().is_err());
        let bad_type = DealProduct {
            discount_type: "bogo".to_string(),
            ..DealProduct::new(1, 10.0, 1)
        };
        assert!(bad_type.validate().is_err());
    }

    #[test]
    fn test_api_value_excludes_ids() {
        let product = DealProduct {
            id: Some(5),
            deal_id: Some(9),
            ..DealProduct::new(1, 10.0, 2)
        };
        let payload = product.to_api_value();
        assert!(payload.get("id").is_none());
        assert!(payload.get("deal_id").is_none());
        assert_eq!(payload["product_id"], json!(1));

        let parsed = DealProduct::from_api_value(&payload).unwrap();
        assert_eq!(
            parsed,
            DealProduct {
                id: None,
                deal_id: None,
                ..product
            }
        );
    }
}
