use crate::error::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

pub const SEARCH_ITEM_TYPES: &[&str] = &[
    "deal",
    "person",
    "organization",
    "product",
    "lead",
    "file",
    "mail_attachment",
    "project",
];

/// One hit from `/itemSearch`. Most fields are only present for some item
/// types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: i64,
    #[serde(rename = "type")]
    pub item_type: String,
    pub result_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_to: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal: Option<Value>,
}

fn has_id(value: Option<&Value>) -> bool {
    value.and_then(|v| v.get("id")).is_some()
}

/// Fold flat `{prefix}_id` / `{prefix}_name` keys into a nested object.
fn fold_related(map: &mut Map<String, Value>, nested: &str, id_key: &str, name_key: &str) {
    if has_id(map.get(nested)) {
        return;
    }
    if map.get(id_key).is_some_and(|id| !id.is_null()) {
        let id = map.remove(id_key).unwrap_or(Value::Null);
        let name = map.remove(name_key).unwrap_or(Value::Null);
        map.insert(nested.to_string(), json!({"id": id, "name": name}));
    }
}

impl SearchResult {
    pub fn from_api_value(value: &Value) -> ValidationResult<Self> {
        let mut map = value.as_object().cloned().unwrap_or_default();
        fold_related(&mut map, "person", "person_id", "person_name");
        fold_related(&mut map, "organization", "org_id", "org_name");

        let result: Self = serde_json::from_value(Value::Object(map))
            .map_err(|e| ValidationError::new("item", e.to_string()))?;

        if !SEARCH_ITEM_TYPES.contains(&result.item_type.as_str()) {
            return Err(ValidationError::new(
                "type",
                format!(
                    "Invalid item type: {}. Must be one of: {}",
                    result.item_type,
                    SEARCH_ITEM_TYPES.join(", ")
                ),
            ));
        }
        Ok(result)
    }
}

/// Search hits with per-type counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemSearchResults {
    pub items: Vec<SearchResult>,
    pub total_count: usize,
    pub next_cursor: Option<String>,
    /// Number of hits per item type, e.g. `{"deal": 2}`.
    pub counts: BTreeMap<String, usize>,
}

impl ItemSearchResults {
    /// Build from raw `/itemSearch` items. Each entry is either a search hit
    /// or an `{item, result_score}` wrapper as returned by the API.
    pub fn from_items(items: &[Value], next_cursor: Option<String>) -> ValidationResult<Self> {
        let mut results = Vec::with_capacity(items.len());
        for raw in items {
            results.push(SearchResult::from_api_value(&unwrap_item(raw))?);
        }

        let mut counts = BTreeMap::new();
        for result in &results {
            *counts.entry(result.item_type.clone()).or_insert(0) += 1;
        }

        Ok(Self {
            total_count: results.len(),
            items: results,
            next_cursor,
            counts,
        })
    }
}

/// `{"result_score": 0.9, "item": {...}}` becomes the item with its score.
fn unwrap_item(raw: &Value) -> Value {
    match (raw.get("item"), raw.get("result_score")) {
        (Some(Value::Object(item)), score) => {
            let mut item = item.clone();
            if let Some(score) = score {
                item.entry("result_score").or_insert(score.clone());
            }
            Value::Object(item)
        }
        _ => raw.clone(),
    }
}

/// One hit from `/itemSearch/field`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSearchResult {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSearchResults {
    pub items: Vec<FieldSearchResult>,
    pub next_cursor: Option<String>,
}

impl FieldSearchResults {
    pub fn from_items(items: &[Value], next_cursor: Option<String>) -> ValidationResult<Self> {
        let items = items
            .iter()
            .map(|item| {
                serde_json::from_value(item.clone())
                    .map_err(|e| ValidationError::new("item", e.to_string()))
            })
            .collect::<ValidationResult<Vec<_>>>()?;
        Ok(Self { items, next_cursor })
    }
}
