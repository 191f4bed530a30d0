//! Per-entity API endpoints.

pub mod activities;
pub mod deals;
pub mod item_search;
pub mod leads;
pub mod organizations;
pub mod persons;

pub use activities::{ActivitiesApi, ListActivitiesParams};
pub use deals::{DealsApi, GetDealParams, ListDealsParams, SearchDealsParams};
pub use item_search::{ItemSearchApi, SearchFieldParams, SearchItemsParams};
pub use leads::{LeadPage, LeadsApi, ListLeadsParams, SearchLeadsParams, UpdateLeadParams};
pub use organizations::{
    GetOrganizationParams, ListOrganizationsParams, OrganizationsApi, SearchOrganizationsParams,
};
pub use persons::{GetPersonParams, ListPersonsParams, PersonsApi, SearchPersonsParams};

use crate::error::{PipedriveError, PipedriveResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const SORT_FIELDS: &[&str] = &["id", "update_time", "add_time"];
pub const SORT_DIRECTIONS: &[&str] = &["asc", "desc"];
pub const MAX_PAGE_LIMIT: u32 = 500;

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<Value>,
    pub next_cursor: Option<String>,
}

impl Page {
    /// Items from `data`, cursor from `additional_data.next_cursor`.
    pub(crate) fn from_list(body: &Value) -> Self {
        Self {
            items: as_list(body.get("data")),
            next_cursor: next_cursor(body),
        }
    }

    /// Items from `data.items`, as returned by the search endpoints.
    pub(crate) fn from_search(body: &Value) -> Self {
        Self {
            items: as_list(body.get("data").and_then(|d| d.get("items"))),
            next_cursor: next_cursor(body),
        }
    }
}

fn as_list(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

fn next_cursor(body: &Value) -> Option<String> {
    body.get("additional_data")
        .and_then(|d| d.get("next_cursor"))
        .and_then(Value::as_str)
        .map(String::from)
}

/// The `data` member of a response, `{}` when missing.
pub(crate) fn data_of(body: Value) -> Value {
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Null) | None => Value::Object(Map::new()),
            Some(data) => data,
        },
        _ => Value::Object(Map::new()),
    }
}

pub(crate) fn data_list(body: &Value) -> Vec<Value> {
    as_list(body.get("data"))
}

pub(crate) fn positive_id(id: i64, entity: &str) -> PipedriveResult<()> {
    if id <= 0 {
        return Err(PipedriveError::InvalidInput(format!(
            "Invalid {entity} ID: {id}. Must be a positive integer."
        )));
    }
    Ok(())
}

/// Updates must carry at least one field.
pub(crate) fn require_fields(fields: &Map<String, Value>, entity: &str) -> PipedriveResult<()> {
    if fields.is_empty() {
        return Err(PipedriveError::InvalidInput(format!(
            "At least one field must be provided for updating {entity}."
        )));
    }
    Ok(())
}

pub(crate) fn check_limit(limit: u32) -> PipedriveResult<()> {
    if limit == 0 || limit > MAX_PAGE_LIMIT {
        return Err(PipedriveError::InvalidInput(format!(
            "Invalid limit: {limit}. Must be between 1 and 500."
        )));
    }
    Ok(())
}

pub(crate) fn check_choice(field: &str, value: Option<&str>, allowed: &[&str]) -> PipedriveResult<()> {
    match value {
        Some(v) if !allowed.contains(&v) => Err(PipedriveError::InvalidInput(format!(
            "Invalid {field}: {v}. Must be one of: {}",
            allowed.join(", ")
        ))),
        _ => Ok(()),
    }
}

/// Minimum search term length: 1 for exact matching, 2 otherwise.
pub(crate) fn check_search_term(term: &str, exact_match: bool) -> PipedriveResult<()> {
    let term = term.trim();
    if term.is_empty() {
        return Err(PipedriveError::InvalidInput(
            "Search term cannot be empty".to_string(),
        ));
    }
    if !exact_match && term.chars().count() < 2 {
        return Err(PipedriveError::InvalidInput(
            "Search term must be at least 2 characters long when exact_match is false".to_string(),
        ));
    }
    Ok(())
}
