//! Persons API endpoints.

use super::{check_choice, check_limit, check_search_term, data_of, positive_id, require_fields, Page};
use super::{SORT_DIRECTIONS, SORT_FIELDS};
use crate::client::PipedriveClient;
use crate::error::{PipedriveError, PipedriveResult};
use crate::transport::{ApiVersion, QueryParams};
use pipedrive_core::conversion::DEFAULT_LIMIT;
use pipedrive_core::models::{ApiRecord, Person};
use serde_json::{Map, Value};
use tracing::info;

pub const PERSON_SEARCH_FIELDS: &[&str] = &["name", "email", "phone", "notes", "custom_fields"];

pub struct PersonsApi<'a> {
    client: &'a PipedriveClient,
}

#[derive(Debug, Clone, Default)]
pub struct GetPersonParams {
    pub include_fields: Option<Vec<String>>,
    pub custom_fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct ListPersonsParams {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
    pub filter_id: Option<i64>,
    pub owner_id: Option<i64>,
    pub org_id: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
    pub include_fields: Option<Vec<String>>,
    pub custom_fields: Option<Vec<String>>,
    pub updated_since: Option<String>,
    pub updated_until: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchPersonsParams {
    pub term: String,
    /// Subset of [`PERSON_SEARCH_FIELDS`].
    pub fields: Option<Vec<String>>,
    pub exact_match: bool,
    pub organization_id: Option<i64>,
    pub include_fields: Option<Vec<String>>,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

impl<'a> PersonsApi<'a> {
    pub(crate) fn new(client: &'a PipedriveClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, person: &Person) -> PipedriveResult<Value> {
        info!(name = %person.name, "Creating person");
        let body = self
            .client
            .http
            .post("/persons", &person.to_api_value(), ApiVersion::V2)
            .await?;
        Ok(data_of(body))
    }

    pub async fn get(&self, id: i64, params: &GetPersonParams) -> PipedriveResult<Value> {
        positive_id(id, "person")?;
        let query = QueryParams::new()
            .push_list("include_fields", params.include_fields.as_deref())
            .push_list("custom_fields", params.custom_fields.as_deref());
        let body = self
            .client
            .http
            .get(&format!("/persons/{id}"), &query, ApiVersion::V2)
            .await?;
        Ok(data_of(body))
    }

    pub async fn update(&self, id: i64, fields: Map<String, Value>) -> PipedriveResult<Value> {
        positive_id(id, "person")?;
        require_fields(&fields, "a person")?;
        let body = self
            .client
            .http
            .patch(&format!("/persons/{id}"), &Value::Object(fields), ApiVersion::V2)
            .await?;
        Ok(data_of(body))
    }

    pub async fn delete(&self, id: i64) -> PipedriveResult<Value> {
        positive_id(id, "person")?;
        let body = self
            .client
            .http
            .delete(&format!("/persons/{id}"), ApiVersion::V2)
            .await?;
        Ok(data_of(body))
    }

    pub async fn list(&self, params: &ListPersonsParams) -> PipedriveResult<Page> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
        check_limit(limit)?;
        check_choice("sort_by", params.sort_by.as_deref(), SORT_FIELDS)?;
        check_choice("sort_direction", params.sort_direction.as_deref(), SORT_DIRECTIONS)?;

        let query = QueryParams::new()
            .push("limit", limit)
            .push_opt("cursor", params.cursor.as_deref())
            .push_opt("filter_id", params.filter_id)
            .push_opt("owner_id", params.owner_id)
            .push_opt("org_id", params.org_id)
            .push_opt("sort_by", params.sort_by.as_deref())
            .push_opt("sort_direction", params.sort_direction.as_deref())
            .push_list("include_fields", params.include_fields.as_deref())
            .push_list("custom_fields", params.custom_fields.as_deref())
            .push_opt("updated_since", params.updated_since.as_deref())
            .push_opt("updated_until", params.updated_until.as_deref());

        let body = self.client.http.get("/persons", &query, ApiVersion::V2).await?;
        let page = Page::from_list(&body);
        info!(count = page.items.len(), "Listed persons");
        Ok(page)
    }

    /// Search persons by name, email, phone, notes or custom fields.
    pub async fn search(&self, params: &SearchPersonsParams) -> PipedriveResult<Page> {
        check_search_term(&params.term, params.exact_match)?;
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
        check_limit(limit)?;
        if let Some(fields) = &params.fields {
            if let Some(bad) = fields
                .iter()
                .find(|f| !PERSON_SEARCH_FIELDS.contains(&f.as_str()))
            {
                return Err(PipedriveError::InvalidInput(format!(
                    "Invalid search field: {bad}. Must be one of: {}",
                    PERSON_SEARCH_FIELDS.join(", ")
                )));
            }
        }

        let query = QueryParams::new()
            .push("term", params.term.trim())
            .push("exact_match", params.exact_match)
            .push("limit", limit)
            .push_opt("cursor", params.cursor.as_deref())
            .push_opt("organization_id", params.organization_id)
            .push_list("fields", params.fields.as_deref())
            .push_list("include_fields", params.include_fields.as_deref());

        let body = self.client.http.get("/persons/search", &query, ApiVersion::V2).await?;
        let page = Page::from_search(&body);
        info!(count = page.items.len(), "Found persons");
        Ok(page)
    }
}
