//! Organizations API endpoints.

use super::{check_choice, check_limit, check_search_term, data_of, positive_id, require_fields, Page};
use super::{SORT_DIRECTIONS, SORT_FIELDS};
use crate::client::PipedriveClient;
use crate::error::PipedriveResult;
use crate::transport::{ApiVersion, QueryParams};
use pipedrive_core::conversion::DEFAULT_LIMIT;
use pipedrive_core::models::{ApiRecord, Organization};
use serde_json::{json, Map, Value};
use tracing::info;

/// Organizations API, including followers.
pub struct OrganizationsApi<'a> {
    client: &'a PipedriveClient,
}

#[derive(Debug, Clone, Default)]
pub struct GetOrganizationParams {
    pub include_fields: Option<Vec<String>>,
    pub custom_fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct ListOrganizationsParams {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
    pub filter_id: Option<i64>,
    pub owner_id: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
    pub include_fields: Option<Vec<String>>,
    pub custom_fields: Option<Vec<String>>,
    pub updated_since: Option<String>,
    pub updated_until: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchOrganizationsParams {
    pub term: String,
    pub fields: Option<Vec<String>>,
    pub exact_match: bool,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

impl<'a> OrganizationsApi<'a> {
    pub(crate) fn new(client: &'a PipedriveClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, organization: &Organization) -> PipedriveResult<Value> {
        info!(name = %organization.name, "Creating organization");
        let body = self
            .client
            .http
            .post("/organizations", &organization.to_api_value(), ApiVersion::V2)
            .await?;
        Ok(data_of(body))
    }

    pub async fn get(&self, id: i64, params: &GetOrganizationParams) -> PipedriveResult<Value> {
        positive_id(id, "organization")?;
        let query = QueryParams::new()
            .push_list("include_fields", params.include_fields.as_deref())
            .push_list("custom_fields", params.custom_fields.as_deref());
        let body = self
            .client
            .http
            .get(&format!("/organizations/{id}"), &query, ApiVersion::V2)
            .await?;
        Ok(data_of(body))
    }

    pub async fn update(&self, id: i64, fields: Map<String, Value>) -> PipedriveResult<Value> {
        positive_id(id, "organization")?;
        require_fields(&fields, "an organization")?;
        let body = self
            .client
            .http
            .patch(&format!("/organizations/{id}"), &Value::Object(fields), ApiVersion::V2)
            .await?;
        Ok(data_of(body))
    }

    pub async fn delete(&self, id: i64) -> PipedriveResult<Value> {
        positive_id(id, "organization")?;
        let body = self
            .client
            .http
            .delete(&format!("/organizations/{id}"), ApiVersion::V2)
            .await?;
        Ok(data_of(body))
    }

    pub async fn list(&self, params: &ListOrganizationsParams) -> PipedriveResult<Page> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
        check_limit(limit)?;
        check_choice("sort_by", params.sort_by.as_deref(), SORT_FIELDS)?;
        check_choice("sort_direction", params.sort_direction.as_deref(), SORT_DIRECTIONS)?;

        let query = QueryParams::new()
            .push("limit", limit)
            .push_opt("cursor", params.cursor.as_deref())
            .push_opt("filter_id", params.filter_id)
            .push_opt("owner_id", params.owner_id)
            .push_opt("sort_by", params.sort_by.as_deref())
            .push_opt("sort_direction", params.sort_direction.as_deref())
            .push_list("include_fields", params.include_fields.as_deref())
            .push_list("custom_fields", params.custom_fields.as_deref())
            .push_opt("updated_since", params.updated_since.as_deref())
            .push_opt("updated_until", params.updated_until.as_deref());

        let body = self.client.http.get("/organizations", &query, ApiVersion::V2).await?;
        let page = Page::from_list(&body);
        info!(count = page.items.len(), "Listed organizations");
        Ok(page)
    }

    pub async fn search(&self, params: &SearchOrganizationsParams) -> PipedriveResult<Page> {
        check_search_term(&params.term, params.exact_match)?;
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
        check_limit(limit)?;

        let query = QueryParams::new()
            .push("term", params.term.trim())
            .push("exact_match", params.exact_match)
            .push("limit", limit)
            .push_opt("cursor", params.cursor.as_deref())
            .push_list("fields", params.fields.as_deref());

        let body = self
            .client
            .http
            .get("/organizations/search", &query, ApiVersion::V2)
            .await?;
        let page = Page::from_search(&body);
        info!(count = page.items.len(), "Found organizations");
        Ok(page)
    }

    pub async fn add_follower(&self, organization_id: i64, user_id: i64) -> PipedriveResult<Value> {
        positive_id(organization_id, "organization")?;
        positive_id(user_id, "user")?;
        let body = self
            .client
            .http
            .post(
                &format!("/organizations/{organization_id}/followers"),
                &json!({ "user_id": user_id }),
                ApiVersion::V2,
            )
            .await?;
        Ok(data_of(body))
    }

    /// Remove a follower. `follower_id` is the user id of the follower.
    pub async fn delete_follower(
        &self,
        organization_id: i64,
        follower_id: i64,
    ) -> PipedriveResult<Value> {
        positive_id(organization_id, "organization")?;
        positive_id(follower_id, "follower")?;
        let body = self
            .client
            .http
            .delete(
                &format!("/organizations/{organization_id}/followers/{follower_id}"),
                ApiVersion::V2,
            )
            .await?;
        Ok(data_of(body))
    }
}
