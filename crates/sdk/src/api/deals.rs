//! Deals API endpoints.

use super::{check_choice, check_limit, check_search_term, data_of, positive_id, require_fields, Page};
use super::{SORT_DIRECTIONS, SORT_FIELDS};
use crate::client::PipedriveClient;
use crate::error::PipedriveResult;
use crate::transport::{ApiVersion, QueryParams};
use pipedrive_core::conversion::DEFAULT_LIMIT;
use pipedrive_core::models::deal::DEAL_STATUSES;
use pipedrive_core::models::{ApiRecord, Deal};
use serde_json::{Map, Value};
use tracing::info;

/// Deals API, including the products attached to a deal.
pub struct DealsApi<'a> {
    client: &'a PipedriveClient,
}

#[derive(Debug, Clone, Default)]
pub struct GetDealParams {
    pub include_fields: Option<Vec<String>>,
    /// Custom field keys to include.
    pub custom_fields: Option<Vec<String>>,
}

/// Filters for listing deals.
#[derive(Debug, Clone, Default)]
pub struct ListDealsParams {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
    pub filter_id: Option<i64>,
    pub owner_id: Option<i64>,
    pub person_id: Option<i64>,
    pub org_id: Option<i64>,
    pub pipeline_id: Option<i64>,
    pub stage_id: Option<i64>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
    pub include_fields: Option<Vec<String>>,
    pub custom_fields: Option<Vec<String>>,
    pub updated_since: Option<String>,
    pub updated_until: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchDealsParams {
    pub term: String,
    pub fields: Option<Vec<String>>,
    pub exact_match: bool,
    pub person_id: Option<i64>,
    pub organization_id: Option<i64>,
    pub status: Option<String>,
    pub include_fields: Option<Vec<String>>,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

impl<'a> DealsApi<'a> {
    pub(crate) fn new(client: &'a PipedriveClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, deal: &Deal) -> PipedriveResult<Value> {
        info!(title = %deal.title, "Creating deal");
        let body = self
            .client
            .http
            .post("/deals", &deal.to_api_value(), ApiVersion::V2)
            .await?;
        Ok(data_of(body))
    }

    pub async fn get(&self, id: i64, params: &GetDealParams) -> PipedriveResult<Value> {
        positive_id(id, "deal")?;
        let query = QueryParams::new()
            .push_list("include_fields", params.include_fields.as_deref())
            .push_list("custom_fields", params.custom_fields.as_deref());
        let body = self
            .client
            .http
            .get(&format!("/deals/{id}"), &query, ApiVersion::V2)
            .await?;
        Ok(data_of(body))
    }

    pub async fn list(&self, params: &ListDealsParams) -> PipedriveResult<Page> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
        check_limit(limit)?;
        check_choice("status", params.status.as_deref(), DEAL_STATUSES)?;
        check_choice("sort_by", params.sort_by.as_deref(), SORT_FIELDS)?;
        check_choice("sort_direction", params.sort_direction.as_deref(), SORT_DIRECTIONS)?;

        let query = QueryParams::new()
            .push("limit", limit)
            .push_opt("cursor", params.cursor.as_deref())
            .push_opt("filter_id", params.filter_id)
            .push_opt("owner_id", params.owner_id)
            .push_opt("person_id", params.person_id)
            .push_opt("org_id", params.org_id)
            .push_opt("pipeline_id", params.pipeline_id)
            .push_opt("stage_id", params.stage_id)
            .push_opt("status", params.status.as_deref())
            .push_opt("sort_by", params.sort_by.as_deref())
            .push_opt("sort_direction", params.sort_direction.as_deref())
            .push_list("include_fields", params.include_fields.as_deref())
            .push_list("custom_fields", params.custom_fields.as_deref())
            .push_opt("updated_since", params.updated_since.as_deref())
            .push_opt("updated_until", params.updated_until.as_deref());

        let body = self.client.http.get("/deals", &query, ApiVersion::V2).await?;
        let page = Page::from_list(&body);
        info!(count = page.items.len(), "Listed deals");
        Ok(page)
    }

    pub async fn update(&self, id: i64, fields: Map<String, Value>) -> PipedriveResult<Value> {
        positive_id(id, "deal")?;
        require_fields(&fields, "a deal")?;
        let body = self
            .client
            .http
            .patch(&format!("/deals/{id}"), &Value::Object(fields), ApiVersion::V2)
            .await?;
        Ok(data_of(body))
    }

    pub async fn delete(&self, id: i64) -> PipedriveResult<Value> {
        positive_id(id, "deal")?;
        let body = self
            .client
            .http
            .delete(&format!("/deals/{id}"), ApiVersion::V2)
            .await?;
        Ok(data_of(body))
    }

    /// Full-text search over titles, notes and custom fields.
    pub async fn search(&self, params: &SearchDealsParams) -> PipedriveResult<Page> {
        check_search_term(&params.term, params.exact_match)?;
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
        check_limit(limit)?;
        check_choice("status", params.status.as_deref(), DEAL_STATUSES)?;

        let query = QueryParams::new()
            .push("term", params.term.trim())
            .push("exact_match", params.exact_match)
            .push("limit", limit)
            .push_opt("cursor", params.cursor.as_deref())
            .push_opt("person_id", params.person_id)
            .push_opt("organization_id", params.organization_id)
            .push_opt("status", params.status.as_deref())
            .push_list("fields", params.fields.as_deref())
            .push_list("include_fields", params.include_fields.as_deref());

        let body = self.client.http.get("/deals/search", &query, ApiVersion::V2).await?;
        let page = Page::from_search(&body);
        info!(count = page.items.len(), "Found deals");
        Ok(page)
    }

    /// Patch a product attachment on a deal.
    pub async fn update_product(
        &self,
        deal_id: i64,
        product_attachment_id: i64,
        fields: Map<String, Value>,
    ) -> PipedriveResult<Value> {
        positive_id(deal_id, "deal")?;
        positive_id(product_attachment_id, "product attachment")?;
        require_fields(&fields, "a product in a deal")?;
        let body = self
            .client
            .http
            .patch(
                &format!("/deals/{deal_id}/products/{product_attachment_id}"),
                &Value::Object(fields),
                ApiVersion::V2,
            )
            .await?;
        Ok(data_of(body))
    }

    pub async fn delete_product(
        &self,
        deal_id: i64,
        product_attachment_id: i64,
    ) -> PipedriveResult<Value> {
        positive_id(deal_id, "deal")?;
        positive_id(product_attachment_id, "product attachment")?;
        let body = self
            .client
            .http
            .delete(
                &format!("/deals/{deal_id}/products/{product_attachment_id}"),
                ApiVersion::V2,
            )
            .await?;
        Ok(data_of(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::test_client;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_create_deal() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/deals"))
            .and(body_json(json!({
                "title": "Expansion",
                "value": 5000.0,
                "currency": "EUR",
                "status": "open"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "data": {"id": 42, "title": "Expansion"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let mut deal = Deal::new("Expansion");
        deal.value = Some(5000.0);
        deal.currency = "EUR".to_string();
        let created = client.deals().create(&deal).await.unwrap();
        assert_eq!(created["id"], 42);
    }

    #[tokio::test]
    async fn test_get_with_custom_fields() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/deals/42"))
            .and(query_param("custom_fields", "abc123,def456"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"id": 42}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let params = GetDealParams {
            custom_fields: Some(vec!["abc123".into(), "def456".into()]),
            ..Default::default()
        };
        let deal = client.deals().get(42, &params).await.unwrap();
        assert_eq!(deal["id"], 42);
    }

    #[tokio::test]
    async fn test_search_reads_nested_items() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/deals/search"))
            .and(query_param("term", "license"))
            .and(query_param("exact_match", "false"))
            .and(query_param("status", "open"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"items": [{"result_score": 1.0, "item": {"id": 1}}]},
                "additional_data": {"next_cursor": null}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let params = SearchDealsParams {
            term: "license".into(),
            status: Some("open".into()),
            ..Default::default()
        };
        let page = client.deals().search(&params).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.next_cursor, None);
    }

    #[tokio::test]
    async fn test_list_rejects_unknown_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let params = ListDealsParams {
            status: Some("pending".into()),
            ..Default::default()
        };
        assert!(client.deals().list(&params).await.is_err());
    }

    #[tokio::test]
    async fn test_product_routes() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/api/v2/deals/3/products/9"))
            .and(body_json(json!({"quantity": 2})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"id": 9, "quantity": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/v2/deals/3/products/9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"id": 9}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let mut fields = Map::new();
        fields.insert("quantity".into(), json!(2));
        let updated = client.deals().update_product(3, 9, fields).await.unwrap();
        assert_eq!(updated["quantity"], 2);
        let deleted = client.deals().delete_product(3, 9).await.unwrap();
        assert_eq!(deleted["id"], 9);
    }
}
