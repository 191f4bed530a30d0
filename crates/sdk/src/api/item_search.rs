//! Cross-entity search endpoints.

use super::{check_choice, check_limit, check_search_term, Page};
use crate::client::PipedriveClient;
use crate::error::{PipedriveError, PipedriveResult};
use crate::transport::{ApiVersion, QueryParams};
use pipedrive_core::conversion::DEFAULT_LIMIT;
use pipedrive_core::models::search_result::SEARCH_ITEM_TYPES;
use serde_json::Value;
use tracing::info;

pub const FIELD_ENTITY_TYPES: &[&str] = &["deal", "person", "organization", "product", "lead", "project"];
pub const FIELD_MATCH_TYPES: &[&str] = &["exact", "beginning", "middle"];

pub struct ItemSearchApi<'a> {
    client: &'a PipedriveClient,
}

#[derive(Debug, Clone, Default)]
pub struct SearchItemsParams {
    pub term: String,
    /// Subset of the searchable item types. All types when absent.
    pub item_types: Option<Vec<String>>,
    pub fields: Option<Vec<String>>,
    pub search_for_related_items: bool,
    pub exact_match: bool,
    pub include_fields: Option<Vec<String>>,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

/// Search for values of one field across an entity type.
#[derive(Debug, Clone)]
pub struct SearchFieldParams {
    pub term: String,
    pub entity_type: String,
    pub field: String,
    /// `exact`, `beginning` or `middle`.
    pub match_type: String,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

impl Default for SearchFieldParams {
    fn default() -> Self {
        Self {
            term: String::new(),
            entity_type: String::new(),
            field: String::new(),
            match_type: "exact".to_string(),
            limit: None,
            cursor: None,
        }
    }
}

impl<'a> ItemSearchApi<'a> {
    pub(crate) fn new(client: &'a PipedriveClient) -> Self {
        Self { client }
    }

    pub async fn search(&self, params: &SearchItemsParams) -> PipedriveResult<Page> {
        check_search_term(&params.term, params.exact_match)?;
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
        check_limit(limit)?;
        if let Some(item_types) = &params.item_types {
            for item_type in item_types {
                check_choice("item type", Some(item_type.as_str()), SEARCH_ITEM_TYPES)?;
            }
        }

        let query = QueryParams::new()
            .push("term", params.term.trim())
            .push("exact_match", params.exact_match)
            .push("search_for_related_items", params.search_for_related_items)
            .push("limit", limit)
            .push_opt("cursor", params.cursor.as_deref())
            .push_list("item_types", params.item_types.as_deref())
            .push_list("fields", params.fields.as_deref())
            .push_list("include_fields", params.include_fields.as_deref());

        let body = self.client.http.get("/itemSearch", &query, ApiVersion::V2).await?;
        let page = match body.get("data") {
            Some(Value::Array(_)) => Page::from_list(&body),
            _ => Page::from_search(&body),
        };
        info!(count = page.items.len(), "Item search finished");
        Ok(page)
    }

    pub async fn search_field(&self, params: &SearchFieldParams) -> PipedriveResult<Page> {
        check_choice("entity_type", Some(params.entity_type.as_str()), FIELD_ENTITY_TYPES)?;
        check_choice("match", Some(params.match_type.as_str()), FIELD_MATCH_TYPES)?;
        if params.field.trim().is_empty() {
            return Err(PipedriveError::InvalidInput(
                "Field key cannot be empty".to_string(),
            ));
        }
        check_search_term(&params.term, params.match_type == "exact")?;
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
        check_limit(limit)?;

        let query = QueryParams::new()
            .push("term", params.term.trim())
            .push("entity_type", &params.entity_type)
            .push("field", params.field.trim())
            .push("match", &params.match_type)
            .push("limit", limit)
            .push_opt("cursor", params.cursor.as_deref());

        let body = self
            .client
            .http
            .get("/itemSearch/field", &query, ApiVersion::V2)
            .await?;
        let page = Page::from_list(&body);
        info!(count = page.items.len(), field = %params.field, "Field search finished");
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::test_client;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_search_items() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/itemSearch"))
            .and(query_param("term", "acme"))
            .and(query_param("item_types", "deal,organization"))
            .and(query_param("search_for_related_items", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"items": [{"result_score": 0.9, "item": {"id": 1, "type": "deal"}}]},
                "additional_data": {"next_cursor": "c1"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let params = SearchItemsParams {
            term: "acme".into(),
            item_types: Some(vec!["deal".into(), "organization".into()]),
            ..Default::default()
        };
        let page = client.item_search().search(&params).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.next_cursor.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_search_rejects_unknown_item_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let params = SearchItemsParams {
            term: "acme".into(),
            item_types: Some(vec!["invoice".into()]),
            ..Default::default()
        };
        assert!(client.item_search().search(&params).await.is_err());
    }

    #[tokio::test]
    async fn test_search_field_defaults_to_exact() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/itemSearch/field"))
            .and(query_param("entity_type", "person"))
            .and(query_param("field", "email"))
            .and(query_param("match", "exact"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"id": 3, "name": "Ann"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let params = SearchFieldParams {
            term: "a".into(),
            entity_type: "person".into(),
            field: "email".into(),
            ..Default::default()
        };
        let page = client.item_search().search_field(&params).await.unwrap();
        assert_eq!(page.items[0]["name"], "Ann");
    }

    #[tokio::test]
    async fn test_search_field_rejects_bad_match() {
        let server = MockServer::start().await;
        let client = test_client(&server.uri());
        let params = SearchFieldParams {
            term: "ann".into(),
            entity_type: "person".into(),
            field: "name".into(),
            match_type: "fuzzy".into(),
            ..Default::default()
        };
        let err = client.item_search().search_field(&params).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid match: fuzzy. Must be one of: exact, beginning, middle"
        );
    }
}
