// Cross-entity search tools

use super::common::{ok, respond, Args, ToolOutcome};
use super::registry::{json_schema_boolean, json_schema_object, json_schema_string, Tool};
use crate::protocol::{CallToolResult, ToolSchema};
use anyhow::Result;
use pipedrive_sdk::{PipedriveClient, SearchFieldParams, SearchItemsParams};
use serde_json::{json, Value};
use std::sync::Arc;

pub const FEATURE: &str = "item_search";

pub fn tools(client: &PipedriveClient) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(SearchItemsTool::new(client.clone())),
        Arc::new(SearchItemFieldTool::new(client.clone())),
    ]
}

const SEARCH_ITEMS_DESCRIPTION: &str = r#"Searches across multiple item types in Pipedrive CRM.

One query covers deals, persons, organizations, products, files, leads and
projects. Narrow it with item_types and fields.

Format requirements:
- term: at least 2 characters, or 1 with exact_match
- item_types: comma separated subset of deal, person, organization, product, file, lead, project
- fields: comma separated field names (e.g. "name,email")
- search_for_related_items, exact_match: true or false
- limit: numeric string between 1 and 500

Example:
search_items_in_pipedrive(term="acme", item_types="deal,organization", limit="20")

Args:
    term: Text to search for
    item_types: Item types to include
    fields: Fields to search in
    search_for_related_items: Also return items related to the matches
    exact_match: Only return exact matches
    include_fields: Comma separated optional fields
    limit: Maximum number of results
    cursor: Pagination cursor from a previous call

Returns:
    JSON envelope with items and next_cursor, or an error message
"#;

pub struct SearchItemsTool {
    client: PipedriveClient,
}

impl SearchItemsTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let term = args.required_text("term")?;
        let item_types = args
            .list("item_types")
            .map(|types| types.into_iter().map(|t| t.to_lowercase()).collect::<Vec<_>>());

        let params = SearchItemsParams {
            term,
            item_types,
            fields: args.list("fields"),
            search_for_related_items: args.flag("search_for_related_items").unwrap_or(false),
            exact_match: args.flag("exact_match").unwrap_or(false),
            include_fields: args.list("include_fields"),
            limit: Some(args.limit()),
            cursor: args.text("cursor"),
        };
        ok(self.client.item_search().search(&params).await?)
    }
}

#[async_trait::async_trait]
impl Tool for SearchItemsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "search_items_in_pipedrive".to_string(),
            description: SEARCH_ITEMS_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({
                    "term": json_schema_string("Text to search for"),
                    "item_types": json_schema_string("Comma separated item types"),
                    "fields": json_schema_string("Comma separated fields to search in"),
                    "search_for_related_items": json_schema_boolean("Also return related items"),
                    "exact_match": json_schema_boolean("Only return exact matches"),
                    "include_fields": json_schema_string("Comma separated optional fields"),
                    "limit": json_schema_string("Maximum number of results (1-500)"),
                    "cursor": json_schema_string("Pagination cursor")
                }),
                vec!["term"],
            ),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("search_items_in_pipedrive", self.run(&args).await))
    }
}

const SEARCH_ITEM_FIELD_DESCRIPTION: &str = r#"Searches for values of one specific field in Pipedrive CRM.

Useful for autocompletion, e.g. finding existing values of a custom field.
Returns the distinct field values that match, not whole items.

Format requirements:
- entity_type: deal, person, organization, product, lead or project
- field: the field key (e.g. "name" or a custom field hash)
- match: exact (default), beginning or middle
- term: at least 2 characters, or 1 with match "exact"
- limit: numeric string between 1 and 500

Example:
search_item_field_in_pipedrive(term="Acme", entity_type="organization", field="name", match="beginning")

Args:
    term: Text to search for
    entity_type: Type of entity the field belongs to
    field: Key of the field to search
    match: How the term is matched
    limit: Maximum number of results
    cursor: Pagination cursor from a previous call

Returns:
    JSON envelope with the matching field values and next_cursor, or an error message
"#;

pub struct SearchItemFieldTool {
    client: PipedriveClient,
}

impl SearchItemFieldTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let term = args.required_text("term")?;
        let entity_type = args.required_text("entity_type")?.to_lowercase();
        let field = args.required_text("field")?;
        let match_type = args
            .text("match")
            .map(|m| m.to_lowercase())
            .unwrap_or_else(|| "exact".to_string());

        let params = SearchFieldParams {
            term,
            entity_type,
            field,
            match_type,
            limit: Some(args.limit()),
            cursor: args.text("cursor"),
        };
        ok(self.client.item_search().search_field(&params).await?)
    }
}

#[async_trait::async_trait]
impl Tool for SearchItemFieldTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "search_item_field_in_pipedrive".to_string(),
            description: SEARCH_ITEM_FIELD_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({
                    "term": json_schema_string("Text to search for"),
                    "entity_type": json_schema_string("deal, person, organization, product, lead or project"),
                    "field": json_schema_string("Key of the field to search"),
                    "match": json_schema_string("exact, beginning or middle"),
                    "limit": json_schema_string("Maximum number of results (1-500)"),
                    "cursor": json_schema_string("Pagination cursor")
                }),
                vec!["term", "entity_type", "field"],
            ),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("search_item_field_in_pipedrive", self.run(&args).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::lint_description;
    use crate::tools::testing::{client_for, envelope, mock_client};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_search_items_across_types() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/itemSearch"))
            .and(query_param("term", "acme"))
            .and(query_param("item_types", "deal,organization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"items": [
                    {"result_score": 1.2, "item": {"id": 1, "type": "deal", "title": "Acme deal"}},
                    {"result_score": 0.9, "item": {"id": 2, "type": "organization", "name": "Acme"}}
                ]},
                "additional_data": {"next_cursor": "n1"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = SearchItemsTool::new(mock_client(&server));
        let body = envelope(
            &tool
                .execute(json!({"term": "acme", "item_types": "Deal, organization"}))
                .await
                .unwrap(),
        );
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"]["next_cursor"], "n1");
    }

    #[tokio::test]
    async fn test_search_items_rejects_unknown_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let tool = SearchItemsTool::new(mock_client(&server));
        let body = envelope(
            &tool
                .execute(json!({"term": "acme", "item_types": "deal,invoice"}))
                .await
                .unwrap(),
        );
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid item type: invoice. Must be one of:"));
    }

    #[tokio::test]
    async fn test_search_field_defaults_to_exact() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/itemSearch/field"))
            .and(query_param("match", "exact"))
            .and(query_param("entity_type", "organization"))
            .and(query_param("field", "name"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"id": 2, "name": "Acme"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = SearchItemFieldTool::new(mock_client(&server));
        let body = envelope(
            &tool
                .execute(json!({"term": "A", "entity_type": "Organization", "field": "name"}))
                .await
                .unwrap(),
        );
        assert_eq!(body["data"]["items"][0]["name"], "Acme");
    }

    #[tokio::test]
    async fn test_search_field_bad_match() {
        let server = MockServer::start().await;
        let tool = SearchItemFieldTool::new(mock_client(&server));
        let body = envelope(
            &tool
                .execute(json!({"term": "Acme", "entity_type": "deal", "field": "title", "match": "fuzzy"}))
                .await
                .unwrap(),
        );
        assert_eq!(body["error"], "Invalid match: fuzzy. Must be one of: exact, beginning, middle");
    }

    #[test]
    fn test_descriptions_pass_lint() {
        for tool in tools(&client_for("http://localhost:1")) {
            let schema = tool.schema();
            assert!(lint_description(&schema).is_empty(), "{}", schema.name);
        }
    }
}
