// Organization tools, including followers

use super::common::{check_choice, ok, respond, Args, Fields, ToolError, ToolOutcome};
use super::registry::{
    json_schema_boolean, json_schema_object, json_schema_string, json_schema_string_or_object,
    Tool,
};
use crate::protocol::{CallToolResult, ToolSchema};
use anyhow::Result;
use pipedrive_core::models::organization::ORGANIZATION_VISIBILITY;
use pipedrive_core::models::{ApiRecord, Organization};
use pipedrive_sdk::api::{SORT_DIRECTIONS, SORT_FIELDS};
use pipedrive_sdk::{
    GetOrganizationParams, ListOrganizationsParams, PipedriveClient, SearchOrganizationsParams,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub const FEATURE: &str = "organizations";

pub fn tools(client: &PipedriveClient) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(CreateOrganizationTool::new(client.clone())),
        Arc::new(GetOrganizationTool::new(client.clone())),
        Arc::new(ListOrganizationsTool::new(client.clone())),
        Arc::new(UpdateOrganizationTool::new(client.clone())),
        Arc::new(DeleteOrganizationTool::new(client.clone())),
        Arc::new(SearchOrganizationsTool::new(client.clone())),
        Arc::new(AddOrganizationFollowerTool::new(client.clone())),
        Arc::new(DeleteOrganizationFollowerTool::new(client.clone())),
    ]
}

fn organization_properties() -> Value {
    json!({
        "name": json_schema_string("Name of the organization"),
        "owner_id": json_schema_string("Numeric ID of the owning user"),
        "address": json_schema_string_or_object("Address string or {\"value\": ...} object"),
        "visible_to": json_schema_string("Visibility: 1, 2, 3 or 4"),
        "label_ids": json_schema_string("Comma separated numeric label IDs"),
        "industry": json_schema_string("Industry of the organization"),
        "custom_fields": {
            "type": ["object", "string"],
            "description": "Custom field values keyed by field hash"
        }
    })
}

/// Optional organization fields shared by create and update.
struct OrganizationInput {
    owner_id: Option<i64>,
    address: Option<Value>,
    visible_to: Option<i64>,
    label_ids: Option<Vec<i64>>,
    custom_fields: Option<serde_json::Map<String, Value>>,
}

impl OrganizationInput {
    fn parse(args: &Args) -> Result<Self, ToolError> {
        let visible_to = args.integer("visible_to")?;
        check_choice("visible_to", visible_to, ORGANIZATION_VISIBILITY)?;

        let address = match args.value("address") {
            None => None,
            Some(raw) => Some(Organization::format_address(Some(raw)).ok_or_else(|| {
                ToolError::input(
                    "Invalid address. Use a string or an object with a non-empty 'value'. Example: {\"value\": \"123 Main St, City, Country\"}",
                )
            })?),
        };

        Ok(Self {
            owner_id: args.id("owner_id")?,
            address,
            visible_to,
            label_ids: args.id_list("label_ids")?,
            custom_fields: args.object("custom_fields")?,
        })
    }
}

const CREATE_ORGANIZATION_DESCRIPTION: &str = r#"Creates a new organization in Pipedrive CRM.

Organizations are the companies that persons and deals belong to. Only the name
is required.

Format requirements:
- owner_id: numeric string (e.g. "123")
- address: a string (e.g. "123 Main St, City") or {"value": "123 Main St, City"}
- visible_to: 1 (owner), 2 (owner's group), 3 (company), 4 (specified users)
- label_ids: comma separated numeric IDs (e.g. "1,2")
- custom_fields: JSON object keyed by field hash

Example:
create_organization_in_pipedrive(name="Acme Corp", address="1 Main St, Springfield", visible_to="3")

Args:
    name: Name of the organization
    owner_id: User who owns the organization
    address: Address of the organization
    visible_to: Visibility of the organization
    label_ids: Labels attached to the organization
    industry: Industry of the organization
    custom_fields: Custom field values

Returns:
    JSON envelope with the created organization or an error message
"#;

pub struct CreateOrganizationTool {
    client: PipedriveClient,
}

impl CreateOrganizationTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let name = args.required_text("name")?;
        let input = OrganizationInput::parse(args)?;

        let organization = Organization {
            owner_id: input.owner_id,
            address: input.address,
            visible_to: input.visible_to,
            label_ids: input.label_ids.unwrap_or_default(),
            industry: args.text("industry"),
            custom_fields: input.custom_fields,
            ..Organization::new(name)
        }
        .validate()?;

        ok(self.client.organizations().create(&organization).await?)
    }
}

#[async_trait::async_trait]
impl Tool for CreateOrganizationTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_organization_in_pipedrive".to_string(),
            description: CREATE_ORGANIZATION_DESCRIPTION.to_string(),
            input_schema: json_schema_object(organization_properties(), vec!["name"]),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("create_organization_in_pipedrive", self.run(&args).await))
    }
}

const GET_ORGANIZATION_DESCRIPTION: &str = r#"Gets the details of a specific organization from Pipedrive CRM.

Looks up one organization by its numeric ID.

Format requirements:
- id: numeric string (e.g. "123")
- include_fields: comma separated list (e.g. "people_count,open_deals_count")
- custom_fields: comma separated custom field keys

Example:
get_organization_from_pipedrive(id="123", include_fields="people_count")

Args:
    id: Numeric ID of the organization
    include_fields: Optional fields to include
    custom_fields: Custom field keys to include

Returns:
    JSON envelope with the organization or an error message
"#;

pub struct GetOrganizationTool {
    client: PipedriveClient,
}

impl GetOrganizationTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let id = args.required_id("id")?;
        let params = GetOrganizationParams {
            include_fields: args.list("include_fields"),
            custom_fields: args.list("custom_fields"),
        };
        ok(self.client.organizations().get(id, &params).await?)
    }
}

#[async_trait::async_trait]
impl Tool for GetOrganizationTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_organization_from_pipedrive".to_string(),
            description: GET_ORGANIZATION_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({
                    "id": json_schema_string("Numeric ID of the organization"),
                    "include_fields": json_schema_string("Comma separated optional fields"),
                    "custom_fields": json_schema_string("Comma separated custom field keys")
                }),
                vec!["id"],
            ),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("get_organization_from_pipedrive", self.run(&args).await))
    }
}

const LIST_ORGANIZATIONS_DESCRIPTION: &str = r#"Lists organizations from Pipedrive CRM with filtering and pagination.

Pass the returned next_cursor back as cursor to fetch the following page.

Format requirements:
- limit: numeric string between 1 and 500 (default "100")
- filter_id, owner_id: numeric strings
- sort_by: id, update_time or add_time
- sort_direction: asc or desc
- updated_since, updated_until: RFC 3339 timestamps

Example:
list_organizations_from_pipedrive(owner_id="7", sort_by="add_time", sort_direction="desc")

Args:
    limit: Maximum number of organizations to return
    cursor: Pagination cursor from a previous call
    filter_id: Saved filter to apply
    owner_id: Only organizations owned by this user
    sort_by: Field to sort by
    sort_direction: Sort direction
    include_fields: Comma separated optional fields
    custom_fields: Comma separated custom field keys
    updated_since: Only organizations updated at or after this time
    updated_until: Only organizations updated before this time

Returns:
    JSON envelope with items and next_cursor, or an error message
"#;

pub struct ListOrganizationsTool {
    client: PipedriveClient,
}

impl ListOrganizationsTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let sort_by = args.text("sort_by");
        let sort_direction = args.text("sort_direction").map(|d| d.to_lowercase());
        check_choice("sort_by", sort_by.as_deref(), SORT_FIELDS)?;
        check_choice("sort_direction", sort_direction.as_deref(), SORT_DIRECTIONS)?;

        let params = ListOrganizationsParams {
            limit: Some(args.limit()),
            cursor: args.text("cursor"),
            filter_id: args.id("filter_id")?,
            owner_id: args.id("owner_id")?,
            sort_by,
            sort_direction,
            include_fields: args.list("include_fields"),
            custom_fields: args.list("custom_fields"),
            updated_since: args.text("updated_since"),
            updated_until: args.text("updated_until"),
        };
        ok(self.client.organizations().list(&params).await?)
    }
}

#[async_trait::async_trait]
impl Tool for ListOrganizationsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_organizations_from_pipedrive".to_string(),
            description: LIST_ORGANIZATIONS_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({
                    "limit": json_schema_string("Maximum number of organizations to return (1-500)"),
                    "cursor": json_schema_string("Pagination cursor"),
                    "filter_id": json_schema_string("Saved filter ID"),
                    "owner_id": json_schema_string("Owner user ID"),
                    "sort_by": json_schema_string("id, update_time or add_time"),
                    "sort_direction": json_schema_string("asc or desc"),
                    "include_fields": json_schema_string("Comma separated optional fields"),
                    "custom_fields": json_schema_string("Comma separated custom field keys"),
                    "updated_since": json_schema_string("RFC 3339 lower bound on update time"),
                    "updated_until": json_schema_string("RFC 3339 upper bound on update time")
                }),
                vec![],
            ),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("list_organizations_from_pipedrive", self.run(&args).await))
    }
}

const UPDATE_ORGANIZATION_DESCRIPTION: &str = r#"Updates an existing organization in Pipedrive CRM.

Only the provided fields change. At least one field besides id is required.

Format requirements:
- id, owner_id: numeric strings
- address: a string or {"value": "..."}
- visible_to: 1, 2, 3 or 4
- label_ids: comma separated numeric IDs; replaces the current labels
- custom_fields: JSON object keyed by field hash

Example:
update_organization_in_pipedrive(id="123", name="Acme Corporation", owner_id="7")

Args:
    id: Numeric ID of the organization to update
    name: New name
    owner_id: New owner
    address: New address
    visible_to: New visibility
    label_ids: New labels
    industry: New industry
    custom_fields: Custom field values to change

Returns:
    JSON envelope with the updated organization or an error message
"#;

pub struct UpdateOrganizationTool {
    client: PipedriveClient,
}

impl UpdateOrganizationTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let id = args.required_id("id")?;
        let input = OrganizationInput::parse(args)?;

        let mut fields = Fields::new();
        fields
            .set("name", args.text("name"))
            .set("owner_id", input.owner_id)
            .set("address", input.address)
            .set("visible_to", input.visible_to)
            .set("label_ids", input.label_ids)
            .set("industry", args.text("industry"))
            .set("custom_fields", input.custom_fields.map(Value::Object));

        ok(self.client.organizations().update(id, fields.into_map()).await?)
    }
}

#[async_trait::async_trait]
impl Tool for UpdateOrganizationTool {
    fn schema(&self) -> ToolSchema {
        let mut properties = organization_properties();
        properties["id"] = json_schema_string("Numeric ID of the organization to update");
        ToolSchema {
            name: "update_organization_in_pipedrive".to_string(),
            description: UPDATE_ORGANIZATION_DESCRIPTION.to_string(),
            input_schema: json_schema_object(properties, vec!["id"]),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("update_organization_in_pipedrive", self.run(&args).await))
    }
}

const DELETE_ORGANIZATION_DESCRIPTION: &str = r#"Deletes an organization from Pipedrive CRM.

The organization is marked as deleted and removed permanently after 30 days.

Format requirements:
- id: numeric string (e.g. "123")

Example:
delete_organization_from_pipedrive(id="123")

Args:
    id: Numeric ID of the organization to delete

Returns:
    JSON envelope with the deleted organization ID or an error message
"#;

pub struct DeleteOrganizationTool {
    client: PipedriveClient,
}

impl DeleteOrganizationTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let id = args.required_id("id")?;
        ok(self.client.organizations().delete(id).await?)
    }
}

#[async_trait::async_trait]
impl Tool for DeleteOrganizationTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "delete_organization_from_pipedrive".to_string(),
            description: DELETE_ORGANIZATION_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({"id": json_schema_string("Numeric ID of the organization to delete")}),
                vec!["id"],
            ),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("delete_organization_from_pipedrive", self.run(&args).await))
    }
}

const SEARCH_ORGANIZATIONS_DESCRIPTION: &str = r#"Searches for organizations in Pipedrive CRM by name, address, notes or custom fields.

The term must be at least 2 characters, or 1 character with exact_match.

Format requirements:
- term: search text
- fields: comma separated subset of address, custom_fields, notes, name
- exact_match: true or false
- limit: numeric string between 1 and 500

Example:
search_organizations_in_pipedrive(term="Acme", fields="name", exact_match=true)

Args:
    term: Text to search for
    fields: Fields to search in
    exact_match: Only return exact matches
    limit: Maximum number of results
    cursor: Pagination cursor from a previous call

Returns:
    JSON envelope with items and next_cursor, or an error message
"#;

pub struct SearchOrganizationsTool {
    client: PipedriveClient,
}

impl SearchOrganizationsTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let params = SearchOrganizationsParams {
            term: args.required_text("term")?,
            fields: args.list("fields"),
            exact_match: args.flag("exact_match").unwrap_or(false),
            limit: Some(args.limit()),
            cursor: args.text("cursor"),
        };
        ok(self.client.organizations().search(&params).await?)
    }
}

#[async_trait::async_trait]
impl Tool for SearchOrganizationsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "search_organizations_in_pipedrive".to_string(),
            description: SEARCH_ORGANIZATIONS_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({
                    "term": json_schema_string("Text to search for"),
                    "fields": json_schema_string("Comma separated fields to search in"),
                    "exact_match": json_schema_boolean("Only return exact matches"),
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
        Ok(respond("search_organizations_in_pipedrive", self.run(&args).await))
    }
}

const ADD_FOLLOWER_DESCRIPTION: &str = r#"Adds a follower to an organization in Pipedrive CRM.

Followers are users who get notified about changes to the organization.

Format requirements:
- organization_id: numeric string (e.g. "123")
- user_id: numeric string (e.g. "456")

Example:
add_follower_to_organization_in_pipedrive(organization_id="123", user_id="456")

Args:
    organization_id: Numeric ID of the organization
    user_id: Numeric ID of the user to add as follower

Returns:
    JSON envelope with the follower or an error message
"#;

pub struct AddOrganizationFollowerTool {
    client: PipedriveClient,
}

impl AddOrganizationFollowerTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let organization_id = args.required_id("organization_id")?;
        let user_id = args.required_id("user_id")?;
        ok(self
            .client
            .organizations()
            .add_follower(organization_id, user_id)
            .await?)
    }
}

#[async_trait::async_trait]
impl Tool for AddOrganizationFollowerTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "add_follower_to_organization_in_pipedrive".to_string(),
            description: ADD_FOLLOWER_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({
                    "organization_id": json_schema_string("Numeric ID of the organization"),
                    "user_id": json_schema_string("Numeric ID of the user to add")
                }),
                vec!["organization_id", "user_id"],
            ),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("add_follower_to_organization_in_pipedrive", self.run(&args).await))
    }
}

const DELETE_FOLLOWER_DESCRIPTION: &str = r#"Deletes a follower from an organization in Pipedrive CRM.

The follower_id is the user ID of the follower.

Format requirements:
- organization_id: numeric string (e.g. "123")
- follower_id: numeric string (e.g. "456")

Example:
delete_follower_from_organization_in_pipedrive(organization_id="123", follower_id="456")

Args:
    organization_id: Numeric ID of the organization
    follower_id: User ID of the follower to remove

Returns:
    JSON envelope with the removed follower or an error message
"#;

pub struct DeleteOrganizationFollowerTool {
    client: PipedriveClient,
}

impl DeleteOrganizationFollowerTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let organization_id = args.required_id("organization_id")?;
        let follower_id = args.required_id("follower_id")?;
        ok(self
            .client
            .organizations()
            .delete_follower(organization_id, follower_id)
            .await?)
    }
}

#[async_trait::async_trait]
impl Tool for DeleteOrganizationFollowerTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "delete_follower_from_organization_in_pipedrive".to_string(),
            description: DELETE_FOLLOWER_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({
                    "organization_id": json_schema_string("Numeric ID of the organization"),
                    "follower_id": json_schema_string("User ID of the follower")
                }),
                vec!["organization_id", "follower_id"],
            ),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond(
            "delete_follower_from_organization_in_pipedrive",
            self.run(&args).await,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::lint_description;
    use crate::tools::testing::{client_for, envelope, mock_client};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_create_organization_with_custom_fields() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/organizations"))
            .and(body_json(json!({
                "name": "Acme Corp",
                "address": {"value": "1 Main St"},
                "visible_to": 3,
                "custom_fields": {"abc123": "Gold"}
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "data": {"id": 4, "name": "Acme Corp"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = CreateOrganizationTool::new(mock_client(&server));
        let body = envelope(
            &tool
                .execute(json!({
                    "name": "Acme Corp",
                    "address": "1 Main St",
                    "visible_to": "3",
                    "custom_fields": "{\"abc123\": \"Gold\"}"
                }))
                .await
                .unwrap(),
        );
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], 4);
    }

    #[tokio::test]
    async fn test_create_organization_rejects_bad_visibility() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let tool = CreateOrganizationTool::new(mock_client(&server));
        let body = envelope(
            &tool
                .execute(json!({"name": "Acme", "visible_to": "7"}))
                .await
                .unwrap(),
        );
        assert_eq!(body["error"], "Invalid visible_to: 7. Must be one of: 1, 2, 3, 4");

        let body = envelope(
            &tool
                .execute(json!({"name": "Acme", "address": {"street": "x"}}))
                .await
                .unwrap(),
        );
        assert!(body["error"].as_str().unwrap().starts_with("Invalid address"));
    }

    #[tokio::test]
    async fn test_follower_roundtrip() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/organizations/12/followers"))
            .and(body_json(json!({"user_id": 34})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "data": {"user_id": 34, "add_time": "2025-01-01T00:00:00Z"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/api/v2/organizations/12/followers/34"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"user_id": 34}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let add = AddOrganizationFollowerTool::new(client.clone());
        let body = envelope(
            &add.execute(json!({"organization_id": "12", "user_id": "34"}))
                .await
                .unwrap(),
        );
        assert_eq!(body["data"]["user_id"], 34);

        let remove = DeleteOrganizationFollowerTool::new(client);
        let body = envelope(
            &remove
                .execute(json!({"organization_id": "12", "follower_id": "34"}))
                .await
                .unwrap(),
        );
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_update_organization_sends_only_given_fields() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/api/v2/organizations/9"))
            .and(body_json(json!({"name": "Acme Corporation", "label_ids": [1, 2]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"id": 9, "name": "Acme Corporation"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = UpdateOrganizationTool::new(mock_client(&server));
        let body = envelope(
            &tool
                .execute(json!({"id": "9", "name": "Acme Corporation", "label_ids": "1, 2"}))
                .await
                .unwrap(),
        );
        assert_eq!(body["data"]["name"], "Acme Corporation");
    }

    #[test]
    fn test_descriptions_pass_lint() {
        for tool in tools(&client_for("http://localhost:1")) {
            let schema = tool.schema();
            assert!(lint_description(&schema).is_empty(), "{}", schema.name);
        }
    }
}
