// Lead tools, plus lead labels and sources

use super::common::{check_choice, currency_code, ok, respond, Args, Fields, ToolError, ToolOutcome};
use super::registry::{json_schema_boolean, json_schema_object, json_schema_string, Tool};
use crate::protocol::{CallToolResult, ToolSchema};
use anyhow::Result;
use pipedrive_core::conversion::validate_uuid_string;
use pipedrive_core::models::lead::LEAD_VISIBILITY;
use pipedrive_core::models::{ApiRecord, Lead};
use pipedrive_sdk::api::leads::ARCHIVED_STATUSES;
use pipedrive_sdk::{ListLeadsParams, PipedriveClient, SearchLeadsParams, UpdateLeadParams};
use serde_json::{json, Value};
use std::sync::Arc;

pub const FEATURE: &str = "leads";

pub fn tools(client: &PipedriveClient) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(CreateLeadTool::new(client.clone())),
        Arc::new(GetLeadTool::new(client.clone())),
        Arc::new(ListLeadsTool::new(client.clone())),
        Arc::new(UpdateLeadTool::new(client.clone())),
        Arc::new(DeleteLeadTool::new(client.clone())),
        Arc::new(SearchLeadsTool::new(client.clone())),
        Arc::new(GetLeadLabelsTool::new(client.clone())),
        Arc::new(GetLeadSourcesTool::new(client.clone())),
    ]
}

fn lead_properties() -> Value {
    json!({
        "title": json_schema_string("Title of the lead"),
        "value": json_schema_string("Potential value of the lead, e.g. '5000'"),
        "currency": json_schema_string("3-letter currency code, e.g. 'USD'"),
        "person_id": json_schema_string("Numeric ID of the linked person"),
        "organization_id": json_schema_string("Numeric ID of the linked organization"),
        "owner_id": json_schema_string("Numeric ID of the owning user"),
        "label_ids": json_schema_string("Comma separated lead label UUIDs"),
        "expected_close_date": json_schema_string("Expected close date in YYYY-MM-DD format"),
        "visible_to": json_schema_string("Visibility: 1, 3, 5 or 7")
    })
}

/// The lead id argument, checked as a UUID.
fn lead_id(args: &Args) -> Result<String, ToolError> {
    let raw = args.required_text("id")?;
    validate_uuid_string(Some(raw.as_str()), "lead_id")?
        .ok_or_else(|| ToolError::input("The 'id' field is required and cannot be empty."))
}

/// Optional lead fields shared by create and update.
struct LeadInput {
    amount: Option<f64>,
    currency: Option<String>,
    person_id: Option<i64>,
    organization_id: Option<i64>,
    owner_id: Option<i64>,
    label_ids: Option<Vec<String>>,
    expected_close_date: Option<String>,
    visible_to: Option<i64>,
}

impl LeadInput {
    fn parse(args: &Args) -> Result<Self, ToolError> {
        let amount = args.number("value")?;
        if matches!(amount, Some(a) if a < 0.0) {
            return Err(ToolError::input("Lead value must be non-negative."));
        }

        let visible_to = args.integer("visible_to")?;
        check_choice("visible_to", visible_to, LEAD_VISIBILITY)?;

        let label_ids = match args.list("label_ids") {
            Some(labels) => Some(
                labels
                    .iter()
                    .map(|label| {
                        validate_uuid_string(Some(label.as_str()), "label_ids")?
                            .ok_or_else(|| ToolError::input("label_ids contains an empty id"))
                    })
                    .collect::<Result<Vec<_>, ToolError>>()?,
            ),
            None => None,
        };

        Ok(Self {
            amount,
            currency: currency_code(args.text("currency"))?,
            person_id: args.id("person_id")?,
            organization_id: args.id("organization_id")?,
            owner_id: args.id("owner_id")?,
            label_ids,
            expected_close_date: args.date("expected_close_date")?,
            visible_to,
        })
    }
}

const CREATE_LEAD_DESCRIPTION: &str = r#"Creates a new lead in Pipedrive CRM.

A lead is a potential deal that has not been qualified yet. It must be linked
to a person, an organization, or both.

Format requirements:
- person_id, organization_id, owner_id: numeric strings (e.g. "123")
- value: decimal number as a string (e.g. "5000")
- currency: 3-letter ISO code, default "USD"
- label_ids: comma separated UUIDs (e.g. "f08b42a0-4e75-11ea-9643-03698ef1cfd6")
- expected_close_date: YYYY-MM-DD
- visible_to: 1 (owner), 3 (owner's group), 5 (group and sub-groups), 7 (company)

Example:
create_lead_in_pipedrive(title="Website inquiry", person_id="123", value="5000", currency="EUR")

Args:
    title: Title of the lead
    value: Potential value of the lead
    currency: Currency of the value
    person_id: Person linked to the lead
    organization_id: Organization linked to the lead
    owner_id: User who owns the lead
    label_ids: Labels attached to the lead
    expected_close_date: Expected close date
    visible_to: Visibility of the lead

Returns:
    JSON envelope with the created lead or an error message
"#;

pub struct CreateLeadTool {
    client: PipedriveClient,
}

impl CreateLeadTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let title = args.required_text("title")?;
        let input = LeadInput::parse(args)?;
        if input.person_id.is_none() && input.organization_id.is_none() {
            return Err(ToolError::input(
                "Either person_id or organization_id must be provided",
            ));
        }

        let mut lead = Lead {
            amount: input.amount,
            person_id: input.person_id,
            organization_id: input.organization_id,
            owner_id: input.owner_id,
            label_ids: input.label_ids,
            expected_close_date: input.expected_close_date,
            visible_to: input.visible_to,
            ..Lead::new(title)
        };
        if let Some(currency) = input.currency {
            lead.currency = currency;
        }

        ok(self.client.leads().create(&lead.validate()?).await?)
    }
}

#[async_trait::async_trait]
impl Tool for CreateLeadTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_lead_in_pipedrive".to_string(),
            description: CREATE_LEAD_DESCRIPTION.to_string(),
            input_schema: json_schema_object(lead_properties(), vec!["title"]),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("create_lead_in_pipedrive", self.run(&args).await))
    }
}

const GET_LEAD_DESCRIPTION: &str = r#"Gets the details of a specific lead from Pipedrive CRM.

Leads are identified by UUID rather than by number.

Format requirements:
- id: UUID string (e.g. "adf21080-0e10-11eb-879b-05d71fb426ec")

Example:
get_lead_from_pipedrive(id="adf21080-0e10-11eb-879b-05d71fb426ec")

Args:
    id: UUID of the lead

Returns:
    JSON envelope with the lead or an error message
"#;

pub struct GetLeadTool {
    client: PipedriveClient,
}

impl GetLeadTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let id = lead_id(args)?;
        ok(self.client.leads().get(&id).await?)
    }
}

#[async_trait::async_trait]
impl Tool for GetLeadTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_lead_from_pipedrive".to_string(),
            description: GET_LEAD_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({"id": json_schema_string("UUID of the lead")}),
                vec!["id"],
            ),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("get_lead_from_pipedrive", self.run(&args).await))
    }
}

const LIST_LEADS_DESCRIPTION: &str = r#"Lists leads from Pipedrive CRM with filtering and pagination.

Leads use offset pagination: pass the returned next_start back as start.

Format requirements:
- limit: numeric string between 1 and 500 (default "100")
- start: non-negative numeric string
- archived_status: archived, not_archived or all
- owner_id, person_id, organization_id, filter_id: numeric strings
- sort: field and direction (e.g. "add_time DESC")

Example:
list_leads_from_pipedrive(limit="50", archived_status="not_archived", sort="add_time DESC")

Args:
    limit: Maximum number of leads to return
    start: Offset of the first lead
    archived_status: Which leads to include by archive state
    owner_id: Only leads owned by this user
    person_id: Only leads linked to this person
    organization_id: Only leads linked to this organization
    filter_id: Saved filter to apply
    sort: Sort field and direction

Returns:
    JSON envelope with items, total_count and next_start, or an error message
"#;

pub struct ListLeadsTool {
    client: PipedriveClient,
}

impl ListLeadsTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let archived_status = args.text("archived_status").map(|s| s.to_lowercase());
        check_choice("archived_status", archived_status.as_deref(), ARCHIVED_STATUSES)?;

        let start = args.integer("start")?;
        if matches!(start, Some(s) if s < 0) {
            return Err(ToolError::input("start must be a non-negative integer. Example: '0'"));
        }

        let params = ListLeadsParams {
            limit: Some(args.limit()),
            start: start.map(|s| s as u64),
            archived_status,
            owner_id: args.id("owner_id")?,
            person_id: args.id("person_id")?,
            organization_id: args.id("organization_id")?,
            filter_id: args.id("filter_id")?,
            sort: args.text("sort"),
        };
        ok(self.client.leads().list(&params).await?)
    }
}

#[async_trait::async_trait]
impl Tool for ListLeadsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_leads_from_pipedrive".to_string(),
            description: LIST_LEADS_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({
                    "limit": json_schema_string("Maximum number of leads to return (1-500)"),
                    "start": json_schema_string("Offset of the first lead"),
                    "archived_status": json_schema_string("archived, not_archived or all"),
                    "owner_id": json_schema_string("Owner user ID"),
                    "person_id": json_schema_string("Linked person ID"),
                    "organization_id": json_schema_string("Linked organization ID"),
                    "filter_id": json_schema_string("Saved filter ID"),
                    "sort": json_schema_string("Sort field and direction, e.g. 'add_time DESC'")
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
        Ok(respond("list_leads_from_pipedrive", self.run(&args).await))
    }
}

const UPDATE_LEAD_DESCRIPTION: &str = r#"Updates an existing lead in Pipedrive CRM.

Only the provided fields change. Changing only the currency keeps the current
amount of the lead.

Format requirements:
- id: UUID string
- value: decimal number as a string
- currency: 3-letter ISO code
- person_id, organization_id, owner_id: numeric strings
- label_ids: comma separated UUIDs; replaces the current labels
- expected_close_date: YYYY-MM-DD
- visible_to: 1, 3, 5 or 7
- is_archived, was_seen: true or false

Example:
update_lead_in_pipedrive(id="adf21080-0e10-11eb-879b-05d71fb426ec", value="7500", is_archived=false)

Args:
    id: UUID of the lead to update
    title: New title
    value: New value
    currency: New currency
    person_id: New linked person
    organization_id: New linked organization
    owner_id: New owner
    label_ids: New labels
    expected_close_date: New expected close date
    visible_to: New visibility
    is_archived: Whether the lead is archived
    was_seen: Whether the lead was seen

Returns:
    JSON envelope with the updated lead or an error message
"#;

pub struct UpdateLeadTool {
    client: PipedriveClient,
}

impl UpdateLeadTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let id = lead_id(args)?;
        let input = LeadInput::parse(args)?;

        let mut fields = Fields::new();
        fields
            .set("title", args.text("title"))
            .set("person_id", input.person_id)
            .set("organization_id", input.organization_id)
            .set("owner_id", input.owner_id)
            .set("label_ids", input.label_ids)
            .set("expected_close_date", input.expected_close_date)
            .set("visible_to", input.visible_to)
            .set("is_archived", args.flag("is_archived"))
            .set("was_seen", args.flag("was_seen"));

        let params = UpdateLeadParams {
            fields: fields.into_map(),
            amount: input.amount,
            currency: input.currency,
        };
        ok(self.client.leads().update(&id, params).await?)
    }
}

#[async_trait::async_trait]
impl Tool for UpdateLeadTool {
    fn schema(&self) -> ToolSchema {
        let mut properties = lead_properties();
        properties["id"] = json_schema_string("UUID of the lead to update");
        properties["is_archived"] = json_schema_boolean("Whether the lead is archived");
        properties["was_seen"] = json_schema_boolean("Whether the lead was seen");
        ToolSchema {
            name: "update_lead_in_pipedrive".to_string(),
            description: UPDATE_LEAD_DESCRIPTION.to_string(),
            input_schema: json_schema_object(properties, vec!["id"]),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("update_lead_in_pipedrive", self.run(&args).await))
    }
}

const DELETE_LEAD_DESCRIPTION: &str = r#"Deletes a lead from Pipedrive CRM.

The lead is removed permanently.

Format requirements:
- id: UUID string

Example:
delete_lead_from_pipedrive(id="adf21080-0e10-11eb-879b-05d71fb426ec")

Args:
    id: UUID of the lead to delete

Returns:
    JSON envelope with the deleted lead ID or an error message
"#;

pub struct DeleteLeadTool {
    client: PipedriveClient,
}

impl DeleteLeadTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let id = lead_id(args)?;
        ok(self.client.leads().delete(&id).await?)
    }
}

#[async_trait::async_trait]
impl Tool for DeleteLeadTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "delete_lead_from_pipedrive".to_string(),
            description: DELETE_LEAD_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({"id": json_schema_string("UUID of the lead to delete")}),
                vec!["id"],
            ),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("delete_lead_from_pipedrive", self.run(&args).await))
    }
}

const SEARCH_LEADS_DESCRIPTION: &str = r#"Searches for leads in Pipedrive CRM by title, notes or custom fields.

The term must be at least 2 characters, or 1 character with exact_match.

Format requirements:
- term: search text
- fields: comma separated subset of custom_fields, notes, title
- exact_match: true or false
- person_id, organization_id: numeric strings
- limit: numeric string between 1 and 500

Example:
search_leads_in_pipedrive(term="website", limit="10")

Args:
    term: Text to search for
    fields: Fields to search in
    exact_match: Only return exact matches
    person_id: Only leads linked to this person
    organization_id: Only leads linked to this organization
    include_fields: Comma separated optional fields
    limit: Maximum number of results
    cursor: Pagination cursor from a previous call

Returns:
    JSON envelope with items and next_cursor, or an error message
"#;

pub struct SearchLeadsTool {
    client: PipedriveClient,
}

impl SearchLeadsTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let params = SearchLeadsParams {
            term: args.required_text("term")?,
            fields: args.list("fields"),
            exact_match: args.flag("exact_match").unwrap_or(false),
            person_id: args.id("person_id")?,
            organization_id: args.id("organization_id")?,
            include_fields: args.list("include_fields"),
            limit: Some(args.limit()),
            cursor: args.text("cursor"),
        };
        ok(self.client.leads().search(&params).await?)
    }
}

#[async_trait::async_trait]
impl Tool for SearchLeadsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "search_leads_in_pipedrive".to_string(),
            description: SEARCH_LEADS_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({
                    "term": json_schema_string("Text to search for"),
                    "fields": json_schema_string("Comma separated fields to search in"),
                    "exact_match": json_schema_boolean("Only return exact matches"),
                    "person_id": json_schema_string("Linked person ID"),
                    "organization_id": json_schema_string("Linked organization ID"),
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
        Ok(respond("search_leads_in_pipedrive", self.run(&args).await))
    }
}

const GET_LEAD_LABELS_DESCRIPTION: &str = r#"Gets all lead labels from Pipedrive CRM.

Use the returned label ids as label_ids when creating or updating leads.

Format requirements:
- No arguments

Example:
get_lead_labels_from_pipedrive()

Args:
    (none)

Returns:
    JSON envelope with the list of lead labels or an error message
"#;

pub struct GetLeadLabelsTool {
    client: PipedriveClient,
}

impl GetLeadLabelsTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for GetLeadLabelsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_lead_labels_from_pipedrive".to_string(),
            description: GET_LEAD_LABELS_DESCRIPTION.to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, _arguments: Value) -> Result<CallToolResult> {
        let outcome = match self.client.leads().list_labels().await {
            Ok(labels) => ok(labels),
            Err(e) => Err(e.into()),
        };
        Ok(respond("get_lead_labels_from_pipedrive", outcome))
    }
}

const GET_LEAD_SOURCES_DESCRIPTION: &str = r#"Gets all lead sources from Pipedrive CRM.

Lead sources tell where a lead came from, e.g. manually created or imported.

Format requirements:
- No arguments

Example:
get_lead_sources_from_pipedrive()

Args:
    (none)

Returns:
    JSON envelope with the list of lead sources or an error message
"#;

pub struct GetLeadSourcesTool {
    client: PipedriveClient,
}

impl GetLeadSourcesTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for GetLeadSourcesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_lead_sources_from_pipedrive".to_string(),
            description: GET_LEAD_SOURCES_DESCRIPTION.to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, _arguments: Value) -> Result<CallToolResult> {
        let outcome = match self.client.leads().list_sources().await {
            Ok(sources) => ok(sources),
            Err(e) => Err(e.into()),
        };
        Ok(respond("get_lead_sources_from_pipedrive", outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::lint_description;
    use crate::tools::testing::{client_for, envelope, mock_client};
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LEAD_ID: &str = "adf21080-0e10-11eb-879b-05d71fb426ec";

    #[tokio::test]
    async fn test_create_lead_nests_value() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/leads"))
            .and(body_json(json!({
                "title": "Website inquiry",
                "person_id": 123,
                "value": {"amount": 5000.0, "currency": "EUR"}
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "data": {"id": LEAD_ID, "title": "Website inquiry"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = CreateLeadTool::new(mock_client(&server));
        let body = envelope(
            &tool
                .execute(json!({
                    "title": "Website inquiry",
                    "person_id": "123",
                    "value": "5000",
                    "currency": "EUR"
                }))
                .await
                .unwrap(),
        );
        assert_eq!(body["data"]["id"], LEAD_ID);
    }

    #[tokio::test]
    async fn test_create_lead_needs_person_or_organization() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let tool = CreateLeadTool::new(mock_client(&server));
        let body = envelope(&tool.execute(json!({"title": "Orphan"})).await.unwrap());
        assert_eq!(body["error"], "Either person_id or organization_id must be provided");

        let body = envelope(
            &tool
                .execute(json!({"title": "Bad", "person_id": "1", "label_ids": "not-a-uuid"}))
                .await
                .unwrap(),
        );
        assert!(body["error"].as_str().unwrap().contains("label_ids"));
    }

    #[tokio::test]
    async fn test_get_lead_rejects_numeric_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let tool = GetLeadTool::new(mock_client(&server));
        let body = envelope(&tool.execute(json!({"id": "123"})).await.unwrap());
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_update_lead_currency_only_keeps_amount() {
        let server = MockServer::start().await;
        let lead_path = format!("/api/v1/leads/{LEAD_ID}");

        Mock::given(method("GET"))
            .and(path(lead_path.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"id": LEAD_ID, "value": {"amount": 300.0, "currency": "USD"}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("PATCH"))
            .and(path(lead_path.as_str()))
            .and(body_json(json!({"value": {"amount": 300.0, "currency": "EUR"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"id": LEAD_ID, "value": {"amount": 300.0, "currency": "EUR"}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = UpdateLeadTool::new(mock_client(&server));
        let body = envelope(
            &tool
                .execute(json!({"id": LEAD_ID.to_uppercase(), "currency": "eur"}))
                .await
                .unwrap(),
        );
        assert_eq!(body["data"]["value"]["currency"], "EUR");
    }

    #[tokio::test]
    async fn test_list_leads_offset_pagination() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/leads"))
            .and(query_param("start", "100"))
            .and(query_param("archived_status", "all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"id": LEAD_ID}],
                "additional_data": {"pagination": {"total_count": 101, "next_start": 0}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = ListLeadsTool::new(mock_client(&server));
        let body = envelope(
            &tool
                .execute(json!({"start": "100", "archived_status": "ALL"}))
                .await
                .unwrap(),
        );
        assert_eq!(body["data"]["total_count"], 101);
        assert_eq!(body["data"]["items"][0]["id"], LEAD_ID);
    }

    #[tokio::test]
    async fn test_lead_labels() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/leadLabels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"id": LEAD_ID, "name": "Hot", "color": "red"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = GetLeadLabelsTool::new(mock_client(&server));
        let body = envelope(&tool.execute(json!({})).await.unwrap());
        assert_eq!(body["data"][0]["name"], "Hot");
    }

    #[test]
    fn test_descriptions_pass_lint() {
        for tool in tools(&client_for("http://localhost:1")) {
            let schema = tool.schema();
            assert!(lint_description(&schema).is_empty(), "{}", schema.name);
        }
    }
}
