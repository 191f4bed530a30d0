// Activity tools: calls, meetings, tasks and activity types

use super::common::{check_choice, ok, respond, Args, Fields, ToolError, ToolOutcome};
use super::registry::{
    json_schema_array, json_schema_boolean, json_schema_object, json_schema_string,
    json_schema_string_or_object, Tool,
};
use crate::protocol::{CallToolResult, ToolSchema};
use anyhow::Result;
use pipedrive_core::conversion::{
    convert_duration_to_api_format, convert_to_api_time_format, format_participants_data,
    parse_location_data,
};
use pipedrive_core::models::activity_type::ICON_KEYS;
use pipedrive_core::models::{Activity, ActivityType, ApiRecord};
use pipedrive_sdk::api::{SORT_DIRECTIONS, SORT_FIELDS};
use pipedrive_sdk::{ListActivitiesParams, PipedriveClient};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

pub const FEATURE: &str = "activities";

pub fn tools(client: &PipedriveClient) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(CreateActivityTool::new(client.clone())),
        Arc::new(GetActivityTool::new(client.clone())),
        Arc::new(ListActivitiesTool::new(client.clone())),
        Arc::new(UpdateActivityTool::new(client.clone())),
        Arc::new(DeleteActivityTool::new(client.clone())),
        Arc::new(GetActivityTypesTool::new(client.clone())),
        Arc::new(CreateActivityTypeTool::new(client.clone())),
    ]
}

/// Properties shared by the create and update tools.
fn activity_properties() -> Value {
    json!({
        "subject": json_schema_string("The subject or title of the activity"),
        "type": json_schema_string("The activity type key, e.g. 'call' or 'meeting'"),
        "owner_id": json_schema_string("Numeric ID of the user who owns the activity"),
        "deal_id": json_schema_string("Numeric ID of the linked deal"),
        "lead_id": json_schema_string("UUID of the linked lead"),
        "person_id": json_schema_string("Numeric ID of the linked person (read-only, use participants)"),
        "org_id": json_schema_string("Numeric ID of the linked organization"),
        "due_date": json_schema_string("Due date in YYYY-MM-DD format"),
        "due_time": json_schema_string("Due time in HH:MM format"),
        "duration": json_schema_string("Duration in HH:MM format or seconds"),
        "busy": json_schema_boolean("Whether the activity marks the assignee as busy"),
        "done": json_schema_boolean("Whether the activity is done"),
        "note": json_schema_string("Notes for the activity"),
        "location": json_schema_string_or_object("Address string or location object"),
        "public_description": json_schema_string("Public description of the activity"),
        "priority": json_schema_string("Priority as a numeric string"),
        "participants": json_schema_array(
            json!({"type": "object"}),
            "Participant objects with person_id and optional primary"
        )
    })
}

/// Converted optional activity fields, shared by create and update.
struct ActivityInput {
    owner_id: Option<i64>,
    deal_id: Option<i64>,
    lead_id: Option<String>,
    person_id: Option<i64>,
    org_id: Option<i64>,
    due_date: Option<String>,
    due_time: Option<String>,
    duration: Option<String>,
    location: Option<Value>,
    priority: Option<i64>,
    participants: Option<Vec<Value>>,
}

impl ActivityInput {
    fn parse(args: &Args) -> Result<Self, ToolError> {
        let priority = args.integer("priority")?;
        if matches!(priority, Some(p) if p < 0) {
            return Err(ToolError::input("Priority must be a positive integer. Example: '1'"));
        }
        let input = Self {
            owner_id: args.id("owner_id")?,
            deal_id: args.id("deal_id")?,
            lead_id: args.uuid("lead_id")?,
            person_id: args.id("person_id")?,
            org_id: args.id("org_id")?,
            due_date: args.date("due_date")?,
            due_time: convert_to_api_time_format(args.text("due_time").as_deref(), "due_time")?,
            duration: convert_duration_to_api_format(args.text("duration").as_deref(), "duration")?,
            location: parse_location_data(args.value("location"), "location")?,
            priority,
            participants: format_participants_data(args.value("participants"), "participants")?,
        };
        if input.person_id.is_some() && input.participants.is_none() {
            warn!(
                "person_id is read-only for activities; the API ignores it unless participants are given"
            );
        }
        Ok(input)
    }
}

const CREATE_ACTIVITY_DESCRIPTION: &str = r#"Creates a new activity in Pipedrive CRM.

Activities track tasks, calls, meetings and other events. The subject and type
fields are required, every other field is optional.

Format requirements:
- owner_id, deal_id, org_id: numeric strings (e.g. "123")
- lead_id: UUID string (e.g. "123e4567-e89b-12d3-a456-426614174000")
- due_date: YYYY-MM-DD (e.g. "2025-01-15")
- due_time: HH:MM (e.g. "14:30"); HH:MM:SS and ISO datetimes are converted
- duration: HH:MM (e.g. "01:30"); HH:MM:SS and seconds (e.g. "5400") are converted
- location: an address string or an object like {"value": "123 Main St"}
- participants: list like [{"person_id": 123, "primary": true}]
- person_id is read-only in the API; link persons through participants

Example:
create_activity_in_pipedrive(subject="Call with client", type="call", due_date="2025-01-15", due_time="14:30", participants=[{"person_id": "123", "primary": true}])

Args:
    subject: The subject or title of the activity
    type: The activity type key (must match an existing activity type)
    owner_id: Numeric ID of the user who owns the activity
    deal_id: Numeric ID of the deal linked to the activity
    lead_id: UUID of the lead linked to the activity
    person_id: Numeric ID of the person (read-only, use participants)
    org_id: Numeric ID of the organization linked to the activity
    due_date: Due date in YYYY-MM-DD format
    due_time: Due time in HH:MM format
    duration: Duration in HH:MM format or seconds
    busy: Whether the activity marks the assignee as busy
    done: Whether the activity is done
    note: Additional notes
    location: Address string or location object
    public_description: Public description of the activity
    priority: Priority as a numeric string (e.g. "1")
    participants: Participant objects with person_id

Returns:
    JSON envelope with the created activity or an error message
"#;

pub struct CreateActivityTool {
    client: PipedriveClient,
}

impl CreateActivityTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let subject = args.required_text("subject")?;
        let activity_type = args.required_text("type")?;
        let input = ActivityInput::parse(args)?;

        let activity = Activity {
            owner_id: input.owner_id,
            deal_id: input.deal_id,
            lead_id: input.lead_id,
            person_id: input.person_id,
            org_id: input.org_id,
            due_date: input.due_date,
            due_time: input.due_time,
            duration: input.duration,
            busy: args.flag("busy"),
            done: args.flag("done"),
            note: args.text("note"),
            location: input.location,
            public_description: args.text("public_description"),
            priority: input.priority,
            participants: input.participants,
            ..Activity::new(subject, activity_type)
        }
        .validate()?;

        ok(self.client.activities().create(&activity).await?)
    }
}

#[async_trait::async_trait]
impl Tool for CreateActivityTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_activity_in_pipedrive".to_string(),
            description: CREATE_ACTIVITY_DESCRIPTION.to_string(),
            input_schema: json_schema_object(activity_properties(), vec!["subject", "type"]),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("create_activity_in_pipedrive", self.run(&args).await))
    }
}

const GET_ACTIVITY_DESCRIPTION: &str = r#"Gets the details of a specific activity from Pipedrive CRM.

Looks up one activity by its numeric ID. Optional fields that the API leaves out
by default can be requested with include_fields.

Format requirements:
- id: numeric string (e.g. "123")
- include_fields: comma separated list (e.g. "attendees,location")

Example:
get_activity_from_pipedrive(id="123", include_fields="attendees")

Args:
    id: Numeric ID of the activity
    include_fields: Comma separated optional fields to include

Returns:
    JSON envelope with the activity or an error message
"#;

pub struct GetActivityTool {
    client: PipedriveClient,
}

impl GetActivityTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let id = args.required_id("id")?;
        let include_fields = args.list("include_fields");
        ok(self
            .client
            .activities()
            .get(id, include_fields.as_deref())
            .await?)
    }
}

#[async_trait::async_trait]
impl Tool for GetActivityTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_activity_from_pipedrive".to_string(),
            description: GET_ACTIVITY_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({
                    "id": json_schema_string("Numeric ID of the activity"),
                    "include_fields": json_schema_string("Comma separated optional fields to include")
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
        Ok(respond("get_activity_from_pipedrive", self.run(&args).await))
    }
}

const LIST_ACTIVITIES_DESCRIPTION: &str = r#"Lists activities from Pipedrive CRM with filtering and pagination.

Results are paginated with a cursor. Pass the returned next_cursor back as
cursor to fetch the following page.

Format requirements:
- limit: numeric string between 1 and 500 (default "100")
- filter_id, owner_id, deal_id, person_id, org_id: numeric strings
- lead_id: UUID string
- updated_since, updated_until: RFC 3339 timestamps (e.g. "2025-01-01T10:20:00Z")
- sort_by: one of id, update_time, add_time
- sort_direction: asc or desc
- include_fields: comma separated list

Example:
list_activities_from_pipedrive(limit="20", deal_id="42", sort_by="update_time", sort_direction="desc")

Args:
    limit: Maximum number of activities to return
    cursor: Pagination cursor from a previous call
    filter_id: Numeric ID of a saved filter
    owner_id: Only activities owned by this user
    deal_id: Only activities linked to this deal
    lead_id: Only activities linked to this lead
    person_id: Only activities linked to this person
    org_id: Only activities linked to this organization
    updated_since: Only activities updated at or after this time
    updated_until: Only activities updated before this time
    sort_by: Field to sort by
    sort_direction: Sort direction
    include_fields: Comma separated optional fields to include

Returns:
    JSON envelope with items and next_cursor, or an error message
"#;

pub struct ListActivitiesTool {
    client: PipedriveClient,
}

impl ListActivitiesTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let sort_by = args.text("sort_by");
        let sort_direction = args.text("sort_direction").map(|d| d.to_lowercase());
        check_choice("sort_by", sort_by.as_deref(), SORT_FIELDS)?;
        check_choice("sort_direction", sort_direction.as_deref(), SORT_DIRECTIONS)?;

        let params = ListActivitiesParams {
            limit: Some(args.limit()),
            cursor: args.text("cursor"),
            filter_id: args.id("filter_id")?,
            owner_id: args.id("owner_id")?,
            deal_id: args.id("deal_id")?,
            lead_id: args.uuid("lead_id")?,
            person_id: args.id("person_id")?,
            org_id: args.id("org_id")?,
            updated_since: args.text("updated_since"),
            updated_until: args.text("updated_until"),
            sort_by,
            sort_direction,
            include_fields: args.list("include_fields"),
        };
        ok(self.client.activities().list(&params).await?)
    }
}

#[async_trait::async_trait]
impl Tool for ListActivitiesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_activities_from_pipedrive".to_string(),
            description: LIST_ACTIVITIES_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({
                    "limit": json_schema_string("Maximum number of activities to return (1-500)"),
                    "cursor": json_schema_string("Pagination cursor from a previous call"),
                    "filter_id": json_schema_string("Numeric ID of a saved filter"),
                    "owner_id": json_schema_string("Only activities owned by this user"),
                    "deal_id": json_schema_string("Only activities linked to this deal"),
                    "lead_id": json_schema_string("Only activities linked to this lead"),
                    "person_id": json_schema_string("Only activities linked to this person"),
                    "org_id": json_schema_string("Only activities linked to this organization"),
                    "updated_since": json_schema_string("RFC 3339 lower bound on update time"),
                    "updated_until": json_schema_string("RFC 3339 upper bound on update time"),
                    "sort_by": json_schema_string("id, update_time or add_time"),
                    "sort_direction": json_schema_string("asc or desc"),
                    "include_fields": json_schema_string("Comma separated optional fields to include")
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
        Ok(respond("list_activities_from_pipedrive", self.run(&args).await))
    }
}

const UPDATE_ACTIVITY_DESCRIPTION: &str = r#"Updates an existing activity in Pipedrive CRM.

Only the fields that are provided are changed. At least one field besides id
must be given.

Format requirements:
- id, owner_id, deal_id, org_id: numeric strings (e.g. "123")
- lead_id: UUID string
- due_date: YYYY-MM-DD
- due_time: HH:MM; HH:MM:SS and ISO datetimes are converted
- duration: HH:MM; HH:MM:SS and seconds are converted
- location: an address string or an object like {"value": "123 Main St"}
- participants: list like [{"person_id": 123, "primary": true}]

Example:
update_activity_in_pipedrive(id="123", done=true, note="Client confirmed")

Args:
    id: Numeric ID of the activity to update
    subject: New subject
    type: New activity type key
    owner_id: Numeric ID of the new owner
    deal_id: Numeric ID of the deal to link
    lead_id: UUID of the lead to link
    person_id: Numeric ID of the person (read-only, use participants)
    org_id: Numeric ID of the organization to link
    due_date: New due date
    due_time: New due time
    duration: New duration
    busy: Whether the activity marks the assignee as busy
    done: Whether the activity is done
    note: New notes
    location: New location
    public_description: New public description
    priority: New priority as a numeric string
    participants: New participant list

Returns:
    JSON envelope with the updated activity or an error message
"#;

pub struct UpdateActivityTool {
    client: PipedriveClient,
}

impl UpdateActivityTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let id = args.required_id("id")?;
        let input = ActivityInput::parse(args)?;

        let mut fields = Fields::new();
        fields
            .set("subject", args.text("subject"))
            .set("type", args.text("type"))
            .set("owner_id", input.owner_id)
            .set("deal_id", input.deal_id)
            .set("lead_id", input.lead_id)
            .set("person_id", input.person_id)
            .set("org_id", input.org_id)
            .set("due_date", input.due_date)
            .set("due_time", input.due_time)
            .set("duration", input.duration)
            .set("busy", args.flag("busy"))
            .set("done", args.flag("done"))
            .set("note", args.text("note"))
            .set("location", input.location)
            .set("public_description", args.text("public_description"))
            .set("priority", input.priority)
            .set("participants", input.participants);

        ok(self.client.activities().update(id, fields.into_map()).await?)
    }
}

#[async_trait::async_trait]
impl Tool for UpdateActivityTool {
    fn schema(&self) -> ToolSchema {
        let mut properties = activity_properties();
        properties["id"] = json_schema_string("Numeric ID of the activity to update");
        ToolSchema {
            name: "update_activity_in_pipedrive".to_string(),
            description: UPDATE_ACTIVITY_DESCRIPTION.to_string(),
            input_schema: json_schema_object(properties, vec!["id"]),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("update_activity_in_pipedrive", self.run(&args).await))
    }
}

const DELETE_ACTIVITY_DESCRIPTION: &str = r#"Deletes an activity from Pipedrive CRM.

The activity is marked as deleted and removed permanently after 30 days.

Format requirements:
- id: numeric string (e.g. "123")

Example:
delete_activity_from_pipedrive(id="123")

Args:
    id: Numeric ID of the activity to delete

Returns:
    JSON envelope with the deleted activity ID or an error message
"#;

pub struct DeleteActivityTool {
    client: PipedriveClient,
}

impl DeleteActivityTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let id = args.required_id("id")?;
        ok(self.client.activities().delete(id).await?)
    }
}

#[async_trait::async_trait]
impl Tool for DeleteActivityTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "delete_activity_from_pipedrive".to_string(),
            description: DELETE_ACTIVITY_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({"id": json_schema_string("Numeric ID of the activity to delete")}),
                vec!["id"],
            ),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("delete_activity_from_pipedrive", self.run(&args).await))
    }
}

const GET_ACTIVITY_TYPES_DESCRIPTION: &str = r#"Gets all activity types from Pipedrive CRM.

Returns every activity type, both built in and custom. The key_string of a type
is the value to pass as type when creating activities.

Format requirements:
- No arguments

Example:
get_activity_types_from_pipedrive()

Args:
    (none)

Returns:
    JSON envelope with the list of activity types or an error message
"#;

pub struct GetActivityTypesTool {
    client: PipedriveClient,
}

impl GetActivityTypesTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Tool for GetActivityTypesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_activity_types_from_pipedrive".to_string(),
            description: GET_ACTIVITY_TYPES_DESCRIPTION.to_string(),
            input_schema: json_schema_object(json!({}), vec![]),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, _arguments: Value) -> Result<CallToolResult> {
        let outcome = match self.client.activities().list_types().await {
            Ok(types) => ok(types),
            Err(e) => Err(e.into()),
        };
        Ok(respond("get_activity_types_from_pipedrive", outcome))
    }
}

const CREATE_ACTIVITY_TYPE_DESCRIPTION: &str = r#"Creates a new activity type in Pipedrive CRM.

Custom activity types appear next to the built in ones (call, meeting, task...).

Format requirements:
- icon_key: one of the Pipedrive icon keys, e.g. task, email, meeting, call, lunch
- color: 6 hex characters without '#' (e.g. "FFCC00")
- order_nr: non-negative numeric string

Example:
create_activity_type_in_pipedrive(name="Site visit", icon_key="car", color="1A2B3C")

Args:
    name: Name of the activity type
    icon_key: Icon shown for the activity type
    color: Hex color of the icon
    order_nr: Position of the type in the list

Returns:
    JSON envelope with the created activity type or an error message
"#;

pub struct CreateActivityTypeTool {
    client: PipedriveClient,
}

impl CreateActivityTypeTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let name = args.required_text("name")?;
        let icon_key = args.required_text("icon_key")?;
        check_choice("icon_key", Some(icon_key.as_str()), ICON_KEYS)?;

        let activity_type = ActivityType {
            color: args.text("color"),
            order_nr: args.integer("order_nr")?,
            ..ActivityType::new(name, icon_key)
        }
        .validate()?;

        ok(self.client.activities().create_type(&activity_type).await?)
    }
}

#[async_trait::async_trait]
impl Tool for CreateActivityTypeTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_activity_type_in_pipedrive".to_string(),
            description: CREATE_ACTIVITY_TYPE_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({
                    "name": json_schema_string("Name of the activity type"),
                    "icon_key": json_schema_string("Icon key, e.g. task, email, meeting, call"),
                    "color": json_schema_string("Hex color without '#'"),
                    "order_nr": json_schema_string("Position of the type in the list")
                }),
                vec!["name", "icon_key"],
            ),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("create_activity_type_in_pipedrive", self.run(&args).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{envelope, mock_client};
    use crate::lint::lint_description;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_create_activity_converts_inputs() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/activities"))
            .and(body_json(json!({
                "subject": "Call with client",
                "type": "call",
                "due_date": "2025-01-15",
                "due_time": "14:30",
                "duration": "01:30",
                "location": {"value": "123 Main St"},
                "participants": [{"person_id": 123, "primary": true}]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "data": {"id": 9, "subject": "Call with client"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = CreateActivityTool::new(mock_client(&server));
        let result = tool
            .execute(json!({
                "subject": " Call with client ",
                "type": "call",
                "due_date": "2025-01-15",
                "due_time": "14:30:00",
                "duration": "5400",
                "location": "123 Main St",
                "participants": [{"person_id": "123", "primary": true}]
            }))
            .await
            .unwrap();

        let body = envelope(&result);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], 9);
    }

    #[tokio::test]
    async fn test_create_activity_bad_id_never_calls_api() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let tool = CreateActivityTool::new(mock_client(&server));
        let result = tool
            .execute(json!({"subject": "Call", "type": "call", "deal_id": "abc"}))
            .await
            .unwrap();

        let body = envelope(&result);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "deal_id must be a numeric string. Example: '123'");
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_create_activity_priority_out_of_range_is_validation_error() {
        let server = MockServer::start().await;
        let tool = CreateActivityTool::new(mock_client(&server));
        let result = tool
            .execute(json!({"subject": "Call", "type": "call", "priority": "1000"}))
            .await
            .unwrap();

        let body = envelope(&result);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Validation error: priority"));
    }

    #[tokio::test]
    async fn test_list_activities_passes_filters() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/activities"))
            .and(query_param("limit", "500"))
            .and(query_param("deal_id", "42"))
            .and(query_param("sort_direction", "desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"id": 1}],
                "additional_data": {"next_cursor": "abc"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = ListActivitiesTool::new(mock_client(&server));
        let result = tool
            .execute(json!({"limit": "9000", "deal_id": "42", "sort_direction": "DESC"}))
            .await
            .unwrap();

        let body = envelope(&result);
        assert_eq!(body["data"]["next_cursor"], "abc");
        assert_eq!(body["data"]["items"][0]["id"], 1);
    }

    #[tokio::test]
    async fn test_update_activity_requires_a_field() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let tool = UpdateActivityTool::new(mock_client(&server));
        let body = envelope(&tool.execute(json!({"id": "5", "note": ""})).await.unwrap());
        assert_eq!(
            body["error"],
            "At least one field must be provided for updating an activity."
        );
    }

    #[tokio::test]
    async fn test_api_error_is_wrapped() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/v2/activities/5"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "success": false,
                "error": "Activity not found"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = DeleteActivityTool::new(mock_client(&server));
        let body = envelope(&tool.execute(json!({"id": "5"})).await.unwrap());
        assert_eq!(body["success"], false);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Pipedrive API error: PipedriveAPIError: HTTP error 404: Activity not found"));
        assert_eq!(body["data"]["error"], "Activity not found");
    }

    #[tokio::test]
    async fn test_activity_type_icon_checked_locally() {
        let server = MockServer::start().await;
        let tool = CreateActivityTypeTool::new(mock_client(&server));
        let body = envelope(
            &tool
                .execute(json!({"name": "Visit", "icon_key": "rocket"}))
                .await
                .unwrap(),
        );
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid icon_key: rocket. Must be one of: task, email"));
    }

    #[test]
    fn test_descriptions_pass_lint() {
        let server_uri = "http://localhost:1";
        let client = crate::tools::testing::client_for(server_uri);
        for tool in tools(&client) {
            let schema = tool.schema();
            assert!(lint_description(&schema).is_empty(), "{}", schema.name);
        }
    }
}
