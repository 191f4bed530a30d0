// Person tools

use super::common::{check_choice, ok, respond, Args, Fields, ToolError, ToolOutcome};
use super::registry::{json_schema_boolean, json_schema_object, json_schema_string, Tool};
use crate::protocol::{CallToolResult, ToolSchema};
use anyhow::Result;
use pipedrive_core::models::person::PERSON_VISIBILITY;
use pipedrive_core::models::{ApiRecord, ContactInfo, Person};
use pipedrive_sdk::api::persons::PERSON_SEARCH_FIELDS;
use pipedrive_sdk::api::{SORT_DIRECTIONS, SORT_FIELDS};
use pipedrive_sdk::{
    GetPersonParams, ListPersonsParams, PipedriveClient, SearchPersonsParams,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub const FEATURE: &str = "persons";

pub fn tools(client: &PipedriveClient) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(CreatePersonTool::new(client.clone())),
        Arc::new(GetPersonTool::new(client.clone())),
        Arc::new(UpdatePersonTool::new(client.clone())),
        Arc::new(DeletePersonTool::new(client.clone())),
        Arc::new(SearchPersonsTool::new(client.clone())),
        Arc::new(ListPersonsTool::new(client.clone())),
    ]
}

fn person_properties() -> Value {
    json!({
        "name": json_schema_string("Full name of the person"),
        "owner_id": json_schema_string("Numeric ID of the owning user"),
        "org_id": json_schema_string("Numeric ID of the organization the person belongs to"),
        "email_address": json_schema_string("Primary email address"),
        "email_label": json_schema_string("Label of the email, default 'work'"),
        "phone_number": json_schema_string("Primary phone number"),
        "phone_label": json_schema_string("Label of the phone number, default 'work'"),
        "visible_to": json_schema_string("Visibility: 1, 2 or 3"),
        "custom_fields": {
            "type": ["object", "string"],
            "description": "Custom field values keyed by field hash"
        }
    })
}

/// Optional person fields shared by create and update.
struct PersonInput {
    owner_id: Option<i64>,
    org_id: Option<i64>,
    emails: Vec<ContactInfo>,
    phones: Vec<ContactInfo>,
    visible_to: Option<i64>,
    custom_fields: Option<Map<String, Value>>,
}

impl PersonInput {
    fn parse(args: &Args) -> Result<Self, ToolError> {
        let visible_to = args.integer("visible_to")?;
        check_choice("visible_to", visible_to, PERSON_VISIBILITY)?;

        let label = |key: &str| args.text(key).unwrap_or_else(|| "work".to_string());
        let emails = args
            .text("email_address")
            .map(|email| ContactInfo::email(email, label("email_label")))
            .into_iter()
            .collect();
        let phones = args
            .text("phone_number")
            .map(|phone| ContactInfo::phone(phone, label("phone_label")))
            .into_iter()
            .collect();

        Ok(Self {
            owner_id: args.id("owner_id")?,
            org_id: args.id("org_id")?,
            emails,
            phones,
            visible_to,
            custom_fields: args.object("custom_fields")?,
        })
    }
}

const CREATE_PERSON_DESCRIPTION: &str = r#"Creates a new person in Pipedrive CRM.

A person is a contact, usually working for an organization. Only the name is
required. One email address and one phone number can be given; both are
stored as primary.

Format requirements:
- owner_id, org_id: numeric strings (e.g. "123")
- email_address: a valid email (e.g. "jane@example.com")
- email_label, phone_label: work, home, mobile or other (default "work")
- visible_to: 1 (owner), 2 (owner's group), 3 (company)
- custom_fields: JSON object keyed by field hash

Example:
create_person_in_pipedrive(name="Jane Doe", email_address="jane@example.com", phone_number="+1 555 0100", org_id="42")

Args:
    name: Full name of the person
    owner_id: User who owns the person
    org_id: Organization the person belongs to
    email_address: Email address of the person
    email_label: Label of the email address
    phone_number: Phone number of the person
    phone_label: Label of the phone number
    visible_to: Visibility of the person
    custom_fields: Custom field values

Returns:
    JSON envelope with the created person or an error message
"#;

pub struct CreatePersonTool {
    client: PipedriveClient,
}

impl CreatePersonTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let name = args.required_text("name")?;
        let input = PersonInput::parse(args)?;

        let person = Person {
            owner_id: input.owner_id,
            org_id: input.org_id,
            emails: input.emails,
            phones: input.phones,
            visible_to: input.visible_to,
            custom_fields: input.custom_fields,
            ..Person::new(name)
        }
        .validate()?;

        ok(self.client.persons().create(&person).await?)
    }
}

#[async_trait::async_trait]
impl Tool for CreatePersonTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_person_in_pipedrive".to_string(),
            description: CREATE_PERSON_DESCRIPTION.to_string(),
            input_schema: json_schema_object(person_properties(), vec!["name"]),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("create_person_in_pipedrive", self.run(&args).await))
    }
}

const GET_PERSON_DESCRIPTION: &str = r#"Gets the details of a specific person from Pipedrive CRM.

Looks up one person by numeric ID, optionally with extra fields.

Format requirements:
- id: numeric string (e.g. "123")
- include_fields: comma separated list (e.g. "open_deals_count,email_messages_count")
- custom_fields: comma separated custom field keys

Example:
get_person_from_pipedrive(id="123", include_fields="open_deals_count")

Args:
    id: Numeric ID of the person
    include_fields: Optional fields to include
    custom_fields: Custom field keys to include

Returns:
    JSON envelope with the person or an error message
"#;

pub struct GetPersonTool {
    client: PipedriveClient,
}

impl GetPersonTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let id = args.required_id("id")?;
        let params = GetPersonParams {
            include_fields: args.list("include_fields"),
            custom_fields: args.list("custom_fields"),
        };
        ok(self.client.persons().get(id, &params).await?)
    }
}

#[async_trait::async_trait]
impl Tool for GetPersonTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_person_from_pipedrive".to_string(),
            description: GET_PERSON_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({
                    "id": json_schema_string("Numeric ID of the person"),
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
        Ok(respond("get_person_from_pipedrive", self.run(&args).await))
    }
}

const UPDATE_PERSON_DESCRIPTION: &str = r#"Updates an existing person in Pipedrive CRM.

Only the provided fields change. A new email address or phone number replaces
the stored list with a single primary entry.

Format requirements:
- id, owner_id, org_id: numeric strings
- email_address: a valid email
- visible_to: 1, 2 or 3
- custom_fields: JSON object keyed by field hash

Example:
update_person_in_pipedrive(id="123", phone_number="+1 555 0199", phone_label="mobile")

Args:
    id: Numeric ID of the person to update
    name: New name
    owner_id: New owner
    org_id: New organization
    email_address: New email address
    email_label: Label of the new email address
    phone_number: New phone number
    phone_label: Label of the new phone number
    visible_to: New visibility
    custom_fields: Custom field values to change

Returns:
    JSON envelope with the updated person or an error message
"#;

pub struct UpdatePersonTool {
    client: PipedriveClient,
}

impl UpdatePersonTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let id = args.required_id("id")?;
        let input = PersonInput::parse(args)?;

        if let Some(bad) = input.emails.iter().find(|e| !e.value.contains('@')) {
            return Err(ToolError::input(format!(
                "Invalid email format: {}",
                bad.value
            )));
        }
        let contacts = |entries: Vec<ContactInfo>| {
            (!entries.is_empty()).then(|| json!(entries))
        };

        let mut fields = Fields::new();
        fields
            .set("name", args.text("name"))
            .set("owner_id", input.owner_id)
            .set("org_id", input.org_id)
            .set("emails", contacts(input.emails))
            .set("phones", contacts(input.phones))
            .set("visible_to", input.visible_to)
            .set("custom_fields", input.custom_fields.map(Value::Object));

        ok(self.client.persons().update(id, fields.into_map()).await?)
    }
}

#[async_trait::async_trait]
impl Tool for UpdatePersonTool {
    fn schema(&self) -> ToolSchema {
        let mut properties = person_properties();
        properties["id"] = json_schema_string("Numeric ID of the person to update");
        ToolSchema {
            name: "update_person_in_pipedrive".to_string(),
            description: UPDATE_PERSON_DESCRIPTION.to_string(),
            input_schema: json_schema_object(properties, vec!["id"]),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("update_person_in_pipedrive", self.run(&args).await))
    }
}

const DELETE_PERSON_DESCRIPTION: &str = r#"Deletes a person from Pipedrive CRM.

The person is marked as deleted and removed permanently after 30 days.

Format requirements:
- id: numeric string (e.g. "123")

Example:
delete_person_from_pipedrive(id="123")

Args:
    id: Numeric ID of the person to delete

Returns:
    JSON envelope with the deleted person ID or an error message
"#;

pub struct DeletePersonTool {
    client: PipedriveClient,
}

impl DeletePersonTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let id = args.required_id("id")?;
        ok(self.client.persons().delete(id).await?)
    }
}

#[async_trait::async_trait]
impl Tool for DeletePersonTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "delete_person_from_pipedrive".to_string(),
            description: DELETE_PERSON_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({"id": json_schema_string("Numeric ID of the person to delete")}),
                vec!["id"],
            ),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("delete_person_from_pipedrive", self.run(&args).await))
    }
}

const SEARCH_PERSONS_DESCRIPTION: &str = r#"Searches for persons in Pipedrive CRM by name, email, phone, notes or custom fields.

The term must be at least 2 characters, or 1 character with exact_match.

Format requirements:
- term: search text; for email and phone use the full value
- fields: comma separated subset of name, email, phone, notes, custom_fields
- exact_match: true or false
- organization_id: numeric string
- limit: numeric string between 1 and 500

Example:
search_persons_in_pipedrive(term="jane@example.com", fields="email", exact_match=true)

Args:
    term: Text to search for
    fields: Fields to search in
    exact_match: Only return exact matches
    organization_id: Only persons in this organization
    include_fields: Comma separated optional fields
    limit: Maximum number of results
    cursor: Pagination cursor from a previous call

Returns:
    JSON envelope with items and next_cursor, or an error message
"#;

pub struct SearchPersonsTool {
    client: PipedriveClient,
}

impl SearchPersonsTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let fields = args
            .list("fields")
            .map(|fields| fields.into_iter().map(|f| f.to_lowercase()).collect::<Vec<_>>());
        if let Some(fields) = &fields {
            for field in fields {
                check_choice("search field", Some(field.as_str()), PERSON_SEARCH_FIELDS)?;
            }
        }

        let params = SearchPersonsParams {
            term: args.required_text("term")?,
            fields,
            exact_match: args.flag("exact_match").unwrap_or(false),
            organization_id: args.id("organization_id")?,
            include_fields: args.list("include_fields"),
            limit: Some(args.limit()),
            cursor: args.text("cursor"),
        };
        ok(self.client.persons().search(&params).await?)
    }
}

#[async_trait::async_trait]
impl Tool for SearchPersonsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "search_persons_in_pipedrive".to_string(),
            description: SEARCH_PERSONS_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({
                    "term": json_schema_string("Text to search for"),
                    "fields": json_schema_string("Comma separated fields to search in"),
                    "exact_match": json_schema_boolean("Only return exact matches"),
                    "organization_id": json_schema_string("Organization ID"),
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
        Ok(respond("search_persons_in_pipedrive", self.run(&args).await))
    }
}

const LIST_PERSONS_DESCRIPTION: &str = r#"Lists persons from Pipedrive CRM with filtering and pagination.

Pass the returned next_cursor back as cursor to fetch the following page.

Format requirements:
- limit: numeric string between 1 and 500 (default "100")
- filter_id, owner_id, org_id: numeric strings
- sort_by: id, update_time or add_time
- sort_direction: asc or desc
- updated_since, updated_until: RFC 3339 timestamps

Example:
list_persons_from_pipedrive(org_id="42", limit="25")

Args:
    limit: Maximum number of persons to return
    cursor: Pagination cursor from a previous call
    filter_id: Saved filter to apply
    owner_id: Only persons owned by this user
    org_id: Only persons in this organization
    sort_by: Field to sort by
    sort_direction: Sort direction
    include_fields: Comma separated optional fields
    custom_fields: Comma separated custom field keys
    updated_since: Only persons updated at or after this time
    updated_until: Only persons updated before this time

Returns:
    JSON envelope with items and next_cursor, or an error message
"#;

pub struct ListPersonsTool {
    client: PipedriveClient,
}

impl ListPersonsTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let sort_by = args.text("sort_by");
        let sort_direction = args.text("sort_direction").map(|d| d.to_lowercase());
        check_choice("sort_by", sort_by.as_deref(), SORT_FIELDS)?;
        check_choice("sort_direction", sort_direction.as_deref(), SORT_DIRECTIONS)?;

        let params = ListPersonsParams {
            limit: Some(args.limit()),
            cursor: args.text("cursor"),
            filter_id: args.id("filter_id")?,
            owner_id: args.id("owner_id")?,
            org_id: args.id("org_id")?,
            sort_by,
            sort_direction,
            include_fields: args.list("include_fields"),
            custom_fields: args.list("custom_fields"),
            updated_since: args.text("updated_since"),
            updated_until: args.text("updated_until"),
        };
        ok(self.client.persons().list(&params).await?)
    }
}

#[async_trait::async_trait]
impl Tool for ListPersonsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_persons_from_pipedrive".to_string(),
            description: LIST_PERSONS_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({
                    "limit": json_schema_string("Maximum number of persons to return (1-500)"),
                    "cursor": json_schema_string("Pagination cursor"),
                    "filter_id": json_schema_string("Saved filter ID"),
                    "owner_id": json_schema_string("Owner user ID"),
                    "org_id": json_schema_string("Organization ID"),
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
        Ok(respond("list_persons_from_pipedrive", self.run(&args).await))
    }
}
