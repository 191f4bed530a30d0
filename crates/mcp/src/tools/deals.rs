// Deal tools, including products attached to deals

use super::common::{check_choice, currency_code, ok, respond, Args, Fields, ToolError, ToolOutcome};
use super::registry::{json_schema_boolean, json_schema_object, json_schema_string, Tool};
use crate::protocol::{CallToolResult, ToolSchema};
use anyhow::Result;
use pipedrive_core::models::deal::{DEAL_STATUSES, DEAL_VISIBILITY};
use pipedrive_core::models::deal_product::{
    check_billing_cycles, BILLING_FREQUENCIES, DISCOUNT_TYPES, TAX_METHODS,
};
use pipedrive_core::models::{ApiRecord, Deal};
use pipedrive_core::ValidationError;
use pipedrive_sdk::api::{SORT_DIRECTIONS, SORT_FIELDS};
use pipedrive_sdk::{GetDealParams, ListDealsParams, PipedriveClient, SearchDealsParams};
use serde_json::{json, Value};
use std::sync::Arc;

pub const FEATURE: &str = "deals";

pub fn tools(client: &PipedriveClient) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(CreateDealTool::new(client.clone())),
        Arc::new(GetDealTool::new(client.clone())),
        Arc::new(ListDealsTool::new(client.clone())),
        Arc::new(UpdateDealTool::new(client.clone())),
        Arc::new(DeleteDealTool::new(client.clone())),
        Arc::new(SearchDealsTool::new(client.clone())),
        Arc::new(UpdateDealProductTool::new(client.clone())),
        Arc::new(DeleteDealProductTool::new(client.clone())),
    ]
}

fn deal_properties() -> Value {
    json!({
        "title": json_schema_string("Title of the deal"),
        "value": json_schema_string("Monetary value of the deal, e.g. '1500.50'"),
        "currency": json_schema_string("3-letter currency code, e.g. 'USD'"),
        "person_id": json_schema_string("Numeric ID of the linked person"),
        "org_id": json_schema_string("Numeric ID of the linked organization"),
        "status": json_schema_string("open, won or lost"),
        "owner_id": json_schema_string("Numeric ID of the owning user"),
        "stage_id": json_schema_string("Numeric ID of the pipeline stage"),
        "pipeline_id": json_schema_string("Numeric ID of the pipeline"),
        "expected_close_date": json_schema_string("Expected close date in YYYY-MM-DD format"),
        "visible_to": json_schema_string("Visibility: 0, 1, 3 or 7"),
        "probability": json_schema_string("Success probability from 0 to 100"),
        "lost_reason": json_schema_string("Reason for losing the deal, only with status 'lost'")
    })
}

/// Optional deal fields shared by create and update.
struct DealInput {
    value: Option<f64>,
    currency: Option<String>,
    person_id: Option<i64>,
    org_id: Option<i64>,
    status: Option<String>,
    owner_id: Option<i64>,
    stage_id: Option<i64>,
    pipeline_id: Option<i64>,
    expected_close_date: Option<String>,
    visible_to: Option<i64>,
    probability: Option<i64>,
    lost_reason: Option<String>,
}

impl DealInput {
    fn parse(args: &Args) -> Result<Self, ToolError> {
        let status = args.text("status").map(|s| s.to_lowercase());
        check_choice("status", status.as_deref(), DEAL_STATUSES)?;

        let value = args.number("value")?;
        if matches!(value, Some(v) if v < 0.0) {
            return Err(ToolError::input("Deal value must be non-negative."));
        }

        let visible_to = args.integer("visible_to")?;
        check_choice("visible_to", visible_to, DEAL_VISIBILITY)?;

        let probability = args.integer("probability")?;
        if matches!(probability, Some(p) if !(0..=100).contains(&p)) {
            return Err(ToolError::input(
                "Probability must be between 0 and 100. Example: '75'",
            ));
        }

        let lost_reason = args.text("lost_reason");
        if lost_reason.is_some() && matches!(status.as_deref(), Some(s) if s != "lost") {
            return Err(ValidationError::new(
                "lost_reason",
                "Lost reason can only be provided when status is 'lost'",
            )
            .into());
        }

        Ok(Self {
            value,
            currency: currency_code(args.text("currency"))?,
            person_id: args.id("person_id")?,
            org_id: args.id("org_id")?,
            status,
            owner_id: args.id("owner_id")?,
            stage_id: args.id("stage_id")?,
            pipeline_id: args.id("pipeline_id")?,
            expected_close_date: args.date("expected_close_date")?,
            visible_to,
            probability,
            lost_reason,
        })
    }
}

const CREATE_DEAL_DESCRIPTION: &str = r#"Creates a new deal in Pipedrive CRM.

A deal tracks a potential sale through the stages of a pipeline. Only the
title is required. New deals default to status "open" and currency "USD".

Format requirements:
- value: decimal number as a string (e.g. "1500.50")
- currency: 3-letter ISO code (e.g. "EUR")
- person_id, org_id, owner_id, stage_id, pipeline_id: numeric strings (e.g. "123")
- status: open, won or lost
- expected_close_date: YYYY-MM-DD (e.g. "2025-06-30")
- visible_to: 0 (private), 1 (owner's group), 3 (group and sub-groups), 7 (company)
- probability: whole number from 0 to 100
- lost_reason: only allowed with status "lost"

Example:
create_deal_in_pipedrive(title="Enterprise license", value="12000", currency="EUR", org_id="42", expected_close_date="2025-06-30")

Args:
    title: Title of the deal
    value: Monetary value of the deal
    currency: Currency of the value
    person_id: Person linked to the deal
    org_id: Organization linked to the deal
    status: Deal status
    owner_id: User who owns the deal
    stage_id: Pipeline stage of the deal
    pipeline_id: Pipeline of the deal
    expected_close_date: Expected close date
    visible_to: Visibility of the deal
    probability: Success probability
    lost_reason: Reason the deal was lost

Returns:
    JSON envelope with the created deal or an error message
"#;

pub struct CreateDealTool {
    client: PipedriveClient,
}

impl CreateDealTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let title = args.required_text("title")?;
        let input = DealInput::parse(args)?;

        let mut deal = Deal {
            value: input.value,
            person_id: input.person_id,
            org_id: input.org_id,
            owner_id: input.owner_id,
            stage_id: input.stage_id,
            pipeline_id: input.pipeline_id,
            expected_close_date: input.expected_close_date,
            visible_to: input.visible_to,
            probability: input.probability,
            lost_reason: input.lost_reason,
            ..Deal::new(title)
        };
        if let Some(currency) = input.currency {
            deal.currency = currency;
        }
        if let Some(status) = input.status {
            deal.status = status;
        }

        ok(self.client.deals().create(&deal.validate()?).await?)
    }
}

#[async_trait::async_trait]
impl Tool for CreateDealTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_deal_in_pipedrive".to_string(),
            description: CREATE_DEAL_DESCRIPTION.to_string(),
            input_schema: json_schema_object(deal_properties(), vec!["title"]),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("create_deal_in_pipedrive", self.run(&args).await))
    }
}

const GET_DEAL_DESCRIPTION: &str = r#"Gets the details of a specific deal from Pipedrive CRM.

Looks up one deal by its numeric ID, optionally with extra fields and a
selection of custom fields.

Format requirements:
- id: numeric string (e.g. "123")
- include_fields: comma separated list (e.g. "products_count,files_count")
- custom_fields: comma separated custom field keys

Example:
get_deal_from_pipedrive(id="123", include_fields="products_count")

Args:
    id: Numeric ID of the deal
    include_fields: Optional fields to include
    custom_fields: Custom field keys to include

Returns:
    JSON envelope with the deal or an error message
"#;

pub struct GetDealTool {
    client: PipedriveClient,
}

impl GetDealTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let id = args.required_id("id")?;
        let params = GetDealParams {
            include_fields: args.list("include_fields"),
            custom_fields: args.list("custom_fields"),
        };
        ok(self.client.deals().get(id, &params).await?)
    }
}

#[async_trait::async_trait]
impl Tool for GetDealTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_deal_from_pipedrive".to_string(),
            description: GET_DEAL_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({
                    "id": json_schema_string("Numeric ID of the deal"),
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
        Ok(respond("get_deal_from_pipedrive", self.run(&args).await))
    }
}

const LIST_DEALS_DESCRIPTION: &str = r#"Lists deals from Pipedrive CRM with filtering and pagination.

Pass the returned next_cursor back as cursor to fetch the following page.

Format requirements:
- limit: numeric string between 1 and 500 (default "100")
- filter_id, owner_id, person_id, org_id, pipeline_id, stage_id: numeric strings
- status: open, won or lost
- sort_by: id, update_time or add_time
- sort_direction: asc or desc
- updated_since, updated_until: RFC 3339 timestamps

Example:
list_deals_from_pipedrive(status="open", pipeline_id="1", sort_by="update_time", sort_direction="desc")

Args:
    limit: Maximum number of deals to return
    cursor: Pagination cursor from a previous call
    filter_id: Saved filter to apply
    owner_id: Only deals owned by this user
    person_id: Only deals linked to this person
    org_id: Only deals linked to this organization
    pipeline_id: Only deals in this pipeline
    stage_id: Only deals in this stage
    status: Only deals with this status
    sort_by: Field to sort by
    sort_direction: Sort direction
    include_fields: Comma separated optional fields
    custom_fields: Comma separated custom field keys
    updated_since: Only deals updated at or after this time
    updated_until: Only deals updated before this time

Returns:
    JSON envelope with items and next_cursor, or an error message
"#;

pub struct ListDealsTool {
    client: PipedriveClient,
}

impl ListDealsTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let status = args.text("status").map(|s| s.to_lowercase());
        let sort_by = args.text("sort_by");
        let sort_direction = args.text("sort_direction").map(|d| d.to_lowercase());
        check_choice("status", status.as_deref(), DEAL_STATUSES)?;
        check_choice("sort_by", sort_by.as_deref(), SORT_FIELDS)?;
        check_choice("sort_direction", sort_direction.as_deref(), SORT_DIRECTIONS)?;

        let params = ListDealsParams {
            limit: Some(args.limit()),
            cursor: args.text("cursor"),
            filter_id: args.id("filter_id")?,
            owner_id: args.id("owner_id")?,
            person_id: args.id("person_id")?,
            org_id: args.id("org_id")?,
            pipeline_id: args.id("pipeline_id")?,
            stage_id: args.id("stage_id")?,
            status,
            sort_by,
            sort_direction,
            include_fields: args.list("include_fields"),
            custom_fields: args.list("custom_fields"),
            updated_since: args.text("updated_since"),
            updated_until: args.text("updated_until"),
        };
        ok(self.client.deals().list(&params).await?)
    }
}

#[async_trait::async_trait]
impl Tool for ListDealsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_deals_from_pipedrive".to_string(),
            description: LIST_DEALS_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({
                    "limit": json_schema_string("Maximum number of deals to return (1-500)"),
                    "cursor": json_schema_string("Pagination cursor"),
                    "filter_id": json_schema_string("Saved filter ID"),
                    "owner_id": json_schema_string("Owner user ID"),
                    "person_id": json_schema_string("Linked person ID"),
                    "org_id": json_schema_string("Linked organization ID"),
                    "pipeline_id": json_schema_string("Pipeline ID"),
                    "stage_id": json_schema_string("Stage ID"),
                    "status": json_schema_string("open, won or lost"),
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
        Ok(respond("list_deals_from_pipedrive", self.run(&args).await))
    }
}

const UPDATE_DEAL_DESCRIPTION: &str = r#"Updates an existing deal in Pipedrive CRM.

Only the provided fields change. At least one field besides id is required.

Format requirements:
- id: numeric string (e.g. "123")
- value: decimal number as a string
- currency: 3-letter ISO code
- status: open, won or lost
- expected_close_date: YYYY-MM-DD
- visible_to: 0, 1, 3 or 7
- probability: whole number from 0 to 100

Example:
update_deal_in_pipedrive(id="123", status="won", value="15000")

Args:
    id: Numeric ID of the deal to update
    title: New title
    value: New value
    currency: New currency
    person_id: New linked person
    org_id: New linked organization
    status: New status
    owner_id: New owner
    stage_id: New stage
    pipeline_id: New pipeline
    expected_close_date: New expected close date
    visible_to: New visibility
    probability: New success probability
    lost_reason: Reason the deal was lost

Returns:
    JSON envelope with the updated deal or an error message
"#;

pub struct UpdateDealTool {
    client: PipedriveClient,
}

impl UpdateDealTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let id = args.required_id("id")?;
        let input = DealInput::parse(args)?;

        let mut fields = Fields::new();
        fields
            .set("title", args.text("title"))
            .set("value", input.value)
            .set("currency", input.currency)
            .set("person_id", input.person_id)
            .set("org_id", input.org_id)
            .set("status", input.status)
            .set("owner_id", input.owner_id)
            .set("stage_id", input.stage_id)
            .set("pipeline_id", input.pipeline_id)
            .set("expected_close_date", input.expected_close_date)
            .set("visible_to", input.visible_to)
            .set("probability", input.probability)
            .set("lost_reason", input.lost_reason);

        ok(self.client.deals().update(id, fields.into_map()).await?)
    }
}

#[async_trait::async_trait]
impl Tool for UpdateDealTool {
    fn schema(&self) -> ToolSchema {
        let mut properties = deal_properties();
        properties["id"] = json_schema_string("Numeric ID of the deal to update");
        ToolSchema {
            name: "update_deal_in_pipedrive".to_string(),
            description: UPDATE_DEAL_DESCRIPTION.to_string(),
            input_schema: json_schema_object(properties, vec!["id"]),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("update_deal_in_pipedrive", self.run(&args).await))
    }
}

const DELETE_DEAL_DESCRIPTION: &str = r#"Deletes a deal from Pipedrive CRM.

The deal is marked as deleted and removed permanently after 30 days.

Format requirements:
- id: numeric string (e.g. "123")

Example:
delete_deal_from_pipedrive(id="123")

Args:
    id: Numeric ID of the deal to delete

Returns:
    JSON envelope with the deleted deal ID or an error message
"#;

pub struct DeleteDealTool {
    client: PipedriveClient,
}

impl DeleteDealTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let id = args.required_id("id")?;
        ok(self.client.deals().delete(id).await?)
    }
}

#[async_trait::async_trait]
impl Tool for DeleteDealTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "delete_deal_from_pipedrive".to_string(),
            description: DELETE_DEAL_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({"id": json_schema_string("Numeric ID of the deal to delete")}),
                vec!["id"],
            ),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("delete_deal_from_pipedrive", self.run(&args).await))
    }
}

const SEARCH_DEALS_DESCRIPTION: &str = r#"Searches for deals in Pipedrive CRM by title, notes or custom fields.

The term must be at least 2 characters, or 1 character with exact_match.

Format requirements:
- term: search text
- fields: comma separated subset of custom_fields, notes, title
- exact_match: true or false
- person_id, organization_id: numeric strings
- status: open, won or lost
- limit: numeric string between 1 and 500

Example:
search_deals_in_pipedrive(term="license", status="open", limit="10")

Args:
    term: Text to search for
    fields: Fields to search in
    exact_match: Only return exact matches
    person_id: Only deals linked to this person
    organization_id: Only deals linked to this organization
    status: Only deals with this status
    include_fields: Comma separated optional fields
    limit: Maximum number of results
    cursor: Pagination cursor from a previous call

Returns:
    JSON envelope with items and next_cursor, or an error message
"#;

pub struct SearchDealsTool {
    client: PipedriveClient,
}

impl SearchDealsTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let term = args.required_text("term")?;
        let status = args.text("status").map(|s| s.to_lowercase());
        check_choice("status", status.as_deref(), DEAL_STATUSES)?;

        let params = SearchDealsParams {
            term,
            fields: args.list("fields"),
            exact_match: args.flag("exact_match").unwrap_or(false),
            person_id: args.id("person_id")?,
            organization_id: args.id("organization_id")?,
            status,
            include_fields: args.list("include_fields"),
            limit: Some(args.limit()),
            cursor: args.text("cursor"),
        };
        ok(self.client.deals().search(&params).await?)
    }
}

#[async_trait::async_trait]
impl Tool for SearchDealsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "search_deals_in_pipedrive".to_string(),
            description: SEARCH_DEALS_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({
                    "term": json_schema_string("Text to search for"),
                    "fields": json_schema_string("Comma separated fields to search in"),
                    "exact_match": json_schema_boolean("Only return exact matches"),
                    "person_id": json_schema_string("Linked person ID"),
                    "organization_id": json_schema_string("Linked organization ID"),
                    "status": json_schema_string("open, won or lost"),
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
        Ok(respond("search_deals_in_pipedrive", self.run(&args).await))
    }
}

const UPDATE_DEAL_PRODUCT_DESCRIPTION: &str = r#"Updates a product attached to a deal in Pipedrive CRM.

Both the deal ID and the product attachment ID (not the product ID) are
required, along with at least one field to change.

Format requirements:
- id, product_attachment_id, product_variation_id: numeric strings
- item_price: positive decimal (e.g. "99.99")
- quantity: positive whole number
- tax, discount: non-negative decimals
- discount_type: percentage or amount
- tax_method: inclusive, exclusive or none
- billing_frequency: one-time, annually, semi-annually, quarterly, monthly or weekly
- billing_frequency_cycles: 1 to 208; not allowed for one-time, required for weekly
- billing_start_date: YYYY-MM-DD

Example:
update_product_in_deal_in_pipedrive(id="123", product_attachment_id="456", quantity="3", discount="20", discount_type="percentage")

Args:
    id: Numeric ID of the deal
    product_attachment_id: Numeric ID of the product attachment
    item_price: New unit price
    quantity: New quantity
    tax: New tax value
    comments: New comments
    discount: New discount value
    discount_type: How the discount applies
    tax_method: How tax is calculated
    is_enabled: Whether the product is active on the deal
    product_variation_id: New product variation
    billing_frequency: New billing frequency
    billing_frequency_cycles: New number of billing cycles
    billing_start_date: New billing start date

Returns:
    JSON envelope with the updated product attachment or an error message
"#;

pub struct UpdateDealProductTool {
    client: PipedriveClient,
}

impl UpdateDealProductTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let deal_id = args.required_id("id")?;
        let attachment_id = args.required_id("product_attachment_id")?;
        let product_variation_id = args.id("product_variation_id")?;

        let item_price = args.number("item_price")?;
        if matches!(item_price, Some(p) if p <= 0.0) {
            return Err(ToolError::input("Item price must be greater than zero."));
        }
        let quantity = args.integer("quantity")?;
        if matches!(quantity, Some(q) if q <= 0) {
            return Err(ToolError::input("Quantity must be greater than zero."));
        }
        let tax = args.number("tax")?;
        if matches!(tax, Some(t) if t < 0.0) {
            return Err(ToolError::input("Tax must be non-negative."));
        }
        let discount = args.number("discount")?;
        if matches!(discount, Some(d) if d < 0.0) {
            return Err(ToolError::input("Discount must be non-negative."));
        }

        let discount_type = args.text("discount_type").map(|s| s.to_lowercase());
        let tax_method = args.text("tax_method").map(|s| s.to_lowercase());
        let billing_frequency = args.text("billing_frequency").map(|s| s.to_lowercase());
        check_choice("discount_type", discount_type.as_deref(), DISCOUNT_TYPES)?;
        check_choice("tax_method", tax_method.as_deref(), TAX_METHODS)?;
        check_choice("billing_frequency", billing_frequency.as_deref(), BILLING_FREQUENCIES)?;

        let billing_frequency_cycles = args.integer("billing_frequency_cycles")?;
        if billing_frequency.is_some() || billing_frequency_cycles.is_some() {
            check_billing_cycles(
                billing_frequency.as_deref().unwrap_or_default(),
                billing_frequency_cycles,
            )?;
        }

        let mut fields = Fields::new();
        fields
            .set("item_price", item_price)
            .set("quantity", quantity)
            .set("tax", tax)
            .set("comments", args.text("comments"))
            .set("discount", discount)
            .set("discount_type", discount_type)
            .set("tax_method", tax_method)
            .set("is_enabled", args.flag("is_enabled"))
            .set("product_variation_id", product_variation_id)
            .set("billing_frequency", billing_frequency)
            .set("billing_frequency_cycles", billing_frequency_cycles)
            .set("billing_start_date", args.date("billing_start_date")?);

        ok(self
            .client
            .deals()
            .update_product(deal_id, attachment_id, fields.into_map())
            .await?)
    }
}

#[async_trait::async_trait]
impl Tool for UpdateDealProductTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "update_product_in_deal_in_pipedrive".to_string(),
            description: UPDATE_DEAL_PRODUCT_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({
                    "id": json_schema_string("Numeric ID of the deal"),
                    "product_attachment_id": json_schema_string("Numeric ID of the product attachment"),
                    "item_price": json_schema_string("Unit price"),
                    "quantity": json_schema_string("Quantity"),
                    "tax": json_schema_string("Tax value"),
                    "comments": json_schema_string("Comments"),
                    "discount": json_schema_string("Discount value"),
                    "discount_type": json_schema_string("percentage or amount"),
                    "tax_method": json_schema_string("inclusive, exclusive or none"),
                    "is_enabled": json_schema_boolean("Whether the product is active on the deal"),
                    "product_variation_id": json_schema_string("Product variation ID"),
                    "billing_frequency": json_schema_string("Billing frequency"),
                    "billing_frequency_cycles": json_schema_string("Number of billing cycles (1-208)"),
                    "billing_start_date": json_schema_string("Billing start date in YYYY-MM-DD format")
                }),
                vec!["id", "product_attachment_id"],
            ),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("update_product_in_deal_in_pipedrive", self.run(&args).await))
    }
}

const DELETE_DEAL_PRODUCT_DESCRIPTION: &str = r#"Deletes a product attachment from a deal in Pipedrive CRM.

Removes the product from the deal only; the product itself is kept.

Format requirements:
- id: numeric ID of the deal (e.g. "123")
- product_attachment_id: numeric ID of the attachment (e.g. "456")

Example:
delete_product_from_deal_in_pipedrive(id="123", product_attachment_id="456")

Args:
    id: Numeric ID of the deal
    product_attachment_id: Numeric ID of the product attachment to remove

Returns:
    JSON envelope with the removed attachment ID or an error message
"#;

pub struct DeleteDealProductTool {
    client: PipedriveClient,
}

impl DeleteDealProductTool {
    pub fn new(client: PipedriveClient) -> Self {
        Self { client }
    }

    async fn run(&self, args: &Args) -> ToolOutcome {
        let deal_id = args.required_id("id")?;
        let attachment_id = args.required_id("product_attachment_id")?;
        ok(self
            .client
            .deals()
            .delete_product(deal_id, attachment_id)
            .await?)
    }
}

#[async_trait::async_trait]
impl Tool for DeleteDealProductTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "delete_product_from_deal_in_pipedrive".to_string(),
            description: DELETE_DEAL_PRODUCT_DESCRIPTION.to_string(),
            input_schema: json_schema_object(
                json!({
                    "id": json_schema_string("Numeric ID of the deal"),
                    "product_attachment_id": json_schema_string("Numeric ID of the product attachment")
                }),
                vec!["id", "product_attachment_id"],
            ),
        }
    }

    fn feature(&self) -> &'static str {
        FEATURE
    }

    async fn execute(&self, arguments: Value) -> Result<CallToolResult> {
        let args = Args::new(arguments);
        Ok(respond("delete_product_from_deal_in_pipedrive", self.run(&args).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::lint_description;
    use crate::tools::testing::{client_for, envelope, mock_client};
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_delete_deal() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/v2/deals/123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"id": 123}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = DeleteDealTool::new(mock_client(&server));
        let result = tool.execute(json!({"id": "123"})).await.unwrap();
        assert_eq!(result.is_error, None);
        assert_eq!(
            envelope(&result),
            json!({"success": true, "data": {"id": 123}, "error": null})
        );
    }

    #[tokio::test]
    async fn test_create_deal_defaults_currency_and_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/deals"))
            .and(body_json(json!({
                "title": "Enterprise license",
                "value": 12000.0,
                "currency": "EUR",
                "org_id": 42,
                "status": "open"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "data": {"id": 77, "title": "Enterprise license"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = CreateDealTool::new(mock_client(&server));
        let body = envelope(
            &tool
                .execute(json!({
                    "title": "Enterprise license",
                    "value": "12000",
                    "currency": "eur",
                    "org_id": "42"
                }))
                .await
                .unwrap(),
        );
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], 77);
    }

    #[tokio::test]
    async fn test_create_deal_rejects_bad_inputs_before_calling_api() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let tool = CreateDealTool::new(mock_client(&server));

        let body = envelope(&tool.execute(json!({"title": "X", "value": "lots"})).await.unwrap());
        assert_eq!(
            body["error"],
            "Invalid value format: 'lots'. Must be a valid number. Example: '1500.50'"
        );

        let body = envelope(&tool.execute(json!({"title": "X", "visible_to": "5"})).await.unwrap());
        assert_eq!(body["error"], "Invalid visible_to: 5. Must be one of: 0, 1, 3, 7");

        let body = envelope(
            &tool
                .execute(json!({"title": "X", "status": "open", "lost_reason": "Price"}))
                .await
                .unwrap(),
        );
        assert_eq!(
            body["error"],
            "Validation error: lost_reason: Lost reason can only be provided when status is 'lost'"
        );

        let body = envelope(&tool.execute(json!({"title": "  "})).await.unwrap());
        assert_eq!(body["error"], "The 'title' field is required and cannot be empty.");
    }

    #[tokio::test]
    async fn test_search_deals_short_term_is_inline_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let tool = SearchDealsTool::new(mock_client(&server));
        let body = envelope(&tool.execute(json!({"term": "a"})).await.unwrap());
        assert_eq!(
            body["error"],
            "Search term must be at least 2 characters long when exact_match is false"
        );
    }

    #[tokio::test]
    async fn test_list_deals_uses_cursor() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/deals"))
            .and(query_param("cursor", "page2"))
            .and(query_param("status", "won"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"id": 5}, {"id": 6}],
                "additional_data": {"next_cursor": null}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = ListDealsTool::new(mock_client(&server));
        let body = envelope(
            &tool
                .execute(json!({"cursor": "page2", "status": "Won"}))
                .await
                .unwrap(),
        );
        assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
        assert_eq!(body["data"]["next_cursor"], Value::Null);
    }

    #[tokio::test]
    async fn test_update_product_checks_billing_rules() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let tool = UpdateDealProductTool::new(mock_client(&server));
        let body = envelope(
            &tool
                .execute(json!({
                    "id": "1",
                    "product_attachment_id": "2",
                    "billing_frequency": "weekly"
                }))
                .await
                .unwrap(),
        );
        assert_eq!(
            body["error"],
            "Validation error: billing_frequency_cycles: When billing_frequency is 'weekly', billing_frequency_cycles must be specified."
        );

        let body = envelope(
            &tool
                .execute(json!({"id": "1", "product_attachment_id": "2", "quantity": "0"}))
                .await
                .unwrap(),
        );
        assert_eq!(body["error"], "Quantity must be greater than zero.");
    }

    #[tokio::test]
    async fn test_update_product_sends_changed_fields() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/api/v2/deals/1/products/2"))
            .and(body_json(json!({"quantity": 3, "discount": 20.0, "discount_type": "percentage"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"id": 2, "quantity": 3}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = UpdateDealProductTool::new(mock_client(&server));
        let body = envelope(
            &tool
                .execute(json!({
                    "id": "1",
                    "product_attachment_id": "2",
                    "quantity": "3",
                    "discount": "20",
                    "discount_type": "Percentage"
                }))
                .await
                .unwrap(),
        );
        assert_eq!(body["data"]["quantity"], 3);
    }

    #[test]
    fn test_descriptions_pass_lint() {
        for tool in tools(&client_for("http://localhost:1")) {
            let schema = tool.schema();
            assert!(lint_description(&schema).is_empty(), "{}", schema.name);
        }
    }
}
