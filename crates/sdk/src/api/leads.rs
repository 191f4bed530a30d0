//! Leads API endpoints. Leads live on the v1 API except for search.

use super::{check_choice, check_limit, check_search_term, data_list, data_of, require_fields, Page};
use crate::client::PipedriveClient;
use crate::error::{PipedriveError, PipedriveResult};
use crate::transport::{ApiVersion, QueryParams};
use pipedrive_core::conversion::{is_hyphenated_uuid, DEFAULT_LIMIT};
use pipedrive_core::models::{ApiRecord, Lead};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

pub const ARCHIVED_STATUSES: &[&str] = &["archived", "not_archived", "all"];

/// Leads API, plus lead labels and sources.
pub struct LeadsApi<'a> {
    client: &'a PipedriveClient,
}

/// One page of an offset-paginated lead listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadPage {
    pub items: Vec<Value>,
    pub total_count: u64,
    pub next_start: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ListLeadsParams {
    pub limit: Option<u32>,
    pub start: Option<u64>,
    pub archived_status: Option<String>,
    pub owner_id: Option<i64>,
    pub person_id: Option<i64>,
    pub organization_id: Option<i64>,
    pub filter_id: Option<i64>,
    /// Field and direction, e.g. `"add_time DESC"`.
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchLeadsParams {
    pub term: String,
    pub fields: Option<Vec<String>>,
    pub exact_match: bool,
    pub person_id: Option<i64>,
    pub organization_id: Option<i64>,
    pub include_fields: Option<Vec<String>>,
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

/// Changes to a lead. `amount` and `currency` are sent as a nested `value`.
#[derive(Debug, Clone, Default)]
pub struct UpdateLeadParams {
    pub fields: Map<String, Value>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
}

/// Canonical lowercase form of a lead id.
fn lead_id(raw: &str) -> PipedriveResult<String> {
    let lowered = raw.trim().to_ascii_lowercase();
    if is_hyphenated_uuid(&lowered) {
        Ok(lowered)
    } else {
        Err(PipedriveError::InvalidInput(format!(
            "Invalid lead ID: {raw}. Must be a valid UUID string."
        )))
    }
}

impl<'a> LeadsApi<'a> {
    pub(crate) fn new(client: &'a PipedriveClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, lead: &Lead) -> PipedriveResult<Value> {
        info!(title = %lead.title, "Creating lead");
        if lead.person_id.is_none() && lead.organization_id.is_none() {
            return Err(PipedriveError::InvalidInput(
                "Either person_id or organization_id must be provided".to_string(),
            ));
        }
        let body = self
            .client
            .http
            .post("/leads", &lead.to_api_value(), ApiVersion::V1)
            .await?;
        Ok(data_of(body))
    }

    pub async fn get(&self, id: &str) -> PipedriveResult<Value> {
        let id = lead_id(id)?;
        let body = self
            .client
            .http
            .get(&format!("/leads/{id}"), &QueryParams::new(), ApiVersion::V1)
            .await?;
        Ok(data_of(body))
    }

    /// Patch a lead.
    ///
    /// When only `currency` changes, the current amount is fetched first
    /// because the API replaces `value` as a whole.
    pub async fn update(&self, id: &str, params: UpdateLeadParams) -> PipedriveResult<Value> {
        let id = lead_id(id)?;
        let mut payload = params.fields;

        match (params.amount, params.currency) {
            (Some(amount), currency) => {
                let currency = currency.unwrap_or_else(|| "USD".to_string());
                payload.insert("value".into(), json!({"amount": amount, "currency": currency}));
            }
            (None, Some(currency)) => {
                let current = self.get(&id).await?;
                if let Some(amount) = current_amount(&current) {
                    payload.insert("value".into(), json!({"amount": amount, "currency": currency}));
                } else {
                    debug!(lead_id = %id, "Lead has no amount, currency change skipped");
                }
            }
            (None, None) => {}
        }

        require_fields(&payload, "a lead")?;
        if payload
            .get("title")
            .and_then(Value::as_str)
            .is_some_and(|t| t.trim().is_empty())
        {
            return Err(PipedriveError::InvalidInput(
                "Lead title cannot be empty if provided".to_string(),
            ));
        }

        let body = self
            .client
            .http
            .patch(&format!("/leads/{id}"), &Value::Object(payload), ApiVersion::V1)
            .await?;
        Ok(data_of(body))
    }

    pub async fn delete(&self, id: &str) -> PipedriveResult<Value> {
        let id = lead_id(id)?;
        let body = self
            .client
            .http
            .delete(&format!("/leads/{id}"), ApiVersion::V1)
            .await?;
        Ok(data_of(body))
    }

    pub async fn list(&self, params: &ListLeadsParams) -> PipedriveResult<LeadPage> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 {
            return Err(PipedriveError::InvalidInput(format!(
                "Invalid limit: {limit}. Must be a positive integer."
            )));
        }
        check_choice("archived_status", params.archived_status.as_deref(), ARCHIVED_STATUSES)?;

        let query = QueryParams::new()
            .push("limit", limit)
            .push_opt("start", params.start)
            .push_opt("archived_status", params.archived_status.as_deref())
            .push_opt("owner_id", params.owner_id)
            .push_opt("person_id", params.person_id)
            .push_opt("organization_id", params.organization_id)
            .push_opt("filter_id", params.filter_id)
            .push_opt("sort", params.sort.as_deref());

        let body = self.client.http.get("/leads", &query, ApiVersion::V1).await?;
        let pagination = body
            .get("additional_data")
            .and_then(|d| d.get("pagination"));
        let count = |key: &str| {
            pagination
                .and_then(|p| p.get(key))
                .and_then(Value::as_u64)
                .unwrap_or(0)
        };

        let page = LeadPage {
            items: data_list(&body),
            total_count: count("total_count"),
            next_start: count("next_start"),
        };
        info!(count = page.items.len(), total = page.total_count, "Listed leads");
        Ok(page)
    }

    /// Search leads by title, notes or custom fields (v2).
    pub async fn search(&self, params: &SearchLeadsParams) -> PipedriveResult<Page> {
        check_search_term(&params.term, params.exact_match)?;
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
        check_limit(limit)?;

        let query = QueryParams::new()
            .push("term", params.term.trim())
            .push("exact_match", params.exact_match)
            .push("limit", limit)
            .push_opt("cursor", params.cursor.as_deref())
            .push_opt("person_id", params.person_id)
            .push_opt("organization_id", params.organization_id)
            .push_list("fields", params.fields.as_deref())
            .push_list("include_fields", params.include_fields.as_deref());

        let body = self.client.http.get("/leads/search", &query, ApiVersion::V2).await?;
        let page = Page::from_search(&body);
        info!(count = page.items.len(), "Found leads");
        Ok(page)
    }

    pub async fn list_labels(&self) -> PipedriveResult<Vec<Value>> {
        let body = self
            .client
            .http
            .get("/leadLabels", &QueryParams::new(), ApiVersion::V1)
            .await?;
        Ok(data_list(&body))
    }

    pub async fn list_sources(&self) -> PipedriveResult<Vec<Value>> {
        let body = self
            .client
            .http
            .get("/leadSources", &QueryParams::new(), ApiVersion::V1)
            .await?;
        Ok(data_list(&body))
    }
}

fn current_amount(lead: &Value) -> Option<f64> {
    match lead.get("value")? {
        Value::Object(money) => money.get("amount").and_then(Value::as_f64),
        other => other.as_f64(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::test_client;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LEAD_ID: &str = "adf21080-0e10-11eb-879b-05d71fb426ec";

    #[tokio::test]
    async fn test_create_nests_value() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/leads"))
            .and(body_json(json!({
                "title": "Inbound",
                "person_id": 5,
                "value": {"amount": 100.0, "currency": "USD"}
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "data": {"id": LEAD_ID}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let lead = Lead {
            amount: Some(100.0),
            person_id: Some(5),
            ..Lead::new("Inbound")
        };
        let created = client.leads().create(&lead).await.unwrap();
        assert_eq!(created["id"], LEAD_ID);
    }

    #[tokio::test]
    async fn test_invalid_uuid_never_hits_api() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.leads().get("not-a-uuid").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid lead ID: not-a-uuid. Must be a valid UUID string."
        );
    }

    #[tokio::test]
    async fn test_currency_only_update_keeps_amount() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/api/v1/leads/{LEAD_ID}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"id": LEAD_ID, "value": {"amount": 250, "currency": "USD"}}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path(format!("/api/v1/leads/{LEAD_ID}")))
            .and(body_json(json!({"value": {"amount": 250.0, "currency": "EUR"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"id": LEAD_ID}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let params = UpdateLeadParams {
            currency: Some("EUR".into()),
            ..Default::default()
        };
        client
            .leads()
            .update(&LEAD_ID.to_uppercase(), params)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_without_fields() {
        let server = MockServer::start().await;
        let client = test_client(&server.uri());
        let err = client
            .leads()
            .update(LEAD_ID, UpdateLeadParams::default())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "At least one field must be provided for updating a lead."
        );
    }

    #[tokio::test]
    async fn test_list_reads_pagination() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/leads"))
            .and(query_param("archived_status", "all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"id": LEAD_ID}],
                "additional_data": {"pagination": {"total_count": 12, "next_start": 1}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let params = ListLeadsParams {
            archived_status: Some("all".into()),
            ..Default::default()
        };
        let page = client.leads().list(&params).await.unwrap();
        assert_eq!(page.total_count, 12);
        assert_eq!(page.next_start, 1);
    }

    #[tokio::test]
    async fn test_search_uses_v2() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/leads/search"))
            .and(query_param("term", "x"))
            .and(query_param("exact_match", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"items": []}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let params = SearchLeadsParams {
            term: "x".into(),
            exact_match: true,
            ..Default::default()
        };
        let page = client.leads().search(&params).await.unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_labels_and_sources() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/leadLabels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"id": LEAD_ID, "name": "Hot", "color": "red"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/leadSources"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"name": "Web forms"}]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert_eq!(client.leads().list_labels().await.unwrap().len(), 1);
        assert_eq!(client.leads().list_sources().await.unwrap()[0]["name"], "Web forms");
    }
}
