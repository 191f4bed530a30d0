//! Activities API endpoints.

use super::{check_choice, check_limit, data_list, data_of, positive_id, require_fields, Page};
use super::{SORT_DIRECTIONS, SORT_FIELDS};
use crate::client::PipedriveClient;
use crate::error::PipedriveResult;
use crate::transport::{ApiVersion, QueryParams};
use pipedrive_core::conversion::DEFAULT_LIMIT;
use pipedrive_core::models::{Activity, ActivityType, ApiRecord};
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Activities API for calls, meetings, tasks and their types.
pub struct ActivitiesApi<'a> {
    client: &'a PipedriveClient,
}

/// Filters for listing activities.
#[derive(Debug, Clone, Default)]
pub struct ListActivitiesParams {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
    pub filter_id: Option<i64>,
    pub owner_id: Option<i64>,
    pub deal_id: Option<i64>,
    pub lead_id: Option<String>,
    pub person_id: Option<i64>,
    pub org_id: Option<i64>,
    /// RFC 3339 timestamp.
    pub updated_since: Option<String>,
    pub updated_until: Option<String>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
    pub include_fields: Option<Vec<String>>,
}

impl<'a> ActivitiesApi<'a> {
    pub(crate) fn new(client: &'a PipedriveClient) -> Self {
        Self { client }
    }

    /// Create an activity from a validated record.
    pub async fn create(&self, activity: &Activity) -> PipedriveResult<Value> {
        info!(subject = %activity.subject, "Creating activity");
        if activity.person_id.is_some() {
            warn!("person_id is read-only for activities; use participants instead");
        }
        let body = self
            .client
            .http
            .post("/activities", &activity.to_api_value(), ApiVersion::V2)
            .await?;
        Ok(data_of(body))
    }

    pub async fn get(&self, id: i64, include_fields: Option<&[String]>) -> PipedriveResult<Value> {
        positive_id(id, "activity")?;
        let query = QueryParams::new().push_list("include_fields", include_fields);
        let body = self
            .client
            .http
            .get(&format!("/activities/{id}"), &query, ApiVersion::V2)
            .await?;
        Ok(data_of(body))
    }

    pub async fn list(&self, params: &ListActivitiesParams) -> PipedriveResult<Page> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
        check_limit(limit)?;
        check_choice("sort_direction", params.sort_direction.as_deref(), SORT_DIRECTIONS)?;
        check_choice("sort_by", params.sort_by.as_deref(), SORT_FIELDS)?;

        let query = QueryParams::new()
            .push("limit", limit)
            .push_opt("cursor", params.cursor.as_deref())
            .push_opt("filter_id", params.filter_id)
            .push_opt("owner_id", params.owner_id)
            .push_opt("deal_id", params.deal_id)
            .push_opt("lead_id", params.lead_id.as_deref())
            .push_opt("person_id", params.person_id)
            .push_opt("org_id", params.org_id)
            .push_opt("updated_since", params.updated_since.as_deref())
            .push_opt("updated_until", params.updated_until.as_deref())
            .push_opt("sort_by", params.sort_by.as_deref())
            .push_opt("sort_direction", params.sort_direction.as_deref())
            .push_list("include_fields", params.include_fields.as_deref());

        let body = self.client.http.get("/activities", &query, ApiVersion::V2).await?;
        let page = Page::from_list(&body);
        info!(count = page.items.len(), next_cursor = ?page.next_cursor, "Listed activities");
        Ok(page)
    }

    /// Patch an activity. `fields` holds API-shaped values.
    pub async fn update(&self, id: i64, fields: Map<String, Value>) -> PipedriveResult<Value> {
        positive_id(id, "activity")?;
        require_fields(&fields, "an activity")?;
        let body = self
            .client
            .http
            .patch(&format!("/activities/{id}"), &Value::Object(fields), ApiVersion::V2)
            .await?;
        Ok(data_of(body))
    }

    pub async fn delete(&self, id: i64) -> PipedriveResult<Value> {
        positive_id(id, "activity")?;
        let body = self
            .client
            .http
            .delete(&format!("/activities/{id}"), ApiVersion::V2)
            .await?;
        Ok(data_of(body))
    }

    /// All activity types. Served by the v1 API only.
    pub async fn list_types(&self) -> PipedriveResult<Vec<Value>> {
        let body = self
            .client
            .http
            .get("/activityTypes", &QueryParams::new(), ApiVersion::V1)
            .await?;
        Ok(data_list(&body))
    }

    pub async fn create_type(&self, activity_type: &ActivityType) -> PipedriveResult<Value> {
        info!(name = %activity_type.name, "Creating activity type");
        let body = self
            .client
            .http
            .post("/activityTypes", &activity_type.to_api_value(), ApiVersion::V1)
            .await?;
        Ok(data_of(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::test_client;
    use crate::error::PipedriveError;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_create_posts_api_payload() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/activities"))
            .and(body_json(json!({
                "subject": "Call Ann",
                "type": "call",
                "due_date": "2025-03-01"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "data": {"id": 7, "subject": "Call Ann"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let mut activity = Activity::new("Call Ann", "call");
        activity.due_date = Some("2025-03-01".to_string());
        let created = client.activities().create(&activity).await.unwrap();
        assert_eq!(created["id"], 7);
    }

    #[tokio::test]
    async fn test_list_returns_cursor() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/activities"))
            .and(query_param("limit", "20"))
            .and(query_param("include_fields", "attendees,location"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"id": 1}, {"id": 2}],
                "additional_data": {"next_cursor": "n2"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let params = ListActivitiesParams {
            limit: Some(20),
            include_fields: Some(vec!["attendees".into(), "location".into()]),
            ..Default::default()
        };
        let page = client.activities().list(&params).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.next_cursor.as_deref(), Some("n2"));
    }

    #[tokio::test]
    async fn test_list_rejects_bad_sort_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let params = ListActivitiesParams {
            sort_by: Some("subject".into()),
            ..Default::default()
        };
        let err = client.activities().list(&params).await.unwrap_err();
        assert!(matches!(err, PipedriveError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_update_requires_fields() {
        let server = MockServer::start().await;
        let client = test_client(&server.uri());
        let err = client.activities().update(3, Map::new()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "At least one field must be provided for updating an activity."
        );
    }

    #[tokio::test]
    async fn test_types_use_v1() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/activityTypes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"id": 1, "name": "Call", "key_string": "call"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let types = client.activities().list_types().await.unwrap();
        assert_eq!(types[0]["key_string"], "call");
    }

    #[tokio::test]
    async fn test_delete_rejects_non_positive_id() {
        let server = MockServer::start().await;
        let client = test_client(&server.uri());
        let err = client.activities().delete(0).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid activity ID: 0. Must be a positive integer.");
    }
}
