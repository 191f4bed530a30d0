//! HTTP transport layer for the Pipedrive SDK.

use crate::config::{AuthScheme, ClientConfig};
use crate::error::{PipedriveError, PipedriveResult};
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};
use url::Url;

const LOGGED_BODY_LIMIT: usize = 1000;

/// Pipedrive serves two API generations side by side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ApiVersion {
    V1,
    #[default]
    V2,
}

impl ApiVersion {
    fn prefix(self) -> &'static str {
        match self {
            Self::V1 => "/api/v1",
            Self::V2 => "/api/v2",
        }
    }
}

/// Query string builder that drops absent values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, key: &str, value: impl ToString) -> Self {
        self.0.push((key.to_string(), value.to_string()));
        self
    }

    pub fn push_opt<T: ToString>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.push(key, value),
            None => self,
        }
    }

    /// Comma-joined list, skipped when absent or empty.
    pub fn push_list(self, key: &str, values: Option<&[String]>) -> Self {
        match values.filter(|v| !v.is_empty()) {
            Some(values) => self.push(key, values.join(",")),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

/// HTTP transport for making API requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: Arc<ClientConfig>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration.
    pub fn new(config: Arc<ClientConfig>) -> PipedriveResult<Self> {
        if config.api_token.is_empty() {
            return Err(PipedriveError::Config(
                "Pipedrive API token is required.".to_string(),
            ));
        }

        let mut headers = header::HeaderMap::new();
        if config.auth_scheme == AuthScheme::Bearer {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", config.api_token))
                    .map_err(|_| PipedriveError::Config("Invalid API token format".to_string()))?,
            );
        }

        if !config.verify_ssl {
            warn!("SSL verification is disabled. This should only be used in development environments.");
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()?;

        Ok(Self { client, config })
    }

    /// Build a URL for the given endpoint and API version.
    pub fn build_url(&self, endpoint: &str, version: ApiVersion) -> PipedriveResult<Url> {
        let root = self.config.base_url.as_str().trim_end_matches('/');
        let endpoint = endpoint.trim_start_matches('/');
        Ok(Url::parse(&format!("{root}{}/{endpoint}", version.prefix()))?)
    }

    fn prepare(
        &self,
        method: Method,
        url: Url,
        query: &QueryParams,
        body: Option<&Value>,
    ) -> RequestBuilder {
        let mut request = self.client.request(method, url);
        if self.config.auth_scheme == AuthScheme::ApiToken {
            request = request.query(&[("api_token", self.config.api_token.as_str())]);
        }
        if !query.is_empty() {
            request = request.query(query.pairs());
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request
    }

    /// Send a request, retrying idempotent GETs on transient failures.
    async fn execute_with_retry(
        &self,
        method: &Method,
        request_builder: RequestBuilder,
    ) -> PipedriveResult<Response> {
        let retry_config = &self.config.retry_config;
        let max_retries = if *method == Method::GET {
            retry_config.max_retries
        } else {
            0
        };
        let mut attempts = 0;

        loop {
            let request = request_builder
                .try_clone()
                .ok_or_else(|| PipedriveError::Config("Request cannot be cloned".to_string()))?;

            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if response.status().is_success() {
                        return Ok(response);
                    }

                    if attempts < max_retries && retry_config.should_retry_status(status) {
                        let backoff = retry_config.backoff_for_attempt(attempts);
                        warn!(
                            status = status,
                            attempt = attempts + 1,
                            backoff_ms = backoff.as_millis(),
                            "Request failed, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        attempts += 1;
                        continue;
                    }

                    let body = response.text().await.unwrap_or_default();
                    let err = PipedriveError::from_response(status, &body);
                    error!(
                        status = status,
                        body = %truncate(&body, 500),
                        "HTTP error from Pipedrive"
                    );
                    return Err(err);
                }
                Err(e) => {
                    if attempts < max_retries && (e.is_timeout() || e.is_connect()) {
                        let backoff = retry_config.backoff_for_attempt(attempts);
                        warn!(
                            attempt = attempts + 1,
                            backoff_ms = backoff.as_millis(),
                            error = %e,
                            "Request failed to complete, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        attempts += 1;
                        continue;
                    }
                    error!(error = %e, "Request error during Pipedrive call");
                    return Err(e.into());
                }
            }
        }
    }

    /// Execute a request and return the full response body.
    ///
    /// A 2xx response whose body does not carry `success: true` is an error.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query: &QueryParams,
        body: Option<&Value>,
        version: ApiVersion,
    ) -> PipedriveResult<Value> {
        let url = self.build_url(endpoint, version)?;
        debug!(method = %method, url = %url, "Pipedrive request");
        if self.config.log_requests {
            debug!(query = ?query.pairs(), payload = ?body, "Pipedrive request details");
        }

        let builder = self.prepare(method.clone(), url, query, body);
        let response = self.execute_with_retry(&method, builder).await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        if self.config.log_responses {
            debug!(status = status, body = %truncate(&text, LOGGED_BODY_LIMIT), "Pipedrive response");
        }

        let data: Value = serde_json::from_str(&text)?;
        if data.get("success").and_then(Value::as_bool) != Some(true) {
            let err = PipedriveError::from_unsuccessful_body(status, data);
            warn!(error = %err, "Pipedrive API call not successful");
            return Err(err);
        }
        Ok(data)
    }

    pub async fn get(
        &self,
        endpoint: &str,
        query: &QueryParams,
        version: ApiVersion,
    ) -> PipedriveResult<Value> {
        self.request(Method::GET, endpoint, query, None, version).await
    }

    pub async fn post(&self, endpoint: &str, body: &Value, version: ApiVersion) -> PipedriveResult<Value> {
        self.request(Method::POST, endpoint, &QueryParams::new(), Some(body), version)
            .await
    }

    pub async fn patch(&self, endpoint: &str, body: &Value, version: ApiVersion) -> PipedriveResult<Value> {
        self.request(Method::PATCH, endpoint, &QueryParams::new(), Some(body), version)
            .await
    }

    pub async fn delete(&self, endpoint: &str, version: ApiVersion) -> PipedriveResult<Value> {
        self.request(Method::DELETE, endpoint, &QueryParams::new(), None, version)
            .await
    }
}

fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_config(base_url: &str) -> Arc<ClientConfig> {
        let mut config = ClientConfig::new(Url::parse(base_url).unwrap(), "test-token-123");
        config.retry_config = RetryConfig::no_retry();
        Arc::new(config)
    }

    fn with_retries(base_url: &str) -> Arc<ClientConfig> {
        let mut config = ClientConfig::new(Url::parse(base_url).unwrap(), "test-token-123");
        config.retry_config = RetryConfig::with_attempts(2, Duration::from_millis(1));
        Arc::new(config)
    }

    #[tokio::test]
    async fn test_get_request_sends_token_and_query() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/deals"))
            .and(query_param("api_token", "test-token-123"))
            .and(query_param("limit", "10"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server.uri())).unwrap();
        let query = QueryParams::new()
            .push("limit", 10)
            .push_opt::<String>("cursor", None);
        let body = transport.get("/deals", &query, ApiVersion::V2).await.unwrap();
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn test_v1_prefix() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/leads"))
            .and(body_json(json!({"title": "Lead"})))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"success": true, "data": {"id": "x"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server.uri())).unwrap();
        let body = transport
            .post("/leads", &json!({"title": "Lead"}), ApiVersion::V1)
            .await
            .unwrap();
        assert_eq!(body["data"]["id"], "x");
    }

    #[tokio::test]
    async fn test_bearer_scheme() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/persons/1"))
            .and(header("Authorization", "Bearer test-token-123"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": {}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut config = ClientConfig::new(Url::parse(&server.uri()).unwrap(), "test-token-123");
        config.auth_scheme = AuthScheme::Bearer;
        let transport = HttpTransport::new(Arc::new(config)).unwrap();
        transport
            .get("/persons/1", &QueryParams::new(), ApiVersion::V2)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unsuccessful_body_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/deals/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "error": "Nope",
                "error_info": "Try again"
            })))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(create_config(&server.uri())).unwrap();
        let err = transport
            .get("/deals/1", &QueryParams::new(), ApiVersion::V2)
            .await
            .unwrap_err();
        match err {
            PipedriveError::Api {
                message,
                status,
                error_info,
                ..
            } => {
                assert_eq!(message, "Nope");
                assert_eq!(status, Some(200));
                assert_eq!(error_info.as_deref(), Some("Try again"));
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_error_with_raw_body() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/v2/deals/5"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(with_retries(&server.uri())).unwrap();
        let err = transport.delete("/deals/5", ApiVersion::V2).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.response_data(), Some(&json!({"raw_error": "boom"})));
    }

    #[tokio::test]
    async fn test_get_retries_transient_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/activities"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/activities"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(with_retries(&server.uri())).unwrap();
        transport
            .get("/activities", &QueryParams::new(), ApiVersion::V2)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_post_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/deals"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(with_retries(&server.uri())).unwrap();
        let err = transport
            .post("/deals", &json!({"title": "x"}), ApiVersion::V2)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("PipedriveAPIError: HTTP error 503"));
    }

    #[test]
    fn test_build_url_with_trailing_slash() {
        let transport = HttpTransport::new(create_config("http://localhost:8080/")).unwrap();

        let url = transport.build_url("/deals/1", ApiVersion::V2).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/v2/deals/1");
        let url = transport.build_url("leadLabels", ApiVersion::V1).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/v1/leadLabels");
    }

    #[test]
    fn test_query_params() {
        let fields = vec!["a".to_string(), "b".to_string()];
        let query = QueryParams::new()
            .push_list("fields", Some(fields.as_slice()))
            .push_list("include_fields", Some(&[][..]))
            .push_opt("owner_id", Some(3));
        assert_eq!(
            query.pairs(),
            &[
                ("fields".to_string(), "a,b".to_string()),
                ("owner_id".to_string(), "3".to_string())
            ]
        );
    }

    #[test]
    fn test_empty_token_rejected() {
        let config = ClientConfig::new(Url::parse("http://localhost").unwrap(), "");
        assert!(HttpTransport::new(Arc::new(config)).is_err());
    }
}
