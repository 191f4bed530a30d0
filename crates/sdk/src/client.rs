//! Main client for the Pipedrive SDK.

use crate::api::*;
use crate::config::{AuthScheme, ClientConfig, RetryConfig, Settings};
use crate::error::{PipedriveError, PipedriveResult};
use crate::transport::HttpTransport;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Main client for interacting with the Pipedrive API.
#[derive(Clone)]
pub struct PipedriveClient {
    config: Arc<ClientConfig>,
    pub(crate) http: HttpTransport,
}

impl PipedriveClient {
    /// Create a new client builder.
    pub fn builder() -> PipedriveClientBuilder {
        PipedriveClientBuilder::new()
    }

    /// Create a client from configuration.
    pub fn from_config(config: ClientConfig) -> PipedriveResult<Self> {
        let config = Arc::new(config);
        let http = HttpTransport::new(config.clone())?;

        Ok(Self { config, http })
    }

    /// Create a client from `PIPEDRIVE_*` environment settings.
    pub fn from_settings(settings: &Settings) -> PipedriveResult<Self> {
        Self::from_config(settings.client_config()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the activities API.
    pub fn activities(&self) -> ActivitiesApi<'_> {
        ActivitiesApi::new(self)
    }

    /// Get the deals API.
    pub fn deals(&self) -> DealsApi<'_> {
        DealsApi::new(self)
    }

    /// Get the leads API.
    pub fn leads(&self) -> LeadsApi<'_> {
        LeadsApi::new(self)
    }

    /// Get the organizations API.
    pub fn organizations(&self) -> OrganizationsApi<'_> {
        OrganizationsApi::new(self)
    }

    /// Get the persons API.
    pub fn persons(&self) -> PersonsApi<'_> {
        PersonsApi::new(self)
    }

    /// Get the cross-entity search API.
    pub fn item_search(&self) -> ItemSearchApi<'_> {
        ItemSearchApi::new(self)
    }
}

/// Builder for creating a PipedriveClient.
pub struct PipedriveClientBuilder {
    base_url: Option<String>,
    company_domain: Option<String>,
    api_token: Option<String>,
    auth_scheme: AuthScheme,
    timeout: Duration,
    retry_config: RetryConfig,
    verify_ssl: bool,
}

impl PipedriveClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            base_url: None,
            company_domain: None,
            api_token: None,
            auth_scheme: AuthScheme::default(),
            timeout: Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS),
            retry_config: RetryConfig::default(),
            verify_ssl: true,
        }
    }

    /// Company subdomain, as in `https://{domain}.pipedrive.com`.
    pub fn company_domain(mut self, domain: impl Into<String>) -> Self {
        self.company_domain = Some(domain.into());
        self
    }

    /// Explicit API root. Takes precedence over the company domain.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the API token.
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn auth_scheme(mut self, scheme: AuthScheme) -> Self {
        self.auth_scheme = scheme;
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry configuration.
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    /// Build the client.
    pub fn build(self) -> PipedriveResult<PipedriveClient> {
        let api_token = self
            .api_token
            .ok_or_else(|| PipedriveError::Config("Pipedrive API token is required.".to_string()))?;

        let base_url = match (self.base_url, self.company_domain) {
            (Some(url), _) => Url::parse(&url)?,
            (None, Some(domain)) => Url::parse(&format!("https://{domain}.pipedrive.com"))?,
            (None, None) => {
                return Err(PipedriveError::Config(
                    "Pipedrive company domain is required.".to_string(),
                ))
            }
        };

        let mut config = ClientConfig::new(base_url, api_token);
        config.auth_scheme = self.auth_scheme;
        config.timeout = self.timeout;
        config.retry_config = self.retry_config;
        config.verify_ssl = self.verify_ssl;

        PipedriveClient::from_config(config)
    }
}

impl Default for PipedriveClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Client pointed at a mock server, with retries disabled.
    pub(crate) fn test_client(base_url: &str) -> PipedriveClient {
        PipedriveClient::builder()
            .base_url(base_url)
            .api_token("test-token-123")
            .retry_config(RetryConfig::no_retry())
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_token_and_host() {
        assert!(PipedriveClient::builder().company_domain("acme").build().is_err());
        assert!(PipedriveClient::builder().api_token("abcdefghijk").build().is_err());
    }

    #[test]
    fn test_builder_company_domain() {
        let client = PipedriveClient::builder()
            .company_domain("acme")
            .api_token("abcdefghijk")
            .build()
            .unwrap();
        assert_eq!(client.config().base_url.as_str(), "https://acme.pipedrive.com/");
        assert_eq!(client.config().auth_scheme, AuthScheme::ApiToken);
    }
}
