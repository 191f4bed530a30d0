//! Configuration types for the Pipedrive SDK.

use crate::error::{PipedriveError, PipedriveResult};
use std::time::Duration;
use tracing::warn;
use url::Url;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF_SECS: f64 = 0.5;
const MAX_RETRY_ATTEMPTS: u32 = 10;
const MAX_RETRY_BACKOFF_SECS: f64 = 5.0;
const MIN_API_TOKEN_LEN: usize = 10;

/// How the API token is attached to requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthScheme {
    /// `api_token` query parameter.
    #[default]
    ApiToken,
    /// `Authorization: Bearer <token>` header.
    Bearer,
}

impl std::str::FromStr for AuthScheme {
    type Err = PipedriveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api_token" | "query" | "" => Ok(Self::ApiToken),
            "bearer" => Ok(Self::Bearer),
            other => Err(PipedriveError::Config(format!(
                "Unknown auth scheme '{other}'. Must be 'api_token' or 'bearer'"
            ))),
        }
    }
}

/// Settings read from `PIPEDRIVE_*` environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_token: String,
    pub company_domain: String,
    /// Overrides `https://{company_domain}.pipedrive.com` when set.
    pub base_url: Option<Url>,
    pub timeout: Duration,
    pub retry_attempts: u32,
    pub retry_backoff: Duration,
    pub verify_ssl: bool,
    pub log_requests: bool,
    pub log_responses: bool,
    pub auth_scheme: AuthScheme,
}

impl Settings {
    pub fn from_env() -> PipedriveResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(env: F) -> PipedriveResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = env("PIPEDRIVE_API_TOKEN").unwrap_or_default();
        if api_token.len() < MIN_API_TOKEN_LEN {
            return Err(PipedriveError::Config(
                "API token is missing or too short".to_string(),
            ));
        }

        let company_domain = env("PIPEDRIVE_COMPANY_DOMAIN").unwrap_or_default();
        if company_domain.is_empty() || company_domain.contains('.') {
            return Err(PipedriveError::Config(
                "Company domain should be provided without TLD (e.g., 'mycompany' not 'mycompany.pipedrive.com')"
                    .to_string(),
            ));
        }

        let base_url = match env("PIPEDRIVE_BASE_URL").filter(|v| !v.is_empty()) {
            Some(raw) if raw.starts_with("http://") || raw.starts_with("https://") => {
                Some(Url::parse(&raw)?)
            }
            Some(_) => {
                return Err(PipedriveError::Config(
                    "Base URL must begin with http:// or https://".to_string(),
                ))
            }
            None => None,
        };

        let timeout_secs = parse_or(&env, "PIPEDRIVE_TIMEOUT", DEFAULT_TIMEOUT_SECS as i64);
        if timeout_secs <= 0 {
            return Err(PipedriveError::Config("Timeout must be positive".to_string()));
        }

        let retry_attempts = parse_or(&env, "PIPEDRIVE_RETRY_ATTEMPTS", DEFAULT_RETRY_ATTEMPTS as i64);
        if retry_attempts < 0 {
            return Err(PipedriveError::Config(
                "Retry attempts cannot be negative".to_string(),
            ));
        }
        if retry_attempts > MAX_RETRY_ATTEMPTS as i64 {
            return Err(PipedriveError::Config(
                "Retry attempts should not exceed 10".to_string(),
            ));
        }

        let retry_backoff = parse_or(&env, "PIPEDRIVE_RETRY_BACKOFF", DEFAULT_RETRY_BACKOFF_SECS);
        if retry_backoff < 0.0 || retry_backoff.is_nan() {
            return Err(PipedriveError::Config(
                "Retry backoff factor cannot be negative".to_string(),
            ));
        }
        if retry_backoff > MAX_RETRY_BACKOFF_SECS {
            return Err(PipedriveError::Config(
                "Retry backoff factor should not exceed 5".to_string(),
            ));
        }

        let flag = |key: &str| env(key).map(|v| v.to_ascii_lowercase());
        let auth_scheme = env("PIPEDRIVE_AUTH_SCHEME")
            .map(|v| v.parse::<AuthScheme>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            api_token,
            company_domain,
            base_url,
            timeout: Duration::from_secs(timeout_secs as u64),
            retry_attempts: retry_attempts as u32,
            retry_backoff: Duration::from_secs_f64(retry_backoff),
            verify_ssl: flag("VERIFY_SSL").as_deref() != Some("false"),
            log_requests: flag("PIPEDRIVE_LOG_REQUESTS").as_deref() == Some("true"),
            log_responses: flag("PIPEDRIVE_LOG_RESPONSES").as_deref() == Some("true"),
            auth_scheme,
        })
    }

    /// `https://{company_domain}.pipedrive.com`, unless overridden.
    pub fn api_root(&self) -> PipedriveResult<Url> {
        match &self.base_url {
            Some(url) => Ok(url.clone()),
            None => Ok(Url::parse(&format!(
                "https://{}.pipedrive.com",
                self.company_domain
            ))?),
        }
    }

    pub fn client_config(&self) -> PipedriveResult<ClientConfig> {
        Ok(ClientConfig {
            base_url: self.api_root()?,
            api_token: self.api_token.clone(),
            auth_scheme: self.auth_scheme,
            timeout: self.timeout,
            retry_config: RetryConfig::with_attempts(self.retry_attempts, self.retry_backoff),
            verify_ssl: self.verify_ssl,
            log_requests: self.log_requests,
            log_responses: self.log_responses,
        })
    }
}

fn parse_or<F, T>(env: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy,
{
    match env(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key = key, value = %raw, "Unparseable setting, using default");
            default
        }),
        None => default,
    }
}

/// Configuration for the Pipedrive client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root of the company API host, without a version prefix.
    pub base_url: Url,
    pub api_token: String,
    pub auth_scheme: AuthScheme,
    /// Request timeout.
    pub timeout: Duration,
    /// Retry configuration.
    pub retry_config: RetryConfig,
    pub verify_ssl: bool,
    /// Log request payloads at debug level.
    pub log_requests: bool,
    /// Log raw response bodies at debug level.
    pub log_responses: bool,
}

impl ClientConfig {
    /// Create a new configuration with the given base URL and token.
    pub fn new(base_url: Url, api_token: impl Into<String>) -> Self {
        Self {
            base_url,
            api_token: api_token.into(),
            auth_scheme: AuthScheme::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry_config: RetryConfig::default(),
            verify_ssl: true,
            log_requests: false,
            log_responses: false,
        }
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries.
    pub max_retries: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub backoff_multiplier: f64,
    /// HTTP status codes to retry on.
    pub retry_on_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_RETRY_ATTEMPTS,
            initial_backoff: Duration::from_secs_f64(DEFAULT_RETRY_BACKOFF_SECS),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            retry_on_status_codes: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    /// Create a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    pub fn with_attempts(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
            ..Default::default()
        }
    }

    /// Calculate backoff duration for a given attempt.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let backoff_ms = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let backoff = Duration::from_millis(backoff_ms as u64);
        std::cmp::min(backoff, self.max_backoff)
    }

    /// Check if a status code should trigger a retry.
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_on_status_codes.contains(&status)
    }
}
