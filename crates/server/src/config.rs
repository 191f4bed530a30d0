use anyhow::{Context, Result};
use pipedrive_core::session::DEFAULT_SESSION_TTL_HOURS;
use pipedrive_core::SessionManager;
use pipedrive_mcp::ToolRegistry;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub sessions: SessionsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: i64,
}

fn default_ttl_hours() -> i64 {
    DEFAULT_SESSION_TTL_HOURS
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_ttl_hours(),
        }
    }
}

impl ServerConfig {
    /// Load the TOML config file, or the defaults when no file is given.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let Some(config_path) = config_path else {
            return Ok(Self::default());
        };
        if !config_path.exists() {
            tracing::info!(path = %config_path.display(), "Configuration file not found, using defaults");
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(config_path).context("Failed to read configuration file")?;
        let config: Self = toml::from_str(&content).context("Failed to parse configuration file")?;
        if config.sessions.ttl_hours <= 0 {
            anyhow::bail!("sessions.ttl_hours must be positive");
        }
        Ok(config)
    }
}

/// Application state shared across handlers
pub struct AppState {
    pub sessions: SessionManager,
    pub registry: Arc<ToolRegistry>,
}

impl AppState {
    pub fn new(config: &ServerConfig, registry: ToolRegistry) -> Self {
        Self {
            sessions: SessionManager::with_ttl_hours(config.sessions.ttl_hours),
            registry: Arc::new(registry),
        }
    }
}
