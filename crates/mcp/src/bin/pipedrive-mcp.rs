// Standalone MCP server binary

use anyhow::{Context, Result};
use pipedrive_core::FeatureConfig;
use pipedrive_mcp::server::McpServer;
use pipedrive_mcp::tools::{register_all, ToolRegistry};
use pipedrive_sdk::{PipedriveClient, Settings};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Stdout carries the protocol, so logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    tracing::info!("Pipedrive MCP server starting...");

    let settings = Settings::from_env().context("Invalid Pipedrive settings")?;
    let client = PipedriveClient::from_settings(&settings)
        .context("Failed to build the Pipedrive client")?;

    let mut registry = ToolRegistry::new();
    register_all(&mut registry, &client).context("Failed to register tools")?;

    let feature_config = FeatureConfig::from_env();
    let source = feature_config.load(registry.features_mut());
    let enabled = registry.features().get_enabled_features();
    tracing::info!(
        source = ?source,
        path = %feature_config.path().display(),
        features = ?enabled.keys().collect::<Vec<_>>(),
        "Loaded feature configuration"
    );
    tracing::info!(
        "Registered {} tools, {} enabled",
        registry.len(),
        registry.list_schemas().len()
    );

    let server = McpServer::new(registry);
    server.start().await?;

    Ok(())
}
