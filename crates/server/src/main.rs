use anyhow::{Context, Result};
use clap::Parser;
use pipedrive_core::feature_config::DEFAULT_FEATURE_CONFIG_PATH;
use pipedrive_core::FeatureConfig;
use pipedrive_mcp::tools::{register_all, ToolRegistry};
use pipedrive_sdk::{PipedriveClient, Settings};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod api;
mod config;

use config::{AppState, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "pipedrive-server")]
#[command(about = "HTTP surface for the Pipedrive CRM tools", long_about = None)]
struct Args {
    /// Path to an optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Feature configuration file
    #[arg(long, env = "FEATURE_CONFIG_PATH", default_value = DEFAULT_FEATURE_CONFIG_PATH)]
    feature_config: PathBuf,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8152")]
    port: u16,

    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_file(true)
            .with_line_number(true)
            .init();
    }

    let args = Args::parse();

    tracing::info!("Starting Pipedrive tool server");

    let config = ServerConfig::load(args.config.as_deref())?;

    let settings = Settings::from_env().context("Invalid Pipedrive settings")?;
    let client = PipedriveClient::from_settings(&settings)
        .context("Failed to build the Pipedrive client")?;

    let mut registry = ToolRegistry::new();
    register_all(&mut registry, &client).context("Failed to register tools")?;
    let source = FeatureConfig::new(args.feature_config.clone()).load(registry.features_mut());
    tracing::info!(source = ?source, "{}", registry.features());

    let state = AppState::new(&config, registry);

    let addr = format!("{}:{}", args.host, args.port);
    tracing::info!("Starting API server on {}", addr);

    api::serve(&addr, state).await?;

    Ok(())
}
