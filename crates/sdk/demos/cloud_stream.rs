//! Stream events from the cloud agent wrapper.
//!
//! Run with: CLOUD_AGENT_URL=... CLOUD_AGENT_TOKEN=... cargo run --example cloud_stream

use pipedrive_sdk::{CloudAgentClient, ExecRequest, PipedriveError, PipedriveResult};
use tokio_stream::StreamExt;

#[tokio::main]
async fn main() -> PipedriveResult<()> {
    tracing_subscriber::fmt::init();

    let base_url = std::env::var("CLOUD_AGENT_URL")
        .map_err(|_| PipedriveError::Config("CLOUD_AGENT_URL is not set".to_string()))?;
    let token = std::env::var("CLOUD_AGENT_TOKEN")
        .map_err(|_| PipedriveError::Config("CLOUD_AGENT_TOKEN is not set".to_string()))?;
    let client = CloudAgentClient::new(&base_url, token)?;

    let answer = client
        .exec_simple(ExecRequest::new("What is 2+2? Answer with just the number."))
        .await?;
    println!("Answer: {answer}\n");

    let mut events = client
        .exec_stream(ExecRequest::new("Calculate 5 + 7 and explain the result"))
        .await?;
    while let Some(event) = events.next().await {
        let event = event?;
        if event.event == "agent_message_delta" {
            if let Some(delta) = event.data.get("delta").and_then(|d| d.as_str()) {
                print!("{delta}");
            }
        } else {
            println!("[{}] {}", event.event, event.data);
        }
    }
    println!();

    Ok(())
}
