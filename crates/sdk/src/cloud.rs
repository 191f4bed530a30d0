//! Client for the cloud agent wrapper's Server-Sent Events endpoint.
//!
//! ```no_run
//! use pipedrive_sdk::cloud::{CloudAgentClient, ExecRequest};
//! use tokio_stream::StreamExt;
//!
//! # async fn run() -> pipedrive_sdk::PipedriveResult<()> {
//! let client = CloudAgentClient::new("https://agent.example.run.app", "identity-token")?;
//! let mut events = client.exec_stream(ExecRequest::new("What is 2+2?")).await?;
//! while let Some(event) = events.next().await {
//!     let event = event?;
//!     println!("[{}] {}", event.event, event.data);
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{PipedriveError, PipedriveResult};
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info};
use url::Url;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_EXEC_TIMEOUT_MS: u64 = 60_000;
const UNKNOWN_EVENT: &str = "unknown";
const EVENT_BUFFER: usize = 64;

/// Body of an `exec/stream` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecRequest {
    pub prompt: String,
    pub model: String,
    pub timeout_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl ExecRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: DEFAULT_MODEL.to_string(),
            timeout_ms: DEFAULT_EXEC_TIMEOUT_MS,
            session_id: None,
        }
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// One decoded SSE message. `data` is a JSON string when the payload
/// was not valid JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    pub event: String,
    pub data: Value,
}

/// Events in arrival order. Single consumer.
pub type EventStream = ReceiverStream<PipedriveResult<StreamEvent>>;

/// Line-oriented SSE decoder.
///
/// The event name set by an `event:` line applies to every following
/// `data:` line until the next `event:` line.
#[derive(Debug, Default)]
pub struct SseParser {
    current_event: Option<String>,
    buffer: Vec<u8>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one line. Returns an event for `data:` lines only.
    pub fn parse_line(&mut self, line: &str) -> Option<StreamEvent> {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            return None;
        }
        if let Some(name) = line.strip_prefix("event:") {
            self.current_event = Some(name.trim().to_string());
            return None;
        }
        let raw = line.strip_prefix("data:")?.trim();
        let data = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        let event = self
            .current_event
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_EVENT.to_string());
        Some(StreamEvent { event, data })
    }

    /// Append a chunk and decode every complete line in it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            match std::str::from_utf8(&line[..newline]) {
                Ok(text) => events.extend(self.parse_line(text)),
                Err(e) => debug!(error = %e, "Skipping non UTF-8 stream line"),
            }
        }
        events
    }

    /// Decode whatever is left once the body ends without a final newline.
    pub fn finish(&mut self) -> Option<StreamEvent> {
        let rest = std::mem::take(&mut self.buffer);
        let text = String::from_utf8(rest).ok()?;
        self.parse_line(&text)
    }
}

/// Fold events into the last message the agent produced.
///
/// `agent_message` and `agent_output` carry `data.message`. `task_complete`
/// carries `data.last_agent_message`, which wins when non-empty.
pub fn final_message<'a>(events: impl IntoIterator<Item = &'a StreamEvent>) -> String {
    let mut message = String::new();
    for event in events {
        apply_event(&mut message, event);
    }
    message
}

fn apply_event(message: &mut String, event: &StreamEvent) {
    match event.event.as_str() {
        "agent_message" | "agent_output" => {
            if let Some(text) = event.data.get("message").and_then(Value::as_str) {
                *message = text.to_string();
            }
        }
        "task_complete" => {
            if let Some(text) = event
                .data
                .get("last_agent_message")
                .and_then(Value::as_str)
                .filter(|text| !text.is_empty())
            {
                *message = text.to_string();
            }
        }
        _ => {}
    }
}

/// Client for the cloud agent wrapper.
#[derive(Debug, Clone)]
pub struct CloudAgentClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl CloudAgentClient {
    pub fn new(base_url: &str, token: impl Into<String>) -> PipedriveResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(PipedriveError::Config(
                "Cloud agent identity token is required.".to_string(),
            ));
        }
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            token,
        })
    }

    fn exec_url(&self) -> PipedriveResult<Url> {
        let root = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{root}/api/v1/exec/stream"))?)
    }

    /// Start an execution and stream its events.
    ///
    /// Fails up front on a non-success status. Transport errors after the
    /// response started arrive as `Err` items and end the stream.
    pub async fn exec_stream(&self, request: ExecRequest) -> PipedriveResult<EventStream> {
        let url = self.exec_url()?;
        info!(model = %request.model, session_id = ?request.session_id, "Starting cloud execution");

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "Cloud execution rejected");
            return Err(PipedriveError::from_response(status.as_u16(), &body));
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(async move {
            let mut parser = SseParser::new();
            let mut body = response.bytes_stream();

            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(bytes) => {
                        for event in parser.feed(&bytes) {
                            if tx.send(Ok(event)).await.is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx
                            .send(Err(PipedriveError::Stream(e.to_string())))
                            .await;
                        return;
                    }
                }
            }

            if let Some(event) = parser.finish() {
                let _ = tx.send(Ok(event)).await;
            }
            debug!("Cloud event stream finished");
        });

        Ok(ReceiverStream::new(rx))
    }

    /// Run a prompt to completion and return the final agent message.
    pub async fn exec_simple(&self, request: ExecRequest) -> PipedriveResult<String> {
        let mut events = self.exec_stream(request).await?;
        let mut message = String::new();
        while let Some(event) = events.next().await {
            apply_event(&mut message, &event?);
        }
        Ok(message)
    }
}
