use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::error::AgentError;
use super::sse::{SseDecoder, SseFrame};
use crate::commands::{ClearCommand, Command, CompactCommand};
use crate::console::console;
use crate::plugins::{AgentPlugin, MessageContext, Plugin};
use crate::session::{ConversationTurn, FileContent, Role};
use crate::stream::{EventSender, EventStream, StreamEvent, event_channel};

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;
const COMPACT_INSTRUCTION: &str = "Please provide a concise summary of our conversation so far. \
    Focus on key topics, decisions, and context that would be needed to continue the conversation.";
const EMPTY_SUMMARY: &str = "(No summary generated)";

#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub model: String,
    /// Scheme and host; requests go to `{base_url}/v1/messages`.
    pub base_url: String,
}

impl AnthropicConfig {
    /// Reads `ANTHROPIC_API_KEY` and the optional `ANTHROPIC_BASE_URL`.
    pub fn from_env(model: Option<&str>) -> Result<Self, AgentError> {
        Self::from_values(
            std::env::var("ANTHROPIC_API_KEY").ok(),
            std::env::var("ANTHROPIC_BASE_URL").ok(),
            model,
        )
    }

    pub fn from_values(
        api_key: Option<String>,
        base_url: Option<String>,
        model: Option<&str>,
    ) -> Result<Self, AgentError> {
        let api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(AgentError::MissingApiKey)?;
        let base_url = base_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            api_key,
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
            base_url,
        })
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    messages: Vec<ApiMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageStart {
    message: MessageStartInfo,
}

#[derive(Debug, Deserialize)]
struct MessageStartInfo {
    #[serde(default)]
    usage: SseUsage,
}

#[derive(Debug, Default, Deserialize)]
struct SseUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ContentBlockDelta {
    delta: Delta,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageDelta {
    #[serde(default)]
    usage: Option<SseUsage>,
}

#[derive(Debug, Deserialize)]
struct ErrorEvent {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

fn with_file_blocks(message: &str, files: &[FileContent]) -> String {
    if files.is_empty() {
        return message.to_string();
    }
    let blocks: Vec<String> = files
        .iter()
        .map(|file| format!("<file path=\"{}\">\n{}\n</file>", file.path, file.content))
        .collect();
    format!("{}\n\n{}", blocks.join("\n\n"), message)
}

fn push_merged(messages: &mut Vec<ApiMessage>, role: &'static str, content: String) {
    if let Some(last) = messages.last_mut()
        && last.role == role
    {
        last.content.push_str("\n\n");
        last.content.push_str(&content);
        return;
    }
    messages.push(ApiMessage { role, content });
}

/// Prior turns plus the new message as alternating API messages.
///
/// The API must open with a user message, so assistant turns before the first
/// user turn (a compacted summary) and system turns become the system prompt.
fn build_messages(
    history: &[ConversationTurn],
    message: &str,
    files: &[FileContent],
) -> (Option<String>, Vec<ApiMessage>) {
    let prior = match history.split_last() {
        Some((last, rest)) if last.role == Role::User && last.content == message => rest,
        _ => history,
    };

    let mut context: Vec<String> = Vec::new();
    let mut messages: Vec<ApiMessage> = Vec::new();
    for turn in prior.iter().filter(|turn| !turn.content.is_empty()) {
        match turn.role {
            Role::System => context.push(turn.content.clone()),
            Role::Assistant if messages.is_empty() => context.push(format!(
                "Summary of the conversation so far:\n{}",
                turn.content
            )),
            Role::Assistant => push_merged(&mut messages, "assistant", turn.content.clone()),
            Role::User => push_merged(&mut messages, "user", turn.content.clone()),
        }
    }
    push_merged(&mut messages, "user", with_file_blocks(message, files));

    let system = (!context.is_empty()).then(|| context.join("\n\n"));
    (system, messages)
}

/// Input tokens arrive with `message_start`, output tokens with `message_delta`.
#[derive(Debug, Default)]
struct SseState {
    input_tokens: u64,
}

fn translate(frame: &SseFrame, state: &mut SseState) -> Option<StreamEvent> {
    match frame.event.as_str() {
        "message_start" => {
            if let Ok(start) = serde_json::from_str::<MessageStart>(&frame.data) {
                state.input_tokens = start.message.usage.input_tokens;
            }
            None
        }
        "content_block_delta" => match serde_json::from_str::<ContentBlockDelta>(&frame.data) {
            Ok(block) if block.delta.kind == "text_delta" => block
                .delta
                .text
                .filter(|text| !text.is_empty())
                .map(StreamEvent::text),
            Ok(_) => None,
            Err(e) => Some(StreamEvent::error(format!("Unreadable stream event: {}", e))),
        },
        "message_delta" => {
            let delta = serde_json::from_str::<MessageDelta>(&frame.data).ok()?;
            let usage = delta.usage?;
            Some(StreamEvent::usage(state.input_tokens, usage.output_tokens))
        }
        "error" => Some(StreamEvent::fatal(
            match serde_json::from_str::<ErrorEvent>(&frame.data) {
                Ok(event) => format!("{}: {}", event.error.kind, event.error.message),
                Err(_) => frame.data.clone(),
            },
        )),
        _ => None,
    }
}

async fn forward_events(response: reqwest::Response, tx: EventSender) {
    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::new();
    let mut state = SseState::default();

    while let Some(chunk) = body.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                let _ = tx
                    .send(StreamEvent::fatal(format!("Network error: {}", e)))
                    .await;
                return;
            }
        };
        for frame in decoder.push(&chunk) {
            if let Some(event) = translate(&frame, &mut state)
                && !tx.send(event).await
            {
                return;
            }
        }
    }

    if let Some(frame) = decoder.finish()
        && let Some(event) = translate(&frame, &mut state)
    {
        let _ = tx.send(event).await;
    }
}

/// Claude through the Anthropic Messages API, streamed.
pub struct AnthropicAgent {
    client: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicAgent {
    pub fn new(config: AnthropicConfig) -> Result<Self, AgentError> {
        if config.api_key.trim().is_empty() {
            return Err(AgentError::MissingApiKey);
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AgentError::Client(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn from_env(model: Option<&str>) -> Result<Self, AgentError> {
        Self::new(AnthropicConfig::from_env(model)?)
    }

    fn request(&self, system: Option<String>, messages: Vec<ApiMessage>, stream: bool) -> MessagesRequest {
        MessagesRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: MAX_TOKENS,
            system,
            stream,
        }
    }

    async fn post(&self, request: &MessagesRequest) -> Result<reqwest::Response, AgentError> {
        let url = format!("{}/v1/messages", self.config.base_url);
        console().debug(&format!("POST {} ({} messages)", url, request.messages.len()));

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| AgentError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AgentError::from_status(status.as_u16(), error_text));
        }
        Ok(response)
    }
}

#[async_trait]
impl Plugin for AnthropicAgent {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn description(&self) -> &str {
        "Claude models through the Anthropic Messages API"
    }

    fn commands(&self) -> Vec<Arc<dyn Command>> {
        vec![Arc::new(ClearCommand), Arc::new(CompactCommand)]
    }

    async fn on_load(&self) -> Result<()> {
        console().verbose(&format!("Anthropic agent ready ({})", self.config.model));
        Ok(())
    }

    fn status_hints(&self) -> Vec<String> {
        vec![format!("anthropic: {}", self.config.model)]
    }

    fn as_agent(self: Arc<Self>) -> Option<Arc<dyn AgentPlugin>> {
        Some(self as Arc<dyn AgentPlugin>)
    }
}

#[async_trait]
impl AgentPlugin for AnthropicAgent {
    async fn send(&self, context: MessageContext) -> Result<EventStream> {
        let (system, messages) =
            build_messages(&context.history, &context.message, &context.file_context);
        let response = self.post(&self.request(system, messages, true)).await?;

        let (tx, stream) = event_channel(64);
        tokio::spawn(forward_events(response, tx));
        Ok(stream)
    }

    async fn compact_history(&self, history: &[ConversationTurn]) -> Result<String> {
        let (system, messages) = build_messages(history, COMPACT_INSTRUCTION, &[]);
        let response = self.post(&self.request(system, messages, false)).await?;
        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AgentError::InvalidResponse(e.to_string()))?;

        let summary: String = body
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect();
        let summary = summary.trim();
        Ok(if summary.is_empty() {
            EMPTY_SUMMARY.to_string()
        } else {
            summary.to_string()
        })
    }

    fn default_model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
#[path = "anthropic_tests.rs"]
mod tests;
