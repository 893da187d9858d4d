use anyhow::Result;
use async_trait::async_trait;
use futures::stream;
use serde_json::json;
use std::sync::Arc;

use crate::commands::{ClearCommand, Command, CompactCommand};
use crate::console::console;
use crate::plugins::{AgentPlugin, MessageContext, Plugin};
use crate::session::{ConversationTurn, FileContent};
use crate::stream::{APPROVE_RESPONSE, EventStream, REJECT_RESPONSE, StreamEvent, event_channel};

const CONFIRM_PREFIX: &str = "confirm ";
const SUMMARY_LINE_CHARS: usize = 80;

/// Offline agent that repeats the message back, word by word.
#[derive(Debug, Default)]
pub struct EchoAgent;

impl EchoAgent {
    pub fn new() -> Self {
        Self
    }
}

fn echo_events(message: &str) -> Vec<StreamEvent> {
    let mut events: Vec<StreamEvent> = message
        .split_inclusive(' ')
        .map(StreamEvent::text)
        .collect();
    let tokens = message.chars().count() as u64;
    events.push(StreamEvent::usage(tokens, tokens));
    events
}

fn file_events(files: &[FileContent]) -> Vec<StreamEvent> {
    files
        .iter()
        .enumerate()
        .flat_map(|(index, file)| {
            let id = format!("read_{}", index + 1);
            [
                StreamEvent::ToolUseStart {
                    name: "read_file".to_string(),
                    id: id.clone(),
                    input: json!({ "path": file.path }),
                },
                StreamEvent::ToolResult {
                    name: "read_file".to_string(),
                    id,
                    result: format!("{} lines", file.content.lines().count()),
                    is_error: false,
                },
            ]
        })
        .collect()
}

#[async_trait]
impl Plugin for EchoAgent {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Repeats messages back without calling a model"
    }

    fn commands(&self) -> Vec<Arc<dyn Command>> {
        vec![Arc::new(ClearCommand), Arc::new(CompactCommand)]
    }

    async fn on_load(&self) -> Result<()> {
        console().verbose("Echo agent ready");
        Ok(())
    }

    fn status_hints(&self) -> Vec<String> {
        vec!["echo: replies with your own words".to_string()]
    }

    fn as_agent(self: Arc<Self>) -> Option<Arc<dyn AgentPlugin>> {
        Some(self as Arc<dyn AgentPlugin>)
    }
}

#[async_trait]
impl AgentPlugin for EchoAgent {
    async fn send(&self, context: MessageContext) -> Result<EventStream> {
        let mut events = file_events(&context.file_context);
        let message = context.message;

        let Some(action) = message.strip_prefix(CONFIRM_PREFIX) else {
            events.extend(echo_events(&message));
            return Ok(Box::pin(stream::iter(events)));
        };

        // Asking needs a producer that can wait for the answer.
        let prompt = format!("Allow \"{}\"?", action);
        let (tx, stream) = event_channel(16);
        tokio::spawn(async move {
            for event in events {
                if !tx.send(event).await {
                    return;
                }
            }
            let answer = tx
                .ask(
                    prompt,
                    "approval",
                    vec![APPROVE_RESPONSE.to_string(), REJECT_RESPONSE.to_string()],
                )
                .await;
            if answer == REJECT_RESPONSE {
                return;
            }
            for event in echo_events(&message) {
                if !tx.send(event).await {
                    return;
                }
            }
        });
        Ok(stream)
    }

    async fn compact_history(&self, history: &[ConversationTurn]) -> Result<String> {
        let mut summary = format!("Summary of {} earlier turns:", history.len());
        for turn in history {
            let line: String = turn.content.chars().take(SUMMARY_LINE_CHARS).collect();
            summary.push_str(&format!("\n- {}: {}", turn.role, line));
        }
        Ok(summary)
    }

    fn default_model(&self) -> &str {
        "echo-1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;
    use futures::StreamExt;

    async fn collect(context: MessageContext) -> Vec<StreamEvent> {
        EchoAgent::new().send(context).await.unwrap().collect().await
    }

    fn text_of(events: &[StreamEvent]) -> String {
        events
            .iter()
            .filter_map(|event| match event {
                StreamEvent::TextDelta { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_echo_streams_words_then_usage() {
        let events = collect(MessageContext::new("ship the release")).await;

        assert_eq!(text_of(&events), "ship the release");
        assert_eq!(events.len(), 4);
        assert!(matches!(
            events.last(),
            Some(StreamEvent::Usage {
                input_tokens: 16,
                output_tokens: 16
            })
        ));
    }

    #[tokio::test]
    async fn test_file_context_is_acknowledged_as_tool_calls() {
        let context = MessageContext::new("review").with_file_context(vec![FileContent {
            path: "src/lib.rs".to_string(),
            content: "a\nb\nc\n".to_string(),
        }]);

        let events = collect(context).await;

        assert_eq!(events[0].kind(), "tool_use_start");
        match &events[1] {
            StreamEvent::ToolResult { name, id, result, .. } => {
                assert_eq!(name, "read_file");
                assert_eq!(id, "read_1");
                assert_eq!(result, "3 lines");
            }
            other => panic!("expected tool result, got {:?}", other.kind()),
        }
    }

    #[tokio::test]
    async fn test_confirm_waits_for_approval() {
        let mut stream = EchoAgent::new()
            .send(MessageContext::new("confirm drop table"))
            .await
            .unwrap();

        let Some(StreamEvent::InputRequest {
            input_type,
            choices,
            response: Some(channel),
            ..
        }) = stream.next().await
        else {
            panic!("expected an input request first");
        };
        assert_eq!(input_type, "approval");
        assert_eq!(choices, vec!["approve", "reject"]);

        channel.resolve("approve");
        let rest: Vec<StreamEvent> = stream.collect().await;
        assert_eq!(text_of(&rest), "confirm drop table");
    }

    #[tokio::test]
    async fn test_confirm_rejected_ends_stream() {
        let mut stream = EchoAgent::new()
            .send(MessageContext::new("confirm drop table"))
            .await
            .unwrap();

        let Some(StreamEvent::InputRequest {
            response: Some(channel),
            ..
        }) = stream.next().await
        else {
            panic!("expected an input request first");
        };
        channel.resolve(REJECT_RESPONSE);

        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_compact_history_mentions_every_turn() {
        let history = vec![
            ConversationTurn::user("deploy to staging", vec![]),
            ConversationTurn::assistant("deployed", vec![], None),
        ];

        let summary = EchoAgent::new().compact_history(&history).await.unwrap();

        assert!(summary.starts_with("Summary of 2 earlier turns:"));
        assert!(summary.contains(&format!("{}: deploy to staging", Role::User)));
        assert!(summary.contains("deployed"));
    }
}
