use futures::Stream;
use std::fmt;
use std::pin::Pin;
use std::str::FromStr;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// The value that declines an interactive prompt and ends the stream.
pub const REJECT_RESPONSE: &str = "reject";

/// What an approval prompt answers when the user accepts, whatever the
/// choice labels say.
pub const APPROVE_RESPONSE: &str = "approve";

/// Ordered, single-consumption sequence of events from one agent invocation.
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

#[derive(Debug)]
pub enum StreamEvent {
    TextDelta {
        text: String,
    },
    ToolUseStart {
        name: String,
        id: String,
        input: serde_json::Value,
    },
    ToolResult {
        name: String,
        id: String,
        result: String,
        is_error: bool,
    },
    Usage {
        input_tokens: u64,
        output_tokens: u64,
    },
    Error {
        message: String,
        fatal: bool,
    },
    /// The agent pauses until the user answers. `input_type` is validated by
    /// the consumer against [`InputKind`].
    InputRequest {
        prompt: String,
        input_type: String,
        choices: Vec<String>,
        response: Option<ResponseChannel>,
    },
}

impl StreamEvent {
    pub fn text(text: impl Into<String>) -> Self {
        StreamEvent::TextDelta { text: text.into() }
    }

    pub fn usage(input_tokens: u64, output_tokens: u64) -> Self {
        StreamEvent::Usage {
            input_tokens,
            output_tokens,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        StreamEvent::Error {
            message: message.into(),
            fatal: false,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        StreamEvent::Error {
            message: message.into(),
            fatal: true,
        }
    }

    /// Build an input request together with the receiver the producer awaits.
    pub fn input_request(
        prompt: impl Into<String>,
        input_type: impl Into<String>,
        choices: Vec<String>,
    ) -> (Self, ResponseReceiver) {
        let (channel, receiver) = ResponseChannel::pair();
        let event = StreamEvent::InputRequest {
            prompt: prompt.into(),
            input_type: input_type.into(),
            choices,
            response: Some(channel),
        };
        (event, receiver)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::TextDelta { .. } => "text_delta",
            StreamEvent::ToolUseStart { .. } => "tool_use_start",
            StreamEvent::ToolResult { .. } => "tool_result",
            StreamEvent::Usage { .. } => "usage",
            StreamEvent::Error { .. } => "error",
            StreamEvent::InputRequest { .. } => "input_request",
        }
    }
}

/// UI-side half of a one-shot answer to an [`StreamEvent::InputRequest`].
///
/// Resolving consumes the channel, so a second answer cannot be sent.
#[derive(Debug)]
pub struct ResponseChannel {
    tx: oneshot::Sender<String>,
}

/// Agent-side half of a [`ResponseChannel`].
#[derive(Debug)]
pub struct ResponseReceiver {
    rx: oneshot::Receiver<String>,
}

impl ResponseChannel {
    pub fn pair() -> (ResponseChannel, ResponseReceiver) {
        let (tx, rx) = oneshot::channel();
        (ResponseChannel { tx }, ResponseReceiver { rx })
    }

    pub fn resolve(self, value: impl Into<String>) {
        // The producer may already be gone (stream dropped); nothing waits then.
        let _ = self.tx.send(value.into());
    }
}

impl ResponseReceiver {
    /// Wait for the answer. A channel dropped without an answer reads as a
    /// rejection.
    pub async fn response(self) -> String {
        self.rx
            .await
            .unwrap_or_else(|_| REJECT_RESPONSE.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Binary yes/no over exactly two choices.
    Approval,
    /// N-way selection.
    Choice,
    /// Free-form entry.
    Text,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::Approval => write!(f, "approval"),
            InputKind::Choice => write!(f, "choice"),
            InputKind::Text => write!(f, "text"),
        }
    }
}

impl FromStr for InputKind {
    type Err = InputRequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approval" => Ok(InputKind::Approval),
            "choice" => Ok(InputKind::Choice),
            "text" => Ok(InputKind::Text),
            other => Err(InputRequestError::UnknownInputType(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputRequestError {
    #[error("Unknown input type '{0}' (expected approval, choice or text)")]
    UnknownInputType(String),

    #[error("Approval requests need exactly 2 choices, got {0}")]
    ApprovalChoiceCount(usize),
}

impl InputKind {
    /// Parse and check an input request's type against its choices.
    pub fn validate(input_type: &str, choices: &[String]) -> Result<Self, InputRequestError> {
        let kind = input_type.parse::<InputKind>()?;
        if kind == InputKind::Approval && choices.len() != 2 {
            return Err(InputRequestError::ApprovalChoiceCount(choices.len()));
        }
        Ok(kind)
    }
}

/// Producer half of an agent event stream backed by a channel.
///
/// Agents that need to await prompt answers run their logic on a task and
/// push events here; the paired [`EventStream`] ends when every sender drops.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<StreamEvent>,
}

impl EventSender {
    /// Returns false once the consumer has stopped reading.
    pub async fn send(&self, event: StreamEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }

    /// Emit an input request and wait for the answer. A consumer that is gone
    /// answers with a rejection.
    pub async fn ask(
        &self,
        prompt: impl Into<String>,
        input_type: impl Into<String>,
        choices: Vec<String>,
    ) -> String {
        let (event, receiver) = StreamEvent::input_request(prompt, input_type, choices);
        if !self.send(event).await {
            return REJECT_RESPONSE.to_string();
        }
        receiver.response().await
    }
}

pub fn event_channel(buffer: usize) -> (EventSender, EventStream) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let stream = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (event, rx))
    });
    (EventSender { tx }, Box::pin(stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_approval_requires_two_choices() {
        let one = vec!["yes".to_string()];
        let two = vec!["yes".to_string(), "no".to_string()];

        assert_eq!(
            InputKind::validate("approval", &one),
            Err(InputRequestError::ApprovalChoiceCount(1))
        );
        assert_eq!(InputKind::validate("approval", &two), Ok(InputKind::Approval));
        assert_eq!(InputKind::validate("choice", &one), Ok(InputKind::Choice));
        assert_eq!(InputKind::validate("text", &[]), Ok(InputKind::Text));
    }

    #[test]
    fn test_unknown_input_type_is_rejected() {
        assert!(matches!(
            InputKind::validate("slider", &[]),
            Err(InputRequestError::UnknownInputType(t)) if t == "slider"
        ));
    }

    #[tokio::test]
    async fn test_response_channel_delivers_value() {
        let (channel, receiver) = ResponseChannel::pair();
        channel.resolve("approve");
        assert_eq!(receiver.response().await, "approve");
    }

    #[tokio::test]
    async fn test_dropped_channel_reads_as_reject() {
        let (channel, receiver) = ResponseChannel::pair();
        drop(channel);
        assert_eq!(receiver.response().await, REJECT_RESPONSE);
    }

    #[tokio::test]
    async fn test_event_channel_preserves_order_and_ends() {
        let (sender, mut stream) = event_channel(4);
        tokio::spawn(async move {
            sender.send(StreamEvent::text("a")).await;
            sender.send(StreamEvent::text("b")).await;
        });

        let mut texts = Vec::new();
        while let Some(event) = stream.next().await {
            if let StreamEvent::TextDelta { text } = event {
                texts.push(text);
            }
        }
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_ask_after_consumer_dropped_is_reject() {
        let (sender, stream) = event_channel(1);
        drop(stream);
        let answer = sender.ask("Proceed?", "text", Vec::new()).await;
        assert_eq!(answer, REJECT_RESPONSE);
    }
}
