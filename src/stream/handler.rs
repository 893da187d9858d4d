use futures::{FutureExt, StreamExt};
use std::collections::HashMap;
use std::future::{self, Future};
use std::panic::AssertUnwindSafe;
use std::pin::{Pin, pin};

use super::events::{EventStream, InputKind, ResponseChannel, REJECT_RESPONSE, StreamEvent};
use crate::console::console;
use crate::display::Display;
use crate::session::{ConversationTurn, Session, TokenUsage, ToolUse};

const STREAM_PANIC_MESSAGE: &str = "Agent stream crashed; keeping the partial response";

/// Why consumption of a stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The agent closed the stream.
    Exhausted,
    /// A fatal `Error` event arrived, or the stream itself panicked.
    FatalError,
    /// The user answered an input request with the reject value.
    Rejected,
    /// The foreground request was interrupted.
    Cancelled,
}

#[derive(Debug)]
pub struct StreamOutcome {
    pub turn: ConversationTurn,
    pub end: StreamEnd,
}

/// Assistant turn under construction.
#[derive(Default)]
struct TurnState {
    buffer: String,
    tool_uses: Vec<ToolUse>,
    pending_tools: HashMap<String, (String, serde_json::Value)>,
    usage: Option<TokenUsage>,
    waiting: bool,
    live_open: bool,
}

/// Consumes one agent invocation's events in arrival order, renders them,
/// runs interactive prompts, and records the resulting assistant turn.
pub struct StreamHandler<'a> {
    display: &'a dyn Display,
    session: &'a mut Session,
}

impl<'a> StreamHandler<'a> {
    pub fn new(display: &'a dyn Display, session: &'a mut Session) -> Self {
        Self { display, session }
    }

    pub async fn handle(self, stream: EventStream) -> ConversationTurn {
        self.handle_until(stream, future::pending::<()>()).await.turn
    }

    /// Like [`StreamHandler::handle`], but stops early once `cancel` completes.
    /// The partial turn is still finalized and recorded.
    pub async fn handle_until<F>(self, mut stream: EventStream, cancel: F) -> StreamOutcome
    where
        F: Future<Output = ()>,
    {
        let mut cancel = pin!(cancel);
        let mut state = TurnState::default();
        self.start_waiting(&mut state);

        let end = loop {
            let event = tokio::select! {
                biased;
                _ = &mut cancel => break StreamEnd::Cancelled,
                next = AssertUnwindSafe(stream.next()).catch_unwind() => match next {
                    Ok(Some(event)) => event,
                    Ok(None) => break StreamEnd::Exhausted,
                    Err(_) => {
                        self.dismiss_waiting(&mut state);
                        self.close_live(&mut state);
                        self.display.show_error(STREAM_PANIC_MESSAGE);
                        break StreamEnd::FatalError;
                    }
                },
            };

            console().debug(&format!("stream event: {}", event.kind()));
            if let Some(end) = self.apply(event, &mut state, cancel.as_mut()).await {
                break end;
            }
        };

        // Drop the producer before rendering the final state.
        drop(stream);
        let turn = self.finalize(state);
        StreamOutcome { turn, end }
    }

    async fn apply<F>(
        &self,
        event: StreamEvent,
        state: &mut TurnState,
        cancel: Pin<&mut F>,
    ) -> Option<StreamEnd>
    where
        F: Future<Output = ()>,
    {
        match event {
            StreamEvent::TextDelta { text } => {
                if !state.live_open {
                    self.dismiss_waiting(state);
                    self.display.start_live_text();
                    state.live_open = true;
                }
                state.buffer.push_str(&text);
                self.display.append_live_text(&text);
                None
            }
            StreamEvent::ToolUseStart { name, id, input } => {
                self.dismiss_waiting(state);
                self.close_live(state);
                self.display.show_tool_use(&name, &input);
                state.pending_tools.insert(id, (name, input));
                None
            }
            StreamEvent::ToolResult {
                name,
                id,
                result,
                is_error,
            } => {
                self.dismiss_waiting(state);
                self.close_live(state);
                self.display.show_tool_result(&name, &result, is_error);
                let input = state
                    .pending_tools
                    .remove(&id)
                    .map(|(_, input)| input)
                    .unwrap_or(serde_json::Value::Null);
                state.tool_uses.push(ToolUse {
                    id,
                    name,
                    input,
                    result,
                    is_error,
                });
                None
            }
            StreamEvent::Usage {
                input_tokens,
                output_tokens,
            } => {
                let usage = TokenUsage::new(input_tokens, output_tokens);
                *state.usage.get_or_insert_with(TokenUsage::default) += usage;
                None
            }
            StreamEvent::Error { message, fatal } => {
                self.dismiss_waiting(state);
                self.close_live(state);
                self.display.show_error(&message);
                fatal.then_some(StreamEnd::FatalError)
            }
            StreamEvent::InputRequest {
                prompt,
                input_type,
                choices,
                response,
            } => {
                self.input_request(state, &prompt, &input_type, &choices, response, cancel)
                    .await
            }
        }
    }

    async fn input_request<F>(
        &self,
        state: &mut TurnState,
        prompt: &str,
        input_type: &str,
        choices: &[String],
        response: Option<ResponseChannel>,
        cancel: Pin<&mut F>,
    ) -> Option<StreamEnd>
    where
        F: Future<Output = ()>,
    {
        // Partial text must be on screen before the prompt takes over.
        self.dismiss_waiting(state);
        self.close_live(state);

        let Some(channel) = response else {
            console().warning(&format!(
                "Agent sent a {} input request without a response channel; ignoring it",
                input_type
            ));
            self.start_waiting(state);
            return None;
        };

        let kind = match InputKind::validate(input_type, choices) {
            Ok(kind) => kind,
            Err(e) => {
                channel.resolve(REJECT_RESPONSE);
                self.display.show_error(&format!("Invalid input request: {}", e));
                return Some(StreamEnd::Rejected);
            }
        };

        let prompt_future = async {
            match kind {
                InputKind::Approval => self.display.prompt_approval(prompt, choices).await,
                InputKind::Choice => self.display.prompt_choice(prompt, choices).await,
                InputKind::Text => self.display.prompt_text(prompt).await,
            }
        };

        let answer = tokio::select! {
            biased;
            _ = cancel => None,
            answer = prompt_future => Some(answer),
        };

        let Some(answer) = answer else {
            channel.resolve(REJECT_RESPONSE);
            return Some(StreamEnd::Cancelled);
        };

        let rejected = answer == REJECT_RESPONSE;
        channel.resolve(answer);
        if rejected {
            return Some(StreamEnd::Rejected);
        }

        self.start_waiting(state);
        None
    }

    fn start_waiting(&self, state: &mut TurnState) {
        if !state.waiting {
            self.display.start_waiting_indicator();
            state.waiting = true;
        }
    }

    fn dismiss_waiting(&self, state: &mut TurnState) {
        if state.waiting {
            self.display.stop_waiting_indicator();
            state.waiting = false;
        }
    }

    fn close_live(&self, state: &mut TurnState) {
        if state.live_open {
            self.display.finalize_live_text();
            state.live_open = false;
        }
    }

    fn finalize(mut self, mut state: TurnState) -> ConversationTurn {
        self.dismiss_waiting(&mut state);
        self.close_live(&mut state);

        if !state.pending_tools.is_empty() {
            console().verbose(&format!(
                "{} tool call(s) ended without a result",
                state.pending_tools.len()
            ));
        }

        let turn = ConversationTurn::assistant(state.buffer, state.tool_uses, state.usage);
        self.session.add_turn(turn.clone());
        if !turn.content.is_empty() {
            self.session.set_last_response(turn.content.clone());
        }
        turn
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
