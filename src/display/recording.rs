use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use super::Display;
use crate::stream::REJECT_RESPONSE;

/// One call made against a [`RecordingDisplay`].
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    Info(String),
    Error(String),
    Text(String),
    WaitingStarted,
    WaitingStopped,
    LiveStarted,
    LiveAppended(String),
    LiveFinalized,
    ToolUse { name: String, input: serde_json::Value },
    ToolResult { name: String, result: String, is_error: bool },
    Prompt { kind: &'static str, prompt: String, choices: Vec<String> },
}

#[derive(Default)]
struct Recorded {
    events: Vec<DisplayEvent>,
    answers: VecDeque<String>,
    waiting: bool,
}

/// Headless display that records every call and answers prompts from a
/// script. Prompts with no scripted answer left are declined.
#[derive(Default)]
pub struct RecordingDisplay {
    inner: Mutex<Recorded>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answers<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let display = Self::new();
        display.inner().answers = answers.into_iter().map(Into::into).collect();
        display
    }

    fn inner(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, event: DisplayEvent) {
        self.inner().events.push(event);
    }

    fn answer_prompt(&self, kind: &'static str, prompt: &str, choices: &[String]) -> String {
        let mut inner = self.inner();
        inner.events.push(DisplayEvent::Prompt {
            kind,
            prompt: prompt.to_string(),
            choices: choices.to_vec(),
        });
        inner
            .answers
            .pop_front()
            .unwrap_or_else(|| REJECT_RESPONSE.to_string())
    }

    pub fn events(&self) -> Vec<DisplayEvent> {
        self.inner().events.clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.filter(|event| match event {
            DisplayEvent::Error(message) => Some(message.clone()),
            _ => None,
        })
    }

    pub fn infos(&self) -> Vec<String> {
        self.filter(|event| match event {
            DisplayEvent::Info(message) => Some(message.clone()),
            _ => None,
        })
    }

    pub fn texts(&self) -> Vec<String> {
        self.filter(|event| match event {
            DisplayEvent::Text(text) => Some(text.clone()),
            _ => None,
        })
    }

    /// Everything appended to live text regions, concatenated.
    pub fn live_text(&self) -> String {
        self.filter(|event| match event {
            DisplayEvent::LiveAppended(text) => Some(text.clone()),
            _ => None,
        })
        .concat()
    }

    pub fn prompt_count(&self) -> usize {
        self.filter(|event| match event {
            DisplayEvent::Prompt { .. } => Some(()),
            _ => None,
        })
        .len()
    }

    pub fn is_waiting(&self) -> bool {
        self.inner().waiting
    }

    fn filter<T>(&self, pick: impl Fn(&DisplayEvent) -> Option<T>) -> Vec<T> {
        self.inner().events.iter().filter_map(pick).collect()
    }
}

#[async_trait]
impl Display for RecordingDisplay {
    fn show_info(&self, message: &str) {
        self.record(DisplayEvent::Info(message.to_string()));
    }

    fn show_error(&self, message: &str) {
        self.record(DisplayEvent::Error(message.to_string()));
    }

    fn show_text(&self, text: &str) {
        self.record(DisplayEvent::Text(text.to_string()));
    }

    fn start_waiting_indicator(&self) {
        let mut inner = self.inner();
        inner.waiting = true;
        inner.events.push(DisplayEvent::WaitingStarted);
    }

    fn stop_waiting_indicator(&self) {
        let mut inner = self.inner();
        if inner.waiting {
            inner.waiting = false;
            inner.events.push(DisplayEvent::WaitingStopped);
        }
    }

    fn start_live_text(&self) {
        self.record(DisplayEvent::LiveStarted);
    }

    fn append_live_text(&self, text: &str) {
        self.record(DisplayEvent::LiveAppended(text.to_string()));
    }

    fn finalize_live_text(&self) {
        self.record(DisplayEvent::LiveFinalized);
    }

    fn show_tool_use(&self, name: &str, input: &serde_json::Value) {
        self.record(DisplayEvent::ToolUse {
            name: name.to_string(),
            input: input.clone(),
        });
    }

    fn show_tool_result(&self, name: &str, result: &str, is_error: bool) {
        self.record(DisplayEvent::ToolResult {
            name: name.to_string(),
            result: result.to_string(),
            is_error,
        });
    }

    async fn prompt_approval(&self, prompt: &str, choices: &[String]) -> String {
        self.answer_prompt("approval", prompt, choices)
    }

    async fn prompt_choice(&self, prompt: &str, choices: &[String]) -> String {
        self.answer_prompt("choice", prompt, choices)
    }

    async fn prompt_text(&self, prompt: &str) -> String {
        self.answer_prompt("text", prompt, &[])
    }
}
