use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::commands::Command;
use crate::session::{ConversationTurn, FileContent};
use crate::stream::EventStream;

/// What an agent receives for one user message.
#[derive(Debug, Clone, Default)]
pub struct MessageContext {
    pub message: String,
    pub file_context: Vec<FileContent>,
    /// Prior turns, including the user turn for `message`.
    pub history: Vec<ConversationTurn>,
}

impl MessageContext {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_file_context(mut self, file_context: Vec<FileContent>) -> Self {
        self.file_context = file_context;
        self
    }

    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.history = history;
        self
    }
}

#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Slash commands merged into the command registry on registration.
    fn commands(&self) -> Vec<Arc<dyn Command>> {
        Vec::new()
    }

    async fn on_load(&self) -> Result<()> {
        Ok(())
    }

    async fn on_unload(&self) -> Result<()> {
        Ok(())
    }

    /// Short lines shown by `/status`.
    fn status_hints(&self) -> Vec<String> {
        Vec::new()
    }

    /// The agent capability of this plugin, if it has one. Checked once when
    /// the plugin is registered.
    fn as_agent(self: Arc<Self>) -> Option<Arc<dyn AgentPlugin>> {
        None
    }
}

#[async_trait]
pub trait AgentPlugin: Plugin {
    /// Start one invocation. Failures to start are returned here; failures
    /// after the stream opens arrive as `Error` events.
    async fn send(&self, context: MessageContext) -> Result<EventStream>;

    async fn compact_history(&self, history: &[ConversationTurn]) -> Result<String>;

    fn default_model(&self) -> &str;
}
