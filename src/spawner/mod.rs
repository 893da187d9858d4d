use anyhow::{Result, anyhow};
use futures::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::console::console;
use crate::plugins::{AgentPlugin, MessageContext};
use crate::session::{ConversationTurn, FileContent, TokenUsage};
use crate::stream::{REJECT_RESPONSE, StreamEvent};

/// Builds a fresh agent for every spawned session.
pub type AgentFactory = Arc<dyn Fn() -> Result<Arc<dyn AgentPlugin>> + Send + Sync>;

pub type Hook = Box<dyn FnOnce() -> Result<()> + Send>;

pub struct SpawnConfig {
    pub prompt: String,
    pub file_context: Vec<FileContent>,
    pre_hook: Option<Hook>,
    post_hook: Option<Hook>,
}

impl SpawnConfig {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            file_context: Vec::new(),
            pre_hook: None,
            post_hook: None,
        }
    }

    pub fn with_file_context(mut self, file_context: Vec<FileContent>) -> Self {
        self.file_context = file_context;
        self
    }

    /// Runs before the agent is created. A failure aborts the spawn.
    pub fn with_pre_hook(mut self, hook: impl FnOnce() -> Result<()> + Send + 'static) -> Self {
        self.pre_hook = Some(Box::new(hook));
        self
    }

    /// Runs after the agent finishes, whether or not it succeeded.
    pub fn with_post_hook(mut self, hook: impl FnOnce() -> Result<()> + Send + 'static) -> Self {
        self.post_hook = Some(Box::new(hook));
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpawnReport {
    pub events: usize,
    pub text: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("Pre-hook failed: {0:#}")]
    PreHook(anyhow::Error),

    #[error("Could not create agent: {0:#}")]
    AgentFactory(anyhow::Error),

    #[error("Agent failed: {0:#}")]
    Agent(anyhow::Error),
}

/// Runs prompts against isolated agents, sharing nothing with the
/// foreground session.
#[derive(Clone)]
pub struct SessionSpawner {
    factory: AgentFactory,
}

impl SessionSpawner {
    pub fn new(factory: AgentFactory) -> Self {
        Self { factory }
    }

    pub async fn spawn(&self, config: SpawnConfig) -> Result<SpawnReport, SpawnError> {
        let SpawnConfig {
            prompt,
            file_context,
            pre_hook,
            post_hook,
        } = config;

        if let Some(hook) = pre_hook {
            hook().map_err(SpawnError::PreHook)?;
        }

        let outcome = self.run_agent(prompt, file_context).await;

        if let Some(hook) = post_hook
            && let Err(e) = hook()
        {
            console().warning(&format!("Spawned session post-hook failed: {:#}", e));
        }

        match &outcome {
            Ok(report) => console().verbose(&format!(
                "Spawned session finished after {} events",
                report.events
            )),
            Err(e) => console().warning(&format!("Spawned session failed: {}", e)),
        }
        outcome
    }

    /// Run `spawn` on its own task.
    pub fn spawn_background(&self, config: SpawnConfig) -> JoinHandle<Result<SpawnReport, SpawnError>> {
        let spawner = self.clone();
        tokio::spawn(async move { spawner.spawn(config).await })
    }

    async fn run_agent(
        &self,
        prompt: String,
        file_context: Vec<FileContent>,
    ) -> Result<SpawnReport, SpawnError> {
        let agent = (self.factory)().map_err(SpawnError::AgentFactory)?;

        let history = vec![ConversationTurn::user(prompt.clone(), file_context.clone())];
        let context = MessageContext::new(prompt)
            .with_file_context(file_context)
            .with_history(history);
        let mut stream = agent.send(context).await.map_err(SpawnError::Agent)?;

        let mut report = SpawnReport::default();
        while let Some(event) = stream.next().await {
            report.events += 1;
            match event {
                StreamEvent::TextDelta { text } => report.text.push_str(&text),
                StreamEvent::Usage {
                    input_tokens,
                    output_tokens,
                } => report.usage += TokenUsage::new(input_tokens, output_tokens),
                StreamEvent::Error {
                    message,
                    fatal: true,
                } => return Err(SpawnError::Agent(anyhow!(message))),
                StreamEvent::InputRequest { response, .. } => {
                    // Nobody can answer in a background session.
                    if let Some(channel) = response {
                        channel.resolve(REJECT_RESPONSE);
                    }
                }
                StreamEvent::Error { .. }
                | StreamEvent::ToolUseStart { .. }
                | StreamEvent::ToolResult { .. } => {}
            }
        }
        Ok(report)
    }
}
