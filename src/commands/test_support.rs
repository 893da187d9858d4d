use anyhow::Result;
use std::sync::Arc;

use super::{Command, CommandContext, CommandRegistry, CommandResult, register_builtin_commands};
use crate::agents::{EchoAgent, echo_factory};
use crate::audit::AuditLogger;
use crate::config::AppConfig;
use crate::display::RecordingDisplay;
use crate::plugins::PluginRegistry;
use crate::session::Session;
use crate::spawner::SessionSpawner;

/// Owns everything a `CommandContext` borrows.
pub(crate) struct Harness {
    pub display: RecordingDisplay,
    pub session: Session,
    pub plugins: PluginRegistry,
    pub config: AppConfig,
    pub spawner: Option<SessionSpawner>,
    pub audit: AuditLogger,
}

impl Harness {
    pub fn with_builtins() -> Self {
        let mut commands = CommandRegistry::new();
        register_builtin_commands(&mut commands);
        Self {
            display: RecordingDisplay::new(),
            session: Session::new(),
            plugins: PluginRegistry::new(commands),
            config: AppConfig::default(),
            spawner: None,
            audit: AuditLogger::new(".agent-repl-test-audit"),
        }
    }

    pub fn with_echo_agent() -> Self {
        let mut harness = Self::with_builtins();
        harness
            .plugins
            .register(Arc::new(EchoAgent::new()))
            .unwrap();
        harness.spawner = Some(SessionSpawner::new(echo_factory()));
        harness
    }

    pub async fn run(&mut self, command: &dyn Command, args: &str) -> Result<CommandResult> {
        let mut context = CommandContext::new(
            args,
            &self.display,
            &mut self.session,
            &self.plugins,
            &self.config,
            &mut self.audit,
        )
        .with_spawner(self.spawner.as_ref());
        command.execute(&mut context).await
    }

    pub async fn success(&mut self, command: &dyn Command, args: &str) -> String {
        match self.run(command, args).await.unwrap() {
            CommandResult::Success(output) => output,
            CommandResult::Exit => panic!("unexpected exit from /{}", command.name()),
        }
    }
}
