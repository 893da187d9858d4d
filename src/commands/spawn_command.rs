use anyhow::{Result, bail};
use async_trait::async_trait;

use super::registry::{Command, CommandContext, CommandResult};
use crate::spawner::SpawnConfig;

pub struct SpawnCommand;

#[async_trait]
impl Command for SpawnCommand {
    fn name(&self) -> &str {
        "spawn"
    }

    fn description(&self) -> &str {
        "Run a prompt in a separate background session"
    }

    fn usage(&self) -> &str {
        "/spawn <prompt>\n\nThe background session gets its own agent and history; results are logged when it finishes."
    }

    async fn execute(&self, context: &mut CommandContext<'_>) -> Result<CommandResult> {
        if context.args.is_empty() {
            bail!("Usage: /spawn <prompt>");
        }
        let Some(spawner) = context.spawner else {
            bail!("Background sessions are not available without an agent");
        };

        // Detached; the spawner reports the outcome.
        drop(spawner.spawn_background(SpawnConfig::new(context.args.clone())));

        Ok(CommandResult::Success(
            "Started a background session.".to_string(),
        ))
    }
}
