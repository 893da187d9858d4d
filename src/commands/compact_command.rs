use anyhow::{Result, anyhow};
use async_trait::async_trait;

use super::registry::{Command, CommandContext, CommandResult};

pub struct CompactCommand;

#[async_trait]
impl Command for CompactCommand {
    fn name(&self) -> &str {
        "compact"
    }

    fn description(&self) -> &str {
        "Replace conversation history with a summary"
    }

    fn usage(&self) -> &str {
        "/compact\n\nAsks the active agent to summarize the conversation and keeps only the summary."
    }

    async fn execute(&self, context: &mut CommandContext<'_>) -> Result<CommandResult> {
        if context.session.is_empty() {
            return Ok(CommandResult::Success(
                "Nothing to compact.".to_string(),
            ));
        }

        let agent = context
            .plugins
            .agent()
            .ok_or_else(|| anyhow!("No agent available to summarize the conversation"))?;

        let turns = context.session.len();
        let history = context.session.history();
        context.display.start_waiting_indicator();
        let summary = agent.compact_history(&history).await;
        context.display.stop_waiting_indicator();

        context.session.replace_with_summary(summary?);
        Ok(CommandResult::Success(format!(
            "Compacted {} turns into a summary.",
            turns
        )))
    }
}
