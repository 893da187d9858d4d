use anyhow::Result;
use async_trait::async_trait;

use super::registry::{Command, CommandContext, CommandResult};

pub struct ClearCommand;

#[async_trait]
impl Command for ClearCommand {
    fn name(&self) -> &str {
        "clear"
    }

    fn description(&self) -> &str {
        "Clear conversation history"
    }

    fn usage(&self) -> &str {
        "/clear\n\nClears the current conversation history, starting a fresh session."
    }

    async fn execute(&self, context: &mut CommandContext<'_>) -> Result<CommandResult> {
        context.session.clear();
        Ok(CommandResult::Success("Conversation cleared.".to_string()))
    }
}
