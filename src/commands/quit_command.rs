use anyhow::Result;
use async_trait::async_trait;

use super::registry::{Command, CommandContext, CommandResult};

pub struct QuitCommand;

#[async_trait]
impl Command for QuitCommand {
    fn name(&self) -> &str {
        "quit"
    }

    fn description(&self) -> &str {
        "Exit the application"
    }

    fn usage(&self) -> &str {
        "/quit\n\nEnds the session."
    }

    fn pinned(&self) -> bool {
        true
    }

    async fn execute(&self, _context: &mut CommandContext<'_>) -> Result<CommandResult> {
        Ok(CommandResult::Exit)
    }
}
