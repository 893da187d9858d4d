use anyhow::Result;
use async_trait::async_trait;

use super::registry::{Command, CommandContext, CommandResult};
use crate::clipboard::ClipboardManager;

pub struct CopyCommand;

#[async_trait]
impl Command for CopyCommand {
    fn name(&self) -> &str {
        "copy"
    }

    fn description(&self) -> &str {
        "Copy the last agent response to the clipboard"
    }

    fn usage(&self) -> &str {
        "/copy\n\nCopies the most recent non-empty agent response."
    }

    async fn execute(&self, context: &mut CommandContext<'_>) -> Result<CommandResult> {
        let Some(response) = context.session.last_response() else {
            context.display.show_info("No agent output to copy yet.");
            return Ok(CommandResult::Success(String::new()));
        };

        ClipboardManager::new().copy_text(response)?;
        Ok(CommandResult::Success(format!(
            "Copied {} characters to the clipboard.",
            response.chars().count()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::Harness;

    #[tokio::test]
    async fn test_copy_without_response_informs() {
        let mut harness = Harness::with_builtins();

        let output = harness.success(&CopyCommand, "").await;

        assert!(output.is_empty());
        assert_eq!(harness.display.infos(), vec!["No agent output to copy yet."]);
    }
}
