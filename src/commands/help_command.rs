use anyhow::Result;
use async_trait::async_trait;

use super::registry::{Command, CommandContext, CommandResult};

pub struct HelpCommand;

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &str {
        "help"
    }

    fn description(&self) -> &str {
        "Show available commands and usage"
    }

    fn usage(&self) -> &str {
        "/help [command]\n\nShow help for all commands or a specific command."
    }

    async fn execute(&self, context: &mut CommandContext<'_>) -> Result<CommandResult> {
        let topic = context.argv.first().map(String::as_str);
        Ok(CommandResult::Success(
            context.plugins.commands().get_help(topic),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::Harness;

    #[tokio::test]
    async fn test_help_lists_every_command() {
        let mut harness = Harness::with_builtins();
        let output = harness.success(&HelpCommand, "").await;

        for name in ["audit", "copy", "help", "quit", "spawn", "status", "version"] {
            assert!(output.contains(&format!("/{}", name)), "missing /{}", name);
        }
    }

    #[tokio::test]
    async fn test_help_for_one_command_shows_usage() {
        let mut harness = Harness::with_builtins();
        let output = harness.success(&HelpCommand, "spawn").await;

        assert!(output.starts_with("/spawn - "));
        assert!(output.contains("Usage: /spawn <prompt>"));
    }
}
