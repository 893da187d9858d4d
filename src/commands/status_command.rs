use anyhow::Result;
use async_trait::async_trait;

use super::registry::{Command, CommandContext, CommandResult};

pub struct StatusCommand;

#[async_trait]
impl Command for StatusCommand {
    fn name(&self) -> &str {
        "status"
    }

    fn description(&self) -> &str {
        "Show current session status"
    }

    fn usage(&self) -> &str {
        "/status\n\nDisplays the conversation length, token usage, active agent and plugin hints."
    }

    async fn execute(&self, context: &mut CommandContext<'_>) -> Result<CommandResult> {
        let mut status = String::from("Session Status\n\n");

        let stats = context.session.stats();
        status.push_str(&format!("Conversation Turns: {}\n", context.session.len()));
        status.push_str(&format!(
            "Tokens: {} in / {} out\n",
            stats.input_tokens, stats.output_tokens
        ));

        match context.plugins.agent() {
            Some(agent) => {
                let model = context
                    .config
                    .default_model
                    .as_deref()
                    .unwrap_or_else(|| agent.default_model());
                status.push_str(&format!("Agent: {} ({})\n", agent.name(), model));
            }
            None => status.push_str("Agent: none\n"),
        }

        status.push_str(&format!(
            "Audit: {}\n",
            context
                .audit
                .path()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "off".to_string())
        ));

        for hint in context.plugins.status_hints() {
            status.push_str(&format!("{}\n", hint));
        }

        Ok(CommandResult::Success(status))
    }
}
