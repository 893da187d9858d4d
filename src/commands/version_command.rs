use anyhow::Result;
use async_trait::async_trait;

use super::registry::{Command, CommandContext, CommandResult};

pub struct VersionCommand;

#[async_trait]
impl Command for VersionCommand {
    fn name(&self) -> &str {
        "version"
    }

    fn description(&self) -> &str {
        "Show the application version"
    }

    fn usage(&self) -> &str {
        "/version\n\nAlso available as `--command version`."
    }

    fn cli_exposed(&self) -> bool {
        true
    }

    async fn execute(&self, context: &mut CommandContext<'_>) -> Result<CommandResult> {
        Ok(CommandResult::Success(format!(
            "{} {}",
            context.config.app_name,
            env!("CARGO_PKG_VERSION")
        )))
    }
}
