use anyhow::Result;
use async_trait::async_trait;

use super::registry::{Command, CommandContext, CommandResult};

pub struct AuditCommand;

#[async_trait]
impl Command for AuditCommand {
    fn name(&self) -> &str {
        "audit"
    }

    fn description(&self) -> &str {
        "Toggle the session audit log"
    }

    fn usage(&self) -> &str {
        "/audit\n\nStarts writing a timestamped transcript of the session, or stops it if running."
    }

    async fn execute(&self, context: &mut CommandContext<'_>) -> Result<CommandResult> {
        if context.audit.is_active() {
            context.audit.stop();
            return Ok(CommandResult::Success("Audit log stopped.".to_string()));
        }

        let path = context.audit.start()?;
        Ok(CommandResult::Success(format!(
            "Audit log started: {}",
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLogger;
    use crate::commands::test_support::Harness;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_audit_toggles() {
        let dir = TempDir::new().unwrap();
        let mut harness = Harness::with_builtins();
        harness.audit = AuditLogger::new(dir.path());

        let started = harness.success(&AuditCommand, "").await;
        assert!(started.starts_with("Audit log started: "));
        assert!(harness.audit.is_active());

        let stopped = harness.success(&AuditCommand, "").await;
        assert_eq!(stopped, "Audit log stopped.");
        assert!(!harness.audit.is_active());
    }
}
