use std::sync::Arc;

use super::audit_command::AuditCommand;
use super::copy_command::CopyCommand;
use super::help_command::HelpCommand;
use super::quit_command::QuitCommand;
use super::registry::CommandRegistry;
use super::spawn_command::SpawnCommand;
use super::status_command::StatusCommand;
use super::version_command::VersionCommand;

pub fn register_builtin_commands(registry: &mut CommandRegistry) {
    registry.register(Arc::new(HelpCommand));
    registry.register(Arc::new(QuitCommand));
    registry.register(Arc::new(VersionCommand));
    registry.register(Arc::new(CopyCommand));
    registry.register(Arc::new(StatusCommand));
    registry.register(Arc::new(AuditCommand));
    registry.register(Arc::new(SpawnCommand));
}
