mod audit_command;
mod clear_command;
mod compact_command;
mod copy_command;
mod help_command;
mod quit_command;
mod register;
mod registry;
mod spawn_command;
mod status_command;
mod version_command;

#[cfg(test)]
pub(crate) mod test_support;

pub use clear_command::ClearCommand;
pub use compact_command::CompactCommand;
pub use register::register_builtin_commands;
pub use registry::{Command, CommandContext, CommandRegistry, CommandResult};
