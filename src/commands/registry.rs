use anyhow::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::audit::AuditLogger;
use crate::config::AppConfig;
use crate::display::Display;
use crate::plugins::PluginRegistry;
use crate::session::Session;
use crate::spawner::SessionSpawner;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Output to show; empty means the command rendered its own output.
    Success(String),
    /// Stop the REPL.
    Exit,
}

/// Everything a slash command may touch while it runs.
pub struct CommandContext<'a> {
    /// Arguments after the command name, as typed.
    pub args: String,
    /// `args` split on whitespace.
    pub argv: Vec<String>,
    pub display: &'a dyn Display,
    pub session: &'a mut Session,
    pub plugins: &'a PluginRegistry,
    pub config: &'a AppConfig,
    pub spawner: Option<&'a SessionSpawner>,
    pub audit: &'a mut AuditLogger,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        args: impl Into<String>,
        display: &'a dyn Display,
        session: &'a mut Session,
        plugins: &'a PluginRegistry,
        config: &'a AppConfig,
        audit: &'a mut AuditLogger,
    ) -> Self {
        let args = args.into();
        let argv = args.split_whitespace().map(str::to_string).collect();
        Self {
            args,
            argv,
            display,
            session,
            plugins,
            config,
            spawner: None,
            audit,
        }
    }

    pub fn with_spawner(mut self, spawner: Option<&'a SessionSpawner>) -> Self {
        self.spawner = spawner;
        self
    }
}

#[async_trait]
pub trait Command: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn usage(&self) -> &str;

    /// Whether the command can run from the command line without the REPL.
    fn cli_exposed(&self) -> bool {
        false
    }

    /// Whether the command belongs in the palette shown for a bare `/`.
    fn pinned(&self) -> bool {
        false
    }

    async fn execute(&self, context: &mut CommandContext<'_>) -> Result<CommandResult>;
}

/// Slash commands keyed by name, iterated alphabetically.
pub struct CommandRegistry {
    commands: BTreeMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: BTreeMap::new(),
        }
    }

    /// Register `command`, replacing and returning any command with the same name.
    pub fn register(&mut self, command: Arc<dyn Command>) -> Option<Arc<dyn Command>> {
        let name = command.name().to_string();
        self.commands.insert(name, command)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn list_all(&self) -> Vec<Arc<dyn Command>> {
        self.commands.values().cloned().collect()
    }

    /// Names starting with `prefix`, alphabetical.
    pub fn complete(&self, prefix: &str) -> Vec<String> {
        self.commands
            .range(prefix.to_string()..)
            .take_while(|(name, _)| name.starts_with(prefix))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// `names` in the given order, skipping unregistered ones, at most `max`.
    pub fn get_pinned(&self, names: &[String], max: usize) -> Vec<Arc<dyn Command>> {
        names
            .iter()
            .filter_map(|name| self.get(name))
            .take(max)
            .collect()
    }

    /// Completion entries for what the user has typed so far.
    ///
    /// A bare `/` shows the configured pinned names, then commands that
    /// declare themselves pinned, without duplicates. `/<prefix>` shows every
    /// match. Anything else shows nothing.
    pub fn palette(&self, input: &str, configured: &[String], max: usize) -> Vec<String> {
        let Some(prefix) = input.strip_prefix('/') else {
            return Vec::new();
        };

        if !prefix.is_empty() {
            return self
                .complete(prefix)
                .into_iter()
                .map(|name| format!("/{}", name))
                .collect();
        }

        let mut seen = HashSet::new();
        let configured_names = configured.iter().filter(|name| self.contains(name));
        let declared = self
            .commands
            .values()
            .filter(|command| command.pinned())
            .map(|command| command.name());

        configured_names
            .map(String::as_str)
            .chain(declared)
            .filter(|name| seen.insert(name.to_string()))
            .take(max)
            .map(|name| format!("/{}", name))
            .collect()
    }

    pub fn get_help(&self, command_name: Option<&str>) -> String {
        if let Some(name) = command_name {
            let name = name.trim_start_matches('/');
            if let Some(command) = self.commands.get(name) {
                format!(
                    "/{} - {}\n\nUsage: {}",
                    command.name(),
                    command.description(),
                    command.usage()
                )
            } else {
                format!("Unknown command: /{}", name)
            }
        } else {
            let mut help = String::from("Available commands:\n\n");

            for command in self.commands.values() {
                help.push_str(&format!(
                    "  /{:<12} {}\n",
                    command.name(),
                    command.description()
                ));
            }

            help.push_str("\nType /help <command> for more information about a specific command.");
            help
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestCommand {
        name: &'static str,
        description: &'static str,
        pinned: bool,
    }

    impl TestCommand {
        fn arc(name: &'static str) -> Arc<dyn Command> {
            Arc::new(Self {
                name,
                description: "test command",
                pinned: false,
            })
        }
    }

    #[async_trait]
    impl Command for TestCommand {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            self.description
        }

        fn usage(&self) -> &str {
            self.name
        }

        fn pinned(&self) -> bool {
            self.pinned
        }

        async fn execute(&self, _context: &mut CommandContext<'_>) -> Result<CommandResult> {
            Ok(CommandResult::Success(self.name.to_string()))
        }
    }

    fn registry_with(names: &[&'static str]) -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        for name in names {
            registry.register(TestCommand::arc(name));
        }
        registry
    }

    fn names(commands: &[Arc<dyn Command>]) -> Vec<String> {
        commands.iter().map(|c| c.name().to_string()).collect()
    }

    #[test]
    fn test_register_overwrites_by_name() {
        let mut registry = CommandRegistry::new();
        registry.register(TestCommand::arc("deploy"));
        let previous = registry.register(Arc::new(TestCommand {
            name: "deploy",
            description: "newer",
            pinned: false,
        }));

        assert!(previous.is_some());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("deploy").unwrap().description(), "newer");
    }

    #[test]
    fn test_list_all_is_alphabetical() {
        let registry = registry_with(&["version", "help", "quit", "clear"]);
        assert_eq!(
            names(&registry.list_all()),
            vec!["clear", "help", "quit", "version"]
        );
    }

    #[test]
    fn test_complete_filters_by_prefix() {
        let registry = registry_with(&["help", "quit", "version"]);
        assert_eq!(registry.complete("h"), vec!["help"]);
        assert_eq!(registry.complete(""), vec!["help", "quit", "version"]);
        assert!(registry.complete("x").is_empty());
    }

    #[test]
    fn test_complete_handles_shared_prefixes() {
        let registry = registry_with(&["compact", "copy", "clear", "config"]);
        assert_eq!(registry.complete("co"), vec!["compact", "config", "copy"]);
        assert_eq!(registry.complete("cop"), vec!["copy"]);
    }

    #[test]
    fn test_get_pinned_keeps_order_and_caps() {
        let registry = registry_with(&["help", "quit", "version"]);
        let pinned = registry.get_pinned(&["quit".to_string(), "help".to_string()], 1);
        assert_eq!(names(&pinned), vec!["quit"]);

        let pinned = registry.get_pinned(
            &["missing".to_string(), "version".to_string(), "help".to_string()],
            5,
        );
        assert_eq!(names(&pinned), vec!["version", "help"]);
    }

    #[test]
    fn test_palette_for_bare_slash_merges_declared_pinned() {
        let mut registry = registry_with(&["help", "quit", "version"]);
        registry.register(Arc::new(TestCommand {
            name: "spawn",
            description: "spawn",
            pinned: true,
        }));
        registry.register(Arc::new(TestCommand {
            name: "quit",
            description: "quit",
            pinned: true,
        }));

        let configured = vec!["quit".to_string(), "help".to_string()];
        assert_eq!(
            registry.palette("/", &configured, 6),
            vec!["/quit", "/help", "/spawn"]
        );
        assert_eq!(registry.palette("/", &configured, 2), vec!["/quit", "/help"]);
    }

    #[test]
    fn test_palette_for_prefix_and_plain_text() {
        let registry = registry_with(&["help", "quit", "version"]);
        assert_eq!(registry.palette("/v", &[], 6), vec!["/version"]);
        assert!(registry.palette("hello", &[], 6).is_empty());
    }

    #[test]
    fn test_get_help_lists_commands() {
        let registry = registry_with(&["help", "quit"]);
        let help = registry.get_help(None);
        assert!(help.contains("/help"));
        assert!(help.contains("/quit"));
        assert!(registry.get_help(Some("nope")).contains("Unknown command"));
        assert!(registry.get_help(Some("/quit")).starts_with("/quit - "));
    }
}
