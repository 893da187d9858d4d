use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use crate::agents::{builtin_agent_factory, builtin_plugin};
use crate::audit::AuditLogger;
use crate::commands::{CommandContext, CommandRegistry, CommandResult, register_builtin_commands};
use crate::config::AppConfig;
use crate::console::console;
use crate::display::Display;
use crate::plugins::PluginRegistry;
use crate::repl::{InterruptHandle, LineReader, ReplCore};
use crate::session::Session;
use crate::spawner::SessionSpawner;

/// Wires configuration, plugins and the REPL together.
pub struct App {
    config: AppConfig,
    display: Arc<dyn Display>,
    plugins: PluginRegistry,
    interrupt: InterruptHandle,
    base_dir: PathBuf,
}

impl App {
    pub fn new(config: AppConfig, display: Arc<dyn Display>) -> Self {
        let mut commands = CommandRegistry::new();
        register_builtin_commands(&mut commands);
        Self {
            config,
            display,
            plugins: PluginRegistry::new(commands),
            interrupt: InterruptHandle::new(),
            base_dir: PathBuf::from("."),
        }
    }

    pub fn with_interrupt(mut self, interrupt: InterruptHandle) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn plugins_mut(&mut self) -> &mut PluginRegistry {
        &mut self.plugins
    }

    /// Register the plugins named in the config and run their `on_load`.
    ///
    /// With `with_agent` false, agent plugins are skipped. Unknown names,
    /// registration conflicts and load failures are warnings.
    pub async fn load_plugins(&mut self, with_agent: bool) {
        let names = self.config.plugins.clone();
        for name in &names {
            let plugin = match builtin_plugin(name, &self.config) {
                Some(Ok(plugin)) => plugin,
                Some(Err(e)) => {
                    console().warning(&format!("Plugin '{}' unavailable: {}", name, e));
                    continue;
                }
                None => {
                    console().warning(&format!("Unknown plugin '{}' in config, skipping", name));
                    continue;
                }
            };
            if !with_agent && Arc::clone(&plugin).as_agent().is_some() {
                console().verbose(&format!("Agent plugin '{}' disabled", name));
                continue;
            }
            if let Err(e) = self.plugins.register(plugin) {
                console().warning(&e.to_string());
            }
        }

        for plugin in self.plugins.plugins() {
            if let Err(e) = plugin.on_load().await {
                console().warning(&format!(
                    "Plugin '{}' failed to load: {:#}",
                    plugin.name(),
                    e
                ));
            }
        }
    }

    fn spawner(&self) -> Option<SessionSpawner> {
        let agent = self.plugins.agent()?;
        builtin_agent_factory(agent.name(), &self.config).map(SessionSpawner::new)
    }

    /// Run the interactive loop until it ends, then unload plugins.
    pub async fn run<R: LineReader + ?Sized>(self, reader: &mut R) -> Result<()> {
        let agent_name = self.plugins.agent().map(|agent| agent.name().to_string());
        console().welcome(&self.config.app_name, agent_name.as_deref());

        let spawner = self.spawner();
        let mut core = ReplCore::new(self.display, self.plugins, self.config)
            .with_spawner(spawner)
            .with_interrupt(self.interrupt)
            .with_base_dir(self.base_dir);
        let result = core.run(reader).await;

        core.plugins().unload_all().await;
        console().goodbye();
        result
    }

    /// Run one command without starting the REPL. Returns the process exit code.
    pub async fn run_cli_command(&self, name: &str, args: &[String]) -> i32 {
        let name = name.trim_start_matches('-');
        let commands = self.plugins.commands();

        let Some(command) = commands.get(name) else {
            let available: Vec<String> = commands
                .list_all()
                .iter()
                .filter(|command| command.cli_exposed())
                .map(|command| command.name().to_string())
                .collect();
            self.display.show_error(&format!(
                "Unknown command '{}'. Available: {}",
                name,
                available.join(", ")
            ));
            return 1;
        };

        if !command.cli_exposed() {
            self.display
                .show_error(&format!("'{}' is not available as a CLI command", name));
            return 1;
        }

        let mut session = Session::new();
        let mut audit = AuditLogger::new(self.config.audit_dir.clone());
        let spawner = self.spawner();
        let mut context = CommandContext::new(
            args.join(" "),
            self.display.as_ref(),
            &mut session,
            &self.plugins,
            &self.config,
            &mut audit,
        )
        .with_spawner(spawner.as_ref());

        match command.execute(&mut context).await {
            Ok(CommandResult::Success(output)) => {
                if !output.is_empty() {
                    self.display.show_text(&output);
                }
                0
            }
            Ok(CommandResult::Exit) => 0,
            Err(e) => {
                self.display
                    .show_error(&format!("{} failed: {:#}", name, e));
                1
            }
        }
    }
}
