use std::sync::Arc;
use thiserror::Error;

use super::plugin::{AgentPlugin, Plugin};
use crate::commands::CommandRegistry;
use crate::console::console;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PluginError {
    /// A configuration error; retrying the registration cannot succeed.
    #[error("Agent '{active}' is already active; cannot activate '{rejected}'")]
    AgentAlreadyActive { active: String, rejected: String },
}

/// Loaded plugins, the command registry they contribute to, and the single
/// active agent.
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
    commands: CommandRegistry,
    agent: Option<Arc<dyn AgentPlugin>>,
}

impl PluginRegistry {
    pub fn new(commands: CommandRegistry) -> Self {
        Self {
            plugins: Vec::new(),
            commands,
            agent: None,
        }
    }

    /// Store `plugin`, merge its commands, and activate it if it is an agent.
    ///
    /// A second agent is refused before anything is stored, so a failed
    /// registration leaves the registry unchanged.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> Result<(), PluginError> {
        let agent = Arc::clone(&plugin).as_agent();
        if let Some(agent) = &agent {
            self.ensure_no_agent(agent.name())?;
        }

        for command in plugin.commands() {
            if let Some(previous) = self.commands.register(command) {
                console().verbose(&format!(
                    "Plugin '{}' replaced command /{}",
                    plugin.name(),
                    previous.name()
                ));
            }
        }
        console().verbose(&format!("Registered plugin '{}'", plugin.name()));
        self.plugins.push(plugin);

        if let Some(agent) = agent {
            self.set_agent(agent)?;
        }
        Ok(())
    }

    pub fn set_agent(&mut self, agent: Arc<dyn AgentPlugin>) -> Result<(), PluginError> {
        self.ensure_no_agent(agent.name())?;
        console().verbose(&format!(
            "Active agent: {} (model {})",
            agent.name(),
            agent.default_model()
        ));
        self.agent = Some(agent);
        Ok(())
    }

    fn ensure_no_agent(&self, rejected: &str) -> Result<(), PluginError> {
        match &self.agent {
            Some(active) => Err(PluginError::AgentAlreadyActive {
                active: active.name().to_string(),
                rejected: rejected.to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn agent(&self) -> Option<&Arc<dyn AgentPlugin>> {
        self.agent.as_ref()
    }

    pub fn plugins(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn commands_mut(&mut self) -> &mut CommandRegistry {
        &mut self.commands
    }

    /// Every plugin's hints, in registration order.
    pub fn status_hints(&self) -> Vec<String> {
        self.plugins
            .iter()
            .flat_map(|plugin| plugin.status_hints())
            .collect()
    }

    /// Run `on_unload` for every plugin, newest first. Failures are logged.
    pub async fn unload_all(&self) {
        for plugin in self.plugins.iter().rev() {
            if let Err(e) = plugin.on_unload().await {
                console().warning(&format!("Plugin '{}' failed to unload: {}", plugin.name(), e));
            }
        }
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new(CommandRegistry::new())
    }
}
