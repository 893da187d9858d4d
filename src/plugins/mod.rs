mod plugin;
mod registry;

pub use plugin::{AgentPlugin, MessageContext, Plugin};
pub use registry::{PluginError, PluginRegistry};
