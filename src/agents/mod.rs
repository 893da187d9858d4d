mod anthropic;
mod echo;
mod error;
mod sse;

pub use anthropic::{AnthropicAgent, AnthropicConfig, DEFAULT_MODEL};
pub use echo::EchoAgent;
pub use error::AgentError;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::plugins::{AgentPlugin, Plugin};
use crate::spawner::AgentFactory;

/// Plugins that can be enabled by name in the config file. `None` for an
/// unknown name; an error when the plugin exists but cannot start.
pub fn builtin_plugin(name: &str, config: &AppConfig) -> Option<Result<Arc<dyn Plugin>, AgentError>> {
    match name {
        "echo" => Some(Ok(Arc::new(EchoAgent::new()))),
        "anthropic" => Some(
            AnthropicAgent::from_env(config.default_model.as_deref())
                .map(|agent| Arc::new(agent) as Arc<dyn Plugin>),
        ),
        _ => None,
    }
}

/// Fresh-instance factory for a built-in agent, for spawned sessions.
pub fn builtin_agent_factory(name: &str, config: &AppConfig) -> Option<AgentFactory> {
    match name {
        "echo" => Some(echo_factory()),
        "anthropic" => Some(anthropic_factory(config.default_model.clone())),
        _ => None,
    }
}

pub fn echo_factory() -> AgentFactory {
    Arc::new(|| Ok(Arc::new(EchoAgent::new()) as Arc<dyn AgentPlugin>))
}

pub fn anthropic_factory(model: Option<String>) -> AgentFactory {
    Arc::new(move || {
        let agent = AnthropicAgent::from_env(model.as_deref())?;
        Ok(Arc::new(agent) as Arc<dyn AgentPlugin>)
    })
}
