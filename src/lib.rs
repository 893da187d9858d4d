pub mod agents;
pub mod app;
pub mod audit;
pub mod cli;
pub mod clipboard;
pub mod commands;
pub mod config;
pub mod console;
pub mod context;
pub mod display;
pub mod plugins;
pub mod repl;
pub mod session;
pub mod spawner;
pub mod stream;

pub use agents::{AgentError, AnthropicAgent, EchoAgent};
pub use app::App;
pub use audit::{AuditEntryType, AuditLogger};
pub use commands::{Command, CommandContext, CommandRegistry, CommandResult};
pub use config::AppConfig;
pub use console::{Console, VerbosityLevel, console, init_console};
pub use display::{Display, RecordingDisplay, TerminalDisplay};
pub use plugins::{AgentPlugin, MessageContext, Plugin, PluginError, PluginRegistry};
pub use repl::{InterruptHandle, LineReader, ReplCore};
pub use session::{ConversationTurn, Role, Session, TokenUsage, ToolUse};
pub use spawner::{SessionSpawner, SpawnConfig, SpawnError, SpawnReport};
pub use stream::{APPROVE_RESPONSE, EventStream, REJECT_RESPONSE, StreamEvent, StreamHandler};
