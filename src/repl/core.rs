use anyhow::Result;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::pin::pin;
use std::sync::Arc;

use super::input::{ParsedInput, parse_input};
use super::interrupt::InterruptHandle;
use super::reader::LineReader;
use crate::audit::{AuditEntryType, AuditLogger};
use crate::commands::{CommandContext, CommandResult};
use crate::config::AppConfig;
use crate::console::console;
use crate::context::resolve_file_context;
use crate::display::Display;
use crate::plugins::{MessageContext, PluginRegistry};
use crate::session::{ConversationTurn, Session};
use crate::spawner::SessionSpawner;
use crate::stream::{EventStream, StreamEnd, StreamHandler};

const PROMPT: &str = "> ";
const CANCELLED_MESSAGE: &str = "Agent request cancelled.";
const COMMAND_CANCELLED_MESSAGE: &str = "Command cancelled.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Quit,
}

/// The read, classify, dispatch loop.
///
/// Owns the foreground session. Command handler failures, agent failures and
/// panics from either are reported on the display and the loop carries on;
/// only `/quit`, end of input, or an interrupt while reading ends it.
pub struct ReplCore {
    display: Arc<dyn Display>,
    session: Session,
    plugins: PluginRegistry,
    config: AppConfig,
    spawner: Option<SessionSpawner>,
    audit: AuditLogger,
    interrupt: InterruptHandle,
    base_dir: PathBuf,
}

impl ReplCore {
    pub fn new(display: Arc<dyn Display>, plugins: PluginRegistry, config: AppConfig) -> Self {
        let audit = AuditLogger::new(config.audit_dir.clone());
        Self {
            display,
            session: Session::new(),
            plugins,
            config,
            spawner: None,
            audit,
            interrupt: InterruptHandle::new(),
            base_dir: PathBuf::from("."),
        }
    }

    pub fn with_spawner(mut self, spawner: Option<SessionSpawner>) -> Self {
        self.spawner = spawner;
        self
    }

    pub fn with_interrupt(mut self, interrupt: InterruptHandle) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Directory `@path` mentions are resolved against.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = audit;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    pub async fn run<R: LineReader + ?Sized>(&mut self, reader: &mut R) -> Result<()> {
        loop {
            self.interrupt.clear();
            let read = {
                let mut interrupted = pin!(self.interrupt.notified());
                interrupted.as_mut().enable();
                tokio::select! {
                    biased;
                    _ = interrupted => {
                        console().verbose("Interrupted while reading input");
                        break;
                    }
                    line = reader.read_line(PROMPT) => line,
                }
            };

            let line = match read {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    console().verbose(&format!("Input closed: {}", e));
                    break;
                }
            };

            if self.handle_input(&line).await == LoopControl::Quit {
                break;
            }
        }

        self.audit.stop();
        Ok(())
    }

    /// Classify and dispatch one line of input.
    pub async fn handle_input(&mut self, line: &str) -> LoopControl {
        match parse_input(line) {
            ParsedInput::Empty => LoopControl::Continue,
            ParsedInput::Palette => {
                self.show_palette();
                LoopControl::Continue
            }
            ParsedInput::Command { name, args } => self.dispatch_command(&name, args).await,
            ParsedInput::Message { text, mentions } => {
                self.dispatch_message(text, mentions).await;
                LoopControl::Continue
            }
        }
    }

    fn show_palette(&self) {
        let entries = self.plugins.commands().palette(
            "/",
            &self.config.pinned_commands,
            self.config.max_pinned_display,
        );
        self.display.show_info(&format!(
            "{}    (/help lists every command)",
            entries.join("  ")
        ));
    }

    async fn dispatch_command(&mut self, name: &str, args: String) -> LoopControl {
        self.audit
            .log(AuditEntryType::Command, format!("/{} {}", name, args).trim_end());

        let Some(command) = self.plugins.commands().get(name) else {
            self.report_error(&format!(
                "Unknown command: /{}. Type /help for available commands.",
                name
            ));
            return LoopControl::Continue;
        };

        let interrupt = self.interrupt.clone();
        let result = {
            let mut interrupted = pin!(interrupt.notified());
            interrupted.as_mut().enable();
            let mut context = CommandContext::new(
                args,
                self.display.as_ref(),
                &mut self.session,
                &self.plugins,
                &self.config,
                &mut self.audit,
            )
            .with_spawner(self.spawner.as_ref());
            tokio::select! {
                biased;
                _ = interrupted => None,
                result = AssertUnwindSafe(command.execute(&mut context)).catch_unwind() => Some(result),
            }
        };

        match result {
            Some(Ok(Ok(CommandResult::Exit))) => LoopControl::Quit,
            Some(Ok(Ok(CommandResult::Success(output)))) => {
                if !output.is_empty() {
                    self.display.show_text(&output);
                }
                LoopControl::Continue
            }
            Some(Ok(Err(e))) => {
                self.report_error(&format!("/{} failed: {:#}", name, e));
                LoopControl::Continue
            }
            Some(Err(_)) => {
                self.report_error(&format!("/{} crashed", name));
                LoopControl::Continue
            }
            None => {
                self.display.stop_waiting_indicator();
                self.display.show_info(COMMAND_CANCELLED_MESSAGE);
                LoopControl::Continue
            }
        }
    }

    async fn dispatch_message(&mut self, text: String, mentions: Vec<String>) {
        let Some(agent) = self.plugins.agent().cloned() else {
            self.report_error("No agent is active. Enable an agent plugin to send messages.");
            return;
        };

        let file_context = if mentions.is_empty() {
            Vec::new()
        } else {
            match resolve_file_context(&mentions, &self.base_dir) {
                Ok(files) => files,
                Err(e) => {
                    self.report_error(&e.to_string());
                    return;
                }
            }
        };

        self.audit.log(AuditEntryType::User, &text);
        self.session
            .add_turn(ConversationTurn::user(text.clone(), file_context.clone()));
        let context = MessageContext::new(text)
            .with_file_context(file_context)
            .with_history(self.session.history());

        let interrupt = self.interrupt.clone();
        let mut cancelled = pin!(interrupt.notified());
        cancelled.as_mut().enable();

        let sent = tokio::select! {
            biased;
            _ = cancelled.as_mut() => None,
            sent = AssertUnwindSafe(agent.send(context)).catch_unwind() => Some(sent),
        };

        let stream: EventStream = match sent {
            Some(Ok(Ok(stream))) => stream,
            Some(Ok(Err(e))) => {
                self.report_error(&format!("Agent error: {:#}", e));
                return;
            }
            Some(Err(_)) => {
                self.report_error("Agent crashed while starting the request");
                return;
            }
            None => {
                // Keep user and assistant turns paired.
                StreamHandler::new(self.display.as_ref(), &mut self.session)
                    .handle(Box::pin(futures::stream::empty()))
                    .await;
                self.display.show_info(CANCELLED_MESSAGE);
                return;
            }
        };

        let outcome = AssertUnwindSafe(
            StreamHandler::new(self.display.as_ref(), &mut self.session)
                .handle_until(stream, cancelled),
        )
        .catch_unwind()
        .await;

        match outcome {
            Ok(outcome) => {
                for tool_use in &outcome.turn.tool_uses {
                    self.audit.log(
                        AuditEntryType::Tool,
                        &format!("{} {}", tool_use.name, tool_use.input),
                    );
                }
                self.audit.log(AuditEntryType::Agent, &outcome.turn.content);
                if outcome.end == StreamEnd::Cancelled {
                    self.display.show_info(CANCELLED_MESSAGE);
                }
            }
            Err(_) => {
                self.display.stop_waiting_indicator();
                self.report_error("Agent crashed while streaming its response");
            }
        }
    }

    fn report_error(&mut self, message: &str) {
        self.audit.log(AuditEntryType::Error, message);
        self.display.show_error(message);
    }
}

#[cfg(test)]
#[path = "core_tests.rs"]
mod tests;
