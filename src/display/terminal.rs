use async_trait::async_trait;
use colored::Colorize;
use std::io::{self, IsTerminal, Write};
use std::sync::{Mutex, MutexGuard};

use super::choice::{choice_lines, select_with_keys};
use super::{Display, TerminalSpinner, resolve_choice};
use crate::console::console;
use crate::repl::{LineReader, StdinLines, StdinReader};
use crate::stream::{APPROVE_RESPONSE, REJECT_RESPONSE};

const TOOL_RESULT_MAX_CHARS: usize = 500;
const TOOL_RESULT_MAX_LINES: usize = 15;

const APPROVE_ANSWERS: &[&str] = &["a", "y", "yes", "1", "approve"];
const REJECT_ANSWERS: &[&str] = &["r", "n", "no", "2", "reject"];
const TEXT_REJECT_ANSWERS: &[&str] = &["r", "/reject", "reject"];

struct LiveState {
    spinner: TerminalSpinner,
    live_open: bool,
    ends_with_newline: bool,
}

/// Line-oriented terminal rendering on stdout, spinner on stderr, prompts
/// answered from a line source shared with the input loop.
pub struct TerminalDisplay {
    input: tokio::sync::Mutex<Box<dyn LineReader>>,
    arrow_keys: bool,
    state: Mutex<LiveState>,
}

impl TerminalDisplay {
    /// Prompts read from stdin. Choice prompts use arrow-key selection when
    /// stdin is a terminal.
    pub fn new(input: StdinLines) -> Self {
        Self::with_reader(StdinReader::new(input)).with_arrow_keys(io::stdin().is_terminal())
    }

    pub fn with_reader(reader: impl LineReader + 'static) -> Self {
        Self {
            input: tokio::sync::Mutex::new(Box::new(reader)),
            arrow_keys: false,
            state: Mutex::new(LiveState {
                spinner: TerminalSpinner::new("Thinking"),
                live_open: false,
                ends_with_newline: true,
            }),
        }
    }

    pub fn with_arrow_keys(mut self, enabled: bool) -> Self {
        self.arrow_keys = enabled;
        self
    }

    fn state(&self) -> MutexGuard<'_, LiveState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// `None` at end of input or on a read error.
    async fn read_answer(&self, label: &str) -> Option<String> {
        let label = format!("{} ", label);
        match self.input.lock().await.read_line(&label).await {
            Ok(line) => line,
            Err(e) => {
                console().verbose(&format!("Prompt input failed: {}", e));
                None
            }
        }
    }

    fn print_choices(choices: &[String]) {
        for line in choice_lines(choices, 0) {
            println!("  {}", line);
        }
        println!("  {}", "  r) Reject".dimmed());
    }

    async fn choose_by_line(&self, choices: &[String]) -> String {
        let label = format!("Select 1-{}, Enter for 1, r to reject:", choices.len());
        loop {
            let Some(answer) = self.read_answer(&label).await else {
                return REJECT_RESPONSE.to_string();
            };
            let trimmed = answer.trim();
            if trimmed.eq_ignore_ascii_case("r") || trimmed == REJECT_RESPONSE {
                return REJECT_RESPONSE.to_string();
            }
            match resolve_choice(trimmed, choices) {
                Some(index) => return choices[index].clone(),
                None => self.show_error(&format!("Invalid input '{}': pick a listed number", trimmed)),
            }
        }
    }
}

/// Map an approval answer onto the fixed approve or reject value.
fn parse_approval(answer: &str) -> Option<&'static str> {
    let answer = answer.trim().to_ascii_lowercase();
    if APPROVE_ANSWERS.contains(&answer.as_str()) {
        Some(APPROVE_RESPONSE)
    } else if REJECT_ANSWERS.contains(&answer.as_str()) {
        Some(REJECT_RESPONSE)
    } else {
        None
    }
}

fn truncate_for_display(result: &str) -> String {
    let mut shown: String = result
        .lines()
        .take(TOOL_RESULT_MAX_LINES)
        .collect::<Vec<_>>()
        .join("\n");
    if shown.chars().count() > TOOL_RESULT_MAX_CHARS {
        shown = shown.chars().take(TOOL_RESULT_MAX_CHARS).collect();
    }
    if shown.len() < result.trim_end().len() {
        shown.push_str("\n...");
    }
    shown
}

#[async_trait]
impl Display for TerminalDisplay {
    fn show_info(&self, message: &str) {
        println!("{}", message.dimmed());
    }

    fn show_error(&self, message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message.red());
    }

    fn show_text(&self, text: &str) {
        println!("{}", text);
    }

    fn start_waiting_indicator(&self) {
        self.state().spinner.start();
    }

    fn stop_waiting_indicator(&self) {
        self.state().spinner.stop();
    }

    fn start_live_text(&self) {
        let mut state = self.state();
        state.live_open = true;
        state.ends_with_newline = true;
    }

    fn append_live_text(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        let mut state = self.state();
        print!("{}", text);
        let _ = io::stdout().flush();
        state.ends_with_newline = text.ends_with('\n');
    }

    fn finalize_live_text(&self) {
        let mut state = self.state();
        if !state.live_open {
            return;
        }
        if !state.ends_with_newline {
            println!();
        }
        state.live_open = false;
        state.ends_with_newline = true;
    }

    fn show_tool_use(&self, name: &str, input: &serde_json::Value) {
        let args = match input {
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        println!("{} {}{}{}", "⏺".dimmed(), name.green(), "(".dimmed(), format!("{})", args).dimmed());
    }

    fn show_tool_result(&self, name: &str, result: &str, is_error: bool) {
        let shown = truncate_for_display(result);
        if is_error {
            println!("  {} {} {}", "⎿".dimmed(), name.red(), "failed".red());
        } else {
            println!("  {} {}", "⎿".dimmed(), name.cyan());
        }
        for line in shown.lines() {
            println!("    {}", line.dimmed());
        }
    }

    async fn prompt_approval(&self, prompt: &str, choices: &[String]) -> String {
        if choices.len() != 2 {
            return REJECT_RESPONSE.to_string();
        }
        println!("{}", prompt);
        println!("  {} {}", "[a]".green(), choices[0]);
        println!("  {} {}", "[r]".red(), choices[1]);
        loop {
            let Some(answer) = self.read_answer("Approve or reject [a/r]:").await else {
                return REJECT_RESPONSE.to_string();
            };
            match parse_approval(&answer) {
                Some(decision) => return decision.to_string(),
                None if answer.trim().is_empty() => {
                    self.show_error("Input required: a to approve, r to reject")
                }
                None => self.show_error(&format!(
                    "Invalid input '{}': a to approve, r to reject",
                    answer.trim()
                )),
            }
        }
    }

    async fn prompt_choice(&self, prompt: &str, choices: &[String]) -> String {
        if choices.is_empty() {
            return REJECT_RESPONSE.to_string();
        }
        println!("{}", prompt);

        if self.arrow_keys {
            println!(
                "{}",
                "  ↑/↓ to move, Enter or 1-9 to select, r to reject".dimmed()
            );
            match select_with_keys(choices).await {
                Ok(Some(index)) => return choices[index].clone(),
                Ok(None) => return REJECT_RESPONSE.to_string(),
                Err(e) => console().verbose(&format!(
                    "Arrow-key selection unavailable, falling back to numbers: {}",
                    e
                )),
            }
        }

        Self::print_choices(choices);
        self.choose_by_line(choices).await
    }

    async fn prompt_text(&self, prompt: &str) -> String {
        println!("{}", prompt);
        loop {
            let Some(answer) = self.read_answer("(r or /reject to decline) >").await else {
                return REJECT_RESPONSE.to_string();
            };
            let trimmed = answer.trim();
            if trimmed.is_empty() {
                self.show_error("Input required: type an answer, or r to decline");
                continue;
            }
            if TEXT_REJECT_ANSWERS.contains(&trimmed) {
                return REJECT_RESPONSE.to_string();
            }
            return trimmed.to_string();
        }
    }
}
