mod choice;
mod recording;
mod spinner;
mod terminal;

use async_trait::async_trait;

pub use choice::{ChoiceSelector, KeyOutcome};
pub use recording::{DisplayEvent, RecordingDisplay};
pub use spinner::TerminalSpinner;
pub use terminal::TerminalDisplay;

/// Everything the REPL and stream handler render goes through this trait.
///
/// Prompt methods suspend until the user answers and return the chosen value,
/// or [`crate::stream::REJECT_RESPONSE`] when the user declines.
#[async_trait]
pub trait Display: Send + Sync {
    fn show_info(&self, message: &str);

    fn show_error(&self, message: &str);

    /// Command output (help listings, status blocks).
    fn show_text(&self, text: &str);

    fn start_waiting_indicator(&self);

    /// Idempotent: stopping an indicator that is not running is a no-op.
    fn stop_waiting_indicator(&self);

    fn start_live_text(&self);

    fn append_live_text(&self, text: &str);

    /// Close the live text region, flushing anything still buffered.
    fn finalize_live_text(&self);

    fn show_tool_use(&self, name: &str, input: &serde_json::Value);

    fn show_tool_result(&self, name: &str, result: &str, is_error: bool);

    /// Binary decision over two labelled choices. Answers
    /// [`crate::stream::APPROVE_RESPONSE`] or [`crate::stream::REJECT_RESPONSE`],
    /// never a label.
    async fn prompt_approval(&self, prompt: &str, choices: &[String]) -> String;

    async fn prompt_choice(&self, prompt: &str, choices: &[String]) -> String;

    async fn prompt_text(&self, prompt: &str) -> String;
}

/// Map a typed answer onto one of `choices`.
///
/// Accepts a 1-based index, the choice text (case-insensitive), or an empty
/// line for the first choice.
pub fn resolve_choice(answer: &str, choices: &[String]) -> Option<usize> {
    let answer = answer.trim();
    if choices.is_empty() {
        return None;
    }
    if answer.is_empty() {
        return Some(0);
    }
    if let Ok(index) = answer.parse::<usize>() {
        return (1..=choices.len()).contains(&index).then(|| index - 1);
    }
    choices
        .iter()
        .position(|choice| choice.eq_ignore_ascii_case(answer))
}
