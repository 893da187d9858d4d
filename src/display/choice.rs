use colored::Colorize;
use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode};
use futures::StreamExt;
use std::io::{self, Write};

const MARKER: &str = "▸";

/// What a key press did to an open choice list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Pending,
    Selected(usize),
    Rejected,
}

/// Highlight state of a choice list driven by arrow keys. Movement wraps at
/// both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceSelector {
    selected: usize,
    count: usize,
}

impl ChoiceSelector {
    pub fn new(count: usize) -> Self {
        Self { selected: 0, count }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn move_up(&mut self) {
        if self.count > 0 {
            self.selected = (self.selected + self.count - 1) % self.count;
        }
    }

    pub fn move_down(&mut self) {
        if self.count > 0 {
            self.selected = (self.selected + 1) % self.count;
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.kind == KeyEventKind::Release {
            return KeyOutcome::Pending;
        }
        if let KeyCode::Char('c') = key.code
            && key.modifiers.contains(KeyModifiers::CONTROL)
        {
            return KeyOutcome::Rejected;
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') | KeyCode::BackTab => {
                self.move_up();
                KeyOutcome::Pending
            }
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => {
                self.move_down();
                KeyOutcome::Pending
            }
            KeyCode::Enter if self.count > 0 => KeyOutcome::Selected(self.selected),
            KeyCode::Char('r') | KeyCode::Esc => KeyOutcome::Rejected,
            KeyCode::Char(digit) => match digit.to_digit(10) {
                Some(n) if (1..=self.count).contains(&(n as usize)) => {
                    KeyOutcome::Selected(n as usize - 1)
                }
                _ => KeyOutcome::Pending,
            },
            _ => KeyOutcome::Pending,
        }
    }
}

/// One line per choice, the highlighted one marked.
pub(super) fn choice_lines(choices: &[String], selected: usize) -> Vec<String> {
    choices
        .iter()
        .enumerate()
        .map(|(index, choice)| {
            let marker = if index == selected { MARKER } else { " " };
            format!("{} {}) {}", marker, index + 1, choice)
        })
        .collect()
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

fn draw(out: &mut impl Write, choices: &[String], selected: usize, redraw: bool) -> io::Result<()> {
    if redraw {
        queue!(
            out,
            MoveUp(choices.len() as u16),
            MoveToColumn(0),
            Clear(ClearType::FromCursorDown)
        )?;
    }
    for (index, line) in choice_lines(choices, selected).into_iter().enumerate() {
        let line = if index == selected {
            line.cyan().bold().to_string()
        } else {
            line
        };
        queue!(out, Print(line), Print("\r\n"))?;
    }
    out.flush()
}

/// Let the user pick with arrow keys, digits, or Enter. `None` when the user
/// rejects. Raw mode is left on drop, so cancelling the future is safe.
pub(super) async fn select_with_keys(choices: &[String]) -> io::Result<Option<usize>> {
    let mut selector = ChoiceSelector::new(choices.len());
    let mut stdout = io::stdout();
    let _raw = RawModeGuard::enable()?;
    let mut events = EventStream::new();

    draw(&mut stdout, choices, selector.selected(), false)?;
    while let Some(event) = events.next().await {
        let Event::Key(key) = event? else {
            continue;
        };
        match selector.handle_key(key) {
            KeyOutcome::Pending => draw(&mut stdout, choices, selector.selected(), true)?,
            KeyOutcome::Selected(index) => return Ok(Some(index)),
            KeyOutcome::Rejected => return Ok(None),
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn choices() -> Vec<String> {
        vec!["A".to_string(), "B".to_string(), "C".to_string()]
    }

    #[test]
    fn test_arrows_move_and_wrap() {
        let mut selector = ChoiceSelector::new(3);

        selector.move_up();
        assert_eq!(selector.selected(), 2);
        selector.move_down();
        assert_eq!(selector.selected(), 0);
        selector.move_down();
        assert_eq!(selector.selected(), 1);
    }

    #[test]
    fn test_enter_confirms_highlight_after_navigation() {
        let mut selector = ChoiceSelector::new(3);

        assert_eq!(selector.handle_key(press(KeyCode::Down)), KeyOutcome::Pending);
        assert_eq!(selector.handle_key(press(KeyCode::Down)), KeyOutcome::Pending);
        assert_eq!(selector.handle_key(press(KeyCode::Enter)), KeyOutcome::Selected(2));
    }

    #[test]
    fn test_digit_overrides_highlight() {
        let mut selector = ChoiceSelector::new(3);
        selector.move_down();

        assert_eq!(selector.handle_key(press(KeyCode::Char('3'))), KeyOutcome::Selected(2));
        assert_eq!(selector.handle_key(press(KeyCode::Char('9'))), KeyOutcome::Pending);
        assert_eq!(selector.handle_key(press(KeyCode::Char('0'))), KeyOutcome::Pending);
    }

    #[test]
    fn test_reject_keys() {
        let mut selector = ChoiceSelector::new(3);

        assert_eq!(selector.handle_key(press(KeyCode::Char('r'))), KeyOutcome::Rejected);
        assert_eq!(selector.handle_key(press(KeyCode::Esc)), KeyOutcome::Rejected);
        assert_eq!(
            selector.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            KeyOutcome::Rejected
        );
    }

    #[test]
    fn test_single_marker_on_highlighted_line() {
        let lines = choice_lines(&choices(), 1);

        let marked: Vec<&String> = lines.iter().filter(|line| line.contains(MARKER)).collect();
        assert_eq!(marked.len(), 1);
        assert!(marked[0].ends_with("2) B"));
        assert!(lines[0].starts_with("  1) A"));
    }
}
