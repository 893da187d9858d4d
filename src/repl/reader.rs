use async_trait::async_trait;
use colored::Colorize;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Stdin as lines, shared by the input loop and the interactive prompts.
#[derive(Clone)]
pub struct StdinLines {
    lines: Arc<Mutex<Lines<BufReader<Stdin>>>>,
}

impl StdinLines {
    pub fn new() -> Self {
        Self {
            lines: Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines())),
        }
    }

    /// `None` at end of input.
    pub async fn next_line(&self) -> io::Result<Option<String>> {
        self.lines.lock().await.next_line().await
    }
}

impl Default for StdinLines {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
pub trait LineReader: Send {
    /// Show `prompt` and read one line; `None` at end of input.
    async fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

pub struct StdinReader {
    input: StdinLines,
}

impl StdinReader {
    pub fn new(input: StdinLines) -> Self {
        Self { input }
    }
}

#[async_trait]
impl LineReader for StdinReader {
    async fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        print!("{}", prompt.cyan().bold());
        io::stdout().flush()?;
        self.input.next_line().await
    }
}

/// Replays fixed lines, then reports end of input.
#[derive(Debug, Default)]
pub struct ScriptedReader {
    lines: VecDeque<String>,
}

impl ScriptedReader {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl LineReader for ScriptedReader {
    async fn read_line(&mut self, _prompt: &str) -> io::Result<Option<String>> {
        Ok(self.lines.pop_front())
    }
}
