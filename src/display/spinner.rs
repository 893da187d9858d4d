use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const BRAILLE_SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Waiting indicator drawn on stderr while the agent has not produced output.
pub struct TerminalSpinner {
    message: String,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TerminalSpinner {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        // Piped or redirected stderr gets no animation.
        if !io::stderr().is_terminal() {
            return;
        }

        self.running.store(true, Ordering::SeqCst);
        let message = self.message.clone();
        let running = Arc::clone(&self.running);

        self.handle = Some(thread::spawn(move || {
            let mut frame = 0;
            while running.load(Ordering::SeqCst) {
                let spinner_char = BRAILLE_SPINNER[frame % BRAILLE_SPINNER.len()];
                eprint!("\r{} {}", spinner_char, message);
                let _ = io::stderr().flush();

                frame += 1;
                thread::sleep(Duration::from_millis(80));
            }
        }));
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            eprint!("\r\x1b[2K");
            let _ = io::stderr().flush();
        }
    }
}

impl Drop for TerminalSpinner {
    fn drop(&mut self) {
        self.stop();
    }
}
