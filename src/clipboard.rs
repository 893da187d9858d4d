use arboard::Clipboard;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Clipboard is not available: {0}")]
    Unavailable(String),

    #[error("Failed to copy to clipboard: {0}")]
    CopyFailed(String),
}

/// Copies text to the system clipboard. A clipboard is opened per copy so
/// headless sessions only fail when `/copy` is used.
#[derive(Debug, Default)]
pub struct ClipboardManager;

impl ClipboardManager {
    pub fn new() -> Self {
        Self
    }

    pub fn copy_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard =
            Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| ClipboardError::CopyFailed(e.to_string()))
    }
}
