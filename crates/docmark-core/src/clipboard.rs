use std::sync::Mutex;

use crate::error::ClipboardError;

/// Destination for copied Markdown
pub trait ClipboardSink: Send + Sync {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Clipboard kept in memory. Used headless and in tests.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ClipboardSink for MemoryClipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        *self
            .contents
            .lock()
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))? = Some(text.to_string());
        Ok(())
    }
}
