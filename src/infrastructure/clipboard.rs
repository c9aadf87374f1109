//! System clipboard access.

use arboard::Clipboard;

pub struct ClipboardService;

impl ClipboardService {
    /// Places `text` on the system clipboard.
    ///
    /// # Errors
    ///
    /// Returns a displayable message if no clipboard is available, as on a
    /// headless session, or if the write is refused.
    pub fn copy(text: &str) -> Result<(), String> {
        let mut clipboard = Clipboard::new().map_err(|e| e.to_string())?;
        clipboard.set_text(text.to_string()).map_err(|e| e.to_string())
    }
}
