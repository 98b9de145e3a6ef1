/// System clipboard and status-line notices for the terminal front end
use async_trait::async_trait;
use log::warn;
use starfolio_core::{Clipboard, ClipboardError, Notifier};

/// Clipboard handle backed by `arboard`.
///
/// Opening the clipboard can fail on headless sessions; the failure is kept
/// and reported on every write instead of aborting startup.
pub struct SystemClipboard {
    inner: Result<arboard::Clipboard, String>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        let inner = arboard::Clipboard::new().map_err(|e| {
            warn!("system clipboard unavailable: {e}");
            e.to_string()
        });
        Self { inner }
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Clipboard for SystemClipboard {
    async fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        match &mut self.inner {
            Ok(clipboard) => clipboard
                .set_text(text.to_owned())
                .map_err(|e| ClipboardError::Rejected(e.to_string())),
            Err(reason) => Err(ClipboardError::Unavailable(reason.clone())),
        }
    }
}

/// Most recent notice, shown in the status line until replaced
#[derive(Debug, Default)]
pub struct StatusLine {
    message: Option<String>,
}

impl StatusLine {
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl Notifier for StatusLine {
    fn notify(&mut self, message: &str) {
        self.message = Some(message.to_string());
    }
}
