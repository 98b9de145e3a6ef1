//! Copy-to-clipboard flow shared by every front end.

use async_trait::async_trait;
use log::{info, warn};

use crate::config::ClipboardConfig;
use crate::error::ClipboardError;

/// System clipboard. Writes may suspend (permission prompts) and may be
/// rejected by the platform.
#[async_trait(?Send)]
pub trait Clipboard {
    async fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Shows a message to the user
pub trait Notifier {
    fn notify(&mut self, message: &str);
}

/// User-facing wording for the two outcomes
#[derive(Debug, Clone)]
pub struct CopyMessages {
    pub success: String,
    pub failure_prefix: String,
}

impl CopyMessages {
    pub fn failure(&self, error: &ClipboardError) -> String {
        format!("{}: {error}", self.failure_prefix)
    }
}

impl Default for CopyMessages {
    fn default() -> Self {
        Self::from(&ClipboardConfig::default())
    }
}

impl From<&ClipboardConfig> for CopyMessages {
    fn from(config: &ClipboardConfig) -> Self {
        Self {
            success: config.success_message.clone(),
            failure_prefix: config.failure_prefix.clone(),
        }
    }
}

/// Write `text` to the clipboard and tell the user how it went.
///
/// Exactly one notice is shown per call. There is no retry; the error is
/// also returned so callers can log it.
pub async fn copy_to_clipboard<C, N>(
    text: &str,
    clipboard: &mut C,
    notifier: &mut N,
    messages: &CopyMessages,
) -> Result<(), ClipboardError>
where
    C: Clipboard + ?Sized,
    N: Notifier + ?Sized,
{
    match clipboard.write_text(text).await {
        Ok(()) => {
            info!("copied {} characters to clipboard", text.chars().count());
            notifier.notify(&messages.success);
            Ok(())
        }
        Err(e) => {
            warn!("clipboard write failed: {e}");
            notifier.notify(&messages.failure(&e));
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingClipboard {
        written: Vec<String>,
        reject_with: Option<ClipboardError>,
    }

    #[async_trait(?Send)]
    impl Clipboard for RecordingClipboard {
        async fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            self.written.push(text.to_string());
            match &self.reject_with {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        notices: Vec<String>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&mut self, message: &str) {
            self.notices.push(message.to_string());
        }
    }

    #[test]
    fn success_writes_exact_text_and_confirms_once() {
        let mut clipboard = RecordingClipboard::default();
        let mut notifier = RecordingNotifier::default();
        let text = "  someone@example.com\n";

        let result = pollster::block_on(copy_to_clipboard(
            text,
            &mut clipboard,
            &mut notifier,
            &CopyMessages::default(),
        ));

        assert!(result.is_ok());
        assert_eq!(clipboard.written, vec![text.to_string()]);
        assert_eq!(notifier.notices, vec!["Email has been copied!".to_string()]);
    }

    #[test]
    fn failure_notice_contains_error_text() {
        let mut clipboard = RecordingClipboard {
            reject_with: Some(ClipboardError::Rejected(
                "NotAllowedError: Write permission denied.".into(),
            )),
            ..Default::default()
        };
        let mut notifier = RecordingNotifier::default();

        let result = pollster::block_on(copy_to_clipboard(
            "someone@example.com",
            &mut clipboard,
            &mut notifier,
            &CopyMessages::default(),
        ));

        assert!(matches!(result, Err(ClipboardError::Rejected(_))));
        assert_eq!(clipboard.written.len(), 1, "no retry after rejection");
        assert_eq!(notifier.notices.len(), 1);
        assert_eq!(
            notifier.notices[0],
            "Failed to copy email: NotAllowedError: Write permission denied."
        );
    }

    #[test]
    fn messages_follow_config() {
        let config = ClipboardConfig {
            success_message: "copied".into(),
            failure_prefix: "nope".into(),
            text: None,
        };
        let messages = CopyMessages::from(&config);
        let err = ClipboardError::Unavailable("no display".into());
        assert_eq!(messages.failure(&err), "nope: clipboard unavailable: no display");
    }
}
