/// Error types shared by the scene, texture and clipboard layers
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("failed to read texture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode texture {path}: {reason}")]
    Decode { path: String, reason: String },
}

/// Failure reported by a clipboard write.
///
/// `Rejected` carries the platform's description verbatim so it can be shown
/// to the user unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ValidationError("camera.near must be positive".into());
        assert_eq!(
            err.to_string(),
            "config validation error: camera.near must be positive"
        );
    }

    #[test]
    fn texture_error_display() {
        let err = TextureError::Decode {
            path: "earth.png".into(),
            reason: "bad crc".into(),
        };
        assert_eq!(err.to_string(), "failed to decode texture earth.png: bad crc");
    }

    #[test]
    fn rejected_clipboard_error_is_raw_reason() {
        let err = ClipboardError::Rejected("NotAllowedError: Document is not focused.".into());
        assert_eq!(err.to_string(), "NotAllowedError: Document is not focused.");
    }
}
