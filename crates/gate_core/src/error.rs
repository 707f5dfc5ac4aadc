use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised at the non-pure edges of the gate: settings persistence,
/// file watching and configuration parsing.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("Settings store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}

/// Classification of errors for logging and user display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// The settings store could not be read or written.
    StorageError,
    /// Invalid or missing configuration.
    ConfigError,
    /// Local system failure (file I/O, watcher).
    SystemError,
}

impl GateError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Store(_) => ErrorCategory::StorageError,
            Self::Config(_) | Self::Json(_) => ErrorCategory::ConfigError,
            Self::Io(_) | Self::Watch(_) => ErrorCategory::SystemError,
        }
    }

    /// Returns a user-friendly message (hides internal details).
    pub fn user_message(&self) -> String {
        match self {
            Self::Store(msg) => format!("Could not save settings: {msg}"),
            Self::Config(msg) => format!("Settings issue: {msg}"),
            Self::Json(_) => "Settings file is not valid JSON.".into(),
            Self::Io(_) => "File error. Check disk space and permissions.".into(),
            Self::Watch(_) => "Settings changes will not be picked up automatically.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        assert_eq!(GateError::Store("x".into()).category(), ErrorCategory::StorageError);
        assert_eq!(GateError::Config("x".into()).category(), ErrorCategory::ConfigError);
        let io = GateError::from(std::io::Error::other("disk"));
        assert_eq!(io.category(), ErrorCategory::SystemError);
    }

    #[test]
    fn json_errors_convert() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let gate: GateError = err.into();
        assert_eq!(gate.category(), ErrorCategory::ConfigError);
        assert!(gate.to_string().starts_with("JSON error"));
    }

    #[test]
    fn user_message_hides_io_details() {
        let io = GateError::from(std::io::Error::other("/secret/path"));
        assert!(!io.user_message().contains("/secret/path"));
    }
}
