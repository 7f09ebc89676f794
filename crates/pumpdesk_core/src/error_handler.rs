use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type shown to users. Component errors convert into it.
#[derive(Debug, Error)]
pub enum PumpdeskError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Classification of errors for logging and user display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Error caused by user input.
    UserError,
    /// Invalid or missing configuration.
    ConfigError,
    /// Network connectivity or timeout issue.
    NetworkError,
    /// Internal system error (storage, file I/O, etc.).
    SystemError,
}

impl PumpdeskError {
    /// Returns the broad error category for routing and display purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) => ErrorCategory::ConfigError,
            Self::Validation(_) => ErrorCategory::UserError,
            Self::Network(_) => ErrorCategory::NetworkError,
            Self::Storage(_) | Self::Internal(_) => ErrorCategory::SystemError,
        }
    }

    /// Returns a user-friendly message (hides internal details).
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(msg) => format!("Configuration issue: {msg}"),
            Self::Validation(msg) => msg.clone(),
            Self::Network(_) => "Network error. Check your connection.".into(),
            Self::Storage(_) => "Storage error. Check disk space and permissions.".into(),
            Self::Internal(_) => "An unexpected error occurred.".into(),
        }
    }
}

impl From<std::io::Error> for PumpdeskError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_mapping() {
        assert_eq!(
            PumpdeskError::Config("x".into()).category(),
            ErrorCategory::ConfigError
        );
        assert_eq!(
            PumpdeskError::Network("x".into()).category(),
            ErrorCategory::NetworkError
        );
        assert_eq!(
            PumpdeskError::Storage("x".into()).category(),
            ErrorCategory::SystemError
        );
    }

    #[test]
    fn validation_is_user_error_with_plain_message() {
        let err = PumpdeskError::Validation("name is required".into());
        assert_eq!(err.category(), ErrorCategory::UserError);
        assert_eq!(err.user_message(), "name is required");
    }

    #[test]
    fn user_message_hides_internals() {
        let err = PumpdeskError::Internal("segfault at 0xdeadbeef".into());
        assert_eq!(err.user_message(), "An unexpected error occurred.");
    }

    #[test]
    fn io_error_becomes_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: PumpdeskError = io.into();
        assert!(matches!(err, PumpdeskError::Storage(_)));
        assert_eq!(err.to_string(), "Storage error: denied");
    }
}
