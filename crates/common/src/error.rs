//! Error types for the note-read subsystem.

use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Caller Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A note was delivered as both mentioned and specified.
    #[error("Invalid unread flags for note {note_id}: a note cannot be both specified and mentioned")]
    InvalidFlags {
        /// The offending note.
        note_id: String,
    },

    /// The service has been shut down and accepts no new deferred notices.
    #[error("Note read service is shutting down")]
    ShuttingDown,

    // === Infrastructure Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Returns the error code used in logs and command replies.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidFlags { .. } => "INVALID_FLAGS",
            Self::ShuttingDown => "SHUTTING_DOWN",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Redis(_) => "REDIS_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Returns whether this error comes from infrastructure rather than the caller.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Redis(_) | Self::Config(_))
    }

    /// Level this error is logged at: `ERROR` for infrastructure, `WARN` otherwise.
    #[must_use]
    pub const fn log_level(&self) -> tracing::Level {
        if self.is_server_error() {
            tracing::Level::ERROR
        } else {
            tracing::Level::WARN
        }
    }

    /// Log this error at [`log_level`](Self::log_level).
    pub fn log(&self, context: &str) {
        if self.log_level() == tracing::Level::ERROR {
            tracing::error!(error = %self, code = self.error_code(), "{context}");
        } else {
            tracing::warn!(error = %self, code = self.error_code(), "{context}");
        }
    }
}

// === From implementations ===

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors() {
        assert!(AppError::Database("down".to_string()).is_server_error());
        assert!(AppError::Redis("down".to_string()).is_server_error());
        assert!(!AppError::ShuttingDown.is_server_error());
        assert!(
            !AppError::InvalidFlags {
                note_id: "n1".to_string()
            }
            .is_server_error()
        );
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(
            AppError::Database("down".to_string()).log_level(),
            tracing::Level::ERROR
        );
        assert_eq!(AppError::ShuttingDown.log_level(), tracing::Level::WARN);
        assert_eq!(
            AppError::NotFound("note".to_string()).log_level(),
            tracing::Level::WARN
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::ShuttingDown.error_code(), "SHUTTING_DOWN");
        assert_eq!(
            AppError::InvalidFlags {
                note_id: "n1".to_string()
            }
            .error_code(),
            "INVALID_FLAGS"
        );
        assert_eq!(
            AppError::Database("x".to_string()).error_code(),
            "DATABASE_ERROR"
        );
    }

    #[test]
    fn test_from_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let app: AppError = err.into();
        assert!(matches!(app, AppError::Validation(_)));
    }
}
