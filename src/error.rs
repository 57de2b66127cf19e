//! Error types for the threads persistence layer.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 3=not_found, 4=validation, 5=state, etc.)
//! - Retryability flags for callers that correct their input
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers
//!
//! Database errors are carried unmodified in [`Error::Database`]; this layer
//! never retries or reclassifies them.

use crate::model::StreamStatus;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for threads operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Programs match on the string; shell scripts on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    AlreadyInitialized,
    DatabaseError,

    // Not Found (exit 3)
    ThreadNotFound,
    ItemNotFound,
    StreamNotFound,
    RecordNotFound,

    // Validation (exit 4)
    ValidationFailed,
    UnknownColumn,
    InvalidArgument,

    // State (exit 5)
    InvalidTransition,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::ThreadNotFound => "THREAD_NOT_FOUND",
            Self::ItemNotFound => "ITEM_NOT_FOUND",
            Self::StreamNotFound => "STREAM_NOT_FOUND",
            Self::RecordNotFound => "RECORD_NOT_FOUND",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::UnknownColumn => "UNKNOWN_COLUMN",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::AlreadyInitialized | Self::DatabaseError => 2,
            Self::ThreadNotFound
            | Self::ItemNotFound
            | Self::StreamNotFound
            | Self::RecordNotFound => 3,
            Self::ValidationFailed | Self::UnknownColumn | Self::InvalidArgument => 4,
            Self::InvalidTransition => 5,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether a caller should retry with corrected input.
    ///
    /// True for validation errors and busy/locked database errors. False for
    /// not-found, state-machine, I/O, or internal errors.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ValidationFailed | Self::InvalidArgument | Self::DatabaseError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in threads operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `threads init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Thread not found: {id}")]
    ThreadNotFound { id: String },

    #[error("Item not found: {id}")]
    ItemNotFound { id: String },

    #[error("Stream not found: {id}")]
    StreamNotFound { id: String },

    #[error("{0} not found")]
    RecordNotFound(String),

    #[error("Invalid {entity}: {message}")]
    Validation {
        entity: &'static str,
        message: String,
    },

    #[error("Unknown column '{column}' on table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Stream {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: StreamStatus,
        to: StreamStatus,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a validation failure on `entity`.
    pub fn validation(entity: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            entity,
            message: message.into(),
        }
    }

    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::ThreadNotFound { .. } => ErrorCode::ThreadNotFound,
            Self::ItemNotFound { .. } => ErrorCode::ItemNotFound,
            Self::StreamNotFound { .. } => ErrorCode::StreamNotFound,
            Self::RecordNotFound(_) => ErrorCode::RecordNotFound,
            Self::Validation { .. } => ErrorCode::ValidationFailed,
            Self::UnknownColumn { .. } => ErrorCode::UnknownColumn,
            Self::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => {
                Some("Run `threads init` to create the database".to_string())
            }

            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `--force` to reinitialize.",
                path.display()
            )),

            Self::ThreadNotFound { id } => Some(format!(
                "No thread with ID '{id}'. Use `threads thread list --project <id>` to see threads."
            )),

            Self::ItemNotFound { id } => Some(format!(
                "No item with ID '{id}'. Use `threads item list <thread-id>` to see items."
            )),

            Self::StreamNotFound { id } => Some(format!(
                "No stream with ID '{id}'. Streams are removed with their thread."
            )),

            Self::InvalidTransition { from, .. } => Some(format!(
                "Stream is already '{from}'. Completed, aborted and expired streams are final; start a new stream instead."
            )),

            Self::InvalidArgument(msg) => {
                if msg.contains("role") {
                    Some(
                        "Valid roles: user, assistant, system, tool. \
                         Synonyms: human→user, ai→assistant, function→tool"
                            .to_string(),
                    )
                } else if msg.contains("visibility") {
                    Some(
                        "Valid visibilities: visible, hidden, archived. \
                         Synonyms: shown→visible, internal→hidden, deleted→archived"
                            .to_string(),
                    )
                } else if msg.contains("edge type") {
                    Some(
                        "Valid edge types: depends_on, caused_by. \
                         Synonyms: depends→depends_on, cause→caused_by"
                            .to_string(),
                    )
                } else {
                    None
                }
            }

            Self::RecordNotFound(_)
            | Self::Validation { .. }
            | Self::UnknownColumn { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_is_retryable() {
        let err = Error::validation("item", "request_id is required");
        assert_eq!(err.to_string(), "Invalid item: request_id is required");
        assert_eq!(err.error_code(), ErrorCode::ValidationFailed);
        assert!(err.error_code().is_retryable());
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_transition_error_has_hint() {
        let err = Error::InvalidTransition {
            id: "s1".to_string(),
            from: StreamStatus::Completed,
            to: StreamStatus::Aborted,
        };
        assert_eq!(err.exit_code(), 5);
        assert!(!err.error_code().is_retryable());
        assert!(err.hint().unwrap().contains("completed"));
    }

    #[test]
    fn test_structured_json_shape() {
        let err = Error::ThreadNotFound {
            id: "t-1".to_string(),
        };
        let json = err.to_structured_json();
        assert_eq!(json["error"]["code"], "THREAD_NOT_FOUND");
        assert_eq!(json["error"]["exit_code"], 3);
        assert_eq!(json["error"]["retryable"], false);
        assert!(json["error"]["hint"].is_string());
    }

    #[test]
    fn test_invalid_argument_hints_by_topic() {
        let role = Error::InvalidArgument("unknown role 'robot'".to_string());
        assert!(role.hint().unwrap().contains("assistant"));

        let other = Error::InvalidArgument("bad ttl".to_string());
        assert!(other.hint().is_none());
    }
}
