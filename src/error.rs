//! Error types for the persona simulator
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - A recoverability split the scheduler uses to decide skip-or-abort
//! - Exit codes for CLI

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for simulator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,
    PersonaInvalid = 103,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,

    // Validation errors (4xx)
    InvalidParameter = 400,

    // Generation errors (5xx)
    GenerationFailed = 500,
    GenerationTimeout = 501,

    // Persistence errors (6xx)
    PersistenceFailed = 600,
    SerializationFailed = 601,

    // Internal errors (9xx)
    InternalError = 900,
    NotSupported = 902,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10, // Config errors
            200..=299 => 20, // IO errors
            400..=499 => 40, // Validation errors
            500..=599 => 50, // Generation errors
            600..=699 => 60, // Persistence errors
            900..=999 => 90, // Internal errors
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for the simulator
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    /// Persona could not be built or is unusable (unknown region, bad age range, ...)
    #[error("Invalid persona '{persona}': {message}")]
    PersonaInvalid { persona: String, message: String },

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    // ─────────────────────────────────────────────────────────────
    // Validation Errors
    // ─────────────────────────────────────────────────────────────

    /// Malformed parameters passed to a component operation
    #[error("Invalid parameter '{field}': {message}")]
    Validation { field: String, message: String },

    // ─────────────────────────────────────────────────────────────
    // Generation Errors
    // ─────────────────────────────────────────────────────────────

    /// A generation backend failed
    #[error("{service} generation failed: {message}")]
    Generation { service: String, message: String },

    /// A generation backend did not answer in time
    #[error("{service} generation timed out after {timeout_secs}s")]
    GenerationTimeout { service: String, timeout_secs: u64 },

    // ─────────────────────────────────────────────────────────────
    // Persistence Errors
    // ─────────────────────────────────────────────────────────────

    /// Storing a post or one of its artifacts failed
    #[error("Failed to persist {path}: {message}")]
    Persistence {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Post record could not be serialized
    #[error("Failed to serialize post record: {0}")]
    Serialization(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Feature not supported
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,
            Error::PersonaInvalid { .. } => ErrorCode::PersonaInvalid,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },
            Error::Toml(_) => ErrorCode::ConfigParseError,

            Error::Validation { .. } => ErrorCode::InvalidParameter,

            Error::Generation { .. } => ErrorCode::GenerationFailed,
            Error::GenerationTimeout { .. } => ErrorCode::GenerationTimeout,

            Error::Persistence { .. } => ErrorCode::PersistenceFailed,
            Error::Serialization(_) => ErrorCode::SerializationFailed,

            Error::NotSupported(_) => ErrorCode::NotSupported,
            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Whether a post cycle failing with this error may be skipped and the
    /// simulation continued
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Generation { .. }
                | Error::GenerationTimeout { .. }
                | Error::Persistence { .. }
                | Error::Serialization(_)
        )
    }

    /// Check if the error is fatal (simulation should exit)
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConfigNotFound { .. }
                | Error::ConfigParse { .. }
                | Error::ConfigValidation { .. }
                | Error::PersonaInvalid { .. }
                | Error::Internal(_)
        )
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'persona-sim config init' to create a default configuration file."
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. \
                 Run 'persona-sim config validate' to see details."
            ),
            Error::ConfigValidation { .. } => Some(
                "Review the configuration file and fix the invalid values."
            ),
            Error::PersonaInvalid { .. } => Some(
                "Supported regions are 'India' and 'South Korea'; \
                 age ranges must be written as [min, max]."
            ),
            Error::Generation { .. } => Some(
                "Check that the generation backend is reachable, \
                 or switch the service to 'mock' under [services]."
            ),
            Error::GenerationTimeout { .. } => Some(
                "Increase 'timeout_secs' under [openai] or check the backend load."
            ),
            Error::Persistence { .. } => Some(
                "Check that the output directory exists and is writable."
            ),
            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let code = self.code();
        let suggestion = self.suggestion();

        let mut output = format!(
            "\x1b[31mError [{}]\x1b[0m: {}\n",
            code.as_str(),
            self
        );

        if let Some(hint) = suggestion {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        let code = self.code();
        format!("[{}] {}", code.as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors (for ergonomic error creation)
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Error::ConfigNotFound {
            path: path.into(),
            source: None,
        }
    }

    /// Create a config parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Error::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a config validation error
    pub fn config_validation(message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create an invalid persona error
    pub fn persona_invalid(persona: impl Into<String>, message: impl Into<String>) -> Self {
        Error::PersonaInvalid {
            persona: persona.into(),
            message: message.into(),
        }
    }

    /// Create a validation error for a malformed parameter
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a generation failure for the named service
    pub fn generation(service: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Generation {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Report a request a generation service refused as a failure of that
    /// service. Other errors pass through unchanged.
    pub fn rejected_by(self, service: &str) -> Self {
        match self {
            Error::Validation { field, message } => {
                Error::generation(service, format!("rejected {}: {}", field, message))
            }
            other => other,
        }
    }

    /// Create a persistence failure for a path
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Persistence {
            path: path.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::ConfigNotFound.as_str(), "E100");
        assert_eq!(ErrorCode::GenerationFailed.as_str(), "E500");
        assert_eq!(ErrorCode::InternalError.as_str(), "E900");
    }

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(ErrorCode::ConfigNotFound.exit_code(), 10);
        assert_eq!(ErrorCode::PersonaInvalid.exit_code(), 10);
        assert_eq!(ErrorCode::IoRead.exit_code(), 20);
        assert_eq!(ErrorCode::InvalidParameter.exit_code(), 40);
        assert_eq!(ErrorCode::GenerationFailed.exit_code(), 50);
        assert_eq!(ErrorCode::PersistenceFailed.exit_code(), 60);
        assert_eq!(ErrorCode::InternalError.exit_code(), 90);
    }

    #[test]
    fn test_error_display() {
        let err = Error::generation("image", "backend offline");
        assert_eq!(err.to_string(), "image generation failed: backend offline");

        let err = Error::persona_invalid("nepali", "unsupported region 'Nepal'");
        assert!(err.to_string().contains("nepali"));
    }

    #[test]
    fn test_recoverable_split() {
        assert!(Error::generation("text", "boom").is_recoverable());
        let timeout = Error::GenerationTimeout {
            service: "text".into(),
            timeout_secs: 5,
        };
        assert!(timeout.is_recoverable());
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(Error::persistence("/out/post.json", io).is_recoverable());

        assert!(!Error::config_validation("bad").is_recoverable());
        assert!(!Error::persona_invalid("x", "bad region").is_recoverable());
        assert!(!Error::validation("style", "unsupported").is_recoverable());
    }

    #[test]
    fn test_rejected_by_service_is_recoverable() {
        let err = Error::validation("style", "image style 'energetic' is not supported");
        let rejected = err.rejected_by("image");
        assert!(rejected.is_recoverable());
        assert!(rejected.to_string().contains("energetic"));

        let err = Error::Internal("x".into()).rejected_by("image");
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn test_error_fatal() {
        assert!(Error::config_not_found("/test").is_fatal());
        assert!(Error::persona_invalid("x", "bad").is_fatal());
        assert!(!Error::generation("text", "boom").is_fatal());
    }

    #[test]
    fn test_error_suggestions() {
        let err = Error::config_not_found("/test");
        assert!(err.suggestion().unwrap().contains("config init"));

        let err = Error::generation("text", "down");
        assert!(err.suggestion().unwrap().contains("mock"));

        assert!(Error::Internal("x".into()).suggestion().is_none());
    }

    #[test]
    fn test_format_for_terminal() {
        let err = Error::config_not_found("/test/config.toml");
        let formatted = err.format_for_terminal();

        assert!(formatted.contains("E100"));
        assert!(formatted.contains("\x1b[31m"));
        assert!(formatted.contains("Hint"));
    }

    #[test]
    fn test_format_for_log() {
        let err = Error::validation("culture", "unknown culture 'atlantis'");
        let formatted = err.format_for_log();

        assert!(formatted.contains("[E400]"));
        assert!(!formatted.contains("\x1b["));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        assert_eq!(err.code(), ErrorCode::IoNotFound);
    }
}
