//! Error handling for the protocol benchmark
//!
//! Three error kinds cross component boundaries: [`RemoteCallError`] for a
//! failed adapter call, [`InitializationError`] for a failed one-time adapter
//! setup, and [`AppError::InvalidBatch`] for statistics over an empty batch.
//! Everything else is folded into [`AppError`] at the application level.

use crate::types::Protocol;
use thiserror::Error;

/// A transport or protocol-level failure of a single adapter call
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{protocol} {operation} failed: {message}")]
pub struct RemoteCallError {
    pub protocol: Protocol,
    pub operation: &'static str,
    pub message: String,
}

impl RemoteCallError {
    pub fn new<S: Into<String>>(protocol: Protocol, operation: &'static str, message: S) -> Self {
        Self {
            protocol,
            operation,
            message: message.into(),
        }
    }
}

/// One-time adapter setup (WSDL fetch, gRPC channel) failed
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{protocol} client initialization failed: {message}")]
pub struct InitializationError {
    pub protocol: Protocol,
    pub message: String,
}

impl InitializationError {
    pub fn new<S: Into<String>>(protocol: Protocol, message: S) -> Self {
        Self {
            protocol,
            message: message.into(),
        }
    }
}

/// Everything a unified client call can fail with
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error(transparent)]
    RemoteCall(#[from] RemoteCallError),

    #[error(transparent)]
    Initialization(#[from] InitializationError),
}

impl ClientError {
    /// Protocol whose adapter produced this error
    pub fn protocol(&self) -> Protocol {
        match self {
            Self::RemoteCall(e) => e.protocol,
            Self::Initialization(e) => e.protocol,
        }
    }
}

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Contradictory or out-of-range command-line arguments
    #[error("Validation error: {0}")]
    Validation(String),

    /// Statistics requested over an empty batch
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    /// A remote call failure that escaped measurement
    #[error(transparent)]
    RemoteCall(#[from] RemoteCallError),

    /// An adapter initialization failure that escaped measurement
    #[error(transparent)]
    Initialization(#[from] InitializationError),

    /// Load test orchestration errors
    #[error("Test execution error: {0}")]
    TestExecution(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (URLs, JSON, etc.)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new invalid batch error
    pub fn invalid_batch<S: Into<String>>(message: S) -> Self {
        Self::InvalidBatch(message.into())
    }

    /// Create a new test execution error
    pub fn test_execution<S: Into<String>>(message: S) -> Self {
        Self::TestExecution(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Validation(_) => "VALIDATION",
            Self::InvalidBatch(_) => "STATS",
            Self::RemoteCall(_) => "REMOTE",
            Self::Initialization(_) => "INIT",
            Self::TestExecution(_) => "TEST",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Parse(_) => 1,
            Self::RemoteCall(_) | Self::Initialization(_) => 2,
            Self::Validation(_) => 3,
            Self::Io(_) => 5,
            Self::TestExecution(_) | Self::InvalidBatch(_) => 6,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::RemoteCall(_) | Self::Initialization(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Io(_) | Self::TestExecution(_) | Self::InvalidBatch(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

impl From<ClientError> for AppError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::RemoteCall(e) => Self::RemoteCall(e),
            ClientError::Initialization(e) => Self::Initialization(e),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {}", error))
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_call_error_display() {
        let error = RemoteCallError::new(Protocol::GraphQl, "list_users", "GraphQL error: boom");
        assert_eq!(error.to_string(), "GraphQL list_users failed: GraphQL error: boom");
    }

    #[test]
    fn test_client_error_protocol() {
        let init: ClientError = InitializationError::new(Protocol::Soap, "no WSDL").into();
        assert_eq!(init.protocol(), Protocol::Soap);

        let remote: ClientError = RemoteCallError::new(Protocol::Grpc, "list_tracks", "unavailable").into();
        assert_eq!(remote.protocol(), Protocol::Grpc);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::config("bad").exit_code(), 1);
        assert_eq!(AppError::validation("--color conflicts with --no-color").exit_code(), 3);
        assert_eq!(AppError::invalid_batch("empty").exit_code(), 6);
        assert_eq!(AppError::internal("bug").exit_code(), 99);

        let remote: AppError = ClientError::from(RemoteCallError::new(Protocol::Rest, "list_users", "x")).into();
        assert_eq!(remote.exit_code(), 2);
        assert_eq!(remote.category(), "REMOTE");
    }

    #[test]
    fn test_format_for_console_plain() {
        let error = AppError::validation("request count must be at least 1");
        assert_eq!(
            error.format_for_console(false),
            "[VALIDATION] Validation error: request count must be at least 1"
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: AppError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(parse, AppError::Parse(_)));
        assert_eq!(parse.exit_code(), 1);
    }
}
