//! Unified error handling for the capstan crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while keeping the gateway's `ApiError`
//! usable on its own where only HTTP concerns matter.
//!
//! # Architecture
//!
//! - [`ApiError`] - Request-level failures raised by the gateway
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum used across module boundaries

use std::io;
use thiserror::Error;

// Re-export the gateway error for convenience
pub use crate::gateway::ApiError;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Transport-level failures (connect, timeout)
    Network,
    /// Rejections reported by the backend
    Server,
    /// Local persistence and I/O errors
    Storage,
    /// Configuration and validation errors
    Config,
    /// Bad values caught before any request is made
    Input,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Server => "server",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Input => "input",
            Self::Other => "other",
        }
    }
}

/// Unified error type for the capstan crate
///
/// Wraps the gateway and storage errors so callers can use one error type
/// across module boundaries while preserving the detailed error information.
#[derive(Error, Debug)]
pub enum Error {
    /// Request execution errors (transport, server rejection, bad body)
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// I/O errors from the local preference store
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Client-side validation failures (never sent to the server)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error for a value rejected before submission
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Api(e) => match e {
                ApiError::Network(_) => ErrorCategory::Network,
                ApiError::Server { .. } => ErrorCategory::Server,
                ApiError::Decode(_) | ApiError::InvalidUrl(_) => ErrorCategory::Other,
            },
            Self::Io(_) => ErrorCategory::Storage,
            Self::Json(_) => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Config,
            Self::InvalidInput(_) => ErrorCategory::Input,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }

    /// True when the backend rejected the credential (401/403).
    ///
    /// Callers may inspect this, but nothing reauthenticates automatically.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_auth())
    }

    /// Message suitable for user-facing display.
    ///
    /// Server rejections show the backend's own `error` text; everything
    /// else falls back to the Display impl.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(ApiError::Server { message, .. }) => message.clone(),
            other => other.to_string(),
        }
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category() {
        let server_err = Error::Api(ApiError::server(500, "boom"));
        assert_eq!(server_err.category(), ErrorCategory::Server);

        let input_err = Error::invalid_input("interval must be positive");
        assert_eq!(input_err.category(), ErrorCategory::Input);
    }

    #[test]
    fn test_is_auth() {
        assert!(Error::Api(ApiError::server(401, "bad token")).is_auth());
        assert!(Error::Api(ApiError::server(403, "forbidden")).is_auth());
        assert!(!Error::Api(ApiError::server(500, "boom")).is_auth());
        assert!(!Error::config("missing url").is_auth());
    }

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = Error::Api(ApiError::server(400, "用户名或密码错误"));
        assert_eq!(err.user_message(), "用户名或密码错误");
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("server url must not be empty");
        assert_eq!(err.category(), ErrorCategory::Config);
    }

    #[test]
    fn test_other_error() {
        let err = Error::other("something went wrong");
        assert_eq!(err.category(), ErrorCategory::Other);
        assert_eq!(err.to_string(), "something went wrong");
    }
}
