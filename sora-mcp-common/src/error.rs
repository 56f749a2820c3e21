//! Error types for the common library.
//!
//! This module provides a unified error hierarchy using `thiserror` for consistent
//! error handling between the Sora client, the tool adapters and the server bootstrap.
//!
//! # Error Categories
//!
//! - `ConfigError`: Missing or invalid configuration
//! - `Error::Api`: Non-2xx responses from the Sora API (includes endpoint, status and raw body)
//! - `Error::Request`: The request never produced a response (connect, reset, body read)
//! - `Error::Io`: File system operations
//! - `Error::Context`: Any of the above, labelled with the step that failed

use thiserror::Error;

/// Unified error type for the common library.
///
/// Tool adapters never let this escape to the transport: every variant is
/// rendered into an error-flagged tool result by the server layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors (missing env vars, invalid values)
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// API errors with endpoint and HTTP status context
    ///
    /// `message` carries the upstream response body verbatim so that
    /// validation failures reported by the API reach the caller unchanged.
    #[error("API error for {endpoint} (HTTP {status_code}): {message}")]
    Api {
        /// The API endpoint that was called
        endpoint: String,
        /// HTTP status code returned by the API
        status_code: u16,
        /// Response body text, or a description of the failure
        message: String,
    },

    /// The request failed before an HTTP status was received
    #[error("Request to {endpoint} failed: {message}")]
    Request {
        /// The API endpoint that was called
        endpoint: String,
        /// Description of the transport failure
        message: String,
    },

    /// File system I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// An error labelled with the step that produced it
    #[error("{context}: {source}")]
    Context {
        /// Human-readable description of the failed step
        context: String,
        /// The underlying error
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a new API error with endpoint, status code, and message.
    ///
    /// # Example
    ///
    /// ```
    /// use sora_mcp_common::error::Error;
    ///
    /// let err = Error::api(
    ///     "https://api.openai.com/v1/videos",
    ///     400,
    ///     r#"{"error":{"message":"invalid size"}}"#
    /// );
    /// assert!(err.to_string().contains("400"));
    /// assert!(err.to_string().contains("invalid size"));
    /// ```
    pub fn api(endpoint: impl Into<String>, status_code: u16, message: impl Into<String>) -> Self {
        Error::Api {
            endpoint: endpoint.into(),
            status_code,
            message: message.into(),
        }
    }

    /// Create a new request error for a call that never got a response.
    pub fn request(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Request {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Label this error with the step that produced it.
    ///
    /// # Example
    ///
    /// ```
    /// use sora_mcp_common::error::Error;
    ///
    /// let err = Error::api("https://api.openai.com/v1/videos/v1", 404, "not found")
    ///     .context("Failed to check video status");
    /// assert!(err.to_string().starts_with("Failed to check video status: "));
    /// ```
    pub fn context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// HTTP status code of the underlying API error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status_code, .. } => Some(*status_code),
            Error::Context { source, .. } => source.status_code(),
            _ => None,
        }
    }
}

/// Configuration errors.
///
/// These errors occur when loading or validating configuration from
/// environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("Required environment variable {0} is not set")]
    MissingEnvVar(String),

    /// An environment variable has an invalid value
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl ConfigError {
    /// Create a new missing environment variable error.
    pub fn missing_env_var(name: impl Into<String>) -> Self {
        ConfigError::MissingEnvVar(name.into())
    }

    /// Create a new invalid value error.
    pub fn invalid_value(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue(name.into(), reason.into())
    }
}

/// Result type alias using the unified Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_includes_endpoint_and_status() {
        let err = Error::api("https://api.openai.com/v1/videos", 500, "Internal error");
        let msg = err.to_string();
        assert!(msg.contains("api.openai.com"), "Should contain endpoint");
        assert!(msg.contains("500"), "Should contain status code");
        assert!(msg.contains("Internal error"), "Should contain message");
    }

    #[test]
    fn test_request_error_includes_endpoint() {
        let err = Error::request("https://api.openai.com/v1/videos", "connection reset");
        let msg = err.to_string();
        assert!(msg.contains("api.openai.com"));
        assert!(msg.contains("connection reset"));
    }

    #[test]
    fn test_config_error_includes_var_name() {
        let err = ConfigError::missing_env_var("OPENAI_API_KEY");
        let msg = err.to_string();
        assert!(msg.contains("OPENAI_API_KEY"), "Should contain variable name");
    }

    #[test]
    fn test_error_from_config_error() {
        let config_err = ConfigError::missing_env_var("TEST_VAR");
        let err: Error = config_err.into();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_context_prefixes_message() {
        let err = Error::api("https://api.openai.com/v1/videos/abc/content", 502, "Bad gateway")
            .context("Failed to download video content");
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to download video content: "));
        assert!(msg.contains("502"));
        assert!(msg.contains("Bad gateway"));
    }

    #[test]
    fn test_status_code_looks_through_context() {
        let err = Error::api("e", 404, "missing").context("outer").context("outermost");
        assert_eq!(err.status_code(), Some(404));

        let io: Error = std::io::Error::other("disk full").into();
        assert_eq!(io.status_code(), None);
    }
}
