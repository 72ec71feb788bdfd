//! Error category types for granular error handling.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// No API key or access token was supplied.
    #[error("Missing credential: {name}")]
    MissingCredential {
        /// Name of the missing credential (usually the environment variable).
        name: String,
    },

    /// The base URL could not be parsed or uses an unsupported scheme.
    #[error("Invalid base URL: {url}")]
    InvalidBaseUrl {
        /// The offending URL.
        url: String,
    },

    /// The output schema is not a valid JSON Schema document.
    #[error("Invalid output schema: {message}")]
    InvalidSchema {
        /// Compiler message from the schema validator.
        message: String,
    },

    /// Any other invalid setting.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Description of the problem.
        message: String,
    },
}

/// Errors raised while talking to a provider.
///
/// These are produced by the transport and the provider decoders and pass
/// through the aggregation core untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// Could not establish a connection.
    #[error("Connection failed: {message}")]
    Connection {
        /// Underlying client message.
        message: String,
    },

    /// The request exceeded the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The provider answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Provider error message, or a generic one when the body had none.
        message: String,
        /// Raw response body.
        body: String,
        /// Retry hint from the `retry-after` header.
        retry_after: Option<Duration>,
    },

    /// The response stream broke off or carried invalid bytes.
    #[error("Stream interrupted: {message}")]
    Stream {
        /// Description of the interruption.
        message: String,
    },

    /// A provider payload did not match the expected wire format.
    #[error("Failed to decode provider payload: {message}")]
    Decode {
        /// Deserializer message.
        message: String,
        /// The payload that failed to decode.
        body: String,
    },
}

/// One failed schema constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// JSON pointer of the failing value; empty for the document root.
    pub path: String,
    /// What the schema asked for at that location (e.g. `"number"`).
    pub expected: String,
    /// JSON kind of the value actually found (e.g. `"string"`).
    pub actual: String,
    /// Validator message.
    pub message: String,
}

impl SchemaViolation {
    /// Returns the path with a leading slash, `/` for the root.
    pub fn display_path(&self) -> &str {
        if self.path.is_empty() {
            "/"
        } else {
            &self.path
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, found {} ({})",
            self.display_path(),
            self.expected,
            self.actual,
            self.message
        )
    }
}
