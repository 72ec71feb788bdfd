//! Main error type for the adapter layer.

use std::time::Duration;
use thiserror::Error;

use super::categories::*;

/// Result type alias for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Top-level error type.
///
/// `Configuration` and `Transport` come from the collaborators around the
/// core; the remaining variants are raised by stream aggregation and
/// structured-output resolution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    /// Invalid client or resolver configuration.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Provider transport failure, propagated unchanged.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The argument fragments of a tool call did not form valid JSON.
    #[error("Malformed arguments for tool call {index}: {message} (raw: {raw:?})")]
    MalformedToolCall {
        /// Index of the offending tool call.
        index: usize,
        /// The concatenated argument buffer.
        raw: String,
        /// Parser message.
        message: String,
    },

    /// Function-calling extraction found no call with the target name.
    #[error("No tool call named '{expected}' found (got: {found:?})")]
    NoToolCallFound {
        /// The configured target function name.
        expected: String,
        /// Names of the tool calls that were present.
        found: Vec<String>,
    },

    /// JSON-mode content is not a JSON document.
    #[error("Response content is not valid JSON: {message}")]
    MalformedJson {
        /// Parser message.
        message: String,
        /// The content that failed to parse.
        raw: String,
    },

    /// The extracted value does not satisfy the output schema.
    #[error("Schema validation failed: {}", format_violations(.violations))]
    SchemaValidation {
        /// Every failed constraint, in validator order.
        violations: Vec<SchemaViolation>,
    },
}

fn format_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl AdapterError {
    /// Returns true for errors raised by the transport layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, AdapterError::Transport(_))
    }

    /// Returns the retry-after hint reported by the provider, if any.
    ///
    /// Nothing in this crate retries; the hint is surfaced for callers that do.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AdapterError::Transport(TransportError::Http { retry_after, .. }) => *retry_after,
            _ => None,
        }
    }

    /// Paths of the failing fields for a schema validation error.
    pub fn failing_paths(&self) -> Vec<&str> {
        match self {
            AdapterError::SchemaValidation { violations } => {
                violations.iter().map(|v| v.path.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}
