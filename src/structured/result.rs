//! Structured-output results.

use serde::{Deserialize, Serialize};

use crate::types::AggregatedMessage;

/// A value extracted from a model response.
///
/// Serializes as `{"parsed": ...}`, or `{"parsed": ..., "raw": ...}` when the
/// raw message was requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredResult<T> {
    /// The validated value.
    pub parsed: T,
    /// The message the value was extracted from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<AggregatedMessage>,
}

impl<T> StructuredResult<T> {
    /// Discards the raw message.
    pub fn into_parsed(self) -> T {
        self.parsed
    }

    /// Converts the parsed value, keeping the raw message.
    pub fn map<U, F>(self, f: F) -> StructuredResult<U>
    where
        F: FnOnce(T) -> U,
    {
        StructuredResult {
            parsed: f(self.parsed),
            raw: self.raw,
        }
    }
}
