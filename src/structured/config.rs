//! Structured-output configuration.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Default target function name.
pub const DEFAULT_FUNCTION_NAME: &str = "extract";

const FUNCTION_NAME_PATTERN: &str = r"^[a-zA-Z_][a-zA-Z0-9_-]{0,63}$";

/// How the structured value is pulled out of the model response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtractionMethod {
    /// Bind the schema as a forced tool and read the call's arguments.
    #[default]
    FunctionCalling,
    /// Ask for a bare JSON document and parse the text content.
    JsonMode,
}

/// Structured-output settings.
///
/// Deserializes from `{"name", "description", "method", "includeRaw"}`;
/// every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StructuredOutputConfig {
    /// Function name used in function-calling mode.
    pub name: String,
    /// Description sent with the bound function.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Extraction method.
    pub method: ExtractionMethod,
    /// Return the raw message alongside the parsed value.
    pub include_raw: bool,
}

impl Default for StructuredOutputConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_FUNCTION_NAME.to_string(),
            description: None,
            method: ExtractionMethod::default(),
            include_raw: false,
        }
    }
}

impl StructuredOutputConfig {
    /// Function-calling configuration targeting `name`.
    pub fn function_calling(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// JSON-mode configuration.
    pub fn json_mode() -> Self {
        Self {
            method: ExtractionMethod::JsonMode,
            ..Self::default()
        }
    }

    /// Sets the function description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets `include_raw`.
    pub fn with_include_raw(mut self, include_raw: bool) -> Self {
        self.include_raw = include_raw;
        self
    }

    /// Checks that the function name is acceptable to both providers.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.method == ExtractionMethod::JsonMode {
            return Ok(());
        }

        let pattern =
            Regex::new(FUNCTION_NAME_PATTERN).map_err(|e| ConfigurationError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        if pattern.is_match(&self.name) {
            Ok(())
        } else {
            Err(ConfigurationError::InvalidConfiguration {
                message: format!(
                    "function name '{}' must start with a letter or underscore and contain at most 64 letters, digits, '_' or '-'",
                    self.name
                ),
            })
        }
    }
}
