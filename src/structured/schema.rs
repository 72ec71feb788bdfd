//! Compiled output schemas.

use jsonschema::error::ValidationErrorKind;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::{ConfigurationError, SchemaViolation};

/// A JSON Schema document compiled for validation.
///
/// Cloning is cheap; the compiled validator is shared.
#[derive(Clone)]
pub struct OutputSchema {
    document: Value,
    validator: Arc<jsonschema::Validator>,
}

impl OutputSchema {
    /// Compiles `document`.
    ///
    /// An invalid schema is reported as a configuration error.
    pub fn new(document: Value) -> Result<Self, ConfigurationError> {
        let validator =
            jsonschema::validator_for(&document).map_err(|e| ConfigurationError::InvalidSchema {
                message: e.to_string(),
            })?;

        Ok(Self {
            document,
            validator: Arc::new(validator),
        })
    }

    /// The schema document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Returns true if `instance` satisfies the schema.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Collects every failed constraint for `instance`.
    ///
    /// Types are checked strictly: `"2"` never satisfies `"type": "number"`.
    /// A missing required field is reported at its own path with actual
    /// kind `missing`.
    pub fn validate(&self, instance: &Value) -> Vec<SchemaViolation> {
        self.validator
            .iter_errors(instance)
            .map(|error| {
                let instance_path = error.instance_path.to_string();
                let schema_path = error.schema_path.to_string();
                let message = error.to_string();

                if let ValidationErrorKind::Required { property } = &error.kind {
                    let name = property
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| property.to_string());
                    let parent = schema_path.strip_suffix("/required").unwrap_or("");
                    return SchemaViolation {
                        path: format!("{}/{}", instance_path, escape_pointer(&name)),
                        expected: self.declared_type(parent, &name),
                        actual: "missing".to_string(),
                        message,
                    };
                }

                SchemaViolation {
                    path: instance_path,
                    expected: self.expected_at(&schema_path),
                    actual: json_kind(&error.instance).to_string(),
                    message,
                }
            })
            .collect()
    }

    /// Declared `type` of `property` under the schema at `parent`, or
    /// `present` when the schema does not declare one.
    fn declared_type(&self, parent: &str, property: &str) -> String {
        let pointer = format!("{}/properties/{}/type", parent, escape_pointer(property));
        match self.document.pointer(&pointer) {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => "present".to_string(),
        }
    }

    /// Renders the schema keyword value that failed, e.g. `number` for a
    /// `type` keyword. Falls back to the keyword name when the path leads
    /// through a `$ref`.
    fn expected_at(&self, schema_path: &str) -> String {
        match self.document.pointer(schema_path) {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => schema_path
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string(),
        }
    }
}

impl fmt::Debug for OutputSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSchema")
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// JSON kind of a value, as named by JSON Schema.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
