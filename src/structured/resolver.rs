//! Resolution of model responses into validated structured values.

use futures::Stream;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::config::{ExtractionMethod, StructuredOutputConfig};
use super::result::StructuredResult;
use super::schema::{json_kind, OutputSchema};
use crate::error::{AdapterError, AdapterResult, SchemaViolation};
use crate::streaming::StreamAggregator;
use crate::types::{AggregatedMessage, ChatRequest, StreamChunk, ToolChoice, ToolDefinition};

/// Extracts a schema-conforming value from an [`AggregatedMessage`].
///
/// Resolution is a pure function of the message: resolving the same message
/// twice gives equal results.
#[derive(Debug, Clone)]
pub struct StructuredOutputResolver {
    schema: OutputSchema,
    config: StructuredOutputConfig,
}

impl StructuredOutputResolver {
    /// Creates a resolver.
    pub fn new(schema: OutputSchema, config: StructuredOutputConfig) -> AdapterResult<Self> {
        config.validate()?;
        Ok(Self { schema, config })
    }

    /// Compiles `schema` and creates a resolver.
    pub fn from_schema(schema: Value, config: StructuredOutputConfig) -> AdapterResult<Self> {
        Self::new(OutputSchema::new(schema)?, config)
    }

    /// The configuration in effect.
    pub fn config(&self) -> &StructuredOutputConfig {
        &self.config
    }

    /// The output schema.
    pub fn schema(&self) -> &OutputSchema {
        &self.schema
    }

    /// The tool bound in function-calling mode.
    pub fn tool_definition(&self) -> ToolDefinition {
        let tool = ToolDefinition::new(self.config.name.clone(), self.schema.document().clone());
        match &self.config.description {
            Some(description) => tool.with_description(description.clone()),
            None => tool,
        }
    }

    /// Adds what the extraction method needs to `request`.
    ///
    /// Function calling binds the schema as the only tool and forces a call;
    /// JSON mode asks the provider for a bare JSON document.
    pub fn bind(&self, request: ChatRequest) -> ChatRequest {
        match self.config.method {
            ExtractionMethod::FunctionCalling => request
                .with_tools(vec![self.tool_definition()])
                .with_tool_choice(ToolChoice::Any),
            ExtractionMethod::JsonMode => request.with_json_mode(),
        }
    }

    /// Resolves `message` into a typed value.
    ///
    /// The extracted JSON is validated against the schema before it is
    /// deserialized into `T`.
    pub fn resolve<T: DeserializeOwned>(
        &self,
        message: &AggregatedMessage,
    ) -> AdapterResult<StructuredResult<T>> {
        let value = self.extract(message)?;

        let violations = self.schema.validate(&value);
        if !violations.is_empty() {
            tracing::debug!(
                method = ?self.config.method,
                violations = violations.len(),
                "structured output failed schema validation"
            );
            return Err(AdapterError::SchemaValidation { violations });
        }

        let kind = json_kind(&value);
        let parsed = serde_json::from_value::<T>(value).map_err(|e| AdapterError::SchemaValidation {
            violations: vec![SchemaViolation {
                path: String::new(),
                expected: std::any::type_name::<T>().to_string(),
                actual: kind.to_string(),
                message: e.to_string(),
            }],
        })?;

        Ok(StructuredResult {
            parsed,
            raw: self.config.include_raw.then(|| message.clone()),
        })
    }

    /// Aggregates `stream` and resolves the resulting message.
    pub async fn resolve_stream<T, S>(&self, stream: S) -> AdapterResult<StructuredResult<T>>
    where
        T: DeserializeOwned,
        S: Stream<Item = AdapterResult<StreamChunk>>,
    {
        let message = StreamAggregator::aggregate(stream).await?;
        self.resolve(&message)
    }

    fn extract(&self, message: &AggregatedMessage) -> AdapterResult<Value> {
        match self.config.method {
            ExtractionMethod::FunctionCalling => {
                let call = message.tool_call(&self.config.name).ok_or_else(|| {
                    AdapterError::NoToolCallFound {
                        expected: self.config.name.clone(),
                        found: message.tool_calls.iter().map(|c| c.name.clone()).collect(),
                    }
                })?;

                tracing::debug!(index = call.index, name = %call.name, "extracting tool call arguments");
                call.parse_args().map_err(|e| AdapterError::MalformedToolCall {
                    index: call.index,
                    raw: call.args.clone(),
                    message: e.to_string(),
                })
            }
            ExtractionMethod::JsonMode => {
                serde_json::from_str(&message.content).map_err(|e| AdapterError::MalformedJson {
                    message: e.to_string(),
                    raw: message.content.clone(),
                })
            }
        }
    }
}
