//! Structured-output extraction.
//!
//! A [`StructuredOutputResolver`] pairs an [`OutputSchema`] with a
//! [`StructuredOutputConfig`]. It binds what the extraction method needs onto
//! an outgoing request and turns the aggregated response into a validated
//! [`StructuredResult`].
//!
//! ```rust
//! use integrations_llm_adapter::structured::{StructuredOutputConfig, StructuredOutputResolver};
//! use integrations_llm_adapter::types::{AggregatedMessage, ToolCall};
//! use serde_json::{json, Value};
//!
//! let resolver = StructuredOutputResolver::from_schema(
//!     json!({"type": "object", "properties": {"answer": {"type": "number"}}}),
//!     StructuredOutputConfig::function_calling("report"),
//! )
//! .unwrap();
//!
//! let message = AggregatedMessage {
//!     tool_calls: vec![ToolCall::new(0, "report", r#"{"answer": 4}"#)],
//!     ..AggregatedMessage::empty()
//! };
//! let result = resolver.resolve::<Value>(&message).unwrap();
//! assert_eq!(result.parsed["answer"], 4);
//! ```

mod config;
mod resolver;
mod result;
mod schema;

pub use config::{ExtractionMethod, StructuredOutputConfig, DEFAULT_FUNCTION_NAME};
pub use resolver::StructuredOutputResolver;
pub use result::StructuredResult;
pub use schema::OutputSchema;
