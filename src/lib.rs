//! # LLM Adapter
//!
//! One message interface over the Mistral chat completions API and Google
//! Gemini (AI Studio and Vertex AI).
//!
//! ## Features
//!
//! - Streaming with SSE (Mistral) and chunked JSON array (Google) decoding
//! - Provider payloads normalized into one [`StreamChunk`] shape
//! - Stream aggregation with tool-call argument reassembly by index
//! - Structured output through function calling or JSON mode, validated
//!   against a JSON Schema and deserialized into your own types
//! - Secure credential handling with `SecretString`
//! - Mock transport for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use integrations_llm_adapter::client::{ChatModelExt, MistralChat};
//! use integrations_llm_adapter::structured::StructuredOutputConfig;
//! use integrations_llm_adapter::types::ChatRequest;
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Debug, Deserialize)]
//! struct Calculation {
//!     operation: String,
//!     number1: f64,
//!     number2: f64,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schema = json!({
//!         "type": "object",
//!         "properties": {
//!             "operation": {"type": "string", "enum": ["add", "subtract", "multiply", "divide"]},
//!             "number1": {"type": "number"},
//!             "number2": {"type": "number"}
//!         },
//!         "required": ["operation", "number1", "number2"]
//!     });
//!
//!     let chat = MistralChat::from_env()?
//!         .with_structured_output(schema, StructuredOutputConfig::function_calling("calculator"))?;
//!
//!     let result = chat
//!         .invoke::<Calculation>(ChatRequest::from_prompt("What is 2 + 2?"))
//!         .await?;
//!     println!("{:?}", result.parsed);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - `client` - Chat clients and the [`ChatModel`](client::ChatModel) trait
//! - `config` - Provider configuration and builders
//! - `error` - Error taxonomy
//! - `providers` - Provider wire formats and normalization
//! - `streaming` - Stream decoding and aggregation
//! - `structured` - Schema-validated output extraction
//! - `transport` - HTTP transport abstraction
//! - `types` - Provider-neutral messages, chunks and requests

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod mocks;
pub mod observability;
pub mod providers;
pub mod streaming;
pub mod structured;
pub mod transport;
pub mod types;

pub use client::{ChatModel, ChatModelExt, GoogleChat, MistralChat, StructuredChat};
pub use config::{GenerationOptions, GoogleConfig, MistralConfig, Platform};
pub use error::{AdapterError, AdapterResult, ConfigurationError, SchemaViolation, TransportError};
pub use streaming::{ChunkStream, StreamAggregator};
pub use structured::{
    ExtractionMethod, OutputSchema, StructuredOutputConfig, StructuredOutputResolver,
    StructuredResult,
};
pub use types::{
    AggregatedMessage, ChatRequest, FinishReason, Message, Role, StreamChunk, ToolCall,
    ToolCallDelta,
};
