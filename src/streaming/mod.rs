//! Streaming support.
//!
//! Provider responses arrive as raw bytes in one of two framings:
//! - Server-Sent Events (Mistral), decoded by [`decode_sse_json`]
//! - an incrementally delivered JSON array (Google), decoded by
//!   [`decode_json_array`]
//!
//! The decoded provider chunks are normalized into [`StreamChunk`]s by
//! [`crate::providers::ChunkNormalizer`] and folded into one
//! [`AggregatedMessage`](crate::types::AggregatedMessage) by the
//! [`StreamAggregator`].
//!
//! ## Example
//!
//! ```rust
//! use integrations_llm_adapter::streaming::StreamAggregator;
//! use integrations_llm_adapter::types::{StreamChunk, ToolCallDelta};
//!
//! let mut aggregator = StreamAggregator::new();
//! aggregator.push(StreamChunk::tool_call(ToolCallDelta::new(0).with_name("calc")));
//! aggregator.push(StreamChunk::tool_call(ToolCallDelta::new(0).with_args(r#"{"a":1"#)));
//! aggregator.push(StreamChunk::tool_call(ToolCallDelta::new(0).with_args("}")));
//!
//! let message = aggregator.finish().unwrap();
//! assert_eq!(message.tool_calls[0].args, r#"{"a":1}"#);
//! ```

mod aggregator;
mod chunked_json;
mod sse;
mod utf8;

use futures::Stream;
use std::pin::Pin;

use crate::error::AdapterResult;
use crate::types::StreamChunk;

pub use aggregator::StreamAggregator;
pub use chunked_json::{decode_json_array, JsonArrayDecoder};
pub use sse::{decode_sse_json, SseEvent, SseParser, DONE_MARKER};

/// Stream of normalized chunks returned by streaming calls.
pub type ChunkStream = Pin<Box<dyn Stream<Item = AdapterResult<StreamChunk>> + Send>>;
