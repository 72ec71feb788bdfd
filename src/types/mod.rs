//! Provider-neutral types shared by the aggregation core and the clients.

pub mod aggregated;
pub mod chunk;
pub mod message;
pub mod request;

pub use aggregated::{AggregatedMessage, ToolCall};
pub use chunk::{FinishReason, StreamChunk, ToolCallDelta, Usage};
pub use message::{ContentPart, DataUri, Message, MessageContent, Role};
pub use request::{ChatRequest, ToolChoice, ToolDefinition};
