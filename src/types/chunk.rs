//! Normalized streaming deltas.

use serde::{Deserialize, Serialize};

/// One incremental unit of a streamed response, after provider normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamChunk {
    /// Text to append to the message content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_delta: Option<String>,
    /// Partial tool-call updates, keyed by index.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_call_deltas: Vec<ToolCallDelta>,
    /// Reason generation stopped, usually on the last chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    /// Token usage, usually on the last chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl StreamChunk {
    /// A chunk carrying only text.
    pub fn text(delta: impl Into<String>) -> Self {
        Self {
            content_delta: Some(delta.into()),
            ..Default::default()
        }
    }

    /// A chunk carrying a single tool-call delta.
    pub fn tool_call(delta: ToolCallDelta) -> Self {
        Self {
            tool_call_deltas: vec![delta],
            ..Default::default()
        }
    }

    /// Returns true if the chunk carries no deltas and no metadata.
    pub fn is_empty(&self) -> bool {
        self.content_delta.is_none()
            && self.tool_call_deltas.is_empty()
            && self.finish_reason.is_none()
            && self.usage.is_none()
    }
}

/// Partial update to one tool call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallDelta {
    /// Stable position of the call within the message.
    pub index: usize,
    /// Provider-assigned call id, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Fragment of the function name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_delta: Option<String>,
    /// Fragment of the JSON argument string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args_delta: Option<String>,
}

impl ToolCallDelta {
    /// Creates an empty delta for `index`.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    /// Sets the call id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the name fragment.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name_delta = Some(name.into());
        self
    }

    /// Sets the argument fragment.
    pub fn with_args(mut self, args: impl Into<String>) -> Self {
        self.args_delta = Some(args.into());
        self
    }
}

/// Provider-neutral reason for completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural stop.
    Stop,
    /// Token limit reached.
    Length,
    /// The model asked for tool calls.
    ToolCalls,
    /// Blocked by a safety or recitation filter.
    ContentFilter,
    /// Anything else the provider reports.
    Other,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens in the completion.
    pub completion_tokens: u32,
    /// Total tokens.
    pub total_tokens: u32,
}

impl Usage {
    /// Creates a usage record, deriving the total.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}
