//! Completed messages produced by stream aggregation.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::chunk::{FinishReason, Usage};
use super::message::Role;

/// A completed tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Stable position of the call within the message.
    pub index: usize,
    /// Provider-assigned id, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Function name.
    pub name: String,
    /// JSON-encoded arguments.
    pub args: String,
}

impl ToolCall {
    /// Creates a tool call.
    pub fn new(index: usize, name: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            index,
            id: None,
            name: name.into(),
            args: args.into(),
        }
    }

    /// Sets the provider id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Parses the arguments as JSON.
    pub fn parse_args<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.args)
    }
}

/// A complete assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedMessage {
    /// Always [`Role::Assistant`] for model output.
    pub role: Role,
    /// Concatenated text content.
    pub content: String,
    /// Tool calls in index order.
    pub tool_calls: Vec<ToolCall>,
    /// Why generation stopped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    /// Token usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl AggregatedMessage {
    /// An assistant message with no content and no tool calls.
    pub fn empty() -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            tool_calls: Vec::new(),
            finish_reason: None,
            usage: None,
        }
    }

    /// An assistant message with text content only.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::empty()
        }
    }

    /// Returns the first tool call named `name`, lowest index first.
    pub fn tool_call(&self, name: &str) -> Option<&ToolCall> {
        self.tool_calls.iter().find(|call| call.name == name)
    }

    /// Returns true if the model requested at least one tool call.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

impl Default for AggregatedMessage {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_tool_call_argument_parsing() {
        let call = ToolCall::new(0, "calculator", r#"{"calculator": "2 + 2"}"#);
        let args: Value = call.parse_args().unwrap();
        assert_eq!(args["calculator"], "2 + 2");
    }

    #[test]
    fn test_tool_call_lookup_by_name() {
        let message = AggregatedMessage {
            tool_calls: vec![
                ToolCall::new(0, "search", "{}"),
                ToolCall::new(1, "calculator", r#"{"a":1}"#),
                ToolCall::new(2, "calculator", r#"{"a":2}"#),
            ],
            ..AggregatedMessage::empty()
        };

        assert_eq!(message.tool_call("calculator").map(|c| c.index), Some(1));
        assert!(message.tool_call("weather").is_none());
    }

    #[test]
    fn test_empty_message_shape() {
        let json = serde_json::to_value(AggregatedMessage::empty()).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "", "toolCalls": []}));
    }
}
