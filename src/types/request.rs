//! Provider-neutral chat requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::message::Message;

/// A function the model may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Function name.
    pub name: String,
    /// What the function does.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema of the arguments.
    pub parameters: Value,
}

impl ToolDefinition {
    /// Creates a tool definition.
    pub fn new(name: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: None,
            parameters,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// How the model should use the bound tools.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ToolChoice {
    /// The model decides.
    #[default]
    Auto,
    /// The model must call some tool.
    Any,
    /// The model must not call tools.
    None,
    /// The model must call this function.
    Function(String),
}

/// A chat request before provider-specific encoding.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChatRequest {
    /// Conversation so far.
    pub messages: Vec<Message>,
    /// Tools bound to the request.
    pub tools: Vec<ToolDefinition>,
    /// Tool usage policy; `None` leaves the provider default.
    pub tool_choice: Option<ToolChoice>,
    /// Ask the provider for a bare JSON document.
    pub json_mode: bool,
}

impl ChatRequest {
    /// Creates a request from messages.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    /// Creates a single-turn request from a prompt.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self::new(vec![Message::human(prompt.into())])
    }

    /// Binds tools.
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    /// Sets the tool choice.
    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    /// Enables JSON mode.
    pub fn with_json_mode(mut self) -> Self {
        self.json_mode = true;
        self
    }
}
