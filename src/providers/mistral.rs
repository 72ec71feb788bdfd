//! Mistral chat-completion wire types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::GenerationOptions;
use crate::error::AdapterResult;
use crate::types::{
    ChatRequest, ContentPart, DataUri, FinishReason, MessageContent, Role, StreamChunk,
    ToolCallDelta, ToolChoice as NeutralToolChoice, ToolDefinition, Usage,
};

/// Chat completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    /// Model ID to use.
    pub model: String,
    /// Messages in the conversation.
    pub messages: Vec<WireMessage>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Top-p (nucleus) sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Whether to stream the response.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
    /// Response format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    /// Available tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// Tool choice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
}

/// A message on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum WireMessage {
    /// System message.
    System {
        /// Message text.
        content: String,
    },
    /// User message.
    User {
        /// Text or multimodal parts.
        content: WireContent,
    },
    /// Assistant message.
    Assistant {
        /// Message text.
        content: String,
    },
}

/// User message content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireContent {
    /// Plain text.
    Text(String),
    /// Multimodal parts.
    Parts(Vec<WirePart>),
}

/// A multimodal content part.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WirePart {
    /// Text part.
    Text {
        /// The text.
        text: String,
    },
    /// Image part; either an `https` URL or a base64 data URI.
    ImageUrl {
        /// The image URL.
        image_url: String,
    },
}

/// Response format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Plain text response.
    Text,
    /// JSON object response.
    JsonObject,
}

/// A tool available for the model to use.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Tool {
    /// Function tool.
    Function {
        /// Function definition.
        function: FunctionDefinition,
    },
}

/// Function definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDefinition {
    /// Function name.
    pub name: String,
    /// Function description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for parameters.
    pub parameters: Value,
}

impl From<&ToolDefinition> for Tool {
    fn from(tool: &ToolDefinition) -> Self {
        Tool::Function {
            function: FunctionDefinition {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            },
        }
    }
}

/// Tool choice specification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolChoice {
    /// `"auto"`, `"any"` or `"none"`.
    Mode(ToolChoiceMode),
    /// A specific function.
    Function {
        /// Always `"function"`.
        #[serde(rename = "type")]
        tool_type: String,
        /// Function to call.
        function: ToolChoiceFunction,
    },
}

/// Tool choice mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoiceMode {
    /// Model decides whether to use tools.
    Auto,
    /// Model must use a tool.
    Any,
    /// Model cannot use tools.
    None,
}

/// Function named by a tool choice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolChoiceFunction {
    /// Function name.
    pub name: String,
}

impl From<&NeutralToolChoice> for ToolChoice {
    fn from(choice: &NeutralToolChoice) -> Self {
        match choice {
            NeutralToolChoice::Auto => ToolChoice::Mode(ToolChoiceMode::Auto),
            NeutralToolChoice::Any => ToolChoice::Mode(ToolChoiceMode::Any),
            NeutralToolChoice::None => ToolChoice::Mode(ToolChoiceMode::None),
            NeutralToolChoice::Function(name) => ToolChoice::Function {
                tool_type: "function".to_string(),
                function: ToolChoiceFunction { name: name.clone() },
            },
        }
    }
}

impl ChatCompletionRequest {
    /// Encodes a provider-neutral request.
    ///
    /// Fails if an image part carries a malformed data URI.
    pub fn encode(
        request: &ChatRequest,
        model: &str,
        options: &GenerationOptions,
        stream: bool,
    ) -> AdapterResult<Self> {
        let messages = request
            .messages
            .iter()
            .map(|message| encode_message(message.role, &message.content))
            .collect::<AdapterResult<Vec<_>>>()?;

        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(request.tools.iter().map(Tool::from).collect())
        };

        Ok(Self {
            model: model.to_string(),
            messages,
            temperature: options.temperature,
            top_p: options.top_p,
            max_tokens: options.max_tokens,
            stream,
            response_format: request.json_mode.then_some(ResponseFormat::JsonObject),
            tools,
            tool_choice: request.tool_choice.as_ref().map(ToolChoice::from),
        })
    }
}

fn encode_message(role: Role, content: &MessageContent) -> AdapterResult<WireMessage> {
    Ok(match role {
        Role::System => WireMessage::System {
            content: content.text(),
        },
        Role::Assistant => WireMessage::Assistant {
            content: content.text(),
        },
        Role::Human => WireMessage::User {
            content: match content {
                MessageContent::Text(text) => WireContent::Text(text.clone()),
                MessageContent::Parts(parts) => WireContent::Parts(
                    parts.iter().map(encode_part).collect::<AdapterResult<_>>()?,
                ),
            },
        },
    })
}

fn encode_part(part: &ContentPart) -> AdapterResult<WirePart> {
    Ok(match part {
        ContentPart::Text { text } => WirePart::Text { text: text.clone() },
        ContentPart::ImageUrl { image_url } => {
            // Malformed data URIs fail before anything is sent.
            DataUri::parse(image_url)?;
            WirePart::ImageUrl {
                image_url: image_url.clone(),
            }
        }
    })
}

/// Chat completion response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatCompletionResponse {
    /// Response ID.
    #[serde(default)]
    pub id: String,
    /// Model used.
    #[serde(default)]
    pub model: String,
    /// Completion choices.
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    /// Token usage.
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

/// A completion choice.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatChoice {
    /// Choice index.
    #[serde(default)]
    pub index: u32,
    /// The assistant's message.
    pub message: ResponseMessage,
    /// Reason for stopping.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The assistant message inside a choice.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseMessage {
    /// Message text.
    #[serde(default)]
    pub content: Option<String>,
    /// Tool calls made by the assistant.
    #[serde(default)]
    pub tool_calls: Option<Vec<WireToolCall>>,
}

/// Streaming chunk for chat completions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatCompletionChunk {
    /// Chunk ID.
    #[serde(default)]
    pub id: String,
    /// Model used.
    #[serde(default)]
    pub model: String,
    /// Streaming choices.
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    /// Usage (final chunk only).
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

/// A streaming choice.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StreamChoice {
    /// Choice index.
    #[serde(default)]
    pub index: u32,
    /// Content delta.
    pub delta: ContentDelta,
    /// Finish reason (final chunk).
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Content delta in streaming.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentDelta {
    /// Role (first chunk).
    #[serde(default)]
    pub role: Option<String>,
    /// Content text.
    #[serde(default)]
    pub content: Option<String>,
    /// Tool calls.
    #[serde(default)]
    pub tool_calls: Option<Vec<WireToolCall>>,
}

/// A (possibly partial) tool call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WireToolCall {
    /// Call ID.
    #[serde(default)]
    pub id: Option<String>,
    /// Position of the call; absent when each call arrives whole.
    #[serde(default)]
    pub index: Option<usize>,
    /// Function call details.
    pub function: WireFunctionCall,
}

/// Function name and arguments.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WireFunctionCall {
    /// Function name.
    #[serde(default)]
    pub name: Option<String>,
    /// Arguments: normally a JSON string, occasionally an inline object.
    #[serde(default)]
    pub arguments: Option<Value>,
}

impl WireFunctionCall {
    fn arguments_text(&self) -> Option<String> {
        match &self.arguments {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

/// Token usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WireUsage {
    /// Tokens in the prompt.
    #[serde(default)]
    pub prompt_tokens: u32,
    /// Tokens in the completion.
    #[serde(default)]
    pub completion_tokens: u32,
    /// Total tokens.
    #[serde(default)]
    pub total_tokens: u32,
}

impl From<WireUsage> for Usage {
    fn from(usage: WireUsage) -> Self {
        Usage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "stop" => FinishReason::Stop,
        "length" | "model_length" => FinishReason::Length,
        "tool_calls" => FinishReason::ToolCalls,
        _ => FinishReason::Other,
    }
}

/// Converts tool calls, assigning indices where Mistral omits them.
///
/// An index-less delta carrying an id or a name opens the next call. One
/// carrying neither continues the most recently opened call.
fn tool_call_deltas(calls: Vec<WireToolCall>, next_tool_index: &mut usize) -> Vec<ToolCallDelta> {
    let mut deltas = Vec::with_capacity(calls.len());
    for call in calls {
        let index = match call.index {
            Some(index) => index,
            None if call.id.is_none() && call.function.name.is_none() => {
                next_tool_index.saturating_sub(1)
            }
            None => *next_tool_index,
        };
        *next_tool_index = (*next_tool_index).max(index.saturating_add(1));

        deltas.push(ToolCallDelta {
            index,
            args_delta: call.function.arguments_text(),
            id: call.id,
            name_delta: call.function.name,
        });
    }
    deltas
}

impl ChatCompletionChunk {
    /// Normalizes the first choice into a [`StreamChunk`].
    pub(crate) fn normalize(self, next_tool_index: &mut usize) -> StreamChunk {
        let mut chunk = StreamChunk {
            usage: self.usage.map(Usage::from),
            ..Default::default()
        };

        if let Some(choice) = self.choices.into_iter().next() {
            chunk.content_delta = choice.delta.content.filter(|text| !text.is_empty());
            chunk.tool_call_deltas =
                tool_call_deltas(choice.delta.tool_calls.unwrap_or_default(), next_tool_index);
            chunk.finish_reason = choice.finish_reason.as_deref().map(map_finish_reason);
        }

        chunk
    }
}

impl ChatCompletionResponse {
    /// Normalizes the first choice into a single [`StreamChunk`].
    pub(crate) fn normalize(self, next_tool_index: &mut usize) -> StreamChunk {
        let mut chunk = StreamChunk {
            usage: self.usage.map(Usage::from),
            ..Default::default()
        };

        if let Some(choice) = self.choices.into_iter().next() {
            chunk.content_delta = choice.message.content;
            chunk.tool_call_deltas =
                tool_call_deltas(choice.message.tool_calls.unwrap_or_default(), next_tool_index);
            chunk.finish_reason = choice.finish_reason.as_deref().map(map_finish_reason);
        }

        chunk
    }
}
