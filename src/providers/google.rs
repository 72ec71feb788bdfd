//! Google `generateContent` wire types.
//!
//! The same payloads are used by AI Studio and Vertex AI; only the endpoint
//! and credentials differ.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::GenerationOptions;
use crate::error::AdapterResult;
use crate::types::{
    ChatRequest, ContentPart, DataUri, FinishReason, MessageContent, Role, StreamChunk,
    ToolCallDelta, ToolChoice, ToolDefinition, Usage,
};

/// MIME type requested in JSON mode.
pub const JSON_MIME_TYPE: &str = "application/json";

/// Request to generate content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Conversation turns.
    pub contents: Vec<Content>,
    /// System instruction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    /// Tools available to the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// Tool usage configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
    /// Generation configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// A conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    /// `user` or `model`; absent on system instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// The parts of the content.
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A part of a content message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    /// Text content.
    Text {
        /// The text.
        text: String,
    },
    /// Inline binary data.
    InlineData {
        /// The inline data blob.
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
    /// Reference to a file by URI.
    FileData {
        /// The file reference.
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
    /// A function call.
    FunctionCall {
        /// The function call details.
        #[serde(rename = "functionCall")]
        function_call: FunctionCall,
    },
    /// Any part kind this crate does not interpret.
    Other(Value),
}

/// Binary data blob with MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    /// The MIME type of the data.
    pub mime_type: String,
    /// Base64-encoded data.
    pub data: String,
}

/// Reference to file data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    /// The MIME type of the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// The URI of the file.
    pub file_uri: String,
}

/// A function call emitted by the model. Always arrives whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Call ID, reported by newer model versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The function name.
    pub name: String,
    /// Arguments as a JSON object.
    #[serde(default)]
    pub args: Value,
}

/// Tool declarations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Function declarations.
    pub function_declarations: Vec<FunctionDeclaration>,
}

/// A function declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDeclaration {
    /// Function name.
    pub name: String,
    /// Function description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the parameters.
    pub parameters: Value,
}

impl From<&ToolDefinition> for FunctionDeclaration {
    fn from(tool: &ToolDefinition) -> Self {
        Self {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        }
    }
}

/// Tool usage configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    /// Function calling configuration.
    pub function_calling_config: FunctionCallingConfig,
}

/// Function calling configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCallingConfig {
    /// Calling mode.
    pub mode: FunctionCallingMode,
    /// Restricts `ANY` mode to these functions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_function_names: Option<Vec<String>>,
}

/// Function calling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionCallingMode {
    /// Model decides.
    Auto,
    /// Model must call a function.
    Any,
    /// Model must not call functions.
    None,
}

impl ToolConfig {
    /// Maps a tool choice; `Any` is restricted to the bound tools.
    pub fn for_choice(choice: &ToolChoice, tools: &[ToolDefinition]) -> Self {
        let (mode, allowed) = match choice {
            ToolChoice::Auto => (FunctionCallingMode::Auto, None),
            ToolChoice::Any if tools.is_empty() => (FunctionCallingMode::Any, None),
            ToolChoice::Any => (
                FunctionCallingMode::Any,
                Some(tools.iter().map(|tool| tool.name.clone()).collect()),
            ),
            ToolChoice::None => (FunctionCallingMode::None, None),
            ToolChoice::Function(name) => (FunctionCallingMode::Any, Some(vec![name.clone()])),
        };
        Self {
            function_calling_config: FunctionCallingConfig {
                mode,
                allowed_function_names: allowed,
            },
        }
    }
}

/// Generation configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling probability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Maximum number of tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// MIME type of the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
}

impl GenerationConfig {
    fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl GenerateContentRequest {
    /// Encodes a provider-neutral request.
    ///
    /// System messages are merged into `systemInstruction`.
    pub fn encode(request: &ChatRequest, options: &GenerationOptions) -> AdapterResult<Self> {
        let mut system_parts = Vec::new();
        let mut contents = Vec::new();

        for message in &request.messages {
            match message.role {
                Role::System => system_parts.push(Part::Text {
                    text: message.content.text(),
                }),
                Role::Human => contents.push(Content {
                    role: Some("user".to_string()),
                    parts: encode_parts(&message.content)?,
                }),
                Role::Assistant => contents.push(Content {
                    role: Some("model".to_string()),
                    parts: encode_parts(&message.content)?,
                }),
            }
        }

        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(vec![Tool {
                function_declarations: request.tools.iter().map(FunctionDeclaration::from).collect(),
            }])
        };

        let generation_config = GenerationConfig {
            temperature: options.temperature,
            top_p: options.top_p,
            max_output_tokens: options.max_tokens,
            response_mime_type: request.json_mode.then(|| JSON_MIME_TYPE.to_string()),
        };

        Ok(Self {
            contents,
            system_instruction: (!system_parts.is_empty()).then(|| Content {
                role: None,
                parts: system_parts,
            }),
            tools,
            tool_config: request
                .tool_choice
                .as_ref()
                .map(|choice| ToolConfig::for_choice(choice, &request.tools)),
            generation_config: (!generation_config.is_empty()).then_some(generation_config),
        })
    }
}

fn encode_parts(content: &MessageContent) -> AdapterResult<Vec<Part>> {
    content
        .parts()
        .into_iter()
        .map(|part| match part {
            ContentPart::Text { text } => Ok(Part::Text { text }),
            ContentPart::ImageUrl { image_url } => Ok(match DataUri::parse(&image_url)? {
                Some(uri) => Part::InlineData {
                    inline_data: Blob {
                        mime_type: uri.mime_type,
                        data: uri.data,
                    },
                },
                None => Part::FileData {
                    file_data: FileData {
                        mime_type: None,
                        file_uri: image_url,
                    },
                },
            }),
        })
        .collect()
}

/// Response from `generateContent`, and each element of a
/// `streamGenerateContent` array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidates; only the first is used.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Prompt feedback, present when the prompt was blocked.
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
    /// Token usage.
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

/// A response candidate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content.
    #[serde(default)]
    pub content: Option<Content>,
    /// Why generation finished, e.g. `STOP` or `MAX_TOKENS`.
    #[serde(default)]
    pub finish_reason: Option<String>,
    /// Candidate index.
    #[serde(default)]
    pub index: Option<u32>,
}

/// Feedback on the prompt.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Why the prompt was blocked.
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Token usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    /// Tokens in the prompt.
    #[serde(default)]
    pub prompt_token_count: u32,
    /// Tokens in the candidates.
    #[serde(default)]
    pub candidates_token_count: u32,
    /// Total tokens.
    #[serde(default)]
    pub total_token_count: u32,
}

impl From<UsageMetadata> for Usage {
    fn from(usage: UsageMetadata) -> Self {
        Usage {
            prompt_tokens: usage.prompt_token_count,
            completion_tokens: usage.candidates_token_count,
            total_tokens: usage.total_token_count,
        }
    }
}

fn map_finish_reason(reason: &str) -> Option<FinishReason> {
    match reason {
        "FINISH_REASON_UNSPECIFIED" => None,
        "STOP" => Some(FinishReason::Stop),
        "MAX_TOKENS" => Some(FinishReason::Length),
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" => {
            Some(FinishReason::ContentFilter)
        }
        _ => Some(FinishReason::Other),
    }
}

impl GenerateContentResponse {
    /// Normalizes the first candidate into a [`StreamChunk`].
    ///
    /// Every function call gets the next tool index and, unless the
    /// provider reported one, a generated id.
    pub(crate) fn normalize(self, next_tool_index: &mut usize) -> StreamChunk {
        let mut chunk = StreamChunk {
            usage: self.usage_metadata.map(Usage::from),
            ..Default::default()
        };

        let Some(candidate) = self.candidates.into_iter().next() else {
            if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
                tracing::warn!(block_reason = %reason, "prompt blocked by provider");
                chunk.finish_reason = Some(FinishReason::ContentFilter);
            }
            return chunk;
        };

        let mut text = String::new();
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            match part {
                Part::Text { text: fragment } => text.push_str(&fragment),
                Part::FunctionCall { function_call } => {
                    let index = *next_tool_index;
                    *next_tool_index += 1;

                    let id = function_call
                        .id
                        .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple()));
                    chunk.tool_call_deltas.push(
                        ToolCallDelta::new(index)
                            .with_id(id)
                            .with_name(function_call.name)
                            .with_args(function_call.args.to_string()),
                    );
                }
                Part::InlineData { .. } | Part::FileData { .. } | Part::Other(_) => {}
            }
        }

        if !text.is_empty() {
            chunk.content_delta = Some(text);
        }
        chunk.finish_reason = candidate.finish_reason.as_deref().and_then(map_finish_reason);
        chunk
    }
}
