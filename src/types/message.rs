//! Provider-neutral chat messages.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AdapterError, AdapterResult, ConfigurationError};

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model.
    System,
    /// The end user.
    Human,
    /// The model.
    Assistant,
}

/// A message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message author.
    pub role: Role,
    /// Message body.
    pub content: MessageContent,
}

impl Message {
    /// Creates a system message.
    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Creates a human message.
    pub fn human(content: impl Into<MessageContent>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Message content (text or multimodal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text content.
    Text(String),
    /// Ordered content parts.
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Concatenates every text part, skipping images.
    pub fn text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect(),
        }
    }

    /// Returns the parts, wrapping plain text in a single text part.
    pub fn parts(&self) -> Vec<ContentPart> {
        match self {
            MessageContent::Text(text) => vec![ContentPart::Text { text: text.clone() }],
            MessageContent::Parts(parts) => parts.clone(),
        }
    }
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        MessageContent::Text(s)
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        MessageContent::Text(s.to_string())
    }
}

impl From<Vec<ContentPart>> for MessageContent {
    fn from(parts: Vec<ContentPart>) -> Self {
        MessageContent::Parts(parts)
    }
}

/// A part of multimodal content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text content.
    Text {
        /// The text.
        text: String,
    },
    /// Image reference, usually a `data:` URI.
    ImageUrl {
        /// The image URL.
        image_url: String,
    },
}

impl ContentPart {
    /// Creates a text part.
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// Creates an image part from any URL.
    pub fn image_url(url: impl Into<String>) -> Self {
        ContentPart::ImageUrl {
            image_url: url.into(),
        }
    }

    /// Creates an image part from base64 data and its MIME type.
    pub fn image_base64(mime_type: &str, data: &str) -> Self {
        ContentPart::ImageUrl {
            image_url: format!("data:{};base64,{}", mime_type, data),
        }
    }
}

/// A parsed `data:<mime>;base64,<payload>` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// MIME type of the payload.
    pub mime_type: String,
    /// Base64 payload, as given.
    pub data: String,
}

const DATA_URI_PATTERN: &str = r"^data:([a-zA-Z0-9.+-]+/[a-zA-Z0-9.+-]+);base64,(.*)$";

impl DataUri {
    /// Parses a data URI.
    ///
    /// Returns `Ok(None)` for ordinary URLs and an error for a `data:` URI
    /// whose payload is not valid base64.
    pub fn parse(url: &str) -> AdapterResult<Option<Self>> {
        if !url.starts_with("data:") {
            return Ok(None);
        }

        let pattern = Regex::new(DATA_URI_PATTERN).map_err(|e| {
            AdapterError::Configuration(ConfigurationError::InvalidConfiguration {
                message: e.to_string(),
            })
        })?;
        let captures = pattern.captures(url).ok_or_else(|| {
            AdapterError::Configuration(ConfigurationError::InvalidConfiguration {
                message: "image data URI must look like data:<mime>;base64,<payload>".to_string(),
            })
        })?;

        let data = captures[2].to_string();
        STANDARD.decode(&data).map_err(|e| {
            AdapterError::Configuration(ConfigurationError::InvalidConfiguration {
                message: format!("image data URI payload is not base64: {}", e),
            })
        })?;

        Ok(Some(Self {
            mime_type: captures[1].to_string(),
            data,
        }))
    }
}
