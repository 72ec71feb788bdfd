//! Google Gemini chat client (AI Studio and Vertex AI).

use async_trait::async_trait;
use futures::StreamExt;
use std::fmt;
use std::sync::Arc;

use super::{decode_body, json_request, ChatModel};
use crate::config::{GoogleConfig, Platform};
use crate::error::AdapterResult;
use crate::providers::google::{GenerateContentRequest, GenerateContentResponse};
use crate::providers::{normalize_response, ChunkNormalizer, ProviderChunk, ProviderResponse};
use crate::streaming::{decode_json_array, ChunkStream};
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport};
use crate::types::{AggregatedMessage, ChatRequest};

/// Chat client for Gemini models.
///
/// Talks to AI Studio with an API key, or to Vertex AI with a pre-issued
/// access token, depending on [`GoogleConfig::platform`].
#[derive(Clone)]
pub struct GoogleChat {
    config: GoogleConfig,
    transport: Arc<dyn HttpTransport>,
}

impl GoogleChat {
    /// Creates a client that talks HTTP through `reqwest`.
    pub fn new(config: GoogleConfig) -> AdapterResult<Self> {
        let transport = ReqwestTransport::new(config.timeout, config.connect_timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Creates a client over a custom transport.
    pub fn with_transport(config: GoogleConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    /// Creates a client configured from `GOOGLE_*` environment variables.
    pub fn from_env() -> AdapterResult<Self> {
        Self::new(GoogleConfig::from_env()?)
    }

    /// The client configuration.
    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    /// The platform requests go to.
    pub fn platform(&self) -> Platform {
        self.config.platform
    }

    /// Sends a single prompt and returns the response text.
    pub async fn call(&self, prompt: &str) -> AdapterResult<String> {
        let message = self.invoke(ChatRequest::from_prompt(prompt)).await?;
        Ok(message.content)
    }

    fn build_request(&self, request: &ChatRequest, method: &str) -> AdapterResult<HttpRequest> {
        let body = GenerateContentRequest::encode(request, &self.config.options)?;
        let (name, value) = self.config.auth_header();
        Ok(json_request(self.config.method_url(method), &body)?.with_header(name, value))
    }
}

impl fmt::Debug for GoogleChat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleChat")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChatModel for GoogleChat {
    #[tracing::instrument(skip(self, request), fields(model = %self.config.model, platform = %self.config.platform))]
    async fn invoke(&self, request: ChatRequest) -> AdapterResult<AggregatedMessage> {
        let http = self.build_request(&request, "generateContent")?;
        let response = self.transport.post(http).await?;
        let generated: GenerateContentResponse = decode_body(&response)?;

        tracing::debug!(candidates = generated.candidates.len(), "received generateContent response");
        normalize_response(ProviderResponse::Google(generated))
    }

    #[tracing::instrument(skip(self, request), fields(model = %self.config.model, platform = %self.config.platform))]
    async fn stream(&self, request: ChatRequest) -> AdapterResult<ChunkStream> {
        let http = self.build_request(&request, "streamGenerateContent")?;
        let bytes = self.transport.post_stream(http).await?;

        let chunks = decode_json_array::<GenerateContentResponse>(bytes)
            .map(|chunk| chunk.map(ProviderChunk::Google));
        Ok(Box::pin(ChunkNormalizer::new().normalize_stream(chunks)))
    }
}
