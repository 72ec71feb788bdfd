//! Mistral chat client.

use async_trait::async_trait;
use futures::StreamExt;
use secrecy::ExposeSecret;
use std::fmt;
use std::sync::Arc;

use super::{decode_body, json_request, ChatModel};
use crate::config::MistralConfig;
use crate::error::AdapterResult;
use crate::providers::mistral::{ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse};
use crate::providers::{normalize_response, ChunkNormalizer, ProviderChunk, ProviderResponse};
use crate::streaming::{decode_sse_json, ChunkStream};
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport};
use crate::types::{AggregatedMessage, ChatRequest};

/// Chat client for the Mistral chat completions API.
///
/// # Example
///
/// ```no_run
/// use integrations_llm_adapter::client::{ChatModel, MistralChat};
/// use integrations_llm_adapter::types::ChatRequest;
///
/// # async fn run() -> integrations_llm_adapter::error::AdapterResult<()> {
/// let chat = MistralChat::from_env()?;
/// let message = chat.invoke(ChatRequest::from_prompt("Hello!")).await?;
/// println!("{}", message.content);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MistralChat {
    config: MistralConfig,
    transport: Arc<dyn HttpTransport>,
}

impl MistralChat {
    /// Creates a client that talks HTTP through `reqwest`.
    pub fn new(config: MistralConfig) -> AdapterResult<Self> {
        let transport = ReqwestTransport::new(config.timeout, config.connect_timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Creates a client over a custom transport.
    pub fn with_transport(config: MistralConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    /// Creates a client configured from `MISTRAL_*` environment variables.
    pub fn from_env() -> AdapterResult<Self> {
        Self::new(MistralConfig::from_env()?)
    }

    /// The client configuration.
    pub fn config(&self) -> &MistralConfig {
        &self.config
    }

    fn build_request(&self, request: &ChatRequest, stream: bool) -> AdapterResult<HttpRequest> {
        let body =
            ChatCompletionRequest::encode(request, &self.config.model, &self.config.options, stream)?;
        let http = json_request(self.config.chat_url(), &body)?.with_header(
            "authorization",
            format!("Bearer {}", self.config.api_key.expose_secret()),
        );

        Ok(if stream {
            http.with_header("accept", "text/event-stream")
        } else {
            http
        })
    }
}

impl fmt::Debug for MistralChat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MistralChat")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChatModel for MistralChat {
    #[tracing::instrument(skip(self, request), fields(model = %self.config.model))]
    async fn invoke(&self, request: ChatRequest) -> AdapterResult<AggregatedMessage> {
        let http = self.build_request(&request, false)?;
        let response = self.transport.post(http).await?;
        let completion: ChatCompletionResponse = decode_body(&response)?;

        tracing::debug!(
            id = %completion.id,
            choices = completion.choices.len(),
            "received chat completion"
        );
        normalize_response(ProviderResponse::Mistral(completion))
    }

    #[tracing::instrument(skip(self, request), fields(model = %self.config.model))]
    async fn stream(&self, request: ChatRequest) -> AdapterResult<ChunkStream> {
        let http = self.build_request(&request, true)?;
        let bytes = self.transport.post_stream(http).await?;

        let chunks = decode_sse_json::<ChatCompletionChunk>(bytes)
            .map(|chunk| chunk.map(ProviderChunk::Mistral));
        Ok(Box::pin(ChunkNormalizer::new().normalize_stream(chunks)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationOptions;
    use crate::mocks::MockHttpTransport;
    use crate::streaming::StreamAggregator;
    use secrecy::SecretString;
    use serde_json::json;

    fn client(transport: Arc<MockHttpTransport>) -> MistralChat {
        let config = MistralConfig::builder()
            .api_key(SecretString::new("test-key".to_string()))
            .options(GenerationOptions::default().with_temperature(0.0))
            .build()
            .unwrap();
        MistralChat::with_transport(config, transport)
    }

    #[tokio::test]
    async fn test_invoke_sends_bearer_and_body() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_json(
            200,
            &json!({
                "id": "cmpl-1",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hi"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4}
            }),
        );

        let message = client(transport.clone())
            .invoke(ChatRequest::from_prompt("Hello"))
            .await
            .unwrap();
        assert_eq!(message.content, "Hi");

        transport.verify_url(0, "https://api.mistral.ai/v1/chat/completions");
        transport.verify_header(0, "authorization", "Bearer test-key");

        let body = transport.last_request().unwrap().body_json().unwrap();
        assert_eq!(body["model"], "mistral-large-latest");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["messages"][0], json!({"role": "user", "content": "Hello"}));
        assert!(body.get("stream").is_none());
    }

    #[tokio::test]
    async fn test_stream_decodes_sse() {
        let transport = Arc::new(MockHttpTransport::new());
        transport.enqueue_stream([
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"lo\"},\"finish_reason\":\"stop\"}]}\n\n",
            "data: [DONE]\n\n",
        ]);

        let stream = client(transport.clone())
            .stream(ChatRequest::from_prompt("Hello"))
            .await
            .unwrap();
        let message = StreamAggregator::aggregate(stream).await.unwrap();

        assert_eq!(message.content, "Hello");
        transport.verify_header(0, "accept", "text/event-stream");
        assert_eq!(transport.last_request().unwrap().body_json().unwrap()["stream"], true);
    }

    #[test]
    fn test_debug_hides_api_key() {
        let rendered = format!("{:?}", client(Arc::new(MockHttpTransport::new())));
        assert!(!rendered.contains("test-key"));
    }
}
