//! Provider wire formats and their normalization.
//!
//! Each provider payload is wrapped in a tagged union at the transport
//! boundary; [`ChunkNormalizer`] turns it into the provider-neutral
//! [`StreamChunk`] so aggregation never branches on provider identity.

pub mod google;
pub mod mistral;

use futures::{Stream, StreamExt};

use crate::error::AdapterResult;
use crate::types::{AggregatedMessage, StreamChunk};

/// One streamed provider payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderChunk {
    /// A Mistral `chat.completion.chunk`.
    Mistral(mistral::ChatCompletionChunk),
    /// One element of a Google `streamGenerateContent` array.
    Google(google::GenerateContentResponse),
}

/// One complete (non-streamed) provider response.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResponse {
    /// A Mistral chat completion.
    Mistral(mistral::ChatCompletionResponse),
    /// A Google `generateContent` response.
    Google(google::GenerateContentResponse),
}

/// Converts provider payloads into [`StreamChunk`]s.
///
/// Holds the next free tool index for one response, so calls that arrive
/// without an index (Google always, Mistral sometimes) get stable positions
/// that continue across chunks. Use one normalizer per response.
#[derive(Debug, Default)]
pub struct ChunkNormalizer {
    next_tool_index: usize,
}

impl ChunkNormalizer {
    /// Creates a normalizer for a new response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes one streamed payload.
    pub fn normalize(&mut self, chunk: ProviderChunk) -> StreamChunk {
        let normalized = match chunk {
            ProviderChunk::Mistral(chunk) => chunk.normalize(&mut self.next_tool_index),
            ProviderChunk::Google(chunk) => chunk.normalize(&mut self.next_tool_index),
        };
        tracing::trace!(
            text = normalized.content_delta.as_deref().map(str::len),
            tool_deltas = normalized.tool_call_deltas.len(),
            "normalized chunk"
        );
        normalized
    }

    /// Normalizes a complete response into a single chunk.
    pub fn normalize_response(&mut self, response: ProviderResponse) -> StreamChunk {
        match response {
            ProviderResponse::Mistral(response) => response.normalize(&mut self.next_tool_index),
            ProviderResponse::Google(response) => response.normalize(&mut self.next_tool_index),
        }
    }

    /// Maps a stream of provider payloads to normalized chunks.
    ///
    /// Errors pass through untouched.
    pub fn normalize_stream<S>(self, stream: S) -> impl Stream<Item = AdapterResult<StreamChunk>>
    where
        S: Stream<Item = AdapterResult<ProviderChunk>>,
    {
        let mut normalizer = self;
        stream.map(move |item| item.map(|chunk| normalizer.normalize(chunk)))
    }
}

/// Turns a complete provider response into an [`AggregatedMessage`].
///
/// The response goes through the same aggregation and validation as a
/// stream would.
pub fn normalize_response(response: ProviderResponse) -> AdapterResult<AggregatedMessage> {
    AggregatedMessage::from_chunk(ChunkNormalizer::new().normalize_response(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdapterError;
    use crate::streaming::StreamAggregator;
    use serde_json::json;

    fn google_call(name: &str, args: serde_json::Value) -> ProviderChunk {
        ProviderChunk::Google(
            serde_json::from_value(json!({
                "candidates": [{"content": {"parts": [{"functionCall": {"name": name, "args": args}}]}}]
            }))
            .unwrap(),
        )
    }

    #[test]
    fn test_google_indices_continue_across_chunks() {
        let mut normalizer = ChunkNormalizer::new();
        let first = normalizer.normalize(google_call("a", json!({})));
        let second = normalizer.normalize(google_call("b", json!({})));

        assert_eq!(first.tool_call_deltas[0].index, 0);
        assert_eq!(second.tool_call_deltas[0].index, 1);
    }

    #[tokio::test]
    async fn test_mistral_stream_aggregates() {
        let payloads = vec![
            json!({"choices": [{"index": 0, "delta": {"role": "assistant", "content": ""}}]}),
            json!({"choices": [{"index": 0, "delta": {"tool_calls": [
                {"id": "call_1", "index": 0, "function": {"name": "calc", "arguments": "{\"a\""}}
            ]}}]}),
            json!({"choices": [{"index": 0, "delta": {"tool_calls": [
                {"index": 0, "function": {"arguments": ":1}"}}
            ]}, "finish_reason": "tool_calls"}]}),
        ];
        let chunks = payloads.into_iter().map(|p| {
            Ok::<_, AdapterError>(ProviderChunk::Mistral(serde_json::from_value(p).unwrap()))
        });

        let stream = ChunkNormalizer::new().normalize_stream(futures::stream::iter(chunks));
        let message = StreamAggregator::aggregate(stream).await.unwrap();

        assert_eq!(message.content, "");
        assert_eq!(message.tool_calls.len(), 1);
        assert_eq!(message.tool_calls[0].name, "calc");
        assert_eq!(message.tool_calls[0].args, r#"{"a":1}"#);
        assert_eq!(message.tool_calls[0].id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_normalize_single_shot_response() {
        let response = ProviderResponse::Mistral(
            serde_json::from_value(json!({
                "choices": [{"message": {"content": "4"}, "finish_reason": "stop"}]
            }))
            .unwrap(),
        );

        let message = normalize_response(response).unwrap();
        assert_eq!(message.content, "4");
        assert!(!message.has_tool_calls());
    }
}
