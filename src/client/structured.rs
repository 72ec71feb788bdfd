//! Structured output over any chat model.

use serde::de::DeserializeOwned;

use super::ChatModel;
use crate::error::AdapterResult;
use crate::structured::{StructuredOutputResolver, StructuredResult};
use crate::types::ChatRequest;

/// A chat model whose responses resolve into schema-conforming values.
///
/// Created with [`ChatModelExt::with_structured_output`](super::ChatModelExt::with_structured_output).
#[derive(Debug, Clone)]
pub struct StructuredChat<M> {
    model: M,
    resolver: StructuredOutputResolver,
}

impl<M: ChatModel> StructuredChat<M> {
    /// Wraps `model` with `resolver`.
    pub fn new(model: M, resolver: StructuredOutputResolver) -> Self {
        Self { model, resolver }
    }

    /// The underlying model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// The resolver applied to responses.
    pub fn resolver(&self) -> &StructuredOutputResolver {
        &self.resolver
    }

    /// Sends `request` with the schema bound and resolves the response.
    pub async fn invoke<T: DeserializeOwned>(
        &self,
        request: ChatRequest,
    ) -> AdapterResult<StructuredResult<T>> {
        let message = self.model.invoke(self.resolver.bind(request)).await?;
        self.resolver.resolve(&message)
    }

    /// Like [`invoke`](Self::invoke), but streams the response and resolves
    /// it once the stream completes.
    pub async fn invoke_streaming<T: DeserializeOwned>(
        &self,
        request: ChatRequest,
    ) -> AdapterResult<StructuredResult<T>> {
        let stream = self.model.stream(self.resolver.bind(request)).await?;
        self.resolver.resolve_stream(stream).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatModelExt;
    use crate::error::AdapterError;
    use crate::streaming::ChunkStream;
    use crate::structured::StructuredOutputConfig;
    use crate::types::{AggregatedMessage, StreamChunk, ToolCall, ToolCallDelta, ToolChoice};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Replies with a fixed message and remembers the last request.
    #[derive(Default)]
    struct FixedModel {
        reply: AggregatedMessage,
        seen: Mutex<Option<ChatRequest>>,
    }

    #[async_trait]
    impl ChatModel for FixedModel {
        async fn invoke(&self, request: ChatRequest) -> AdapterResult<AggregatedMessage> {
            *self.seen.lock().unwrap() = Some(request);
            Ok(self.reply.clone())
        }

        async fn stream(&self, request: ChatRequest) -> AdapterResult<ChunkStream> {
            *self.seen.lock().unwrap() = Some(request);
            let chunks: Vec<AdapterResult<StreamChunk>> = self
                .reply
                .tool_calls
                .iter()
                .map(|call| {
                    Ok(StreamChunk::tool_call(
                        ToolCallDelta::new(call.index)
                            .with_name(call.name.clone())
                            .with_args(call.args.clone()),
                    ))
                })
                .collect();
            Ok(Box::pin(futures::stream::iter(chunks)))
        }
    }

    fn schema() -> Value {
        json!({"type": "object", "properties": {"city": {"type": "string"}}, "required": ["city"]})
    }

    fn model(args: &str) -> FixedModel {
        FixedModel {
            reply: AggregatedMessage {
                tool_calls: vec![ToolCall::new(0, "locate", args)],
                ..AggregatedMessage::empty()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_invoke_binds_and_resolves() {
        let chat = model(r#"{"city":"Paris"}"#)
            .with_structured_output(schema(), StructuredOutputConfig::function_calling("locate"))
            .unwrap();

        let result: StructuredResult<Value> =
            chat.invoke(ChatRequest::from_prompt("Where?")).await.unwrap();
        assert_eq!(result.parsed, json!({"city": "Paris"}));

        let seen = chat.model().seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.tools[0].name, "locate");
        assert_eq!(seen.tool_choice, Some(ToolChoice::Any));
    }

    #[tokio::test]
    async fn test_invoke_streaming_reports_schema_errors() {
        let chat = model(r#"{"city":7}"#)
            .with_structured_output(schema(), StructuredOutputConfig::function_calling("locate"))
            .unwrap();

        let error = chat
            .invoke_streaming::<Value>(ChatRequest::from_prompt("Where?"))
            .await
            .unwrap_err();
        assert!(matches!(error, AdapterError::SchemaValidation { .. }));
        assert_eq!(error.failing_paths(), vec!["/city"]);
    }
}
