//! Chat clients.
//!
//! [`MistralChat`] and [`GoogleChat`] implement the provider-neutral
//! [`ChatModel`] trait. Any [`ChatModel`] can be wrapped in a
//! [`StructuredChat`] through [`ChatModelExt::with_structured_output`].

mod google;
mod mistral;
mod structured;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{AdapterResult, TransportError};
use crate::observability::redact_sensitive;
use crate::streaming::ChunkStream;
use crate::structured::{StructuredOutputConfig, StructuredOutputResolver};
use crate::transport::{HttpRequest, HttpResponse};
use crate::types::{AggregatedMessage, ChatRequest};

pub use google::GoogleChat;
pub use mistral::MistralChat;
pub use structured::StructuredChat;

/// A chat model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Sends `request` and waits for the complete response.
    async fn invoke(&self, request: ChatRequest) -> AdapterResult<AggregatedMessage>;

    /// Sends `request` and returns the normalized response stream.
    ///
    /// Fold the stream with
    /// [`StreamAggregator::aggregate`](crate::streaming::StreamAggregator::aggregate).
    async fn stream(&self, request: ChatRequest) -> AdapterResult<ChunkStream>;
}

/// Extension methods for [`ChatModel`].
pub trait ChatModelExt: ChatModel + Sized {
    /// Wraps the model so that responses resolve against `schema`.
    fn with_structured_output(
        self,
        schema: Value,
        config: StructuredOutputConfig,
    ) -> AdapterResult<StructuredChat<Self>> {
        let resolver = StructuredOutputResolver::from_schema(schema, config)?;
        Ok(StructuredChat::new(self, resolver))
    }
}

impl<M: ChatModel> ChatModelExt for M {}

/// Serializes a provider request body, logging it redacted at trace level.
fn json_request<B: Serialize>(url: String, body: &B) -> AdapterResult<HttpRequest> {
    if tracing::enabled!(tracing::Level::TRACE) {
        if let Ok(value) = serde_json::to_value(body) {
            tracing::trace!(%url, body = %redact_sensitive(&value), "request body");
        }
    }
    Ok(HttpRequest::json(url, body)?)
}

fn decode_body<T: DeserializeOwned>(response: &HttpResponse) -> AdapterResult<T> {
    serde_json::from_slice(&response.body).map_err(|e| {
        TransportError::Decode {
            message: e.to_string(),
            body: String::from_utf8_lossy(&response.body).into_owned(),
        }
        .into()
    })
}
