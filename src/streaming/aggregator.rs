//! Aggregation of normalized stream chunks into a complete message.

use futures::{Stream, StreamExt};
use std::collections::BTreeMap;

use crate::error::{AdapterError, AdapterResult};
use crate::types::{AggregatedMessage, FinishReason, Role, StreamChunk, ToolCall, Usage};

/// Tool call under construction.
#[derive(Debug, Default)]
struct PartialToolCall {
    id: Option<String>,
    name: String,
    args: String,
}

/// Accumulator for combining streaming chunks.
///
/// Text deltas are appended in arrival order. Tool-call deltas are keyed by
/// index; name and argument fragments are appended to that entry. Argument
/// buffers are only checked for JSON validity in [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct StreamAggregator {
    content: String,
    tool_calls: BTreeMap<usize, PartialToolCall>,
    finish_reason: Option<FinishReason>,
    usage: Option<Usage>,
    chunks: usize,
}

impl StreamAggregator {
    /// Creates an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one chunk into the running state.
    pub fn push(&mut self, chunk: StreamChunk) {
        self.chunks += 1;

        if let Some(delta) = chunk.content_delta {
            self.content.push_str(&delta);
        }

        for delta in chunk.tool_call_deltas {
            let entry = self.tool_calls.entry(delta.index).or_default();

            if let Some(id) = delta.id {
                if let Some(existing) = &entry.id {
                    if *existing != id {
                        tracing::warn!(
                            index = delta.index,
                            existing = %existing,
                            received = %id,
                            "tool call id changed mid-stream; keeping the first"
                        );
                    }
                } else {
                    entry.id = Some(id);
                }
            }
            if let Some(name) = delta.name_delta {
                entry.name.push_str(&name);
            }
            if let Some(args) = delta.args_delta {
                entry.args.push_str(&args);
            }
        }

        // Last one wins.
        if chunk.finish_reason.is_some() {
            self.finish_reason = chunk.finish_reason;
        }
        if chunk.usage.is_some() {
            self.usage = chunk.usage;
        }
    }

    /// Text accumulated so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Number of chunks pushed so far.
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Validates the tool-call buffers and returns the completed message.
    ///
    /// Fails with [`AdapterError::MalformedToolCall`] for the lowest index
    /// whose argument buffer is not a JSON document.
    pub fn finish(self) -> AdapterResult<AggregatedMessage> {
        let mut tool_calls = Vec::with_capacity(self.tool_calls.len());

        for (index, partial) in self.tool_calls {
            if let Err(e) = serde_json::from_str::<serde_json::Value>(&partial.args) {
                return Err(AdapterError::MalformedToolCall {
                    index,
                    raw: partial.args,
                    message: e.to_string(),
                });
            }

            tool_calls.push(ToolCall {
                index,
                id: partial.id,
                name: partial.name,
                args: partial.args,
            });
        }

        tracing::debug!(
            chunks = self.chunks,
            content_len = self.content.len(),
            tool_calls = tool_calls.len(),
            "stream aggregated"
        );

        Ok(AggregatedMessage {
            role: Role::Assistant,
            content: self.content,
            tool_calls,
            finish_reason: self.finish_reason,
            usage: self.usage,
        })
    }

    /// Drains `stream` and returns the aggregated message.
    ///
    /// The first error from the stream is returned unchanged and the partial
    /// state is dropped.
    pub async fn aggregate<S>(stream: S) -> AdapterResult<AggregatedMessage>
    where
        S: Stream<Item = AdapterResult<StreamChunk>>,
    {
        futures::pin_mut!(stream);

        let mut aggregator = Self::new();
        while let Some(chunk) = stream.next().await {
            aggregator.push(chunk?);
        }

        aggregator.finish()
    }
}

impl AggregatedMessage {
    /// Builds a message from a single complete chunk.
    ///
    /// Single-shot responses go through the same validation as streams.
    pub fn from_chunk(chunk: StreamChunk) -> AdapterResult<Self> {
        let mut aggregator = StreamAggregator::new();
        aggregator.push(chunk);
        aggregator.finish()
    }
}
