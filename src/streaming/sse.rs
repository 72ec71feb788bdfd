//! Server-Sent Events decoding.

use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;

use super::utf8::Utf8Buffer;
use crate::error::{AdapterResult, TransportError};
use crate::transport::ByteStream;

/// Data payload that terminates an OpenAI-style event stream.
pub const DONE_MARKER: &str = "[DONE]";

/// Server-Sent Event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event type.
    pub event: Option<String>,
    /// Event data; multiple `data:` lines are joined with `\n`.
    pub data: String,
    /// Event ID.
    pub id: Option<String>,
}

#[derive(Debug, Default)]
struct SseEventBuilder {
    event: Option<String>,
    data: Vec<String>,
    id: Option<String>,
}

impl SseEventBuilder {
    fn build(self) -> Option<SseEvent> {
        if self.data.is_empty() {
            return None;
        }

        Some(SseEvent {
            event: self.event,
            data: self.data.join("\n"),
            id: self.id,
        })
    }
}

/// Incremental SSE parser; lines may be split across chunks.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
    current_event: SseEventBuilder,
}

impl SseParser {
    /// Creates a new SSE parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a chunk of text and returns any events it completes.
    pub fn parse(&mut self, chunk: &str) -> Vec<SseEvent> {
        self.buffer.push_str(chunk);
        let mut events = Vec::new();

        while let Some(newline_pos) = self.buffer.find('\n') {
            let line = self.buffer[..newline_pos].trim_end_matches('\r').to_string();
            self.buffer.drain(..=newline_pos);

            if let Some(event) = self.parse_line(&line) {
                events.push(event);
            }
        }

        events
    }

    fn parse_line(&mut self, line: &str) -> Option<SseEvent> {
        // Blank line dispatches the event.
        if line.is_empty() {
            return std::mem::take(&mut self.current_event).build();
        }

        // Comment
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.find(':') {
            Some(colon_pos) => {
                let value = &line[colon_pos + 1..];
                (&line[..colon_pos], value.strip_prefix(' ').unwrap_or(value))
            }
            None => (line, ""),
        };

        match field {
            "event" => self.current_event.event = Some(value.to_string()),
            "data" => self.current_event.data.push(value.to_string()),
            "id" => self.current_event.id = Some(value.to_string()),
            _ => {}
        }

        None
    }

    /// Dispatches whatever is left once the stream has ended.
    pub fn flush(&mut self) -> Option<SseEvent> {
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            let line = line.trim_end_matches('\r').to_string();
            if let Some(event) = self.parse_line(&line) {
                return Some(event);
            }
        }
        std::mem::take(&mut self.current_event).build()
    }
}

/// Decodes an SSE byte stream whose `data` payloads are JSON documents.
///
/// The stream ends at the first `[DONE]` payload or when the bytes run out.
pub fn decode_sse_json<T>(bytes: ByteStream) -> impl Stream<Item = AdapterResult<T>> + Send
where
    T: DeserializeOwned + Send + 'static,
{
    async_stream::try_stream! {
        let mut bytes = bytes;
        let mut utf8 = Utf8Buffer::default();
        let mut parser = SseParser::new();

        'read: while let Some(chunk) = bytes.next().await {
            let text = utf8.push(&chunk?)?;
            for event in parser.parse(&text) {
                if event.data.trim() == DONE_MARKER {
                    break 'read;
                }
                yield decode_event::<T>(&event)?;
            }
        }

        utf8.finish()?;
        if let Some(event) = parser.flush() {
            if event.data.trim() != DONE_MARKER {
                yield decode_event::<T>(&event)?;
            }
        }
    }
}

fn decode_event<T: DeserializeOwned>(event: &SseEvent) -> Result<T, TransportError> {
    serde_json::from_str(&event.data).map_err(|e| TransportError::Decode {
        message: e.to_string(),
        body: event.data.clone(),
    })
}
