//! Decoding of streamed JSON arrays.
//!
//! Google's `streamGenerateContent` endpoint answers with one JSON array whose
//! elements arrive incrementally:
//! ```json
//! [{"candidates":[...]}
//! ,{"candidates":[...],"usageMetadata":{...}}]
//! ```

use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;

use super::utf8::Utf8Buffer;
use crate::error::{AdapterResult, TransportError};
use crate::transport::ByteStream;

/// Incremental decoder for a JSON array of objects.
///
/// Elements may be split at any byte; brackets and commas between elements
/// are skipped.
#[derive(Debug, Default)]
pub struct JsonArrayDecoder {
    buffer: String,
    closed: bool,
}

impl JsonArrayDecoder {
    /// Creates a decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `text` and returns every element it completes.
    pub fn decode<T: DeserializeOwned>(&mut self, text: &str) -> Result<Vec<T>, TransportError> {
        self.buffer.push_str(text);
        let mut items = Vec::new();

        loop {
            self.skip_delimiters();

            if self.buffer.starts_with(']') {
                self.buffer.remove(0);
                self.closed = true;
                continue;
            }
            if self.buffer.is_empty() {
                break;
            }
            if !self.buffer.starts_with('{') {
                return Err(TransportError::Decode {
                    message: "expected a JSON object in the response array".to_string(),
                    body: self.buffer.clone(),
                });
            }

            let Some(end) = object_end(&self.buffer) else {
                break;
            };
            let object: String = self.buffer.drain(..end).collect();
            let item = serde_json::from_str(&object).map_err(|e| TransportError::Decode {
                message: format!("Failed to parse chunk: {}", e),
                body: object.clone(),
            })?;
            items.push(item);
        }

        Ok(items)
    }

    /// Fails if the stream stopped in the middle of an element.
    pub fn finish(&mut self) -> Result<(), TransportError> {
        self.skip_delimiters();
        if self.buffer.is_empty() {
            Ok(())
        } else {
            Err(TransportError::Stream {
                message: format!(
                    "response ended inside a JSON element ({} bytes pending)",
                    self.buffer.len()
                ),
            })
        }
    }

    /// Returns true once the closing bracket has been seen.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn skip_delimiters(&mut self) {
        let skip = self
            .buffer
            .find(|c: char| !(c.is_whitespace() || c == ',' || c == '['))
            .unwrap_or(self.buffer.len());
        self.buffer.drain(..skip);
    }
}

/// Byte offset just past the object that opens `input`, if it is complete.
///
/// Tracks nesting depth and ignores brackets inside string literals.
fn object_end(input: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, &byte) in input.as_bytes().iter().enumerate() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match byte {
            b'\\' if in_string => escape_next = true,
            b'"' => in_string = !in_string,
            b'{' | b'[' if !in_string => depth += 1,
            b'}' | b']' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    None
}

/// Decodes a byte stream carrying a JSON array into its elements.
pub fn decode_json_array<T>(bytes: ByteStream) -> impl Stream<Item = AdapterResult<T>> + Send
where
    T: DeserializeOwned + Send + 'static,
{
    async_stream::try_stream! {
        let mut bytes = bytes;
        let mut utf8 = Utf8Buffer::default();
        let mut decoder = JsonArrayDecoder::new();

        while let Some(chunk) = bytes.next().await {
            let text = utf8.push(&chunk?)?;
            for item in decoder.decode::<T>(&text)? {
                yield item;
            }
        }

        utf8.finish()?;
        decoder.finish()?;
    }
}
