//! UTF-8 decoding across network chunk boundaries.

use crate::error::TransportError;

/// Holds the trailing bytes of a multi-byte character split between chunks.
#[derive(Debug, Default)]
pub(crate) struct Utf8Buffer {
    pending: Vec<u8>,
}

impl Utf8Buffer {
    /// Decodes as much of `pending + bytes` as forms complete characters.
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Result<String, TransportError> {
        self.pending.extend_from_slice(bytes);

        match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                let text = text.to_string();
                self.pending.clear();
                Ok(text)
            }
            // An incomplete sequence at the very end: keep it for the next chunk.
            Err(e) if e.error_len().is_none() => {
                let valid = e.valid_up_to();
                let tail = self.pending.split_off(valid);
                let text = String::from_utf8(std::mem::replace(&mut self.pending, tail))
                    .map_err(|e| TransportError::Stream {
                        message: format!("Invalid UTF-8 in stream: {}", e),
                    })?;
                Ok(text)
            }
            Err(e) => Err(TransportError::Stream {
                message: format!("Invalid UTF-8 in stream: {}", e),
            }),
        }
    }

    /// Fails if the stream ended inside a character.
    pub(crate) fn finish(&self) -> Result<(), TransportError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(TransportError::Stream {
                message: "stream ended inside a UTF-8 sequence".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_multibyte_character() {
        let bytes = "世界".as_bytes();
        let mut buffer = Utf8Buffer::default();

        assert_eq!(buffer.push(&bytes[..2]).unwrap(), "");
        assert_eq!(buffer.push(&bytes[2..4]).unwrap(), "世");
        assert_eq!(buffer.push(&bytes[4..]).unwrap(), "界");
        assert!(buffer.finish().is_ok());
    }

    #[test]
    fn test_invalid_bytes() {
        let mut buffer = Utf8Buffer::default();
        assert!(buffer.push(&[0xff, b'a']).is_err());
    }

    #[test]
    fn test_truncated_stream() {
        let mut buffer = Utf8Buffer::default();
        buffer.push(&"é".as_bytes()[..1]).unwrap();
        assert!(buffer.finish().is_err());
    }
}
