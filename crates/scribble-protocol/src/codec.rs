//! Codec trait and implementations for rendering chat lines.
//!
//! The lobby renders each [`ChatLine`] once per fan-out and hands the
//! resulting text to every recipient's [`ChatHandle`](crate::ChatHandle).
//! Swapping the codec changes the wire shape of chat without touching
//! the room core.

use crate::{ChatLine, ProtocolError};

/// Renders chat lines to text and parses them back.
pub trait Codec: Send + Sync + 'static {
    /// Renders a line for delivery.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode(&self, line: &ChatLine) -> Result<String, ProtocolError>;

    /// Parses a delivered line. Used by clients and tests.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` on malformed input.
    fn decode(&self, text: &str) -> Result<ChatLine, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that renders each line as a JSON object
/// `{"sender": …, "content": …, "time": …}`.
///
/// ```rust
/// use scribble_protocol::{ChatLine, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let line = ChatLine::new("alice", "hello");
/// let text = codec.encode(&line).unwrap();
/// assert!(text.contains("\"sender\":\"alice\""));
/// assert_eq!(codec.decode(&text).unwrap(), line);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode(&self, line: &ChatLine) -> Result<String, ProtocolError> {
        serde_json::to_string(line).map_err(ProtocolError::Encode)
    }

    fn decode(&self, text: &str) -> Result<ChatLine, ProtocolError> {
        let line: ChatLine =
            serde_json::from_str(text).map_err(ProtocolError::Decode)?;
        if line.sender.is_empty() {
            return Err(ProtocolError::InvalidLine("empty sender".into()));
        }
        Ok(line)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;

    #[test]
    fn test_encode_uses_flat_json_fields() {
        let line = ChatLine {
            sender: "alice".into(),
            content: "hi".into(),
            time: 42,
        };
        let text = JsonCodec.encode(&line).unwrap();
        assert_eq!(text, r#"{"sender":"alice","content":"hi","time":42}"#);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = JsonCodec.decode("not json").unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_empty_sender() {
        let err = JsonCodec
            .decode(r#"{"sender":"","content":"x","time":1}"#)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidLine(_)));
    }
}
