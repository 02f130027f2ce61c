//! Error types for the protocol layer.

/// Errors that can occur while rendering or parsing a line.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing a line failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Parsing a delivered line back into a [`ChatLine`](crate::ChatLine)
    /// failed. Only clients and tests decode; the core never does.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The line is structurally valid but violates protocol rules,
    /// e.g. an empty sender.
    #[error("invalid line: {0}")]
    InvalidLine(String),
}
