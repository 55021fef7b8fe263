//! Error types for the protocol layer.
//!
//! Each crate in Gambit defines its own error enum, so a `ProtocolError`
//! always means "bytes didn't map to a message", never a network or game
//! problem.

/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (Rust value → bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (bytes → Rust value): malformed JSON,
    /// missing fields, or an unknown `type` tag.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
