//! # Error Types
//!
//! Decoding and parsing errors shared across subsystems.

use thiserror::Error;

/// Errors raised while encoding or decoding a message body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Frame shorter than its 4-byte length prefix.
    #[error("Truncated frame: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    /// Length prefix larger than the accepted maximum.
    #[error("Frame too large: {len} bytes (limit {limit})")]
    FrameTooLarge { len: usize, limit: usize },

    /// Bytes left over after the framed body.
    #[error("Trailing bytes after frame: {0}")]
    TrailingBytes(usize),

    /// Body could not be decoded into the expected message.
    #[error("Malformed body: {0}")]
    Malformed(String),

    /// Structured map is missing a required key.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Message could not be encoded.
    #[error("Encoding failed: {0}")]
    Encode(String),
}

impl From<bincode::Error> for WireError {
    fn from(err: bincode::Error) -> Self {
        WireError::Malformed(err.to_string())
    }
}

impl From<serde_json::Error> for WireError {
    fn from(err: serde_json::Error) -> Self {
        WireError::Malformed(err.to_string())
    }
}

/// Errors raised while parsing an entity path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Path has no segment after the resource kind.
    #[error("Path has no entity segment: {0}")]
    MissingEntity(String),

    /// Entity segment is not a UUID.
    #[error("Invalid entity id: {0}")]
    InvalidEntityId(String),

    /// Region handle segment is not an unsigned 64-bit integer.
    #[error("Invalid region handle: {0}")]
    InvalidRegionHandle(String),
}
