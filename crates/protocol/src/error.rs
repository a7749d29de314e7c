//! Protocol error types
//!
//! Errors that can occur when decoding frames or validating topics.

use std::io;

use thiserror::Error;

/// Errors that can occur during protocol operations
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// I/O error on the underlying stream
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Unknown RESP type byte
    #[error("invalid frame type byte: 0x{0:02x}")]
    InvalidFrameType(u8),

    /// Length or integer field is not a valid decimal integer
    #[error("invalid integer in frame: {0:?}")]
    InvalidInteger(String),

    /// Bulk string not followed by CRLF
    #[error("bulk string missing trailing CRLF")]
    MissingTerminator,

    /// Declared length exceeds the configured maximum
    #[error("frame size {size} exceeds maximum {max}")]
    FrameTooLarge { size: usize, max: usize },

    /// Header line exceeds the maximum line length without a terminator
    #[error("line exceeds maximum length {max}")]
    LineTooLong { max: usize },

    /// Arrays nested deeper than the maximum depth
    #[error("array nesting exceeds maximum depth {max}")]
    NestingTooDeep { max: usize },

    /// Stream ended in the middle of a frame
    #[error("connection closed mid-frame")]
    UnexpectedEof,

    /// Topic field contains a separator or line break
    #[error("{field} may not contain ':' or newline")]
    ForbiddenCharacter { field: &'static str },

    /// Frame has the wrong shape for what the caller expected
    #[error("unexpected frame: {0}")]
    UnexpectedFrame(String),
}

impl ProtocolError {
    /// Create an unexpected frame error
    #[inline]
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::UnexpectedFrame(msg.into())
    }

    /// Create a frame too large error
    #[inline]
    pub fn too_large(size: usize, max: usize) -> Self {
        Self::FrameTooLarge { size, max }
    }
}
