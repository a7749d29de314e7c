//! logwire protocol - core types shared by the collector and its clients
//!
//! This crate provides the foundational types that flow through logwire:
//! - `Topic` - (app, proc, host) triple identifying a log source
//! - `TopicMatcher` - per-field regex patterns deciding topic interest
//! - `LogRecord` / `Message` - a timestamped log line and its delivery unit
//! - `Frame` - RESP values exchanged on the wire
//! - `FrameReader` / `FrameWriter` - async framing over any byte stream
//!
//! # Wire Format
//!
//! Commands travel as RESP arrays of bulk strings:
//!
//! ```text
//! *3\r\n$3\r\nPUB\r\n$4\r\n1000\r\n$5\r\nhello\r\n
//! ```
//!
//! Subscription deliveries are 5-element arrays:
//! `[integer nanos, simple app, simple proc, simple host, bulk line]`.

mod error;
mod frame;
mod record;
mod stream;
mod topic;

pub use error::ProtocolError;
pub use frame::Frame;
pub use record::{LogRecord, Message, now_nanos};
pub use stream::{FrameReader, FrameWriter};
pub use topic::{Topic, TopicMatcher, glob_to_regex};

// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Default collector TCP port
pub const DEFAULT_PORT: u16 = 7701;

/// Maximum bulk string length (16MB)
pub const MAX_BULK_LEN: usize = 16 * 1024 * 1024;

/// Maximum number of elements in a single array frame
pub const MAX_ARRAY_LEN: usize = 1024;

/// Maximum length of a single `\r\n` terminated header line
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Maximum array nesting depth; commands and deliveries are a single level
pub const MAX_DEPTH: usize = 8;

/// Characters that may not appear in topic fields (key separator and line breaks)
pub const FORBIDDEN_TOPIC_CHARS: &[char] = &[':', '\n', '\r'];

#[cfg(test)]
mod record_test;
#[cfg(test)]
mod topic_test;
