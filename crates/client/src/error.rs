//! Error types for the logwire clients
//!
//! Covers shipper configuration, buffering, and the network failures seen by
//! both the shipper and the tail client.

use std::io;

use logwire_protocol::ProtocolError;
use thiserror::Error;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur in the shipper or the tail client
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Shipper buffering
    // =========================================================================
    /// Outgoing buffer is full; the record was dropped
    #[error("logwire buffer full")]
    BufferFull,

    /// The background shipper task has stopped
    #[error("shipper task has stopped")]
    Closed,

    // =========================================================================
    // Configuration
    // =========================================================================
    /// Connection URL could not be parsed
    #[error("invalid logwire URL: {0}")]
    InvalidUrl(String),

    /// Configuration value is missing or malformed
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // =========================================================================
    // Network
    // =========================================================================
    /// Could not reach the collector
    #[error("connection failed to {address}: {source}")]
    ConnectionFailed {
        address: String,
        #[source]
        source: io::Error,
    },

    /// No live connection to the collector
    #[error("no connection to collector")]
    NoConnection,

    /// Operation did not finish in time
    #[error("operation timed out")]
    Timeout,

    /// Collector answered a command with an error or an unexpected reply
    #[error("{command} rejected: {reply}")]
    Rejected {
        command: &'static str,
        reply: String,
    },

    /// Collector closed the connection
    #[error("connection closed by collector")]
    ConnectionClosed,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Wire decoding error
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl ClientError {
    pub(crate) fn rejected(command: &'static str, reply: impl Into<String>) -> Self {
        Self::Rejected {
            command,
            reply: reply.into(),
        }
    }
}
