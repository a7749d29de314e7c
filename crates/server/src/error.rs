//! Error types for the collector server

use std::io;

use logwire_protocol::ProtocolError;
use thiserror::Error;

/// Errors that can occur while running the collector
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind the listening socket
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Undecodable bytes on a connection
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Result type for server operations
pub type Result<T> = std::result::Result<T, ServerError>;
