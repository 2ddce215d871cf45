//! Error types for transport operations.

use std::io;
use thiserror::Error;

/// Errors raised by a transport implementation.
///
/// All variants are retryable from the client's point of view: the
/// reconnection policy decides whether another attempt is made.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The connection handshake was rejected or could not complete.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The underlying socket is closed.
    #[error("connection closed")]
    Closed,

    /// The peer violated the protocol.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// An I/O error from the underlying socket.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<io::Error> for TransportError {
    fn from(error: io::Error) -> Self {
        TransportError::Io(error.to_string())
    }
}
