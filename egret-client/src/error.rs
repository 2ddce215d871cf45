//! Error types for client operations.

use thiserror::Error;

/// Errors that can occur during client operations.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Configuration was rejected at construction time.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operation is not valid in the current connection state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The connection could not be established.
    #[error("connection failed")]
    ConnectionFailed,

    /// The connection was lost during an operation.
    #[error("connection lost")]
    ConnectionLost,

    /// The outbound queue cannot accept more messages.
    #[error("message queue is full")]
    QueueFull,

    /// A connection attempt timed out.
    #[error("connection timeout")]
    Timeout,

    /// An I/O error surfaced by the transport.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
