//! Connection lifecycle states.

use std::fmt;

/// Lifecycle state of the logical connection.
///
/// Exactly one state holds at any time. Only the background driver task
/// transitions it; external code observes it through
/// [`Client::state`](crate::Client::state).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection and no attempt in progress.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The connection is established; messages flow.
    Open,
    /// A graceful shutdown was requested and is in progress.
    Closing,
    /// Waiting out the backoff delay before the next attempt.
    Reconnecting,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closing => "closing",
            ConnectionState::Reconnecting => "reconnecting",
        };
        f.write_str(name)
    }
}
