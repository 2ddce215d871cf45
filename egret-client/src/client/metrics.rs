//! Metrics collection and connection statistics.

use std::time::Duration;

/// Counters and state snapshots for a client connection.
#[derive(Debug, Clone)]
pub struct ClientMetrics {
    /// Total number of connection attempts made
    pub connection_attempts: u64,

    /// Total number of successful connections established
    pub connections_established: u64,

    /// Total number of connection failures
    pub connection_failures: u64,

    /// Total number of messages transmitted
    pub messages_sent: u64,

    /// Total number of messages received
    pub messages_received: u64,

    /// Total number of messages queued for transmission
    pub messages_queued: u64,

    /// Total number of messages dropped by queue overflow
    pub messages_dropped: u64,

    /// Total number of messages dropped by queue expiry
    pub messages_expired: u64,

    /// Total payload bytes sent
    pub bytes_sent: u64,

    /// Total payload bytes received
    pub bytes_received: u64,

    /// Current size of the outbound queue
    pub current_queue_size: usize,

    /// Time when the client was created (provider clock)
    pub created_at: Duration,

    /// Time of last successful connection (None if never connected)
    pub last_connected: Option<Duration>,

    /// Time of last connection failure (None if no failures)
    pub last_failure: Option<Duration>,

    /// Current consecutive failure count
    pub consecutive_failures: u32,

    /// Backoff delay currently scheduled or last applied
    pub current_retry_delay: Option<Duration>,

    /// Whether the connection is currently open
    pub is_connected: bool,
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientMetrics {
    /// Create new metrics instance (defaults to zero creation time).
    pub fn new() -> Self {
        Self::new_at(Duration::ZERO)
    }

    /// Create new metrics instance with a specific creation time.
    pub fn new_at(created_at: Duration) -> Self {
        Self {
            connection_attempts: 0,
            connections_established: 0,
            connection_failures: 0,
            messages_sent: 0,
            messages_received: 0,
            messages_queued: 0,
            messages_dropped: 0,
            messages_expired: 0,
            bytes_sent: 0,
            bytes_received: 0,
            current_queue_size: 0,
            created_at,
            last_connected: None,
            last_failure: None,
            consecutive_failures: 0,
            current_retry_delay: None,
            is_connected: false,
        }
    }

    /// Record a connection attempt.
    pub fn record_connection_attempt(&mut self) {
        self.connection_attempts += 1;
    }

    /// Record a successful connection at a specific time.
    pub fn record_connection_success_at(&mut self, now: Duration) {
        self.connections_established += 1;
        self.last_connected = Some(now);
        self.consecutive_failures = 0;
        self.current_retry_delay = None;
        self.is_connected = true;
    }

    /// Record a connection failure at a specific time.
    pub fn record_connection_failure_at(&mut self, now: Duration) {
        self.connection_failures += 1;
        self.last_failure = Some(now);
        self.consecutive_failures += 1;
        self.is_connected = false;
    }

    /// Record the backoff delay scheduled before the next attempt.
    pub fn record_retry_scheduled(&mut self, delay: Duration) {
        self.current_retry_delay = Some(delay);
    }

    /// Record a message sent.
    pub fn record_message_sent(&mut self, bytes: usize) {
        self.messages_sent += 1;
        self.bytes_sent += bytes as u64;
    }

    /// Record a message received.
    pub fn record_message_received(&mut self, bytes: usize) {
        self.messages_received += 1;
        self.bytes_received += bytes as u64;
    }

    /// Record a message queued for transmission.
    pub fn record_message_queued(&mut self) {
        self.messages_queued += 1;
    }

    /// Record a message dropped by queue overflow.
    pub fn record_message_dropped(&mut self) {
        self.messages_dropped += 1;
    }

    /// Record a message dropped by queue expiry.
    pub fn record_message_expired(&mut self) {
        self.messages_expired += 1;
    }
}
