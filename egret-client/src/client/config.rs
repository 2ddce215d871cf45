//! Configuration structures for client behavior.

use std::time::Duration;

use crate::error::{ClientError, ClientResult};

/// Eviction policy applied when the outbound queue is at capacity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum EvictionPolicy {
    /// Drop the oldest queued message to make room for the new one.
    #[default]
    DropOldest,
}

/// Configuration for connection, retry, and queue behavior.
///
/// Immutable after construction; [`validate`](ClientConfig::validate) is
/// checked when a client is built.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Whether to reconnect automatically after a retryable failure.
    pub reconnect: bool,

    /// Maximum number of reconnection attempts.
    /// `None` means unlimited retries.
    pub max_reconnect_attempts: Option<u32>,

    /// Delay before the first reconnection attempt.
    pub retry_base_delay: Duration,

    /// Upper bound on the delay between reconnection attempts.
    pub retry_max_delay: Duration,

    /// Growth factor applied to the delay after each failed attempt.
    pub retry_multiplier: f64,

    /// Randomize each delay within a bounded window to avoid
    /// synchronized reconnection storms across clients.
    pub jitter: bool,

    /// Timeout for a single connection attempt.
    pub connection_timeout: Duration,

    /// Maximum number of messages buffered while disconnected.
    /// `None` means unbounded; `Some(0)` disables buffering entirely.
    pub max_queue_size: Option<usize>,

    /// Eviction policy applied when the queue is at capacity.
    pub eviction: EvictionPolicy,

    /// Queued messages older than this are dropped before draining.
    pub queue_expiry: Option<Duration>,

    /// Subprotocols offered during the handshake, in preference order.
    pub protocols: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            reconnect: true,
            max_reconnect_attempts: None, // Unlimited retries by default
            retry_base_delay: Duration::from_millis(100),
            retry_max_delay: Duration::from_secs(30),
            retry_multiplier: 2.0,
            jitter: false,
            connection_timeout: Duration::from_secs(5),
            max_queue_size: None,
            eviction: EvictionPolicy::DropOldest,
            queue_expiry: None,
            protocols: Vec::new(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer `protocols` during the handshake, in preference order.
    pub fn with_protocols<I, S>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protocols = protocols.into_iter().map(Into::into).collect();
        self
    }

    /// Cap the outbound queue at `size` messages.
    pub fn with_queue_limit(mut self, size: usize) -> Self {
        self.max_queue_size = Some(size);
        self
    }

    /// Drop queued messages older than `expiry` before draining.
    pub fn with_queue_expiry(mut self, expiry: Duration) -> Self {
        self.queue_expiry = Some(expiry);
        self
    }

    /// Create a configuration for low-latency local links.
    pub fn low_latency() -> Self {
        Self {
            retry_base_delay: Duration::from_millis(10),
            retry_max_delay: Duration::from_secs(1),
            connection_timeout: Duration::from_millis(500),
            max_reconnect_attempts: Some(10),
            max_queue_size: Some(100),
            ..Self::default()
        }
    }

    /// Create a configuration for high-latency wide-area links.
    pub fn wide_area() -> Self {
        Self {
            retry_base_delay: Duration::from_millis(500),
            retry_max_delay: Duration::from_secs(60),
            connection_timeout: Duration::from_secs(30),
            max_reconnect_attempts: None, // Unlimited retries for WAN
            max_queue_size: Some(5000),
            jitter: true,
            ..Self::default()
        }
    }

    /// Check the configuration for values the retry and queue logic
    /// cannot operate on.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidConfig` naming the offending field.
    pub fn validate(&self) -> ClientResult<()> {
        if self.retry_base_delay.is_zero() {
            return Err(ClientError::InvalidConfig(
                "retry_base_delay must be positive".into(),
            ));
        }
        if self.retry_max_delay < self.retry_base_delay {
            return Err(ClientError::InvalidConfig(
                "retry_max_delay must be at least retry_base_delay".into(),
            ));
        }
        if self.retry_multiplier.is_nan() || self.retry_multiplier < 1.0 {
            return Err(ClientError::InvalidConfig(
                "retry_multiplier must be at least 1.0".into(),
            ));
        }
        if self.connection_timeout.is_zero() {
            return Err(ClientError::InvalidConfig(
                "connection_timeout must be positive".into(),
            ));
        }
        Ok(())
    }
}
