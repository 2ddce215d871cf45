//! Ordered outbound message buffering.
//!
//! Messages queued while the connection is down are replayed strictly in
//! enqueue order once it reopens. Overflow is handled at enqueue time by
//! evicting the oldest entry; expiry is handled at drain time by pruning
//! entries older than the configured lifetime.

use std::collections::VecDeque;
use std::time::Duration;

use egret_core::Message;

use crate::client::EvictionPolicy;

/// A message waiting to be transmitted.
#[derive(Debug, Clone)]
pub struct QueuedMessage {
    /// The buffered payload.
    pub payload: Message,
    /// Time the message was enqueued (provider clock).
    pub enqueued_at: Duration,
    /// Number of failed transmission attempts so far.
    pub attempts: u32,
}

/// FIFO buffer of outbound messages awaiting an open connection.
#[derive(Debug)]
pub struct MessageQueue {
    entries: VecDeque<QueuedMessage>,
    max_size: Option<usize>,
    eviction: EvictionPolicy,
    expiry: Option<Duration>,
}

impl MessageQueue {
    /// Create a queue with the given capacity, eviction, and expiry
    /// settings.
    ///
    /// `max_size: None` means unbounded.
    pub fn new(
        max_size: Option<usize>,
        eviction: EvictionPolicy,
        expiry: Option<Duration>,
    ) -> Self {
        Self {
            entries: VecDeque::new(),
            max_size,
            eviction,
            expiry,
        }
    }

    /// Number of buffered messages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a message, evicting per the configured policy when the
    /// queue is at capacity. Returns the evicted entry, if any.
    pub fn enqueue(&mut self, payload: Message, now: Duration) -> Option<QueuedMessage> {
        let evicted = match self.max_size {
            Some(max) if self.entries.len() >= max => match self.eviction {
                EvictionPolicy::DropOldest => self.entries.pop_front(),
            },
            _ => None,
        };
        self.entries.push_back(QueuedMessage {
            payload,
            enqueued_at: now,
            attempts: 0,
        });
        evicted
    }

    /// Append a message without applying the capacity limit.
    ///
    /// Used for pass-through sends while the connection is open and
    /// buffering is disabled: the entry is transient and drained in the
    /// same dispatch cycle.
    pub fn enqueue_direct(&mut self, payload: Message, now: Duration) {
        self.entries.push_back(QueuedMessage {
            payload,
            enqueued_at: now,
            attempts: 0,
        });
    }

    /// Take the message at the head of the queue.
    pub fn pop_front(&mut self) -> Option<QueuedMessage> {
        self.entries.pop_front()
    }

    /// Put a message back at the head after a failed transmission.
    ///
    /// Preserves FIFO order for the next drain.
    pub fn requeue_front(&mut self, mut entry: QueuedMessage) {
        entry.attempts += 1;
        self.entries.push_front(entry);
    }

    /// Remove entries that have outlived the configured expiry.
    ///
    /// Returns the removed entries in queue order. No-op when no expiry
    /// is configured.
    pub fn prune_expired(&mut self, now: Duration) -> Vec<QueuedMessage> {
        let Some(expiry) = self.expiry else {
            return Vec::new();
        };
        let mut expired = Vec::new();
        self.entries.retain(|entry| {
            if now.saturating_sub(entry.enqueued_at) >= expiry {
                expired.push(entry.clone());
                false
            } else {
                true
            }
        });
        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), "pruned expired queued messages");
        }
        expired
    }

    /// Drop all buffered messages.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(payload: &str) -> Message {
        Message::from(payload)
    }

    #[test]
    fn drains_in_enqueue_order() {
        let mut queue = MessageQueue::new(None, EvictionPolicy::DropOldest, None);
        queue.enqueue(text("a"), Duration::ZERO);
        queue.enqueue(text("b"), Duration::ZERO);
        queue.enqueue(text("c"), Duration::ZERO);

        let drained: Vec<Message> = std::iter::from_fn(|| queue.pop_front())
            .map(|entry| entry.payload)
            .collect();
        assert_eq!(drained, vec![text("a"), text("b"), text("c")]);
        assert!(queue.is_empty());
    }

    #[test]
    fn overflow_evicts_oldest() {
        let mut queue = MessageQueue::new(Some(2), EvictionPolicy::DropOldest, None);
        assert!(queue.enqueue(text("a"), Duration::ZERO).is_none());
        assert!(queue.enqueue(text("b"), Duration::ZERO).is_none());
        let evicted = queue.enqueue(text("c"), Duration::ZERO);

        assert_eq!(evicted.map(|entry| entry.payload), Some(text("a")));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop_front().map(|entry| entry.payload), Some(text("b")));
        assert_eq!(queue.pop_front().map(|entry| entry.payload), Some(text("c")));
    }

    #[test]
    fn requeue_front_preserves_order_and_counts_attempts() {
        let mut queue = MessageQueue::new(None, EvictionPolicy::DropOldest, None);
        queue.enqueue(text("a"), Duration::ZERO);
        queue.enqueue(text("b"), Duration::ZERO);

        let failed = queue.pop_front().expect("entry");
        queue.requeue_front(failed);

        let head = queue.pop_front().expect("entry");
        assert_eq!(head.payload, text("a"));
        assert_eq!(head.attempts, 1);
        assert_eq!(queue.pop_front().map(|entry| entry.payload), Some(text("b")));
    }

    #[test]
    fn prune_drops_only_expired_entries() {
        let mut queue = MessageQueue::new(None, EvictionPolicy::DropOldest, Some(Duration::from_secs(1)));
        queue.enqueue(text("old"), Duration::ZERO);
        queue.enqueue(text("fresh"), Duration::from_secs(2));

        let expired = queue.prune_expired(Duration::from_secs(2));
        assert_eq!(
            expired.into_iter().map(|entry| entry.payload).collect::<Vec<_>>(),
            vec![text("old")]
        );
        assert_eq!(queue.len(), 1);
        assert_eq!(
            queue.pop_front().map(|entry| entry.payload),
            Some(text("fresh"))
        );
    }

    #[test]
    fn prune_without_expiry_is_a_no_op() {
        let mut queue = MessageQueue::new(None, EvictionPolicy::DropOldest, None);
        queue.enqueue(text("a"), Duration::ZERO);
        assert!(queue.prune_expired(Duration::from_secs(3600)).is_empty());
        assert_eq!(queue.len(), 1);
    }
}
