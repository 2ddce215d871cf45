//! Event kinds, payloads, and listener dispatch.
//!
//! Listeners for one kind fire in registration order. A panicking
//! listener never suppresses the listeners after it: each panic is caught
//! and reported as a distinct [`Event::ListenerError`].

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Duration;

use egret_core::Message;

/// Kinds of events a client emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The connection opened.
    Open,
    /// An inbound application message arrived.
    Message,
    /// The connection closed (terminal or not, see [`CloseEvent`]).
    Close,
    /// The transport reported an error.
    Error,
    /// A reconnection attempt was scheduled.
    Reconnecting,
    /// The connection was re-established after at least one failure.
    Reconnected,
    /// A queued message was evicted to make room for a newer one.
    QueueOverflow,
    /// A queued message exceeded its configured lifetime.
    MessageExpired,
    /// A listener callback panicked during dispatch.
    ListenerError,
}

/// Details of a connection close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseEvent {
    /// Close status code, when one was supplied.
    pub code: Option<u16>,
    /// Close reason, when one was supplied.
    pub reason: Option<String>,
    /// Whether the close completed a clean shutdown handshake.
    pub was_clean: bool,
    /// Whether the client has given up reconnecting.
    pub gave_up: bool,
}

/// An event delivered to registered listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The connection opened.
    Open {
        /// Subprotocol accepted by the server, if any.
        subprotocol: Option<String>,
    },
    /// An inbound application message.
    Message(Message),
    /// The connection closed.
    Close(CloseEvent),
    /// The transport reported an error.
    Error {
        /// Description of the failure.
        message: String,
    },
    /// A reconnection attempt was scheduled.
    Reconnecting {
        /// One-based number of the upcoming attempt.
        attempt: u32,
        /// Backoff delay before the attempt starts.
        delay: Duration,
    },
    /// The connection was re-established after failures.
    Reconnected {
        /// Number of failed attempts before this success.
        attempts: u32,
    },
    /// A queued message was evicted on overflow.
    QueueOverflow {
        /// The payload that was dropped.
        dropped: Message,
    },
    /// A queued message expired before it could be sent.
    MessageExpired {
        /// The payload that was dropped.
        dropped: Message,
        /// Age of the message when it was pruned.
        age: Duration,
    },
    /// A listener panicked while handling an event.
    ListenerError {
        /// Kind of the event whose listener failed.
        kind: EventKind,
        /// Panic payload rendered as text.
        reason: String,
    },
}

impl Event {
    /// The kind used to select listeners for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Open { .. } => EventKind::Open,
            Event::Message(_) => EventKind::Message,
            Event::Close(_) => EventKind::Close,
            Event::Error { .. } => EventKind::Error,
            Event::Reconnecting { .. } => EventKind::Reconnecting,
            Event::Reconnected { .. } => EventKind::Reconnected,
            Event::QueueOverflow { .. } => EventKind::QueueOverflow,
            Event::MessageExpired { .. } => EventKind::MessageExpired,
            Event::ListenerError { .. } => EventKind::ListenerError,
        }
    }
}

/// Handle identifying a registered listener, returned by
/// [`EventDispatcher::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

type Callback = Box<dyn FnMut(&Event)>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<EventKind, Vec<(ListenerId, Rc<RefCell<Callback>>)>>,
}

/// Dispatches events to registered listeners in registration order.
///
/// Cheap to clone; clones share the same registry. Callbacks may
/// re-entrantly register or remove listeners, or trigger further emits.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    registry: Rc<RefCell<Registry>>,
}

impl EventDispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `kind`. Dispatch order is registration
    /// order.
    pub fn on<F>(&self, kind: EventKind, callback: F) -> ListenerId
    where
        F: FnMut(&Event) + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let id = ListenerId(registry.next_id);
        registry
            .listeners
            .entry(kind)
            .or_default()
            .push((id, Rc::new(RefCell::new(Box::new(callback) as Callback))));
        id
    }

    /// Remove the listener registered under `id` for `kind`.
    ///
    /// Returns whether a listener was removed.
    pub fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut registry = self.registry.borrow_mut();
        match registry.listeners.get_mut(&kind) {
            Some(list) => {
                let before = list.len();
                list.retain(|(listener, _)| *listener != id);
                before != list.len()
            }
            None => false,
        }
    }

    /// Invoke every listener registered for the event's kind.
    ///
    /// A panicking listener is isolated: the remaining listeners for the
    /// same emission still run, and each panic surfaces afterwards as a
    /// [`Event::ListenerError`]. Panics from `ListenerError` listeners
    /// themselves are logged, not re-dispatched.
    pub fn emit(&self, event: &Event) {
        let kind = event.kind();
        // Snapshot so callbacks can re-entrantly register or remove
        // listeners without the registry borrow being held.
        let callbacks: Vec<(ListenerId, Rc<RefCell<Callback>>)> = self
            .registry
            .borrow()
            .listeners
            .get(&kind)
            .map(|list| list.to_vec())
            .unwrap_or_default();

        let mut failures = Vec::new();
        for (id, callback) in callbacks {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (callback.borrow_mut())(event)));
            if let Err(payload) = outcome {
                failures.push((id, panic_message(payload)));
            }
        }

        for (id, reason) in failures {
            tracing::warn!(?kind, listener = id.0, %reason, "listener panicked during dispatch");
            if kind != EventKind::ListenerError {
                self.emit(&Event::ListenerError { kind, reason });
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_owned()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "listener panicked".to_owned()
    }
}
