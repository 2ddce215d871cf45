//! Core client implementation with the background connection driver.
//!
//! Follows a synchronous-API-with-background-actor architecture: the
//! [`Client`] handle queues work and reads shared state; a single
//! `spawn_local` driver task owns the transport connection, the state
//! machine, and all event dispatch.

use std::cell::RefCell;
use std::rc::Rc;

use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

use egret_core::{
    CloseFrame, Message, Providers, TaskProvider, TimeProvider, TransportConnection,
    TransportEvent, TransportProvider, NORMAL_CLOSURE,
};

use crate::backoff::RetryPolicy;
use crate::client::config::ClientConfig;
use crate::client::metrics::ClientMetrics;
use crate::client::state::ConnectionState;
use crate::error::{ClientError, ClientResult};
use crate::events::{CloseEvent, Event, EventDispatcher, EventKind, ListenerId};
use crate::queue::MessageQueue;

type ConnectionOf<P> = <<P as Providers>::Transport as TransportProvider>::Connection;
type CommandReceiver = mpsc::UnboundedReceiver<Command>;

/// Commands accepted by the background driver.
enum Command {
    /// Start connecting (no-op when already connecting or open).
    Connect,
    /// Gracefully shut down and stop the driver.
    Close(CloseFrame),
}

/// Shared state accessible to both the handle and the driver.
struct ClientShared {
    /// Current lifecycle state; written only by the driver
    state: ConnectionState,

    /// Outbound messages awaiting an open connection
    queue: MessageQueue,

    /// Completed reconnection attempts since the last successful open
    attempts: u32,

    /// Metrics collection
    metrics: ClientMetrics,
}

/// A resilient WebSocket client.
///
/// Maintains a logical connection to one endpoint: reconnects with
/// exponential backoff after retryable failures, buffers outgoing
/// messages while the connection is down, and replays them in order once
/// it reopens. Lifecycle and message events are delivered to listeners
/// registered with [`on`](Client::on).
///
/// `send` queues without blocking on I/O; the background driver drains
/// the queue whenever the connection is open.
pub struct Client<P: Providers> {
    /// Shared state accessible to the background driver
    shared: Rc<RefCell<ClientShared>>,

    /// Listener registry shared with the driver
    dispatcher: EventDispatcher,

    /// Trigger to wake the driver when data is queued
    data_to_send: Rc<Notify>,

    /// Command channel into the driver
    cmd_tx: mpsc::UnboundedSender<Command>,

    /// Background driver handle
    driver_handle: Option<JoinHandle<()>>,

    /// Configuration (owned by the client)
    config: ClientConfig,

    /// Target URL
    url: String,

    /// Providers bundle
    providers: P,
}

impl<P: Providers> Client<P> {
    /// Create a new client for `url`.
    ///
    /// Validates `config` and spawns the background driver. No connection
    /// is attempted until [`connect`](Client::connect) is called.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidConfig` when the configuration is
    /// rejected by [`ClientConfig::validate`].
    pub fn new(providers: P, url: impl Into<String>, config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let url = url.into();
        let now = providers.time().now();

        let shared = Rc::new(RefCell::new(ClientShared {
            state: ConnectionState::Disconnected,
            queue: MessageQueue::new(config.max_queue_size, config.eviction, config.queue_expiry),
            attempts: 0,
            metrics: ClientMetrics::new_at(now),
        }));
        let dispatcher = EventDispatcher::new();
        let data_to_send = Rc::new(Notify::new());
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let driver = ConnectionDriver {
            shared: shared.clone(),
            dispatcher: dispatcher.clone(),
            time: providers.time().clone(),
            providers: providers.clone(),
            url: url.clone(),
            policy: RetryPolicy::from_config(&config),
            config: config.clone(),
            data_to_send: data_to_send.clone(),
        };
        let driver_handle = providers
            .task()
            .spawn_task("connection_driver", driver.run(cmd_rx));

        Ok(Self {
            shared,
            dispatcher,
            data_to_send,
            cmd_tx,
            driver_handle: Some(driver_handle),
            config,
            url,
            providers,
        })
    }

    /// Create a client with default configuration.
    pub fn new_with_defaults(providers: P, url: impl Into<String>) -> ClientResult<Self> {
        Self::new(providers, url, ClientConfig::default())
    }

    /// Target URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.shared.borrow().state
    }

    /// Whether the connection is currently open.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Number of messages waiting in the outbound queue.
    pub fn queue_size(&self) -> usize {
        self.shared.borrow().queue.len()
    }

    /// Snapshot of the client metrics.
    pub fn metrics(&self) -> ClientMetrics {
        self.shared.borrow().metrics.clone()
    }

    /// Register a listener for `kind` events.
    ///
    /// Listeners for one kind fire in registration order.
    pub fn on<F>(&self, kind: EventKind, callback: F) -> ListenerId
    where
        F: FnMut(&Event) + 'static,
    {
        self.dispatcher.on(kind, callback)
    }

    /// Remove a listener previously registered with [`on`](Client::on).
    ///
    /// Returns whether a listener was removed.
    pub fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        self.dispatcher.off(kind, id)
    }

    /// Begin connecting.
    ///
    /// No-op when a connection attempt is already in progress or the
    /// connection is open. Permitted again after a gave-up terminal
    /// close; the attempt series restarts from zero.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidState` after [`close`](Client::close).
    pub fn connect(&self) -> ClientResult<()> {
        self.cmd_tx
            .send(Command::Connect)
            .map_err(|_| ClientError::InvalidState("client is closed".into()))
    }

    /// Queue a message for transmission.
    ///
    /// While the connection is open the queue drains immediately; while
    /// it is down the message is buffered and replayed in enqueue order
    /// on reconnection. When the queue is at capacity the oldest entry is
    /// evicted and reported through a `QueueOverflow` event.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidState` when buffering is disabled
    /// (`max_queue_size == Some(0)`) and the connection is not open, or
    /// after [`close`](Client::close).
    pub fn send(&self, message: impl Into<Message>) -> ClientResult<()> {
        if self
            .driver_handle
            .as_ref()
            .is_none_or(JoinHandle::is_finished)
        {
            return Err(ClientError::InvalidState("client is closed".into()));
        }

        let message = message.into();
        let now = self.providers.time().now();
        let buffering_disabled = self.config.max_queue_size == Some(0);

        let (evicted, first_unsent) = {
            let mut shared = self.shared.borrow_mut();
            if buffering_disabled && shared.state != ConnectionState::Open {
                return Err(ClientError::InvalidState(
                    "not connected and message buffering is disabled".into(),
                ));
            }
            let first_unsent = shared.queue.is_empty();
            let evicted = if buffering_disabled {
                // Pass-through entry, drained in the same dispatch cycle.
                shared.queue.enqueue_direct(message, now);
                None
            } else {
                shared.queue.enqueue(message, now)
            };
            shared.metrics.record_message_queued();
            if evicted.is_some() {
                shared.metrics.record_message_dropped();
            }
            shared.metrics.current_queue_size = shared.queue.len();
            (evicted, first_unsent)
        };

        // Wake the driver only for the first unsent message; one pending
        // drain covers everything queued behind it.
        if first_unsent {
            self.data_to_send.notify_one();
        }
        if let Some(dropped) = evicted {
            tracing::debug!("queue overflow, dropped oldest message");
            self.dispatcher.emit(&Event::QueueOverflow {
                dropped: dropped.payload,
            });
        }
        Ok(())
    }

    /// Gracefully close the connection and stop the driver.
    ///
    /// Terminal for this client instance: in-flight connection attempts
    /// and pending reconnection timers are cancelled, the terminal
    /// `Close` event is dispatched, and no further automatic reconnection
    /// happens. Safe to call in any state.
    pub async fn close(&mut self, code: Option<u16>, reason: Option<String>) {
        let frame = CloseFrame {
            code: code.unwrap_or(NORMAL_CLOSURE),
            reason: reason.unwrap_or_default(),
        };
        let _ = self.cmd_tx.send(Command::Close(frame));

        // Wait for the driver to finish its shutdown sequence.
        if let Some(handle) = self.driver_handle.take() {
            let _ = handle.await;
        }

        let mut shared = self.shared.borrow_mut();
        shared.queue.clear();
        shared.metrics.current_queue_size = 0;
    }
}

/// How one connect/reconnect series ended.
#[derive(PartialEq, Eq)]
enum SessionEnd {
    /// The retry budget was exhausted; the client is disconnected but a
    /// fresh `connect()` may start a new series.
    GaveUp,
    /// Explicit close or handle drop; the driver must stop.
    Shutdown,
}

/// Outcome of a single connection attempt.
enum Attempt<C> {
    /// The handshake succeeded.
    Opened(C),
    /// Retryable failure.
    Failed,
    /// Explicit close or handle drop; the driver must stop.
    Stop,
}

/// How the open phase ended.
enum OpenEnd {
    /// The connection was lost; consult the retry policy.
    Lost,
    /// Explicit close or handle drop; the driver must stop.
    Shutdown,
}

/// Background task owning the connection and the state machine.
///
/// All state transitions, queue draining, and listener dispatch happen
/// here, serialized on one task. Shared-state borrows are never held
/// across await points.
struct ConnectionDriver<P: Providers> {
    shared: Rc<RefCell<ClientShared>>,
    dispatcher: EventDispatcher,
    time: P::Time,
    providers: P,
    url: String,
    policy: RetryPolicy,
    config: ClientConfig,
    data_to_send: Rc<Notify>,
}

impl<P: Providers> ConnectionDriver<P> {
    async fn run(self, mut cmd_rx: CommandReceiver) {
        loop {
            // Disconnected: wait for the next command.
            match cmd_rx.recv().await {
                None => return,
                Some(Command::Close(frame)) => {
                    self.finish_closed(frame);
                    return;
                }
                Some(Command::Connect) => {}
            }

            // Each manual connect starts a fresh attempt series.
            self.shared.borrow_mut().attempts = 0;
            if self.run_session(&mut cmd_rx).await == SessionEnd::Shutdown {
                return;
            }
            // Gave up: back to Disconnected until the next connect().
        }
    }

    /// Run one connect/reconnect series until shutdown or exhaustion.
    async fn run_session(&self, cmd_rx: &mut CommandReceiver) -> SessionEnd {
        loop {
            self.set_state(ConnectionState::Connecting);
            match self.attempt_connect(cmd_rx).await {
                Attempt::Opened(connection) => match self.run_open(connection, cmd_rx).await {
                    OpenEnd::Shutdown => return SessionEnd::Shutdown,
                    OpenEnd::Lost => {}
                },
                Attempt::Failed => {}
                Attempt::Stop => return SessionEnd::Shutdown,
            }

            // Retryable failure: consult the policy.
            let attempt = self.shared.borrow().attempts;
            if !self.policy.should_retry(attempt) {
                tracing::warn!(attempt, "reconnection budget exhausted, giving up");
                self.set_state(ConnectionState::Disconnected);
                self.dispatcher.emit(&Event::Close(CloseEvent {
                    code: None,
                    reason: None,
                    was_clean: false,
                    gave_up: true,
                }));
                return SessionEnd::GaveUp;
            }

            let delay = self.policy.next_delay(attempt, self.providers.random());
            self.set_state(ConnectionState::Reconnecting);
            self.shared
                .borrow_mut()
                .metrics
                .record_retry_scheduled(delay);
            self.dispatcher.emit(&Event::Reconnecting {
                attempt: attempt + 1,
                delay,
            });
            tracing::debug!(attempt = attempt + 1, ?delay, "backing off before reconnect");

            // The pending timer must die with an explicit close: racing
            // the sleep against the command channel is the cancellation
            // point.
            let sleep = self.time.sleep(delay);
            tokio::pin!(sleep);
            loop {
                tokio::select! {
                    result = &mut sleep => {
                        if result.is_err() {
                            return SessionEnd::Shutdown;
                        }
                        self.shared.borrow_mut().attempts += 1;
                        break;
                    }
                    command = cmd_rx.recv() => match command {
                        Some(Command::Connect) => continue, // already scheduled
                        Some(Command::Close(frame)) => {
                            self.finish_closed(frame);
                            return SessionEnd::Shutdown;
                        }
                        None => return SessionEnd::Shutdown,
                    }
                }
            }
        }
    }

    /// Perform a single connection attempt, racing it against the
    /// command channel so an explicit close aborts the handshake.
    async fn attempt_connect(&self, cmd_rx: &mut CommandReceiver) -> Attempt<ConnectionOf<P>> {
        self.shared.borrow_mut().metrics.record_connection_attempt();
        tracing::debug!(url = %self.url, "connecting");

        let connect = self.time.timeout(
            self.config.connection_timeout,
            self.providers
                .transport()
                .connect(&self.url, &self.config.protocols),
        );
        tokio::pin!(connect);
        let result = loop {
            tokio::select! {
                result = &mut connect => break result,
                command = cmd_rx.recv() => match command {
                    Some(Command::Connect) => continue, // already connecting
                    Some(Command::Close(frame)) => {
                        self.finish_closed(frame);
                        return Attempt::Stop;
                    }
                    None => return Attempt::Stop,
                }
            }
        };

        match result {
            Ok(Ok(connection)) => Attempt::Opened(connection),
            Ok(Err(error)) => {
                tracing::warn!(%error, "connection attempt failed");
                self.record_failure();
                self.dispatcher.emit(&Event::Error {
                    message: error.to_string(),
                });
                Attempt::Failed
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.config.connection_timeout, "connection attempt timed out");
                self.record_failure();
                self.dispatcher.emit(&Event::Error {
                    message: ClientError::Timeout.to_string(),
                });
                Attempt::Failed
            }
        }
    }

    /// Run the open phase: drain the queue, pump transport events, and
    /// react to commands, until the connection is lost or closed.
    async fn run_open(
        &self,
        mut connection: ConnectionOf<P>,
        cmd_rx: &mut CommandReceiver,
    ) -> OpenEnd {
        let subprotocol = connection.subprotocol().map(str::to_owned);
        self.set_state(ConnectionState::Open);
        let recovered = {
            let mut shared = self.shared.borrow_mut();
            let now = self.time.now();
            shared.metrics.record_connection_success_at(now);
            std::mem::take(&mut shared.attempts)
        };

        if recovered > 0 {
            tracing::debug!(attempts = recovered, "connection re-established");
            self.dispatcher.emit(&Event::Reconnected {
                attempts: recovered,
            });
        }
        self.dispatcher.emit(&Event::Open { subprotocol });

        // Anything buffered while down goes out before new traffic.
        if !self.drain_queue(&mut connection).await {
            return OpenEnd::Lost;
        }

        loop {
            tokio::select! {
                _ = self.data_to_send.notified() => {
                    if !self.drain_queue(&mut connection).await {
                        return OpenEnd::Lost;
                    }
                }
                event = connection.next_event() => match event {
                    TransportEvent::Message(message) => {
                        self.shared
                            .borrow_mut()
                            .metrics
                            .record_message_received(message.len());
                        self.dispatcher.emit(&Event::Message(message));
                    }
                    TransportEvent::Closed(frame) => {
                        tracing::warn!("connection closed by remote");
                        let was_clean = frame.is_some();
                        self.handle_lost(frame, was_clean);
                        return OpenEnd::Lost;
                    }
                    TransportEvent::Errored(error) => {
                        tracing::warn!(%error, "transport error");
                        self.dispatcher.emit(&Event::Error {
                            message: error.to_string(),
                        });
                        self.handle_lost(None, false);
                        return OpenEnd::Lost;
                    }
                },
                command = cmd_rx.recv() => match command {
                    Some(Command::Connect) => {} // already open
                    Some(Command::Close(frame)) => {
                        self.set_state(ConnectionState::Closing);
                        if let Err(error) = connection.close(Some(frame.clone())).await {
                            tracing::debug!(%error, "close handshake failed");
                        }
                        self.finish_closed(frame);
                        return OpenEnd::Shutdown;
                    }
                    None => return OpenEnd::Shutdown,
                }
            }
        }
    }

    /// Flush the outbound queue in FIFO order.
    ///
    /// Returns false when the connection failed mid-drain; the entry
    /// that failed and everything behind it stay queued, in order, for
    /// the next drain.
    async fn drain_queue(&self, connection: &mut ConnectionOf<P>) -> bool {
        // Expired entries never hit the wire.
        let now = self.time.now();
        let expired = {
            let mut shared = self.shared.borrow_mut();
            let expired = shared.queue.prune_expired(now);
            for _ in &expired {
                shared.metrics.record_message_expired();
            }
            shared.metrics.current_queue_size = shared.queue.len();
            expired
        };
        for entry in expired {
            let age = now.saturating_sub(entry.enqueued_at);
            self.dispatcher.emit(&Event::MessageExpired {
                dropped: entry.payload,
                age,
            });
        }

        loop {
            let entry = self.shared.borrow_mut().queue.pop_front();
            let Some(entry) = entry else { break };

            match connection.send(&entry.payload).await {
                Ok(()) => {
                    let mut shared = self.shared.borrow_mut();
                    shared.metrics.record_message_sent(entry.payload.len());
                    shared.metrics.current_queue_size = shared.queue.len();
                }
                Err(error) => {
                    tracing::warn!(%error, "send failed, requeueing message");
                    {
                        let mut shared = self.shared.borrow_mut();
                        shared.queue.requeue_front(entry);
                        shared.metrics.current_queue_size = shared.queue.len();
                    }
                    self.dispatcher.emit(&Event::Error {
                        message: error.to_string(),
                    });
                    self.handle_lost(None, false);
                    return false;
                }
            }
        }
        true
    }

    /// Tear down after losing an established connection.
    ///
    /// Dispatches the non-terminal `Close` event; the session loop then
    /// consults the retry policy.
    fn handle_lost(&self, frame: Option<CloseFrame>, was_clean: bool) {
        self.shared.borrow_mut().metrics.is_connected = false;
        let (code, reason) = split_frame(frame);
        self.dispatcher.emit(&Event::Close(CloseEvent {
            code,
            reason,
            was_clean,
            gave_up: false,
        }));
    }

    /// Complete an explicit close: terminal clean shutdown.
    fn finish_closed(&self, frame: CloseFrame) {
        self.set_state(ConnectionState::Disconnected);
        self.shared.borrow_mut().metrics.is_connected = false;
        let (code, reason) = split_frame(Some(frame));
        self.dispatcher.emit(&Event::Close(CloseEvent {
            code,
            reason,
            was_clean: true,
            gave_up: false,
        }));
        tracing::debug!("client closed");
    }

    fn record_failure(&self) {
        let mut shared = self.shared.borrow_mut();
        let now = self.time.now();
        shared.metrics.record_connection_failure_at(now);
    }

    fn set_state(&self, next: ConnectionState) {
        let mut shared = self.shared.borrow_mut();
        if shared.state != next {
            tracing::debug!(from = %shared.state, to = %next, "state transition");
            shared.state = next;
        }
    }
}

fn split_frame(frame: Option<CloseFrame>) -> (Option<u16>, Option<String>) {
    match frame {
        Some(frame) => {
            let reason = if frame.reason.is_empty() {
                None
            } else {
                Some(frame.reason)
            };
            (Some(frame.code), reason)
        }
        None => (None, None),
    }
}
