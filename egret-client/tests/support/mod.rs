//! Scripted transport provider for driving the client deterministically.
//!
//! Plays the role real sockets play in production: connect attempts
//! follow a script of accept/refuse outcomes, accepted connections are
//! backed by in-memory channels, and tests run under a paused tokio
//! clock so backoff delays resolve instantly and deterministically.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use egret_client::{
    Client, CloseFrame, Event, EventKind, Message, Providers, TokioRandomProvider,
    TokioTaskProvider, TokioTimeProvider, TransportConnection, TransportError, TransportEvent,
    TransportProvider,
};

/// Outcome of the next scripted connect attempt.
#[derive(Debug, Clone, Copy)]
pub enum ConnectOutcome {
    /// Handshake succeeds.
    Accept,
    /// Handshake is refused.
    Refuse,
}

struct Script {
    outcomes: VecDeque<ConnectOutcome>,
    fallback: ConnectOutcome,
    fail_plans: VecDeque<u32>,
    subprotocol: Option<String>,
    connects: u32,
    servers: Vec<ServerEnd>,
}

/// Test-side handle to one accepted connection.
pub struct ServerEnd {
    /// Inject transport events (messages, closes, errors) into the client.
    pub incoming: mpsc::UnboundedSender<TransportEvent>,
    /// Messages the client transmitted on this connection.
    pub sent: mpsc::UnboundedReceiver<Message>,
    /// Set when the client closed this connection gracefully.
    pub closed: Rc<Cell<bool>>,
}

/// Transport provider whose connect attempts follow a script.
#[derive(Clone)]
pub struct ScriptedTransport {
    script: Rc<RefCell<Script>>,
}

impl ScriptedTransport {
    pub fn new(fallback: ConnectOutcome) -> Self {
        Self {
            script: Rc::new(RefCell::new(Script {
                outcomes: VecDeque::new(),
                fallback,
                fail_plans: VecDeque::new(),
                subprotocol: None,
                connects: 0,
                servers: Vec::new(),
            })),
        }
    }

    /// Queue outcomes for upcoming connect attempts; once exhausted the
    /// fallback outcome applies.
    pub fn push_outcomes(&self, outcomes: impl IntoIterator<Item = ConnectOutcome>) {
        self.script.borrow_mut().outcomes.extend(outcomes);
    }

    /// Make the next accepted connection fail sends after `sends`
    /// successful transmissions.
    pub fn fail_connection_after(&self, sends: u32) {
        self.script.borrow_mut().fail_plans.push_back(sends);
    }

    /// Report this subprotocol as negotiated on accepted connections.
    pub fn with_subprotocol(self, subprotocol: impl Into<String>) -> Self {
        self.script.borrow_mut().subprotocol = Some(subprotocol.into());
        self
    }

    /// Number of connect attempts observed so far.
    pub fn connect_count(&self) -> u32 {
        self.script.borrow().connects
    }

    /// Take the server end of the most recently accepted connection.
    pub fn take_last_server(&self) -> Option<ServerEnd> {
        self.script.borrow_mut().servers.pop()
    }
}

#[async_trait(?Send)]
impl TransportProvider for ScriptedTransport {
    type Connection = ScriptedConnection;

    async fn connect(
        &self,
        _url: &str,
        _protocols: &[String],
    ) -> Result<ScriptedConnection, TransportError> {
        let mut script = self.script.borrow_mut();
        script.connects += 1;
        let outcome = script.outcomes.pop_front().unwrap_or(script.fallback);
        match outcome {
            ConnectOutcome::Refuse => Err(TransportError::Io("connection refused".into())),
            ConnectOutcome::Accept => {
                let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
                let (sent_tx, sent_rx) = mpsc::unbounded_channel();
                let closed = Rc::new(Cell::new(false));
                let fail_after = Rc::new(Cell::new(script.fail_plans.pop_front()));
                script.servers.push(ServerEnd {
                    incoming: incoming_tx,
                    sent: sent_rx,
                    closed: closed.clone(),
                });
                Ok(ScriptedConnection {
                    incoming: incoming_rx,
                    sent: sent_tx,
                    closed,
                    fail_after,
                    subprotocol: script.subprotocol.clone(),
                })
            }
        }
    }
}

/// Client-side half of a scripted connection.
pub struct ScriptedConnection {
    incoming: mpsc::UnboundedReceiver<TransportEvent>,
    sent: mpsc::UnboundedSender<Message>,
    closed: Rc<Cell<bool>>,
    fail_after: Rc<Cell<Option<u32>>>,
    subprotocol: Option<String>,
}

#[async_trait(?Send)]
impl TransportConnection for ScriptedConnection {
    async fn send(&mut self, message: &Message) -> Result<(), TransportError> {
        if let Some(remaining) = self.fail_after.get() {
            if remaining == 0 {
                return Err(TransportError::Io("broken pipe".into()));
            }
            self.fail_after.set(Some(remaining - 1));
        }
        self.sent
            .send(message.clone())
            .map_err(|_| TransportError::Closed)
    }

    async fn next_event(&mut self) -> TransportEvent {
        match self.incoming.recv().await {
            Some(event) => event,
            None => TransportEvent::Closed(None),
        }
    }

    async fn close(&mut self, _close: Option<CloseFrame>) -> Result<(), TransportError> {
        self.closed.set(true);
        Ok(())
    }

    fn subprotocol(&self) -> Option<&str> {
        self.subprotocol.as_deref()
    }
}

/// Provider bundle pairing the scripted transport with real tokio
/// providers; tests run them under a paused clock.
#[derive(Clone)]
pub struct ScriptedProviders {
    transport: ScriptedTransport,
    time: TokioTimeProvider,
    task: TokioTaskProvider,
    random: TokioRandomProvider,
}

impl ScriptedProviders {
    pub fn new(transport: ScriptedTransport) -> Self {
        Self {
            transport,
            time: TokioTimeProvider::new(),
            task: TokioTaskProvider,
            random: TokioRandomProvider::new(),
        }
    }
}

impl Providers for ScriptedProviders {
    type Transport = ScriptedTransport;
    type Time = TokioTimeProvider;
    type Task = TokioTaskProvider;
    type Random = TokioRandomProvider;

    fn transport(&self) -> &Self::Transport {
        &self.transport
    }

    fn time(&self) -> &Self::Time {
        &self.time
    }

    fn task(&self) -> &Self::Task {
        &self.task
    }

    fn random(&self) -> &Self::Random {
        &self.random
    }
}

/// Run `f` inside a current-thread runtime with a paused clock and a
/// `LocalSet`, matching the client's single-threaded execution model.
pub fn run_local<F, Fut>(f: F)
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ()>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("failed to build runtime");
    let local = tokio::task::LocalSet::new();
    runtime.block_on(local.run_until(f()));
}

/// Record every event of the given kinds into a shared vec.
pub fn record_events(
    client: &Client<ScriptedProviders>,
    kinds: &[EventKind],
) -> Rc<RefCell<Vec<Event>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    for kind in kinds {
        let sink = events.clone();
        client.on(*kind, move |event| sink.borrow_mut().push(event.clone()));
    }
    events
}

/// Poll `condition` until it holds, yielding to the scheduler between
/// checks. Panics after a bounded number of iterations so a broken test
/// fails instead of hanging.
pub async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}
