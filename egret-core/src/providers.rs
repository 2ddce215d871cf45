//! Provider bundle trait for simplified type parameters.
//!
//! Without bundling, client code must carry four separate type
//! parameters (transport, time, task, random). With bundling, this
//! simplifies to `struct Client<P: Providers>`.

use crate::{
    RandomProvider, TaskProvider, TimeProvider, TokioRandomProvider, TokioTaskProvider,
    TokioTimeProvider, TokioTransport, TransportProvider,
};

/// Bundle of all provider types for a runtime environment.
///
/// The trait uses associated types to preserve type information at
/// compile time without runtime dispatch. Accessor methods provide
/// convenient access to individual providers while maintaining the
/// bundle.
pub trait Providers: Clone + 'static {
    /// Transport provider type for WebSocket connections.
    type Transport: TransportProvider + Clone + 'static;

    /// Time provider type for sleep, timeout, and time queries.
    type Time: TimeProvider + Clone + 'static;

    /// Task provider type for spawning local tasks.
    type Task: TaskProvider + Clone + 'static;

    /// Random provider type for backoff jitter.
    type Random: RandomProvider + Clone + 'static;

    /// Get the transport provider instance.
    fn transport(&self) -> &Self::Transport;

    /// Get the time provider instance.
    fn time(&self) -> &Self::Time;

    /// Get the task provider instance.
    fn task(&self) -> &Self::Task;

    /// Get the random provider instance.
    fn random(&self) -> &Self::Random;
}

/// Production providers using the Tokio runtime and `tokio-tungstenite`.
#[derive(Clone)]
pub struct TokioProviders {
    transport: TokioTransport,
    time: TokioTimeProvider,
    task: TokioTaskProvider,
    random: TokioRandomProvider,
}

impl TokioProviders {
    /// Create a new production providers bundle.
    pub fn new() -> Self {
        Self {
            transport: TokioTransport::new(),
            time: TokioTimeProvider::new(),
            task: TokioTaskProvider,
            random: TokioRandomProvider::new(),
        }
    }
}

impl Default for TokioProviders {
    fn default() -> Self {
        Self::new()
    }
}

impl Providers for TokioProviders {
    type Transport = TokioTransport;
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
