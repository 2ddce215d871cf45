//! # egret-client
//!
//! A resilient WebSocket client that maintains a logical connection
//! across real disconnects, buffers outgoing messages during outages,
//! and replays them in order on reconnection.
//!
//! This crate provides:
//! - **Client**: Connection lifecycle management with automatic
//!   reconnection and exponential backoff
//! - **Message queue**: Ordered buffering with drop-oldest overflow and
//!   optional expiry
//! - **Retry policy**: Pure backoff computation, deterministic to test
//! - **Event dispatch**: Ordered listeners with per-listener failure
//!   isolation
//!
//! The client runs on a cooperative single-threaded model: one background
//! driver task owns the connection and all state transitions, spawned
//! through the [`TaskProvider`] bundle. Run it inside a
//! `tokio::task::LocalSet` (or a local runtime).
//!
//! ## Example
//!
//! ```ignore
//! use egret_client::{Client, ClientConfig, EventKind, TokioProviders};
//!
//! let client = Client::new(
//!     TokioProviders::new(),
//!     "ws://localhost:9001",
//!     ClientConfig::default(),
//! )?;
//! client.on(EventKind::Message, |event| println!("{event:?}"));
//! client.connect()?;
//! client.send("hello")?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

// Re-export core types for convenience
pub use egret_core::{
    CloseFrame, Message, Providers, RandomProvider, TaskProvider, TimeError, TimeProvider,
    TokioProviders, TokioRandomProvider, TokioTaskProvider, TokioTimeProvider, TokioTransport,
    TransportConnection, TransportError, TransportEvent, TransportProvider, NORMAL_CLOSURE,
};

// =============================================================================
// Modules
// =============================================================================

/// Reconnection retry policy.
pub mod backoff;

/// Client connection management.
pub mod client;

/// Error types for client operations.
pub mod error;

/// Event kinds, payloads, and listener dispatch.
pub mod events;

/// Outbound message queueing.
pub mod queue;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use backoff::RetryPolicy;
pub use client::{Client, ClientConfig, ClientMetrics, ConnectionState, EvictionPolicy};
pub use error::{ClientError, ClientResult};
pub use events::{CloseEvent, Event, EventDispatcher, EventKind, ListenerId};
pub use queue::{MessageQueue, QueuedMessage};
