//! # egret-core
//!
//! Core abstractions for the egret WebSocket client.
//!
//! This crate provides the traits and types the client library builds on:
//!
//! - **Provider traits**: Abstractions for the transport, time, tasks,
//!   and randomness
//! - **Shared types**: [`Message`] payloads and [`CloseFrame`]
//! - **Production providers**: Tokio-backed implementations, including a
//!   WebSocket transport over `tokio-tungstenite`
//!
//! ## Provider Traits
//!
//! The provider traits allow the client to run against both the real
//! network and scripted in-memory transports in tests:
//!
//! - [`TransportProvider`]: WebSocket handshake and connection I/O
//! - [`TimeProvider`]: Sleep, timeout, and time operations
//! - [`TaskProvider`]: Task spawning for single-threaded environments
//! - [`RandomProvider`]: Randomness for backoff jitter
//!
//! [`Providers`] bundles the four into a single type parameter.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

mod error;
mod message;
mod providers;
mod random;
mod task;
mod time;
mod transport;

// Error exports
pub use error::TransportError;

// Shared type exports
pub use message::{CloseFrame, Message, NORMAL_CLOSURE};

// Provider trait exports
pub use providers::{Providers, TokioProviders};
pub use random::{RandomProvider, TokioRandomProvider};
pub use task::{TaskProvider, TokioTaskProvider};
pub use time::{TimeError, TimeProvider, TokioTimeProvider};
pub use transport::{
    TokioConnection, TokioTransport, TransportConnection, TransportEvent, TransportProvider,
};
