//! Resilient WebSocket client connection management.
//!
//! This module provides the [`Client`] abstraction: a logical connection
//! that survives real disconnects.
//!
//! # Overview
//!
//! A Client represents a logical connection to a WebSocket endpoint. It
//! handles:
//! - **Automatic reconnection** with exponential backoff
//! - **Message queuing** during disconnection periods, replayed in order
//! - **Event dispatch** for lifecycle and message events
//!
//! # Connection Lifecycle
//!
//! ```text
//!                 connect()                opened
//! ┌────────────┐ ──────────► ┌──────────┐ ──────► ┌──────┐
//! │Disconnected│             │Connecting│         │ Open │
//! └────────────┘ ◄────────── └──────────┘         └──┬───┘
//!       ▲          gave up      ▲                    │
//!       │                       │ delay elapsed      │ closed /
//!       │ close()               │                    │ errored
//!       │                  ┌────┴───────┐            │
//!   ┌───┴───┐              │Reconnecting│ ◄──────────┘
//!   │Closing│              └────────────┘
//!   └───────┘
//! ```
//!
//! Every state transition is owned by a single background driver task;
//! queue draining and listener dispatch happen on that task, so no
//! callback ever observes a torn intermediate state.
//!
//! # Backoff Strategy
//!
//! - Initial delay: configurable (default 100ms)
//! - Maximum delay: configurable (default 30s)
//! - Exponential growth, optional bounded jitter

/// Core client implementation with the background connection driver
pub mod core;

/// Configuration structures for client behavior
pub mod config;

/// Connection lifecycle states
pub mod state;

/// Metrics collection and connection statistics
pub mod metrics;

// Re-export main types
pub use config::{ClientConfig, EvictionPolicy};
pub use core::Client;
pub use metrics::ClientMetrics;
pub use state::ConnectionState;
