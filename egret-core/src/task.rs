//! Task spawning abstraction for single-threaded execution.

use async_trait::async_trait;
use std::future::Future;

/// Provider for spawning local tasks in a single-threaded context.
///
/// This trait abstracts task spawning so the client's background driver
/// can run both under a real Tokio `LocalSet` and under test-controlled
/// scheduling while maintaining single-threaded execution guarantees.
#[async_trait(?Send)]
pub trait TaskProvider: Clone {
    /// Spawn a named task that runs on the current thread.
    fn spawn_task<F>(&self, name: &str, future: F) -> tokio::task::JoinHandle<()>
    where
        F: Future<Output = ()> + 'static;
}

/// Production task provider using `tokio::task::spawn_local`.
///
/// Callers must be running inside a `tokio::task::LocalSet` (or a local
/// runtime) when tasks are spawned.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTaskProvider;

#[async_trait(?Send)]
impl TaskProvider for TokioTaskProvider {
    fn spawn_task<F>(&self, name: &str, future: F) -> tokio::task::JoinHandle<()>
    where
        F: Future<Output = ()> + 'static,
    {
        tracing::trace!(task = name, "spawning local task");
        tokio::task::spawn_local(future)
    }
}
