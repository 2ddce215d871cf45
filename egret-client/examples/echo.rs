//! Echo example: a resilient client talking to a WebSocket echo server.
//!
//! Start any echo server first, then run the example:
//!
//! ```bash
//! # Terminal 1 - an echo server, e.g.
//! websocat -s 9001
//!
//! # Terminal 2 - the client
//! cargo run --example echo -- ws://127.0.0.1:9001
//! ```
//!
//! Messages sent before the server is reachable are queued and replayed
//! once the connection opens; killing and restarting the server shows
//! the reconnect/backoff cycle in the logs.

use std::env;
use std::time::Duration;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use egret_client::{Client, ClientConfig, Event, EventKind, TokioProviders};

// ============================================================================
// Configuration
// ============================================================================

const DEFAULT_URL: &str = "ws://127.0.0.1:9001";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // The client's driver task is !Send; run everything on a LocalSet.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .enable_time()
        .build()?;
    let local = tokio::task::LocalSet::new();
    runtime.block_on(local.run_until(run()))
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let url = env::args().nth(1).unwrap_or_else(|| DEFAULT_URL.to_owned());
    info!("connecting to {url}");

    let config = ClientConfig {
        retry_base_delay: Duration::from_millis(250),
        retry_max_delay: Duration::from_secs(5),
        max_reconnect_attempts: Some(8),
        ..ClientConfig::default()
    };
    let mut client = Client::new(TokioProviders::new(), url, config)?;

    client.on(EventKind::Open, |event| {
        if let Event::Open { subprotocol } = event {
            info!(?subprotocol, "connection open");
        }
    });
    client.on(EventKind::Message, |event| {
        if let Event::Message(message) = event {
            info!("echoed back: {message:?}");
        }
    });
    client.on(EventKind::Reconnecting, |event| {
        if let Event::Reconnecting { attempt, delay } = event {
            info!("attempt {attempt} scheduled in {delay:?}");
        }
    });
    client.on(EventKind::Close, |event| {
        if let Event::Close(close) = event {
            info!(
                code = close.code,
                clean = close.was_clean,
                gave_up = close.gave_up,
                "connection closed"
            );
        }
    });

    // Queued before the connection exists; replayed in order on open.
    client.send("hello")?;
    client.send("from")?;
    client.send("egret")?;
    client.connect()?;

    tokio::time::sleep(Duration::from_secs(5)).await;
    client.close(None, None).await;
    Ok(())
}
