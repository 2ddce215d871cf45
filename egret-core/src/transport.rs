//! Transport abstraction over a WebSocket socket primitive.
//!
//! This module provides trait-based transport access so the client can
//! swap between the real `tokio-tungstenite` stack and scripted in-memory
//! connections for testing. The transport owns the wire concerns
//! (handshake, framing, ping/pong); the client only sees application
//! messages and terminal close/error events.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame as WsCloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::{CloseFrame, Message, TransportError};

/// An event produced by a transport connection.
#[derive(Debug)]
pub enum TransportEvent {
    /// An application message arrived.
    Message(Message),
    /// The connection closed; the frame is present when the peer sent one.
    Closed(Option<CloseFrame>),
    /// The connection failed.
    Errored(TransportError),
}

/// Provider trait for establishing WebSocket connections.
///
/// Single-core design - no Send bounds needed.
/// Clone allows sharing a provider across multiple clients.
#[async_trait(?Send)]
pub trait TransportProvider: Clone {
    /// The connection type produced by this provider.
    type Connection: TransportConnection + 'static;

    /// Perform one connection handshake against `url`.
    ///
    /// `protocols` are offered to the server in preference order, passed
    /// through unmodified. No retry is attempted here; the caller owns
    /// retry policy.
    async fn connect(
        &self,
        url: &str,
        protocols: &[String],
    ) -> Result<Self::Connection, TransportError>;
}

/// An established WebSocket connection.
#[async_trait(?Send)]
pub trait TransportConnection {
    /// Send one message. Valid only while the socket is open.
    async fn send(&mut self, message: &Message) -> Result<(), TransportError>;

    /// Wait for the next event.
    ///
    /// Yields any number of `Message` events followed by exactly one
    /// terminal `Closed` or `Errored` per connection.
    async fn next_event(&mut self) -> TransportEvent;

    /// Request a graceful shutdown.
    ///
    /// Closing an already-closed socket is not an error.
    async fn close(&mut self, close: Option<CloseFrame>) -> Result<(), TransportError>;

    /// The subprotocol negotiated during the handshake, if any.
    fn subprotocol(&self) -> Option<&str>;
}

/// Production transport using `tokio-tungstenite`.
#[derive(Debug, Clone, Default)]
pub struct TokioTransport;

impl TokioTransport {
    /// Create a new Tokio WebSocket transport.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl TransportProvider for TokioTransport {
    type Connection = TokioConnection;

    async fn connect(
        &self,
        url: &str,
        protocols: &[String],
    ) -> Result<TokioConnection, TransportError> {
        let mut request = url
            .into_client_request()
            .map_err(|e| TransportError::Handshake(e.to_string()))?;
        if !protocols.is_empty() {
            let offered = HeaderValue::from_str(&protocols.join(", "))
                .map_err(|e| TransportError::Handshake(e.to_string()))?;
            request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, offered);
        }

        let (stream, response) = connect_async(request)
            .await
            .map_err(|e| TransportError::Handshake(e.to_string()))?;
        let subprotocol = response
            .headers()
            .get(SEC_WEBSOCKET_PROTOCOL)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        tracing::debug!(
            url,
            subprotocol = subprotocol.as_deref(),
            "websocket handshake complete"
        );

        Ok(TokioConnection {
            stream,
            subprotocol,
        })
    }
}

/// Connection produced by [`TokioTransport`].
pub struct TokioConnection {
    stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    subprotocol: Option<String>,
}

#[async_trait(?Send)]
impl TransportConnection for TokioConnection {
    async fn send(&mut self, message: &Message) -> Result<(), TransportError> {
        self.stream
            .send(message_to_wire(message))
            .await
            .map_err(map_ws_error)
    }

    async fn next_event(&mut self) -> TransportEvent {
        loop {
            match self.stream.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    return TransportEvent::Message(Message::Text(text.as_str().to_owned()));
                }
                Some(Ok(WsMessage::Binary(bytes))) => {
                    return TransportEvent::Message(Message::Binary(bytes.to_vec()));
                }
                // Ping/pong are answered by tungstenite during the read;
                // raw frames only occur in manual mode. Nothing to surface.
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => continue,
                Some(Ok(WsMessage::Close(frame))) => {
                    return TransportEvent::Closed(frame.map(close_frame_from_wire));
                }
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                    return TransportEvent::Closed(None);
                }
                Some(Err(error)) => return TransportEvent::Errored(map_ws_error(error)),
            }
        }
    }

    async fn close(&mut self, close: Option<CloseFrame>) -> Result<(), TransportError> {
        match self.stream.close(close.map(close_frame_to_wire)).await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(error) => Err(map_ws_error(error)),
        }
    }

    fn subprotocol(&self) -> Option<&str> {
        self.subprotocol.as_deref()
    }
}

fn message_to_wire(message: &Message) -> WsMessage {
    match message {
        Message::Text(text) => WsMessage::text(text.clone()),
        Message::Binary(bytes) => WsMessage::binary(bytes.clone()),
    }
}

fn close_frame_from_wire(frame: WsCloseFrame) -> CloseFrame {
    CloseFrame {
        code: u16::from(frame.code),
        reason: frame.reason.as_str().to_owned(),
    }
}

fn close_frame_to_wire(frame: CloseFrame) -> WsCloseFrame {
    WsCloseFrame {
        code: CloseCode::from(frame.code),
        reason: frame.reason.into(),
    }
}

fn map_ws_error(error: WsError) -> TransportError {
    match error {
        WsError::ConnectionClosed | WsError::AlreadyClosed => TransportError::Closed,
        WsError::Io(io) => TransportError::Io(io.to_string()),
        other => TransportError::Protocol(other.to_string()),
    }
}
