// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for WebSocket communication.
//!
//! Provides a trait-based transport layer that enables:
//! - Real WebSocket connections for production
//! - Scripted transports for unit testing
//!
//! A [`Connector`] opens one [`Transport`] per connection attempt. The
//! transport moves raw text frames; envelope decoding happens above it so a
//! single bad frame never tears the connection down.

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::error::{TransportError, TransportResult};

/// Close code for an intentional, normal closure.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Boxed future returned by transport operations.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = TransportResult<T>> + Send + 'a>>;

/// Something received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A text frame.
    Text(String),
    /// Reply to a liveness ping.
    Pong,
    /// The connection closed. `code` is `None` when no close frame arrived.
    Closed { code: Option<u16> },
}

/// An open, bidirectional channel to the server.
pub trait Transport: Send {
    /// Send a text frame.
    fn send(&mut self, text: String) -> TransportFuture<'_, ()>;

    /// Wait for the next inbound item.
    ///
    /// Must be cancel safe: the driver polls it inside `select!`.
    fn recv(&mut self) -> TransportFuture<'_, Inbound>;

    /// Send a liveness ping.
    fn ping(&mut self) -> TransportFuture<'_, ()>;

    /// Close the connection with the given close code.
    fn close(&mut self, code: u16) -> TransportFuture<'_, ()>;
}

/// Opens transports.
pub trait Connector: Send + Sync {
    /// Open a connection to `url`.
    fn connect(&self, url: Url) -> TransportFuture<'static, Box<dyn Transport>>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport implementation using tokio-tungstenite.
pub struct WebSocketTransport {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

impl WebSocketTransport {
    fn new(ws: WsStream) -> Self {
        let (sink, stream) = ws.split();
        WebSocketTransport { sink, stream }
    }
}

impl Transport for WebSocketTransport {
    fn send(&mut self, text: String) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            self.sink
                .send(Message::Text(text.into()))
                .await
                .map_err(|e| TransportError::SendFailed(e.to_string()))
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Inbound> {
        Box::pin(async move {
            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        return Ok(Inbound::Text(text.as_str().to_owned()));
                    }
                    Some(Ok(Message::Close(frame))) => {
                        return Ok(Inbound::Closed {
                            code: frame.map(|f| u16::from(f.code)),
                        });
                    }
                    Some(Ok(Message::Pong(_))) => return Ok(Inbound::Pong),
                    Some(Ok(_)) => {
                        // Pings are answered by tungstenite; binary frames are not part of the protocol
                        continue;
                    }
                    Some(Err(e)) => return Err(TransportError::ReceiveFailed(e.to_string())),
                    None => return Ok(Inbound::Closed { code: None }),
                }
            }
        })
    }

    fn ping(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            self.sink
                .send(Message::Ping(Default::default()))
                .await
                .map_err(|e| TransportError::SendFailed(e.to_string()))
        })
    }

    fn close(&mut self, code: u16) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let frame = CloseFrame {
                code: CloseCode::from(code),
                reason: String::new().into(),
            };
            self.sink
                .send(Message::Close(Some(frame)))
                .await
                .map_err(|e| TransportError::SendFailed(e.to_string()))?;
            self.sink
                .close()
                .await
                .map_err(|e| TransportError::SendFailed(e.to_string()))
        })
    }
}

async fn open_websocket(url: Url) -> TransportResult<Box<dyn Transport>> {
    let (ws, _) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
    Ok(Box::new(WebSocketTransport::new(ws)))
}

/// Opens [`WebSocketTransport`]s with `connect_async`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
    fn connect(&self, url: Url) -> TransportFuture<'static, Box<dyn Transport>> {
        Box::pin(open_websocket(url))
    }
}
