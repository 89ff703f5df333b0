//! WebSocket transport.
//!
//! Each opened connection runs in its own tokio task that owns the socket.
//! The task reports progress through the [`TransportSink`] and drains the
//! [`TransportHandle`]'s outbound frames. A failed handshake is reported as
//! `Error` followed by `Closed`, the same sequence a dropped connection
//! produces, so the connection manager sees a single recovery path.

use futures::{SinkExt, StreamExt};
use moonwatch_core::{Transport, TransportEvent, TransportHandle, TransportSink};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};

/// Errors from the WebSocket transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// URL is not a WebSocket URL
    #[error("unsupported endpoint {url}: expected ws:// or wss://")]
    UnsupportedUrl {
        /// Offending URL
        url: String,
    },

    /// `open` was called outside a tokio runtime
    #[error("no tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    /// WebSocket protocol or I/O failure
    #[error("websocket: {0}")]
    WebSocket(#[from] tungstenite::Error),
}

/// Production transport over `tokio-tungstenite`.
#[derive(Debug, Clone, Copy)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    /// Create the transport, installing the `ring` crypto provider for
    /// `wss://` endpoints if no provider is installed yet.
    pub fn new() -> Self {
        if rustls::crypto::ring::default_provider().install_default().is_err() {
            tracing::trace!("rustls crypto provider already installed");
        }
        Self
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for WebSocketTransport {
    type Error = TransportError;

    fn open(&mut self, url: &str, sink: TransportSink) -> Result<TransportHandle, Self::Error> {
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return Err(TransportError::UnsupportedUrl { url: url.to_owned() });
        }

        let runtime = tokio::runtime::Handle::try_current()?;
        let (handle, frames) = TransportHandle::new(sink.generation());
        runtime.spawn(run_connection(url.to_owned(), sink, frames));

        Ok(handle)
    }
}

async fn run_connection(url: String, sink: TransportSink, mut frames: mpsc::UnboundedReceiver<String>) {
    let generation = sink.generation();

    let stream = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(err) => {
            tracing::debug!(%generation, %url, error = %err, "websocket handshake failed");
            sink.emit(TransportEvent::Error(TransportError::from(err).to_string()));
            sink.emit(TransportEvent::Closed);
            return;
        },
    };

    if !sink.emit(TransportEvent::Opened) {
        return;
    }

    let (mut writer, mut reader) = stream.split();

    loop {
        tokio::select! {
            outbound = frames.recv() => match outbound {
                Some(text) => {
                    if let Err(err) = writer.send(Message::Text(text.into())).await {
                        sink.emit(TransportEvent::Error(TransportError::from(err).to_string()));
                        break;
                    }
                },
                None => {
                    tracing::debug!(%generation, "closing websocket");
                    if let Err(err) = writer.close().await {
                        tracing::debug!(%generation, error = %err, "websocket close failed");
                    }
                    break;
                },
            },
            inbound = reader.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if !sink.emit(TransportEvent::Message(text.as_str().to_owned())) {
                        return;
                    }
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {},
                Some(Err(err)) => {
                    sink.emit(TransportEvent::Error(TransportError::from(err).to_string()));
                    break;
                },
            },
        }
    }

    sink.emit(TransportEvent::Closed);
}
