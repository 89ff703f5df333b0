//! In-memory transport.
//!
//! Every `open` hands the test a [`SimPeer`] through the [`SimNetwork`]. The
//! peer plays the server side of that one connection: it decides when the
//! connection opens, what frames arrive, and when it drops. Frames the client
//! sends can be read back from the peer.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use moonwatch_core::{Generation, Transport, TransportEvent, TransportHandle, TransportSink};
use moonwatch_proto::Outbound;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from the simulated transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimTransportError {
    /// Network was told to refuse connections
    #[error("connection to {url} refused")]
    Refused {
        /// Requested URL
        url: String,
    },
}

/// Client side of the simulated network.
#[derive(Debug)]
pub struct SimTransport {
    peers: mpsc::UnboundedSender<SimPeer>,
    refuse: Arc<AtomicBool>,
}

impl SimTransport {
    /// Transport plus the test's view of the network.
    pub fn new() -> (Self, SimNetwork) {
        let (peers_tx, peers_rx) = mpsc::unbounded_channel();
        let refuse = Arc::new(AtomicBool::new(false));

        (Self { peers: peers_tx, refuse: Arc::clone(&refuse) }, SimNetwork {
            peers: peers_rx,
            refuse,
        })
    }
}

impl Transport for SimTransport {
    type Error = SimTransportError;

    fn open(&mut self, url: &str, sink: TransportSink) -> Result<TransportHandle, Self::Error> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(SimTransportError::Refused { url: url.to_owned() });
        }

        let (handle, frames) = TransportHandle::new(sink.generation());
        let peer = SimPeer { url: url.to_owned(), sink, frames };
        if self.peers.send(peer).is_err() {
            tracing::trace!(%url, "network dropped, peer discarded");
        }

        Ok(handle)
    }
}

/// Test's view of the simulated network.
#[derive(Debug)]
pub struct SimNetwork {
    peers: mpsc::UnboundedReceiver<SimPeer>,
    refuse: Arc<AtomicBool>,
}

impl SimNetwork {
    /// Wait for the client to open the next transport.
    pub async fn accept(&mut self) -> Option<SimPeer> {
        self.peers.recv().await
    }

    /// Next transport if one was opened already.
    pub fn try_accept(&mut self) -> Option<SimPeer> {
        self.peers.try_recv().ok()
    }

    /// Make subsequent `open` calls fail synchronously.
    pub fn refuse_connections(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }
}

/// Server side of one simulated connection.
#[derive(Debug)]
pub struct SimPeer {
    url: String,
    sink: TransportSink,
    frames: mpsc::UnboundedReceiver<String>,
}

impl SimPeer {
    /// URL the client opened
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Generation the client opened this connection under
    pub fn generation(&self) -> Generation {
        self.sink.generation()
    }

    /// Complete the handshake.
    pub fn open(&self) {
        self.sink.emit(TransportEvent::Opened);
    }

    /// Deliver a text frame.
    pub fn deliver(&self, text: impl Into<String>) {
        self.sink.emit(TransportEvent::Message(text.into()));
    }

    /// Deliver a JSON frame.
    pub fn deliver_json(&self, value: &serde_json::Value) {
        self.deliver(value.to_string());
    }

    /// Report a transport error.
    pub fn error(&self, reason: impl Into<String>) {
        self.sink.emit(TransportEvent::Error(reason.into()));
    }

    /// Drop the connection.
    pub fn close(&self) {
        self.sink.emit(TransportEvent::Closed);
    }

    /// Wait for the next frame the client sends. `None` once the client
    /// closed this connection.
    pub async fn recv_frame(&mut self) -> Option<String> {
        self.frames.recv().await
    }

    /// Next frame the client sent, if any.
    pub fn try_recv_frame(&mut self) -> Option<String> {
        self.frames.try_recv().ok()
    }

    /// Wait for the next frame and decode it.
    pub async fn recv_envelope(&mut self) -> Option<Outbound> {
        let frame = self.recv_frame().await?;
        match Outbound::decode(&frame) {
            Ok(envelope) => Some(envelope),
            Err(err) => {
                tracing::warn!(%frame, error = %err, "client sent undecodable frame");
                None
            },
        }
    }

    /// True once the client closed its handle for this connection.
    pub fn is_closed_by_client(&mut self) -> bool {
        matches!(self.frames.try_recv(), Err(mpsc::error::TryRecvError::Disconnected))
    }
}
