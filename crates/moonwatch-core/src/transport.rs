//! Transport abstraction for message-oriented connections.
//!
//! A transport carries text frames over one persistent bidirectional
//! connection. Production uses WebSockets, tests use an in-memory peer.
//!
//! Transports never call into the state machine. They push
//! [`TransportSignal`]s into a [`TransportSink`], and the runtime feeds those
//! signals to the client one at a time, in arrival order, together with
//! timers and user commands. Each signal carries the [`Generation`] of the
//! connection attempt that produced it so late signals from an old transport
//! can be recognized and dropped.

use tokio::sync::mpsc;

use crate::{connection::Generation, error::ConnectionError};

/// Something that happened on a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Connection is up
    Opened,
    /// Text frame received
    Message(String),
    /// Transport reported an error. A `Closed` follows.
    Error(String),
    /// Connection is gone
    Closed,
}

/// A transport event tagged with the generation that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSignal {
    /// Generation of the transport
    pub generation: Generation,
    /// What happened
    pub event: TransportEvent,
}

/// Where a transport reports its events.
#[derive(Debug, Clone)]
pub struct TransportSink {
    generation: Generation,
    signals: mpsc::UnboundedSender<TransportSignal>,
}

impl TransportSink {
    /// Sink tagging every event with `generation`.
    pub fn new(generation: Generation, signals: mpsc::UnboundedSender<TransportSignal>) -> Self {
        Self { generation, signals }
    }

    /// Generation this sink tags events with.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Report an event. Returns `false` once the runtime has shut down.
    pub fn emit(&self, event: TransportEvent) -> bool {
        self.signals.send(TransportSignal { generation: self.generation, event }).is_ok()
    }
}

/// Outbound side of an open transport.
///
/// Dropping the handle asks the transport to close.
#[derive(Debug)]
pub struct TransportHandle {
    generation: Generation,
    outbound: mpsc::UnboundedSender<String>,
}

impl TransportHandle {
    /// Handle for `generation` plus the receiver the transport task drains.
    pub fn new(generation: Generation) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (outbound, frames) = mpsc::unbounded_channel();
        (Self { generation, outbound }, frames)
    }

    /// Generation this handle belongs to.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Queue a text frame. Never blocks.
    ///
    /// # Errors
    ///
    /// `TransportGone` if the transport task has already exited.
    pub fn send(&self, frame: String) -> Result<(), ConnectionError> {
        self.outbound.send(frame).map_err(|_| ConnectionError::TransportGone)
    }

    /// Close the transport.
    pub fn close(self) {
        drop(self);
    }
}

/// Factory for transports.
pub trait Transport: Send + 'static {
    /// Error for transports that cannot even be constructed.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Start opening a connection to `url`.
    ///
    /// Returns immediately. Progress (`Opened`, messages, `Error`, `Closed`)
    /// is reported through `sink`, and a connection attempt that fails later
    /// reports `Error` then `Closed` rather than returning an error here.
    ///
    /// # Errors
    ///
    /// Only for synchronous construction failures, such as a URL the
    /// transport cannot handle.
    fn open(&mut self, url: &str, sink: TransportSink) -> Result<TransportHandle, Self::Error>;
}
