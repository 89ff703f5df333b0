//! Action-based observer client.
//!
//! The client is a pure state machine: the runtime feeds it
//! [`ClientEvent`]s (user commands, transport signals, timers) one at a time
//! and executes the [`ClientAction`]s it returns. All connection, routing and
//! replay logic lives here with no I/O, so the same code runs under the tokio
//! runtime and under the deterministic harness.
//!
//! # Components
//!
//! - [`ObserverClient`]: Composes the pieces behind one total `handle`
//! - [`router`]: Two-level envelope dispatch into game state
//! - [`replay`]: Replay request/acknowledgment state machine
//! - [`state`]: Observer session, game snapshot, chat log
//! - [`Notification`]: Typed state changes for the presentation layer
//!
//! With the `transport` feature, [`WebSocketTransport`] provides the
//! production transport.

mod action;
mod client;
mod error;
mod event;
mod notification;
pub mod replay;
pub mod router;
pub mod state;
#[cfg(feature = "transport")]
mod transport;

pub use action::ClientAction;
pub use client::{ClientConfig, ObserverClient};
pub use error::ReplayError;
pub use event::{ClientEvent, ReplayCommand};
pub use notification::{Alert, Notification, Severity};
pub use replay::{ReplayAck, ReplayController, ReplayControls, ReplaySession, ReplayStatus};
pub use router::{MessageRouter, Routed};
pub use state::{ChatEntry, ChatKind, ChatLog, ChatPayload, GameStateSnapshot, GameView, ObserverSession};
#[cfg(feature = "transport")]
pub use transport::{TransportError, WebSocketTransport};
