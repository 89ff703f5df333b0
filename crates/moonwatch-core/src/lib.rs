//! Moonwatch connection core
//!
//! Pure state machine logic for an observer's connection to the game server,
//! decoupled from I/O so lifecycle behaviour is deterministic under test.
//!
//! # Architecture
//!
//! The [`ConnectionManager`] never touches a socket or a timer. Its methods
//! accept the current time where it matters and return declarative
//! [`ConnectionAction`]s (open a transport, close it, send an envelope,
//! schedule a reconnect). A runtime or test harness interprets the actions.
//!
//! Every transport handle and every reconnect timer is tagged with the
//! [`Generation`] it was created under. Connecting and disconnecting advance
//! the generation, and signals tagged with an older generation are discarded
//! before they can touch state.
//!
//! # Components
//!
//! - [`connection`]: Connection lifecycle (connect, reconnect, fail, disconnect)
//! - [`heartbeat`]: Periodic ping scheduling and round-trip tracking
//! - [`endpoint`]: Endpoint URL derivation from the hosting page location
//! - [`mod@env`]: Environment abstraction (clock, sleep)
//! - [`transport`]: Transport abstraction (generation-tagged signals)
//! - [`error`]: Connection error types

pub mod connection;
pub mod endpoint;
pub mod env;
pub mod error;
pub mod heartbeat;
pub mod transport;

pub use connection::{
    ConnectionAction, ConnectionConfig, ConnectionFailure, ConnectionManager, ConnectionState,
    ConnectionStatus, Generation,
};
pub use endpoint::PageLocation;
pub use env::{Environment, SystemEnv};
pub use error::ConnectionError;
pub use heartbeat::HeartbeatMonitor;
pub use transport::{Transport, TransportEvent, TransportHandle, TransportSignal, TransportSink};
