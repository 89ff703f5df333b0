//! Inputs to the observer client.

use moonwatch_core::{Generation, TransportSignal};

/// Replay command issued by the spectator.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayCommand {
    /// Start a replay. `None` uses the configured default speed.
    Start {
        /// Playback speed multiplier
        speed: Option<f64>,
    },
    /// Pause playback
    Pause,
    /// Resume playback
    Resume,
    /// Stop playback
    Stop,
    /// Seek to the sequence the user typed. Validated before sending.
    Jump {
        /// Raw user input
        input: String,
    },
    /// Change playback speed
    SetSpeed {
        /// Playback speed multiplier
        speed: f64,
    },
}

/// Everything the runtime feeds into [`crate::ObserverClient::handle`].
///
/// Events are processed one at a time in the order the runtime receives
/// them.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// User asked to connect
    Connect,
    /// User asked to disconnect. Also the client's teardown.
    Disconnect,
    /// Something happened on a transport
    Transport(TransportSignal),
    /// Transport for `generation` could not be constructed
    TransportRejected {
        /// Generation of the rejected transport
        generation: Generation,
        /// Why it was rejected
        reason: String,
    },
    /// Reconnect timer scheduled under `generation` fired
    ReconnectTimerFired {
        /// Generation the timer was scheduled under
        generation: Generation,
    },
    /// Periodic tick driving the heartbeat
    Tick,
    /// Replay command
    Replay(ReplayCommand),
}
