//! Replay acknowledgment payloads.
//!
//! # Protocol Flow
//!
//! The observer sends `request_replay` envelopes and the server answers with
//! one of these acknowledgments. The acknowledgment, not the request, is what
//! moves the observer's replay state:
//! 1. Observer sends `request_replay{action: start, speed}`
//! 2. Server replies `replay_started{total_events}`
//! 3. Server streams `replay_event{event}` in sequence order
//! 4. Server finishes with `replay_completed{total_events}` unless the
//!    observer pauses, seeks, or stops first

use serde::{Deserialize, Serialize};

use crate::events::GameEvent;

/// Replay session started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayStarted {
    /// Number of recorded events available for playback
    pub total_events: u64,

    /// Sequence the playback begins from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_sequence: Option<u64>,

    /// Playback speed the server accepted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

/// Replay paused at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayPaused {
    /// Sequence the playback stopped at
    pub current_sequence: u64,
}

/// Replay ran to the end of the recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayCompleted {
    /// Number of recorded events
    pub total_events: u64,
}

/// Server-side seek finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayJumped {
    /// Position playback continues from
    pub sequence: u64,
}

/// Server accepted a new playback speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplaySpeedChanged {
    /// Speed multiplier now in effect
    pub speed: f64,
}

/// Server-reported replay failure. Non-fatal, the connection stays open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayErrorData {
    /// Reason reported by the server
    pub message: String,
}

/// A recorded game event re-delivered during replay.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayEvent {
    /// Position of the event in the recording
    pub sequence_id: u64,

    /// The recorded event, dispatched exactly like a live one
    pub event: GameEvent,
}
