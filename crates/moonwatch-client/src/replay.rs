//! Replay control state machine.
//!
//! Spectator commands are requests. The authoritative transition happens when
//! the server's acknowledgment arrives, with one exception: `start` and
//! `stop` flip the local `replay_mode` flag as soon as the request is
//! issued. `pause`, `resume`, `jump` and `set_speed` change nothing locally.
//!
//! # State Machine
//!
//! ```text
//!         start()          replay_started        replay_paused
//! ┌──────┐ ─────> ┌───────────┐ ─────> ┌─────────┐ ─────> ┌────────┐
//! │ Idle │        │ Requested │        │ Playing │ <───── │ Paused │
//! └──────┘        └───────────┘        └─────────┘ resumed└────────┘
//!                                           │ replay_completed
//!                                           v
//!                                     ┌───────────┐
//!                                     │ Completed │
//!                                     └───────────┘
//! ```
//!
//! `replay_stopped` moves any non-idle session to Stopped. Acknowledgments
//! other than `replay_stopped` only apply while a replay is active
//! (Requested, Playing or Paused), except `replay_started`, which also
//! applies while a start request is outstanding.
//!
//! # Restart
//!
//! Starting over a running or finished replay makes the server tear the old
//! session down first: `replay_paused`, `replay_stopped`, then
//! `replay_started` for the new one. A start request stays outstanding until
//! its `replay_started` arrives or the user stops, so the teardown
//! `replay_stopped` neither clears the optimistic flag nor swallows the
//! acknowledgment that follows.

use moonwatch_core::{ConnectionAction, ConnectionManager};
use moonwatch_proto::{
    Outbound, ReplayCompleted, ReplayJumped, ReplayPaused, ReplayRequest, ReplaySpeedChanged,
    ReplayStarted,
};

use crate::error::ReplayError;

/// Visible replay status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplayStatus {
    /// No replay requested yet
    Idle,
    /// Start requested, waiting for `replay_started`
    Requested,
    /// Server is streaming recorded events
    Playing,
    /// Server paused the stream
    Paused,
    /// Server stopped the replay
    Stopped,
    /// Server reached the end of the recording
    Completed,
}

impl ReplayStatus {
    /// Whether acknowledgments for a running replay apply.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Requested | Self::Playing | Self::Paused)
    }
}

/// Replay progress as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplaySession {
    /// Visible status
    pub status: ReplayStatus,
    /// Playback speed multiplier
    pub speed: f64,
    /// Position of the last delivered or acknowledged event
    pub current_sequence: u64,
    /// Number of recorded events
    pub total_sequence: u64,
    /// Optimistic flag, set by `start` and cleared by `stop` before any
    /// acknowledgment
    pub replay_mode: bool,
}

impl ReplaySession {
    /// Idle session at the given speed.
    pub fn new(speed: f64) -> Self {
        Self {
            status: ReplayStatus::Idle,
            speed,
            current_sequence: 0,
            total_sequence: 0,
            replay_mode: false,
        }
    }

    /// Which controls are enabled.
    pub fn controls(&self) -> ReplayControls {
        ReplayControls {
            start: !self.replay_mode,
            pause: self.replay_mode,
            resume: self.replay_mode,
            stop: self.replay_mode,
        }
    }
}

impl Default for ReplaySession {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Enabled state of the replay buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayControls {
    /// Start button
    pub start: bool,
    /// Pause button
    pub pause: bool,
    /// Resume button
    pub resume: bool,
    /// Stop button
    pub stop: bool,
}

/// Server acknowledgment of a replay request.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayAck {
    /// `replay_started`
    Started(ReplayStarted),
    /// `replay_paused`
    Paused(ReplayPaused),
    /// `replay_resumed`
    Resumed,
    /// `replay_stopped`
    Stopped,
    /// `replay_completed`
    Completed(ReplayCompleted),
    /// `replay_jumped`
    Jumped(ReplayJumped),
    /// `replay_speed_changed`
    SpeedChanged(ReplaySpeedChanged),
}

impl ReplayAck {
    /// Envelope tag the acknowledgment arrived as.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Started(_) => "replay_started",
            Self::Paused(_) => "replay_paused",
            Self::Resumed => "replay_resumed",
            Self::Stopped => "replay_stopped",
            Self::Completed(_) => "replay_completed",
            Self::Jumped(_) => "replay_jumped",
            Self::SpeedChanged(_) => "replay_speed_changed",
        }
    }
}

/// Replay request/acknowledgment state machine.
#[derive(Debug, Clone)]
pub struct ReplayController {
    session: ReplaySession,
    /// Speed of the start request not yet answered by `replay_started`
    pending_start: Option<f64>,
}

impl ReplayController {
    /// Idle controller at the given speed.
    pub fn new(speed: f64) -> Self {
        Self { session: ReplaySession::new(speed), pending_start: None }
    }

    /// Current session.
    pub fn session(&self) -> &ReplaySession {
        &self.session
    }

    /// Request a replay from the start.
    ///
    /// On success the optimistic flag is set and status becomes Requested.
    /// Nothing changes when the request cannot be sent.
    pub fn start(
        &mut self,
        speed: f64,
        conn: &ConnectionManager,
    ) -> Result<ConnectionAction, ReplayError> {
        validate_speed(speed)?;
        let action = conn.send(Outbound::RequestReplay(ReplayRequest::Start { speed }))?;

        self.session.replay_mode = true;
        self.session.status = ReplayStatus::Requested;
        self.pending_start = Some(speed);

        Ok(action)
    }

    /// Request a pause. Status changes on `replay_paused`.
    pub fn pause(&self, conn: &ConnectionManager) -> Result<ConnectionAction, ReplayError> {
        Ok(conn.send(Outbound::RequestReplay(ReplayRequest::Pause))?)
    }

    /// Request a resume. Status changes on `replay_resumed`.
    pub fn resume(&self, conn: &ConnectionManager) -> Result<ConnectionAction, ReplayError> {
        Ok(conn.send(Outbound::RequestReplay(ReplayRequest::Resume))?)
    }

    /// Request a stop.
    ///
    /// The optimistic flag is cleared even when the request cannot be sent.
    pub fn stop(&mut self, conn: &ConnectionManager) -> Result<ConnectionAction, ReplayError> {
        let sent = conn.send(Outbound::RequestReplay(ReplayRequest::Stop));

        self.session.replay_mode = false;
        self.pending_start = None;

        Ok(sent?)
    }

    /// Request a seek to the sequence typed by the user.
    ///
    /// Input is validated before anything is sent; the server decides the
    /// resulting position.
    pub fn jump(
        &self,
        input: &str,
        conn: &ConnectionManager,
    ) -> Result<ConnectionAction, ReplayError> {
        let sequence = parse_sequence(input)?;
        Ok(conn.send(Outbound::RequestReplay(ReplayRequest::Jump { sequence }))?)
    }

    /// Request a speed change. Speed changes on `replay_speed_changed`.
    pub fn set_speed(
        &self,
        speed: f64,
        conn: &ConnectionManager,
    ) -> Result<ConnectionAction, ReplayError> {
        validate_speed(speed)?;
        Ok(conn.send(Outbound::RequestReplay(ReplayRequest::Speed { speed }))?)
    }

    /// Apply a server acknowledgment. Returns whether the session changed.
    pub fn on_ack(&mut self, ack: ReplayAck) -> bool {
        let before = self.session;
        let status = self.session.status;

        match ack {
            ReplayAck::Stopped if status != ReplayStatus::Idle => {
                self.session.status = ReplayStatus::Stopped;
                self.session.current_sequence = 0;
                // A stop ahead of our `replay_started` ends the previous session.
                if self.pending_start.is_none() {
                    self.session.replay_mode = false;
                }
            },
            ReplayAck::Started(started) if status.is_active() || self.pending_start.is_some() => {
                let requested = self.pending_start.take();
                self.session.status = ReplayStatus::Playing;
                self.session.total_sequence = started.total_events;
                self.session.current_sequence = started.start_sequence.unwrap_or(0);
                if let Some(speed) = started.speed.or(requested) {
                    self.session.speed = speed;
                }
            },
            ReplayAck::Paused(paused) if status.is_active() => {
                self.session.status = ReplayStatus::Paused;
                self.session.current_sequence = paused.current_sequence;
            },
            ReplayAck::Resumed if status.is_active() => {
                self.session.status = ReplayStatus::Playing;
            },
            ReplayAck::Completed(completed) if status.is_active() => {
                self.session.status = ReplayStatus::Completed;
                self.session.total_sequence = completed.total_events;
                self.session.current_sequence = completed.total_events;
                self.session.replay_mode = false;
            },
            ReplayAck::Jumped(jumped) if status.is_active() => {
                self.session.current_sequence = jumped.sequence;
            },
            ReplayAck::SpeedChanged(changed) if status.is_active() => {
                self.session.speed = changed.speed;
            },
            ack => {
                tracing::debug!(kind = ack.kind(), ?status, "ignoring replay acknowledgment");
                return false;
            },
        }

        self.session != before
    }

    /// Forget the replay, keeping the last speed. The server drops its
    /// replay session together with the connection.
    pub fn reset(&mut self) -> bool {
        let idle = ReplaySession::new(self.session.speed);
        self.pending_start = None;
        let changed = self.session != idle;
        self.session = idle;
        changed
    }

    /// A recorded event was delivered. Advances the position to its
    /// sequence id, in receipt order. Returns whether the session changed.
    pub fn on_replay_event(&mut self, sequence_id: u64) -> bool {
        let changed = self.session.current_sequence != sequence_id;
        self.session.current_sequence = sequence_id;
        changed
    }
}

/// Parse a jump target typed by the user.
///
/// # Errors
///
/// `InvalidSequence` unless the trimmed input is a base-10 integer,
/// `NegativeSequence` if it is below zero.
pub fn parse_sequence(input: &str) -> Result<u64, ReplayError> {
    let value: i64 = input
        .trim()
        .parse()
        .map_err(|_| ReplayError::InvalidSequence { input: input.to_owned() })?;

    u64::try_from(value).map_err(|_| ReplayError::NegativeSequence { value })
}

fn validate_speed(speed: f64) -> Result<(), ReplayError> {
    if speed.is_finite() && speed > 0.0 { Ok(()) } else { Err(ReplayError::InvalidSpeed { speed }) }
}
