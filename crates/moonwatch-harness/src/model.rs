//! Reference model of the replay controller.
//!
//! The model tracks what the observer should believe about a replay given a
//! sequence of user commands and server frames, ignoring everything else the
//! client does. Model-based tests run the same [`Operation`]s against a real
//! client in a [`crate::scenario::World`] and compare the two after every
//! step.

use moonwatch_client::{ReplayCommand, ReplaySession, ReplayStatus};
use moonwatch_proto::ReplayRequest;
use serde_json::json;

use crate::scenario::Step;

/// Operation applied to both the model and the real client.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Connect and complete the handshake
    GoOnline,
    /// Disconnect
    GoOffline,
    /// User starts a replay
    Start {
        /// Requested speed, possibly invalid
        speed: f64,
    },
    /// User pauses
    Pause,
    /// User resumes
    Resume,
    /// User stops
    Stop,
    /// User types a jump target
    Jump {
        /// Raw input, possibly invalid
        input: String,
    },
    /// User picks a speed
    SetSpeed {
        /// Requested speed, possibly invalid
        speed: f64,
    },
    /// Server: `replay_started`
    Started {
        /// Recording length
        total: u64,
        /// Starting position, if reported
        start: Option<u64>,
        /// Accepted speed, if reported
        speed: Option<f64>,
    },
    /// Server: `replay_paused`
    Paused {
        /// Position
        at: u64,
    },
    /// Server: `replay_resumed`
    Resumed,
    /// Server: `replay_stopped`
    Stopped,
    /// Server: `replay_completed`
    Completed {
        /// Recording length
        total: u64,
    },
    /// Server: `replay_jumped`
    Jumped {
        /// New position
        to: u64,
    },
    /// Server: `replay_speed_changed`
    SpeedChanged {
        /// New speed
        speed: f64,
    },
    /// Server: `replay_event`
    Event {
        /// Sequence id of the recorded event
        sequence: u64,
    },
}

impl Operation {
    /// Scenario steps that perform this operation on a real client.
    pub fn steps(&self) -> Vec<Step> {
        match self {
            Self::GoOnline => vec![Step::Connect, Step::Open],
            Self::GoOffline => vec![Step::Disconnect],
            Self::Start { speed } => {
                vec![Step::Replay(ReplayCommand::Start { speed: Some(*speed) })]
            },
            Self::Pause => vec![Step::Replay(ReplayCommand::Pause)],
            Self::Resume => vec![Step::Replay(ReplayCommand::Resume)],
            Self::Stop => vec![Step::Replay(ReplayCommand::Stop)],
            Self::Jump { input } => {
                vec![Step::Replay(ReplayCommand::Jump { input: input.clone() })]
            },
            Self::SetSpeed { speed } => {
                vec![Step::Replay(ReplayCommand::SetSpeed { speed: *speed })]
            },
            Self::Started { total, start, speed } => vec![Step::json(json!({
                "type": "replay_started",
                "total_events": total,
                "start_sequence": start,
                "speed": speed,
            }))],
            Self::Paused { at } => {
                vec![Step::json(json!({ "type": "replay_paused", "current_sequence": at }))]
            },
            Self::Resumed => vec![Step::json(json!({ "type": "replay_resumed" }))],
            Self::Stopped => vec![Step::json(json!({ "type": "replay_stopped" }))],
            Self::Completed { total } => {
                vec![Step::json(json!({ "type": "replay_completed", "total_events": total }))]
            },
            Self::Jumped { to } => {
                vec![Step::json(json!({ "type": "replay_jumped", "sequence": to }))]
            },
            Self::SpeedChanged { speed } => {
                vec![Step::json(json!({ "type": "replay_speed_changed", "speed": speed }))]
            },
            Self::Event { sequence } => vec![Step::json(json!({
                "type": "replay_event",
                "event": {
                    "sequence_id": sequence,
                    "event_type": "system_message",
                    "data": { "message": format!("event {sequence}") },
                },
            }))],
        }
    }
}

/// What the observer should believe about the replay.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayModel {
    online: bool,
    status: ReplayStatus,
    replay_mode: bool,
    current: u64,
    total: u64,
    speed: f64,
    pending_speed: Option<f64>,
}

impl ReplayModel {
    /// Model of a client that is connected, with no replay yet.
    pub fn online(speed: f64) -> Self {
        Self {
            online: true,
            status: ReplayStatus::Idle,
            replay_mode: false,
            current: 0,
            total: 0,
            speed,
            pending_speed: None,
        }
    }

    /// Apply an operation. Returns the request that should reach the
    /// server, if any.
    pub fn apply(&mut self, op: &Operation) -> Option<ReplayRequest> {
        let active =
            matches!(self.status, ReplayStatus::Requested | ReplayStatus::Playing | ReplayStatus::Paused);

        match op {
            Operation::GoOnline => {
                self.online = true;
                None
            },
            Operation::GoOffline => {
                *self = Self { online: false, ..Self::online(self.speed) };
                None
            },
            Operation::Start { speed } => {
                if !(valid_speed(*speed) && self.online) {
                    return None;
                }
                self.replay_mode = true;
                self.status = ReplayStatus::Requested;
                self.pending_speed = Some(*speed);
                Some(ReplayRequest::Start { speed: *speed })
            },
            Operation::Pause => self.online.then_some(ReplayRequest::Pause),
            Operation::Resume => self.online.then_some(ReplayRequest::Resume),
            Operation::Stop => {
                self.replay_mode = false;
                self.pending_speed = None;
                self.online.then_some(ReplayRequest::Stop)
            },
            Operation::Jump { input } => {
                let sequence = input.trim().parse::<i64>().ok().and_then(|v| u64::try_from(v).ok())?;
                self.online.then_some(ReplayRequest::Jump { sequence })
            },
            Operation::SetSpeed { speed } => {
                (valid_speed(*speed) && self.online).then_some(ReplayRequest::Speed { speed: *speed })
            },
            _ if !self.online => None,
            Operation::Stopped => {
                if self.status != ReplayStatus::Idle {
                    self.status = ReplayStatus::Stopped;
                    self.current = 0;
                    if self.pending_speed.is_none() {
                        self.replay_mode = false;
                    }
                }
                None
            },
            Operation::Started { total, start, speed } if active || self.pending_speed.is_some() => {
                self.status = ReplayStatus::Playing;
                self.total = *total;
                self.current = start.unwrap_or(0);
                let pending = self.pending_speed.take();
                if let Some(speed) = speed.or(pending) {
                    self.speed = speed;
                }
                None
            },
            Operation::Paused { at } if active => {
                self.status = ReplayStatus::Paused;
                self.current = *at;
                None
            },
            Operation::Resumed if active => {
                self.status = ReplayStatus::Playing;
                None
            },
            Operation::Completed { total } if active => {
                self.status = ReplayStatus::Completed;
                self.total = *total;
                self.current = *total;
                self.replay_mode = false;
                None
            },
            Operation::Jumped { to } if active => {
                self.current = *to;
                None
            },
            Operation::SpeedChanged { speed } if active => {
                self.speed = *speed;
                None
            },
            Operation::Event { sequence } => {
                self.current = *sequence;
                None
            },
            _ => None,
        }
    }

    /// First field where the real session disagrees with the model.
    pub fn diverges_from(&self, real: &ReplaySession) -> Option<String> {
        let checks = [
            ("status", format!("{:?}", self.status), format!("{:?}", real.status)),
            ("replay_mode", self.replay_mode.to_string(), real.replay_mode.to_string()),
            ("current_sequence", self.current.to_string(), real.current_sequence.to_string()),
            ("total_sequence", self.total.to_string(), real.total_sequence.to_string()),
            ("speed", self.speed.to_string(), real.speed.to_string()),
        ];

        checks.into_iter().find(|(_, model, real)| model != real).map(|(field, model, real)| {
            format!("{field}: model {model}, real {real}")
        })
    }
}

fn valid_speed(speed: f64) -> bool {
    speed.is_finite() && speed > 0.0
}
