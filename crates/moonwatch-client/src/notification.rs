//! Typed notifications for the presentation layer.

use moonwatch_core::ConnectionStatus;

use crate::{
    replay::ReplaySession,
    state::{ChatEntry, GameStateSnapshot, ObserverSession},
};

/// How serious a user-visible alert is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Connection is gone for good until the user reconnects
    Fatal,
    /// Something the user should know about. The session continues.
    Warning,
}

/// User-visible error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Severity
    pub severity: Severity,
    /// Short heading
    pub title: String,
    /// Details
    pub message: String,
}

impl Alert {
    /// Fatal alert.
    pub fn fatal(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { severity: Severity::Fatal, title: title.into(), message: message.into() }
    }

    /// Non-fatal alert.
    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { severity: Severity::Warning, title: title.into(), message: message.into() }
    }
}

/// State change pushed to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Connection status indicator changed
    Connection(ConnectionStatus),
    /// Server bound the observer id
    ObserverAssigned(ObserverSession),
    /// Game snapshot changed
    GameState(GameStateSnapshot),
    /// Chat entry appended
    Chat(ChatEntry),
    /// Game ended
    GameOver {
        /// Human readable victory condition
        victory_condition: String,
    },
    /// Replay session changed
    Replay(ReplaySession),
    /// Speed the user asked for, echoed back to the control surface
    SpeedSelected {
        /// Requested speed multiplier
        speed: f64,
    },
    /// User-visible error
    Alert(Alert),
}
