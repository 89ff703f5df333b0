//! Session-level payloads.

use serde::{Deserialize, Serialize};

use super::game::PlayerRef;

/// Server greeting that binds the observer id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionEstablished {
    /// Server-assigned observer id
    pub observer_id: String,

    /// Greeting text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Partial game state. Every present field overwrites the observer's copy,
/// absent (or `null`) fields leave it untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateUpdate {
    /// Current round
    #[serde(default, alias = "current_round", skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,

    /// Current phase label
    #[serde(default, alias = "current_phase", skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,

    /// Players still alive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alive_players: Option<Vec<PlayerRef>>,

    /// Eliminated players
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dead_players: Option<Vec<PlayerRef>>,

    /// Events recorded so far
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_events: Option<u64>,

    /// Observers currently connected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observer_count: Option<u64>,
}

/// Heartbeat reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pong {
    /// Server wall clock in seconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}
