//! Game event payload types.
//!
//! Field names follow the server's wire format, which mixes `camelCase`
//! (`playerId`) and `snake_case` (`cause_of_death`). Extra fields the server
//! sends (timestamps, emoji hints, visibility lists) are ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reference to a player in a membership list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    /// Player identifier
    #[serde(rename = "playerId", alias = "player_id")]
    pub player_id: String,

    /// Role name
    #[serde(default)]
    pub role: String,

    /// Cause of death, only meaningful for dead players
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause_of_death: Option<String>,
}

/// Round title update (`title` event).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleData {
    /// Display title for the round
    pub title: String,

    /// Round number
    #[serde(default)]
    pub round: u32,
}

/// Phase change (`phase` event).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseData {
    /// Phase label
    pub phase: String,
}

/// Public or private speech by a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechData {
    /// Speaking player
    #[serde(rename = "playerId", alias = "player_id")]
    pub speaker_id: String,

    /// Speaker's role
    #[serde(default)]
    pub role: String,

    /// Spoken text
    pub message: String,
}

/// Narration from the game master (`system_message` event).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMessageData {
    /// Message text
    pub message: String,
}

/// Authoritative membership lists (`player_status_update` event).
///
/// Lists replace the observer's lists wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStatusData {
    /// Players still alive, in server order
    #[serde(default)]
    pub alive_players: Vec<PlayerRef>,

    /// Eliminated players, in server order
    #[serde(default)]
    pub dead_players: Vec<PlayerRef>,

    /// Alive count as reported by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_alive: Option<usize>,

    /// Dead count as reported by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_dead: Option<usize>,
}

/// Game over (`game_victory` event).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictoryData {
    /// Human readable victory condition
    pub victory_condition: String,

    /// Winning side, when the server names one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}

/// Outcome of a day vote (`vote_result` event).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteResultData {
    /// Votes received per player, in server order
    #[serde(default)]
    pub vote_data: Map<String, Value>,

    /// Outcome of the vote
    pub result: String,
}

/// Resolved night action (`night_action` event).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightActionData {
    /// Kind of action (kill, check, save, ...)
    pub action_type: String,

    /// Acting player
    pub player_id: String,

    /// Target player
    pub target_id: String,

    /// Outcome of the action
    pub result: String,
}
