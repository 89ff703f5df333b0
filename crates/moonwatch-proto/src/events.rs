//! Game events.
//!
//! A game event is an `event_type` tag plus a `data` object. The same shape
//! arrives live (inside `game_event`) and recorded (inside `replay_event`), so
//! both paths decode through [`GameEvent::decode`].

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    errors::{ProtocolError, Result},
    payloads::game::{
        NightActionData, PhaseData, PlayerStatusData, SpeechData, SystemMessageData, TitleData,
        VictoryData, VoteResultData,
    },
};

/// Wire tags for game event kinds.
pub mod tags {
    /// Round title
    pub const TITLE: &str = "title";
    /// Phase change
    pub const PHASE: &str = "phase";
    /// Speech visible to everyone
    pub const PUBLIC_SPEECH: &str = "public_speech";
    /// Speech visible to a faction
    pub const PRIVATE_SPEECH: &str = "private_speech";
    /// Game master narration
    pub const SYSTEM_MESSAGE: &str = "system_message";
    /// Membership lists
    pub const PLAYER_STATUS_UPDATE: &str = "player_status_update";
    /// Game over
    pub const GAME_VICTORY: &str = "game_victory";
    /// Vote tally
    pub const VOTE_RESULT: &str = "vote_result";
    /// Night action outcome
    pub const NIGHT_ACTION: &str = "night_action";
}

/// A decoded game event.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Round title and number
    Title(TitleData),
    /// Phase label
    Phase(PhaseData),
    /// Speech visible to every observer
    PublicSpeech(SpeechData),
    /// Faction-private speech, shown to observers
    PrivateSpeech(SpeechData),
    /// Narration
    SystemMessage(SystemMessageData),
    /// Replacement membership lists
    PlayerStatusUpdate(PlayerStatusData),
    /// End of game
    GameVictory(VictoryData),
    /// Vote tally and outcome
    VoteResult(VoteResultData),
    /// Night action outcome
    NightAction(NightActionData),
    /// Event kind this observer does not know. Ignored.
    Unknown {
        /// The unrecognized tag
        event_type: String,
    },
}

impl GameEvent {
    /// Decode the `data` object of an event with the given tag.
    ///
    /// Unknown tags succeed as [`GameEvent::Unknown`] without looking at
    /// `data`. Known tags fail with [`ProtocolError::InvalidPayload`] when
    /// `data` has the wrong shape.
    pub fn decode(event_type: &str, data: Value) -> Result<Self> {
        let event = match event_type {
            tags::TITLE => Self::Title(payload(event_type, data)?),
            tags::PHASE => Self::Phase(payload(event_type, data)?),
            tags::PUBLIC_SPEECH => Self::PublicSpeech(payload(event_type, data)?),
            tags::PRIVATE_SPEECH => Self::PrivateSpeech(payload(event_type, data)?),
            tags::SYSTEM_MESSAGE => Self::SystemMessage(payload(event_type, data)?),
            tags::PLAYER_STATUS_UPDATE => Self::PlayerStatusUpdate(payload(event_type, data)?),
            tags::GAME_VICTORY => Self::GameVictory(payload(event_type, data)?),
            tags::VOTE_RESULT => Self::VoteResult(payload(event_type, data)?),
            tags::NIGHT_ACTION => Self::NightAction(payload(event_type, data)?),
            other => Self::Unknown { event_type: other.to_owned() },
        };

        Ok(event)
    }

    /// Wire tag of this event.
    pub fn event_type(&self) -> &str {
        match self {
            Self::Title(_) => tags::TITLE,
            Self::Phase(_) => tags::PHASE,
            Self::PublicSpeech(_) => tags::PUBLIC_SPEECH,
            Self::PrivateSpeech(_) => tags::PRIVATE_SPEECH,
            Self::SystemMessage(_) => tags::SYSTEM_MESSAGE,
            Self::PlayerStatusUpdate(_) => tags::PLAYER_STATUS_UPDATE,
            Self::GameVictory(_) => tags::GAME_VICTORY,
            Self::VoteResult(_) => tags::VOTE_RESULT,
            Self::NightAction(_) => tags::NIGHT_ACTION,
            Self::Unknown { event_type } => event_type,
        }
    }
}

/// Deserialize a payload, tagging failures with the envelope or event kind.
pub(crate) fn payload<T: DeserializeOwned>(kind: &str, value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|source| ProtocolError::InvalidPayload { kind: kind.to_owned(), source })
}
