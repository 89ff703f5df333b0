//! Wire format for the Moonwatch observer protocol.
//!
//! Every message on the persistent connection is a JSON object carrying a
//! string `type` tag plus type-specific fields: the envelope. Inbound
//! envelopes (server to observer) decode into the closed [`Inbound`] enum,
//! and `game_event` / `replay_event` envelopes carry a nested [`GameEvent`]
//! selected by its own `event_type` tag. Outbound envelopes are [`Outbound`].
//!
//! Unknown tags at either level decode successfully into an `Unknown`
//! variant. A newer server can add message kinds without breaking older
//! observers, so only frames that are not JSON objects, lack a tag, or carry
//! a known tag with an invalid payload are decode errors.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod envelope;
pub mod errors;
pub mod events;
pub mod payloads;

pub use envelope::{Inbound, Outbound, ReplayRequest};
pub use errors::{ProtocolError, Result};
pub use events::GameEvent;
pub use payloads::{
    game::{
        NightActionData, PhaseData, PlayerRef, PlayerStatusData, SpeechData, SystemMessageData,
        TitleData, VictoryData, VoteResultData,
    },
    replay::{
        ReplayCompleted, ReplayErrorData, ReplayEvent, ReplayJumped, ReplayPaused,
        ReplaySpeedChanged, ReplayStarted,
    },
    session::{ConnectionEstablished, GameStateUpdate, Pong},
};
