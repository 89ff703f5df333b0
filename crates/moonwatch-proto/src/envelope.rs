//! Envelope encoding and decoding.
//!
//! Inbound envelopes are decoded in two steps: the frame is parsed as a JSON
//! object and its `type` tag removed, then the remaining fields are decoded
//! into the payload type for that tag. Decoding this way (instead of a serde
//! tagged enum) keeps unknown tags as a successful [`Inbound::Unknown`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    errors::{ProtocolError, Result},
    events::{GameEvent, payload},
    payloads::{
        replay::{
            ReplayCompleted, ReplayErrorData, ReplayEvent, ReplayJumped, ReplayPaused,
            ReplaySpeedChanged, ReplayStarted,
        },
        session::{ConnectionEstablished, GameStateUpdate, Pong},
    },
};

/// Wire tags for envelope kinds.
pub mod tags {
    /// Observer id binding
    pub const CONNECTION_ESTABLISHED: &str = "connection_established";
    /// Live game event
    pub const GAME_EVENT: &str = "game_event";
    /// Partial game state
    pub const GAME_STATE: &str = "game_state";
    /// Replay acknowledgment: started
    pub const REPLAY_STARTED: &str = "replay_started";
    /// Replay acknowledgment: paused
    pub const REPLAY_PAUSED: &str = "replay_paused";
    /// Replay acknowledgment: resumed
    pub const REPLAY_RESUMED: &str = "replay_resumed";
    /// Replay acknowledgment: stopped
    pub const REPLAY_STOPPED: &str = "replay_stopped";
    /// Recorded game event
    pub const REPLAY_EVENT: &str = "replay_event";
    /// Replay reached the end of the recording
    pub const REPLAY_COMPLETED: &str = "replay_completed";
    /// Replay acknowledgment: seek finished
    pub const REPLAY_JUMPED: &str = "replay_jumped";
    /// Replay acknowledgment: speed changed
    pub const REPLAY_SPEED_CHANGED: &str = "replay_speed_changed";
    /// Server-side replay failure
    pub const REPLAY_ERROR: &str = "replay_error";
    /// Heartbeat reply
    pub const PONG: &str = "pong";
}

/// Envelope received from the server.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Binds the observer id for this session
    ConnectionEstablished(ConnectionEstablished),
    /// Live game event
    GameEvent(GameEvent),
    /// Field-wise game state overwrite
    GameState(GameStateUpdate),
    /// Replay started
    ReplayStarted(ReplayStarted),
    /// Replay paused
    ReplayPaused(ReplayPaused),
    /// Replay resumed
    ReplayResumed,
    /// Replay stopped
    ReplayStopped,
    /// Recorded event with its sequence id
    ReplayEvent(ReplayEvent),
    /// Replay finished
    ReplayCompleted(ReplayCompleted),
    /// Seek finished
    ReplayJumped(ReplayJumped),
    /// Speed change applied
    ReplaySpeedChanged(ReplaySpeedChanged),
    /// Server-reported replay failure
    ReplayError(ReplayErrorData),
    /// Heartbeat reply
    Pong(Pong),
    /// Envelope kind this observer does not know. Ignored.
    Unknown {
        /// The unrecognized tag
        kind: String,
    },
}

impl Inbound {
    /// Decode a text frame.
    pub fn decode(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).map_err(ProtocolError::InvalidJson)?;
        Self::from_value(value)
    }

    /// Decode an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut fields) = value else {
            return Err(ProtocolError::NotAnObject);
        };

        let kind = match fields.remove("type") {
            Some(Value::String(kind)) => kind,
            Some(_) => return Err(ProtocolError::InvalidType),
            None => return Err(ProtocolError::MissingType),
        };

        let inbound = match kind.as_str() {
            tags::CONNECTION_ESTABLISHED => {
                Self::ConnectionEstablished(payload(&kind, Value::Object(fields))?)
            },
            tags::GAME_EVENT => Self::GameEvent(game_event(&kind, fields)?),
            tags::GAME_STATE => Self::GameState(payload(&kind, game_state_fields(fields))?),
            tags::REPLAY_STARTED => Self::ReplayStarted(payload(&kind, Value::Object(fields))?),
            tags::REPLAY_PAUSED => Self::ReplayPaused(payload(&kind, Value::Object(fields))?),
            tags::REPLAY_RESUMED => Self::ReplayResumed,
            tags::REPLAY_STOPPED => Self::ReplayStopped,
            tags::REPLAY_EVENT => Self::ReplayEvent(replay_event(&kind, fields)?),
            tags::REPLAY_COMPLETED => {
                Self::ReplayCompleted(payload(&kind, Value::Object(fields))?)
            },
            tags::REPLAY_JUMPED => Self::ReplayJumped(payload(&kind, Value::Object(fields))?),
            tags::REPLAY_SPEED_CHANGED => {
                Self::ReplaySpeedChanged(payload(&kind, Value::Object(fields))?)
            },
            tags::REPLAY_ERROR => Self::ReplayError(payload(&kind, Value::Object(fields))?),
            tags::PONG => Self::Pong(payload(&kind, Value::Object(fields))?),
            other => Self::Unknown { kind: other.to_owned() },
        };

        Ok(inbound)
    }

    /// Wire tag of this envelope.
    pub fn kind(&self) -> &str {
        match self {
            Self::ConnectionEstablished(_) => tags::CONNECTION_ESTABLISHED,
            Self::GameEvent(_) => tags::GAME_EVENT,
            Self::GameState(_) => tags::GAME_STATE,
            Self::ReplayStarted(_) => tags::REPLAY_STARTED,
            Self::ReplayPaused(_) => tags::REPLAY_PAUSED,
            Self::ReplayResumed => tags::REPLAY_RESUMED,
            Self::ReplayStopped => tags::REPLAY_STOPPED,
            Self::ReplayEvent(_) => tags::REPLAY_EVENT,
            Self::ReplayCompleted(_) => tags::REPLAY_COMPLETED,
            Self::ReplayJumped(_) => tags::REPLAY_JUMPED,
            Self::ReplaySpeedChanged(_) => tags::REPLAY_SPEED_CHANGED,
            Self::ReplayError(_) => tags::REPLAY_ERROR,
            Self::Pong(_) => tags::PONG,
            Self::Unknown { kind } => kind,
        }
    }
}

/// `{event_type, data}` into a [`GameEvent`].
fn game_event(kind: &str, mut fields: Map<String, Value>) -> Result<GameEvent> {
    let Some(Value::String(event_type)) = fields.remove("event_type") else {
        return Err(ProtocolError::MissingField { kind: kind.to_owned(), field: "event_type" });
    };
    let data = fields.remove("data").unwrap_or(Value::Null);

    GameEvent::decode(&event_type, data)
}

/// The server wraps full snapshots in `data`; partial updates are flat.
fn game_state_fields(mut fields: Map<String, Value>) -> Value {
    match fields.remove("data") {
        Some(Value::Object(inner)) => Value::Object(inner),
        _ => Value::Object(fields),
    }
}

/// Recorded events carry `sequence_id` inside the nested event. A top-level
/// `sequence_id` is accepted when the nested one is absent.
fn replay_event(kind: &str, mut fields: Map<String, Value>) -> Result<ReplayEvent> {
    let outer_sequence = fields.remove("sequence_id").filter(|value| !value.is_null());

    let Some(Value::Object(mut event)) = fields.remove("event") else {
        return Err(ProtocolError::MissingField { kind: kind.to_owned(), field: "event" });
    };

    let sequence = event
        .remove("sequence_id")
        .filter(|value| !value.is_null())
        .or(outer_sequence)
        .ok_or_else(|| ProtocolError::MissingField {
            kind: kind.to_owned(),
            field: "sequence_id",
        })?;

    let sequence_id = payload(kind, sequence)?;
    let event = game_event(kind, event)?;

    Ok(ReplayEvent { sequence_id, event })
}

/// Envelope sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    /// Heartbeat
    Ping,
    /// Replay control request
    RequestReplay(ReplayRequest),
}

/// Replay control request. The server answers with an acknowledgment
/// envelope; the request alone changes nothing on the observer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReplayRequest {
    /// Start playback from the beginning
    Start {
        /// Playback speed multiplier
        speed: f64,
    },
    /// Pause playback
    Pause,
    /// Resume paused playback
    Resume,
    /// Stop playback and discard the replay session
    Stop,
    /// Seek to a sequence id
    Jump {
        /// Target sequence id
        sequence: u64,
    },
    /// Change playback speed
    Speed {
        /// Playback speed multiplier
        speed: f64,
    },
}

impl Outbound {
    /// Encode as a JSON text frame.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Decode an outbound frame. Used by servers and test peers.
    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(ProtocolError::InvalidJson)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::payloads::game::{SystemMessageData, TitleData};

    const KNOWN: [&str; 13] = [
        tags::CONNECTION_ESTABLISHED,
        tags::GAME_EVENT,
        tags::GAME_STATE,
        tags::REPLAY_STARTED,
        tags::REPLAY_PAUSED,
        tags::REPLAY_RESUMED,
        tags::REPLAY_STOPPED,
        tags::REPLAY_EVENT,
        tags::REPLAY_COMPLETED,
        tags::REPLAY_JUMPED,
        tags::REPLAY_SPEED_CHANGED,
        tags::REPLAY_ERROR,
        tags::PONG,
    ];

    #[test]
    fn decode_connection_established() {
        let inbound = Inbound::decode(
            r#"{"type":"connection_established","observer_id":"obs-7","message":"hi"}"#,
        )
        .unwrap();

        assert_eq!(
            inbound,
            Inbound::ConnectionEstablished(ConnectionEstablished {
                observer_id: "obs-7".into(),
                message: Some("hi".into()),
            })
        );
        assert_eq!(inbound.kind(), "connection_established");
    }

    #[test]
    fn decode_live_game_event() {
        let inbound = Inbound::decode(
            r#"{"type":"game_event","event_type":"title","data":{"title":"Round 2","round":2},"timestamp":1.5}"#,
        )
        .unwrap();

        assert_eq!(
            inbound,
            Inbound::GameEvent(GameEvent::Title(TitleData { title: "Round 2".into(), round: 2 }))
        );
    }

    #[test]
    fn decode_flat_partial_game_state() {
        let inbound = Inbound::decode(r#"{"type":"game_state","observer_count":4}"#).unwrap();

        assert_eq!(
            inbound,
            Inbound::GameState(GameStateUpdate { observer_count: Some(4), ..Default::default() })
        );
    }

    #[test]
    fn decode_wrapped_game_state_with_aliases() {
        let inbound = Inbound::from_value(json!({
            "type": "game_state",
            "data": {"current_round": 3, "current_phase": "night", "total_events": 10}
        }))
        .unwrap();

        let Inbound::GameState(update) = inbound else { panic!("expected game_state") };
        assert_eq!(update.round, Some(3));
        assert_eq!(update.phase.as_deref(), Some("night"));
        assert_eq!(update.total_events, Some(10));
        assert_eq!(update.observer_count, None);
    }

    #[test]
    fn decode_replay_event_with_nested_sequence() {
        let inbound = Inbound::from_value(json!({
            "type": "replay_event",
            "event": {
                "sequence_id": 12,
                "timestamp": 100.0,
                "event_type": "system_message",
                "data": {"message": "dawn"}
            }
        }))
        .unwrap();

        assert_eq!(
            inbound,
            Inbound::ReplayEvent(ReplayEvent {
                sequence_id: 12,
                event: GameEvent::SystemMessage(SystemMessageData { message: "dawn".into() }),
            })
        );
    }

    #[test]
    fn decode_replay_event_with_outer_sequence() {
        let inbound = Inbound::from_value(json!({
            "type": "replay_event",
            "sequence_id": 4,
            "event": {"event_type": "unheard_of", "data": {}}
        }))
        .unwrap();

        let Inbound::ReplayEvent(event) = inbound else { panic!("expected replay_event") };
        assert_eq!(event.sequence_id, 4);
        assert_eq!(event.event, GameEvent::Unknown { event_type: "unheard_of".into() });
    }

    #[test]
    fn replay_event_without_sequence_is_rejected() {
        let result = Inbound::from_value(json!({
            "type": "replay_event",
            "event": {"event_type": "phase", "data": {"phase": "day"}}
        }));

        assert!(matches!(
            result,
            Err(ProtocolError::MissingField { field: "sequence_id", .. })
        ));
    }

    #[test]
    fn unknown_type_decodes_as_unknown() {
        let inbound = Inbound::decode(r#"{"type":"spectator_chat","text":"gg"}"#).unwrap();
        assert_eq!(inbound, Inbound::Unknown { kind: "spectator_chat".into() });
    }

    #[test]
    fn malformed_frames_are_errors() {
        assert!(matches!(Inbound::decode("{not json"), Err(ProtocolError::InvalidJson(_))));
        assert!(matches!(Inbound::decode("[1,2]"), Err(ProtocolError::NotAnObject)));
        assert!(matches!(Inbound::decode(r#"{"observer_id":"x"}"#), Err(ProtocolError::MissingType)));
        assert!(matches!(Inbound::decode(r#"{"type":7}"#), Err(ProtocolError::InvalidType)));
        assert!(matches!(
            Inbound::decode(r#"{"type":"connection_established"}"#),
            Err(ProtocolError::InvalidPayload { .. })
        ));
        assert!(matches!(
            Inbound::decode(r#"{"type":"replay_paused","current_sequence":-1}"#),
            Err(ProtocolError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn encode_replay_requests() {
        let start = Outbound::RequestReplay(ReplayRequest::Start { speed: 2.0 });
        let value: Value = serde_json::from_str(&start.encode().unwrap()).unwrap();
        assert_eq!(value, json!({"type": "request_replay", "action": "start", "speed": 2.0}));

        let jump = Outbound::RequestReplay(ReplayRequest::Jump { sequence: 40 });
        let value: Value = serde_json::from_str(&jump.encode().unwrap()).unwrap();
        assert_eq!(value, json!({"type": "request_replay", "action": "jump", "sequence": 40}));

        let pause = Outbound::RequestReplay(ReplayRequest::Pause);
        let value: Value = serde_json::from_str(&pause.encode().unwrap()).unwrap();
        assert_eq!(value, json!({"type": "request_replay", "action": "pause"}));
    }

    #[test]
    fn encode_ping() {
        assert_eq!(Outbound::Ping.encode().unwrap(), r#"{"type":"ping"}"#);
    }

    #[test]
    fn outbound_wire_format() {
        let frames = [
            Outbound::Ping,
            Outbound::RequestReplay(ReplayRequest::Start { speed: 1.5 }),
            Outbound::RequestReplay(ReplayRequest::Resume),
            Outbound::RequestReplay(ReplayRequest::Stop),
            Outbound::RequestReplay(ReplayRequest::Speed { speed: 0.5 }),
        ];
        let encoded: Vec<String> = frames.iter().map(|frame| frame.encode().unwrap()).collect();

        insta::assert_snapshot!(encoded.join("\n"), @r#"
        {"type":"ping"}
        {"type":"request_replay","action":"start","speed":1.5}
        {"type":"request_replay","action":"resume"}
        {"type":"request_replay","action":"stop"}
        {"type":"request_replay","action":"speed","speed":0.5}
        "#);
    }

    #[test]
    fn decode_outbound_from_server_side() {
        let outbound =
            Outbound::decode(r#"{"type":"request_replay","action":"speed","speed":1.5}"#).unwrap();
        assert_eq!(outbound, Outbound::RequestReplay(ReplayRequest::Speed { speed: 1.5 }));
    }

    proptest! {
        #[test]
        fn decode_never_panics(text in "\\PC{0,64}") {
            let _ = Inbound::decode(&text);
        }

        #[test]
        fn unknown_tags_are_preserved(kind in "[a-z_]{1,20}") {
            prop_assume!(!KNOWN.contains(&kind.as_str()));

            let inbound = Inbound::from_value(json!({ "type": kind.clone(), "extra": [1, 2] })).unwrap();
            prop_assert_eq!(inbound, Inbound::Unknown { kind });
        }
    }
}
