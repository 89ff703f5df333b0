//! Message router.
//!
//! Two-level dispatch of decoded envelopes:
//!
//! - Level 1 ([`MessageRouter::route`]) switches on the envelope kind. Game
//!   state envelopes are applied here, replay acknowledgments are handed
//!   back to the caller for the replay controller.
//! - Level 2 ([`MessageRouter::dispatch`]) switches on the game event kind.
//!   Live `game_event` and recorded `replay_event` envelopes both go through
//!   it, so a replayed event renders exactly like the live one did.
//!
//! Unknown kinds at either level are logged and ignored.

use std::time::SystemTime;

use moonwatch_proto::{
    ConnectionEstablished, GameEvent, Inbound, NightActionData, ReplayEvent, SpeechData,
    VoteResultData,
};
use serde_json::Value;

use crate::{
    notification::Notification,
    replay::ReplayAck,
    state::{ChatEntry, ChatKind, ChatPayload, GameView, ObserverSession},
};

/// Outcome of level-1 routing.
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    /// Game state changed
    Notify(Vec<Notification>),
    /// Replay acknowledgment for the replay controller
    Replay(ReplayAck),
    /// Recorded event dispatched; the replay position moves to `sequence_id`
    ReplayEvent {
        /// Position of the event in the recording
        sequence_id: u64,
        /// Game state changes caused by the event
        notifications: Vec<Notification>,
    },
    /// Server-reported replay failure
    ReplayError(String),
    /// Heartbeat reply
    Pong,
    /// Nothing to do
    Ignored,
}

/// Routes envelopes into the game view.
#[derive(Debug, Clone, Default)]
pub struct MessageRouter {
    view: GameView,
}

impl MessageRouter {
    /// Router with an empty game view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observer session, snapshot and chat log.
    pub fn view(&self) -> &GameView {
        &self.view
    }

    /// Unbind the observer id so the next `connection_established` binds
    /// again. Snapshot and chat log are kept.
    pub fn end_session(&mut self) {
        if let Some(session) = self.view.session.take() {
            tracing::debug!(observer_id = %session.observer_id, "observer session ended");
        }
    }

    /// Level 1: dispatch by envelope kind.
    pub fn route(&mut self, inbound: Inbound, received_at: SystemTime) -> Routed {
        match inbound {
            Inbound::ConnectionEstablished(hello) => {
                Routed::Notify(self.bind_observer(hello, received_at))
            },
            Inbound::GameEvent(event) => Routed::Notify(self.dispatch(event, received_at)),
            Inbound::GameState(update) => {
                self.view.snapshot.apply_update(update);
                Routed::Notify(vec![Notification::GameState(self.view.snapshot.clone())])
            },
            Inbound::ReplayStarted(started) => Routed::Replay(ReplayAck::Started(started)),
            Inbound::ReplayPaused(paused) => Routed::Replay(ReplayAck::Paused(paused)),
            Inbound::ReplayResumed => Routed::Replay(ReplayAck::Resumed),
            Inbound::ReplayStopped => Routed::Replay(ReplayAck::Stopped),
            Inbound::ReplayCompleted(completed) => Routed::Replay(ReplayAck::Completed(completed)),
            Inbound::ReplayJumped(jumped) => Routed::Replay(ReplayAck::Jumped(jumped)),
            Inbound::ReplaySpeedChanged(changed) => {
                Routed::Replay(ReplayAck::SpeedChanged(changed))
            },
            Inbound::ReplayEvent(ReplayEvent { sequence_id, event }) => Routed::ReplayEvent {
                sequence_id,
                notifications: self.dispatch(event, received_at),
            },
            Inbound::ReplayError(error) => Routed::ReplayError(error.message),
            Inbound::Pong(_) => Routed::Pong,
            Inbound::Unknown { kind } => {
                tracing::debug!(%kind, "ignoring unknown envelope type");
                Routed::Ignored
            },
        }
    }

    /// Level 2: apply a game event, live or replayed.
    pub fn dispatch(&mut self, event: GameEvent, received_at: SystemTime) -> Vec<Notification> {
        match event {
            GameEvent::Title(title) => {
                self.view.snapshot.round = title.round;
                self.view.snapshot.title = Some(title.title);
                vec![self.snapshot_changed()]
            },
            GameEvent::Phase(phase) => {
                self.view.snapshot.phase = phase.phase;
                vec![self.snapshot_changed()]
            },
            GameEvent::PublicSpeech(speech) => {
                vec![self.append(received_at, ChatKind::Public, speech_payload(speech))]
            },
            GameEvent::PrivateSpeech(speech) => {
                vec![self.append(received_at, ChatKind::Private, speech_payload(speech))]
            },
            GameEvent::SystemMessage(system) => vec![self.append_system(received_at, system.message)],
            GameEvent::PlayerStatusUpdate(status) => {
                self.view.snapshot.apply_player_status(status);
                vec![self.snapshot_changed()]
            },
            GameEvent::GameVictory(victory) => {
                let entry =
                    self.append_system(received_at, format!("🏆 {}", victory.victory_condition));
                self.view.victory = Some(victory.victory_condition.clone());
                vec![entry, Notification::GameOver { victory_condition: victory.victory_condition }]
            },
            GameEvent::VoteResult(vote) => vec![self.append_system(received_at, vote_summary(&vote))],
            GameEvent::NightAction(action) => {
                vec![self.append_system(received_at, night_action_summary(&action))]
            },
            GameEvent::Unknown { event_type } => {
                tracing::debug!(%event_type, "ignoring unknown game event type");
                Vec::new()
            },
        }
    }

    fn bind_observer(
        &mut self,
        hello: ConnectionEstablished,
        received_at: SystemTime,
    ) -> Vec<Notification> {
        if let Some(session) = &self.view.session {
            tracing::debug!(
                bound = %session.observer_id,
                offered = %hello.observer_id,
                "observer id already bound, ignoring"
            );
            return Vec::new();
        }

        tracing::info!(observer_id = %hello.observer_id, "observer id assigned");
        let session = ObserverSession { observer_id: hello.observer_id, assigned_at: received_at };
        self.view.session = Some(session.clone());
        vec![Notification::ObserverAssigned(session)]
    }

    fn snapshot_changed(&self) -> Notification {
        Notification::GameState(self.view.snapshot.clone())
    }

    fn append(
        &mut self,
        received_at: SystemTime,
        kind: ChatKind,
        payload: ChatPayload,
    ) -> Notification {
        let entry = ChatEntry { received_at, kind, payload };
        self.view.chat.push(entry.clone());
        Notification::Chat(entry)
    }

    fn append_system(&mut self, received_at: SystemTime, message: String) -> Notification {
        self.append(received_at, ChatKind::System, ChatPayload::System { message })
    }
}

fn speech_payload(speech: SpeechData) -> ChatPayload {
    ChatPayload::Speech { speaker_id: speech.speaker_id, role: speech.role, message: speech.message }
}

/// `🗳️ Vote result: zed: 3 votes, amy: 1 votes → zed eliminated`
fn vote_summary(vote: &VoteResultData) -> String {
    let tally = vote
        .vote_data
        .iter()
        .map(|(player, votes)| format!("{player}: {} votes", vote_count(votes)))
        .collect::<Vec<_>>()
        .join(", ");

    format!("🗳️ Vote result: {tally} → {}", vote.result)
}

fn vote_count(votes: &Value) -> String {
    match votes {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// `🌙 wolf-1 uses kill on p4: success`
fn night_action_summary(action: &NightActionData) -> String {
    format!(
        "🌙 {} uses {} on {}: {}",
        action.player_id, action.action_type, action.target_id, action.result
    )
}

#[cfg(test)]
mod tests {
    use moonwatch_proto::{GameStateUpdate, PhaseData, SystemMessageData, TitleData};
    use serde_json::json;

    use super::*;

    fn decode(value: serde_json::Value) -> Inbound {
        Inbound::from_value(value).unwrap()
    }

    fn chat_messages(router: &MessageRouter) -> Vec<&str> {
        router.view().chat().entries().iter().map(ChatEntry::message).collect()
    }

    #[test]
    fn observer_id_binds_once() {
        let mut router = MessageRouter::new();
        let now = SystemTime::UNIX_EPOCH;

        let first = router.route(
            decode(json!({"type": "connection_established", "observer_id": "obs-7"})),
            now,
        );
        assert!(matches!(first, Routed::Notify(ref n) if n.len() == 1));

        let second = router.route(
            decode(json!({"type": "connection_established", "observer_id": "obs-9"})),
            now,
        );
        assert_eq!(second, Routed::Notify(Vec::new()));
        assert_eq!(router.view().session().unwrap().observer_id, "obs-7");
    }

    #[test]
    fn live_and_replayed_events_render_identically() {
        let now = SystemTime::UNIX_EPOCH;
        let mut live = MessageRouter::new();
        let mut replayed = MessageRouter::new();
        let event = json!({"event_type": "public_speech", "data": {"playerId": "p1", "role": "seer", "message": "I checked p4"}});

        let mut live_envelope = event.clone();
        live_envelope["type"] = json!("game_event");
        let Routed::Notify(live_notes) = live.route(decode(live_envelope), now) else {
            unreachable!("game_event routes to notifications")
        };

        let mut nested = event;
        nested["sequence_id"] = json!(5);
        let routed = replayed.route(decode(json!({"type": "replay_event", "event": nested})), now);
        let Routed::ReplayEvent { sequence_id, notifications } = routed else {
            unreachable!("replay_event routes to a replay event")
        };

        assert_eq!(sequence_id, 5);
        assert_eq!(live_notes, notifications);
        assert_eq!(live.view().chat(), replayed.view().chat());
    }

    #[test]
    fn title_phase_and_state_update_snapshot() {
        let mut router = MessageRouter::new();
        let now = SystemTime::UNIX_EPOCH;

        router.dispatch(GameEvent::Title(TitleData { title: "Night 2".into(), round: 2 }), now);
        router.dispatch(GameEvent::Phase(PhaseData { phase: "night".into() }), now);
        router.route(
            Inbound::GameState(GameStateUpdate { observer_count: Some(3), ..Default::default() }),
            now,
        );

        let snapshot = router.view().snapshot();
        assert_eq!(snapshot.round, 2);
        assert_eq!(snapshot.title.as_deref(), Some("Night 2"));
        assert_eq!(snapshot.phase, "night");
        assert_eq!(snapshot.observer_count, 3);
        assert!(router.view().chat().is_empty());
    }

    #[test]
    fn formatted_system_entries() {
        let mut router = MessageRouter::new();
        let now = SystemTime::UNIX_EPOCH;

        for frame in [
            json!({"type": "game_event", "event_type": "vote_result", "data": {"vote_data": {"zed": 3, "amy": 1}, "result": "zed eliminated"}}),
            json!({"type": "game_event", "event_type": "night_action", "data": {"action_type": "kill", "player_id": "wolf-1", "target_id": "p4", "result": "success"}}),
            json!({"type": "game_event", "event_type": "game_victory", "data": {"victory_condition": "Villagers win"}}),
        ] {
            router.route(decode(frame), now);
        }

        insta::assert_snapshot!(chat_messages(&router).join("\n"), @r"
        🗳️ Vote result: zed: 3 votes, amy: 1 votes → zed eliminated
        🌙 wolf-1 uses kill on p4: success
        🏆 Villagers win
        ");
        assert_eq!(router.view().victory(), Some("Villagers win"));
    }

    #[test]
    fn victory_signals_game_over() {
        let mut router = MessageRouter::new();
        let notes = router.dispatch(
            GameEvent::GameVictory(moonwatch_proto::VictoryData {
                victory_condition: "Wolves win".into(),
                winner: None,
            }),
            SystemTime::UNIX_EPOCH,
        );

        assert!(matches!(notes[0], Notification::Chat(_)));
        assert_eq!(notes[1], Notification::GameOver { victory_condition: "Wolves win".into() });
    }

    #[test]
    fn acknowledgments_and_unknowns_are_classified() {
        let mut router = MessageRouter::new();
        let now = SystemTime::UNIX_EPOCH;

        assert_eq!(
            router.route(decode(json!({"type": "replay_resumed"})), now),
            Routed::Replay(ReplayAck::Resumed)
        );
        assert_eq!(
            router.route(decode(json!({"type": "replay_error", "message": "no recording"})), now),
            Routed::ReplayError("no recording".into())
        );
        assert_eq!(router.route(decode(json!({"type": "pong", "timestamp": 1.0})), now), Routed::Pong);
        assert_eq!(router.route(decode(json!({"type": "lobby_update"})), now), Routed::Ignored);
        assert_eq!(
            router.route(
                decode(json!({"type": "game_event", "event_type": "sheriff_vote", "data": {}})),
                now
            ),
            Routed::Notify(Vec::new())
        );
    }

    #[test]
    fn chat_order_is_receipt_order() {
        let mut router = MessageRouter::new();
        let now = SystemTime::UNIX_EPOCH;

        router.dispatch(GameEvent::SystemMessage(SystemMessageData { message: "one".into() }), now);
        router.route(
            decode(json!({"type": "replay_event", "event": {"sequence_id": 1, "event_type": "system_message", "data": {"message": "two"}}})),
            now,
        );
        router.route(
            decode(json!({"type": "game_event", "event_type": "private_speech", "data": {"playerId": "w", "role": "wolf", "message": "three"}})),
            now,
        );

        assert_eq!(chat_messages(&router), ["one", "two", "three"]);
    }
}
