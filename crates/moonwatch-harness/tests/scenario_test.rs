//! Scenario tests for observer connection and session behaviour.

use std::time::Duration;

use moonwatch_client::{ClientConfig, Notification, ReplayCommand, ReplayStatus, Severity};
use moonwatch_core::{ConnectionConfig, ConnectionState, PageLocation, TransportEvent};
use moonwatch_harness::scenario::{Scenario, Step, oracle};
use moonwatch_proto::{Outbound, ReplayRequest};
use serde_json::json;

fn connected() -> [Step; 2] {
    [Step::Connect, Step::Open]
}

fn game_event(event_type: &str, data: serde_json::Value) -> Step {
    Step::json(json!({ "type": "game_event", "event_type": event_type, "data": data }))
}

#[test]
fn observer_id_is_bound_once() {
    let result = Scenario::new("observer id binding")
        .steps(connected())
        .step(Step::welcome("obs-7"))
        .step(Step::welcome("obs-8"))
        .oracle(oracle::all_of(vec![
            oracle::observer_id("obs-7"),
            oracle::connection_state(ConnectionState::Connected),
            Box::new(|world| {
                let assigned = world
                    .notifications()
                    .iter()
                    .filter(|n| matches!(n, Notification::ObserverAssigned(_)))
                    .count();
                if assigned == 1 { Ok(()) } else { Err(format!("{assigned} assignments")) }
            }),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn start_while_disconnected_is_inert() {
    let result = Scenario::new("start while disconnected")
        .step(Step::Replay(ReplayCommand::Start { speed: Some(2.0) }))
        .oracle(Box::new(|world| {
            assert!(world.sent().is_empty(), "nothing may be sent");
            assert!(!world.client().replay().replay_mode, "flag must stay clear");
            assert_eq!(world.client().replay().status, ReplayStatus::Idle);
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn game_state_updates_are_partial() {
    let result = Scenario::new("partial game state")
        .steps(connected())
        .step(Step::json(json!({ "type": "game_state", "total_events": 10, "observer_count": 3 })))
        .step(Step::json(json!({ "type": "game_state", "observer_count": 4 })))
        .oracle(Box::new(|world| {
            let snapshot = world.client().view().snapshot();
            assert_eq!(snapshot.total_events, 10);
            assert_eq!(snapshot.observer_count, 4);
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn wrapped_game_state_with_aliases() {
    let result = Scenario::new("wrapped game state")
        .steps(connected())
        .step(Step::json(json!({
            "type": "game_state",
            "data": { "current_round": 3, "current_phase": "night" },
        })))
        .oracle(Box::new(|world| {
            let snapshot = world.client().view().snapshot();
            assert_eq!(snapshot.round, 3);
            assert_eq!(snapshot.phase, "night");
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

fn assignments(world: &moonwatch_harness::scenario::World) -> usize {
    world.notifications().iter().filter(|n| matches!(n, Notification::ObserverAssigned(_))).count()
}

#[test]
fn observer_id_rebinds_after_disconnect() {
    let result = Scenario::new("rebind after disconnect")
        .steps(connected())
        .step(Step::welcome("obs-7"))
        .step(Step::Disconnect)
        .steps(connected())
        .step(Step::welcome("obs-9"))
        .oracle(oracle::all_of(vec![
            oracle::observer_id("obs-9"),
            Box::new(|world| {
                assert_eq!(assignments(world), 2);
                Ok(())
            }),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn disconnect_unbinds_observer_id() {
    let result = Scenario::new("disconnect unbinds")
        .steps(connected())
        .step(Step::welcome("obs-7"))
        .step(Step::Disconnect)
        .oracle(Box::new(|world| {
            assert!(world.client().view().session().is_none());
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn observer_id_survives_automatic_reconnect() {
    let result = Scenario::new("reconnect keeps session")
        .steps(connected())
        .step(Step::welcome("obs-7"))
        .steps([Step::Close, Step::FireReconnect, Step::Open])
        .step(Step::welcome("obs-8"))
        .oracle(oracle::all_of(vec![
            oracle::observer_id("obs-7"),
            oracle::connection_state(ConnectionState::Connected),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn manual_connect_after_failure_starts_new_session() {
    let mut scenario = Scenario::new("restart after failure")
        .steps(connected())
        .step(Step::welcome("obs-1"))
        .step(Step::Replay(ReplayCommand::Start { speed: None }));
    for _ in 0..5 {
        scenario = scenario.steps([Step::Close, Step::FireReconnect]);
    }

    let result = scenario
        .step(Step::Close)
        .steps(connected())
        .step(Step::welcome("obs-2"))
        .oracle(oracle::all_of(vec![
            oracle::observer_id("obs-2"),
            oracle::replay_status(ReplayStatus::Idle),
            Box::new(|world| {
                assert!(!world.client().replay().replay_mode);
                Ok(())
            }),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn repeated_closes_exhaust_reconnect_budget() {
    let mut scenario = Scenario::new("reconnect exhaustion").step(Step::Connect);
    for _ in 0..5 {
        scenario = scenario.steps([Step::Close, Step::FireReconnect]);
    }

    let result = scenario
        .step(Step::Close)
        .oracle(oracle::all_of(vec![
            oracle::connection_state(ConnectionState::Failed),
            oracle::alert_count(Severity::Fatal, 1),
            oracle::transports_opened(6),
            Box::new(|world| {
                assert_eq!(world.reconnect_delays(), &[Duration::from_secs(2); 5]);
                assert_eq!(world.elapsed(), Duration::from_secs(10));
                assert_eq!(world.pending_reconnect(), None);
                assert_eq!(world.client().connection().attempts(), 5);
                Ok(())
            }),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn successful_reconnect_resets_budget() {
    let result = Scenario::new("reconnect then recover")
        .steps(connected())
        .steps([Step::Close, Step::FireReconnect, Step::Close, Step::FireReconnect, Step::Open])
        .oracle(oracle::all_of(vec![
            oracle::connection_state(ConnectionState::Connected),
            oracle::transports_opened(3),
            Box::new(|world| {
                assert_eq!(world.client().connection().attempts(), 0);
                assert_eq!(world.client().connection_status().error, None);
                Ok(())
            }),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn error_then_close_schedules_reconnect() {
    let result = Scenario::new("error then close")
        .steps(connected())
        .step(Step::Error("connection reset".into()))
        .step(Step::Close)
        .oracle(oracle::all_of(vec![
            oracle::connection_state(ConnectionState::Reconnecting),
            Box::new(|world| {
                let status = world.client().connection_status();
                assert_eq!(status.attempt, 1);
                assert!(world.pending_reconnect().is_some());
                Ok(())
            }),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn stale_transport_cannot_touch_session() {
    let result = Scenario::new("stale transport")
        .steps(connected())
        .steps([Step::Disconnect, Step::Connect])
        .step(Step::OnTransport {
            index: 0,
            event: TransportEvent::Message(
                json!({ "type": "connection_established", "observer_id": "ghost" }).to_string(),
            ),
        })
        .step(Step::OnTransport { index: 0, event: TransportEvent::Closed })
        .step(Step::Open)
        .oracle(oracle::all_of(vec![
            oracle::connection_state(ConnectionState::Connected),
            oracle::transports_opened(2),
            Box::new(|world| {
                assert!(world.client().view().session().is_none());
                assert_eq!(world.pending_reconnect(), None);
                Ok(())
            }),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn disconnect_cancels_pending_reconnect() {
    let result = Scenario::new("disconnect while reconnecting")
        .steps(connected())
        .steps([Step::Close, Step::Disconnect])
        .oracle(oracle::all_of(vec![
            oracle::connection_state(ConnectionState::Disconnected),
            Box::new(|world| {
                assert_eq!(world.pending_reconnect(), None);
                Ok(())
            }),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn rejected_transport_fails_then_manual_connect_recovers() {
    let result = Scenario::new("rejected transport")
        .step(Step::Connect)
        .step(Step::Reject("refused".into()))
        .steps(connected())
        .oracle(oracle::all_of(vec![
            oracle::connection_state(ConnectionState::Connected),
            oracle::alert_count(Severity::Fatal, 1),
            oracle::transports_opened(2),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn custom_page_location_drives_endpoint() {
    let config = ClientConfig {
        connection: ConnectionConfig {
            location: PageLocation::new(true, "game.example.org", Some(9443)),
            ..ConnectionConfig::default()
        },
        ..ClientConfig::default()
    };

    let result = Scenario::new("secure endpoint")
        .config(config)
        .step(Step::Connect)
        .oracle(Box::new(|world| {
            assert_eq!(world.opened()[0].1, "wss://game.example.org:9443/ws");
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn heartbeat_pings_every_interval() {
    let result = Scenario::new("heartbeat")
        .steps(connected())
        .step(Step::Advance(Duration::from_secs(29)))
        .step(Step::Advance(Duration::from_secs(1)))
        .step(Step::Advance(Duration::from_secs(30)))
        .oracle(Box::new(|world| {
            assert_eq!(world.sent(), &[Outbound::Ping, Outbound::Ping]);
            Ok(())
        }))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn game_events_render_as_chat() {
    let result = Scenario::new("chat")
        .steps(connected())
        .step(game_event("public_speech", json!({ "playerId": "p1", "role": "villager", "message": "morning" })))
        .step(game_event("system_message", json!({ "message": "Night falls" })))
        .step(game_event(
            "night_action",
            json!({ "action_type": "kill", "player_id": "p2", "target_id": "p1", "result": "success" }),
        ))
        .step(game_event("game_victory", json!({ "victory_condition": "Werewolves win", "winner": "wolves" })))
        .oracle(oracle::all_of(vec![
            oracle::chat_log(vec![
                "morning",
                "Night falls",
                "🌙 p2 uses kill on p1: success",
                "🏆 Werewolves win",
            ]),
            Box::new(|world| {
                assert_eq!(world.client().view().victory(), Some("Werewolves win"));
                Ok(())
            }),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn full_replay_session() {
    let result = Scenario::new("replay session")
        .steps(connected())
        .step(Step::Replay(ReplayCommand::Start { speed: Some(2.0) }))
        .step(Step::json(json!({ "type": "replay_started", "total_events": 2 })))
        .step(Step::json(json!({
            "type": "replay_event",
            "event": {
                "sequence_id": 1,
                "event_type": "system_message",
                "data": { "message": "Day 1" },
            },
        })))
        .step(Step::Replay(ReplayCommand::Jump { input: "2".into() }))
        .step(Step::json(json!({ "type": "replay_jumped", "sequence": 2 })))
        .step(Step::json(json!({ "type": "replay_completed", "total_events": 2 })))
        .oracle(oracle::all_of(vec![
            oracle::replay_status(ReplayStatus::Completed),
            oracle::chat_log(vec!["Day 1"]),
            Box::new(|world| {
                assert_eq!(world.replay_requests(), vec![
                    ReplayRequest::Start { speed: 2.0 },
                    ReplayRequest::Jump { sequence: 2 },
                ]);
                let session = world.client().replay();
                assert_eq!(session.current_sequence, 2);
                assert_eq!(session.speed, 2.0);
                assert!(session.controls().start);
                Ok(())
            }),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn restarting_a_finished_replay_plays_again() {
    let result = Scenario::new("replay restart")
        .steps(connected())
        .step(Step::Replay(ReplayCommand::Start { speed: None }))
        .step(Step::json(json!({ "type": "replay_started", "total_events": 3 })))
        .step(Step::json(json!({ "type": "replay_completed", "total_events": 3 })))
        .step(Step::Replay(ReplayCommand::Start { speed: Some(4.0) }))
        .step(Step::json(json!({ "type": "replay_paused", "current_sequence": 3 })))
        .step(Step::json(json!({ "type": "replay_stopped" })))
        .step(Step::json(json!({ "type": "replay_started", "total_events": 3 })))
        .oracle(oracle::all_of(vec![
            oracle::replay_status(ReplayStatus::Playing),
            oracle::connection_state(ConnectionState::Connected),
            Box::new(|world| {
                let session = world.client().replay();
                assert!(session.replay_mode);
                assert_eq!(session.current_sequence, 0);
                assert_eq!(session.speed, 4.0);
                Ok(())
            }),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn disconnect_forgets_replay() {
    let result = Scenario::new("disconnect during replay")
        .steps(connected())
        .step(Step::Replay(ReplayCommand::Start { speed: Some(2.0) }))
        .step(Step::json(json!({ "type": "replay_started", "total_events": 5 })))
        .step(Step::Disconnect)
        .oracle(oracle::all_of(vec![
            oracle::replay_status(ReplayStatus::Idle),
            oracle::connection_state(ConnectionState::Disconnected),
            Box::new(|world| {
                let session = world.client().replay();
                assert!(!session.replay_mode);
                assert_eq!(session.speed, 2.0);
                Ok(())
            }),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}

#[test]
fn replay_error_keeps_connection() {
    let result = Scenario::new("replay error")
        .steps(connected())
        .step(Step::json(json!({ "type": "replay_error", "message": "no recording" })))
        .oracle(oracle::all_of(vec![
            oracle::connection_state(ConnectionState::Connected),
            oracle::alert_count(Severity::Warning, 1),
            oracle::alert_count(Severity::Fatal, 0),
        ]))
        .run();

    assert!(result.is_ok(), "scenario should succeed: {result:?}");
}
