//! Observer client.
//!
//! Composes the connection manager, message router and replay controller
//! behind one total entry point, [`ObserverClient::handle`]. Every input is
//! a [`ClientEvent`] and every effect is a [`ClientAction`]; nothing here
//! performs I/O, and no input can make `handle` fail.

use std::time::Instant;

use moonwatch_core::{
    ConnectionAction, ConnectionConfig, ConnectionManager, ConnectionState, ConnectionStatus,
    Environment, TransportEvent, TransportSignal,
};
use moonwatch_proto::Inbound;

use crate::{
    action::ClientAction,
    event::{ClientEvent, ReplayCommand},
    notification::{Alert, Notification},
    replay::{ReplayController, ReplaySession},
    router::{MessageRouter, Routed},
    state::GameView,
};

/// Client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Connection lifecycle settings
    pub connection: ConnectionConfig,
    /// Replay speed used when a start command names none
    pub default_speed: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { connection: ConnectionConfig::default(), default_speed: 1.0 }
    }
}

/// Observer client state machine.
///
/// An explicit instance with its clock injected; there is no process-wide
/// state. Tear down with [`ClientEvent::Disconnect`].
///
/// The server keeps an observer id and a replay per session. A session runs
/// from a manual connect until `Disconnect`, or until a manual connect
/// restarts a failed client; reconnects in between stay in it. Ending a
/// session unbinds the observer id and resets the replay.
#[derive(Debug)]
pub struct ObserverClient<E: Environment> {
    env: E,
    default_speed: f64,
    connection: ConnectionManager,
    router: MessageRouter,
    replay: ReplayController,
}

impl<E: Environment> ObserverClient<E> {
    /// Disconnected client.
    pub fn new(env: E, config: ClientConfig) -> Self {
        Self {
            env,
            default_speed: config.default_speed,
            connection: ConnectionManager::new(config.connection),
            router: MessageRouter::new(),
            replay: ReplayController::new(config.default_speed),
        }
    }

    /// Process one event.
    pub fn handle(&mut self, event: ClientEvent) -> Vec<ClientAction> {
        match event {
            ClientEvent::Connect => self.connect(),
            ClientEvent::Disconnect => {
                let mut actions = lift(self.connection.disconnect());
                actions.extend(self.end_session());
                actions
            },
            ClientEvent::Transport(signal) => self.on_transport(signal),
            ClientEvent::TransportRejected { generation, reason } => {
                lift(self.connection.on_rejected(generation, &reason))
            },
            ClientEvent::ReconnectTimerFired { generation } => {
                lift(self.connection.on_reconnect_timer(generation))
            },
            ClientEvent::Tick => {
                let now = self.env.now();
                lift(self.connection.tick(now))
            },
            ClientEvent::Replay(command) => self.on_replay_command(command),
        }
    }

    /// Connection state
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Connection status snapshot
    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    /// Connection manager
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Observer session, game snapshot and chat log
    pub fn view(&self) -> &GameView {
        self.router.view()
    }

    /// Replay session
    pub fn replay(&self) -> &ReplaySession {
        self.replay.session()
    }

    /// Environment
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Next instant the client needs a [`ClientEvent::Tick`], if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.connection.state() == ConnectionState::Connected {
            self.connection.heartbeat().next_deadline()
        } else {
            None
        }
    }

    fn connect(&mut self) -> Vec<ClientAction> {
        let restart = self.connection.state() == ConnectionState::Failed;

        match self.connection.connect() {
            Ok(actions) => {
                let mut actions = lift(actions);
                if restart {
                    actions.extend(self.end_session());
                }
                actions
            },
            Err(err) => {
                tracing::warn!(error = %err, "connect ignored");
                Vec::new()
            },
        }
    }

    fn on_transport(&mut self, signal: TransportSignal) -> Vec<ClientAction> {
        let TransportSignal { generation, event } = signal;

        match event {
            TransportEvent::Opened => {
                let now = self.env.now();
                lift(self.connection.on_open(generation, now))
            },
            TransportEvent::Message(text) => {
                if !self.connection.is_current(generation) {
                    tracing::trace!(%generation, "discarding message from stale transport");
                    return Vec::new();
                }
                self.on_message(&text)
            },
            TransportEvent::Error(reason) => lift(self.connection.on_error(generation, &reason)),
            TransportEvent::Closed => lift(self.connection.on_close(generation)),
        }
    }

    fn on_message(&mut self, text: &str) -> Vec<ClientAction> {
        let inbound = match Inbound::decode(text) {
            Ok(inbound) => inbound,
            Err(err) => {
                tracing::warn!(error = %err, "dropping malformed frame");
                return Vec::new();
            },
        };

        let received_at = self.env.wall_clock();
        match self.router.route(inbound, received_at) {
            Routed::Notify(notifications) => notify(notifications),
            Routed::Replay(ack) => {
                if self.replay.on_ack(ack) {
                    vec![self.replay_changed()]
                } else {
                    Vec::new()
                }
            },
            Routed::ReplayEvent { sequence_id, notifications } => {
                let mut actions = notify(notifications);
                if self.replay.on_replay_event(sequence_id) {
                    actions.push(self.replay_changed());
                }
                actions
            },
            Routed::ReplayError(message) => {
                tracing::warn!(%message, "server reported replay error");
                vec![ClientAction::Notify(Notification::Alert(Alert::warning(
                    "Replay error",
                    message,
                )))]
            },
            Routed::Pong => {
                let now = self.env.now();
                if let Some(round_trip) = self.connection.record_pong(now) {
                    tracing::debug!(?round_trip, "pong");
                }
                Vec::new()
            },
            Routed::Ignored => Vec::new(),
        }
    }

    fn on_replay_command(&mut self, command: ReplayCommand) -> Vec<ClientAction> {
        let before = *self.replay.session();
        let mut selected_speed = None;

        let result = match command {
            ReplayCommand::Start { speed } => {
                self.replay.start(speed.unwrap_or(self.default_speed), &self.connection)
            },
            ReplayCommand::Pause => self.replay.pause(&self.connection),
            ReplayCommand::Resume => self.replay.resume(&self.connection),
            ReplayCommand::Stop => self.replay.stop(&self.connection),
            ReplayCommand::Jump { input } => self.replay.jump(&input, &self.connection),
            ReplayCommand::SetSpeed { speed } => {
                selected_speed = Some(speed);
                self.replay.set_speed(speed, &self.connection)
            },
        };

        let mut actions = Vec::new();
        match result {
            Ok(action) => {
                actions.push(ClientAction::from(action));
                if let Some(speed) = selected_speed {
                    actions.push(ClientAction::Notify(Notification::SpeedSelected { speed }));
                }
            },
            Err(err) if err.is_user_facing() => {
                tracing::warn!(error = %err, "replay command rejected");
                actions.push(ClientAction::Notify(Notification::Alert(Alert::warning(
                    "Replay",
                    err.to_string(),
                ))));
            },
            Err(err) => tracing::warn!(error = %err, "replay request not delivered"),
        }

        if *self.replay.session() != before {
            actions.push(self.replay_changed());
        }

        actions
    }

    fn end_session(&mut self) -> Vec<ClientAction> {
        self.router.end_session();
        if self.replay.reset() { vec![self.replay_changed()] } else { Vec::new() }
    }

    fn replay_changed(&self) -> ClientAction {
        ClientAction::Notify(Notification::Replay(*self.replay.session()))
    }
}

fn lift(actions: Vec<ConnectionAction>) -> Vec<ClientAction> {
    actions.into_iter().map(ClientAction::from).collect()
}

fn notify(notifications: Vec<Notification>) -> Vec<ClientAction> {
    notifications.into_iter().map(ClientAction::Notify).collect()
}

#[cfg(test)]
mod tests {
    use moonwatch_core::{Generation, TransportSignal};
    use moonwatch_harness::SimEnv;
    use moonwatch_proto::{Outbound, ReplayRequest};

    use super::*;
    use crate::{notification::Severity, replay::ReplayStatus};

    fn signal(generation: Generation, event: TransportEvent) -> ClientEvent {
        ClientEvent::Transport(TransportSignal { generation, event })
    }

    fn message(generation: Generation, text: &str) -> ClientEvent {
        signal(generation, TransportEvent::Message(text.into()))
    }

    fn connected_client() -> (ObserverClient<SimEnv>, Generation) {
        let mut client = ObserverClient::new(SimEnv::new(), ClientConfig::default());
        client.handle(ClientEvent::Connect);
        let generation = client.connection().generation();
        client.handle(signal(generation, TransportEvent::Opened));
        (client, generation)
    }

    fn alerts(actions: &[ClientAction]) -> Vec<&Alert> {
        actions
            .iter()
            .filter_map(|action| match action {
                ClientAction::Notify(Notification::Alert(alert)) => Some(alert),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn connect_opens_transport() {
        let mut client = ObserverClient::new(SimEnv::new(), ClientConfig::default());
        let actions = client.handle(ClientEvent::Connect);

        assert!(matches!(
            &actions[0],
            ClientAction::OpenTransport { url, .. } if url == "ws://localhost:8080/ws"
        ));
        assert_eq!(client.connection_state(), ConnectionState::Connecting);
    }

    #[test]
    fn malformed_frames_never_disturb_the_session() {
        let (mut client, generation) = connected_client();

        for junk in ["", "{", "[]", "null", r#"{"type":42}"#, r#"{"no_type":true}"#] {
            assert!(client.handle(message(generation, junk)).is_empty());
        }
        client.handle(message(
            generation,
            r#"{"type":"game_state","total_events":10,"observer_count":3}"#,
        ));

        assert_eq!(client.connection_state(), ConnectionState::Connected);
        assert_eq!(client.view().snapshot().total_events, 10);
    }

    #[test]
    fn messages_from_stale_transport_are_dropped() {
        let (mut client, old) = connected_client();
        client.handle(ClientEvent::Disconnect);
        client.handle(ClientEvent::Connect);

        let actions = client.handle(message(
            old,
            r#"{"type":"connection_established","observer_id":"ghost"}"#,
        ));
        assert!(actions.is_empty());
        assert!(client.view().session().is_none());
    }

    #[test]
    fn start_while_disconnected_sends_nothing() {
        let mut client = ObserverClient::new(SimEnv::new(), ClientConfig::default());

        let actions = client.handle(ClientEvent::Replay(ReplayCommand::Start { speed: Some(2.0) }));
        assert!(actions.is_empty());
        assert!(!client.replay().replay_mode);
    }

    #[test]
    fn start_uses_default_speed_and_notifies_flag() {
        let (mut client, generation) = connected_client();

        let actions = client.handle(ClientEvent::Replay(ReplayCommand::Start { speed: None }));
        assert_eq!(
            actions[0],
            ClientAction::Send {
                generation,
                envelope: Outbound::RequestReplay(ReplayRequest::Start { speed: 1.0 }),
            }
        );
        assert!(matches!(
            actions[1],
            ClientAction::Notify(Notification::Replay(ReplaySession { replay_mode: true, .. }))
        ));
    }

    #[test]
    fn invalid_jump_alerts_without_sending() {
        let (mut client, _) = connected_client();

        for input in ["-1", "abc"] {
            let actions =
                client.handle(ClientEvent::Replay(ReplayCommand::Jump { input: input.into() }));
            assert_eq!(actions.len(), 1);
            assert_eq!(alerts(&actions)[0].severity, Severity::Warning);
        }
        assert_eq!(client.replay().current_sequence, 0);
    }

    #[test]
    fn set_speed_echoes_selection() {
        let (mut client, _) = connected_client();

        let actions = client.handle(ClientEvent::Replay(ReplayCommand::SetSpeed { speed: 3.0 }));
        assert!(matches!(actions[0], ClientAction::Send { .. }));
        assert_eq!(actions[1], ClientAction::Notify(Notification::SpeedSelected { speed: 3.0 }));
        assert_eq!(actions.len(), 2);
    }

    #[test]
    fn replay_error_is_non_fatal_alert() {
        let (mut client, generation) = connected_client();

        let actions = client
            .handle(message(generation, r#"{"type":"replay_error","message":"no recording"}"#));
        let alerts = alerts(&actions);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Warning);
        assert_eq!(alerts[0].message, "no recording");
        assert_eq!(client.connection_state(), ConnectionState::Connected);
    }

    #[test]
    fn exhaustion_raises_one_fatal_alert() {
        let mut client = ObserverClient::new(SimEnv::new(), ClientConfig::default());
        client.handle(ClientEvent::Connect);

        let mut fatal = 0;
        for _ in 0..10 {
            let generation = client.connection().generation();
            let actions = client.handle(signal(generation, TransportEvent::Closed));
            fatal += alerts(&actions).iter().filter(|a| a.severity == Severity::Fatal).count();

            for action in actions {
                if let ClientAction::ScheduleReconnect { generation, .. } = action {
                    client.handle(ClientEvent::ReconnectTimerFired { generation });
                }
            }
        }

        assert_eq!(client.connection_state(), ConnectionState::Failed);
        assert_eq!(fatal, 1);
    }

    #[test]
    fn disconnect_ends_observer_session() {
        let (mut client, generation) = connected_client();
        client.handle(message(
            generation,
            r#"{"type":"connection_established","observer_id":"obs-7"}"#,
        ));

        client.handle(ClientEvent::Disconnect);
        assert!(client.view().session().is_none());

        client.handle(ClientEvent::Connect);
        let fresh = client.connection().generation();
        client.handle(signal(fresh, TransportEvent::Opened));
        client.handle(message(fresh, r#"{"type":"connection_established","observer_id":"obs-9"}"#));

        let session = client.view().session().map(|s| s.observer_id.as_str());
        assert_eq!(session, Some("obs-9"));
    }

    #[test]
    fn disconnect_resets_replay_and_notifies() {
        let (mut client, generation) = connected_client();
        client.handle(ClientEvent::Replay(ReplayCommand::Start { speed: Some(2.0) }));
        client.handle(message(generation, r#"{"type":"replay_started","total_events":8}"#));
        assert_eq!(client.replay().status, ReplayStatus::Playing);

        let actions = client.handle(ClientEvent::Disconnect);

        let replay = actions.iter().find_map(|action| match action {
            ClientAction::Notify(Notification::Replay(session)) => Some(*session),
            _ => None,
        });
        let replay = replay.expect("replay notification");
        assert_eq!(replay.status, ReplayStatus::Idle);
        assert!(!replay.replay_mode);
        assert_eq!(replay.speed, 2.0);
        assert_eq!(*client.replay(), replay);
    }

    #[test]
    fn disconnect_without_replay_stays_quiet() {
        let (mut client, _) = connected_client();

        let actions = client.handle(ClientEvent::Disconnect);
        assert!(!actions.iter().any(|a| matches!(a, ClientAction::Notify(Notification::Replay(_)))));
    }

    #[test]
    fn reconnect_keeps_observer_session() {
        let (mut client, generation) = connected_client();
        client.handle(message(
            generation,
            r#"{"type":"connection_established","observer_id":"obs-7"}"#,
        ));

        let actions = client.handle(signal(generation, TransportEvent::Closed));
        for action in actions {
            if let ClientAction::ScheduleReconnect { generation, .. } = action {
                client.handle(ClientEvent::ReconnectTimerFired { generation });
            }
        }
        let fresh = client.connection().generation();
        client.handle(signal(fresh, TransportEvent::Opened));
        client.handle(message(fresh, r#"{"type":"connection_established","observer_id":"obs-8"}"#));

        let session = client.view().session().map(|s| s.observer_id.as_str());
        assert_eq!(session, Some("obs-7"));
    }

    #[test]
    fn manual_connect_after_failure_rebinds() {
        let (mut client, generation) = connected_client();
        client.handle(message(
            generation,
            r#"{"type":"connection_established","observer_id":"obs-1"}"#,
        ));

        while client.connection_state() != ConnectionState::Failed {
            let generation = client.connection().generation();
            for action in client.handle(signal(generation, TransportEvent::Closed)) {
                if let ClientAction::ScheduleReconnect { generation, .. } = action {
                    client.handle(ClientEvent::ReconnectTimerFired { generation });
                }
            }
        }
        assert!(client.view().session().is_some());

        client.handle(ClientEvent::Connect);
        assert!(client.view().session().is_none());
        let fresh = client.connection().generation();
        client.handle(signal(fresh, TransportEvent::Opened));
        client.handle(message(fresh, r#"{"type":"connection_established","observer_id":"obs-2"}"#));

        let session = client.view().session().map(|s| s.observer_id.as_str());
        assert_eq!(session, Some("obs-2"));
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_pings_on_tick() {
        let (mut client, generation) = connected_client();
        assert!(client.handle(ClientEvent::Tick).is_empty());

        tokio::time::advance(std::time::Duration::from_secs(30)).await;
        assert_eq!(
            client.handle(ClientEvent::Tick),
            vec![ClientAction::Send { generation, envelope: Outbound::Ping }]
        );

        tokio::time::advance(std::time::Duration::from_millis(120)).await;
        assert!(client.handle(message(generation, r#"{"type":"pong"}"#)).is_empty());
        assert_eq!(
            client.connection().heartbeat().round_trip(),
            Some(std::time::Duration::from_millis(120))
        );
    }
}
