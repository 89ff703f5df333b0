//! World state for scenario execution.
//!
//! The World owns one observer client, executes every action it returns on
//! the spot, and records what reached the network and the user so oracles
//! can inspect it. Time is a paused tokio clock owned by the World; steps
//! run inside its runtime so the client reads simulated time.

use std::time::Duration;

use moonwatch_client::{
    Alert, ClientAction, ClientConfig, ClientEvent, Notification, ObserverClient, ReplayCommand,
    Severity,
};
use moonwatch_core::{Generation, TransportEvent, TransportSignal};
use moonwatch_proto::{Outbound, ReplayRequest};
use tokio::runtime::Runtime;

use crate::SimEnv;

/// One scripted input.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// User connects
    Connect,
    /// User disconnects
    Disconnect,
    /// Latest transport completes its handshake
    Open,
    /// Latest transport delivers a text frame
    Message(String),
    /// Latest transport reports an error
    Error(String),
    /// Latest transport drops
    Close,
    /// Event on the `index`th transport ever opened, current or not
    OnTransport {
        /// Zero-based position in open order
        index: usize,
        /// Event to deliver
        event: TransportEvent,
    },
    /// Latest transport could not be constructed
    Reject(String),
    /// Pending reconnect timer elapses
    FireReconnect,
    /// Clock moves forward, then the client is ticked
    Advance(Duration),
    /// User issues a replay command
    Replay(ReplayCommand),
}

impl Step {
    /// Latest transport delivers `value` as a JSON frame.
    pub fn json(value: serde_json::Value) -> Self {
        Self::Message(value.to_string())
    }

    /// Server assigns an observer id.
    pub fn welcome(observer_id: &str) -> Self {
        Self::json(serde_json::json!({
            "type": "connection_established",
            "observer_id": observer_id,
        }))
    }
}

/// Single-client world.
pub struct World {
    runtime: Runtime,
    client: ObserverClient<SimEnv>,
    env: SimEnv,
    opened: Vec<(Generation, String)>,
    live: Option<Generation>,
    pending_reconnect: Option<(Generation, Duration)>,
    reconnect_delays: Vec<Duration>,
    sent: Vec<Outbound>,
    dropped_sends: usize,
    notifications: Vec<Notification>,
}

impl World {
    /// World around a fresh, disconnected client.
    ///
    /// # Errors
    ///
    /// Returns a description if the simulated clock cannot be set up.
    pub fn new(config: ClientConfig) -> Result<Self, String> {
        let runtime =
            SimEnv::paused_runtime().map_err(|err| format!("simulated clock unavailable: {err}"))?;
        let env = {
            let _clock = runtime.enter();
            SimEnv::new()
        };

        Ok(Self {
            runtime,
            client: ObserverClient::new(env, config),
            env,
            opened: Vec::new(),
            live: None,
            pending_reconnect: None,
            reconnect_delays: Vec::new(),
            sent: Vec::new(),
            dropped_sends: 0,
            notifications: Vec::new(),
        })
    }

    /// Apply one step.
    ///
    /// # Errors
    ///
    /// Returns a description when the step cannot be applied, such as
    /// transport events before any transport was opened.
    pub fn apply(&mut self, step: &Step) -> Result<(), String> {
        let clock = self.runtime.handle().clone();
        let _clock = clock.enter();

        match step {
            Step::Connect => self.handle(ClientEvent::Connect),
            Step::Disconnect => self.handle(ClientEvent::Disconnect),
            Step::Open => self.on_latest(TransportEvent::Opened)?,
            Step::Message(text) => self.on_latest(TransportEvent::Message(text.clone()))?,
            Step::Error(reason) => self.on_latest(TransportEvent::Error(reason.clone()))?,
            Step::Close => self.on_latest(TransportEvent::Closed)?,
            Step::OnTransport { index, event } => {
                let (generation, _) = self
                    .opened
                    .get(*index)
                    .ok_or_else(|| format!("transport {index} was never opened"))?;
                let generation = *generation;
                self.handle(ClientEvent::Transport(TransportSignal {
                    generation,
                    event: event.clone(),
                }));
            },
            Step::Reject(reason) => {
                let generation = self.latest()?;
                self.handle(ClientEvent::TransportRejected { generation, reason: reason.clone() });
            },
            Step::FireReconnect => {
                let (generation, delay) =
                    self.pending_reconnect.take().ok_or("no reconnect timer pending")?;
                self.advance(delay);
                self.handle(ClientEvent::ReconnectTimerFired { generation });
            },
            Step::Advance(duration) => {
                self.advance(*duration);
                self.handle(ClientEvent::Tick);
            },
            Step::Replay(command) => self.handle(ClientEvent::Replay(command.clone())),
        }
        Ok(())
    }

    /// The client under test.
    pub fn client(&self) -> &ObserverClient<SimEnv> {
        &self.client
    }

    /// Simulated time since the world was created.
    pub fn elapsed(&self) -> Duration {
        let _clock = self.runtime.enter();
        self.env.elapsed()
    }

    /// Every transport opened, in order, with the URL it was opened for.
    pub fn opened(&self) -> &[(Generation, String)] {
        &self.opened
    }

    /// Reconnect timer waiting to fire.
    pub fn pending_reconnect(&self) -> Option<(Generation, Duration)> {
        self.pending_reconnect
    }

    /// Delay of every reconnect ever scheduled.
    pub fn reconnect_delays(&self) -> &[Duration] {
        &self.reconnect_delays
    }

    /// Envelopes that reached the live transport.
    pub fn sent(&self) -> &[Outbound] {
        &self.sent
    }

    /// Replay requests that reached the live transport.
    pub fn replay_requests(&self) -> Vec<ReplayRequest> {
        self.sent
            .iter()
            .filter_map(|envelope| match envelope {
                Outbound::RequestReplay(request) => Some(*request),
                Outbound::Ping => None,
            })
            .collect()
    }

    /// Sends addressed to a transport that was no longer live.
    pub fn dropped_sends(&self) -> usize {
        self.dropped_sends
    }

    /// Everything pushed to the user.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Alerts of the given severity.
    pub fn alerts(&self, severity: Severity) -> Vec<&Alert> {
        self.notifications
            .iter()
            .filter_map(|notification| match notification {
                Notification::Alert(alert) if alert.severity == severity => Some(alert),
                _ => None,
            })
            .collect()
    }

    /// Chat log text, oldest first.
    pub fn chat_messages(&self) -> Vec<&str> {
        self.client.view().chat().entries().iter().map(|entry| entry.message()).collect()
    }

    fn advance(&self, duration: Duration) {
        self.runtime.block_on(tokio::time::advance(duration));
    }

    fn latest(&self) -> Result<Generation, String> {
        self.opened.last().map(|(generation, _)| *generation).ok_or_else(|| {
            "no transport opened yet".to_owned()
        })
    }

    fn on_latest(&mut self, event: TransportEvent) -> Result<(), String> {
        let generation = self.latest()?;
        self.handle(ClientEvent::Transport(TransportSignal { generation, event }));
        Ok(())
    }

    fn handle(&mut self, event: ClientEvent) {
        for action in self.client.handle(event) {
            self.execute(action);
        }
    }

    fn execute(&mut self, action: ClientAction) {
        match action {
            ClientAction::OpenTransport { generation, url } => {
                self.opened.push((generation, url));
                self.live = Some(generation);
            },
            ClientAction::CloseTransport { generation } => {
                if self.live == Some(generation) {
                    self.live = None;
                }
            },
            ClientAction::Send { generation, envelope } => {
                if self.live == Some(generation) {
                    self.sent.push(envelope);
                } else {
                    self.dropped_sends += 1;
                }
            },
            ClientAction::ScheduleReconnect { generation, delay } => {
                self.pending_reconnect = Some((generation, delay));
                self.reconnect_delays.push(delay);
            },
            ClientAction::CancelReconnect => self.pending_reconnect = None,
            ClientAction::Notify(notification) => self.notifications.push(notification),
        }
    }
}
