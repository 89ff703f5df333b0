//! Connection lifecycle state machine.
//!
//! Owns the observer's single logical connection to the game server: opening
//! the transport, reconnecting after unexpected closes, giving up after a
//! bounded number of attempts, and explicit teardown.
//!
//! # Architecture: Action-Based State Machine
//!
//! - Methods accept time as a parameter where scheduling depends on it
//! - Methods return the [`ConnectionAction`]s the runtime must execute
//! - No I/O, timers, or sockets live here
//!
//! # State Machine
//!
//! ```text
//!                  connect()
//! ┌──────────────┐ ────────> ┌────────────┐  opened  ┌───────────┐
//! │ Disconnected │           │ Connecting │ ───────> │ Connected │
//! └──────────────┘           └────────────┘          └───────────┘
//!        ^                      ^       │ closed           │ closed
//!        │ disconnect()   timer │       v                  v
//!        │                   ┌──────────────┐  budget  ┌────────┐
//!        └────────────────── │ Reconnecting │ ───────> │ Failed │
//!                            └──────────────┘ exhausted└────────┘
//! ```
//!
//! # Reconnect Budget
//!
//! Reconnects use a fixed delay, not exponential backoff. After
//! `max_reconnect_attempts` scheduled reconnects have all closed without
//! reaching Connected, the next close moves to Failed. Failed is terminal
//! until an explicit `connect()`. A successful open resets the budget.
//!
//! # Generations
//!
//! Every connect and every disconnect advances the [`Generation`]. Transport
//! signals and reconnect timers carry the generation they were created
//! under, and anything older than the current generation is dropped before
//! it can change state.

use std::{
    fmt,
    time::{Duration, Instant},
};

use moonwatch_proto::Outbound;
use thiserror::Error;

use crate::{endpoint::PageLocation, error::ConnectionError, heartbeat::HeartbeatMonitor};

/// Monotonic connection attempt token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// Generation with the given raw value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw value.
    pub const fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No connection and none wanted
    Disconnected,
    /// Transport opened, waiting for it to come up
    Connecting,
    /// Transport is up
    Connected,
    /// Transport closed unexpectedly, reconnect scheduled
    Reconnecting,
    /// Gave up. Requires an explicit connect.
    Failed,
}

/// Connection configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    /// Page the observer is served from. Determines the endpoint.
    pub location: PageLocation,
    /// Scheduled reconnects before giving up
    pub max_reconnect_attempts: u32,
    /// Fixed delay before each reconnect
    pub reconnect_delay: Duration,
    /// Heartbeat ping period while connected
    pub heartbeat_interval: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            location: PageLocation::default(),
            max_reconnect_attempts: 5,
            reconnect_delay: Duration::from_secs(2),
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}

/// Snapshot of the connection for status indicators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// Current state
    pub state: ConnectionState,
    /// Reconnects used since the last successful open
    pub attempt: u32,
    /// Reconnect budget
    pub max_attempts: u32,
    /// Last transport error or failure reason, cleared on open
    pub error: Option<String>,
}

/// Why the connection gave up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionFailure {
    /// Every scheduled reconnect closed without connecting
    #[error("connection lost after {attempts} reconnect attempts")]
    Exhausted {
        /// Reconnects that were attempted
        attempts: u32,
    },

    /// Endpoint URL could not be built
    #[error("cannot build endpoint: {reason}")]
    InvalidEndpoint {
        /// Why construction failed
        reason: String,
    },

    /// Transport refused to open the endpoint
    #[error("transport rejected the endpoint: {reason}")]
    TransportRejected {
        /// Reason reported by the transport
        reason: String,
    },
}

/// Actions returned by the connection state machine.
///
/// The runtime executes these in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionAction {
    /// Open a transport to `url`, tagging its signals with `generation`
    Open {
        /// Generation the transport belongs to
        generation: Generation,
        /// Endpoint URL
        url: String,
    },

    /// Close the transport of `generation`, if still open
    Close {
        /// Generation whose transport to close
        generation: Generation,
    },

    /// Send an envelope on the transport of `generation`
    Send {
        /// Generation whose transport to send on
        generation: Generation,
        /// Envelope to send
        envelope: Outbound,
    },

    /// Fire a reconnect timer tagged with `generation` after `delay`
    ScheduleReconnect {
        /// Generation the timer belongs to
        generation: Generation,
        /// Delay before the timer fires
        delay: Duration,
    },

    /// Drop any pending reconnect timer
    CancelReconnect,

    /// Connection status changed
    Status(ConnectionStatus),

    /// Connection gave up. Emitted once per transition into Failed.
    Failed(ConnectionFailure),
}

/// Connection lifecycle state machine.
///
/// This is a pure state machine. Time is passed to the methods that need it.
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    config: ConnectionConfig,
    state: ConnectionState,
    generation: Generation,
    attempts: u32,
    error: Option<String>,
    heartbeat: HeartbeatMonitor,
}

impl ConnectionManager {
    /// Create a manager in Disconnected state.
    pub fn new(config: ConnectionConfig) -> Self {
        let heartbeat = HeartbeatMonitor::new(config.heartbeat_interval);
        Self {
            config,
            state: ConnectionState::Disconnected,
            generation: Generation::default(),
            attempts: 0,
            error: None,
            heartbeat,
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Current generation
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Reconnects used since the last successful open
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Configuration
    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Heartbeat schedule
    #[must_use]
    pub fn heartbeat(&self) -> &HeartbeatMonitor {
        &self.heartbeat
    }

    /// Whether a signal tagged with `generation` belongs to the current
    /// connection attempt.
    #[must_use]
    pub fn is_current(&self, generation: Generation) -> bool {
        generation == self.generation
    }

    /// Status snapshot
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus {
            state: self.state,
            attempt: self.attempts,
            max_attempts: self.config.max_reconnect_attempts,
            error: self.error.clone(),
        }
    }

    /// Start connecting.
    ///
    /// From Disconnected or Failed this starts a fresh session with a full
    /// reconnect budget. From Reconnecting it connects immediately, dropping
    /// the pending timer but keeping the attempts already used.
    ///
    /// An endpoint that cannot be built moves straight to Failed without
    /// entering Reconnecting; that is reported through the returned actions.
    ///
    /// # Errors
    ///
    /// `InvalidState` while Connecting or Connected. No second transport is
    /// ever opened.
    pub fn connect(&mut self) -> Result<Vec<ConnectionAction>, ConnectionError> {
        let mut actions = Vec::new();

        match self.state {
            ConnectionState::Connecting | ConnectionState::Connected => {
                return Err(ConnectionError::InvalidState {
                    state: self.state,
                    operation: "connect",
                });
            },
            ConnectionState::Disconnected | ConnectionState::Failed => {
                self.attempts = 0;
                self.error = None;
            },
            ConnectionState::Reconnecting => actions.push(ConnectionAction::CancelReconnect),
        }

        actions.extend(self.open());
        Ok(actions)
    }

    /// Reconnect timer fired.
    ///
    /// Timers from a superseded generation, or arriving when no reconnect is
    /// pending, are discarded.
    pub fn on_reconnect_timer(&mut self, generation: Generation) -> Vec<ConnectionAction> {
        if !self.is_current(generation) {
            tracing::trace!(%generation, current = %self.generation, "discarding stale reconnect timer");
            return Vec::new();
        }

        if self.state != ConnectionState::Reconnecting {
            tracing::trace!(%generation, state = ?self.state, "reconnect timer fired outside Reconnecting");
            return Vec::new();
        }

        tracing::info!(attempt = self.attempts, max = self.config.max_reconnect_attempts, "reconnecting");
        self.open()
    }

    /// Transport of `generation` came up.
    pub fn on_open(&mut self, generation: Generation, now: Instant) -> Vec<ConnectionAction> {
        if !self.is_current(generation) {
            tracing::trace!(%generation, current = %self.generation, "discarding stale open");
            return Vec::new();
        }

        if self.state != ConnectionState::Connecting {
            tracing::debug!(%generation, state = ?self.state, "ignoring open outside Connecting");
            return Vec::new();
        }

        self.state = ConnectionState::Connected;
        self.attempts = 0;
        self.error = None;
        self.heartbeat.start(now);

        tracing::info!(%generation, "connected");
        vec![ConnectionAction::Status(self.status())]
    }

    /// Transport of `generation` reported an error.
    ///
    /// Only the status indicator changes. Recovery is driven by the close
    /// that follows.
    pub fn on_error(&mut self, generation: Generation, reason: &str) -> Vec<ConnectionAction> {
        if !self.is_current(generation) {
            tracing::trace!(%generation, current = %self.generation, "discarding stale error");
            return Vec::new();
        }

        if !matches!(self.state, ConnectionState::Connecting | ConnectionState::Connected) {
            tracing::debug!(%generation, state = ?self.state, error = reason, "ignoring transport error");
            return Vec::new();
        }

        tracing::warn!(%generation, error = reason, "transport error");
        self.error = Some(reason.to_owned());
        vec![ConnectionAction::Status(self.status())]
    }

    /// Transport of `generation` closed.
    ///
    /// Closes caused by [`Self::disconnect`] belong to a superseded
    /// generation and never reach this logic.
    pub fn on_close(&mut self, generation: Generation) -> Vec<ConnectionAction> {
        if !self.is_current(generation) {
            tracing::trace!(%generation, current = %self.generation, "discarding stale close");
            return Vec::new();
        }

        if !matches!(self.state, ConnectionState::Connecting | ConnectionState::Connected) {
            tracing::debug!(%generation, state = ?self.state, "ignoring duplicate close");
            return Vec::new();
        }

        self.heartbeat.stop();

        if self.attempts >= self.config.max_reconnect_attempts {
            return self.fail(ConnectionFailure::Exhausted { attempts: self.attempts });
        }

        self.attempts += 1;
        self.state = ConnectionState::Reconnecting;

        tracing::warn!(
            %generation,
            attempt = self.attempts,
            max = self.config.max_reconnect_attempts,
            delay = ?self.config.reconnect_delay,
            "connection closed, scheduling reconnect"
        );

        vec![
            ConnectionAction::Status(self.status()),
            ConnectionAction::ScheduleReconnect {
                generation: self.generation,
                delay: self.config.reconnect_delay,
            },
        ]
    }

    /// Transport for `generation` could not even be constructed.
    pub fn on_rejected(&mut self, generation: Generation, reason: &str) -> Vec<ConnectionAction> {
        if !self.is_current(generation) {
            tracing::trace!(%generation, current = %self.generation, "discarding stale rejection");
            return Vec::new();
        }

        if self.state != ConnectionState::Connecting {
            tracing::debug!(%generation, state = ?self.state, "ignoring rejection outside Connecting");
            return Vec::new();
        }

        self.fail(ConnectionFailure::TransportRejected { reason: reason.to_owned() })
    }

    /// Tear the connection down. Idempotent.
    ///
    /// Closes the open transport, cancels a pending reconnect and stops the
    /// heartbeat. Signals still in flight from the old transport are stale
    /// afterwards.
    pub fn disconnect(&mut self) -> Vec<ConnectionAction> {
        if self.state == ConnectionState::Disconnected {
            return Vec::new();
        }

        let mut actions = Vec::new();
        match self.state {
            ConnectionState::Connecting | ConnectionState::Connected => {
                actions.push(ConnectionAction::Close { generation: self.generation });
            },
            ConnectionState::Reconnecting => actions.push(ConnectionAction::CancelReconnect),
            ConnectionState::Disconnected | ConnectionState::Failed => {},
        }

        self.generation = self.generation.next();
        self.state = ConnectionState::Disconnected;
        self.attempts = 0;
        self.error = None;
        self.heartbeat.stop();

        tracing::info!(generation = %self.generation, "disconnected");
        actions.push(ConnectionAction::Status(self.status()));
        actions
    }

    /// Prepare an envelope for delivery.
    ///
    /// # Errors
    ///
    /// `NotConnected` unless Connected. The envelope is dropped, never
    /// queued.
    pub fn send(&self, envelope: Outbound) -> Result<ConnectionAction, ConnectionError> {
        if self.state != ConnectionState::Connected {
            return Err(ConnectionError::NotConnected { state: self.state });
        }

        Ok(ConnectionAction::Send { generation: self.generation, envelope })
    }

    /// Drive the heartbeat. Returns a ping when one is due.
    pub fn tick(&mut self, now: Instant) -> Vec<ConnectionAction> {
        if self.state != ConnectionState::Connected {
            return Vec::new();
        }

        if self.heartbeat.poll(now) {
            vec![ConnectionAction::Send { generation: self.generation, envelope: Outbound::Ping }]
        } else {
            Vec::new()
        }
    }

    /// Pong received. Returns the measured round trip, if a ping was
    /// outstanding.
    pub fn record_pong(&mut self, now: Instant) -> Option<Duration> {
        self.heartbeat.record_pong(now)
    }

    fn open(&mut self) -> Vec<ConnectionAction> {
        self.generation = self.generation.next();

        let url = match self.config.location.endpoint_url() {
            Ok(url) => url,
            Err(err) => {
                return self.fail(ConnectionFailure::InvalidEndpoint { reason: err.to_string() });
            },
        };

        self.state = ConnectionState::Connecting;
        tracing::debug!(generation = %self.generation, %url, "opening transport");

        vec![
            ConnectionAction::Open { generation: self.generation, url: url.into() },
            ConnectionAction::Status(self.status()),
        ]
    }

    fn fail(&mut self, failure: ConnectionFailure) -> Vec<ConnectionAction> {
        tracing::error!(generation = %self.generation, error = %failure, "connection failed");

        self.state = ConnectionState::Failed;
        self.error = Some(failure.to_string());
        self.heartbeat.stop();

        vec![ConnectionAction::Status(self.status()), ConnectionAction::Failed(failure)]
    }
}
