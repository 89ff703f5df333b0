//! Heartbeat scheduling.
//!
//! While connected, the observer pings the server at a fixed period. The
//! first ping goes out one full interval after the connection opens. The
//! monitor only decides *when*; the connection manager builds the envelope.

use std::time::{Duration, Instant};

/// Fixed-period ping schedule with round-trip tracking.
#[derive(Debug, Clone)]
pub struct HeartbeatMonitor {
    interval: Duration,
    next_ping: Option<Instant>,
    /// Ping still waiting for a pong
    outstanding: Option<Instant>,
    round_trip: Option<Duration>,
}

impl HeartbeatMonitor {
    /// Stopped monitor with the given period.
    pub fn new(interval: Duration) -> Self {
        Self { interval, next_ping: None, outstanding: None, round_trip: None }
    }

    /// Start pinging. The first ping is due one interval from `now`.
    pub fn start(&mut self, now: Instant) {
        self.next_ping = Some(now + self.interval);
        self.outstanding = None;
    }

    /// Stop pinging. Idempotent.
    pub fn stop(&mut self) {
        self.next_ping = None;
        self.outstanding = None;
    }

    /// Whether pings are scheduled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.next_ping.is_some()
    }

    /// Ping period.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// When the next ping is due, if running.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_ping
    }

    /// Returns `true` when a ping is due at `now` and schedules the next one.
    ///
    /// The schedule keeps its phase. If the caller polled so late that a
    /// whole period was missed, only one ping is emitted and the schedule
    /// restarts from `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(deadline) = self.next_ping else {
            return false;
        };

        if now < deadline {
            return false;
        }

        let mut next = deadline + self.interval;
        if next <= now {
            next = now + self.interval;
        }

        self.next_ping = Some(next);
        self.outstanding = Some(now);
        true
    }

    /// Record a pong. Returns the round trip to the ping it answers, if any.
    pub fn record_pong(&mut self, now: Instant) -> Option<Duration> {
        let sent = self.outstanding.take()?;
        let round_trip = now.saturating_duration_since(sent);
        self.round_trip = Some(round_trip);
        Some(round_trip)
    }

    /// Most recent measured round trip.
    #[must_use]
    pub fn round_trip(&self) -> Option<Duration> {
        self.round_trip
    }
}
