//! Environment abstraction.
//!
//! State machines take time as a parameter. The runtime obtains it from an
//! [`Environment`], which the harness replaces with a virtual clock.

use std::{
    future::Future,
    time::{Duration, Instant, SystemTime},
};

/// Source of time for the runtime.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Monotonic time, used for heartbeat scheduling.
    fn now(&self) -> Instant;

    /// Wall-clock time, used to stamp observer sessions and chat entries.
    fn wall_clock(&self) -> SystemTime;

    /// Wait for `duration`. Reconnect timers are built on this.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Production environment backed by the tokio clock.
///
/// Uses tokio's clock rather than `std` so a paused test runtime controls
/// both [`Environment::now`] and [`Environment::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl Environment for SystemEnv {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn wall_clock(&self) -> SystemTime {
        SystemTime::now()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
