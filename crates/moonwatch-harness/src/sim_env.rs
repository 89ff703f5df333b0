//! Simulated environment on tokio's paused clock.

use std::{
    future::Future,
    io,
    time::{Duration, Instant, SystemTime},
};

use moonwatch_core::Environment;
use tokio::runtime::{self, Runtime};

/// Wall-clock origin of every simulation: 2023-11-14T22:13:20Z.
const WALL_ORIGIN_SECS: u64 = 1_700_000_000;

/// Environment for tests that run under a paused tokio clock.
///
/// Time only moves through `tokio::time::advance` or, when every task is
/// idle, the runtime's auto-advance to the next timer. Each `sleep` is a real
/// tokio timer, so concurrent sleeps share one timeline. The wall clock
/// starts at a fixed instant so timestamps are reproducible.
#[derive(Debug, Clone, Copy)]
pub struct SimEnv {
    origin: tokio::time::Instant,
}

impl SimEnv {
    /// Environment whose origin is the current tokio instant.
    ///
    /// Create it inside the paused runtime that will drive it.
    pub fn new() -> Self {
        Self { origin: tokio::time::Instant::now() }
    }

    /// Current-thread runtime with the clock paused, for driving a
    /// [`SimEnv`] from synchronous code.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be built.
    pub fn paused_runtime() -> io::Result<Runtime> {
        runtime::Builder::new_current_thread().enable_time().start_paused(true).build()
    }

    /// Simulated time since the origin.
    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for SimEnv {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    fn wall_clock(&self) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(WALL_ORIGIN_SECS) + self.elapsed()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}
