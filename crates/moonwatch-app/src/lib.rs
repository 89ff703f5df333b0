//! Application runtime for Moonwatch
//!
//! Generic orchestration loop that runs the observer client against real or
//! simulated I/O, so the same code drives the terminal frontend in
//! production and the simulation harness in tests.
//!
//! # Components
//!
//! - [`Driver`]: Trait for frontend-specific I/O (user commands, rendering)
//! - [`Runtime`]: Single event queue serializing transport signals, timers,
//!   heartbeat ticks and user commands into the client

mod driver;
mod runtime;

pub use driver::Driver;
pub use runtime::{Runtime, RuntimeConfig, RuntimeError};
