//! Scenario testing framework.
//!
//! A scenario is a script of [`Step`]s run against one observer client in a
//! synchronous world: transport opens and reconnect timers are executed the
//! moment the client asks for them, and the clock only moves on
//! [`Step::Advance`]. Every scenario must end in an oracle.

mod builder;
pub mod oracle;
mod world;

pub use builder::{RunnableScenario, Scenario};
pub use world::{Step, World};

/// Verification run against the final world.
pub type OracleFn = Box<dyn Fn(&World) -> Result<(), String>>;
