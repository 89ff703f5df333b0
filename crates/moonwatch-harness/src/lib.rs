//! Deterministic simulation harness for Moonwatch observer testing.
//!
//! In-memory implementations of the Environment, Transport and Driver traits,
//! a scenario builder that enforces the oracle pattern, and a reference model
//! of the replay controller for model-based property tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod model;
pub mod scenario;
pub mod sim_driver;
pub mod sim_env;
pub mod sim_transport;

pub use model::{Operation, ReplayModel};
pub use sim_driver::{SimDriver, SimUser};
pub use sim_env::SimEnv;
pub use sim_transport::{SimNetwork, SimPeer, SimTransport, SimTransportError};
