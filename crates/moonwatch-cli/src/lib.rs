//! Terminal spectator for Moonwatch
//!
//! A thin shell over [`moonwatch_app::Driver`] that reads slash commands from
//! stdin and prints notifications as text. All orchestration logic lives in
//! the generic [`moonwatch_app::Runtime`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod args;
pub mod commands;
pub mod render;
pub mod terminal;

pub use args::Args;
pub use commands::Command;
pub use terminal::{TerminalDriver, TerminalError};
