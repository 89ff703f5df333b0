//! Typed envelope payloads.
//!
//! - [`session`]: connection binding, partial game state, heartbeat replies
//! - [`game`]: data carried by each game event kind
//! - [`replay`]: replay acknowledgments and replayed events

pub mod game;
pub mod replay;
pub mod session;
