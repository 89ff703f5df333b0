//! Driver trait for abstracting frontend I/O.
//!
//! The [`Driver`] trait decouples the runtime from a specific frontend. Each
//! frontend implements it to supply user commands and present notifications,
//! while the generic [`crate::Runtime`] handles all orchestration.

use std::future::Future;

use moonwatch_client::{ClientEvent, Notification};

/// Abstracts user-facing I/O for the runtime.
pub trait Driver: Send {
    /// Frontend-specific error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Wait for the next user command.
    ///
    /// Returns `Ok(None)` when the user quits. The returned future is raced
    /// against transport and timer events, so it must be cancel safe: if it
    /// is dropped before completing, no input may be lost.
    fn next_command(
        &mut self,
    ) -> impl Future<Output = Result<Option<ClientEvent>, Self::Error>> + Send;

    /// Present a state change to the user.
    ///
    /// The runtime awaits this before handling the next event, so a slow
    /// frontend applies backpressure instead of blocking the executor.
    ///
    /// # Errors
    ///
    /// Returns an error if the frontend can no longer present output.
    fn render(
        &mut self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
