//! Connection error types.

use thiserror::Error;

use crate::connection::ConnectionState;

/// Errors from the connection state machine and transport handles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// Operation is not valid in the current state
    #[error("cannot {operation} while {state:?}")]
    InvalidState {
        /// State the connection was in
        state: ConnectionState,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Envelope could not be delivered because no connection is open.
    /// Nothing is queued for later delivery.
    #[error("not connected (state: {state:?})")]
    NotConnected {
        /// State the connection was in
        state: ConnectionState,
    },

    /// Endpoint URL could not be constructed from the page location
    #[error("invalid endpoint: {reason}")]
    InvalidEndpoint {
        /// What was wrong with the location
        reason: String,
    },

    /// Transport task has already shut down
    #[error("transport is gone")]
    TransportGone,
}
