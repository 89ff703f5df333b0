//! Client error types.

use moonwatch_core::ConnectionError;
use thiserror::Error;

/// Why a replay command produced no request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReplayError {
    /// Request could not be handed to the connection
    #[error("replay request not sent: {0}")]
    Delivery(#[from] ConnectionError),

    /// Jump target is not a whole number
    #[error("invalid sequence {input:?}: expected a whole number")]
    InvalidSequence {
        /// What the user typed
        input: String,
    },

    /// Jump target is below zero
    #[error("sequence {value} is negative")]
    NegativeSequence {
        /// Parsed value
        value: i64,
    },

    /// Speed is zero, negative or not finite
    #[error("invalid replay speed {speed}: must be a positive number")]
    InvalidSpeed {
        /// Requested speed
        speed: f64,
    },
}

impl ReplayError {
    /// Whether the user should see this as an alert.
    ///
    /// Input mistakes are reported to the user. Delivery failures are only
    /// logged; the connection status indicator already shows why.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Delivery(_))
    }
}
