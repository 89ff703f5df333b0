//! Outputs of the observer client.

use std::time::Duration;

use moonwatch_core::{ConnectionAction, Generation};
use moonwatch_proto::Outbound;

use crate::notification::{Alert, Notification};

/// Actions returned by [`crate::ObserverClient::handle`].
///
/// The runtime executes them in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientAction {
    /// Open a transport to `url` for `generation`
    OpenTransport {
        /// Generation the transport belongs to
        generation: Generation,
        /// Endpoint URL
        url: String,
    },

    /// Close the transport of `generation`
    CloseTransport {
        /// Generation whose transport to close
        generation: Generation,
    },

    /// Send an envelope on the transport of `generation`
    Send {
        /// Generation whose transport to send on
        generation: Generation,
        /// Envelope to send
        envelope: Outbound,
    },

    /// Feed `ReconnectTimerFired { generation }` back after `delay`
    ScheduleReconnect {
        /// Generation the timer belongs to
        generation: Generation,
        /// Delay before firing
        delay: Duration,
    },

    /// Drop any pending reconnect timer
    CancelReconnect,

    /// Push a notification to the presentation layer
    Notify(Notification),
}

impl From<ConnectionAction> for ClientAction {
    fn from(action: ConnectionAction) -> Self {
        match action {
            ConnectionAction::Open { generation, url } => Self::OpenTransport { generation, url },
            ConnectionAction::Close { generation } => Self::CloseTransport { generation },
            ConnectionAction::Send { generation, envelope } => Self::Send { generation, envelope },
            ConnectionAction::ScheduleReconnect { generation, delay } => {
                Self::ScheduleReconnect { generation, delay }
            },
            ConnectionAction::CancelReconnect => Self::CancelReconnect,
            ConnectionAction::Status(status) => Self::Notify(Notification::Connection(status)),
            ConnectionAction::Failed(failure) => Self::Notify(Notification::Alert(Alert::fatal(
                "Connection failed",
                format!("{failure}. Reconnect manually to try again."),
            ))),
        }
    }
}
