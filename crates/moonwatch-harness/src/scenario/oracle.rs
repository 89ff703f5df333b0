//! Reusable oracle helpers.

use moonwatch_client::{ReplayStatus, Severity};
use moonwatch_core::ConnectionState;

use crate::scenario::OracleFn;

/// Client ends in `expected` connection state.
pub fn connection_state(expected: ConnectionState) -> OracleFn {
    Box::new(move |world| {
        let actual = world.client().connection_state();
        if actual == expected {
            Ok(())
        } else {
            Err(format!("expected connection state {expected:?}, got {actual:?}"))
        }
    })
}

/// Observer id was bound to `expected`.
pub fn observer_id(expected: &'static str) -> OracleFn {
    Box::new(move |world| match world.client().view().session() {
        Some(session) if session.observer_id == expected => Ok(()),
        Some(session) => {
            Err(format!("expected observer id {expected}, got {}", session.observer_id))
        },
        None => Err(format!("expected observer id {expected}, none assigned")),
    })
}

/// Replay session ends in `expected` status.
pub fn replay_status(expected: ReplayStatus) -> OracleFn {
    Box::new(move |world| {
        let actual = world.client().replay().status;
        if actual == expected {
            Ok(())
        } else {
            Err(format!("expected replay status {expected:?}, got {actual:?}"))
        }
    })
}

/// Exactly `expected` alerts of `severity` were raised.
pub fn alert_count(severity: Severity, expected: usize) -> OracleFn {
    Box::new(move |world| {
        let actual = world.alerts(severity).len();
        if actual == expected {
            Ok(())
        } else {
            Err(format!("expected {expected} {severity:?} alerts, got {actual}"))
        }
    })
}

/// Exactly `expected` transports were opened.
pub fn transports_opened(expected: usize) -> OracleFn {
    Box::new(move |world| {
        let actual = world.opened().len();
        if actual == expected {
            Ok(())
        } else {
            Err(format!("expected {expected} transports opened, got {actual}"))
        }
    })
}

/// Chat log matches `expected`, oldest first.
pub fn chat_log(expected: Vec<&'static str>) -> OracleFn {
    Box::new(move |world| {
        let actual = world.chat_messages();
        if actual == expected {
            Ok(())
        } else {
            Err(format!("expected chat log {expected:?}, got {actual:?}"))
        }
    })
}

/// Every oracle passes. Reports the first failure.
pub fn all_of(oracles: Vec<OracleFn>) -> OracleFn {
    Box::new(move |world| oracles.iter().try_for_each(|oracle| oracle(world)))
}
