//! Text rendering of notifications.

use std::time::{SystemTime, UNIX_EPOCH};

use moonwatch_client::{
    Alert, ChatEntry, ChatKind, ChatPayload, GameStateSnapshot, Notification, ReplaySession,
    Severity,
};
use moonwatch_core::{ConnectionState, ConnectionStatus};

/// Render a notification as one line of text.
pub fn render(notification: &Notification) -> String {
    match notification {
        Notification::Connection(status) => connection(status),
        Notification::ObserverAssigned(session) => {
            format!("[observer] assigned {}", session.observer_id)
        },
        Notification::GameState(snapshot) => game_state(snapshot),
        Notification::Chat(entry) => chat(entry),
        Notification::GameOver { victory_condition } => {
            format!("=== Game over: {victory_condition} ===")
        },
        Notification::Replay(session) => replay(session),
        Notification::SpeedSelected { speed } => format!("[replay] speed {speed}x selected"),
        Notification::Alert(alert) => alert_line(alert),
    }
}

fn connection(status: &ConnectionStatus) -> String {
    let label = match status.state {
        ConnectionState::Disconnected => "Disconnected".to_owned(),
        ConnectionState::Connecting => "Connecting".to_owned(),
        ConnectionState::Connected => "Connected".to_owned(),
        ConnectionState::Reconnecting => {
            format!("Reconnecting (attempt {}/{})", status.attempt, status.max_attempts)
        },
        ConnectionState::Failed => "Failed".to_owned(),
    };

    match &status.error {
        Some(error) => format!("[connection] {label}: {error}"),
        None => format!("[connection] {label}"),
    }
}

fn game_state(snapshot: &GameStateSnapshot) -> String {
    let title = snapshot.title.as_deref().map(|title| format!("{title}, ")).unwrap_or_default();
    let phase = if snapshot.phase.is_empty() { "-" } else { snapshot.phase.as_str() };

    format!(
        "[game] {title}round {}, phase {phase}, {} alive, {} dead, {} events, {} observers",
        snapshot.round,
        snapshot.alive_count,
        snapshot.dead_count,
        snapshot.total_events,
        snapshot.observer_count,
    )
}

fn chat(entry: &ChatEntry) -> String {
    let at = clock(entry.received_at);

    match (&entry.kind, &entry.payload) {
        (ChatKind::Private, ChatPayload::Speech { speaker_id, role, message }) => {
            format!("{at} (private) {speaker_id} [{role}]: {message}")
        },
        (_, ChatPayload::Speech { speaker_id, role, message }) => {
            format!("{at} {speaker_id} [{role}]: {message}")
        },
        (_, ChatPayload::System { message }) => format!("{at} * {message}"),
    }
}

fn replay(session: &ReplaySession) -> String {
    let mode = if session.replay_mode { "replay mode" } else { "live" };
    format!(
        "[replay] {:?} {}/{} at {}x ({mode})",
        session.status, session.current_sequence, session.total_sequence, session.speed,
    )
}

fn alert_line(alert: &Alert) -> String {
    let marker = match alert.severity {
        Severity::Fatal => "!!",
        Severity::Warning => "!",
    };
    format!("{marker} {}: {}", alert.title, alert.message)
}

/// `HH:MM:SS` in UTC.
fn clock(at: SystemTime) -> String {
    let secs = at.duration_since(UNIX_EPOCH).map(|elapsed| elapsed.as_secs()).unwrap_or(0);
    let day = secs % 86_400;
    format!("{:02}:{:02}:{:02}", day / 3600, day % 3600 / 60, day % 60)
}
