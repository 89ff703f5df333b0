//! Observer-owned game state.
//!
//! The client exclusively owns the observer session, the game snapshot and
//! the chat log. The presentation layer only receives clones through
//! [`crate::Notification`]s.

use std::time::SystemTime;

use moonwatch_proto::{GameStateUpdate, PlayerRef, PlayerStatusData};

/// Observer identity bound by the server's greeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserverSession {
    /// Server-assigned observer id
    pub observer_id: String,
    /// When the id was bound
    pub assigned_at: SystemTime,
}

/// The observer's copy of the game state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameStateSnapshot {
    /// Current round
    pub round: u32,
    /// Round title from the last `title` event
    pub title: Option<String>,
    /// Current phase label
    pub phase: String,
    /// Players still alive, in server order
    pub alive_players: Vec<PlayerRef>,
    /// Eliminated players, in server order
    pub dead_players: Vec<PlayerRef>,
    /// Alive count
    pub alive_count: usize,
    /// Dead count
    pub dead_count: usize,
    /// Events recorded so far
    pub total_events: u64,
    /// Observers currently connected
    pub observer_count: u64,
}

impl GameStateSnapshot {
    /// Shallow field-wise overwrite. Absent fields are left untouched.
    ///
    /// Membership lists are replaced wholesale and their counts follow the
    /// new lists.
    pub fn apply_update(&mut self, update: GameStateUpdate) {
        let GameStateUpdate {
            round,
            phase,
            alive_players,
            dead_players,
            total_events,
            observer_count,
        } = update;

        if let Some(round) = round {
            self.round = round;
        }
        if let Some(phase) = phase {
            self.phase = phase;
        }
        if let Some(alive) = alive_players {
            self.alive_count = alive.len();
            self.alive_players = alive;
        }
        if let Some(dead) = dead_players {
            self.dead_count = dead.len();
            self.dead_players = dead;
        }
        if let Some(total_events) = total_events {
            self.total_events = total_events;
        }
        if let Some(observer_count) = observer_count {
            self.observer_count = observer_count;
        }
    }

    /// Replace membership with the server's authoritative lists.
    ///
    /// Counts come from the server when it sends them, otherwise from the
    /// list lengths.
    pub fn apply_player_status(&mut self, status: PlayerStatusData) {
        self.alive_count = status.total_alive.unwrap_or(status.alive_players.len());
        self.dead_count = status.total_dead.unwrap_or(status.dead_players.len());
        self.alive_players = status.alive_players;
        self.dead_players = status.dead_players;
    }
}

/// Which channel a chat entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatKind {
    /// Public speech
    Public,
    /// Faction-private speech
    Private,
    /// Narration and formatted game outcomes
    System,
}

/// Body of a chat entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatPayload {
    /// A player spoke
    Speech {
        /// Speaking player
        speaker_id: String,
        /// Speaker's role
        role: String,
        /// Spoken text
        message: String,
    },
    /// Message without a speaker
    System {
        /// Message text
        message: String,
    },
}

/// One entry in the chat log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    /// When the envelope carrying it was received
    pub received_at: SystemTime,
    /// Channel
    pub kind: ChatKind,
    /// Content
    pub payload: ChatPayload,
}

impl ChatEntry {
    /// Text of the entry regardless of kind.
    pub fn message(&self) -> &str {
        match &self.payload {
            ChatPayload::Speech { message, .. } | ChatPayload::System { message } => message,
        }
    }
}

/// Append-only chat log. Order of entries is order of receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatLog {
    entries: Vec<ChatEntry>,
}

impl ChatLog {
    /// Append an entry.
    pub fn push(&mut self, entry: ChatEntry) {
        self.entries.push(entry);
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything the message router mutates.
#[derive(Debug, Clone, Default)]
pub struct GameView {
    pub(crate) session: Option<ObserverSession>,
    pub(crate) snapshot: GameStateSnapshot,
    pub(crate) chat: ChatLog,
    pub(crate) victory: Option<String>,
}

impl GameView {
    /// Bound observer session, if any.
    pub fn session(&self) -> Option<&ObserverSession> {
        self.session.as_ref()
    }

    /// Current game snapshot.
    pub fn snapshot(&self) -> &GameStateSnapshot {
        &self.snapshot
    }

    /// Chat log.
    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    /// Victory condition, once the game has ended.
    pub fn victory(&self) -> Option<&str> {
        self.victory.as_deref()
    }
}
