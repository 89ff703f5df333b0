//! Command parsing for the line-oriented frontend.
//!
//! This module parses command strings into structured [`Command`] values.

use moonwatch_client::{ClientEvent, ReplayCommand};

/// Parsed command from user input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Connect to the server.
    Connect,

    /// Drop the connection and stop reconnecting.
    Disconnect,

    /// Start a replay.
    Start {
        /// Playback speed, or the configured default.
        speed: Option<f64>,
    },

    /// Pause the replay.
    Pause,

    /// Resume the replay.
    Resume,

    /// Stop the replay.
    Stop,

    /// Seek the replay.
    Jump {
        /// Target as typed; the client validates it.
        input: String,
    },

    /// Change the replay speed.
    Speed {
        /// Playback speed multiplier.
        speed: f64,
    },

    /// Print the command list.
    Help,

    /// Quit the application.
    Quit,

    /// Blank line.
    Empty,

    /// Unknown or invalid command.
    Unknown {
        /// The input as typed.
        input: String,
    },

    /// Command with missing or invalid arguments.
    InvalidArgs {
        /// Command name.
        command: String,
        /// Error message.
        error: String,
    },
}

/// One line per command, shown by `/help`.
pub const HELP: &str = "\
/connect            connect to the game server
/disconnect         disconnect
/start [speed]      start a replay
/pause              pause the replay
/resume             resume the replay
/stop               stop the replay
/jump <sequence>    seek the replay
/speed <x>          change replay speed
/quit               exit";

impl Command {
    /// Client event this command issues, if it issues one.
    pub fn into_event(self) -> Option<ClientEvent> {
        let replay = |command| Some(ClientEvent::Replay(command));

        match self {
            Self::Connect => Some(ClientEvent::Connect),
            Self::Disconnect => Some(ClientEvent::Disconnect),
            Self::Start { speed } => replay(ReplayCommand::Start { speed }),
            Self::Pause => replay(ReplayCommand::Pause),
            Self::Resume => replay(ReplayCommand::Resume),
            Self::Stop => replay(ReplayCommand::Stop),
            Self::Jump { input } => replay(ReplayCommand::Jump { input }),
            Self::Speed { speed } => replay(ReplayCommand::SetSpeed { speed }),
            Self::Help
            | Self::Quit
            | Self::Empty
            | Self::Unknown { .. }
            | Self::InvalidArgs { .. } => None,
        }
    }
}

/// Parse a user input string into a command.
///
/// Commands start with `/`. Spectators cannot chat, so anything else is
/// unknown.
pub fn parse(input: &str) -> Command {
    let input = input.trim();

    if input.is_empty() {
        return Command::Empty;
    }

    let Some(cmd_str) = input.strip_prefix('/') else {
        return Command::Unknown { input: input.to_string() };
    };

    let parts: Vec<&str> = cmd_str.split_whitespace().collect();
    let command = parts.first().copied().unwrap_or("");

    match command {
        "connect" => Command::Connect,

        "disconnect" => Command::Disconnect,

        "start" => match parts.get(1) {
            Some(speed_str) => match speed_str.parse::<f64>() {
                Ok(speed) => Command::Start { speed: Some(speed) },
                Err(_) => {
                    Command::InvalidArgs { command: "start".into(), error: "Invalid speed".into() }
                },
            },
            None => Command::Start { speed: None },
        },

        "pause" => Command::Pause,

        "resume" => Command::Resume,

        "stop" => Command::Stop,

        "jump" => match parts.get(1) {
            Some(target) => Command::Jump { input: (*target).to_string() },
            None => Command::InvalidArgs {
                command: "jump".into(),
                error: "Usage: /jump <sequence>".into(),
            },
        },

        "speed" => match parts.get(1) {
            Some(speed_str) => match speed_str.parse::<f64>() {
                Ok(speed) => Command::Speed { speed },
                Err(_) => {
                    Command::InvalidArgs { command: "speed".into(), error: "Invalid speed".into() }
                },
            },
            None => {
                Command::InvalidArgs { command: "speed".into(), error: "Usage: /speed <x>".into() }
            },
        },

        "help" | "h" => Command::Help,

        "quit" | "q" => Command::Quit,

        _ => Command::Unknown { input: input.to_string() },
    }
}
