//! Go Text Protocol (GTP) front end for a [`BoardSession`].
//!
//! GTP is a text-based protocol for communicating with Go-playing programs.
//! This module implements the GTP version 2 framing and argument handling,
//! and forwards board commands to the session.
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `protocol_version`, `list_commands`,
//!   `known_command <cmd>`, `quit`
//! - `boardsize <size>`, `clear_board`, `komi <value>`
//! - `fixed_handicap <n>`, `set_free_handicap <vertex>...`,
//!   `place_free_handicap <n>`
//! - `play <color> <vertex>`, `genmove <color>`, `kiai-genmove_claim <color>`,
//!   `reg_genmove <color>`, `undo`, `showboard`, `loadsgf <file> [<moves>]`
//! - `time_left <color> <time> <stones>`, `time_settings ...` (optional)
//!
//! ## Example
//!
//! ```
//! use gtp_board::generator::{GameState, MoveGeneratorResult};
//! use gtp_board::gtp::GtpEngine;
//! use gtp_board::session::BoardSession;
//! use gtp_board::board::Color;
//!
//! let generator = |_: &GameState<'_>, _: Color| MoveGeneratorResult::pass();
//! let mut engine = GtpEngine::new(BoardSession::new(Box::new(generator)));
//! let mut out = Vec::new();
//! engine.run("1 genmove b\n".as_bytes(), &mut out).unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), "=1 pass\n\n");
//! ```

use std::io::{self, BufRead, Write};

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::board::{Color, Point};
use crate::session::{BoardSession, SessionError};
use crate::vertex::{VertexError, parse_color, parse_vertex};

/// Errors reported to the GTP peer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GtpError {
    #[error("invalid arguments")]
    BadArguments,
    #[error("invalid int")]
    InvalidInt,
    #[error("invalid float")]
    InvalidFloat,
    #[error("unknown command")]
    UnknownCommand,
    #[error(transparent)]
    Vertex(#[from] VertexError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Every command the engine knows.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Name,
    Version,
    ProtocolVersion,
    ListCommands,
    KnownCommand,
    Quit,
    Boardsize,
    ClearBoard,
    Komi,
    FixedHandicap,
    SetFreeHandicap,
    PlaceFreeHandicap,
    Play,
    Genmove,
    GenmoveClaim,
    RegGenmove,
    Undo,
    Showboard,
    Loadsgf,
    TimeLeft,
    TimeSettings,
}

/// Command names, in the order `list_commands` reports them.
const COMMAND_TABLE: &[(&str, Command)] = &[
    ("boardsize", Command::Boardsize),
    ("clear_board", Command::ClearBoard),
    ("fixed_handicap", Command::FixedHandicap),
    ("genmove", Command::Genmove),
    ("genmove_claim", Command::GenmoveClaim),
    ("kiai-genmove_claim", Command::GenmoveClaim),
    ("known_command", Command::KnownCommand),
    ("komi", Command::Komi),
    ("list_commands", Command::ListCommands),
    ("loadsgf", Command::Loadsgf),
    ("name", Command::Name),
    ("place_free_handicap", Command::PlaceFreeHandicap),
    ("play", Command::Play),
    ("protocol_version", Command::ProtocolVersion),
    ("quit", Command::Quit),
    ("reg_genmove", Command::RegGenmove),
    ("set_free_handicap", Command::SetFreeHandicap),
    ("showboard", Command::Showboard),
    ("time_left", Command::TimeLeft),
    ("time_settings", Command::TimeSettings),
    ("undo", Command::Undo),
    ("version", Command::Version),
];

impl Command {
    /// Look up a command by its (lowercase) GTP name.
    pub fn from_name(name: &str) -> Option<Self> {
        COMMAND_TABLE
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, c)| c)
    }

    /// Time handling commands, which engines may choose not to advertise.
    pub fn is_time_command(self) -> bool {
        matches!(self, Command::TimeLeft | Command::TimeSettings)
    }
}

// =============================================================================
// Argument interpretation
// =============================================================================

fn arg<'a>(args: &[&'a str], i: usize) -> Result<&'a str, GtpError> {
    args.get(i).copied().ok_or(GtpError::BadArguments)
}

pub fn interpret_int(s: &str) -> Result<i64, GtpError> {
    s.parse().map_err(|_| GtpError::InvalidInt)
}

/// A non-negative integer, such as a board size or stone count.
pub fn interpret_count(s: &str) -> Result<usize, GtpError> {
    s.parse().map_err(|_| GtpError::InvalidInt)
}

/// A float; infinities are allowed, NaN is not.
pub fn interpret_float(s: &str) -> Result<f64, GtpError> {
    match s.parse::<f64>() {
        Ok(f) if !f.is_nan() => Ok(f),
        _ => Err(GtpError::InvalidFloat),
    }
}

pub fn interpret_color(s: &str) -> Result<Color, GtpError> {
    Ok(parse_color(s)?)
}

pub fn interpret_vertex(s: &str, size: usize) -> Result<Option<Point>, GtpError> {
    Ok(parse_vertex(s, size)?)
}

// =============================================================================
// Engine
// =============================================================================

/// GTP engine: framing, administrative commands, and dispatch to a session.
pub struct GtpEngine {
    session: BoardSession,
    name: String,
    time_commands: bool,
}

impl GtpEngine {
    pub fn new(session: BoardSession) -> Self {
        Self {
            session,
            name: env!("CARGO_PKG_NAME").to_string(),
            time_commands: true,
        }
    }

    /// Name reported by the `name` command.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Whether to offer `time_left` and `time_settings`.
    pub fn with_time_commands(mut self, enabled: bool) -> Self {
        self.time_commands = enabled;
        self
    }

    pub fn session(&self) -> &BoardSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut BoardSession {
        &mut self.session
    }

    /// Run the GTP command loop until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            let Some((response, quit)) = self.handle_line(&line) else {
                continue;
            };
            output.write_all(response.as_bytes())?;
            output.flush()?;
            if quit {
                break;
            }
        }
        Ok(())
    }

    /// Process one input line.
    ///
    /// Returns the framed response and whether the engine should stop, or
    /// `None` if the line holds no command.
    pub fn handle_line(&mut self, line: &str) -> Option<(String, bool)> {
        let line = Self::preprocess(line);
        let (id, command_line) = Self::parse_id(&line);
        let parts: Vec<&str> = command_line.split_whitespace().collect();
        let Some((command, args)) = parts.split_first() else {
            // An id with no command still gets a reply.
            let response = Self::format_response(id, &Err(GtpError::UnknownCommand));
            return id.map(|_| (response, false));
        };
        let command = command.to_lowercase();

        trace!(%command, ?args, "gtp command");
        let result = self.execute(&command, args);
        let quit = command == "quit" && result.is_ok();
        if let Err(e) = &result {
            debug!(%command, error = %e, "gtp command failed");
        }
        Some((Self::format_response(id, &result), quit))
    }

    /// Remove comments and control characters, turning tabs into spaces.
    fn preprocess(line: &str) -> String {
        let line = line.split('#').next().unwrap_or("");
        line.chars()
            .filter_map(|c| match c {
                '\t' => Some(' '),
                c if c.is_control() => None,
                c => Some(c),
            })
            .collect()
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(trimmed.len());
        if end > 0 {
            if let Ok(id) = trimmed[..end].parse::<u32>() {
                return (Some(id), trimmed[end..].trim());
            }
        }
        (None, trimmed)
    }

    fn format_response(id: Option<u32>, result: &Result<String, GtpError>) -> String {
        let id_str = id.map(|i| i.to_string()).unwrap_or_default();
        let (prefix, message) = match result {
            Ok(payload) => ('=', payload.clone()),
            Err(e) => ('?', e.to_string()),
        };
        if message.is_empty() {
            format!("{prefix}{id_str}\n\n")
        } else {
            format!("{prefix}{id_str} {message}\n\n")
        }
    }

    fn lookup(&self, name: &str) -> Option<Command> {
        Command::from_name(name).filter(|c| self.time_commands || !c.is_time_command())
    }

    fn command_names(&self) -> Vec<&'static str> {
        COMMAND_TABLE
            .iter()
            .filter(|(_, c)| self.time_commands || !c.is_time_command())
            .map(|&(n, _)| n)
            .collect()
    }

    /// Execute a GTP command and return its payload.
    pub fn execute(&mut self, command: &str, args: &[&str]) -> Result<String, GtpError> {
        let command = self.lookup(command).ok_or(GtpError::UnknownCommand)?;
        let size = self.session.board_size();

        match command {
            Command::Name => Ok(self.name.clone()),

            Command::Version => Ok(env!("CARGO_PKG_VERSION").to_string()),

            Command::ProtocolVersion => Ok("2".to_string()),

            Command::ListCommands => Ok(self.command_names().join("\n")),

            Command::KnownCommand => {
                let name = arg(args, 0)?.to_lowercase();
                let known = self.lookup(&name).is_some();
                Ok(if known { "true" } else { "false" }.to_string())
            }

            Command::Quit => Ok(String::new()),

            Command::Boardsize => {
                let size = interpret_count(arg(args, 0)?)?;
                self.session.set_board_size(size)?;
                Ok(String::new())
            }

            Command::ClearBoard => {
                self.session.clear_board();
                Ok(String::new())
            }

            Command::Komi => {
                let komi = interpret_float(arg(args, 0)?)?;
                self.session.set_komi(komi);
                Ok(String::new())
            }

            Command::FixedHandicap => {
                let stones = interpret_count(arg(args, 0)?)?;
                Ok(self.session.fixed_handicap(stones)?)
            }

            Command::SetFreeHandicap => {
                let points = args
                    .iter()
                    .map(|v| interpret_vertex(v, size)?.ok_or(GtpError::Vertex(VertexError::InvalidVertex)))
                    .collect::<Result<Vec<_>, _>>()?;
                self.session.set_free_handicap(&points)?;
                Ok(String::new())
            }

            Command::PlaceFreeHandicap => {
                let stones = interpret_count(arg(args, 0)?)?;
                Ok(self.session.place_free_handicap(stones)?)
            }

            Command::Play => {
                let color = interpret_color(arg(args, 0)?)?;
                let point = interpret_vertex(arg(args, 1)?, size)?;
                self.session.play(color, point)?;
                Ok(String::new())
            }

            Command::Genmove | Command::GenmoveClaim | Command::RegGenmove => {
                let color = interpret_color(arg(args, 0)?)?;
                let result = match command {
                    Command::Genmove => self.session.genmove(color),
                    Command::GenmoveClaim => self.session.genmove_claim(color),
                    _ => self.session.reg_genmove(color),
                };
                if let Err(e) = &result {
                    warn!(error = %e, "move generation failed");
                }
                Ok(result?)
            }

            Command::Undo => {
                self.session.undo()?;
                Ok(String::new())
            }

            Command::Showboard => Ok(self.session.showboard()),

            Command::Loadsgf => {
                let path = arg(args, 0)?;
                let limit = args.get(1).map(|s| interpret_count(s)).transpose()?;
                self.session.load_sgf(path, limit)?;
                Ok(String::new())
            }

            Command::TimeLeft => {
                let color = interpret_color(arg(args, 0)?)?;
                let seconds = interpret_int(arg(args, 1)?)?;
                let stones = interpret_int(arg(args, 2)?)?;
                self.session.time_left(color, seconds, stones);
                Ok(String::new())
            }

            Command::TimeSettings => {
                self.session.time_settings();
                Ok(String::new())
            }
        }
    }
}
