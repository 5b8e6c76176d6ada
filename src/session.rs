//! Stateful GTP board for a stateless move generator.
//!
//! A [`BoardSession`] tracks everything the protocol peer can see: board
//! size, board configuration, move history, komi, the simple ko ban and the
//! clocks. The move generator only ever sees a [`GameState`] snapshot built
//! for a single call.
//!
//! Komi is tracked as an integer (treat as +.5 for scoring jigo).
//!
//! The session enforces no ko rule and permits self-capture. If the
//! generator returns an occupied point, the session reports an engine error.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ascii::render_board;
use crate::board::{Board, BoardError, Color, Point};
use crate::constants::{
    DEFAULT_BOARD_SIZE, GLYPH_BLACK, GLYPH_EMPTY, GLYPH_UNKNOWN, GLYPH_WHITE, HANDICAP_9X9,
    HANDICAP_BOARD_SIZE, MAX_BOARD_SIZE, MAX_HANDICAP, MAX_KOMI, MIN_BOARD_SIZE, MIN_HANDICAP,
};
use crate::generator::{GameState, GeneratedMove, Move, MoveGenerator};
use crate::sgf::{GameRecord, parse_sgf};
use crate::vertex::{format_vertex, parse_vertex};

// =============================================================================
// Errors
// =============================================================================

/// Why a session command was rejected.
///
/// Every variant except [`SessionError::CorruptHistory`] leaves the session
/// state as it was before the command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("unacceptable size")]
    UnacceptableSize(usize),
    #[error("illegal move")]
    IllegalMove,
    #[error("engine error: {0}")]
    EngineError(String),
    #[error("cannot undo")]
    NoHistory,
    #[error("{0}")]
    CorruptHistory(String),
    #[error("{0}")]
    CannotLoad(String),
    #[error("{0}")]
    UnsupportedFeature(String),
    #[error("bad move in file")]
    BadMoveInFile,
}

impl SessionError {
    /// True if the session state is undefined after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::CorruptHistory(_))
    }
}

// =============================================================================
// Configuration and clocks
// =============================================================================

/// Board sizes a session accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    acceptable_sizes: BTreeSet<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            acceptable_sizes: BTreeSet::from([DEFAULT_BOARD_SIZE]),
        }
    }
}

impl SessionConfig {
    /// Build a config from a list of acceptable sizes.
    ///
    /// The list must be non-empty and every size must be between 1 and 25.
    pub fn new(sizes: impl IntoIterator<Item = usize>) -> Result<Self, SessionError> {
        let acceptable_sizes: BTreeSet<usize> = sizes.into_iter().collect();
        if acceptable_sizes.is_empty() {
            return Err(SessionError::InvalidArgument("no acceptable board sizes".into()));
        }
        if let Some(bad) = acceptable_sizes
            .iter()
            .find(|&&s| !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&s))
        {
            return Err(SessionError::UnacceptableSize(*bad));
        }
        Ok(Self { acceptable_sizes })
    }

    pub fn acceptable_sizes(&self) -> &BTreeSet<usize> {
        &self.acceptable_sizes
    }

    pub fn accepts(&self, size: usize) -> bool {
        self.acceptable_sizes.contains(&size)
    }

    /// The size a new session starts with: the smallest acceptable one.
    pub fn initial_size(&self) -> usize {
        self.acceptable_sizes
            .first()
            .copied()
            .unwrap_or(DEFAULT_BOARD_SIZE)
    }
}

/// Clock status for one colour, as last reported by `time_left`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeStatus {
    pub time_remaining: Option<i64>,
    /// `None` while in main time.
    pub canadian_stones_remaining: Option<i64>,
}

// =============================================================================
// Komi
// =============================================================================

/// Floor `f` and clamp it to `[-MAX_KOMI, MAX_KOMI]`.
///
/// Infinite values clamp by sign. NaN floors to zero.
pub fn clamp_komi(f: f64) -> i32 {
    let floored = f.floor();
    if floored.is_nan() {
        return 0;
    }
    floored.clamp(-f64::from(MAX_KOMI), f64::from(MAX_KOMI)) as i32
}

// =============================================================================
// Session
// =============================================================================

pub struct BoardSession {
    config: SessionConfig,
    board_size: usize,
    board: Board,
    move_history: Vec<Move>,
    komi: i32,
    simple_ko_point: Option<Point>,
    /// Player that any `simple_ko_point` is banned for.
    simple_ko_player: Option<Color>,
    black_time: TimeStatus,
    white_time: TimeStatus,
    move_generator: Box<dyn MoveGenerator>,
}

impl BoardSession {
    /// Create a session accepting only 19x19.
    pub fn new(move_generator: Box<dyn MoveGenerator>) -> Self {
        Self::with_config(move_generator, SessionConfig::default())
    }

    pub fn with_config(move_generator: Box<dyn MoveGenerator>, config: SessionConfig) -> Self {
        let board_size = config.initial_size();
        Self {
            config,
            board_size,
            board: Board::new(board_size),
            move_history: Vec::new(),
            komi: 0,
            simple_ko_point: None,
            simple_ko_player: None,
            black_time: TimeStatus::default(),
            white_time: TimeStatus::default(),
            move_generator,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn board_size(&self) -> usize {
        self.board_size
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn move_history(&self) -> &[Move] {
        &self.move_history
    }

    pub fn komi(&self) -> i32 {
        self.komi
    }

    /// The simple ko ban, as (forbidden point, colour it is forbidden for).
    pub fn ko_ban(&self) -> Option<(Point, Color)> {
        self.simple_ko_point.zip(self.simple_ko_player)
    }

    pub fn time_status(&self, color: Color) -> TimeStatus {
        match color {
            Color::Black => self.black_time,
            Color::White => self.white_time,
        }
    }

    // -------------------------------------------------------------------------
    // State transitions
    // -------------------------------------------------------------------------

    fn reset(&mut self) {
        self.board = Board::new(self.board_size);
        self.simple_ko_point = None;
        self.simple_ko_player = None;
        self.move_history.clear();
    }

    /// Rebuild the board by replaying `moves` on an empty board.
    ///
    /// The ko ban is recomputed exactly as incremental play would leave it.
    /// On failure the board holds whatever the replay produced so far.
    fn reset_to_moves(&mut self, moves: &[Move]) -> Result<(), BoardError> {
        self.board = Board::new(self.board_size);
        self.simple_ko_point = None;
        self.simple_ko_player = None;
        for &(color, point) in moves {
            match point {
                None => self.simple_ko_point = None,
                Some((row, col)) => {
                    self.simple_ko_point = self.board.play(row, col, color)?;
                    self.simple_ko_player = Some(color.opponent());
                }
            }
        }
        Ok(())
    }

    /// Play a stone and record it, updating the ko ban.
    fn play_and_record(&mut self, color: Color, point: Point) -> Result<(), BoardError> {
        let (row, col) = point;
        self.simple_ko_point = self.board.play(row, col, color)?;
        self.simple_ko_player = Some(color.opponent());
        self.move_history.push((color, Some(point)));
        Ok(())
    }

    fn record_pass(&mut self, color: Color) {
        self.simple_ko_point = None;
        self.move_history.push((color, None));
    }

    // -------------------------------------------------------------------------
    // Handlers
    // -------------------------------------------------------------------------

    /// `boardsize`: change size and clear the board.
    pub fn set_board_size(&mut self, size: usize) -> Result<(), SessionError> {
        if !self.config.accepts(size) {
            return Err(SessionError::UnacceptableSize(size));
        }
        self.board_size = size;
        self.reset();
        debug!(size, "board size set");
        Ok(())
    }

    /// `clear_board`
    pub fn clear_board(&mut self) {
        self.reset();
        debug!("board cleared");
    }

    /// `komi`
    pub fn set_komi(&mut self, f: f64) {
        self.komi = clamp_komi(f);
        debug!(requested = f, komi = self.komi, "komi set");
    }

    /// `fixed_handicap`: place a standard 9x9 handicap on an empty board.
    ///
    /// Returns the placed vertices.
    pub fn fixed_handicap(&mut self, stones: usize) -> Result<String, SessionError> {
        if self.board_size != HANDICAP_BOARD_SIZE {
            return Err(SessionError::InvalidArgument(
                "handicap not supported on this size board".into(),
            ));
        }
        if !(MIN_HANDICAP..=MAX_HANDICAP).contains(&stones) {
            return Err(SessionError::InvalidArgument("invalid number of stones".into()));
        }
        if !self.board.is_empty() {
            return Err(SessionError::InvalidArgument("board not empty".into()));
        }
        let vertices = HANDICAP_9X9[stones - MIN_HANDICAP];
        for vertex in vertices {
            let point = parse_vertex(vertex, self.board_size)
                .ok()
                .flatten()
                .ok_or_else(|| SessionError::InvalidArgument(format!("bad handicap vertex {vertex}")))?;
            self.play_and_record(Color::Black, point)
                .map_err(|_| SessionError::EngineError(format!("{vertex} is occupied")))?;
        }
        self.simple_ko_point = None;
        debug!(stones, "fixed handicap placed");
        Ok(vertices.join(" "))
    }

    /// `set_free_handicap`: place black stones chosen by the peer.
    ///
    /// No emptiness check is made. Stones placed before an occupied vertex is
    /// reached stay on the board and in the history.
    pub fn set_free_handicap(&mut self, points: &[Point]) -> Result<(), SessionError> {
        if points.len() < 2 {
            return Err(SessionError::InvalidArgument("invalid arguments".into()));
        }
        for &point in points {
            if let Err(e) = self.play_and_record(Color::Black, point) {
                let vertex = format_vertex(Some(point));
                debug!(%vertex, error = %e, "free handicap rejected");
                return Err(SessionError::EngineError(format!("{vertex} is occupied")));
            }
        }
        self.simple_ko_point = None;
        Ok(())
    }

    /// `place_free_handicap`: let the generator choose black handicap stones.
    ///
    /// The generator is asked exactly `stones` times (one fewer if `stones`
    /// would fill all but one point). Passes and resignations are skipped,
    /// so fewer stones than requested may be placed.
    pub fn place_free_handicap(&mut self, stones: usize) -> Result<String, SessionError> {
        let max_points = self.board_size * self.board_size - 1;
        if !(2..=max_points).contains(&stones) {
            return Err(SessionError::InvalidArgument("invalid number of stones".into()));
        }
        if !self.board.is_empty() {
            return Err(SessionError::InvalidArgument("board not empty".into()));
        }
        let stones = if stones == max_points { max_points - 1 } else { stones };
        let komi = i32::try_from(self.board_size * stones / 2).unwrap_or(i32::MAX);

        let mut placed = Vec::new();
        for _ in 0..stones {
            let state = GameState {
                size: self.board_size,
                board: &self.board,
                komi,
                move_history: &self.move_history,
                ko_point: None,
                for_regression: false,
                time_remaining: None,
                canadian_stones_remaining: None,
            };
            let generated = self.move_generator.generate(&state, Color::Black);
            let GeneratedMove::Play(point) = generated.outcome else {
                continue;
            };
            let vertex = self.generated_vertex(point)?;
            if let Err(e) = self.play_and_record(Color::Black, point) {
                warn!(%vertex, error = %e, "generator chose an illegal handicap point");
                return Err(SessionError::EngineError(format!("tried to play {vertex}")));
            }
            placed.push(vertex);
        }
        self.simple_ko_point = None;
        debug!(requested = stones, placed = placed.len(), "free handicap placed");
        Ok(placed.join(" "))
    }

    /// `play`: record a peer move. `None` is a pass.
    pub fn play(&mut self, color: Color, point: Option<Point>) -> Result<(), SessionError> {
        match point {
            None => self.record_pass(color),
            Some(point) => self.play_and_record(color, point).map_err(|e| {
                debug!(vertex = %format_vertex(Some(point)), error = %e, "illegal move");
                SessionError::IllegalMove
            })?,
        }
        Ok(())
    }

    /// `genmove`
    pub fn genmove(&mut self, color: Color) -> Result<String, SessionError> {
        self.generate_move(color, false, false)
    }

    /// `kiai-genmove_claim`: like `genmove`, but may answer "claim".
    pub fn genmove_claim(&mut self, color: Color) -> Result<String, SessionError> {
        self.generate_move(color, false, true)
    }

    /// `reg_genmove`: ask for a move without changing any state.
    pub fn reg_genmove(&mut self, color: Color) -> Result<String, SessionError> {
        self.generate_move(color, true, false)
    }

    fn generate_move(
        &mut self,
        color: Color,
        for_regression: bool,
        allow_claim: bool,
    ) -> Result<String, SessionError> {
        let ko_point = match self.ko_ban() {
            Some((point, banned)) if banned == color => Some(point),
            _ => None,
        };
        let time = self.time_status(color);
        let state = GameState {
            size: self.board_size,
            board: &self.board,
            komi: self.komi,
            move_history: &self.move_history,
            ko_point,
            for_regression,
            time_remaining: time.time_remaining,
            canadian_stones_remaining: time.canadian_stones_remaining,
        };
        let generated = self.move_generator.generate(&state, color);

        if allow_claim && generated.claim {
            return Ok("claim".into());
        }
        match generated.outcome {
            GeneratedMove::Resign => Ok("resign".into()),
            GeneratedMove::Pass => {
                if !for_regression {
                    self.record_pass(color);
                }
                Ok("pass".into())
            }
            GeneratedMove::Play(point) => {
                let vertex = self.generated_vertex(point)?;
                if !for_regression {
                    if let Err(e) = self.play_and_record(color, point) {
                        warn!(%vertex, error = %e, "generator returned an illegal move");
                        return Err(SessionError::EngineError(format!("tried to play {vertex}")));
                    }
                }
                Ok(vertex)
            }
        }
    }

    /// Vertex text for a generated point, rejecting points off the board.
    fn generated_vertex(&self, point: Point) -> Result<String, SessionError> {
        let (row, col) = point;
        if !self.board.contains(row, col) {
            warn!(row, col, "generator returned an off-board point");
            return Err(SessionError::EngineError(format!(
                "tried to play off-board point ({row}, {col})"
            )));
        }
        Ok(format_vertex(Some(point)))
    }

    /// `undo`: drop the last move and replay the rest from an empty board.
    ///
    /// Handicap stones are part of the history and can be undone too.
    pub fn undo(&mut self) -> Result<(), SessionError> {
        if self.move_history.pop().is_none() {
            return Err(SessionError::NoHistory);
        }
        let history = std::mem::take(&mut self.move_history);
        let replayed = self.reset_to_moves(&history);
        self.move_history = history;
        replayed.map_err(|e| {
            warn!(error = %e, "history replay failed during undo");
            SessionError::CorruptHistory("corrupt history".into())
        })
    }

    /// `showboard`
    pub fn showboard(&self) -> String {
        let board = &self.board;
        let lines = render_board(self.board_size, |row, col| {
            if !board.contains(row, col) {
                return GLYPH_UNKNOWN;
            }
            match board.get(row, col) {
                None => GLYPH_EMPTY,
                Some(Color::Black) => GLYPH_BLACK,
                Some(Color::White) => GLYPH_WHITE,
            }
        });
        format!("\n{}\n", lines.join("\n"))
    }

    /// `loadsgf`: replace the game with the first `move_limit` moves of a
    /// saved game (all of them if `None`).
    ///
    /// Nothing changes unless the whole file is accepted.
    pub fn load_sgf(&mut self, path: impl AsRef<Path>, move_limit: Option<usize>) -> Result<(), SessionError> {
        let path = path.as_ref();
        let contents = fs::read(path).map_err(|e| {
            debug!(path = %path.display(), error = %e, "cannot read game record");
            SessionError::CannotLoad("cannot load file".into())
        })?;
        let record = parse_sgf(&contents).map_err(|e| {
            debug!(path = %path.display(), error = %e, "cannot parse game record");
            SessionError::CannotLoad("cannot load file".into())
        })?;
        let (new_size, komi, new_history) = self.extract_game(&record, move_limit)?;

        let old_size = self.board_size;
        self.board_size = new_size;
        if let Err(e) = self.reset_to_moves(&new_history) {
            debug!(error = %e, "bad move in game record");
            self.board_size = old_size;
            let old_history = std::mem::take(&mut self.move_history);
            let restored = self.reset_to_moves(&old_history);
            self.move_history = old_history;
            return match restored {
                Ok(()) => Err(SessionError::BadMoveInFile),
                Err(_) => {
                    warn!("history replay failed while restoring after a bad game record");
                    Err(SessionError::CorruptHistory(
                        "bad move in file and corrupt history".into(),
                    ))
                }
            };
        }
        self.set_komi(komi);
        info!(
            path = %path.display(),
            size = new_size,
            moves = new_history.len(),
            "game record loaded"
        );
        self.move_history = new_history;
        Ok(())
    }

    /// Validate a parsed record and pull out size, komi, and move history.
    fn extract_game(
        &self,
        record: &GameRecord,
        move_limit: Option<usize>,
    ) -> Result<(usize, f64, Vec<Move>), SessionError> {
        let size = record
            .size()
            .map_err(|_| SessionError::CannotLoad("cannot load file".into()))?;
        if !self.config.accepts(size) {
            return Err(SessionError::UnacceptableSize(size));
        }
        let komi = match record.root().get("KM") {
            None => 0.0,
            Some(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| SessionError::CannotLoad("bad komi".into()))?,
        };
        let limit = move_limit.unwrap_or(usize::MAX);
        let mut history = Vec::new();
        for node in record.nodes() {
            if history.len() >= limit {
                break;
            }
            if node.has_prop("AB") || node.has_prop("AW") {
                return Err(SessionError::UnsupportedFeature(
                    "setup stones (including handicap) not supported".into(),
                ));
            }
            let mv = node
                .get_move(size)
                .map_err(|_| SessionError::CannotLoad("cannot load file".into()))?;
            if let Some(mv) = mv {
                history.push(mv);
            }
        }
        Ok((size, komi, history))
    }

    /// `time_left`: remember the clock for one colour. Zero stones means main time.
    pub fn time_left(&mut self, color: Color, seconds: i64, stones: i64) {
        let status = TimeStatus {
            time_remaining: Some(seconds),
            canadian_stones_remaining: (stones != 0).then_some(stones),
        };
        match color {
            Color::Black => self.black_time = status,
            Color::White => self.white_time = status,
        }
    }

    /// `time_settings`: accepted and ignored.
    pub fn time_settings(&mut self) {
        debug!("time settings ignored");
    }
}
