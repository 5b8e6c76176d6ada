//! Move generator contract.
//!
//! A move generator is stateless from the session's point of view: every
//! call receives a fresh [`GameState`] snapshot and returns a
//! [`MoveGeneratorResult`]. The session owns all protocol-visible state.

use crate::board::{Board, Color, Point};

/// One entry of the move history: a colour and a point, `None` being a pass.
pub type Move = (Color, Option<Point>);

/// Data passed to a move generator.
///
/// `move_history` includes handicap stones and passes. `ko_point` is the
/// point the colour to play may not take by the simple ko rule, for
/// generators that don't want to deduce it from the history.
///
/// `for_regression` is set for `reg_genmove`; generators that care should use
/// a fixed seed. `time_remaining` is `None` when no clock information is
/// available, and `canadian_stones_remaining` is `None` during main time.
#[derive(Debug, Clone, Copy)]
pub struct GameState<'a> {
    pub size: usize,
    pub board: &'a Board,
    pub komi: i32,
    pub move_history: &'a [Move],
    pub ko_point: Option<Point>,
    pub for_regression: bool,
    pub time_remaining: Option<i64>,
    pub canadian_stones_remaining: Option<i64>,
}

/// What the generator decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedMove {
    Resign,
    Pass,
    Play(Point),
}

/// Return value from a move generator.
///
/// `claim` is only meaningful alongside a pass or a move, and is only
/// honoured by the claim variant of genmove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveGeneratorResult {
    pub outcome: GeneratedMove,
    pub claim: bool,
}

impl MoveGeneratorResult {
    pub fn resign() -> Self {
        Self {
            outcome: GeneratedMove::Resign,
            claim: false,
        }
    }

    pub fn pass() -> Self {
        Self {
            outcome: GeneratedMove::Pass,
            claim: false,
        }
    }

    pub fn play(point: Point) -> Self {
        Self {
            outcome: GeneratedMove::Play(point),
            claim: false,
        }
    }

    /// Mark this result as a win claim.
    pub fn with_claim(mut self) -> Self {
        self.claim = true;
        self
    }
}

/// Something that can choose a move for a position.
pub trait MoveGenerator {
    fn generate(&mut self, state: &GameState<'_>, color: Color) -> MoveGeneratorResult;
}

impl<F> MoveGenerator for F
where
    F: FnMut(&GameState<'_>, Color) -> MoveGeneratorResult,
{
    fn generate(&mut self, state: &GameState<'_>, color: Color) -> MoveGeneratorResult {
        self(state, color)
    }
}

// =============================================================================
// Random generator
// =============================================================================

/// Seed used for regression requests.
pub const REGRESSION_SEED: u64 = 1;

/// Plays a uniformly random empty point, avoiding the ko point and its own
/// single-point eyes. Passes when nothing is left.
pub struct RandomMoveGenerator {
    rng: fastrand::Rng,
}

impl Default for RandomMoveGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomMoveGenerator {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    fn candidates(state: &GameState<'_>, color: Color) -> Vec<Point> {
        let board = state.board;
        let mut out = Vec::with_capacity(state.size * state.size);
        for row in 0..state.size {
            for col in 0..state.size {
                if board.get(row, col).is_some() || state.ko_point == Some((row, col)) {
                    continue;
                }
                if is_eyeish(board, (row, col), color) {
                    continue;
                }
                out.push((row, col));
            }
        }
        out
    }
}

impl MoveGenerator for RandomMoveGenerator {
    fn generate(&mut self, state: &GameState<'_>, color: Color) -> MoveGeneratorResult {
        let candidates = Self::candidates(state, color);
        if candidates.is_empty() {
            return MoveGeneratorResult::pass();
        }
        let idx = if state.for_regression {
            fastrand::Rng::with_seed(REGRESSION_SEED).usize(..candidates.len())
        } else {
            self.rng.usize(..candidates.len())
        };
        MoveGeneratorResult::play(candidates[idx])
    }
}

/// True if every on-board neighbour of `point` is a stone of `color`.
///
/// This also accepts false eyes; for a random player that's good enough.
fn is_eyeish(board: &Board, point: Point, color: Color) -> bool {
    let (row, col) = point;
    board
        .neighbors(row, col)
        .all(|(nr, nc)| board.get(nr, nc) == Some(color))
}
