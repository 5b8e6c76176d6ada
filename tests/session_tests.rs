//! Integration tests for the board session.
//!
//! These drive `BoardSession` the way a GTP controller would and check that
//! board, history, komi and ko state stay consistent.

use std::cell::{Cell, RefCell};
use std::io::Write;
use std::rc::Rc;

use gtp_board::board::{Board, Color, Point};
use gtp_board::generator::{GameState, Move, MoveGenerator, MoveGeneratorResult};
use gtp_board::session::{BoardSession, SessionConfig, SessionError};
use gtp_board::vertex::parse_vertex;

// =============================================================================
// Helper functions
// =============================================================================

fn passer() -> Box<dyn MoveGenerator> {
    Box::new(|_: &GameState<'_>, _: Color| MoveGeneratorResult::pass())
}

fn session(sizes: &[usize]) -> BoardSession {
    BoardSession::with_config(passer(), SessionConfig::new(sizes.iter().copied()).unwrap())
}

fn pt(vertex: &str, size: usize) -> Point {
    parse_vertex(vertex, size).unwrap().unwrap()
}

/// Play alternating moves, black first. "pass" passes.
fn play_all(session: &mut BoardSession, vertices: &[&str]) {
    let size = session.board_size();
    for (i, vertex) in vertices.iter().enumerate() {
        let color = if i % 2 == 0 { Color::Black } else { Color::White };
        let point = parse_vertex(vertex, size).unwrap();
        session.play(color, point).unwrap();
    }
}

/// Replay a history on an empty board.
fn replay(size: usize, history: &[Move]) -> Board {
    let mut board = Board::new(size);
    for &(color, point) in history {
        if let Some((row, col)) = point {
            board.play(row, col, color).unwrap();
        }
    }
    board
}

/// What the generator was shown: colour, ko point, regression flag, clock.
type Seen = Rc<RefCell<Vec<(Color, Option<Point>, bool, Option<i64>, Option<i64>)>>>;

/// A generator that replays a fixed script and records what it was shown.
struct Scripted {
    replies: Vec<MoveGeneratorResult>,
    seen: Seen,
}

impl MoveGenerator for Scripted {
    fn generate(&mut self, state: &GameState<'_>, color: Color) -> MoveGeneratorResult {
        self.seen.borrow_mut().push((
            color,
            state.ko_point,
            state.for_regression,
            state.time_remaining,
            state.canadian_stones_remaining,
        ));
        if self.replies.is_empty() {
            MoveGeneratorResult::pass()
        } else {
            self.replies.remove(0)
        }
    }
}

fn scripted(size: usize, replies: Vec<MoveGeneratorResult>) -> (BoardSession, Seen) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let generator = Scripted {
        replies,
        seen: seen.clone(),
    };
    let config = SessionConfig::new([size]).unwrap();
    (BoardSession::with_config(Box::new(generator), config), seen)
}

/// Moves leading to a ko: black captures at C2, banning B2 for white.
const KO_MOVES: &[&str] = &["B1", "C1", "A2", "D2", "B3", "C3", "pass", "B2", "C2"];

fn write_sgf(contents: impl AsRef<[u8]>) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_ref()).unwrap();
    file.flush().unwrap();
    file
}

// =============================================================================
// Replay invariant and undo
// =============================================================================

#[test]
fn test_board_matches_history_replay() {
    let mut s = session(&[9]);
    play_all(&mut s, KO_MOVES);
    play_all(&mut s, &["J9", "pass", "A9"]);
    assert_eq!(&replay(9, s.move_history()), s.board());
}

#[test]
fn test_undo_restores_previous_state() {
    let mut reference = session(&[9]);
    play_all(&mut reference, &KO_MOVES[..KO_MOVES.len() - 1]);

    let mut s = session(&[9]);
    play_all(&mut s, KO_MOVES);
    assert!(s.ko_ban().is_some());
    s.undo().unwrap();

    assert_eq!(s.board(), reference.board());
    assert_eq!(s.move_history(), reference.move_history());
    assert_eq!(s.ko_ban().map(|(p, _)| p), reference.ko_ban().map(|(p, _)| p));
}

#[test]
fn test_undo_recomputes_ko() {
    let mut s = session(&[9]);
    play_all(&mut s, KO_MOVES);
    s.play(Color::White, Some(pt("J9", 9))).unwrap();
    assert_eq!(s.ko_ban().map(|(p, _)| p), None);
    s.undo().unwrap();
    assert_eq!(s.ko_ban(), Some((pt("B2", 9), Color::White)));
}

#[test]
fn test_undo_after_trailing_pass_keeps_ko_clear() {
    let mut s = session(&[9]);
    play_all(&mut s, KO_MOVES);
    s.play(Color::White, None).unwrap();
    s.play(Color::Black, None).unwrap();
    s.undo().unwrap();
    assert_eq!(s.ko_ban().map(|(p, _)| p), None);
}

#[test]
fn test_undo_handicap_stone() {
    let mut s = session(&[9]);
    s.fixed_handicap(2).unwrap();
    s.undo().unwrap();
    assert_eq!(s.move_history().len(), 1);
    assert_eq!(s.board().get(2, 2), Some(Color::Black));
    assert_eq!(s.board().get(6, 6), None);
}

#[test]
fn test_scenario_play_showboard_undo() {
    let mut s = BoardSession::new(passer());
    s.play(Color::Black, Some(pt("C3", 19))).unwrap();
    s.play(Color::White, Some(pt("C4", 19))).unwrap();

    let board = s.showboard();
    let lines: Vec<&str> = board.lines().collect();
    // lines[0] is empty, then rows 19..1, then the footer.
    assert_eq!(lines.len(), 21);
    assert_eq!(lines[20 - 4], " 4 . . o . . . . . . . . . . . . . . . .");
    assert_eq!(lines[20 - 3], " 3 . . # . . . . . . . . . . . . . . . .");
    assert_eq!(board.matches('#').count(), 1);
    assert_eq!(board.matches('o').count(), 1);

    s.undo().unwrap();
    s.undo().unwrap();
    assert!(s.board().is_empty());
    assert!(s.move_history().is_empty());
    assert_eq!(s.undo(), Err(SessionError::NoHistory));
}

// =============================================================================
// Komi
// =============================================================================

#[test]
fn test_komi_floor_and_clamp() {
    let mut s = session(&[19]);
    for (requested, expected) in [
        (0.0, 0),
        (6.5, 6),
        (-6.5, -7),
        (624.99, 624),
        (625.5, 625),
        (1e10, 625),
        (-1e10, -625),
        (f64::INFINITY, 625),
        (f64::NEG_INFINITY, -625),
    ] {
        s.set_komi(requested);
        assert_eq!(s.komi(), expected, "komi {requested}");
    }
}

// =============================================================================
// Ko
// =============================================================================

#[test]
fn test_ko_banned_only_for_opponent() {
    let (mut s, seen) = scripted(9, vec![]);
    play_all(&mut s, KO_MOVES);
    s.reg_genmove(Color::White).unwrap();
    s.reg_genmove(Color::Black).unwrap();
    let seen = seen.borrow();
    assert_eq!(seen[0].1, Some(pt("B2", 9)));
    assert_eq!(seen[1].1, None);
}

#[test]
fn test_ko_cleared_by_pass() {
    let mut s = session(&[9]);
    play_all(&mut s, KO_MOVES);
    s.play(Color::White, None).unwrap();
    assert_eq!(s.ko_ban().map(|(p, _)| p), None);
}

#[test]
fn test_non_capturing_play_has_no_ko() {
    let mut s = session(&[9]);
    play_all(&mut s, &["E5", "D5"]);
    assert_eq!(s.ko_ban().map(|(p, _)| p), None);
}

// =============================================================================
// Handicap
// =============================================================================

#[test]
fn test_fixed_handicap_four() {
    let mut s = session(&[9]);
    assert_eq!(s.fixed_handicap(4).unwrap(), "C3 G7 C7 G3");
    let stones: Vec<_> = s.board().occupied_points();
    assert_eq!(stones.len(), 4);
    for vertex in ["C3", "G7", "C7", "G3"] {
        let (row, col) = pt(vertex, 9);
        assert_eq!(s.board().get(row, col), Some(Color::Black));
    }
    assert!(s.move_history().iter().all(|&(c, _)| c == Color::Black));
    assert_eq!(s.ko_ban().map(|(p, _)| p), None);
}

#[test]
fn test_fixed_handicap_seven_layout() {
    let mut s = session(&[9]);
    assert_eq!(s.fixed_handicap(7).unwrap(), "C3 G7 C7 G3 C5 G5 E5");
    assert_eq!(s.fixed_handicap(2), Err(SessionError::InvalidArgument("board not empty".into())));
}

#[test]
fn test_place_free_handicap_calls_generator_n_times() {
    let (mut s, seen) = scripted(
        9,
        vec![
            MoveGeneratorResult::play((2, 2)),
            MoveGeneratorResult::resign(),
            MoveGeneratorResult::pass(),
        ],
    );
    assert_eq!(s.place_free_handicap(3).unwrap(), "C3");
    assert_eq!(seen.borrow().len(), 3);
    assert_eq!(s.move_history(), &[(Color::Black, Some((2, 2)))]);
    assert!(seen.borrow().iter().all(|e| e.0 == Color::Black && e.1.is_none() && !e.2));
}

#[test]
fn test_place_free_handicap_needs_empty_board() {
    let mut s = session(&[9]);
    s.play(Color::White, Some((0, 0))).unwrap();
    assert!(s.place_free_handicap(2).is_err());
}

#[test]
fn test_place_free_handicap_illegal_generator_move() {
    let (mut s, _) = scripted(
        9,
        vec![MoveGeneratorResult::play((2, 2)), MoveGeneratorResult::play((2, 2))],
    );
    assert_eq!(
        s.place_free_handicap(2),
        Err(SessionError::EngineError("tried to play C3".into()))
    );
}

// =============================================================================
// Move generation
// =============================================================================

#[test]
fn test_reg_genmove_never_mutates() {
    for reply in [
        MoveGeneratorResult::play((4, 4)),
        MoveGeneratorResult::pass(),
        MoveGeneratorResult::resign(),
    ] {
        let (mut s, seen) = scripted(9, vec![reply]);
        play_all(&mut s, &["C3"]);
        let board_before = s.board().clone();
        let history_before = s.move_history().to_vec();
        s.reg_genmove(Color::White).unwrap();
        assert_eq!(s.board(), &board_before);
        assert_eq!(s.move_history(), history_before.as_slice());
        assert!(seen.borrow()[0].2);
    }
}

#[test]
fn test_reg_genmove_reports_occupied_point_without_error() {
    let (mut s, _) = scripted(9, vec![MoveGeneratorResult::play((2, 2))]);
    play_all(&mut s, &["C3"]);
    assert_eq!(s.reg_genmove(Color::White), Ok("C3".into()));
}

#[test]
fn test_genmove_outcomes() {
    let (mut s, _) = scripted(
        9,
        vec![
            MoveGeneratorResult::play((4, 4)),
            MoveGeneratorResult::pass(),
            MoveGeneratorResult::resign(),
        ],
    );
    assert_eq!(s.genmove(Color::Black), Ok("E5".into()));
    assert_eq!(s.genmove(Color::White), Ok("pass".into()));
    assert_eq!(s.genmove(Color::Black), Ok("resign".into()));
    assert_eq!(
        s.move_history(),
        &[(Color::Black, Some((4, 4))), (Color::White, None)]
    );
}

#[test]
fn test_genmove_claim() {
    let (mut s, _) = scripted(
        9,
        vec![
            MoveGeneratorResult::play((4, 4)).with_claim(),
            MoveGeneratorResult::play((4, 4)).with_claim(),
        ],
    );
    assert_eq!(s.genmove_claim(Color::Black), Ok("claim".into()));
    assert!(s.move_history().is_empty());
    // Plain genmove ignores the claim flag.
    assert_eq!(s.genmove(Color::Black), Ok("E5".into()));
    assert_eq!(s.move_history().len(), 1);
}

#[test]
fn test_genmove_illegal_is_engine_error() {
    let (mut s, _) = scripted(9, vec![MoveGeneratorResult::play((2, 2))]);
    play_all(&mut s, &["C3"]);
    let err = s.genmove(Color::White).unwrap_err();
    assert_eq!(err, SessionError::EngineError("tried to play C3".into()));
    assert_eq!(s.move_history().len(), 1);
}

#[test]
fn test_generator_off_board_point_is_engine_error() {
    let off_board = || MoveGeneratorResult::play((0, 30));
    let expected = Err(SessionError::EngineError("tried to play off-board point (0, 30)".into()));

    let (mut s, _) = scripted(9, vec![off_board()]);
    assert_eq!(s.genmove(Color::Black), expected);
    assert!(s.board().is_empty());

    let (mut s, _) = scripted(9, vec![off_board()]);
    assert_eq!(s.reg_genmove(Color::Black), expected);

    let (mut s, _) = scripted(9, vec![MoveGeneratorResult::play((9, 0))]);
    assert_eq!(
        s.genmove_claim(Color::White),
        Err(SessionError::EngineError("tried to play off-board point (9, 0)".into()))
    );

    let (mut s, _) = scripted(9, vec![MoveGeneratorResult::play((2, 2)), off_board()]);
    assert_eq!(s.place_free_handicap(3), expected);
    assert_eq!(s.move_history(), &[(Color::Black, Some((2, 2)))]);
}

#[test]
fn test_genmove_passes_time_status() {
    let (mut s, seen) = scripted(9, vec![]);
    s.time_left(Color::Black, 120, 0);
    s.time_left(Color::White, 30, 4);
    s.genmove(Color::Black).unwrap();
    s.genmove(Color::White).unwrap();
    let seen = seen.borrow();
    assert_eq!((seen[0].3, seen[0].4), (Some(120), None));
    assert_eq!((seen[1].3, seen[1].4), (Some(30), Some(4)));
}

#[test]
fn test_genmove_snapshot_contents() {
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let generator = move |state: &GameState<'_>, _: Color| {
        counter.set(counter.get() + 1);
        assert_eq!(state.size, 9);
        assert_eq!(state.komi, 6);
        assert_eq!(state.move_history.len(), 1);
        assert_eq!(state.board.get(2, 2), Some(Color::Black));
        MoveGeneratorResult::pass()
    };
    let mut s = BoardSession::with_config(Box::new(generator), SessionConfig::new([9]).unwrap());
    s.set_komi(6.5);
    s.play(Color::Black, Some((2, 2))).unwrap();
    s.genmove(Color::White).unwrap();
    assert_eq!(calls.get(), 1);
}

// =============================================================================
// loadsgf
// =============================================================================

#[test]
fn test_loadsgf_full_game() {
    let file = write_sgf("(;FF[4]SZ[9]KM[5.5];B[cg];W[gc];B[];W[ee])");
    let mut s = session(&[9, 19]);
    s.load_sgf(file.path(), None).unwrap();
    assert_eq!(s.board_size(), 9);
    assert_eq!(s.komi(), 5);
    assert_eq!(
        s.move_history(),
        &[
            (Color::Black, Some((2, 2))),
            (Color::White, Some((6, 6))),
            (Color::Black, None),
            (Color::White, Some((4, 4))),
        ]
    );
    assert_eq!(&replay(9, s.move_history()), s.board());
}

#[test]
fn test_loadsgf_move_limit_skips_non_move_nodes() {
    let file = write_sgf("(;SZ[9];C[comment];B[cg];C[more];W[gc];B[ee])");
    let mut s = session(&[9]);
    s.load_sgf(file.path(), Some(2)).unwrap();
    assert_eq!(s.move_history().len(), 2);
    assert_eq!(s.board().get(4, 4), None);
    assert_eq!(s.komi(), 0);
}

#[test]
fn test_loadsgf_setup_stones_unsupported() {
    let file = write_sgf("(;SZ[9]KM[7.5]AB[cc][gg];W[ee])");
    let mut s = session(&[9, 19]);
    s.set_board_size(19).unwrap();
    s.set_komi(3.0);
    play_all(&mut s, &["D4", "Q16"]);
    let board_before = s.board().clone();
    let history_before = s.move_history().to_vec();

    let err = s.load_sgf(file.path(), None).unwrap_err();
    assert!(matches!(err, SessionError::UnsupportedFeature(_)));
    assert_eq!(s.board_size(), 19);
    assert_eq!(s.board(), &board_before);
    assert_eq!(s.move_history(), history_before.as_slice());
    assert_eq!(s.komi(), 3);
}

#[test]
fn test_loadsgf_unacceptable_size() {
    let file = write_sgf("(;SZ[13];B[cc])");
    let mut s = session(&[9, 19]);
    assert_eq!(s.load_sgf(file.path(), None), Err(SessionError::UnacceptableSize(13)));
}

#[test]
fn test_loadsgf_bad_move_rolls_back() {
    let file = write_sgf("(;SZ[9];B[ee];W[ee])");
    let mut s = session(&[9, 19]);
    s.set_board_size(19).unwrap();
    play_all(&mut s, &["D4", "pass", "Q16"]);
    let board_before = s.board().clone();
    let history_before = s.move_history().to_vec();

    assert_eq!(s.load_sgf(file.path(), None), Err(SessionError::BadMoveInFile));
    assert_eq!(s.board_size(), 19);
    assert_eq!(s.board(), &board_before);
    assert_eq!(s.move_history(), history_before.as_slice());
}

#[test]
fn test_loadsgf_bad_move_keeps_komi_and_ko() {
    let file = write_sgf("(;SZ[19]KM[6.5];B[dd];W[pp];B[dd])");
    let mut s = session(&[9, 19]);
    s.set_komi(3.5);
    play_all(&mut s, KO_MOVES);
    let ko_before = s.ko_ban();
    assert_eq!(ko_before, Some((pt("B2", 9), Color::White)));

    assert_eq!(s.load_sgf(file.path(), None), Err(SessionError::BadMoveInFile));
    assert_eq!(s.board_size(), 9);
    assert_eq!(s.komi(), 3);
    assert_eq!(s.ko_ban(), ko_before);
    assert_eq!(&replay(9, s.move_history()), s.board());
}

#[test]
fn test_loadsgf_deeply_nested_file() {
    let mut contents = "(;SZ[9]".to_string();
    contents.push_str(&"(;B[ee]".repeat(100_000));
    contents.push_str(&")".repeat(100_001));
    let file = write_sgf(contents);
    let mut s = session(&[9]);
    play_all(&mut s, &["C3"]);
    assert_eq!(
        s.load_sgf(file.path(), None),
        Err(SessionError::CannotLoad("cannot load file".into()))
    );
    assert_eq!(s.move_history().len(), 1);
}

#[test]
fn test_loadsgf_latin1_file() {
    let file = write_sgf(b"(;SZ[9]CA[ISO-8859-1]PB[Jos\xe9]KM[0.5];B[ee];W[cc])");
    let mut s = session(&[9]);
    assert_eq!(s.load_sgf(file.path(), None), Ok(()));
    assert_eq!(
        s.move_history(),
        &[(Color::Black, Some(pt("E5", 9))), (Color::White, Some(pt("C3", 9)))]
    );
}

#[test]
fn test_loadsgf_cannot_load() {
    let mut s = session(&[19]);
    let missing = std::env::temp_dir().join("gtp-board-no-such-file.sgf");
    assert_eq!(
        s.load_sgf(&missing, None),
        Err(SessionError::CannotLoad("cannot load file".into()))
    );
    let garbage = write_sgf("this is not sgf");
    assert_eq!(
        s.load_sgf(garbage.path(), None),
        Err(SessionError::CannotLoad("cannot load file".into()))
    );
    let bad_komi = write_sgf("(;KM[lots])");
    assert_eq!(
        s.load_sgf(bad_komi.path(), None),
        Err(SessionError::CannotLoad("bad komi".into()))
    );
}
