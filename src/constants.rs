//! Constants for board geometry, komi limits, and handicap layouts.
//!
//! Everything here is plain data: the session reads these values but never
//! modifies them.

// =============================================================================
// Board Geometry
// =============================================================================

/// Board size used when no acceptable sizes are configured.
pub const DEFAULT_BOARD_SIZE: usize = 19;

/// Smallest board size the session will accept.
pub const MIN_BOARD_SIZE: usize = 1;

/// Largest board size the session will accept (limited by the column letters).
pub const MAX_BOARD_SIZE: usize = 25;

/// Column letters used by GTP vertices. 'I' is skipped to avoid confusion with 'J'.
pub const COLUMN_LETTERS: &[u8; MAX_BOARD_SIZE] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

// =============================================================================
// Komi
// =============================================================================

/// Komi is clamped to `[-MAX_KOMI, MAX_KOMI]`.
pub const MAX_KOMI: i32 = 625;

// =============================================================================
// Handicap
// =============================================================================

/// The only board size the fixed handicap table covers.
pub const HANDICAP_BOARD_SIZE: usize = 9;

/// Smallest fixed handicap.
pub const MIN_HANDICAP: usize = 2;

/// Largest fixed handicap.
pub const MAX_HANDICAP: usize = 9;

/// Fixed handicap layouts for 9x9, indexed by `stones - MIN_HANDICAP`.
///
/// Vertices are kept as text so the lists read like the GTP handicap table.
/// The lists are not strictly nested: 5 stones uses the centre point, while
/// 6 stones drops it in favour of the two side points.
pub const HANDICAP_9X9: [&[&str]; MAX_HANDICAP - MIN_HANDICAP + 1] = [
    &["C3", "G7"],
    &["C3", "G7", "C7"],
    &["C3", "G7", "C7", "G3"],
    &["C3", "G7", "C7", "G3", "E5"],
    &["C3", "G7", "C7", "G3", "C5", "G5"],
    &["C3", "G7", "C7", "G3", "C5", "G5", "E5"],
    &["C3", "G7", "C7", "G3", "C5", "G5", "E3", "E7"],
    &["C3", "G7", "C7", "G3", "C5", "G5", "E3", "E7", "E5"],
];

// =============================================================================
// Glyphs
// =============================================================================

/// `showboard` glyph for an empty point.
pub const GLYPH_EMPTY: &str = " .";

/// `showboard` glyph for a black stone.
pub const GLYPH_BLACK: &str = " #";

/// `showboard` glyph for a white stone.
pub const GLYPH_WHITE: &str = " o";

/// `showboard` glyph for a point the board can't describe.
pub const GLYPH_UNKNOWN: &str = " ?";
