//! GTP vertex and colour tokens.
//!
//! Vertices use letters A-Z (skipping I) for columns and 1-based numbers for
//! rows, counted from the bottom of the board. "pass" is a vertex too.

use thiserror::Error;

use crate::board::{Color, Point};
use crate::constants::COLUMN_LETTERS;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VertexError {
    #[error("invalid vertex")]
    InvalidVertex,
    #[error("invalid colour")]
    InvalidColor,
}

/// Parse a vertex such as "D4" or "pass" on a board of the given size.
///
/// Returns `Ok(None)` for a pass.
pub fn parse_vertex(s: &str, size: usize) -> Result<Option<Point>, VertexError> {
    if s.eq_ignore_ascii_case("pass") {
        return Ok(None);
    }
    let bytes = s.as_bytes();
    if bytes.len() < 2 {
        return Err(VertexError::InvalidVertex);
    }
    let letter = bytes[0].to_ascii_uppercase();
    let col = COLUMN_LETTERS
        .iter()
        .position(|&c| c == letter)
        .ok_or(VertexError::InvalidVertex)?;
    let digits = &s[1..];
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VertexError::InvalidVertex);
    }
    let row: usize = digits.parse().map_err(|_| VertexError::InvalidVertex)?;
    if col >= size || row == 0 || row > size {
        return Err(VertexError::InvalidVertex);
    }
    Ok(Some((row - 1, col)))
}

/// Canonical vertex text for a point, or "pass".
///
/// Columns past the last letter print as '?'.
pub fn format_vertex(point: Option<Point>) -> String {
    match point {
        None => "pass".into(),
        Some((row, col)) => {
            let letter = COLUMN_LETTERS.get(col).map_or('?', |&c| c as char);
            format!("{letter}{}", row + 1)
        }
    }
}

/// Parse a GTP colour token ("b", "black", "w", "white"; any case).
pub fn parse_color(s: &str) -> Result<Color, VertexError> {
    match s.to_ascii_lowercase().as_str() {
        "b" | "black" => Ok(Color::Black),
        "w" | "white" => Ok(Color::White),
        _ => Err(VertexError::InvalidColor),
    }
}
