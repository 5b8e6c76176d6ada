//! Plain-text board rendering.

use crate::constants::COLUMN_LETTERS;

/// Render a board as text lines, top row first.
///
/// `glyph` is called once per point and should return a two-character cell
/// such as `" ."`. Rows are labelled with their GTP number and a footer of
/// column letters closes the grid.
pub fn render_board<'a, F>(size: usize, glyph: F) -> Vec<String>
where
    F: Fn(usize, usize) -> &'a str,
{
    let label_width = if size > 9 { 2 } else { 1 };
    let mut lines = Vec::with_capacity(size + 1);
    for row in (0..size).rev() {
        let mut line = format!("{:>label_width$}", row + 1);
        for col in 0..size {
            line.push_str(glyph(row, col));
        }
        lines.push(line);
    }
    let mut footer = " ".repeat(label_width);
    for &letter in &COLUMN_LETTERS[..size] {
        footer.push(' ');
        footer.push(letter as char);
    }
    lines.push(footer);
    lines
}
