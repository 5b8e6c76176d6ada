//! Two-dimensional Go board.
//!
//! The board only knows about occupancy and captures. It enforces no ko rule
//! and permits self-capture; both are the caller's business. Rows count from
//! the bottom (row 0 is GTP row 1) and columns from the left.

use std::fmt;

use thiserror::Error;

/// Stone colour.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    White,
}

impl Color {
    /// The other colour.
    pub fn opponent(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => write!(f, "b"),
            Color::White => write!(f, "w"),
        }
    }
}

/// A board point as `(row, col)`.
pub type Point = (usize, usize);

/// Why a stone could not be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("point is occupied")]
    Occupied,
    #[error("point is off the board")]
    OffBoard,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Option<Color>>,
}

impl Board {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn idx(&self, row: usize, col: usize) -> usize {
        row * self.size + col
    }

    /// Whether `(row, col)` lies on the board.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.size && col < self.size
    }

    /// Stone at `(row, col)`, or `None` for an empty or off-board point.
    pub fn get(&self, row: usize, col: usize) -> Option<Color> {
        if !self.contains(row, col) {
            return None;
        }
        self.cells[self.idx(row, col)]
    }

    /// True if there are no stones on the board.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// All points holding a stone, in row-major order.
    pub fn occupied_points(&self) -> Vec<(Point, Color)> {
        let mut out = Vec::new();
        for row in 0..self.size {
            for col in 0..self.size {
                if let Some(c) = self.get(row, col) {
                    out.push(((row, col), c));
                }
            }
        }
        out
    }

    pub(crate) fn neighbors(&self, row: usize, col: usize) -> impl Iterator<Item = Point> + use<> {
        let s = self.size;
        let mut v = Vec::with_capacity(4);
        if row > 0 {
            v.push((row - 1, col));
        }
        if row + 1 < s {
            v.push((row + 1, col));
        }
        if col > 0 {
            v.push((row, col - 1));
        }
        if col + 1 < s {
            v.push((row, col + 1));
        }
        v.into_iter()
    }

    /// Place a stone and resolve captures.
    ///
    /// Opponent groups left without liberties are removed first; if the
    /// placed stone's own group then has no liberties it is removed as well
    /// (self-capture).
    ///
    /// Returns the point forbidden by the simple ko rule, if this move
    /// created one: exactly one opponent stone was captured and the placed
    /// stone is a lone stone whose only liberty is the captured point.
    pub fn play(&mut self, row: usize, col: usize, color: Color) -> Result<Option<Point>, BoardError> {
        if !self.contains(row, col) {
            return Err(BoardError::OffBoard);
        }
        if self.get(row, col).is_some() {
            return Err(BoardError::Occupied);
        }
        let idx = self.idx(row, col);
        self.cells[idx] = Some(color);

        let opp = color.opponent();
        let mut captured: Vec<Point> = Vec::new();
        for (nr, nc) in self.neighbors(row, col) {
            if self.get(nr, nc) == Some(opp) && self.group_liberties(nr, nc) == 0 {
                // Two neighbours may belong to the same group.
                if !captured.contains(&(nr, nc)) {
                    self.collect_group(nr, nc, &mut captured);
                }
            }
        }
        for &(rr, rc) in &captured {
            let i = self.idx(rr, rc);
            self.cells[i] = None;
        }

        if captured.is_empty() && self.group_liberties(row, col) == 0 {
            let mut own = Vec::new();
            self.collect_group(row, col, &mut own);
            for (rr, rc) in own {
                let i = self.idx(rr, rc);
                self.cells[i] = None;
            }
            return Ok(None);
        }

        if captured.len() == 1 {
            let lone = self.neighbors(row, col).all(|(nr, nc)| self.get(nr, nc) != Some(color));
            if lone && self.group_liberties(row, col) == 1 {
                return Ok(Some(captured[0]));
            }
        }
        Ok(None)
    }

    fn collect_group(&self, row: usize, col: usize, out: &mut Vec<Point>) -> usize {
        let Some(color) = self.get(row, col) else {
            return 0;
        };
        let mut stack = vec![(row, col)];
        let mut visited = vec![false; self.size * self.size];
        let mut count = 0;
        while let Some((cr, cc)) = stack.pop() {
            let i = self.idx(cr, cc);
            if visited[i] {
                continue;
            }
            visited[i] = true;
            if self.get(cr, cc) == Some(color) {
                out.push((cr, cc));
                count += 1;
                for (nr, nc) in self.neighbors(cr, cc) {
                    let ni = self.idx(nr, nc);
                    if !visited[ni] && self.get(nr, nc) == Some(color) {
                        stack.push((nr, nc));
                    }
                }
            }
        }
        count
    }

    /// Number of distinct empty points adjacent to the group at `(row, col)`.
    fn group_liberties(&self, row: usize, col: usize) -> usize {
        let Some(color) = self.get(row, col) else {
            return 0;
        };
        let mut stack = vec![(row, col)];
        let mut visited = vec![false; self.size * self.size];
        let mut liberties = 0;
        while let Some((cr, cc)) = stack.pop() {
            let i = self.idx(cr, cc);
            if visited[i] {
                continue;
            }
            visited[i] = true;
            for (nr, nc) in self.neighbors(cr, cc) {
                let ni = self.idx(nr, nc);
                match self.get(nr, nc) {
                    None if !visited[ni] => {
                        visited[ni] = true;
                        liberties += 1;
                    }
                    Some(c) if c == color && !visited[ni] => stack.push((nr, nc)),
                    _ => {}
                }
            }
        }
        liberties
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new(9);
        assert!(board.is_empty());
        assert_eq!(board.get(4, 4), None);
        assert_eq!(board.get(9, 0), None);
    }

    #[test]
    fn test_play_occupied() {
        let mut board = Board::new(9);
        assert_eq!(board.play(2, 2, Color::Black), Ok(None));
        assert_eq!(board.play(2, 2, Color::White), Err(BoardError::Occupied));
        assert_eq!(board.play(9, 2, Color::White), Err(BoardError::OffBoard));
        assert!(!board.is_empty());
    }

    #[test]
    fn test_capture_in_corner() {
        let mut board = Board::new(9);
        board.play(0, 0, Color::White).unwrap();
        board.play(0, 1, Color::Black).unwrap();
        board.play(1, 0, Color::Black).unwrap();
        assert_eq!(board.get(0, 0), None);
    }

    #[test]
    fn test_capture_group_once() {
        // White pair on the edge, black fills the last liberty.
        let mut board = Board::new(9);
        board.play(0, 0, Color::White).unwrap();
        board.play(0, 1, Color::White).unwrap();
        board.play(1, 0, Color::Black).unwrap();
        board.play(1, 1, Color::Black).unwrap();
        assert_eq!(board.play(0, 2, Color::Black), Ok(None));
        assert_eq!(board.get(0, 0), None);
        assert_eq!(board.get(0, 1), None);
    }

    #[test]
    fn test_self_capture_is_permitted() {
        let mut board = Board::new(9);
        board.play(0, 1, Color::White).unwrap();
        board.play(1, 0, Color::White).unwrap();
        assert_eq!(board.play(0, 0, Color::Black), Ok(None));
        assert_eq!(board.get(0, 0), None);
        assert_eq!(board.get(0, 1), Some(Color::White));
    }

    #[test]
    fn test_ko_candidate() {
        // Standard ko shape around (1,1)/(1,2).
        let mut board = Board::new(9);
        board.play(0, 1, Color::Black).unwrap();
        board.play(2, 1, Color::Black).unwrap();
        board.play(1, 0, Color::Black).unwrap();
        board.play(0, 2, Color::White).unwrap();
        board.play(2, 2, Color::White).unwrap();
        board.play(1, 3, Color::White).unwrap();
        board.play(1, 1, Color::White).unwrap();
        assert_eq!(board.play(1, 2, Color::Black), Ok(Some((1, 1))));
        assert_eq!(board.get(1, 1), None);
    }

    #[test]
    fn test_capture_without_ko() {
        // Capturing with a stone that joins a group is not a ko.
        let mut board = Board::new(9);
        board.play(0, 0, Color::White).unwrap();
        board.play(1, 0, Color::Black).unwrap();
        board.play(1, 1, Color::Black).unwrap();
        assert_eq!(board.play(0, 1, Color::Black), Ok(None));
        assert_eq!(board.get(0, 0), None);
    }
}
