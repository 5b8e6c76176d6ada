//! Minimal SGF (Smart Game Format) reader.
//!
//! Only what the board session needs is supported: the main line of the
//! first game tree, raw property values, the board size, and move
//! extraction. Variations are parsed for well-formedness and then dropped.

use thiserror::Error;

use crate::board::{Color, Point};
use crate::constants::DEFAULT_BOARD_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SgfError {
    #[error("unexpected end of file")]
    UnexpectedEof,
    #[error("unexpected character {found:?} at offset {offset}")]
    Unexpected { found: char, offset: usize },
    #[error("empty game tree")]
    EmptyTree,
    #[error("bad property identifier at offset {0}")]
    BadIdentifier(usize),
    #[error("bad board size {0:?}")]
    BadSize(String),
    #[error("bad move {0:?}")]
    BadMove(String),
    #[error("game trees nested too deeply")]
    TooDeep,
}

/// Deepest nesting of game trees the parser follows.
pub const MAX_TREE_DEPTH: usize = 1000;

/// One SGF node: its properties in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    props: Vec<(String, Vec<String>)>,
}

impl Node {
    /// First value of a property.
    pub fn get(&self, ident: &str) -> Option<&str> {
        self.props
            .iter()
            .find(|(id, _)| id == ident)
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }

    pub fn has_prop(&self, ident: &str) -> bool {
        self.props.iter().any(|(id, _)| id == ident)
    }

    /// The move recorded in this node, if any.
    ///
    /// An empty value, or "tt" on boards up to 19x19, is a pass.
    pub fn get_move(&self, size: usize) -> Result<Option<(Color, Option<Point>)>, SgfError> {
        let (color, value) = if let Some(v) = self.get("B") {
            (Color::Black, v)
        } else if let Some(v) = self.get("W") {
            (Color::White, v)
        } else {
            return Ok(None);
        };
        if value.is_empty() || (value == "tt" && size <= 19) {
            return Ok(Some((color, None)));
        }
        let bytes = value.as_bytes();
        if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_lowercase) {
            return Err(SgfError::BadMove(value.to_string()));
        }
        let col = (bytes[0] - b'a') as usize;
        let row_from_top = (bytes[1] - b'a') as usize;
        if col >= size || row_from_top >= size {
            return Err(SgfError::BadMove(value.to_string()));
        }
        Ok(Some((color, Some((size - 1 - row_from_top, col)))))
    }
}

/// The main line of a parsed game record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    nodes: Vec<Node>,
}

impl GameRecord {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    /// Board size from the root's SZ property (19 if absent).
    pub fn size(&self) -> Result<usize, SgfError> {
        match self.root().get("SZ") {
            None => Ok(DEFAULT_BOARD_SIZE),
            Some(s) => match s.trim().parse::<usize>() {
                Ok(n) if (1..=26).contains(&n) => Ok(n),
                _ => Err(SgfError::BadSize(s.to_string())),
            },
        }
    }
}

/// Parse SGF data, keeping the main line of the first game tree.
///
/// The input is taken as raw bytes since files may declare any charset
/// (`CA[...]`). Text values are decoded lossily as UTF-8; the structure and
/// move coordinates are plain ASCII either way.
pub fn parse_sgf(src: &[u8]) -> Result<GameRecord, SgfError> {
    let mut parser = Parser { src, pos: 0 };
    let mut nodes = Vec::new();
    parser.skip_ws();
    parser.parse_tree(Some(&mut nodes), 1)?;
    Ok(GameRecord { nodes })
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn unexpected(&self) -> SgfError {
        match self.peek() {
            None => SgfError::UnexpectedEof,
            Some(b) => SgfError::Unexpected {
                found: b as char,
                offset: self.pos,
            },
        }
    }

    fn expect(&mut self, b: u8) -> Result<(), SgfError> {
        if self.peek() == Some(b) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    /// Parse `( sequence subtree* )`. Nodes are appended to `out` only along
    /// the first variation.
    fn parse_tree(&mut self, mut out: Option<&mut Vec<Node>>, depth: usize) -> Result<(), SgfError> {
        if depth > MAX_TREE_DEPTH {
            return Err(SgfError::TooDeep);
        }
        self.expect(b'(')?;
        let mut seen_node = false;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b';') => {
                    let node = self.parse_node()?;
                    if let Some(out) = out.as_deref_mut() {
                        out.push(node);
                    }
                    seen_node = true;
                }
                Some(b'(') | Some(b')') => break,
                _ => return Err(self.unexpected()),
            }
        }
        if !seen_node {
            return Err(SgfError::EmptyTree);
        }
        let mut first = true;
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b'(') => {
                    let child_out = if first { out.as_deref_mut() } else { None };
                    self.parse_tree(child_out, depth + 1)?;
                    first = false;
                }
                Some(b')') => {
                    self.pos += 1;
                    return Ok(());
                }
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn parse_node(&mut self) -> Result<Node, SgfError> {
        self.expect(b';')?;
        let mut node = Node::default();
        loop {
            self.skip_ws();
            if !self.peek().is_some_and(|b| b.is_ascii_alphabetic()) {
                return Ok(node);
            }
            let start = self.pos;
            let mut ident = String::new();
            while let Some(b) = self.peek().filter(u8::is_ascii_alphabetic) {
                // FF[3] long names ("AddBlack") keep only their capitals.
                if b.is_ascii_uppercase() {
                    ident.push(b as char);
                }
                self.pos += 1;
            }
            if ident.is_empty() {
                return Err(SgfError::BadIdentifier(start));
            }
            let mut values = Vec::new();
            loop {
                self.skip_ws();
                if self.peek() != Some(b'[') {
                    break;
                }
                values.push(self.parse_value()?);
            }
            if values.is_empty() {
                return Err(self.unexpected());
            }
            node.props.push((ident, values));
        }
    }

    fn parse_value(&mut self) -> Result<String, SgfError> {
        self.expect(b'[')?;
        let mut raw = Vec::new();
        loop {
            match self.peek() {
                None => return Err(SgfError::UnexpectedEof),
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    match self.peek() {
                        None => return Err(SgfError::UnexpectedEof),
                        // soft line break
                        Some(b'\n') => self.pos += 1,
                        Some(b) => {
                            raw.push(b);
                            self.pos += 1;
                        }
                    }
                }
                Some(b) => {
                    raw.push(b);
                    self.pos += 1;
                }
            }
        }
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}
