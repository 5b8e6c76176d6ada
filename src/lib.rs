//! gtp-board: a stateful GTP board for stateless Go move generators.
//!
//! A move generator only has to answer "what would you play here?". This
//! crate keeps the rest of the GTP-visible game: board size, stones, move
//! history, komi, the simple ko ban, handicap placement, undo, saved-game
//! loading and clock reports.
//!
//! ## Modules
//!
//! - [`constants`] - Size limits, komi limits, handicap table
//! - [`board`] - 2D board with captures and ko detection
//! - [`vertex`] - GTP vertex and colour tokens
//! - [`ascii`] - Text rendering for `showboard`
//! - [`sgf`] - Minimal SGF reader for `loadsgf`
//! - [`generator`] - Move generator contract and a random generator
//! - [`session`] - The board session that owns all game state
//! - [`gtp`] - GTP command loop
//!
//! ## Example
//!
//! ```
//! use gtp_board::board::Color;
//! use gtp_board::generator::RandomMoveGenerator;
//! use gtp_board::session::{BoardSession, SessionConfig};
//!
//! let config = SessionConfig::new([9]).unwrap();
//! let mut session = BoardSession::with_config(Box::new(RandomMoveGenerator::with_seed(1)), config);
//!
//! session.play(Color::Black, Some((2, 2))).unwrap();
//! let reply = session.genmove(Color::White).unwrap();
//! assert_eq!(session.move_history().len(), 2);
//! println!("white played {reply}");
//! ```

pub mod ascii;
pub mod board;
pub mod constants;
pub mod generator;
pub mod gtp;
pub mod session;
pub mod sgf;
pub mod vertex;
