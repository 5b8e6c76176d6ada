//! gtp-board: GTP engine backed by a random move generator.
//!
//! ## Usage
//!
//! - `gtp-board gtp` - Start a GTP server on stdin/stdout
//! - `gtp-board demo` - Play a few moves and print the board
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.

use std::io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gtp_board::board::Color;
use gtp_board::generator::RandomMoveGenerator;
use gtp_board::gtp::GtpEngine;
use gtp_board::session::{BoardSession, SessionConfig};

/// gtp-board: a stateful GTP board around a stateless move generator
#[derive(Parser)]
#[command(name = "gtp-board")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the GTP (Go Text Protocol) server for use with GUI applications
    Gtp {
        /// Acceptable board sizes; the smallest is used initially
        #[arg(long, value_delimiter = ',', default_value = "19")]
        sizes: Vec<usize>,
        /// Seed for the random move generator
        #[arg(long)]
        seed: Option<u64>,
        /// Name reported by the `name` command
        #[arg(long, default_value = "gtp-board")]
        name: String,
        /// Don't offer time_left and time_settings
        #[arg(long)]
        no_time_commands: bool,
    },
    /// Run a short demo game on a 9x9 board
    Demo,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Gtp {
            sizes,
            seed,
            name,
            no_time_commands,
        }) => run_gtp(sizes, seed, name, no_time_commands),
        Some(Commands::Demo) | None => run_demo(),
    }
}

fn generator(seed: Option<u64>) -> RandomMoveGenerator {
    match seed {
        Some(seed) => RandomMoveGenerator::with_seed(seed),
        None => RandomMoveGenerator::new(),
    }
}

fn run_gtp(sizes: Vec<usize>, seed: Option<u64>, name: String, no_time_commands: bool) -> Result<()> {
    let config = SessionConfig::new(sizes).context("invalid --sizes")?;
    info!(sizes = ?config.acceptable_sizes(), "starting GTP server");
    let session = BoardSession::with_config(Box::new(generator(seed)), config);
    let mut engine = GtpEngine::new(session)
        .with_name(name)
        .with_time_commands(!no_time_commands);

    let stdin = io::stdin();
    engine
        .run(stdin.lock(), io::stdout())
        .context("GTP connection failed")
}

fn run_demo() -> Result<()> {
    println!("gtp-board: stateful GTP board demo\n");

    let config = SessionConfig::new([9])?;
    let mut session = BoardSession::with_config(Box::new(generator(Some(42))), config);

    session.fixed_handicap(2)?;
    println!("Handicap: C3 G7");
    for turn in 0..6 {
        let color = if turn % 2 == 0 { Color::White } else { Color::Black };
        let reply = session.genmove(color)?;
        println!("{color} plays {reply}");
    }
    print!("{}", session.showboard());

    session.undo()?;
    println!("\nAfter undo: {} moves in history", session.move_history().len());
    Ok(())
}
