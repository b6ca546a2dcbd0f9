//! Tic-tac-toe client - unified CLI
//!
//! Interactive terminal play or headless watching of computer games.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use std::sync::Arc;
use tictactoe_client::console::{self, ConsoleView};
use tictactoe_client::{ClientConfig, GameController, HttpTransport, Players, tui};
use tokio::sync::mpsc;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.command)?;

    let config = ClientConfig::load(&cli.config)?.override_server_url(cli.server_url.as_deref());
    info!(server_url = %config.server_url(), "Configuration loaded");

    match cli.command {
        Command::Tui => tui::run_tui(config).await,
        Command::Watch { x, o, games } => run_watch(config, Players::new(x, o), games).await,
    }
}

/// The TUI logs to a file to keep the terminal clean; watch logs to stderr.
fn init_tracing(command: &Command) -> Result<()> {
    match command {
        Command::Tui => {
            let log_file = std::fs::File::create(tui::LOG_FILE)?;
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
                )
                .with_writer(Arc::new(log_file))
                .with_ansi(false)
                .init();
        }
        Command::Watch { .. } => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
                )
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Plays `games` computer-vs-computer games, printing every board.
#[instrument(skip(config), fields(server_url = %config.server_url()))]
async fn run_watch(config: ClientConfig, players: Players, games: u32) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let view = ConsoleView::new(players);
    let transport = Arc::new(HttpTransport::new(config.server_url()));
    let mut controller = GameController::new(view, transport, event_tx, config.timings());

    console::watch(&mut controller, &mut event_rx, games).await?;

    for (n, outcome) in controller.view().outcomes().iter().enumerate() {
        println!("Game {}: {}", n + 1, outcome);
    }
    Ok(())
}
