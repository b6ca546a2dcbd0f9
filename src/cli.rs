//! Command-line interface for tictactoe_client.

use clap::{Parser, Subcommand};

/// Tic-tac-toe client - play games hosted by the tic-tac-toe web server
#[derive(Parser, Debug)]
#[command(name = "tictactoe_client")]
#[command(about = "Terminal client for the tic-tac-toe web server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the client config file (skipped if missing)
    #[arg(long, global = true, default_value = "tictactoe_client.toml")]
    pub config: std::path::PathBuf,

    /// Game server URL (overrides config and environment)
    #[arg(long, global = true)]
    pub server_url: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the interactive terminal client
    Tui,

    /// Watch two computer players play each other
    Watch {
        /// Player type for X
        #[arg(long)]
        x: String,

        /// Player type for O
        #[arg(long)]
        o: String,

        /// Number of games to play with the same pieces
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
        games: u32,
    },
}
