//! Command-line interface for tictaclink.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tictaclink - networked tic-tac-toe for two
#[derive(Parser, Debug)]
#[command(name = "tictaclink")]
#[command(about = "Host or join a two-player tic-tac-toe session", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML settings file
    #[arg(long, global = true, default_value = "tictaclink.toml")]
    pub config: PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Host a session and wait for someone to join
    Host {
        /// Port to listen on (overrides the settings file)
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind (overrides the settings file)
        #[arg(long)]
        bind: Option<String>,

        /// Shared secret the client must present (falls back to TICTACLINK_SECRET)
        #[arg(long)]
        secret: Option<String>,
    },

    /// Join a hosted session
    Join {
        /// Host address as `ip:port` (defaults to the settings file)
        #[arg(long)]
        address: Option<String>,

        /// Shared secret (falls back to TICTACLINK_SECRET)
        #[arg(long)]
        secret: Option<String>,
    },
}
