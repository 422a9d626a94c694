//! Tictaclink - host or join from the terminal.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use tictaclink::{
    ChannelLink, ConsolePresentation, GameCoordinator, Settings, accept_loop, connect, drive,
    secret_from_env, spawn_stdin,
};
use tictaclink_game::Player;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = Settings::load(Some(cli.config.as_path()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_filter())),
        )
        .init();

    match cli.command {
        Command::Host { port, bind, secret } => {
            let mut settings = settings;
            if let Some(port) = port {
                settings = settings.with_port(port);
            }
            if let Some(bind) = bind {
                settings = settings.with_bind_address(bind);
            }
            run_host(settings, resolve_secret(secret)?).await
        }
        Command::Join { address, secret } => {
            let address = address.unwrap_or_else(|| settings.socket_address());
            run_join(settings, address, resolve_secret(secret)?).await
        }
    }
}

fn resolve_secret(secret: Option<String>) -> Result<String> {
    match secret {
        Some(secret) => Ok(secret),
        None => Ok(secret_from_env()?),
    }
}

/// Host a session and play until leaving
#[instrument(skip_all, fields(address = %settings.socket_address()))]
async fn run_host(settings: Settings, secret: String) -> Result<()> {
    let listener = TcpListener::bind(settings.socket_address())
        .await
        .with_context(|| format!("Failed to bind {}", settings.socket_address()))?;
    let local = listener.local_addr().context("Listener has no local address")?;
    info!(%local, "Hosting");
    println!("Hosting on {local}. Waiting for someone to join...");

    let mut coordinator: GameCoordinator<ConsolePresentation, ChannelLink> = GameCoordinator::new(
        ConsolePresentation::new(Player::Host),
        settings.diagonal_policy(),
    );
    coordinator.start_host(secret)?;

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let acceptor = tokio::spawn(accept_loop(listener, events_tx));
    drive(&mut coordinator, events_rx, spawn_stdin()).await;
    acceptor.abort();
    Ok(())
}

/// Join a session and play until it ends
#[instrument(skip(settings, secret))]
async fn run_join(settings: Settings, address: String, secret: String) -> Result<()> {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let link = connect(&address, events_tx)
        .await
        .with_context(|| format!("Failed to connect to {address}"))?;
    println!("Connected to {address}. Asking to join...");

    let mut coordinator = GameCoordinator::new(
        ConsolePresentation::new(Player::Client),
        settings.diagonal_policy(),
    );
    coordinator.start_client(secret, link)?;
    drive(&mut coordinator, events_rx, spawn_stdin()).await;
    Ok(())
}
