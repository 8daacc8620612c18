//! Festival Client - shared-room multiplayer client
//!
//! This is the main entry point for the client. It handles:
//! - The WebSocket session with the room server
//! - Room key validation and joining
//! - Local movement, remote participants and proximity affordances
//! - Handing over to the stream embed at the vending machine

mod app;
mod config;
mod game;
mod input;
mod scene;
mod util;
mod ws;

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::Client;
use crate::config::Config;
use crate::input::ConsoleInput;
use crate::scene::StreamEmbed;
use crate::ws::ConnectionSession;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Arc::new(Config::from_env()?);

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting Festival Client");
    info!("Server: {}", config.server_url);

    let mut session = ConnectionSession::new();
    session.connect(&config.server_url).await?;

    info!("Commands: +up/-up (w a s d), stop, engage [id], exit, join <key>, quit");

    let client = Client::new(
        config.clone(),
        session,
        ConsoleInput::spawn(),
        StreamEmbed::new(config.stream_channel.clone()),
    );

    tokio::select! {
        result = client.run() => {
            if let Err(e) = &result {
                error!(error = %e, "Session ended");
            }
            result?;
        }
        _ = shutdown_signal() => {}
    }

    info!("Client shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
