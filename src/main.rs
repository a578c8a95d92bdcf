//! microkv - An In-Memory Key-Value Server with Per-Key TTL
//!
//! This is the main entry point for the microkv server.
//! It loads configuration, sets up the store and its sweeper, and accepts
//! connections until Ctrl+C.

use anyhow::Context;
use microkv::commands::CommandDispatcher;
use microkv::config::Config;
use microkv::connection::{handle_connection, ConnectionStats};
use microkv::storage::{Db, ExpirySweeper, Store};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn print_banner(config: &Config) {
    println!(
        r#"
microkv v{} - In-Memory Key-Value Server
──────────────────────────────────────────────────────────────
Server started on {}
Expired keys swept every {}ms
Ready to accept connections.

Use Ctrl+C to shutdown gracefully.
"#,
        microkv::VERSION,
        config.bind_address(),
        config.sweep_interval.as_millis()
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    // Set up logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    print_banner(&config);

    // Create the store (shared across all connections)
    let db = Db::new(Store::with_sweep_interval(config.sweep_interval));

    // Start the background expiry sweeper
    let _sweeper = ExpirySweeper::start(db.clone());

    let stats = Arc::new(ConnectionStats::new());

    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;
    info!(address = %config.bind_address(), "Listening");

    // Set up graceful shutdown
    let shutdown = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received, stopping server..."),
            Err(e) => {
                error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await
            }
        }
    };

    // Main accept loop
    tokio::select! {
        _ = accept_loop(listener, CommandDispatcher::new(db), Arc::clone(&stats)) => {}
        _ = shutdown => {}
    }

    info!(
        connections = stats.connections_accepted.load(Ordering::Relaxed),
        commands = stats.commands_processed.load(Ordering::Relaxed),
        "Server shutdown complete"
    );
    Ok(())
}

/// Main loop that accepts incoming connections
async fn accept_loop(
    listener: TcpListener,
    dispatcher: CommandDispatcher,
    stats: Arc<ConnectionStats>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let dispatcher = dispatcher.clone();
                let stats = Arc::clone(&stats);

                // Spawn a task to handle this connection
                tokio::spawn(async move {
                    handle_connection(stream, addr, dispatcher, stats).await;
                });
            }
            Err(e) => {
                error!(error = %e, "Failed to accept connection");
            }
        }
    }
}
