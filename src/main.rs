//! Line-based TCP Chat Relay - Entry Point
//!
//! Loads configuration, binds the listener, wires SIGINT/SIGTERM to an
//! orderly shutdown and runs the event loop on the main thread.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_relay::{ChatServer, Cli, ServerConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chat_relay=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load(&cli)?;

    let server = ChatServer::bind(config)?;

    // Ctrl+C / SIGTERM stop the loop; connections are closed before run() returns
    let shutdown = server.shutdown_handle();
    ctrlc::set_handler(move || {
        info!("Received termination signal");
        shutdown.shutdown();
    })?;

    server.run()?;

    info!("ChatServer stopped");
    Ok(())
}
