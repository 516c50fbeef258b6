//! Interactive client for the chat relay
//!
//! Connects to a relay, sends each stdin line and prints every line the relay
//! sends. Logs go to stderr so they never mix with chat output.

use clap::Parser;
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_relay::line_client::run_client;

/// Command-line options for the chat client
#[derive(Parser, Debug)]
#[command(name = "chat_client", version, about = "Connect to a chat relay")]
struct Args {
    /// Relay host name or address
    #[arg(short = 'H', long, env = "CHAT_RELAY_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Relay port
    #[arg(short, long, env = "CHAT_RELAY_PORT", default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chat_client=info,chat_relay=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    info!("Connecting to {}:{}", args.host, args.port);
    let stream = TcpStream::connect((args.host.as_str(), args.port)).await?;
    info!("Connected to {}", stream.peer_addr()?);

    run_client(stream, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;

    info!("Disconnected");
    Ok(())
}
