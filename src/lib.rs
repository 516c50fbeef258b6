//! Line-based TCP Chat Relay Library
//!
//! A multi-client chat relay driven by a single-threaded mio event loop.
//!
//! # Features
//! - Non-blocking accept and reads, one poll call per loop iteration
//! - Newline-delimited framing with a per-line size limit
//! - Broadcast chat with sender names
//! - Commands: `/list`, `/nick <name>`, `/msg <name> <text>`
//! - Join, leave and rename notices
//! - Orderly shutdown from a signal handler or another thread
//! - A small async line client (`chat_client` binary) for talking to a relay
//!
//! # Architecture
//! One `ChatServer` owns all state:
//! - `Poll` holds the readiness registrations (listener, waker, clients)
//! - `Registry` maps each connection handle to its `Client`
//! - `handler` drains readable sockets and routes frames to `command` or `broadcast`
//! - No locks needed - only the loop thread touches the registry
//!
//! # Example
//! ```no_run
//! use chat_relay::{ChatServer, ServerConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = ChatServer::bind(ServerConfig::default())?;
//!     let shutdown = server.shutdown_handle();
//!     ctrlc::set_handler(move || shutdown.shutdown())?;
//!     server.run()?;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod buffer;
pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod handler;
pub mod line_client;
pub mod message;
pub mod registry;
pub mod server;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use buffer::FramedBuffer;
pub use client::Client;
pub use command::{Command, CommandKind};
pub use config::{Cli, ServerConfig};
pub use error::{CommandError, ConfigError, FrameError, RegistryError, SendError, ServerError};
pub use message::ServerLine;
pub use registry::Registry;
pub use server::{ChatServer, ShutdownHandle};
pub use types::ClientId;
