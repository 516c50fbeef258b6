//! Error types for the chat relay
//!
//! One enum per failure class:
//! - `ServerError`: fatal, ends startup or the event loop
//! - `FrameError`, `SendError`: per-connection, tear down one client
//! - `CommandError`: per-command, answered with a reply line
//!
//! Uses thiserror for ergonomic error definitions.

use std::net::SocketAddr;

use thiserror::Error;

use crate::types::ClientId;

/// Fatal server errors
///
/// Listener setup and poll failures. Anything here stops the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Could not bind the listening socket
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The readiness wait itself failed
    #[error("poll failed: {0}")]
    Poll(#[source] std::io::Error),

    /// Other IO error during setup
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read config file: {0}")]
    Read(#[from] std::io::Error),

    /// Config file is not valid TOML for `ServerConfig`
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Host is not an IP address
    #[error("invalid listen address: {0}")]
    InvalidAddress(String),

    /// A setting is out of range
    #[error("invalid setting: {0}")]
    InvalidValue(&'static str),
}

/// Inbound framing errors (fatal to the owning connection)
#[derive(Debug, Error)]
pub enum FrameError {
    /// A line grew past the configured limit without a delimiter
    #[error("line exceeds maximum length ({limit} bytes)")]
    FrameTooLarge { limit: usize },

    /// The buffer could not grow
    #[error("out of memory while buffering input")]
    OutOfMemory(#[from] std::collections::TryReserveError),
}

/// Client registry errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A client with this handle is already registered
    #[error("client {0} is already registered")]
    DuplicateHandle(ClientId),

    /// No client with this handle
    #[error("client {0} not found")]
    NotFound(ClientId),
}

/// Outbound send errors
///
/// Any of these marks the recipient for teardown.
#[derive(Debug, Error)]
pub enum SendError {
    /// An earlier send to this client already failed
    #[error("connection already failed")]
    Failed,

    /// Socket write failed (including a full socket buffer)
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Command errors
///
/// Never fatal: each is reported back to the caller as a single reply line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// `/nick` or `/msg` without its first argument
    #[error("no name given")]
    MissingArgument,

    /// `/msg name` without text
    #[error("no message given")]
    MissingBody,

    /// Requested name cannot be used on the wire
    #[error("invalid name '{0}': names must not contain whitespace")]
    InvalidName(String),

    /// Requested name belongs to another client
    #[error("name '{0}' is already taken")]
    NameTaken(String),

    /// `/msg` target is not connected
    #[error("no user named '{0}'")]
    RecipientNotFound(String),

    /// Command word is not in the command table
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
}
