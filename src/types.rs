//! Basic type definitions for the chat relay
//!
//! Provides the connection handle newtype and the token layout used by the
//! readiness multiplexer:
//! - `ClientId`: per-connection handle, never reused within a process
//! - `LISTENER` / `WAKER`: reserved poll tokens

use mio::Token;

/// Poll token of the listening socket
pub const LISTENER: Token = Token(0);

/// Poll token of the shutdown waker
pub const WAKER: Token = Token(1);

/// First token value handed out to client connections
const FIRST_CLIENT_TOKEN: usize = 2;

/// Unique connection handle (newtype pattern)
///
/// Wraps the poll token a client socket is registered under.
/// Implements Hash and Eq for use as HashMap keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub usize);

impl ClientId {
    /// Poll token for this client
    pub fn token(self) -> Token {
        Token(self.0)
    }

    /// Map a poll token back to a client handle
    ///
    /// Returns None for the reserved listener and waker tokens.
    pub fn from_token(token: Token) -> Option<Self> {
        (token.0 >= FIRST_CLIENT_TOKEN).then_some(Self(token.0))
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic handle allocator
///
/// Handles are never recycled, so an event for a connection that was already
/// torn down can never be mistaken for a newer connection.
#[derive(Debug)]
pub struct IdAllocator {
    next: usize,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next: FIRST_CLIENT_TOKEN,
        }
    }

    /// Hand out the next unused handle
    pub fn next_id(&mut self) -> ClientId {
        let id = ClientId(self.next);
        self.next += 1;
        id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
