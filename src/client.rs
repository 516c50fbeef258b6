//! Client struct definition
//!
//! Represents a connected client: its handle, display name, inbound line
//! buffer and the stream it talks over.

use std::io::Write;
use std::net::SocketAddr;

use tracing::trace;

use crate::buffer::FramedBuffer;
use crate::error::SendError;
use crate::message::ServerLine;
use crate::types::ClientId;

/// Connected client information
///
/// Generic over the stream so the dispatcher and commands can be exercised
/// without real sockets. The server uses `mio::net::TcpStream`.
#[derive(Debug)]
pub struct Client<S> {
    /// Connection handle
    pub id: ClientId,
    /// Remote address
    pub addr: SocketAddr,
    /// Display name, unique among registered clients (case-insensitive)
    name: String,
    /// Inbound bytes not yet framed
    buffer: FramedBuffer,
    /// The connection itself
    stream: S,
    /// Set once a send fails; the server tears the client down
    failed: bool,
}

impl<S> Client<S> {
    /// Create a new client
    pub fn new(
        id: ClientId,
        addr: SocketAddr,
        name: String,
        stream: S,
        max_frame_len: usize,
    ) -> Self {
        Self {
            id,
            addr,
            name,
            buffer: FramedBuffer::new(max_frame_len),
            stream,
            failed: false,
        }
    }

    /// Get the display name for this client
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the display name, returning the old one
    pub fn set_name(&mut self, name: String) -> String {
        std::mem::replace(&mut self.name, name)
    }

    pub fn buffer(&self) -> &FramedBuffer {
        &self.buffer
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Split borrow for the read path: stream and buffer at once
    pub fn io_parts(&mut self) -> (&mut S, &mut FramedBuffer) {
        (&mut self.stream, &mut self.buffer)
    }

    /// Check if a send to this client has failed
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn mark_failed(&mut self) {
        self.failed = true;
    }

    /// Give up the stream for closing
    pub fn into_stream(self) -> S {
        self.stream
    }
}

impl<S: Write> Client<S> {
    /// Send one line to this client
    ///
    /// The socket is non-blocking: a full send buffer surfaces as
    /// `WouldBlock`, which fails the client like any other write error since
    /// a half-written line cannot be resumed.
    pub fn send(&mut self, line: &ServerLine) -> Result<(), SendError> {
        if self.failed {
            return Err(SendError::Failed);
        }

        match self.stream.write_all(&line.to_wire()) {
            Ok(()) => {
                trace!(client = %self.id, "Sent: {}", line);
                Ok(())
            }
            Err(e) => {
                self.failed = true;
                Err(e.into())
            }
        }
    }
}
