//! Readable-connection handler
//!
//! Drains a readable client socket into its line buffer, extracts complete
//! frames and routes each one: commands to `command::process`, everything
//! else to the chat broadcast.

use std::fmt;
use std::io::{ErrorKind, Read, Write};

use tracing::{debug, trace};

use crate::broadcast::{chat, send_to};
use crate::command::{self, is_command};
use crate::error::FrameError;
use crate::message::ServerLine;
use crate::registry::Registry;
use crate::types::ClientId;

/// Bytes requested per read call
const READ_CHUNK: usize = 4096;

/// Why a connection is being closed
#[derive(Debug)]
pub enum CloseReason {
    /// Peer closed its end
    Disconnected,
    /// Poll reported an error or hangup
    Hangup,
    /// Read failed
    ReadError(std::io::Error),
    /// Inbound line over the limit, or the buffer could not grow
    Frame(FrameError),
    /// A send to this client failed
    SendFailed,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::Disconnected => write!(f, "peer closed connection"),
            CloseReason::Hangup => write!(f, "hangup"),
            CloseReason::ReadError(e) => write!(f, "read error: {e}"),
            CloseReason::Frame(e) => write!(f, "{e}"),
            CloseReason::SendFailed => write!(f, "send failed"),
        }
    }
}

/// What the server should do with a connection after a readable event
#[derive(Debug)]
pub enum Disposition {
    /// Socket drained, keep the connection
    Keep,
    /// Tear the connection down
    Close(CloseReason),
}

/// Handle a readable event for one client
///
/// Reads until the socket reports `WouldBlock`, dispatching every complete
/// frame as it arrives. Frames completed before an end of stream or an
/// oversized line are still dispatched.
pub fn handle_readable<S: Read + Write>(registry: &mut Registry<S>, id: ClientId) -> Disposition {
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let Some(client) = registry.get_mut(id) else {
            return Disposition::Keep;
        };
        let (stream, buffer) = client.io_parts();

        let mut closing = match stream.read(&mut chunk) {
            Ok(0) => Some(CloseReason::Disconnected),
            Ok(n) => {
                trace!(client = %id, len = n, "Read from socket");
                buffer.append(&chunk[..n]).err().map(CloseReason::Frame)
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => return Disposition::Keep,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => Some(CloseReason::ReadError(e)),
        };

        let mut frames = Vec::new();
        loop {
            match buffer.extract_frame() {
                Ok(Some(frame)) => frames.push(frame),
                Ok(None) => break,
                Err(e) => {
                    buffer.clear();
                    closing = Some(CloseReason::Frame(e));
                    break;
                }
            }
        }
        for frame in frames {
            dispatch_frame(registry, id, &frame);
        }

        if let Some(reason) = closing {
            if let CloseReason::Frame(e) = &reason {
                send_to(registry, id, &ServerLine::Error { message: e.to_string() });
            }
            return Disposition::Close(reason);
        }
        if registry.get(id).is_some_and(|client| client.is_failed()) {
            return Disposition::Close(CloseReason::SendFailed);
        }
    }
}

/// Route one frame from `sender`
fn dispatch_frame<S: Write>(registry: &mut Registry<S>, sender: ClientId, frame: &[u8]) {
    let text = String::from_utf8_lossy(frame);
    let text = text.strip_suffix('\r').unwrap_or(&text);

    if is_command(text) {
        debug!(client = %sender, "Command: {}", text);
        command::process(registry, sender, text);
    } else {
        let sent = chat(registry, sender, text.to_string());
        trace!(client = %sender, recipients = sent, "Chat relayed");
    }
}
