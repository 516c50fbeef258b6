//! Server → client line protocol
//!
//! Every outbound message is one line of UTF-8 text. `ServerLine` is the
//! typed form; `Display` renders the text and `to_wire` adds the delimiter.

use std::fmt;

use crate::error::CommandError;

/// Server → Client line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerLine {
    /// Greeting sent to a newly accepted client
    Welcome { name: String },
    /// Broadcast chat message
    Chat { from: String, body: String },
    /// Another client connected
    Joined { name: String },
    /// Another client disconnected
    Left { name: String },
    /// A client changed its display name
    Renamed { old: String, new: String },
    /// Reply to `/list`
    UserList { names: Vec<String> },
    /// Confirmation to the sender of a whisper
    WhisperTo { to: String, body: String },
    /// Whisper delivered to its recipient
    WhisperFrom { from: String, body: String },
    /// Error reply
    Error { message: String },
}

impl ServerLine {
    /// Render the line for the socket, terminated by `\n`
    ///
    /// Line breaks inside the rendered text are replaced so a single
    /// `ServerLine` always arrives as exactly one frame.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut wire: Vec<u8> = self
            .to_string()
            .bytes()
            .map(|b| if b == b'\n' || b == b'\r' { b' ' } else { b })
            .collect();
        wire.push(b'\n');
        wire
    }
}

impl fmt::Display for ServerLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerLine::Welcome { name } => {
                write!(f, "* welcome, you are known as {name} (try /list, /nick, /msg)")
            }
            ServerLine::Chat { from, body } => write!(f, "[{from}]: {body}"),
            ServerLine::Joined { name } => write!(f, "* {name} joined"),
            ServerLine::Left { name } => write!(f, "* {name} left"),
            ServerLine::Renamed { old, new } => write!(f, "* {old} is now known as {new}"),
            ServerLine::UserList { names } => {
                write!(f, "users online ({}): {}", names.len(), names.join(", "))
            }
            ServerLine::WhisperTo { to, body } => write!(f, "[to {to}]: {body}"),
            ServerLine::WhisperFrom { from, body } => write!(f, "[from {from}]: {body}"),
            ServerLine::Error { message } => write!(f, "error: {message}"),
        }
    }
}

/// Convert CommandError to ServerLine for the caller's reply
impl From<CommandError> for ServerLine {
    fn from(err: CommandError) -> Self {
        ServerLine::Error {
            message: err.to_string(),
        }
    }
}
