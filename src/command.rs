//! Slash-command parsing and execution
//!
//! A frame starting with `/` is a command: `/WORD [ARG]`. The word is looked
//! up in `COMMANDS`; failures are answered with one error line to the caller
//! and never affect the connection.

use std::io::Write;

use tracing::{debug, info};

use crate::broadcast::{broadcast, send_to};
use crate::error::CommandError;
use crate::message::ServerLine;
use crate::registry::Registry;
use crate::types::ClientId;

/// First character of a command frame
pub const COMMAND_MARKER: char = '/';

/// The fixed command set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    List,
    Nick,
    Msg,
}

/// Command word → kind
pub const COMMANDS: &[(&str, CommandKind)] = &[
    ("list", CommandKind::List),
    ("nick", CommandKind::Nick),
    ("msg", CommandKind::Msg),
];

impl CommandKind {
    /// Look up a command word (ASCII case-insensitive)
    pub fn lookup(word: &str) -> Option<Self> {
        COMMANDS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(word))
            .map(|&(_, kind)| kind)
    }
}

/// A parsed command with its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List connected clients
    List,
    /// Change the caller's display name
    Nick { name: String },
    /// Whisper to one client
    Msg { to: String, body: String },
}

/// Check whether a frame is a command
pub fn is_command(frame: &str) -> bool {
    frame.starts_with(COMMAND_MARKER)
}

impl Command {
    /// Parse a command frame, with or without the leading marker
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.strip_prefix(COMMAND_MARKER).unwrap_or(line);
        let (word, arg) = line.split_once(' ').unwrap_or((line, ""));

        let kind =
            CommandKind::lookup(word).ok_or_else(|| CommandError::UnknownCommand(word.to_string()))?;

        match kind {
            CommandKind::List => Ok(Command::List),
            CommandKind::Nick => {
                let arg = arg.trim();
                if arg.is_empty() {
                    return Err(CommandError::MissingArgument);
                }
                if arg.contains(char::is_whitespace) {
                    return Err(CommandError::InvalidName(arg.to_string()));
                }
                Ok(Command::Nick {
                    name: arg.to_string(),
                })
            }
            CommandKind::Msg => {
                // Body is kept verbatim, surrounding spaces included
                let arg = arg.trim_start();
                if arg.is_empty() {
                    return Err(CommandError::MissingArgument);
                }
                let Some((to, body)) = arg.split_once(' ') else {
                    return Err(CommandError::MissingBody);
                };
                if body.trim().is_empty() {
                    return Err(CommandError::MissingBody);
                }
                Ok(Command::Msg {
                    to: to.to_string(),
                    body: body.to_string(),
                })
            }
        }
    }
}

/// Parse and execute a command frame from `caller`
///
/// Errors are sent back to the caller as a single reply line.
pub fn process<S: Write>(registry: &mut Registry<S>, caller: ClientId, line: &str) {
    let result = Command::parse(line).and_then(|command| execute(registry, caller, command));

    if let Err(err) = result {
        debug!(client = %caller, "Command rejected: {}", err);
        send_to(registry, caller, &err.into());
    }
}

/// Execute a parsed command on behalf of `caller`
pub fn execute<S: Write>(
    registry: &mut Registry<S>,
    caller: ClientId,
    command: Command,
) -> Result<(), CommandError> {
    if !registry.contains(caller) {
        return Ok(());
    }

    match command {
        Command::List => handle_list(registry, caller),
        Command::Nick { name } => handle_nick(registry, caller, name),
        Command::Msg { to, body } => handle_msg(registry, caller, &to, body),
    }
}

/// Reply with every display name and the count
fn handle_list<S: Write>(registry: &mut Registry<S>, caller: ClientId) -> Result<(), CommandError> {
    let names = registry.names();
    send_to(registry, caller, &ServerLine::UserList { names });
    Ok(())
}

/// Rename the caller and announce it to everyone
fn handle_nick<S: Write>(
    registry: &mut Registry<S>,
    caller: ClientId,
    name: String,
) -> Result<(), CommandError> {
    // Matching only the caller itself is allowed (re-casing one's own name)
    if registry
        .find_by_name(&name)
        .is_some_and(|client| client.id != caller)
    {
        return Err(CommandError::NameTaken(name));
    }

    let Some(client) = registry.get_mut(caller) else {
        return Ok(());
    };
    let old = client.set_name(name.clone());
    info!(client = %caller, "'{}' is now known as '{}'", old, name);

    broadcast(registry, &ServerLine::Renamed { old, new: name });
    Ok(())
}

/// Deliver a whisper to one recipient, with a copy to the caller
fn handle_msg<S: Write>(
    registry: &mut Registry<S>,
    caller: ClientId,
    to: &str,
    body: String,
) -> Result<(), CommandError> {
    let (recipient_id, recipient_name) = registry
        .find_by_name(to)
        .map(|client| (client.id, client.name().to_string()))
        .ok_or_else(|| CommandError::RecipientNotFound(to.to_string()))?;

    let Some(sender_name) = registry.get(caller).map(|c| c.name().to_string()) else {
        return Ok(());
    };

    debug!(client = %caller, recipient = %recipient_id, "Whisper");

    send_to(
        registry,
        caller,
        &ServerLine::WhisperTo {
            to: recipient_name,
            body: body.clone(),
        },
    );
    send_to(
        registry,
        recipient_id,
        &ServerLine::WhisperFrom {
            from: sender_name,
            body,
        },
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Client;
    use crate::testing::MockStream;

    fn registry_with(names: &[&str]) -> Registry<MockStream> {
        let mut registry = Registry::new();
        for (i, name) in names.iter().enumerate() {
            let addr = format!("127.0.0.1:{}", 6000 + i).parse().unwrap();
            registry
                .register(Client::new(ClientId(i + 2), addr, name.to_string(), MockStream::new(), 64))
                .unwrap();
        }
        registry
    }

    fn lines(registry: &Registry<MockStream>, id: usize) -> Vec<String> {
        registry.get(ClientId(id)).unwrap().stream().lines()
    }

    // ── Parsing ──────────────────────────────────────────────────

    #[test]
    fn test_parse_list() {
        assert_eq!(Command::parse("/list").unwrap(), Command::List);
        assert_eq!(Command::parse("/LIST").unwrap(), Command::List);
    }

    #[test]
    fn test_parse_nick() {
        assert_eq!(
            Command::parse("/nick alice").unwrap(),
            Command::Nick {
                name: "alice".to_string()
            }
        );
        assert_eq!(
            Command::parse("/nick").unwrap_err(),
            CommandError::MissingArgument
        );
        assert_eq!(
            Command::parse("/nick   ").unwrap_err(),
            CommandError::MissingArgument
        );
        assert_eq!(
            Command::parse("/nick a b").unwrap_err(),
            CommandError::InvalidName("a b".to_string())
        );
    }

    #[test]
    fn test_parse_msg_keeps_body_spaces() {
        assert_eq!(
            Command::parse("/msg bob hello  big world").unwrap(),
            Command::Msg {
                to: "bob".to_string(),
                body: "hello  big world".to_string()
            }
        );
        assert_eq!(
            Command::parse("/msg bob   indented text   ").unwrap(),
            Command::Msg {
                to: "bob".to_string(),
                body: "  indented text   ".to_string()
            }
        );
    }

    #[test]
    fn test_parse_msg_errors() {
        assert_eq!(
            Command::parse("/msg").unwrap_err(),
            CommandError::MissingArgument
        );
        assert_eq!(
            Command::parse("/msg bob").unwrap_err(),
            CommandError::MissingBody
        );
        assert_eq!(
            Command::parse("/msg bob   ").unwrap_err(),
            CommandError::MissingBody
        );
        assert_eq!(
            Command::parse("/msg bob \t ").unwrap_err(),
            CommandError::MissingBody
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            Command::parse("/dance now").unwrap_err(),
            CommandError::UnknownCommand("dance".to_string())
        );
        assert_eq!(
            Command::parse("/").unwrap_err(),
            CommandError::UnknownCommand(String::new())
        );
    }

    #[test]
    fn test_is_command() {
        assert!(is_command("/list"));
        assert!(!is_command("hello /list"));
        assert!(!is_command(""));
    }

    // ── Execution ────────────────────────────────────────────────

    #[test]
    fn test_list_replies_to_caller_only() {
        let mut registry = registry_with(&["alice", "bob"]);

        process(&mut registry, ClientId(2), "/list");

        assert_eq!(lines(&registry, 2), vec!["users online (2): alice, bob"]);
        assert!(lines(&registry, 3).is_empty());
    }

    #[test]
    fn test_nick_renames_and_announces() {
        let mut registry = registry_with(&["alice", "bob"]);

        process(&mut registry, ClientId(2), "/nick Ally");

        assert_eq!(registry.get(ClientId(2)).unwrap().name(), "Ally");
        assert_eq!(lines(&registry, 2), vec!["* alice is now known as Ally"]);
        assert_eq!(lines(&registry, 3), vec!["* alice is now known as Ally"]);
    }

    #[test]
    fn test_nick_taken_changes_nothing() {
        let mut registry = registry_with(&["alice", "bob"]);

        process(&mut registry, ClientId(2), "/nick BOB");

        assert_eq!(registry.get(ClientId(2)).unwrap().name(), "alice");
        assert_eq!(registry.get(ClientId(3)).unwrap().name(), "bob");
        assert_eq!(
            lines(&registry, 2),
            vec!["error: name 'BOB' is already taken"]
        );
        assert!(lines(&registry, 3).is_empty());
    }

    #[test]
    fn test_nick_taken_non_ascii() {
        let mut registry = registry_with(&["älice", "bob"]);

        process(&mut registry, ClientId(3), "/nick ÄLICE");

        assert_eq!(registry.get(ClientId(2)).unwrap().name(), "älice");
        assert_eq!(registry.get(ClientId(3)).unwrap().name(), "bob");
        assert_eq!(
            lines(&registry, 3),
            vec!["error: name 'ÄLICE' is already taken"]
        );
        assert!(lines(&registry, 2).is_empty());
    }

    #[test]
    fn test_nick_recase_own_name() {
        let mut registry = registry_with(&["alice"]);

        process(&mut registry, ClientId(2), "/nick ALICE");

        assert_eq!(registry.get(ClientId(2)).unwrap().name(), "ALICE");
    }

    #[test]
    fn test_nick_missing_argument() {
        let mut registry = registry_with(&["alice"]);

        process(&mut registry, ClientId(2), "/nick");

        assert_eq!(lines(&registry, 2), vec!["error: no name given"]);
    }

    #[test]
    fn test_msg_point_to_point() {
        let mut registry = registry_with(&["alice", "bob", "carol"]);

        process(&mut registry, ClientId(2), "/msg bob hello world");

        let to_caller = lines(&registry, 2);
        assert_eq!(to_caller.len(), 1);
        assert!(to_caller[0].contains("bob"));
        assert!(to_caller[0].contains("hello world"));

        let to_bob = lines(&registry, 3);
        assert_eq!(to_bob.len(), 1);
        assert!(to_bob[0].contains("alice"));
        assert!(to_bob[0].contains("hello world"));

        assert!(lines(&registry, 4).is_empty());
    }

    #[test]
    fn test_msg_body_delivered_verbatim() {
        let mut registry = registry_with(&["alice", "bob"]);

        process(&mut registry, ClientId(2), "/msg bob   indented text   ");

        assert_eq!(lines(&registry, 2), vec!["[to bob]:   indented text   "]);
        assert_eq!(lines(&registry, 3), vec!["[from alice]:   indented text   "]);
    }

    #[test]
    fn test_msg_unknown_recipient() {
        let mut registry = registry_with(&["alice", "bob"]);

        process(&mut registry, ClientId(2), "/msg dave hi");

        assert_eq!(lines(&registry, 2), vec!["error: no user named 'dave'"]);
        assert!(lines(&registry, 3).is_empty());
    }

    #[test]
    fn test_unknown_command_reply() {
        let mut registry = registry_with(&["alice"]);

        process(&mut registry, ClientId(2), "/dance");

        assert_eq!(lines(&registry, 2), vec!["error: unknown command 'dance'"]);
    }

    #[test]
    fn test_command_from_departed_caller_is_ignored() {
        let mut registry = registry_with(&["alice", "bob"]);
        registry.unregister(ClientId(2)).unwrap();

        process(&mut registry, ClientId(2), "/nick bob2");

        assert_eq!(registry.get(ClientId(3)).unwrap().name(), "bob");
        assert!(lines(&registry, 3).is_empty());
    }
}
