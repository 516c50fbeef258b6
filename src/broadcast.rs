//! Fan-out helpers
//!
//! Deliver `ServerLine`s to one, all, or all-but-one registered clients.
//! A failed send is logged and marks that recipient for teardown; delivery to
//! the remaining recipients continues.

use std::io::Write;

use tracing::warn;

use crate::message::ServerLine;
use crate::registry::Registry;
use crate::types::ClientId;

/// Send a line to one client
///
/// Returns false if the client is gone or the send failed.
pub fn send_to<S: Write>(registry: &mut Registry<S>, id: ClientId, line: &ServerLine) -> bool {
    let Some(client) = registry.get_mut(id) else {
        return false;
    };

    match client.send(line) {
        Ok(()) => true,
        Err(e) => {
            warn!(client = %id, peer = %client.addr, "Send failed: {}", e);
            false
        }
    }
}

/// Send a line to every registered client
///
/// Returns the number of successful sends.
pub fn broadcast<S: Write>(registry: &mut Registry<S>, line: &ServerLine) -> usize {
    broadcast_filtered(registry, line, None)
}

/// Send a line to every registered client except one
pub fn broadcast_except<S: Write>(
    registry: &mut Registry<S>,
    line: &ServerLine,
    except: ClientId,
) -> usize {
    broadcast_filtered(registry, line, Some(except))
}

/// Relay a chat message from `sender` to everyone, the sender included
pub fn chat<S: Write>(registry: &mut Registry<S>, sender: ClientId, body: String) -> usize {
    let Some(client) = registry.get(sender) else {
        return 0;
    };

    let line = ServerLine::Chat {
        from: client.name().to_string(),
        body,
    };
    broadcast(registry, &line)
}

fn broadcast_filtered<S: Write>(
    registry: &mut Registry<S>,
    line: &ServerLine,
    except: Option<ClientId>,
) -> usize {
    registry
        .handles()
        .into_iter()
        .filter(|&id| Some(id) != except)
        .filter(|&id| send_to(registry, id, line))
        .count()
}
