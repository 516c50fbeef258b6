//! Client registry
//!
//! Owns every connected client, keyed by handle, with an insertion-order view
//! for enumeration and broadcast.

use std::collections::HashMap;

use crate::client::Client;
use crate::error::RegistryError;
use crate::types::ClientId;

/// Registry of connected clients
///
/// Uses HashMap for O(1) handle lookups. Name lookups are a linear scan,
/// which is fine for the client counts a chat relay sees.
#[derive(Debug)]
pub struct Registry<S> {
    /// All connected clients: ClientId -> Client
    clients: HashMap<ClientId, Client<S>>,
    /// Handles in insertion order
    order: Vec<ClientId>,
}

impl<S> Registry<S> {
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Add a client
    ///
    /// Returns a reference to the stored client, or `DuplicateHandle` if a
    /// client with the same handle is already registered.
    pub fn register(&mut self, client: Client<S>) -> Result<&mut Client<S>, RegistryError> {
        let id = client.id;
        if self.clients.contains_key(&id) {
            return Err(RegistryError::DuplicateHandle(id));
        }
        self.order.push(id);
        Ok(self.clients.entry(id).or_insert(client))
    }

    /// Remove a client, handing back ownership for teardown
    pub fn unregister(&mut self, id: ClientId) -> Result<Client<S>, RegistryError> {
        let client = self
            .clients
            .remove(&id)
            .ok_or(RegistryError::NotFound(id))?;
        self.order.retain(|&other| other != id);
        Ok(client)
    }

    pub fn get(&self, id: ClientId) -> Option<&Client<S>> {
        self.clients.get(&id)
    }

    pub fn get_mut(&mut self, id: ClientId) -> Option<&mut Client<S>> {
        self.clients.get_mut(&id)
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.clients.contains_key(&id)
    }

    /// Find a client by display name (Unicode case-insensitive)
    ///
    /// Returns the earliest registered match.
    pub fn find_by_name(&self, name: &str) -> Option<&Client<S>> {
        let folded = name.to_lowercase();
        self.iter()
            .find(|client| client.name().to_lowercase() == folded)
    }

    /// Clients in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Client<S>> {
        self.order.iter().filter_map(|id| self.clients.get(id))
    }

    /// Snapshot of handles in insertion order
    pub fn handles(&self) -> Vec<ClientId> {
        self.order.clone()
    }

    /// Snapshot of display names in insertion order
    pub fn names(&self) -> Vec<String> {
        self.iter().map(|client| client.name().to_string()).collect()
    }

    /// Handles of clients whose last send failed
    pub fn failed_handles(&self) -> Vec<ClientId> {
        self.iter()
            .filter(|client| client.is_failed())
            .map(|client| client.id)
            .collect()
    }

    /// Pick a default name that does not collide with a registered one
    ///
    /// Another client may have renamed itself to look like an address; the
    /// handle suffix keeps the new name unique.
    pub fn unique_default_name(&self, candidate: String, id: ClientId) -> String {
        if self.find_by_name(&candidate).is_none() {
            candidate
        } else {
            format!("{candidate}{id}")
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl<S> Default for Registry<S> {
    fn default() -> Self {
        Self::new()
    }
}
