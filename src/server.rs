//! ChatServer event loop
//!
//! A single thread owns the listener, the poll registrations and the client
//! registry. Each iteration blocks in `Poll::poll` until some socket is ready,
//! then accepts new connections or drains readable clients. No locks: nothing
//! here is touched from another thread except the shutdown flag.

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token, Waker};
use tracing::{debug, error, info, trace, warn};

use crate::broadcast::{broadcast, broadcast_except, send_to};
use crate::client::Client;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::handler::{handle_readable, CloseReason, Disposition};
use crate::message::ServerLine;
use crate::registry::Registry;
use crate::types::{ClientId, IdAllocator, LISTENER, WAKER};

/// Stops a running server from any thread
///
/// Sets the shutdown flag and wakes the poll so the loop notices.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl ShutdownHandle {
    /// Request an orderly shutdown
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
        if let Err(e) = self.waker.wake() {
            error!("Failed to wake event loop for shutdown: {}", e);
        }
    }

    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// The chat relay server
///
/// Owns every piece of mutable state: the poll instance (readiness set),
/// the listener and the client registry.
pub struct ChatServer {
    poll: Poll,
    listener: TcpListener,
    local_addr: SocketAddr,
    /// All connected clients: ClientId -> Client
    registry: Registry<TcpStream>,
    ids: IdAllocator,
    config: ServerConfig,
    shutdown: ShutdownHandle,
}

impl ChatServer {
    /// Bind the listening socket and set up the poll
    pub fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let addr = config.listen_addr()?;
        let poll = Poll::new()?;

        let mut listener =
            TcpListener::bind(addr).map_err(|source| ServerError::Bind { addr, source })?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;
        let local_addr = listener.local_addr()?;

        let shutdown = ShutdownHandle {
            flag: Arc::new(AtomicBool::new(false)),
            waker: Arc::new(Waker::new(poll.registry(), WAKER)?),
        };

        Ok(Self {
            poll,
            listener,
            local_addr,
            registry: Registry::new(),
            ids: IdAllocator::new(),
            config,
            shutdown,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle for stopping the server from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Run the event loop
    ///
    /// Returns after a shutdown request, or with an error if polling fails.
    /// Either way every connection is closed before returning.
    pub fn run(mut self) -> Result<(), ServerError> {
        info!("ChatServer listening on {}", self.local_addr);

        let mut events = Events::with_capacity(self.config.event_capacity);
        let result = loop {
            if self.shutdown.is_shutdown() {
                break Ok(());
            }

            if let Err(e) = self.poll.poll(&mut events, None) {
                if e.kind() == ErrorKind::Interrupted {
                    continue;
                }
                error!("Poll failed: {}", e);
                break Err(ServerError::Poll(e));
            }

            for event in events.iter() {
                match event.token() {
                    LISTENER => self.accept_connections(),
                    WAKER => trace!("Event loop woken"),
                    token => self.handle_event(
                        token,
                        event.is_readable(),
                        event.is_error() || event.is_read_closed(),
                    ),
                }
            }
        };

        self.close_all();
        info!("ChatServer shutting down");
        result
    }

    /// Accept until the queue is drained
    fn accept_connections(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, addr)) => self.add_client(stream, addr),
                Err(e) => match e.kind() {
                    ErrorKind::WouldBlock => break,
                    ErrorKind::Interrupted => continue,
                    ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset => {
                        warn!("Transient accept error: {}", e);
                        continue;
                    }
                    _ => {
                        // Pending connections are picked up on the next readiness event
                        error!("Failed to accept connection: {}", e);
                        break;
                    }
                },
            }
        }

        self.reap_failed();
    }

    /// Register a freshly accepted connection
    fn add_client(&mut self, mut stream: TcpStream, addr: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!(peer = %addr, "Failed to set TCP_NODELAY: {}", e);
        }

        let id = self.ids.next_id();
        if let Err(e) = self
            .poll
            .registry()
            .register(&mut stream, id.token(), Interest::READABLE)
        {
            error!(peer = %addr, "Failed to register connection: {}", e);
            return;
        }

        let name = self.registry.unique_default_name(addr.to_string(), id);
        let client = Client::new(id, addr, name.clone(), stream, self.config.max_frame_len);
        if let Err(e) = self.registry.register(client) {
            error!(peer = %addr, "Failed to register client: {}", e);
            return;
        }

        info!(client = %id, peer = %addr, "Client connected");
        debug!("Total clients: {}", self.registry.len());

        send_to(&mut self.registry, id, &ServerLine::Welcome { name: name.clone() });
        broadcast_except(&mut self.registry, &ServerLine::Joined { name }, id);
    }

    /// Process one event for a client socket
    ///
    /// `hangup` covers both error and peer-closed readiness.
    fn handle_event(&mut self, token: Token, readable: bool, hangup: bool) {
        let Some(id) = ClientId::from_token(token) else {
            return;
        };
        if !self.registry.contains(id) {
            // Torn down earlier in this batch
            trace!(client = %id, "Event for closed connection");
            return;
        }

        let disposition = if readable {
            handle_readable(&mut self.registry, id)
        } else if hangup {
            Disposition::Close(CloseReason::Hangup)
        } else {
            Disposition::Keep
        };

        if let Disposition::Close(reason) = disposition {
            self.teardown(id, reason);
        }
        self.reap_failed();
    }

    /// Tear down every client a send has failed on
    ///
    /// Leave notices can fail further clients, so repeat until none remain.
    fn reap_failed(&mut self) {
        loop {
            let failed = self.registry.failed_handles();
            if failed.is_empty() {
                break;
            }
            for id in failed {
                self.teardown(id, CloseReason::SendFailed);
            }
        }
    }

    /// Remove a client, deregister and close its socket, notify the rest
    ///
    /// No-op for a handle that is already gone.
    fn teardown(&mut self, id: ClientId, reason: CloseReason) {
        let Ok(mut client) = self.registry.unregister(id) else {
            return;
        };

        if let Err(e) = self.poll.registry().deregister(client.stream_mut()) {
            warn!(client = %id, "Failed to deregister connection: {}", e);
        }

        match reason {
            CloseReason::Disconnected => {
                info!(client = %id, peer = %client.addr, "Client disconnected")
            }
            reason => {
                warn!(client = %id, peer = %client.addr, "Client dropped: {}", reason)
            }
        }

        let name = client.name().to_string();
        // Dropping the stream closes the socket
        drop(client.into_stream());
        debug!("Total clients: {}", self.registry.len());

        broadcast(&mut self.registry, &ServerLine::Left { name });
    }

    /// Close every connection and the listener
    fn close_all(&mut self) {
        info!("Closing {} connections", self.registry.len());

        for id in self.registry.handles() {
            if let Ok(mut client) = self.registry.unregister(id) {
                if let Err(e) = self.poll.registry().deregister(client.stream_mut()) {
                    debug!(client = %id, "Failed to deregister connection: {}", e);
                }
            }
        }

        if let Err(e) = self.poll.registry().deregister(&mut self.listener) {
            debug!("Failed to deregister listener: {}", e);
        }
    }
}
