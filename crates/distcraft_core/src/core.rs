//! The core dispatcher.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use dashmap::DashMap;
use distcraft_protocol::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::connection::{Connection, ConnectionHandle, ConnectionId};
use crate::error::{RegistryError, ServerError};
use crate::registry::{EventRegistry, EventSource};

/// The Distcraft core: listening endpoint, event registry and the set of
/// live connections.
///
/// All state is owned per instance and constructed explicitly; two cores in
/// one process share nothing. Event firing is serialized by the registry
/// mutex, so handlers never race each other.
pub struct DistCore {
    config: ServerConfig,
    registry: EventRegistry,
    connections: DashMap<ConnectionId, ConnectionHandle>,
    shutdown: watch::Sender<bool>,
}

impl DistCore {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let (shutdown, _) = watch::channel(false);
        Arc::new(Self {
            config,
            registry: EventRegistry::new(),
            connections: DashMap::new(),
            shutdown,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Insert or overwrite the handler for an event name.
    pub fn register_event_handler<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&EventSource, &[Value]) + Send + Sync + 'static,
    {
        self.registry.register(name, handler);
    }

    /// Remove a registered handler; fails when the name is absent.
    pub fn unregister_event_handler(&self, name: &str) -> Result<(), RegistryError> {
        self.registry.unregister(name)
    }

    /// Fire a named event. Unroutable events are logged and dropped; this
    /// never fails.
    pub fn fire_event(&self, name: &str, source: &EventSource, args: &[Value]) {
        self.registry.fire(name, source, args);
    }

    /// Bind the loopback endpoint and accept peers until shutdown.
    ///
    /// Failure to bind is the only fatal error; everything after that is
    /// handled per connection.
    pub async fn listen(self: Arc<Self>) -> Result<(), ServerError> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, self.config.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        info!("listening on {}", addr);

        let mut shutdown_rx = self.shutdown.subscribe();
        loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, peer)) => Self::on_accept_client(&self, stream, peer),
                    Err(e) => error!(error = %e, "failed to accept connection"),
                },
                _ = shutdown_rx.changed() => {
                    info!("shutdown signal received, stopping accept loop");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Built-in accept path: wrap the socket, greet the peer, track it and
    /// tell observers about it.
    fn on_accept_client(this: &Arc<Self>, stream: TcpStream, addr: SocketAddr) {
        if this.connections.len() >= this.config.max_connections {
            warn!(peer = %addr, "connection limit reached, refusing peer");
            return;
        }
        let (connection, handle) = Connection::accepted(this.clone(), stream, addr);
        this.connections.insert(handle.id(), handle);
        info!(peer = %addr, "new client connected");
        this.fire_event(
            "distcraft.server.new_client",
            &EventSource::Server,
            &[Value::Str(addr.to_string())],
        );
        tokio::spawn(connection.run());
    }

    /// Dial a remote node and drive the resulting connection like any
    /// accepted one. The remote side sends the greeting.
    pub async fn connect(
        self: Arc<Self>,
        addr: SocketAddr,
    ) -> Result<ConnectionHandle, ServerError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| ServerError::Connect { addr, source })?;
        let (connection, handle) = Connection::outbound(self.clone(), stream, addr);
        self.connections.insert(handle.id(), handle.clone());
        info!(peer = %addr, "connected to remote node");
        tokio::spawn(connection.run());
        Ok(handle)
    }

    /// Built-in disconnect path: forget the connection and tell observers.
    /// Transport errors end up here, never as propagated failures.
    pub(crate) fn on_client_disconnect(&self, handle: &ConnectionHandle) {
        if self.connections.remove(&handle.id()).is_some() {
            info!(peer = %handle.addr(), "client disconnected");
            self.fire_event(
                "client.disconnect",
                &EventSource::Server,
                &[Value::Str(handle.addr().to_string())],
            );
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Stop accepting and ask every live peer to close cooperatively.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
        for entry in self.connections.iter() {
            entry.value().kill();
        }
    }
}
