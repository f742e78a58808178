//! Per-peer connection handling.
//!
//! Each peer gets one [`Connection`] task that bridges raw socket I/O and
//! the parser/builder pair, plus a cheap [`ConnectionHandle`] through which
//! the rest of the core (and event handlers) enqueue outbound messages.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use distcraft_protocol::{MessageBuilder, MessageParser, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::core::DistCore;
use crate::registry::EventSource;

/// Unique identifier for one peer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a peer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

#[derive(Debug)]
pub(crate) enum Outbound {
    Data(Bytes),
    /// Close the socket once everything queued before this has drained.
    Close,
}

/// Cheap, cloneable handle to a live connection.
///
/// Messages enqueued here are written by the connection task in order; a
/// handle whose connection has already closed drops them silently.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    addr: SocketAddr,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl ConnectionHandle {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Remote address of the peer.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Enqueue a single-event message for this peer.
    pub fn send_event<I>(&self, name: &str, args: I)
    where
        I: IntoIterator<Item = Value>,
    {
        let mut builder = MessageBuilder::new();
        builder.add_event(name, args);
        self.send_bytes(builder.finish());
    }

    /// Enqueue pre-serialized wire bytes.
    pub fn send_bytes(&self, bytes: Bytes) {
        if self.outbound.send(Outbound::Data(bytes)).is_err() {
            trace!(connection = %self.id, "dropping message for closed connection");
        }
    }

    /// Send the post-accept greeting.
    pub fn greet(&self) {
        self.send_event("client.greeting", []);
    }

    /// Ask the peer to go away, then close once the outbound queue drains.
    /// Queued bytes are never dropped.
    pub fn kill(&self) {
        self.send_event("server.disconnect", []);
        let _ = self.outbound.send(Outbound::Close);
    }

    /// Report a decode failure back to the peer.
    pub fn send_error(&self, text: &str) {
        self.send_event("client.protocol.error", [Value::Str(text.to_string())]);
    }
}

/// The task-side half of a peer session: owns the socket, the parser and
/// the outbound queue receiver.
pub(crate) struct Connection {
    core: Arc<DistCore>,
    handle: ConnectionHandle,
    stream: TcpStream,
    parser: MessageParser,
    outbound_rx: mpsc::UnboundedReceiver<Outbound>,
    state: ConnectionState,
    greet_on_start: bool,
}

impl Connection {
    /// Wrap a freshly accepted peer socket.
    pub(crate) fn accepted(
        core: Arc<DistCore>,
        stream: TcpStream,
        addr: SocketAddr,
    ) -> (Self, ConnectionHandle) {
        Self::new(core, stream, addr, true)
    }

    /// Wrap an outbound socket to a remote node; the remote side greets.
    pub(crate) fn outbound(
        core: Arc<DistCore>,
        stream: TcpStream,
        addr: SocketAddr,
    ) -> (Self, ConnectionHandle) {
        Self::new(core, stream, addr, false)
    }

    fn new(
        core: Arc<DistCore>,
        stream: TcpStream,
        addr: SocketAddr,
        greet_on_start: bool,
    ) -> (Self, ConnectionHandle) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let handle = ConnectionHandle {
            id: ConnectionId::new(),
            addr,
            outbound: outbound_tx,
        };
        let parser = MessageParser::with_minimum_version(core.config().min_protocol_version);
        let connection = Self {
            core,
            handle: handle.clone(),
            stream,
            parser,
            outbound_rx,
            state: ConnectionState::Connecting,
            greet_on_start,
        };
        (connection, handle)
    }

    /// Drive this connection until the peer goes away or `kill` drains.
    pub(crate) async fn run(mut self) {
        self.state = ConnectionState::Open;
        if self.greet_on_start {
            self.handle.greet();
        }

        let mut buf = vec![0u8; 4096];
        loop {
            tokio::select! {
                result = self.stream.read(&mut buf) => match result {
                    Ok(0) => {
                        debug!(connection = %self.handle.id(), "peer closed the stream");
                        break;
                    }
                    Ok(n) => self.on_readable(&buf[..n]),
                    Err(e) => {
                        debug!(connection = %self.handle.id(), error = %e, "read failed");
                        break;
                    }
                },
                queued = self.outbound_rx.recv() => match queued {
                    Some(Outbound::Data(bytes)) => {
                        if let Err(e) = self.stream.write_all(&bytes).await {
                            debug!(connection = %self.handle.id(), error = %e, "write failed");
                            break;
                        }
                    }
                    Some(Outbound::Close) => {
                        self.state = ConnectionState::Closing;
                        let _ = self.stream.shutdown().await;
                        break;
                    }
                    None => break,
                },
            }
        }

        self.state = ConnectionState::Closed;
        trace!(connection = %self.handle.id(), state = ?self.state, "connection finished");
        self.core.on_client_disconnect(&self.handle);
    }

    /// Feed newly available bytes to the parser and fire what it decoded.
    ///
    /// A protocol error is reported to the peer and logged; the connection
    /// stays open and the parser is reset before the next feed. Several
    /// messages arriving in one read are decoded one after another.
    fn on_readable(&mut self, mut bytes: &[u8]) {
        let mut events = Vec::new();
        while !bytes.is_empty() {
            if self.parser.needs_reset() {
                self.parser.reset();
            }
            let result = self.parser.feed_until_finished(bytes, &mut events);
            let source = EventSource::Peer(self.handle.clone());
            for event in events.drain(..) {
                self.core.fire_event(&event.name, &source, &event.args);
            }
            match result {
                Ok(consumed) => bytes = &bytes[consumed..],
                Err(e) => {
                    warn!(connection = %self.handle.id(), error = %e, "protocol error");
                    self.handle.send_error(&e.to_string());
                    return;
                }
            }
        }
    }
}
