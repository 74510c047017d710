//! Managed connection - lifecycle of one outbound TCP connection.
//!
//! A [`ManagedConnection`] owns the socket for a single logical peer, drives
//! the state machine `Idle -> Connecting -> Connected -> Disconnected`, and
//! delivers lifecycle/data events to the injected
//! [`ConnectionHandler`](super::ConnectionHandler). It never retries on its
//! own; reconnection is the explicit opt-in capability of
//! [`RetryingConnection`](super::RetryingConnection).

use std::io;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use super::writer::{spawn_writer_task, Outbound, DEFAULT_OUTBOUND_CAPACITY};
use super::{hex_preview, ConnectionHandler};
use crate::error::{FramewireError, Result};

/// Default read buffer size for the pump loop.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 8192;

/// Connection lifecycle states.
///
/// `Retrying` is only entered by the retrying variant, while a reconnect
/// timer is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Created, never connected.
    Idle,
    /// Connect attempt in flight.
    Connecting,
    /// Socket established and owned.
    Connected,
    /// Reconnect timer pending (retrying variant only).
    Retrying,
    /// No socket; either lost or voluntarily closed.
    Disconnected,
}

/// Configuration for a managed connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Size of the read buffer handed to the socket.
    pub read_buffer_size: usize,
    /// Outbound channel capacity (chunks).
    pub outbound_capacity: usize,
    /// Bound on each connect attempt; `None` leaves it to the OS.
    pub connect_timeout: Option<Duration>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            connect_timeout: None,
        }
    }
}

/// One outbound TCP connection and its event delivery.
///
/// The socket handle is present iff the state is [`ConnectionState::Connected`]
/// and is exclusively owned: reads happen in [`pump`](Self::pump), writes go
/// through the writer task behind [`Outbound`].
pub struct ManagedConnection<H: ConnectionHandler> {
    host: String,
    port: u16,
    state: ConnectionState,
    reader: Option<tokio::net::tcp::OwnedReadHalf>,
    outbound: Option<Outbound>,
    writer_task: Option<JoinHandle<()>>,
    handler: H,
    config: ConnectionConfig,
}

impl<H: ConnectionHandler> ManagedConnection<H> {
    /// Create a connection for the given peer with default configuration.
    pub fn new(host: impl Into<String>, port: u16, handler: H) -> Self {
        Self::with_config(host, port, handler, ConnectionConfig::default())
    }

    /// Create a connection with custom configuration.
    pub fn with_config(
        host: impl Into<String>,
        port: u16,
        handler: H,
        config: ConnectionConfig,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            state: ConnectionState::Idle,
            reader: None,
            outbound: None,
            writer_task: None,
            handler,
            config,
        }
    }

    /// Establish the connection.
    ///
    /// A no-op with a warning when already connected. On success the state
    /// becomes `Connected` and the handler's `on_connected` runs with a fresh
    /// [`Outbound`] handle. On refusal or timeout the failure is returned to
    /// the caller without any retrying.
    pub async fn connect(&mut self) -> Result<()> {
        if self.state == ConnectionState::Connected {
            tracing::warn!(peer = %self.peer_addr(), "already connected");
            return Ok(());
        }

        self.state = ConnectionState::Connecting;
        let attempt = TcpStream::connect((self.host.as_str(), self.port));
        let stream = match self.config.connect_timeout {
            Some(limit) => match tokio::time::timeout(limit, attempt).await {
                Ok(result) => result,
                Err(_) => {
                    self.state = ConnectionState::Disconnected;
                    tracing::error!(
                        peer = %self.peer_addr(),
                        "connect timed out after {:?}",
                        limit
                    );
                    return Err(FramewireError::ConnectTimeout);
                }
            },
            None => attempt.await,
        };

        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                tracing::error!(peer = %self.peer_addr(), "failed to connect: {}", e);
                return Err(e.into());
            }
        };

        let (reader, writer) = stream.into_split();
        let (outbound, task) =
            spawn_writer_task(writer, self.config.outbound_capacity, self.peer_addr());

        self.reader = Some(reader);
        self.outbound = Some(outbound.clone());
        self.writer_task = Some(task);
        self.state = ConnectionState::Connected;

        tracing::debug!(peer = %self.peer_addr(), "connection made");
        self.handler.on_connected(outbound);
        Ok(())
    }

    /// Voluntarily close the connection.
    ///
    /// Valid only while connected. Releases the socket and transitions to
    /// `Disconnected` without invoking `on_disconnected` - that event is
    /// reserved for losses originating from the transport.
    pub fn disconnect(&mut self) -> Result<()> {
        if self.state != ConnectionState::Connected {
            return Err(FramewireError::NotConnected);
        }
        self.teardown();
        tracing::info!(peer = %self.peer_addr(), "disconnected");
        Ok(())
    }

    /// Send a chunk over the live connection.
    pub async fn send(&self, data: impl Into<Bytes>) -> Result<()> {
        match &self.outbound {
            Some(outbound) => outbound.send(data).await,
            None => Err(FramewireError::NotConnected),
        }
    }

    /// Run the read loop until the connection ends.
    ///
    /// Each arriving chunk is handed to `on_data_received` exactly once, in
    /// arrival order. When the transport side ends the connection (peer
    /// close, reset, I/O error) the state becomes `Disconnected`,
    /// `on_disconnected` runs exactly once with the cause, and the cause is
    /// returned so a retry driver can observe the transition synchronously.
    ///
    /// Calling this while not connected is a caller contract violation and
    /// fails with [`FramewireError::NotConnected`].
    pub async fn pump(&mut self) -> Result<Option<io::Error>> {
        if self.state != ConnectionState::Connected {
            return Err(FramewireError::NotConnected);
        }

        let mut buf = vec![0u8; self.config.read_buffer_size];
        let cause = loop {
            let reader = match self.reader.as_mut() {
                Some(reader) => reader,
                None => return Err(FramewireError::NotConnected),
            };
            match reader.read(&mut buf).await {
                Ok(0) => {
                    break Some(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed by peer",
                    ));
                }
                Ok(n) => {
                    tracing::trace!(peer = %self.peer_addr(), "RXD < {}", hex_preview(&buf[..n]));
                    self.handler.on_data_received(&buf[..n]);
                }
                Err(e) => break Some(e),
            }
        };

        self.teardown();
        match &cause {
            Some(e) => tracing::error!(peer = %self.peer_addr(), "connection lost: {}", e),
            None => tracing::info!(peer = %self.peer_addr(), "connection closed"),
        }
        self.handler.on_disconnected(cause.as_ref());
        Ok(cause)
    }

    /// Release the socket and writer; state becomes `Disconnected`.
    fn teardown(&mut self) {
        self.reader = None;
        self.outbound = None;
        if let Some(task) = self.writer_task.take() {
            task.abort();
        }
        self.state = ConnectionState::Disconnected;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
    }

    /// Whether a socket is currently established.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// The peer's host.
    pub fn peer_host(&self) -> &str {
        &self.host
    }

    /// The peer's port.
    pub fn peer_port(&self) -> u16 {
        self.port
    }

    /// `host:port` rendering for diagnostics.
    pub fn peer_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Borrow the handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Mutably borrow the handler.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }
}
