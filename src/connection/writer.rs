//! Dedicated writer task for the outbound half of a connection.
//!
//! Each established connection spawns one writer task that drains an mpsc
//! channel into the socket's write half. Handlers and external callers send
//! through a cheaply cloneable [`Outbound`] handle, so the socket itself
//! stays exclusively owned by the connection.
//!
//! ```text
//! Handler   ─┐
//! Caller    ─┼─► mpsc::Sender<Bytes> ─► Writer Task ─► Socket
//! RetryLoop ─┘
//! ```
//!
//! The channel's bounded capacity doubles as backpressure: `send` waits for
//! space, `try_send` fails fast with [`FramewireError::Backpressure`].

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::hex_preview;
use crate::error::{FramewireError, Result};

/// Default outbound channel capacity (chunks, not bytes).
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 64;

/// Handle for sending bytes to a connection's writer task.
///
/// Cloning is cheap; all clones feed the same connection. A handle outlives
/// its connection harmlessly: sends on a dead connection fail with
/// [`FramewireError::NotConnected`].
#[derive(Debug, Clone)]
pub struct Outbound {
    tx: mpsc::Sender<Bytes>,
}

impl Outbound {
    /// Send a chunk, waiting for channel capacity if the writer is behind.
    pub async fn send(&self, data: impl Into<Bytes>) -> Result<()> {
        self.tx
            .send(data.into())
            .await
            .map_err(|_| FramewireError::NotConnected)
    }

    /// Send a chunk without waiting. Intended for use inside handler
    /// callbacks, which are synchronous.
    ///
    /// # Errors
    ///
    /// - [`FramewireError::Backpressure`] if the channel is full.
    /// - [`FramewireError::NotConnected`] if the connection is gone.
    pub fn try_send(&self, data: impl Into<Bytes>) -> Result<()> {
        self.tx.try_send(data.into()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => FramewireError::Backpressure,
            mpsc::error::TrySendError::Closed(_) => FramewireError::NotConnected,
        })
    }

    /// Whether the backing connection has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Spawn the writer task for a freshly established connection.
///
/// The task runs until the connection is torn down or a write fails; write
/// failures are logged and surface to the reader side as connection loss.
pub(crate) fn spawn_writer_task<W>(
    mut writer: W,
    capacity: usize,
    peer: String,
) -> (Outbound, JoinHandle<()>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<Bytes>(capacity);

    let task = tokio::spawn(async move {
        while let Some(chunk) = rx.recv().await {
            tracing::trace!(peer = %peer, "TXD > {}", hex_preview(&chunk));
            if let Err(e) = writer.write_all(&chunk).await {
                tracing::warn!(peer = %peer, "outbound write failed: {}", e);
                return;
            }
        }
        // Channel closed: the connection is being torn down.
        let _ = writer.shutdown().await;
    });

    (Outbound { tx }, task)
}
