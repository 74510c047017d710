//! Connection event handler - the capability interface a connection drives.
//!
//! A [`ConnectionHandler`] is injected at construction and receives every
//! lifecycle and data event for its connection. Framing and business logic
//! live entirely in the handler; the connection itself never reframes bytes.
//!
//! # Example
//!
//! ```ignore
//! use framewire::connection::{ConnectionHandler, Outbound};
//! use framewire::framing::{FrameBuffer, FramingStrategy};
//!
//! struct LineHandler {
//!     buffer: FrameBuffer,
//!     outbound: Option<Outbound>,
//! }
//!
//! impl ConnectionHandler for LineHandler {
//!     fn on_connected(&mut self, outbound: Outbound) {
//!         self.outbound = Some(outbound);
//!     }
//!
//!     fn on_data_received(&mut self, chunk: &[u8]) {
//!         for frame in self.buffer.push(chunk).unwrap() {
//!             println!("line: {:?}", frame);
//!         }
//!     }
//!
//!     fn on_disconnected(&mut self, _cause: Option<&std::io::Error>) {
//!         self.outbound = None;
//!     }
//! }
//! ```

use std::io;

use super::Outbound;

/// Event callbacks a [`ManagedConnection`](super::ManagedConnection) invokes.
///
/// Events for one connection are strictly ordered: `on_connected`, zero or
/// more `on_data_received`, then at most one `on_disconnected` per
/// established connection. They are never invoked concurrently.
///
/// All methods have empty default bodies so implementers only override what
/// they need.
pub trait ConnectionHandler: Send + 'static {
    /// The connection is established. `outbound` is a fresh write handle for
    /// this connection; handles from a previous connection are dead after a
    /// reconnect.
    fn on_connected(&mut self, outbound: Outbound) {
        let _ = outbound;
    }

    /// A raw chunk arrived from the transport. Chunks are delivered exactly
    /// once, in arrival order, with no reframing - the handler typically owns
    /// a [`FrameBuffer`](crate::framing::FrameBuffer) and pushes into it here.
    fn on_data_received(&mut self, chunk: &[u8]) {
        let _ = chunk;
    }

    /// The transport-side connection ended. `cause` carries the error detail
    /// for an abnormal loss (peer close, reset, I/O error); it is `None` only
    /// for a locally initiated transport shutdown. A voluntary
    /// [`disconnect`](super::ManagedConnection::disconnect) does not invoke
    /// this at all.
    fn on_disconnected(&mut self, cause: Option<&io::Error>) {
        let _ = cause;
    }
}
