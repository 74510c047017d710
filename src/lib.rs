//! # framewire
//!
//! Byte-stream framing and reconnecting TCP client lifecycle management.
//!
//! Two independent components, composed by the caller:
//!
//! - **Framing** ([`framing`]): a [`FrameBuffer`] accumulates raw bytes and
//!   extracts complete application messages using one of four
//!   [`FramingStrategy`] boundary rules. Purely reactive; no I/O, no
//!   connection state.
//! - **Connection** ([`connection`]): a [`ManagedConnection`] owns one
//!   outbound TCP connection and delivers lifecycle/data events to an
//!   injected [`ConnectionHandler`]; [`RetryingConnection`] re-establishes it
//!   after loss using bounded exponential backoff with jitter.
//!
//! Raw bytes flow from the connection to the handler, which owns a frame
//! buffer and pulls complete frames out of it. The connection never reframes;
//! the buffer never connects.
//!
//! ## Example
//!
//! ```ignore
//! use framewire::connection::{ConnectionHandler, Outbound, RetryingConnection};
//! use framewire::framing::{FrameBuffer, FramingStrategy};
//!
//! struct LineHandler {
//!     buffer: FrameBuffer,
//! }
//!
//! impl ConnectionHandler for LineHandler {
//!     fn on_connected(&mut self, outbound: Outbound) {
//!         let _ = outbound.try_send(&b"hello\r\n"[..]);
//!     }
//!
//!     fn on_data_received(&mut self, chunk: &[u8]) {
//!         for frame in self.buffer.push(chunk).unwrap() {
//!             println!("line: {}", String::from_utf8_lossy(&frame));
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> framewire::Result<()> {
//!     let handler = LineHandler {
//!         buffer: FrameBuffer::new(FramingStrategy::delimiter(&b"\r\n"[..])?),
//!     };
//!     let mut conn = RetryingConnection::new("127.0.0.1", 7000, handler);
//!     conn.run().await
//! }
//! ```

pub mod connection;
pub mod error;
pub mod framing;

pub use connection::{ConnectionHandler, ManagedConnection, Outbound, RetryingConnection};
pub use error::{FramewireError, Result};
pub use framing::{FrameBuffer, FramingStrategy};
