//! Connection module - lifecycle management for one logical TCP peer.
//!
//! Provides:
//! - [`ManagedConnection`] - connect/disconnect/pump for a single peer, with
//!   events delivered to an injected [`ConnectionHandler`]
//! - [`RetryingConnection`] - the reconnecting variant with bounded
//!   exponential backoff, jitter, and cooperative cancellation
//! - [`Outbound`] - clonable write handle backed by a dedicated writer task
//!
//! Each instance manages exactly one logical connection; run one instance per
//! peer. Instances are independent and share no mutable state.

mod handler;
mod managed;
mod retry;
mod writer;

pub use handler::ConnectionHandler;
pub use managed::{
    ConnectionConfig, ConnectionState, ManagedConnection, DEFAULT_READ_BUFFER_SIZE,
};
pub use retry::{
    CancelHandle, RetryPolicy, RetryingConnection, RetryingConnectionBuilder,
    DEFAULT_INITIAL_DELAY, DEFAULT_JITTER_FRACTION, DEFAULT_MAX_DELAY, GOLDEN_RATIO_FACTOR,
};
pub use writer::{Outbound, DEFAULT_OUTBOUND_CAPACITY};

/// Space-separated hex rendering for RXD/TXD trace logs, capped so a large
/// chunk does not flood the log.
pub(crate) fn hex_preview(data: &[u8]) -> String {
    use std::fmt::Write;

    const MAX_BYTES: usize = 64;

    let mut out = String::with_capacity(data.len().min(MAX_BYTES) * 3 + 16);
    for (i, byte) in data.iter().take(MAX_BYTES).enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{:02x}", byte);
    }
    if data.len() > MAX_BYTES {
        let _ = write!(out, " .. ({} bytes)", data.len());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::hex_preview;

    #[test]
    fn test_hex_preview_short() {
        assert_eq!(hex_preview(b"\x01\x02\xff"), "01 02 ff");
        assert_eq!(hex_preview(b""), "");
    }

    #[test]
    fn test_hex_preview_truncates() {
        let data = vec![0xabu8; 100];
        let rendered = hex_preview(&data);
        assert!(rendered.ends_with(".. (100 bytes)"));
    }
}
