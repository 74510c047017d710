//! Error types for framewire.

use thiserror::Error;

/// Main error type for all framewire operations.
#[derive(Debug, Error)]
pub enum FramewireError {
    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A single chunk was longer than the buffer's total capacity.
    #[error("frame too large: chunk is {length} bytes, capacity is {capacity}")]
    FrameTooLarge { length: usize, capacity: usize },

    /// Appending the chunk would exceed the buffer's capacity.
    #[error("buffer overflow: total would be {length} bytes, capacity is {capacity}")]
    BufferOverflow { length: usize, capacity: usize },

    /// Invalid framing strategy parameters (empty delimiter, zero length, ...).
    #[error("invalid framing strategy: {0}")]
    InvalidStrategy(String),

    /// Operation requires a live connection.
    #[error("not connected")]
    NotConnected,

    /// Connect attempt did not complete within the configured timeout.
    #[error("connect timed out")]
    ConnectTimeout,

    /// Outbound channel is full; the peer is not draining fast enough.
    #[error("outbound backpressure")]
    Backpressure,
}

/// Result type alias using FramewireError.
pub type Result<T> = std::result::Result<T, FramewireError>;
