//! Framing module - turning an unbounded byte stream into discrete frames.
//!
//! This module implements the receive-side framing layer:
//! - [`FramingStrategy`] - the four supported boundary rules
//! - [`FrameBuffer`] - capacity-bounded accumulation and frame extraction
//!
//! The framing layer is purely reactive: push raw bytes in, pull complete
//! frames out. It holds no connection state and performs no I/O, so it can
//! be owned by whatever consumes the stream - typically a
//! [`ConnectionHandler`](crate::connection::ConnectionHandler).

mod buffer;
mod strategy;

pub use buffer::{FrameBuffer, DEFAULT_CAPACITY};
pub use strategy::FramingStrategy;
