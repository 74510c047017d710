//! Frame buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for zero-copy buffer management. Raw chunks are
//! appended as they arrive from the socket; complete frames are extracted
//! according to the configured [`FramingStrategy`]. Partial data stays
//! buffered until later pushes complete it, so callers never see a frame
//! split across reads.
//!
//! # Example
//!
//! ```
//! use framewire::framing::{FrameBuffer, FramingStrategy};
//!
//! let strategy = FramingStrategy::delimiter(&b"\r\n"[..]).unwrap();
//! let mut buffer = FrameBuffer::new(strategy);
//!
//! let frames = buffer.push(b"hello\r\nwor").unwrap();
//! assert_eq!(frames, vec![&b"hello"[..]]);
//!
//! let frames = buffer.push(b"ld\r\n").unwrap();
//! assert_eq!(frames, vec![&b"world"[..]]);
//! ```

use bytes::{Bytes, BytesMut};

use super::FramingStrategy;
use crate::error::{FramewireError, Result};

/// Default maximum number of buffered bytes.
pub const DEFAULT_CAPACITY: usize = 16384;

/// Buffer for accumulating incoming bytes and extracting complete frames.
///
/// The buffer never holds more than `capacity` bytes. A push that would
/// exceed the capacity fails without mutating buffered state, so the caller
/// can decide whether to drop the connection or the oversized frame and the
/// already-buffered prefix stays intact either way.
pub struct FrameBuffer {
    /// Accumulated bytes from socket reads.
    storage: BytesMut,
    /// Maximum byte length the buffer may ever hold.
    capacity: usize,
    /// Boundary rule, fixed at construction.
    strategy: FramingStrategy,
}

impl FrameBuffer {
    /// Create a frame buffer with the default capacity (16 KiB).
    pub fn new(strategy: FramingStrategy) -> Self {
        Self::with_capacity(strategy, DEFAULT_CAPACITY)
    }

    /// Create a frame buffer with a custom capacity.
    pub fn with_capacity(strategy: FramingStrategy, capacity: usize) -> Self {
        Self {
            storage: BytesMut::with_capacity(capacity),
            capacity,
            strategy,
        }
    }

    /// Push a chunk into the buffer and extract all complete frames.
    ///
    /// This is the main API for processing incoming data from the socket.
    /// Frames are returned in stream order; byte order is preserved within
    /// and across chunks.
    ///
    /// # Errors
    ///
    /// - [`FramewireError::FrameTooLarge`] if the chunk alone exceeds the
    ///   capacity.
    /// - [`FramewireError::BufferOverflow`] if appending the chunk would
    ///   exceed the capacity given the bytes already buffered.
    ///
    /// Both leave the buffered bytes unchanged.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Bytes>> {
        self.admit(chunk)?;
        self.storage.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(ex) = self.strategy.scan(&self.storage) {
            let span = self.storage.split_to(ex.consumed).freeze();
            let frame = span.slice(ex.frame_start..ex.frame_end);
            // Consecutive delimiters produce an empty span; consume it
            // without yielding.
            if !frame.is_empty() {
                frames.push(frame);
            }
        }
        Ok(frames)
    }

    /// Admission check: reject chunks the buffer cannot hold, without
    /// touching buffered state.
    fn admit(&mut self, chunk: &[u8]) -> Result<()> {
        if chunk.len() > self.capacity {
            return Err(FramewireError::FrameTooLarge {
                length: chunk.len(),
                capacity: self.capacity,
            });
        }
        if self.storage.len() + chunk.len() > self.capacity {
            return Err(FramewireError::BufferOverflow {
                length: self.storage.len() + chunk.len(),
                capacity: self.capacity,
            });
        }
        // Self-heal: a prior inconsistency left more bytes than the capacity
        // allows. Clearing keeps the length invariant; this is not a
        // documented recovery path.
        if self.storage.len() > self.capacity {
            self.storage.clear();
        }
        Ok(())
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// The fixed capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Discard all buffered bytes.
    pub fn clear(&mut self) {
        self.storage.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delimiter_buffer() -> FrameBuffer {
        FrameBuffer::new(FramingStrategy::delimiter(&b"\r\n"[..]).unwrap())
    }

    /// Feed `data` in `chunk_size`-byte pieces and collect every frame.
    fn feed_chunked(buffer: &mut FrameBuffer, data: &[u8], chunk_size: usize) -> Vec<Bytes> {
        let mut frames = Vec::new();
        for chunk in data.chunks(chunk_size) {
            frames.extend(buffer.push(chunk).unwrap());
        }
        frames
    }

    #[test]
    fn test_delimiter_single_message() {
        let mut buffer = delimiter_buffer();
        let frames = buffer.push(b"hello\r\nworld").unwrap();
        assert_eq!(frames, vec![&b"hello"[..]]);
        assert_eq!(buffer.len(), 5); // "world" stays buffered
    }

    #[test]
    fn test_delimiter_multiple_messages() {
        let mut buffer = delimiter_buffer();
        let frames = buffer.push(b"hello\r\nworld\r\n").unwrap();
        assert_eq!(frames, vec![&b"hello"[..], &b"world"[..]]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_delimiter_no_messages() {
        let mut buffer = delimiter_buffer();
        let frames = buffer.push(b"hello").unwrap();
        assert!(frames.is_empty());
        assert_eq!(buffer.len(), 5);
    }

    #[test]
    fn test_delimiter_consecutive_delimiters_yield_nothing() {
        let mut buffer = delimiter_buffer();
        let frames = buffer.push(b"a\r\n\r\nb\r\n").unwrap();
        assert_eq!(frames, vec![&b"a"[..], &b"b"[..]]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_header_footer_single_message() {
        let strategy = FramingStrategy::header_footer(&b"<"[..], &b">"[..]).unwrap();
        let mut buffer = FrameBuffer::new(strategy);
        let frames = buffer.push(b"<1>").unwrap();
        assert_eq!(frames, vec![&b"<1>"[..]]);
    }

    #[test]
    fn test_header_footer_multiple_messages() {
        let strategy = FramingStrategy::header_footer(&b"<"[..], &b">"[..]).unwrap();
        let mut buffer = FrameBuffer::new(strategy);
        let frames = buffer.push(b"<1><2><3>").unwrap();
        assert_eq!(frames, vec![&b"<1>"[..], &b"<2>"[..], &b"<3>"[..]]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_header_footer_no_header() {
        let strategy = FramingStrategy::header_footer(&b"<"[..], &b">"[..]).unwrap();
        let mut buffer = FrameBuffer::new(strategy);
        assert!(buffer.push(b"1>").unwrap().is_empty());
    }

    #[test]
    fn test_header_footer_no_footer_keeps_header_buffered() {
        let strategy = FramingStrategy::header_footer(&b"<"[..], &b">"[..]).unwrap();
        let mut buffer = FrameBuffer::new(strategy);
        assert!(buffer.push(b"<12").unwrap().is_empty());
        assert_eq!(buffer.len(), 3);
        // More data completes the frame.
        let frames = buffer.push(b"3>").unwrap();
        assert_eq!(frames, vec![&b"<123>"[..]]);
    }

    #[test]
    fn test_header_footer_discards_leading_bytes_on_close() {
        let strategy = FramingStrategy::header_footer(&b"<"[..], &b">"[..]).unwrap();
        let mut buffer = FrameBuffer::new(strategy);
        let frames = buffer.push(b"noise<1>").unwrap();
        assert_eq!(frames, vec![&b"<1>"[..]]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_header_footer_extra_single_message() {
        let strategy = FramingStrategy::header_footer_extra(&b"<"[..], &b">"[..], 1).unwrap();
        let mut buffer = FrameBuffer::new(strategy);
        let frames = buffer.push(b"<1>2").unwrap();
        assert_eq!(frames, vec![&b"<1>2"[..]]);
    }

    #[test]
    fn test_header_footer_extra_multiple_messages() {
        let strategy = FramingStrategy::header_footer_extra(&b"<"[..], &b">"[..], 1).unwrap();
        let mut buffer = FrameBuffer::new(strategy);
        let frames = buffer.push(b"<1>2<3>4").unwrap();
        assert_eq!(frames, vec![&b"<1>2"[..], &b"<3>4"[..]]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_header_footer_extra_waits_for_trailer() {
        let strategy = FramingStrategy::header_footer_extra(&b"<"[..], &b">"[..], 1).unwrap();
        let mut buffer = FrameBuffer::new(strategy);
        assert!(buffer.push(b"<1>").unwrap().is_empty());
        assert_eq!(buffer.len(), 3); // nothing consumed yet
        let frames = buffer.push(b"2").unwrap();
        assert_eq!(frames, vec![&b"<1>2"[..]]);
    }

    #[test]
    fn test_header_length_multiple_messages() {
        let strategy = FramingStrategy::header_length(&b"<"[..], 2).unwrap();
        let mut buffer = FrameBuffer::new(strategy);
        let frames = buffer.push(b"<22<333<4444").unwrap();
        assert_eq!(frames, vec![&b"<2"[..], &b"<3"[..], &b"<4"[..]]);
    }

    #[test]
    fn test_header_length_no_header() {
        let strategy = FramingStrategy::header_length(&b"<"[..], 2).unwrap();
        let mut buffer = FrameBuffer::new(strategy);
        assert!(buffer.push(b"12").unwrap().is_empty());
    }

    #[test]
    fn test_header_length_waits_for_full_length() {
        let strategy = FramingStrategy::header_length(&b"<"[..], 4).unwrap();
        let mut buffer = FrameBuffer::new(strategy);
        assert!(buffer.push(b"<1").unwrap().is_empty());
        let frames = buffer.push(b"23").unwrap();
        assert_eq!(frames, vec![&b"<123"[..]]);
    }

    #[test]
    fn test_chunking_invariance() {
        // Same stream, arbitrary chunk boundaries, same frames.
        let cases: Vec<(FramingStrategy, &[u8])> = vec![
            (
                FramingStrategy::delimiter(&b"\r\n"[..]).unwrap(),
                b"alpha\r\nbeta\r\ngamma\r\ntail",
            ),
            (
                FramingStrategy::header_footer(&b"<<"[..], &b">>"[..]).unwrap(),
                b"x<<one>>y<<two>><<three>>",
            ),
            (
                FramingStrategy::header_footer_extra(&b"<"[..], &b">"[..], 2).unwrap(),
                b"<a>12<b>34<c>5",
            ),
            (
                FramingStrategy::header_length(&b"#"[..], 3).unwrap(),
                b"zz#ab#cd#ef#",
            ),
        ];

        for (strategy, data) in cases {
            let mut whole = FrameBuffer::new(strategy.clone());
            let expected = whole.push(data).unwrap();

            for chunk_size in [1, 2, 3, 5, data.len()] {
                let mut buffer = FrameBuffer::new(strategy.clone());
                let frames = feed_chunked(&mut buffer, data, chunk_size);
                assert_eq!(frames, expected, "chunk size {}", chunk_size);
            }
        }
    }

    #[test]
    fn test_chunk_longer_than_capacity_rejected() {
        let strategy = FramingStrategy::delimiter(&b"\r\n"[..]).unwrap();
        let mut buffer = FrameBuffer::with_capacity(strategy, 16);
        let result = buffer.push(&[b'x'; 17]);
        assert!(matches!(result, Err(FramewireError::FrameTooLarge { .. })));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_overflow_leaves_buffered_bytes_unchanged() {
        let strategy = FramingStrategy::delimiter(&b"\r\n"[..]).unwrap();
        let mut buffer = FrameBuffer::with_capacity(strategy, 16);

        assert!(buffer.push(b"hello").unwrap().is_empty());
        let result = buffer.push(&[b'x'; 12]); // 5 + 12 > 16
        assert!(matches!(result, Err(FramewireError::BufferOverflow { .. })));
        assert_eq!(buffer.len(), 5);

        // The pre-failure bytes still frame correctly afterwards.
        let frames = buffer.push(b"\r\n").unwrap();
        assert_eq!(frames, vec![&b"hello"[..]]);
    }

    #[test]
    fn test_extraction_frees_capacity() {
        let strategy = FramingStrategy::delimiter(&b"\r\n"[..]).unwrap();
        let mut buffer = FrameBuffer::with_capacity(strategy, 8);
        // Repeatedly filling to capacity works as long as frames drain.
        for _ in 0..10 {
            let frames = buffer.push(b"abcdef\r\n").unwrap();
            assert_eq!(frames, vec![&b"abcdef"[..]]);
            assert!(buffer.is_empty());
        }
    }

    #[test]
    fn test_clear() {
        let mut buffer = delimiter_buffer();
        buffer.push(b"partial").unwrap();
        assert!(!buffer.is_empty());
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
