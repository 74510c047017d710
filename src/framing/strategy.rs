//! Framing strategies - the boundary rules that turn a byte stream into frames.
//!
//! A strategy is chosen once at construction and is immutable thereafter.
//! It describes where one application message ends and the next begins;
//! the actual accumulation and extraction is done by
//! [`FrameBuffer`](crate::framing::FrameBuffer).

use bytes::Bytes;
use memchr::memmem;

use crate::error::{FramewireError, Result};

/// One frame located inside buffered storage.
///
/// `consumed` is the prefix length dropped from storage once the frame is
/// taken; it always covers the frame span, so every extraction makes progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Extraction {
    /// Start of the frame's bytes within storage.
    pub frame_start: usize,
    /// One past the end of the frame's bytes.
    pub frame_end: usize,
    /// Number of bytes to drop from the front of storage.
    pub consumed: usize,
}

/// How frame boundaries are recognized in the byte stream.
///
/// | Strategy | Frame boundary rule |
/// |---|---|
/// | `Delimiter` | split on first occurrence; delimiter excluded from the frame |
/// | `HeaderFooter` | frame = `header..footer` inclusive |
/// | `HeaderFooterExtra` | as `HeaderFooter` plus `extra_len` trailing bytes |
/// | `HeaderLength` | frame = exactly `length` bytes starting at the header |
///
/// The header-based strategies discard any bytes that precede the header once
/// a frame closes. This is deliberate: a consumer that joins a stream
/// mid-message resynchronizes on the next header.
#[derive(Debug, Clone)]
pub enum FramingStrategy {
    /// Split on a delimiter byte sequence (e.g. `\r\n` line framing).
    Delimiter { delimiter: Bytes },
    /// Frames bracketed by a header and a footer sequence.
    HeaderFooter { header: Bytes, footer: Bytes },
    /// As `HeaderFooter`, with `extra_len` trailing bytes after the footer
    /// (checksum or CRC trailers that may contain the footer sequence).
    HeaderFooterExtra {
        header: Bytes,
        footer: Bytes,
        extra_len: usize,
    },
    /// Fixed-length frames recognized by a header sequence.
    HeaderLength { header: Bytes, length: usize },
}

impl FramingStrategy {
    /// Delimiter framing. Fails if the delimiter is empty.
    pub fn delimiter(delimiter: impl Into<Bytes>) -> Result<Self> {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            return Err(FramewireError::InvalidStrategy(
                "delimiter cannot be empty".into(),
            ));
        }
        Ok(Self::Delimiter { delimiter })
    }

    /// Header/footer framing. Fails if either sequence is empty.
    pub fn header_footer(header: impl Into<Bytes>, footer: impl Into<Bytes>) -> Result<Self> {
        let (header, footer) = (header.into(), footer.into());
        Self::check_header_footer(&header, &footer)?;
        Ok(Self::HeaderFooter { header, footer })
    }

    /// Header/footer framing with a fixed-length trailer after the footer.
    pub fn header_footer_extra(
        header: impl Into<Bytes>,
        footer: impl Into<Bytes>,
        extra_len: usize,
    ) -> Result<Self> {
        let (header, footer) = (header.into(), footer.into());
        Self::check_header_footer(&header, &footer)?;
        Ok(Self::HeaderFooterExtra {
            header,
            footer,
            extra_len,
        })
    }

    /// Fixed-length framing keyed on a header. Fails if the header is empty
    /// or the length is zero.
    pub fn header_length(header: impl Into<Bytes>, length: usize) -> Result<Self> {
        let header = header.into();
        if header.is_empty() {
            return Err(FramewireError::InvalidStrategy(
                "header cannot be empty".into(),
            ));
        }
        if length == 0 {
            return Err(FramewireError::InvalidStrategy(
                "length must be greater than 0".into(),
            ));
        }
        Ok(Self::HeaderLength { header, length })
    }

    fn check_header_footer(header: &Bytes, footer: &Bytes) -> Result<()> {
        if header.is_empty() {
            return Err(FramewireError::InvalidStrategy(
                "header cannot be empty".into(),
            ));
        }
        if footer.is_empty() {
            return Err(FramewireError::InvalidStrategy(
                "footer cannot be empty".into(),
            ));
        }
        Ok(())
    }

    /// Locate the next complete frame in `storage`, if one is present.
    pub(crate) fn scan(&self, storage: &[u8]) -> Option<Extraction> {
        match self {
            Self::Delimiter { delimiter } => {
                let at = memmem::find(storage, delimiter)?;
                Some(Extraction {
                    frame_start: 0,
                    frame_end: at,
                    consumed: at + delimiter.len(),
                })
            }
            Self::HeaderFooter { header, footer } => {
                let (start, end) = find_bracketed(storage, header, footer)?;
                Some(Extraction {
                    frame_start: start,
                    frame_end: end,
                    consumed: end,
                })
            }
            Self::HeaderFooterExtra {
                header,
                footer,
                extra_len,
            } => {
                let (start, end) = find_bracketed(storage, header, footer)?;
                // The trailer must be fully buffered before the frame closes.
                if storage.len() - end < *extra_len {
                    return None;
                }
                Some(Extraction {
                    frame_start: start,
                    frame_end: end + extra_len,
                    consumed: end + extra_len,
                })
            }
            Self::HeaderLength { header, length } => {
                let start = memmem::find(storage, header)?;
                if storage.len() - start < *length {
                    return None;
                }
                Some(Extraction {
                    frame_start: start,
                    frame_end: start + length,
                    consumed: start + length,
                })
            }
        }
    }
}

/// Find a `header..footer` span; the footer search starts strictly after the
/// header's end. Returns (header start, one past footer end).
fn find_bracketed(storage: &[u8], header: &[u8], footer: &[u8]) -> Option<(usize, usize)> {
    let start = memmem::find(storage, header)?;
    let after_header = start + header.len();
    let footer_at = memmem::find(&storage[after_header..], footer)?;
    Some((start, after_header + footer_at + footer.len()))
}
