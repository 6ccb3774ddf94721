//! Sentinel-terminated source buffer.
//!
//! The lexer scans bytes, not chars. Appending a `0x00` sentinel (plus
//! padding so two-byte lookahead never branches) lets the cursor detect
//! EOF by value instead of bounds checks. Interior null bytes are
//! distinguished from the sentinel by comparing the position against
//! the source length.

use crate::cursor::Cursor;

/// How many zero bytes follow the source content. One would do for the
/// sentinel; the extra bytes make `peek`/`peek2` unconditionally safe.
const PADDING: usize = 4;

/// Owned, sentinel-terminated copy of one compilation unit's text.
pub struct SourceBuffer {
    /// Source bytes + sentinel + padding, all trailing bytes `0x00`.
    buf: Vec<u8>,
    /// Length of the actual source content.
    source_len: u32,
}

impl SourceBuffer {
    /// Copy `source` into a sentinel-terminated buffer.
    ///
    /// # Panics
    /// Panics if the source exceeds `u32::MAX` bytes; compilation units
    /// are files, and spans are 32-bit by design.
    pub fn new(source: &str) -> Self {
        let source_len = u32::try_from(source.len())
            .unwrap_or_else(|_| panic!("source exceeds u32::MAX bytes"));
        let mut buf = Vec::with_capacity(source.len() + PADDING);
        buf.extend_from_slice(source.as_bytes());
        buf.resize(source.len() + PADDING, 0);
        SourceBuffer { buf, source_len }
    }

    /// A cursor positioned at the start of the source.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(&self.buf, self.source_len)
    }

    /// Length of the source content in bytes.
    pub fn source_len(&self) -> u32 {
        self.source_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_is_sentinel_terminated() {
        let buf = SourceBuffer::new("abc");
        assert_eq!(buf.source_len(), 3);
        let cursor = buf.cursor();
        assert_eq!(cursor.current(), b'a');
    }

    #[test]
    fn empty_source_is_immediately_eof() {
        let buf = SourceBuffer::new("");
        assert!(buf.cursor().is_eof());
    }
}
