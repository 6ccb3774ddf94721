//! Byte cursor over a sentinel-terminated buffer.
//!
//! The cursor is `Copy`, which makes checkpointing for multi-character
//! lexemes free. EOF is the sentinel byte at or past `source_len`;
//! interior nulls (which are lexical errors, not EOF) sit below it.

/// Cursor over a sentinel-terminated byte buffer.
///
/// # Invariant
/// `buf[source_len..]` is all `0x00` (sentinel plus padding), guaranteed
/// by [`SourceBuffer`](crate::SourceBuffer) construction.
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: u32,
    source_len: u32,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(buf: &'a [u8], source_len: u32) -> Self {
        debug_assert!((source_len as usize) < buf.len());
        debug_assert_eq!(buf[source_len as usize], 0, "sentinel byte must be 0x00");
        Cursor {
            buf,
            pos: 0,
            source_len,
        }
    }

    /// The byte at the current position (`0x00` at EOF).
    #[inline]
    pub fn current(&self) -> u8 {
        self.buf[self.pos as usize]
    }

    /// One byte of lookahead. Always in bounds thanks to padding.
    #[inline]
    pub fn peek(&self) -> u8 {
        self.buf[self.pos as usize + 1]
    }

    /// Two bytes of lookahead.
    #[inline]
    pub fn peek2(&self) -> u8 {
        self.buf[self.pos as usize + 2]
    }

    /// Advance by one byte.
    #[inline]
    pub fn advance(&mut self) {
        self.pos += 1;
    }

    /// Advance by `n` bytes, saturating at the end of the source so a
    /// multi-byte consumer (escape cooking, char widths) near EOF can
    /// never push the position past `source_len`.
    #[inline]
    pub fn advance_n(&mut self, n: u32) {
        self.pos = (self.pos + n).min(self.source_len);
    }

    /// Advance past one full UTF-8 character (1-4 bytes, from the lead byte).
    #[inline]
    pub fn advance_char(&mut self) {
        let width = match self.current() {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        self.advance_n(width);
    }

    /// True when the current byte is the sentinel, not an interior null.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.current() == 0 && self.pos >= self.source_len
    }

    /// Current byte offset.
    #[inline]
    pub fn pos(&self) -> u32 {
        self.pos
    }

    /// Extract a source substring.
    ///
    /// `start..end` must fall on UTF-8 boundaries within the source;
    /// the scanner's token boundary tracking guarantees this. Returns
    /// the empty string on a boundary violation instead of panicking.
    pub fn slice(&self, start: u32, end: u32) -> &'a str {
        debug_assert!(end <= self.source_len && start <= end);
        std::str::from_utf8(&self.buf[start as usize..end as usize]).unwrap_or("")
    }

    /// Substring from `start` to the current position.
    pub fn slice_from(&self, start: u32) -> &'a str {
        self.slice(start, self.pos)
    }

    /// Advance while `pred` holds for the current byte.
    ///
    /// `pred(0)` must return `false`, which is true for every byte
    /// classification used by the scanner; the sentinel then terminates
    /// the loop at EOF.
    #[inline]
    pub fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while pred(self.buf[self.pos as usize]) {
            self.pos += 1;
        }
    }

    /// Advance to the next `\n` or EOF (SIMD search via memchr).
    /// Used to skip line comments and preprocessor lines.
    pub fn eat_until_newline_or_eof(&mut self) {
        let remaining = &self.buf[self.pos as usize..self.source_len as usize];
        match memchr::memchr(b'\n', remaining) {
            // offset < source_len, fits u32
            Some(offset) => self.pos += offset as u32,
            None => self.pos = self.source_len,
        }
    }

    /// Skip ordinary string content up to the next `"`, `\`, or `\n`.
    /// Returns the byte found, or 0 at EOF.
    pub fn skip_to_string_delim(&mut self) -> u8 {
        let remaining = &self.buf[self.pos as usize..self.source_len as usize];
        match memchr::memchr3(b'"', b'\\', b'\n', remaining) {
            Some(offset) => {
                self.pos += offset as u32;
                self.current()
            }
            None => {
                self.pos = self.source_len;
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::SourceBuffer;

    #[test]
    fn advance_and_peek() {
        let buf = SourceBuffer::new("abc");
        let mut cursor = buf.cursor();
        assert_eq!(cursor.current(), b'a');
        assert_eq!(cursor.peek(), b'b');
        assert_eq!(cursor.peek2(), b'c');
        cursor.advance();
        assert_eq!(cursor.current(), b'b');
    }

    #[test]
    fn peek_past_end_returns_sentinel() {
        let buf = SourceBuffer::new("a");
        let cursor = buf.cursor();
        assert_eq!(cursor.peek(), 0);
        assert_eq!(cursor.peek2(), 0);
    }

    #[test]
    fn interior_null_is_not_eof() {
        let buf = SourceBuffer::new("a\0b");
        let mut cursor = buf.cursor();
        cursor.advance();
        assert_eq!(cursor.current(), 0);
        assert!(!cursor.is_eof());
        cursor.advance();
        assert_eq!(cursor.current(), b'b');
    }

    #[test]
    fn eat_while_stops_at_sentinel() {
        let buf = SourceBuffer::new("aaa");
        let mut cursor = buf.cursor();
        cursor.eat_while(|b| b == b'a');
        assert_eq!(cursor.pos(), 3);
        assert!(cursor.is_eof());
    }

    #[test]
    fn slice_extracts_substring() {
        let buf = SourceBuffer::new("hello world");
        let cursor = buf.cursor();
        assert_eq!(cursor.slice(0, 5), "hello");
        assert_eq!(cursor.slice(6, 11), "world");
    }

    #[test]
    fn eat_until_newline_finds_lf() {
        let buf = SourceBuffer::new("// comment\nnext");
        let mut cursor = buf.cursor();
        cursor.eat_until_newline_or_eof();
        assert_eq!(cursor.pos(), 10);
        assert_eq!(cursor.current(), b'\n');
    }

    #[test]
    fn skip_to_string_delim_finds_earliest() {
        let buf = SourceBuffer::new("abc\\\"rest");
        let mut cursor = buf.cursor();
        let found = cursor.skip_to_string_delim();
        assert_eq!(found, b'\\');
        assert_eq!(cursor.pos(), 3);
    }

    #[test]
    fn cursor_is_copy_for_checkpointing() {
        let buf = SourceBuffer::new("abcdef");
        let mut cursor = buf.cursor();
        cursor.advance_n(2);
        let saved = cursor;
        cursor.advance_n(3);
        assert_eq!(saved.pos(), 2);
        assert_eq!(cursor.pos(), 5);
    }

    #[test]
    fn advance_n_saturates_at_source_end() {
        let buf = SourceBuffer::new("ab");
        let mut cursor = buf.cursor();
        cursor.advance_n(5);
        assert_eq!(cursor.pos(), 2);
        assert!(cursor.is_eof());
    }

    #[test]
    fn advance_char_handles_multibyte() {
        let buf = SourceBuffer::new("é!");
        let mut cursor = buf.cursor();
        cursor.advance_char();
        assert_eq!(cursor.current(), b'!');
    }
}
