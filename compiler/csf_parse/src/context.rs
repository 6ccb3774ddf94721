//! Parse context flags.
//!
//! Flags the grammar consults for context-sensitive decisions. They
//! travel with [`ParserSnapshot`](crate::snapshot::ParserSnapshot) so
//! speculative parses restore them too.

use bitflags::bitflags;

bitflags! {
    /// Flags describing the enclosing syntactic context.
    #[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
    pub struct ParseContext: u8 {
        /// Inside an `unsafe` block or an `unsafe`-modified member.
        /// `A * b;` is a pointer declaration here, a multiplication
        /// elsewhere.
        const IN_UNSAFE = 1 << 0;
    }
}

impl ParseContext {
    #[inline]
    pub fn in_unsafe(self) -> bool {
        self.contains(ParseContext::IN_UNSAFE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_unsafe() {
        assert!(!ParseContext::default().in_unsafe());
        assert!(ParseContext::IN_UNSAFE.in_unsafe());
    }
}
