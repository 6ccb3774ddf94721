//! Parser snapshots for speculative parsing.
//!
//! The C# grammar has several places where only a trial parse can
//! disambiguate: generic argument lists vs relational chains, casts vs
//! parenthesized expressions, lambda parameter lists vs tuples, local
//! declarations vs expression statements. A snapshot captures cursor
//! position and context flags; restoring rolls the parser back.
//!
//! Snapshots do not capture emitted diagnostics or allocated node ids.
//! Speculation must therefore only examine tokens (no diagnostics, no
//! AST construction) before deciding; committed parses then run once
//! for real. Node ids burned during a restored trial leave harmless
//! gaps in the id space.

use crate::context::ParseContext;

/// A lightweight snapshot of parser state.
#[derive(Clone, Copy, Debug)]
pub struct ParserSnapshot {
    pub(crate) cursor_pos: usize,
    pub(crate) context: ParseContext,
}

impl ParserSnapshot {
    #[inline]
    pub(crate) fn new(cursor_pos: usize, context: ParseContext) -> Self {
        ParserSnapshot {
            cursor_pos,
            context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_small_and_copy() {
        assert!(std::mem::size_of::<ParserSnapshot>() <= 16);
        let a = ParserSnapshot::new(7, ParseContext::IN_UNSAFE);
        let b = a;
        assert_eq!(a.cursor_pos, b.cursor_pos);
    }
}
