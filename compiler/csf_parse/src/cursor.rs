//! Token cursor for navigating the token stream.

use csf_ir::{Name, Span, StringInterner, Token, TokenKind, TokenList};

/// Cursor over the token stream.
///
/// Position is always within `0..tokens.len()`; the trailing `Eof`
/// token means `current()` never runs off the end.
pub struct Cursor<'a> {
    tokens: &'a TokenList,
    interner: &'a StringInterner,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a TokenList, interner: &'a StringInterner) -> Self {
        Cursor {
            tokens,
            interner,
            pos: 0,
        }
    }

    pub fn interner(&self) -> &'a StringInterner {
        self.interner
    }

    /// Current position, for snapshots and progress checks.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Restore a snapshotted position.
    pub fn set_position(&mut self, pos: usize) {
        debug_assert!(pos < self.tokens.len());
        self.pos = pos;
    }

    #[inline]
    pub fn current(&self) -> &'a Token {
        &self.tokens[self.pos]
    }

    #[inline]
    pub fn current_kind(&self) -> &'a TokenKind {
        &self.current().kind
    }

    #[inline]
    pub fn current_span(&self) -> Span {
        self.current().span
    }

    /// Span of the last consumed token; `DUMMY` at position zero.
    pub fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::DUMMY
        }
    }

    /// One-token lookahead; sticks at the trailing `Eof`.
    #[inline]
    pub fn peek_kind(&self) -> &'a TokenKind {
        let idx = (self.pos + 1).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    pub fn peek_span(&self) -> Span {
        let idx = (self.pos + 1).min(self.tokens.len() - 1);
        self.tokens[idx].span
    }

    /// Advance one token; a no-op at `Eof`.
    #[inline]
    pub fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    /// Check the current token against a kind. Data-carrying variants
    /// match on the variant alone.
    #[inline]
    pub fn at(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// The current token's identifier name, if it is one.
    pub fn ident_name(&self) -> Option<Name> {
        match *self.current_kind() {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// Check whether the current token is the given contextual keyword.
    pub fn at_contextual(&self, word: &str) -> bool {
        self.ident_name()
            .is_some_and(|name| self.interner.lookup(name) == word)
    }

    /// Consume a contextual keyword if present.
    pub fn eat_contextual(&mut self, word: &str) -> bool {
        if self.at_contextual(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// `>` immediately followed by `>` with no gap: the shift operator
    /// the lexer deliberately left split for generics.
    pub fn is_shift_right(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Gt)
            && matches!(self.peek_kind(), TokenKind::Gt)
            && self.current_span().end == self.peek_span().start
    }

    /// `>` immediately followed by `>=` with no gap: the `>>=` operator.
    pub fn is_shift_right_assign(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Gt)
            && matches!(self.peek_kind(), TokenKind::GtEq)
            && self.current_span().end == self.peek_span().start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csf_ir::IntSuffix;
    use pretty_assertions::assert_eq;

    fn cursor_over(source: &str) -> (TokenList, StringInterner) {
        let interner = StringInterner::new();
        let (tokens, diags) = csf_lexer::lex(source, &interner);
        assert!(diags.is_empty());
        (tokens, interner)
    }

    #[test]
    fn at_matches_data_variants_by_discriminant() {
        let (tokens, interner) = cursor_over("42 foo");
        let cursor = Cursor::new(&tokens, &interner);
        assert!(cursor.at(&TokenKind::Int {
            value: 0,
            suffix: IntSuffix::None
        }));
    }

    #[test]
    fn advance_sticks_at_eof() {
        let (tokens, interner) = cursor_over(";");
        let mut cursor = Cursor::new(&tokens, &interner);
        cursor.advance();
        cursor.advance();
        cursor.advance();
        assert!(cursor.is_at_end());
    }

    #[test]
    fn contextual_keyword_checks() {
        let (tokens, interner) = cursor_over("var x");
        let mut cursor = Cursor::new(&tokens, &interner);
        assert!(cursor.at_contextual("var"));
        assert!(!cursor.at_contextual("dynamic"));
        assert!(cursor.eat_contextual("var"));
        assert!(cursor.at_contextual("x"));
    }

    #[test]
    fn shift_right_needs_adjacency() {
        let (tokens, interner) = cursor_over(">>");
        let cursor = Cursor::new(&tokens, &interner);
        assert!(cursor.is_shift_right());

        let (tokens, interner) = cursor_over("> >");
        let cursor = Cursor::new(&tokens, &interner);
        assert!(!cursor.is_shift_right());
    }

    #[test]
    fn shift_right_assign_detection() {
        let (tokens, interner) = cursor_over(">>=");
        let cursor = Cursor::new(&tokens, &interner);
        assert!(cursor.is_shift_right_assign());
        assert!(!cursor.is_shift_right());
    }

    #[test]
    fn previous_span_tracks_consumed_token() {
        let (tokens, interner) = cursor_over("a b");
        let mut cursor = Cursor::new(&tokens, &interner);
        assert_eq!(cursor.previous_span(), Span::DUMMY);
        cursor.advance();
        assert_eq!(cursor.previous_span(), Span::new(0, 1));
    }
}
