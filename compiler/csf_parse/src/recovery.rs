//! Error recovery: synchronization points for continuing after a parse
//! error.
//!
//! The strategy is panic-mode recovery with grammar-aware anchors:
//! a failed member skips to the next plausible member start or the
//! closing brace, a failed statement skips to `;` or a statement
//! keyword. Spans already consumed stay in the tree as error nodes, so
//! one bad declaration cannot take its siblings down with it.

use csf_ir::TokenKind;
use tracing::trace;

use crate::cursor::Cursor;

/// Tokens that can begin a type member declaration (modifier, type
/// keyword, member-shaped keyword) or close the enclosing type body.
pub fn at_member_boundary(cursor: &Cursor<'_>) -> bool {
    let kind = cursor.current_kind();
    kind.is_declaration_modifier()
        || kind.is_builtin_type_keyword()
        || matches!(
            kind,
            TokenKind::Class
                | TokenKind::Struct
                | TokenKind::Interface
                | TokenKind::Enum
                | TokenKind::Delegate
                | TokenKind::Event
                | TokenKind::Const
                | TokenKind::Implicit
                | TokenKind::Explicit
                | TokenKind::Tilde
                | TokenKind::LBracket
                | TokenKind::RBrace
                | TokenKind::Eof
        )
}

/// Tokens that can begin a statement, used to resynchronize inside a
/// block after a statement failed to parse.
pub fn at_statement_boundary(cursor: &Cursor<'_>) -> bool {
    matches!(
        cursor.current_kind(),
        TokenKind::Semicolon
            | TokenKind::LBrace
            | TokenKind::RBrace
            | TokenKind::If
            | TokenKind::While
            | TokenKind::Do
            | TokenKind::For
            | TokenKind::Foreach
            | TokenKind::Switch
            | TokenKind::Try
            | TokenKind::Using
            | TokenKind::Lock
            | TokenKind::Return
            | TokenKind::Break
            | TokenKind::Continue
            | TokenKind::Goto
            | TokenKind::Throw
            | TokenKind::Const
            | TokenKind::Eof
    )
}

/// Tokens that can begin a top-level item.
pub fn at_item_boundary(cursor: &Cursor<'_>) -> bool {
    let kind = cursor.current_kind();
    kind.is_declaration_modifier()
        || matches!(
            kind,
            TokenKind::Namespace
                | TokenKind::Using
                | TokenKind::Class
                | TokenKind::Struct
                | TokenKind::Interface
                | TokenKind::Enum
                | TokenKind::Delegate
                | TokenKind::LBracket
                | TokenKind::RBrace
                | TokenKind::Eof
        )
}

/// Skip tokens until `anchor` holds, tracking brace depth so recovery
/// does not escape the construct it started in. Returns `true` if an
/// anchor was reached before `Eof`.
pub fn synchronize(cursor: &mut Cursor<'_>, anchor: impl Fn(&Cursor<'_>) -> bool) -> bool {
    let start = cursor.position();
    let mut depth = 0u32;
    loop {
        if cursor.is_at_end() {
            trace!(from = start, "recovery hit end of input");
            return false;
        }
        if depth == 0 && anchor(cursor) {
            trace!(from = start, to = cursor.position(), "recovery anchored");
            return true;
        }
        match cursor.current_kind() {
            TokenKind::LBrace => depth += 1,
            TokenKind::RBrace => {
                if depth == 0 {
                    // the anchor check already declined this `}`, so it
                    // closes an outer construct
                    trace!(from = start, to = cursor.position(), "recovery anchored");
                    return true;
                }
                depth -= 1;
            }
            _ => {}
        }
        cursor.advance();
    }
}

#[cfg(test)]
mod tests {
    use csf_ir::StringInterner;

    use super::*;

    fn lex(source: &str, interner: &StringInterner) -> csf_ir::TokenList {
        let (tokens, _) = csf_lexer::lex(source, interner);
        tokens
    }

    #[test]
    fn synchronize_finds_statement_anchor() {
        let interner = StringInterner::new();
        let tokens = lex("garbage tokens here ; return", &interner);
        let mut cursor = Cursor::new(&tokens, &interner);
        assert!(synchronize(&mut cursor, at_statement_boundary));
        assert!(matches!(cursor.current_kind(), TokenKind::Semicolon));
    }

    #[test]
    fn synchronize_skips_nested_braces() {
        let interner = StringInterner::new();
        // the `return` inside the nested block must not anchor recovery
        let tokens = lex("oops { return } if", &interner);
        let mut cursor = Cursor::new(&tokens, &interner);
        assert!(synchronize(&mut cursor, at_statement_boundary));
        // first anchor at depth 0 is the opening brace of the block
        assert!(matches!(cursor.current_kind(), TokenKind::LBrace));
    }

    #[test]
    fn synchronize_reports_eof() {
        let interner = StringInterner::new();
        let tokens = lex("a b c", &interner);
        let mut cursor = Cursor::new(&tokens, &interner);
        assert!(!synchronize(&mut cursor, at_statement_boundary));
        assert!(cursor.is_at_end());
    }
}
