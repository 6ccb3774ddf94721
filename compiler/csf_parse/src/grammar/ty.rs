//! Type reference grammar.
//!
//! The `_opt` entry point is diagnostic-free so disambiguation code can
//! run it speculatively; [`Parser::parse_type`] wraps it and reports
//! when a type was required.

use csf_diagnostic::{Diagnostic, ErrorCode};
use csf_ir::ast::{ParsedType, ParsedTypeKind, PrimitiveName, TypePath, TypeSegment};
use csf_ir::TokenKind;

use crate::Parser;

impl Parser<'_> {
    /// Parse a type reference, reporting `E1104` and synthesizing an
    /// error type when none is present.
    pub(crate) fn parse_type(&mut self) -> ParsedType {
        let span = self.cursor.current_span();
        match self.type_opt() {
            Some(ty) => ty,
            None => {
                self.error(
                    Diagnostic::error(ErrorCode::E1104)
                        .with_message(format!(
                            "expected type, found {}",
                            self.cursor.current_kind().describe()
                        ))
                        .with_label(span, "expected a type here"),
                );
                ParsedType::error(span)
            }
        }
    }

    /// Try to parse a type; never emits diagnostics. On failure the
    /// cursor may have moved, so callers speculate via `try_parse`.
    pub(crate) fn type_opt(&mut self) -> Option<ParsedType> {
        let start = self.cursor.current_span();
        if !self.enter(start) {
            return None;
        }
        let result = self.type_core().map(|core| self.type_suffixes(core));
        self.leave();
        result
    }

    /// Core type: primitive keyword, tuple, or (qualified) name.
    fn type_core(&mut self) -> Option<ParsedType> {
        let span = self.cursor.current_span();
        if let Some(primitive) = primitive_name(self.cursor.current_kind()) {
            self.cursor.advance();
            return Some(ParsedType::new(ParsedTypeKind::Primitive(primitive), span));
        }
        if self.cursor.at(&TokenKind::LParen) {
            return self.tuple_type();
        }

        // `dynamic` is contextual: a type when nothing else claims it.
        if self.cursor.at_contextual("dynamic")
            && !matches!(self.cursor.peek_kind(), TokenKind::Dot | TokenKind::Lt)
        {
            self.cursor.advance();
            return Some(ParsedType::new(ParsedTypeKind::Dynamic, span));
        }

        let path = self.type_path()?;
        let end = self.cursor.previous_span();
        Some(ParsedType::new(
            ParsedTypeKind::Named(path),
            span.merge(end),
        ))
    }

    /// Dotted, possibly generic name: `A.B<int>.C`. Also accepts the
    /// `alias::` qualifier and folds it into the path.
    pub(crate) fn type_path(&mut self) -> Option<TypePath> {
        let mut segments = Vec::new();
        segments.push(self.type_segment()?);
        if self.cursor.at(&TokenKind::DoubleColon) {
            self.cursor.advance();
            segments.push(self.type_segment()?);
        }
        while self.cursor.at(&TokenKind::Dot) {
            // `.` must be followed by an identifier to stay a type path
            if !matches!(self.cursor.peek_kind(), TokenKind::Ident(_)) {
                return None;
            }
            self.cursor.advance();
            segments.push(self.type_segment()?);
        }
        Some(TypePath { segments })
    }

    fn type_segment(&mut self) -> Option<TypeSegment> {
        let span = self.cursor.current_span();
        let name = self.cursor.ident_name()?;
        self.cursor.advance();
        let mut type_args = Vec::new();
        if self.cursor.at(&TokenKind::Lt) {
            type_args = self.type_argument_list()?;
        }
        let end = self.cursor.previous_span();
        Some(TypeSegment {
            name,
            type_args,
            span: span.merge(end),
        })
    }

    /// `<T, U<V>>` — the lexer never merges `>`, so nested closings are
    /// consumed one `Gt` at a time.
    pub(crate) fn type_argument_list(&mut self) -> Option<Vec<ParsedType>> {
        debug_assert!(self.cursor.at(&TokenKind::Lt));
        self.cursor.advance();
        let mut args = Vec::new();
        loop {
            args.push(self.type_opt()?);
            if self.cursor.eat(&TokenKind::Comma) {
                continue;
            }
            if self.cursor.eat(&TokenKind::Gt) {
                return Some(args);
            }
            return None;
        }
    }

    /// `(int a, string)` — needs at least two elements.
    fn tuple_type(&mut self) -> Option<ParsedType> {
        let start = self.cursor.current_span();
        self.cursor.advance(); // (
        let mut elements = Vec::new();
        loop {
            let ty = self.type_opt()?;
            let name = self.cursor.ident_name().map(|name| {
                self.cursor.advance();
                name
            });
            elements.push((name, ty));
            if self.cursor.eat(&TokenKind::Comma) {
                continue;
            }
            break;
        }
        if !self.cursor.eat(&TokenKind::RParen) || elements.len() < 2 {
            return None;
        }
        let end = self.cursor.previous_span();
        Some(ParsedType::new(
            ParsedTypeKind::Tuple(elements),
            start.merge(end),
        ))
    }

    /// Postfix suffixes: `?`, `*`, `[]`, `[,]`, in any combination.
    fn type_suffixes(&mut self, mut ty: ParsedType) -> ParsedType {
        loop {
            let start = ty.span;
            match self.cursor.current_kind() {
                TokenKind::Question => {
                    self.cursor.advance();
                    let end = self.cursor.previous_span();
                    ty = ParsedType::new(
                        ParsedTypeKind::Nullable(Box::new(ty)),
                        start.merge(end),
                    );
                }
                TokenKind::Star => {
                    self.cursor.advance();
                    let end = self.cursor.previous_span();
                    ty = ParsedType::new(ParsedTypeKind::Pointer(Box::new(ty)), start.merge(end));
                }
                TokenKind::LBracket => {
                    let Some(rank) = self.rank_specifier() else {
                        return ty;
                    };
                    let end = self.cursor.previous_span();
                    ty = ParsedType::new(
                        ParsedTypeKind::Array {
                            element: Box::new(ty),
                            rank,
                        },
                        start.merge(end),
                    );
                }
                _ => return ty,
            }
        }
    }

    /// `[]` rank 1, `[,]` rank 2, ... Leaves the cursor alone when the
    /// brackets hold anything else (an indexer or element access).
    fn rank_specifier(&mut self) -> Option<u8> {
        let snapshot = self.snapshot();
        self.cursor.advance(); // [
        let mut rank: u8 = 1;
        while self.cursor.eat(&TokenKind::Comma) {
            rank = rank.saturating_add(1);
        }
        if self.cursor.eat(&TokenKind::RBracket) {
            Some(rank)
        } else {
            self.restore(snapshot);
            None
        }
    }

    /// Type parse used after `is`/`as` inside expressions, where a
    /// trailing `?` usually belongs to a conditional expression
    /// (`x is T ? a : b`). The `?` is taken as nullable only when what
    /// follows cannot start an expression.
    pub(crate) fn type_in_expression(&mut self) -> Option<ParsedType> {
        let ty = self.type_core()?;
        let mut ty = ty;
        loop {
            match self.cursor.current_kind() {
                TokenKind::Question => {
                    let follows_expr = self.look_ahead(|p| {
                        p.cursor.advance();
                        starts_expression(p.cursor.current_kind())
                    });
                    if follows_expr {
                        return Some(ty);
                    }
                    let start = ty.span;
                    self.cursor.advance();
                    let end = self.cursor.previous_span();
                    ty = ParsedType::new(
                        ParsedTypeKind::Nullable(Box::new(ty)),
                        start.merge(end),
                    );
                }
                TokenKind::LBracket => {
                    let start = ty.span;
                    let Some(rank) = self.rank_specifier() else {
                        return Some(ty);
                    };
                    let end = self.cursor.previous_span();
                    ty = ParsedType::new(
                        ParsedTypeKind::Array {
                            element: Box::new(ty),
                            rank,
                        },
                        start.merge(end),
                    );
                }
                _ => return Some(ty),
            }
        }
    }

}

/// Map a builtin type keyword to its primitive name.
pub(crate) fn primitive_name(kind: &TokenKind) -> Option<PrimitiveName> {
    Some(match kind {
        TokenKind::Bool => PrimitiveName::Bool,
        TokenKind::Byte => PrimitiveName::Byte,
        TokenKind::Sbyte => PrimitiveName::Sbyte,
        TokenKind::Short => PrimitiveName::Short,
        TokenKind::Ushort => PrimitiveName::Ushort,
        TokenKind::IntKw => PrimitiveName::Int,
        TokenKind::Uint => PrimitiveName::Uint,
        TokenKind::Long => PrimitiveName::Long,
        TokenKind::Ulong => PrimitiveName::Ulong,
        TokenKind::CharKw => PrimitiveName::Char,
        TokenKind::Float => PrimitiveName::Float,
        TokenKind::Double => PrimitiveName::Double,
        TokenKind::Decimal => PrimitiveName::Decimal,
        TokenKind::StringKw => PrimitiveName::String,
        TokenKind::Object => PrimitiveName::Object,
        TokenKind::Void => PrimitiveName::Void,
        _ => return None,
    })
}

/// Whether a token can begin an expression. Used by the `is T ?`
/// disambiguation and by cast detection.
pub(crate) fn starts_expression(kind: &TokenKind) -> bool {
    kind.is_literal()
        || kind.is_builtin_type_keyword()
        || matches!(
            kind,
            TokenKind::Ident(_)
                | TokenKind::LParen
                | TokenKind::This
                | TokenKind::Base
                | TokenKind::New
                | TokenKind::Typeof
                | TokenKind::Sizeof
                | TokenKind::Default
                | TokenKind::Checked
                | TokenKind::Unchecked
                | TokenKind::Delegate
                | TokenKind::Bang
                | TokenKind::Tilde
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
                | TokenKind::Amp
                | TokenKind::Star
        )
}

#[cfg(test)]
mod tests {
    use csf_ir::ast::{ParsedTypeKind, PrimitiveName};
    use csf_ir::StringInterner;
    use pretty_assertions::assert_eq;

    use crate::Parser;

    fn parse_type(source: &str) -> ParsedTypeKind {
        let interner = StringInterner::new();
        let (tokens, diags) = csf_lexer::lex(source, &interner);
        assert!(diags.is_empty());
        let mut parser = Parser::new(&tokens, &interner);
        let ty = parser.parse_type();
        assert!(parser.diagnostics.is_empty(), "{:?}", parser.diagnostics);
        ty.kind
    }

    #[test]
    fn primitive_types() {
        assert_eq!(
            parse_type("int"),
            ParsedTypeKind::Primitive(PrimitiveName::Int)
        );
        assert_eq!(
            parse_type("string"),
            ParsedTypeKind::Primitive(PrimitiveName::String)
        );
    }

    #[test]
    fn qualified_generic_type() {
        let ParsedTypeKind::Named(path) = parse_type("System.Collections.Generic.List<int>")
        else {
            panic!("expected named type");
        };
        assert_eq!(path.segments.len(), 4);
        assert_eq!(path.last().type_args.len(), 1);
    }

    #[test]
    fn nested_generics_close_without_shift() {
        let ParsedTypeKind::Named(path) = parse_type("Dictionary<string, List<int>>") else {
            panic!("expected named type");
        };
        assert_eq!(path.last().type_args.len(), 2);
    }

    #[test]
    fn suffix_combinations() {
        // nullable of array? no: int[]? is nullable array; int?[] is
        // array of nullable.
        let ParsedTypeKind::Array { element, rank } = parse_type("int?[]") else {
            panic!("expected array");
        };
        assert_eq!(rank, 1);
        assert!(matches!(element.kind, ParsedTypeKind::Nullable(_)));

        let ParsedTypeKind::Array { rank, .. } = parse_type("int[,,]") else {
            panic!("expected array");
        };
        assert_eq!(rank, 3);
    }

    #[test]
    fn pointer_type() {
        assert!(matches!(parse_type("byte*"), ParsedTypeKind::Pointer(_)));
    }

    #[test]
    fn tuple_type_with_names() {
        let ParsedTypeKind::Tuple(elements) = parse_type("(int a, string b)") else {
            panic!("expected tuple");
        };
        assert_eq!(elements.len(), 2);
        assert!(elements[0].0.is_some());
    }

    #[test]
    fn dynamic_is_contextual() {
        assert_eq!(parse_type("dynamic"), ParsedTypeKind::Dynamic);
        // but a member of a type named dynamic stays a named type
        assert!(matches!(
            parse_type("dynamic.Inner"),
            ParsedTypeKind::Named(_)
        ));
    }

    #[test]
    fn missing_type_reports_and_recovers() {
        let interner = StringInterner::new();
        let (tokens, _) = csf_lexer::lex("= 5", &interner);
        let mut parser = Parser::new(&tokens, &interner);
        let ty = parser.parse_type();
        assert!(matches!(ty.kind, ParsedTypeKind::Error));
        assert_eq!(parser.diagnostics.len(), 1);
    }
}
