//! Lexer for the C# front-end.
//!
//! Input: one compilation unit's text plus a shared string interner.
//! Output: a finite [`TokenList`] (always terminated by `Eof`) and any
//! lexical diagnostics. The lexer never aborts on bad input; malformed
//! lexemes become `Invalid` tokens and scanning continues, so the parser
//! always has a complete stream to work with.

mod cursor;
mod escape;
mod keywords;
mod scanner;
mod source_buffer;

pub use scanner::lex;
pub use source_buffer::SourceBuffer;

#[cfg(test)]
mod tests {
    use csf_ir::{IntSuffix, Name, RealSuffix, Span, StringInterner, TokenKind};
    use pretty_assertions::assert_eq;

    use super::lex;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let interner = StringInterner::default();
        let (tokens, diagnostics) = lex(source, &interner);
        assert!(
            diagnostics.is_empty(),
            "unexpected diagnostics for {source:?}: {diagnostics:?}"
        );
        tokens.iter().map(|t| t.kind.clone()).collect()
    }

    fn kinds_with_errors(source: &str) -> (Vec<TokenKind>, usize) {
        let interner = StringInterner::default();
        let (tokens, diagnostics) = lex(source, &interner);
        (
            tokens.iter().map(|t| t.kind.clone()).collect(),
            diagnostics.len(),
        )
    }

    fn ident(interner: &StringInterner, text: &str) -> TokenKind {
        TokenKind::Ident(interner.intern(text))
    }

    fn int(value: u64) -> TokenKind {
        TokenKind::Int {
            value,
            suffix: IntSuffix::None,
        }
    }

    #[test]
    fn empty_source_is_just_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn keywords_and_identifiers() {
        let interner = StringInterner::default();
        let (tokens, _) = lex("class Point { int x; }", &interner);
        let got: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            got,
            vec![
                TokenKind::Class,
                ident(&interner, "Point"),
                TokenKind::LBrace,
                TokenKind::IntKw,
                ident(&interner, "x"),
                TokenKind::Semicolon,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn contextual_keywords_lex_as_identifiers() {
        let interner = StringInterner::default();
        let (tokens, _) = lex("var from = await yield;", &interner);
        let idents: Vec<_> = tokens
            .iter()
            .filter_map(|t| match t.kind {
                TokenKind::Ident(name) => Some(interner.lookup(name)),
                _ => None,
            })
            .collect();
        assert_eq!(idents, vec!["var", "from", "await", "yield"]);
    }

    #[test]
    fn verbatim_identifier_strips_at_sign() {
        let interner = StringInterner::default();
        let (tokens, diags) = lex("@class", &interner);
        assert!(diags.is_empty());
        assert_eq!(tokens[0].kind, ident(&interner, "class"));
        // span covers the @ too
        assert_eq!(tokens[0].span, Span::new(0, 6));
    }

    #[test]
    fn unicode_escape_in_identifier() {
        let interner = StringInterner::default();
        let (tokens, diags) = lex("cl\\u0061ss", &interner);
        assert!(diags.is_empty());
        // an escaped identifier never becomes a keyword
        assert_eq!(tokens[0].kind, ident(&interner, "class"));
    }

    #[test]
    fn integer_literal_forms() {
        assert_eq!(kinds("42")[0], int(42));
        assert_eq!(kinds("0x2A")[0], int(42));
        assert_eq!(kinds("0b1010")[0], int(10));
        assert_eq!(kinds("1_000_000")[0], int(1_000_000));
        assert_eq!(
            kinds("42u")[0],
            TokenKind::Int {
                value: 42,
                suffix: IntSuffix::U
            }
        );
        assert_eq!(
            kinds("42L")[0],
            TokenKind::Int {
                value: 42,
                suffix: IntSuffix::L
            }
        );
        assert_eq!(
            kinds("0xFFul")[0],
            TokenKind::Int {
                value: 255,
                suffix: IntSuffix::UL
            }
        );
    }

    #[test]
    fn real_literal_forms() {
        let real = |v: f64, suffix| TokenKind::Real {
            bits: v.to_bits(),
            suffix,
        };
        assert_eq!(kinds("3.14")[0], real(3.14, RealSuffix::None));
        assert_eq!(kinds("1e10")[0], real(1e10, RealSuffix::None));
        assert_eq!(kinds("2.5e-8")[0], real(2.5e-8, RealSuffix::None));
        assert_eq!(kinds("1f")[0], real(1.0, RealSuffix::F));
        assert_eq!(kinds("1.5d")[0], real(1.5, RealSuffix::D));
        assert_eq!(kinds("9.99m")[0], real(9.99, RealSuffix::M));
    }

    #[test]
    fn dot_after_int_is_member_access_not_fraction() {
        let got = kinds("1.ToString");
        assert_eq!(got[0], int(1));
        assert_eq!(got[1], TokenKind::Dot);
        assert!(matches!(got[2], TokenKind::Ident(_)));
    }

    #[test]
    fn integer_overflow_is_invalid_not_panic() {
        let (got, errors) = kinds_with_errors("99999999999999999999999");
        assert!(matches!(got[0], TokenKind::Invalid(_)));
        assert_eq!(errors, 1);
    }

    #[test]
    fn string_literal_cooks_escapes() {
        let interner = StringInterner::default();
        let (tokens, diags) = lex(r#""a\tbA""#, &interner);
        assert!(diags.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::String(interner.intern("a\tbA")));
    }

    #[test]
    fn verbatim_string_doubles_quotes_and_spans_lines() {
        let interner = StringInterner::default();
        let (tokens, diags) = lex("@\"line1\nhe said \"\"hi\"\"\"", &interner);
        assert!(diags.is_empty());
        assert_eq!(
            tokens[0].kind,
            TokenKind::String(interner.intern("line1\nhe said \"hi\""))
        );
    }

    #[test]
    fn interpolated_string_lexes_as_plain_string() {
        let interner = StringInterner::default();
        let (tokens, diags) = lex(r#"$"x = {x}""#, &interner);
        assert!(diags.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::String(interner.intern("x = {x}")));
    }

    #[test]
    fn unterminated_string_recovers_at_newline() {
        let interner = StringInterner::default();
        let (tokens, diags) = lex("\"oops\nnext", &interner);
        assert_eq!(diags.len(), 1);
        assert!(matches!(tokens[0].kind, TokenKind::Invalid(_)));
        // scanning continues on the next line
        assert_eq!(tokens[1].kind, ident(&interner, "next"));
    }

    #[test]
    fn backslash_at_end_of_input_inside_string() {
        // The truncated escape consumes to EOF; the unterminated string
        // is still reported and lexing completes.
        let interner = StringInterner::default();
        let (tokens, diags) = lex("\"\\", &interner);
        assert_eq!(diags.len(), 2);
        assert!(matches!(tokens[0].kind, TokenKind::Invalid(_)));
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn char_literals() {
        assert_eq!(kinds("'a'")[0], TokenKind::Char('a'));
        assert_eq!(kinds(r"'\n'")[0], TokenKind::Char('\n'));
        assert_eq!(kinds(r"'A'")[0], TokenKind::Char('A'));
        assert_eq!(kinds("'é'")[0], TokenKind::Char('é'));
    }

    #[test]
    fn multichar_char_literal_is_one_error() {
        let (got, errors) = kinds_with_errors("'ab' x");
        assert!(matches!(got[0], TokenKind::Invalid(_)));
        assert!(matches!(got[1], TokenKind::Ident(_)));
        assert_eq!(errors, 1);
    }

    #[test]
    fn comments_and_whitespace_are_trivia() {
        assert_eq!(
            kinds("// line\n  1 /* block\n comment */ 2"),
            vec![int(1), int(2), TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_block_comment_reports_once() {
        let (got, errors) = kinds_with_errors("1 /* never closed");
        assert_eq!(got, vec![int(1), TokenKind::Eof]);
        assert_eq!(errors, 1);
    }

    #[test]
    fn preprocessor_lines_are_trivia() {
        assert_eq!(
            kinds("#if DEBUG\n1\n#endif\n2"),
            vec![int(1), int(2), TokenKind::Eof]
        );
    }

    #[test]
    fn hash_mid_line_is_invalid_not_preprocessor() {
        let (got, errors) = kinds_with_errors("1 #if");
        assert!(matches!(got[1], TokenKind::Invalid(_)));
        assert_eq!(errors, 1);
    }

    #[test]
    fn gt_never_merges_but_shl_does() {
        // `>>` stays two tokens for the parser to recombine by adjacency.
        assert_eq!(
            kinds(">>"),
            vec![TokenKind::Gt, TokenKind::Gt, TokenKind::Eof]
        );
        assert_eq!(kinds("<<"), vec![TokenKind::Shl, TokenKind::Eof]);
        assert_eq!(kinds("<<="), vec![TokenKind::ShlEq, TokenKind::Eof]);
        assert_eq!(kinds(">="), vec![TokenKind::GtEq, TokenKind::Eof]);
        assert_eq!(
            kinds(">>="),
            vec![TokenKind::Gt, TokenKind::GtEq, TokenKind::Eof]
        );
    }

    #[test]
    fn nested_generic_close_spans_are_adjacent() {
        let interner = StringInterner::default();
        let (tokens, _) = lex("List<List<int>>", &interner);
        let gts: Vec<Span> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Gt)
            .map(|t| t.span)
            .collect();
        assert_eq!(gts.len(), 2);
        assert_eq!(gts[0].end, gts[1].start);
    }

    #[test]
    fn maximal_munch_operators() {
        assert_eq!(
            kinds("??= ?? ?. :: -> => ++ -- && ||"),
            vec![
                TokenKind::CoalesceEq,
                TokenKind::Coalesce,
                TokenKind::QuestionDot,
                TokenKind::DoubleColon,
                TokenKind::Arrow,
                TokenKind::FatArrow,
                TokenKind::PlusPlus,
                TokenKind::MinusMinus,
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn invalid_byte_yields_one_token_and_continues() {
        let interner = StringInterner::default();
        let (tokens, diags) = lex("a ` b", &interner);
        assert_eq!(diags.len(), 1);
        assert_eq!(tokens[0].kind, ident(&interner, "a"));
        assert_eq!(tokens[1].kind, TokenKind::Invalid(interner.intern("`")));
        assert_eq!(tokens[2].kind, ident(&interner, "b"));
    }

    #[test]
    fn spans_cover_exact_source_ranges() {
        let interner = StringInterner::default();
        let (tokens, _) = lex("int  foo", &interner);
        assert_eq!(tokens[0].span, Span::new(0, 3));
        assert_eq!(tokens[1].span, Span::new(5, 8));
        assert_eq!(tokens[2].span, Span::point(8));
    }

    #[test]
    fn identical_lexemes_intern_to_one_name() {
        let interner = StringInterner::default();
        let (tokens, _) = lex("foo foo", &interner);
        let names: Vec<Name> = tokens
            .iter()
            .filter_map(|t| match t.kind {
                TokenKind::Ident(name) => Some(name),
                _ => None,
            })
            .collect();
        assert_eq!(names[0], names[1]);
    }

    mod properties {
        use proptest::prelude::*;

        use csf_ir::{StringInterner, TokenKind};

        use crate::lex;

        proptest! {
            // The lexer is total: any input produces a finite,
            // Eof-terminated stream and never panics.
            #[test]
            fn lexing_never_panics(source in ".*") {
                let interner = StringInterner::default();
                let (tokens, _) = lex(&source, &interner);
                prop_assert!(tokens.len() >= 1);
                prop_assert_eq!(&tokens[tokens.len() - 1].kind, &TokenKind::Eof);
            }

            // Token spans are ordered and within the source.
            #[test]
            fn spans_are_monotonic(source in "[ -~\\n]{0,200}") {
                let interner = StringInterner::default();
                let (tokens, _) = lex(&source, &interner);
                let mut prev_end = 0u32;
                for token in tokens.iter() {
                    prop_assert!(token.span.start >= prev_end);
                    prop_assert!(token.span.end as usize <= source.len());
                    prev_end = token.span.start;
                }
            }

            // Same input, same output (no hidden state).
            #[test]
            fn lexing_is_deterministic(source in "[ -~\\n]{0,200}") {
                let interner = StringInterner::default();
                let (a, diags_a) = lex(&source, &interner);
                let (b, diags_b) = lex(&source, &interner);
                let ka: Vec<_> = a.iter().map(|t| t.kind.clone()).collect();
                let kb: Vec<_> = b.iter().map(|t| t.kind.clone()).collect();
                prop_assert_eq!(ka, kb);
                prop_assert_eq!(diags_a.len(), diags_b.len());
            }
        }
    }
}
