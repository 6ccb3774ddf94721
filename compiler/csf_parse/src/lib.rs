//! Recursive-descent parser producing one [`CompilationUnit`] per source
//! file.
//!
//! The grammar lives under [`grammar`]: declarations in `item`,
//! statements in `stmt`, expressions in `expr` (precedence climbing),
//! type references in `ty`. Context-sensitive spots (generic arguments
//! vs comparison chains, casts vs parenthesized expressions, lambdas vs
//! tuples, local declarations vs expression statements) disambiguate by
//! speculative parsing over [`snapshot::ParserSnapshot`]s.
//!
//! The parser always produces a tree. Errors become `Error` nodes plus
//! diagnostics, and recovery resynchronizes at member or statement
//! boundaries so one mistake cannot hide the rest of the file.

mod context;
mod cursor;
mod grammar;
mod recovery;
mod snapshot;

use csf_diagnostic::{Diagnostic, ErrorCode};
use csf_ir::ast::CompilationUnit;
use csf_ir::{Name, NodeId, Span, StringInterner, TokenKind, TokenList};
use tracing::{debug, trace};

use crate::context::ParseContext;
use crate::cursor::Cursor;
use crate::snapshot::ParserSnapshot;

/// Nesting limit for recursive constructs. Deeply nested source gets a
/// diagnostic instead of a stack overflow.
const MAX_DEPTH: u32 = 256;

/// Everything the parser produced for one compilation unit.
#[derive(Debug)]
pub struct ParseResult {
    pub unit: CompilationUnit,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse a token stream into a compilation unit.
pub fn parse(tokens: &TokenList, interner: &StringInterner) -> ParseResult {
    debug!(tokens = tokens.len(), "parse");
    let mut parser = Parser::new(tokens, interner);
    let unit = parser.compilation_unit();
    debug!(
        items = unit.items.len(),
        nodes = unit.node_count,
        diagnostics = parser.diagnostics.len(),
        "parse done"
    );
    ParseResult {
        unit,
        diagnostics: parser.diagnostics,
    }
}

/// Lex and parse in one step; lexical diagnostics come first.
pub fn parse_source(source: &str, interner: &StringInterner) -> ParseResult {
    let (tokens, mut diagnostics) = csf_lexer::lex(source, interner);
    let result = parse(&tokens, interner);
    diagnostics.extend(result.diagnostics);
    ParseResult {
        unit: result.unit,
        diagnostics,
    }
}

pub(crate) struct Parser<'a> {
    pub(crate) cursor: Cursor<'a>,
    pub(crate) context: ParseContext,
    pub(crate) diagnostics: Vec<Diagnostic>,
    next_node: u32,
    depth: u32,
    depth_exceeded: bool,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a TokenList, interner: &'a StringInterner) -> Self {
        Parser {
            cursor: Cursor::new(tokens, interner),
            context: ParseContext::default(),
            diagnostics: Vec::new(),
            next_node: 0,
            depth: 0,
            depth_exceeded: false,
        }
    }

    /// Allocate the next node id. Ids burned by restored speculative
    /// parses leave gaps, which side tables tolerate.
    pub(crate) fn next_id(&mut self) -> NodeId {
        let id = NodeId::from_raw(self.next_node);
        self.next_node += 1;
        id
    }

    pub(crate) fn node_count(&self) -> u32 {
        self.next_node
    }

    pub(crate) fn error(&mut self, diagnostic: Diagnostic) {
        trace!(
            code = %diagnostic.code,
            pos = self.cursor.position(),
            "parse diagnostic"
        );
        self.diagnostics.push(diagnostic);
    }

    /// Consume `kind` or report what was expected. Returns whether the
    /// token was there.
    pub(crate) fn expect(&mut self, kind: &TokenKind, expected: &str) -> bool {
        if self.cursor.eat(kind) {
            return true;
        }
        let span = self.cursor.current_span();
        let found = self.cursor.current_kind().describe();
        self.error(csf_diagnostic::unexpected_token(span, expected, found));
        false
    }

    /// Consume a contextual keyword or report what was expected.
    pub(crate) fn expect_contextual(&mut self, word: &str) -> bool {
        if self.cursor.eat_contextual(word) {
            return true;
        }
        let span = self.cursor.current_span();
        let found = self.cursor.current_kind().describe();
        self.error(csf_diagnostic::unexpected_token(
            span,
            &format!("`{word}`"),
            found,
        ));
        false
    }

    /// Consume an identifier or report and return `None`.
    pub(crate) fn expect_ident(&mut self, what: &str) -> Option<Name> {
        if let Some(name) = self.cursor.ident_name() {
            self.cursor.advance();
            return Some(name);
        }
        let span = self.cursor.current_span();
        self.error(
            Diagnostic::error(ErrorCode::E1103)
                .with_message(format!(
                    "expected {what}, found {}",
                    self.cursor.current_kind().describe()
                ))
                .with_label(span, format!("expected {what}")),
        );
        None
    }

    // === Speculation ===

    pub(crate) fn snapshot(&self) -> ParserSnapshot {
        ParserSnapshot::new(self.cursor.position(), self.context)
    }

    pub(crate) fn restore(&mut self, snapshot: ParserSnapshot) {
        self.cursor.set_position(snapshot.cursor_pos);
        self.context = snapshot.context;
    }

    /// Run `f` speculatively; restore on `None`. `f` must not emit
    /// diagnostics (use the `_opt` grammar entry points).
    pub(crate) fn try_parse<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let snapshot = self.snapshot();
        let result = f(self);
        if result.is_none() {
            self.restore(snapshot);
        }
        result
    }

    /// Run a token-only predicate ahead of the cursor, then restore
    /// unconditionally.
    pub(crate) fn look_ahead<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let snapshot = self.snapshot();
        let result = f(self);
        self.restore(snapshot);
        result
    }

    // === Depth guard ===

    /// Enter a recursive production. When the nesting limit is hit the
    /// first offender reports once and every deeper call bails out.
    pub(crate) fn enter(&mut self, span: Span) -> bool {
        self.depth += 1;
        if self.depth <= MAX_DEPTH {
            return true;
        }
        if !self.depth_exceeded {
            self.depth_exceeded = true;
            self.error(
                Diagnostic::error(ErrorCode::E1106)
                    .with_message("construct is nested too deeply")
                    .with_label(span, "nesting limit reached here"),
            );
        }
        false
    }

    pub(crate) fn leave(&mut self) {
        debug_assert!(self.depth > 0);
        self.depth -= 1;
    }

    /// Text of an interned name, for contextual keyword checks.
    pub(crate) fn name_text(&self, name: Name) -> &'a str {
        self.cursor.interner().lookup(name)
    }
}

#[cfg(test)]
mod tests {
    use csf_ir::StringInterner;
    use pretty_assertions::assert_eq;

    use super::parse_source;

    #[test]
    fn full_program_round_trip() {
        let interner = StringInterner::new();
        let result = parse_source(
            r#"
            using System;
            using System.Collections.Generic;

            namespace Geometry {
                public struct Vec {
                    public double X, Y;

                    public Vec(double x, double y) { X = x; Y = y; }

                    public double Length => Math.Sqrt(X * X + Y * Y);

                    public static Vec operator +(Vec a, Vec b) =>
                        new Vec(a.X + b.X, a.Y + b.Y);
                }

                public class Path<T> where T : IComparable<T> {
                    private List<Vec> points = new List<Vec>();

                    public int Count { get { return points.Count; } }

                    public IEnumerable<Vec> Walk() {
                        foreach (var p in points) {
                            yield return p;
                        }
                    }
                }
            }
            "#,
            &interner,
        );
        assert_eq!(result.diagnostics, vec![]);
        assert_eq!(result.unit.usings.len(), 2);
        assert_eq!(result.unit.items.len(), 1);
        assert!(result.unit.node_count > 0);
    }

    #[test]
    fn diagnostics_do_not_stop_the_tree() {
        let interner = StringInterner::new();
        let result = parse_source(
            "class A { void M() { int x = ; } }\nclass B { }",
            &interner,
        );
        assert!(!result.diagnostics.is_empty());
        assert_eq!(result.unit.items.len(), 2);
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            // the parser must produce a tree for arbitrary input, never
            // panic or loop
            #[test]
            fn parsing_never_panics(source in ".{0,400}") {
                let interner = StringInterner::new();
                let _ = parse_source(&source, &interner);
            }

            #[test]
            fn parsing_is_deterministic(source in "[ -~]{0,200}") {
                let interner_a = StringInterner::new();
                let interner_b = StringInterner::new();
                let a = parse_source(&source, &interner_a);
                let b = parse_source(&source, &interner_b);
                prop_assert_eq!(a.diagnostics.len(), b.diagnostics.len());
                prop_assert_eq!(a.unit.items.len(), b.unit.items.len());
            }
        }
    }
}
