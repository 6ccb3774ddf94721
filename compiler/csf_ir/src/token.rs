//! Tokens: the lexer/parser boundary.
//!
//! Contextual keywords (`from`, `where` in queries, `var`, `yield`,
//! `await`, `dynamic`, ...) deliberately have no `TokenKind` variant:
//! they lex as [`TokenKind::Ident`] and the parser recognizes them
//! positionally. Likewise `<`/`>` always lex as plain [`TokenKind::Lt`]
//! and [`TokenKind::Gt`]; generic-argument disambiguation and `>>`
//! shift recombination are the parser's job.

use std::fmt;

use crate::{Name, Span};

/// Suffix on an integer literal (`42u`, `42L`, `42UL`).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum IntSuffix {
    #[default]
    None,
    U,
    L,
    UL,
}

/// Suffix on a real literal (`1f`, `1d`, `1m`).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum RealSuffix {
    /// No suffix: the literal is `double` when it has a `.`/exponent.
    #[default]
    None,
    /// `f` / `F` — `float`.
    F,
    /// `d` / `D` — `double`.
    D,
    /// `m` / `M` — `decimal`.
    M,
}

/// Token kinds for the C# subset handled by the front-end.
///
/// Real literals store bits as u64 for Eq/Hash compatibility.
/// String literals and identifiers use interned [`Name`]s.
#[derive(Clone, Eq, PartialEq, Hash)]
pub enum TokenKind {
    /// Integer literal: `42`, `0x2A`, `0b1010`, `1_000u`.
    Int { value: u64, suffix: IntSuffix },
    /// Real literal: `3.14`, `2.5e-8f` (f64 bits for Eq/Hash).
    Real { bits: u64, suffix: RealSuffix },
    /// String literal, cooked (escapes resolved) and interned.
    String(Name),
    /// Char literal: `'a'`, `'\n'`.
    Char(char),
    /// Identifier (interned). Includes `@`-verbatim identifiers and all
    /// contextual keywords.
    Ident(Name),
    /// Malformed lexeme. The lexer never aborts: it emits this kind
    /// carrying the offending text and a diagnostic, and the parser
    /// decides how to recover.
    Invalid(Name),

    // Keywords (non-contextual only).
    Abstract,
    As,
    Base,
    Bool,
    Break,
    Byte,
    Case,
    Catch,
    CharKw,
    Checked,
    Class,
    Const,
    Continue,
    Decimal,
    Default,
    Delegate,
    Do,
    Double,
    Else,
    Enum,
    Event,
    Explicit,
    Extern,
    False,
    Finally,
    Fixed,
    Float,
    For,
    Foreach,
    Goto,
    If,
    Implicit,
    In,
    IntKw,
    Interface,
    Internal,
    Is,
    Lock,
    Long,
    Namespace,
    New,
    Null,
    Object,
    Operator,
    Out,
    Override,
    Params,
    Private,
    Protected,
    Public,
    Readonly,
    Ref,
    Return,
    Sbyte,
    Sealed,
    Short,
    Sizeof,
    Static,
    StringKw,
    Struct,
    Switch,
    This,
    Throw,
    True,
    Try,
    Typeof,
    Uint,
    Ulong,
    Unchecked,
    Unsafe,
    Ushort,
    Using,
    Virtual,
    Void,
    Volatile,
    While,

    // Punctuation and operators.
    LParen,        // (
    RParen,        // )
    LBrace,        // {
    RBrace,        // }
    LBracket,      // [
    RBracket,      // ]
    Semicolon,     // ;
    Comma,         // ,
    Dot,           // .
    Colon,         // :
    DoubleColon,   // ::
    Question,      // ?
    QuestionDot,   // ?.
    Coalesce,      // ??
    CoalesceEq,    // ??=
    Arrow,         // ->
    FatArrow,      // =>
    Plus,          // +
    Minus,         // -
    Star,          // *
    Slash,         // /
    Percent,       // %
    Amp,           // &
    Pipe,          // |
    Caret,         // ^
    Bang,          // !
    Tilde,         // ~
    Eq,            // =
    EqEq,          // ==
    NotEq,         // !=
    Lt,            // <  (also generic open; parser decides)
    LtEq,          // <=
    Gt,            // >  (never merged by the lexer; parser recombines >>)
    GtEq,          // >=
    Shl,           // <<
    PlusPlus,      // ++
    MinusMinus,    // --
    AmpAmp,        // &&
    PipePipe,      // ||
    PlusEq,        // +=
    MinusEq,       // -=
    StarEq,        // *=
    SlashEq,       // /=
    PercentEq,     // %=
    AmpEq,         // &=
    PipeEq,        // |=
    CaretEq,       // ^=
    ShlEq,         // <<=

    Eof,
}

impl TokenKind {
    /// Check if this kind can begin a member/type declaration modifier list.
    pub fn is_declaration_modifier(&self) -> bool {
        matches!(
            self,
            TokenKind::Public
                | TokenKind::Private
                | TokenKind::Protected
                | TokenKind::Internal
                | TokenKind::Static
                | TokenKind::Abstract
                | TokenKind::Sealed
                | TokenKind::Virtual
                | TokenKind::Override
                | TokenKind::Readonly
                | TokenKind::Extern
                | TokenKind::Unsafe
                | TokenKind::Volatile
                | TokenKind::New
        )
    }

    /// Check if this kind is a built-in type keyword (`int`, `string`, ...).
    pub fn is_builtin_type_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Bool
                | TokenKind::Byte
                | TokenKind::Sbyte
                | TokenKind::Short
                | TokenKind::Ushort
                | TokenKind::IntKw
                | TokenKind::Uint
                | TokenKind::Long
                | TokenKind::Ulong
                | TokenKind::CharKw
                | TokenKind::Float
                | TokenKind::Double
                | TokenKind::Decimal
                | TokenKind::StringKw
                | TokenKind::Object
                | TokenKind::Void
        )
    }

    /// Check if this kind is a literal.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::Int { .. }
                | TokenKind::Real { .. }
                | TokenKind::String(_)
                | TokenKind::Char(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
        )
    }

    /// Short human-readable description for diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Int { .. } => "integer literal",
            TokenKind::Real { .. } => "real literal",
            TokenKind::String(_) => "string literal",
            TokenKind::Char(_) => "character literal",
            TokenKind::Ident(_) => "identifier",
            TokenKind::Invalid(_) => "invalid token",
            TokenKind::Eof => "end of file",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Comma => "`,`",
            TokenKind::Dot => "`.`",
            TokenKind::Colon => "`:`",
            TokenKind::DoubleColon => "`::`",
            TokenKind::Question => "`?`",
            TokenKind::QuestionDot => "`?.`",
            TokenKind::Coalesce => "`??`",
            TokenKind::CoalesceEq => "`??=`",
            TokenKind::Arrow => "`->`",
            TokenKind::FatArrow => "`=>`",
            TokenKind::Lt => "`<`",
            TokenKind::Gt => "`>`",
            TokenKind::Eq => "`=`",
            _ => "token",
        }
    }
}

impl fmt::Debug for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int { value, suffix } => write!(f, "Int({value}, {suffix:?})"),
            TokenKind::Real { bits, suffix } => {
                write!(f, "Real({}, {suffix:?})", f64::from_bits(*bits))
            }
            TokenKind::String(name) => write!(f, "String({})", name.raw()),
            TokenKind::Char(c) => write!(f, "Char({c:?})"),
            TokenKind::Ident(name) => write!(f, "Ident({})", name.raw()),
            TokenKind::Invalid(name) => write!(f, "Invalid({})", name.raw()),
            other => write!(f, "{}", other.describe_variant()),
        }
    }
}

impl TokenKind {
    fn describe_variant(&self) -> &'static str {
        match self {
            TokenKind::Eof => "Eof",
            TokenKind::LParen => "LParen",
            TokenKind::RParen => "RParen",
            TokenKind::LBrace => "LBrace",
            TokenKind::RBrace => "RBrace",
            TokenKind::LBracket => "LBracket",
            TokenKind::RBracket => "RBracket",
            TokenKind::Semicolon => "Semicolon",
            _ => "Kw/Op",
        }
    }
}

/// A token: kind plus source span.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }
}

/// Finite token sequence for one compilation unit.
///
/// Invariant: the list is never empty and always ends with exactly one
/// [`TokenKind::Eof`] token, so cursor positions `0..len()` are always
/// valid and lookahead never needs bounds branches.
#[derive(Clone, Debug, Default)]
pub struct TokenList {
    tokens: Vec<Token>,
}

impl TokenList {
    /// Build a token list, appending the trailing EOF token.
    pub fn new(mut tokens: Vec<Token>, eof_offset: u32) -> Self {
        tokens.push(Token::new(TokenKind::Eof, Span::point(eof_offset)));
        TokenList { tokens }
    }

    /// Number of tokens including the trailing EOF.
    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// A token list is never logically empty (EOF is always present).
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Get a token by index.
    #[inline]
    pub fn get(&self, idx: usize) -> Option<&Token> {
        self.tokens.get(idx)
    }

    /// Iterate over all tokens, EOF included.
    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }
}

impl std::ops::Index<usize> for TokenList {
    type Output = Token;

    fn index(&self, idx: usize) -> &Token {
        &self.tokens[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn token_list_always_ends_with_eof() {
        let list = TokenList::new(vec![], 0);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].kind, TokenKind::Eof);

        let list = TokenList::new(vec![Token::new(TokenKind::Semicolon, Span::new(0, 1))], 1);
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].kind, TokenKind::Eof);
        assert_eq!(list[1].span, Span::point(1));
    }

    #[test]
    fn real_literals_compare_by_bits() {
        let a = TokenKind::Real {
            bits: 1.5f64.to_bits(),
            suffix: RealSuffix::None,
        };
        let b = TokenKind::Real {
            bits: 1.5f64.to_bits(),
            suffix: RealSuffix::None,
        };
        assert_eq!(a, b);
    }

    #[test]
    fn modifier_classification() {
        assert!(TokenKind::Public.is_declaration_modifier());
        assert!(TokenKind::Static.is_declaration_modifier());
        assert!(!TokenKind::Class.is_declaration_modifier());
    }

    #[test]
    fn builtin_type_classification() {
        assert!(TokenKind::IntKw.is_builtin_type_keyword());
        assert!(TokenKind::StringKw.is_builtin_type_keyword());
        assert!(!TokenKind::Class.is_builtin_type_keyword());
    }
}
