//! The token scanner.
//!
//! One pass over the sentinel-terminated buffer, producing a finite
//! token sequence. The scanner never fails: malformed lexemes become
//! [`TokenKind::Invalid`] tokens plus a diagnostic, and the parser
//! decides how to recover (spec'd error policy: tolerate, don't abort).

use csf_diagnostic::{Diagnostic, ErrorCode};
use csf_ir::{IntSuffix, Name, RealSuffix, Span, StringInterner, Token, TokenKind, TokenList};

use crate::cursor::Cursor;
use crate::escape::{cook_escape, EscapeError};
use crate::keywords::keyword_kind;
use crate::SourceBuffer;

/// Tokenize one compilation unit.
///
/// Pure: same input, same output; the only side channel is the returned
/// diagnostics list. Restartable from scratch, not mid-stream.
pub fn lex(source: &str, interner: &StringInterner) -> (TokenList, Vec<Diagnostic>) {
    let buffer = SourceBuffer::new(source);
    let mut scanner = Scanner {
        cursor: buffer.cursor(),
        interner,
        tokens: Vec::with_capacity(source.len() / 6 + 8),
        diagnostics: Vec::new(),
        at_line_start: true,
    };
    scanner.run();
    let Scanner {
        tokens,
        diagnostics,
        ..
    } = scanner;
    (TokenList::new(tokens, buffer.source_len()), diagnostics)
}

struct Scanner<'a> {
    cursor: Cursor<'a>,
    interner: &'a StringInterner,
    tokens: Vec<Token>,
    diagnostics: Vec<Diagnostic>,
    /// Tracks line starts so preprocessor lines (`#...`) are recognized
    /// only where the C# grammar allows them.
    at_line_start: bool,
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

impl Scanner<'_> {
    fn run(&mut self) {
        loop {
            self.skip_trivia();
            if self.cursor.is_eof() {
                break;
            }
            let start = self.cursor.pos();
            let kind = self.next_token_kind(start);
            let span = Span::new(start, self.cursor.pos());
            self.tokens.push(Token::new(kind, span));
            self.at_line_start = false;
        }
    }

    /// Skip whitespace, newlines, comments, and preprocessor lines.
    fn skip_trivia(&mut self) {
        loop {
            match self.cursor.current() {
                b' ' | b'\t' | b'\r' => self.cursor.advance(),
                b'\n' => {
                    self.cursor.advance();
                    self.at_line_start = true;
                }
                b'/' if self.cursor.peek() == b'/' => {
                    self.cursor.eat_until_newline_or_eof();
                }
                b'/' if self.cursor.peek() == b'*' => self.skip_block_comment(),
                // Preprocessor directives are trivia for this front-end
                // (conditional compilation is out of scope).
                b'#' if self.at_line_start => {
                    self.cursor.eat_until_newline_or_eof();
                }
                _ => break,
            }
        }
    }

    fn skip_block_comment(&mut self) {
        let start = self.cursor.pos();
        self.cursor.advance_n(2); // past /*
        loop {
            if self.cursor.is_eof() {
                self.diagnostics.push(
                    Diagnostic::error(ErrorCode::E0106)
                        .with_message("unterminated block comment")
                        .with_label(Span::new(start, start + 2), "comment opened here"),
                );
                return;
            }
            if self.cursor.current() == b'*' && self.cursor.peek() == b'/' {
                self.cursor.advance_n(2);
                return;
            }
            self.cursor.advance_char();
        }
    }

    fn next_token_kind(&mut self, start: u32) -> TokenKind {
        let b = self.cursor.current();
        match b {
            b'0'..=b'9' => self.scan_number(start),
            b'"' => self.scan_string(start, false),
            b'\'' => self.scan_char(start),
            b'@' if self.cursor.peek() == b'"' => {
                self.cursor.advance(); // @
                self.scan_verbatim_string(start)
            }
            b'@' if is_ident_start(self.cursor.peek()) => {
                self.cursor.advance(); // @
                // Verbatim identifier: keyword text stays an identifier.
                let name = self.scan_ident_text();
                TokenKind::Ident(name)
            }
            b'$' if self.cursor.peek() == b'"' => {
                self.cursor.advance(); // $
                self.scan_string(start, true)
            }
            b'$' if self.cursor.peek() == b'@' && self.cursor.peek2() == b'"' => {
                self.cursor.advance_n(2); // $@
                self.scan_verbatim_string(start)
            }
            b'\\' if self.cursor.peek() == b'u' || self.cursor.peek() == b'U' => {
                // Unicode escape starting an identifier.
                let name = self.scan_ident_text();
                TokenKind::Ident(name)
            }
            _ if is_ident_start(b) => {
                let text_start = self.cursor.pos();
                let name = self.scan_ident_text();
                match keyword_kind(self.cursor.slice_from(text_start)) {
                    Some(kw) => kw,
                    None => TokenKind::Ident(name),
                }
            }
            b'.' if self.cursor.peek().is_ascii_digit() => self.scan_number(start),
            _ => self.scan_operator(start),
        }
    }

    /// Scan an identifier, cooking `\u`/`\U` escapes if present.
    fn scan_ident_text(&mut self) -> Name {
        let start = self.cursor.pos();
        loop {
            let b = self.cursor.current();
            if is_ident_continue(b) {
                self.cursor.advance_char();
            } else if b == b'\\' && (self.cursor.peek() == b'u' || self.cursor.peek() == b'U') {
                return self.scan_ident_with_escapes(start);
            } else {
                break;
            }
        }
        self.interner.intern(self.cursor.slice_from(start))
    }

    /// Slow path: the identifier contains unicode escapes.
    fn scan_ident_with_escapes(&mut self, start: u32) -> Name {
        let mut text = String::from(self.cursor.slice_from(start));
        loop {
            let b = self.cursor.current();
            if is_ident_continue(b) {
                let piece_start = self.cursor.pos();
                self.cursor.advance_char();
                text.push_str(self.cursor.slice_from(piece_start));
            } else if b == b'\\' && (self.cursor.peek() == b'u' || self.cursor.peek() == b'U') {
                let rest_start = self.cursor.pos();
                let rest = self.cursor.slice(rest_start, self.remaining_end());
                match cook_escape(rest) {
                    Ok(cooked) => {
                        text.push(cooked.ch);
                        self.cursor.advance_n(cooked.consumed as u32);
                    }
                    Err(_) => {
                        self.diagnostics.push(
                            Diagnostic::error(ErrorCode::E0105)
                                .with_message("invalid unicode escape in identifier")
                                .with_label(Span::new(rest_start, rest_start + 2), "here"),
                        );
                        self.cursor.advance_n(2);
                    }
                }
            } else {
                break;
            }
        }
        self.interner.intern(&text)
    }

    fn remaining_end(&self) -> u32 {
        // slice() clamps to source_len via its debug contract; the scanner
        // only slices within the source.
        let mut probe = self.cursor;
        probe.eat_while(|b| b != 0);
        probe.pos()
    }

    // === Numbers ===

    fn scan_number(&mut self, start: u32) -> TokenKind {
        let c = self.cursor;
        if c.current() == b'0' && (c.peek() == b'x' || c.peek() == b'X') {
            return self.scan_int_radix(start, 16);
        }
        if c.current() == b'0' && (c.peek() == b'b' || c.peek() == b'B') {
            return self.scan_int_radix(start, 2);
        }

        // Decimal integer part.
        self.cursor
            .eat_while(|b| b.is_ascii_digit() || b == b'_');

        let mut is_real = false;
        // Fraction: only if `.` is followed by a digit (otherwise the dot
        // is member access: `1.ToString()`).
        if self.cursor.current() == b'.' && self.cursor.peek().is_ascii_digit() {
            is_real = true;
            self.cursor.advance();
            self.cursor
                .eat_while(|b| b.is_ascii_digit() || b == b'_');
        }
        // Exponent.
        if matches!(self.cursor.current(), b'e' | b'E') {
            let after = self.cursor.peek();
            let after2 = self.cursor.peek2();
            if after.is_ascii_digit()
                || ((after == b'+' || after == b'-') && after2.is_ascii_digit())
            {
                is_real = true;
                self.cursor.advance(); // e
                if matches!(self.cursor.current(), b'+' | b'-') {
                    self.cursor.advance();
                }
                self.cursor.eat_while(|b| b.is_ascii_digit());
            }
        }

        let digits_end = self.cursor.pos();
        // Real suffix makes it a real even without `.`/exponent: `1f`.
        if let Some(suffix) = self.scan_real_suffix() {
            return self.cook_real(start, digits_end, suffix);
        }
        if is_real {
            return self.cook_real(start, digits_end, RealSuffix::None);
        }
        let suffix = self.scan_int_suffix();
        self.cook_int(start, digits_end, 10, suffix)
    }

    fn scan_int_radix(&mut self, start: u32, radix: u32) -> TokenKind {
        self.cursor.advance_n(2); // 0x / 0b
        let digits_start = self.cursor.pos();
        self.cursor.eat_while(|b| match radix {
            16 => b.is_ascii_hexdigit() || b == b'_',
            _ => b == b'0' || b == b'1' || b == b'_',
        });
        if self.cursor.pos() == digits_start {
            return self.invalid_number(start, "missing digits after radix prefix");
        }
        let digits_end = self.cursor.pos();
        let suffix = self.scan_int_suffix();
        self.cook_int(digits_start, digits_end, radix, suffix)
    }

    fn scan_int_suffix(&mut self) -> IntSuffix {
        let b = self.cursor.current();
        let p = self.cursor.peek();
        match (b, p) {
            (b'u' | b'U', b'l' | b'L') | (b'l' | b'L', b'u' | b'U') => {
                self.cursor.advance_n(2);
                IntSuffix::UL
            }
            (b'u' | b'U', _) => {
                self.cursor.advance();
                IntSuffix::U
            }
            (b'l' | b'L', _) => {
                self.cursor.advance();
                IntSuffix::L
            }
            _ => IntSuffix::None,
        }
    }

    fn scan_real_suffix(&mut self) -> Option<RealSuffix> {
        let suffix = match self.cursor.current() {
            b'f' | b'F' => RealSuffix::F,
            b'd' | b'D' => RealSuffix::D,
            b'm' | b'M' => RealSuffix::M,
            _ => return None,
        };
        // `d` must not swallow identifier text: `1day` is an error handled
        // by the ident check below, not a real literal.
        if is_ident_continue(self.cursor.peek()) {
            return None;
        }
        self.cursor.advance();
        Some(suffix)
    }

    fn cook_int(&mut self, start: u32, end: u32, radix: u32, suffix: IntSuffix) -> TokenKind {
        let text = self.cursor.slice(start, end);
        let mut value: u64 = 0;
        for ch in text.chars().filter(|&ch| ch != '_') {
            let Some(d) = ch.to_digit(radix) else {
                return self.invalid_number(start, "invalid digit in literal");
            };
            let (shifted, ov1) = value.overflowing_mul(u64::from(radix));
            let (next, ov2) = shifted.overflowing_add(u64::from(d));
            if ov1 || ov2 {
                return self.invalid_number(start, "integer literal too large");
            }
            value = next;
        }
        TokenKind::Int { value, suffix }
    }

    fn cook_real(&mut self, start: u32, end: u32, suffix: RealSuffix) -> TokenKind {
        let text: String = self
            .cursor
            .slice(start, end)
            .chars()
            .filter(|&ch| ch != '_')
            .collect();
        match text.parse::<f64>() {
            Ok(v) => TokenKind::Real {
                bits: v.to_bits(),
                suffix,
            },
            Err(_) => self.invalid_number(start, "malformed real literal"),
        }
    }

    fn invalid_number(&mut self, start: u32, why: &str) -> TokenKind {
        // Consume any trailing ident-ish garbage so the parser sees one
        // bad token, not several.
        self.cursor.eat_while(is_ident_continue);
        let text = self.cursor.slice_from(start);
        self.diagnostics.push(
            Diagnostic::error(ErrorCode::E0103)
                .with_message(format!("invalid number literal: {why}"))
                .with_label(Span::new(start, self.cursor.pos()), "here"),
        );
        TokenKind::Invalid(self.interner.intern(text))
    }

    // === Strings and chars ===

    fn scan_string(&mut self, start: u32, _interpolated: bool) -> TokenKind {
        self.cursor.advance(); // opening "
        let mut text = String::new();
        loop {
            let piece_start = self.cursor.pos();
            let found = self.cursor.skip_to_string_delim();
            text.push_str(self.cursor.slice_from(piece_start));
            match found {
                b'"' => {
                    self.cursor.advance();
                    return TokenKind::String(self.interner.intern(&text));
                }
                b'\\' => {
                    let esc_start = self.cursor.pos();
                    let rest = self.cursor.slice(esc_start, self.remaining_end());
                    match cook_escape(rest) {
                        Ok(cooked) => {
                            text.push(cooked.ch);
                            self.cursor.advance_n(cooked.consumed as u32);
                        }
                        Err(err) => {
                            self.push_escape_error(esc_start, err);
                            self.cursor.advance_n(2);
                        }
                    }
                }
                // Newline or EOF: ordinary strings cannot span lines.
                _ => {
                    self.diagnostics.push(
                        Diagnostic::error(ErrorCode::E0101)
                            .with_message("unterminated string literal")
                            .with_label(Span::new(start, self.cursor.pos()), "string opened here"),
                    );
                    return TokenKind::Invalid(self.interner.intern(&text));
                }
            }
        }
    }

    /// Verbatim string `@"..."`: no escapes except `""` for a quote.
    fn scan_verbatim_string(&mut self, start: u32) -> TokenKind {
        self.cursor.advance(); // opening "
        let mut text = String::new();
        loop {
            if self.cursor.is_eof() {
                self.diagnostics.push(
                    Diagnostic::error(ErrorCode::E0101)
                        .with_message("unterminated verbatim string literal")
                        .with_label(Span::new(start, start + 2), "string opened here"),
                );
                return TokenKind::Invalid(self.interner.intern(&text));
            }
            if self.cursor.current() == b'"' {
                if self.cursor.peek() == b'"' {
                    text.push('"');
                    self.cursor.advance_n(2);
                    continue;
                }
                self.cursor.advance();
                return TokenKind::String(self.interner.intern(&text));
            }
            let piece_start = self.cursor.pos();
            self.cursor.advance_char();
            text.push_str(self.cursor.slice_from(piece_start));
        }
    }

    fn scan_char(&mut self, start: u32) -> TokenKind {
        self.cursor.advance(); // opening '
        let ch = match self.cursor.current() {
            b'\'' | b'\n' | 0 => {
                return self.invalid_char(start, "empty or unterminated character literal");
            }
            b'\\' => {
                let esc_start = self.cursor.pos();
                let rest = self.cursor.slice(esc_start, self.remaining_end());
                match cook_escape(rest) {
                    Ok(cooked) => {
                        self.cursor.advance_n(cooked.consumed as u32);
                        cooked.ch
                    }
                    Err(err) => {
                        self.push_escape_error(esc_start, err);
                        self.cursor.advance_n(2);
                        '\u{FFFD}'
                    }
                }
            }
            _ => {
                let piece_start = self.cursor.pos();
                self.cursor.advance_char();
                self.cursor
                    .slice_from(piece_start)
                    .chars()
                    .next()
                    .unwrap_or('\u{FFFD}')
            }
        };
        if self.cursor.current() != b'\'' {
            return self.invalid_char(start, "character literal must contain exactly one character");
        }
        self.cursor.advance(); // closing '
        TokenKind::Char(ch)
    }

    fn invalid_char(&mut self, start: u32, why: &str) -> TokenKind {
        // Resync to the closing quote on the same line, if any.
        self.cursor
            .eat_while(|b| b != b'\'' && b != b'\n' && b != 0);
        if self.cursor.current() == b'\'' {
            self.cursor.advance();
        }
        let text = self.cursor.slice_from(start);
        self.diagnostics.push(
            Diagnostic::error(ErrorCode::E0104)
                .with_message(why)
                .with_label(Span::new(start, self.cursor.pos()), "here"),
        );
        TokenKind::Invalid(self.interner.intern(text))
    }

    fn push_escape_error(&mut self, at: u32, err: EscapeError) {
        let message = match err {
            EscapeError::UnknownEscape(c) => format!("unknown escape sequence `\\{c}`"),
            EscapeError::MalformedHex => "malformed hex escape".to_string(),
            EscapeError::InvalidScalar(v) => {
                format!("escape names invalid unicode scalar U+{v:04X}")
            }
            EscapeError::Truncated => "escape sequence is truncated".to_string(),
        };
        self.diagnostics.push(
            Diagnostic::error(ErrorCode::E0105)
                .with_message(message)
                .with_label(Span::new(at, at + 2), "here"),
        );
    }

    // === Operators and punctuation ===

    fn scan_operator(&mut self, start: u32) -> TokenKind {
        let b = self.cursor.current();
        let p = self.cursor.peek();
        let p2 = self.cursor.peek2();

        // Three-byte operators first (maximal munch).
        let three = match (b, p, p2) {
            (b'?', b'?', b'=') => Some(TokenKind::CoalesceEq),
            (b'<', b'<', b'=') => Some(TokenKind::ShlEq),
            _ => None,
        };
        if let Some(kind) = three {
            self.cursor.advance_n(3);
            return kind;
        }

        let two = match (b, p) {
            (b'?', b'?') => Some(TokenKind::Coalesce),
            (b'?', b'.') => Some(TokenKind::QuestionDot),
            (b':', b':') => Some(TokenKind::DoubleColon),
            (b'-', b'>') => Some(TokenKind::Arrow),
            (b'=', b'>') => Some(TokenKind::FatArrow),
            (b'=', b'=') => Some(TokenKind::EqEq),
            (b'!', b'=') => Some(TokenKind::NotEq),
            (b'<', b'=') => Some(TokenKind::LtEq),
            // `>` never merges with a following `>`; the parser splits
            // relational chains from shifts by token adjacency.
            (b'>', b'=') => Some(TokenKind::GtEq),
            (b'<', b'<') => Some(TokenKind::Shl),
            (b'+', b'+') => Some(TokenKind::PlusPlus),
            (b'-', b'-') => Some(TokenKind::MinusMinus),
            (b'&', b'&') => Some(TokenKind::AmpAmp),
            (b'|', b'|') => Some(TokenKind::PipePipe),
            (b'+', b'=') => Some(TokenKind::PlusEq),
            (b'-', b'=') => Some(TokenKind::MinusEq),
            (b'*', b'=') => Some(TokenKind::StarEq),
            (b'/', b'=') => Some(TokenKind::SlashEq),
            (b'%', b'=') => Some(TokenKind::PercentEq),
            (b'&', b'=') => Some(TokenKind::AmpEq),
            (b'|', b'=') => Some(TokenKind::PipeEq),
            (b'^', b'=') => Some(TokenKind::CaretEq),
            _ => None,
        };
        if let Some(kind) = two {
            self.cursor.advance_n(2);
            return kind;
        }

        let one = match b {
            b'(' => Some(TokenKind::LParen),
            b')' => Some(TokenKind::RParen),
            b'{' => Some(TokenKind::LBrace),
            b'}' => Some(TokenKind::RBrace),
            b'[' => Some(TokenKind::LBracket),
            b']' => Some(TokenKind::RBracket),
            b';' => Some(TokenKind::Semicolon),
            b',' => Some(TokenKind::Comma),
            b'.' => Some(TokenKind::Dot),
            b':' => Some(TokenKind::Colon),
            b'?' => Some(TokenKind::Question),
            b'+' => Some(TokenKind::Plus),
            b'-' => Some(TokenKind::Minus),
            b'*' => Some(TokenKind::Star),
            b'/' => Some(TokenKind::Slash),
            b'%' => Some(TokenKind::Percent),
            b'&' => Some(TokenKind::Amp),
            b'|' => Some(TokenKind::Pipe),
            b'^' => Some(TokenKind::Caret),
            b'!' => Some(TokenKind::Bang),
            b'~' => Some(TokenKind::Tilde),
            b'=' => Some(TokenKind::Eq),
            b'<' => Some(TokenKind::Lt),
            b'>' => Some(TokenKind::Gt),
            _ => None,
        };
        if let Some(kind) = one {
            self.cursor.advance();
            return kind;
        }

        // Nothing matched: one invalid character token.
        self.cursor.advance_char();
        let text = self.cursor.slice_from(start);
        self.diagnostics.push(
            Diagnostic::error(ErrorCode::E0102)
                .with_message(format!("invalid character `{text}` in source"))
                .with_label(Span::new(start, self.cursor.pos()), "here"),
        );
        TokenKind::Invalid(self.interner.intern(text))
    }
}
