//! Escape sequence cooking for string and character literals.

/// Failure modes when cooking an escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeError {
    /// `\q` and friends.
    UnknownEscape(char),
    /// `\x` with no hex digits, or `\u`/`\U` with too few.
    MalformedHex,
    /// Escape names a scalar value outside the Unicode range.
    InvalidScalar(u32),
    /// Input ended in the middle of an escape.
    Truncated,
}

/// Result of cooking one escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookedEscape {
    /// The resolved character.
    pub ch: char,
    /// Bytes consumed from `rest`, including the leading `\`.
    pub consumed: usize,
}

/// Cook the escape sequence at the start of `rest` (which begins with `\`).
///
/// Supports the C# set: simple escapes, `\x` (1-4 hex digits), `\u`
/// (exactly 4), and `\U` (exactly 8).
pub fn cook_escape(rest: &str) -> Result<CookedEscape, EscapeError> {
    let mut chars = rest.chars();
    let backslash = chars.next();
    debug_assert_eq!(backslash, Some('\\'));
    let Some(kind) = chars.next() else {
        return Err(EscapeError::Truncated);
    };

    let simple = |ch: char| Ok(CookedEscape { ch, consumed: 2 });
    match kind {
        '\'' => simple('\''),
        '"' => simple('"'),
        '\\' => simple('\\'),
        '0' => simple('\0'),
        'a' => simple('\u{7}'),
        'b' => simple('\u{8}'),
        'f' => simple('\u{C}'),
        'n' => simple('\n'),
        'r' => simple('\r'),
        't' => simple('\t'),
        'v' => simple('\u{B}'),
        'x' => cook_hex(&rest[2..], 1, 4),
        'u' => cook_hex(&rest[2..], 4, 4),
        'U' => cook_hex(&rest[2..], 8, 8),
        other => Err(EscapeError::UnknownEscape(other)),
    }
}

/// Cook `min..=max` hex digits following `\x`, `\u`, or `\U`.
fn cook_hex(digits: &str, min: usize, max: usize) -> Result<CookedEscape, EscapeError> {
    let mut value: u32 = 0;
    let mut count = 0;
    for b in digits.bytes().take(max) {
        let Some(d) = (b as char).to_digit(16) else {
            break;
        };
        value = value.wrapping_shl(4) | d;
        count += 1;
    }
    if count < min {
        return Err(EscapeError::MalformedHex);
    }
    let ch = char::from_u32(value).ok_or(EscapeError::InvalidScalar(value))?;
    Ok(CookedEscape {
        ch,
        // leading backslash + kind char + digits
        consumed: 2 + count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cook_ok(s: &str) -> (char, usize) {
        match cook_escape(s) {
            Ok(c) => (c.ch, c.consumed),
            Err(e) => panic!("expected escape to cook: {s:?} -> {e:?}"),
        }
    }

    #[test]
    fn simple_escapes() {
        assert_eq!(cook_ok("\\n"), ('\n', 2));
        assert_eq!(cook_ok("\\t"), ('\t', 2));
        assert_eq!(cook_ok("\\\\"), ('\\', 2));
        assert_eq!(cook_ok("\\0"), ('\0', 2));
        assert_eq!(cook_ok("\\'"), ('\'', 2));
    }

    #[test]
    fn hex_escape_variable_width() {
        assert_eq!(cook_ok("\\x41"), ('A', 4));
        // \x stops at the first non-hex digit
        assert_eq!(cook_ok("\\x4G"), ('\u{4}', 3));
    }

    #[test]
    fn unicode_escape_exact_width() {
        assert_eq!(cook_ok("\\u0041"), ('A', 6));
        assert_eq!(cook_ok("\\U0001F600"), ('\u{1F600}', 10));
        assert_eq!(cook_escape("\\u41"), Err(EscapeError::MalformedHex));
    }

    #[test]
    fn unknown_escape_reports_the_char() {
        assert_eq!(cook_escape("\\q"), Err(EscapeError::UnknownEscape('q')));
    }

    #[test]
    fn surrogate_scalar_is_rejected() {
        assert_eq!(
            cook_escape("\\uD800"),
            Err(EscapeError::InvalidScalar(0xD800))
        );
    }

    #[test]
    fn truncated_escape() {
        assert_eq!(cook_escape("\\"), Err(EscapeError::Truncated));
    }
}
