use std::fmt;

/// Error codes for all front-end diagnostics.
///
/// Format: E#### / W#### where the first digit indicates phase:
/// - E01xx: lexical errors
/// - E11xx: syntax errors
/// - E2xxx: semantic errors
/// - W3xxx: warnings
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Lexical errors (E01xx)
    /// Unterminated string literal
    E0101,
    /// Invalid character in source
    E0102,
    /// Invalid number literal
    E0103,
    /// Unterminated or malformed character literal
    E0104,
    /// Invalid escape sequence
    E0105,
    /// Unterminated block comment
    E0106,

    // Syntax errors (E11xx)
    /// Unexpected token
    E1101,
    /// Expected expression
    E1102,
    /// Expected identifier
    E1103,
    /// Expected type
    E1104,
    /// Unclosed delimiter
    E1105,
    /// Construct nested too deeply
    E1106,
    /// Invalid member declaration
    E1107,

    // Semantic errors (E2xxx)
    /// Type mismatch (no implicit conversion)
    E2001,
    /// Unresolved symbol
    E2002,
    /// Ambiguous symbol (equal-specificity using directives)
    E2003,
    /// No applicable overload candidate
    E2004,
    /// Ambiguous call (multiple equally good candidates)
    E2005,
    /// Generic constraint violation
    E2006,
    /// Circular definition
    E2007,
    /// Compile-time constant overflow in checked context
    E2008,
    /// Local variable shadows another local in an enclosing local scope
    E2009,
    /// `yield` in an illegal context (catch/finally/lock/unsafe)
    E2010,
    /// `await` inside a `lock` statement
    E2011,
    /// Unsafe construct outside an allowed unsafe context
    E2012,
    /// Named argument does not match any parameter
    E2013,
    /// `foreach` source has no usable enumerator pattern
    E2014,
    /// Duplicate declaration in the same scope
    E2015,

    // Warnings (W3xxx)
    /// Unreachable code
    W3001,
    /// Unused local variable
    W3002,
}

impl ErrorCode {
    /// One-line explanation used by `csfc explain`.
    pub fn explanation(self) -> &'static str {
        match self {
            ErrorCode::E0101 => "a string literal is missing its closing quote",
            ErrorCode::E0102 => "the source contains a character no token can start with",
            ErrorCode::E0103 => "a numeric literal is malformed or out of range",
            ErrorCode::E0104 => "a character literal is unterminated, empty, or too long",
            ErrorCode::E0105 => "a string or character literal contains an unknown escape",
            ErrorCode::E0106 => "a block comment is missing its closing */",
            ErrorCode::E1101 => "the parser found a token it did not expect here",
            ErrorCode::E1102 => "an expression was required at this position",
            ErrorCode::E1103 => "an identifier was required at this position",
            ErrorCode::E1104 => "a type was required at this position",
            ErrorCode::E1105 => "an opening delimiter was never closed",
            ErrorCode::E1106 => "the construct exceeds the parser nesting limit",
            ErrorCode::E1107 => "the member declaration is malformed",
            ErrorCode::E2001 => "no implicit conversion exists between these types",
            ErrorCode::E2002 => "the name does not resolve to any declaration in scope",
            ErrorCode::E2003 => "the name resolves to multiple equally specific declarations",
            ErrorCode::E2004 => "no overload accepts these arguments",
            ErrorCode::E2005 => "the call is ambiguous between multiple overloads",
            ErrorCode::E2006 => "a type argument violates a generic constraint",
            ErrorCode::E2007 => "the definition refers to itself without indirection",
            ErrorCode::E2008 => "a constant expression overflows in a checked context",
            ErrorCode::E2009 => "a local name conflicts with a local in an enclosing scope",
            ErrorCode::E2010 => "yield cannot appear in catch, finally, lock, or unsafe blocks",
            ErrorCode::E2011 => "await cannot appear inside a lock statement",
            ErrorCode::E2012 => "unsafe code requires an unsafe context and --unsafe",
            ErrorCode::E2013 => "a named argument does not match any declared parameter",
            ErrorCode::E2014 => {
                "the foreach source exposes no GetEnumerator/MoveNext/Current pattern"
            }
            ErrorCode::E2015 => "the name is already declared in this scope",
            ErrorCode::W3001 => "this code can never be reached",
            ErrorCode::W3002 => "the local variable is never used",
        }
    }

    /// Check if this code is a warning rather than an error.
    pub fn is_warning(self) -> bool {
        matches!(self, ErrorCode::W3001 | ErrorCode::W3002)
    }

    /// All codes, for `csfc explain` listing.
    pub fn all() -> &'static [ErrorCode] {
        use ErrorCode::*;
        &[
            E0101, E0102, E0103, E0104, E0105, E0106, E1101, E1102, E1103, E1104, E1105, E1106,
            E1107, E2001, E2002, E2003, E2004, E2005, E2006, E2007, E2008, E2009, E2010, E2011,
            E2012, E2013, E2014, E2015, W3001, W3002,
        ]
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_code_name() {
        assert_eq!(ErrorCode::E2001.to_string(), "E2001");
        assert_eq!(ErrorCode::W3001.to_string(), "W3001");
    }

    #[test]
    fn warning_classification() {
        assert!(ErrorCode::W3001.is_warning());
        assert!(!ErrorCode::E2001.is_warning());
    }

    #[test]
    fn every_code_has_an_explanation() {
        for code in ErrorCode::all() {
            assert!(!code.explanation().is_empty(), "{code} lacks explanation");
        }
    }
}
