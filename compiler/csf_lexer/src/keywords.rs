//! Keyword recognition.
//!
//! Only reserved C# keywords appear here. Contextual keywords (`var`,
//! `yield`, `await`, `from`, `where` in queries, `dynamic`, `partial`,
//! `async`, `when`, `nameof`, ...) lex as identifiers; the parser
//! recognizes them positionally, which is what keeps fixtures like
//! "`from` used as a variable name" working.

use csf_ir::TokenKind;

/// Map reserved keyword text to its token kind.
pub fn keyword_kind(text: &str) -> Option<TokenKind> {
    Some(match text {
        "abstract" => TokenKind::Abstract,
        "as" => TokenKind::As,
        "base" => TokenKind::Base,
        "bool" => TokenKind::Bool,
        "break" => TokenKind::Break,
        "byte" => TokenKind::Byte,
        "case" => TokenKind::Case,
        "catch" => TokenKind::Catch,
        "char" => TokenKind::CharKw,
        "checked" => TokenKind::Checked,
        "class" => TokenKind::Class,
        "const" => TokenKind::Const,
        "continue" => TokenKind::Continue,
        "decimal" => TokenKind::Decimal,
        "default" => TokenKind::Default,
        "delegate" => TokenKind::Delegate,
        "do" => TokenKind::Do,
        "double" => TokenKind::Double,
        "else" => TokenKind::Else,
        "enum" => TokenKind::Enum,
        "event" => TokenKind::Event,
        "explicit" => TokenKind::Explicit,
        "extern" => TokenKind::Extern,
        "false" => TokenKind::False,
        "finally" => TokenKind::Finally,
        "fixed" => TokenKind::Fixed,
        "float" => TokenKind::Float,
        "for" => TokenKind::For,
        "foreach" => TokenKind::Foreach,
        "goto" => TokenKind::Goto,
        "if" => TokenKind::If,
        "implicit" => TokenKind::Implicit,
        "in" => TokenKind::In,
        "int" => TokenKind::IntKw,
        "interface" => TokenKind::Interface,
        "internal" => TokenKind::Internal,
        "is" => TokenKind::Is,
        "lock" => TokenKind::Lock,
        "long" => TokenKind::Long,
        "namespace" => TokenKind::Namespace,
        "new" => TokenKind::New,
        "null" => TokenKind::Null,
        "object" => TokenKind::Object,
        "operator" => TokenKind::Operator,
        "out" => TokenKind::Out,
        "override" => TokenKind::Override,
        "params" => TokenKind::Params,
        "private" => TokenKind::Private,
        "protected" => TokenKind::Protected,
        "public" => TokenKind::Public,
        "readonly" => TokenKind::Readonly,
        "ref" => TokenKind::Ref,
        "return" => TokenKind::Return,
        "sbyte" => TokenKind::Sbyte,
        "sealed" => TokenKind::Sealed,
        "short" => TokenKind::Short,
        "sizeof" => TokenKind::Sizeof,
        "static" => TokenKind::Static,
        "string" => TokenKind::StringKw,
        "struct" => TokenKind::Struct,
        "switch" => TokenKind::Switch,
        "this" => TokenKind::This,
        "throw" => TokenKind::Throw,
        "true" => TokenKind::True,
        "try" => TokenKind::Try,
        "typeof" => TokenKind::Typeof,
        "uint" => TokenKind::Uint,
        "ulong" => TokenKind::Ulong,
        "unchecked" => TokenKind::Unchecked,
        "unsafe" => TokenKind::Unsafe,
        "ushort" => TokenKind::Ushort,
        "using" => TokenKind::Using,
        "virtual" => TokenKind::Virtual,
        "void" => TokenKind::Void,
        "volatile" => TokenKind::Volatile,
        "while" => TokenKind::While,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_words_are_keywords() {
        assert_eq!(keyword_kind("class"), Some(TokenKind::Class));
        assert_eq!(keyword_kind("foreach"), Some(TokenKind::Foreach));
        assert_eq!(keyword_kind("unchecked"), Some(TokenKind::Unchecked));
    }

    #[test]
    fn contextual_keywords_are_identifiers() {
        for word in [
            "var", "yield", "await", "async", "dynamic", "partial", "from", "where", "select",
            "let", "join", "into", "orderby", "group", "by", "on", "equals", "ascending",
            "descending", "nameof", "when", "get", "set", "value", "add", "remove", "global",
        ] {
            assert_eq!(keyword_kind(word), None, "{word} must lex as identifier");
        }
    }

    #[test]
    fn case_sensitive() {
        assert_eq!(keyword_kind("Class"), None);
        assert_eq!(keyword_kind("INT"), None);
    }
}
