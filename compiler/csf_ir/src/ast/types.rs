//! Syntactic type references.
//!
//! `ParsedType` is what the parser produces for a type position; it is
//! purely syntactic. The semantic pass resolves it against the symbol
//! table into a `TypeId` in the type pool.

use crate::{Name, Span};

/// Built-in type keywords.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum PrimitiveName {
    Bool,
    Byte,
    Sbyte,
    Short,
    Ushort,
    Int,
    Uint,
    Long,
    Ulong,
    Char,
    Float,
    Double,
    Decimal,
    String,
    Object,
    Void,
}

/// One segment of a dotted type name: `List<int>` in
/// `System.Collections.Generic.List<int>`.
#[derive(Clone, PartialEq, Debug)]
pub struct TypeSegment {
    pub name: Name,
    pub type_args: Vec<ParsedType>,
    pub span: Span,
}

/// A possibly-qualified, possibly-generic type name.
#[derive(Clone, PartialEq, Debug)]
pub struct TypePath {
    pub segments: Vec<TypeSegment>,
}

impl TypePath {
    /// The final (rightmost) segment, which names the type itself.
    ///
    /// A `TypePath` always has at least one segment by construction.
    pub fn last(&self) -> &TypeSegment {
        // Parser invariant: never constructs an empty path.
        self.segments.last().unwrap_or_else(|| unreachable!())
    }
}

/// A syntactic type reference.
#[derive(Clone, PartialEq, Debug)]
pub struct ParsedType {
    pub kind: ParsedTypeKind,
    pub span: Span,
}

#[derive(Clone, PartialEq, Debug)]
pub enum ParsedTypeKind {
    /// Built-in keyword type (`int`, `string`, `object`, `void`, ...).
    Primitive(PrimitiveName),
    /// Named type, possibly qualified and generic: `Foo.Bar<T, int>`.
    Named(TypePath),
    /// `dynamic` (contextual keyword in type position).
    Dynamic,
    /// `var` in a local-declaration type position (contextual keyword).
    Var,
    /// Array type: element + rank (`int[]` rank 1, `int[,]` rank 2).
    Array { element: Box<ParsedType>, rank: u8 },
    /// Nullable type `T?`.
    Nullable(Box<ParsedType>),
    /// Pointer type `T*` (unsafe contexts).
    Pointer(Box<ParsedType>),
    /// Tuple type `(int a, string b)`.
    Tuple(Vec<(Option<Name>, ParsedType)>),
    /// Placeholder for a malformed type; suppresses cascading errors.
    Error,
}

impl ParsedType {
    pub fn new(kind: ParsedTypeKind, span: Span) -> Self {
        ParsedType { kind, span }
    }

    /// Synthesize an error type at the given location.
    pub fn error(span: Span) -> Self {
        ParsedType {
            kind: ParsedTypeKind::Error,
            span,
        }
    }

    /// Check if this is the `var` placeholder.
    pub fn is_var(&self) -> bool {
        matches!(self.kind, ParsedTypeKind::Var)
    }

    /// Check if this is `void`.
    pub fn is_void(&self) -> bool {
        matches!(
            self.kind,
            ParsedTypeKind::Primitive(PrimitiveName::Void)
        )
    }
}
