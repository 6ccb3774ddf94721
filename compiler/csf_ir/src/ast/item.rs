//! Declaration nodes: compilation units, namespaces, types, members.

use bitflags::bitflags;

use crate::{Name, NodeId, Span};

use super::expr::Expr;
use super::stmt::Stmt;
use super::types::ParsedType;

bitflags! {
    /// Declaration modifiers. The parser records what it saw; legality
    /// per declaration kind is the checker's business.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct Modifiers: u16 {
        const PUBLIC    = 1 << 0;
        const PRIVATE   = 1 << 1;
        const PROTECTED = 1 << 2;
        const INTERNAL  = 1 << 3;
        const STATIC    = 1 << 4;
        const ABSTRACT  = 1 << 5;
        const SEALED    = 1 << 6;
        const VIRTUAL   = 1 << 7;
        const OVERRIDE  = 1 << 8;
        const READONLY  = 1 << 9;
        const EXTERN    = 1 << 10;
        const UNSAFE    = 1 << 11;
        const VOLATILE  = 1 << 12;
        const NEW       = 1 << 13;
        const ASYNC     = 1 << 14;
        const PARTIAL   = 1 << 15;
    }
}

/// A (syntactic) attribute: `[Conditional("DEBUG")]`. Attached to
/// declarations; the front-end performs no semantic attribute binding.
#[derive(Clone, PartialEq, Debug)]
pub struct Attribute {
    pub name: super::types::TypePath,
    pub args: Vec<super::expr::Argument>,
    pub span: Span,
}

/// `using System;` / `using IO = System.IO;` / `using static System.Math;`
#[derive(Clone, PartialEq, Debug)]
pub struct UsingDirective {
    pub alias: Option<Name>,
    pub is_static: bool,
    pub path: Vec<Name>,
    pub span: Span,
}

/// A compilation unit: one source file.
#[derive(Clone, PartialEq, Debug)]
pub struct CompilationUnit {
    pub usings: Vec<UsingDirective>,
    pub items: Vec<Item>,
    /// Total number of `NodeId`s assigned while parsing this unit;
    /// side tables can be sized exactly.
    pub node_count: u32,
}

/// Top-level item inside a compilation unit or namespace.
#[derive(Clone, PartialEq, Debug)]
pub enum Item {
    Namespace(NamespaceDecl),
    Type(TypeDecl),
    /// Placeholder for an unrecoverable top-level construct.
    Error(Span),
}

/// `namespace A.B { ... }`.
#[derive(Clone, PartialEq, Debug)]
pub struct NamespaceDecl {
    pub path: Vec<Name>,
    pub usings: Vec<UsingDirective>,
    pub items: Vec<Item>,
    pub span: Span,
}

/// Variance annotation on a type parameter of an interface/delegate.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Variance {
    /// `out T` — covariant.
    Out,
    /// `in T` — contravariant.
    In,
}

/// A declared type parameter.
#[derive(Clone, PartialEq, Debug)]
pub struct TypeParam {
    pub name: Name,
    pub variance: Option<Variance>,
    pub span: Span,
}

/// One constraint in a `where` clause.
#[derive(Clone, PartialEq, Debug)]
pub enum Constraint {
    /// `where T : class`.
    ReferenceType,
    /// `where T : struct`.
    ValueType,
    /// `where T : new()`.
    DefaultConstructor,
    /// `where T : SomeBase` / `where T : ISome`.
    Type(ParsedType),
}

/// `where T : class, IComparable<T>, new()`.
#[derive(Clone, PartialEq, Debug)]
pub struct ConstraintClause {
    pub param: Name,
    pub constraints: Vec<Constraint>,
    pub span: Span,
}

/// What kind of type declaration this is.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeDeclKind {
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
}

/// `enum` member: name plus optional constant initializer.
#[derive(Clone, PartialEq, Debug)]
pub struct EnumMember {
    pub name: Name,
    pub value: Option<Expr>,
    pub span: Span,
}

/// A type declaration. Enum members and the delegate signature are
/// carried inline so one node kind covers all five declaration forms.
#[derive(Clone, PartialEq, Debug)]
pub struct TypeDecl {
    pub id: NodeId,
    pub kind: TypeDeclKind,
    pub name: Name,
    pub modifiers: Modifiers,
    pub attributes: Vec<Attribute>,
    pub type_params: Vec<TypeParam>,
    pub constraints: Vec<ConstraintClause>,
    /// Base type and/or implemented interfaces (or the enum underlying
    /// type). Resolution sorts out which is which.
    pub bases: Vec<ParsedType>,
    pub members: Vec<Member>,
    /// Enum declarations only.
    pub enum_members: Vec<EnumMember>,
    /// Delegate declarations only: `delegate R Name(params);`.
    pub delegate_params: Vec<Param>,
    pub delegate_return: Option<ParsedType>,
    pub span: Span,
}

/// Parameter passing modifier in a declaration.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum ParamModifier {
    #[default]
    None,
    Ref,
    Out,
    /// `params T[]` — must be last; absorbs trailing arguments.
    Params,
    /// `this` on the first parameter of an extension method.
    This,
}

/// A declared parameter.
#[derive(Clone, PartialEq, Debug)]
pub struct Param {
    pub name: Name,
    pub ty: ParsedType,
    pub modifier: ParamModifier,
    /// Default value for optional parameters.
    pub default: Option<Expr>,
    pub span: Span,
}

/// Disambiguates the declaration forms that share `MethodDecl`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum MethodKind {
    Method,
    Constructor,
    /// Static constructor `static Name()`.
    StaticConstructor,
    Destructor,
    LocalFunction,
}

/// Method-shaped declaration (also constructors and local functions).
#[derive(Clone, PartialEq, Debug)]
pub struct MethodDecl {
    pub id: NodeId,
    pub kind: MethodKind,
    pub name: Name,
    pub modifiers: Modifiers,
    pub attributes: Vec<Attribute>,
    pub type_params: Vec<TypeParam>,
    pub constraints: Vec<ConstraintClause>,
    pub params: Vec<Param>,
    /// `None` for constructors/destructors.
    pub return_type: Option<ParsedType>,
    /// Explicit interface implementation: `void IFoo.M() {...}`.
    pub explicit_interface: Option<ParsedType>,
    /// `None` for abstract/extern/interface members.
    pub body: Option<Stmt>,
    pub span: Span,
}

/// Field declaration; one declaration may declare several fields.
#[derive(Clone, PartialEq, Debug)]
pub struct FieldDecl {
    pub id: NodeId,
    pub modifiers: Modifiers,
    pub attributes: Vec<Attribute>,
    pub is_const: bool,
    pub ty: ParsedType,
    pub declarators: Vec<(Name, Option<Expr>)>,
    pub span: Span,
}

/// A property accessor (`get` / `set`), possibly auto-implemented.
#[derive(Clone, PartialEq, Debug)]
pub struct PropertyAccessor {
    pub is_set: bool,
    pub modifiers: Modifiers,
    /// `None` for auto-implemented accessors.
    pub body: Option<Stmt>,
    pub span: Span,
}

/// Property, or indexer when `index_params` is non-empty.
#[derive(Clone, PartialEq, Debug)]
pub struct PropertyDecl {
    pub id: NodeId,
    pub name: Name,
    pub modifiers: Modifiers,
    pub attributes: Vec<Attribute>,
    pub ty: ParsedType,
    pub explicit_interface: Option<ParsedType>,
    /// Indexer parameters (`this[int i]`); empty for plain properties.
    pub index_params: Vec<Param>,
    pub accessors: Vec<PropertyAccessor>,
    /// Expression-bodied property: `int X => 42;`.
    pub expr_body: Option<Expr>,
    pub span: Span,
}

/// User-defined operator kind.
#[derive(Clone, PartialEq, Debug)]
pub enum OperatorKind {
    Binary(super::operators::BinaryOp),
    Unary(super::operators::UnaryOp),
    /// `implicit operator T` / `explicit operator T`.
    Conversion { implicit: bool },
    /// `operator true` / `operator false`.
    True,
    False,
}

/// `public static T operator +(T a, T b) { ... }`.
#[derive(Clone, PartialEq, Debug)]
pub struct OperatorDecl {
    pub id: NodeId,
    pub op: OperatorKind,
    pub modifiers: Modifiers,
    pub attributes: Vec<Attribute>,
    pub params: Vec<Param>,
    pub return_type: ParsedType,
    pub body: Option<Stmt>,
    pub span: Span,
}

/// A type member.
#[derive(Clone, PartialEq, Debug)]
pub enum Member {
    Field(FieldDecl),
    Method(MethodDecl),
    Property(PropertyDecl),
    Operator(OperatorDecl),
    /// `event EventHandler Changed;` — field-like events only.
    Event(FieldDecl),
    NestedType(TypeDecl),
    /// Placeholder for a malformed member (recovery resynchronized here).
    Error(Span),
}
