//! Expression nodes.

use crate::{Name, NodeId, Span};

use super::operators::{AssignOp, BinaryOp, UnaryOp};
use super::types::ParsedType;

/// Argument passing modifier at a call site.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum ArgumentModifier {
    #[default]
    None,
    Ref,
    Out,
}

/// A call-site argument: optional name (named arguments may appear out
/// of declaration order), optional `ref`/`out` modifier, and the value.
#[derive(Clone, PartialEq, Debug)]
pub struct Argument {
    pub name: Option<Name>,
    pub modifier: ArgumentModifier,
    pub expr: Expr,
    pub span: Span,
}

/// A lambda parameter; the type is optional (`x => ...` vs `(int x) => ...`).
#[derive(Clone, PartialEq, Debug)]
pub struct LambdaParam {
    pub name: Name,
    pub ty: Option<ParsedType>,
    pub span: Span,
}

/// A lambda body is either an expression or a block statement.
#[derive(Clone, PartialEq, Debug)]
pub enum LambdaBody {
    Expr(Box<Expr>),
    Block(Box<super::stmt::Stmt>),
}

/// Member of an anonymous object creation: `new { X = 1, y.Z }`.
#[derive(Clone, PartialEq, Debug)]
pub struct AnonymousMember {
    /// Explicit name, or `None` for projection members whose name is
    /// inferred from the expression (`y.Z` names the member `Z`).
    pub name: Option<Name>,
    pub value: Expr,
}

/// Element of a tuple literal: optional name plus value.
#[derive(Clone, PartialEq, Debug)]
pub struct TupleElement {
    pub name: Option<Name>,
    pub value: Expr,
}

/// Ordering direction in a query `orderby` clause.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum OrderingDirection {
    #[default]
    Ascending,
    Descending,
}

/// A LINQ query expression. The contextual keywords (`from`, `where`,
/// `select`, ...) are only recognized here; elsewhere they are ordinary
/// identifiers.
#[derive(Clone, PartialEq, Debug)]
pub struct QueryExpr {
    /// Leading `from [type] name in source`.
    pub range_var: Name,
    pub range_ty: Option<ParsedType>,
    pub source: Box<Expr>,
    /// Body clauses in source order.
    pub clauses: Vec<QueryClause>,
    /// Terminating `select` or `group ... by`.
    pub terminal: QueryFinal,
    /// Query continuation: `into name <rest-of-query>`.
    pub continuation: Option<(Name, Box<QueryExpr>)>,
}

#[derive(Clone, PartialEq, Debug)]
pub enum QueryClause {
    /// Additional `from name in source`.
    From {
        name: Name,
        ty: Option<ParsedType>,
        source: Expr,
    },
    /// `let name = value`.
    Let { name: Name, value: Expr },
    /// `where condition`.
    Where(Expr),
    /// `join name in source on left equals right [into group]`.
    Join {
        name: Name,
        source: Expr,
        left: Expr,
        right: Expr,
        into: Option<Name>,
    },
    /// `orderby key [ascending|descending], ...`.
    OrderBy(Vec<(Expr, OrderingDirection)>),
}

#[derive(Clone, PartialEq, Debug)]
pub enum QueryFinal {
    Select(Expr),
    GroupBy { element: Expr, key: Expr },
}

/// An expression node. Owns its children; annotated by the checker via
/// side tables keyed on `id`.
#[derive(Clone, PartialEq, Debug)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(id: NodeId, kind: ExprKind, span: Span) -> Self {
        Expr { id, kind, span }
    }

    /// Synthesize an error placeholder so upstream structure stays intact.
    pub fn error(id: NodeId, span: Span) -> Self {
        Expr {
            id,
            kind: ExprKind::Error,
            span,
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum ExprKind {
    /// Placeholder synthesized during error recovery.
    Error,

    // Literals.
    LitInt {
        value: u64,
        suffix: crate::IntSuffix,
    },
    LitReal {
        bits: u64,
        suffix: crate::RealSuffix,
    },
    LitString(Name),
    LitChar(char),
    LitBool(bool),
    LitNull,

    /// Simple name.
    Ident(Name),
    /// Generic method name with explicit type arguments: `M<int>`.
    GenericName {
        name: Name,
        type_args: Vec<ParsedType>,
    },
    /// `this` / `base`.
    This,
    Base,

    /// Member access `target.name` / null-conditional `target?.name`,
    /// with optional explicit type arguments (`x.M<int>`).
    Member {
        target: Box<Expr>,
        name: Name,
        type_args: Vec<ParsedType>,
        null_conditional: bool,
    },
    /// Invocation `target(args...)`.
    Invocation {
        target: Box<Expr>,
        args: Vec<Argument>,
    },
    /// Element access `target[args...]` / `target?[args...]`.
    Index {
        target: Box<Expr>,
        args: Vec<Argument>,
        null_conditional: bool,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Conditional `cond ? then : otherwise`.
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// Cast `(T)expr`.
    Cast {
        ty: ParsedType,
        expr: Box<Expr>,
    },
    /// `expr is T` / `expr as T`.
    Is {
        expr: Box<Expr>,
        ty: ParsedType,
    },
    As {
        expr: Box<Expr>,
        ty: ParsedType,
    },

    /// Object creation `new T(args) { inits }`.
    New {
        ty: ParsedType,
        args: Vec<Argument>,
        initializer: Option<Vec<Expr>>,
    },
    /// Array creation `new T[len]{...}` / `new[] {...}`.
    NewArray {
        element: Option<ParsedType>,
        lengths: Vec<Expr>,
        rank: u8,
        initializer: Option<Vec<Expr>>,
    },
    /// Anonymous object `new { A = 1, b.C }`.
    AnonymousObject(Vec<AnonymousMember>),

    /// Lambda `(params) => body` / anonymous method `delegate (..) {..}`.
    Lambda {
        params: Vec<LambdaParam>,
        body: LambdaBody,
        is_async: bool,
    },
    /// LINQ query expression.
    Query(Box<QueryExpr>),
    /// Tuple literal `(1, b: 2)`.
    Tuple(Vec<TupleElement>),

    /// `typeof(T)`.
    TypeOf(ParsedType),
    /// `nameof(expr)` (contextual keyword).
    NameOf(Box<Expr>),
    /// `sizeof(T)` (unsafe contexts).
    SizeOf(ParsedType),
    /// `default(T)` / `default`.
    Default(Option<ParsedType>),
    /// `checked(expr)` / `unchecked(expr)`.
    CheckedExpr {
        checked: bool,
        expr: Box<Expr>,
    },

    /// Parenthesized expression (preserved for faithful reconstruction).
    Paren(Box<Expr>),
}
