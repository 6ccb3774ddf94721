//! Statement nodes.

use crate::{Name, NodeId, Span};

use super::expr::Expr;
use super::item::MethodDecl;
use super::types::ParsedType;

/// `for` initializer: either a local declaration or an expression list.
#[derive(Clone, PartialEq, Debug)]
pub enum ForInit {
    /// `for (int i = 0; ...)`.
    Declaration(Box<Stmt>),
    /// `for (i = 0, j = 1; ...)`.
    Expressions(Vec<Expr>),
}

/// `goto` target forms, including `goto case`/`goto default` inside
/// `switch` sections.
#[derive(Clone, PartialEq, Debug)]
pub enum GotoTarget {
    Label(Name),
    Case(Expr),
    Default,
}

/// One label of a switch section: `case <const-expr>:` or `default:`.
#[derive(Clone, PartialEq, Debug)]
pub enum SwitchLabel {
    Case(Expr),
    Default,
}

/// A switch section: one or more labels followed by statements.
#[derive(Clone, PartialEq, Debug)]
pub struct SwitchSection {
    pub labels: Vec<SwitchLabel>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// `catch [(Type [name])] [when (...)] { ... }`.
#[derive(Clone, PartialEq, Debug)]
pub struct CatchClause {
    pub ty: Option<ParsedType>,
    pub name: Option<Name>,
    /// `when (filter)` — contextual keyword.
    pub filter: Option<Expr>,
    pub body: Box<Stmt>,
    pub span: Span,
}

/// A statement node.
#[derive(Clone, PartialEq, Debug)]
pub struct Stmt {
    pub id: NodeId,
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(id: NodeId, kind: StmtKind, span: Span) -> Self {
        Stmt { id, kind, span }
    }

    /// Synthesize an error placeholder during recovery.
    pub fn error(id: NodeId, span: Span) -> Self {
        Stmt {
            id,
            kind: StmtKind::Error,
            span,
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum StmtKind {
    /// Placeholder synthesized during error recovery.
    Error,
    /// `;`
    Empty,
    /// `{ ... }`
    Block(Vec<Stmt>),
    /// Local variable declaration, possibly `const` or a `using` declaration
    /// (`using var f = ...;`). One statement may declare several locals.
    LocalVar {
        ty: ParsedType,
        declarators: Vec<(Name, Option<Expr>)>,
        is_const: bool,
        is_using: bool,
    },
    /// Local function declaration.
    LocalFunction(Box<MethodDecl>),
    /// Expression statement.
    Expr(Expr),

    If {
        cond: Expr,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
    },
    For {
        init: Option<ForInit>,
        cond: Option<Expr>,
        update: Vec<Expr>,
        body: Box<Stmt>,
    },
    /// `foreach (T name in source) body`. Iteration is duck-typed: the
    /// checker looks for `GetEnumerator`/`MoveNext`/`Current` by shape,
    /// not for a nominal interface.
    Foreach {
        ty: ParsedType,
        name: Name,
        source: Expr,
        body: Box<Stmt>,
    },
    Switch {
        scrutinee: Expr,
        sections: Vec<SwitchSection>,
    },
    Try {
        body: Box<Stmt>,
        catches: Vec<CatchClause>,
        finally: Option<Box<Stmt>>,
    },
    /// `using (resource) body` — statement form. The resource is either
    /// a declaration statement or an expression.
    Using {
        resource: Box<Stmt>,
        body: Box<Stmt>,
    },
    Lock {
        expr: Expr,
        body: Box<Stmt>,
    },
    /// `checked { ... }` / `unchecked { ... }`.
    Checked {
        checked: bool,
        body: Box<Stmt>,
    },
    /// `unsafe { ... }`.
    Unsafe(Box<Stmt>),

    Return(Option<Expr>),
    Break,
    Continue,
    Goto(GotoTarget),
    Labeled {
        label: Name,
        stmt: Box<Stmt>,
    },
    YieldReturn(Expr),
    YieldBreak,
    Throw(Option<Expr>),
}
