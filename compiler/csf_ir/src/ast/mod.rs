//! Abstract syntax tree for one compilation unit.
//!
//! The tree is owned (each node owns its children exclusively) and is
//! never mutated structurally after parsing. Expressions and statements
//! carry dense [`NodeId`](crate::NodeId)s; the semantic checker records
//! resolved types and symbols in side tables keyed by those ids, so a
//! node "gains" annotations without the tree itself changing.

mod expr;
mod item;
mod operators;
mod stmt;
mod types;

pub use expr::{
    AnonymousMember, Argument, ArgumentModifier, Expr, ExprKind, LambdaBody, LambdaParam,
    OrderingDirection, QueryClause, QueryExpr, QueryFinal, TupleElement,
};
pub use item::{
    Attribute, CompilationUnit, Constraint, ConstraintClause, EnumMember, FieldDecl, Item, Member,
    MethodDecl, MethodKind, Modifiers, NamespaceDecl, OperatorDecl, OperatorKind, Param,
    ParamModifier, PropertyAccessor, PropertyDecl, TypeDecl, TypeDeclKind, TypeParam,
    UsingDirective, Variance,
};
pub use operators::{AssignOp, BinaryOp, UnaryOp};
pub use stmt::{CatchClause, ForInit, GotoTarget, Stmt, StmtKind, SwitchLabel, SwitchSection};
pub use types::{ParsedType, ParsedTypeKind, PrimitiveName, TypePath, TypeSegment};
