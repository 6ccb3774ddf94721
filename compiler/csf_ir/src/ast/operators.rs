//! Operator enums shared by the parser, the checker, and diagnostics.

use std::fmt;

/// Binary operators, in source notation.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Add,      // +
    Sub,      // -
    Mul,      // *
    Div,      // /
    Rem,      // %
    Shl,      // <<
    Shr,      // >>
    BitAnd,   // &
    BitOr,    // |
    BitXor,   // ^
    LogAnd,   // &&
    LogOr,    // ||
    Eq,       // ==
    NotEq,    // !=
    Lt,       // <
    LtEq,     // <=
    Gt,       // >
    GtEq,     // >=
    Coalesce, // ??
}

impl BinaryOp {
    /// The user-overloadable operator method name (`op_Addition` etc.),
    /// or `None` for operators that cannot be overloaded (`&&`, `||`, `??`).
    pub fn operator_method_name(self) -> Option<&'static str> {
        Some(match self {
            BinaryOp::Add => "op_Addition",
            BinaryOp::Sub => "op_Subtraction",
            BinaryOp::Mul => "op_Multiply",
            BinaryOp::Div => "op_Division",
            BinaryOp::Rem => "op_Modulus",
            BinaryOp::Shl => "op_LeftShift",
            BinaryOp::Shr => "op_RightShift",
            BinaryOp::BitAnd => "op_BitwiseAnd",
            BinaryOp::BitOr => "op_BitwiseOr",
            BinaryOp::BitXor => "op_ExclusiveOr",
            BinaryOp::Eq => "op_Equality",
            BinaryOp::NotEq => "op_Inequality",
            BinaryOp::Lt => "op_LessThan",
            BinaryOp::LtEq => "op_LessThanOrEqual",
            BinaryOp::Gt => "op_GreaterThan",
            BinaryOp::GtEq => "op_GreaterThanOrEqual",
            BinaryOp::LogAnd | BinaryOp::LogOr | BinaryOp::Coalesce => return None,
        })
    }

    /// Check if this is an equality or relational operator.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
        )
    }

    /// Source notation.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::LogAnd => "&&",
            BinaryOp::LogOr => "||",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Coalesce => "??",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    Plus,      // +x
    Minus,     // -x
    Not,       // !x
    BitNot,    // ~x
    PreInc,    // ++x
    PreDec,    // --x
    PostInc,   // x++
    PostDec,   // x--
    AddressOf, // &x (unsafe contexts)
    Deref,     // *x (unsafe contexts)
    Await,     // await x (contextual)
}

impl UnaryOp {
    /// The user-overloadable operator method name, or `None`.
    pub fn operator_method_name(self) -> Option<&'static str> {
        Some(match self {
            UnaryOp::Plus => "op_UnaryPlus",
            UnaryOp::Minus => "op_UnaryNegation",
            UnaryOp::Not => "op_LogicalNot",
            UnaryOp::BitNot => "op_OnesComplement",
            UnaryOp::PreInc | UnaryOp::PostInc => "op_Increment",
            UnaryOp::PreDec | UnaryOp::PostDec => "op_Decrement",
            UnaryOp::AddressOf | UnaryOp::Deref | UnaryOp::Await => return None,
        })
    }

    /// Source notation.
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::PreInc | UnaryOp::PostInc => "++",
            UnaryOp::PreDec | UnaryOp::PostDec => "--",
            UnaryOp::AddressOf => "&",
            UnaryOp::Deref => "*",
            UnaryOp::Await => "await",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Assignment forms: simple `=`, compound `op=`, and `??=`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AssignOp {
    /// Plain `=`.
    Simple,
    /// Compound assignment desugaring to the given binary operator
    /// (`+=` is `Compound(Add)`, `??=` is `Compound(Coalesce)`).
    Compound(BinaryOp),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_circuit_operators_are_not_overloadable() {
        assert_eq!(BinaryOp::LogAnd.operator_method_name(), None);
        assert_eq!(BinaryOp::LogOr.operator_method_name(), None);
        assert_eq!(BinaryOp::Coalesce.operator_method_name(), None);
        assert_eq!(BinaryOp::Add.operator_method_name(), Some("op_Addition"));
    }

    #[test]
    fn comparison_classification() {
        assert!(BinaryOp::Eq.is_comparison());
        assert!(BinaryOp::GtEq.is_comparison());
        assert!(!BinaryOp::Add.is_comparison());
    }
}
