//! Compile-time constant evaluation.
//!
//! Used for enum member values, `const` declarations, `case` labels, and
//! the checked-constant overflow rule: in a `checked` context an
//! integral constant that leaves its type's range is a compile error,
//! not a silent truncation. Evaluation is pure; the caller decides which
//! failures become diagnostics.

use csf_ir::ast::{AssignOp, BinaryOp, Expr, ExprKind, UnaryOp};
use csf_ir::ast::{ParsedTypeKind, PrimitiveName};
use csf_ir::{IntSuffix, Name, RealSuffix, Span, StringInterner};
use csf_types::TypeId;

/// A compile-time constant.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ConstValue {
    /// Any integral value, carried widened; `ty` is the C# type.
    Int { value: i128, ty: TypeId },
    /// `float`/`double`/`decimal` value, stored as `f64` bits so the
    /// type stays `Eq`. Decimal precision is approximated.
    Real { bits: u64, ty: TypeId },
    Bool(bool),
    Char(char),
    Str(Name),
    Null,
}

impl ConstValue {
    pub fn ty(&self) -> TypeId {
        match self {
            ConstValue::Int { ty, .. } | ConstValue::Real { ty, .. } => *ty,
            ConstValue::Bool(_) => TypeId::BOOL,
            ConstValue::Char(_) => TypeId::CHAR,
            ConstValue::Str(_) => TypeId::STRING,
            ConstValue::Null => TypeId::NULL,
        }
    }

    fn as_integral(&self) -> Option<(i128, TypeId)> {
        match *self {
            ConstValue::Int { value, ty } => Some((value, ty)),
            ConstValue::Char(c) => Some((c as i128, TypeId::CHAR)),
            _ => None,
        }
    }

    fn as_real(&self) -> Option<f64> {
        match *self {
            ConstValue::Real { bits, .. } => Some(f64::from_bits(bits)),
            ConstValue::Int { value, .. } => Some(value as f64),
            ConstValue::Char(c) => Some(c as u32 as f64),
            _ => None,
        }
    }
}

/// Why an expression has no compile-time value.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ConstError {
    /// Not a constant expression; never a diagnostic by itself.
    NotConstant,
    /// Integral overflow in a checked context.
    Overflow(Span),
    /// Constant division by zero.
    DivideByZero(Span),
    /// A constant's definition depends on itself.
    Circular(Name),
}

/// Named-constant lookup for evaluation, implemented by the collector
/// (const fields, enum members) and the checker (const locals).
pub trait ConstEnv {
    fn lookup(&self, name: Name) -> Result<Option<ConstValue>, ConstError>;

    /// `Type.Member` form, for enum values and cross-type consts.
    fn lookup_member(&self, _target: Name, _member: Name) -> Result<Option<ConstValue>, ConstError> {
        Ok(None)
    }
}

/// An environment with no named constants in scope.
pub struct EmptyEnv;

impl ConstEnv for EmptyEnv {
    fn lookup(&self, _name: Name) -> Result<Option<ConstValue>, ConstError> {
        Ok(None)
    }
}

/// The inclusive integral range of a primitive type.
fn int_range(ty: TypeId) -> Option<(i128, i128)> {
    Some(match ty {
        TypeId::SBYTE => (i8::MIN as i128, i8::MAX as i128),
        TypeId::BYTE => (0, u8::MAX as i128),
        TypeId::SHORT => (i16::MIN as i128, i16::MAX as i128),
        TypeId::USHORT | TypeId::CHAR => (0, u16::MAX as i128),
        TypeId::INT => (i32::MIN as i128, i32::MAX as i128),
        TypeId::UINT => (0, u32::MAX as i128),
        TypeId::LONG => (i64::MIN as i128, i64::MAX as i128),
        TypeId::ULONG => (0, u64::MAX as i128),
        _ => return None,
    })
}

/// Wrap a widened value into the type's representation, the unchecked
/// truncation semantics.
fn wrap_to(ty: TypeId, value: i128) -> i128 {
    match ty {
        TypeId::SBYTE => value as i8 as i128,
        TypeId::BYTE => value as u8 as i128,
        TypeId::SHORT => value as i16 as i128,
        TypeId::USHORT | TypeId::CHAR => value as u16 as i128,
        TypeId::INT => value as i32 as i128,
        TypeId::UINT => value as u32 as i128,
        TypeId::LONG => value as i64 as i128,
        TypeId::ULONG => value as u64 as i128,
        _ => value,
    }
}

fn fit(ty: TypeId, value: i128, checked: bool, span: Span) -> Result<i128, ConstError> {
    match int_range(ty) {
        Some((min, max)) if value < min || value > max => {
            if checked {
                Err(ConstError::Overflow(span))
            } else {
                Ok(wrap_to(ty, value))
            }
        }
        _ => Ok(value),
    }
}

/// The binary numeric promotion result for two arithmetic operand
/// types, or `None` when the combination is an error (`ulong` with a
/// signed type, `decimal` with a binary float).
pub(crate) fn numeric_promote(a: TypeId, b: TypeId) -> Option<TypeId> {
    let arith = |t: TypeId| t.is_numeric() || t == TypeId::CHAR;
    if !arith(a) || !arith(b) {
        return None;
    }
    let signed = |t: TypeId| matches!(t, TypeId::SBYTE | TypeId::SHORT | TypeId::INT | TypeId::LONG);
    if a == TypeId::DECIMAL || b == TypeId::DECIMAL {
        let other = if a == TypeId::DECIMAL { b } else { a };
        if matches!(other, TypeId::FLOAT | TypeId::DOUBLE) {
            return None;
        }
        return Some(TypeId::DECIMAL);
    }
    if a == TypeId::DOUBLE || b == TypeId::DOUBLE {
        return Some(TypeId::DOUBLE);
    }
    if a == TypeId::FLOAT || b == TypeId::FLOAT {
        return Some(TypeId::FLOAT);
    }
    if a == TypeId::ULONG || b == TypeId::ULONG {
        let other = if a == TypeId::ULONG { b } else { a };
        if signed(other) && other != TypeId::ULONG {
            return None;
        }
        return Some(TypeId::ULONG);
    }
    if a == TypeId::LONG || b == TypeId::LONG {
        return Some(TypeId::LONG);
    }
    if a == TypeId::UINT || b == TypeId::UINT {
        let other = if a == TypeId::UINT { b } else { a };
        if matches!(other, TypeId::SBYTE | TypeId::SHORT | TypeId::INT) {
            return Some(TypeId::LONG);
        }
        return Some(TypeId::UINT);
    }
    Some(TypeId::INT)
}

/// The C# type of an unsuffixed/suffixed integer literal: the first of
/// `int`, `uint`, `long`, `ulong` that holds the value.
pub(crate) fn int_literal_type(value: u64, suffix: IntSuffix) -> TypeId {
    match suffix {
        IntSuffix::None => {
            if value <= i32::MAX as u64 {
                TypeId::INT
            } else if value <= u32::MAX as u64 {
                TypeId::UINT
            } else if value <= i64::MAX as u64 {
                TypeId::LONG
            } else {
                TypeId::ULONG
            }
        }
        IntSuffix::U => {
            if value <= u32::MAX as u64 {
                TypeId::UINT
            } else {
                TypeId::ULONG
            }
        }
        IntSuffix::L => {
            if value <= i64::MAX as u64 {
                TypeId::LONG
            } else {
                TypeId::ULONG
            }
        }
        IntSuffix::UL => TypeId::ULONG,
    }
}

pub(crate) fn real_literal_type(suffix: RealSuffix) -> TypeId {
    match suffix {
        RealSuffix::F => TypeId::FLOAT,
        RealSuffix::None | RealSuffix::D => TypeId::DOUBLE,
        RealSuffix::M => TypeId::DECIMAL,
    }
}

/// Evaluate a constant expression, or learn why there is no value.
pub fn eval_const(
    expr: &Expr,
    env: &dyn ConstEnv,
    interner: &StringInterner,
    checked: bool,
) -> Result<ConstValue, ConstError> {
    match &expr.kind {
        ExprKind::LitInt { value, suffix } => {
            let ty = int_literal_type(*value, *suffix);
            Ok(ConstValue::Int {
                value: *value as i128,
                ty,
            })
        }
        ExprKind::LitReal { bits, suffix } => Ok(ConstValue::Real {
            bits: *bits,
            ty: real_literal_type(*suffix),
        }),
        ExprKind::LitBool(b) => Ok(ConstValue::Bool(*b)),
        ExprKind::LitChar(c) => Ok(ConstValue::Char(*c)),
        ExprKind::LitString(s) => Ok(ConstValue::Str(*s)),
        ExprKind::LitNull => Ok(ConstValue::Null),

        ExprKind::Ident(name) => env.lookup(*name)?.ok_or(ConstError::NotConstant),
        ExprKind::Member {
            target,
            name,
            type_args,
            null_conditional: false,
        } if type_args.is_empty() => {
            if let ExprKind::Ident(target_name) = &target.kind {
                if let Some(value) = env.lookup_member(*target_name, *name)? {
                    return Ok(value);
                }
            }
            Err(ConstError::NotConstant)
        }

        ExprKind::Paren(inner) => eval_const(inner, env, interner, checked),
        ExprKind::CheckedExpr {
            checked: is_checked,
            expr: inner,
        } => eval_const(inner, env, interner, *is_checked),

        ExprKind::Unary { op, operand } => {
            let value = eval_const(operand, env, interner, checked)?;
            eval_unary(*op, value, checked, expr.span)
        }
        ExprKind::Binary { op, lhs, rhs } => {
            let left = eval_const(lhs, env, interner, checked)?;
            // short-circuit forms must not evaluate the dead side
            if let (BinaryOp::LogAnd, ConstValue::Bool(false)) = (op, &left) {
                return Ok(ConstValue::Bool(false));
            }
            if let (BinaryOp::LogOr, ConstValue::Bool(true)) = (op, &left) {
                return Ok(ConstValue::Bool(true));
            }
            let right = eval_const(rhs, env, interner, checked)?;
            eval_binary(*op, left, right, interner, checked, expr.span)
        }
        ExprKind::Conditional {
            cond,
            then,
            otherwise,
        } => match eval_const(cond, env, interner, checked)? {
            ConstValue::Bool(true) => eval_const(then, env, interner, checked),
            ConstValue::Bool(false) => eval_const(otherwise, env, interner, checked),
            _ => Err(ConstError::NotConstant),
        },
        ExprKind::Cast { ty, expr: inner } => {
            let value = eval_const(inner, env, interner, checked)?;
            let target = match &ty.kind {
                ParsedTypeKind::Primitive(p) => primitive_type(*p),
                _ => return Err(ConstError::NotConstant),
            };
            eval_cast(value, target, checked, expr.span)
        }
        ExprKind::Default(Some(ty)) => match &ty.kind {
            ParsedTypeKind::Primitive(p) => {
                let target = primitive_type(*p);
                if int_range(target).is_some() {
                    Ok(ConstValue::Int {
                        value: 0,
                        ty: target,
                    })
                } else if target == TypeId::BOOL {
                    Ok(ConstValue::Bool(false))
                } else {
                    Err(ConstError::NotConstant)
                }
            }
            _ => Err(ConstError::NotConstant),
        },
        ExprKind::Assign {
            op: AssignOp::Simple,
            ..
        } => Err(ConstError::NotConstant),

        _ => Err(ConstError::NotConstant),
    }
}

pub(crate) fn primitive_type(p: PrimitiveName) -> TypeId {
    match p {
        PrimitiveName::Bool => TypeId::BOOL,
        PrimitiveName::Byte => TypeId::BYTE,
        PrimitiveName::Sbyte => TypeId::SBYTE,
        PrimitiveName::Short => TypeId::SHORT,
        PrimitiveName::Ushort => TypeId::USHORT,
        PrimitiveName::Int => TypeId::INT,
        PrimitiveName::Uint => TypeId::UINT,
        PrimitiveName::Long => TypeId::LONG,
        PrimitiveName::Ulong => TypeId::ULONG,
        PrimitiveName::Char => TypeId::CHAR,
        PrimitiveName::Float => TypeId::FLOAT,
        PrimitiveName::Double => TypeId::DOUBLE,
        PrimitiveName::Decimal => TypeId::DECIMAL,
        PrimitiveName::String => TypeId::STRING,
        PrimitiveName::Object => TypeId::OBJECT,
        PrimitiveName::Void => TypeId::VOID,
    }
}

fn eval_unary(
    op: UnaryOp,
    value: ConstValue,
    checked: bool,
    span: Span,
) -> Result<ConstValue, ConstError> {
    match op {
        UnaryOp::Plus => Ok(value),
        UnaryOp::Minus => {
            if let Some((v, ty)) = value.as_integral() {
                let ty = numeric_promote(ty, TypeId::INT).unwrap_or(ty);
                let negated = fit(ty, -v, checked, span)?;
                return Ok(ConstValue::Int { value: negated, ty });
            }
            if let ConstValue::Real { bits, ty } = value {
                return Ok(ConstValue::Real {
                    bits: (-f64::from_bits(bits)).to_bits(),
                    ty,
                });
            }
            Err(ConstError::NotConstant)
        }
        UnaryOp::Not => match value {
            ConstValue::Bool(b) => Ok(ConstValue::Bool(!b)),
            _ => Err(ConstError::NotConstant),
        },
        UnaryOp::BitNot => {
            let (v, ty) = value.as_integral().ok_or(ConstError::NotConstant)?;
            let ty = numeric_promote(ty, TypeId::INT).unwrap_or(ty);
            Ok(ConstValue::Int {
                value: wrap_to(ty, !v),
                ty,
            })
        }
        _ => Err(ConstError::NotConstant),
    }
}

fn eval_binary(
    op: BinaryOp,
    left: ConstValue,
    right: ConstValue,
    interner: &StringInterner,
    checked: bool,
    span: Span,
) -> Result<ConstValue, ConstError> {
    // string concatenation folds too ("a" + "b" in const initializers)
    if op == BinaryOp::Add {
        if let (ConstValue::Str(a), ConstValue::Str(b)) = (&left, &right) {
            let mut text = interner.lookup(*a).to_owned();
            text.push_str(interner.lookup(*b));
            return Ok(ConstValue::Str(interner.intern(&text)));
        }
    }
    match (op, &left, &right) {
        (BinaryOp::LogAnd, ConstValue::Bool(a), ConstValue::Bool(b)) => {
            return Ok(ConstValue::Bool(*a && *b));
        }
        (BinaryOp::LogOr, ConstValue::Bool(a), ConstValue::Bool(b)) => {
            return Ok(ConstValue::Bool(*a || *b));
        }
        (
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor,
            ConstValue::Bool(a),
            ConstValue::Bool(b),
        ) => {
            let result = match op {
                BinaryOp::BitAnd => a & b,
                BinaryOp::BitOr => a | b,
                _ => a ^ b,
            };
            return Ok(ConstValue::Bool(result));
        }
        (BinaryOp::Eq, _, _) if left.ty() == right.ty() => {
            return Ok(ConstValue::Bool(left == right));
        }
        (BinaryOp::NotEq, _, _) if left.ty() == right.ty() => {
            return Ok(ConstValue::Bool(left != right));
        }
        _ => {}
    }

    if let (Some((a, at)), Some((b, bt))) = (left.as_integral(), right.as_integral()) {
        let ty = numeric_promote(at, bt).ok_or(ConstError::NotConstant)?;
        return eval_integral(op, a, b, ty, checked, span);
    }
    if let (Some(a), Some(b)) = (left.as_real(), right.as_real()) {
        let ty = numeric_promote(left.ty(), right.ty()).ok_or(ConstError::NotConstant)?;
        return eval_real(op, a, b, ty);
    }
    Err(ConstError::NotConstant)
}

fn eval_integral(
    op: BinaryOp,
    a: i128,
    b: i128,
    ty: TypeId,
    checked: bool,
    span: Span,
) -> Result<ConstValue, ConstError> {
    let wide = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a.checked_mul(b).ok_or(ConstError::Overflow(span))?,
        BinaryOp::Div => {
            if b == 0 {
                return Err(ConstError::DivideByZero(span));
            }
            a / b
        }
        BinaryOp::Rem => {
            if b == 0 {
                return Err(ConstError::DivideByZero(span));
            }
            a % b
        }
        BinaryOp::Shl | BinaryOp::Shr => {
            let width = if matches!(ty, TypeId::LONG | TypeId::ULONG) {
                63
            } else {
                31
            };
            let shift = (b as u32) & width;
            let shifted = if op == BinaryOp::Shl { a << shift } else { a >> shift };
            return Ok(ConstValue::Int {
                value: wrap_to(ty, shifted),
                ty,
            });
        }
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::BitXor => a ^ b,
        BinaryOp::Eq => return Ok(ConstValue::Bool(a == b)),
        BinaryOp::NotEq => return Ok(ConstValue::Bool(a != b)),
        BinaryOp::Lt => return Ok(ConstValue::Bool(a < b)),
        BinaryOp::LtEq => return Ok(ConstValue::Bool(a <= b)),
        BinaryOp::Gt => return Ok(ConstValue::Bool(a > b)),
        BinaryOp::GtEq => return Ok(ConstValue::Bool(a >= b)),
        _ => return Err(ConstError::NotConstant),
    };
    let value = fit(ty, wide, checked, span)?;
    Ok(ConstValue::Int { value, ty })
}

fn eval_real(op: BinaryOp, a: f64, b: f64, ty: TypeId) -> Result<ConstValue, ConstError> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Rem => a % b,
        BinaryOp::Eq => return Ok(ConstValue::Bool(a == b)),
        BinaryOp::NotEq => return Ok(ConstValue::Bool(a != b)),
        BinaryOp::Lt => return Ok(ConstValue::Bool(a < b)),
        BinaryOp::LtEq => return Ok(ConstValue::Bool(a <= b)),
        BinaryOp::Gt => return Ok(ConstValue::Bool(a > b)),
        BinaryOp::GtEq => return Ok(ConstValue::Bool(a >= b)),
        _ => return Err(ConstError::NotConstant),
    };
    Ok(ConstValue::Real {
        bits: result.to_bits(),
        ty,
    })
}

fn eval_cast(
    value: ConstValue,
    target: TypeId,
    checked: bool,
    span: Span,
) -> Result<ConstValue, ConstError> {
    if let Some((v, _)) = value.as_integral() {
        if int_range(target).is_some() {
            let fitted = fit(target, v, checked, span)?;
            if target == TypeId::CHAR {
                let c = char::from_u32(fitted as u32).unwrap_or('\u{FFFD}');
                return Ok(ConstValue::Char(c));
            }
            return Ok(ConstValue::Int {
                value: fitted,
                ty: target,
            });
        }
        if matches!(target, TypeId::FLOAT | TypeId::DOUBLE | TypeId::DECIMAL) {
            return Ok(ConstValue::Real {
                bits: (v as f64).to_bits(),
                ty: target,
            });
        }
    }
    if let ConstValue::Real { bits, .. } = value {
        let real = f64::from_bits(bits);
        if matches!(target, TypeId::FLOAT | TypeId::DOUBLE | TypeId::DECIMAL) {
            return Ok(ConstValue::Real {
                bits: real.to_bits(),
                ty: target,
            });
        }
        if let Some((min, max)) = int_range(target) {
            let truncated = real.trunc();
            if truncated < min as f64 || truncated > max as f64 {
                if checked {
                    return Err(ConstError::Overflow(span));
                }
                return Ok(ConstValue::Int {
                    value: wrap_to(target, truncated as i128),
                    ty: target,
                });
            }
            return Ok(ConstValue::Int {
                value: truncated as i128,
                ty: target,
            });
        }
    }
    Err(ConstError::NotConstant)
}

#[cfg(test)]
mod tests {
    use csf_ir::StringInterner;
    use pretty_assertions::assert_eq;

    use super::*;

    fn eval(source: &str, interner: &StringInterner, checked: bool) -> Result<ConstValue, ConstError> {
        // parse `source` as the initializer of a const declaration
        let program = format!("class C {{ void M() {{ var x = {source}; }} }}");
        let result = csf_parse::parse_source(&program, interner);
        assert_eq!(result.diagnostics, vec![]);
        let expr = find_initializer(&result.unit).clone();
        eval_const(&expr, &EmptyEnv, interner, checked)
    }

    fn find_initializer(unit: &csf_ir::ast::CompilationUnit) -> &Expr {
        use csf_ir::ast::{Item, Member, StmtKind};
        let Item::Type(ty) = &unit.items[0] else {
            panic!("expected type")
        };
        let Member::Method(m) = &ty.members[0] else {
            panic!("expected method")
        };
        let Some(body) = &m.body else {
            panic!("expected body")
        };
        let StmtKind::Block(stmts) = &body.kind else {
            panic!("expected block")
        };
        let StmtKind::LocalVar { declarators, .. } = &stmts[0].kind else {
            panic!("expected local")
        };
        declarators[0].1.as_ref().unwrap_or_else(|| panic!("expected initializer"))
    }

    #[test]
    fn arithmetic_folds() {
        let interner = StringInterner::new();
        assert_eq!(
            eval("2 + 3 * 4", &interner, false),
            Ok(ConstValue::Int {
                value: 14,
                ty: TypeId::INT
            })
        );
    }

    #[test]
    fn checked_overflow_is_an_error() {
        let interner = StringInterner::new();
        let unchecked = eval("(byte)300", &interner, false);
        assert_eq!(
            unchecked,
            Ok(ConstValue::Int {
                value: 44,
                ty: TypeId::BYTE
            })
        );
        assert!(matches!(
            eval("(byte)300", &interner, true),
            Err(ConstError::Overflow(_))
        ));
    }

    #[test]
    fn checked_addition_overflow() {
        let interner = StringInterner::new();
        assert!(matches!(
            eval("checked(2147483647 + 1)", &interner, false),
            Err(ConstError::Overflow(_))
        ));
        assert_eq!(
            eval("unchecked(2147483647 + 1)", &interner, true),
            Ok(ConstValue::Int {
                value: i32::MIN as i128,
                ty: TypeId::INT
            })
        );
    }

    #[test]
    fn division_by_zero_is_caught() {
        let interner = StringInterner::new();
        assert!(matches!(
            eval("1 / 0", &interner, false),
            Err(ConstError::DivideByZero(_))
        ));
    }

    #[test]
    fn short_circuit_skips_the_dead_side() {
        let interner = StringInterner::new();
        assert_eq!(
            eval("false && (1 / 0 == 0)", &interner, false),
            Ok(ConstValue::Bool(false))
        );
    }

    #[test]
    fn string_concatenation_folds() {
        let interner = StringInterner::new();
        let result = eval("\"foo\" + \"bar\"", &interner, false);
        assert_eq!(result, Ok(ConstValue::Str(interner.intern("foobar"))));
    }

    #[test]
    fn literal_typing_follows_the_fitting_rule() {
        assert_eq!(int_literal_type(5, IntSuffix::None), TypeId::INT);
        assert_eq!(int_literal_type(3_000_000_000, IntSuffix::None), TypeId::UINT);
        assert_eq!(
            int_literal_type(10_000_000_000, IntSuffix::None),
            TypeId::LONG
        );
        assert_eq!(int_literal_type(7, IntSuffix::UL), TypeId::ULONG);
    }

    #[test]
    fn promotion_rejects_ulong_with_signed() {
        assert_eq!(numeric_promote(TypeId::ULONG, TypeId::INT), None);
        assert_eq!(
            numeric_promote(TypeId::ULONG, TypeId::UINT),
            Some(TypeId::ULONG)
        );
        assert_eq!(numeric_promote(TypeId::BYTE, TypeId::BYTE), Some(TypeId::INT));
        assert_eq!(
            numeric_promote(TypeId::INT, TypeId::UINT),
            Some(TypeId::LONG)
        );
    }
}
