//! Conversion classification.
//!
//! [`classify_conversion`] is a pure function over the pool: it never
//! records diagnostics and never mutates a definition, so repeated calls
//! for the same pair always agree. The checker and the overload engine
//! both route through it.

use crate::data::UserConversion;
use crate::idx::TypeId;
use crate::pool::TypePool;

/// Where a conversion is requested from.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct ConversionContext {
    /// Inside an explicit cast, narrowing and `explicit operator`
    /// declarations become available.
    pub explicit: bool,
    /// `checked` arithmetic context. Classification ignores it; constant
    /// evaluation reads it to decide overflow behavior.
    pub checked: bool,
}

impl ConversionContext {
    pub const IMPLICIT: Self = ConversionContext {
        explicit: false,
        checked: false,
    };

    pub const EXPLICIT: Self = ConversionContext {
        explicit: true,
        checked: false,
    };
}

/// How one type converts to another, or that it does not.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Conversion {
    Identity,
    ImplicitNumeric,
    ExplicitNumeric,
    ImplicitReference,
    ExplicitReference,
    Boxing,
    Unboxing,
    ImplicitUserDefined(UserConversion),
    ExplicitUserDefined(UserConversion),
    /// A conversion on the underlying value type, lifted over `T?`.
    /// A lifted conversion ranks below every unlifted implicit one.
    LiftedNullable(Box<Conversion>),
    None,
}

impl Conversion {
    pub fn exists(&self) -> bool {
        !matches!(self, Conversion::None)
    }

    pub fn is_implicit(&self) -> bool {
        match self {
            Conversion::Identity
            | Conversion::ImplicitNumeric
            | Conversion::ImplicitReference
            | Conversion::Boxing
            | Conversion::ImplicitUserDefined(_) => true,
            Conversion::LiftedNullable(inner) => inner.is_implicit(),
            _ => false,
        }
    }

    /// Betterness rank, higher wins. Only implicit conversions are ever
    /// compared; a lifted conversion ranks below all unlifted ones.
    pub fn rank(&self) -> u8 {
        match self {
            Conversion::Identity => 5,
            Conversion::ImplicitNumeric => 4,
            Conversion::ImplicitReference => 3,
            Conversion::Boxing => 2,
            Conversion::ImplicitUserDefined(_) => 1,
            _ => 0,
        }
    }
}

/// Classify the conversion from `source` to `target`.
///
/// The rules try, in order: standard implicit conversions, user-declared
/// implicit operators, nullable lifting of both, and then (in explicit
/// contexts only) the explicit counterparts of each.
#[tracing::instrument(level = "trace", skip(pool), ret)]
pub fn classify_conversion(
    pool: &TypePool,
    source: TypeId,
    target: TypeId,
    context: ConversionContext,
) -> Conversion {
    let standard = standard_implicit(pool, source, target);
    if standard.exists() {
        return standard;
    }
    if let Some(conversion) = user_defined(pool, source, target, false) {
        return conversion;
    }
    if let Some(conversion) = lifted(pool, source, target, false) {
        return conversion;
    }
    if context.explicit {
        let narrowing = standard_explicit(pool, source, target);
        if narrowing.exists() {
            return narrowing;
        }
        if let Some(conversion) = user_defined(pool, source, target, true) {
            return conversion;
        }
        if let Some(conversion) = lifted(pool, source, target, true) {
            return conversion;
        }
    }
    Conversion::None
}

/// Standard implicit conversions: identity, numeric widening, reference
/// convertibility, boxing. No user-defined operators, no lifting.
fn standard_implicit(pool: &TypePool, source: TypeId, target: TypeId) -> Conversion {
    if source == target {
        return Conversion::Identity;
    }
    // the error type converts everywhere so one failure never cascades
    if source.is_error() || target.is_error() {
        return Conversion::Identity;
    }
    // dynamic is statically convertible both ways; binding is deferred
    if source == TypeId::DYNAMIC || target == TypeId::DYNAMIC {
        return Conversion::ImplicitReference;
    }
    if source == TypeId::NULL {
        if pool.is_reference_type(target) {
            return Conversion::ImplicitReference;
        }
        return Conversion::None;
    }
    if implicit_numeric(source, target) {
        return Conversion::ImplicitNumeric;
    }
    if pool.is_reference_type(target)
        && pool.is_reference_type(source)
        && pool.reference_convertible(source, target)
    {
        return Conversion::ImplicitReference;
    }
    if pool.boxing_target(source, target) {
        return Conversion::Boxing;
    }
    Conversion::None
}

/// The C# implicit numeric promotion table. Notably absent: anything
/// into `char`, signed into unsigned of the same width, and
/// `float`/`double` into `decimal`.
fn implicit_numeric(source: TypeId, target: TypeId) -> bool {
    use TypeId as T;
    let allowed: &[TypeId] = match source {
        T::SBYTE => &[T::SHORT, T::INT, T::LONG, T::FLOAT, T::DOUBLE, T::DECIMAL],
        T::BYTE => &[
            T::SHORT,
            T::USHORT,
            T::INT,
            T::UINT,
            T::LONG,
            T::ULONG,
            T::FLOAT,
            T::DOUBLE,
            T::DECIMAL,
        ],
        T::SHORT => &[T::INT, T::LONG, T::FLOAT, T::DOUBLE, T::DECIMAL],
        T::USHORT => &[
            T::INT,
            T::UINT,
            T::LONG,
            T::ULONG,
            T::FLOAT,
            T::DOUBLE,
            T::DECIMAL,
        ],
        T::INT => &[T::LONG, T::FLOAT, T::DOUBLE, T::DECIMAL],
        T::UINT => &[T::LONG, T::ULONG, T::FLOAT, T::DOUBLE, T::DECIMAL],
        T::LONG | T::ULONG => &[T::FLOAT, T::DOUBLE, T::DECIMAL],
        T::CHAR => &[
            T::USHORT,
            T::INT,
            T::UINT,
            T::LONG,
            T::ULONG,
            T::FLOAT,
            T::DOUBLE,
            T::DECIMAL,
        ],
        T::FLOAT => &[T::DOUBLE],
        _ => &[],
    };
    allowed.contains(&target)
}

/// Explicit-only standard conversions: numeric narrowing, enum casts,
/// reference downcasts, unboxing.
fn standard_explicit(pool: &TypePool, source: TypeId, target: TypeId) -> Conversion {
    let source_arith = source.is_numeric() || source == TypeId::CHAR;
    let target_arith = target.is_numeric() || target == TypeId::CHAR;
    if source_arith && target_arith {
        return Conversion::ExplicitNumeric;
    }
    // enums cast to and from any arithmetic type and each other
    let source_enum = pool.enum_underlying(source).is_some();
    let target_enum = pool.enum_underlying(target).is_some();
    if (source_enum && (target_arith || target_enum)) || (target_enum && source_arith) {
        return Conversion::ExplicitNumeric;
    }
    if pool.is_reference_type(source) && pool.is_value_type(target) {
        // runtime-checked unwrap of a box
        if source == TypeId::OBJECT || pool.boxing_target(target, source) {
            return Conversion::Unboxing;
        }
    }
    if pool.is_reference_type(source) && pool.is_reference_type(target) {
        let downcast = pool.reference_convertible(target, source);
        let through_interface = pool.is_interface(source) || pool.is_interface(target);
        if downcast || through_interface || source == TypeId::OBJECT {
            return Conversion::ExplicitReference;
        }
    }
    Conversion::None
}

/// User-declared conversion operators on either endpoint. Exact
/// signature matches beat bridged ones; two surviving distinct
/// candidates mean the conversion is ambiguous and classification
/// refuses it.
fn user_defined(
    pool: &TypePool,
    source: TypeId,
    target: TypeId,
    explicit: bool,
) -> Option<Conversion> {
    let mut candidates: Vec<UserConversion> = Vec::new();
    let mut consider = |op: &UserConversion| {
        if !op.implicit && !explicit {
            return;
        }
        let from_ok = standard_implicit(pool, source, op.from).exists();
        let to_ok = standard_implicit(pool, op.to, target).exists();
        if from_ok && to_ok && !candidates.contains(op) {
            candidates.push(op.clone());
        }
    };
    for op in pool.conversions_of(source) {
        consider(&op);
    }
    for op in pool.conversions_of(target) {
        consider(&op);
    }
    if candidates.len() > 1 {
        let exact: Vec<&UserConversion> = candidates
            .iter()
            .filter(|op| op.from == source && op.to == target)
            .collect();
        match exact.len() {
            1 => candidates = vec![exact[0].clone()],
            // both endpoints declare incompatible operators
            _ => return Some(Conversion::None),
        }
    }
    let op = candidates.pop()?;
    Some(if op.implicit {
        Conversion::ImplicitUserDefined(op)
    } else {
        Conversion::ExplicitUserDefined(op)
    })
}

/// Nullable lifting: a conversion that holds on the underlying value
/// types holds on their nullable forms, wrapped so it ranks below the
/// unlifted version. Unwrapping `T?` to `T` is explicit only.
fn lifted(pool: &TypePool, source: TypeId, target: TypeId, explicit: bool) -> Option<Conversion> {
    let target_underlying = pool.nullable_underlying(target);
    let source_underlying = pool.nullable_underlying(source);

    if let Some(tu) = target_underlying {
        // null literal fits any T?
        if source == TypeId::NULL {
            return Some(Conversion::LiftedNullable(Box::new(Conversion::Identity)));
        }
        let inner_source = source_underlying.unwrap_or(source);
        if source_underlying.is_none() && !pool.is_value_type(source) {
            return None;
        }
        let inner = classify_inner(pool, inner_source, tu, explicit);
        if inner.exists() {
            return Some(Conversion::LiftedNullable(Box::new(inner)));
        }
        return None;
    }

    if let Some(su) = source_underlying {
        if !explicit {
            return None;
        }
        let inner = classify_inner(pool, su, target, true);
        if inner.exists() {
            return Some(Conversion::LiftedNullable(Box::new(inner)));
        }
    }
    None
}

fn classify_inner(pool: &TypePool, source: TypeId, target: TypeId, explicit: bool) -> Conversion {
    let standard = standard_implicit(pool, source, target);
    if standard.exists() {
        return standard;
    }
    if let Some(conversion) = user_defined(pool, source, target, false) {
        return conversion;
    }
    if explicit {
        let narrowing = standard_explicit(pool, source, target);
        if narrowing.exists() {
            return narrowing;
        }
        if let Some(conversion) = user_defined(pool, source, target, true) {
            return conversion;
        }
    }
    Conversion::None
}

#[cfg(test)]
mod tests {
    use csf_ir::StringInterner;
    use pretty_assertions::assert_eq;

    use crate::data::{TypeDef, TypeDefKind, UserConversion};

    use super::*;

    fn implicit(pool: &TypePool, source: TypeId, target: TypeId) -> Conversion {
        classify_conversion(pool, source, target, ConversionContext::IMPLICIT)
    }

    fn explicit(pool: &TypePool, source: TypeId, target: TypeId) -> Conversion {
        classify_conversion(pool, source, target, ConversionContext::EXPLICIT)
    }

    #[test]
    fn int_widens_to_long() {
        let pool = TypePool::new();
        assert_eq!(
            implicit(&pool, TypeId::INT, TypeId::LONG),
            Conversion::ImplicitNumeric
        );
        assert_eq!(
            implicit(&pool, TypeId::INT, TypeId::INT),
            Conversion::Identity
        );
    }

    #[test]
    fn int_does_not_widen_to_uint() {
        let pool = TypePool::new();
        assert_eq!(implicit(&pool, TypeId::INT, TypeId::UINT), Conversion::None);
        assert_eq!(
            explicit(&pool, TypeId::INT, TypeId::UINT),
            Conversion::ExplicitNumeric
        );
    }

    #[test]
    fn char_is_integral_but_nothing_widens_into_it() {
        let pool = TypePool::new();
        assert_eq!(
            implicit(&pool, TypeId::CHAR, TypeId::INT),
            Conversion::ImplicitNumeric
        );
        assert_eq!(implicit(&pool, TypeId::BYTE, TypeId::CHAR), Conversion::None);
        assert_eq!(
            explicit(&pool, TypeId::INT, TypeId::CHAR),
            Conversion::ExplicitNumeric
        );
    }

    #[test]
    fn float_does_not_reach_decimal_implicitly() {
        let pool = TypePool::new();
        assert_eq!(
            implicit(&pool, TypeId::DOUBLE, TypeId::DECIMAL),
            Conversion::None
        );
        assert_eq!(
            implicit(&pool, TypeId::LONG, TypeId::DECIMAL),
            Conversion::ImplicitNumeric
        );
    }

    #[test]
    fn boxing_and_unboxing() {
        let pool = TypePool::new();
        assert_eq!(
            implicit(&pool, TypeId::INT, TypeId::OBJECT),
            Conversion::Boxing
        );
        assert_eq!(implicit(&pool, TypeId::OBJECT, TypeId::INT), Conversion::None);
        assert_eq!(
            explicit(&pool, TypeId::OBJECT, TypeId::INT),
            Conversion::Unboxing
        );
    }

    #[test]
    fn reference_upcast_and_downcast() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let base = pool.add_def(TypeDef::new(interner.intern("Base"), TypeDefKind::Class));
        let derived = pool.add_def(TypeDef::new(interner.intern("Derived"), TypeDefKind::Class));
        let base_ty = pool.named(base, vec![]);
        let derived_ty = pool.named(derived, vec![]);
        pool.set_base(derived, base_ty);

        assert_eq!(
            implicit(&pool, derived_ty, base_ty),
            Conversion::ImplicitReference
        );
        assert_eq!(implicit(&pool, base_ty, derived_ty), Conversion::None);
        assert_eq!(
            explicit(&pool, base_ty, derived_ty),
            Conversion::ExplicitReference
        );
    }

    #[test]
    fn null_literal_conversions() {
        let pool = TypePool::new();
        assert_eq!(
            implicit(&pool, TypeId::NULL, TypeId::STRING),
            Conversion::ImplicitReference
        );
        let nullable_int = pool.nullable(TypeId::INT);
        assert_eq!(
            implicit(&pool, TypeId::NULL, nullable_int),
            Conversion::LiftedNullable(Box::new(Conversion::Identity))
        );
        assert_eq!(implicit(&pool, TypeId::NULL, TypeId::INT), Conversion::None);
    }

    #[test]
    fn nullable_lifting_wraps_the_underlying_rule() {
        let pool = TypePool::new();
        let nullable_int = pool.nullable(TypeId::INT);
        let nullable_long = pool.nullable(TypeId::LONG);

        assert_eq!(
            implicit(&pool, TypeId::INT, nullable_int),
            Conversion::LiftedNullable(Box::new(Conversion::Identity))
        );
        assert_eq!(
            implicit(&pool, nullable_int, nullable_long),
            Conversion::LiftedNullable(Box::new(Conversion::ImplicitNumeric))
        );
        // unwrapping loses information; explicit only
        assert_eq!(implicit(&pool, nullable_int, TypeId::INT), Conversion::None);
        assert_eq!(
            explicit(&pool, nullable_int, TypeId::INT),
            Conversion::LiftedNullable(Box::new(Conversion::Identity))
        );
    }

    #[test]
    fn user_defined_operator_on_the_source() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let meters = pool.add_def(TypeDef::new(interner.intern("Meters"), TypeDefKind::Struct));
        let meters_ty = pool.named(meters, vec![]);
        pool.add_conversion(
            meters,
            UserConversion {
                from: meters_ty,
                to: TypeId::DOUBLE,
                implicit: true,
                owner: meters,
            },
        );

        assert_eq!(
            implicit(&pool, meters_ty, TypeId::DOUBLE),
            Conversion::ImplicitUserDefined(UserConversion {
                from: meters_ty,
                to: TypeId::DOUBLE,
                implicit: true,
                owner: meters,
            })
        );
        assert_eq!(implicit(&pool, TypeId::DOUBLE, meters_ty), Conversion::None);
    }

    #[test]
    fn incompatible_operators_on_both_ends_are_refused() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let a = pool.add_def(TypeDef::new(interner.intern("A"), TypeDefKind::Struct));
        let b = pool.add_def(TypeDef::new(interner.intern("B"), TypeDefKind::Struct));
        let a_ty = pool.named(a, vec![]);
        let b_ty = pool.named(b, vec![]);
        // A declares A -> int, B declares long -> B; both bridge A -> B
        pool.add_conversion(
            a,
            UserConversion {
                from: a_ty,
                to: TypeId::INT,
                implicit: true,
                owner: a,
            },
        );
        pool.add_conversion(
            b,
            UserConversion {
                from: TypeId::LONG,
                to: b_ty,
                implicit: true,
                owner: b,
            },
        );
        // int does not reach B and A does not reach long without a
        // second user conversion, so neither candidate applies
        assert_eq!(implicit(&pool, a_ty, b_ty), Conversion::None);
    }

    #[test]
    fn user_conversion_lifts_over_nullable() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let my = pool.add_def(TypeDef::new(interner.intern("MyType"), TypeDefKind::Struct));
        let my_ty = pool.named(my, vec![]);
        let op = UserConversion {
            from: TypeId::INT,
            to: my_ty,
            implicit: true,
            owner: my,
        };
        pool.add_conversion(my, op.clone());
        let nullable_my = pool.nullable(my_ty);

        assert_eq!(
            implicit(&pool, TypeId::INT, nullable_my),
            Conversion::LiftedNullable(Box::new(Conversion::ImplicitUserDefined(op)))
        );
    }

    #[test]
    fn error_type_converts_everywhere() {
        let pool = TypePool::new();
        assert_eq!(
            implicit(&pool, TypeId::ERROR, TypeId::INT),
            Conversion::Identity
        );
        assert_eq!(
            implicit(&pool, TypeId::STRING, TypeId::ERROR),
            Conversion::Identity
        );
    }

    #[test]
    fn enum_casts_are_explicit() {
        let interner = StringInterner::new();
        let pool = TypePool::new();
        let color = pool.add_def(TypeDef::new(
            interner.intern("Color"),
            TypeDefKind::Enum {
                underlying: TypeId::INT,
            },
        ));
        let color_ty = pool.named(color, vec![]);

        assert_eq!(implicit(&pool, color_ty, TypeId::INT), Conversion::None);
        assert_eq!(
            explicit(&pool, color_ty, TypeId::INT),
            Conversion::ExplicitNumeric
        );
        assert_eq!(
            explicit(&pool, TypeId::INT, color_ty),
            Conversion::ExplicitNumeric
        );
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        fn any_primitive() -> impl Strategy<Value = TypeId> {
            (0u32..TypeId::PRIMITIVE_COUNT).prop_map(TypeId::from_raw)
        }

        proptest! {
            #[test]
            fn classification_is_deterministic(
                source in any_primitive(),
                target in any_primitive(),
            ) {
                let pool = TypePool::new();
                let first = implicit(&pool, source, target);
                let second = implicit(&pool, source, target);
                prop_assert_eq!(first, second);
            }

            #[test]
            fn implicit_survives_explicit_context(
                source in any_primitive(),
                target in any_primitive(),
            ) {
                let pool = TypePool::new();
                let narrow = implicit(&pool, source, target);
                if narrow.is_implicit() {
                    let wide = explicit(&pool, source, target);
                    prop_assert_eq!(narrow, wide);
                }
            }
        }
    }
}
