//! Type index handle.
//!
//! `TypeId` is the canonical type representation: a 32-bit index into
//! the [`TypePool`](crate::pool::TypePool). Equality of interned types
//! is index equality. Primitive types occupy fixed indices so the
//! common cases never touch the pool.

use std::fmt;

/// A 32-bit index into the type pool.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    // Pre-interned at pool creation, in this order.
    /// Placeholder for failed resolution; converts to everything so one
    /// root cause never cascades.
    pub const ERROR: Self = Self(0);
    pub const VOID: Self = Self(1);
    pub const OBJECT: Self = Self(2);
    pub const STRING: Self = Self(3);
    pub const BOOL: Self = Self(4);
    pub const CHAR: Self = Self(5);
    pub const SBYTE: Self = Self(6);
    pub const BYTE: Self = Self(7);
    pub const SHORT: Self = Self(8);
    pub const USHORT: Self = Self(9);
    pub const INT: Self = Self(10);
    pub const UINT: Self = Self(11);
    pub const LONG: Self = Self(12);
    pub const ULONG: Self = Self(13);
    pub const FLOAT: Self = Self(14);
    pub const DOUBLE: Self = Self(15);
    pub const DECIMAL: Self = Self(16);
    /// `dynamic`: statically convertible to and from everything.
    pub const DYNAMIC: Self = Self(17);
    /// The type of the `null` literal.
    pub const NULL: Self = Self(18);

    pub const PRIMITIVE_COUNT: u32 = 19;

    /// First index handed out for structurally interned types.
    pub const FIRST_DYNAMIC: u32 = 32;

    /// Sentinel for "no type recorded" in side tables.
    pub const NONE: Self = Self(u32::MAX);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_error(self) -> bool {
        self.0 == Self::ERROR.0
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    /// Numeric primitives participating in arithmetic conversions.
    /// `char` is integral for conversion purposes but is not "numeric"
    /// here; the conversion table handles it explicitly.
    #[inline]
    pub const fn is_numeric(self) -> bool {
        self.0 >= Self::SBYTE.0 && self.0 <= Self::DECIMAL.0
    }

    #[inline]
    pub const fn is_integral(self) -> bool {
        (self.0 >= Self::SBYTE.0 && self.0 <= Self::ULONG.0) || self.0 == Self::CHAR.0
    }

    /// Name for pre-interned primitives; interned types need the pool.
    pub const fn primitive_name(self) -> Option<&'static str> {
        Some(match self.0 {
            0 => "<error>",
            1 => "void",
            2 => "object",
            3 => "string",
            4 => "bool",
            5 => "char",
            6 => "sbyte",
            7 => "byte",
            8 => "short",
            9 => "ushort",
            10 => "int",
            11 => "uint",
            12 => "long",
            13 => "ulong",
            14 => "float",
            15 => "double",
            16 => "decimal",
            17 => "dynamic",
            18 => "<null>",
            _ => return None,
        })
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.primitive_name() {
            Some(name) => write!(f, "TypeId({name})"),
            None if self.is_none() => write!(f, "TypeId(NONE)"),
            None => write!(f, "TypeId({})", self.0),
        }
    }
}

/// Index of a named type declaration registered in the pool.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(transparent)]
pub struct TypeDefId(u32);

impl TypeDefId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn primitive_classification() {
        assert!(TypeId::INT.is_numeric());
        assert!(TypeId::DECIMAL.is_numeric());
        assert!(!TypeId::BOOL.is_numeric());
        assert!(!TypeId::STRING.is_numeric());
        assert!(TypeId::CHAR.is_integral());
        assert!(!TypeId::CHAR.is_numeric());
    }

    #[test]
    fn fixed_indices_are_stable() {
        assert_eq!(TypeId::ERROR.raw(), 0);
        assert_eq!(TypeId::NULL.raw(), 18);
        assert!(TypeId::NULL.raw() < TypeId::FIRST_DYNAMIC);
    }

    #[test]
    fn handles_are_small() {
        assert_eq!(std::mem::size_of::<TypeId>(), 4);
        assert_eq!(std::mem::size_of::<Option<TypeId>>(), 8);
    }
}
